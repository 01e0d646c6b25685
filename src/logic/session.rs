use crate::models::{Report, ReportContext};
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};

/// A build rejected because another one completed too recently
#[derive(Debug, Clone)]
pub struct Debounced {
    pub retry_after: Duration,
    /// Last completed report, only when it was built for the same parameters
    pub previous: Option<Report>,
}

/// Permission to run one report build. Superseded once a build for
/// different parameters starts.
#[derive(Debug)]
pub struct BuildTicket {
    generation: u64,
    key: ReportContext,
    watermark: watch::Receiver<u64>,
}

impl BuildTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Resolves when a newer build has started
    pub async fn superseded(&mut self) {
        let generation = self.generation;
        let closed = self
            .watermark
            .wait_for(|latest| *latest > generation)
            .await
            .is_err();
        if closed {
            // Session dropped: nothing can supersede us any more
            std::future::pending::<()>().await;
        }
    }
}

#[derive(Default)]
struct SessionState {
    last_completed: Option<Instant>,
    last_key: Option<ReportContext>,
    last_report: Option<Report>,
    in_flight: Option<(u64, ReportContext)>,
}

/// Process-wide build bookkeeping shared by every report request: the
/// debounce timestamp, the last completed report and the cancellation
/// watermark for in-flight builds.
pub struct ReportSession {
    debounce: Duration,
    state: Mutex<SessionState>,
    watermark: watch::Sender<u64>,
}

impl ReportSession {
    pub fn new(debounce: Duration) -> Self {
        let (watermark, _) = watch::channel(0);
        Self {
            debounce,
            state: Mutex::new(SessionState::default()),
            watermark,
        }
    }

    pub async fn begin(&self, key: ReportContext) -> std::result::Result<BuildTicket, Debounced> {
        let mut state = self.state.lock().await;

        if let Some(completed) = state.last_completed {
            let elapsed = completed.elapsed();
            if elapsed < self.debounce {
                let previous = if state.last_key.as_ref() == Some(&key) {
                    state.last_report.clone()
                } else {
                    None
                };
                tracing::debug!("Report request debounced ({:?} since last build)", elapsed);
                return Err(Debounced {
                    retry_after: self.debounce - elapsed,
                    previous,
                });
            }
        }

        // An identical build is already fanning out
        if let Some((_, in_flight)) = &state.in_flight {
            if *in_flight == key {
                tracing::debug!("Identical report build already in flight");
                return Err(Debounced {
                    retry_after: self.debounce,
                    previous: None,
                });
            }
        }

        self.watermark.send_modify(|g| *g += 1);
        let generation = *self.watermark.borrow();
        if let Some((stale, _)) = state.in_flight.replace((generation, key)) {
            tracing::info!("Superseding in-flight report build #{}", stale);
        }

        Ok(BuildTicket {
            generation,
            key,
            watermark: self.watermark.subscribe(),
        })
    }

    /// Record a finished build. Returns false when the ticket was superseded
    /// while the build ran, in which case the report is discarded.
    pub async fn complete(&self, ticket: &BuildTicket, report: &Report) -> bool {
        let mut state = self.state.lock().await;

        if *self.watermark.borrow() != ticket.generation {
            return false;
        }

        state.in_flight = None;
        state.last_completed = Some(Instant::now());
        state.last_key = Some(ticket.key);
        state.last_report = Some(report.clone());
        true
    }

    pub async fn abandon(&self, ticket: &BuildTicket) {
        let mut state = self.state.lock().await;
        if matches!(state.in_flight, Some((g, _)) if g == ticket.generation) {
            state.in_flight = None;
        }
    }
}
