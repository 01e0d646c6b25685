use super::bloom::BloomDetector;
use super::calculations::{mean_ndvi, strongest_blooms};
use super::fusion::SeriesFusion;
use super::geocode::GeocodeResolver;
use super::rules::{RecommendationEngine, RuleContext};
use super::session::{Debounced, ReportSession};
use super::trend::TrendClassifier;
use super::vegetation::VegetationClassifier;
use crate::config::Config;
use crate::datasources::{
    AnalysisProvider, BloomPeakProvider, ForecastParams, ForecastProvider, NdviSeriesProvider,
    RegionQuery, ThumbnailProvider,
};
use crate::error::{BloomWatchError, Result};
use crate::models::{
    Coordinate, CurrentStatus, DateRange, ForecastOutcome, ForecastSummary, RegionOfInterest,
    RemoteAnalysis, Report, ReportContext, ReportStatus, SectionFlags, SectionStatus, Series,
};
use chrono::{Datelike, NaiveDate};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Validated parameters for one report build
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportRequest {
    pub roi: RegionOfInterest,
    pub date_range: DateRange,
    /// Bloom threshold, clamped to 0.1-1.0
    pub threshold: f64,
    pub forecast: ForecastParams,
}

impl ReportRequest {
    pub fn new(
        latitude: f64,
        longitude: f64,
        size_degrees: f64,
        start: NaiveDate,
        end: NaiveDate,
        threshold: f64,
    ) -> Result<Self> {
        if !threshold.is_finite() {
            return Err(BloomWatchError::InvalidInput(format!(
                "bloom threshold must be a number, got {}",
                threshold
            )));
        }

        let roi = RegionOfInterest::new(Coordinate::new(latitude, longitude)?, size_degrees)?;
        let date_range = DateRange::new(start, end)?;

        Ok(Self {
            roi,
            date_range,
            threshold: BloomDetector::clamp_threshold(threshold),
            forecast: ForecastParams::default(),
        })
    }

    pub fn with_forecast(mut self, forecast: ForecastParams) -> Self {
        self.forecast = forecast;
        self
    }

    pub fn context(&self) -> ReportContext {
        ReportContext {
            roi: self.roi,
            date_range: self.date_range,
            threshold: self.threshold,
        }
    }

    pub fn query(&self) -> RegionQuery {
        RegionQuery {
            roi: self.roi,
            date_range: self.date_range,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub series_timeout: Duration,
    pub peaks_timeout: Duration,
    pub forecast_timeout: Duration,
    pub analysis_timeout: Duration,
    pub thumbnail_timeout: Duration,
    /// Whole fan-out deadline; calls still running are abandoned
    pub build_timeout: Duration,
    pub trend_window: usize,
    pub top_blooms: usize,
    pub overlap_days: u32,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            series_timeout: Duration::from_secs(60),
            peaks_timeout: Duration::from_secs(60),
            forecast_timeout: Duration::from_secs(120),
            analysis_timeout: Duration::from_secs(120),
            thumbnail_timeout: Duration::from_secs(10),
            build_timeout: Duration::from_secs(150),
            trend_window: super::trend::DEFAULT_TREND_WINDOW,
            top_blooms: 5,
            overlap_days: 0,
        }
    }
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config) -> Self {
        let t = &config.orchestrator.timeouts;
        Self {
            series_timeout: Duration::from_secs(t.series_secs),
            peaks_timeout: Duration::from_secs(t.peaks_secs),
            forecast_timeout: Duration::from_secs(t.forecast_secs),
            analysis_timeout: Duration::from_secs(t.analysis_secs),
            thumbnail_timeout: Duration::from_secs(t.thumbnail_secs),
            build_timeout: Duration::from_secs(config.orchestrator.build_timeout_secs),
            trend_window: config.analysis.trend_window,
            top_blooms: config.analysis.top_blooms,
            overlap_days: config.analysis.forecast_overlap_days,
        }
    }
}

/// Upstream collaborators. Only the NDVI series is required; an absent
/// optional provider disables its section.
#[derive(Clone)]
pub struct Providers {
    pub series: Arc<dyn NdviSeriesProvider>,
    pub peaks: Option<Arc<dyn BloomPeakProvider>>,
    pub forecast: Option<Arc<dyn ForecastProvider>>,
    pub thumbnail: Option<Arc<dyn ThumbnailProvider>>,
    pub analysis: Option<Arc<dyn AnalysisProvider>>,
}

impl Providers {
    pub fn new(series: Arc<dyn NdviSeriesProvider>) -> Self {
        Self {
            series,
            peaks: None,
            forecast: None,
            thumbnail: None,
            analysis: None,
        }
    }

    pub fn with_peaks(mut self, peaks: Arc<dyn BloomPeakProvider>) -> Self {
        self.peaks = Some(peaks);
        self
    }

    pub fn with_forecast(mut self, forecast: Arc<dyn ForecastProvider>) -> Self {
        self.forecast = Some(forecast);
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: Arc<dyn ThumbnailProvider>) -> Self {
        self.thumbnail = Some(thumbnail);
        self
    }

    pub fn with_analysis(mut self, analysis: Arc<dyn AnalysisProvider>) -> Self {
        self.analysis = Some(analysis);
        self
    }
}

#[derive(Debug, Clone)]
pub enum ReportOutcome {
    Built(Report),
    /// Another build completed within the debounce interval
    Debounced {
        retry_after: Duration,
        previous: Option<Report>,
    },
    /// A build for different parameters started while this one ran
    Superseded,
}

/// Progress of one fan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Pending,
    PartiallySettled { settled: usize, outstanding: usize },
    Settled(ReportStatus),
}

impl std::fmt::Display for BuildState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildState::Pending => write!(f, "pending"),
            BuildState::PartiallySettled {
                settled,
                outstanding,
            } => write!(f, "{} settled, {} outstanding", settled, outstanding),
            BuildState::Settled(status) => write!(f, "settled ({})", status),
        }
    }
}

enum Settlement {
    Series(Result<Series>),
    Peaks(Result<Vec<usize>>),
    Forecast(Result<ForecastOutcome>),
    Thumbnail(Result<String>),
    Analysis(Result<RemoteAnalysis>),
}

enum Slot<T> {
    Disabled,
    Waiting,
    /// Aborted before settling because the build could not use it
    Cancelled,
    Settled(Result<T>),
}

impl<T> Slot<T> {
    fn status(&self) -> SectionStatus {
        match self {
            Slot::Disabled => SectionStatus::Disabled,
            Slot::Waiting => SectionStatus::TimedOut,
            Slot::Cancelled => SectionStatus::Cancelled,
            Slot::Settled(Ok(_)) => SectionStatus::Available,
            Slot::Settled(Err(BloomWatchError::UpstreamTimeout(_))) => SectionStatus::TimedOut,
            Slot::Settled(Err(_)) => SectionStatus::Failed,
        }
    }

    fn cancel(&mut self) {
        if matches!(self, Slot::Waiting) {
            *self = Slot::Cancelled;
        }
    }

    fn take(&mut self) -> Slot<T> {
        std::mem::replace(self, Slot::Disabled)
    }
}

struct FanIn {
    state: BuildState,
    expected: usize,
    outstanding: usize,
    series: Slot<Series>,
    peaks: Slot<Vec<usize>>,
    forecast: Slot<ForecastOutcome>,
    thumbnail: Slot<String>,
    analysis: Slot<RemoteAnalysis>,
}

impl FanIn {
    fn new() -> Self {
        Self {
            state: BuildState::Pending,
            expected: 0,
            outstanding: 0,
            series: Slot::Disabled,
            peaks: Slot::Disabled,
            forecast: Slot::Disabled,
            thumbnail: Slot::Disabled,
            analysis: Slot::Disabled,
        }
    }

    fn track(&mut self, count: usize) {
        self.expected = count;
        self.outstanding = count;
    }

    fn record(&mut self, settlement: Settlement) {
        match settlement {
            Settlement::Series(r) => self.series = Slot::Settled(r),
            Settlement::Peaks(r) => self.peaks = Slot::Settled(r),
            Settlement::Forecast(r) => self.forecast = Slot::Settled(r),
            Settlement::Thumbnail(r) => self.thumbnail = Slot::Settled(r),
            Settlement::Analysis(r) => self.analysis = Slot::Settled(r),
        }
        self.advance();
    }

    /// A task that ended without reporting (panicked or aborted)
    fn lost(&mut self) {
        self.advance();
    }

    fn advance(&mut self) {
        self.outstanding = self.outstanding.saturating_sub(1);
        self.state = BuildState::PartiallySettled {
            settled: self.expected - self.outstanding,
            outstanding: self.outstanding,
        };
    }

    fn settle(&mut self, status: ReportStatus) {
        self.state = BuildState::Settled(status);
    }

    /// Mark every call still in flight as cancelled
    fn cancel_waiting(&mut self) {
        self.peaks.cancel();
        self.forecast.cancel();
        self.thumbnail.cancel();
        self.analysis.cancel();
    }

    /// Empty or failed NDVI series ends the build early
    fn series_unusable(&self) -> bool {
        match &self.series {
            Slot::Settled(Ok(series)) => series.is_empty(),
            Slot::Settled(Err(_)) => true,
            _ => false,
        }
    }
}

async fn bounded<T>(
    limit: Duration,
    what: &'static str,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
        Err(BloomWatchError::UpstreamTimeout(format!(
            "{} after {:?}",
            what, limit
        )))
    })
}

fn log_section_error(section: &str, e: &BloomWatchError) {
    if e.is_upstream() {
        tracing::warn!("{} unavailable: {}", section, e);
    } else {
        tracing::error!("{} failed: {}", section, e);
    }
}

/// Summary of the forecast segment shown after the observed data
pub fn forecast_summary(forecast: &Series) -> Option<ForecastSummary> {
    let first = forecast.first()?;
    let last = forecast.last()?;
    let mean = mean_ndvi(forecast.points())?;
    let direction = TrendClassifier::classify(forecast, forecast.len())?.direction;

    Some(ForecastSummary {
        start: first.date,
        end: last.date,
        points: forecast.len(),
        predicted_mean_ndvi: mean,
        direction,
        interpretation: VegetationClassifier::classify(mean),
    })
}

/// Coordinates the upstream fan-out for a report and assembles the result
pub struct RequestOrchestrator {
    providers: Providers,
    geocoder: Arc<GeocodeResolver>,
    session: Arc<ReportSession>,
    engine: RecommendationEngine,
    settings: OrchestratorSettings,
}

impl RequestOrchestrator {
    pub fn new(
        providers: Providers,
        geocoder: Arc<GeocodeResolver>,
        session: Arc<ReportSession>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            providers,
            geocoder,
            session,
            engine: RecommendationEngine::new(),
            settings,
        }
    }

    pub async fn resolve_place_name(&self, coordinate: Coordinate) -> String {
        self.geocoder.resolve(coordinate).await
    }

    pub async fn build_report(&self, request: &ReportRequest) -> ReportOutcome {
        let mut ticket = match self.session.begin(request.context()).await {
            Ok(ticket) => ticket,
            Err(Debounced {
                retry_after,
                previous,
            }) => {
                return ReportOutcome::Debounced {
                    retry_after,
                    previous,
                }
            }
        };

        let built = tokio::select! {
            biased;
            _ = ticket.superseded() => None,
            report = self.build(request) => Some(report),
        };

        let Some(report) = built else {
            self.session.abandon(&ticket).await;
            tracing::debug!("Cancelled report #{}: superseded", ticket.generation());
            return ReportOutcome::Superseded;
        };

        if !self.session.complete(&ticket, &report).await {
            tracing::debug!("Discarding report #{}: superseded", ticket.generation());
            return ReportOutcome::Superseded;
        }

        tracing::info!(
            "Report #{} built for {} ({}, {} points)",
            ticket.generation(),
            request.roi.center,
            report.status,
            report.data_points
        );
        ReportOutcome::Built(report)
    }

    async fn build(&self, request: &ReportRequest) -> Report {
        let (place_name, fan_in) = tokio::join!(
            self.geocoder.resolve(request.roi.center),
            self.fan_out(request)
        );
        self.assemble(request, place_name, fan_in)
    }

    async fn fan_out(&self, request: &ReportRequest) -> FanIn {
        let s = &self.settings;
        let query = request.query();
        let threshold = request.threshold;
        let params = request.forecast;

        let mut fan_in = FanIn::new();
        let mut set = JoinSet::new();

        let series = self.providers.series.clone();
        let limit = s.series_timeout;
        set.spawn(async move {
            Settlement::Series(bounded(limit, "NDVI series", series.fetch_series(&query)).await)
        });
        fan_in.series = Slot::Waiting;

        if let Some(peaks) = self.providers.peaks.clone() {
            let limit = s.peaks_timeout;
            set.spawn(async move {
                Settlement::Peaks(
                    bounded(limit, "bloom peaks", peaks.fetch_peaks(&query, threshold)).await,
                )
            });
            fan_in.peaks = Slot::Waiting;
        }

        if let Some(forecast) = self.providers.forecast.clone() {
            let limit = s.forecast_timeout;
            set.spawn(async move {
                Settlement::Forecast(
                    bounded(limit, "forecast", forecast.fetch_forecast(&query, &params)).await,
                )
            });
            fan_in.forecast = Slot::Waiting;
        }

        if let Some(thumbnail) = self.providers.thumbnail.clone() {
            let limit = s.thumbnail_timeout;
            set.spawn(async move {
                Settlement::Thumbnail(
                    bounded(limit, "thumbnail", thumbnail.fetch_thumbnail(&query)).await,
                )
            });
            fan_in.thumbnail = Slot::Waiting;
        }

        if let Some(analysis) = self.providers.analysis.clone() {
            let limit = s.analysis_timeout;
            set.spawn(async move {
                Settlement::Analysis(
                    bounded(
                        limit,
                        "analysis",
                        analysis.fetch_analysis(&query, threshold, &params),
                    )
                    .await,
                )
            });
            fan_in.analysis = Slot::Waiting;
        }

        fan_in.track(set.len());
        tracing::debug!("Fanned out {} upstream call(s) for {}", set.len(), query.roi.center);

        let deadline = tokio::time::sleep(s.build_timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                joined = set.join_next() => match joined {
                    Some(Ok(settlement)) => {
                        fan_in.record(settlement);
                        tracing::debug!("Fan-in progress: {}", fan_in.state);
                        if fan_in.series_unusable() {
                            // Nothing else can be used without NDVI data
                            set.abort_all();
                            fan_in.cancel_waiting();
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!("Upstream task ended abnormally: {}", e);
                        fan_in.lost();
                    }
                    None => break,
                },
                _ = &mut deadline => {
                    tracing::warn!(
                        "Report deadline of {:?} reached with {} call(s) outstanding",
                        s.build_timeout,
                        fan_in.outstanding
                    );
                    break;
                }
            }
        }

        fan_in
    }

    fn assemble(&self, request: &ReportRequest, place_name: String, mut fan_in: FanIn) -> Report {
        let context = request.context();
        let threshold = request.threshold;
        let mut notes = Vec::new();
        let mut sections = SectionFlags {
            forecast: fan_in.forecast.status(),
            analysis: fan_in.analysis.status(),
            peaks: fan_in.peaks.status(),
            thumbnail: fan_in.thumbnail.status(),
        };

        let series = match fan_in.series.take() {
            Slot::Settled(Ok(series)) if !series.is_empty() => series,
            other => {
                let reason = match other {
                    Slot::Settled(Ok(_))
                    | Slot::Settled(Err(BloomWatchError::DataUnavailable(_))) => {
                        "No NDVI data available for this region and date range".to_string()
                    }
                    Slot::Settled(Err(e)) => {
                        log_section_error("NDVI series", &e);
                        "NDVI data could not be retrieved for this region".to_string()
                    }
                    Slot::Waiting | Slot::Disabled | Slot::Cancelled => {
                        "NDVI data request did not complete in time".to_string()
                    }
                };
                fan_in.settle(ReportStatus::DataUnavailable);
                tracing::debug!("Build {}", fan_in.state);
                return Report::unavailable(context, place_name, sections, reason);
            }
        };

        let mut forecast_series = Series::forecast(Vec::new());
        match fan_in.forecast.take() {
            Slot::Disabled | Slot::Cancelled => {}
            Slot::Settled(Ok(ForecastOutcome::Predicted(predicted))) => {
                if predicted.is_empty() {
                    sections.forecast = SectionStatus::Skipped;
                    notes.push("Forecast returned no predictions.".to_string());
                } else {
                    forecast_series = predicted;
                }
            }
            Slot::Settled(Ok(ForecastOutcome::Skipped { reason })) => {
                sections.forecast = SectionStatus::Skipped;
                notes.push(format!("Forecast skipped: {}", reason));
            }
            Slot::Settled(Err(e)) => {
                log_section_error("forecast", &e);
                notes.push(if sections.forecast == SectionStatus::TimedOut {
                    "Forecast timed out; the report uses historical data only.".to_string()
                } else {
                    "Forecast unavailable; the report uses historical data only.".to_string()
                });
            }
            Slot::Waiting => {
                notes.push("Forecast timed out; the report uses historical data only.".to_string())
            }
        }

        let fused = SeriesFusion::with_overlap_days(self.settings.overlap_days)
            .fuse(&series, &forecast_series);
        let forecast = forecast_summary(&fused.forecast_series());
        if forecast.is_none() && !forecast_series.is_empty() {
            sections.forecast = SectionStatus::Skipped;
            notes.push("Forecast covers no dates after the latest observation.".to_string());
        }

        let detected = BloomDetector::detect(&series, threshold);
        let all_blooms = match fan_in.peaks.take() {
            Slot::Disabled | Slot::Cancelled => detected,
            Slot::Settled(Ok(indices)) => BloomDetector::from_indices(&series, &indices, threshold),
            Slot::Settled(Err(e)) => {
                log_section_error("remote bloom peaks", &e);
                notes.push("Remote bloom peaks unavailable; using locally detected peaks.".to_string());
                detected
            }
            Slot::Waiting => {
                notes.push("Remote bloom peaks timed out; using locally detected peaks.".to_string());
                detected
            }
        };
        let blooms = strongest_blooms(&all_blooms, self.settings.top_blooms);

        let trend = TrendClassifier::classify(&series, self.settings.trend_window);
        let overall_health =
            trend.map(|t| VegetationClassifier::overall_health(t.mean_ndvi, t.slope));
        let current = series.last().map(|p| CurrentStatus {
            date: p.date,
            ndvi: p.ndvi,
            band: VegetationClassifier::classify(p.ndvi),
        });

        let recommendations = match &current {
            Some(c) => self.engine.evaluate(&RuleContext {
                ndvi: c.ndvi,
                window_delta: trend.map(|t| t.delta_over_window).unwrap_or(0.0),
                month: c.date.month(),
            }),
            None => Vec::new(),
        };

        // Cosmetic: failures are not surfaced
        let thumbnail_url = match fan_in.thumbnail.take() {
            Slot::Settled(Ok(url)) => Some(url),
            Slot::Settled(Err(e)) => {
                tracing::debug!("Thumbnail unavailable: {}", e);
                None
            }
            _ => None,
        };

        let analysis = match fan_in.analysis.take() {
            Slot::Settled(Ok(analysis)) => Some(analysis),
            Slot::Settled(Err(e)) => {
                log_section_error("full analysis", &e);
                notes.push("Full analysis unavailable; showing locally computed results.".to_string());
                None
            }
            Slot::Waiting => {
                notes.push("Full analysis timed out; showing locally computed results.".to_string());
                None
            }
            Slot::Disabled | Slot::Cancelled => None,
        };

        let status = if sections.forecast.is_failure() || sections.analysis.is_failure() {
            ReportStatus::Partial
        } else {
            ReportStatus::Complete
        };
        fan_in.settle(status);
        tracing::debug!("Build {}", fan_in.state);

        Report {
            context,
            status,
            place_name,
            current,
            trend,
            overall_health,
            data_points: series.len(),
            fused,
            forecast,
            total_blooms: all_blooms.len(),
            blooms,
            recommendations,
            thumbnail_url,
            analysis,
            sections,
            notes,
        }
    }
}
