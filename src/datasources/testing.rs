//! Scripted providers for exercising the orchestrator and resolver without
//! a network.

use super::{
    AnalysisProvider, BloomPeakProvider, ForecastParams, ForecastProvider, NdviSeriesProvider,
    RegionQuery, ReverseGeocoder, ThumbnailProvider,
};
use crate::error::{BloomWatchError, Result};
use crate::models::{
    Coordinate, ForecastOutcome, GeocodeResponse, ObservationPoint, RemoteAnalysis, Series,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Returns a fixed outcome after an optional delay and counts calls
pub struct Scripted<T> {
    outcome: Option<T>,
    delay: Duration,
    calls: AtomicUsize,
}

impl<T: Clone + Send + Sync> Scripted<T> {
    pub fn ok(value: T) -> Arc<Self> {
        Self::delayed(value, Duration::ZERO)
    }

    pub fn delayed(value: T, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            outcome: Some(value),
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            outcome: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn respond(&self) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome
            .clone()
            .ok_or_else(|| BloomWatchError::UpstreamFailure("scripted failure".to_string()))
    }
}

#[async_trait]
impl NdviSeriesProvider for Scripted<Series> {
    async fn fetch_series(&self, _query: &RegionQuery) -> Result<Series> {
        self.respond().await
    }
}

#[async_trait]
impl BloomPeakProvider for Scripted<Vec<usize>> {
    async fn fetch_peaks(&self, _query: &RegionQuery, _threshold: f64) -> Result<Vec<usize>> {
        self.respond().await
    }
}

#[async_trait]
impl ForecastProvider for Scripted<ForecastOutcome> {
    async fn fetch_forecast(
        &self,
        _query: &RegionQuery,
        _params: &ForecastParams,
    ) -> Result<ForecastOutcome> {
        self.respond().await
    }
}

#[async_trait]
impl ThumbnailProvider for Scripted<String> {
    async fn fetch_thumbnail(&self, _query: &RegionQuery) -> Result<String> {
        self.respond().await
    }
}

#[async_trait]
impl AnalysisProvider for Scripted<RemoteAnalysis> {
    async fn fetch_analysis(
        &self,
        _query: &RegionQuery,
        _threshold: f64,
        _params: &ForecastParams,
    ) -> Result<RemoteAnalysis> {
        self.respond().await
    }
}

#[async_trait]
impl ReverseGeocoder for Scripted<GeocodeResponse> {
    async fn reverse(&self, _coordinate: Coordinate) -> Result<GeocodeResponse> {
        self.respond().await
    }
}

/// Build a series with one point every `step_days` starting at `start`
pub fn series_from(start: NaiveDate, step_days: i64, values: &[f64]) -> Vec<ObservationPoint> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| ObservationPoint::new(start + chrono::Duration::days(step_days * i as i64), *v))
        .collect()
}
