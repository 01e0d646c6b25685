pub mod bloomwatch_api;
pub mod gibs;
pub mod nominatim;
#[cfg(test)]
pub mod testing;

pub use bloomwatch_api::BloomWatchApiClient;
pub use gibs::GibsThumbnail;
pub use nominatim::NominatimClient;

use crate::error::Result;
use crate::models::{
    Coordinate, DateRange, ForecastOutcome, GeocodeResponse, RegionOfInterest, RemoteAnalysis,
    Series,
};
use async_trait::async_trait;

/// Region and period every analytic upstream is asked about
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionQuery {
    pub roi: RegionOfInterest,
    pub date_range: DateRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastParams {
    /// Look-back window the forecaster conditions on
    pub look_back: usize,
    /// Number of future daily steps to predict
    pub future_steps: usize,
}

impl Default for ForecastParams {
    fn default() -> Self {
        Self {
            look_back: 30,
            future_steps: 60,
        }
    }
}

/// Observed NDVI for a region. An empty series is a valid answer.
#[async_trait]
pub trait NdviSeriesProvider: Send + Sync {
    async fn fetch_series(&self, query: &RegionQuery) -> Result<Series>;
}

/// Bloom peak indices into the series the NDVI provider returns.
///
/// Indices refer to the provider's raw frame. `Series::new` sorts, drops
/// repeated dates and non-finite values, so when it changes anything every
/// later index shifts. Callers re-check each index against the normalized
/// series with `BloomDetector::from_indices`, which drops any that no longer
/// land on a local maximum.
#[async_trait]
pub trait BloomPeakProvider: Send + Sync {
    async fn fetch_peaks(&self, query: &RegionQuery, threshold: f64) -> Result<Vec<usize>>;
}

#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn fetch_forecast(
        &self,
        query: &RegionQuery,
        params: &ForecastParams,
    ) -> Result<ForecastOutcome>;
}

/// Preview image URL for the region
#[async_trait]
pub trait ThumbnailProvider: Send + Sync {
    async fn fetch_thumbnail(&self, query: &RegionQuery) -> Result<String>;
}

#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn fetch_analysis(
        &self,
        query: &RegionQuery,
        threshold: f64,
        params: &ForecastParams,
    ) -> Result<RemoteAnalysis>;
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, coordinate: Coordinate) -> Result<GeocodeResponse>;
}
