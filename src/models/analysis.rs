use super::vegetation::VegetationBand;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Local NDVI maximum at or above the bloom threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloomEvent {
    /// Index into the historical series
    pub index: usize,
    pub date: NaiveDate,
    pub ndvi: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Improving,
    Declining,
    #[default]
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Improving => "↑ Improving",
            TrendDirection::Declining => "↓ Declining",
            TrendDirection::Stable => "→ Stable",
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub direction: TrendDirection,
    /// Full-series statistics
    pub mean_ndvi: f64,
    pub min_ndvi: f64,
    pub max_ndvi: f64,
    /// Last minus first value inside the trailing window
    pub delta_over_window: f64,
    pub window_len: usize,
    /// Least-squares NDVI change per observation over the whole series
    pub slope: f64,
}

/// Latest observed vegetation state
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurrentStatus {
    pub date: NaiveDate,
    pub ndvi: f64,
    pub band: VegetationBand,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub points: usize,
    pub predicted_mean_ndvi: f64,
    pub direction: TrendDirection,
    pub interpretation: VegetationBand,
}

/// Server-side analysis attached to the report when the provider answers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteAnalysis {
    pub health_status: Option<String>,
    pub health_description: Option<String>,
    pub formatted_output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ForecastOutcome {
    Predicted(super::Series),
    Skipped { reason: String },
}
