use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Poor,
    Stressed,
    Moderate,
    Growing,
    Thriving,
    PeakHealth,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Poor => "Poor",
            HealthStatus::Stressed => "Stressed",
            HealthStatus::Moderate => "Moderate",
            HealthStatus::Growing => "Growing",
            HealthStatus::Thriving => "Thriving",
            HealthStatus::PeakHealth => "Peak Health",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Overall condition of a region from its mean NDVI and long-run slope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverallHealth {
    pub status: &'static str,
    pub description: &'static str,
}

/// A row of the vegetation band table. A value belongs to the first band,
/// scanning from the highest lower bound down, whose bound it reaches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VegetationBand {
    pub lower_bound: f64,
    pub label: &'static str,
    pub health: HealthStatus,
    pub description: &'static str,
}

impl std::fmt::Display for VegetationBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label, self.health)
    }
}
