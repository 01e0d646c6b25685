use super::{
    BloomEvent, CurrentStatus, DateRange, ForecastSummary, FusedSeries, OverallHealth,
    Recommendation, RegionOfInterest, RemoteAnalysis, TrendResult,
};
use serde::Serialize;

/// Request parameters echoed back in the report
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportContext {
    pub roi: RegionOfInterest,
    pub date_range: DateRange,
    pub threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportStatus {
    /// Every enabled section was produced
    Complete,
    /// Historical analysis succeeded but an optional section is missing
    Partial,
    /// The NDVI series was empty or could not be fetched
    DataUnavailable,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Complete => "Complete",
            ReportStatus::Partial => "Partial",
            ReportStatus::DataUnavailable => "No Data",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an optional upstream section settled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SectionStatus {
    #[default]
    Disabled,
    Available,
    /// Provider explicitly declined (e.g. forecast skipped for water)
    Skipped,
    Failed,
    /// The build finished before the call settled
    TimedOut,
    /// Abandoned because the NDVI series was empty or failed
    Cancelled,
}

impl SectionStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, SectionStatus::Failed | SectionStatus::TimedOut)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SectionFlags {
    pub forecast: SectionStatus,
    pub analysis: SectionStatus,
    pub peaks: SectionStatus,
    pub thumbnail: SectionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub context: ReportContext,
    pub status: ReportStatus,
    pub place_name: String,
    pub current: Option<CurrentStatus>,
    pub trend: Option<TrendResult>,
    pub overall_health: Option<OverallHealth>,
    pub fused: FusedSeries,
    pub data_points: usize,
    pub forecast: Option<ForecastSummary>,
    /// Strongest bloom events, chronological
    pub blooms: Vec<BloomEvent>,
    pub total_blooms: usize,
    pub recommendations: Vec<Recommendation>,
    pub thumbnail_url: Option<String>,
    pub analysis: Option<RemoteAnalysis>,
    pub sections: SectionFlags,
    pub notes: Vec<String>,
}

impl Report {
    pub fn unavailable(
        context: ReportContext,
        place_name: String,
        sections: SectionFlags,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            context,
            status: ReportStatus::DataUnavailable,
            place_name,
            current: None,
            trend: None,
            overall_health: None,
            fused: FusedSeries::default(),
            data_points: 0,
            forecast: None,
            blooms: Vec::new(),
            total_blooms: 0,
            recommendations: Vec::new(),
            thumbnail_url: None,
            analysis: None,
            sections,
            notes: vec![reason.into()],
        }
    }
}
