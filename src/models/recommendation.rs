use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendationCategory {
    Monitoring,
    Drought,
    Maintenance,
    Decline,
    Growth,
    Harvest,
    Seasonal,
}

impl RecommendationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationCategory::Monitoring => "Monitoring",
            RecommendationCategory::Drought => "Drought",
            RecommendationCategory::Maintenance => "Maintenance",
            RecommendationCategory::Decline => "Decline",
            RecommendationCategory::Growth => "Growth",
            RecommendationCategory::Harvest => "Harvest",
            RecommendationCategory::Seasonal => "Seasonal",
        }
    }
}

impl std::fmt::Display for RecommendationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Advisory,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Advisory => "Advisory",
            Severity::Warning => "Warning",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Severity::Info => "ℹ",
            Severity::Advisory => "→",
            Severity::Warning => "⚠",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub label: String,
    pub value: String,
}

impl DataPoint {
    pub fn new(label: &str, value: impl std::fmt::Display) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub category: RecommendationCategory,
    pub severity: Severity,
    /// The advisory text shown to the user
    pub message: String,
    pub explanation: String,
    pub data_points: Vec<DataPoint>,
}

impl Recommendation {
    pub fn new(
        id: impl Into<String>,
        category: RecommendationCategory,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            severity,
            message: message.into(),
            explanation: String::new(),
            data_points: Vec::new(),
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn with_data_point(mut self, label: &str, value: impl std::fmt::Display) -> Self {
        self.data_points.push(DataPoint::new(label, value));
        self
    }
}
