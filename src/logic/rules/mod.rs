pub mod engine;
pub mod seasonal;
pub mod vegetation;

pub use engine::RecommendationEngine;

use crate::models::Recommendation;

/// Inputs every advisory rule sees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleContext {
    /// Latest observed NDVI
    pub ndvi: f64,
    /// NDVI change across the trend window
    pub window_delta: f64,
    /// Calendar month of the latest observation, 1-12
    pub month: u32,
}

/// Rules are grouped so that band rules always precede the seasonal overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RuleKind {
    NdviBand,
    Seasonal,
}

/// Trait for advisory rules
pub trait Rule: Send + Sync {
    /// Unique identifier for this rule
    fn id(&self) -> &'static str;

    fn kind(&self) -> RuleKind;

    /// When a terminal rule fires, no later band rules are evaluated
    fn is_terminal(&self) -> bool {
        false
    }

    /// Evaluate the rule and return a recommendation if its guard matches
    fn evaluate(&self, ctx: &RuleContext) -> Option<Recommendation>;
}
