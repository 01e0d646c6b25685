use super::{
    seasonal::{SummerHeatRule, WinterDormancyRule},
    vegetation::{
        DeclineInvestigationRule, DroughtStressWatchRule, ExcellentHealthRule,
        FavorableGrowthRule, HarvestTimingRule, HealthyContinueRule, ModerateMaintenanceRule,
        SparseVegetationRule, WaterOrBareRule,
    },
    Rule, RuleContext, RuleKind,
};
use crate::models::Recommendation;

/// Ordered advisory rule table. Every matching rule contributes; band rules
/// come first and the seasonal overlay last.
pub struct RecommendationEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl RecommendationEngine {
    pub fn new() -> Self {
        let rules: Vec<Box<dyn Rule>> = vec![
            Box::new(WaterOrBareRule),
            Box::new(SparseVegetationRule),
            Box::new(DroughtStressWatchRule),
            Box::new(ModerateMaintenanceRule),
            Box::new(DeclineInvestigationRule),
            Box::new(HealthyContinueRule),
            Box::new(FavorableGrowthRule),
            Box::new(ExcellentHealthRule),
            Box::new(HarvestTimingRule),
            Box::new(WinterDormancyRule),
            Box::new(SummerHeatRule),
        ];

        Self::with_rules(rules)
    }

    pub fn with_rules(mut rules: Vec<Box<dyn Rule>>) -> Self {
        // Stable sort keeps table order within each kind
        rules.sort_by_key(|r| r.kind());
        Self { rules }
    }

    pub fn evaluate(&self, ctx: &RuleContext) -> Vec<Recommendation> {
        let mut out = Vec::new();
        let mut band_closed = false;

        for rule in &self.rules {
            if band_closed && rule.kind() == RuleKind::NdviBand {
                continue;
            }
            if let Some(rec) = rule.evaluate(ctx) {
                if rule.is_terminal() && rule.kind() == RuleKind::NdviBand {
                    band_closed = true;
                }
                out.push(rec);
            }
        }

        out
    }

    /// Advisory text only, in output order
    pub fn recommend(&self, current_ndvi: f64, window_delta: f64, month: u32) -> Vec<String> {
        self.evaluate(&RuleContext {
            ndvi: current_ndvi,
            window_delta,
            month,
        })
        .into_iter()
        .map(|r| r.message)
        .collect()
    }

    pub fn list_rules(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new()
    }
}
