use super::{Rule, RuleContext, RuleKind};
use crate::models::{Recommendation, RecommendationCategory, Severity};

/// December through February: low NDVI may just be dormancy
pub struct WinterDormancyRule;

impl Rule for WinterDormancyRule {
    fn id(&self) -> &'static str {
        "winter_dormancy"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Seasonal
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Recommendation> {
        if !matches!(ctx.month, 12 | 1 | 2) {
            return None;
        }

        Some(
            Recommendation::new(
                self.id(),
                RecommendationCategory::Seasonal,
                Severity::Info,
                "Winter dormancy - low readings are normal for most plants this time of year",
            )
            .with_explanation(
                "Deciduous vegetation and most grasses drop chlorophyll over winter. \
                 Compare against the same months in previous years before acting. \
                 Readings are for the northern-hemisphere calendar.",
            )
            .with_data_point("Month", ctx.month),
        )
    }
}

/// June through August: heat and water stress
pub struct SummerHeatRule;

impl Rule for SummerHeatRule {
    fn id(&self) -> &'static str {
        "summer_heat"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Seasonal
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Recommendation> {
        if !matches!(ctx.month, 6..=8) {
            return None;
        }

        Some(
            Recommendation::new(
                self.id(),
                RecommendationCategory::Seasonal,
                Severity::Advisory,
                "Summer heat - monitor for water stress and irrigate if needed",
            )
            .with_explanation(
                "High temperatures raise evapotranspiration. A falling NDVI in summer \
                 is often the first visible sign of water stress.",
            )
            .with_data_point("Month", ctx.month),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(month: u32) -> RuleContext {
        RuleContext {
            ndvi: 0.3,
            window_delta: 0.0,
            month,
        }
    }

    #[test]
    fn winter_months() {
        for month in [12, 1, 2] {
            assert!(WinterDormancyRule.evaluate(&ctx(month)).is_some());
        }
        for month in 3..=11 {
            assert!(WinterDormancyRule.evaluate(&ctx(month)).is_none());
        }
    }

    #[test]
    fn summer_months() {
        for month in [6, 7, 8] {
            assert!(SummerHeatRule.evaluate(&ctx(month)).is_some());
        }
        for month in [1, 2, 3, 4, 5, 9, 10, 11, 12] {
            assert!(SummerHeatRule.evaluate(&ctx(month)).is_none());
        }
    }
}
