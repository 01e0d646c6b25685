use super::{Rule, RuleContext, RuleKind};
use crate::models::{Recommendation, RecommendationCategory, Severity};

/// Window change above which growth is called out as favorable
pub const GROWTH_DELTA: f64 = 0.01;
/// Window change below which a decline warrants investigation
pub const DECLINE_DELTA: f64 = -0.01;

fn ndvi_point(rec: Recommendation, ctx: &RuleContext) -> Recommendation {
    rec.with_data_point("Current NDVI", format!("{:.3}", ctx.ndvi))
}

/// NDVI below 0.1: water or bare land. Stops further band rules.
pub struct WaterOrBareRule;

impl Rule for WaterOrBareRule {
    fn id(&self) -> &'static str {
        "water_or_bare"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::NdviBand
    }

    fn is_terminal(&self) -> bool {
        true
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Recommendation> {
        if ctx.ndvi >= 0.1 {
            return None;
        }

        Some(ndvi_point(
            Recommendation::new(
                self.id(),
                RecommendationCategory::Monitoring,
                Severity::Info,
                "Area appears to be water or bare land and is unsuitable for vegetation monitoring",
            )
            .with_explanation(
                "NDVI below 0.1 is typical of open water, sand, rock, or built surfaces. \
                 Vegetation trends and bloom events are not meaningful here.",
            ),
            ctx,
        ))
    }
}

/// 0.1 <= NDVI < 0.2
pub struct SparseVegetationRule;

impl Rule for SparseVegetationRule {
    fn id(&self) -> &'static str {
        "sparse_vegetation"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::NdviBand
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Recommendation> {
        if !(0.1..0.2).contains(&ctx.ndvi) {
            return None;
        }

        Some(ndvi_point(
            Recommendation::new(
                self.id(),
                RecommendationCategory::Monitoring,
                Severity::Warning,
                "Sparse vegetation detected - consider soil improvement or irrigation",
            )
            .with_explanation(
                "Very little plant life is present. This may be early growth, degraded \
                 land, or the effect of prolonged dry conditions.",
            ),
            ctx,
        ))
    }
}

/// Companion to the sparse band: watch for drought stress
pub struct DroughtStressWatchRule;

impl Rule for DroughtStressWatchRule {
    fn id(&self) -> &'static str {
        "drought_stress_watch"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::NdviBand
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Recommendation> {
        if !(0.1..0.2).contains(&ctx.ndvi) {
            return None;
        }

        Some(
            Recommendation::new(
                self.id(),
                RecommendationCategory::Drought,
                Severity::Advisory,
                "Watch for drought stress and check for pest or disease issues",
            )
            .with_explanation(
                "Low vegetation density often precedes or accompanies water stress. \
                 Compare against recent rainfall before intervening.",
            ),
        )
    }
}

/// 0.2 <= NDVI < 0.4
pub struct ModerateMaintenanceRule;

impl Rule for ModerateMaintenanceRule {
    fn id(&self) -> &'static str {
        "moderate_maintenance"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::NdviBand
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Recommendation> {
        if !(0.2..0.4).contains(&ctx.ndvi) {
            return None;
        }

        Some(ndvi_point(
            Recommendation::new(
                self.id(),
                RecommendationCategory::Maintenance,
                Severity::Info,
                "Moderate vegetation health - monitor closely and consider fertilization if appropriate",
            ),
            ctx,
        ))
    }
}

/// Moderate band with a falling window trend
pub struct DeclineInvestigationRule;

impl Rule for DeclineInvestigationRule {
    fn id(&self) -> &'static str {
        "decline_investigation"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::NdviBand
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Recommendation> {
        if !(0.2..0.4).contains(&ctx.ndvi) || ctx.window_delta >= DECLINE_DELTA {
            return None;
        }

        Some(
            Recommendation::new(
                self.id(),
                RecommendationCategory::Decline,
                Severity::Warning,
                "Vegetation health is declining - investigate causes",
            )
            .with_explanation(
                "NDVI has fallen across the trend window while already in a moderate band. \
                 Common causes are water stress, pests, disease, or land use change.",
            )
            .with_data_point("Window Change", format!("{:+.3}", ctx.window_delta)),
        )
    }
}

/// 0.4 <= NDVI < 0.6
pub struct HealthyContinueRule;

impl Rule for HealthyContinueRule {
    fn id(&self) -> &'static str {
        "healthy_continue"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::NdviBand
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Recommendation> {
        if !(0.4..0.6).contains(&ctx.ndvi) {
            return None;
        }

        Some(ndvi_point(
            Recommendation::new(
                self.id(),
                RecommendationCategory::Maintenance,
                Severity::Info,
                "Good plant health - maintain current practices",
            ),
            ctx,
        ))
    }
}

/// Healthy band with a rising window trend
pub struct FavorableGrowthRule;

impl Rule for FavorableGrowthRule {
    fn id(&self) -> &'static str {
        "favorable_growth"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::NdviBand
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Recommendation> {
        if !(0.4..0.6).contains(&ctx.ndvi) || ctx.window_delta <= GROWTH_DELTA {
            return None;
        }

        Some(
            Recommendation::new(
                self.id(),
                RecommendationCategory::Growth,
                Severity::Info,
                "Favorable growth conditions - vegetation is actively growing",
            )
            .with_data_point("Window Change", format!("{:+.3}", ctx.window_delta)),
        )
    }
}

/// NDVI >= 0.6
pub struct ExcellentHealthRule;

impl Rule for ExcellentHealthRule {
    fn id(&self) -> &'static str {
        "excellent_health"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::NdviBand
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Recommendation> {
        if !(0.6..).contains(&ctx.ndvi) {
            return None;
        }

        Some(ndvi_point(
            Recommendation::new(
                self.id(),
                RecommendationCategory::Maintenance,
                Severity::Info,
                "Excellent plant health - continue current management",
            ),
            ctx,
        ))
    }
}

/// Companion to the excellent band: harvest timing
pub struct HarvestTimingRule;

impl Rule for HarvestTimingRule {
    fn id(&self) -> &'static str {
        "harvest_timing"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::NdviBand
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Recommendation> {
        if !(0.6..).contains(&ctx.ndvi) {
            return None;
        }

        Some(
            Recommendation::new(
                self.id(),
                RecommendationCategory::Harvest,
                Severity::Advisory,
                "Consider harvest timing if crops are ready",
            )
            .with_explanation(
                "Canopy density is near its seasonal maximum. For crops, peak NDVI \
                 typically precedes maturity by a few weeks.",
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(ndvi: f64, window_delta: f64) -> RuleContext {
        RuleContext {
            ndvi,
            window_delta,
            month: 4,
        }
    }

    #[test]
    fn water_rule_guard() {
        assert!(WaterOrBareRule.evaluate(&ctx(0.05, 0.0)).is_some());
        assert!(WaterOrBareRule.evaluate(&ctx(-0.3, 0.0)).is_some());
        assert!(WaterOrBareRule.evaluate(&ctx(0.1, 0.0)).is_none());
        assert!(WaterOrBareRule.is_terminal());
    }

    #[test]
    fn sparse_band_emits_two_advisories() {
        let c = ctx(0.15, 0.0);
        assert!(SparseVegetationRule.evaluate(&c).is_some());
        assert!(DroughtStressWatchRule.evaluate(&c).is_some());
        assert!(SparseVegetationRule.evaluate(&ctx(0.2, 0.0)).is_none());
    }

    #[test]
    fn decline_requires_falling_window() {
        assert!(DeclineInvestigationRule.evaluate(&ctx(0.3, -0.05)).is_some());
        assert!(DeclineInvestigationRule.evaluate(&ctx(0.3, -0.01)).is_none());
        assert!(DeclineInvestigationRule.evaluate(&ctx(0.3, 0.2)).is_none());
        assert!(DeclineInvestigationRule.evaluate(&ctx(0.5, -0.2)).is_none());
    }

    #[test]
    fn growth_requires_rising_window() {
        assert!(FavorableGrowthRule.evaluate(&ctx(0.5, 0.05)).is_some());
        assert!(FavorableGrowthRule.evaluate(&ctx(0.5, 0.01)).is_none());
        assert!(FavorableGrowthRule.evaluate(&ctx(0.3, 0.05)).is_none());
    }

    #[test]
    fn excellent_band() {
        assert!(ExcellentHealthRule.evaluate(&ctx(0.6, 0.0)).is_some());
        assert!(HarvestTimingRule.evaluate(&ctx(0.9, 0.0)).is_some());
        assert!(ExcellentHealthRule.evaluate(&ctx(0.59, 0.0)).is_none());
    }

    #[test]
    fn data_point_carries_current_ndvi() {
        let rec = HealthyContinueRule.evaluate(&ctx(0.456, 0.0)).unwrap();
        assert_eq!(rec.data_points[0].label, "Current NDVI");
        assert_eq!(rec.data_points[0].value, "0.456");
    }
}
