use crate::models::{HealthStatus, OverallHealth, VegetationBand};

/// Ordered highest lower bound first. The last row catches everything.
pub const VEGETATION_BANDS: [VegetationBand; 6] = [
    VegetationBand {
        lower_bound: 0.7,
        label: "Very Dense Vegetation",
        health: HealthStatus::PeakHealth,
        description: "Extremely healthy vegetation, likely forest or mature canopy",
    },
    VegetationBand {
        lower_bound: 0.6,
        label: "Dense Vegetation",
        health: HealthStatus::Thriving,
        description: "Very healthy plants, forests or mature crops",
    },
    VegetationBand {
        lower_bound: 0.4,
        label: "Healthy Vegetation",
        health: HealthStatus::Growing,
        description: "Good plant health, crops in growth phase",
    },
    VegetationBand {
        lower_bound: 0.2,
        label: "Sparse Vegetation",
        health: HealthStatus::Moderate,
        description: "Grasslands, shrubs, or crops in early growth stage",
    },
    VegetationBand {
        lower_bound: 0.1,
        label: "Bare/Sparse",
        health: HealthStatus::Stressed,
        description: "Very little plant life, possibly drought or early growth",
    },
    VegetationBand {
        lower_bound: f64::NEG_INFINITY,
        label: "Water/Non-vegetated",
        health: HealthStatus::Poor,
        description: "Water, desert, sand, rock, or areas with almost no vegetation",
    },
];

pub struct VegetationClassifier;

impl VegetationClassifier {
    pub fn classify(ndvi: f64) -> VegetationBand {
        // NaN reaches no bound and falls through to the catch-all row
        let fallback = VEGETATION_BANDS[VEGETATION_BANDS.len() - 1];
        VEGETATION_BANDS
            .iter()
            .find(|band| band.lower_bound <= ndvi)
            .copied()
            .unwrap_or(fallback)
    }
}

/// Slopes within this distance of zero read as steady
pub const HEALTH_SLOPE_TOLERANCE: f64 = 0.01;

/// Overall health rows per mean-NDVI tier: (rising, falling, steady)
const OVERALL_HEALTH: [(f64, [OverallHealth; 3]); 3] = [
    (
        0.1,
        [
            health("Improving", "Vegetation getting healthier"),
            health("Declining", "Vegetation declining"),
            health("Stable", "Vegetation stable"),
        ],
    ),
    (
        0.3,
        [
            health("Growing", "Vegetation actively growing"),
            health("Stressed", "Vegetation under stress"),
            health("Healthy", "Vegetation in good condition"),
        ],
    ),
    (
        0.6,
        [
            health("Thriving", "Vegetation thriving"),
            health("Peak Declining", "Vegetation past peak"),
            health("Peak Health", "Vegetation at peak health"),
        ],
    ),
];

const BARE_AREA: OverallHealth = health("Non-vegetated/Bare Area", "Very low NDVI");

const fn health(status: &'static str, description: &'static str) -> OverallHealth {
    OverallHealth {
        status,
        description,
    }
}

impl VegetationClassifier {
    /// Overall condition from the mean NDVI of the period and its slope.
    /// Below 0.1 the slope is ignored.
    pub fn overall_health(mean_ndvi: f64, slope: f64) -> OverallHealth {
        let Some((_, row)) = OVERALL_HEALTH
            .iter()
            .rev()
            .find(|(lower, _)| *lower <= mean_ndvi)
        else {
            return BARE_AREA;
        };

        if slope > HEALTH_SLOPE_TOLERANCE {
            row[0]
        } else if slope < -HEALTH_SLOPE_TOLERANCE {
            row[1]
        } else {
            row[2]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_boundaries() {
        let cases = [
            (0.95, "Very Dense Vegetation"),
            (0.7, "Very Dense Vegetation"),
            (0.69, "Dense Vegetation"),
            (0.6, "Dense Vegetation"),
            (0.5, "Healthy Vegetation"),
            (0.4, "Healthy Vegetation"),
            (0.39, "Sparse Vegetation"),
            (0.2, "Sparse Vegetation"),
            (0.15, "Bare/Sparse"),
            (0.1, "Bare/Sparse"),
            (0.09, "Water/Non-vegetated"),
            (-0.8, "Water/Non-vegetated"),
        ];

        for (ndvi, label) in cases {
            assert_eq!(VegetationClassifier::classify(ndvi).label, label, "ndvi {}", ndvi);
        }
    }

    #[test]
    fn health_follows_band() {
        assert_eq!(
            VegetationClassifier::classify(0.75).health,
            HealthStatus::PeakHealth
        );
        assert_eq!(
            VegetationClassifier::classify(0.45).health,
            HealthStatus::Growing
        );
        assert_eq!(
            VegetationClassifier::classify(0.0).health,
            HealthStatus::Poor
        );
    }

    #[test]
    fn bands_are_strictly_ordered() {
        assert!(VEGETATION_BANDS
            .windows(2)
            .all(|w| w[0].lower_bound > w[1].lower_bound));
        assert_eq!(
            VEGETATION_BANDS[VEGETATION_BANDS.len() - 1].lower_bound,
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn every_value_maps_to_exactly_one_band() {
        let mut v = -2.0;
        while v <= 2.0 {
            let matching = VEGETATION_BANDS
                .iter()
                .enumerate()
                .filter(|(i, band)| {
                    let upper = if *i == 0 {
                        f64::INFINITY
                    } else {
                        VEGETATION_BANDS[i - 1].lower_bound
                    };
                    band.lower_bound <= v && v < upper
                })
                .count();
            assert_eq!(matching, 1, "ndvi {}", v);
            assert!(VEGETATION_BANDS.contains(&VegetationClassifier::classify(v)));
            v += 0.005;
        }
    }

    #[test]
    fn extreme_inputs_are_classified() {
        assert_eq!(
            VegetationClassifier::classify(f64::INFINITY).label,
            "Very Dense Vegetation"
        );
        assert_eq!(
            VegetationClassifier::classify(f64::NEG_INFINITY).label,
            "Water/Non-vegetated"
        );
        assert_eq!(
            VegetationClassifier::classify(f64::NAN).label,
            "Water/Non-vegetated"
        );
    }

    #[test]
    fn overall_health_table() {
        let cases = [
            (0.05, 0.5, "Non-vegetated/Bare Area"),
            (0.05, -0.5, "Non-vegetated/Bare Area"),
            (0.2, 0.02, "Improving"),
            (0.2, -0.02, "Declining"),
            (0.2, 0.0, "Stable"),
            (0.45, 0.02, "Growing"),
            (0.45, -0.02, "Stressed"),
            (0.45, 0.005, "Healthy"),
            (0.75, 0.02, "Thriving"),
            (0.75, -0.02, "Peak Declining"),
            (0.75, -0.005, "Peak Health"),
        ];
        for (mean, slope, expected) in cases {
            assert_eq!(
                VegetationClassifier::overall_health(mean, slope).status,
                expected,
                "mean {} slope {}",
                mean,
                slope
            );
        }
    }

    #[test]
    fn overall_health_tier_bounds_are_inclusive() {
        assert_eq!(VegetationClassifier::overall_health(0.1, 0.0).status, "Stable");
        assert_eq!(VegetationClassifier::overall_health(0.3, 0.0).status, "Healthy");
        assert_eq!(VegetationClassifier::overall_health(0.6, 0.0).status, "Peak Health");
        // Exactly at the tolerance is still steady
        assert_eq!(VegetationClassifier::overall_health(0.45, 0.01).status, "Healthy");
        assert_eq!(
            VegetationClassifier::overall_health(f64::NAN, 0.0).status,
            "Non-vegetated/Bare Area"
        );
    }
}
