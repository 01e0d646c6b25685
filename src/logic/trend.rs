use super::calculations::{linear_slope, max_ndvi, mean_ndvi, min_ndvi};
use crate::models::{Series, TrendDirection, TrendResult};

pub const DEFAULT_TREND_WINDOW: usize = 60;

/// Changes smaller than this over the window are reported as stable
pub const STABLE_DELTA: f64 = 0.02;

pub struct TrendClassifier;

impl TrendClassifier {
    /// Classify the trend over the trailing `window` points. Mean, min and
    /// max cover the whole series. Returns `None` for an empty series.
    pub fn classify(series: &Series, window: usize) -> Option<TrendResult> {
        let points = series.points();
        let last = points.last()?;

        let window_len = window.clamp(1, points.len());
        let first = &points[points.len() - window_len];
        let delta = last.ndvi - first.ndvi;

        Some(TrendResult {
            direction: Self::direction(delta),
            mean_ndvi: mean_ndvi(points)?,
            min_ndvi: min_ndvi(points)?,
            max_ndvi: max_ndvi(points)?,
            delta_over_window: delta,
            window_len,
            slope: linear_slope(points),
        })
    }

    pub fn direction(delta: f64) -> TrendDirection {
        if delta.abs() < STABLE_DELTA {
            TrendDirection::Stable
        } else if delta > 0.0 {
            TrendDirection::Improving
        } else {
            TrendDirection::Declining
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ObservationPoint;
    use chrono::NaiveDate;

    fn series(values: &[f64]) -> Series {
        let start = NaiveDate::from_ymd_opt(2022, 6, 1).unwrap();
        Series::historical(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| ObservationPoint::new(start + chrono::Duration::days(i as i64), *v))
                .collect(),
        )
    }

    #[test]
    fn empty_series_has_no_trend() {
        assert!(TrendClassifier::classify(&Series::default(), 60).is_none());
    }

    #[test]
    fn constant_series_is_stable() {
        for len in 2..10 {
            let s = series(&vec![0.42; len]);
            let t = TrendClassifier::classify(&s, DEFAULT_TREND_WINDOW).unwrap();
            assert_eq!(t.direction, TrendDirection::Stable);
            assert_eq!(t.delta_over_window, 0.0);
        }
    }

    #[test]
    fn single_point_is_stable() {
        let t = TrendClassifier::classify(&series(&[0.5]), 60).unwrap();
        assert_eq!(t.direction, TrendDirection::Stable);
        assert_eq!(t.window_len, 1);
    }

    #[test]
    fn improving_and_declining() {
        let up = TrendClassifier::classify(&series(&[0.2, 0.3, 0.5]), 60).unwrap();
        assert_eq!(up.direction, TrendDirection::Improving);
        assert!((up.delta_over_window - 0.3).abs() < 1e-9);

        let down = TrendClassifier::classify(&series(&[0.6, 0.5, 0.3]), 60).unwrap();
        assert_eq!(down.direction, TrendDirection::Declining);
    }

    #[test]
    fn small_change_is_stable() {
        let t = TrendClassifier::classify(&series(&[0.40, 0.45, 0.415]), 60).unwrap();
        assert_eq!(t.direction, TrendDirection::Stable);
    }

    #[test]
    fn window_limits_delta_but_not_stats() {
        // Large early rise, flat tail
        let s = series(&[0.1, 0.6, 0.6, 0.61]);
        let t = TrendClassifier::classify(&s, 3).unwrap();

        assert_eq!(t.window_len, 3);
        assert_eq!(t.direction, TrendDirection::Stable);
        assert_eq!(t.min_ndvi, 0.1);
        assert_eq!(t.max_ndvi, 0.61);
        assert!((t.mean_ndvi - 0.4775).abs() < 1e-9);

        let full = TrendClassifier::classify(&s, 60).unwrap();
        assert_eq!(full.direction, TrendDirection::Improving);
        assert_eq!(full.window_len, 4);
    }
}
