use crate::models::{FusedPoint, FusedSeries, Series};
use chrono::Duration;
use std::collections::BTreeMap;

/// Merges observed and forecast NDVI into one chronological timeline.
///
/// Forecast points are windowed to dates strictly after the last observed
/// date, unless an overlap of N days is configured, in which case forecast
/// points from the last N days of history are kept and merged onto the
/// matching observed dates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesFusion {
    overlap_days: u32,
}

impl SeriesFusion {
    pub fn with_overlap_days(overlap_days: u32) -> Self {
        Self { overlap_days }
    }

    pub fn fuse(&self, historical: &Series, forecast: &Series) -> FusedSeries {
        let mut by_date: BTreeMap<_, FusedPoint> = historical
            .points()
            .iter()
            .map(|p| {
                (
                    p.date,
                    FusedPoint {
                        date: p.date,
                        historical: Some(p.ndvi),
                        forecast: None,
                    },
                )
            })
            .collect();

        let window_start = historical
            .last()
            .map(|last| last.date - Duration::days(self.overlap_days as i64));

        for point in forecast.points() {
            if let Some(start) = window_start {
                if point.date <= start {
                    continue;
                }
            }

            by_date
                .entry(point.date)
                .and_modify(|fused| fused.forecast = Some(point.ndvi))
                .or_insert(FusedPoint {
                    date: point.date,
                    historical: None,
                    forecast: Some(point.ndvi),
                });
        }

        FusedSeries {
            points: by_date.into_values().collect(),
        }
    }
}
