use crate::models::{BloomEvent, Series};

pub const MIN_BLOOM_THRESHOLD: f64 = 0.1;
pub const MAX_BLOOM_THRESHOLD: f64 = 1.0;

/// Finds bloom events: interior local maxima at or above a threshold.
///
/// A point is a peak when it rises strictly above its predecessor and is not
/// exceeded by its successor, so a flat plateau counts once, on its leading
/// edge. Endpoints are never peaks.
pub struct BloomDetector;

impl BloomDetector {
    pub fn detect(series: &Series, threshold: f64) -> Vec<BloomEvent> {
        let points = series.points();
        if points.len() < 3 {
            return Vec::new();
        }

        (1..points.len() - 1)
            .filter(|&i| Self::is_peak(series, i, threshold))
            .map(|i| BloomEvent {
                index: i,
                date: points[i].date,
                ndvi: points[i].ndvi,
            })
            .collect()
    }

    /// Map externally computed peak indices onto the series. Indices that are
    /// out of range, below the threshold or not a local maximum of this
    /// series are discarded.
    pub fn from_indices(series: &Series, indices: &[usize], threshold: f64) -> Vec<BloomEvent> {
        let points = series.points();
        let mut events: Vec<BloomEvent> = indices
            .iter()
            .copied()
            .filter(|&index| Self::is_peak(series, index, threshold))
            .map(|index| BloomEvent {
                index,
                date: points[index].date,
                ndvi: points[index].ndvi,
            })
            .collect();
        events.sort_by_key(|e| e.index);
        events.dedup_by_key(|e| e.index);
        events
    }

    /// Interior point, strictly above its predecessor, not exceeded by its
    /// successor and at or above the threshold
    fn is_peak(series: &Series, index: usize, threshold: f64) -> bool {
        let points = series.points();
        if index == 0 || index + 1 >= points.len() {
            return false;
        }
        let (prev, cur, next) = (
            points[index - 1].ndvi,
            points[index].ndvi,
            points[index + 1].ndvi,
        );
        cur >= threshold && cur > prev && cur >= next
    }

    /// Clamp a caller-supplied threshold into the supported range
    pub fn clamp_threshold(threshold: f64) -> f64 {
        threshold.clamp(MIN_BLOOM_THRESHOLD, MAX_BLOOM_THRESHOLD)
    }
}
