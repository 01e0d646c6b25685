use crate::models::{BloomEvent, ObservationPoint};

/// Mean NDVI over a set of points
pub fn mean_ndvi(points: &[ObservationPoint]) -> Option<f64> {
    if points.is_empty() {
        None
    } else {
        Some(points.iter().map(|p| p.ndvi).sum::<f64>() / points.len() as f64)
    }
}

pub fn min_ndvi(points: &[ObservationPoint]) -> Option<f64> {
    points.iter().map(|p| p.ndvi).reduce(f64::min)
}

pub fn max_ndvi(points: &[ObservationPoint]) -> Option<f64> {
    points.iter().map(|p| p.ndvi).reduce(f64::max)
}

/// Least-squares slope of NDVI against observation index. Zero for fewer
/// than two points.
pub fn linear_slope(points: &[ObservationPoint]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = points.iter().map(|p| p.ndvi).sum::<f64>() / n as f64;

    let (num, den) = points
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, p)| {
            let dx = i as f64 - x_mean;
            (num + dx * (p.ndvi - y_mean), den + dx * dx)
        });
    num / den
}

/// Keep the `n` strongest bloom events, returned in chronological order.
/// Equal NDVI values favour the earlier event.
pub fn strongest_blooms(events: &[BloomEvent], n: usize) -> Vec<BloomEvent> {
    let mut ranked: Vec<BloomEvent> = events.to_vec();
    ranked.sort_by(|a, b| {
        b.ndvi
            .partial_cmp(&a.ndvi)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.index.cmp(&b.index))
    });
    ranked.truncate(n);
    ranked.sort_by_key(|e| e.index);
    ranked
}

/// Round to a fixed number of decimals for display
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
