use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesOrigin {
    #[default]
    Historical,
    Forecast,
}

/// One NDVI measurement (or prediction) on a calendar date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationPoint {
    pub date: NaiveDate,
    pub ndvi: f64,
}

impl ObservationPoint {
    pub fn new(date: NaiveDate, ndvi: f64) -> Self {
        Self { date, ndvi }
    }
}

/// Chronological NDVI series. Dates are strictly increasing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    origin: SeriesOrigin,
    points: Vec<ObservationPoint>,
}

impl Series {
    /// Build a series from unordered provider output. Points are sorted by
    /// date, the first point for a repeated date wins, and non-finite values
    /// are dropped.
    pub fn new(origin: SeriesOrigin, mut points: Vec<ObservationPoint>) -> Self {
        points.retain(|p| p.ndvi.is_finite());
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);
        Self { origin, points }
    }

    pub fn historical(points: Vec<ObservationPoint>) -> Self {
        Self::new(SeriesOrigin::Historical, points)
    }

    pub fn forecast(points: Vec<ObservationPoint>) -> Self {
        Self::new(SeriesOrigin::Forecast, points)
    }

    #[cfg(test)]
    pub fn origin(&self) -> SeriesOrigin {
        self.origin
    }

    pub fn points(&self) -> &[ObservationPoint] {
        &self.points
    }

    #[cfg(test)]
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.ndvi).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&ObservationPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&ObservationPoint> {
        self.points.last()
    }

    pub fn get(&self, index: usize) -> Option<&ObservationPoint> {
        self.points.get(index)
    }
}

/// A single date on the fused timeline. Both values are present only where
/// history and forecast overlap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusedPoint {
    pub date: NaiveDate,
    pub historical: Option<f64>,
    pub forecast: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FusedSeries {
    pub points: Vec<FusedPoint>,
}

impl FusedSeries {
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Observed portion of the timeline as a plain series
    #[cfg(test)]
    pub fn historical_series(&self) -> Series {
        Series::historical(
            self.points
                .iter()
                .filter_map(|p| p.historical.map(|v| ObservationPoint::new(p.date, v)))
                .collect(),
        )
    }

    pub fn forecast_series(&self) -> Series {
        Series::forecast(
            self.points
                .iter()
                .filter_map(|p| p.forecast.map(|v| ObservationPoint::new(p.date, v)))
                .collect(),
        )
    }
}
