use crate::error::{BloomWatchError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A geographic point. Latitude and longitude are clamped into range on input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(BloomWatchError::InvalidInput(format!(
                "coordinate must be finite, got ({}, {})",
                latitude, longitude
            )));
        }

        Ok(Self {
            latitude: latitude.clamp(-90.0, 90.0),
            longitude: longitude.clamp(-180.0, 180.0),
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Square area around a center coordinate over which NDVI is aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionOfInterest {
    pub center: Coordinate,
    pub size_degrees: f64,
}

impl RegionOfInterest {
    pub fn new(center: Coordinate, size_degrees: f64) -> Result<Self> {
        if !size_degrees.is_finite() || size_degrees <= 0.0 {
            return Err(BloomWatchError::InvalidInput(format!(
                "region size must be a positive number of degrees, got {}",
                size_degrees
            )));
        }

        Ok(Self {
            center,
            size_degrees,
        })
    }

    /// Bounding box as (min_lon, min_lat, max_lon, max_lat)
    pub fn bounding_box(&self) -> (f64, f64, f64, f64) {
        let half = self.size_degrees / 2.0;
        (
            self.center.longitude() - half,
            self.center.latitude() - half,
            self.center.longitude() + half,
            self.center.latitude() + half,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(BloomWatchError::InvalidInput(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}
