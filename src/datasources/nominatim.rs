use super::ReverseGeocoder;
use crate::config::GeocodingConfig;
use crate::error::{BloomWatchError, Result};
use crate::models::{Coordinate, GeocodeResponse};
use async_trait::async_trait;

/// Reverse geocoding against a Nominatim-compatible service
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        // Nominatim's usage policy rejects requests without an identifying agent
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn reverse_url(&self, coordinate: Coordinate) -> String {
        format!(
            "{}/reverse?format=json&lat={}&lon={}&zoom=10&addressdetails=1",
            self.base_url,
            coordinate.latitude(),
            coordinate.longitude()
        )
    }

    pub async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/status?format=json", self.base_url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            BloomWatchError::UpstreamFailure(format!("Nominatim: {}", e))
        })?;

        Ok(response.status().is_success())
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimClient {
    async fn reverse(&self, coordinate: Coordinate) -> Result<GeocodeResponse> {
        let url = self.reverse_url(coordinate);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                BloomWatchError::UpstreamTimeout("Nominatim".to_string())
            } else {
                BloomWatchError::UpstreamFailure(format!("Nominatim: {}", e))
            }
        })?;

        if !response.status().is_success() {
            return Err(BloomWatchError::UpstreamFailure(format!(
                "Nominatim returned {}",
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            BloomWatchError::MalformedResponse(format!(
                "Failed to parse Nominatim response: {}",
                e
            ))
        })
    }
}
