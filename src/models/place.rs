use serde::{Deserialize, Serialize};

/// Structured address fields returned by reverse geocoding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub region: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub display_name: Option<String>,
}
