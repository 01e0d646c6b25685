use super::{
    AnalysisProvider, BloomPeakProvider, ForecastParams, ForecastProvider, NdviSeriesProvider,
    RegionQuery, ThumbnailProvider,
};
use crate::config::ApiConfig;
use crate::error::{BloomWatchError, Result};
use crate::models::{ForecastOutcome, ObservationPoint, RemoteAnalysis, Series};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Client for the BloomWatch analytics API (NDVI series, peaks, forecast,
/// thumbnail and full analysis endpoints)
pub struct BloomWatchApiClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct RegionRequest {
    latitude: f64,
    longitude: f64,
    roi_size_degrees: f64,
    start_date: String,
    end_date: String,
    data_source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    future_steps: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    look_back: Option<usize>,
}

impl RegionRequest {
    fn new(query: &RegionQuery) -> Self {
        Self {
            latitude: query.roi.center.latitude(),
            longitude: query.roi.center.longitude(),
            roi_size_degrees: query.roi.size_degrees,
            start_date: query.date_range.start.format("%Y-%m-%d").to_string(),
            end_date: query.date_range.end.format("%Y-%m-%d").to_string(),
            data_source: "nasa",
            threshold: None,
            future_steps: None,
            look_back: None,
        }
    }

    fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    fn with_forecast(mut self, params: &ForecastParams) -> Self {
        self.future_steps = Some(params.future_steps);
        self.look_back = Some(params.look_back);
        self
    }
}

// API response structures
#[derive(Debug, Deserialize)]
struct NdviResponse {
    #[serde(default)]
    records: Vec<NdviRecord>,
}

#[derive(Debug, Deserialize)]
struct NdviRecord {
    #[serde(rename = "Date")]
    date: Option<String>,
    #[serde(rename = "NDVI")]
    ndvi: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PeaksResponse {
    peaks: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    skipped: bool,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    dates: Vec<String>,
    #[serde(default)]
    values: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ThumbnailResponse {
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct AnalysisResponse {
    #[serde(default)]
    report: Option<AnalysisReport>,
    #[serde(default)]
    formatted_output: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnalysisReport {
    #[serde(default)]
    current_status: Option<AnalysisStatus>,
}

#[derive(Debug, Deserialize)]
struct AnalysisStatus {
    health_status: Option<String>,
    health_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

impl BloomWatchApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post<T: DeserializeOwned>(&self, endpoint: &str, body: &RegionRequest) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(%url, "BloomWatch API request");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(endpoint, e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(BloomWatchError::DataUnavailable(format!(
                "BloomWatch API {} has no data for this region",
                endpoint
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BloomWatchError::UpstreamFailure(format!(
                "BloomWatch API {} returned {}: {}",
                endpoint, status, body
            )));
        }

        response.json::<T>().await.map_err(|e| {
            BloomWatchError::MalformedResponse(format!(
                "Failed to parse BloomWatch API {} response: {}",
                endpoint, e
            ))
        })
    }

    /// Test connection to the API health endpoint
    pub async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error("/health", e))?;

        if !response.status().is_success() {
            return Ok(false);
        }

        let health: HealthResponse = response.json().await.map_err(|e| {
            BloomWatchError::MalformedResponse(format!("Failed to parse health response: {}", e))
        })?;

        Ok(health.status == "ok")
    }
}

fn transport_error(endpoint: &str, e: reqwest::Error) -> BloomWatchError {
    if e.is_timeout() {
        BloomWatchError::UpstreamTimeout(format!("BloomWatch API {}", endpoint))
    } else {
        BloomWatchError::UpstreamFailure(format!("BloomWatch API {}: {}", endpoint, e))
    }
}

/// Accepts `YYYY-MM-DD` and ISO datetimes such as `2024-03-01T00:00:00`
pub(crate) fn parse_api_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn convert_series(response: NdviResponse) -> Series {
    let points = response
        .records
        .into_iter()
        .filter_map(|r| {
            let date = parse_api_date(r.date.as_deref()?)?;
            Some(ObservationPoint::new(date, r.ndvi?))
        })
        .collect();
    Series::historical(points)
}

fn convert_forecast(response: ForecastResponse) -> Result<ForecastOutcome> {
    if response.skipped {
        return Ok(ForecastOutcome::Skipped {
            reason: response
                .reason
                .unwrap_or_else(|| "forecast skipped by provider".to_string()),
        });
    }

    if response.dates.len() != response.values.len() {
        return Err(BloomWatchError::MalformedResponse(format!(
            "forecast has {} dates but {} values",
            response.dates.len(),
            response.values.len()
        )));
    }

    let points = response
        .dates
        .iter()
        .zip(response.values)
        .map(|(raw, ndvi)| {
            parse_api_date(raw)
                .map(|date| ObservationPoint::new(date, ndvi))
                .ok_or_else(|| {
                    BloomWatchError::MalformedResponse(format!("bad forecast date '{}'", raw))
                })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ForecastOutcome::Predicted(Series::forecast(points)))
}

fn convert_analysis(response: AnalysisResponse) -> Result<RemoteAnalysis> {
    if let Some(error) = response.error {
        return Err(BloomWatchError::UpstreamFailure(format!(
            "analysis unavailable: {}",
            error
        )));
    }

    let status = response.report.and_then(|r| r.current_status);
    let (health_status, health_description) = match status {
        Some(s) => (s.health_status, s.health_description),
        None => (None, None),
    };

    Ok(RemoteAnalysis {
        health_status,
        health_description,
        formatted_output: response.formatted_output,
    })
}

#[async_trait]
impl NdviSeriesProvider for BloomWatchApiClient {
    async fn fetch_series(&self, query: &RegionQuery) -> Result<Series> {
        let response: NdviResponse = self.post("/api/ndvi", &RegionRequest::new(query)).await?;
        Ok(convert_series(response))
    }
}

#[async_trait]
impl BloomPeakProvider for BloomWatchApiClient {
    async fn fetch_peaks(&self, query: &RegionQuery, threshold: f64) -> Result<Vec<usize>> {
        let body = RegionRequest::new(query).with_threshold(threshold);
        let response: PeaksResponse = self.post("/api/peaks", &body).await?;
        Ok(response.peaks)
    }
}

#[async_trait]
impl ForecastProvider for BloomWatchApiClient {
    async fn fetch_forecast(
        &self,
        query: &RegionQuery,
        params: &ForecastParams,
    ) -> Result<ForecastOutcome> {
        let body = RegionRequest::new(query).with_forecast(params);
        let response: ForecastResponse = self.post("/api/forecast", &body).await?;
        convert_forecast(response)
    }
}

#[async_trait]
impl ThumbnailProvider for BloomWatchApiClient {
    async fn fetch_thumbnail(&self, query: &RegionQuery) -> Result<String> {
        let response: ThumbnailResponse =
            self.post("/api/ndvi-thumb", &RegionRequest::new(query)).await?;

        if response.url.is_empty() {
            return Err(BloomWatchError::UpstreamFailure(
                "thumbnail URL was empty".to_string(),
            ));
        }
        Ok(response.url)
    }
}

#[async_trait]
impl AnalysisProvider for BloomWatchApiClient {
    async fn fetch_analysis(
        &self,
        query: &RegionQuery,
        threshold: f64,
        params: &ForecastParams,
    ) -> Result<RemoteAnalysis> {
        let body = RegionRequest::new(query)
            .with_threshold(threshold)
            .with_forecast(params);
        let response: AnalysisResponse = self.post("/api/analysis", &body).await?;
        convert_analysis(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, DateRange, RegionOfInterest};

    fn query() -> RegionQuery {
        RegionQuery {
            roi: RegionOfInterest::new(Coordinate::new(36.5, -119.5).unwrap(), 2.0).unwrap(),
            date_range: DateRange::new(
                NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            )
            .unwrap(),
        }
    }

    #[test]
    fn client_creation_trims_base_url() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:8000/".into(),
            user_agent: "BloomWatch/test".into(),
        };
        let client = BloomWatchApiClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:8000");
    }

    #[test]
    fn request_body_shape() {
        let body = RegionRequest::new(&query())
            .with_threshold(0.25)
            .with_forecast(&ForecastParams::default());
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["latitude"], 36.5);
        assert_eq!(json["roi_size_degrees"], 2.0);
        assert_eq!(json["start_date"], "2023-01-01");
        assert_eq!(json["threshold"], 0.25);
        assert_eq!(json["future_steps"], 60);
        assert_eq!(json["look_back"], 30);
    }

    #[test]
    fn request_body_omits_unused_fields() {
        let json = serde_json::to_value(RegionRequest::new(&query())).unwrap();
        assert!(json.get("threshold").is_none());
        assert!(json.get("look_back").is_none());
    }

    #[test]
    fn parses_dates_and_datetimes() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert_eq!(parse_api_date("2024-03-01"), expected);
        assert_eq!(parse_api_date("2024-03-01T00:00:00"), expected);
        assert_eq!(parse_api_date("03/01/2024"), None);
        assert_eq!(parse_api_date("2024"), None);
    }

    #[test]
    fn converts_ndvi_records() {
        let response: NdviResponse = serde_json::from_str(
            r#"{"records": [
                {"Date": "2023-01-17T00:00:00", "NDVI": 0.31},
                {"Date": "2023-01-01T00:00:00", "NDVI": 0.22},
                {"Date": "2023-01-09T00:00:00", "NDVI": null},
                {"Date": "not-a-date", "NDVI": 0.5}
            ], "count": 4, "data_source": "nasa"}"#,
        )
        .unwrap();

        let series = convert_series(response);
        assert_eq!(series.values(), vec![0.22, 0.31]);
    }

    #[test]
    fn converts_skipped_forecast() {
        let response: ForecastResponse = serde_json::from_str(
            r#"{"skipped": true, "reason": "avg NDVI < 0.1 indicates water"}"#,
        )
        .unwrap();

        match convert_forecast(response).unwrap() {
            ForecastOutcome::Skipped { reason } => assert!(reason.contains("water")),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn converts_predicted_forecast() {
        let response: ForecastResponse = serde_json::from_str(
            r#"{"skipped": false, "dates": ["2024-01-01", "2024-01-02"], "values": [0.4, 0.42]}"#,
        )
        .unwrap();

        match convert_forecast(response).unwrap() {
            ForecastOutcome::Predicted(series) => assert_eq!(series.values(), vec![0.4, 0.42]),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn mismatched_forecast_is_malformed() {
        let response: ForecastResponse = serde_json::from_str(
            r#"{"skipped": false, "dates": ["2024-01-01"], "values": [0.4, 0.42]}"#,
        )
        .unwrap();
        assert!(matches!(
            convert_forecast(response),
            Err(BloomWatchError::MalformedResponse(_))
        ));
    }

    #[test]
    fn analysis_error_is_upstream_failure() {
        let response: AnalysisResponse =
            serde_json::from_str(r#"{"error": "No NDVI data available"}"#).unwrap();
        assert!(matches!(
            convert_analysis(response),
            Err(BloomWatchError::UpstreamFailure(_))
        ));
    }

    #[test]
    fn analysis_extracts_health() {
        let response: AnalysisResponse = serde_json::from_str(
            r#"{"report": {"current_status": {"health_status": "Growing",
                "health_description": "Vegetation is actively growing"}},
                "formatted_output": "BLOOMWATCH ANALYSIS REPORT", "success": true}"#,
        )
        .unwrap();

        let analysis = convert_analysis(response).unwrap();
        assert_eq!(analysis.health_status.as_deref(), Some("Growing"));
        assert!(analysis.formatted_output.unwrap().starts_with("BLOOMWATCH"));
    }
}
