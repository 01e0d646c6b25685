use crate::cli::ReportArgs;
use crate::config::{Config, PeakSource, ThumbnailSource};
use crate::datasources::{
    BloomWatchApiClient, ForecastParams, GibsThumbnail, NominatimClient, ReverseGeocoder,
};
use crate::error::Result;
use crate::logic::{
    GeocodeResolver, OrchestratorSettings, Providers, ReportOutcome, ReportRequest,
    ReportSession, RequestOrchestrator,
};
use crate::models::Coordinate;
use std::sync::Arc;
use std::time::Duration;

/// Wires configured upstream clients into the orchestrator
pub struct App {
    pub config: Config,
    api: Arc<BloomWatchApiClient>,
    nominatim: Option<Arc<NominatimClient>>,
    orchestrator: RequestOrchestrator,
}

impl App {
    pub fn from_config(config: Config) -> Result<Self> {
        let api = Arc::new(BloomWatchApiClient::new(&config.api)?);

        // Without a geocoder every place name comes from the offline region table
        let nominatim = if config.geocoding.enabled {
            Some(Arc::new(NominatimClient::new(&config.geocoding)?))
        } else {
            tracing::info!("Reverse geocoding disabled - using offline region names");
            None
        };

        let geocoder = nominatim
            .clone()
            .map(|client| client as Arc<dyn ReverseGeocoder>);
        let resolver = Arc::new(GeocodeResolver::with_settings(
            geocoder,
            config.geocoding.timeout(),
            config.geocoding.precision,
            config.geocoding.cache_capacity,
        ));
        let session = Arc::new(ReportSession::new(Duration::from_millis(
            config.orchestrator.debounce_ms,
        )));

        let orchestrator = RequestOrchestrator::new(
            Self::providers(&config, api.clone()),
            resolver,
            session,
            OrchestratorSettings::from_config(&config),
        );

        Ok(Self {
            config,
            api,
            nominatim,
            orchestrator,
        })
    }

    fn providers(config: &Config, api: Arc<BloomWatchApiClient>) -> Providers {
        let o = &config.orchestrator;
        let mut providers = Providers::new(api.clone());

        if o.peaks == PeakSource::Remote {
            providers = providers.with_peaks(api.clone());
        }
        if o.forecast_enabled {
            providers = providers.with_forecast(api.clone());
        } else {
            tracing::info!("Forecasting disabled in config");
        }
        if o.analysis_enabled {
            providers = providers.with_analysis(api.clone());
        }

        match o.thumbnail {
            ThumbnailSource::Gibs => providers.with_thumbnail(Arc::new(GibsThumbnail)),
            ThumbnailSource::Api => providers.with_thumbnail(api),
            ThumbnailSource::Disabled => providers,
        }
    }

    pub fn report_request(&self, args: &ReportArgs) -> Result<ReportRequest> {
        let analysis = &self.config.analysis;
        let request = ReportRequest::new(
            args.lat,
            args.lon,
            args.size,
            args.start,
            args.end,
            args.threshold.unwrap_or(analysis.threshold),
        )?;

        Ok(request.with_forecast(ForecastParams {
            look_back: analysis.look_back,
            future_steps: analysis.future_steps,
        }))
    }

    pub async fn build_report(&self, request: &ReportRequest) -> ReportOutcome {
        self.orchestrator.build_report(request).await
    }

    pub async fn resolve_place_name(&self, latitude: f64, longitude: f64) -> Result<String> {
        let coordinate = Coordinate::new(latitude, longitude)?;
        Ok(self.orchestrator.resolve_place_name(coordinate).await)
    }

    pub async fn check_connections(&self) -> ConnectionStatus {
        let mut status = ConnectionStatus::default();

        match self.api.test_connection().await {
            Ok(ok) => status.analytics_api = ok,
            Err(e) => tracing::warn!("BloomWatch API check failed: {}", e),
        }

        if let Some(ref client) = self.nominatim {
            status.geocoder = Some(client.test_connection().await.unwrap_or(false));
        }

        status
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionStatus {
    pub analytics_api: bool,
    /// `None` when geocoding is disabled
    pub geocoder: Option<bool>,
}

impl ConnectionStatus {
    pub fn all_connected(&self) -> bool {
        self.analytics_api && self.geocoder.unwrap_or(true)
    }

    /// Reports can be built; place names may still fall back offline
    pub fn core_connected(&self) -> bool {
        self.analytics_api
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn args(threshold: Option<f64>) -> ReportArgs {
        ReportArgs {
            lat: 48.85,
            lon: 2.35,
            size: 5.0,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            threshold,
            json: false,
        }
    }

    #[test]
    fn default_config_wires_every_section_but_remote_peaks() {
        let config = Config::default();
        let api = Arc::new(BloomWatchApiClient::new(&config.api).unwrap());
        let providers = App::providers(&config, api);

        assert!(providers.peaks.is_none());
        assert!(providers.forecast.is_some());
        assert!(providers.analysis.is_some());
        assert!(providers.thumbnail.is_some());
    }

    #[test]
    fn config_switches_control_providers() {
        let mut config = Config::default();
        config.orchestrator.peaks = PeakSource::Remote;
        config.orchestrator.thumbnail = ThumbnailSource::Disabled;
        config.orchestrator.forecast_enabled = false;
        config.orchestrator.analysis_enabled = false;

        let api = Arc::new(BloomWatchApiClient::new(&config.api).unwrap());
        let providers = App::providers(&config, api);

        assert!(providers.peaks.is_some());
        assert!(providers.forecast.is_none());
        assert!(providers.analysis.is_none());
        assert!(providers.thumbnail.is_none());
    }

    #[test]
    fn report_request_takes_defaults_from_config() {
        let mut config = Config::default();
        config.analysis.threshold = 0.3;
        config.analysis.future_steps = 90;
        let app = App::from_config(config).unwrap();

        let request = app.report_request(&args(None)).unwrap();
        assert_eq!(request.threshold, 0.3);
        assert_eq!(request.forecast.future_steps, 90);
        assert_eq!(request.forecast.look_back, 30);

        let explicit = app.report_request(&args(Some(0.05))).unwrap();
        assert_eq!(explicit.threshold, 0.1);
    }

    #[tokio::test]
    async fn place_name_rejects_non_finite_coordinates() {
        let mut config = Config::default();
        config.geocoding.enabled = false;
        let app = App::from_config(config).unwrap();

        assert!(app.resolve_place_name(f64::NAN, 0.0).await.is_err());
        assert_eq!(
            app.resolve_place_name(0.0, 0.0).await.unwrap(),
            "Africa (0.00°N, 0.00°E)"
        );
    }

    #[test]
    fn connection_status_summary() {
        let status = ConnectionStatus {
            analytics_api: true,
            geocoder: None,
        };
        assert!(status.all_connected());

        let status = ConnectionStatus {
            analytics_api: true,
            geocoder: Some(false),
        };
        assert!(!status.all_connected());
        assert!(status.core_connected());
    }
}
