use crate::error::{BloomWatchError, Result};
use crate::logic::geocode;
use dialoguer::{Confirm, Input};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

/// BloomWatch analytics API serving NDVI, peaks, forecast, thumbnails and analysis
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeocodingConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_geocode_timeout")]
    pub timeout_secs: u64,
    /// Decimal places kept in the place-name cache key
    #[serde(default = "default_precision")]
    pub precision: u32,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl GeocodingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "https://nominatim.openstreetmap.org".into(),
            user_agent: default_user_agent(),
            timeout_secs: default_geocode_timeout(),
            precision: default_precision(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum NDVI for a bloom event
    pub threshold: f64,
    pub trend_window: usize,
    pub top_blooms: usize,
    pub look_back: usize,
    pub future_steps: usize,
    pub forecast_overlap_days: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            trend_window: 60,
            top_blooms: 5,
            look_back: 30,
            future_steps: 60,
            forecast_overlap_days: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeakSource {
    #[default]
    Local,
    Remote,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailSource {
    #[default]
    Gibs,
    Api,
    Disabled,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CallTimeouts {
    pub series_secs: u64,
    pub peaks_secs: u64,
    pub forecast_secs: u64,
    pub analysis_secs: u64,
    pub thumbnail_secs: u64,
}

impl Default for CallTimeouts {
    fn default() -> Self {
        Self {
            series_secs: 60,
            peaks_secs: 60,
            forecast_secs: 120,
            analysis_secs: 120,
            thumbnail_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Minimum gap between completed report builds
    pub debounce_ms: u64,
    /// Upper bound on a whole fan-out
    pub build_timeout_secs: u64,
    pub timeouts: CallTimeouts,
    pub peaks: PeakSource,
    pub thumbnail: ThumbnailSource,
    pub forecast_enabled: bool,
    pub analysis_enabled: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 2000,
            build_timeout_secs: 150,
            timeouts: CallTimeouts::default(),
            peaks: PeakSource::Local,
            thumbnail: ThumbnailSource::Gibs,
            forecast_enabled: true,
            analysis_enabled: true,
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_user_agent() -> String {
    "BloomWatch/1.0".into()
}

fn default_geocode_timeout() -> u64 {
    geocode::DEFAULT_GEOCODE_TIMEOUT.as_secs()
}

fn default_precision() -> u32 {
    geocode::DEFAULT_KEY_PRECISION
}

fn default_cache_capacity() -> usize {
    geocode::DEFAULT_CACHE_CAPACITY
}

impl Config {
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => {
                if !p.exists() {
                    return Err(BloomWatchError::Config(format!(
                        "Config file not found at {:?}",
                        p
                    )));
                }
                p
            }
            None => match Self::find_config_path() {
                Some(p) => p,
                None => {
                    tracing::warn!("No config file found - using built-in defaults");
                    return Ok(Self::default());
                }
            },
        };

        tracing::debug!("Loading config from {:?}", config_path);
        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| BloomWatchError::Config(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&config_str)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // Substitute environment variables
        let content = Self::substitute_env_vars(content)?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| BloomWatchError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let a = &self.analysis;
        if !(0.1..=1.0).contains(&a.threshold) {
            return Err(BloomWatchError::Config(format!(
                "analysis.threshold must be within 0.1-1.0, got {}",
                a.threshold
            )));
        }
        if a.trend_window == 0 {
            return Err(BloomWatchError::Config(
                "analysis.trend_window must be at least 1".into(),
            ));
        }
        if self.geocoding.precision > 8 {
            return Err(BloomWatchError::Config(format!(
                "geocoding.precision must be 8 or less, got {}",
                self.geocoding.precision
            )));
        }
        if self.geocoding.cache_capacity == 0 {
            return Err(BloomWatchError::Config(
                "geocoding.cache_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Search for config.yaml in standard locations
    fn find_config_path() -> Option<PathBuf> {
        // Try current directory first
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        // Then the XDG config directory
        dirs::config_dir()
            .map(|dir| dir.join("bloomwatch").join("config.yaml"))
            .filter(|p| p.exists())
    }

    /// Default path for writing new config files (~/.config/bloomwatch/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| BloomWatchError::Config("Cannot determine config directory".into()))?
            .join("bloomwatch");
        Ok(config_dir.join("config.yaml"))
    }

    /// Run interactive setup prompts and write config to disk.
    /// Returns the config and the path it was written to.
    pub fn setup_interactive() -> Result<(Self, PathBuf)> {
        println!();
        println!("Let's set up BloomWatch!");
        println!();

        let input_err = |e: dialoguer::Error| BloomWatchError::Config(format!("Input error: {}", e));

        // --- Analytics API ---
        println!("BloomWatch analytics API");
        let base_url: String = Input::new()
            .with_prompt("  Base URL")
            .default(ApiConfig::default().base_url)
            .interact_text()
            .map_err(input_err)?;

        println!();

        // --- Reverse geocoding ---
        println!("Reverse geocoding");
        let geocoding_enabled = Confirm::new()
            .with_prompt("  Resolve place names online?")
            .default(true)
            .interact()
            .map_err(input_err)?;

        let geocoding_url: String = if geocoding_enabled {
            Input::new()
                .with_prompt("  Nominatim URL")
                .default(GeocodingConfig::default().url)
                .interact_text()
                .map_err(input_err)?
        } else {
            GeocodingConfig::default().url
        };

        println!();

        // --- Analysis ---
        println!("Analysis");
        let threshold: f64 = Input::new()
            .with_prompt("  Bloom threshold (0.1-1.0)")
            .default(0.2)
            .validate_with(|v: &f64| {
                if (0.1..=1.0).contains(v) {
                    Ok(())
                } else {
                    Err("threshold must be within 0.1-1.0")
                }
            })
            .interact_text()
            .map_err(input_err)?;

        println!();

        let config = Config {
            api: ApiConfig {
                base_url,
                ..ApiConfig::default()
            },
            geocoding: GeocodingConfig {
                enabled: geocoding_enabled,
                url: geocoding_url,
                ..GeocodingConfig::default()
            },
            analysis: AnalysisConfig {
                threshold,
                ..AnalysisConfig::default()
            },
            orchestrator: OrchestratorConfig::default(),
        };

        let config_path = Self::default_config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(&config)
            .map_err(|e| BloomWatchError::Config(format!("Failed to serialize config: {}", e)))?;

        // Write with a header comment
        let content = format!(
            "# BloomWatch Configuration\n# Generated by `bloomwatch init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(&config_path, content)?;

        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    fn substitute_env_vars(content: &str) -> Result<String> {
        let mut result = content.to_string();

        // Find all ${VAR_NAME} patterns and substitute
        let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| BloomWatchError::Config(format!("Bad substitution pattern: {}", e)))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        Ok(result)
    }
}
