mod client;

use std::sync::Arc;

use anyhow::ensure;
use chrono::NaiveDate;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::core::time::{DateTime, Duration};
use crate::core::unit::KiloWattPeak;
use crate::forecast::Estimate;

pub use client::FetchError;
use client::{ForecastQuery, PVNodeHttpClient};

const DEFAULT_BASE_URL: &str = "https://api.pvnode.com";

#[derive(Debug, Clone, Deserialize)]
pub struct PVNodeSettings {
    pub api_key: String,
    pub latitude: f64,
    pub longitude: f64,
    pub slope: f64,
    pub orientation: f64,
    pub kwp: KiloWattPeak,
    #[serde(default)]
    pub weather_enabled: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub installed_at: Option<NaiveDate>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub technology: Option<String>,
    #[serde(default)]
    pub obstruction: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

impl PVNodeSettings {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            has_valid_api_key_format(&self.api_key),
            "API key must match pvn_ followed by 32 alphanumeric characters"
        );
        ensure!(
            (-90.0..=90.0).contains(&self.latitude),
            "latitude {} out of range",
            self.latitude
        );
        ensure!(
            (-180.0..=180.0).contains(&self.longitude),
            "longitude {} out of range",
            self.longitude
        );
        ensure!((0.0..=90.0).contains(&self.slope), "slope {} out of range", self.slope);
        ensure!(
            (0.0..=360.0).contains(&self.orientation),
            "orientation {} out of range",
            self.orientation
        );
        ensure!(self.kwp.0 > 0.0, "installed capacity must be positive, got {}", self.kwp);

        Ok(())
    }
}

fn has_valid_api_key_format(key: &str) -> bool {
    match key.strip_prefix("pvn_") {
        Some(rest) => rest.len() == 32 && rest.chars().all(|c| c.is_ascii_alphanumeric()),
        None => false,
    }
}

/// Client for one configured installation. Holds the last snapshot and only
/// goes to the network when it has aged past the freshness window, which is
/// intentionally much longer than the poll interval driving it.
#[derive(Debug)]
pub struct PVNode {
    settings: PVNodeSettings,
    client: PVNodeHttpClient,
    cached: Mutex<Option<Arc<Estimate>>>,
}

impl PVNode {
    pub fn new(settings: PVNodeSettings) -> anyhow::Result<Self> {
        settings.validate()?;

        let client = PVNodeHttpClient::new(&settings.base_url, &settings.api_key)?;

        Ok(Self {
            settings,
            client,
            cached: Mutex::new(None),
        })
    }

    /// The cached snapshot while it is fresh, otherwise the result of a
    /// single fetch. The lock is held across check and fetch, so at most
    /// one request is in flight per client.
    pub async fn estimate(&self) -> Result<Arc<Estimate>, FetchError> {
        let mut cached = self.cached.lock().await;

        if let Some(estimate) = cached.as_ref()
            && estimate.age() < freshness_window()
        {
            tracing::debug!("Reusing forecast from {}", estimate.last_update().to_human_readable());
            return Ok(estimate.clone());
        }

        let response = self.client.fetch_forecast(&self.forecast_query()).await?;
        let estimate = Arc::new(
            Estimate::new(self.settings.kwp, self.settings.weather_enabled, response)
                .map_err(FetchError::Response)?,
        );

        if estimate.power_series().is_empty() {
            tracing::warn!("Forecast response contained no power samples");
        }

        tracing::info!(
            "New forecast: {} power samples, {} hourly buckets",
            estimate.power_series().len(),
            estimate.energy_series().len()
        );

        *cached = Some(estimate.clone());
        Ok(estimate)
    }

    fn forecast_query(&self) -> ForecastQuery {
        let s = &self.settings;

        ForecastQuery {
            latitude: s.latitude,
            longitude: s.longitude,
            slope: s.slope,
            orientation: s.orientation,
            past_days: 0,
            forecast_days: 1,
            required_data: required_data(s.weather_enabled),
            height: s.height,
            age: s.installed_at.map(panel_age_years),
            technology: s.technology.clone().filter(|t| !t.is_empty()),
            obstruction: s.obstruction.clone().filter(|o| !o.is_empty()),
        }
    }
}

fn freshness_window() -> Duration {
    Duration::hours(8)
}

fn required_data(weather_enabled: bool) -> String {
    if weather_enabled {
        "spec_watts,temp,precip,RH,vwind,weather_code".to_owned()
    } else {
        "spec_watts".to_owned()
    }
}

fn panel_age_years(installed_at: NaiveDate) -> i64 {
    let today = DateTime::now().date_in(chrono_tz::UTC);
    (today.signed_duration_since(installed_at).num_days() / 365).max(0)
}
