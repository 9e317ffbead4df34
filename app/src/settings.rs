use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::adapter::pvnode::PVNodeSettings;
use crate::api::HttpServerConfig;
use crate::core::time::Duration;
use crate::monitoring::MonitoringConfig;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub monitoring: MonitoringConfig,
    pub http_server: HttpServerConfig,
    pub pvnode: PVNodeSettings,
    /// How often the coordinator asks for a fresh snapshot. Deliberately
    /// much shorter than the client's freshness window.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,
}

fn default_poll_interval() -> Duration {
    Duration::minutes(15)
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("config.toml"))
            .add_source(Environment::default().separator("_").list_separator(","));

        let s = builder.build()?;
        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_interval_parsed_from_iso_duration() {
        let settings: Settings = serde_json::from_value(serde_json::json!({
            "monitoring": {
                "service_name": "pvnode",
                "logs": {"default_level": "info", "filters": []},
            },
            "http_server": {"port": 8080},
            "pvnode": {
                "api_key": "pvn_0123456789abcdefghijklmnopqrstuv",
                "latitude": 52.52,
                "longitude": 13.405,
                "slope": 30.0,
                "orientation": 180.0,
                "kwp": 5.6,
            },
            "poll_interval": "PT5M",
        }))
        .unwrap();

        assert_eq!(settings.poll_interval, Duration::minutes(5));
    }

    #[test]
    fn test_poll_interval_defaults_to_15_minutes() {
        let settings: Settings = serde_json::from_value(serde_json::json!({
            "monitoring": {
                "service_name": "pvnode",
                "logs": {"default_level": "info", "filters": []},
            },
            "http_server": {"port": 8080},
            "pvnode": {
                "api_key": "pvn_0123456789abcdefghijklmnopqrstuv",
                "latitude": 52.52,
                "longitude": 13.405,
                "slope": 30.0,
                "orientation": 180.0,
                "kwp": 5.6,
            },
        }))
        .unwrap();

        assert_eq!(settings.poll_interval, Duration::minutes(15));
    }
}
