use serde_json::{Value, json};

use crate::adapter::pvnode::PVNodeSettings;
use crate::forecast::Estimate;

const REDACTED: &str = "**REDACTED**";

/// Support dump of configuration and forecast state. Credentials and the
/// installation location never leave the system unmasked.
pub fn diagnostics(settings: &PVNodeSettings, estimate: &Estimate) -> Value {
    json!({
        "settings": {
            "api_key": REDACTED,
            "latitude": REDACTED,
            "longitude": REDACTED,
            "slope": settings.slope,
            "orientation": settings.orientation,
            "kwp": settings.kwp.0,
            "weather_enabled": settings.weather_enabled,
            "installed_at": settings.installed_at,
            "height": settings.height,
            "technology": settings.technology,
            "obstruction": settings.obstruction,
        },
        "data": {
            "timezone": estimate.timezone().name(),
            "kwp": estimate.kwp().0,
            "energy_production_today": estimate.energy_today().0,
            "energy_production_today_remaining": estimate.energy_today_remaining().0,
            "energy_production_tomorrow": estimate.energy_tomorrow().0,
            "energy_current_hour": estimate.energy_current_hour().0,
            "power_production_now": estimate.power_now().0,
            "watts": series_json(estimate.power_series().iter().map(|dp| (dp.timestamp, dp.value.0))),
            "wh_hours": series_json(estimate.energy_series().iter().map(|dp| (dp.timestamp, dp.value.0))),
        },
        "account": {
            "last_update": estimate.last_update().to_iso_string(),
        },
    })
}

fn series_json(entries: impl Iterator<Item = (crate::core::time::DateTime, f64)>) -> Value {
    Value::Object(
        entries
            .map(|(timestamp, value)| (timestamp.to_iso_string(), json!(value)))
            .collect(),
    )
}
