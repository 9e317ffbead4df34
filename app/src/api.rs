use std::sync::Arc;

use actix_web::web::{self, Data};
use actix_web::{HttpResponse, HttpServer, Responder, Scope};
use anyhow::Context as _;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::watch;

use crate::adapter::pvnode::PVNodeSettings;
use crate::diagnostics::diagnostics;
use crate::forecast::Estimate;
use crate::sensor;

#[derive(Debug, Deserialize, Clone)]
pub struct HttpServerConfig {
    pub port: u16,
}

impl HttpServerConfig {
    pub async fn run_server<F>(&self, scopes: F) -> anyhow::Result<()>
    where
        F: Fn() -> Vec<Scope> + Send + Clone + 'static,
    {
        let http_server = HttpServer::new(move || {
            let mut app = actix_web::App::new().wrap(tracing_actix_web::TracingLogger::default());

            for scope in scopes() {
                app = app.service(scope);
            }

            app
        })
        .workers(1)
        .disable_signals()
        .bind(("0.0.0.0", self.port))?;

        http_server
            .run()
            .await
            .with_context(|| format!("Error starting HTTP server on port {}", self.port))
    }
}

#[derive(Clone)]
struct ForecastApiState {
    settings: PVNodeSettings,
    estimate: watch::Receiver<Option<Arc<Estimate>>>,
}

impl ForecastApiState {
    fn current_estimate(&self) -> Option<Arc<Estimate>> {
        self.estimate.borrow().clone()
    }
}

pub fn new_web_service(
    settings: PVNodeSettings,
    estimate: watch::Receiver<Option<Arc<Estimate>>>,
) -> Scope {
    let state = ForecastApiState { settings, estimate };

    web::scope("/api/forecast")
        .route("/sensors", web::get().to(handle_sensors))
        .route("/weather", web::get().to(handle_weather))
        .route("/diagnostics", web::get().to(handle_diagnostics))
        .app_data(Data::new(state))
}

async fn handle_sensors(state: Data<ForecastApiState>) -> impl Responder {
    let Some(estimate) = state.current_estimate() else {
        return HttpResponse::ServiceUnavailable().finish();
    };

    let sensors: Vec<_> = sensor::sensor_descriptions(state.settings.weather_enabled)
        .iter()
        .map(|description| description.render(&estimate))
        .collect();

    HttpResponse::Ok().json(json!({
        "device": {
            "manufacturer": sensor::MANUFACTURER,
            "model": sensor::MODEL,
            "configuration_url": sensor::CONFIGURATION_URL,
        },
        "sensors": sensors,
    }))
}

async fn handle_weather(state: Data<ForecastApiState>) -> impl Responder {
    if !state.settings.weather_enabled {
        return HttpResponse::NotFound().finish();
    }

    let Some(estimate) = state.current_estimate() else {
        return HttpResponse::ServiceUnavailable().finish();
    };

    let forecast: Vec<_> = estimate
        .hourly_weather_forecast()
        .iter()
        .map(|sample| {
            json!({
                "datetime": sample.timestamp.to_iso_string(),
                "temperature": sample.temperature.map(|v| v.0),
                "precipitation": sample.precipitation.map(|v| v.0),
                "humidity": sample.humidity.map(|v| v.0),
                "wind_speed": sample.wind_speed.map(|v| v.0),
                "condition": sample.condition.map(|c| c.as_str()),
            })
        })
        .collect();

    HttpResponse::Ok().json(json!({
        "condition": estimate.condition_now().map(|c| c.as_str()),
        "temperature": estimate.temperature_now().map(|v| v.0),
        "humidity": estimate.humidity_now().map(|v| v.0),
        "wind_speed": estimate.wind_speed_now().map(|v| v.0),
        "precipitation": estimate.precipitation_now().map(|v| v.0),
        "forecast": forecast,
    }))
}

async fn handle_diagnostics(state: Data<ForecastApiState>) -> impl Responder {
    let Some(estimate) = state.current_estimate() else {
        return HttpResponse::ServiceUnavailable().finish();
    };

    HttpResponse::Ok().json(diagnostics(&state.settings, &estimate))
}
