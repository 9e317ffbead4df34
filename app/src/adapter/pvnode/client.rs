use anyhow::anyhow;
use derive_more::derive::{Display, Error};
use reqwest::header::{self, HeaderMap};
use reqwest_middleware::ClientWithMiddleware;
use reqwest_tracing::TracingMiddleware;
use serde::Serialize;

use crate::forecast::ForecastResponse;

/// Fetch failure taxonomy. Connection failures mark the forecast as
/// unavailable and are recovered by the next poll; response failures mean
/// the provider sent something the parser does not understand.
#[derive(Debug, Display, Error)]
pub enum FetchError {
    #[display("forecast service unavailable")]
    Connection(anyhow::Error),
    #[display("unexpected forecast response")]
    Response(anyhow::Error),
}

/// Query parameters of the forecast endpoint. Optional installation
/// metadata is left out entirely when not configured.
#[derive(Debug, Serialize)]
pub struct ForecastQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub slope: f64,
    pub orientation: f64,
    pub past_days: u32,
    pub forecast_days: u32,
    pub required_data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obstruction: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PVNodeHttpClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl PVNodeHttpClient {
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth_value = header::HeaderValue::from_str(format!("Bearer {}", api_key).as_str())?;
        auth_value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder().default_headers(headers).build()?;
        let client = reqwest_middleware::ClientBuilder::new(client)
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub async fn fetch_forecast(&self, query: &ForecastQuery) -> Result<ForecastResponse, FetchError> {
        let url = format!("{}/v1/forecast/", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::Connection(e.into()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Connection(anyhow!("status {} from {}", status, url)));
        }

        response
            .json::<ForecastResponse>()
            .await
            .map_err(|e| FetchError::Response(e.into()))
    }
}
