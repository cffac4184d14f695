use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::{PipelineError, error::truncate_body};

use super::WeatherSource;

pub const DEFAULT_API_BASE: &str = "https://api.openweathermap.org";

#[derive(Debug, Clone)]
pub struct OpenWeatherSource {
    api_base: String,
    api_key: String,
    city_query: String,
    http: Client,
}

impl OpenWeatherSource {
    pub fn new(api_base: impl Into<String>, api_key: String, city_query: String) -> Self {
        Self {
            api_base: api_base.into(),
            api_key,
            city_query,
            http: Client::new(),
        }
    }

    fn url(&self) -> String {
        format!("{}/data/2.5/weather", self.api_base.trim_end_matches('/'))
    }

    async fn get(&self) -> Result<reqwest::Response, PipelineError> {
        self.http
            .get(self.url())
            .query(&[("q", self.city_query.as_str()), ("APPID", self.api_key.as_str())])
            .send()
            .await
            .map_err(|source| PipelineError::Http { endpoint: self.url(), source })
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherSource {
    fn endpoint(&self) -> String {
        self.url()
    }

    async fn poke(&self) -> Result<bool, PipelineError> {
        let res = self.get().await?;
        let status = res.status();
        debug!(endpoint = %self.url(), %status, "Poked weather API");

        if status.is_success() {
            return Ok(true);
        }
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }

        let body = res.text().await.unwrap_or_else(|e| format!("<unreadable body: {e}>"));
        Err(PipelineError::HttpStatus {
            endpoint: self.url(),
            status: status.as_u16(),
            body: truncate_body(&body),
        })
    }

    async fn fetch_current(&self) -> Result<Value, PipelineError> {
        let res = self.get().await?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| PipelineError::Http { endpoint: self.url(), source })?;

        if !status.is_success() {
            return Err(PipelineError::HttpStatus {
                endpoint: self.url(),
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        debug!(bytes = body.len(), "Fetched current weather");

        serde_json::from_str(&body)
            .map_err(|e| PipelineError::MalformedPayload(format!("response is not valid JSON: {e}")))
    }
}
