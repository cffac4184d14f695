use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::PipelineError;

pub mod openweather;

pub use openweather::OpenWeatherSource;

/// Upstream that supplies the raw current-weather payload.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    /// Human-readable endpoint, used in logs and errors.
    fn endpoint(&self) -> String;

    /// A single readiness check. `Ok(false)` means "not yet, try again";
    /// an error fails the readiness step outright.
    async fn poke(&self) -> Result<bool, PipelineError>;

    /// Fetch and parse the current-weather JSON body.
    async fn fetch_current(&self) -> Result<Value, PipelineError>;
}
