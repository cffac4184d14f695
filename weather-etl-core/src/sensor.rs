use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{Instant, sleep};
use tracing::{info, warn};

use crate::{PipelineError, source::WeatherSource};

/// How long and how often to poke the weather API before giving up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub poke_interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self { poke_interval_secs: 60, timeout_secs: 600 }
    }
}

impl SensorConfig {
    pub fn poke_interval(&self) -> Duration {
        Duration::from_secs(self.poke_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Poke `source` until it answers, or fail once the timeout has elapsed.
///
/// Only `Ok(false)` keeps the sensor waiting; a poke error is returned as-is
/// so the step retry policy decides what happens next. At least one poke is
/// always made.
pub async fn wait_until_ready(
    source: &dyn WeatherSource,
    config: &SensorConfig,
) -> Result<(), PipelineError> {
    let started = Instant::now();
    let mut pokes = 0u32;

    loop {
        pokes += 1;
        match source.poke().await {
            Ok(true) => {
                info!(endpoint = %source.endpoint(), pokes, "Weather API is ready");
                return Ok(());
            }
            Ok(false) => warn!(endpoint = %source.endpoint(), pokes, "Weather API not ready"),
            Err(err) => {
                warn!(endpoint = %source.endpoint(), pokes, error = %err, "Weather API readiness check failed");
                return Err(err);
            }
        }

        if started.elapsed() >= config.timeout() {
            return Err(PipelineError::UpstreamUnavailable {
                endpoint: source.endpoint(),
                waited_secs: started.elapsed().as_secs(),
            });
        }

        sleep(config.poke_interval()).await;
    }
}
