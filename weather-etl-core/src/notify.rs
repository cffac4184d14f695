use async_trait::async_trait;
use std::{fmt::Debug, path::Path};

use crate::PipelineError;

pub mod discord;

pub use discord::DiscordNotifier;

/// Delivers a finished CSV file to its audience.
#[async_trait]
pub trait Notifier: Send + Sync + Debug {
    async fn send_file(&self, path: &Path, caption: &str) -> Result<(), PipelineError>;
}

/// Caption used when none is configured.
pub fn default_caption(city: &str) -> String {
    format!("Here is the latest {city} weather data CSV.")
}
