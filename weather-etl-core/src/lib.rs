//! Core library for the `weather-etl` pipeline.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather source and readiness sensor
//! - Kelvin conversion and the flat CSV record
//! - The Discord notifier
//! - The step pipeline with its retry policy and daily schedule
//!
//! It is used by `weather-etl-cli`, but can also be embedded in other binaries or services.

pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod retry;
pub mod schedule;
pub mod sensor;
pub mod source;
pub mod store;
mod transform;

pub use config::Config;
pub use convert::kelvin_to_fahrenheit;
pub use error::PipelineError;
pub use model::WeatherReading;
pub use notify::{DiscordNotifier, Notifier};
pub use pipeline::{Pipeline, RunReport, Step};
pub use retry::RetryPolicy;
pub use schedule::DailySchedule;
pub use sensor::SensorConfig;
pub use source::{OpenWeatherSource, WeatherSource};
pub use store::CsvStore;
