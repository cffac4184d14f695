//! The four-step run: readiness check, extract, transform-and-store, notify.

use std::{fmt, path::PathBuf};

use chrono::Local;
use tracing::info;

use crate::{
    Config, PipelineError, WeatherReading,
    notify::{DiscordNotifier, Notifier, default_caption},
    retry::{RetryPolicy, with_retries},
    sensor::{SensorConfig, wait_until_ready},
    source::{OpenWeatherSource, WeatherSource},
    store::CsvStore,
};

/// Pipeline steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    CheckReadiness,
    Extract,
    TransformLoad,
    Notify,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::CheckReadiness => "is_weather_api_ready",
            Step::Extract => "extract_weather_data",
            Step::TransformLoad => "transform_load_weather_data",
            Step::Notify => "send_csv_to_discord",
        }
    }

    pub const fn all() -> &'static [Step] {
        &[Step::CheckReadiness, Step::Extract, Step::TransformLoad, Step::Notify]
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub reading: WeatherReading,
    pub csv_path: PathBuf,
}

#[derive(Debug)]
pub struct Pipeline {
    source: Box<dyn WeatherSource>,
    notifier: Box<dyn Notifier>,
    store: CsvStore,
    sensor: SensorConfig,
    retry: RetryPolicy,
    caption: Option<String>,
}

impl Pipeline {
    pub fn new(
        source: Box<dyn WeatherSource>,
        notifier: Box<dyn Notifier>,
        store: CsvStore,
        sensor: SensorConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self { source, notifier, store, sensor, retry, caption: None }
    }

    /// Override the message text sent alongside the CSV.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Wire the OpenWeather source and Discord notifier from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.weather_api_key()?;
        let bot_token = config.discord_bot_token()?;
        let channel_id = config.discord_channel_id()?;

        let source = OpenWeatherSource::new(
            config.weather.api_base.clone(),
            api_key.to_owned(),
            config.weather.city_query.clone(),
        );
        let notifier = DiscordNotifier::new(
            config.discord.api_base.clone(),
            bot_token.to_owned(),
            channel_id.to_owned(),
        );
        let store = CsvStore::new(&config.output.dir, &config.weather.city_query);

        let mut pipeline = Self::new(
            Box::new(source),
            Box::new(notifier),
            store,
            config.sensor.clone(),
            config.retry.clone(),
        );
        if let Some(caption) = &config.discord.caption {
            pipeline = pipeline.with_caption(caption.clone());
        }

        Ok(pipeline)
    }

    pub fn store(&self) -> &CsvStore {
        &self.store
    }

    /// Execute every step once, in order. The first step to exhaust its
    /// retries ends the run; files already written stay on disk.
    pub async fn run_once(&self) -> Result<RunReport, PipelineError> {
        with_retries(Step::CheckReadiness, &self.retry, move || {
            wait_until_ready(self.source.as_ref(), &self.sensor)
        })
        .await?;

        let payload = with_retries(Step::Extract, &self.retry, move || {
            self.source.fetch_current()
        })
        .await?;
        info!(step = %Step::Extract, "Weather payload fetched");

        let payload = &payload;
        let (reading, csv_path) = with_retries(Step::TransformLoad, &self.retry, move || async move {
            self.transform_and_store(payload)
        })
        .await?;
        info!(step = %Step::TransformLoad, path = %csv_path.display(), "Weather CSV written");

        let caption = self.caption.clone().unwrap_or_else(|| default_caption(&reading.city));
        let (path, caption) = (&csv_path, caption.as_str());
        with_retries(Step::Notify, &self.retry, move || {
            self.notifier.send_file(path, caption)
        })
        .await?;

        Ok(RunReport { reading, csv_path })
    }

    fn transform_and_store(
        &self,
        payload: &serde_json::Value,
    ) -> Result<(WeatherReading, PathBuf), PipelineError> {
        let reading = WeatherReading::from_payload(payload)?;
        let path = self.store.write(&reading, Local::now().naive_local())?;
        Ok((reading, path))
    }
}
