use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use tracing::info;
use weather_etl_core::{Config, DailySchedule, Pipeline};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-etl", version, about = "Daily weather CSV pipeline")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively set API credentials, city and output directory.
    Configure,

    /// Run the pipeline once and exit.
    Run,

    /// Run the pipeline every day at midnight UTC until interrupted.
    Serve {
        /// Also run immediately instead of waiting for the first trigger.
        #[arg(long)]
        run_now: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => {
                let path = match self.config {
                    Some(path) => path,
                    None => Config::config_file_path()?,
                };
                let cfg = prompt_config(Config::load_from(&path)?)?;
                cfg.save_to(&path)?;
                println!("Configuration saved to {}", path.display());
            }
            Command::Run => {
                let cfg = load_config(self.config.as_deref())?;
                let pipeline = Pipeline::from_config(&cfg)?;
                let report = pipeline.run_once().await?;
                println!("{}", report.csv_path.display());
            }
            Command::Serve { run_now } => {
                let cfg = load_config(self.config.as_deref())?;
                let pipeline = Pipeline::from_config(&cfg)?;
                let schedule = DailySchedule::new(cfg.schedule.start_date);

                if run_now {
                    schedule.run_logged(&pipeline).await;
                }

                tokio::select! {
                    _ = schedule.run_forever(&pipeline) => {}
                    res = tokio::signal::ctrl_c() => {
                        res.context("Failed to listen for shutdown signal")?;
                        info!("Shutting down");
                    }
                }
            }
        }

        Ok(())
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    let cfg = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(cfg.with_env_overrides())
}

fn prompt_config(mut cfg: Config) -> anyhow::Result<Config> {
    cfg.weather.api_key = prompt_secret("OpenWeather API key:", cfg.weather.api_key)?;
    cfg.weather.city_query = Text::new("City:")
        .with_default(&cfg.weather.city_query)
        .prompt()?;
    cfg.discord.bot_token = prompt_secret("Discord bot token:", cfg.discord.bot_token)?;
    cfg.discord.channel_id = prompt_secret("Discord channel id:", cfg.discord.channel_id)?;

    let dir = Text::new("Output directory:")
        .with_default(&cfg.output.dir.to_string_lossy())
        .prompt()?;
    cfg.output.dir = PathBuf::from(dir);

    Ok(cfg)
}

/// Ask for a secret; an empty answer keeps the current value.
fn prompt_secret(message: &str, current: Option<String>) -> anyhow::Result<Option<String>> {
    let mut prompt = Password::new(message)
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked);
    if current.is_some() {
        prompt = prompt.with_help_message("leave empty to keep the current value");
    }

    let answer = prompt.prompt()?;
    Ok(if answer.trim().is_empty() { current } else { Some(answer.trim().to_string()) })
}
