use std::{
    fs::{self, File, OpenOptions},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{PipelineError, model::WeatherReading};

const FILE_PREFIX: &str = "current_weather_data";
const STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Writes one single-row CSV file per reading into an output directory.
///
/// Files are never overwritten: a name already taken within the same second
/// gets a numeric suffix.
#[derive(Debug, Clone)]
pub struct CsvStore {
    dir: PathBuf,
    city_slug: String,
}

impl CsvStore {
    pub fn new(dir: impl Into<PathBuf>, city: &str) -> Self {
        Self { dir: dir.into(), city_slug: slugify(city) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Base file name for a run started at `now`, without collision suffix.
    pub fn file_name(&self, now: NaiveDateTime) -> String {
        format!("{FILE_PREFIX}_{}_{}.csv", self.city_slug, now.format(STAMP_FORMAT))
    }

    /// Write `reading` as header + one row and return the new file's path.
    pub fn write(&self, reading: &WeatherReading, now: NaiveDateTime) -> Result<PathBuf, PipelineError> {
        self.write_record(reading, now)
    }

    /// A file that could not be written completely is removed again.
    fn write_record<T: Serialize>(&self, record: &T, now: NaiveDateTime) -> Result<PathBuf, PipelineError> {
        fs::create_dir_all(&self.dir).map_err(|e| PipelineError::filesystem(&self.dir, e))?;

        let (path, file) = self.create_unique(now)?;
        debug!(path = %path.display(), "Writing weather CSV");

        if let Err(err) = fill(file, record, &path) {
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "Failed to remove partial CSV");
            }
            return Err(err);
        }

        Ok(path)
    }

    fn create_unique(&self, now: NaiveDateTime) -> Result<(PathBuf, File), PipelineError> {
        let stamp = now.format(STAMP_FORMAT);
        let mut suffix = 0u32;

        loop {
            let name = if suffix == 0 {
                self.file_name(now)
            } else {
                format!("{FILE_PREFIX}_{}_{stamp}_{suffix}.csv", self.city_slug)
            };
            let path = self.dir.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => return Err(PipelineError::filesystem(path, e)),
            }
        }
    }
}

fn fill<T: Serialize>(file: File, record: &T, path: &Path) -> Result<(), PipelineError> {
    let mut wtr = csv::Writer::from_writer(file);
    wtr.serialize(record)
        .map_err(|source| PipelineError::Csv { path: path.to_path_buf(), source })?;
    wtr.flush().map_err(|e| PipelineError::filesystem(path, e))
}

/// Lower-case `city`, collapsing every run of non-alphanumerics into `_`.
fn slugify(city: &str) -> String {
    let mut slug = String::with_capacity(city.len());
    for c in city.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_');
    if slug.is_empty() { "city".to_string() } else { slug.to_string() }
}
