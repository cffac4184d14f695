use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::Step;

/// Failures surfaced at a pipeline step boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("weather API at {endpoint} was not ready within {waited_secs}s")]
    UpstreamUnavailable { endpoint: String, waited_secs: u64 },

    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} responded with status {status}: {body}")]
    HttpStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("malformed weather payload: {0}")]
    MalformedPayload(String),

    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV to {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Discord file upload failed with status {status}: {body}")]
    UploadRejected { status: u16, body: String },

    #[error("step `{step}` failed after {attempts} attempt(s): {source}")]
    StepFailed {
        step: Step,
        attempts: u32,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem { path: path.into(), source }
    }

    /// The innermost error, looking through `StepFailed` wrappers.
    pub fn root(&self) -> &PipelineError {
        match self {
            PipelineError::StepFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Shorten a response body for logs and error messages.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
