use thiserror::Error;

/// Fatal error taxonomy for a pipeline run.
///
/// Row-level normalization problems never surface here; they are absorbed and
/// counted by the pipeline. Everything in this enum aborts the run.
#[derive(Error, Debug)]
pub enum KpiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential error: {0}")]
    Credentials(String),

    #[error("Source '{name}' unavailable: {message}")]
    SourceUnavailable { name: String, message: String },

    #[error("Failed to write report to '{destination}': {message}")]
    SinkWrite {
        destination: String,
        message: String,
    },
}

impl KpiError {
    pub fn source_unavailable(source: impl Into<String>, message: impl ToString) -> Self {
        KpiError::SourceUnavailable {
            name: source.into(),
            message: message.to_string(),
        }
    }

    pub fn sink_write(destination: impl Into<String>, message: impl ToString) -> Self {
        KpiError::SinkWrite {
            destination: destination.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, KpiError>;
