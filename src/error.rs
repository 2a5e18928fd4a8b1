use thiserror::Error;

impl From<serde_json::Error> for PrBuilderError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidEvent(format!("JSON deserialization error: {}", err))
    }
}

impl From<reqwest::Error> for PrBuilderError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream {
            service: "http".to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum PrBuilderError {
    /// The build carries no pull request id; nothing PR-scoped may run.
    #[error("Not a pull request build")]
    NotAPullRequestBuild,

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("{service} call failed: {message}")]
    Upstream { service: String, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Enrichment failed: {0}")]
    Enrichment(String),
}

impl PrBuilderError {
    pub fn upstream(service: &str, message: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.to_string(),
            message: message.into(),
        }
    }

    /// Whether the invoking event system should redeliver the event.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }
}

pub type Result<T> = std::result::Result<T, PrBuilderError>;
