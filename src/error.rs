use thiserror::Error;

/// Everything that can stop a pricing run.
///
/// A run either returns a full result set or exactly one of these, naming the
/// field that caused it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    /// Missing top-level key or a malformed unit/event/params shape.
    #[error("schema error: {0}")]
    Schema(String),

    /// A value is present but non-finite or outside its documented bound.
    #[error("range error: {field} {reason}")]
    Range { field: String, reason: String },

    /// Unknown rule name, or a field the selected rule needs is absent.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl PricingError {
    pub fn schema(message: impl Into<String>) -> Self {
        PricingError::Schema(message.into())
    }

    pub fn range(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PricingError::Range { field: field.into(), reason: reason.into() }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        PricingError::Configuration(message.into())
    }
}

/// Errors from the pipeline around the pricing core (config, event files, writers).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl PipelineError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        PipelineError::Io { path: path.into(), source }
    }
}
