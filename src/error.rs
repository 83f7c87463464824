use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvalError>;

#[derive(Error, Debug)]
pub enum EvalError {
    /// The cutoff `k` must be at least one.
    #[error("Invalid cutoff: k must be a positive integer, got {0}")]
    InvalidCutoff(usize),

    /// A loader rejected a record before evaluation started.
    #[error("Malformed input in {origin}: {message}")]
    MalformedInput { origin: String, message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EvalError {
    pub fn malformed(origin: &str, message: impl Into<String>) -> EvalError {
        EvalError::MalformedInput {
            origin: origin.to_string(),
            message: message.into(),
        }
    }
}
