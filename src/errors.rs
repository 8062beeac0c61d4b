use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Failed to parse JSON payload: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidConfig { key: String, message: String },

    #[error("Hook '{name}' failed: {message}")]
    HookFailed { name: String, message: String },
}

impl From<FilterError> for String {
    fn from(err: FilterError) -> String {
        err.to_string()
    }
}
