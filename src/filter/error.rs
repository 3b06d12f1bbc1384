use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    /// The descriptor did not decode; nothing of it is applied.
    #[error("Invalid filter: {0}")]
    InvalidFilter(#[from] serde_json::Error),
}
