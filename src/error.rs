use thiserror::Error;

pub type Result<T> = std::result::Result<T, LensError>;

#[derive(Error, Debug)]
pub enum LensError {
    #[error("Invalid filter pattern '{pattern}': {source}")]
    InvalidFilterPattern {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

impl LensError {
    pub fn invalid_pattern(pattern: &str, err: regex::Error) -> Self {
        LensError::InvalidFilterPattern {
            pattern: pattern.to_string(),
            source: Box::new(err),
        }
    }
}
