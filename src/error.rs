
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;

// Helper conversions
impl From<rusqlite::Error> for SearchError {
    fn from(e: rusqlite::Error) -> Self { Self::Persistence(e.to_string()) }
}
impl From<config::ConfigError> for SearchError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
