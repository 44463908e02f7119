use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Scanner '{backend}' failed on {path}: {message}")]
    Scanner {
        backend: String,
        path: String,
        message: String,
    },

    #[error("Tracked file not found: {0}")]
    NotFound(String),

    #[error("Invalid file status code: {0}")]
    InvalidStatus(i64),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
