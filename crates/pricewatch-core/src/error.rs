use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("source returned no data: {0}")]
    EmptyResult(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("malformed price field: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::SourceUnavailable(err.to_string())
    }
}
