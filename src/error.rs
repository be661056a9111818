use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV header mismatch: {0}")]
    HeaderMismatch(String),

    #[error("Bad record at line {line}: {message}")]
    BadRecord { line: u64, message: String },
}

pub type Result<T> = std::result::Result<T, EtlError>;
