//! Errors raised by the shared bootstrap code: config files and the
//! record store schema.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// SQLite open, pragma or schema statement failed
    #[cfg(feature = "sqlx")]
    #[error("Record store error: {0}")]
    Database(#[from] sqlx::Error),

    /// Root folder or database directory could not be created
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// `--config` named a file that does not exist
    #[error("Config file not found: {}", .0.display())]
    ConfigMissing(PathBuf),
}
