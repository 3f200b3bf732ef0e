//! Bootstrap configuration loading and root folder resolution
//!
//! Priority order for every bootstrap setting:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing config file is not an error: services start with defaults and
//! log a warning.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "CSYNC_ROOT_FOLDER";

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "CSYNC_CONFIG";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "csync.db";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Locate the TOML config file for `module_name`
///
/// Order: explicit path → `CSYNC_CONFIG` → `<config_dir>/csync/<module>.toml`.
/// Returns `None` when no candidate exists on disk.
pub fn locate_config_file(explicit: Option<&Path>, module_name: &str) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }

    let user_config = dirs::config_dir()
        .map(|d| d.join("csync").join(format!("{}.toml", module_name)))?;
    if user_config.exists() {
        Some(user_config)
    } else {
        None
    }
}

/// Parse a TOML file into `T`
pub fn load_toml_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| Error::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load `T` from the located config file, falling back to `T::default()`
///
/// An explicitly requested file that cannot be read is an error; an absent
/// optional file is not.
pub fn load_config_or_default<T: DeserializeOwned + Default>(
    explicit: Option<&Path>,
    module_name: &str,
) -> Result<T> {
    match locate_config_file(explicit, module_name) {
        Some(path) if path.exists() => {
            info!("Loading configuration from {}", path.display());
            load_toml_file(&path)
        }
        Some(path) if explicit.is_some() => Err(Error::ConfigMissing(path)),
        Some(path) => {
            warn!(
                "Config file {} does not exist, using built-in defaults",
                path.display()
            );
            Ok(T::default())
        }
        None => {
            warn!("No config file found, using built-in defaults");
            Ok(T::default())
        }
    }
}

/// Resolves the root folder holding the database and local object storage
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>, toml_value: Option<PathBuf>) -> Self {
        Self {
            cli_arg,
            toml_value,
        }
    }

    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = &self.toml_value {
            return path.clone();
        }

        // Priority 4: OS-dependent compiled default
        default_root_folder()
    }
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("csync"))
        .unwrap_or_else(|| PathBuf::from("./csync_data"))
}

/// Creates the root folder layout on first run
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    /// Directory used by the filesystem object store
    pub fn objects_path(&self) -> PathBuf {
        self.root_folder.join("objects")
    }
}
