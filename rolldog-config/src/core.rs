use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::error::Error;
use super::general::General;

/// Configuration.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// General configuration.
    #[serde(default)]
    pub general: General,
}

impl Config {
    /// Load configuration from disk or use defaults.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let config = if let Ok(contents) = read_to_string(path) {
            let config = match toml::from_str(&contents) {
                Ok(config) => config,
                Err(err) => return Err(Error::Parse(path.to_owned(), Box::new(err))),
            };
            info!("loaded \"{}\"", path.display());
            config
        } else {
            warn!(
                "\"{}\" doesn't exist, loading defaults instead",
                path.display()
            );
            Config::default()
        };

        Ok(config)
    }

    /// Validate a config file, reporting parse errors without falling back
    /// to defaults. Used by `configcheck`.
    pub fn check(path: &PathBuf) -> Result<Self, Error> {
        let contents = read_to_string(path).map_err(|err| Error::Io(path.clone(), err))?;
        toml::from_str(&contents).map_err(|err| Error::Parse(path.clone(), Box::new(err)))
    }
}
