use std::{fs::File, io::Read, path::Path};

use anyhow::{Result, anyhow};
use lib_msalign::config::{LibraryConfig, ProgressiveConfig, RefinementConfig, SwapConfig};
use log::debug;
use serde::Deserialize;

/// The parameters of all stages of an alignment run.
///
/// Each stage is a table in the toml file, and missing tables or fields fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Configuration {
    pub progressive: ProgressiveConfig,
    pub library: LibraryConfig,
    pub refinement: RefinementConfig,
    pub swap: SwapConfig,
}

impl Configuration {
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading configuration file {path:?}");

        let mut buffer = String::new();
        File::open(path)
            .map_err(|error| anyhow!("Unable to open configuration file {path:?}: {error}"))?
            .read_to_string(&mut buffer)
            .map_err(|error| anyhow!("Error reading configuration file {path:?}: {error}"))?;
        toml::from_str(&buffer)
            .map_err(|error| anyhow!("Error parsing configuration file {path:?}: {error}"))
    }
}
