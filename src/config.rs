//! Configuration management
//!
//! All file-system locations used by the generator and cache are passed in
//! through [`Config`]; the locator itself never touches paths.

use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub generator: GeneratorConfig,
    pub cache: CacheConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    /// The `epub-cfi-generator` executable
    pub executable: PathBuf,
    /// Where the generator writes its transient JSON output
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Directory holding `database_<hash>.json` records
    pub dir: PathBuf,
    /// Number of parsed books kept in memory
    pub library_capacity: NonZeroUsize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    pub highlight_color: String,
}

const DEFAULT_GENERATOR: &str = "node_modules/.bin/epub-cfi-generator";
const DEFAULT_OUTPUT_DIR: &str = "data/cfis";
const DEFAULT_CACHE_DIR: &str = "data/databases";
const DEFAULT_LIBRARY_CAPACITY: NonZeroUsize = match NonZeroUsize::new(8) {
    Some(n) => n,
    None => unreachable!(),
};
const DEFAULT_COLOR: &str = "yellow";

impl Default for Config {
    fn default() -> Self {
        Config {
            generator: GeneratorConfig {
                executable: PathBuf::from(DEFAULT_GENERATOR),
                output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            },
            cache: CacheConfig {
                dir: PathBuf::from(DEFAULT_CACHE_DIR),
                library_capacity: DEFAULT_LIBRARY_CAPACITY,
            },
            export: ExportConfig {
                highlight_color: DEFAULT_COLOR.to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let library_capacity = match lookup("CFI_LIBRARY_CAPACITY") {
            Some(raw) => raw
                .trim()
                .parse::<NonZeroUsize>()
                .map_err(|e| AppError::Config(format!("CFI_LIBRARY_CAPACITY={}: {}", raw, e)))?,
            None => DEFAULT_LIBRARY_CAPACITY,
        };

        Ok(Config {
            generator: GeneratorConfig {
                executable: lookup("CFI_GENERATOR_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_GENERATOR)),
                output_dir: lookup("CFI_OUTPUT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            },
            cache: CacheConfig {
                dir: lookup("CFI_CACHE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR)),
                library_capacity,
            },
            export: ExportConfig {
                highlight_color: lookup("CFI_HIGHLIGHT_COLOR")
                    .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            },
        })
    }
}
