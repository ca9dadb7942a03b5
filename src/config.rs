//! Engine configuration. Every field has a default, so a configuration file only
//! needs to name what it changes.

use crate::error::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    pub table: TableConfig,
    pub fonts: FontCacheConfig,
    pub fetch: FetchConfig,
    /// Where [Engine::generate](crate::Engine::generate) writes finished documents
    pub output_dir: PathBuf,
    /// Directory that `/api/images/<name>` image references resolve against
    pub image_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            table: TableConfig::default(),
            fonts: FontCacheConfig::default(),
            fetch: FetchConfig::default(),
            output_dir: PathBuf::from("output"),
            image_dir: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<EngineConfig> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<EngineConfig> {
        let data = std::fs::read_to_string(path)?;
        EngineConfig::from_json_str(&data)
    }
}

/// Table body limits and the constants of the column-width derivation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Rows beyond this many are dropped from a bound table
    pub max_records: usize,
    /// Width of the table's outer border line, subtracted twice from the table width
    pub border_width: f32,
    /// Added to every column but the first to account for shared border lines
    pub column_border_adjustment: f32,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            max_records: 100,
            border_width: 1.0,
            column_border_adjustment: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FontCacheConfig {
    /// Number of cached fonts at which the whole cache is cleared
    pub cache_size: usize,
    pub cache_enabled: bool,
    pub preload_common_fonts: bool,
    /// Total bytes of cached font data a load may not push the cache past
    pub memory_threshold_bytes: usize,
    /// Directory with `<name>.ttf` / `<name>.otf` files
    pub font_dir: Option<PathBuf>,
    /// Name of the font used when none (or an unknown one) is requested
    pub default_font: String,
}

impl Default for FontCacheConfig {
    fn default() -> Self {
        FontCacheConfig {
            cache_size: 10,
            cache_enabled: true,
            preload_common_fonts: false,
            memory_threshold_bytes: 100 * 1024 * 1024,
            font_dir: None,
            default_font: "noto-sans-sc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub json_connect_timeout_ms: u64,
    pub json_read_timeout_ms: u64,
    pub image_connect_timeout_ms: u64,
    pub image_read_timeout_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            json_connect_timeout_ms: 10_000,
            json_read_timeout_ms: 30_000,
            image_connect_timeout_ms: 30_000,
            image_read_timeout_ms: 30_000,
        }
    }
}

impl FetchConfig {
    pub(crate) fn json_timeouts(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.json_connect_timeout_ms),
            Duration::from_millis(self.json_read_timeout_ms),
        )
    }

    pub(crate) fn image_timeouts(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.image_connect_timeout_ms),
            Duration::from_millis(self.image_read_timeout_ms),
        )
    }
}
