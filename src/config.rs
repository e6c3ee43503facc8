// ── Startup configuration ─────────────────────────────────────────────────────
//
// Reads `kindle.json` from the working directory (or the file named by
// `KINDLE_CONFIG`).  No `unsafe`: safe Rust and serde_json only.

use std::{fs, io, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KindleError, Result};

const DEFAULT_WIDTH: i32 = 1200;
const DEFAULT_HEIGHT: i32 = 720;
/// Largest window extent Win32 accepts per side.
const MAX_EXTENT: i32 = 32_767;
const DEFAULT_TITLE: &str = "Kindle";
const CONFIG_FILE: &str = "kindle.json";
const CONFIG_ENV: &str = "KINDLE_CONFIG";

/// Everything the process needs before the first window exists.
///
/// Every field falls back to its default when absent, so an empty object
/// `{}` is a valid configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    /// Requested client-area width in pixels, `1..=MAX_EXTENT`.
    pub(crate) width: i32,
    /// Requested client-area height in pixels, `1..=MAX_EXTENT`.
    pub(crate) height: i32,
    /// Window title.  Also used as the window class identifier.
    pub(crate) title: String,
    /// Default log filter; `RUST_LOG` overrides it.
    pub(crate) log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            title: DEFAULT_TITLE.to_owned(),
            log_level: "info".to_owned(),
        }
    }
}

impl Config {
    /// Parse a configuration document and check the requested size.
    pub(crate) fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let extents = 1..=MAX_EXTENT;
        if extents.contains(&self.width) && extents.contains(&self.height) {
            Ok(())
        } else {
            Err(KindleError::WindowSize {
                width: self.width,
                height: self.height,
            })
        }
    }
}

/// Return the configuration path: `$KINDLE_CONFIG`, else `./kindle.json`.
pub(crate) fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

/// Load the configuration.  A missing file yields defaults; an unreadable
/// or malformed one is an error.
pub(crate) fn load() -> Result<Config> {
    let path = config_path();
    match fs::read_to_string(&path) {
        Ok(text) => Config::from_json(&text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e.into()),
    }
}
