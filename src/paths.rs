//! Configuration file discovery
//!
//! - **Working directory**: `config.yaml` in the current directory wins, which
//!   keeps `cargo run` and scenario folders self-contained.
//! - **User config dir** (default): `<config dir>/vcontrol/config.yaml`, e.g.
//!   `~/.config/vcontrol` on Linux or `%APPDATA%\vcontrol` on Windows.
//!
//! Custom gamepad profiles live next to the config in `profiles.yaml`.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Directory name under the platform config dir
const APP_NAME: &str = "vcontrol";

const CONFIG_FILE: &str = "config.yaml";
const PROFILES_FILE: &str = "profiles.yaml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub config: PathBuf,
    pub profiles: PathBuf,
    /// Found in the working directory rather than the user config dir
    pub local: bool,
}

impl ConfigPaths {
    /// Resolve paths for the current environment
    pub fn detect() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::detect_from(&cwd, dirs::config_dir())
    }

    pub(crate) fn detect_from(cwd: &Path, config_dir: Option<PathBuf>) -> Self {
        let local = cwd.join(CONFIG_FILE);
        if local.exists() {
            debug!("Using config from working directory: {}", cwd.display());
            return Self::in_dir(cwd, true);
        }

        let base = config_dir
            .map(|d| d.join(APP_NAME))
            .unwrap_or_else(|| cwd.to_path_buf());
        debug!("Using config from user config dir: {}", base.display());
        Self::in_dir(&base, false)
    }

    /// Paths for an explicit config file; profiles sit beside it
    pub fn from_config(config: impl Into<PathBuf>) -> Self {
        let config = config.into();
        let dir = config
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            profiles: dir.join(PROFILES_FILE),
            config,
            local: false,
        }
    }

    fn in_dir(dir: &Path, local: bool) -> Self {
        Self {
            config: dir.join(CONFIG_FILE),
            profiles: dir.join(PROFILES_FILE),
            local,
        }
    }

    pub fn base_dir(&self) -> PathBuf {
        self.config
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
