//! Configuration for the inspector session.
//!
//! Every field has a default so an empty (or missing) file yields a usable
//! configuration.

use std::{
    io::Read,
    path::{Path, PathBuf},
    time::Duration,
};

use eyre::Context;
use serde::{Deserialize, Serialize};

/// Port the Node.js inspector listens on when activated without an explicit port
pub const DEFAULT_INSPECTOR_PORT: u16 = 9229;

/// Substring that marks a console message as a logpoint hit
pub const DEFAULT_LOGPOINT_SENTINEL: &str = "LOGPOINT:";

const CONFIG_DIR_NAME: &str = "node-inspector";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub inspector: InspectorConfig,
    pub logpoints: LogpointConfig,
}

/// How to reach and configure the inspector of the debugged process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InspectorConfig {
    /// Host used when a target is given as a bare port
    pub host: String,

    /// Port used by `connect_default`
    pub port: u16,

    /// Maximum number of async stack frames the inspector captures
    pub async_call_stack_depth: u32,

    /// Upper bound on waiting for a signalled process to open its port
    pub readiness_timeout_ms: u64,

    /// Delay between two readiness probes
    pub readiness_poll_interval_ms: u64,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_INSPECTOR_PORT,
            async_call_stack_depth: 32,
            readiness_timeout_ms: 2_000,
            readiness_poll_interval_ms: 50,
        }
    }
}

impl InspectorConfig {
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }

    pub fn readiness_poll_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_poll_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogpointConfig {
    pub sentinel: String,
}

impl Default for LogpointConfig {
    fn default() -> Self {
        Self {
            sentinel: DEFAULT_LOGPOINT_SENTINEL.to_string(),
        }
    }
}

/// Location of the user configuration file, if a config directory exists
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

pub fn load(mut reader: impl Read) -> eyre::Result<Config> {
    let mut contents = String::new();
    reader
        .read_to_string(&mut contents)
        .context("reading configuration")?;
    let config = toml::from_str(&contents).context("parsing configuration")?;
    Ok(config)
}

pub fn load_from(path: impl AsRef<Path>) -> eyre::Result<Config> {
    let path = path.as_ref();
    let f = std::fs::File::open(path)
        .with_context(|| format!("opening configuration {}", path.display()))?;
    let config = load(f).with_context(|| format!("loading {}", path.display()))?;
    Ok(config)
}

/// Load the configuration at `path` (or the default location), falling back
/// to defaults when no file exists. A file that exists but does not parse is
/// an error.
pub fn load_or_default(path: Option<&Path>) -> eyre::Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_path() {
            Some(path) => path,
            None => {
                tracing::debug!("no configuration directory, using defaults");
                return Ok(Config::default());
            }
        },
    };

    if !path.is_file() {
        tracing::debug!(path = %path.display(), "configuration file not found, using defaults");
        return Ok(Config::default());
    }

    tracing::debug!(path = %path.display(), "loading configuration");
    load_from(&path)
}
