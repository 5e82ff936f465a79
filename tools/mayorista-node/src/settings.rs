//! Config and session files for the command-line client.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use mayorista_common::MarketConfig;
use mayorista_delegate::Session;

const SESSION_FILE: &str = "session.json";

/// `$XDG_DATA_HOME/mayorista` or the platform equivalent.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mayorista")
}

/// Load the marketplace config. A missing file means defaults.
pub fn load_config(path: &Path) -> Result<MarketConfig> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no config file, using defaults");
            return Ok(MarketConfig::default());
        }
        Err(e) => return Err(e).with_context(|| format!("reading config {}", path.display())),
    };
    let config = serde_json::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    debug!(path = %path.display(), "config loaded");
    Ok(config)
}

pub fn load_session(data_dir: &Path) -> Result<Session> {
    let path = data_dir.join(SESSION_FILE);
    match std::fs::read_to_string(&path) {
        Ok(data) => serde_json::from_str(&data).with_context(|| format!("parsing session {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Session::default()),
        Err(e) => Err(e).with_context(|| format!("reading session {}", path.display())),
    }
}

pub fn save_session(data_dir: &Path, session: &Session) -> Result<()> {
    std::fs::create_dir_all(data_dir).with_context(|| format!("creating {}", data_dir.display()))?;
    let path = data_dir.join(SESSION_FILE);
    let data = serde_json::to_string_pretty(session).context("serializing session")?;
    std::fs::write(&path, data).with_context(|| format!("writing session {}", path.display()))?;
    debug!(path = %path.display(), "session saved");
    Ok(())
}
