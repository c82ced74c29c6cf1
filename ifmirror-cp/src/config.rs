//! Daemon configuration.
//!
//! CLI flags pick the config file and may override the control socket; the
//! config file declares the dataplane interface table, the message-id
//! block base and an optional boot-time default namespace.

use clap::Parser;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default control socket path.
pub const DEFAULT_SOCKET: &str = "/run/ifmirror/control.sock";

#[derive(Debug, Parser)]
#[command(
    name = "ifmirror-cp",
    about = "Dataplane/Linux interface-mirror control plane"
)]
pub struct Cli {
    /// Path to the daemon config file.
    #[arg(long, default_value = "/etc/ifmirror/config.json")]
    pub config: PathBuf,

    /// Control socket path (overrides the config file).
    #[arg(long)]
    pub socket: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("duplicate phy id {0} in interface table")]
    DuplicatePhy(u32),

    #[error("msg_id_base must be above the reserved lookup id")]
    ReservedMsgIdBase,
}

/// One dataplane interface the daemon may mirror.
#[derive(Debug, Clone, Deserialize)]
pub struct PhyEntry {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Dataplane interface table. May be empty; every create then fails.
    #[serde(default)]
    pub interfaces: Vec<PhyEntry>,

    /// Default network namespace applied when requests leave theirs empty.
    #[serde(default)]
    pub default_netns: String,

    /// Control socket path.
    #[serde(default = "default_socket")]
    pub socket: PathBuf,

    /// First message id of the assigned block.
    #[serde(default = "default_msg_id_base")]
    pub msg_id_base: u16,
}

fn default_socket() -> PathBuf {
    PathBuf::from(DEFAULT_SOCKET)
}

fn default_msg_id_base() -> u16 {
    256
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.msg_id_base == ifmirror_api::MSG_LOOKUP_ID {
            return Err(ConfigError::ReservedMsgIdBase);
        }
        let mut seen = HashSet::new();
        for entry in &self.interfaces {
            if !seen.insert(entry.id) {
                return Err(ConfigError::DuplicatePhy(entry.id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        config.validate().unwrap();
        assert!(config.interfaces.is_empty());
        assert_eq!(config.default_netns, "");
        assert_eq!(config.socket, PathBuf::from(DEFAULT_SOCKET));
        assert_eq!(config.msg_id_base, 256);
    }

    #[test]
    fn test_full_config() {
        let raw = r#"{
            "interfaces": [
                { "id": 1, "name": "dp0" },
                { "id": 5, "name": "dp1" }
            ],
            "default_netns": "ns0",
            "socket": "/tmp/ifmirror.sock",
            "msg_id_base": 512
        }"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        config.validate().unwrap();
        assert_eq!(config.interfaces.len(), 2);
        assert_eq!(config.interfaces[1].name, "dp1");
        assert_eq!(config.default_netns, "ns0");
        assert_eq!(config.msg_id_base, 512);
    }

    #[test]
    fn test_duplicate_phy_rejected() {
        let raw = r#"{ "interfaces": [
            { "id": 3, "name": "a" },
            { "id": 3, "name": "b" }
        ]}"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicatePhy(3))
        ));
    }

    #[test]
    fn test_reserved_msg_id_base_rejected() {
        let config: Config = serde_json::from_str(r#"{ "msg_id_base": 0 }"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ReservedMsgIdBase)
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "interfaces": [{{ "id": 1, "name": "dp0" }}] }}"#).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.interfaces.len(), 1);

        assert!(matches!(
            Config::load(Path::new("/nonexistent/config.json")),
            Err(ConfigError::Read { .. })
        ));
    }
}
