use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Cli;

/// Central configuration for honeyswitch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub listen: ListenConfig,
    pub audit: AuditConfig,
    pub connection: ConnectionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    pub logfile: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Optional read deadline in milliseconds. The emulated device applies
    /// none; hardened deployments can set one to shed idle scanners.
    pub read_timeout_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: ListenConfig {
                host: "0.0.0.0".to_string(),
                port: 80,
            },
            audit: AuditConfig {
                logfile: PathBuf::from("auth_log.txt"),
            },
            connection: ConnectionConfig {
                read_timeout_ms: None,
            },
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, or from the standard config
    /// directory, creating the file with defaults on first run.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::get_config_path);

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save(&config_path)?;
            Ok(config)
        }
    }

    /// Save configuration to the given path.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("honeyswitch");
        path.push("config.json");
        path
    }

    /// Overlay values given on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.listen.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.listen.port = port;
        }
        if let Some(logfile) = &cli.logfile {
            self.audit.logfile = logfile.clone();
        }
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        if self.listen.host.parse::<IpAddr>().is_err() {
            return Err(anyhow::anyhow!(
                "listen.host must be an IP address, got {:?}",
                self.listen.host
            ));
        }

        if self.audit.logfile.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("audit.logfile must not be empty"));
        }

        if self.connection.read_timeout_ms == Some(0) {
            return Err(anyhow::anyhow!("connection.read_timeout_ms must be greater than 0"));
        }

        Ok(())
    }

    /// Socket address the listener binds.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.listen.host.parse()?;
        Ok(SocketAddr::new(ip, self.listen.port))
    }

    /// Effective read deadline, if one is configured.
    pub fn read_timeout(&self) -> Option<Duration> {
        self.connection.read_timeout_ms.map(Duration::from_millis)
    }
}
