use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "slugrelay.toml";

/// slugrelay.toml configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Cloud name to upstream API base URL.
    #[serde(default = "default_clouds")]
    pub clouds: BTreeMap<String, String>,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

/// Program names (or absolute paths) of the external packaging tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_tar")]
    pub tar: String,
    #[serde(default = "default_mksquashfs")]
    pub mksquashfs: String,
    #[serde(default = "default_unsquashfs")]
    pub unsquashfs: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Per-request timeout for upstream API calls
    #[serde(default = "default_upstream_secs")]
    pub upstream_secs: u64,
    /// Timeout for uploading a slug image to its pre-signed URL
    #[serde(default = "default_upload_secs")]
    pub upload_secs: u64,
    /// Timeout for downloading a build artifact
    #[serde(default = "default_download_secs")]
    pub download_secs: u64,
    /// Timeout for a single external tool invocation
    #[serde(default = "default_tool_secs")]
    pub tool_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            clouds: default_clouds(),
            tools: ToolsConfig::default(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            tar: default_tar(),
            mksquashfs: default_mksquashfs(),
            unsquashfs: default_unsquashfs(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upstream_secs: default_upstream_secs(),
            upload_secs: default_upload_secs(),
            download_secs: default_download_secs(),
            tool_secs: default_tool_secs(),
        }
    }
}

impl TimeoutConfig {
    pub fn upstream(&self) -> Duration {
        Duration::from_secs(self.upstream_secs)
    }

    pub fn upload(&self) -> Duration {
        Duration::from_secs(self.upload_secs)
    }

    pub fn download(&self) -> Duration {
        Duration::from_secs(self.download_secs)
    }

    pub fn tool(&self) -> Duration {
        Duration::from_secs(self.tool_secs)
    }
}

impl RelayConfig {
    /// Load from the given TOML file, or return defaults if it does not exist.
    pub fn load(config_path: &Path) -> crate::Result<Self> {
        if config_path.exists() {
            let content =
                std::fs::read_to_string(config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.to_path_buf(),
                    source: e,
                })?;
            let config: Self = toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path.to_path_buf(),
                source: e,
            })?;
            config.validate(config_path)?;
            tracing::debug!(path = %config_path.display(), "loaded config");
            Ok(config)
        } else {
            tracing::debug!(path = %config_path.display(), "config not found, using defaults");
            Ok(Self::default())
        }
    }

    fn validate(&self, config_path: &Path) -> crate::Result<()> {
        for (cloud, url) in &self.clouds {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(crate::Error::InvalidCloudUrl {
                    path: config_path.to_path_buf(),
                    cloud: cloud.clone(),
                    url: url.clone(),
                });
            }
        }
        let tools = [
            ("tar", &self.tools.tar),
            ("mksquashfs", &self.tools.mksquashfs),
            ("unsquashfs", &self.tools.unsquashfs),
        ];
        for (tool, program) in tools {
            if program.trim().is_empty() {
                return Err(crate::Error::EmptyToolPath {
                    path: config_path.to_path_buf(),
                    tool,
                });
            }
        }
        Ok(())
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5000))
}

fn default_clouds() -> BTreeMap<String, String> {
    BTreeMap::from([("standard".to_owned(), "https://api.heroku.com".to_owned())])
}

fn default_tar() -> String {
    "tar".to_owned()
}

fn default_mksquashfs() -> String {
    "mksquashfs".to_owned()
}

fn default_unsquashfs() -> String {
    "unsquashfs".to_owned()
}

fn default_upstream_secs() -> u64 {
    60
}

fn default_upload_secs() -> u64 {
    600
}

fn default_download_secs() -> u64 {
    600
}

fn default_tool_secs() -> u64 {
    600
}
