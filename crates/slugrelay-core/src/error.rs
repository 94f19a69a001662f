use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read config {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML in config {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("cloud {cloud:?} in {path} must map to an http(s) URL, got {url:?}")]
    InvalidCloudUrl {
        path: PathBuf,
        cloud: String,
        url: String,
    },

    #[error("[tools] {tool} in {path} is empty")]
    EmptyToolPath { path: PathBuf, tool: &'static str },
}
