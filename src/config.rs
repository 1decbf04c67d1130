use anyhow::Context;
use serde::Deserialize;

/// Top-level configuration, loaded from a YAML file.
///
/// The file path comes from the `POLISH_CONFIG` environment variable
/// (default `polish.yaml`); a missing file falls back to defaults, an
/// unreadable one is an error.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub rewrite: RewriteConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Which built-in body transforms the binary registers.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RewriteConfig {
    pub html: bool,
    pub css: bool,
    pub js: bool,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            html: true,
            css: true,
            js: true,
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("POLISH_CONFIG").unwrap_or_else(|_| "polish.yaml".to_string());

        match std::fs::read_to_string(&path) {
            Ok(raw) => {
                Self::from_yaml(&raw).with_context(|| format!("invalid config file {path}"))
            }
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }
}
