use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration, fixed at startup.
///
/// Loaded from an optional YAML file (`PLINTH_CONFIG`) with environment
/// variable overrides. Shared read-only by all connections; there is no
/// runtime reconfiguration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Root directory of the served file tree. Read-only input produced by
    /// an external build step.
    pub root: PathBuf,
    /// Default document served for `/`, directory requests, and SPA fallback.
    pub index: String,
    /// When true, unresolved paths are answered with the default document
    /// (200) so a client-side router can take over. When false, they are
    /// plain 404s.
    pub spa_fallback: bool,
    /// Per-connection read timeout in seconds. A client that does not
    /// deliver a complete request within this window is disconnected.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4321,
            root: PathBuf::from("dist"),
            index: "index.html".to_string(),
            spa_fallback: true,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Loads configuration: YAML file named by `PLINTH_CONFIG` if set,
    /// then environment variable overrides on top.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var_os("PLINTH_CONFIG") {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading config file {}", path.to_string_lossy()))?;
                serde_yaml::from_str(&text)
                    .with_context(|| format!("parsing config file {}", path.to_string_lossy()))?
            }
            None => Self::default(),
        };

        if let Ok(host) = std::env::var("PLINTH_HOST") {
            cfg.host = host;
        }
        if let Ok(port) = std::env::var("PLINTH_PORT") {
            cfg.port = port.parse().context("PLINTH_PORT is not a valid port")?;
        }
        if let Ok(root) = std::env::var("PLINTH_ROOT") {
            cfg.root = PathBuf::from(root);
        }
        if let Ok(index) = std::env::var("PLINTH_INDEX") {
            cfg.index = index;
        }
        if let Ok(v) = std::env::var("PLINTH_SPA_FALLBACK") {
            cfg.spa_fallback = v
                .parse()
                .context("PLINTH_SPA_FALLBACK must be true or false")?;
        }

        Ok(cfg)
    }

    /// The `host:port` string the listener binds.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
