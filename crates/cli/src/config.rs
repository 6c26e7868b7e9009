// Configuration file loading
// reason: config crate for TOML + FLEETPING_* environment layering

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use fleetping_core::application::dispatcher::constants::{DEFAULT_NUM_PROC, DEFAULT_PING_CMD};
use fleetping_core::domain::{GroupSpec, NodeRegistry, NodeSpec};

pub const DEFAULT_CONF: &str = "~/.fleetping/fleetping.toml";
const ENV_PREFIX: &str = "FLEETPING";

/// Settings read from the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FleetConfig {
    #[serde(default = "default_ping_cmd")]
    pub ping_cmd: String,
    #[serde(default = "default_num_proc")]
    pub num_proc: usize,
    /// Seconds between launches; 0 is no delay, negative runs one at a time
    #[serde(default)]
    pub sleep_time: i64,
    /// Overrides local node detection
    #[serde(default)]
    pub nodename: Option<String>,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
}

fn default_ping_cmd() -> String {
    DEFAULT_PING_CMD.to_string()
}

fn default_num_proc() -> usize {
    DEFAULT_NUM_PROC
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            ping_cmd: default_ping_cmd(),
            num_proc: default_num_proc(),
            sleep_time: 0,
            nodename: None,
            nodes: Vec::new(),
            groups: Vec::new(),
        }
    }
}

impl FleetConfig {
    /// Load from `path`, or from the default location when none is given
    ///
    /// An explicitly named file must exist; the default one is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (expand(&p.to_string_lossy()), true),
            None => (expand(DEFAULT_CONF), false),
        };

        if required && !path.is_file() {
            anyhow::bail!("{}: no such configuration file", path.display());
        }

        info!(path = %path.display(), required, "Loading configuration");

        let settings = config::Config::builder()
            .add_source(
                config::File::new(&path.to_string_lossy(), config::FileFormat::Toml)
                    .required(required),
            )
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("failed to read {}", path.display()))?;

        let config: FleetConfig = settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))?;

        debug!(
            nodes = config.nodes.len(),
            groups = config.groups.len(),
            num_proc = config.num_proc,
            sleep_time = config.sleep_time,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Build the node registry described by this configuration
    pub fn registry(&self) -> Result<NodeRegistry> {
        NodeRegistry::new(self.nodes.clone(), self.groups.clone())
            .context("invalid node configuration")
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
