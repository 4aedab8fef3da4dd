use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the session store persists its state.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StateConfig {
    /// Optional path to the on-disk JSON snapshot. `None` keeps the store
    /// purely in memory (tests, ephemeral runs).
    #[serde(default)]
    pub path: Option<PathBuf>,
}
