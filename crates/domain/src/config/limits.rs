use serde::{Deserialize, Serialize};

/// Caps applied when normalizing setup and narrative inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Cap for free text fields (world, chapter, identity, narrative
    /// definition, user prompts are not capped).
    #[serde(default = "d_5000")]
    pub text_cap: usize,
    /// Cap for agent display names.
    #[serde(default = "d_120")]
    pub name_cap: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            text_cap: 5000,
            name_cap: 120,
        }
    }
}

fn d_5000() -> usize {
    5000
}
fn d_120() -> usize {
    120
}
