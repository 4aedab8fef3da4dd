use serde::{Deserialize, Serialize};

/// Compaction folds spans of raw turns into append-only memory blocks so
/// agent context stays bounded after many turns.
///
/// `chunk_size` is both the number of turns per compaction unit and the
/// width of the recent-context sliding window handed to character agents.
/// Changing it mid-session does not alter already-produced block boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactionConfig {
    /// Turns per compaction unit (scheduled compaction triggers at
    /// positive multiples of this value).
    #[serde(default = "d_7")]
    pub chunk_size: u32,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self { chunk_size: 7 }
    }
}

fn d_7() -> u32 {
    7
}
