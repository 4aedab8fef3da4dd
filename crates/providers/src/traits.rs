use serde::Serialize;
use serde_json::Value;
use std::fmt;

use loom_domain::error::Result;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Agent roles
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The four fixed agent roles a provider can be invoked under.
///
/// The role tag travels with every request and audit record; providers may
/// use it to select a system prompt but must not branch on anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentRole {
    /// Locks the world/chapter setup into the first memory block.
    WorldLock,
    /// Summarizes a contiguous range of turns into a turn-delta block.
    Delta,
    /// Responds in character to a user prompt.
    Character,
    /// Synthesizes a chapter draft once the chapter has ended.
    Narrative,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorldLock => "world-lock",
            Self::Delta => "delta",
            Self::Character => "character",
            Self::Narrative => "narrative",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core provider trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Trait every language-model adapter must implement.
///
/// `payload` is the structured context assembled for the role; providers
/// render it into a prompt but never reach back into session state.
#[async_trait::async_trait]
pub trait StoryProvider: Send + Sync {
    /// Generate text for one agent role. May fail transiently (network,
    /// timeout) or with an authorization error; both surface as
    /// `Error::Provider`.
    async fn generate(&self, role: AgentRole, model: &str, payload: &Value) -> Result<String>;

    /// A unique identifier for this provider instance.
    fn provider_id(&self) -> &str;
}
