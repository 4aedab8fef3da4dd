use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM provider config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Which provider implementation to construct.
///
/// Selected once at construction time; the rest of the system only ever
/// sees the `StoryProvider` trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Deterministic in-process stand-in. No network, reproducible tests.
    #[default]
    Mock,
    /// Any endpoint following the OpenAI chat completions contract.
    Openai,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mock => write!(f, "mock"),
            Self::Openai => write!(f, "openai"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default = "d_base_url")]
    pub base_url: String,
    /// Environment variable holding the API key. If the env var is unset
    /// and `provider = "openai"`, provider construction fails.
    #[serde(default = "d_api_key_env")]
    pub api_key_env: String,
    /// Model used for the character responder role.
    #[serde(default = "d_model_small")]
    pub model_character: String,
    /// Model used for the lock and turn-delta summarizer roles.
    #[serde(default = "d_model_small")]
    pub model_summary: String,
    /// Model used for narrative synthesis.
    #[serde(default = "d_model_large")]
    pub model_narrative: String,
    #[serde(default = "d_90")]
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Mock,
            base_url: d_base_url(),
            api_key_env: d_api_key_env(),
            model_character: d_model_small(),
            model_summary: d_model_small(),
            model_narrative: d_model_large(),
            request_timeout_secs: 90,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn d_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn d_model_small() -> String {
    "gpt-4o-mini".into()
}
fn d_model_large() -> String {
    "gpt-4o".into()
}
fn d_90() -> u64 {
    90
}
