//! Language-model providers for StoryLoom.
//!
//! One capability trait ([`StoryProvider`]) with two implementations
//! selected by configuration at construction time: a deterministic mock
//! for tests and an OpenAI-compatible HTTP adapter. Every call made
//! through the trait is mirrored into the audit sink by the caller.

pub mod audit;
pub mod mock;
pub mod openai_compat;
pub mod traits;

use std::sync::Arc;

use loom_domain::config::{LlmConfig, ProviderKind};
use loom_domain::error::Result;

pub use audit::{AuditLog, AuditRecord, AuditSink};
pub use mock::MockProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use traits::{AgentRole, StoryProvider};

/// Construct the provider named by the config.
///
/// The choice is made exactly once, here. Nothing downstream inspects the
/// concrete type again.
pub fn provider_from_config(cfg: &LlmConfig) -> Result<Arc<dyn StoryProvider>> {
    match cfg.provider {
        ProviderKind::Mock => Ok(Arc::new(MockProvider::new())),
        ProviderKind::Openai => Ok(Arc::new(OpenAiCompatProvider::from_config(cfg)?)),
    }
}
