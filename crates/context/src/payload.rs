//! Serializable view structs, the only shapes handed to providers.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use loom_domain::model::{EventRole, MemoryBlockKind};

/// Setup snapshot handed to the world/chapter locker. No history.
#[derive(Debug, Clone, Serialize)]
pub struct LockPayload {
    pub world_text: String,
    pub chapter_text: String,
    pub selected_agent_slots: Vec<u8>,
    pub agent_names: BTreeMap<u8, String>,
    pub agent_identity_text_by_slot: BTreeMap<u8, String>,
}

/// An event reduced for summarization and narrative synthesis.
#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    pub prompt_index: u32,
    pub role: EventRole,
    pub agent_slot: Option<u8>,
    pub text: String,
}

/// The `[from, to]` slice of events handed to the turn-delta summarizer.
#[derive(Debug, Clone, Serialize)]
pub struct DeltaPayload {
    pub from_prompt_index: u32,
    pub to_prompt_index: u32,
    pub events: Vec<EventView>,
}

/// Who the character agent is this turn.
#[derive(Debug, Clone, Serialize)]
pub struct AgentIdentity {
    pub slot: u8,
    pub name: String,
    pub identity_text: String,
    /// Full name map so the agent can reference the other personas.
    pub all_agent_names: BTreeMap<u8, String>,
}

/// A recent-context event, annotated with the speaker's display name.
#[derive(Debug, Clone, Serialize)]
pub struct ContextEventView {
    pub prompt_index: u32,
    pub role: EventRole,
    pub agent_slot: Option<u8>,
    pub agent_name: Option<String>,
    pub text: String,
}

/// A memory block reduced to `(type, range, payload)`.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryBlockView {
    #[serde(rename = "type")]
    pub kind: MemoryBlockKind,
    pub from_prompt_index: u32,
    pub to_prompt_index: u32,
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct CharacterMeta {
    pub session_id: String,
    pub prompt_index: u32,
    /// `[from, to]` of the sliding window; empty when no window applies.
    pub context_prompt_range: Vec<u32>,
}

/// Everything the character responder sees for one turn.
#[derive(Debug, Clone, Serialize)]
pub struct CharacterPayload {
    pub agent_identity: AgentIdentity,
    pub structured_memory: Vec<MemoryBlockView>,
    pub recent_context: Vec<ContextEventView>,
    pub user_prompt: String,
    pub meta: CharacterMeta,
}

/// A memory block for narrative synthesis. Keeps the block id so the
/// draft's provenance can be cross-checked.
#[derive(Debug, Clone, Serialize)]
pub struct NarrativeBlockView {
    pub block_id: String,
    #[serde(rename = "type")]
    pub kind: MemoryBlockKind,
    pub from_prompt_index: u32,
    pub to_prompt_index: u32,
    pub payload: Value,
}

/// Full transcript plus full memory; narrative synthesis runs only once
/// the chapter is closed, so no windowing applies.
#[derive(Debug, Clone, Serialize)]
pub struct NarrativePayload {
    pub narrative_definition_text: String,
    pub events: Vec<EventView>,
    pub memory_blocks: Vec<NarrativeBlockView>,
}
