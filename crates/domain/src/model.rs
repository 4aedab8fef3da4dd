//! The story-session data model.
//!
//! `Session` is the root aggregate; `Tab1Inputs`, `Event`, `MemoryBlock`,
//! and `NarrativeDraft` are lifecycle-bound to exactly one session and
//! travel together as a [`SessionRecord`]. Events, blocks, and drafts are
//! append-only: nothing mutates or removes them except a full reset.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Valid agent slot range (inclusive).
pub const MIN_AGENT_SLOT: u8 = 1;
pub const MAX_AGENT_SLOT: u8 = 7;

/// Deterministic default display name per slot.
pub fn default_agent_name(slot: u8) -> String {
    match slot {
        1 => "Agent Red".into(),
        2 => "Agent Orange".into(),
        3 => "Agent Yellow".into(),
        4 => "Agent Green".into(),
        5 => "Agent Blue".into(),
        6 => "Agent Indigo".into(),
        7 => "Agent Violet".into(),
        other => format!("Agent {other}"),
    }
}

/// Truncate to at most `cap` characters (not bytes; slot identity text is
/// frequently non-ASCII).
pub fn truncate_chars(s: &str, cap: usize) -> String {
    s.chars().take(cap).collect()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session state machine
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Session states. `Locking`, `Summarizing`, `Narrating`, and `Resetting`
/// are transient: they exist only on the in-operation working copy of a
/// record and are never committed to the store. Any crash mid-operation
/// therefore leaves the session in its pre-operation stable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    DraftSetup,
    Locking,
    Active,
    Summarizing,
    Ended,
    Narrating,
    Resetting,
}

impl SessionState {
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::Locking | Self::Summarizing | Self::Narrating | Self::Resetting
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DraftSetup => "DraftSetup",
            Self::Locking => "Locking",
            Self::Active => "Active",
            Self::Summarizing => "Summarizing",
            Self::Ended => "Ended",
            Self::Narrating => "Narrating",
            Self::Resetting => "Resetting",
        };
        f.write_str(s)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Root aggregate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub state: SessionState,
    /// Count of user turns since the last lock/reset. Monotonic within a
    /// locked lifetime; only `SubmitPrompt` increments it, by exactly 1.
    pub prompt_index: u32,
    /// Upper bound (inclusive) of the last compacted range. Always
    /// `<= prompt_index`.
    pub last_summarized_prompt_index: u32,
    /// Sorted, deduplicated, non-empty; immutable once `tab1_locked`.
    pub selected_agent_slots: Vec<u8>,
    /// Display name per selected slot.
    pub agent_names: BTreeMap<u8, String>,
    /// One-way flag: set by `LockSetup`, cleared only by `ResetSession`.
    pub tab1_locked: bool,
    /// Free text steering narrative synthesis; settable post-lock.
    pub narrative_definition_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// A fresh session with creation defaults (also the post-reset shape).
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            state: SessionState::DraftSetup,
            prompt_index: 0,
            last_summarized_prompt_index: 0,
            selected_agent_slots: vec![MIN_AGENT_SLOT],
            agent_names: BTreeMap::from([(MIN_AGENT_SLOT, default_agent_name(MIN_AGENT_SLOT))]),
            tab1_locked: false,
            narrative_definition_text: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn agent_name(&self, slot: u8) -> String {
        self.agent_names
            .get(&slot)
            .cloned()
            .unwrap_or_else(|| default_agent_name(slot))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Setup inputs
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Free-form setup drafted before the lock. Wiped (not deleted) on reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tab1Inputs {
    pub world_text: String,
    pub chapter_text: String,
    pub identity_text_by_slot: BTreeMap<u8, String>,
    pub updated_at: DateTime<Utc>,
}

impl Tab1Inputs {
    pub fn new() -> Self {
        Self {
            world_text: String::new(),
            chapter_text: String::new(),
            identity_text_by_slot: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn identity_text(&self, slot: u8) -> String {
        self.identity_text_by_slot
            .get(&slot)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for Tab1Inputs {
    fn default() -> Self {
        Self::new()
    }
}

/// Client payload for `SaveSetup`, pre-normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetupPayload {
    #[serde(default)]
    pub world_text: String,
    #[serde(default)]
    pub chapter_text: String,
    #[serde(default)]
    pub selected_agent_slots: Vec<u8>,
    #[serde(default)]
    pub agent_names: BTreeMap<u8, String>,
    #[serde(default)]
    pub identity_text_by_slot: BTreeMap<u8, String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Turn events
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventRole {
    User,
    Agent,
    System,
}

/// One turn record. Events exist in user/agent pairs per prompt index
/// (system events are out of band).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub prompt_index: u32,
    pub role: EventRole,
    /// Required iff `role == Agent`.
    pub agent_slot: Option<u8>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn user(prompt_index: u32, text: String) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            prompt_index,
            role: EventRole::User,
            agent_slot: None,
            text,
            created_at: Utc::now(),
        }
    }

    pub fn agent(prompt_index: u32, agent_slot: u8, text: String) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            prompt_index,
            role: EventRole::Agent,
            agent_slot: Some(agent_slot),
            text,
            created_at: Utc::now(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Memory blocks
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryBlockKind {
    /// Exactly one per locked lifetime, range (0, 0), always first.
    WorldChapterLock,
    /// Contiguous, non-overlapping ranges starting at 1.
    TurnDelta,
}

/// Irreversible compaction of a prompt-index range. Never mutated; erased
/// only on reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryBlock {
    pub block_id: String,
    pub kind: MemoryBlockKind,
    pub from_prompt_index: u32,
    pub to_prompt_index: u32,
    /// Structured summary plus echoed source fields.
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl MemoryBlock {
    pub fn world_chapter_lock(payload: Value) -> Self {
        Self {
            block_id: uuid::Uuid::new_v4().to_string(),
            kind: MemoryBlockKind::WorldChapterLock,
            from_prompt_index: 0,
            to_prompt_index: 0,
            payload,
            created_at: Utc::now(),
        }
    }

    pub fn turn_delta(from: u32, to: u32, payload: Value) -> Self {
        Self {
            block_id: uuid::Uuid::new_v4().to_string(),
            kind: MemoryBlockKind::TurnDelta,
            from_prompt_index: from,
            to_prompt_index: to,
            payload,
            created_at: Utc::now(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Narrative drafts
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// What a draft was built from, captured at build time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvenanceSnapshot {
    pub max_prompt_index_used: u32,
    pub memory_block_ids_used: Vec<String>,
}

/// One generated chapter draft. Repeated builds append; prior drafts are
/// never overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeDraft {
    pub draft_id: String,
    pub narrative_definition_text: String,
    pub source_snapshot: ProvenanceSnapshot,
    pub chapter_text: String,
    pub created_at: DateTime<Utc>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// The full per-session aggregate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Everything the store holds for one session. Operations load a snapshot,
/// mutate the copy, and commit it back whole, never field by field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session: Session,
    pub tab1: Tab1Inputs,
    /// Append order == (prompt_index, creation) order.
    pub events: Vec<Event>,
    /// Creation order; the lock block first, then deltas.
    pub blocks: Vec<MemoryBlock>,
    pub drafts: Vec<NarrativeDraft>,
}

impl SessionRecord {
    pub fn new() -> Self {
        Self {
            session: Session::new(),
            tab1: Tab1Inputs::new(),
            events: Vec::new(),
            blocks: Vec::new(),
            drafts: Vec::new(),
        }
    }

    /// Events with prompt index in `[from, to]`, in stored order.
    pub fn events_in_range(&self, from: u32, to: u32) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.prompt_index >= from && e.prompt_index <= to)
            .collect()
    }
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self::new()
    }
}
