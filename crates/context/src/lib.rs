//! Context assembly for StoryLoom's four agent roles.
//!
//! Pure functions: given a session aggregate snapshot, produce exactly the
//! structured payload the provider sees for that role. Raw persistence
//! records never cross this boundary; events and blocks are reduced to
//! view structs first.

pub mod builder;
pub mod payload;

pub use builder::{
    character_payload, delta_payload, lock_payload, narrative_payload, recent_window,
};
pub use payload::{
    AgentIdentity, CharacterMeta, CharacterPayload, ContextEventView, DeltaPayload, EventView,
    LockPayload, MemoryBlockView, NarrativeBlockView, NarrativePayload,
};
