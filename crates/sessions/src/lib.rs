//! Session management for StoryLoom.
//!
//! Owns the session state machine: gateway-style per-session locking,
//! snapshot-load / mutate / atomic-commit store discipline, the pure
//! compaction policy, and the `SessionLifecycle` orchestrator that
//! sequences context assembly → provider call → record writes → state
//! transition for every mutating operation.

pub mod compaction;
pub mod lifecycle;
pub mod session_lock;
pub mod store;

pub use compaction::{outstanding_range, scheduled_range};
pub use lifecycle::{PromptOutcome, SessionLifecycle};
pub use session_lock::SessionLockMap;
pub use store::SessionStore;
