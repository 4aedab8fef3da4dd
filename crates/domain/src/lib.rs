//! Shared domain types for StoryLoom: the error type every crate returns,
//! the configuration tree, the story-session data model, and structured
//! trace events.

pub mod config;
pub mod error;
pub mod model;
pub mod trace;

pub use error::{Error, Result};
