use serde::Serialize;

/// Structured trace events emitted across all StoryLoom crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SessionCreated {
        session_id: String,
    },
    SetupSaved {
        session_id: String,
        selected_slots: Vec<u8>,
    },
    SetupLocked {
        session_id: String,
        summary_chars: usize,
    },
    PromptRecorded {
        session_id: String,
        prompt_index: u32,
        agent_slot: u8,
        summary_triggered: bool,
    },
    CompactionRun {
        session_id: String,
        from_prompt_index: u32,
        to_prompt_index: u32,
        event_count: usize,
    },
    ChapterEnded {
        session_id: String,
        prompt_index: u32,
        forced_compaction: bool,
    },
    NarrativeBuilt {
        session_id: String,
        draft_id: String,
        chapter_chars: usize,
    },
    SessionReset {
        session_id: String,
        events_purged: usize,
        blocks_purged: usize,
        drafts_purged: usize,
    },
    LlmRequest {
        session_id: String,
        provider: String,
        model: String,
        role: String,
        duration_ms: u64,
        input_chars: usize,
        output_chars: usize,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "loom_event");
    }
}
