//! Payload builders, one per agent role.

use loom_domain::model::{Event, EventRole, MemoryBlock, SessionRecord};

use crate::payload::{
    AgentIdentity, CharacterMeta, CharacterPayload, ContextEventView, DeltaPayload, EventView,
    LockPayload, MemoryBlockView, NarrativeBlockView, NarrativePayload,
};

/// The sliding recent-context window for the turn at `prompt_index`:
/// the last `chunk_size` turns strictly before it, clipped so the lower
/// bound never drops below 1. `None` when no prior turn exists.
///
/// The window is computed from the configured chunk size alone, not from
/// compaction boundaries, so right after a boundary it may re-show turns
/// that were just summarized.
pub fn recent_window(prompt_index: u32, chunk_size: u32) -> Option<(u32, u32)> {
    let to = prompt_index.checked_sub(1).filter(|to| *to >= 1)?;
    let from = prompt_index.saturating_sub(chunk_size).max(1);
    Some((from, to))
}

/// Lock payload: the full setup snapshot, no history.
pub fn lock_payload(record: &SessionRecord) -> LockPayload {
    LockPayload {
        world_text: record.tab1.world_text.clone(),
        chapter_text: record.tab1.chapter_text.clone(),
        selected_agent_slots: record.session.selected_agent_slots.clone(),
        agent_names: record.session.agent_names.clone(),
        agent_identity_text_by_slot: record.tab1.identity_text_by_slot.clone(),
    }
}

/// Delta payload: the `[from, to]` range of events, reduced and ordered by
/// prompt index then creation order.
pub fn delta_payload(record: &SessionRecord, from: u32, to: u32) -> DeltaPayload {
    DeltaPayload {
        from_prompt_index: from,
        to_prompt_index: to,
        events: record
            .events_in_range(from, to)
            .into_iter()
            .map(event_view)
            .collect(),
    }
}

/// Character payload: target identity, full memory, the sliding window of
/// recent events, and the new user text.
pub fn character_payload(
    record: &SessionRecord,
    agent_slot: u8,
    user_text: &str,
    chunk_size: u32,
) -> CharacterPayload {
    let session = &record.session;

    let window = recent_window(session.prompt_index, chunk_size);
    let recent_context: Vec<ContextEventView> = match window {
        Some((from, to)) => record
            .events_in_range(from, to)
            .into_iter()
            .map(|e| context_event_view(record, e))
            .collect(),
        None => Vec::new(),
    };

    let context_prompt_range = match (window, recent_context.is_empty()) {
        (Some((from, to)), false) => vec![from, to],
        _ => Vec::new(),
    };

    CharacterPayload {
        agent_identity: AgentIdentity {
            slot: agent_slot,
            name: session.agent_name(agent_slot),
            identity_text: record.tab1.identity_text(agent_slot),
            all_agent_names: session.agent_names.clone(),
        },
        structured_memory: record.blocks.iter().map(block_view).collect(),
        recent_context,
        user_prompt: user_text.to_owned(),
        meta: CharacterMeta {
            session_id: session.session_id.clone(),
            prompt_index: session.prompt_index,
            context_prompt_range,
        },
    }
}

/// Narrative payload: definition text plus the entire ordered event and
/// memory-block history.
pub fn narrative_payload(record: &SessionRecord) -> NarrativePayload {
    NarrativePayload {
        narrative_definition_text: record.session.narrative_definition_text.clone(),
        events: record.events.iter().map(event_view).collect(),
        memory_blocks: record.blocks.iter().map(narrative_block_view).collect(),
    }
}

// ── view reductions ─────────────────────────────────────────────────

fn event_view(e: &Event) -> EventView {
    EventView {
        prompt_index: e.prompt_index,
        role: e.role,
        agent_slot: e.agent_slot,
        text: e.text.clone(),
    }
}

fn context_event_view(record: &SessionRecord, e: &Event) -> ContextEventView {
    let agent_name = match (e.role, e.agent_slot) {
        (EventRole::Agent, Some(slot)) => Some(record.session.agent_name(slot)),
        _ => None,
    };
    ContextEventView {
        prompt_index: e.prompt_index,
        role: e.role,
        agent_slot: e.agent_slot,
        agent_name,
        text: e.text.clone(),
    }
}

fn block_view(b: &MemoryBlock) -> MemoryBlockView {
    MemoryBlockView {
        kind: b.kind,
        from_prompt_index: b.from_prompt_index,
        to_prompt_index: b.to_prompt_index,
        payload: b.payload.clone(),
    }
}

fn narrative_block_view(b: &MemoryBlock) -> NarrativeBlockView {
    NarrativeBlockView {
        block_id: b.block_id.clone(),
        kind: b.kind,
        from_prompt_index: b.from_prompt_index,
        to_prompt_index: b.to_prompt_index,
        payload: b.payload.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_domain::model::{Event, MemoryBlock, SessionRecord, SessionState};
    use serde_json::json;

    fn record_with_turns(n: u32) -> SessionRecord {
        let mut record = SessionRecord::new();
        record.session.state = SessionState::Active;
        record.session.tab1_locked = true;
        record
            .blocks
            .push(MemoryBlock::world_chapter_lock(json!({"summary": "lock"})));
        for i in 1..=n {
            record.events.push(Event::user(i, format!("prompt {i}")));
            record.events.push(Event::agent(i, 1, format!("reply {i}")));
        }
        record.session.prompt_index = n;
        record
    }

    #[test]
    fn window_clips_at_one() {
        assert_eq!(recent_window(1, 7), None);
        assert_eq!(recent_window(2, 7), Some((1, 1)));
        assert_eq!(recent_window(5, 7), Some((1, 4)));
        assert_eq!(recent_window(8, 7), Some((1, 7)));
        assert_eq!(recent_window(9, 7), Some((2, 8)));
        assert_eq!(recent_window(15, 7), Some((8, 14)));
    }

    #[test]
    fn window_is_independent_of_compaction_boundary() {
        // Turn 8 right after a boundary at 7 still windows back into the
        // already-summarized range.
        assert_eq!(recent_window(8, 7), Some((1, 7)));
    }

    #[test]
    fn first_turn_has_empty_context() {
        let mut record = record_with_turns(0);
        record.session.prompt_index = 1;
        record.events.push(Event::user(1, "hello".into()));
        let payload = character_payload(&record, 1, "hello", 7);
        assert!(payload.recent_context.is_empty());
        assert!(payload.meta.context_prompt_range.is_empty());
        assert_eq!(payload.meta.prompt_index, 1);
    }

    #[test]
    fn character_window_excludes_current_turn() {
        let mut record = record_with_turns(4);
        record.session.prompt_index = 5;
        record.events.push(Event::user(5, "now".into()));

        let payload = character_payload(&record, 1, "now", 7);
        assert_eq!(payload.meta.context_prompt_range, vec![1, 4]);
        // 4 prior turns, a user+agent pair each.
        assert_eq!(payload.recent_context.len(), 8);
        assert!(payload.recent_context.iter().all(|e| e.prompt_index <= 4));
        // Agent events carry the display name.
        let agent_names: Vec<_> = payload
            .recent_context
            .iter()
            .filter_map(|e| e.agent_name.as_deref())
            .collect();
        assert_eq!(agent_names.len(), 4);
        assert!(agent_names.iter().all(|n| *n == "Agent Red"));
    }

    #[test]
    fn character_payload_carries_all_blocks() {
        let mut record = record_with_turns(7);
        record.blocks.push(MemoryBlock::turn_delta(
            1,
            7,
            json!({"summary": "s", "event_count": 14}),
        ));
        record.session.prompt_index = 8;
        record.events.push(Event::user(8, "next".into()));

        let payload = character_payload(&record, 1, "next", 7);
        assert_eq!(payload.structured_memory.len(), 2);
        assert_eq!(payload.structured_memory[1].from_prompt_index, 1);
        assert_eq!(payload.structured_memory[1].to_prompt_index, 7);
    }

    #[test]
    fn delta_payload_reduces_range() {
        let record = record_with_turns(10);
        let payload = delta_payload(&record, 8, 10);
        assert_eq!(payload.from_prompt_index, 8);
        assert_eq!(payload.to_prompt_index, 10);
        assert_eq!(payload.events.len(), 6);
        assert_eq!(payload.events[0].prompt_index, 8);
        assert_eq!(payload.events[5].prompt_index, 10);
    }

    #[test]
    fn narrative_payload_is_unwindowed() {
        let mut record = record_with_turns(12);
        record.session.narrative_definition_text = "write it grim".into();
        let payload = narrative_payload(&record);
        assert_eq!(payload.narrative_definition_text, "write it grim");
        assert_eq!(payload.events.len(), 24);
        assert_eq!(payload.memory_blocks.len(), 1);
        assert!(!payload.memory_blocks[0].block_id.is_empty());
    }

    #[test]
    fn lock_payload_has_no_history() {
        let mut record = record_with_turns(3);
        record.tab1.world_text = "a world".into();
        let payload = lock_payload(&record);
        assert_eq!(payload.world_text, "a world");
        assert_eq!(payload.selected_agent_slots, vec![1]);
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("events").is_none());
    }
}
