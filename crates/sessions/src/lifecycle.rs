//! The session lifecycle orchestrator.
//!
//! Every mutating client operation maps to exactly one method here. Each
//! method follows the same discipline: acquire the per-session lock, load
//! a snapshot of the aggregate, validate against the state machine,
//! assemble context, invoke the provider, mutate the working copy, and
//! commit it whole. Transient states (`Locking`, `Summarizing`,
//! `Narrating`, `Resetting`) are only ever set on the working copy, so a
//! failed provider call or commit leaves the stored session exactly where
//! it was, and the caller can retry safely.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use loom_domain::config::{CompactionConfig, Config, LimitsConfig, LlmConfig};
use loom_domain::error::{Error, Result};
use loom_domain::model::{
    default_agent_name, truncate_chars, Event, MemoryBlock, NarrativeDraft, ProvenanceSnapshot,
    Session, SessionRecord, SessionState, SetupPayload, Tab1Inputs, MAX_AGENT_SLOT,
    MIN_AGENT_SLOT,
};
use loom_domain::trace::TraceEvent;
use loom_providers::{AgentRole, AuditRecord, AuditSink, StoryProvider};

use crate::compaction;
use crate::session_lock::SessionLockMap;
use crate::store::SessionStore;

/// What `submit_prompt` hands back to the caller.
#[derive(Debug, Clone)]
pub struct PromptOutcome {
    pub session: Session,
    pub user_event: Event,
    pub agent_event: Event,
    /// Whether this call produced a new turn-delta memory block.
    pub summary_triggered: bool,
}

/// Owns every session's state machine and sequences all mutations.
pub struct SessionLifecycle {
    store: Arc<SessionStore>,
    provider: Arc<dyn StoryProvider>,
    audit: Arc<dyn AuditSink>,
    llm: LlmConfig,
    compaction: CompactionConfig,
    limits: LimitsConfig,
    locks: SessionLockMap,
}

impl SessionLifecycle {
    pub fn new(
        store: Arc<SessionStore>,
        provider: Arc<dyn StoryProvider>,
        audit: Arc<dyn AuditSink>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            provider,
            audit,
            llm: config.llm.clone(),
            compaction: config.compaction.clone(),
            limits: config.limits.clone(),
            locks: SessionLockMap::new(),
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Reads: consistent snapshots, no operation lock
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Full aggregate snapshot: session, setup, events, blocks, drafts.
    pub fn get_session(&self, session_id: &str) -> Result<SessionRecord> {
        self.load(session_id)
    }

    pub fn get_tab1(&self, session_id: &str) -> Result<Tab1Inputs> {
        Ok(self.load(session_id)?.tab1)
    }

    /// All session headers, unordered.
    pub fn list_sessions(&self) -> Vec<Session> {
        self.store.list()
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // CreateSession
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Allocate a new session in `DraftSetup` with empty setup inputs.
    pub fn create_session(&self) -> Result<Session> {
        let record = SessionRecord::new();
        let session = record.session.clone();
        self.store.commit(record)?;

        TraceEvent::SessionCreated {
            session_id: session.session_id.clone(),
        }
        .emit();
        Ok(session)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // SaveSetup
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Normalize and store the drafted setup. Legal only in `DraftSetup`
    /// while unlocked. Replaying the same payload stores the same state.
    pub async fn save_setup(
        &self,
        session_id: &str,
        payload: SetupPayload,
    ) -> Result<(Session, Tab1Inputs)> {
        let _permit = self.locks.acquire(session_id).await?;
        let mut record = self.load(session_id)?;

        require_state(&record.session, SessionState::DraftSetup, "SaveSetup")?;
        if record.session.tab1_locked {
            return Err(Error::InvalidState {
                operation: "SaveSetup",
                state: "locked".into(),
            });
        }

        record.tab1.world_text = truncate_chars(&payload.world_text, self.limits.text_cap);
        record.tab1.chapter_text = truncate_chars(&payload.chapter_text, self.limits.text_cap);

        // Slot selection: dedup, clamp to the valid range, default to {1}.
        let mut slots: Vec<u8> = payload
            .selected_agent_slots
            .iter()
            .copied()
            .filter(|s| (MIN_AGENT_SLOT..=MAX_AGENT_SLOT).contains(s))
            .collect();
        slots.sort_unstable();
        slots.dedup();
        if slots.is_empty() {
            slots.push(MIN_AGENT_SLOT);
        }

        // Names and identity text exist only for selected slots.
        record.session.agent_names = slots
            .iter()
            .map(|&slot| {
                let name = payload
                    .agent_names
                    .get(&slot)
                    .filter(|n| !n.is_empty())
                    .cloned()
                    .unwrap_or_else(|| default_agent_name(slot));
                (slot, truncate_chars(&name, self.limits.name_cap))
            })
            .collect();
        record.tab1.identity_text_by_slot = slots
            .iter()
            .map(|&slot| {
                let text = payload
                    .identity_text_by_slot
                    .get(&slot)
                    .map(String::as_str)
                    .unwrap_or_default();
                (slot, truncate_chars(text, self.limits.text_cap))
            })
            .collect();
        record.session.selected_agent_slots = slots.clone();

        let now = Utc::now();
        record.session.updated_at = now;
        record.tab1.updated_at = now;

        let session = record.session.clone();
        let tab1 = record.tab1.clone();
        self.store.commit(record)?;

        TraceEvent::SetupSaved {
            session_id: session_id.to_owned(),
            selected_slots: slots,
        }
        .emit();
        Ok((session, tab1))
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // LockSetup
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// One-way transition from setup to an active chapter: summarizes the
    /// setup into the `world_chapter_lock` block and zeroes the counters.
    pub async fn lock_setup(&self, session_id: &str) -> Result<Session> {
        let _permit = self.locks.acquire(session_id).await?;
        let mut record = self.load(session_id)?;

        require_state(&record.session, SessionState::DraftSetup, "LockSetup")?;
        record.session.state = SessionState::Locking;

        let payload = loom_context::lock_payload(&record);
        let summary = self
            .call_provider(
                session_id,
                AgentRole::WorldLock,
                &self.llm.model_summary,
                &payload,
            )
            .await?;

        record
            .blocks
            .push(MemoryBlock::world_chapter_lock(json!({
                "summary": summary,
                "world_text": record.tab1.world_text,
                "chapter_text": record.tab1.chapter_text,
                "selected_agent_slots": record.session.selected_agent_slots,
                "agent_names": record.session.agent_names,
            })));

        record.session.tab1_locked = true;
        record.session.prompt_index = 0;
        record.session.last_summarized_prompt_index = 0;
        record.session.state = SessionState::Active;
        record.session.updated_at = Utc::now();

        let session = record.session.clone();
        self.store.commit(record)?;

        TraceEvent::SetupLocked {
            session_id: session_id.to_owned(),
            summary_chars: summary.chars().count(),
        }
        .emit();
        Ok(session)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // SubmitPrompt
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Record one user turn: append the user event, let the addressed
    /// character respond, append the reply, and compact if the turn lands
    /// on a chunk boundary. All of it commits atomically.
    pub async fn submit_prompt(
        &self,
        session_id: &str,
        agent_slot: u8,
        user_text: &str,
    ) -> Result<PromptOutcome> {
        let _permit = self.locks.acquire(session_id).await?;
        let mut record = self.load(session_id)?;

        require_state(&record.session, SessionState::Active, "SubmitPrompt")?;
        if !record.session.selected_agent_slots.contains(&agent_slot) {
            return Err(Error::InvalidArgument(format!(
                "agent slot {agent_slot} is not selected for this session"
            )));
        }

        record.session.prompt_index += 1;
        let prompt_index = record.session.prompt_index;

        let user_event = Event::user(prompt_index, user_text.to_owned());
        record.events.push(user_event.clone());

        let payload = loom_context::character_payload(
            &record,
            agent_slot,
            user_text,
            self.compaction.chunk_size,
        );
        let reply = self
            .call_provider(
                session_id,
                AgentRole::Character,
                &self.llm.model_character,
                &payload,
            )
            .await?;

        let agent_event = Event::agent(prompt_index, agent_slot, reply);
        record.events.push(agent_event.clone());

        let summary_triggered = match compaction::scheduled_range(
            prompt_index,
            record.session.last_summarized_prompt_index,
            self.compaction.chunk_size,
        ) {
            Some((from, to)) => {
                self.summarize_range(&mut record, from, to).await?;
                record.session.state = SessionState::Active;
                true
            }
            None => false,
        };

        record.session.updated_at = Utc::now();
        let session = record.session.clone();
        self.store.commit(record)?;

        TraceEvent::PromptRecorded {
            session_id: session_id.to_owned(),
            prompt_index,
            agent_slot,
            summary_triggered,
        }
        .emit();

        Ok(PromptOutcome {
            session,
            user_event,
            agent_event,
            summary_triggered,
        })
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // EndChapter
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Close the chapter, first forcing a catch-up compaction over any
    /// outstanding range so no raw turn is left unsummarized.
    pub async fn end_chapter(&self, session_id: &str) -> Result<Session> {
        let _permit = self.locks.acquire(session_id).await?;
        let mut record = self.load(session_id)?;

        require_state(&record.session, SessionState::Active, "EndChapter")?;

        let outstanding = compaction::outstanding_range(
            record.session.prompt_index,
            record.session.last_summarized_prompt_index,
        );
        let forced = match outstanding {
            Some((from, to)) => {
                self.summarize_range(&mut record, from, to).await?;
                true
            }
            None => false,
        };

        record.session.state = SessionState::Ended;
        record.session.updated_at = Utc::now();
        let session = record.session.clone();
        let prompt_index = session.prompt_index;
        self.store.commit(record)?;

        TraceEvent::ChapterEnded {
            session_id: session_id.to_owned(),
            prompt_index,
            forced_compaction: forced,
        }
        .emit();
        Ok(session)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // SetNarrativeDefinition
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Store the narrative steering text. Allowed in every stable state
    /// (the store never holds a transient one); does not change state.
    pub async fn set_narrative_definition(&self, session_id: &str, text: &str) -> Result<Session> {
        let _permit = self.locks.acquire(session_id).await?;
        let mut record = self.load(session_id)?;

        record.session.narrative_definition_text = truncate_chars(text, self.limits.text_cap);
        record.session.updated_at = Utc::now();

        let session = record.session.clone();
        self.store.commit(record)?;
        Ok(session)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // BuildNarrative
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Synthesize a chapter draft from the full transcript plus memory.
    /// Repeated calls append new drafts; prior drafts are never touched.
    pub async fn build_narrative(&self, session_id: &str) -> Result<NarrativeDraft> {
        let _permit = self.locks.acquire(session_id).await?;
        let mut record = self.load(session_id)?;

        require_state(&record.session, SessionState::Ended, "BuildNarrative")?;
        record.session.state = SessionState::Narrating;

        let payload = loom_context::narrative_payload(&record);
        let chapter_text = self
            .call_provider(
                session_id,
                AgentRole::Narrative,
                &self.llm.model_narrative,
                &payload,
            )
            .await?;

        let draft = NarrativeDraft {
            draft_id: uuid::Uuid::new_v4().to_string(),
            narrative_definition_text: record.session.narrative_definition_text.clone(),
            source_snapshot: ProvenanceSnapshot {
                max_prompt_index_used: record.session.prompt_index,
                memory_block_ids_used: record.blocks.iter().map(|b| b.block_id.clone()).collect(),
            },
            chapter_text,
            created_at: Utc::now(),
        };
        record.drafts.push(draft.clone());

        record.session.state = SessionState::Ended;
        record.session.updated_at = Utc::now();
        self.store.commit(record)?;

        TraceEvent::NarrativeBuilt {
            session_id: session_id.to_owned(),
            draft_id: draft.draft_id.clone(),
            chapter_chars: draft.chapter_text.chars().count(),
        }
        .emit();
        Ok(draft)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // ResetSession
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Irrevocably purge all events, blocks, and drafts, wipe the setup
    /// inputs, and restore the session to its creation defaults.
    pub async fn reset_session(&self, session_id: &str) -> Result<Session> {
        let _permit = self.locks.acquire(session_id).await?;
        let mut record = self.load(session_id)?;

        record.session.state = SessionState::Resetting;

        let events_purged = record.events.len();
        let blocks_purged = record.blocks.len();
        let drafts_purged = record.drafts.len();
        record.events.clear();
        record.blocks.clear();
        record.drafts.clear();

        record.tab1.world_text.clear();
        record.tab1.chapter_text.clear();
        record.tab1.identity_text_by_slot.clear();
        record.tab1.updated_at = Utc::now();

        let session = &mut record.session;
        session.prompt_index = 0;
        session.last_summarized_prompt_index = 0;
        session.tab1_locked = false;
        session.selected_agent_slots = vec![MIN_AGENT_SLOT];
        session.agent_names =
            [(MIN_AGENT_SLOT, default_agent_name(MIN_AGENT_SLOT))].into();
        session.narrative_definition_text.clear();
        session.state = SessionState::DraftSetup;
        session.updated_at = Utc::now();

        let session = record.session.clone();
        self.store.commit(record)?;

        TraceEvent::SessionReset {
            session_id: session_id.to_owned(),
            events_purged,
            blocks_purged,
            drafts_purged,
        }
        .emit();
        Ok(session)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Internals
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    fn load(&self, session_id: &str) -> Result<SessionRecord> {
        self.store
            .get(session_id)
            .ok_or_else(|| Error::NotFound(session_id.to_owned()))
    }

    /// Summarize `[from, to]` into one turn-delta block on the working
    /// copy and advance the summarized watermark. The caller assigns the
    /// final stable state afterwards.
    async fn summarize_range(
        &self,
        record: &mut SessionRecord,
        from: u32,
        to: u32,
    ) -> Result<()> {
        record.session.state = SessionState::Summarizing;

        let payload = loom_context::delta_payload(record, from, to);
        let event_count = payload.events.len();
        let summary = self
            .call_provider(
                &record.session.session_id,
                AgentRole::Delta,
                &self.llm.model_summary,
                &payload,
            )
            .await?;

        record.blocks.push(MemoryBlock::turn_delta(
            from,
            to,
            json!({"summary": summary, "event_count": event_count}),
        ));
        record.session.last_summarized_prompt_index = to;

        TraceEvent::CompactionRun {
            session_id: record.session.session_id.clone(),
            from_prompt_index: from,
            to_prompt_index: to,
            event_count,
        }
        .emit();
        Ok(())
    }

    /// Invoke the provider and mirror the call into the audit sink.
    async fn call_provider<P: Serialize>(
        &self,
        session_id: &str,
        role: AgentRole,
        model: &str,
        payload: &P,
    ) -> Result<String> {
        let value = serde_json::to_value(payload)?;
        let input = value.to_string();

        let started = Instant::now();
        let output = self.provider.generate(role, model, &value).await?;
        let duration_ms = started.elapsed().as_millis() as u64;

        TraceEvent::LlmRequest {
            session_id: session_id.to_owned(),
            provider: self.provider.provider_id().to_owned(),
            model: model.to_owned(),
            role: role.as_str().to_owned(),
            duration_ms,
            input_chars: input.chars().count(),
            output_chars: output.chars().count(),
        }
        .emit();

        self.audit.record(AuditRecord::capture(
            session_id,
            role,
            self.provider.provider_id(),
            model,
            input,
            &output,
        ));

        Ok(output)
    }
}

fn require_state(
    session: &Session,
    expected: SessionState,
    operation: &'static str,
) -> Result<()> {
    if session.state == expected {
        Ok(())
    } else {
        Err(Error::InvalidState {
            operation,
            state: session.state.to_string(),
        })
    }
}
