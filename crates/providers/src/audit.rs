//! Audit trail for provider calls.
//!
//! After every `generate`, the caller appends one immutable record with a
//! content hash of the serialized input plus full input/output copies.
//! Records are observational only: core logic never reads them back, and
//! a full sink must never fail the operation that produced the record.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::traits::AgentRole;

/// One provider call, captured verbatim.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AuditRecord {
    pub session_id: String,
    pub role: String,
    pub provider: String,
    pub model: String,
    /// sha256 hex of the serialized input payload.
    pub input_hash: String,
    pub input_chars: usize,
    pub output_chars: usize,
    pub input: String,
    pub output: String,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Build a record from one completed provider call.
    pub fn capture(
        session_id: &str,
        role: AgentRole,
        provider: &str,
        model: &str,
        input: String,
        output: &str,
    ) -> Self {
        Self {
            session_id: session_id.to_owned(),
            role: role.as_str().to_owned(),
            provider: provider.to_owned(),
            model: model.to_owned(),
            input_hash: content_hash(&input),
            input_chars: input.chars().count(),
            output_chars: output.chars().count(),
            input,
            output: output.to_owned(),
            created_at: Utc::now(),
        }
    }
}

/// Where audit records go.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord);
}

/// In-memory append-only audit log.
#[derive(Default)]
pub struct AuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Snapshot of all records in append order.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }
}

impl AuditSink for AuditLog {
    fn record(&self, record: AuditRecord) {
        self.records.lock().push(record);
    }
}

/// sha256 hex digest of the serialized input.
pub fn content_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable() {
        assert_eq!(content_hash("abc"), content_hash("abc"));
        assert_ne!(content_hash("abc"), content_hash("abd"));
    }

    #[test]
    fn log_appends_in_order() {
        let log = AuditLog::new();
        for i in 0..3 {
            log.record(AuditRecord::capture(
                "s1",
                AgentRole::Character,
                "mock",
                "m",
                format!("input {i}"),
                "output",
            ));
        }
        let records = log.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].input, "input 0");
        assert_eq!(records[2].input, "input 2");
        assert_eq!(records[0].output_chars, 6);
    }
}
