//! Quota audit log
//!
//! Test-visible record of every quota movement a session performs:
//! allocations, releases, rejected requests, and quota transfers. Entries are
//! recorded inside the session's critical sections, so the log order is the
//! commit order. Recording never affects enforcement outcomes.

use core_types::SessionId;
use serde::{Deserialize, Serialize};

/// A quota movement or rejection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuotaEvent {
    /// An allocation was backed and accounted
    Allocated {
        session: SessionId,
        size: u64,
        used_before: u64,
        used_after: u64,
    },

    /// A dataspace was released and its bytes returned to the headroom
    Freed {
        session: SessionId,
        size: u64,
        used_before: u64,
        used_after: u64,
    },

    /// An allocation was rejected for exceeding the quota
    QuotaExceeded {
        session: SessionId,
        requested: u64,
        quota: u64,
        used: u64,
    },

    /// Unused headroom left the session toward a transfer target
    QuotaWithdrawn {
        session: SessionId,
        amount: u64,
        quota_after: u64,
    },

    /// Transferred quota arrived at this session
    QuotaDeposited {
        session: SessionId,
        amount: u64,
        quota_after: u64,
    },

    /// A reference account was linked for quota donation
    RefAccountLinked { session: SessionId, peer: SessionId },
}

impl QuotaEvent {
    /// Returns the session the event belongs to
    pub fn session(&self) -> SessionId {
        match self {
            QuotaEvent::Allocated { session, .. }
            | QuotaEvent::Freed { session, .. }
            | QuotaEvent::QuotaExceeded { session, .. }
            | QuotaEvent::QuotaWithdrawn { session, .. }
            | QuotaEvent::QuotaDeposited { session, .. }
            | QuotaEvent::RefAccountLinked { session, .. } => *session,
        }
    }
}

/// Audit entry with its position in the commit order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaAuditEntry {
    pub sequence: u64,
    pub event: QuotaEvent,
}

/// Audit log of quota movements
pub struct QuotaAuditLog {
    entries: Vec<QuotaAuditEntry>,
    next_sequence: u64,
}

impl QuotaAuditLog {
    /// Creates a new empty audit log
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_sequence: 0,
        }
    }

    /// Records an event at the next position in the commit order
    pub fn record(&mut self, event: QuotaEvent) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.push(QuotaAuditEntry { sequence, event });
    }

    /// Returns the number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks if the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns all entries in commit order
    pub fn entries(&self) -> &[QuotaAuditEntry] {
        &self.entries
    }

    /// Returns the entries belonging to `session`, in commit order
    pub fn entries_for(&self, session: SessionId) -> Vec<&QuotaAuditEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.event.session() == session)
            .collect()
    }

    /// Counts the rejected allocations in the log
    pub fn exceeded_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.event, QuotaEvent::QuotaExceeded { .. }))
            .count()
    }
}

impl Default for QuotaAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_log_starts_empty() {
        let log = QuotaAuditLog::new();
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
    }

    #[test]
    fn test_record_assigns_sequence_in_commit_order() {
        let session = SessionId::new();
        let mut log = QuotaAuditLog::new();

        log.record(QuotaEvent::Allocated {
            session,
            size: 4096,
            used_before: 0,
            used_after: 4096,
        });
        log.record(QuotaEvent::Freed {
            session,
            size: 4096,
            used_before: 4096,
            used_after: 0,
        });

        let sequences: Vec<u64> = log.entries().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 1]);
    }

    #[test]
    fn test_entries_for_filters_by_session() {
        let a = SessionId::new();
        let b = SessionId::new();
        let mut log = QuotaAuditLog::new();

        log.record(QuotaEvent::QuotaDeposited {
            session: a,
            amount: 1024,
            quota_after: 1024,
        });
        log.record(QuotaEvent::QuotaWithdrawn {
            session: b,
            amount: 1024,
            quota_after: 0,
        });

        assert_eq!(log.entries_for(a).len(), 1);
        assert_eq!(log.entries_for(b).len(), 1);
        assert_eq!(log.entries_for(SessionId::new()).len(), 0);
    }

    #[test]
    fn test_exceeded_count() {
        let session = SessionId::new();
        let mut log = QuotaAuditLog::new();
        assert_eq!(log.exceeded_count(), 0);

        log.record(QuotaEvent::QuotaExceeded {
            session,
            requested: 1,
            quota: 4096,
            used: 4096,
        });
        assert_eq!(log.exceeded_count(), 1);
    }
}
