use std::collections::HashMap;
use std::time::Instant;

use uuid::Uuid;

use crate::ConnectionId;

/// What a pending request will do on late success, after its deadline
/// has already fired. Only an acquire holds a resource worth
/// unwinding; everything else is a plain fire-and-forget query.
#[derive(Debug, Clone)]
pub enum PendingKind {
    Acquire { user_id: String },
    Generic,
}

#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub connection: ConnectionId,
    pub event: String,
    pub kind: PendingKind,
    pub deadline: Instant,
}

/// Tracks outstanding request-uuids (spec.md §4.8's "async requests"
/// map) and, separately, the kind of the ones that already timed out —
/// needed to recognize a late success arriving after the deadline
/// already fired a synthesized error.
#[derive(Debug, Default)]
pub struct PendingRequests {
    entries: HashMap<Uuid, PendingEntry>,
    expired: HashMap<Uuid, PendingKind>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, uuid: Uuid, entry: PendingEntry) {
        self.entries.insert(uuid, entry);
    }

    /// Every entry whose deadline is at or before `now`, moved into the
    /// expired set so a subsequent late response can still be
    /// recognized.
    pub fn take_expired(&mut self, now: Instant) -> Vec<(Uuid, PendingEntry)> {
        let expired_ids: Vec<Uuid> = self
            .entries
            .iter()
            .filter(|(_, e)| e.deadline <= now)
            .map(|(uuid, _)| *uuid)
            .collect();
        let mut out = Vec::with_capacity(expired_ids.len());
        for uuid in expired_ids {
            if let Some(entry) = self.entries.remove(&uuid) {
                self.expired.insert(uuid, entry.kind.clone());
                out.push((uuid, entry));
            }
        }
        out
    }

    /// Removes and returns a still-live entry, if any.
    pub fn take(&mut self, uuid: &Uuid) -> Option<PendingEntry> {
        self.entries.remove(uuid)
    }

    /// Removes and returns the remembered kind of an already-expired
    /// request, if `uuid` is one.
    pub fn take_expired_kind(&mut self, uuid: &Uuid) -> Option<PendingKind> {
        self.expired.remove(uuid)
    }

    /// Drops every entry (live or remembered-expired) routed to
    /// `connection`, returning the live ones so the caller can release
    /// whatever resources they held.
    pub fn purge_connection(&mut self, connection: ConnectionId) -> Vec<PendingEntry> {
        let ids: Vec<Uuid> = self
            .entries
            .iter()
            .filter(|(_, e)| e.connection == connection)
            .map(|(uuid, _)| *uuid)
            .collect();
        let mut out = Vec::with_capacity(ids.len());
        for uuid in ids {
            if let Some(entry) = self.entries.remove(&uuid) {
                out.push(entry);
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
