use std::collections::{HashMap, HashSet};

use crate::ConnectionId;

#[derive(Debug, Clone)]
pub struct ProxyInfo {
    pub connection: ConnectionId,
}

/// Connected SIP gateways, keyed by connection id. The first one to
/// register becomes "primary" and is returned whenever a lookup needs
/// any gateway and doesn't care which (spec.md §4.8).
#[derive(Debug, Default)]
pub struct ProxyRegistry {
    proxies: HashMap<ConnectionId, ProxyInfo>,
    primary: Option<ConnectionId>,
}

impl ProxyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, connection: ConnectionId) {
        self.proxies
            .entry(connection)
            .or_insert(ProxyInfo { connection });
        if self.primary.is_none() {
            self.primary = Some(connection);
        }
    }

    pub fn remove(&mut self, connection: ConnectionId) {
        self.proxies.remove(&connection);
        if self.primary == Some(connection) {
            self.primary = self.proxies.keys().next().copied();
        }
    }

    pub fn primary(&self) -> Option<ConnectionId> {
        self.primary
    }

    pub fn contains(&self, connection: ConnectionId) -> bool {
        self.proxies.contains_key(&connection)
    }
}

#[derive(Debug, Clone)]
pub struct CallEntry {
    pub connection: ConnectionId,
    pub loop_name: String,
    pub peer: String,
}

/// Active calls, keyed by the call-id the gateway assigns on
/// `notify: new_call` and removes on `notify: call_terminated`.
#[derive(Debug, Default)]
pub struct CallRegistry {
    calls: HashMap<String, CallEntry>,
}

impl CallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, call_id: String, entry: CallEntry) {
        self.calls.insert(call_id, entry);
    }

    pub fn remove(&mut self, call_id: &str) -> Option<CallEntry> {
        self.calls.remove(call_id)
    }

    pub fn get(&self, call_id: &str) -> Option<&CallEntry> {
        self.calls.get(call_id)
    }

    /// Every call owned by `connection`, for close-time cleanup.
    pub fn owned_by(&self, connection: ConnectionId) -> Vec<String> {
        self.calls
            .iter()
            .filter(|(_, e)| e.connection == connection)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

/// Which users currently hold an acquired mixer on behalf of a given
/// connection, so a connection close (or an explicit release) can undo
/// exactly the right set.
#[derive(Debug, Default)]
pub struct MixerAssignments {
    by_connection: HashMap<ConnectionId, HashSet<String>>,
}

impl MixerAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, connection: ConnectionId, user_id: impl Into<String>) {
        self.by_connection
            .entry(connection)
            .or_default()
            .insert(user_id.into());
    }

    pub fn release(&mut self, connection: ConnectionId, user_id: &str) -> bool {
        match self.by_connection.get_mut(&connection) {
            Some(users) => users.remove(user_id),
            None => false,
        }
    }

    /// Drops and returns every user assigned to `connection`.
    pub fn release_all(&mut self, connection: ConnectionId) -> Vec<String> {
        self.by_connection
            .remove(&connection)
            .map(|s| s.into_iter().collect())
            .unwrap_or_default()
    }

    pub fn users_for(&self, connection: ConnectionId) -> Vec<String> {
        self.by_connection
            .get(&connection)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }
}
