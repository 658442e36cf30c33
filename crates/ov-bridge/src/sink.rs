use serde_json::Value;

use crate::ConnectionId;

/// Transmits an already-built envelope [`Value`] to a connection.
/// Framing it onto bytes (`ov_json::JsonParser::encode`) and writing it
/// to a socket registered with `ov_reactor` is the embedder's job; the
/// bridge only ever produces values.
pub trait EventSink {
    fn send(&mut self, connection: ConnectionId, message: Value);
}

/// An [`EventSink`] that records every send, for tests and for
/// inspecting what the bridge would have transmitted.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub sent: Vec<(ConnectionId, Value)>,
}

impl EventSink for RecordingSink {
    fn send(&mut self, connection: ConnectionId, message: Value) {
        self.sent.push((connection, message));
    }
}

impl RecordingSink {
    pub fn events_for(&self, connection: ConnectionId) -> Vec<&Value> {
        self.sent
            .iter()
            .filter(|(c, _)| *c == connection)
            .map(|(_, v)| v)
            .collect()
    }
}

/// Mixer-side collaborator. Acquire and release are asynchronous from
/// the bridge's point of view: a call into this trait only *begins*
/// the operation, and the embedder later reports completion through
/// [`crate::Bridge::complete_acquire`].
pub trait MixerPool {
    fn request_acquire(&mut self, user_id: &str, request_uuid: uuid::Uuid);
    fn request_release(&mut self, user_id: &str);
    fn set_singlecast(&mut self, user_id: &str, target: &Value);
    fn join_loop(&mut self, user_id: &str, loop_name: &str);
}

/// A [`MixerPool`] that records every call instead of doing anything,
/// for tests that drive completion manually.
#[derive(Debug, Default)]
pub struct RecordingMixerPool {
    pub acquires: Vec<(String, uuid::Uuid)>,
    pub releases: Vec<String>,
    pub singlecasts: Vec<(String, Value)>,
    pub joins: Vec<(String, String)>,
}

impl MixerPool for RecordingMixerPool {
    fn request_acquire(&mut self, user_id: &str, request_uuid: uuid::Uuid) {
        self.acquires.push((user_id.to_string(), request_uuid));
    }

    fn request_release(&mut self, user_id: &str) {
        self.releases.push(user_id.to_string());
    }

    fn set_singlecast(&mut self, user_id: &str, target: &Value) {
        self.singlecasts.push((user_id.to_string(), target.clone()));
    }

    fn join_loop(&mut self, user_id: &str, loop_name: &str) {
        self.joins.push((user_id.to_string(), loop_name.to_string()));
    }
}
