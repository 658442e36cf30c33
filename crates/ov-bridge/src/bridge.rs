use std::time::Instant;

use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::BridgeTimeoutConfig;
use crate::db::VocsDb;
use crate::envelope::{self, Inbound, Request, Response};
use crate::error::{BridgeError, ErrorCode};
use crate::hooks::BridgeHooks;
use crate::pending::{PendingEntry, PendingKind, PendingRequests};
use crate::sink::{EventSink, MixerPool};
use crate::state::{CallEntry, CallRegistry, MixerAssignments, ProxyRegistry};
use crate::ConnectionId;

/// The response event names the gateway answers call-control requests
/// with, each routed straight to its matching [`BridgeHooks`] field
/// once the pending entry resolves.
fn dispatch_response_hook(hooks: &mut BridgeHooks, event: &str, code: ErrorCode, response: &Value) {
    let hook = match event {
        "permit" => hooks.call_permit.as_mut(),
        "revoke" => hooks.call_revoke.as_mut(),
        "hangup" => hooks.call_hangup.as_mut(),
        "list_calls" => hooks.list_calls.as_mut(),
        "list_permissions" => hooks.list_permissions.as_mut(),
        "get_status" => hooks.get_status.as_mut(),
        _ => None,
    };
    if let Some(hook) = hook {
        hook(code, response);
    }
}

/// SIP gateway / mixer session bridge (spec.md §4.8, §6.1, §8). Holds
/// no socket or reactor state of its own: [`EventSink`] carries
/// outbound messages, [`MixerPool`] carries outbound mixer commands,
/// and [`Self::expire_timeouts`] is meant to be driven by a reactor
/// timer owned by the embedder.
pub struct Bridge {
    proxies: ProxyRegistry,
    calls: CallRegistry,
    mixers: MixerAssignments,
    pending: PendingRequests,
    hooks: BridgeHooks,
    timeout: BridgeTimeoutConfig,
    connected: bool,
}

impl Bridge {
    pub fn new(timeout: BridgeTimeoutConfig, hooks: BridgeHooks) -> Self {
        Self {
            proxies: ProxyRegistry::new(),
            calls: CallRegistry::new(),
            mixers: MixerAssignments::new(),
            pending: PendingRequests::new(),
            hooks,
            timeout,
            connected: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    // ---- inbound dispatch -------------------------------------------------

    pub fn handle_inbound(
        &mut self,
        sink: &mut dyn EventSink,
        pool: &mut dyn MixerPool,
        db: &dyn VocsDb,
        connection: ConnectionId,
        message: Value,
    ) {
        match envelope::classify(message) {
            Some(Inbound::Request(request)) => self.handle_request(sink, pool, db, connection, request),
            Some(Inbound::Response(response)) => self.handle_response(sink, pool, response),
            None => warn!(connection, "dropping malformed bridge envelope"),
        }
    }

    fn handle_request(
        &mut self,
        sink: &mut dyn EventSink,
        pool: &mut dyn MixerPool,
        db: &dyn VocsDb,
        connection: ConnectionId,
        request: Request,
    ) {
        match request.event.as_str() {
            "register" => self.handle_register(sink, db, connection),
            "get_multicast" => self.handle_get_multicast(sink, db, connection, request),
            "acquire" => self.handle_acquire(sink, pool, connection, request),
            "release" => self.handle_release(pool, connection, request),
            "set_singlecast" => self.handle_set_singlecast(pool, request),
            "notify" => self.handle_notify(request),
            other => warn!(event = other, "dropping unrecognized bridge event"),
        }
    }

    /// A gateway registering pushes its whole SIP whitelist back as a
    /// batch of individual `permit` events, one per caller, in order
    /// (spec.md §8 scenario 6).
    fn handle_register(&mut self, sink: &mut dyn EventSink, db: &dyn VocsDb, connection: ConnectionId) {
        self.proxies.register(connection);
        if !self.connected {
            self.connected = true;
            if let Some(hook) = &mut self.hooks.connected {
                hook(true);
            }
        }
        for caller in db.sip_whitelist() {
            let message = envelope::request("permit", Uuid::new_v4(), json!({ "caller": caller }));
            sink.send(connection, message);
        }
    }

    fn handle_get_multicast(
        &mut self,
        sink: &mut dyn EventSink,
        db: &dyn VocsDb,
        connection: ConnectionId,
        request: Request,
    ) {
        let loop_name = request.parameter.get("loop").and_then(Value::as_str).unwrap_or_default();
        let reply = match db.get_multicast(loop_name) {
            Some(socket) => envelope::success("get_multicast", request.uuid, json!(socket)),
            None => envelope::failure(
                "get_multicast",
                request.uuid,
                ErrorCode::UnknownLoop,
                format!("no multicast loop named '{loop_name}'"),
            ),
        };
        sink.send(connection, reply);
    }

    fn handle_acquire(&mut self, sink: &mut dyn EventSink, pool: &mut dyn MixerPool, connection: ConnectionId, request: Request) {
        let Some(user_id) = request.parameter.get("user").and_then(Value::as_str) else {
            sink.send(
                connection,
                envelope::failure("acquire", request.uuid, ErrorCode::ParameterError, "missing 'user'"),
            );
            return;
        };
        pool.request_acquire(user_id, request.uuid);
        self.pending.set(
            request.uuid,
            PendingEntry {
                connection,
                event: "acquire".to_string(),
                kind: PendingKind::Acquire {
                    user_id: user_id.to_string(),
                },
                deadline: Instant::now() + self.timeout.response_timeout(),
            },
        );
    }

    fn handle_release(&mut self, pool: &mut dyn MixerPool, connection: ConnectionId, request: Request) {
        if let Some(user_id) = request.parameter.get("user").and_then(Value::as_str) {
            self.mixers.release(connection, user_id);
            pool.request_release(user_id);
        }
    }

    /// Dual effect per spec.md §4.8: configures the forwarding target
    /// *and* joins the loop in a single request.
    fn handle_set_singlecast(&mut self, pool: &mut dyn MixerPool, request: Request) {
        let Some(user_id) = request.parameter.get("user").and_then(Value::as_str) else {
            warn!("set_singlecast missing 'user'");
            return;
        };
        pool.set_singlecast(user_id, &request.parameter);
        if let Some(loop_name) = request.parameter.get("loop").and_then(Value::as_str) {
            pool.join_loop(user_id, loop_name);
        }
    }

    fn handle_notify(&mut self, request: Request) {
        let connection_hint = request.parameter.get("connection").and_then(Value::as_i64);
        match request.parameter.get("type").and_then(Value::as_str) {
            Some("new_call") => {
                let (Some(call_id), Some(loop_name), Some(peer)) = (
                    request.parameter.get("call_id").and_then(Value::as_str),
                    request.parameter.get("loop").and_then(Value::as_str),
                    request.parameter.get("peer").and_then(Value::as_str),
                ) else {
                    warn!("new_call notify missing required fields");
                    return;
                };
                let connection = connection_hint.unwrap_or_else(|| self.proxies.primary().unwrap_or_default() as i64) as ConnectionId;
                self.calls.insert(
                    call_id.to_string(),
                    CallEntry {
                        connection,
                        loop_name: loop_name.to_string(),
                        peer: peer.to_string(),
                    },
                );
                if let Some(hook) = &mut self.hooks.call_new {
                    hook(call_id, &request.parameter);
                }
            }
            Some("call_terminated") => {
                if let Some(call_id) = request.parameter.get("call_id").and_then(Value::as_str) {
                    self.calls.remove(call_id);
                    if let Some(hook) = &mut self.hooks.call_terminated {
                        hook(call_id);
                    }
                }
            }
            other => warn!(?other, "unrecognized notify type"),
        }
    }

    fn handle_response(&mut self, sink: &mut dyn EventSink, pool: &mut dyn MixerPool, response: Response) {
        let code = response.error_code();
        if let Some(entry) = self.pending.take(&response.uuid) {
            match &entry.kind {
                PendingKind::Acquire { user_id } => {
                    let user_id = user_id.clone();
                    self.complete_acquire(sink, &entry, code, &user_id);
                }
                PendingKind::Generic => {
                    sink.send(entry.connection, envelope_response_passthrough(&response));
                    dispatch_response_hook(&mut self.hooks, &response.event, code, &response.response);
                }
            }
            return;
        }
        if let Some(PendingKind::Acquire { user_id }) = self.pending.take_expired_kind(&response.uuid) {
            if code.is_success() {
                info!(uuid = %response.uuid, user_id, "late acquire success after timeout, compensating release");
                pool.request_release(&user_id);
            }
            return;
        }
        dispatch_response_hook(&mut self.hooks, &response.event, code, &response.response);
    }

    fn complete_acquire(&mut self, sink: &mut dyn EventSink, entry: &PendingEntry, code: ErrorCode, user_id: &str) {
        if code.is_success() {
            self.mixers.assign(entry.connection, user_id);
            sink.send(
                entry.connection,
                envelope::success("acquire", Uuid::new_v4(), json!({ "user": user_id })),
            );
        } else {
            sink.send(entry.connection, envelope::failure("acquire", Uuid::new_v4(), code, "acquire failed"));
        }
    }

    /// Must be called periodically (e.g. from a reactor timer) with
    /// the current time. Synthesizes a timeout response for every
    /// request whose deadline has passed (spec.md §7's first timeout
    /// discipline).
    pub fn expire_timeouts(&mut self, now: Instant, sink: &mut dyn EventSink) {
        for (uuid, entry) in self.pending.take_expired(now) {
            debug!(%uuid, event = entry.event.as_str(), "pending request timed out");
            sink.send(
                entry.connection,
                envelope::failure(entry.event.clone(), uuid, ErrorCode::Timeout, "response deadline exceeded"),
            );
        }
    }

    /// Releases every mixer held on this connection's behalf, purges
    /// its calls and any pending requests it originated, and invokes
    /// `connected(false)` exactly once if this was the last proxy.
    pub fn connection_closed(&mut self, pool: &mut dyn MixerPool, connection: ConnectionId) {
        for user_id in self.mixers.release_all(connection) {
            pool.request_release(&user_id);
        }
        for call_id in self.calls.owned_by(connection) {
            self.calls.remove(&call_id);
        }
        self.pending.purge_connection(connection);
        self.proxies.remove(connection);

        if self.proxies.primary().is_none() && self.connected {
            self.connected = false;
            if let Some(hook) = &mut self.hooks.connected {
                hook(false);
            }
        }
    }

    // ---- outbound client API -----------------------------------------------

    fn primary_proxy(&self) -> Option<ConnectionId> {
        self.proxies.primary()
    }

    /// Fires [`BridgeHooks::call_init`] synchronously with the freshly
    /// minted uuid, before the request ever reaches the wire.
    pub fn create_call(&mut self, sink: &mut dyn EventSink, loop_name: &str, from: &str, to: &str) -> Result<Uuid, BridgeError> {
        let proxy = self.primary_proxy().ok_or(BridgeError::NoProxyRegistered)?;
        let uuid = Uuid::new_v4();
        let parameter = json!({ "action": "create", "loop": loop_name, "from": from, "to": to });
        if let Some(hook) = &mut self.hooks.call_init {
            hook(uuid, &parameter);
        }
        self.pending.set(
            uuid,
            PendingEntry {
                connection: proxy,
                event: "call".to_string(),
                kind: PendingKind::Generic,
                deadline: Instant::now() + self.timeout.response_timeout(),
            },
        );
        sink.send(proxy, envelope::request("call", uuid, parameter));
        Ok(uuid)
    }

    pub fn terminate_call(&mut self, sink: &mut dyn EventSink, call_id: &str) -> Result<Uuid, BridgeError> {
        let connection = self
            .calls
            .get(call_id)
            .map(|c| c.connection)
            .or_else(|| self.primary_proxy())
            .ok_or_else(|| BridgeError::UnknownCall(call_id.to_string()))?;
        let uuid = Uuid::new_v4();
        self.pending.set(
            uuid,
            PendingEntry {
                connection,
                event: "hangup".to_string(),
                kind: PendingKind::Generic,
                deadline: Instant::now() + self.timeout.response_timeout(),
            },
        );
        sink.send(connection, envelope::request("hangup", uuid, json!({ "call_id": call_id })));
        Ok(uuid)
    }

    pub fn create_permission(&mut self, sink: &mut dyn EventSink, caller: &str) -> Result<Uuid, BridgeError> {
        self.send_simple_request(sink, "permit", json!({ "caller": caller }))
    }

    pub fn terminate_permission(&mut self, sink: &mut dyn EventSink, caller: &str) -> Result<Uuid, BridgeError> {
        self.send_simple_request(sink, "revoke", json!({ "caller": caller }))
    }

    pub fn list_calls(&mut self, sink: &mut dyn EventSink) -> Result<Uuid, BridgeError> {
        self.send_simple_request(sink, "list_calls", Value::Null)
    }

    pub fn list_permissions(&mut self, sink: &mut dyn EventSink) -> Result<Uuid, BridgeError> {
        self.send_simple_request(sink, "list_permissions", Value::Null)
    }

    pub fn get_status(&mut self, sink: &mut dyn EventSink) -> Result<Uuid, BridgeError> {
        self.send_simple_request(sink, "get_status", Value::Null)
    }

    fn send_simple_request(&mut self, sink: &mut dyn EventSink, event: &str, parameter: Value) -> Result<Uuid, BridgeError> {
        let proxy = self.primary_proxy().ok_or(BridgeError::NoProxyRegistered)?;
        let uuid = Uuid::new_v4();
        self.pending.set(
            uuid,
            PendingEntry {
                connection: proxy,
                event: event.to_string(),
                kind: PendingKind::Generic,
                deadline: Instant::now() + self.timeout.response_timeout(),
            },
        );
        sink.send(proxy, envelope::request(event, uuid, parameter));
        Ok(uuid)
    }
}

fn envelope_response_passthrough(response: &Response) -> Value {
    match &response.error {
        Some(detail) => envelope::failure(response.event.clone(), response.uuid, detail.code, detail.description.clone()),
        None => envelope::success(response.event.clone(), response.uuid, response.response.clone()),
    }
}
