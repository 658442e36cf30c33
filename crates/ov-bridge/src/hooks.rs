use serde_json::Value;
use uuid::Uuid;

use crate::error::ErrorCode;

/// Application callbacks invoked as the bridge's state machine
/// advances. Every field is optional; an unset hook is simply skipped.
///
/// Unlike the other handlers, [`Self::call_init`] fires synchronously
/// from [`crate::Bridge::create_call`], before any message reaches the
/// wire — it exists so a caller can correlate the freshly minted uuid
/// with its own bookkeeping before the gateway has even seen the
/// request.
#[derive(Default)]
pub struct BridgeHooks {
    pub call_init: Option<Box<dyn FnMut(Uuid, &Value)>>,
    pub call_new: Option<Box<dyn FnMut(&str, &Value)>>,
    pub call_terminated: Option<Box<dyn FnMut(&str)>>,
    pub call_permit: Option<Box<dyn FnMut(ErrorCode, &Value)>>,
    pub call_revoke: Option<Box<dyn FnMut(ErrorCode, &Value)>>,
    pub call_hangup: Option<Box<dyn FnMut(ErrorCode, &Value)>>,
    pub list_calls: Option<Box<dyn FnMut(ErrorCode, &Value)>>,
    pub list_permissions: Option<Box<dyn FnMut(ErrorCode, &Value)>>,
    pub get_status: Option<Box<dyn FnMut(ErrorCode, &Value)>>,
    pub connected: Option<Box<dyn FnMut(bool)>>,
}

impl BridgeHooks {
    pub fn new() -> Self {
        Self::default()
    }
}
