use serde::{Deserialize, Serialize};

/// A multicast audio loop's transport address, as looked up by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MulticastSocket {
    pub host: String,
    pub port: u16,
}

/// The bridge's read-only view of persisted configuration: multicast
/// loop addresses and the SIP caller whitelist. Grounded on
/// `ov_mc_backend_sip.h`'s database-backed lookups; the actual storage
/// (flat file, SQL, whatever) is out of scope here, so callers supply
/// an implementation.
pub trait VocsDb {
    fn get_multicast(&self, loop_name: &str) -> Option<MulticastSocket>;

    /// The combined SIP whitelist across every configured SIP entry,
    /// already flattened and deduplicated by the storage layer.
    fn sip_whitelist(&self) -> Vec<String>;
}

/// An in-memory [`VocsDb`] for tests and small deployments.
#[derive(Debug, Clone, Default)]
pub struct StaticDb {
    pub loops: std::collections::HashMap<String, MulticastSocket>,
    pub whitelist: Vec<String>,
}

impl VocsDb for StaticDb {
    fn get_multicast(&self, loop_name: &str) -> Option<MulticastSocket> {
        self.loops.get(loop_name).cloned()
    }

    fn sip_whitelist(&self) -> Vec<String> {
        self.whitelist.clone()
    }
}
