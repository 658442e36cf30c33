//! SIP gateway to audio mixer session bridge.
//!
//! Ties together proxy registration, call bookkeeping, mixer
//! acquisition and its timeout/late-success discipline, and the
//! outbound call-control client API, all driven through the JSON
//! envelope decoded by [`ov_json`] and dispatched over connections an
//! embedder registers with [`ov_reactor`].
//!
//! ```
//! use ov_bridge::{Bridge, BridgeHooks, BridgeTimeoutConfig, RecordingSink, StaticDb};
//!
//! let mut bridge = Bridge::new(BridgeTimeoutConfig::default(), BridgeHooks::new());
//! let mut sink = RecordingSink::default();
//! let db = StaticDb::default();
//! bridge.handle_inbound(
//!     &mut sink,
//!     &mut ov_bridge::RecordingMixerPool::default(),
//!     &db,
//!     1,
//!     ov_bridge::envelope::request("register", uuid::Uuid::new_v4(), serde_json::json!({})),
//! );
//! assert!(bridge.is_connected());
//! ```

pub mod envelope;

mod bridge;
mod config;
mod db;
mod drive;
mod error;
mod hooks;
mod pending;
mod sink;
mod state;
mod wire;

/// Identifies a connection (typically a `RawFd` registered with
/// `ov_reactor`) to which the bridge owes outbound messages.
pub type ConnectionId = i32;

pub use bridge::Bridge;
pub use config::{BridgeTimeoutConfig, SocketConfig, SocketType};
pub use db::{MulticastSocket, StaticDb, VocsDb};
pub use drive::arm_timeout_sweep;
pub use error::{BridgeError, ErrorCode};
pub use hooks::BridgeHooks;
pub use sink::{EventSink, MixerPool, RecordingMixerPool, RecordingSink};
pub use wire::WireCodec;
