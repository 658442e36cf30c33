//! Single-threaded cooperative I/O and timer multiplexer.
//!
//! [`Reactor`] wraps an [`mio::Poll`] readiness source with an ordered
//! timer table and a self-pipe-equivalent wakeup ([`mio::Waker`]) so
//! that mutating either table while a poll is blocked reliably unparks
//! it. No public operation other than [`Reactor::run`] may block; every
//! callback fires on the reactor thread, never reentrantly for the same
//! fd or timer.
//!
//! ```no_run
//! use std::time::Duration;
//! use ov_reactor::{Reactor, ReactorConfig, RunFor};
//!
//! let mut reactor = Reactor::new(ReactorConfig::default()).unwrap();
//! reactor.set_timer(Duration::from_millis(10), |r| {
//!     r.stop();
//! });
//! reactor.run(RunFor::Forever);
//! ```

mod config;
mod events;
mod reactor;
mod timers;

pub use config::{ReactorConfig, MIN_SOCKETS, MIN_TIMERS};
pub use events::Events;
pub use reactor::{Reactor, RunFor, Stopper};
pub use timers::{TimerId, INVALID_TIMER};
