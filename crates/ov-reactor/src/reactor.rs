use std::collections::BTreeMap;
use std::io;
use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use mio::unix::SourceFd;
use mio::{Events as MioEvents, Poll, Token};
use tracing::{debug, trace, warn};

use crate::config::ReactorConfig;
use crate::events::{from_mio_event, to_mio_interest, Events};
use crate::timers::{TimerId, TimerTable, INVALID_TIMER};

/// Token reserved for the wakeup source; real fds never collide with it
/// since `RawFd` is a small non-negative `i32` in practice.
const WAKE_TOKEN: Token = Token(usize::MAX);

/// How long [`Reactor::run`] is allowed to block for.
///
/// Replaces the original's `OV_RUN_ONCE`/`OV_RUN_MAX` sentinel integers
/// with a closed set of variants — the magic-number table spec.md's
/// design notes ask to eliminate wherever the type system can enforce
/// the same intent directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunFor {
    /// Perform exactly one poll cycle, however long that takes.
    Once,
    /// Run until `stop()` is called; never returns otherwise.
    Forever,
    /// Run until `stop()` is called or this much time has elapsed.
    Duration(Duration),
}

struct FdSlot {
    events: Events,
    callback: Box<dyn FnMut(&mut Reactor, RawFd, Events)>,
}

/// A handle that can request [`Reactor::stop`] from outside the reactor
/// thread — a signal handler, a test driver, or another thread.
///
/// Mirrors the self-pipe wakeup of the original: storing the `running`
/// flag requires no lock (a single `AtomicBool`), and the accompanying
/// [`mio::Waker`] unblocks a poll that is parked waiting for readiness.
#[derive(Clone)]
pub struct Stopper {
    running: Arc<AtomicBool>,
    waker: Arc<mio::Waker>,
}

impl Stopper {
    /// Requests that the reactor's `run` loop return once its current
    /// poll cycle completes. Safe to call from any thread, including a
    /// signal handler.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.waker.wake();
    }
}

/// Single-threaded cooperative I/O and timer multiplexer.
///
/// No operation suspends implicitly: control returns to user code only
/// at a registered fd or timer callback. `fds` is a [`BTreeMap`] so
/// ready callbacks can be walked in ascending fd order without an extra
/// sort — the ordering guarantee spec.md §4.5 requires.
pub struct Reactor {
    poll: Poll,
    waker: Arc<mio::Waker>,
    fds: BTreeMap<RawFd, FdSlot>,
    timers: TimerTable,
    running: Arc<AtomicBool>,
    config: ReactorConfig,
    /// The fd whose callback is currently executing, if any. While a
    /// callback runs, its slot is held locally by [`Reactor::fire_ready_fds`]
    /// rather than living in `fds` — `unregister_fd` consults this to
    /// still deregister from the poller and to suppress the slot's
    /// revival even though `fds.remove` finds nothing.
    firing_fd: Option<RawFd>,
    /// Set by `unregister_fd` when it targets `firing_fd`; tells
    /// `fire_ready_fds` not to put the just-fired slot back.
    suppress_revival: bool,
}

impl Reactor {
    /// Creates a reactor sized by `config`, after clamping its maxima to
    /// the process's current `RLIMIT_NOFILE` via
    /// [`ReactorConfig::adapt_to_runtime`].
    pub fn new(config: ReactorConfig) -> io::Result<Self> {
        let config = config.adapt_to_runtime();
        let poll = Poll::new()?;
        let waker = Arc::new(mio::Waker::new(poll.registry(), WAKE_TOKEN)?);
        Ok(Self {
            poll,
            waker,
            fds: BTreeMap::new(),
            timers: TimerTable::new(config.max_timers),
            running: Arc::new(AtomicBool::new(false)),
            config,
            firing_fd: None,
            suppress_revival: false,
        })
    }

    pub fn config(&self) -> ReactorConfig {
        self.config
    }

    /// A cloneable handle that can `stop()` this reactor from any thread.
    pub fn stopper(&self) -> Stopper {
        Stopper {
            running: self.running.clone(),
            waker: self.waker.clone(),
        }
    }

    /// Associates `callback` with readiness events on `fd`. Replaces any
    /// existing registration for the same fd. Fails if the fd table is
    /// already at `max_sockets` and `fd` is not already registered.
    pub fn register_fd(
        &mut self,
        fd: RawFd,
        events: Events,
        callback: impl FnMut(&mut Reactor, RawFd, Events) + 'static,
    ) -> bool {
        // While `fd`'s own callback is running its slot has been taken
        // out of `fds` (see `firing_fd`), so `contains_key` alone would
        // misclassify an in-callback re-registration as new and call
        // mio's `register` on an fd the poller already knows about.
        let is_new = !self.fds.contains_key(&fd) && self.firing_fd != Some(fd);
        if is_new && self.fds.len() >= self.config.max_sockets {
            warn!(fd, "reactor fd table full, refusing registration");
            return false;
        }
        let interest = to_mio_interest(events);
        let mut source = SourceFd(&fd);
        let result = if is_new {
            self.poll.registry().register(&mut source, Token(fd as usize), interest)
        } else {
            self.poll.registry().reregister(&mut source, Token(fd as usize), interest)
        };
        if let Err(err) = result {
            warn!(fd, %err, "failed to register fd with poller");
            return false;
        }
        self.fds.insert(
            fd,
            FdSlot {
                events,
                callback: Box::new(callback),
            },
        );
        self.wake_after_table_mutation();
        true
    }

    /// Clears `fd`'s registration. No-op success if `fd` was not
    /// registered.
    ///
    /// Safe to call from inside `fd`'s own callback: while a callback
    /// runs, its slot lives outside `fds` (see `firing_fd`), so this
    /// still deregisters from the poller and marks the slot for
    /// suppression instead of silently no-opping.
    pub fn unregister_fd(&mut self, fd: RawFd) -> bool {
        let had_slot = self.fds.remove(&fd).is_some();
        let is_firing = self.firing_fd == Some(fd);
        if !had_slot && !is_firing {
            return true;
        }
        if is_firing {
            self.suppress_revival = true;
        }
        let mut source = SourceFd(&fd);
        if let Err(err) = self.poll.registry().deregister(&mut source) {
            trace!(fd, %err, "deregister failed (fd likely already closed)");
        }
        self.wake_after_table_mutation();
        true
    }

    /// Schedules a one-shot timer firing `relative` from now. Returns
    /// [`INVALID_TIMER`] if the timer table is full.
    pub fn set_timer(
        &mut self,
        relative: Duration,
        callback: impl FnMut(&mut Reactor) + 'static,
    ) -> TimerId {
        let id = self.timers.set_timer(relative, Box::new(callback));
        if id != INVALID_TIMER {
            self.wake_after_table_mutation();
        }
        id
    }

    /// Clears a timer. No-op success for an unknown or already-fired id.
    pub fn cancel_timer(&mut self, id: TimerId) -> bool {
        let result = self.timers.cancel_timer(id);
        self.wake_after_table_mutation();
        result
    }

    fn wake_after_table_mutation(&self) {
        // Every fd/timer table mutation sends one wakeup octet so a
        // blocked poll re-reads the configuration promptly, matching the
        // self-pipe contract of spec.md §4.5 and §5.
        let _ = self.waker.wake();
    }

    /// Verifies `fd` is a stream socket (`SOCK_STREAM`), puts it in
    /// non-blocking mode, and registers it — the accept-side convenience
    /// wrapper `ov_event_loop`'s stream listeners use on every accepted
    /// connection.
    pub fn accept_and_register(
        &mut self,
        fd: RawFd,
        events: Events,
        callback: impl FnMut(&mut Reactor, RawFd, Events) + 'static,
    ) -> bool {
        if !is_stream_socket(fd) {
            warn!(fd, "refusing to register non-stream socket");
            return false;
        }
        if !set_nonblocking(fd) {
            warn!(fd, "failed to set O_NONBLOCK on accepted socket");
            return false;
        }
        self.register_fd(fd, events, callback)
    }

    /// Requests that `run` return after completing its current cycle.
    /// Equivalent to `self.stopper().stop()`.
    pub fn stop(&self) {
        self.stopper().stop();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Enters the loop. Timer callbacks within a cycle fire before fd
    /// callbacks, in ascending deadline order; fd callbacks fire in
    /// ascending fd order, at most once per fd per cycle.
    pub fn run(&mut self, mode: RunFor) {
        self.running.store(true, Ordering::SeqCst);
        let deadline = match mode {
            RunFor::Once | RunFor::Forever => None,
            RunFor::Duration(d) => Some(Instant::now() + d),
        };

        loop {
            if !self.is_running() {
                break;
            }
            let poll_budget = self.next_poll_timeout(deadline);
            let mut mio_events = MioEvents::with_capacity(self.config.max_sockets.max(8));
            match self.poll.poll(&mut mio_events, poll_budget) {
                Ok(()) => {}
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!(%err, "reactor poll failed");
                    break;
                }
            }

            self.fire_ready_timers();

            if !self.is_running() {
                break;
            }
            self.fire_ready_fds(&mio_events);

            if matches!(mode, RunFor::Once) {
                break;
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    break;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
    }

    fn next_poll_timeout(&mut self, run_deadline: Option<Instant>) -> Option<Duration> {
        let now = Instant::now();
        let timer_budget = self.timers.next_deadline().map(|d| d.saturating_duration_since(now));
        let run_budget = run_deadline.map(|d| d.saturating_duration_since(now));
        match (timer_budget, run_budget) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    fn fire_ready_timers(&mut self) {
        let ready = self.timers.pop_ready(Instant::now());
        for mut callback in ready {
            callback(self);
        }
    }

    fn fire_ready_fds(&mut self, mio_events: &MioEvents) {
        let mut ready: Vec<(RawFd, Events)> = Vec::new();
        for event in mio_events.iter() {
            if event.token() == WAKE_TOKEN {
                continue;
            }
            let fd = event.token().0 as RawFd;
            ready.push((fd, from_mio_event(event)));
        }
        // BTreeMap iteration order is already ascending; `ready` from
        // mio has no ordering guarantee, so sort explicitly.
        ready.sort_by_key(|(fd, _)| *fd);
        ready.dedup_by_key(|(fd, _)| *fd);

        for (fd, events) in ready {
            let Some(mut slot) = self.fds.remove(&fd) else {
                continue;
            };
            debug!(fd, ?events, "firing fd callback");
            self.firing_fd = Some(fd);
            self.suppress_revival = false;
            (slot.callback)(self, fd, events);
            self.firing_fd = None;
            // If the callback unregistered `fd` from inside itself,
            // `suppress_revival` is set and the poller registration is
            // already gone — don't bring the old slot back. If it
            // re-registered `fd`, `fds` already holds the fresh slot
            // and `entry().or_insert` is a no-op. Otherwise the
            // original, persistent registration survives into the next
            // cycle.
            if !self.suppress_revival {
                self.fds.entry(fd).or_insert(slot);
            }
        }
    }
}

#[cfg(unix)]
fn is_stream_socket(fd: RawFd) -> bool {
    let mut socket_type: libc::c_int = 0;
    let mut len = std::mem::size_of::<libc::c_int>() as libc::socklen_t;
    // Safety: `socket_type`/`len` are plain-old-data, sized for the call.
    let rc = unsafe {
        libc::getsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_TYPE,
            (&mut socket_type as *mut libc::c_int).cast(),
            &mut len,
        )
    };
    rc == 0 && socket_type == libc::SOCK_STREAM
}

#[cfg(unix)]
fn set_nonblocking(fd: RawFd) -> bool {
    // Safety: `fd` is a valid, open descriptor owned by the caller for
    // the duration of this call.
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL, 0);
        if flags < 0 {
            return false;
        }
        libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn run_once_performs_exactly_one_cycle() {
        let mut reactor = Reactor::new(ReactorConfig::default()).unwrap();
        let fired = Arc::new(AtomicBool::new(false));
        let f = fired.clone();
        reactor.set_timer(Duration::from_millis(1), move |_| {
            f.store(true, Ordering::SeqCst);
        });
        std::thread::sleep(Duration::from_millis(5));
        reactor.run(RunFor::Once);
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn timers_fire_before_fds_in_the_same_cycle() {
        let mut reactor = Reactor::new(ReactorConfig::default()).unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));

        let (mut rd, mut wr) = {
            use std::io::Write;
            let (a, b) = std::os::unix::net::UnixStream::pair().unwrap();
            a.set_nonblocking(true).unwrap();
            b.set_nonblocking(true).unwrap();
            let mut b = b;
            b.write_all(b"x").unwrap();
            (a, b)
        };
        let _ = &mut wr;

        let fd_order = order.clone();
        let fd = std::os::unix::io::AsRawFd::as_raw_fd(&rd);
        reactor.register_fd(fd, Events::READABLE, move |_, _, _| {
            fd_order.lock().unwrap().push("fd");
        });

        let timer_order = order.clone();
        reactor.set_timer(Duration::from_millis(1), move |_| {
            timer_order.lock().unwrap().push("timer");
        });

        std::thread::sleep(Duration::from_millis(5));
        reactor.run(RunFor::Once);

        assert_eq!(*order.lock().unwrap(), vec!["timer", "fd"]);
        let _ = rd.set_nonblocking(false);
    }

    #[test]
    fn unregister_from_within_own_callback_stops_future_firing() {
        let mut reactor = Reactor::new(ReactorConfig::default()).unwrap();
        let fire_count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let count = fire_count.clone();
        let id_cell: Arc<Mutex<TimerId>> = Arc::new(Mutex::new(INVALID_TIMER));
        let id_cell_for_cb = id_cell.clone();
        let id = reactor.set_timer(Duration::from_millis(1), move |r| {
            count.fetch_add(1, Ordering::SeqCst);
            let id = *id_cell_for_cb.lock().unwrap();
            r.cancel_timer(id);
        });
        *id_cell.lock().unwrap() = id;

        std::thread::sleep(Duration::from_millis(5));
        reactor.run(RunFor::Once);
        assert_eq!(fire_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fd_unregistered_from_within_its_own_callback_never_fires_again() {
        use std::io::{Read, Write};

        let mut reactor = Reactor::new(ReactorConfig::default()).unwrap();
        let fire_count = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let (mut rd, mut wr) = std::os::unix::net::UnixStream::pair().unwrap();
        rd.set_nonblocking(true).unwrap();
        wr.set_nonblocking(true).unwrap();
        wr.write_all(b"x").unwrap();

        let fd = std::os::unix::io::AsRawFd::as_raw_fd(&rd);
        let count = fire_count.clone();
        reactor.register_fd(fd, Events::READABLE, move |r, fd, _| {
            count.fetch_add(1, Ordering::SeqCst);
            let mut byte = [0u8; 1];
            let _ = (&rd).read(&mut byte);
            assert!(r.unregister_fd(fd), "self-unregister must report success");
        });

        std::thread::sleep(Duration::from_millis(5));
        reactor.run(RunFor::Once);
        assert_eq!(fire_count.load(Ordering::SeqCst), 1);

        // More data arrives after the callback unregistered itself; a
        // second poll cycle must not fire it again.
        wr.write_all(b"y").unwrap();
        std::thread::sleep(Duration::from_millis(5));
        reactor.run(RunFor::Once);
        assert_eq!(fire_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stop_from_another_thread_ends_run_forever() {
        let mut reactor = Reactor::new(ReactorConfig::default()).unwrap();
        let stopper = reactor.stopper();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            stopper.stop();
        });
        reactor.run(RunFor::Forever);
        handle.join().unwrap();
        assert!(!reactor.is_running());
    }
}
