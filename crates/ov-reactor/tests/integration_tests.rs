use std::os::unix::io::AsRawFd;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ov_reactor::{Events, Reactor, ReactorConfig, RunFor};

/// Scenario 4 from spec.md §8: timer A at +100ms, timer B at +10ms;
/// running for 200ms fires B first, then A, each exactly once.
#[test]
fn timer_ordering_nearest_deadline_first() {
    let mut reactor = Reactor::new(ReactorConfig::default()).unwrap();
    let counter_a = Arc::new(AtomicU32::new(0));
    let counter_b = Arc::new(AtomicU32::new(0));
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));

    let (ca, oa) = (counter_a.clone(), order.clone());
    reactor.set_timer(Duration::from_millis(100), move |_| {
        ca.fetch_add(1, Ordering::SeqCst);
        oa.lock().unwrap().push('A');
    });
    let (cb, ob) = (counter_b.clone(), order.clone());
    reactor.set_timer(Duration::from_millis(10), move |_| {
        cb.fetch_add(1, Ordering::SeqCst);
        ob.lock().unwrap().push('B');
    });

    reactor.run(RunFor::Duration(Duration::from_millis(200)));

    assert_eq!(counter_a.load(Ordering::SeqCst), 1);
    assert_eq!(counter_b.load(Ordering::SeqCst), 1);
    assert_eq!(*order.lock().unwrap(), vec!['B', 'A']);
}

#[test]
fn unregistered_fd_never_fires_again() {
    use std::io::Write;

    let mut reactor = Reactor::new(ReactorConfig::default()).unwrap();
    let (rd, mut wr) = std::os::unix::net::UnixStream::pair().unwrap();
    rd.set_nonblocking(true).unwrap();
    wr.set_nonblocking(true).unwrap();
    let fd = rd.as_raw_fd();

    let fire_count = Arc::new(AtomicU32::new(0));
    let count = fire_count.clone();
    reactor.register_fd(fd, Events::READABLE, move |_, _, _| {
        count.fetch_add(1, Ordering::SeqCst);
    });

    wr.write_all(b"a").unwrap();
    reactor.run(RunFor::Once);
    assert_eq!(fire_count.load(Ordering::SeqCst), 1);

    assert!(reactor.unregister_fd(fd));

    wr.write_all(b"b").unwrap();
    reactor.run(RunFor::Once);
    // No callback is registered for `fd` any more, so the count must
    // not have advanced even though the pipe is readable again.
    assert_eq!(fire_count.load(Ordering::SeqCst), 1);
}

#[test]
fn registering_beyond_max_sockets_fails() {
    let config = ReactorConfig {
        max_sockets: 1,
        max_timers: ov_reactor::MIN_TIMERS,
    };
    let mut reactor = Reactor::new(config).unwrap();
    let (a, _a2) = std::os::unix::net::UnixStream::pair().unwrap();
    let (b, _b2) = std::os::unix::net::UnixStream::pair().unwrap();
    a.set_nonblocking(true).unwrap();
    b.set_nonblocking(true).unwrap();

    assert!(reactor.register_fd(a.as_raw_fd(), Events::READABLE, |_, _, _| {}));
    assert!(!reactor.register_fd(b.as_raw_fd(), Events::READABLE, |_, _, _| {}));
}

#[test]
fn cancel_timer_from_outside_is_a_no_op_on_unknown_id() {
    let mut reactor = Reactor::new(ReactorConfig::default()).unwrap();
    assert!(reactor.cancel_timer(999));
}
