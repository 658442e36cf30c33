use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use ov_reactor::Reactor;

use crate::bridge::Bridge;
use crate::sink::EventSink;

/// Arms a self-rearming reactor timer that calls
/// [`Bridge::expire_timeouts`] every `interval`, so pending requests
/// time out even while no socket traffic is arriving to drive the poll
/// loop forward. Mirrors `ov_event_loop_poll`'s periodic-timer idiom.
pub fn arm_timeout_sweep(reactor: &mut Reactor, bridge: Rc<RefCell<Bridge>>, sink: Rc<RefCell<dyn EventSink>>, interval: Duration) {
    schedule(reactor, bridge, sink, interval);
}

fn schedule(reactor: &mut Reactor, bridge: Rc<RefCell<Bridge>>, sink: Rc<RefCell<dyn EventSink>>, interval: Duration) {
    reactor.set_timer(interval, move |r| {
        bridge.borrow_mut().expire_timeouts(Instant::now(), &mut *sink.borrow_mut());
        schedule(r, bridge.clone(), sink.clone(), interval);
    });
}
