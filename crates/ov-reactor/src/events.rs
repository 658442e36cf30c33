use std::ops::{BitOr, BitOrAssign};

/// Readiness bitmask over `{readable, writable, close, error}`
/// (`OV_EVENT_IO_IN | OV_EVENT_IO_OUT | OV_EVENT_IO_CLOSE | OV_EVENT_IO_ERR`
/// in the original).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Events(u8);

impl Events {
    pub const NONE: Events = Events(0);
    pub const READABLE: Events = Events(0b0001);
    pub const WRITABLE: Events = Events(0b0010);
    pub const CLOSE: Events = Events(0b0100);
    pub const ERROR: Events = Events(0b1000);

    pub const fn contains(self, other: Events) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Events {
    type Output = Events;

    fn bitor(self, rhs: Self) -> Self::Output {
        Events(self.0 | rhs.0)
    }
}

impl BitOrAssign for Events {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

pub(crate) fn to_mio_interest(events: Events) -> mio::Interest {
    let mut interest = None;
    if events.contains(Events::READABLE) || events.contains(Events::CLOSE) {
        interest = Some(mio::Interest::READABLE);
    }
    if events.contains(Events::WRITABLE) {
        interest = Some(interest.map_or(mio::Interest::WRITABLE, |i| i.add(mio::Interest::WRITABLE)));
    }
    interest.unwrap_or(mio::Interest::READABLE)
}

pub(crate) fn from_mio_event(event: &mio::event::Event) -> Events {
    let mut events = Events::NONE;
    if event.is_readable() {
        events |= Events::READABLE;
    }
    if event.is_writable() {
        events |= Events::WRITABLE;
    }
    if event.is_read_closed() || event.is_write_closed() {
        events |= Events::CLOSE;
    }
    if event.is_error() {
        events |= Events::ERROR;
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_contains_both_flags() {
        let both = Events::READABLE | Events::ERROR;
        assert!(both.contains(Events::READABLE));
        assert!(both.contains(Events::ERROR));
        assert!(!both.contains(Events::WRITABLE));
    }
}
