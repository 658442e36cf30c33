use std::cell::RefCell;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::os::unix::io::AsRawFd;
use std::rc::Rc;

use ov_reactor::{Events, Reactor};
use tracing::warn;

use crate::jitter::JitterBuffer;

/// Largest datagram this adapter will ever read; `mtu` in
/// [`RtpSocketAdapter::register`] is clamped to this.
pub const MAX_MTU: usize = 2048;
pub const DEFAULT_MTU: usize = MAX_MTU;

/// Owns one datagram socket feeding a [`JitterBuffer`].
///
/// Registered with a [`Reactor`], it reads exactly one datagram per
/// readiness event into a fixed-size stack buffer, decodes it, and
/// pushes the result into the shared jitter buffer. A malformed
/// datagram is logged and dropped; the reactor stays armed for the
/// next readiness event (spec.md §4.7's "a single malformed datagram is
/// logged and skipped").
pub struct RtpSocketAdapter {
    socket: Rc<UdpSocket>,
}

impl RtpSocketAdapter {
    /// Binds a non-blocking UDP socket at `addr`.
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        Ok(Self {
            socket: Rc::new(socket),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Registers this socket's readable events with `reactor`. On each
    /// readiness event, reads one datagram (at most `mtu`, clamped to
    /// [`MAX_MTU`], octets) and feeds it into `jitter`.
    pub fn register(self, reactor: &mut Reactor, jitter: Rc<RefCell<JitterBuffer>>, mtu: usize) -> bool {
        let mtu = mtu.min(MAX_MTU).max(1);
        let socket = self.socket;
        let fd = socket.as_raw_fd();
        reactor.register_fd(fd, Events::READABLE, move |_reactor, _fd, _events| {
            let mut datagram = [0u8; MAX_MTU];
            match socket.recv_from(&mut datagram[..mtu]) {
                Ok((len, _peer)) => match crate::Frame::decode(&datagram[..len]) {
                    Some(frame) => jitter.borrow_mut().add(frame),
                    None => warn!(len, "dropping malformed RTP datagram"),
                },
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => warn!(%e, "rtp socket read error"),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jitter::JitterConfig;
    use ov_reactor::{ReactorConfig, RunFor};

    #[test]
    fn single_datagram_is_decoded_and_pushed_into_jitter_buffer() {
        let mut reactor = Reactor::new(ReactorConfig::default()).unwrap();
        let adapter = RtpSocketAdapter::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = adapter.local_addr().unwrap();
        let jitter = Rc::new(RefCell::new(JitterBuffer::new(JitterConfig::default())));

        assert!(adapter.register(&mut reactor, jitter.clone(), DEFAULT_MTU));

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        let mut datagram = vec![0x80, 96, 0, 1, 0, 0, 0, 0, 0, 0, 0, 42];
        datagram.extend_from_slice(b"hi");
        sender.send_to(&datagram, addr).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));
        reactor.run(RunFor::Once);

        let current = jitter.borrow_mut().take_current();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].ssrc, 42);
        assert_eq!(current[0].payload.data(), b"hi");
    }

    #[test]
    fn malformed_datagram_is_dropped_without_panicking() {
        let mut reactor = Reactor::new(ReactorConfig::default()).unwrap();
        let adapter = RtpSocketAdapter::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = adapter.local_addr().unwrap();
        let jitter = Rc::new(RefCell::new(JitterBuffer::new(JitterConfig::default())));
        assert!(adapter.register(&mut reactor, jitter.clone(), DEFAULT_MTU));

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender.send_to(b"not rtp", addr).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));
        reactor.run(RunFor::Once);

        assert!(jitter.borrow_mut().take_current().is_empty());
    }
}
