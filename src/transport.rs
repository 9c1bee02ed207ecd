//! Datagram transport interface between the record layer and the wire.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::buffer::Buf;
use crate::Error;

/// Outcome of a datagram receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// One whole datagram of the given size was appended.
    Datagram(usize),
    /// Nothing available right now; try again after the transport is
    /// ready.
    WouldBlock,
    /// The transport is closed for reading.
    Eof,
}

/// Outcome of a datagram send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The datagram was accepted in full.
    Sent,
    /// The transport cannot take the datagram right now.
    WouldBlock,
}

/// A packet-oriented byte source and sink.
///
/// Datagrams are all-or-nothing in both directions; there are no partial
/// reads or writes at this interface. The record layer assumes exclusive
/// use of its transports for its lifetime but does not own the peer
/// endpoints behind them.
pub trait Transport {
    /// Receive the next whole datagram, appending its bytes into `into`.
    fn recv(&mut self, into: &mut Buf) -> Result<ReadOutcome, Error>;

    /// Send one datagram.
    fn send(&mut self, datagram: &[u8]) -> Result<WriteOutcome, Error>;

    /// Whether the transport already provides ordered, reliable delivery
    /// (e.g. SCTP). Replay checking is skipped on such transports.
    fn reliable_ordered(&self) -> bool {
        false
    }
}

/// An in-memory datagram queue.
///
/// Clones share the same queue, so one clone can serve as the send side
/// and another as the receive side of a loopback wire. Used by tests and
/// as the successor sink when record layers hand over across epochs.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    queue: Rc<RefCell<VecDeque<Vec<u8>>>>,
}

impl MemoryTransport {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued datagrams.
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Remove and return the oldest queued datagram.
    pub fn pop_datagram(&self) -> Option<Vec<u8>> {
        self.queue.borrow_mut().pop_front()
    }
}

impl Transport for MemoryTransport {
    fn recv(&mut self, into: &mut Buf) -> Result<ReadOutcome, Error> {
        match self.queue.borrow_mut().pop_front() {
            Some(datagram) => {
                into.extend_from_slice(&datagram);
                Ok(ReadOutcome::Datagram(datagram.len()))
            }
            None => Ok(ReadOutcome::WouldBlock),
        }
    }

    fn send(&mut self, datagram: &[u8]) -> Result<WriteOutcome, Error> {
        self.queue.borrow_mut().push_back(datagram.to_vec());
        Ok(WriteOutcome::Sent)
    }
}

impl fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.queue.borrow();
        let total_bytes: usize = queue.iter().map(|d| d.len()).sum();
        f.debug_struct("MemoryTransport")
            .field("datagrams", &queue.len())
            .field("total_bytes", &total_bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_queue() {
        let mut a = MemoryTransport::new();
        let mut b = a.clone();

        a.send(b"ping").unwrap();
        let mut buf = Buf::new();
        assert_eq!(b.recv(&mut buf).unwrap(), ReadOutcome::Datagram(4));
        assert_eq!(&*buf, b"ping");

        assert_eq!(b.recv(&mut Buf::new()).unwrap(), ReadOutcome::WouldBlock);
    }

    #[test]
    fn recv_appends() {
        let mut t = MemoryTransport::new();
        t.send(b"a").unwrap();
        t.send(b"b").unwrap();

        let mut buf = Buf::new();
        t.recv(&mut buf).unwrap();
        t.recv(&mut buf).unwrap();
        assert_eq!(&*buf, b"ab");
    }
}
