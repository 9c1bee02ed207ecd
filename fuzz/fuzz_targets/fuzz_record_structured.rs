#![no_main]

//! Fuzz target feeding structurally plausible records to a cleartext
//! layer.
//!
//! Builds datagrams that carry a well-formed 13-byte header so the fuzzer
//! spends its time past the header checks: epoch routing, replay
//! windows, deferral and delivery. The layer must never panic and every
//! delivered record must round out of the staged state cleanly.

use libfuzzer_sys::fuzz_target;

use drec::transport::{MemoryTransport, Transport};
use drec::{Fetch, RecordLayer};

const HEADER_LEN: usize = 13;

fuzz_target!(|data: &[u8]| {
    let mut wire = MemoryTransport::new();

    for chunk in data.chunks(HEADER_LEN + 24) {
        if chunk.len() < 4 {
            continue;
        }

        // type/epoch/seq/payload from the fuzzer, version held valid.
        let payload = &chunk[4..];
        let mut datagram = Vec::with_capacity(HEADER_LEN + payload.len());
        datagram.push(20 + (chunk[0] % 5));
        datagram.extend_from_slice(&[0xFE, 0xFD]);
        datagram.extend_from_slice(&[0, chunk[1] % 3]);
        datagram.extend_from_slice(&[0, 0, 0, 0, chunk[2], chunk[3]]);
        datagram.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        datagram.extend_from_slice(payload);

        let _ = wire.send(&datagram);
    }

    let mut layer = RecordLayer::builder(Box::new(wire)).build();

    for _ in 0..1_000 {
        match layer.get_more_records() {
            Ok(Fetch::Record) => {
                let record = layer.read_record().expect("staged record readable");
                assert!(record.payload.len() <= drec::MAX_PLAIN_LENGTH);
                layer.release_record();
            }
            Ok(Fetch::Retry) | Ok(Fetch::Eof) => break,
            Err(_) => break,
        }
    }
});
