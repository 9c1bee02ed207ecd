#![no_main]

//! Fuzz target for the record read pipeline.
//!
//! Splits the input into pseudo-datagrams and feeds them to a protected
//! record layer. Arbitrary bytes must never panic, and anything that is
//! not a validly protected record must be silently dropped: no records,
//! no alert.

use libfuzzer_sys::fuzz_target;

use drec::crypto::AesGcmRecordCipher;
use drec::transport::{MemoryTransport, Transport};
use drec::{Fetch, RecordLayer};

fuzz_target!(|data: &[u8]| {
    let mut wire = MemoryTransport::new();

    // First byte picks a chunking; the rest becomes datagrams.
    let Some((first, rest)) = data.split_first() else {
        return;
    };
    let chunk = usize::from(*first).max(1);
    for datagram in rest.chunks(chunk) {
        let _ = wire.send(datagram);
    }

    let cipher = AesGcmRecordCipher::new(&[0x42; 16], &[0x24; 4]).expect("cipher");
    let mut layer = RecordLayer::builder(Box::new(wire))
        .epoch(1)
        .cipher(Box::new(cipher))
        .build();

    loop {
        match layer.get_more_records() {
            Ok(Fetch::Record) => {
                // Forged input must not decrypt under a random key.
                panic!("fuzzer produced a validly protected record");
            }
            Ok(Fetch::Retry) | Ok(Fetch::Eof) => break,
            Err(_) => break,
        }
    }

    assert!(layer.read_record().is_none());
});
