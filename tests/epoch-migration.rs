//! Cross-epoch behavior: buffering of next-epoch records, the queue
//! bound, and teardown migration to a successor layer.

mod support;

use drec::transport::{MemoryTransport, Transport};
use drec::{Fetch, RecordLayer};
use support::*;

const DTLS1_2: u16 = 0xFEFD;

#[test]
fn next_epoch_handshake_is_buffered_then_delivered_after_key_change() {
    let _ = env_logger::try_init();

    let mut wire = MemoryTransport::new();
    let handover = MemoryTransport::new();

    // Current epoch 3, handshake in progress. A record from epoch 4
    // arrives before the epoch-4 keys exist.
    let mut layer = RecordLayer::builder(Box::new(wire.clone()))
        .epoch(3)
        .first_record(false)
        .next(Box::new(handover.clone()))
        .build();

    wire.send(&raw_record(22, DTLS1_2, 4, 0, b"finished")).unwrap();

    assert_eq!(layer.get_more_records().unwrap(), Fetch::Retry);
    assert!(layer.read_record().is_none());
    assert_eq!(layer.deferred_records(), 1);

    // Epoch 4 keys arrive: tear the old layer down and build its
    // successor, which drains the handover queue before the wire.
    layer.close().unwrap();
    assert_eq!(handover.len(), 1);

    let mut successor = RecordLayer::builder(Box::new(wire))
        .epoch(4)
        .first_record(false)
        .previous(Box::new(handover))
        .build();

    assert_eq!(successor.get_more_records().unwrap(), Fetch::Record);
    let record = successor.read_record().unwrap();
    assert_eq!(record.sequence.epoch, 4);
    assert_eq!(record.payload, b"finished");
}

#[test]
fn next_epoch_records_are_dropped_outside_the_handshake() {
    let _ = env_logger::try_init();

    let mut wire = MemoryTransport::new();
    let mut layer = RecordLayer::builder(Box::new(wire.clone()))
        .epoch(3)
        .first_record(false)
        .build();
    layer.set_in_init(false);

    wire.send(&raw_record(22, DTLS1_2, 4, 0, b"early")).unwrap();

    assert_eq!(layer.get_more_records().unwrap(), Fetch::Retry);
    assert_eq!(layer.deferred_records(), 0);
}

#[test]
fn unprocessed_queue_never_exceeds_its_cap() {
    let _ = env_logger::try_init();

    let mut wire = MemoryTransport::new();
    let mut layer = RecordLayer::builder(Box::new(wire.clone()))
        .epoch(0)
        .build();

    for seq in 0..150u64 {
        wire.send(&raw_record(22, DTLS1_2, 1, seq, b"flood")).unwrap();
    }

    assert_eq!(layer.get_more_records().unwrap(), Fetch::Retry);
    assert_eq!(layer.deferred_records(), 100);
    assert_eq!(layer.alert_code(), None);
}

#[test]
fn duplicate_next_epoch_records_are_not_buffered_twice() {
    let _ = env_logger::try_init();

    let datagram = raw_record(22, DTLS1_2, 1, 7, b"dup");

    let mut wire = MemoryTransport::new();
    wire.send(&datagram).unwrap();
    wire.send(&datagram).unwrap();

    let mut layer = plain_layer(wire);
    assert_eq!(layer.get_more_records().unwrap(), Fetch::Retry);
    assert_eq!(layer.deferred_records(), 1);
}

#[test]
fn migration_preserves_sequence_order() {
    let _ = env_logger::try_init();

    let mut wire = MemoryTransport::new();
    let handover = MemoryTransport::new();

    let mut layer = RecordLayer::builder(Box::new(wire.clone()))
        .epoch(0)
        .next(Box::new(handover.clone()))
        .build();

    // Arrival order deliberately scrambled.
    for seq in [5u64, 2, 9, 7, 0] {
        wire.send(&raw_record(22, DTLS1_2, 1, seq, b"x")).unwrap();
    }

    assert_eq!(layer.get_more_records().unwrap(), Fetch::Retry);
    assert_eq!(layer.deferred_records(), 5);

    layer.close().unwrap();
    assert_eq!(handover.len(), 5);

    // Drained in non-decreasing (epoch, seq) order.
    let mut last = None;
    while let Some(datagram) = handover.pop_datagram() {
        let key = header_sequence(&datagram);
        assert!(Some(key) >= last, "migration out of order: {:?}", key);
        last = Some(key);
    }
    assert_eq!(last, Some((1, 9)));
}

#[test]
fn unread_datagram_bytes_migrate_verbatim() {
    let _ = env_logger::try_init();

    let second = raw_record(22, DTLS1_2, 0, 1, b"second");
    let mut datagram = raw_record(22, DTLS1_2, 0, 0, b"first");
    datagram.extend_from_slice(&second);

    let mut wire = MemoryTransport::new();
    wire.send(&datagram).unwrap();

    let handover = MemoryTransport::new();
    let mut layer = RecordLayer::builder(Box::new(wire))
        .next(Box::new(handover.clone()))
        .build();

    // Consume only the first record of the datagram.
    assert_eq!(layer.get_more_records().unwrap(), Fetch::Record);
    layer.release_record();

    layer.close().unwrap();

    // The unread remainder went to the successor untouched.
    assert_eq!(handover.pop_datagram().unwrap(), second);
    assert!(handover.is_empty());
}

#[test]
fn dropping_the_layer_migrates_too() {
    let _ = env_logger::try_init();

    let mut wire = MemoryTransport::new();
    let handover = MemoryTransport::new();

    let mut layer = RecordLayer::builder(Box::new(wire.clone()))
        .next(Box::new(handover.clone()))
        .build();

    wire.send(&raw_record(22, DTLS1_2, 1, 3, b"pending")).unwrap();
    assert_eq!(layer.get_more_records().unwrap(), Fetch::Retry);
    assert_eq!(layer.deferred_records(), 1);

    drop(layer);
    assert_eq!(handover.len(), 1);
}
