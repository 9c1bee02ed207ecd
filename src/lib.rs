//! drec — DTLS 1.2 record layer (Sans-IO, Sync)
//!
//! drec is the record layer of DTLS 1.2 and nothing else: it turns an
//! unreliable, unordered datagram stream into authenticated, replay
//! protected, typed protocol records, and protects records going the
//! other way. The handshake state machine, certificates, key derivation
//! and socket I/O all live with the caller; they meet this crate only as
//! typed interfaces.
//!
//! # Goals
//! - **The hard part of DTLS**: per-epoch sliding replay windows, silent
//!   discard of everything untrusted, cross-epoch buffering of records
//!   that arrive before their keys, and MAC ordering (encrypt-then-MAC
//!   vs MAC-then-encrypt) done in the right places.
//! - **Safety**: `forbid(unsafe_code)` throughout the crate.
//! - **Minimal Rust-only deps**: small, well-maintained crates for
//!   parsing and crypto adapters.
//! - **Low overhead**: pooled buffers, in-place transforms, no internal
//!   locks.
//!
//! ## Non-goals
//! - **Handshake logic** (flights, retransmission, reassembly)
//! - **Certificate handling and key schedules**
//! - **In-order delivery across epochs**
//! - **Async** (the crate is event-loop agnostic)
//!
//! # Integration model
//!
//! One [`RecordLayer`] serves one direction of one epoch. Construct it
//! with the collaborators it needs — a datagram [`Transport`], optionally
//! a [`RecordCipher`], [`RecordMac`] and [`Compression`] — then drive it:
//!
//! - [`RecordLayer::get_more_records`] — pull datagrams until a record is
//!   staged, or the transport would block.
//! - [`RecordLayer::read_record`] / [`RecordLayer::release_record`] —
//!   borrow the staged record, then recycle it.
//! - [`RecordLayer::write_records`] — protect and transmit one record.
//! - [`RecordLayer::close`] — at a cipher change, migrate unread bytes
//!   and buffered next-epoch records to the successor layer's transport.
//!
//! Anything malformed, replayed or undecryptable is dropped without a
//! trace: over a datagram network the layer cannot tell junk from attack,
//! so it must not leak state by alerting on arbitrary bytes. The fatal
//! exceptions (encrypt-then-MAC failures, decompression failures, size
//! overflows) surface as [`Error`] with an [`Alert`] recorded for the
//! caller to emit.
//!
//! # Example
//!
//! ```rust
//! use drec::crypto::AesGcmRecordCipher;
//! use drec::transport::MemoryTransport;
//! use drec::{ContentType, Fetch, ProtocolVersion, RecordLayer, WriteTemplate};
//!
//! # fn main() -> Result<(), drec::Error> {
//! let wire = MemoryTransport::new();
//! let key = [7u8; 16];
//! let iv = [1u8; 4];
//!
//! let mut writer = RecordLayer::builder(Box::new(wire.clone()))
//!     .epoch(1)
//!     .cipher(Box::new(AesGcmRecordCipher::new(&key, &iv)?))
//!     .build();
//!
//! let mut reader = RecordLayer::builder(Box::new(wire))
//!     .epoch(1)
//!     .cipher(Box::new(AesGcmRecordCipher::new(&key, &iv)?))
//!     .build();
//!
//! let template = WriteTemplate {
//!     content_type: ContentType::ApplicationData,
//!     version: ProtocolVersion::Dtls1_2,
//!     payload: b"hello",
//! };
//! writer.write_records(&[template])?;
//!
//! assert_eq!(reader.get_more_records()?, Fetch::Record);
//! let record = reader.read_record().unwrap();
//! assert_eq!(record.payload, b"hello");
//! # Ok(())
//! # }
//! ```
//!
//! # Wire format
//!
//! The 13-byte DTLS record header is bit-exact per RFC 6347:
//! type (1), version (2), epoch (2), sequence number (6), length (2).
//!
//! [`Transport`]: transport::Transport
//! [`RecordCipher`]: crypto::RecordCipher
//! [`RecordMac`]: crypto::RecordMac
//! [`Compression`]: crypto::Compression

#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::len_without_is_empty)]
#![deny(missing_docs)]

#[macro_use]
extern crate log;

pub mod buffer;

mod seq;
pub use seq::Sequence;

mod window;

mod queue;

mod message;
pub use message::{ContentType, ProtocolVersion};
pub use message::{
    MAX_COMPRESSED_LENGTH, MAX_ENCRYPTED_LENGTH, MAX_ENCRYPTED_OVERHEAD, MAX_MD_SIZE,
    MAX_PLAIN_LENGTH,
};

mod util;

mod alert;
pub use alert::Alert;

mod error;
pub use error::Error;

pub mod crypto;

pub mod transport;

mod layer;
pub use layer::{
    Direction, Fetch, Flush, MsgCallback, RecordLayer, RecordLayerBuilder, RecordView, Role,
    WriteTemplate,
};
