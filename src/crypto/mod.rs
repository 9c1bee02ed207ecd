//! Typed interfaces the record layer drives: ciphers, MACs and
//! compression methods.
//!
//! The record layer does not implement cryptographic primitives. It
//! orders their application (encrypt-then-MAC vs MAC-then-encrypt, IV
//! placement, silent-drop policy) and leaves the transforms to these
//! traits. Two adapters are provided: [`AesGcmRecordCipher`] for AEAD
//! suites and [`HmacMac`] for HMAC-based suites. Anything else can be
//! plugged in from the outside.

mod aes_gcm;
mod hmac;

pub use self::aes_gcm::AesGcmRecordCipher;
pub use self::hmac::HmacMac;

use arrayvec::ArrayVec;

use crate::alert::Alert;
use crate::buffer::Buf;
use crate::message::{ContentType, ProtocolVersion, MAX_MD_SIZE};
use crate::seq::Sequence;
use crate::Error;

/// Per-record metadata handed to cipher and MAC implementations.
#[derive(Debug, Clone, Copy)]
pub struct RecordMeta {
    /// Record content type.
    pub content_type: ContentType,
    /// Wire protocol version.
    pub version: ProtocolVersion,
    /// Epoch and 48-bit sequence number.
    pub sequence: Sequence,
}

impl RecordMeta {
    /// The canonical 13-byte prefix covered by record MACs and AEAD
    /// additional data: `seq(8) || type(1) || version(2) || length(2)`.
    pub fn header_bytes(&self, length: u16) -> [u8; 13] {
        let mut out = [0u8; 13];
        out[..8].copy_from_slice(&self.sequence.to_bytes());
        out[8] = self.content_type.as_u8();
        out[9..11].copy_from_slice(&self.version.to_u16().to_be_bytes());
        out[11..13].copy_from_slice(&length.to_be_bytes());
        out
    }
}

/// Block or AEAD mode of a record cipher.
///
/// The mode determines how many explicit IV bytes the write path reserves
/// in front of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherMode {
    /// A stream cipher; no explicit IV.
    Stream,
    /// CBC block mode carrying the cipher's IV length.
    Cbc {
        /// IV length in bytes.
        iv_len: usize,
    },
    /// AES-GCM AEAD (8-byte explicit nonce).
    Gcm,
    /// AES-CCM AEAD (8-byte explicit nonce).
    Ccm,
}

impl CipherMode {
    /// Explicit IV bytes transmitted in the clear ahead of the ciphertext.
    pub(crate) fn explicit_iv_len(&self) -> usize {
        match self {
            CipherMode::Stream => 0,
            CipherMode::Cbc { iv_len } => {
                if *iv_len <= 1 {
                    0
                } else {
                    *iv_len
                }
            }
            CipherMode::Gcm => 8,
            CipherMode::Ccm => 8,
        }
    }
}

/// Outcome of a record decryption attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptOutcome {
    /// The payload now holds the plaintext (still carrying its MAC
    /// trailer in MAC-then-encrypt mode).
    Ok,
    /// Undecryptable. DTLS ignores such records entirely; the layer
    /// drops the packet without surfacing anything.
    Silent,
    /// A policy violation that must surface as the given alert.
    Fatal(Alert),
}

/// A record cipher operating in place on a record fragment.
pub trait RecordCipher {
    /// The cipher's mode, used to size the explicit IV.
    fn mode(&self) -> CipherMode;

    /// Encrypt in place.
    ///
    /// On entry `payload` holds `explicit_iv_len` reserved bytes followed
    /// by the plaintext (and MAC trailer in MAC-then-encrypt mode). The
    /// implementation fills the IV, encrypts, and appends any tag or
    /// padding.
    fn encrypt(
        &mut self,
        meta: &RecordMeta,
        explicit_iv_len: usize,
        payload: &mut Buf,
    ) -> Result<(), Error>;

    /// Decrypt in place; `payload` is the wire fragment.
    ///
    /// `mac_len` is the length of a MAC trailer still inside the
    /// ciphertext (zero for AEAD suites and under encrypt-then-MAC, where
    /// the layer strips the MAC first). On [`DecryptOutcome::Ok`] the
    /// payload holds the plaintext followed by `mac_len` trailer bytes.
    fn decrypt(&mut self, meta: &RecordMeta, payload: &mut Buf, mac_len: usize) -> DecryptOutcome;
}

/// A record MAC.
pub trait RecordMac {
    /// Digest length in bytes. At most [`MAX_MD_SIZE`].
    fn mac_len(&self) -> usize;

    /// MAC over the canonical header prefix and `payload`.
    fn compute(&mut self, meta: &RecordMeta, payload: &[u8]) -> ArrayVec<u8, MAX_MD_SIZE>;
}

/// A record compression method.
///
/// DTLS compression is rarely negotiated; the layer only orders the
/// calls and enforces the inflation bounds.
pub trait Compression {
    /// Compress `input`, appending to `out`.
    fn compress(&mut self, input: &[u8], out: &mut Buf) -> Result<(), Error>;

    /// Decompress `input`, appending to `out`. Must fail rather than
    /// produce more than `max_len` bytes.
    fn decompress(&mut self, input: &[u8], out: &mut Buf, max_len: usize) -> Result<(), Error>;
}
