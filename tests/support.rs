//! Shared helpers for record layer integration tests.

#![allow(dead_code)]

use drec::buffer::Buf;
use drec::crypto::{
    AesGcmRecordCipher, CipherMode, Compression, DecryptOutcome, RecordCipher, RecordMac,
    RecordMeta,
};
use drec::transport::{MemoryTransport, ReadOutcome, Transport, WriteOutcome};
use drec::{ContentType, Error, ProtocolVersion, RecordLayer, WriteTemplate, MAX_MD_SIZE};

use arrayvec::ArrayVec;

pub const TEST_KEY: [u8; 16] = [0x42; 16];
pub const TEST_IV: [u8; 4] = [0x24; 4];

/// A cleartext layer (epoch 0 defaults) over the given wire.
pub fn plain_layer(wire: MemoryTransport) -> RecordLayer {
    RecordLayer::builder(Box::new(wire)).build()
}

/// An AES-GCM protected layer at the given epoch.
pub fn gcm_layer(wire: MemoryTransport, epoch: u16) -> RecordLayer {
    RecordLayer::builder(Box::new(wire))
        .epoch(epoch)
        .cipher(Box::new(
            AesGcmRecordCipher::new(&TEST_KEY, &TEST_IV).expect("cipher"),
        ))
        .build()
}

pub fn handshake_template(payload: &[u8]) -> WriteTemplate<'_> {
    WriteTemplate {
        content_type: ContentType::Handshake,
        version: ProtocolVersion::Dtls1_2,
        payload,
    }
}

pub fn app_data_template(payload: &[u8]) -> WriteTemplate<'_> {
    WriteTemplate {
        content_type: ContentType::ApplicationData,
        version: ProtocolVersion::Dtls1_2,
        payload,
    }
}

/// Hand-build one wire record: 13-byte header plus payload.
pub fn raw_record(ctype: u8, version: u16, epoch: u16, seq: u64, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(13 + payload.len());
    out.push(ctype);
    out.extend_from_slice(&version.to_be_bytes());
    out.extend_from_slice(&epoch.to_be_bytes());
    out.extend_from_slice(&seq.to_be_bytes()[2..]);
    out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// The epoch and sequence number encoded in a wire record's header.
pub fn header_sequence(datagram: &[u8]) -> (u16, u64) {
    let epoch = u16::from_be_bytes([datagram[3], datagram[4]]);
    let mut seq = [0u8; 8];
    seq[2..].copy_from_slice(&datagram[5..11]);
    (epoch, u64::from_be_bytes(seq))
}

/// Byte-wise XOR "cipher" so MAC ordering tests can corrupt ciphertext
/// deterministically without real key material.
pub struct XorCipher {
    pub key: u8,
}

impl RecordCipher for XorCipher {
    fn mode(&self) -> CipherMode {
        CipherMode::Cbc { iv_len: 0 }
    }

    fn encrypt(
        &mut self,
        _meta: &RecordMeta,
        _explicit_iv_len: usize,
        payload: &mut Buf,
    ) -> Result<(), Error> {
        for byte in payload.iter_mut() {
            *byte ^= self.key;
        }
        Ok(())
    }

    fn decrypt(&mut self, _meta: &RecordMeta, payload: &mut Buf, _mac_len: usize) -> DecryptOutcome {
        for byte in payload.iter_mut() {
            *byte ^= self.key;
        }
        DecryptOutcome::Ok
    }
}

/// Tiny keyed checksum standing in for a real record MAC.
pub struct SumMac {
    pub key: u8,
}

impl RecordMac for SumMac {
    fn mac_len(&self) -> usize {
        4
    }

    fn compute(&mut self, meta: &RecordMeta, payload: &[u8]) -> ArrayVec<u8, MAX_MD_SIZE> {
        let header = meta.header_bytes(payload.len() as u16);
        let mut sum = u32::from(self.key);
        for byte in header.iter().chain(payload) {
            sum = sum.wrapping_mul(31).wrapping_add(u32::from(*byte));
        }

        let mut out = ArrayVec::new();
        out.try_extend_from_slice(&sum.to_be_bytes()).unwrap();
        out
    }
}

/// Copy-through compression whose decompression can be made to fail on
/// demand.
pub struct TestCompression {
    pub fail_decompress: bool,
}

impl TestCompression {
    pub fn passthrough() -> Self {
        TestCompression {
            fail_decompress: false,
        }
    }
}

impl Compression for TestCompression {
    fn compress(&mut self, input: &[u8], out: &mut Buf) -> Result<(), Error> {
        out.extend_from_slice(input);
        Ok(())
    }

    fn decompress(&mut self, input: &[u8], out: &mut Buf, max_len: usize) -> Result<(), Error> {
        if self.fail_decompress || input.len() > max_len {
            return Err(Error::CryptoError("inflate failed".to_string()));
        }

        out.extend_from_slice(input);
        Ok(())
    }
}

/// Wraps a [`MemoryTransport`] and reports would-block for the first
/// `block_sends` send attempts.
pub struct FlakyTransport {
    pub wire: MemoryTransport,
    pub block_sends: usize,
}

impl Transport for FlakyTransport {
    fn recv(&mut self, into: &mut Buf) -> Result<ReadOutcome, Error> {
        self.wire.recv(into)
    }

    fn send(&mut self, datagram: &[u8]) -> Result<WriteOutcome, Error> {
        if self.block_sends > 0 {
            self.block_sends -= 1;
            return Ok(WriteOutcome::WouldBlock);
        }
        self.wire.send(datagram)
    }
}

/// A transport that claims reliable ordered delivery (SCTP-style).
pub struct OrderedTransport {
    pub wire: MemoryTransport,
}

impl Transport for OrderedTransport {
    fn recv(&mut self, into: &mut Buf) -> Result<ReadOutcome, Error> {
        self.wire.recv(into)
    }

    fn send(&mut self, datagram: &[u8]) -> Result<WriteOutcome, Error> {
        self.wire.send(datagram)
    }

    fn reliable_ordered(&self) -> bool {
        true
    }
}
