//! AES-GCM record cipher (RFC 5288 applied over DTLS).
//!
//! The record fragment on the wire is:
//! `8-byte explicit nonce || ciphertext || 16-byte GCM tag`.

use aes_gcm::aead::{AeadInPlace, Buffer as AeadBuffer, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;

use super::{CipherMode, DecryptOutcome, RecordCipher, RecordMeta};
use crate::buffer::Buf;
use crate::Error;

/// Explicit nonce length transmitted with each record.
pub(crate) const EXPLICIT_NONCE_LEN: usize = 8;

/// GCM authentication tag length.
pub(crate) const GCM_TAG_LEN: usize = 16;

/// Per-record expansion: explicit nonce plus tag.
pub(crate) const AEAD_OVERHEAD: usize = EXPLICIT_NONCE_LEN + GCM_TAG_LEN;

enum Inner {
    Aes128(Aes128Gcm),
    Aes256(Aes256Gcm),
}

/// AES-128/256-GCM for DTLS records.
///
/// Holds one direction's write key and the 4-byte fixed IV ("salt") from
/// the key block; the remaining 8 nonce bytes travel with each record.
pub struct AesGcmRecordCipher {
    inner: Inner,
    iv: [u8; 4],
}

impl AesGcmRecordCipher {
    /// Create from keying material: a 16 or 32 byte key and the 4-byte
    /// fixed IV.
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self, Error> {
        let inner = match key.len() {
            16 => {
                let cipher = Aes128Gcm::new_from_slice(key)
                    .map_err(|_| Error::CryptoError("bad AES-128-GCM key".to_string()))?;
                Inner::Aes128(cipher)
            }
            32 => {
                let cipher = Aes256Gcm::new_from_slice(key)
                    .map_err(|_| Error::CryptoError("bad AES-256-GCM key".to_string()))?;
                Inner::Aes256(cipher)
            }
            n => {
                return Err(Error::CryptoError(format!(
                    "invalid AES-GCM key size: {}",
                    n
                )))
            }
        };

        let iv = iv
            .try_into()
            .map_err(|_| Error::CryptoError("AES-GCM fixed IV must be 4 bytes".to_string()))?;

        Ok(AesGcmRecordCipher { inner, iv })
    }

    fn nonce(&self, explicit: &[u8]) -> [u8; 12] {
        let mut nonce = [0u8; 12];
        nonce[..4].copy_from_slice(&self.iv);
        nonce[4..].copy_from_slice(explicit);
        nonce
    }
}

impl RecordCipher for AesGcmRecordCipher {
    fn mode(&self) -> CipherMode {
        CipherMode::Gcm
    }

    fn encrypt(
        &mut self,
        meta: &RecordMeta,
        explicit_iv_len: usize,
        payload: &mut Buf,
    ) -> Result<(), Error> {
        if explicit_iv_len != EXPLICIT_NONCE_LEN || payload.len() < explicit_iv_len {
            return Err(Error::CryptoError(
                "AES-GCM needs an 8-byte explicit nonce reservation".to_string(),
            ));
        }

        OsRng.fill_bytes(&mut payload[..EXPLICIT_NONCE_LEN]);
        let nonce = self.nonce(&payload[..EXPLICIT_NONCE_LEN]);

        // AAD carries the plaintext length (DTLSCompressed.length).
        let plain_len = (payload.len() - EXPLICIT_NONCE_LEN) as u16;
        let aad = meta.header_bytes(plain_len);

        let mut tail = Tail {
            buf: &mut *payload,
            start: EXPLICIT_NONCE_LEN,
        };

        let result = match &self.inner {
            Inner::Aes128(cipher) => {
                cipher.encrypt_in_place(Nonce::from_slice(&nonce), &aad, &mut tail)
            }
            Inner::Aes256(cipher) => {
                cipher.encrypt_in_place(Nonce::from_slice(&nonce), &aad, &mut tail)
            }
        };

        result.map_err(|_| Error::CryptoError("AES-GCM encryption failed".to_string()))
    }

    fn decrypt(&mut self, meta: &RecordMeta, payload: &mut Buf, _mac_len: usize) -> DecryptOutcome {
        if payload.len() < AEAD_OVERHEAD {
            return DecryptOutcome::Silent;
        }

        let nonce = self.nonce(&payload[..EXPLICIT_NONCE_LEN]);
        let plain_len = (payload.len() - AEAD_OVERHEAD) as u16;
        let aad = meta.header_bytes(plain_len);

        let mut tail = Tail {
            buf: &mut *payload,
            start: EXPLICIT_NONCE_LEN,
        };

        let result = match &self.inner {
            Inner::Aes128(cipher) => {
                cipher.decrypt_in_place(Nonce::from_slice(&nonce), &aad, &mut tail)
            }
            Inner::Aes256(cipher) => {
                cipher.decrypt_in_place(Nonce::from_slice(&nonce), &aad, &mut tail)
            }
        };

        if result.is_err() {
            return DecryptOutcome::Silent;
        }

        let _ = payload.drain(..EXPLICIT_NONCE_LEN);
        DecryptOutcome::Ok
    }
}

/// View of a [`Buf`] from `start` onward, so the AEAD operates past the
/// explicit nonce without copying.
struct Tail<'a> {
    buf: &'a mut Buf,
    start: usize,
}

impl AsRef<[u8]> for Tail<'_> {
    fn as_ref(&self) -> &[u8] {
        &self.buf[self.start..]
    }
}

impl AsMut<[u8]> for Tail<'_> {
    fn as_mut(&mut self) -> &mut [u8] {
        let start = self.start;
        &mut self.buf[start..]
    }
}

impl AeadBuffer for Tail<'_> {
    fn extend_from_slice(&mut self, other: &[u8]) -> aes_gcm::aead::Result<()> {
        self.buf.extend_from_slice(other);
        Ok(())
    }

    fn truncate(&mut self, len: usize) {
        self.buf.truncate(self.start + len);
    }
}
