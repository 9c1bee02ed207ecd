//! HMAC record MACs for HMAC-based cipher suites.

use arrayvec::ArrayVec;
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384};

use super::{RecordMac, RecordMeta};
use crate::message::MAX_MD_SIZE;
use crate::Error;

type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;

/// HMAC-SHA256/384 record MAC for one direction.
pub enum HmacMac {
    /// HMAC-SHA256, 32-byte digest.
    Sha256(HmacSha256),
    /// HMAC-SHA384, 48-byte digest.
    Sha384(HmacSha384),
}

impl HmacMac {
    /// Create an HMAC-SHA256 record MAC from the MAC key.
    pub fn sha256(key: &[u8]) -> Result<Self, Error> {
        HmacSha256::new_from_slice(key)
            .map(HmacMac::Sha256)
            .map_err(|_| Error::CryptoError("bad HMAC-SHA256 key".to_string()))
    }

    /// Create an HMAC-SHA384 record MAC from the MAC key.
    pub fn sha384(key: &[u8]) -> Result<Self, Error> {
        HmacSha384::new_from_slice(key)
            .map(HmacMac::Sha384)
            .map_err(|_| Error::CryptoError("bad HMAC-SHA384 key".to_string()))
    }
}

impl RecordMac for HmacMac {
    fn mac_len(&self) -> usize {
        match self {
            HmacMac::Sha256(_) => 32,
            HmacMac::Sha384(_) => 48,
        }
    }

    fn compute(&mut self, meta: &RecordMeta, payload: &[u8]) -> ArrayVec<u8, MAX_MD_SIZE> {
        let header = meta.header_bytes(payload.len() as u16);
        let mut out = ArrayVec::new();

        match self {
            HmacMac::Sha256(keyed) => {
                let mut mac = keyed.clone();
                mac.update(&header);
                mac.update(payload);
                // 32 bytes, always fits MAX_MD_SIZE
                out.try_extend_from_slice(&mac.finalize().into_bytes()).unwrap();
            }
            HmacMac::Sha384(keyed) => {
                let mut mac = keyed.clone();
                mac.update(&header);
                mac.update(payload);
                // 48 bytes, always fits MAX_MD_SIZE
                out.try_extend_from_slice(&mac.finalize().into_bytes()).unwrap();
            }
        }

        out
    }
}
