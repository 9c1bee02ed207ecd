//! Fatal record layer errors.
//!
//! Only conditions that must surface to the caller live here. Everything
//! DTLS handles by silently discarding a datagram never becomes an
//! `Error`.

use crate::alert::Alert;

/// A fatal record layer failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An encrypt-then-MAC record is shorter than the MAC it must carry.
    LengthTooShort,
    /// MAC mismatch on an encrypt-then-MAC record.
    ///
    /// Unlike MAC-then-encrypt failures, these are not ignored: the packet
    /// was well-formed enough to carry a deliberate forgery.
    BadRecordMac,
    /// A decrypted fragment exceeds the compressed-length bound.
    CompressedLengthTooLong,
    /// The installed compression method failed to inflate a fragment.
    BadDecompression,
    /// A plaintext fragment exceeds the negotiated maximum fragment length.
    DataLengthTooLong,
    /// A write retry did not match the originally attempted write.
    BadWriteRetry,
    /// DTLS emits exactly one record per datagram; the caller passed a
    /// different number of templates.
    BadTemplateCount(usize),
    /// A cipher implementation raised a fatal condition with an explicit
    /// alert.
    CipherFatal(Alert),
    /// Failure inside a cipher, MAC or compression implementation.
    CryptoError(String),
    /// The underlying transport failed hard (not a would-block).
    TransportError(String),
    /// Internal consistency failure.
    InternalError(&'static str),
}

impl Error {
    /// The alert description the caller should emit for this error.
    pub fn alert(&self) -> Alert {
        match self {
            Error::LengthTooShort => Alert::DecodeError,
            Error::BadRecordMac => Alert::BadRecordMac,
            Error::CompressedLengthTooLong => Alert::RecordOverflow,
            Error::BadDecompression => Alert::DecompressionFailure,
            Error::DataLengthTooLong => Alert::RecordOverflow,
            Error::CipherFatal(alert) => *alert,
            Error::BadWriteRetry
            | Error::BadTemplateCount(_)
            | Error::CryptoError(_)
            | Error::TransportError(_)
            | Error::InternalError(_) => Alert::InternalError,
        }
    }
}
