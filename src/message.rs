//! Record wire format: content types, protocol versions, the 13-byte
//! header and the size limits that govern it.

use nom::number::complete::{be_u16, be_u8};
use nom::IResult;

use crate::buffer::Buf;
use crate::seq::Sequence;
use crate::util::be_u48;

/// Largest plaintext fragment a record may carry.
pub const MAX_PLAIN_LENGTH: usize = 16_384;

/// Largest compressed fragment (plaintext plus 1 KiB expansion allowance).
pub const MAX_COMPRESSED_LENGTH: usize = MAX_PLAIN_LENGTH + 1024;

/// Largest encrypted fragment (plaintext plus 2 KiB cipher expansion
/// allowance).
pub const MAX_ENCRYPTED_LENGTH: usize = MAX_PLAIN_LENGTH + 2048;

/// Largest digest any record MAC can produce.
pub const MAX_MD_SIZE: usize = 64;

/// Worst-case per-record cipher and MAC expansion, used to sanity-bound
/// incoming lengths against the negotiated maximum fragment size.
pub const MAX_ENCRYPTED_OVERHEAD: usize = 256 + MAX_MD_SIZE;

/// DTLS record content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// Change cipher spec (20).
    ChangeCipherSpec,
    /// Alert (21).
    Alert,
    /// Handshake (22).
    Handshake,
    /// Application data (23).
    ApplicationData,
    /// Anything else. The record layer carries unknown types; rejecting
    /// them is the caller's decision.
    Unknown(u8),
}

impl ContentType {
    /// Map from the wire byte.
    pub fn from_u8(value: u8) -> Self {
        match value {
            20 => ContentType::ChangeCipherSpec,
            21 => ContentType::Alert,
            22 => ContentType::Handshake,
            23 => ContentType::ApplicationData,
            _ => ContentType::Unknown(value),
        }
    }

    /// The wire byte.
    pub fn as_u8(&self) -> u8 {
        match self {
            ContentType::ChangeCipherSpec => 20,
            ContentType::Alert => 21,
            ContentType::Handshake => 22,
            ContentType::ApplicationData => 23,
            ContentType::Unknown(value) => *value,
        }
    }
}

/// DTLS protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    /// DTLS 1.0 (0xFEFF).
    Dtls1_0,
    /// DTLS 1.2 (0xFEFD).
    Dtls1_2,
    /// Version not yet negotiated. Never appears on the wire; a layer in
    /// this state only enforces the DTLS major byte.
    Any,
    /// An unrecognized wire value.
    Unknown(u16),
}

impl ProtocolVersion {
    /// The major byte all DTLS 1.x versions share.
    pub const DTLS_MAJOR: u8 = 0xFE;

    /// Map from the wire value.
    pub fn from_u16(value: u16) -> Self {
        match value {
            0xFEFF => ProtocolVersion::Dtls1_0,
            0xFEFD => ProtocolVersion::Dtls1_2,
            _ => ProtocolVersion::Unknown(value),
        }
    }

    /// The wire value. `Any` serializes as DTLS 1.2 should it ever reach a
    /// header, which negotiation prevents.
    pub fn to_u16(&self) -> u16 {
        match self {
            ProtocolVersion::Dtls1_0 => 0xFEFF,
            ProtocolVersion::Dtls1_2 => 0xFEFD,
            ProtocolVersion::Any => 0xFEFD,
            ProtocolVersion::Unknown(value) => *value,
        }
    }

    /// The major byte of this version.
    pub fn major(&self) -> u8 {
        match self {
            ProtocolVersion::Any => Self::DTLS_MAJOR,
            other => (other.to_u16() >> 8) as u8,
        }
    }
}

/// The fixed 13-byte DTLS record header.
///
/// ```text
/// struct {
///     ContentType type;          // 1
///     ProtocolVersion version;   // 2
///     uint16 epoch;              // 2
///     uint48 sequence_number;    // 6
///     uint16 length;             // 2
/// } DTLSRecordHeader;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RecordHeader {
    pub content_type: ContentType,
    pub version: ProtocolVersion,
    pub sequence: Sequence,
    pub length: u16,
}

impl RecordHeader {
    /// Header length on the wire.
    pub const LEN: usize = 13;

    pub fn parse(input: &[u8]) -> IResult<&[u8], RecordHeader> {
        let (input, content_type) = be_u8(input)?;
        let (input, version) = be_u16(input)?;
        let (input, epoch) = be_u16(input)?;
        let (input, sequence_number) = be_u48(input)?;
        let (input, length) = be_u16(input)?;

        Ok((
            input,
            RecordHeader {
                content_type: ContentType::from_u8(content_type),
                version: ProtocolVersion::from_u16(version),
                sequence: Sequence {
                    epoch,
                    sequence_number,
                },
                length,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Buf) {
        output.push(self.content_type.as_u8());
        output.extend_from_slice(&self.version.to_u16().to_be_bytes());
        output.extend_from_slice(&self.sequence.epoch.to_be_bytes());
        output.extend_from_slice(&self.sequence.sequence_number.to_be_bytes()[2..]);
        output.extend_from_slice(&self.length.to_be_bytes());
    }
}
