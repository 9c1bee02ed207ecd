//! Parser helpers not provided by nom itself.

use nom::error::{make_error, ErrorKind, ParseError};
use nom::{Err, IResult};

/// Parse a big-endian 48-bit unsigned integer.
///
/// DTLS sequence numbers are 6 bytes on the wire; nom only ships power-of
/// two widths.
pub fn be_u48<'a, E: ParseError<&'a [u8]>>(input: &'a [u8]) -> IResult<&'a [u8], u64, E> {
    const BOUND: usize = 6;

    if input.len() < BOUND {
        return Err(Err::Error(make_error(input, ErrorKind::Eof)));
    }

    let mut value = 0u64;
    for byte in &input[..BOUND] {
        value = (value << 8) | u64::from(*byte);
    }

    Ok((&input[BOUND..], value))
}
