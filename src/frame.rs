//! Length-prefixed frame codec
//!
//! Every message on the wire is a fixed-size header followed by the payload:
//!
//! ```text
//! ┌───────────────────────────────────┬──────────────────────┐
//! │ Header (64B)                      │ Payload              │
//! │ ASCII decimal length, space-padded│ (length bytes UTF-8) │
//! └───────────────────────────────────┴──────────────────────┘
//! ```
//!
//! There is no delimiter. Readers always consume the header, then exactly the
//! declared number of payload bytes; each read waits until its full byte count
//! is available or the stream closes.

use std::io::ErrorKind;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::FrameError;

/// Header size in bytes
pub const HEADER_SIZE: usize = 64;

/// Default maximum accepted payload size: 16 MiB
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Encode a payload into a complete frame
///
/// Fails with `HeaderOverflow` rather than truncating the length digits.
pub fn encode(payload: &str) -> Result<Vec<u8>, FrameError> {
    encode_with_header(payload, HEADER_SIZE)
}

fn encode_with_header(payload: &str, header_size: usize) -> Result<Vec<u8>, FrameError> {
    let length = payload.len();
    let digits = length.to_string();
    if digits.len() > header_size {
        return Err(FrameError::HeaderOverflow {
            length,
            capacity: header_size,
        });
    }

    let mut frame = Vec::with_capacity(header_size + length);
    frame.extend_from_slice(digits.as_bytes());
    frame.resize(header_size, b' ');
    frame.extend_from_slice(payload.as_bytes());
    Ok(frame)
}

/// Parse a raw header into the payload length it declares
///
/// Trailing whitespace is stripped; what remains must be a non-empty run of
/// ASCII digits.
pub fn parse_header(header: &[u8]) -> Result<usize, FrameError> {
    let text = String::from_utf8_lossy(header);
    let digits = text.trim_end();

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FrameError::InvalidHeader(digits.to_string()));
    }

    digits
        .parse::<usize>()
        .map_err(|_| FrameError::InvalidHeader(digits.to_string()))
}

/// Read exactly one header from the stream and return the payload length
pub async fn decode_header<R>(reader: &mut R) -> Result<usize, FrameError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut header = [0u8; HEADER_SIZE];
    match reader.read_exact(&mut header).await {
        Ok(_) => parse_header(&header),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(FrameError::ConnectionClosed),
        Err(e) => Err(e.into()),
    }
}

/// Read exactly `length` payload bytes and decode them as UTF-8
pub async fn decode_payload<R>(reader: &mut R, length: usize) -> Result<String, FrameError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut payload = vec![0u8; length];
    match reader.read_exact(&mut payload).await {
        Ok(_) => Ok(String::from_utf8(payload)?),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            Err(FrameError::Truncated { expected: length })
        }
        Err(e) => Err(e.into()),
    }
}

/// Read one complete frame (header, then payload)
///
/// Headers declaring more than `max_payload` bytes are rejected before any
/// payload buffer is allocated.
pub async fn read_frame<R>(reader: &mut R, max_payload: usize) -> Result<String, FrameError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let length = decode_header(reader).await?;
    if length > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: length,
            max: max_payload,
        });
    }
    decode_payload(reader, length).await
}

/// Encode and write one complete frame
pub async fn write_frame<W>(writer: &mut W, payload: &str) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let frame = encode(payload)?;
    writer.write_all(&frame).await?;
    Ok(())
}
