//! RESP v2 wire codec.
//!
//! The parser reads exactly one top-level frame per call from a growable
//! byte buffer. Partial frames leave the buffer untouched and report
//! [`RespError::Incomplete`] so the connection loop can read more bytes
//! before retrying.

use bytes::{Buf, BytesMut};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RespError {
    #[error("incomplete frame")]
    Incomplete,
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
    #[error("unknown RESP type prefix")]
    UnknownPrefix,
    #[error("invalid length prefix")]
    InvalidLength,
    #[error("bulk string length mismatch")]
    BulkLengthMismatch,
    #[error("failed to parse integer")]
    FailedToParseInteger,
}

impl RespError {
    /// True for errors that mean "wait for more bytes" rather than
    /// "the frame is garbage".
    pub fn is_incomplete(&self) -> bool {
        *self == RespError::Incomplete
    }
}

/// A decoded RESP frame.
///
/// Bulk payloads are carried as `String`; UTF-8 validation happens once at
/// the parser boundary. Length prefixes are emitted as byte lengths, so any
/// payload that enters the system round-trips exactly.
#[derive(Debug, PartialEq, Clone)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(String),
    NullBulkString,
    Array(Vec<RespValue>),
    NullArray,
}

impl RespValue {
    /// Reads one top-level frame from `buffer`.
    ///
    /// Bytes are consumed only when a complete frame was decoded;
    /// [`RespError::Incomplete`] leaves the buffer as-is.
    pub fn parse(buffer: &mut BytesMut) -> Result<RespValue, RespError> {
        let mut pos = 0;
        let value = Self::parse_at(buffer, &mut pos)?;
        buffer.advance(pos);
        Ok(value)
    }

    fn parse_at(buffer: &BytesMut, pos: &mut usize) -> Result<RespValue, RespError> {
        let line = read_line(buffer, pos)?;
        let line = std::str::from_utf8(line).map_err(|_| RespError::InvalidUtf8)?;

        let Some(prefix) = line.chars().next() else {
            return Err(RespError::UnknownPrefix);
        };
        let payload = &line[prefix.len_utf8()..];

        match prefix {
            '+' => Ok(RespValue::SimpleString(payload.to_string())),
            '-' => Ok(RespValue::Error(payload.to_string())),
            ':' => {
                let value = payload
                    .parse::<i64>()
                    .map_err(|_| RespError::FailedToParseInteger)?;
                Ok(RespValue::Integer(value))
            }
            '$' => Self::parse_bulk_string(buffer, pos, payload),
            '*' => Self::parse_array(buffer, pos, payload),
            _ => Err(RespError::UnknownPrefix),
        }
    }

    fn parse_bulk_string(
        buffer: &BytesMut,
        pos: &mut usize,
        length_prefix: &str,
    ) -> Result<RespValue, RespError> {
        let length = parse_length(length_prefix)?;

        let Some(length) = length else {
            return Ok(RespValue::NullBulkString);
        };

        // Payload is length-delimited, not line-delimited: the bytes plus the
        // trailing CRLF must all be present before anything is consumed.
        if buffer.len() < *pos + length + 2 {
            return Err(RespError::Incomplete);
        }

        let payload = &buffer[*pos..*pos + length];
        let terminator = &buffer[*pos + length..*pos + length + 2];

        if terminator != b"\r\n" {
            return Err(RespError::BulkLengthMismatch);
        }

        let content = std::str::from_utf8(payload).map_err(|_| RespError::InvalidUtf8)?;
        *pos += length + 2;

        Ok(RespValue::BulkString(content.to_string()))
    }

    fn parse_array(
        buffer: &BytesMut,
        pos: &mut usize,
        length_prefix: &str,
    ) -> Result<RespValue, RespError> {
        let length = parse_length(length_prefix)?;

        let Some(length) = length else {
            return Ok(RespValue::NullArray);
        };

        let mut elements = Vec::with_capacity(length.min(64));

        while elements.len() < length {
            elements.push(Self::parse_at(buffer, pos)?);
        }

        Ok(RespValue::Array(elements))
    }

    /// Encodes this value into its exact wire representation.
    pub fn encode(&self) -> String {
        match self {
            RespValue::SimpleString(content) => format!("+{}\r\n", content),
            RespValue::Error(message) => format!("-{}\r\n", message),
            RespValue::Integer(value) => format!(":{}\r\n", value),
            RespValue::BulkString(content) => {
                format!("${}\r\n{}\r\n", content.len(), content)
            }
            RespValue::NullBulkString => "$-1\r\n".to_string(),
            RespValue::NullArray => "*-1\r\n".to_string(),
            RespValue::Array(elements) => {
                let mut encoded = format!("*{}\r\n", elements.len());
                for element in elements {
                    encoded.push_str(&element.encode());
                }
                encoded
            }
        }
    }

    /// Encodes a flat array of bulk strings, the most common reply shape.
    pub fn encode_array_from_strings(values: Vec<String>) -> String {
        RespValue::Array(values.into_iter().map(RespValue::BulkString).collect()).encode()
    }
}

/// Parses a decimal length prefix. `-1` is the null sentinel; any other
/// negative value is malformed.
fn parse_length(prefix: &str) -> Result<Option<usize>, RespError> {
    let length = prefix
        .parse::<i64>()
        .map_err(|_| RespError::InvalidLength)?;

    match length {
        -1 => Ok(None),
        n if n < 0 => Err(RespError::InvalidLength),
        n => Ok(Some(n as usize)),
    }
}

fn read_line<'a>(buffer: &'a BytesMut, pos: &mut usize) -> Result<&'a [u8], RespError> {
    let window = &buffer[*pos..];

    match window.windows(2).position(|bytes| bytes == b"\r\n") {
        Some(index) => {
            let line = &buffer[*pos..*pos + index];
            *pos += index + 2;
            Ok(line)
        }
        None => Err(RespError::Incomplete),
    }
}
