//! Binary framing for encrypted log files.
//!
//! An encrypted log is the version byte `'A'` followed by records:
//!
//! ```text
//! +---------+----------------------+-----------------+
//! | type u8 | length u24 (BE)      | payload         |
//! +---------+----------------------+-----------------+
//! ```
//!
//! `type` is [`RecordType::Json`] (an AES-encrypted entry) or
//! [`RecordType::SymKey`] (an RSA-wrapped AES key that applies to every
//! following Json record until the next SymKey record).

use std::fmt;
use std::io::{self, Read, Write};

use crate::error::{OwlError, Result};

/// Format version written as the first byte of every encrypted log.
pub const FORMAT_VERSION: u8 = b'A';

/// Largest payload a u24 length field can describe.
pub const MAX_RECORD_LEN: usize = 0xFF_FFFF;

/// Type byte plus the three length bytes.
pub const RECORD_HEADER_LEN: usize = 4;

/// Record payload kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordType {
    Json = 0,
    SymKey = 1,
}

impl RecordType {
    /// Map a type byte to a known record type.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(RecordType::Json),
            1 => Some(RecordType::SymKey),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Json => write!(f, "json"),
            RecordType::SymKey => write!(f, "symkey"),
        }
    }
}

/// One framed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub kind: RecordType,
    pub payload: Vec<u8>,
}

/// Write the version byte that starts a new encrypted log.
pub fn write_version<W: Write>(writer: &mut W) -> Result<()> {
    writer.write_all(&[FORMAT_VERSION])?;
    Ok(())
}

/// Read and check the version byte.
///
/// # Errors
///
/// Returns `OwlError::Format` for an empty stream or any byte other than
/// [`FORMAT_VERSION`].
pub fn read_version<R: Read>(reader: &mut R) -> Result<()> {
    let mut byte = [0u8; 1];
    if read_up_to(reader, &mut byte)? == 0 {
        return Err(OwlError::Format(
            "missing version byte (empty stream)".to_string(),
        ));
    }
    if byte[0] != FORMAT_VERSION {
        return Err(OwlError::Format(format!(
            "unsupported format version {:#04x}, expected {:#04x} ('{}')",
            byte[0], FORMAT_VERSION, FORMAT_VERSION as char
        )));
    }
    Ok(())
}

/// Encode a record header and payload into one buffer.
///
/// # Errors
///
/// Returns `OwlError::Format` when the payload exceeds [`MAX_RECORD_LEN`].
pub fn encode_record(kind: RecordType, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MAX_RECORD_LEN {
        return Err(OwlError::Format(format!(
            "data exceeds supported length ({} > {} bytes)",
            payload.len(),
            MAX_RECORD_LEN
        )));
    }

    let len = payload.len() as u32;
    let mut buffer = Vec::with_capacity(RECORD_HEADER_LEN + payload.len());
    buffer.push(kind.as_byte());
    buffer.extend_from_slice(&len.to_be_bytes()[1..]);
    buffer.extend_from_slice(payload);
    Ok(buffer)
}

/// Append one record with a single `write_all`.
///
/// On an append-mode handle this keeps the header and payload together
/// even with other appenders on the same file.
pub fn write_record<W: Write>(writer: &mut W, kind: RecordType, payload: &[u8]) -> Result<()> {
    let buffer = encode_record(kind, payload)?;
    writer.write_all(&buffer)?;
    Ok(())
}

/// Read the next record from a stream positioned at a record boundary.
///
/// Returns `Ok(None)` at a clean end of stream.
pub fn read_record<R: Read>(reader: &mut R) -> Result<Option<Record>> {
    RecordReader::new(reader).next_record()
}

/// Streaming record reader that keeps track of the byte offset.
pub struct RecordReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> RecordReader<R> {
    /// Wrap a stream whose next byte is at offset 0.
    pub fn new(inner: R) -> Self {
        Self::with_position(inner, 0)
    }

    /// Wrap a stream whose next byte is at `position`.
    pub fn with_position(inner: R, position: u64) -> Self {
        Self { inner, position }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read and check the version byte.
    pub fn read_version(&mut self) -> Result<()> {
        read_version(&mut self.inner)?;
        self.position += 1;
        Ok(())
    }

    /// Read the next record.
    ///
    /// # Errors
    ///
    /// - `OwlError::TruncatedRecord` if the header or payload is cut short
    /// - `OwlError::UnknownRecordType` for an unrecognised type byte
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        let start = self.position;

        let mut header = [0u8; RECORD_HEADER_LEN];
        let got = read_up_to(&mut self.inner, &mut header)?;
        self.position += got as u64;
        if got == 0 {
            return Ok(None);
        }
        if got < RECORD_HEADER_LEN {
            return Err(OwlError::TruncatedRecord {
                offset: start,
                needed: RECORD_HEADER_LEN - got,
            });
        }

        let kind = RecordType::from_byte(header[0]).ok_or(OwlError::UnknownRecordType {
            byte: header[0],
            offset: start,
        })?;
        let len = u32::from_be_bytes([0, header[1], header[2], header[3]]) as usize;

        let mut payload = vec![0u8; len];
        let got = read_up_to(&mut self.inner, &mut payload)?;
        self.position += got as u64;
        if got < len {
            return Err(OwlError::TruncatedRecord {
                offset: start,
                needed: len - got,
            });
        }

        Ok(Some(Record { kind, payload }))
    }
}

/// Fill as much of `buf` as the stream allows, returning the byte count.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_layout_is_big_endian() {
        let payload = vec![0xEEu8; 0x01_0203];
        let encoded = encode_record(RecordType::SymKey, &payload).unwrap();

        assert_eq!(&encoded[..4], &[1, 0x01, 0x02, 0x03]);
        assert_eq!(encoded.len(), 4 + payload.len());
    }

    #[test]
    fn test_write_then_read_records() {
        let mut buffer = Vec::new();
        write_version(&mut buffer).unwrap();
        write_record(&mut buffer, RecordType::SymKey, b"wrapped key").unwrap();
        write_record(&mut buffer, RecordType::Json, b"entry one").unwrap();
        write_record(&mut buffer, RecordType::Json, b"").unwrap();

        let mut reader = RecordReader::new(Cursor::new(buffer));
        reader.read_version().unwrap();

        let first = reader.next_record().unwrap().unwrap();
        assert_eq!(first.kind, RecordType::SymKey);
        assert_eq!(first.payload, b"wrapped key");

        let second = reader.next_record().unwrap().unwrap();
        assert_eq!(second.kind, RecordType::Json);
        assert_eq!(second.payload, b"entry one");

        let third = reader.next_record().unwrap().unwrap();
        assert!(third.payload.is_empty());

        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn test_max_length_boundary() {
        let at_limit = vec![0u8; MAX_RECORD_LEN];
        let encoded = encode_record(RecordType::Json, &at_limit).unwrap();
        assert_eq!(&encoded[1..4], &[0xFF, 0xFF, 0xFF]);

        let over = vec![0u8; MAX_RECORD_LEN + 1];
        let err = encode_record(RecordType::Json, &over).unwrap_err();
        assert!(err.to_string().contains("exceeds supported length"));

        let mut sink = Vec::new();
        assert!(write_record(&mut sink, RecordType::Json, &over).is_err());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_version_checks() {
        assert!(read_version(&mut Cursor::new(b"A")).is_ok());

        let err = read_version(&mut Cursor::new(b"B")).unwrap_err();
        assert!(matches!(err, OwlError::Format(_)));

        let err = read_version(&mut Cursor::new(Vec::<u8>::new())).unwrap_err();
        assert!(err.to_string().contains("missing version byte"));
    }

    #[test]
    fn test_truncated_header() {
        let mut reader = RecordReader::new(Cursor::new(vec![0u8, 0]));
        let err = reader.next_record().unwrap_err();
        assert!(matches!(
            err,
            OwlError::TruncatedRecord { offset: 0, needed: 2 }
        ));
    }

    #[test]
    fn test_truncated_payload() {
        let mut bytes = encode_record(RecordType::Json, b"0123456789").unwrap();
        bytes.truncate(bytes.len() - 3);

        let err = read_record(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(
            err,
            OwlError::TruncatedRecord { offset: 0, needed: 3 }
        ));
    }

    #[test]
    fn test_unknown_record_type() {
        let mut buffer = Vec::new();
        write_version(&mut buffer).unwrap();
        write_record(&mut buffer, RecordType::Json, b"ok").unwrap();
        buffer.extend_from_slice(&[7, 0, 0, 0]);

        let mut reader = RecordReader::new(Cursor::new(buffer));
        reader.read_version().unwrap();
        reader.next_record().unwrap();

        let err = reader.next_record().unwrap_err();
        assert!(matches!(
            err,
            OwlError::UnknownRecordType { byte: 7, offset: 7 }
        ));
        assert!(err.is_format());
    }

    #[test]
    fn test_positions_track_record_starts() {
        let mut buffer = Vec::new();
        write_version(&mut buffer).unwrap();
        write_record(&mut buffer, RecordType::SymKey, &[0u8; 10]).unwrap();
        write_record(&mut buffer, RecordType::Json, &[0u8; 5]).unwrap();

        let mut reader = RecordReader::new(Cursor::new(buffer));
        reader.read_version().unwrap();
        assert_eq!(reader.position(), 1);
        reader.next_record().unwrap();
        assert_eq!(reader.position(), 15);
        reader.next_record().unwrap();
        assert_eq!(reader.position(), 24);
    }
}
