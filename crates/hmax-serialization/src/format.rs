// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Shared header and record framing
//!
//! ```text
//! [Header]
//! - Magic: 5 bytes ("HMAXW" or "HMAXC")
//! - Version: u32 LE
//! - Flags: u8 - bit 0: payloads are LZ4 compressed
//! [Record]*
//! - Length: u64 LE (payload bytes)
//! - Checksum: u64 LE (FNV-1a of payload)
//! - Payload: bincode, or when compressed:
//!   uncompressed size u64 LE followed by the LZ4 block
//! ```

use crate::{Result, SerializationError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::borrow::Cow;
use std::io::{Read, Write};
use std::ops::Range;

/// Current format version (increment when format changes)
pub const FORMAT_VERSION: u32 = 1;

/// Flag bit 0: payloads are LZ4 compressed
pub const FLAG_LZ4: u8 = 0b0000_0001;

pub(crate) const MAGIC_LEN: usize = 5;
pub(crate) const HEADER_LEN: usize = MAGIC_LEN + 4 + 1;
pub(crate) const RECORD_PREFIX_LEN: usize = 16;

/// Flags used for newly created files
pub const fn default_flags() -> u8 {
    if cfg!(feature = "compression") {
        FLAG_LZ4
    } else {
        0
    }
}

pub(crate) fn magic_name(magic: &[u8; MAGIC_LEN]) -> &'static str {
    match magic {
        b"HMAXW" => "HMAXW",
        b"HMAXC" => "HMAXC",
        _ => "unknown",
    }
}

pub(crate) fn header_bytes(magic: &[u8; MAGIC_LEN], flags: u8) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[..MAGIC_LEN].copy_from_slice(magic);
    header[MAGIC_LEN..MAGIC_LEN + 4].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
    header[HEADER_LEN - 1] = flags;
    header
}

/// Read and verify a header; returns its flags
pub(crate) fn read_header<R: Read>(reader: &mut R, magic: &[u8; MAGIC_LEN]) -> Result<u8> {
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header)?;
    parse_header(&header, magic)
}

pub(crate) fn parse_header(header: &[u8], magic: &[u8; MAGIC_LEN]) -> Result<u8> {
    if header.len() < HEADER_LEN {
        return Err(SerializationError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "file is shorter than its header",
        )));
    }
    let mut found = [0u8; MAGIC_LEN];
    found.copy_from_slice(&header[..MAGIC_LEN]);
    if &found != magic {
        return Err(SerializationError::InvalidMagic {
            expected: magic_name(magic),
            found,
        });
    }

    let mut version_bytes = [0u8; 4];
    version_bytes.copy_from_slice(&header[MAGIC_LEN..MAGIC_LEN + 4]);
    let version = u32::from_le_bytes(version_bytes);
    if version != FORMAT_VERSION {
        return Err(SerializationError::VersionMismatch {
            file_version: version,
            expected_version: FORMAT_VERSION,
        });
    }

    Ok(header[HEADER_LEN - 1])
}

/// Serialize `value` into a record payload
pub(crate) fn encode_payload<T: Serialize>(value: &T, flags: u8) -> Result<Vec<u8>> {
    let data =
        bincode::serialize(value).map_err(|e| SerializationError::Serialization(e.to_string()))?;

    if flags & FLAG_LZ4 == 0 {
        return Ok(data);
    }

    #[cfg(feature = "compression")]
    {
        let compressed = lz4::block::compress(&data, None, false)
            .map_err(|e| SerializationError::Compression(e.to_string()))?;
        let mut payload = Vec::with_capacity(8 + compressed.len());
        payload.extend_from_slice(&(data.len() as u64).to_le_bytes());
        payload.extend_from_slice(&compressed);
        Ok(payload)
    }
    #[cfg(not(feature = "compression"))]
    {
        Err(SerializationError::Compression(
            "File is compressed but compression feature is not enabled".to_string(),
        ))
    }
}

/// Deserialize a record payload
pub(crate) fn decode_payload<T: DeserializeOwned>(payload: &[u8], flags: u8) -> Result<T> {
    let data: Cow<'_, [u8]> = if flags & FLAG_LZ4 != 0 {
        Cow::Owned(decompress(payload)?)
    } else {
        Cow::Borrowed(payload)
    };

    bincode::deserialize(&data).map_err(|e| SerializationError::Deserialization(e.to_string()))
}

#[cfg(feature = "compression")]
fn decompress(payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() < 8 {
        return Err(SerializationError::Compression(
            "compressed payload is missing its size prefix".to_string(),
        ));
    }
    let mut size_bytes = [0u8; 8];
    size_bytes.copy_from_slice(&payload[..8]);
    let size = u64::from_le_bytes(size_bytes);
    let size = i32::try_from(size).map_err(|_| {
        SerializationError::Compression(format!("payload of {} bytes is too large", size))
    })?;
    lz4::block::decompress(&payload[8..], Some(size))
        .map_err(|e| SerializationError::Compression(format!("Decompression failed: {}", e)))
}

#[cfg(not(feature = "compression"))]
fn decompress(_payload: &[u8]) -> Result<Vec<u8>> {
    Err(SerializationError::Compression(
        "File is compressed but compression feature is not enabled".to_string(),
    ))
}

/// Frame a payload as a complete record
pub(crate) fn frame_record(payload: &[u8]) -> Vec<u8> {
    let mut record = Vec::with_capacity(RECORD_PREFIX_LEN + payload.len());
    record.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    record.extend_from_slice(&calculate_checksum(payload).to_le_bytes());
    record.extend_from_slice(payload);
    record
}

pub(crate) fn write_record<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    writer.write_all(&frame_record(payload))?;
    Ok(())
}

/// Result of scanning the records that follow a header
#[derive(Debug, Default)]
pub(crate) struct RecordScan {
    /// Payload ranges of committed records, relative to the scanned slice
    pub payloads: Vec<Range<usize>>,
    /// End of the last committed record, relative to the scanned slice
    pub committed_end: usize,
    /// A trailing partial or corrupt record was found after `committed_end`
    pub torn_tail: bool,
}

/// Walk the records of `body` (the bytes after the header).
///
/// A short or corrupt record that ends the data is reported as a torn tail;
/// a corrupt record followed by more data is an error.
pub(crate) fn scan_records(body: &[u8]) -> Result<RecordScan> {
    let mut scan = RecordScan::default();
    let mut offset = 0usize;

    while offset < body.len() {
        let record = scan.payloads.len();
        let remaining = body.len() - offset;
        if remaining < RECORD_PREFIX_LEN {
            scan.torn_tail = true;
            break;
        }

        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&body[offset..offset + 8]);
        let mut checksum_bytes = [0u8; 8];
        checksum_bytes.copy_from_slice(&body[offset + 8..offset + 16]);
        let len = u64::from_le_bytes(len_bytes);
        let expected = u64::from_le_bytes(checksum_bytes);

        let start = offset + RECORD_PREFIX_LEN;
        let available = (body.len() - start) as u64;
        if len > available {
            scan.torn_tail = true;
            break;
        }
        let end = start + len as usize;

        if calculate_checksum(&body[start..end]) != expected {
            if end == body.len() {
                scan.torn_tail = true;
                break;
            }
            return Err(SerializationError::ChecksumMismatch { record });
        }

        scan.payloads.push(start..end);
        scan.committed_end = end;
        offset = end;
    }

    Ok(scan)
}

/// FNV-1a hash of `data`
pub(crate) fn calculate_checksum(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 14695981039346656037;
    const FNV_PRIME: u64 = 1099511628211;

    let mut hash = FNV_OFFSET;
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
