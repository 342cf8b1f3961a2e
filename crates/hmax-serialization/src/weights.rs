// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Append-only weight checkpoint file

use crate::format::{
    decode_payload, encode_payload, frame_record, header_bytes, parse_header, scan_records,
    HEADER_LEN, MAGIC_LEN,
};
use crate::{default_flags, Result, SerializationError};
use hmax_structures::WeightSnapshot;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const MAGIC: &[u8; MAGIC_LEN] = b"HMAXW";

/// A snapshot already framed as a complete checkpoint record.
///
/// Appending one performs no allocation or serialization, only a write and
/// a sync, which makes it usable from a fatal-signal handler.
#[derive(Debug, Clone)]
pub struct EncodedSnapshot {
    epoch: u64,
    flags: u8,
    bytes: Vec<u8>,
}

impl EncodedSnapshot {
    /// Epoch of the encoded snapshot
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// The full record (length, checksum, payload)
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Serialize and frame `snapshot` for a file with the given flags
pub fn encode_record(snapshot: &WeightSnapshot, flags: u8) -> Result<EncodedSnapshot> {
    let payload = encode_payload(snapshot, flags)?;
    Ok(EncodedSnapshot {
        epoch: snapshot.epoch,
        flags,
        bytes: frame_record(&payload),
    })
}

/// Writer holding a checkpoint file open in append mode.
///
/// Existing records are never rewritten. Opening an existing file validates
/// its header and cuts off a torn final record left by an interrupted write.
/// A failed append is cut off the same way before the error is returned, so
/// the file always ends at `committed_len`.
#[derive(Debug)]
pub struct WeightCheckpointWriter {
    file: File,
    path: PathBuf,
    flags: u8,
    records: usize,
    /// File length covering the header and every synced record
    committed_len: u64,
    /// A failed append could not be cut off; retried before the next write
    needs_rollback: bool,
}

impl WeightCheckpointWriter {
    /// Open or create a checkpoint file; new files use [`default_flags`]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_flags(path, default_flags())
    }

    /// Open or create a checkpoint file; `flags` apply only when the file is new
    pub fn open_with_flags<P: AsRef<Path>>(path: P, flags: u8) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;

        let (flags, records, committed_len) = if file.metadata()?.len() == 0 {
            file.write_all(&header_bytes(MAGIC, flags))?;
            file.sync_data()?;
            info!(target: "hmax-serialization", "Created weight checkpoint file {}", path.display());
            (flags, 0, HEADER_LEN as u64)
        } else {
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)?;
            let file_flags = parse_header(&bytes, MAGIC)?;
            let scan = scan_records(&bytes[HEADER_LEN..])?;
            let keep = HEADER_LEN + scan.committed_end;
            if scan.torn_tail {
                warn!(
                    target: "hmax-serialization",
                    "Dropping {} bytes of an incomplete record at the end of {}",
                    bytes.len() - keep,
                    path.display()
                );
                file.set_len(keep as u64)?;
                file.sync_data()?;
            }
            info!(
                target: "hmax-serialization",
                "Appending to weight checkpoint file {} ({} existing records)",
                path.display(),
                scan.payloads.len()
            );
            (file_flags, scan.payloads.len(), keep as u64)
        };

        Ok(Self {
            file,
            path,
            flags,
            records,
            committed_len,
            needs_rollback: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header flags of the open file
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Number of committed records in the file
    pub fn records(&self) -> usize {
        self.records
    }

    /// Encode `snapshot` for this file
    pub fn encode(&self, snapshot: &WeightSnapshot) -> Result<EncodedSnapshot> {
        encode_record(snapshot, self.flags)
    }

    /// Append one snapshot and sync it to disk
    pub fn append(&mut self, snapshot: &WeightSnapshot) -> Result<()> {
        let encoded = self.encode(snapshot)?;
        self.append_encoded(&encoded)?;
        debug!(
            target: "hmax-serialization",
            "Appended checkpoint for epoch {} ({} bytes) to {}",
            snapshot.epoch,
            encoded.as_bytes().len(),
            self.path.display()
        );
        Ok(())
    }

    /// Append a pre-encoded record and sync it to disk. Does not log or allocate.
    ///
    /// On a failed write or sync the partial record is truncated away and the
    /// error returned; earlier records stay loadable.
    pub fn append_encoded(&mut self, encoded: &EncodedSnapshot) -> Result<()> {
        if encoded.flags != self.flags {
            return Err(SerializationError::FlagMismatch {
                file: self.flags,
                record: encoded.flags,
            });
        }
        if self.needs_rollback {
            self.rollback()?;
        }
        if let Err(e) = self.write_synced(&encoded.bytes) {
            self.needs_rollback = true;
            // A failed cut is retried by the next append
            let _ = self.rollback();
            return Err(e.into());
        }
        self.committed_len += encoded.bytes.len() as u64;
        self.records += 1;
        Ok(())
    }

    fn write_synced(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.file.write_all(bytes)?;
        self.file.sync_data()
    }

    /// Truncate back to the last committed record (`ftruncate`, signal-safe)
    fn rollback(&mut self) -> std::io::Result<()> {
        self.file.set_len(self.committed_len)?;
        self.file.sync_data()?;
        self.needs_rollback = false;
        Ok(())
    }
}

/// Load every committed snapshot, oldest first.
///
/// A torn final record is dropped with a warning; corruption anywhere
/// before it is an error.
pub fn load_weight_checkpoints<P: AsRef<Path>>(path: P) -> Result<Vec<WeightSnapshot>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let flags = parse_header(&bytes, MAGIC)?;
    let body = &bytes[HEADER_LEN..];
    let scan = scan_records(body)?;
    if scan.torn_tail {
        warn!(
            target: "hmax-serialization",
            "Ignoring an incomplete final record in {}",
            path.display()
        );
    }

    let snapshots = scan
        .payloads
        .iter()
        .map(|range| decode_payload::<WeightSnapshot>(&body[range.clone()], flags))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        target: "hmax-serialization",
        "Loaded {} weight snapshots from {}",
        snapshots.len(),
        path.display()
    );
    Ok(snapshots)
}
