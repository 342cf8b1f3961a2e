// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use hmax_structures::StructureError;
use thiserror::Error;

/// Checkpoint and dump I/O errors
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: u32,
        expected_version: u32,
    },

    #[error("Invalid magic number: expected {expected}, got {found:?}")]
    InvalidMagic {
        expected: &'static str,
        found: [u8; 5],
    },

    #[error("Checksum mismatch in record {record}: file is corrupted")]
    ChecksumMismatch { record: usize },

    #[error("Record {record} is incomplete")]
    TruncatedRecord { record: usize },

    #[error("Record encoded with flags {record:#04x} cannot be appended to a file with flags {file:#04x}")]
    FlagMismatch { file: u8, record: u8 },

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Invalid content: {0}")]
    Structure(#[from] StructureError),
}

pub type Result<T> = std::result::Result<T, SerializationError>;
