// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! C1 spike dump file: header followed by a single record

use crate::format::{
    decode_payload, encode_payload, header_bytes, read_header, scan_records, write_record,
    MAGIC_LEN,
};
use crate::{default_flags, Result, SerializationError};
use hmax_structures::C1SpikeDump;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use tracing::info;

const MAGIC: &[u8; MAGIC_LEN] = b"HMAXC";

/// Save a validated C1 spike dump
pub fn save_c1_dump<P: AsRef<Path>>(dump: &C1SpikeDump, path: P) -> Result<()> {
    dump.validate()?;
    let flags = default_flags();
    let payload = encode_payload(dump, flags)?;

    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    writer.write_all(&header_bytes(MAGIC, flags))?;
    write_record(&mut writer, &payload)?;
    writer.flush()?;
    Ok(())
}

/// Load a C1 spike dump and validate its shapes
pub fn load_c1_dump<P: AsRef<Path>>(path: P) -> Result<C1SpikeDump> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let flags = read_header(&mut file, MAGIC)?;
    let mut body = Vec::new();
    file.read_to_end(&mut body)?;

    let scan = scan_records(&body)?;
    let range = match (scan.payloads.first(), scan.torn_tail) {
        (Some(range), false) => range.clone(),
        _ => return Err(SerializationError::TruncatedRecord { record: 0 }),
    };

    let dump: C1SpikeDump = decode_payload(&body[range], flags)?;
    dump.validate()?;
    info!(
        target: "hmax-serialization",
        "Loaded C1 dump {} ({} scales, {} layers)",
        path.display(),
        dump.scales.len(),
        dump.layer_count()
    );
    Ok(dump)
}
