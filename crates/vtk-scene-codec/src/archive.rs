// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Single-array archive format.
//!
//! A payload travels as base64 text wrapping a zip archive. The archive holds
//! one deflated entry at `data/<hash>` whose bytes are the raw array buffer.

use std::io::{Cursor, Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::DecodeError;

/// Path of the entry holding `hash` inside its archive.
pub fn archive_entry_path(hash: &str) -> String {
    format!("data/{hash}")
}

/// Decode a base64 archive blob and extract the buffer stored for `hash`.
pub fn decode_array_archive(hash: &str, blob: &str) -> Result<Vec<u8>, DecodeError> {
    let raw = STANDARD.decode(blob.trim())?;
    let mut archive = ZipArchive::new(Cursor::new(raw))?;
    let path = archive_entry_path(hash);
    let mut entry = match archive.by_name(&path) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Err(DecodeError::MissingEntry { path }),
        Err(err) => return Err(err.into()),
    };
    let mut out = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
    entry.read_to_end(&mut out)?;
    Ok(out)
}

/// Build the base64 archive blob carrying `bytes` under `hash`.
pub fn encode_array_archive(hash: &str, bytes: &[u8]) -> Result<String, DecodeError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    writer.start_file(archive_entry_path(hash), options)?;
    writer.write_all(bytes)?;
    let cursor = writer.finish()?;
    Ok(STANDARD.encode(cursor.into_inner()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn encoded_archive_decodes_back() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let blob = encode_array_archive("abc_1024Float32Array", &payload).unwrap();
        let out = decode_array_archive("abc_1024Float32Array", &blob).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn wrong_hash_is_missing_entry() {
        let blob = encode_array_archive("left", b"1234").unwrap();
        match decode_array_archive("right", &blob) {
            Err(DecodeError::MissingEntry { path }) => assert_eq!(path, "data/right"),
            other => unreachable!("unexpected {other:?}"),
        }
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            decode_array_archive("h", "***not base64***"),
            Err(DecodeError::Base64(_))
        ));
        let not_zip = STANDARD.encode(b"plain bytes, no archive here");
        assert!(matches!(
            decode_array_archive("h", &not_zip),
            Err(DecodeError::Archive(_))
        ));
    }
}
