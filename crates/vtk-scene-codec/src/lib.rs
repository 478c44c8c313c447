// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Array archive codec and batch decode pipeline.
//!
//! This crate provides:
//! - base64 + zip encode/decode for single-array archives (`data/<hash>`)
//! - [`ArrayDecoder`], which decodes an `arrays` map into a
//!   [`ResourceRegistry`](vtk_array_cas::ResourceRegistry) at most once per hash
//!
//! # Design
//!
//! Archive handling is kept apart from the registry so the registry stays
//! format-agnostic, and apart from the views so the pipeline can be driven
//! by any executor.

use thiserror::Error;

mod archive;
mod pipeline;

pub use archive::{archive_entry_path, decode_array_archive, encode_array_archive};
pub use pipeline::{ArrayDecoder, BatchReport};

/// Error decoding one array archive.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The blob is not valid base64.
    #[error("base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The decoded bytes are not a readable zip archive.
    #[error("archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    /// The archive has no entry at the expected path.
    #[error("missing archive entry {path}")]
    MissingEntry {
        /// Path that was looked up.
        path: String,
    },
    /// Reading the entry failed midway.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
