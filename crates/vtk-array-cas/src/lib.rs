// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Content-hash keyed registry of decoded array payloads.
//!
//! `vtk-array-cas` provides [`ResourceRegistry`]: a per-view map from content
//! hash to decoded bytes, plus pending-waiter bookkeeping for consumers that
//! ask for a payload before it has been decoded.
//!
//! # Entry Lifecycle
//!
//! A key moves `absent → pending → settled` exactly once per registry
//! lifetime. Settled means resolved (bytes) or rejected (error); a settled
//! entry never changes again. Every waiter registered while the key was
//! pending receives the same outcome.
//!
//! # Hash Policy
//!
//! Hashes are opaque strings chosen by the producer (digest, element count and
//! element type). The registry never recomputes or verifies them.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod registry;
pub use registry::ResourceRegistry;

use std::borrow::Borrow;
use std::fmt;

/// Content hash naming one array payload.
///
/// Thin newtype over the producer's hash string. Doubles as the registry key
/// and as the archive entry name (`data/<hash>`).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ArrayHash(String);

impl ArrayHash {
    /// Wrap a hash string.
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// View the hash as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArrayHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArrayHash {
    fn from(hash: &str) -> Self {
        Self(hash.to_owned())
    }
}

impl From<String> for ArrayHash {
    fn from(hash: String) -> Self {
        Self(hash)
    }
}

impl Borrow<str> for ArrayHash {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Outcome delivered to a waiter whose payload could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArrayError {
    /// Decoding the payload failed.
    #[error("[ARRAY_DECODE_FAILED] {hash}: {reason}")]
    DecodeFailed {
        /// Hash of the failed payload.
        hash: ArrayHash,
        /// Decoder's error message.
        reason: String,
    },
    /// The registry was dropped while the waiter was pending.
    #[error("[ARRAY_ABANDONED] {hash}: registry dropped before the payload settled")]
    Abandoned {
        /// Hash the waiter asked for.
        hash: ArrayHash,
    },
}

/// Errors reported to whoever tries to settle an entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The entry was already resolved or rejected; it is left unchanged.
    #[error("[ARRAY_ALREADY_SETTLED] {hash}")]
    AlreadySettled {
        /// Hash of the settled entry.
        hash: ArrayHash,
    },
}
