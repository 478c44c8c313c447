// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Batch decode of out-of-band array payloads into a resource registry.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;
use std::sync::Arc;

use futures::future::{join_all, LocalBoxFuture};
use futures::FutureExt;
use tracing::{debug, warn};
use vtk_array_cas::{ArrayHash, ResourceRegistry};

use crate::archive::decode_array_archive;

/// What one batch produced once every decode in it settled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Hashes decoded and registered, in completion order.
    pub processed: Vec<ArrayHash>,
    /// Hashes that failed, with the decoder's message.
    pub failed: Vec<(ArrayHash, String)>,
}

impl BatchReport {
    /// `true` if the batch contained no new hashes.
    pub fn is_empty(&self) -> bool {
        self.processed.is_empty() && self.failed.is_empty()
    }
}

/// Decodes `arrays` maps into a registry, each hash at most once.
///
/// The seen-set is updated synchronously when a batch is *started*, so a
/// second signal carrying the same hashes while the first batch is still in
/// flight starts no duplicate work.
pub struct ArrayDecoder {
    registry: Rc<ResourceRegistry>,
    seen: RefCell<HashSet<ArrayHash>>,
}

impl ArrayDecoder {
    /// Decoder publishing into `registry`.
    pub fn new(registry: Rc<ResourceRegistry>) -> Self {
        Self {
            registry,
            seen: RefCell::new(HashSet::new()),
        }
    }

    /// The registry decoded payloads land in.
    pub fn registry(&self) -> &Rc<ResourceRegistry> {
        &self.registry
    }

    /// `true` if `hash` was already scheduled by an earlier batch.
    pub fn is_seen(&self, hash: &str) -> bool {
        self.seen.borrow().contains(hash)
    }

    /// Start decoding every unseen entry of `arrays` (hash → base64 archive).
    ///
    /// The returned future completes once all decodes of this batch have
    /// settled. A failed decode rejects that hash's waiters and is listed in
    /// [`BatchReport::failed`]; its siblings are unaffected.
    pub fn decode_all(
        &self,
        arrays: &BTreeMap<String, String>,
    ) -> LocalBoxFuture<'static, BatchReport> {
        let mut seen = self.seen.borrow_mut();
        let mut jobs = Vec::new();
        for (key, blob) in arrays {
            let hash = ArrayHash::from(key.as_str());
            if !seen.insert(hash.clone()) {
                continue;
            }
            self.registry.mark_pending(&hash);
            jobs.push(decode_one(Rc::clone(&self.registry), hash, blob.clone()));
        }
        debug!(new = jobs.len(), total = arrays.len(), "array batch scheduled");

        async move {
            let mut report = BatchReport::default();
            for (hash, outcome) in join_all(jobs).await {
                match outcome {
                    Ok(()) => report.processed.push(hash),
                    Err(reason) => report.failed.push((hash, reason)),
                }
            }
            report
        }
        .boxed_local()
    }
}

async fn decode_one(
    registry: Rc<ResourceRegistry>,
    hash: ArrayHash,
    blob: String,
) -> (ArrayHash, Result<(), String>) {
    let outcome = match decode_array_archive(hash.as_str(), &blob) {
        Ok(bytes) => registry
            .resolve(&hash, Arc::from(bytes))
            .map_err(|err| err.to_string()),
        Err(err) => {
            let reason = err.to_string();
            warn!(%hash, %reason, "array decode failed");
            match registry.reject(&hash, reason.clone()) {
                Ok(()) => Err(reason),
                Err(settled) => Err(format!("{reason}; {settled}")),
            }
        }
    };
    (hash, outcome)
}
