// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory registry of decoded array payloads.
//!
//! [`ResourceRegistry`] is owned by one view and lives on the UI thread, so
//! its state sits behind a `RefCell` and every method takes `&self`. Waiters
//! are `oneshot` channels; settling an entry drains them all.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::channel::oneshot;
use futures::future::{self, Either};
use tracing::{debug, trace};

use crate::{ArrayError, ArrayHash, RegistryError};

type Outcome = Result<Arc<[u8]>, ArrayError>;

enum Entry {
    Pending(Vec<oneshot::Sender<Outcome>>),
    Resolved(Arc<[u8]>),
    Rejected(ArrayError),
}

/// Per-view map from content hash to decoded payload.
///
/// # Invariants
///
/// - `request` on a settled key completes immediately with the stored outcome.
/// - `request` on an absent key marks it pending; no decode is started here.
/// - `resolve`/`reject` settle a key once; later attempts return
///   [`RegistryError::AlreadySettled`] and leave the entry untouched.
/// - Dropping the registry wakes pending waiters with [`ArrayError::Abandoned`].
#[derive(Default)]
pub struct ResourceRegistry {
    entries: RefCell<HashMap<ArrayHash, Entry>>,
}

impl ResourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for the payload of `hash`.
    ///
    /// The returned future owns everything it needs, so it may outlive the
    /// borrow of `self`.
    pub fn request(&self, hash: &ArrayHash) -> impl Future<Output = Outcome> + 'static {
        let mut entries = self.entries.borrow_mut();
        let rx = match entries.get_mut(hash) {
            Some(Entry::Resolved(bytes)) => {
                return Either::Left(future::ready(Ok(Arc::clone(bytes))));
            }
            Some(Entry::Rejected(err)) => return Either::Left(future::ready(Err(err.clone()))),
            Some(Entry::Pending(waiters)) => {
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                trace!(%hash, waiters = waiters.len(), "joined pending array");
                rx
            }
            None => {
                let (tx, rx) = oneshot::channel();
                entries.insert(hash.clone(), Entry::Pending(vec![tx]));
                trace!(%hash, "array requested before decode");
                rx
            }
        };
        Either::Right(wait(hash.clone(), rx))
    }

    /// Mark `hash` as pending if it is absent. Returns `true` if it was absent.
    pub fn mark_pending(&self, hash: &ArrayHash) -> bool {
        let mut entries = self.entries.borrow_mut();
        if entries.contains_key(hash) {
            return false;
        }
        entries.insert(hash.clone(), Entry::Pending(Vec::new()));
        true
    }

    /// Store the decoded payload and wake every waiter.
    pub fn resolve(&self, hash: &ArrayHash, bytes: Arc<[u8]>) -> Result<(), RegistryError> {
        let waiters = self.settle(hash, Entry::Resolved(Arc::clone(&bytes)))?;
        debug!(%hash, len = bytes.len(), waiters = waiters.len(), "array resolved");
        for tx in waiters {
            // A dropped receiver just means the requester lost interest.
            let _ = tx.send(Ok(Arc::clone(&bytes)));
        }
        Ok(())
    }

    /// Record a decode failure and reject every waiter.
    pub fn reject(&self, hash: &ArrayHash, reason: impl Into<String>) -> Result<(), RegistryError> {
        let err = ArrayError::DecodeFailed {
            hash: hash.clone(),
            reason: reason.into(),
        };
        let waiters = self.settle(hash, Entry::Rejected(err.clone()))?;
        debug!(%hash, waiters = waiters.len(), "array rejected");
        for tx in waiters {
            let _ = tx.send(Err(err.clone()));
        }
        Ok(())
    }

    /// Resolved payload for `hash`, if any.
    pub fn get(&self, hash: &str) -> Option<Arc<[u8]>> {
        match self.entries.borrow().get(hash) {
            Some(Entry::Resolved(bytes)) => Some(Arc::clone(bytes)),
            _ => None,
        }
    }

    /// `true` if `hash` is resolved.
    pub fn is_resolved(&self, hash: &str) -> bool {
        matches!(self.entries.borrow().get(hash), Some(Entry::Resolved(_)))
    }

    /// `true` if `hash` is pending.
    pub fn is_pending(&self, hash: &str) -> bool {
        matches!(self.entries.borrow().get(hash), Some(Entry::Pending(_)))
    }

    /// Number of waiters parked on `hash`.
    pub fn waiter_count(&self, hash: &str) -> usize {
        match self.entries.borrow().get(hash) {
            Some(Entry::Pending(waiters)) => waiters.len(),
            _ => 0,
        }
    }

    /// Number of resolved entries.
    pub fn resolved_count(&self) -> usize {
        self.entries
            .borrow()
            .values()
            .filter(|e| matches!(e, Entry::Resolved(_)))
            .count()
    }

    fn settle(
        &self,
        hash: &ArrayHash,
        settled: Entry,
    ) -> Result<Vec<oneshot::Sender<Outcome>>, RegistryError> {
        let mut entries = self.entries.borrow_mut();
        match entries.insert(hash.clone(), settled) {
            None => Ok(Vec::new()),
            Some(Entry::Pending(waiters)) => Ok(waiters),
            Some(previous) => {
                entries.insert(hash.clone(), previous);
                Err(RegistryError::AlreadySettled { hash: hash.clone() })
            }
        }
    }
}

async fn wait(hash: ArrayHash, rx: oneshot::Receiver<Outcome>) -> Outcome {
    match rx.await {
        Ok(outcome) => outcome,
        Err(oneshot::Canceled) => Err(ArrayError::Abandoned { hash }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::FutureExt;

    fn bytes(data: &[u8]) -> Arc<[u8]> {
        Arc::from(data)
    }

    #[test]
    fn resolved_request_is_immediate() {
        let reg = ResourceRegistry::new();
        let hash = ArrayHash::from("a");
        reg.resolve(&hash, bytes(b"abc")).unwrap();
        let got = reg.request(&hash).now_or_never().unwrap().unwrap();
        assert_eq!(&*got, b"abc");
    }

    #[test]
    fn request_before_resolve_waits() {
        let reg = ResourceRegistry::new();
        let hash = ArrayHash::from("a");
        let mut fut = Box::pin(reg.request(&hash));
        assert!((&mut fut).now_or_never().is_none());
        assert!(reg.is_pending("a"));
        reg.resolve(&hash, bytes(b"late")).unwrap();
        assert_eq!(&*block_on(fut).unwrap(), b"late");
    }

    #[test]
    fn concurrent_requesters_share_one_resolution() {
        let reg = ResourceRegistry::new();
        let hash = ArrayHash::from("shared");
        let first = reg.request(&hash);
        let second = reg.request(&hash);
        assert_eq!(reg.waiter_count("shared"), 2);
        reg.resolve(&hash, bytes(b"payload")).unwrap();
        let (a, b) = block_on(futures::future::join(first, second));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn resolved_entry_is_immutable() {
        let reg = ResourceRegistry::new();
        let hash = ArrayHash::from("a");
        reg.resolve(&hash, bytes(b"one")).unwrap();
        let err = reg.resolve(&hash, bytes(b"two")).unwrap_err();
        assert_eq!(err, RegistryError::AlreadySettled { hash: hash.clone() });
        assert!(reg.reject(&hash, "late failure").is_err());
        assert_eq!(&*reg.get("a").unwrap(), b"one");
    }

    #[test]
    fn rejection_reaches_every_waiter() {
        let reg = ResourceRegistry::new();
        let hash = ArrayHash::from("bad");
        let first = reg.request(&hash);
        let second = reg.request(&hash);
        reg.reject(&hash, "truncated archive").unwrap();
        for outcome in block_on(futures::future::join_all([first, second])) {
            match outcome {
                Err(ArrayError::DecodeFailed { hash, reason }) => {
                    assert_eq!(hash.as_str(), "bad");
                    assert_eq!(reason, "truncated archive");
                }
                other => panic!("expected rejection, got {other:?}"),
            }
        }
        // Later requesters see the same rejection.
        assert!(block_on(reg.request(&hash)).is_err());
    }

    #[test]
    fn dropping_registry_abandons_waiters() {
        let reg = ResourceRegistry::new();
        let fut = reg.request(&ArrayHash::from("orphan"));
        drop(reg);
        assert_eq!(
            block_on(fut).unwrap_err(),
            ArrayError::Abandoned {
                hash: ArrayHash::from("orphan")
            }
        );
    }

    #[test]
    fn mark_pending_only_claims_absent_keys() {
        let reg = ResourceRegistry::new();
        let hash = ArrayHash::from("a");
        assert!(reg.mark_pending(&hash));
        assert!(!reg.mark_pending(&hash));
        reg.resolve(&hash, bytes(b"x")).unwrap();
        assert!(!reg.mark_pending(&hash));
        assert_eq!(reg.resolved_count(), 1);
    }
}
