// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Keyboard events routed to a render interactor.

/// Which keyboard event fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyEventKind {
    /// Character produced.
    Press,
    /// Key went down.
    Down,
    /// Key went up.
    Up,
}

/// A keyboard event as delivered by the host document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    /// Event kind.
    pub kind: KeyEventKind,
    /// Key name (`"r"`, `"ArrowLeft"`, ...).
    pub key: String,
}

impl KeyEvent {
    /// Build an event of `kind` for `key`.
    pub fn new(kind: KeyEventKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }
}
