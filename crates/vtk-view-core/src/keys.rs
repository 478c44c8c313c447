// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Focus-scoped keyboard routing.
//!
//! Engines install document-wide key listeners by default, so two mounted
//! views would both react to every keystroke. Here the engine's own bindings
//! are detached right after construction and the host feeds key events to a
//! shared [`KeyboardFocus`], which forwards them to at most one view: the
//! one the pointer is currently over.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;
use vtk_scene_port::{Interactor, KeyEvent};

/// Process-unique view identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u64);

impl ViewId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view-{}", self.0)
    }
}

/// Keyboard capture shared by every view on a page.
#[derive(Default)]
pub struct KeyboardFocus {
    owner: RefCell<Option<(ViewId, Weak<dyn Interactor>)>>,
}

impl KeyboardFocus {
    /// Shared focus with no owner.
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Route key events to `interactor` on behalf of `view`.
    pub fn capture(&self, view: ViewId, interactor: &Rc<dyn Interactor>) {
        *self.owner.borrow_mut() = Some((view, Rc::downgrade(interactor)));
    }

    /// Stop routing for `view`. Capture held by another view is left alone.
    pub fn release(&self, view: ViewId) {
        let mut owner = self.owner.borrow_mut();
        if owner.as_ref().is_some_and(|(id, _)| *id == view) {
            *owner = None;
        }
    }

    /// View currently capturing keys.
    pub fn owner(&self) -> Option<ViewId> {
        self.owner.borrow().as_ref().map(|(id, _)| *id)
    }

    /// Forward `event` to the capturing interactor. Returns `false` if none.
    pub fn dispatch(&self, event: &KeyEvent) -> bool {
        let target = self
            .owner
            .borrow()
            .as_ref()
            .and_then(|(_, interactor)| interactor.upgrade());
        match target {
            Some(interactor) => {
                interactor.handle_key(event);
                true
            }
            None => {
                trace!(key = %event.key, "key event with no capturing view");
                false
            }
        }
    }
}

/// Per-view half of the keyboard routing.
pub struct KeyBindingBridge {
    view: ViewId,
    focus: Rc<KeyboardFocus>,
    interactor: RefCell<Option<Rc<dyn Interactor>>>,
}

impl KeyBindingBridge {
    /// Bridge for `view` sharing `focus`.
    pub fn new(view: ViewId, focus: Rc<KeyboardFocus>) -> Self {
        Self {
            view,
            focus,
            interactor: RefCell::new(None),
        }
    }

    /// Take over a freshly built interactor, detaching its default bindings.
    pub fn bind(&self, interactor: Rc<dyn Interactor>) {
        interactor.detach_default_key_bindings();
        self.focus.release(self.view);
        *self.interactor.borrow_mut() = Some(interactor);
    }

    /// Pointer entered the view; capture keys if `enabled`.
    pub fn pointer_enter(&self, enabled: bool) {
        if !enabled {
            return;
        }
        if let Some(interactor) = self.interactor.borrow().as_ref() {
            self.focus.capture(self.view, interactor);
        }
    }

    /// Pointer left the view.
    pub fn pointer_leave(&self) {
        self.focus.release(self.view);
    }

    /// Release capture and forget the interactor.
    pub fn unbind(&self) {
        self.focus.release(self.view);
        self.interactor.borrow_mut().take();
    }

    /// `true` while this view owns the keyboard.
    pub fn is_capturing(&self) -> bool {
        self.focus.owner() == Some(self.view)
    }
}
