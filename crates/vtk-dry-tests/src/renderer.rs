// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Renderer, interactor, overlay and gizmo doubles.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use vtk_scene_port::{
    ActorHandle, Camera, GizmoPlacement, Interactor, KeyEvent, OrientationGizmo, OverlayCanvas,
    Renderer, SubscriptionId,
};

use crate::MockCamera;

/// Renderer double tracking its actor list.
pub struct MockRenderer {
    /// Renderer identity, unique per world.
    pub id: u64,
    /// The active camera.
    pub camera: Rc<MockCamera>,
    actors: RefCell<Vec<ActorHandle>>,
    /// Number of clipping range resets.
    pub clipping_resets: Cell<u32>,
}

impl MockRenderer {
    /// Empty renderer with a fresh camera.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            camera: Rc::new(MockCamera::new()),
            actors: RefCell::new(Vec::new()),
            clipping_resets: Cell::new(0),
        }
    }

    /// Number of actors in the scene.
    pub fn actor_count(&self) -> usize {
        self.actors.borrow().len()
    }
}

impl Renderer for MockRenderer {
    fn active_camera(&self) -> Rc<dyn Camera> {
        Rc::clone(&self.camera) as Rc<dyn Camera>
    }

    fn add_actor(&self, actor: &ActorHandle) {
        self.actors.borrow_mut().push(actor.clone());
    }

    fn remove_actor(&self, actor: &ActorHandle) {
        self.actors.borrow_mut().retain(|a| a != actor);
    }

    fn actors(&self) -> Vec<ActorHandle> {
        self.actors.borrow().clone()
    }

    fn reset_camera_clipping_range(&self) {
        self.clipping_resets.set(self.clipping_resets.get() + 1);
    }
}

/// Interactor double recording key routing.
pub struct MockInteractor {
    /// `true` until `detach_default_key_bindings` is called.
    pub default_bindings: Cell<bool>,
    /// Every key event handed to the interactor.
    pub keys: RefCell<Vec<KeyEvent>>,
    /// Number of interactor-driven renders.
    pub renders: Cell<u32>,
}

impl MockInteractor {
    /// Interactor with its document-wide bindings still attached.
    pub fn new() -> Self {
        Self {
            default_bindings: Cell::new(true),
            keys: RefCell::new(Vec::new()),
            renders: Cell::new(0),
        }
    }
}

impl Default for MockInteractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Interactor for MockInteractor {
    fn detach_default_key_bindings(&self) {
        self.default_bindings.set(false);
    }

    fn handle_key(&self, event: &KeyEvent) {
        self.keys.borrow_mut().push(event.clone());
    }

    fn render(&self) {
        self.renders.set(self.renders.get() + 1);
    }
}

/// Overlay canvas double.
#[derive(Default)]
pub struct MockOverlay {
    /// Number of clears.
    pub clears: Cell<u32>,
    /// Last backing-store size.
    pub size: Cell<(u32, u32)>,
}

impl OverlayCanvas for MockOverlay {
    fn clear(&self) {
        self.clears.set(self.clears.get() + 1);
    }

    fn resize(&self, width: u32, height: u32) {
        self.size.set((width, height));
    }
}

type DirectionObserver = (SubscriptionId, Rc<dyn Fn([f64; 3])>);

/// Orientation gizmo double; tests fire snap gestures with [`MockGizmo::emit`].
pub struct MockGizmo {
    /// Placement the gizmo was built with.
    pub placement: GizmoPlacement,
    enabled: Cell<bool>,
    /// Picking state of the widget manager.
    pub picking: Cell<bool>,
    /// Every `set_enabled` value, in order.
    pub enable_history: RefCell<Vec<bool>>,
    /// Number of marker orientation updates.
    pub marker_updates: Cell<u32>,
    observers: RefCell<Vec<DirectionObserver>>,
    next_observer: Cell<u64>,
}

impl MockGizmo {
    /// Enabled gizmo, as freshly built marker widgets are.
    pub fn new(placement: GizmoPlacement) -> Self {
        Self {
            placement,
            enabled: Cell::new(true),
            picking: Cell::new(false),
            enable_history: RefCell::new(Vec::new()),
            marker_updates: Cell::new(0),
            observers: RefCell::new(Vec::new()),
            next_observer: Cell::new(1),
        }
    }

    /// Simulate a user clicking an axis of the marker.
    pub fn emit(&self, direction: [f64; 3]) {
        let observers: Vec<Rc<dyn Fn([f64; 3])>> = self
            .observers
            .borrow()
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for cb in observers {
            cb(direction);
        }
    }

    /// Number of live orientation observers.
    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }
}

impl OrientationGizmo for MockGizmo {
    fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
        self.enable_history.borrow_mut().push(enabled);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    fn set_picking(&self, enabled: bool) {
        self.picking.set(enabled);
    }

    fn update_marker_orientation(&self) {
        self.marker_updates.set(self.marker_updates.get() + 1);
    }

    fn on_orientation_change(&self, callback: Box<dyn Fn([f64; 3])>) -> SubscriptionId {
        let id = SubscriptionId(self.next_observer.get());
        self.next_observer.set(id.0 + 1);
        self.observers.borrow_mut().push((id, Rc::from(callback)));
        id
    }

    fn remove_observer(&self, id: SubscriptionId) {
        self.observers.borrow_mut().retain(|(sub, _)| *sub != id);
    }
}
