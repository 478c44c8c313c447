// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bidirectional camera sync between the model and the engine.

use std::cell::Cell;

use tracing::trace;
use vtk_scene_port::{Camera, CameraSnapshot, Renderer};

use crate::model::SharedModel;

/// Moves camera state between the [`ViewModel`](crate::ViewModel) and the engine.
///
/// Only one direction may run at a time: the engine fires `modified` while a
/// pull applies fields, and the model would otherwise be written back from
/// inside its own update. A nested call in either direction is dropped.
pub struct CameraBridge {
    model: SharedModel,
    deny: Vec<String>,
    in_flight: Cell<bool>,
    pushes: Cell<u32>,
    pulls: Cell<u32>,
    suppressed: Cell<u32>,
}

/// Clears the in-flight flag on every exit path.
struct InFlight<'a>(&'a Cell<bool>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl CameraBridge {
    /// Bridge writing into `model`, stripping `deny` from pushed snapshots.
    pub fn new(model: SharedModel, deny: Vec<String>) -> Self {
        Self {
            model,
            deny,
            in_flight: Cell::new(false),
            pushes: Cell::new(0),
            pulls: Cell::new(0),
            suppressed: Cell::new(0),
        }
    }

    fn enter(&self, direction: &'static str) -> Option<InFlight<'_>> {
        if self.in_flight.replace(true) {
            self.suppressed.set(self.suppressed.get() + 1);
            trace!(direction, "re-entrant camera update suppressed");
            return None;
        }
        Some(InFlight(&self.in_flight))
    }

    /// Engine to model. Returns `false` if suppressed.
    pub fn push(&self, camera: &dyn Camera) -> bool {
        let Some(_guard) = self.enter("push") else {
            return false;
        };
        let snapshot = CameraSnapshot::from_fields(camera.get(), &self.deny);
        self.model.borrow_mut().write_camera(snapshot);
        self.pushes.set(self.pushes.get() + 1);
        true
    }

    /// Model to engine: apply the model's snapshot, then reset clipping.
    ///
    /// Clipping is reset even when the model holds no camera. Returns
    /// `false` if suppressed or nothing was applied.
    pub fn pull(&self, renderer: &dyn Renderer) -> bool {
        let Some(guard) = self.enter("pull") else {
            return false;
        };
        let snapshot = self.model.borrow().camera.clone();
        if let Some(snapshot) = &snapshot {
            renderer.active_camera().set(snapshot.fields());
        }
        drop(guard);
        renderer.reset_camera_clipping_range();
        if snapshot.is_none() {
            return false;
        }
        self.pulls.set(self.pulls.get() + 1);
        true
    }

    /// `true` while either direction runs.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.get()
    }

    /// Completed pushes.
    pub fn push_count(&self) -> u32 {
        self.pushes.get()
    }

    /// Completed pulls.
    pub fn pull_count(&self) -> u32 {
        self.pulls.get()
    }

    /// Calls dropped by the guard.
    pub fn suppressed_count(&self) -> u32 {
        self.suppressed.get()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use std::rc::Rc;

    use serde_json::json;
    use vtk_dry_tests::{MockCamera, MockRenderer};
    use vtk_scene_port::INTERNAL_CAMERA_FIELDS;

    use super::*;
    use crate::ViewModel;

    fn bridge() -> (Rc<CameraBridge>, SharedModel) {
        let model = ViewModel::default().shared();
        let deny = INTERNAL_CAMERA_FIELDS.iter().map(|f| (*f).to_owned()).collect();
        (Rc::new(CameraBridge::new(Rc::clone(&model), deny)), model)
    }

    #[test]
    fn push_strips_engine_bookkeeping() {
        let (bridge, model) = bridge();
        let camera = MockCamera::new();
        assert!(bridge.push(&camera));

        let model = model.borrow();
        let fields = model.camera.as_ref().unwrap().fields();
        for internal in INTERNAL_CAMERA_FIELDS {
            assert!(!fields.contains_key(*internal), "{internal} leaked");
        }
        assert_eq!(fields["position"], json!([0.0, 0.0, 1.0]));
        assert_eq!(fields["viewAngle"], json!(30.0));
    }

    #[test]
    fn pull_without_camera_only_resets_clipping() {
        let (bridge, _model) = bridge();
        let renderer = MockRenderer::new(1);
        assert!(!bridge.pull(&renderer));
        assert_eq!(renderer.camera.set_calls.get(), 0);
        assert_eq!(renderer.clipping_resets.get(), 1);
        assert_eq!(bridge.pull_count(), 0);
        assert!(!bridge.is_in_flight());
    }

    #[test]
    fn modified_during_pull_does_not_push() {
        let (bridge, model) = bridge();
        let renderer = MockRenderer::new(1);
        let weak = Rc::downgrade(&bridge);
        let camera = Rc::clone(&renderer.camera);
        renderer.camera.on_modified(Box::new(move || {
            if let Some(bridge) = weak.upgrade() {
                bridge.push(&*camera);
            }
        }));
        model.borrow_mut().camera = Some(CameraSnapshot::from_engine(
            serde_json::from_value(json!({"position": [4.0, 0.0, 0.0]})).unwrap(),
        ));

        assert!(bridge.pull(&renderer));

        assert_eq!(bridge.pull_count(), 1);
        assert_eq!(bridge.push_count(), 0);
        assert_eq!(bridge.suppressed_count(), 1);
        assert_eq!(renderer.clipping_resets.get(), 1);
        assert_eq!(renderer.camera.position(), [4.0, 0.0, 0.0]);
        assert!(model.borrow_mut().take_outbound().is_empty());
    }
}
