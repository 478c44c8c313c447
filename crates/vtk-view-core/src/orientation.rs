// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Orientation marker controller and axis-snap camera math.

use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;
use vtk_scene_port::{
    major_axis, Camera, GizmoPlacement, OrientationGizmo, PortError, RenderBackend, RenderSurface,
    SubscriptionId,
};

/// Owns the orientation gizmo of one surface and its snap subscription.
pub struct OrientationWidget {
    gizmo: Rc<dyn OrientationGizmo>,
    subscription: SubscriptionId,
    last_direction: Rc<Cell<Option<[f64; 3]>>>,
}

impl OrientationWidget {
    /// Build the gizmo for `surface` and route its snap gestures to `on_snap`.
    pub fn create(
        backend: &dyn RenderBackend,
        surface: &dyn RenderSurface,
        placement: &GizmoPlacement,
        on_snap: impl Fn([f64; 3]) + 'static,
    ) -> Result<Self, PortError> {
        let gizmo = backend.create_orientation_gizmo(surface, placement)?;
        let last_direction = Rc::new(Cell::new(None));
        let recorded = Rc::clone(&last_direction);
        let subscription = gizmo.on_orientation_change(Box::new(move |direction| {
            recorded.set(Some(direction));
            on_snap(direction);
        }));
        Ok(Self {
            gizmo,
            subscription,
            last_direction,
        })
    }

    /// Show or hide the marker together with picking on its sub-renderer.
    pub fn set_visibility(&self, visible: bool) {
        self.gizmo.set_enabled(visible);
        self.gizmo.set_picking(visible);
    }

    /// Toggle off, then to `visible`.
    ///
    /// The marker does not pick up a renderer swapped in by a structural
    /// scene change until it is disabled and enabled again.
    pub fn reattach(&self, visible: bool) {
        self.set_visibility(false);
        self.set_visibility(visible);
    }

    /// Whether the marker is shown.
    pub fn is_visible(&self) -> bool {
        self.gizmo.is_enabled()
    }

    /// Re-align the marker with the main camera.
    pub fn update(&self) {
        self.gizmo.update_marker_orientation();
    }

    /// Direction of the most recent snap gesture.
    pub fn last_direction(&self) -> Option<[f64; 3]> {
        self.last_direction.get()
    }
}

impl Drop for OrientationWidget {
    fn drop(&mut self) {
        self.gizmo.remove_observer(self.subscription);
    }
}

fn is_set(component: f64) -> bool {
    component.abs() > f64::EPSILON
}

/// Move `camera` onto the axis `direction` at its current focal distance.
///
/// View-up becomes the major axis of the current view-up over the two axes
/// orthogonal to each non-zero component; the last such component wins.
/// Returns `false` (camera untouched) for a zero direction.
pub fn snap_camera(camera: &dyn Camera, direction: [f64; 3]) -> bool {
    if !direction.iter().copied().any(is_set) {
        debug!(?direction, "zero snap direction ignored");
        return false;
    }
    let focal = camera.focal_point();
    let position = camera.position();
    let up = camera.view_up();
    let distance = position
        .iter()
        .zip(focal)
        .map(|(p, f)| (p - f).powi(2))
        .sum::<f64>()
        .sqrt();

    camera.set_position([
        focal[0] + direction[0] * distance,
        focal[1] + direction[1] * distance,
        focal[2] + direction[2] * distance,
    ]);

    let mut view_up = None;
    if is_set(direction[0]) {
        view_up = Some(major_axis(up, 1, 2));
    }
    if is_set(direction[1]) {
        view_up = Some(major_axis(up, 0, 2));
    }
    if is_set(direction[2]) {
        view_up = Some(major_axis(up, 0, 1));
    }
    if let Some(view_up) = view_up {
        camera.set_view_up(view_up);
    }
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use vtk_dry_tests::{MockBackend, MockCamera};
    use vtk_scene_port::{Container, ViewportCorner};

    use super::*;

    fn camera_at(position: [f64; 3], up: [f64; 3]) -> MockCamera {
        let camera = MockCamera::new();
        camera.set_position(position);
        camera.set_view_up(up);
        camera
    }

    #[test]
    fn snap_along_x_keeps_distance() {
        let camera = camera_at([5.0, 0.0, 0.0], [0.0, 0.0, 1.0]);
        assert!(snap_camera(&camera, [1.0, 0.0, 0.0]));
        assert_eq!(camera.position(), [5.0, 0.0, 0.0]);
        assert_eq!(camera.view_up(), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn snap_moves_camera_onto_new_axis() {
        let camera = camera_at([0.0, 0.0, 3.0], [0.0, 1.0, 0.0]);
        assert!(snap_camera(&camera, [-1.0, 0.0, 0.0]));
        assert_eq!(camera.position(), [-3.0, 0.0, 0.0]);
        assert_eq!(camera.view_up(), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn view_up_excludes_snapped_component() {
        let camera = camera_at([0.0, 0.0, 2.0], [0.0, -0.2, 0.9]);
        assert!(snap_camera(&camera, [0.0, 0.0, 1.0]));
        // Z is excluded; Y dominates X.
        assert_eq!(camera.view_up(), [0.0, -1.0, 0.0]);
    }

    #[test]
    fn zero_direction_is_ignored() {
        let camera = camera_at([1.0, 2.0, 3.0], [0.0, 1.0, 0.0]);
        let before = camera.modified_events.get();
        assert!(!snap_camera(&camera, [0.0, 0.0, 0.0]));
        assert_eq!(camera.modified_events.get(), before);
        assert_eq!(camera.position(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn widget_routes_gestures_and_unsubscribes_on_drop() {
        let backend = MockBackend::new();
        let surface = backend
            .create_surface(&Container {
                width: 10,
                height: 10,
            })
            .unwrap();
        let seen = Rc::new(Cell::new(None));
        let sink = Rc::clone(&seen);
        let widget = OrientationWidget::create(
            &backend,
            &*surface,
            &GizmoPlacement::default(),
            move |dir| sink.set(Some(dir)),
        )
        .unwrap();
        let gizmo = backend.world().last_gizmo().unwrap();
        assert_eq!(gizmo.placement.corner, ViewportCorner::BottomRight);

        gizmo.emit([0.0, 1.0, 0.0]);
        assert_eq!(seen.get(), Some([0.0, 1.0, 0.0]));
        assert_eq!(widget.last_direction(), Some([0.0, 1.0, 0.0]));

        widget.reattach(true);
        assert_eq!(*gizmo.enable_history.borrow(), vec![false, true]);
        assert!(gizmo.picking.get());

        drop(widget);
        assert_eq!(gizmo.observer_count(), 0);
    }
}
