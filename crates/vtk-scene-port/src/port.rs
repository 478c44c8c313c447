// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Capability traits implemented by a rendering engine adapter.
//!
//! # Design
//!
//! This is a hexagonal port. The view controllers own the lifecycle and the
//! state bridges; adapters (vtk.js through wasm bindings, a native engine, the
//! headless doubles in `vtk-dry-tests`) implement these traits and do the
//! actual drawing.
//!
//! Handles are `Rc<dyn Trait>` and mutate through `&self`: engine objects are
//! shared between the view, the widget and the engine's own callbacks.
//! Observer callbacks fire synchronously, on the caller's stack, so an adapter
//! must not hold internal borrows while invoking them.

use std::rc::Rc;
use std::sync::Arc;

use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

use crate::{AxesActors, AxesDescriptor, CameraFields, KeyEvent, PortError, SceneData, SceneDiff};

/// Token returned by observer registration; pass it back to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Engine-assigned actor identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u64);

/// Handle to a renderable scene-graph node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ActorHandle {
    /// Engine identity.
    pub id: ActorId,
    /// Human-readable kind (`"axes"`, `"grid"`, `"polydata"`, ...).
    pub kind: String,
}

/// Mount point handed to the engine, sized by the host layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Container {
    /// Width in CSS pixels.
    pub width: u32,
    /// Height in CSS pixels.
    pub height: u32,
}

/// Viewport corner the orientation marker is pinned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewportCorner {
    /// Bottom-left corner.
    BottomLeft,
    /// Bottom-right corner.
    BottomRight,
    /// Top-left corner.
    TopLeft,
    /// Top-right corner.
    TopRight,
}

/// Fixed placement of the orientation marker, set at construction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GizmoPlacement {
    /// Pinned corner.
    pub corner: ViewportCorner,
    /// Marker size as a fraction of the viewport.
    pub viewport_size: f64,
    /// Lower pixel bound.
    pub min_pixel_size: u32,
    /// Upper pixel bound.
    pub max_pixel_size: u32,
}

impl Default for GizmoPlacement {
    fn default() -> Self {
        Self {
            corner: ViewportCorner::BottomRight,
            viewport_size: 0.15,
            min_pixel_size: 75,
            max_pixel_size: 300,
        }
    }
}

/// Callback used by a synchronizer to pull array payloads by content hash.
pub type FetchArrayFn = Rc<dyn Fn(&str) -> LocalBoxFuture<'static, Result<Arc<[u8]>, PortError>>>;

/// Live engine camera.
pub trait Camera {
    /// Full field set, including engine bookkeeping.
    fn get(&self) -> CameraFields;

    /// Apply a field set. Fires `modified`.
    fn set(&self, fields: &CameraFields);

    /// Camera position.
    fn position(&self) -> [f64; 3];

    /// Look-at point.
    fn focal_point(&self) -> [f64; 3];

    /// Up vector.
    fn view_up(&self) -> [f64; 3];

    /// Move the camera. Fires `modified`.
    fn set_position(&self, position: [f64; 3]);

    /// Set the up vector. Fires `modified`.
    fn set_view_up(&self, up: [f64; 3]);

    /// Notify every `on_modified` observer.
    fn modified(&self);

    /// Register a callback fired after every modification.
    fn on_modified(&self, callback: Box<dyn Fn()>) -> SubscriptionId;

    /// Drop a callback. Unknown ids are ignored.
    fn remove_observer(&self, id: SubscriptionId);
}

/// Retained-mode scene container for one surface.
pub trait Renderer {
    /// The camera currently driving this renderer.
    fn active_camera(&self) -> Rc<dyn Camera>;

    /// Add an actor to the scene.
    fn add_actor(&self, actor: &ActorHandle);

    /// Remove an actor. Unknown actors are ignored.
    fn remove_actor(&self, actor: &ActorHandle);

    /// Actors currently in the scene.
    fn actors(&self) -> Vec<ActorHandle>;

    /// Recompute near/far planes from the visible bounds.
    fn reset_camera_clipping_range(&self);
}

/// Keyboard/mouse input router of a surface.
pub trait Interactor {
    /// Unhook the engine's own document-wide key listeners.
    fn detach_default_key_bindings(&self);

    /// Feed one key event to the engine's bindings.
    fn handle_key(&self, event: &KeyEvent);

    /// Render through the interactor (honours interaction frame rates).
    fn render(&self);
}

/// 2-D canvas layered over the surface for axis labels.
pub trait OverlayCanvas {
    /// Clear everything drawn so far.
    fn clear(&self);

    /// Resize the backing store, in device pixels.
    fn resize(&self, width: u32, height: u32);
}

/// Small axes marker that follows the main camera and reports axis-snap clicks.
pub trait OrientationGizmo {
    /// Show or hide the marker.
    fn set_enabled(&self, enabled: bool);

    /// Whether the marker is shown.
    fn is_enabled(&self) -> bool;

    /// Enable or disable picking on the marker's own sub-renderer.
    fn set_picking(&self, enabled: bool);

    /// Re-align the marker with the main camera.
    fn update_marker_orientation(&self);

    /// Register a callback receiving the snap direction of each gesture.
    fn on_orientation_change(&self, callback: Box<dyn Fn([f64; 3])>) -> SubscriptionId;

    /// Drop a callback. Unknown ids are ignored.
    fn remove_observer(&self, id: SubscriptionId);
}

/// One render window bound to a container.
pub trait RenderSurface {
    /// Main renderer, if one is attached.
    fn renderer(&self) -> Option<Rc<dyn Renderer>>;

    /// Input router.
    fn interactor(&self) -> Rc<dyn Interactor>;

    /// Overlay canvas for axis labels, created on first use.
    fn overlay_canvas(&self) -> Rc<dyn OverlayCanvas>;

    /// Fit the render window to its container.
    fn resize(&self);

    /// Draw one frame.
    fn render(&self);

    /// Release engine resources. The surface must not be used afterwards.
    fn dispose(&self);
}

/// Factory for engine objects.
pub trait RenderBackend {
    /// Build a render window inside `container`.
    fn create_surface(&self, container: &Container) -> Result<Rc<dyn RenderSurface>, PortError>;

    /// Build the orientation marker for `surface`.
    fn create_orientation_gizmo(
        &self,
        surface: &dyn RenderSurface,
        placement: &GizmoPlacement,
    ) -> Result<Rc<dyn OrientationGizmo>, PortError>;

    /// Build the axis decoration actors, drawing labels into `overlay`.
    fn create_axes(
        &self,
        descriptor: &AxesDescriptor,
        overlay: &dyn OverlayCanvas,
    ) -> Result<AxesActors, PortError>;

    /// Import a literal scene into `renderer`, returning the created actors.
    fn load_scene(
        &self,
        renderer: &dyn Renderer,
        data: &SceneData,
    ) -> Result<Vec<ActorHandle>, PortError>;
}

/// Registry coordinating incremental scene diffs and array payloads.
///
/// Several surfaces may share one context when they are configured with the
/// same context name.
pub trait SynchronizerContext {
    /// Context name.
    fn name(&self) -> String;

    /// Install the callback used to fetch arrays referenced by diffs.
    fn set_fetch_array_function(&self, fetch: FetchArrayFn);

    /// Look up an already instantiated renderer node.
    fn renderer_instance(&self, id: &str) -> Option<Rc<dyn Renderer>>;
}

/// Render window driven by server-pushed scene diffs.
pub trait SynchronizedSurface: RenderSurface {
    /// Attach an existing renderer.
    fn add_renderer(&self, renderer: Rc<dyn Renderer>);

    /// Drop queued one-shot render window updaters.
    fn clear_one_time_updaters(&self);

    /// Set the synchronized view identifier.
    fn set_synchronized_view_id(&self, id: &str);

    /// Apply a scene diff.
    fn synchronize(&self, scene: &SceneDiff) -> Result<(), PortError>;
}

/// Backend that can also build synchronized surfaces.
pub trait SynchronizedBackend: RenderBackend {
    /// The context registered under `name`, created on first use.
    fn synchronizer_context(&self, name: &str) -> Rc<dyn SynchronizerContext>;

    /// Build a synchronized render window inside `container`.
    fn create_synchronized_surface(
        &self,
        container: &Container,
        context: &Rc<dyn SynchronizerContext>,
    ) -> Result<Rc<dyn SynchronizedSurface>, PortError>;
}
