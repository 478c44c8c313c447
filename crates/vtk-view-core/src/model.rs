// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Host-owned view model.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use vtk_scene_port::{ActorHandle, AxesDescriptor, CameraSnapshot, Renderer, SceneData, SceneDiff};

/// Observable attribute of a [`ViewModel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    /// `camera`
    Camera,
    /// `orientation_widget`
    OrientationWidget,
    /// `enable_keybindings`
    EnableKeybindings,
    /// `axes`
    Axes,
    /// `data` (static plot)
    Data,
    /// `scene` (synchronized plot)
    Scene,
    /// `arrays` (synchronized plot)
    Arrays,
    /// `arrays_processed` (synchronized plot)
    ArraysProcessed,
    /// `one_time_reset` (synchronized plot)
    OneTimeReset,
}

/// Model shared between the host and one view.
pub type SharedModel = Rc<RefCell<ViewModel>>;

/// Attributes the host framework owns and the view observes.
///
/// The host edits fields directly and then reports the change through
/// [`View::on_change`](crate::View::on_change). Writes made by the view go
/// through the `write_*` methods and are queued for the host in
/// [`ViewModel::take_outbound`]; the host must not echo them back as changes.
pub struct ViewModel {
    /// Camera snapshot, engine bookkeeping stripped.
    pub camera: Option<CameraSnapshot>,
    /// Orientation marker visibility.
    pub orientation_widget: bool,
    /// Route key events to the engine while the pointer is over the view.
    pub enable_keybindings: bool,
    /// Axis decoration; `None` clears it.
    pub axes: Option<AxesDescriptor>,
    /// Literal scene for the static plot.
    pub data: Option<SceneData>,
    /// Scene diff for the synchronized plot.
    pub scene: SceneDiff,
    /// Content hash to base64 archive.
    pub arrays: BTreeMap<String, String>,
    /// Hashes decoded so far.
    pub arrays_processed: Vec<String>,
    /// Pulse that clears one-shot render window updaters.
    pub one_time_reset: bool,
    /// Synchronizer context name; empty picks a view-local random one.
    pub context_name: String,
    /// Container width override.
    pub width: Option<u32>,
    /// Container height override.
    pub height: Option<u32>,
    /// Device pixel ratio of the hosting display.
    pub device_pixel_ratio: f64,
    renderer: Option<Rc<dyn Renderer>>,
    outbound: Vec<Property>,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self {
            camera: None,
            orientation_widget: false,
            enable_keybindings: false,
            axes: None,
            data: None,
            scene: SceneDiff::default(),
            arrays: BTreeMap::new(),
            arrays_processed: Vec::new(),
            one_time_reset: false,
            context_name: String::new(),
            width: None,
            height: None,
            device_pixel_ratio: 1.0,
            renderer: None,
            outbound: Vec::new(),
        }
    }
}

impl ViewModel {
    /// Wrap the model for sharing with a view.
    pub fn shared(self) -> SharedModel {
        Rc::new(RefCell::new(self))
    }

    /// Renderer exposed by the mounted view.
    pub fn renderer(&self) -> Option<Rc<dyn Renderer>> {
        self.renderer.clone()
    }

    /// Actors of the exposed renderer; empty while unmounted.
    pub fn actors(&self) -> Vec<ActorHandle> {
        self.renderer
            .as_ref()
            .map(|renderer| renderer.actors())
            .unwrap_or_default()
    }

    /// Drain the properties the view wrote since the last call.
    pub fn take_outbound(&mut self) -> Vec<Property> {
        std::mem::take(&mut self.outbound)
    }

    pub(crate) fn write_camera(&mut self, snapshot: CameraSnapshot) {
        self.camera = Some(snapshot);
        self.outbound.push(Property::Camera);
    }

    pub(crate) fn write_arrays_processed(&mut self, processed: Vec<String>) {
        self.arrays_processed = processed;
        self.outbound.push(Property::ArraysProcessed);
    }

    pub(crate) fn expose_renderer(&mut self, renderer: Option<Rc<dyn Renderer>>) {
        self.renderer = renderer;
    }
}
