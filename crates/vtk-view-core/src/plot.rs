// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Static plot view.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace};
use vtk_scene_port::{ActorHandle, RenderBackend};

use crate::camera_bridge::CameraBridge;
use crate::config::ViewConfig;
use crate::keys::{KeyboardFocus, ViewId};
use crate::model::{Property, SharedModel};
use crate::view::{View, ViewCore};
use crate::ViewError;

/// View rendering the literal scene held in the model's `data`.
pub struct PlotView {
    core: Rc<ViewCore>,
    backend: Rc<dyn RenderBackend>,
    scene_actors: RefCell<Vec<ActorHandle>>,
}

impl PlotView {
    /// Unmounted view over `model`.
    pub fn new(
        model: SharedModel,
        backend: Rc<dyn RenderBackend>,
        config: ViewConfig,
        focus: Rc<KeyboardFocus>,
    ) -> Self {
        Self {
            core: ViewCore::new(model, config, focus),
            backend,
            scene_actors: RefCell::new(Vec::new()),
        }
    }

    /// Actors created from `data`.
    pub fn scene_actors(&self) -> Vec<ActorHandle> {
        self.scene_actors.borrow().clone()
    }

    /// Camera bridge of this view.
    pub fn camera_bridge(&self) -> &CameraBridge {
        self.core.bridge()
    }

    /// `true` while axis decoration is on screen.
    pub fn axes_shown(&self) -> bool {
        self.core.axes_shown()
    }

    /// `true` while this view owns the keyboard.
    pub fn is_capturing_keys(&self) -> bool {
        self.core.is_capturing_keys()
    }

    fn try_mount(&self) -> Result<(), ViewError> {
        let surface = self.backend.create_surface(&self.core.container())?;
        self.core.attach(surface, &*self.backend)?;
        self.load_data()?;
        self.core.hook_camera(false)?;
        self.core.sync_initial_camera()?;
        if self.core.model().borrow().axes.is_some() {
            self.core.refresh_axes(&*self.backend)?;
        }
        self.core.expose_renderer();
        Ok(())
    }

    /// Swap the loaded scene for the model's current `data`.
    fn load_data(&self) -> Result<(), ViewError> {
        let renderer = self.core.renderer()?;
        for actor in self.scene_actors.borrow_mut().drain(..) {
            renderer.remove_actor(&actor);
        }
        let data = self.core.model().borrow().data.clone();
        if let Some(data) = data {
            let actors = self.backend.load_scene(&*renderer, &data)?;
            debug!(view = %self.core.id(), actors = actors.len(), "scene loaded");
            *self.scene_actors.borrow_mut() = actors;
        }
        Ok(())
    }
}

impl View for PlotView {
    fn id(&self) -> ViewId {
        self.core.id()
    }

    fn model(&self) -> &SharedModel {
        self.core.model()
    }

    fn mount(&self) -> Result<(), ViewError> {
        if self.core.is_mounted() {
            self.teardown();
        }
        debug!(view = %self.core.id(), "mount start");
        self.try_mount().map_err(|err| {
            self.scene_actors.borrow_mut().clear();
            self.core.abort_mount(err)
        })?;
        debug!(view = %self.core.id(), "mount end");
        Ok(())
    }

    fn after_layout(&self) -> Result<(), ViewError> {
        self.core.after_layout()
    }

    fn on_change(&self, property: Property) -> Result<(), ViewError> {
        if !self.core.is_mounted() {
            trace!(view = %self.core.id(), ?property, "change before mount");
            return Ok(());
        }
        match property {
            Property::Data => {
                self.load_data()?;
                self.core.render()
            }
            other => self.core.apply_common(other, &*self.backend),
        }
    }

    fn pointer_enter(&self) {
        self.core.pointer_enter();
    }

    fn pointer_leave(&self) {
        self.core.pointer_leave();
    }

    fn teardown(&self) {
        self.scene_actors.borrow_mut().clear();
        self.core.teardown();
    }

    fn is_mounted(&self) -> bool {
        self.core.is_mounted()
    }
}

impl Drop for PlotView {
    fn drop(&mut self) {
        if self.core.is_mounted() {
            self.core.teardown();
        }
    }
}
