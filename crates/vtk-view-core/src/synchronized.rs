// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Plot view driven by server-pushed scene diffs.

use std::cell::RefCell;
use std::rc::Rc;

use futures::task::{LocalSpawn, LocalSpawnExt};
use futures::{FutureExt, TryFutureExt};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, error, trace, warn};
use vtk_array_cas::{ArrayHash, ResourceRegistry};
use vtk_scene_codec::ArrayDecoder;
use vtk_scene_port::{
    FetchArrayFn, PortError, RenderSurface, Renderer, SceneDiff, SynchronizedBackend,
    SynchronizedSurface, SynchronizerContext,
};

use crate::camera_bridge::CameraBridge;
use crate::config::ViewConfig;
use crate::keys::{KeyboardFocus, ViewId};
use crate::model::{Property, SharedModel};
use crate::view::{View, ViewCore};
use crate::ViewError;

/// Fetch callback resolving array hashes through `registry`.
///
/// Hashes that are not decoded yet resolve once their decode lands; a failed
/// decode surfaces as [`PortError::Fetch`].
pub fn registry_fetcher(registry: &Rc<ResourceRegistry>) -> FetchArrayFn {
    let registry = Rc::clone(registry);
    Rc::new(move |hash: &str| {
        registry
            .request(&ArrayHash::from(hash))
            .map_err(|err| PortError::Fetch(err.to_string()))
            .boxed_local()
    })
}

fn random_context_name() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(11)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect()
}

/// View applying the model's `scene` diff through a synchronizer context.
///
/// Array payloads referenced by the diff arrive separately in `arrays`; they
/// are decoded in the background on `spawner` and announced once per batch
/// through `arrays_processed`.
pub struct SynchronizedPlotView {
    core: Rc<ViewCore>,
    backend: Rc<dyn SynchronizedBackend>,
    context: Rc<dyn SynchronizerContext>,
    decoder: ArrayDecoder,
    spawner: Rc<dyn LocalSpawn>,
    surface: RefCell<Option<Rc<dyn SynchronizedSurface>>>,
}

impl SynchronizedPlotView {
    /// Unmounted view joining the context named by the model, or a fresh
    /// view-local one when the name is empty.
    pub fn new(
        model: SharedModel,
        backend: Rc<dyn SynchronizedBackend>,
        config: ViewConfig,
        focus: Rc<KeyboardFocus>,
        spawner: Rc<dyn LocalSpawn>,
    ) -> Self {
        let configured = model.borrow().context_name.clone();
        let name = if configured.is_empty() {
            random_context_name()
        } else {
            configured
        };
        let context = backend.synchronizer_context(&name);
        let registry = Rc::new(ResourceRegistry::new());
        let core = ViewCore::new(model, config, focus);
        debug!(view = %core.id(), context = %name, "synchronized view created");
        Self {
            core,
            backend,
            context,
            decoder: ArrayDecoder::new(registry),
            spawner,
            surface: RefCell::new(None),
        }
    }

    /// Name of the synchronizer context this view uses.
    pub fn context_name(&self) -> String {
        self.context.name()
    }

    /// Registry decoded arrays land in.
    pub fn registry(&self) -> &Rc<ResourceRegistry> {
        self.decoder.registry()
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

    fn sync_surface(&self) -> Result<Rc<dyn SynchronizedSurface>, ViewError> {
        self.surface.borrow().clone().ok_or(ViewError::NotMounted)
    }

    fn try_mount(&self, previous: Option<Rc<dyn Renderer>>) -> Result<(), ViewError> {
        let surface = self
            .backend
            .create_synchronized_surface(&self.core.container(), &self.context)?;
        *self.surface.borrow_mut() = Some(Rc::clone(&surface));
        let base: Rc<dyn RenderSurface> = surface.clone();
        self.core.attach(base, &*self.backend)?;

        if let Some(renderer) = previous {
            debug!(view = %self.core.id(), "re-attaching preserved renderer");
            surface.add_renderer(renderer);
            self.core.hook_camera(true)?;
        } else {
            surface.clear_one_time_updaters();
            self.decode_arrays()?;
            self.synchronize()?;
        }

        if let Ok(renderer) = self.core.renderer() {
            renderer.reset_camera_clipping_range();
        }
        self.core.render()?;
        self.core.expose_renderer();
        Ok(())
    }

    /// Start decoding every array not seen before.
    ///
    /// The batch runs on the spawner; once all of it settled the processed
    /// hashes are appended to a fresh copy of `arrays_processed`, written
    /// back once. Failed hashes are not listed.
    fn decode_arrays(&self) -> Result<(), ViewError> {
        let arrays = self.core.model().borrow().arrays.clone();
        let batch = self.decoder.decode_all(&arrays);
        let model = Rc::downgrade(self.core.model());
        let view = self.core.id();
        let task = async move {
            let report = batch.await;
            for (hash, reason) in &report.failed {
                warn!(%view, %hash, %reason, "array left out of arrays_processed");
            }
            if report.processed.is_empty() {
                return;
            }
            let Some(model) = model.upgrade() else {
                trace!(%view, "model dropped before decode batch finished");
                return;
            };
            let mut model = model.borrow_mut();
            let mut processed = model.arrays_processed.clone();
            processed.extend(report.processed.iter().map(|hash| hash.as_str().to_owned()));
            debug!(%view, count = report.processed.len(), "arrays processed");
            model.write_arrays_processed(processed);
        };
        self.spawner
            .spawn_local(task)
            .map_err(|err| ViewError::Spawn(err.to_string()))
    }

    /// Apply the model's scene diff.
    ///
    /// The envelope is checked before anything is touched. Once the camera
    /// is unhooked it is hooked again on every exit path, so a diff the
    /// engine rejects leaves the view mounted and in sync.
    fn synchronize(&self) -> Result<(), ViewError> {
        let surface = self.sync_surface()?;
        let scene = self.core.model().borrow().scene.clone();
        let envelope = if scene.is_empty() {
            trace!(view = %self.core.id(), "empty scene");
            None
        } else {
            let root = scene.root_renderer_id().ok_or_else(|| {
                ViewError::MalformedScene("first dependency carries no renderer id".into())
            })?;
            let view_id = scene
                .id()
                .ok_or_else(|| ViewError::MalformedScene("scene carries no id".into()))?;
            Some((root, view_id))
        };

        debug!(view = %self.core.id(), "synchronize start");
        self.context
            .set_fetch_array_function(registry_fetcher(self.decoder.registry()));
        self.core.unhook_camera();

        let applied = self
            .apply_scene(&*surface, &scene, envelope)
            .and_then(|()| self.core.render());
        let rehooked = if self.core.renderer().is_ok() {
            self.core.hook_camera(true)
        } else {
            Ok(())
        };
        self.core.reattach_orientation();
        self.core.expose_renderer();

        if let Err(err) = &applied {
            error!(view = %self.core.id(), %err, "synchronize failed");
        }
        applied?;
        rehooked?;
        debug!(view = %self.core.id(), "synchronize end");
        Ok(())
    }

    fn apply_scene(
        &self,
        surface: &dyn SynchronizedSurface,
        scene: &SceneDiff,
        envelope: Option<(String, String)>,
    ) -> Result<(), ViewError> {
        let Some((root, view_id)) = envelope else {
            return Ok(());
        };
        if let Some(renderer) = self.context.renderer_instance(&root) {
            if surface.renderer().is_none() {
                surface.add_renderer(renderer);
            }
        }
        surface.set_synchronized_view_id(&view_id);
        surface.synchronize(scene)?;
        Ok(())
    }
}

impl View for SynchronizedPlotView {
    fn id(&self) -> ViewId {
        self.core.id()
    }

    fn model(&self) -> &SharedModel {
        self.core.model()
    }

    fn mount(&self) -> Result<(), ViewError> {
        let previous = self.core.renderer().ok();
        if self.core.is_mounted() {
            self.teardown();
        }
        debug!(view = %self.core.id(), preserved = previous.is_some(), "mount start");
        self.try_mount(previous).map_err(|err| {
            self.surface.borrow_mut().take();
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
            Property::Arrays => self.decode_arrays(),
            Property::Scene => self.synchronize(),
            Property::OneTimeReset => {
                self.sync_surface()?.clear_one_time_updaters();
                Ok(())
            }
            Property::Camera if self.core.renderer().is_err() => {
                trace!(view = %self.core.id(), "camera change before first scene");
                Ok(())
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
        self.surface.borrow_mut().take();
        self.core.teardown();
    }

    fn is_mounted(&self) -> bool {
        self.core.is_mounted()
    }
}

impl Drop for SynchronizedPlotView {
    fn drop(&mut self) {
        if self.core.is_mounted() {
            self.teardown();
        }
    }
}
