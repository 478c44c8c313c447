// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lifecycle shared by every plot view.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, error, trace};
use vtk_scene_port::{
    AxesActors, Camera, Container, RenderBackend, RenderSurface, Renderer, SubscriptionId,
};

use crate::camera_bridge::CameraBridge;
use crate::config::ViewConfig;
use crate::keys::{KeyBindingBridge, KeyboardFocus, ViewId};
use crate::model::{Property, SharedModel};
use crate::orientation::{snap_camera, OrientationWidget};
use crate::ViewError;

/// A plot view driven by its host framework.
///
/// States: unmounted, mounted, unmounted again after [`View::teardown`].
/// Property changes reported while unmounted are picked up by the next mount.
pub trait View {
    /// Identity used for keyboard focus and logging.
    fn id(&self) -> ViewId;

    /// The model this view observes.
    fn model(&self) -> &SharedModel;

    /// Build the surface and sync it with the model. Calling it on a mounted
    /// view re-mounts. A failed mount leaves the view unmounted.
    fn mount(&self) -> Result<(), ViewError>;

    /// The host layout settled; fit the surface to its container.
    fn after_layout(&self) -> Result<(), ViewError>;

    /// The host changed `property` on the model.
    fn on_change(&self, property: Property) -> Result<(), ViewError>;

    /// Pointer entered the view's bounding box.
    fn pointer_enter(&self);

    /// Pointer left the view's bounding box.
    fn pointer_leave(&self);

    /// Release the surface and every subscription.
    fn teardown(&self);

    /// `true` between a successful mount and teardown.
    fn is_mounted(&self) -> bool;
}

struct CameraHook {
    camera: Rc<dyn Camera>,
    id: SubscriptionId,
}

/// State and behaviour common to the static and synchronized views.
pub(crate) struct ViewCore {
    id: ViewId,
    model: SharedModel,
    config: ViewConfig,
    bridge: CameraBridge,
    keys: KeyBindingBridge,
    surface: RefCell<Option<Rc<dyn RenderSurface>>>,
    orientation: RefCell<Option<OrientationWidget>>,
    axes: RefCell<Option<AxesActors>>,
    camera_hook: RefCell<Option<CameraHook>>,
}

impl ViewCore {
    pub(crate) fn new(
        model: SharedModel,
        config: ViewConfig,
        focus: Rc<KeyboardFocus>,
    ) -> Rc<Self> {
        let id = ViewId::next();
        let bridge = CameraBridge::new(Rc::clone(&model), config.camera_denylist.clone());
        Rc::new(Self {
            id,
            model,
            config,
            bridge,
            keys: KeyBindingBridge::new(id, focus),
            surface: RefCell::new(None),
            orientation: RefCell::new(None),
            axes: RefCell::new(None),
            camera_hook: RefCell::new(None),
        })
    }

    pub(crate) fn id(&self) -> ViewId {
        self.id
    }

    pub(crate) fn model(&self) -> &SharedModel {
        &self.model
    }

    pub(crate) fn bridge(&self) -> &CameraBridge {
        &self.bridge
    }

    pub(crate) fn is_mounted(&self) -> bool {
        self.surface.borrow().is_some()
    }

    /// Container sized from the model, falling back to the configured default.
    pub(crate) fn container(&self) -> Container {
        let model = self.model.borrow();
        Container {
            width: model.width.unwrap_or(self.config.default_width),
            height: model.height.unwrap_or(self.config.default_height),
        }
    }

    pub(crate) fn surface(&self) -> Result<Rc<dyn RenderSurface>, ViewError> {
        self.surface.borrow().clone().ok_or(ViewError::NotMounted)
    }

    pub(crate) fn renderer(&self) -> Result<Rc<dyn Renderer>, ViewError> {
        self.surface()?
            .renderer()
            .ok_or(ViewError::RendererUnavailable("surface has no renderer"))
    }

    /// Adopt `surface`: take over its keys and build the orientation marker.
    pub(crate) fn attach(
        self: &Rc<Self>,
        surface: Rc<dyn RenderSurface>,
        backend: &dyn RenderBackend,
    ) -> Result<(), ViewError> {
        *self.surface.borrow_mut() = Some(Rc::clone(&surface));
        self.keys.bind(surface.interactor());
        let weak = Rc::downgrade(self);
        let widget = OrientationWidget::create(
            backend,
            &*surface,
            &self.config.orientation,
            move |direction| {
                if let Some(core) = weak.upgrade() {
                    core.snap(direction);
                }
            },
        )?;
        *self.orientation.borrow_mut() = Some(widget);
        let visible = self.model.borrow().orientation_widget;
        self.set_orientation_visibility(visible)
    }

    /// Subscribe to the active camera, replacing any earlier subscription.
    ///
    /// Every modification is pushed to the model; with `rerender` the marker
    /// is realigned and the interactor draws a frame as well.
    pub(crate) fn hook_camera(self: &Rc<Self>, rerender: bool) -> Result<(), ViewError> {
        self.unhook_camera();
        let camera = self.renderer()?.active_camera();
        let weak = Rc::downgrade(self);
        let id = camera.on_modified(Box::new(move || {
            if let Some(core) = weak.upgrade() {
                core.camera_modified(rerender);
            }
        }));
        *self.camera_hook.borrow_mut() = Some(CameraHook { camera, id });
        Ok(())
    }

    pub(crate) fn unhook_camera(&self) {
        let hook = self.camera_hook.borrow_mut().take();
        if let Some(hook) = hook {
            hook.camera.remove_observer(hook.id);
        }
    }

    fn camera_modified(&self, rerender: bool) {
        let Ok(renderer) = self.renderer() else {
            trace!(view = %self.id, "camera event without renderer");
            return;
        };
        self.bridge.push(&*renderer.active_camera());
        if rerender {
            if let Some(widget) = self.orientation.borrow().as_ref() {
                widget.update();
            }
            if let Ok(surface) = self.surface() {
                surface.interactor().render();
            }
        }
    }

    /// Bring model and engine camera in line after construction.
    ///
    /// The engine camera is read into the model first, then the model is
    /// pulled back once, so the engine's initial camera wins.
    pub(crate) fn sync_initial_camera(&self) -> Result<(), ViewError> {
        self.renderer()?.active_camera().modified();
        self.pull_camera()?;
        Ok(())
    }

    /// Apply the model camera, reset clipping and redraw.
    ///
    /// Returns `false` if the model held no camera to apply.
    pub(crate) fn pull_camera(&self) -> Result<bool, ViewError> {
        let renderer = self.renderer()?;
        let applied = self.bridge.pull(&*renderer);
        self.render()?;
        Ok(applied)
    }

    /// Draw one frame, realigning the marker first.
    pub(crate) fn render(&self) -> Result<(), ViewError> {
        let surface = self.surface()?;
        if let Some(widget) = self.orientation.borrow().as_ref() {
            widget.update();
        }
        surface.render();
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub(crate) fn after_layout(&self) -> Result<(), ViewError> {
        let surface = self.surface()?;
        surface.resize();
        if self.axes.borrow().is_some() {
            let container = self.container();
            let ratio = self.model.borrow().device_pixel_ratio.max(0.0);
            let scale = |css: u32| (f64::from(css) * ratio).floor() as u32;
            surface
                .overlay_canvas()
                .resize(scale(container.width), scale(container.height));
        }
        self.render()
    }

    pub(crate) fn set_orientation_visibility(&self, visible: bool) -> Result<(), ViewError> {
        if let Some(widget) = self.orientation.borrow().as_ref() {
            widget.set_visibility(visible);
        }
        self.render()
    }

    /// Force the marker to pick up a swapped renderer.
    pub(crate) fn reattach_orientation(&self) {
        let visible = self.model.borrow().orientation_widget;
        if let Some(widget) = self.orientation.borrow().as_ref() {
            widget.reattach(visible);
        }
    }

    fn snap(&self, direction: [f64; 3]) {
        let Ok(renderer) = self.renderer() else {
            trace!(view = %self.id, "snap gesture without renderer");
            return;
        };
        if snap_camera(&*renderer.active_camera(), direction) {
            renderer.reset_camera_clipping_range();
            if let Err(err) = self.render() {
                error!(view = %self.id, %err, "render after snap failed");
            }
        }
    }

    /// Replace the axis decoration with whatever the model holds now.
    pub(crate) fn refresh_axes(&self, backend: &dyn RenderBackend) -> Result<(), ViewError> {
        self.delete_axes()?;
        let descriptor = self.model.borrow().axes.clone();
        if let Some(descriptor) = descriptor {
            let renderer = self.renderer()?;
            let overlay = self.surface()?.overlay_canvas();
            let actors = backend.create_axes(&descriptor, &*overlay)?;
            for actor in actors.all() {
                renderer.add_actor(actor);
            }
            *self.axes.borrow_mut() = Some(actors);
        }
        self.render()
    }

    pub(crate) fn delete_axes(&self) -> Result<(), ViewError> {
        let actors = self.axes.borrow_mut().take();
        if let Some(actors) = actors {
            let renderer = self.renderer()?;
            for actor in actors.all() {
                renderer.remove_actor(actor);
            }
            self.surface()?.overlay_canvas().clear();
        }
        Ok(())
    }

    pub(crate) fn axes_shown(&self) -> bool {
        self.axes.borrow().is_some()
    }

    /// Publish the current renderer (if any) on the model.
    pub(crate) fn expose_renderer(&self) {
        let renderer = self.surface().ok().and_then(|surface| surface.renderer());
        self.model.borrow_mut().expose_renderer(renderer);
    }

    /// Changes every view handles the same way.
    pub(crate) fn apply_common(
        &self,
        property: Property,
        backend: &dyn RenderBackend,
    ) -> Result<(), ViewError> {
        match property {
            Property::Camera => self.pull_camera().map(|_| ()),
            Property::OrientationWidget => {
                let visible = self.model.borrow().orientation_widget;
                self.set_orientation_visibility(visible)
            }
            Property::Axes => self.refresh_axes(backend),
            Property::EnableKeybindings => {
                if !self.model.borrow().enable_keybindings {
                    self.keys.pointer_leave();
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn pointer_enter(&self) {
        let enabled = self.model.borrow().enable_keybindings;
        self.keys.pointer_enter(enabled);
    }

    pub(crate) fn pointer_leave(&self) {
        self.keys.pointer_leave();
    }

    pub(crate) fn is_capturing_keys(&self) -> bool {
        self.keys.is_capturing()
    }

    pub(crate) fn teardown(&self) {
        self.keys.unbind();
        self.unhook_camera();
        self.orientation.borrow_mut().take();
        self.axes.borrow_mut().take();
        let surface = self.surface.borrow_mut().take();
        if let Some(surface) = surface {
            surface.dispose();
        }
        self.model.borrow_mut().expose_renderer(None);
        debug!(view = %self.id, "teardown");
    }

    /// Log and unwind a failed mount.
    pub(crate) fn abort_mount(&self, err: ViewError) -> ViewError {
        error!(view = %self.id, %err, "mount failed");
        self.teardown();
        err
    }
}
