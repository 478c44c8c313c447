// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mock backend and the world holding everything it built.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use futures::future::LocalBoxFuture;
use vtk_scene_port::{
    ActorHandle, ActorId, AxesActors, AxesDescriptor, Container, FetchArrayFn, GizmoPlacement,
    OrientationGizmo, OverlayCanvas, PortError, RenderBackend, RenderSurface, Renderer, SceneData,
    SynchronizedBackend, SynchronizedSurface, SynchronizerContext,
};

use crate::{MockGizmo, MockRenderer, MockSurface};

/// Every object a [`MockBackend`] has built, kept reachable for assertions.
#[derive(Default)]
pub struct MockWorld {
    next_id: Cell<u64>,
    renderers: RefCell<Vec<Rc<MockRenderer>>>,
    surfaces: RefCell<Vec<Rc<MockSurface>>>,
    gizmos: RefCell<Vec<Rc<MockGizmo>>>,
    contexts: RefCell<Vec<Rc<MockSynchronizerContext>>>,
    axes: RefCell<Vec<AxesDescriptor>>,
    scenes: RefCell<Vec<SceneData>>,
}

impl MockWorld {
    fn next_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    pub(crate) fn new_renderer(&self) -> Rc<dyn Renderer> {
        let renderer = Rc::new(MockRenderer::new(self.next_id()));
        self.renderers.borrow_mut().push(Rc::clone(&renderer));
        renderer
    }

    /// The concrete double behind a renderer handle.
    pub fn mock_renderer(&self, handle: &Rc<dyn Renderer>) -> Option<Rc<MockRenderer>> {
        self.renderers
            .borrow()
            .iter()
            .find(|r| std::ptr::addr_eq(Rc::as_ptr(*r), Rc::as_ptr(handle)))
            .cloned()
    }

    /// Renderers in creation order.
    pub fn renderers(&self) -> Vec<Rc<MockRenderer>> {
        self.renderers.borrow().clone()
    }

    /// Surfaces in creation order.
    pub fn surfaces(&self) -> Vec<Rc<MockSurface>> {
        self.surfaces.borrow().clone()
    }

    /// Most recently built surface.
    pub fn last_surface(&self) -> Option<Rc<MockSurface>> {
        self.surfaces.borrow().last().cloned()
    }

    /// Gizmos in creation order.
    pub fn gizmos(&self) -> Vec<Rc<MockGizmo>> {
        self.gizmos.borrow().clone()
    }

    /// Most recently built gizmo.
    pub fn last_gizmo(&self) -> Option<Rc<MockGizmo>> {
        self.gizmos.borrow().last().cloned()
    }

    /// Synchronizer contexts in creation order.
    pub fn contexts(&self) -> Vec<Rc<MockSynchronizerContext>> {
        self.contexts.borrow().clone()
    }

    /// Every axes descriptor handed to `create_axes`.
    pub fn axes_built(&self) -> Vec<AxesDescriptor> {
        self.axes.borrow().clone()
    }

    /// Every literal scene handed to `load_scene`.
    pub fn scenes_loaded(&self) -> Vec<SceneData> {
        self.scenes.borrow().clone()
    }
}

/// Named synchronizer context double.
pub struct MockSynchronizerContext {
    name: String,
    fetch: RefCell<Option<FetchArrayFn>>,
    instances: RefCell<HashMap<String, Rc<dyn Renderer>>>,
}

impl MockSynchronizerContext {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            fetch: RefCell::new(None),
            instances: RefCell::new(HashMap::new()),
        }
    }

    /// `true` once a fetch function was installed.
    pub fn has_fetch(&self) -> bool {
        self.fetch.borrow().is_some()
    }

    /// Start a fetch through the installed function, if any.
    pub fn fetch(
        &self,
        hash: &str,
    ) -> Option<LocalBoxFuture<'static, Result<Arc<[u8]>, PortError>>> {
        let fetch = self.fetch.borrow().clone()?;
        Some(fetch(hash))
    }

    /// Register a renderer node under `id`.
    pub fn register(&self, id: &str, renderer: Rc<dyn Renderer>) {
        self.instances.borrow_mut().insert(id.to_owned(), renderer);
    }

    /// Number of registered renderer nodes.
    pub fn instance_count(&self) -> usize {
        self.instances.borrow().len()
    }
}

impl SynchronizerContext for MockSynchronizerContext {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn set_fetch_array_function(&self, fetch: FetchArrayFn) {
        *self.fetch.borrow_mut() = Some(fetch);
    }

    fn renderer_instance(&self, id: &str) -> Option<Rc<dyn Renderer>> {
        self.instances.borrow().get(id).cloned()
    }
}

/// Backend double building mock objects into a shared [`MockWorld`].
#[derive(Default)]
pub struct MockBackend {
    world: Rc<MockWorld>,
    fail_next_surface: Cell<bool>,
}

impl MockBackend {
    /// Backend with an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything this backend built.
    pub fn world(&self) -> &Rc<MockWorld> {
        &self.world
    }

    /// Make the next surface construction fail.
    pub fn fail_next_surface(&self) {
        self.fail_next_surface.set(true);
    }

    fn check_surface_failure(&self) -> Result<(), PortError> {
        if self.fail_next_surface.replace(false) {
            return Err(PortError::Backend("render window creation failed".into()));
        }
        Ok(())
    }

    fn actor(&self, kind: &str) -> ActorHandle {
        ActorHandle {
            id: ActorId(self.world.next_id()),
            kind: kind.to_owned(),
        }
    }
}

impl RenderBackend for MockBackend {
    fn create_surface(&self, container: &Container) -> Result<Rc<dyn RenderSurface>, PortError> {
        self.check_surface_failure()?;
        let renderer = self.world.new_renderer();
        let surface = Rc::new(MockSurface::new(
            self.world.next_id(),
            *container,
            Some(renderer),
            None,
            Rc::downgrade(&self.world),
        ));
        self.world.surfaces.borrow_mut().push(Rc::clone(&surface));
        Ok(surface)
    }

    fn create_orientation_gizmo(
        &self,
        _surface: &dyn RenderSurface,
        placement: &GizmoPlacement,
    ) -> Result<Rc<dyn OrientationGizmo>, PortError> {
        let gizmo = Rc::new(MockGizmo::new(*placement));
        self.world.gizmos.borrow_mut().push(Rc::clone(&gizmo));
        Ok(gizmo)
    }

    fn create_axes(
        &self,
        descriptor: &AxesDescriptor,
        _overlay: &dyn OverlayCanvas,
    ) -> Result<AxesActors, PortError> {
        self.world.axes.borrow_mut().push(descriptor.clone());
        Ok(AxesActors {
            points: self.actor("axes-points"),
            axes: self.actor("axes-lines"),
            grid: self.actor("axes-grid"),
        })
    }

    fn load_scene(
        &self,
        renderer: &dyn Renderer,
        data: &SceneData,
    ) -> Result<Vec<ActorHandle>, PortError> {
        self.world.scenes.borrow_mut().push(data.clone());
        if data.0.is_empty() {
            return Ok(Vec::new());
        }
        let actor = self.actor("scene");
        renderer.add_actor(&actor);
        Ok(vec![actor])
    }
}

impl SynchronizedBackend for MockBackend {
    fn synchronizer_context(&self, name: &str) -> Rc<dyn SynchronizerContext> {
        let existing = self
            .world
            .contexts
            .borrow()
            .iter()
            .find(|ctx| ctx.name == name)
            .cloned();
        existing.unwrap_or_else(|| {
            let created = Rc::new(MockSynchronizerContext::new(name));
            self.world.contexts.borrow_mut().push(Rc::clone(&created));
            created
        })
    }

    fn create_synchronized_surface(
        &self,
        container: &Container,
        context: &Rc<dyn SynchronizerContext>,
    ) -> Result<Rc<dyn SynchronizedSurface>, PortError> {
        self.check_surface_failure()?;
        let mock_context = self
            .world
            .contexts
            .borrow()
            .iter()
            .find(|ctx| std::ptr::addr_eq(Rc::as_ptr(*ctx), Rc::as_ptr(context)))
            .cloned()
            .ok_or_else(|| PortError::Backend("context not built by this backend".into()))?;
        let surface = Rc::new(MockSurface::new(
            self.world.next_id(),
            *container,
            None,
            Some(mock_context),
            Rc::downgrade(&self.world),
        ));
        self.world.surfaces.borrow_mut().push(Rc::clone(&surface));
        Ok(surface)
    }
}
