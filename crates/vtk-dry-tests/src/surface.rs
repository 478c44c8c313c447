// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Render window double, static and synchronized.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use futures::future::LocalBoxFuture;
use vtk_scene_port::{
    Container, Interactor, OverlayCanvas, PortError, RenderSurface, Renderer, SceneDiff,
    SynchronizedSurface, SynchronizerContext,
};

use crate::backend::{MockSynchronizerContext, MockWorld};
use crate::{MockInteractor, MockOverlay};

type PendingFetch = (String, LocalBoxFuture<'static, Result<Arc<[u8]>, PortError>>);

/// Surface double.
///
/// A static surface owns a renderer from the start. A synchronized surface
/// has none until the first diff names one (or one is attached through
/// `add_renderer`). Array references in applied diffs are fetched through the
/// context's fetch function; the futures are parked for tests to drive.
pub struct MockSurface {
    /// Surface identity, unique per world.
    pub id: u64,
    /// Container the surface was built in.
    pub container: Container,
    renderer: RefCell<Option<Rc<dyn Renderer>>>,
    /// Input router.
    pub interactor: Rc<MockInteractor>,
    overlay: RefCell<Option<Rc<MockOverlay>>>,
    /// Frames drawn.
    pub renders: Cell<u32>,
    /// Resize requests.
    pub resizes: Cell<u32>,
    /// Set once `dispose` ran.
    pub disposed: Cell<bool>,
    context: Option<Rc<MockSynchronizerContext>>,
    world: Weak<MockWorld>,
    /// One-time updater clears.
    pub one_time_clears: Cell<u32>,
    /// Last synchronized view id.
    pub view_id: RefCell<Option<String>>,
    /// Every diff applied, in order.
    pub synchronized: RefCell<Vec<SceneDiff>>,
    /// Number of `add_renderer` calls.
    pub added_renderers: Cell<u32>,
    /// Make the next `synchronize` fail.
    pub fail_next_synchronize: Cell<bool>,
    fetches: RefCell<Vec<PendingFetch>>,
}

impl MockSurface {
    pub(crate) fn new(
        id: u64,
        container: Container,
        renderer: Option<Rc<dyn Renderer>>,
        context: Option<Rc<MockSynchronizerContext>>,
        world: Weak<MockWorld>,
    ) -> Self {
        Self {
            id,
            container,
            renderer: RefCell::new(renderer),
            interactor: Rc::new(MockInteractor::new()),
            overlay: RefCell::new(None),
            renders: Cell::new(0),
            resizes: Cell::new(0),
            disposed: Cell::new(false),
            context,
            world,
            one_time_clears: Cell::new(0),
            view_id: RefCell::new(None),
            synchronized: RefCell::new(Vec::new()),
            added_renderers: Cell::new(0),
            fail_next_synchronize: Cell::new(false),
            fetches: RefCell::new(Vec::new()),
        }
    }

    /// The overlay canvas, if anything asked for it.
    pub fn overlay(&self) -> Option<Rc<MockOverlay>> {
        self.overlay.borrow().clone()
    }

    /// The context this surface synchronizes through.
    pub fn context(&self) -> Option<&Rc<MockSynchronizerContext>> {
        self.context.as_ref()
    }

    /// Take every array fetch started by `synchronize` so far.
    pub fn take_fetches(&self) -> Vec<PendingFetch> {
        std::mem::take(&mut *self.fetches.borrow_mut())
    }
}

impl RenderSurface for MockSurface {
    fn renderer(&self) -> Option<Rc<dyn Renderer>> {
        self.renderer.borrow().clone()
    }

    fn interactor(&self) -> Rc<dyn Interactor> {
        Rc::clone(&self.interactor) as Rc<dyn Interactor>
    }

    fn overlay_canvas(&self) -> Rc<dyn OverlayCanvas> {
        let overlay = Rc::clone(
            self.overlay
                .borrow_mut()
                .get_or_insert_with(|| Rc::new(MockOverlay::default())),
        );
        overlay as Rc<dyn OverlayCanvas>
    }

    fn resize(&self) {
        self.resizes.set(self.resizes.get() + 1);
    }

    fn render(&self) {
        self.renders.set(self.renders.get() + 1);
    }

    fn dispose(&self) {
        self.disposed.set(true);
    }
}

impl SynchronizedSurface for MockSurface {
    fn add_renderer(&self, renderer: Rc<dyn Renderer>) {
        self.added_renderers.set(self.added_renderers.get() + 1);
        *self.renderer.borrow_mut() = Some(renderer);
    }

    fn clear_one_time_updaters(&self) {
        self.one_time_clears.set(self.one_time_clears.get() + 1);
    }

    fn set_synchronized_view_id(&self, id: &str) {
        *self.view_id.borrow_mut() = Some(id.to_owned());
    }

    fn synchronize(&self, scene: &SceneDiff) -> Result<(), PortError> {
        if self.disposed.get() {
            return Err(PortError::Invariant("synchronize on a disposed surface".into()));
        }
        if self.fail_next_synchronize.replace(false) {
            return Err(PortError::Backend("scene diff rejected".into()));
        }
        let context = self
            .context
            .as_ref()
            .ok_or_else(|| PortError::Invariant("surface has no synchronizer context".into()))?;
        if !scene.is_empty() {
            let root = scene
                .root_renderer_id()
                .ok_or_else(|| PortError::Invariant("scene diff names no renderer".into()))?;
            let renderer = match context.renderer_instance(&root) {
                Some(existing) => existing,
                None => {
                    let world = self
                        .world
                        .upgrade()
                        .ok_or_else(|| PortError::Backend("mock world dropped".into()))?;
                    let created = world.new_renderer();
                    context.register(&root, Rc::clone(&created));
                    created
                }
            };
            if self.renderer.borrow().is_none() {
                self.add_renderer(renderer);
            }
            for hash in scene.array_hashes() {
                if let Some(fut) = context.fetch(&hash) {
                    self.fetches.borrow_mut().push((hash, fut));
                }
            }
        }
        self.synchronized.borrow_mut().push(scene.clone());
        Ok(())
    }
}
