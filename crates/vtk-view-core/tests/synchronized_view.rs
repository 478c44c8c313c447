// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Synchronized plot view: scene diffs, out-of-band arrays, context sharing.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::float_cmp)]

use std::collections::BTreeMap;
use std::rc::Rc;

use futures::executor::{block_on, LocalPool};
use serde_json::json;
use vtk_array_cas::ArrayError;
use vtk_dry_tests::{MockBackend, MockSurface};
use vtk_scene_codec::encode_array_archive;
use vtk_scene_port::{Camera, CameraSnapshot, RenderSurface, SceneDiff, SynchronizedBackend};
use vtk_view_core::{
    registry_fetcher, KeyboardFocus, Property, SharedModel, SynchronizedPlotView, View,
    ViewConfig, ViewError, ViewModel,
};

fn scene() -> SceneDiff {
    SceneDiff::new(json!({
        "id": "view-1",
        "dependencies": [{
            "id": "renderer-1",
            "dependencies": [{
                "id": "actor-1",
                "arrays": [{"hash": "A"}, {"hash": "B"}]
            }]
        }]
    }))
}

fn archives(entries: &[(&str, &[u8])]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(hash, bytes)| ((*hash).to_owned(), encode_array_archive(hash, bytes).unwrap()))
        .collect()
}

struct Harness {
    pool: LocalPool,
    backend: Rc<MockBackend>,
}

impl Harness {
    fn new() -> Self {
        Self {
            pool: LocalPool::new(),
            backend: Rc::new(MockBackend::new()),
        }
    }

    fn view(&self, setup: impl FnOnce(&mut ViewModel)) -> (SynchronizedPlotView, SharedModel) {
        let mut model = ViewModel::default();
        setup(&mut model);
        let model = model.shared();
        let view = SynchronizedPlotView::new(
            Rc::clone(&model),
            Rc::clone(&self.backend) as Rc<dyn SynchronizedBackend>,
            ViewConfig::default(),
            KeyboardFocus::new(),
            Rc::new(self.pool.spawner()),
        );
        (view, model)
    }

    fn surface(&self) -> Rc<MockSurface> {
        self.backend.world().last_surface().unwrap()
    }
}

fn processed_sorted(model: &SharedModel) -> Vec<String> {
    let mut out = model.borrow().arrays_processed.clone();
    out.sort();
    out
}

fn processed_signals(model: &SharedModel) -> usize {
    model
        .borrow_mut()
        .take_outbound()
        .into_iter()
        .filter(|p| *p == Property::ArraysProcessed)
        .count()
}

#[test]
fn batch_completion_is_signalled_once() {
    let mut h = Harness::new();
    let (view, model) = h.view(|m| {
        m.arrays = archives(&[("A", &b"aa"[..]), ("B", &b"bbb"[..]), ("C", &b"c"[..])]);
    });
    view.mount().unwrap();
    assert!(model.borrow().arrays_processed.is_empty());

    h.pool.run_until_stalled();

    assert_eq!(processed_sorted(&model), ["A", "B", "C"]);
    assert_eq!(processed_signals(&model), 1);
    assert_eq!(&*view.registry().get("B").unwrap(), b"bbb");
}

#[test]
fn repeated_arrays_signal_decodes_only_new_hashes() {
    let mut h = Harness::new();
    let (view, model) = h.view(|m| m.arrays = archives(&[("A", &b"1"[..]), ("B", &b"2"[..])]));
    view.mount().unwrap();
    h.pool.run_until_stalled();
    processed_signals(&model);

    view.on_change(Property::Arrays).unwrap();
    h.pool.run_until_stalled();
    assert_eq!(processed_signals(&model), 0);

    let mut grown = model.borrow().arrays.clone();
    grown.extend(archives(&[("D", &b"4"[..])]));
    model.borrow_mut().arrays = grown;
    view.on_change(Property::Arrays).unwrap();
    h.pool.run_until_stalled();

    assert_eq!(model.borrow().arrays_processed.last().map(String::as_str), Some("D"));
    assert_eq!(processed_sorted(&model), ["A", "B", "D"]);
    assert_eq!(processed_signals(&model), 1);
    assert_eq!(view.registry().resolved_count(), 3);
}

#[test]
fn failed_decode_is_left_out_and_rejects_its_waiters() {
    let mut h = Harness::new();
    let (view, model) = h.view(|m| {
        m.arrays = archives(&[("good", &b"ok"[..])]);
        m.arrays.insert("bad".into(), "@@ not an archive @@".into());
    });
    view.mount().unwrap();
    let waiter = view.registry().request(&"bad".into());

    h.pool.run_until_stalled();

    assert_eq!(processed_sorted(&model), ["good"]);
    match block_on(waiter) {
        Err(ArrayError::DecodeFailed { hash, .. }) => assert_eq!(hash.as_str(), "bad"),
        other => panic!("expected decode failure, got {other:?}"),
    }
}

#[test]
fn synchronize_attaches_renderer_and_fetches_arrays_through_registry() {
    let mut h = Harness::new();
    let (view, model) = h.view(|m| {
        m.scene = scene();
        m.arrays = archives(&[("A", &b"alpha"[..]), ("B", &b"beta"[..])]);
    });
    view.mount().unwrap();
    let surface = h.surface();

    assert_eq!(surface.view_id.borrow().as_deref(), Some("view-1"));
    assert_eq!(surface.synchronized.borrow().len(), 1);
    assert_eq!(surface.one_time_clears.get(), 1);
    assert!(surface.context().unwrap().has_fetch());
    assert!(model.borrow().renderer().is_some());

    // Both the synchronizer and an unrelated requester wait on the same decode.
    let fetches = surface.take_fetches();
    assert_eq!(fetches.len(), 2);
    let second = registry_fetcher(view.registry())("A");
    h.pool.run_until_stalled();

    for (hash, fetch) in fetches {
        let bytes = block_on(fetch).unwrap();
        let expected: &[u8] = if hash == "A" { b"alpha" } else { b"beta" };
        assert_eq!(&*bytes, expected);
    }
    assert_eq!(&*block_on(second).unwrap(), b"alpha");
}

#[test]
fn synchronize_rehooks_camera_and_reattaches_orientation_marker() {
    let h = Harness::new();
    let (view, model) = h.view(|m| {
        m.scene = scene();
        m.orientation_widget = true;
    });
    view.mount().unwrap();
    let renderer = h
        .backend
        .world()
        .mock_renderer(&model.borrow().renderer().unwrap())
        .unwrap();
    let gizmo = h.backend.world().last_gizmo().unwrap();
    assert_eq!(renderer.camera.observer_count(), 1);
    assert_eq!(*gizmo.enable_history.borrow(), vec![true, false, true]);

    view.on_change(Property::Scene).unwrap();
    assert_eq!(renderer.camera.observer_count(), 1);
    assert_eq!(h.surface().synchronized.borrow().len(), 2);
    assert_eq!(gizmo.enable_history.borrow().len(), 5);

    let renders = h.surface().interactor.renders.get();
    renderer.camera.set_position([0.0, 3.0, 0.0]);
    assert_eq!(h.surface().interactor.renders.get(), renders + 1);
    let pushed = model.borrow().camera.clone().unwrap();
    assert_eq!(pushed.vector("position"), Some([0.0, 3.0, 0.0]));
}

fn assert_camera_still_synced(h: &Harness, view: &SynchronizedPlotView, model: &SharedModel) {
    assert!(view.is_mounted());
    assert!(model.borrow().renderer().is_some());
    let renderer = h.backend.world().renderers()[0].clone();
    assert_eq!(renderer.camera.observer_count(), 1);
    renderer.camera.set_position([7.0, 0.0, 0.0]);
    let pushed = model.borrow().camera.clone().unwrap();
    assert_eq!(pushed.vector("position"), Some([7.0, 0.0, 0.0]));
}

#[test]
fn malformed_scene_change_keeps_camera_sync() {
    let h = Harness::new();
    let (view, model) = h.view(|m| m.scene = scene());
    view.mount().unwrap();

    model.borrow_mut().scene = SceneDiff::new(json!({"id": "view-1"}));
    assert!(matches!(
        view.on_change(Property::Scene),
        Err(ViewError::MalformedScene(_))
    ));

    assert_eq!(h.surface().synchronized.borrow().len(), 1);
    assert_camera_still_synced(&h, &view, &model);
}

#[test]
fn rejected_scene_change_rehooks_camera_and_marker() {
    let h = Harness::new();
    let (view, model) = h.view(|m| {
        m.scene = scene();
        m.orientation_widget = true;
    });
    view.mount().unwrap();
    let gizmo = h.backend.world().last_gizmo().unwrap();
    let toggles = gizmo.enable_history.borrow().len();

    h.surface().fail_next_synchronize.set(true);
    assert!(matches!(view.on_change(Property::Scene), Err(ViewError::Port(_))));

    assert_eq!(gizmo.enable_history.borrow().len(), toggles + 2);
    assert_camera_still_synced(&h, &view, &model);
}

#[test]
fn remount_preserves_the_synchronized_renderer() {
    let h = Harness::new();
    let (view, model) = h.view(|m| m.scene = scene());
    view.mount().unwrap();
    let first = h.surface();
    let renderer = first.renderer().unwrap();

    view.mount().unwrap();
    let second = h.surface();

    assert!(first.disposed.get());
    assert_eq!(second.added_renderers.get(), 1);
    assert!(second.synchronized.borrow().is_empty());
    assert_eq!(second.one_time_clears.get(), 0);
    assert!(Rc::ptr_eq(&second.renderer().unwrap(), &renderer));
    assert_eq!(h.backend.world().renderers().len(), 1);
    assert_eq!(model.borrow().actors().len(), 0);
    assert!(model.borrow().renderer().is_some());
}

#[test]
fn teardown_then_mount_starts_clean() {
    let h = Harness::new();
    let (view, _model) = h.view(|m| m.scene = scene());
    view.mount().unwrap();
    let renderer = h.backend.world().renderers()[0].clone();

    view.teardown();
    assert_eq!(renderer.camera.observer_count(), 0);
    view.mount().unwrap();

    let surface = h.surface();
    assert_eq!(surface.one_time_clears.get(), 1);
    assert_eq!(surface.synchronized.borrow().len(), 1);
    // The context still knows the renderer node, so it is re-used.
    assert_eq!(h.backend.world().renderers().len(), 1);
}

#[test]
fn one_time_reset_clears_updaters() {
    let h = Harness::new();
    let (view, model) = h.view(|_| {});
    view.mount().unwrap();

    model.borrow_mut().one_time_reset = true;
    view.on_change(Property::OneTimeReset).unwrap();

    assert_eq!(h.surface().one_time_clears.get(), 2);
}

#[test]
fn empty_scene_mounts_without_renderer() {
    let h = Harness::new();
    let (view, model) = h.view(|_| {});
    view.mount().unwrap();

    assert!(view.is_mounted());
    assert!(model.borrow().renderer().is_none());
    assert!(model.borrow().actors().is_empty());

    model.borrow_mut().camera = Some(Default::default());
    view.on_change(Property::Camera).unwrap();
}

#[test]
fn malformed_scene_fails_the_mount() {
    let h = Harness::new();
    let (view, model) = h.view(|m| m.scene = SceneDiff::new(json!({"id": "v"})));

    assert!(matches!(view.mount(), Err(ViewError::MalformedScene(_))));
    assert!(!view.is_mounted());
    assert!(h.surface().disposed.get());
    assert!(model.borrow().renderer().is_none());
}

#[test]
fn named_context_is_shared_between_views() {
    let h = Harness::new();
    let (left, _) = h.view(|m| m.context_name = "shared".into());
    let (right, _) = h.view(|m| m.context_name = "shared".into());

    assert_eq!(left.context_name(), "shared");
    assert_eq!(right.context_name(), "shared");
    assert_eq!(h.backend.world().contexts().len(), 1);
}

#[test]
fn unnamed_views_get_distinct_random_contexts() {
    let h = Harness::new();
    let (left, _) = h.view(|_| {});
    let (right, _) = h.view(|_| {});

    let name = left.context_name();
    assert_ne!(name, right.context_name());
    assert!(!name.is_empty());
    assert!(name
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    assert_eq!(h.backend.world().contexts().len(), 2);
}

#[test]
fn camera_change_pulls_into_synchronized_renderer() {
    let h = Harness::new();
    let (view, model) = h.view(|m| m.scene = scene());
    view.mount().unwrap();
    let renderer = h.backend.world().renderers()[0].clone();
    let fields = serde_json::from_value(json!({"position": [2.0, 0.0, 0.0]})).unwrap();

    model.borrow_mut().camera = Some(CameraSnapshot::from_engine(fields));
    view.on_change(Property::Camera).unwrap();

    assert_eq!(renderer.camera.position(), [2.0, 0.0, 0.0]);
    assert_eq!(view.camera_bridge().suppressed_count(), 1);
}
