// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Renderer capability contract for embedded VTK plot views.
//!
//! This crate defines the boundary between the view controllers and the
//! external rendering engine. It contains NO rendering logic: engines plug in
//! behind [`RenderBackend`] (and [`SynchronizedBackend`] for server-driven
//! scenes), and the controllers only ever talk to these traits.
//!
//! # Design Principles
//!
//! - **Handles are shared**: Engine objects are reference-counted and mutate
//!   through `&self`, the same way they do inside the engine's own event loop.
//! - **Single-threaded**: Every handle lives on the UI event thread. Nothing
//!   here is `Send`.
//! - **Scenes are opaque**: Scene diffs are carried as JSON; only the envelope
//!   fields (`id`, `dependencies[0].id`) are interpreted.

use thiserror::Error;

/// Error type for backend operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    /// The engine failed to build or mutate an object.
    #[error("backend error: {0}")]
    Backend(String),
    /// An envelope invariant was violated (e.g., a scene without an id).
    #[error("invariant violation: {0}")]
    Invariant(String),
    /// An array payload could not be fetched for synchronization.
    #[error("array fetch failed: {0}")]
    Fetch(String),
}

mod axes;
mod camera;
mod input;
mod port;
mod scene;

pub use axes::{AxesActors, AxesDescriptor, Ticker};
pub use camera::{major_axis, CameraFields, CameraSnapshot, INTERNAL_CAMERA_FIELDS};
pub use input::{KeyEvent, KeyEventKind};
pub use port::{
    ActorHandle, ActorId, Camera, Container, FetchArrayFn, GizmoPlacement, Interactor,
    OrientationGizmo, OverlayCanvas, RenderBackend, RenderSurface, Renderer, SubscriptionId,
    SynchronizedBackend, SynchronizedSurface, SynchronizerContext, ViewportCorner,
};
pub use scene::{SceneData, SceneDiff};
