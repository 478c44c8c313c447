// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! View controllers embedding a VTK renderer inside a host-managed panel.
//!
//! The host framework owns a [`ViewModel`] and reports property changes to a
//! [`View`]; the view mutates the engine through the `vtk-scene-port` traits
//! and writes camera state and decode progress back into the model.
//!
//! Two views are provided: [`PlotView`] loads a literal scene, and
//! [`SynchronizedPlotView`] applies server-pushed scene diffs whose array
//! payloads arrive out of band through the decode pipeline.

use thiserror::Error;

pub mod config;

mod camera_bridge;
mod keys;
mod model;
mod orientation;
mod plot;
mod synchronized;
mod view;

pub use camera_bridge::CameraBridge;
pub use config::{ConfigError, ConfigService, ConfigStore, MemoryConfigStore, ViewConfig};
pub use keys::{KeyBindingBridge, KeyboardFocus, ViewId};
pub use model::{Property, SharedModel, ViewModel};
pub use orientation::{snap_camera, OrientationWidget};
pub use plot::PlotView;
pub use synchronized::{registry_fetcher, SynchronizedPlotView};
pub use view::View;

/// Errors surfaced by view lifecycle operations.
#[derive(Debug, Error)]
pub enum ViewError {
    /// Operation requires a mounted view.
    #[error("view is not mounted")]
    NotMounted,
    /// Operation needs a renderer the surface does not have (yet).
    #[error("renderer unavailable: {0}")]
    RendererUnavailable(&'static str),
    /// Scene diff envelope is missing required fields.
    #[error("malformed scene: {0}")]
    MalformedScene(String),
    /// Background decode batch could not be scheduled.
    #[error("spawn failed: {0}")]
    Spawn(String),
    /// Engine-side failure.
    #[error(transparent)]
    Port(#[from] vtk_scene_port::PortError),
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
