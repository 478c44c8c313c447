// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Headless test doubles for the VTK view capability contract.
//!
//! Every double records what was done to it in `Cell`/`RefCell` counters so
//! tests can assert on call sequences without an engine. [`MockBackend`] owns
//! a [`MockWorld`] through which every object it ever built stays reachable.
#![allow(clippy::missing_panics_doc)]

mod backend;
mod camera;
mod renderer;
mod surface;

pub use backend::{MockBackend, MockSynchronizerContext, MockWorld};
pub use camera::MockCamera;
pub use renderer::{MockGizmo, MockInteractor, MockOverlay, MockRenderer};
pub use surface::MockSurface;
