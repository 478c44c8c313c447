// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Axis decoration descriptor and the actors built from it.

use serde::{Deserialize, Serialize};

use crate::port::ActorHandle;

/// Tick positions (and optional labels) along one axis.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    /// Tick positions in world units.
    pub ticks: Vec<f64>,
    /// Optional tick labels; positions are formatted with `digits` when absent.
    #[serde(default)]
    pub labels: Option<Vec<String>>,
}

/// Axis decoration drawn around the scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxesDescriptor {
    /// X axis ticks.
    pub xticker: Option<Ticker>,
    /// Y axis ticks.
    pub yticker: Option<Ticker>,
    /// Z axis ticks.
    pub zticker: Option<Ticker>,
    /// Where the three axes meet; the lower tick bound of each axis when absent.
    pub origin: Option<[f64; 3]>,
    /// Decimal digits used to format generated labels.
    pub digits: u32,
    /// Draw the grid planes.
    pub show_grid: bool,
    /// Grid plane opacity.
    pub grid_opacity: f64,
    /// Axis line opacity.
    pub axes_opacity: f64,
    /// Label font size in pixels.
    pub fontsize: u32,
}

impl Default for AxesDescriptor {
    fn default() -> Self {
        Self {
            xticker: None,
            yticker: None,
            zticker: None,
            origin: None,
            digits: 1,
            show_grid: true,
            grid_opacity: 0.1,
            axes_opacity: 1.0,
            fontsize: 12,
        }
    }
}

/// The three actors an axes descriptor expands to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AxesActors {
    /// Tick point/label anchor actor.
    pub points: ActorHandle,
    /// Axis line actor.
    pub axes: ActorHandle,
    /// Grid plane actor.
    pub grid: ActorHandle,
}

impl AxesActors {
    /// All three actors, in the order they are added to the renderer.
    pub fn all(&self) -> [&ActorHandle; 3] {
        [&self.points, &self.axes, &self.grid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_descriptor_fills_defaults() {
        let desc: AxesDescriptor =
            serde_json::from_str(r#"{"xticker": {"ticks": [0.0, 1.0]}, "digits": 3}"#)
                .unwrap_or_default();
        assert_eq!(desc.digits, 3);
        assert!(desc.show_grid);
        assert_eq!(desc.fontsize, 12);
        assert_eq!(desc.xticker.map(|t| t.ticks.len()), Some(2));
        assert!(desc.yticker.is_none());
    }
}
