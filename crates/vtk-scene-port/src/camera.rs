// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Camera state carried between the engine and the view model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw key/value field set as reported by (or applied to) an engine camera.
pub type CameraFields = Map<String, Value>;

/// Engine bookkeeping fields that never leave the renderer.
///
/// These carry object identity, dependency ids, cached matrices, physical
/// frame data and the modification timestamp. Applying them back onto a
/// camera would corrupt the engine's own state.
pub const INTERNAL_CAMERA_FIELDS: &[&str] = &[
    "classHierarchy",
    "vtkObject",
    "vtkCamera",
    "viewPlaneNormal",
    "flattenedDepIds",
    "managedInstanceId",
    "directionOfProjection",
    "projectionMatrix",
    "viewMatrix",
    "physicalTranslation",
    "physicalScale",
    "physicalViewUp",
    "physicalViewNorth",
    "mtime",
];

/// Serializable subset of a renderer camera.
///
/// Built from the engine's field set with the deny-listed bookkeeping fields
/// removed. The snapshot is re-applied verbatim when the model's camera
/// changes from the outside.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CameraSnapshot(CameraFields);

impl CameraSnapshot {
    /// Strip `deny` from a raw engine field set.
    pub fn from_fields<S: AsRef<str>>(mut fields: CameraFields, deny: &[S]) -> Self {
        for key in deny {
            fields.remove(key.as_ref());
        }
        Self(fields)
    }

    /// Strip the default [`INTERNAL_CAMERA_FIELDS`] from a raw field set.
    pub fn from_engine(fields: CameraFields) -> Self {
        Self::from_fields(fields, INTERNAL_CAMERA_FIELDS)
    }

    /// Borrow the retained fields.
    pub fn fields(&self) -> &CameraFields {
        &self.0
    }

    /// Consume the snapshot and return the retained fields.
    pub fn into_fields(self) -> CameraFields {
        self.0
    }

    /// Read a three-component vector field such as `position` or `viewUp`.
    pub fn vector(&self, key: &str) -> Option<[f64; 3]> {
        let items = self.0.get(key)?.as_array()?;
        match items.as_slice() {
            [x, y, z] => Some([x.as_f64()?, y.as_f64()?, z.as_f64()?]),
            _ => None,
        }
    }
}

impl From<CameraFields> for CameraSnapshot {
    fn from(fields: CameraFields) -> Self {
        Self(fields)
    }
}

/// Unit vector along whichever of axes `a` or `b` dominates `v`.
///
/// The sign follows the dominant component; ties go to `b`. Used to pick a
/// clean view-up after snapping the camera onto a principal axis.
pub fn major_axis(v: [f64; 3], a: usize, b: usize) -> [f64; 3] {
    let mut axis = [0.0; 3];
    let idx = if v[a].abs() > v[b].abs() { a } else { b };
    axis[idx] = if v[idx] > 0.0 { 1.0 } else { -1.0 };
    axis
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine_fields() -> CameraFields {
        let value = json!({
            "position": [1.0, 2.0, 3.0],
            "focalPoint": [0.0, 0.0, 0.0],
            "viewUp": [0.0, 1.0, 0.0],
            "clippingRange": [0.1, 100.0],
            "mtime": 42,
            "vtkObject": {},
            "viewMatrix": [1, 0, 0, 0],
            "classHierarchy": ["vtkObject", "vtkCamera"]
        });
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn engine_bookkeeping_is_stripped() {
        let snap = CameraSnapshot::from_engine(engine_fields());
        assert!(snap.fields().contains_key("position"));
        assert!(snap.fields().contains_key("clippingRange"));
        for key in INTERNAL_CAMERA_FIELDS {
            assert!(!snap.fields().contains_key(*key), "{key} leaked");
        }
    }

    #[test]
    fn custom_deny_list_only_removes_named_fields() {
        let snap = CameraSnapshot::from_fields(engine_fields(), &["mtime"]);
        assert!(!snap.fields().contains_key("mtime"));
        assert!(snap.fields().contains_key("vtkObject"));
    }

    #[test]
    fn vector_reads_three_components() {
        let snap = CameraSnapshot::from_engine(engine_fields());
        assert_eq!(snap.vector("position"), Some([1.0, 2.0, 3.0]));
        assert_eq!(snap.vector("clippingRange"), None);
        assert_eq!(snap.vector("missing"), None);
    }

    #[test]
    fn major_axis_picks_dominant_component_with_sign() {
        assert_eq!(major_axis([0.2, -0.9, 0.1], 1, 2), [0.0, -1.0, 0.0]);
        assert_eq!(major_axis([0.7, 0.1, 0.3], 0, 2), [1.0, 0.0, 0.0]);
        // Ties go to the second index.
        assert_eq!(major_axis([0.5, 0.5, 0.0], 0, 1), [0.0, 1.0, 0.0]);
    }
}
