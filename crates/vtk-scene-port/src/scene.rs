// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene descriptions consumed by the plot views.
//!
//! Only the envelope of a [`SceneDiff`] is interpreted here; the rest of the
//! graph-of-nodes payload belongs to the engine's synchronization protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Literal scene description for the static plot variant (serialized engine scene).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneData(pub String);

/// Server-maintained scene-graph diff for the synchronized plot variant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneDiff(Value);

impl SceneDiff {
    /// Wrap a raw diff.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Borrow the raw diff.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// An empty object (`{}`) is the host's "no scene yet" placeholder.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Synchronized view identifier (the diff's top-level `id`).
    pub fn id(&self) -> Option<String> {
        id_of(self.0.get("id")?)
    }

    /// Identifier of the root renderer node: `dependencies[0].id`.
    pub fn root_renderer_id(&self) -> Option<String> {
        let first = self.0.get("dependencies")?.as_array()?.first()?;
        id_of(first.get("id")?)
    }

    /// Every array hash referenced anywhere in the diff, in document order.
    pub fn array_hashes(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_hashes(&self.0, &mut out);
        out
    }
}

fn id_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn collect_hashes(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "hash" {
                    if let Value::String(hash) = child {
                        if !out.contains(hash) {
                            out.push(hash.clone());
                        }
                        continue;
                    }
                }
                collect_hashes(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_hashes(item, out);
            }
        }
        _ => {}
    }
}
