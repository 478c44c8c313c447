// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mock camera holding a JSON field set.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::{json, Value};
use vtk_scene_port::{Camera, CameraFields, SubscriptionId};

type Observer = (SubscriptionId, Rc<dyn Fn()>);

/// Camera double.
///
/// Carries the same engine bookkeeping fields a real camera reports, so
/// deny-list stripping is exercised. Every mutation bumps `mtime` and fires
/// the modified observers synchronously.
pub struct MockCamera {
    fields: RefCell<CameraFields>,
    observers: RefCell<Vec<Observer>>,
    next_observer: Cell<u64>,
    mtime: Cell<u64>,
    /// Number of `modified` notifications fired.
    pub modified_events: Cell<u32>,
    /// Number of `set` calls.
    pub set_calls: Cell<u32>,
}

impl MockCamera {
    /// Camera at `(0, 0, 1)` looking at the origin, Y up.
    pub fn new() -> Self {
        let defaults = json!({
            "position": [0.0, 0.0, 1.0],
            "focalPoint": [0.0, 0.0, 0.0],
            "viewUp": [0.0, 1.0, 0.0],
            "clippingRange": [0.01, 1000.01],
            "viewAngle": 30.0,
            "parallelProjection": false,
            "parallelScale": 1.0,
            "classHierarchy": ["vtkObject", "vtkCamera"],
            "vtkObject": {},
            "vtkCamera": {},
            "managedInstanceId": "camera-0",
            "flattenedDepIds": [],
            "viewPlaneNormal": [0.0, 0.0, 1.0],
            "directionOfProjection": [0.0, 0.0, -1.0],
            "projectionMatrix": [1.0, 0.0, 0.0, 0.0],
            "viewMatrix": [1.0, 0.0, 0.0, 0.0],
            "physicalTranslation": [0.0, 0.0, 0.0],
            "physicalScale": 1.0,
            "physicalViewUp": [0.0, 1.0, 0.0],
            "physicalViewNorth": [0.0, 0.0, -1.0],
            "mtime": 0
        });
        let fields = match defaults {
            Value::Object(map) => map,
            _ => CameraFields::new(),
        };
        Self {
            fields: RefCell::new(fields),
            observers: RefCell::new(Vec::new()),
            next_observer: Cell::new(1),
            mtime: Cell::new(0),
            modified_events: Cell::new(0),
            set_calls: Cell::new(0),
        }
    }

    /// Number of live modified observers.
    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    /// Raw field value, including bookkeeping.
    pub fn field(&self, key: &str) -> Option<Value> {
        self.fields.borrow().get(key).cloned()
    }

    fn vec3(&self, key: &str) -> [f64; 3] {
        let fields = self.fields.borrow();
        let mut out = [0.0; 3];
        if let Some(Value::Array(items)) = fields.get(key) {
            for (slot, item) in out.iter_mut().zip(items) {
                *slot = item.as_f64().unwrap_or(0.0);
            }
        }
        out
    }

    fn write(&self, key: &str, value: [f64; 3]) {
        self.fields.borrow_mut().insert(key.to_owned(), json!(value));
        self.modified();
    }
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera for MockCamera {
    fn get(&self) -> CameraFields {
        let mut fields = self.fields.borrow().clone();
        fields.insert("mtime".to_owned(), json!(self.mtime.get()));
        fields
    }

    fn set(&self, fields: &CameraFields) {
        self.set_calls.set(self.set_calls.get() + 1);
        {
            let mut own = self.fields.borrow_mut();
            for (key, value) in fields {
                own.insert(key.clone(), value.clone());
            }
        }
        self.modified();
    }

    fn position(&self) -> [f64; 3] {
        self.vec3("position")
    }

    fn focal_point(&self) -> [f64; 3] {
        self.vec3("focalPoint")
    }

    fn view_up(&self) -> [f64; 3] {
        self.vec3("viewUp")
    }

    fn set_position(&self, position: [f64; 3]) {
        self.write("position", position);
    }

    fn set_view_up(&self, up: [f64; 3]) {
        self.write("viewUp", up);
    }

    fn modified(&self) {
        self.mtime.set(self.mtime.get() + 1);
        self.modified_events.set(self.modified_events.get() + 1);
        // Snapshot first: observers may re-enter the camera.
        let observers: Vec<Rc<dyn Fn()>> = self
            .observers
            .borrow()
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for cb in observers {
            cb();
        }
    }

    fn on_modified(&self, callback: Box<dyn Fn()>) -> SubscriptionId {
        let id = SubscriptionId(self.next_observer.get());
        self.next_observer.set(id.0 + 1);
        self.observers.borrow_mut().push((id, Rc::from(callback)));
        id
    }

    fn remove_observer(&self, id: SubscriptionId) {
        self.observers.borrow_mut().retain(|(sub, _)| *sub != id);
    }
}
