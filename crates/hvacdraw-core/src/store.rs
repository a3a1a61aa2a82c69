//! Object store: id to drawing-object records.

use crate::drawing::{DrawingObject, ObjectId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Owns every drawing object and hands out ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectStore {
    objects: HashMap<ObjectId, DrawingObject>,
    next_id: u32,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object under a freshly allocated id.
    pub fn insert(&mut self, mut object: DrawingObject) -> ObjectId {
        self.next_id += 1;
        let id = ObjectId(self.next_id);
        object.id = id;
        self.objects.insert(id, object);
        id
    }

    /// Read-only access. Never recorded by an edit transaction.
    pub fn get(&self, id: ObjectId) -> Option<&DrawingObject> {
        self.objects.get(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    /// Raw mutable access; callers decide whether the change is undoable.
    pub(crate) fn get_mut(&mut self, id: ObjectId) -> Option<&mut DrawingObject> {
        self.objects.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: ObjectId) -> Option<DrawingObject> {
        self.objects.remove(&id)
    }

    /// Put a snapshot back (or drop the object if it did not exist).
    pub(crate) fn restore(&mut self, id: ObjectId, snapshot: Option<DrawingObject>) {
        match snapshot {
            Some(object) => {
                self.objects.insert(id, object);
            }
            None => {
                self.objects.remove(&id);
            }
        }
    }
}
