//! Layers and their paint order.
//!
//! Each layer owns a back-to-front list of object ids (its z-list). An id
//! lives in at most one layer at a time.

use crate::drawing::ObjectId;
use crate::flags::LayerFlags;
use serde::{Deserialize, Serialize};

/// A named layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub flags: LayerFlags,
    /// Object ids, back to front.
    pub z_list: Vec<ObjectId>,
}

impl Layer {
    pub fn new(name: impl Into<String>, flags: LayerFlags) -> Self {
        Self {
            name: name.into(),
            flags,
            z_list: Vec::new(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains(LayerFlags::VISIBLE)
    }
}

/// The layer stack of a drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayersManager {
    layers: Vec<Layer>,
    active: usize,
    max_layers: usize,
}

impl LayersManager {
    /// A stack with one visible, active layer.
    pub fn new(max_layers: usize) -> Self {
        Self {
            layers: vec![Layer::new(
                "Default",
                LayerFlags::VISIBLE | LayerFlags::ACTIVE,
            )],
            active: 0,
            max_layers: max_layers.max(1),
        }
    }

    /// Build from existing layers. Returns `None` if the stack is empty,
    /// over capacity, or `active` is out of range.
    pub fn from_layers(layers: Vec<Layer>, active: usize, max_layers: usize) -> Option<Self> {
        if layers.is_empty() || layers.len() > max_layers || active >= layers.len() {
            return None;
        }
        Some(Self {
            layers,
            active,
            max_layers,
        })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn max_layers(&self) -> usize {
        self.max_layers
    }

    /// Z-lists of visible layers, in layer index order.
    pub fn visible_z_list(&self) -> Vec<ObjectId> {
        self.layers
            .iter()
            .filter(|l| l.is_visible())
            .flat_map(|l| l.z_list.iter().copied())
            .collect()
    }

    /// Z-lists of the active layer and of every layer flagged both visible and active.
    pub fn active_visible_z_list(&self) -> Vec<ObjectId> {
        let both = LayerFlags::VISIBLE | LayerFlags::ACTIVE;
        self.layers
            .iter()
            .enumerate()
            .filter(|(i, l)| *i == self.active || l.flags.contains(both))
            .flat_map(|(_, l)| l.z_list.iter().copied())
            .collect()
    }

    /// Every layer's z-list, bottom layer first.
    pub fn z_list(&self) -> Vec<ObjectId> {
        self.layers
            .iter()
            .rev()
            .flat_map(|l| l.z_list.iter().copied())
            .collect()
    }

    pub fn active_layer_z_list(&self) -> &[ObjectId] {
        self.layers
            .get(self.active)
            .map(|l| l.z_list.as_slice())
            .unwrap_or(&[])
    }

    pub fn find_layer_for(&self, id: ObjectId) -> Option<usize> {
        self.layers.iter().position(|l| l.z_list.contains(&id))
    }

    /// Take `id` out of the first z-list holding it.
    pub fn remove_from_all_z_lists(&mut self, id: ObjectId) -> bool {
        for layer in &mut self.layers {
            if let Some(pos) = layer.z_list.iter().position(|&z| z == id) {
                layer.z_list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Place `ids` directly above `anchor` in the anchor's layer.
    ///
    /// Returns false, leaving every list untouched, if the anchor is not in
    /// any layer.
    pub fn insert_after(&mut self, anchor: ObjectId, ids: &[ObjectId]) -> bool {
        if self.find_layer_for(anchor).is_none() {
            return false;
        }
        for &id in ids {
            if id != anchor {
                self.remove_from_all_z_lists(id);
            }
        }
        let Some(index) = self.find_layer_for(anchor) else {
            return false;
        };
        let z_list = &mut self.layers[index].z_list;
        let Some(pos) = z_list.iter().position(|&z| z == anchor) else {
            return false;
        };
        let mut seen = Vec::with_capacity(ids.len());
        for &id in ids {
            if id != anchor && !seen.contains(&id) {
                seen.push(id);
            }
        }
        z_list.splice(pos + 1..pos + 1, seen);
        true
    }

    /// Layer new objects are added to: the active layer, unless it refuses
    /// additions and another layer accepts them.
    pub fn add_target_layer(&self) -> usize {
        let refuses = |l: &Layer| l.flags.contains(LayerFlags::NO_ADD);
        if self.layers.get(self.active).is_some_and(|l| !refuses(l)) {
            return self.active;
        }
        self.layers
            .iter()
            .position(|l| !refuses(l))
            .unwrap_or(self.active)
    }

    /// Append `id` on top of the layer new objects go to.
    pub fn add_to_active_layer(&mut self, id: ObjectId) -> usize {
        self.remove_from_all_z_lists(id);
        let index = self.add_target_layer();
        if let Some(layer) = self.layers.get_mut(index) {
            layer.z_list.push(id);
        }
        index
    }

    /// Make `index` the active layer. Returns false if out of range.
    pub fn set_active(&mut self, index: usize) -> bool {
        if index >= self.layers.len() {
            return false;
        }
        self.active = index;
        true
    }

    /// Move the front layer to the back.
    pub fn rotate_stack(&mut self) {
        if self.layers.len() < 2 {
            return;
        }
        self.layers.rotate_left(1);
        self.active = (self.active + self.layers.len() - 1) % self.layers.len();
    }

    /// Prepend a layer. Returns false once the stack is full.
    ///
    /// The active index shifts so the same layer stays active; `active` only
    /// sets the new layer's flag.
    pub fn add_layer_at_front(&mut self, name: impl Into<String>, visible: bool, active: bool) -> bool {
        if self.layers.len() >= self.max_layers {
            return false;
        }
        let mut flags = LayerFlags::empty();
        flags.set(LayerFlags::VISIBLE, visible);
        flags.set(LayerFlags::ACTIVE, active);
        self.layers.insert(0, Layer::new(name, flags));
        self.active += 1;
        true
    }

    /// Lowest-index visible layer.
    pub fn top_most_visible_layer(&self) -> Option<usize> {
        self.layers.iter().position(|l| l.is_visible())
    }

    /// Smallest and largest layer index holding any of `ids`.
    pub fn front_back_layers_for(&self, ids: &[ObjectId]) -> Option<(usize, usize)> {
        ids.iter()
            .filter_map(|&id| self.find_layer_for(id))
            .fold(None, |acc, i| match acc {
                None => Some((i, i)),
                Some((front, back)) => Some((front.min(i), back.max(i))),
            })
    }

    pub(crate) fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u32]) -> Vec<ObjectId> {
        raw.iter().map(|&i| ObjectId(i)).collect()
    }

    fn two_layers() -> LayersManager {
        let mut l0 = Layer::new("L0", LayerFlags::VISIBLE);
        l0.z_list = ids(&[5, 6]);
        let mut l1 = Layer::new("L1", LayerFlags::VISIBLE | LayerFlags::ACTIVE);
        l1.z_list = ids(&[7]);
        LayersManager::from_layers(vec![l0, l1], 0, 32).unwrap()
    }

    #[test]
    fn test_active_visible_in_index_order() {
        let layers = two_layers();
        assert_eq!(layers.active_visible_z_list(), ids(&[5, 6, 7]));
        assert_eq!(layers.visible_z_list(), ids(&[5, 6, 7]));
        assert_eq!(layers.z_list(), ids(&[7, 5, 6]));
    }

    #[test]
    fn test_active_layer_counts_even_if_hidden() {
        let mut l0 = Layer::new("L0", LayerFlags::empty());
        l0.z_list = ids(&[1]);
        let mut l1 = Layer::new("L1", LayerFlags::VISIBLE);
        l1.z_list = ids(&[2]);
        let layers = LayersManager::from_layers(vec![l0, l1], 0, 4).unwrap();
        assert_eq!(layers.active_visible_z_list(), ids(&[1]));
        assert_eq!(layers.visible_z_list(), ids(&[2]));
    }

    #[test]
    fn test_insert_after_anchor() {
        let mut layers = two_layers();
        assert!(layers.insert_after(ObjectId(5), &ids(&[9, 7])));
        assert_eq!(layers.layer(0).unwrap().z_list, ids(&[5, 9, 7, 6]));
        assert!(layers.layer(1).unwrap().z_list.is_empty());
        assert!(!layers.insert_after(ObjectId(42), &ids(&[1])));
    }

    #[test]
    fn test_remove_from_all() {
        let mut layers = two_layers();
        assert!(layers.remove_from_all_z_lists(ObjectId(7)));
        assert!(!layers.remove_from_all_z_lists(ObjectId(7)));
        assert_eq!(layers.z_list(), ids(&[5, 6]));
    }

    #[test]
    fn test_capacity() {
        let mut layers = LayersManager::new(2);
        assert!(layers.add_layer_at_front("front", true, false));
        let before = layers.clone();
        assert!(!layers.add_layer_at_front("overflow", true, true));
        assert_eq!(layers, before);
        assert_eq!(layers.active_index(), 1);
    }

    #[test]
    fn test_add_layer_active_flag() {
        let mut layers = LayersManager::new(4);
        layers.add_to_active_layer(ObjectId(1));
        assert!(layers.add_layer_at_front("front", true, true));
        assert_eq!(layers.active_index(), 1);
        assert!(layers.layer(0).unwrap().flags.contains(LayerFlags::ACTIVE));
        layers.layer_mut(0).unwrap().z_list.push(ObjectId(2));
        assert_eq!(layers.active_visible_z_list(), ids(&[2, 1]));
    }

    #[test]
    fn test_rotate_stack_tracks_active() {
        let mut layers = two_layers();
        layers.rotate_stack();
        assert_eq!(layers.layer(0).unwrap().name, "L1");
        assert_eq!(layers.active_index(), 1);
        assert_eq!(layers.layer(layers.active_index()).unwrap().name, "L0");
    }

    #[test]
    fn test_set_active_bounds() {
        let mut layers = two_layers();
        assert!(!layers.set_active(2));
        assert_eq!(layers.active_index(), 0);
        assert!(layers.set_active(1));
        assert_eq!(layers.active_index(), 1);
        assert_eq!(layers.active_visible_z_list(), ids(&[7]));
    }

    #[test]
    fn test_no_add_falls_back() {
        let l0 = Layer::new("locked", LayerFlags::VISIBLE | LayerFlags::ACTIVE | LayerFlags::NO_ADD);
        let l1 = Layer::new("open", LayerFlags::VISIBLE);
        let mut layers = LayersManager::from_layers(vec![l0, l1], 0, 4).unwrap();
        assert_eq!(layers.add_to_active_layer(ObjectId(3)), 1);
        assert_eq!(layers.layer(1).unwrap().z_list, ids(&[3]));
    }

    #[test]
    fn test_front_back_layers() {
        let layers = two_layers();
        assert_eq!(layers.front_back_layers_for(&ids(&[7, 6])), Some((0, 1)));
        assert_eq!(layers.front_back_layers_for(&ids(&[99])), None);
        assert_eq!(layers.top_most_visible_layer(), Some(0));
    }
}
