//! Drawing document and edit transactions.
//!
//! A [`Document`] owns the object store, the layer stack, the selection and
//! the link table. Undoable edits run inside a transaction: the first
//! mutable access to a block records a copy of it, `commit` forgets the
//! copies and `rollback` puts them back. Read accessors never record.

use crate::config::EngineConfig;
use crate::drawing::{CellId, Drawable, DrawingObject, Hook, HookPointId, ObjectId};
use crate::error::{EngineError, EngineResult};
use crate::flags::{ExtraFlags, LayerFlags, LinkFlags, SessionFlags};
use crate::layers::LayersManager;
use crate::links::{Link, LinkTable};
use crate::selection::{SelectionState, SelectionStats};
use crate::store::ObjectStore;
use kurbo::Point;
use std::collections::HashMap;

/// Copies of every block touched since the transaction began.
#[derive(Debug, Default)]
struct EditTransaction {
    objects: HashMap<ObjectId, Option<DrawingObject>>,
    layers: Option<LayersManager>,
    selection: Option<SelectionState>,
    links: Option<LinkTable>,
}

impl EditTransaction {
    fn block_count(&self) -> usize {
        self.objects.len()
            + usize::from(self.layers.is_some())
            + usize::from(self.selection.is_some())
            + usize::from(self.links.is_some())
    }
}

/// An editable drawing.
#[derive(Debug)]
pub struct Document {
    pub(crate) config: EngineConfig,
    pub(crate) objects: ObjectStore,
    pub(crate) layers: LayersManager,
    pub(crate) selection: SelectionState,
    pub(crate) links: LinkTable,
    pub(crate) session_flags: SessionFlags,
    pub(crate) stats: SelectionStats,
    transaction: Option<EditTransaction>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            layers: LayersManager::new(config.max_layers),
            config,
            objects: ObjectStore::new(),
            selection: SelectionState::default(),
            links: LinkTable::new(),
            session_flags: SessionFlags::empty(),
            stats: SelectionStats::default(),
            transaction: None,
        }
    }

    /// Replace the layer stack, e.g. when loading a drawing.
    pub fn with_layers(mut self, layers: LayersManager) -> Self {
        self.layers = layers;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    /// Read-only lookup; never recorded by a transaction.
    pub fn object(&self, id: ObjectId) -> Option<&DrawingObject> {
        self.objects.get(id)
    }

    /// Store access with an explicit preserve choice.
    ///
    /// `preserve == false` is a plain read. `preserve == true` is
    /// [`preserve`](Self::preserve).
    pub fn get(&mut self, id: ObjectId, preserve: bool) -> Option<&DrawingObject> {
        if preserve {
            self.preserve(id).map(|o| &*o)
        } else {
            self.objects.get(id)
        }
    }

    /// Mutable handle to an object. Inside a transaction the object's
    /// current state is recorded first so it can be rolled back.
    pub fn preserve(&mut self, id: ObjectId) -> Option<&mut DrawingObject> {
        if !self.objects.contains(id) {
            return None;
        }
        self.record_object(id);
        self.objects.get_mut(id)
    }

    /// Mutable access that bypasses the transaction, for transient drag state.
    pub(crate) fn transient_mut(&mut self, id: ObjectId) -> Option<&mut DrawingObject> {
        self.objects.get_mut(id)
    }

    fn record_object(&mut self, id: ObjectId) {
        if let Some(tx) = &mut self.transaction {
            if !tx.objects.contains_key(&id) {
                tx.objects.insert(id, self.objects.get(id).cloned());
            }
        }
    }

    pub fn layers(&self) -> &LayersManager {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut LayersManager {
        if let Some(tx) = &mut self.transaction {
            tx.layers.get_or_insert_with(|| self.layers.clone());
        }
        &mut self.layers
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub(crate) fn selection_mut(&mut self, preserve: bool) -> &mut SelectionState {
        if preserve {
            if let Some(tx) = &mut self.transaction {
                tx.selection.get_or_insert_with(|| self.selection.clone());
            }
        }
        &mut self.selection
    }

    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    pub(crate) fn links_mut(&mut self) -> &mut LinkTable {
        if let Some(tx) = &mut self.transaction {
            tx.links.get_or_insert_with(|| self.links.clone());
        }
        &mut self.links
    }

    pub fn session_flags(&self) -> SessionFlags {
        self.session_flags
    }

    pub fn set_session_flags(&mut self, flags: SessionFlags) {
        self.session_flags = flags;
    }

    // --- Transactions ---

    pub fn begin_transaction(&mut self) -> EngineResult<()> {
        if self.transaction.is_some() {
            return Err(EngineError::TransactionOpen);
        }
        self.transaction = Some(EditTransaction::default());
        Ok(())
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// Number of blocks recorded by the open transaction.
    pub fn preserved_blocks(&self) -> usize {
        self.transaction.as_ref().map_or(0, EditTransaction::block_count)
    }

    /// Keep every change. Returns the number of blocks that were recorded.
    pub fn commit(&mut self) -> EngineResult<usize> {
        let tx = self.transaction.take().ok_or(EngineError::NoTransaction)?;
        let count = tx.block_count();
        log::debug!("commit: {count} blocks");
        Ok(count)
    }

    /// Restore every recorded block. Returns the number restored.
    pub fn rollback(&mut self) -> EngineResult<usize> {
        let tx = self.transaction.take().ok_or(EngineError::NoTransaction)?;
        let count = tx.block_count();
        for (id, snapshot) in tx.objects {
            self.objects.restore(id, snapshot);
        }
        if let Some(layers) = tx.layers {
            self.layers = layers;
        }
        if let Some(selection) = tx.selection {
            self.selection = selection;
        }
        if let Some(links) = tx.links {
            self.links = links;
        }
        log::debug!("rollback: {count} blocks");
        Ok(count)
    }

    // --- Objects and layers ---

    /// Add an object on top of the layer new objects go to.
    pub fn add_object(&mut self, object: DrawingObject) -> ObjectId {
        let id = self.objects.insert(object);
        if let Some(tx) = &mut self.transaction {
            tx.objects.entry(id).or_insert(None);
        }
        self.layers_mut().add_to_active_layer(id);
        id
    }

    /// Ids of live objects the given object carries along (container contents
    /// or shapes inside an enclosing outline).
    pub fn enclosed_objects(&self, id: ObjectId) -> Vec<ObjectId> {
        let Some(object) = self.objects.get(id) else {
            return Vec::new();
        };
        let visible: Vec<&DrawingObject> = self
            .layers
            .visible_z_list()
            .into_iter()
            .filter_map(|z| self.objects.get(z))
            .collect();
        object
            .enclosed_objects(&visible)
            .into_iter()
            .filter(|e| *e != id && self.objects.contains(*e))
            .collect()
    }

    pub fn remove_from_all_z_lists(&mut self, id: ObjectId) -> bool {
        if self.layers.find_layer_for(id).is_none() {
            return false;
        }
        self.layers_mut().remove_from_all_z_lists(id)
    }

    /// Place `ids` directly above `anchor` in paint order.
    pub fn insert_objects_after(&mut self, anchor: ObjectId, ids: &[ObjectId]) -> bool {
        if self.layers.find_layer_for(anchor).is_none() {
            return false;
        }
        let live: Vec<ObjectId> = ids.iter().copied().filter(|id| self.objects.contains(*id)).collect();
        self.layers_mut().insert_after(anchor, &live)
    }

    /// Make a layer active and drop selections it no longer shows.
    pub fn make_layer_active(&mut self, index: usize) -> bool {
        if index >= self.layers.len() {
            return false;
        }
        self.layers_mut().set_active(index);
        log::debug!("active layer is now {index}");
        self.revalidate_selection();
        true
    }

    /// Move the front layer to the back.
    pub fn rotate_layer_stack(&mut self) {
        self.layers_mut().rotate_stack();
        log::debug!("rotated layer stack, active layer {}", self.layers.active_index());
        self.revalidate_selection();
    }

    pub fn add_layer_at_front(&mut self, name: &str, visible: bool, active: bool) -> bool {
        if self.layers.len() >= self.layers.max_layers() {
            log::warn!("layer '{name}' refused: {} layers is the limit", self.layers.max_layers());
            return false;
        }
        self.layers_mut().add_layer_at_front(name, visible, active)
    }

    pub fn set_layer_flags(&mut self, index: usize, flags: LayerFlags) -> bool {
        match self.layers_mut().layer_mut(index) {
            Some(layer) => layer.flags = flags,
            None => return false,
        }
        self.revalidate_selection();
        true
    }

    // --- Hooks ---

    /// Attach `id` to `target`, replacing hook `index` or appending a new one.
    ///
    /// Keeps the link table in step. Returns false for unknown ids, a self
    /// hook, a duplicate attachment, or when the object has no free hook.
    pub fn update_hook(
        &mut self,
        id: ObjectId,
        index: Option<usize>,
        target: ObjectId,
        hook_point: HookPointId,
        connect: Point,
        cell: Option<CellId>,
    ) -> bool {
        if id == target || !self.objects.contains(target) {
            return false;
        }
        let Some(object) = self.objects.get(id) else {
            return false;
        };
        let slot = match index {
            Some(i) if i < object.hooks.len() => Some(i),
            Some(_) => return false,
            None if object.hooks.len() >= object.max_hooks => return false,
            None => None,
        };
        let duplicate = object
            .hooks
            .iter()
            .enumerate()
            .any(|(i, h)| Some(i) != slot && h.target == target && h.cell == cell);
        if duplicate {
            return false;
        }
        let replaced = slot.map(|i| (object.hooks[i].target, object.hooks[i].cell));

        let mut hook = Hook::new(target, hook_point, connect);
        hook.cell = cell;
        hook.update = true;
        let Some(object) = self.preserve(id) else {
            return false;
        };
        match slot {
            Some(i) => object.hooks[i] = hook,
            None => object.hooks.push(hook),
        }
        let links = self.links_mut();
        if let Some((old_target, old_cell)) = replaced {
            links.remove(old_target, id, old_cell);
        }
        links.insert(Link {
            target,
            hook: id,
            cell,
            flags: LinkFlags::MOVE,
        });
        true
    }

    /// Detach hook `index` of `id`.
    pub fn remove_hook(&mut self, id: ObjectId, index: usize) -> bool {
        let Some(object) = self.objects.get(id) else {
            return false;
        };
        let Some(hook) = object.hooks.get(index) else {
            return false;
        };
        let (target, cell) = (hook.target, hook.cell);
        if let Some(object) = self.preserve(id) {
            object.hooks.remove(index);
        }
        self.links_mut().remove(target, id, cell);
        true
    }

    /// Delete objects, cascading to dependents flagged delete-on-unhook.
    ///
    /// Hooks other objects hold on deleted ones are removed. Returns the ids
    /// actually deleted, cascade included.
    pub fn delete_objects(&mut self, ids: &[ObjectId]) -> Vec<ObjectId> {
        let mut doomed: Vec<ObjectId> = Vec::new();
        for &id in ids {
            if self.objects.contains(id) && !doomed.contains(&id) {
                doomed.push(id);
            }
        }
        let mut next = 0;
        while next < doomed.len() {
            let id = doomed[next];
            next += 1;
            for link in self.links.links_to(id) {
                let cascades = self
                    .objects
                    .get(link.hook)
                    .is_some_and(|o| o.extra_flags.contains(ExtraFlags::DELETE_ON_UNHOOK));
                if cascades && !doomed.contains(&link.hook) {
                    doomed.push(link.hook);
                }
            }
        }

        for &id in &doomed {
            for link in self.links_mut().remove_target(id) {
                if doomed.contains(&link.hook) {
                    continue;
                }
                if let Some(dependent) = self.preserve(link.hook) {
                    dependent.hooks.retain(|h| h.target != id);
                }
            }
            self.links_mut().remove_hook(id);
            self.remove_from_all_z_lists(id);
            self.remove_from_selection(id);
        }

        let holders: Vec<ObjectId> = self
            .objects
            .ids()
            .filter(|h| {
                self.objects
                    .get(*h)
                    .and_then(|o| o.as_container())
                    .is_some_and(|c| c.contents.iter().any(|e| doomed.contains(e)))
            })
            .collect();
        for holder in holders {
            if let Some(body) = self.preserve(holder).and_then(|o| o.as_container_mut()) {
                body.contents.retain(|e| !doomed.contains(e));
            }
        }

        for &id in &doomed {
            self.record_object(id);
            self.objects.remove(id);
        }
        if doomed.len() > ids.len() {
            log::debug!("deleted {} objects ({} by cascade)", doomed.len(), doomed.len() - ids.len());
        }
        doomed
    }
}
