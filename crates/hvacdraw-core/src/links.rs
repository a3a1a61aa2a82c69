//! Link table and hook-graph traversal.
//!
//! Every hook stored on an object has one [`Link`] here, sorted by target id,
//! so "everything attached to X" is a range lookup instead of a full scan.

use crate::document::Document;
use crate::drawing::{CellId, DrawingObject, ObjectId};
use crate::flags::{LinkFlags, ObjectFlags};
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// `hook` is attached to `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub target: ObjectId,
    pub hook: ObjectId,
    pub cell: Option<CellId>,
    pub flags: LinkFlags,
}

impl Link {
    pub fn new(target: ObjectId, hook: ObjectId) -> Self {
        Self {
            target,
            hook,
            cell: None,
            flags: LinkFlags::empty(),
        }
    }
}

/// Target-sorted list of links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkTable {
    links: Vec<Link>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Link> {
        self.links.get(index)
    }

    /// Index of the first link on `target`.
    ///
    /// With `exact == false` the insertion index is returned when no link
    /// matches, so `None` only ever means "no exact match".
    pub fn find_link(&self, target: ObjectId, exact: bool) -> Option<usize> {
        let index = self.links.partition_point(|l| l.target < target);
        match self.links.get(index) {
            Some(link) if link.target == target => Some(index),
            _ if exact => None,
            _ => Some(index),
        }
    }

    /// All links whose target is `target`.
    pub fn links_to(&self, target: ObjectId) -> &[Link] {
        let start = self.links.partition_point(|l| l.target < target);
        let end = self.links.partition_point(|l| l.target <= target);
        &self.links[start..end]
    }

    /// Insert keeping target order. Returns false if the same edge exists.
    pub fn insert(&mut self, link: Link) -> bool {
        let range = self.links_to(link.target);
        if range
            .iter()
            .any(|l| l.hook == link.hook && l.cell == link.cell)
        {
            return false;
        }
        let at = self.links.partition_point(|l| l.target <= link.target);
        self.links.insert(at, link);
        true
    }

    /// Remove the edge `hook → target`; `cell == None` matches any cell.
    pub fn remove(&mut self, target: ObjectId, hook: ObjectId, cell: Option<CellId>) -> usize {
        let before = self.links.len();
        self.links.retain(|l| {
            !(l.target == target && l.hook == hook && (cell.is_none() || l.cell == cell))
        });
        before - self.links.len()
    }

    /// Remove and return every link pointing at `target`.
    pub fn remove_target(&mut self, target: ObjectId) -> Vec<Link> {
        let start = self.links.partition_point(|l| l.target < target);
        let end = self.links.partition_point(|l| l.target <= target);
        self.links.drain(start..end).collect()
    }

    /// Remove every link whose dependent is `hook`.
    pub fn remove_hook(&mut self, hook: ObjectId) -> usize {
        let before = self.links.len();
        self.links.retain(|l| l.hook != hook);
        before - self.links.len()
    }
}

/// Traversal modes for [`hook_list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListCode {
    /// Everything hanging off the root, used for circular-hook checks.
    CircTarg,
    /// Objects that move when the root moves.
    MoveTarg,
    /// Like `MoveTarg`, for a root that is itself hooked to several objects.
    MoveHook,
    /// The root only.
    TargOnly,
    /// Dependents of the root, without the root itself.
    ChildrenOnly,
    /// Direct dependents only.
    TopOnly,
    /// Direct dependents, without the root.
    LinesOnly,
    /// Like `MoveTarg`, but runs between two objects come along without
    /// waiting for their other end, which is then pulled in too.
    MoveTargAndLines,
}

/// Collect the root and everything attached to it into `list`.
///
/// `list` is extended in place and never gains a duplicate. `bounds`, when
/// given, accumulates the union of the move frames of every added object.
pub fn hook_list(
    doc: &Document,
    list: &mut Vec<ObjectId>,
    root: ObjectId,
    code: ListCode,
    mut bounds: Option<&mut Option<Rect>>,
) {
    let Some(object) = doc.object(root) else {
        return;
    };
    let mut code = code;
    let mut skip_root = false;
    match code {
        ListCode::ChildrenOnly => {
            skip_root = true;
            code = ListCode::CircTarg;
        }
        ListCode::LinesOnly => {
            skip_root = true;
            code = ListCode::TopOnly;
        }
        ListCode::MoveTarg => {
            if object.hooks.len() > 1
                || (object.hooks.len() == 1 && object.flags.contains(ObjectFlags::ASSOC))
            {
                code = ListCode::MoveHook;
            }
            if list.contains(&root) {
                return;
            }
        }
        ListCode::MoveHook => {
            if list.contains(&root) {
                return;
            }
        }
        _ => {}
    }

    if !skip_root {
        push_with_enclosed(doc, list, object, bounds.as_deref_mut());
    }
    if code == ListCode::TargOnly {
        return;
    }
    add_dependents(doc, list, root, code, bounds.as_deref_mut(), 0);
    if code == ListCode::MoveHook
        && (object.hooks.len() >= 2 || object.flags.contains(ObjectFlags::ASSOC))
    {
        add_targets(doc, list, object, code, bounds);
    }
}

fn push_id(list: &mut Vec<ObjectId>, id: ObjectId) -> bool {
    if list.contains(&id) {
        return false;
    }
    list.push(id);
    true
}

fn accumulate(bounds: Option<&mut Option<Rect>>, object: &DrawingObject) {
    if let Some(bounds) = bounds {
        let rect = object.move_rect();
        *bounds = Some(bounds.map_or(rect, |b| b.union(rect)));
    }
}

fn push_with_enclosed(
    doc: &Document,
    list: &mut Vec<ObjectId>,
    object: &DrawingObject,
    mut bounds: Option<&mut Option<Rect>>,
) -> bool {
    if !push_id(list, object.id) {
        return false;
    }
    accumulate(bounds.as_deref_mut(), object);
    for id in doc.enclosed_objects(object.id) {
        if push_id(list, id) {
            if let Some(inner) = doc.object(id) {
                accumulate(bounds.as_deref_mut(), inner);
            }
        }
    }
    true
}

/// Walk the links whose target is `target`.
fn add_dependents(
    doc: &Document,
    list: &mut Vec<ObjectId>,
    target: ObjectId,
    code: ListCode,
    mut bounds: Option<&mut Option<Rect>>,
    depth: usize,
) {
    for link in doc.links().links_to(target) {
        let Some(dependent) = doc.object(link.hook) else {
            log::warn!("link {} -> {} names a missing object", link.hook, link.target);
            continue;
        };
        if list.contains(&dependent.id) {
            continue;
        }
        let Some(hook_index) = dependent.hooks.iter().position(|h| h.target == target) else {
            continue;
        };
        match code {
            ListCode::MoveTarg | ListCode::MoveHook => {
                // A run between two objects only moves once its other end does
                if dependent.hooks.len() == 2 {
                    let other = dependent.hooks[1 - hook_index].target;
                    if !list.contains(&other) {
                        continue;
                    }
                }
            }
            ListCode::CircTarg if depth == 0 => {
                for (i, hook) in dependent.hooks.iter().enumerate() {
                    if i != hook_index && hook.target != target {
                        push_id(list, hook.target);
                    }
                }
            }
            _ => {}
        }
        if !push_with_enclosed(doc, list, dependent, bounds.as_deref_mut()) {
            continue;
        }
        if code == ListCode::TopOnly {
            continue;
        }
        add_dependents(doc, list, dependent.id, code, bounds.as_deref_mut(), depth + 1);
        if dependent.hooks.len() > 1 && code != ListCode::CircTarg {
            add_targets(doc, list, dependent, code, bounds.as_deref_mut());
        }
    }
}

/// Pull in the objects `object` is hooked to, and their dependents.
fn add_targets(
    doc: &Document,
    list: &mut Vec<ObjectId>,
    object: &DrawingObject,
    code: ListCode,
    mut bounds: Option<&mut Option<Rect>>,
) {
    for hook in &object.hooks {
        let Some(target) = doc.object(hook.target) else {
            continue;
        };
        if !push_with_enclosed(doc, list, target, bounds.as_deref_mut()) {
            continue;
        }
        add_dependents(doc, list, target.id, code, bounds.as_deref_mut(), 1);
        add_targets(doc, list, target, code, bounds.as_deref_mut());
    }
}
