//! Sets of objects that move together.

use crate::document::Document;
use crate::drawing::{ObjectId, ObjectType};
use crate::flags::HookFlags;
use crate::links::{ListCode, hook_list};
use kurbo::Rect;

/// Inputs of [`build_move_set`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveSetOptions {
    /// Seed from the current selection.
    pub use_selection: bool,
    /// Follow hooked objects too and append what each member encloses.
    pub include_enclosed: bool,
    /// Seed from the active-visible z-list instead of the selection.
    pub use_visible_list: bool,
    /// Only the seeds themselves, no hook-graph expansion.
    pub target_only: bool,
    /// Accumulate the union of the members' move frames.
    pub collect_bounds: bool,
}

/// Objects that translate together during a drag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveSet {
    /// Ordered, without duplicates.
    pub ids: Vec<ObjectId>,
    pub bounds: Option<Rect>,
}

impl MoveSet {
    pub fn contains(&self, id: ObjectId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Root of the first-hook chain starting at `id`.
pub fn target_node(doc: &Document, id: ObjectId) -> ObjectId {
    let mut current = id;
    let mut seen = vec![id];
    while let Some(next) = doc
        .object(current)
        .and_then(|o| o.hooks.first())
        .map(|h| h.target)
    {
        if seen.contains(&next) || !doc.objects().contains(next) {
            break;
        }
        seen.push(next);
        current = next;
    }
    current
}

/// Collect everything that moves when `primary` (and, per `opts`, the
/// selection or the visible objects) is dragged.
pub fn build_move_set(doc: &Document, primary: Option<ObjectId>, opts: &MoveSetOptions) -> MoveSet {
    let code = if opts.target_only {
        ListCode::TargOnly
    } else {
        ListCode::MoveTarg
    };
    let mut ids = Vec::new();
    let mut bounds = None;

    let mut primary = primary;
    if let Some(id) = primary {
        let redirect = doc.object(id).and_then(|o| {
            let first = o.hooks.first()?;
            (opts.use_selection && o.hook_flags.contains(HookFlags::MOVE_TARGET)).then_some(first.target)
        });
        if let Some(target) = redirect {
            let node = target_node(doc, target);
            log::trace!("move target {id} redirected to {node}");
            primary = Some(node);
        }
    }

    if opts.use_selection || opts.use_visible_list {
        let mut seeds: Vec<ObjectId> = if opts.use_visible_list {
            doc.layers().active_visible_z_list()
        } else {
            doc.selected_ids().to_vec()
        };
        let mut index = 0;
        while index < seeds.len() {
            let id = seeds[index];
            index += 1;
            let Some(object) = doc.object(id) else {
                continue;
            };
            if object.object_type == ObjectType::EventLabel {
                if let Some(assoc) = object.assoc_id {
                    if !seeds.contains(&assoc) {
                        seeds.push(assoc);
                    }
                }
                continue;
            }
            if object.hooks.is_empty() || opts.include_enclosed {
                hook_list(doc, &mut ids, id, code, opts.collect_bounds.then_some(&mut bounds));
            }
        }
    }

    if let Some(id) = primary {
        let qualifies = doc
            .object(id)
            .is_some_and(|o| o.hooks.is_empty() || opts.include_enclosed);
        if qualifies {
            hook_list(doc, &mut ids, id, code, opts.collect_bounds.then_some(&mut bounds));
        }
    }

    if opts.include_enclosed {
        let members = ids.len();
        for i in 0..members {
            for enclosed in doc.enclosed_objects(ids[i]) {
                if !ids.contains(&enclosed) {
                    ids.push(enclosed);
                }
            }
        }
    }

    MoveSet { ids, bounds }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::{DrawingObject, HookPointId};
    use crate::feedback::NoRender;
    use crate::testing::{chain_document, shape_at};
    use kurbo::Point;

    #[test]
    fn test_chain_closure() {
        let (doc, [a, b, c]) = chain_document();
        let set = build_move_set(&doc, Some(c), &MoveSetOptions::default());
        assert_eq!(set.len(), 3);
        for id in [a, b, c] {
            assert_eq!(set.ids.iter().filter(|&&x| x == id).count(), 1);
        }
        assert_eq!(set.ids[0], c);
    }

    #[test]
    fn test_hooked_primary_alone_is_skipped() {
        let (doc, [a, _, _]) = chain_document();
        let set = build_move_set(&doc, Some(a), &MoveSetOptions::default());
        assert!(set.is_empty());
        let opts = MoveSetOptions {
            include_enclosed: true,
            ..MoveSetOptions::default()
        };
        assert!(build_move_set(&doc, Some(a), &opts).contains(a));
    }

    #[test]
    fn test_move_target_redirects_to_root() {
        let (mut doc, [a, b, c]) = chain_document();
        doc.preserve(a).unwrap().hook_flags |= HookFlags::MOVE_TARGET;
        let opts = MoveSetOptions {
            use_selection: true,
            ..MoveSetOptions::default()
        };
        let set = build_move_set(&doc, Some(a), &opts);
        assert_eq!(set.ids[0], c);
        assert!(set.contains(a) && set.contains(b));
    }

    #[test]
    fn test_target_node_survives_cycle() {
        let (mut doc, [a, _, c]) = chain_document();
        assert!(doc.update_hook(c, None, a, HookPointId::KTC, Point::ZERO, None));
        let root = target_node(&doc, a);
        assert!(doc.objects().contains(root));
    }

    #[test]
    fn test_target_only_skips_dependents() {
        let (doc, [_, _, c]) = chain_document();
        let opts = MoveSetOptions {
            target_only: true,
            ..MoveSetOptions::default()
        };
        assert_eq!(build_move_set(&doc, Some(c), &opts).ids, vec![c]);
    }

    #[test]
    fn test_selection_seeds_and_bounds() {
        let mut doc = Document::new();
        let a = doc.add_object(shape_at(0.0, 0.0));
        let b = doc.add_object(shape_at(100.0, 0.0));
        doc.select(&[a, b], false, true, &mut NoRender);
        let opts = MoveSetOptions {
            use_selection: true,
            collect_bounds: true,
            ..MoveSetOptions::default()
        };
        let set = build_move_set(&doc, None, &opts);
        assert_eq!(set.ids, vec![a, b]);
        assert_eq!(set.bounds, Some(Rect::new(0.0, 0.0, 140.0, 40.0)));
    }

    #[test]
    fn test_event_label_moves_its_associate() {
        let mut doc = Document::new();
        let owner = doc.add_object(shape_at(0.0, 0.0));
        let mut label = shape_at(0.0, 50.0).with_type(ObjectType::EventLabel);
        label.assoc_id = Some(owner);
        let label = doc.add_object(label);
        doc.select(&[label], false, true, &mut NoRender);
        let opts = MoveSetOptions {
            use_selection: true,
            ..MoveSetOptions::default()
        };
        assert_eq!(build_move_set(&doc, None, &opts).ids, vec![owner]);
    }

    #[test]
    fn test_enclosed_objects_appended() {
        let mut doc = Document::new();
        let mut room = DrawingObject::shape(Rect::new(0.0, 0.0, 200.0, 200.0));
        if let crate::drawing::ObjectKind::Shape(body) = &mut room.kind {
            body.encloses = true;
        }
        let room = doc.add_object(room);
        let unit = doc.add_object(shape_at(50.0, 50.0));
        let outside = doc.add_object(shape_at(300.0, 0.0));
        let opts = MoveSetOptions {
            include_enclosed: true,
            ..MoveSetOptions::default()
        };
        let set = build_move_set(&doc, Some(room), &opts);
        assert!(set.contains(room) && set.contains(unit));
        assert!(!set.contains(outside));
    }
}
