//! Selection state and rubber-band selection.
//!
//! Selected ids keep click order. The target is the one focused object among
//! them; whenever a selection call returns, the target is either `None` or a
//! member of the selected list.

use crate::document::Document;
use crate::drawing::{BaseClass, ObjectId};
use crate::error::{EngineError, EngineResult};
use crate::feedback::SelectionRenderer;
use crate::flags::ObjectFlags;
use crate::geometry::rect_encloses;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Selected ids and the focused target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    selected: Vec<ObjectId>,
    target: Option<ObjectId>,
}

impl SelectionState {
    pub fn selected(&self) -> &[ObjectId] {
        &self.selected
    }

    pub fn target(&self) -> Option<ObjectId> {
        self.target
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.selected.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Counts shown by the editor for the current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionStats {
    pub selected: usize,
    pub shapes: usize,
    pub lines: usize,
    pub connectors: usize,
    pub containers: usize,
    pub locked: usize,
    pub has_text: bool,
    /// More than one distinct object, so alignment has a reference.
    pub allow_align: bool,
    pub allow_copy: bool,
    pub target: Option<ObjectId>,
}

impl Document {
    pub fn selected_ids(&self) -> &[ObjectId] {
        self.selection.selected()
    }

    /// The target, if it still names a live object.
    pub fn target_selection(&self) -> Option<ObjectId> {
        self.selection
            .target
            .filter(|id| self.objects.contains(*id))
    }

    pub fn selection_stats(&self) -> &SelectionStats {
        &self.stats
    }

    /// Select `ids`.
    ///
    /// Without `multi` the previous selection is replaced. With `multi`
    /// every id toggles: new ids are added, already selected ids removed.
    /// The previous target survives if it is still selected; otherwise the
    /// first selected id becomes the target. Unknown ids are ignored.
    /// Returns the new target.
    pub fn select(
        &mut self,
        ids: &[ObjectId],
        multi: bool,
        preserve: bool,
        renderer: &mut dyn SelectionRenderer,
    ) -> Option<ObjectId> {
        if ids.is_empty() {
            return self.target_selection();
        }
        let previous = self.target_selection();
        let live: Vec<ObjectId> = ids
            .iter()
            .copied()
            .filter(|id| self.objects.contains(*id))
            .collect();

        let selection = self.selection_mut(preserve);
        if !multi {
            selection.selected.clear();
        }
        for id in live {
            match selection.selected.iter().position(|&s| s == id) {
                Some(pos) if multi => {
                    selection.selected.remove(pos);
                }
                Some(_) => {}
                None => selection.selected.push(id),
            }
        }
        let target = previous
            .filter(|t| selection.selected.contains(t))
            .or_else(|| selection.selected.first().copied());
        selection.target = target;

        let selected = self.selection.selected.clone();
        self.update_selection_attributes(&selected);
        renderer.hide_all_selection_states();
        renderer.render_all_selection_states();
        target
    }

    /// Focus `id`. Anything that is not a live, selected object clears the target.
    pub fn set_target(&mut self, id: Option<ObjectId>) -> Option<ObjectId> {
        let valid = id.filter(|id| self.objects.contains(*id) && self.selection.contains(*id));
        if self.selection.target != valid {
            self.selection_mut(true).target = valid;
            self.stats.target = valid;
        }
        valid
    }

    /// Deselect `id`; clears the target if it was the target.
    pub fn remove_from_selection(&mut self, id: ObjectId) -> bool {
        let Some(pos) = self.selection.selected.iter().position(|&s| s == id) else {
            return false;
        };
        let selection = self.selection_mut(true);
        selection.selected.remove(pos);
        if selection.target == Some(id) {
            selection.target = None;
        }
        let selected = self.selection.selected.clone();
        self.update_selection_attributes(&selected);
        true
    }

    pub fn clear_selection(&mut self, renderer: &mut dyn SelectionRenderer) {
        if !self.selection.is_empty() || self.selection.target.is_some() {
            let selection = self.selection_mut(true);
            selection.selected.clear();
            selection.target = None;
        }
        self.update_selection_attributes(&[]);
        renderer.hide_all_selection_states();
    }

    /// Drop selected ids that are no longer in the active-visible list.
    pub fn revalidate_selection(&mut self) {
        let visible = self.layers.active_visible_z_list();
        let keep: Vec<ObjectId> = self
            .selection
            .selected
            .iter()
            .copied()
            .filter(|id| visible.contains(id))
            .collect();
        let target = self.selection.target.filter(|t| keep.contains(t));
        if keep.len() != self.selection.selected.len() || target != self.selection.target {
            let selection = self.selection_mut(true);
            selection.selected = keep.clone();
            selection.target = target;
            log::debug!("selection revalidated: {} objects remain", keep.len());
        }
        self.update_selection_attributes(&keep);
    }

    /// Recount the editor statistics for `ids`.
    pub fn update_selection_attributes(&mut self, ids: &[ObjectId]) -> SelectionStats {
        let target = self.target_selection();
        let mut stats = SelectionStats {
            target,
            ..SelectionStats::default()
        };
        for object in ids.iter().filter_map(|id| self.objects.get(*id)) {
            stats.selected += 1;
            if object.is_container() {
                stats.containers += 1;
            } else {
                match object.base_class() {
                    BaseClass::Shape => stats.shapes += 1,
                    BaseClass::Line => stats.lines += 1,
                    BaseClass::Connector => stats.connectors += 1,
                }
            }
            if object.flags.contains(ObjectFlags::LOCK) {
                stats.locked += 1;
            }
            stats.has_text |= object.has_text;
            if Some(object.id) != target {
                stats.allow_align = true;
            }
        }
        stats.allow_copy = stats.selected > 0;
        self.stats = stats.clone();
        stats
    }

    /// Select every object whose frame lies inside `rect`.
    ///
    /// Containers and hidden objects are never picked. An empty sweep
    /// without `multi` clears the selection.
    pub fn select_all_in_rect(
        &mut self,
        rect: Rect,
        multi: bool,
        renderer: &mut dyn SelectionRenderer,
    ) -> Option<ObjectId> {
        let rect = rect.abs();
        let hits: Vec<ObjectId> = self
            .layers
            .active_visible_z_list()
            .into_iter()
            .filter(|id| {
                self.objects.get(*id).is_some_and(|o| {
                    !o.is_container()
                        && !o.flags.contains(ObjectFlags::NOT_VISIBLE)
                        && rect_encloses(rect, o.move_rect())
                })
            })
            .collect();
        if hits.is_empty() {
            if !multi {
                self.clear_selection(renderer);
            }
            return self.target_selection();
        }
        self.select(&hits, multi, true, renderer)
    }

    /// Select everything visible, optionally only one base class.
    pub fn select_all(
        &mut self,
        class: Option<BaseClass>,
        renderer: &mut dyn SelectionRenderer,
    ) -> Option<ObjectId> {
        let ids: Vec<ObjectId> = self
            .layers
            .active_visible_z_list()
            .into_iter()
            .filter(|id| {
                self.objects.get(*id).is_some_and(|o| {
                    !o.flags.contains(ObjectFlags::NOT_VISIBLE)
                        && class.is_none_or(|c| o.base_class() == c)
                })
            })
            .collect();
        if ids.is_empty() {
            self.clear_selection(renderer);
            return None;
        }
        self.select(&ids, false, true, renderer)
    }
}

/// An in-progress rubber-band drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RubberBand {
    origin: Point,
    frame: Rect,
}

impl RubberBand {
    pub fn begin(origin: Point) -> Self {
        Self {
            origin,
            frame: Rect::from_points(origin, origin),
        }
    }

    /// Stretch the band to `point`; the frame is always normalised.
    pub fn update(&mut self, point: Point) {
        self.frame = Rect::from_points(self.origin, point);
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    /// Apply the band to the selection.
    pub fn finish(
        self,
        doc: &mut Document,
        multi: bool,
        renderer: &mut dyn SelectionRenderer,
    ) -> Option<ObjectId> {
        doc.select_all_in_rect(self.frame, multi, renderer)
    }

    /// Run `f` on the band in `slot`. On error the band is dropped before
    /// the error is returned.
    pub fn guard<T>(
        slot: &mut Option<RubberBand>,
        f: impl FnOnce(&mut RubberBand) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let Some(band) = slot.as_mut() else {
            return Err(EngineError::Aborted("no rubber band in progress".to_string()));
        };
        match f(band) {
            Ok(value) => Ok(value),
            Err(err) => {
                log::warn!("rubber band cancelled: {err}");
                *slot = None;
                Err(err)
            }
        }
    }
}
