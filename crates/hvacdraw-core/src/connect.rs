//! Connection search while an object is dragged.
//!
//! A [`DragSession`] lives from drag start to drag end. Each pointer move
//! calls [`DragSession::find_connect`] with the dragged object's candidate
//! hook points; the session keeps the best join or connect target found so
//! far and tells a [`LinkFeedback`] whenever the highlighted target changes.
//! The session must be ended with [`finish`](DragSession::finish) or
//! [`cancel`](DragSession::cancel) so no highlight or edit mode is left behind.

use crate::document::Document;
use crate::drawing::{
    BaseClass, CellId, DIM_MAX, Drawable, DrawingObject, HitCode, HitOptions, HitSegment,
    HookPoint, HookPointId, JoinHit, ObjectId, ObjectType,
};
use crate::error::EngineResult;
use crate::feedback::{EditMode, Highlight, LinkFeedback};
use crate::flags::{HookFlags, SessionFlags};
use crate::geometry::{nearest_point_index, rect_contains};
use crate::hit_test::{FindOptions, HitResult, find_object_at};
use crate::links::{ListCode, hook_list};
use kurbo::{Point, Vec2};

/// Per-drag linking preferences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragOptions {
    /// Only shape/connector array links are allowed.
    pub arrays_only: bool,
    /// Dropping a shape on a segmented line splits the line around it.
    pub auto_insert: bool,
    /// Auto-insert attaches a single point instead of splitting.
    pub auto_single_point: bool,
    /// The object is being drawn from the overlay layer.
    pub from_overlay_layer: bool,
}

/// Mode of one [`DragSession::find_connect`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectRequest {
    /// Report highlight changes to the feedback sink.
    pub show_visuals: bool,
    /// Only attach to lines.
    pub attach_mode: bool,
    /// Look for polyline ends to join.
    pub allow_join: bool,
}

/// The connection a drag would make if dropped now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingConnection {
    pub target: ObjectId,
    /// Hook point of the dragged object that attaches.
    pub hook_point: HookPointId,
    /// Attach location in the target's normalised frame space.
    pub connect_point: Point,
    pub cell: Option<CellId>,
    pub hook_flags: HookFlags,
    /// Offset that snaps the dragged object onto the target.
    pub delta: Vec2,
}

/// A polyline end the dragged object would join.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinTarget {
    pub target: ObjectId,
    pub segment: HitSegment,
    /// Hook point of the dragged object that joins.
    pub source: HookPointId,
    pub delta: Vec2,
}

/// Result of a finished drag.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DragOutcome {
    pub connection: Option<PendingConnection>,
    pub join: Option<JoinTarget>,
    /// Every object connected to at some point during the drag.
    pub history: Vec<ObjectId>,
}

/// Search state for one drag.
#[derive(Debug, Clone)]
pub struct DragSession {
    drag_id: ObjectId,
    options: DragOptions,
    exclude: Vec<ObjectId>,
    drag_start: Point,
    drag_delta: Vec2,

    connect_index: Option<ObjectId>,
    connect_pt: Point,
    connect_doc_pt: Point,
    connect_inside: Option<CellId>,
    hook_index: HookPointId,
    connect_hook_flags: HookFlags,
    prev_connect: Option<ObjectId>,
    history: Vec<ObjectId>,

    join_index: Option<ObjectId>,
    join_segment: Option<HitSegment>,
    join_source: Option<HookPointId>,
    join_pt: Point,

    hilite_connect: Option<ObjectId>,
    hilite_inside: Option<CellId>,
    hilite_join: Option<ObjectId>,
    connect_mode_pushed: bool,
    join_mode_pushed: bool,
}

/// Candidate accepted for one hook point.
struct Accepted {
    target: ObjectId,
    connect_pt: Point,
    doc_pt: Point,
    cell: Option<CellId>,
    hook: HookPointId,
    flags: HookFlags,
    delta: Vec2,
    perimeter_len: usize,
}

impl DragSession {
    /// Start searching for `drag_id`, which is being dragged from `start`.
    ///
    /// Everything hanging off the dragged object is excluded from the search
    /// so it cannot hook onto its own dependents. Returns `None` for an
    /// unknown id.
    pub fn begin(doc: &Document, drag_id: ObjectId, start: Point, options: DragOptions) -> Option<Self> {
        let object = doc.object(drag_id)?;
        let mut exclude = Vec::new();
        hook_list(doc, &mut exclude, drag_id, ListCode::CircTarg, None);
        if !exclude.contains(&drag_id) {
            exclude.push(drag_id);
        }
        let prev_connect = object.hooks.first().map(|h| h.target);
        log::debug!("drag {drag_id} begins, {} ids excluded", exclude.len());
        Some(Self {
            drag_id,
            options,
            exclude,
            drag_start: start,
            drag_delta: Vec2::ZERO,
            connect_index: None,
            connect_pt: Point::ZERO,
            connect_doc_pt: Point::ZERO,
            connect_inside: None,
            hook_index: HookPointId::KTL,
            connect_hook_flags: HookFlags::empty(),
            prev_connect,
            history: Vec::new(),
            join_index: None,
            join_segment: None,
            join_source: None,
            join_pt: Point::ZERO,
            hilite_connect: None,
            hilite_inside: None,
            hilite_join: None,
            connect_mode_pushed: false,
            join_mode_pushed: false,
        })
    }

    /// Also keep `ids` out of the search, e.g. the rest of a dragged selection.
    pub fn with_exclusions(mut self, ids: &[ObjectId]) -> Self {
        for &id in ids {
            if !self.exclude.contains(&id) {
                self.exclude.push(id);
            }
        }
        self
    }

    pub fn drag_id(&self) -> ObjectId {
        self.drag_id
    }

    pub fn excluded(&self) -> &[ObjectId] {
        &self.exclude
    }

    pub fn connect_index(&self) -> Option<ObjectId> {
        self.connect_index
    }

    /// Current connect location in the target's normalised frame space.
    pub fn connect_point(&self) -> Point {
        self.connect_pt
    }

    pub fn connect_hook_flags(&self) -> HookFlags {
        self.connect_hook_flags
    }

    pub fn join_index(&self) -> Option<ObjectId> {
        self.join_index
    }

    pub fn hilite_connect(&self) -> Option<ObjectId> {
        self.hilite_connect
    }

    pub fn hilite_join(&self) -> Option<ObjectId> {
        self.hilite_join
    }

    /// Snap offset of the last accepted join or connection.
    pub fn drag_delta(&self) -> Vec2 {
        self.drag_delta
    }

    pub fn history(&self) -> &[ObjectId] {
        &self.history
    }

    /// Search for a join or connect target for `hook_points`, the dragged
    /// object's candidate hook points at pointer position `event_pos`.
    ///
    /// Returns true if a join or a connection was found.
    pub fn find_connect(
        &mut self,
        doc: &mut Document,
        hook_points: &[HookPoint],
        request: ConnectRequest,
        event_pos: Point,
        feedback: &mut dyn LinkFeedback,
    ) -> bool {
        let Some(dragged) = doc.object(self.drag_id).cloned() else {
            log::warn!("drag object {} is gone", self.drag_id);
            return false;
        };
        if hook_points.is_empty() {
            return false;
        }
        let previous_pt = self.connect_pt;
        let drag_offset = event_pos - self.drag_start;
        let container_pt = HookPoint::new(
            HookPointId::KCT,
            dragged.hook_to_point(HookPointId::KTC) + drag_offset,
        );
        let classes = self.class_filter(doc, &dragged, request.attach_mode);

        let mut allow_join = request.allow_join;
        let mut accepted = None;
        self.join_index = None;

        for hook_point in hook_points {
            let closes = if allow_join {
                None
            } else {
                dragged.close_polygon(hook_points, doc.config().endpoint_radius)
            };
            if allow_join || closes.is_some() {
                allow_join = true;
                let join = match closes {
                    Some(join) => Some(join),
                    None => self.find_join(doc, &dragged, hook_points, hook_point),
                };
                if let Some(join) = join {
                    self.record_join(join, hook_point);
                    break;
                }
            }

            let Some(hit) = self.find_candidate(doc, &dragged, hook_point, container_pt, classes.as_deref()) else {
                continue;
            };
            if let Some(found) = self.try_candidate(
                doc,
                &dragged,
                hook_point,
                &hit,
                request.attach_mode,
                drag_offset,
                classes.as_deref(),
            ) {
                accepted = Some(found);
                break;
            }
        }

        let found = accepted.is_some();
        let mut perimeter_len = 0;
        match accepted {
            Some(a) => {
                self.connect_index = Some(a.target);
                self.push_history(a.target);
                self.connect_pt = a.connect_pt;
                self.connect_doc_pt = a.doc_pt;
                self.connect_inside = a.cell;
                self.hook_index = a.hook;
                self.connect_hook_flags = a.flags;
                self.drag_delta = a.delta;
                self.prev_connect = Some(a.target);
                perimeter_len = a.perimeter_len;
            }
            None => {
                if let Some(previous) = self.connect_index.take() {
                    self.push_history(previous);
                }
            }
        }

        if request.show_visuals && self.join_index != self.hilite_join {
            let lost = self.connect_index.is_none();
            self.hide_connect(doc, feedback, lost);
            self.hide_join(feedback);
            if let Some(join) = self.join_index {
                self.show(feedback, join, self.join_pt, true, None);
                self.hilite_join = Some(join);
                self.join_mode_pushed = push_mode(feedback, EditMode::LinkJoin);
            }
        }

        let unchanged = self.hilite_connect == self.connect_index && self.hilite_inside == self.connect_inside;
        if unchanged || !request.show_visuals {
            if found && request.show_visuals && unchanged && perimeter_len == 1 && previous_pt != self.connect_pt {
                if let Some(target) = self.connect_index {
                    feedback.move_connect_highlight(target, self.connect_doc_pt, self.connect_inside);
                }
            }
        } else {
            self.hide_join(feedback);
            let lost = self.connect_index.is_none();
            self.hide_connect(doc, feedback, lost);
            if let Some(target) = self.connect_index {
                self.show(feedback, target, self.connect_doc_pt, false, self.connect_inside);
                self.hilite_connect = Some(target);
                self.hilite_inside = self.connect_inside;
                if let Some(object) = doc.transient_mut(self.drag_id) {
                    object.on_connect(target, self.hook_index, self.connect_doc_pt);
                }
                self.connect_mode_pushed = push_mode(feedback, EditMode::LinkConnect);
                log::trace!("drag {} connects to {target}", self.drag_id);
            }
        }

        found || self.join_index.is_some()
    }

    /// Abandon the search: hide every highlight, restore the edit mode and
    /// forget the targets found so far.
    pub fn cancel(&mut self, doc: &mut Document, feedback: &mut dyn LinkFeedback) {
        self.hide_join(feedback);
        self.hide_connect(doc, feedback, true);
        self.connect_index = None;
        self.connect_pt = Point::ZERO;
        self.connect_doc_pt = Point::ZERO;
        self.connect_inside = None;
        self.hook_index = HookPointId::KTL;
        self.connect_hook_flags = HookFlags::empty();
        self.prev_connect = None;
        self.history.clear();
        self.join_index = None;
        self.join_segment = None;
        self.join_source = None;
        self.join_pt = Point::ZERO;
        self.drag_delta = Vec2::ZERO;
        log::debug!("drag {} cancelled", self.drag_id);
    }

    /// End the drag, returning what a drop here would do.
    pub fn finish(mut self, doc: &mut Document, feedback: &mut dyn LinkFeedback) -> DragOutcome {
        let connection = self.connect_index.map(|target| PendingConnection {
            target,
            hook_point: self.hook_index,
            connect_point: self.connect_pt,
            cell: self.connect_inside,
            hook_flags: self.connect_hook_flags,
            delta: self.drag_delta,
        });
        let join = match (self.join_index, self.join_segment, self.join_source) {
            (Some(target), Some(segment), Some(source)) => Some(JoinTarget {
                target,
                segment,
                source,
                delta: self.drag_delta,
            }),
            _ => None,
        };
        self.hide_join(feedback);
        self.hide_connect(doc, feedback, false);
        if let Some(connection) = &connection {
            self.push_history(connection.target);
        }
        DragOutcome {
            connection,
            join,
            history: std::mem::take(&mut self.history),
        }
    }

    /// Run `f` against the session. On error the session is cancelled
    /// before the error is returned.
    pub fn guard<T>(
        &mut self,
        doc: &mut Document,
        feedback: &mut dyn LinkFeedback,
        f: impl FnOnce(&mut DragSession, &mut Document, &mut dyn LinkFeedback) -> EngineResult<T>,
    ) -> EngineResult<T> {
        match f(self, doc, feedback) {
            Ok(value) => Ok(value),
            Err(err) => {
                log::warn!("drag {} aborted: {err}", self.drag_id);
                self.cancel(doc, feedback);
                Err(err)
            }
        }
    }

    /// Classes eligible for an ordinary hit. `None` means every class; an
    /// empty list leaves only container drops.
    fn class_filter(&self, doc: &Document, dragged: &DrawingObject, attach_mode: bool) -> Option<Vec<BaseClass>> {
        if !attach_mode && !self.options.arrays_only && !self.options.from_overlay_layer {
            return None;
        }
        let mut classes = Vec::new();
        if attach_mode {
            classes.push(BaseClass::Line);
        } else if self.options.arrays_only {
            match dragged.base_class() {
                BaseClass::Connector => classes.push(BaseClass::Shape),
                BaseClass::Shape => {
                    classes.push(BaseClass::Connector);
                    if doc.session_flags().contains(SessionFlags::LINE_LINK) {
                        classes.push(BaseClass::Line);
                    }
                }
                BaseClass::Line => {}
            }
        }
        if self.options.from_overlay_layer && !classes.contains(&BaseClass::Shape) {
            classes.push(BaseClass::Shape);
        }
        Some(classes)
    }

    /// Polyline end of another object under `hook_point`.
    fn find_join(
        &self,
        doc: &Document,
        dragged: &DrawingObject,
        hook_points: &[HookPoint],
        hook_point: &HookPoint,
    ) -> Option<JoinHit> {
        if let Some(join) = dragged.close_polygon(hook_points, doc.config().endpoint_radius) {
            return Some(join);
        }
        let opts = FindOptions {
            exclude: &self.exclude,
            classes: Some(&[BaseClass::Line]),
            precise: true,
            dragged: None,
        };
        let hit = find_object_at(doc, hook_point.point, &opts)?;
        if hit.code != HitCode::PolyLineEnd {
            return None;
        }
        let segment = hit.segment?;
        let end = match segment {
            HitSegment::Start => HookPointId::KTL,
            HitSegment::End => HookPointId::KTR,
            HitSegment::Edge(_) => return None,
        };
        let point = doc.object(hit.object)?.hook_to_point(end);
        Some(JoinHit {
            target: hit.object,
            segment,
            point,
        })
    }

    fn record_join(&mut self, join: JoinHit, hook_point: &HookPoint) {
        self.join_index = Some(join.target);
        self.join_segment = Some(join.segment);
        self.join_source = Some(hook_point.id);
        self.join_pt = join.point;
        self.drag_delta = join.point - hook_point.point;
        self.connect_pt = match join.segment {
            HitSegment::Start => Point::ZERO,
            _ => Point::new(DIM_MAX, DIM_MAX),
        };
    }

    /// Re-test the previous target, then fall back to a full search.
    fn find_candidate(
        &self,
        doc: &Document,
        dragged: &DrawingObject,
        hook_point: &HookPoint,
        container_pt: HookPoint,
        classes: Option<&[BaseClass]>,
    ) -> Option<HitResult> {
        if let Some(prev) = self.prev_connect.filter(|id| !self.exclude.contains(id)) {
            if let Some(object) = doc.object(prev) {
                let mut slot = container_pt;
                let allowed = classes.is_none_or(|c| c.contains(&object.base_class()));
                if object.is_container() {
                    if object.is_shape_container(dragged, &mut slot)
                        && rect_contains(object.hit_test_frame(Some(dragged)), slot.point)
                    {
                        return Some(HitResult {
                            object: prev,
                            code: HitCode::InContainer,
                            segment: None,
                            container_pt: Some(slot),
                        });
                    }
                } else if allowed && rect_contains(object.frame, hook_point.point) {
                    let opts = HitOptions::from_config(doc.config(), false);
                    if let Some(hit) = object.hit(hook_point.point, &opts) {
                        return Some(HitResult {
                            object: prev,
                            code: hit.code,
                            segment: hit.segment,
                            container_pt: None,
                        });
                    }
                }
            }
        }
        let opts = FindOptions {
            exclude: &self.exclude,
            classes,
            precise: false,
            dragged: Some((dragged, container_pt)),
        };
        find_object_at(doc, hook_point.point, &opts)
    }

    /// Hook flags the target accepts under the current mode.
    fn effective_target_flags(&self, doc: &Document, target: &DrawingObject) -> HookFlags {
        let mut flags = target.target_flags;
        if self.options.arrays_only || doc.session_flags().contains(SessionFlags::SHAPE_LINK) {
            if self.options.arrays_only && target.base_class() == BaseClass::Line {
                flags.insert(HookFlags::SHAPE);
            }
        } else {
            flags.remove(HookFlags::SHAPE);
        }
        flags
    }

    #[allow(clippy::too_many_arguments)]
    fn try_candidate(
        &self,
        doc: &Document,
        dragged: &DrawingObject,
        hook_point: &HookPoint,
        hit: &HitResult,
        attach_mode: bool,
        drag_offset: Vec2,
        classes: Option<&[BaseClass]>,
    ) -> Option<Accepted> {
        let target = doc.object(hit.object)?;
        let in_container = hit.code == HitCode::InContainer;
        let mut hook_flags = dragged.hook_flags - HookFlags::ATTACH_TO_LINE;

        if !in_container {
            if attach_mode {
                if self.options.auto_insert
                    && (dragged.base_class() != BaseClass::Shape
                        || target.is_hooked_to(self.drag_id)
                        || !target.is_segmented_line())
                {
                    return None;
                }
                if !target.target_flags.contains(HookFlags::ATTACH_TO_LINE) {
                    return None;
                }
            } else if !hook_flags.intersects(self.effective_target_flags(doc, target)) {
                return None;
            }
        }

        hook_flags.set(HookFlags::SHAPE_ON_LINE, attach_mode);
        if dragged.object_type == ObjectType::FloorWall {
            hook_flags.insert(HookFlags::NO_SNAPS);
        }
        let targets = target
            .target_points(hook_point, hook_flags | HookFlags::HOOK_NO_EXTRA, dragged)
            .filter(|t| !t.is_empty())?;
        let perimeter = target.perimeter_points(&targets);

        let (test_pt, mut hook) = match hit.container_pt.filter(|_| in_container) {
            Some(slot) => (slot.point, slot.id),
            None => (hook_point.point, hook_point.id),
        };
        let best = nearest_point_index(&perimeter, test_pt)?;

        if target.is_polygon() && matches!(hit.segment, Some(HitSegment::Edge(_))) {
            let opts = FindOptions {
                exclude: &self.exclude,
                classes,
                precise: false,
                dragged: Some((dragged, HookPoint::new(HookPointId::KCT, test_pt))),
            };
            let recheck = find_object_at(doc, perimeter[best], &opts)?;
            if recheck.object != hit.object || recheck.segment != hit.segment {
                log::trace!("candidate {} rejected: segment changed", hit.object);
                return None;
            }
        }

        let mut current = test_pt;
        if !in_container {
            hook = target.best_hook(dragged, hook_point.id, perimeter[best]);
            current = if hook != hook_point.id {
                dragged.hook_to_point(hook) + drag_offset
            } else {
                hook_point.point
            };
        }

        let delta = perimeter[best] - current;
        if !target.allow_hook(hook_point, dragged, delta.hypot2(), doc.config().hook_distance_limit) {
            return None;
        }
        let auto_insert = attach_mode && self.options.auto_insert;
        if auto_insert && !target.frame_intersects(dragged.insert_frame() + delta) {
            return None;
        }

        let flags = if auto_insert && !self.options.auto_single_point {
            HookFlags::AUTO_INSERT
        } else if self.options.arrays_only
            && target.base_class() == BaseClass::Line
            && dragged.base_class() == BaseClass::Shape
            && hook.is_side_center()
        {
            HookFlags::HOOK_REVERSE
        } else {
            HookFlags::empty()
        };

        Some(Accepted {
            target: hit.object,
            connect_pt: targets[best].point,
            doc_pt: perimeter[best],
            cell: targets[best].cell,
            hook,
            flags,
            delta,
            perimeter_len: perimeter.len(),
        })
    }

    fn push_history(&mut self, id: ObjectId) {
        if !self.history.contains(&id) {
            self.history.push(id);
        }
    }

    fn show(
        &self,
        feedback: &mut dyn LinkFeedback,
        target: ObjectId,
        point: Point,
        join: bool,
        inside: Option<CellId>,
    ) {
        feedback.hilite_connect(&Highlight {
            target,
            point,
            show: true,
            join,
            drag_id: self.drag_id,
            inside,
        });
    }

    fn hide_join(&mut self, feedback: &mut dyn LinkFeedback) {
        let Some(join) = self.hilite_join.take() else {
            return;
        };
        feedback.hilite_connect(&Highlight {
            target: join,
            point: self.join_pt,
            show: false,
            join: true,
            drag_id: self.drag_id,
            inside: None,
        });
        if std::mem::take(&mut self.join_mode_pushed) {
            feedback.undo_edit_mode();
        }
    }

    /// Hide the connect highlight; `lost` also tells the dragged object the
    /// connection is gone.
    fn hide_connect(&mut self, doc: &mut Document, feedback: &mut dyn LinkFeedback, lost: bool) {
        let Some(target) = self.hilite_connect.take() else {
            return;
        };
        if lost {
            if let Some(object) = doc.transient_mut(self.drag_id) {
                object.on_disconnect();
            }
        }
        feedback.hilite_connect(&Highlight {
            target,
            point: self.connect_doc_pt,
            show: false,
            join: false,
            drag_id: self.drag_id,
            inside: self.hilite_inside.take(),
        });
        if std::mem::take(&mut self.connect_mode_pushed) {
            feedback.undo_edit_mode();
        }
    }
}

/// Enter `mode` unless it is already current. Returns whether a mode was pushed.
fn push_mode(feedback: &mut dyn LinkFeedback, mode: EditMode) -> bool {
    if feedback.edit_mode() == mode {
        return false;
    }
    feedback.set_edit_mode(mode);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::{LineKind, ObjectKind, ShapeBody};
    use crate::error::EngineError;
    use crate::testing::{FeedbackEvent, RecordingFeedback, init_logging, shape_at};
    use kurbo::Rect;

    const CONNECT: ConnectRequest = ConnectRequest {
        show_visuals: true,
        attach_mode: false,
        allow_join: false,
    };

    fn custom_target() -> DrawingObject {
        let mut obj = DrawingObject::shape(Rect::new(0.0, 0.0, 10.0, 10.0));
        obj.kind = ObjectKind::Shape(ShapeBody::with_connect_points(vec![
            Point::new(0.0, 0.0),
            Point::new(DIM_MAX, 0.0),
            Point::new(DIM_MAX, DIM_MAX),
        ]));
        obj
    }

    /// A document with the custom target and a line dragged by its end.
    fn line_drag() -> (Document, ObjectId, ObjectId) {
        let mut doc = Document::new();
        let target = doc.add_object(custom_target());
        let line = doc.add_object(DrawingObject::line(
            vec![Point::new(-100.0, 1.0), Point::new(-60.0, 1.0)],
            LineKind::Straight,
        ));
        (doc, target, line)
    }

    fn end_at(x: f64, y: f64) -> [HookPoint; 1] {
        [HookPoint::new(HookPointId::KTR, Point::new(x, y))]
    }

    #[test]
    fn test_nearest_perimeter_point() {
        let (mut doc, target, line) = line_drag();
        let mut fb = RecordingFeedback::default();
        let mut session = DragSession::begin(&doc, line, Point::ZERO, DragOptions::default()).unwrap();
        assert!(session.find_connect(&mut doc, &end_at(9.0, 1.0), CONNECT, Point::ZERO, &mut fb));
        assert_eq!(session.connect_index(), Some(target));
        assert_eq!(session.connect_point(), Point::new(DIM_MAX, 0.0));
        assert_eq!(session.drag_delta(), Vec2::new(1.0, -1.0));
        assert_eq!(session.connect_hook_flags(), HookFlags::empty());
    }

    #[test]
    fn test_highlight_fires_once_per_transition() {
        init_logging();
        let (mut doc, target, line) = line_drag();
        let mut fb = RecordingFeedback::default();
        let mut session = DragSession::begin(&doc, line, Point::ZERO, DragOptions::default()).unwrap();

        session.find_connect(&mut doc, &end_at(9.0, 1.0), CONNECT, Point::ZERO, &mut fb);
        session.find_connect(&mut doc, &end_at(8.0, 2.0), CONNECT, Point::ZERO, &mut fb);
        assert_eq!(fb.shown(), 1);
        assert_eq!(fb.edit_mode(), EditMode::LinkConnect);
        assert_eq!(session.hilite_connect(), Some(target));
        assert_eq!(
            doc.object(line).unwrap().pending_link.map(|p| p.target),
            Some(target)
        );

        assert!(!session.find_connect(&mut doc, &end_at(300.0, 300.0), CONNECT, Point::ZERO, &mut fb));
        assert_eq!(fb.hidden(), 1);
        assert_eq!(fb.edit_mode(), EditMode::Default);
        assert!(doc.object(line).unwrap().pending_link.is_none());
        assert_eq!(session.history(), &[target]);
    }

    #[test]
    fn test_no_visuals_no_events() {
        let (mut doc, target, line) = line_drag();
        let mut fb = RecordingFeedback::default();
        let mut session = DragSession::begin(&doc, line, Point::ZERO, DragOptions::default()).unwrap();
        let quiet = ConnectRequest {
            show_visuals: false,
            ..CONNECT
        };
        assert!(session.find_connect(&mut doc, &end_at(9.0, 1.0), quiet, Point::ZERO, &mut fb));
        assert_eq!(session.connect_index(), Some(target));
        assert!(fb.events.is_empty());
    }

    #[test]
    fn test_cancel_clears_highlights() {
        let (mut doc, _, line) = line_drag();
        let mut fb = RecordingFeedback::default();
        let mut session = DragSession::begin(&doc, line, Point::ZERO, DragOptions::default()).unwrap();
        session.find_connect(&mut doc, &end_at(9.0, 1.0), CONNECT, Point::ZERO, &mut fb);
        session.cancel(&mut doc, &mut fb);
        assert_eq!(session.hilite_connect(), None);
        assert_eq!(session.hilite_join(), None);
        assert_eq!(session.connect_index(), None);
        assert_eq!(fb.edit_mode(), EditMode::Default);
        assert_eq!(fb.hidden(), 1);
    }

    #[test]
    fn test_cancel_forgets_search_state() {
        let (mut doc, target, line) = line_drag();
        let mut fb = RecordingFeedback::default();
        let mut session = DragSession::begin(&doc, line, Point::ZERO, DragOptions::default()).unwrap();
        session.find_connect(&mut doc, &end_at(9.0, 1.0), CONNECT, Point::ZERO, &mut fb);
        assert_eq!(session.history(), &[target]);
        session.cancel(&mut doc, &mut fb);
        assert!(session.history().is_empty());
        assert_eq!(session.connect_point(), Point::ZERO);
        assert_eq!(session.drag_delta(), Vec2::ZERO);
        let outcome = session.finish(&mut doc, &mut fb);
        assert_eq!(outcome, DragOutcome::default());
    }

    #[test]
    fn test_cancel_from_join_highlight() {
        let mut doc = Document::new();
        let poly = doc.add_object(DrawingObject::line(
            vec![
                Point::new(0.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(100.0, 100.0),
                Point::new(2.0, 3.0),
            ],
            LineKind::Polyline,
        ));
        let mut fb = RecordingFeedback::default();
        let mut session = DragSession::begin(&doc, poly, Point::ZERO, DragOptions::default()).unwrap();
        session.find_connect(&mut doc, &end_at(2.0, 3.0), CONNECT, Point::ZERO, &mut fb);
        assert_eq!(session.hilite_join(), Some(poly));
        assert_eq!(fb.edit_mode(), EditMode::LinkJoin);

        session.cancel(&mut doc, &mut fb);
        assert_eq!(session.hilite_join(), None);
        assert_eq!(session.join_index(), None);
        assert_eq!(fb.edit_mode(), EditMode::Default);
        assert_eq!(fb.events.last(), Some(&FeedbackEvent::Hide { target: poly, join: true }));
    }

    #[test]
    fn test_arrays_only_line_finds_nothing() {
        let (mut doc, _, line) = line_drag();
        let mut fb = RecordingFeedback::default();
        let options = DragOptions {
            arrays_only: true,
            ..DragOptions::default()
        };
        let mut session = DragSession::begin(&doc, line, Point::ZERO, options).unwrap();
        assert!(!session.find_connect(&mut doc, &end_at(9.0, 1.0), CONNECT, Point::ZERO, &mut fb));
        assert_eq!(session.connect_index(), None);
        assert!(fb.events.is_empty());
    }

    #[test]
    fn test_shapes_do_not_hook_shapes_by_default() {
        let mut doc = Document::new();
        let _target = doc.add_object(shape_at(0.0, 0.0));
        let dragged = doc.add_object(
            shape_at(100.0, 0.0).with_hook_flags(HookFlags::SHAPE),
        );
        let mut fb = RecordingFeedback::default();
        let mut session = DragSession::begin(&doc, dragged, Point::ZERO, DragOptions::default()).unwrap();
        let hooks = [HookPoint::new(HookPointId::KLC, Point::new(20.0, 20.0))];
        assert!(!session.find_connect(&mut doc, &hooks, CONNECT, Point::ZERO, &mut fb));

        doc.set_session_flags(SessionFlags::SHAPE_LINK);
        assert!(session.find_connect(&mut doc, &hooks, CONNECT, Point::ZERO, &mut fb));
    }

    #[test]
    fn test_join_closes_polyline() {
        let mut doc = Document::new();
        let poly = doc.add_object(DrawingObject::line(
            vec![
                Point::new(0.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(100.0, 100.0),
                Point::new(2.0, 3.0),
            ],
            LineKind::Polyline,
        ));
        let mut fb = RecordingFeedback::default();
        let mut session = DragSession::begin(&doc, poly, Point::ZERO, DragOptions::default()).unwrap();
        assert!(session.find_connect(&mut doc, &end_at(2.0, 3.0), CONNECT, Point::ZERO, &mut fb));
        assert_eq!(session.join_index(), Some(poly));
        assert_eq!(session.hilite_join(), Some(poly));
        assert_eq!(session.connect_point(), Point::ZERO);
        assert_eq!(session.drag_delta(), Vec2::new(-2.0, -3.0));
        assert_eq!(fb.edit_mode(), EditMode::LinkJoin);

        let outcome = session.finish(&mut doc, &mut fb);
        let join = outcome.join.unwrap();
        assert_eq!(join.segment, HitSegment::Start);
        assert_eq!(join.source, HookPointId::KTR);
        assert_eq!(fb.edit_mode(), EditMode::Default);
    }

    #[test]
    fn test_join_another_polyline_end() {
        let mut doc = Document::new();
        let other = doc.add_object(DrawingObject::line(
            vec![Point::new(50.0, 50.0), Point::new(150.0, 50.0)],
            LineKind::Polyline,
        ));
        let dragged = doc.add_object(DrawingObject::line(
            vec![Point::new(0.0, 0.0), Point::new(52.0, 51.0)],
            LineKind::Polyline,
        ));
        let mut fb = RecordingFeedback::default();
        let mut session = DragSession::begin(&doc, dragged, Point::ZERO, DragOptions::default()).unwrap();
        let request = ConnectRequest {
            allow_join: true,
            ..CONNECT
        };
        assert!(session.find_connect(&mut doc, &end_at(52.0, 51.0), request, Point::ZERO, &mut fb));
        assert_eq!(session.join_index(), Some(other));
        assert_eq!(session.drag_delta(), Vec2::new(-2.0, -1.0));
    }

    #[test]
    fn test_attach_auto_insert() {
        let mut doc = Document::new();
        let duct = doc.add_object(DrawingObject::line(
            vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)],
            LineKind::Segmented,
        ));
        let damper = doc.add_object(DrawingObject::shape(Rect::new(40.0, -8.0, 60.0, 12.0)));
        let options = DragOptions {
            auto_insert: true,
            ..DragOptions::default()
        };
        let mut fb = RecordingFeedback::default();
        let mut session = DragSession::begin(&doc, damper, Point::ZERO, options).unwrap();
        let request = ConnectRequest {
            attach_mode: true,
            ..CONNECT
        };
        let hooks = [HookPoint::new(HookPointId::KCC, Point::new(50.0, 2.0))];
        assert!(session.find_connect(&mut doc, &hooks, request, Point::ZERO, &mut fb));
        assert_eq!(session.connect_index(), Some(duct));
        assert_eq!(session.connect_hook_flags(), HookFlags::AUTO_INSERT);
        assert_eq!(session.drag_delta(), Vec2::new(0.0, -2.0));

        let outcome = session.finish(&mut doc, &mut fb);
        assert_eq!(outcome.connection.map(|c| c.target), Some(duct));
        assert_eq!(outcome.history, vec![duct]);
    }

    #[test]
    fn test_attach_needs_segmented_line() {
        let mut doc = Document::new();
        doc.add_object(DrawingObject::line(
            vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)],
            LineKind::Straight,
        ));
        let damper = doc.add_object(DrawingObject::shape(Rect::new(40.0, -8.0, 60.0, 12.0)));
        let options = DragOptions {
            auto_insert: true,
            ..DragOptions::default()
        };
        let mut fb = RecordingFeedback::default();
        let mut session = DragSession::begin(&doc, damper, Point::ZERO, options).unwrap();
        let request = ConnectRequest {
            attach_mode: true,
            ..CONNECT
        };
        let hooks = [HookPoint::new(HookPointId::KCC, Point::new(50.0, 2.0))];
        assert!(!session.find_connect(&mut doc, &hooks, request, Point::ZERO, &mut fb));
    }

    #[test]
    fn test_dependents_are_excluded() {
        let mut doc = Document::new();
        let anchor = doc.add_object(shape_at(0.0, 0.0));
        let line = doc.add_object(DrawingObject::line(
            vec![Point::new(20.0, 20.0), Point::new(100.0, 20.0)],
            LineKind::Straight,
        ));
        assert!(doc.update_hook(line, None, anchor, HookPointId::KTL, Point::ZERO, None));
        let session = DragSession::begin(&doc, anchor, Point::ZERO, DragOptions::default()).unwrap();
        assert!(session.excluded().contains(&line));
        assert!(session.excluded().contains(&anchor));
    }

    #[test]
    fn test_guard_cancels_on_error() {
        let (mut doc, _, line) = line_drag();
        let mut fb = RecordingFeedback::default();
        let mut session = DragSession::begin(&doc, line, Point::ZERO, DragOptions::default()).unwrap();
        let result: EngineResult<()> = session.guard(&mut doc, &mut fb, |s, d, f| {
            s.find_connect(d, &end_at(9.0, 1.0), CONNECT, Point::ZERO, f);
            Err(EngineError::Aborted("pointer lost".to_string()))
        });
        assert!(matches!(result, Err(EngineError::Aborted(_))));
        assert_eq!(session.hilite_connect(), None);
        assert_eq!(fb.edit_mode(), EditMode::Default);
        assert!(matches!(fb.events.last(), Some(FeedbackEvent::Hide { .. })));
    }
}
