//! Drawing objects and their geometric capabilities.

mod connector;
mod container;
mod line;
mod shape;

pub use connector::ConnectorBody;
pub use container::{Arrangement, ContainerBody};
pub use line::{LineBody, LineKind};
pub use shape::ShapeBody;

use crate::config::EngineConfig;
use crate::flags::{ExtraFlags, HookFlags, ObjectFlags};
use crate::geometry::{denormalize_in_frame, rect_contains, rotate_point, rotated_bounds};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side length of the normalised frame space target points live in.
pub const DIM_MAX: f64 = 30000.0;

/// Identifier of a drawing object in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cell index inside a container or table.
pub type CellId = u32;

/// Named attachment point on an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HookPointId(pub u32);

impl HookPointId {
    /// Top left, or the start of a line.
    pub const KTL: Self = Self(1);
    /// Top right, or the end of a line.
    pub const KTR: Self = Self(2);
    pub const KBL: Self = Self(3);
    pub const KBR: Self = Self(4);
    pub const KTC: Self = Self(5);
    pub const KBC: Self = Self(6);
    pub const KLC: Self = Self(7);
    pub const KRC: Self = Self(8);
    /// Container slot, column arrangement.
    pub const KCT: Self = Self(205);
    /// Container slot, row arrangement.
    pub const KCL: Self = Self(207);
    pub const KCC: Self = Self(209);
    pub const CUSTOM_BASE: Self = Self(500);
    const CUSTOM_END: u32 = 600;

    pub fn is_custom(self) -> bool {
        (Self::CUSTOM_BASE.0..Self::CUSTOM_END).contains(&self.0)
    }

    /// Side centres and custom points, the hooks a shape hangs from.
    pub fn is_side_center(self) -> bool {
        matches!(self, Self::KTC | Self::KBC | Self::KLC | Self::KRC) || self.is_custom()
    }
}

/// A candidate hook point of a dragged object, in document space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HookPoint {
    pub id: HookPointId,
    pub point: Point,
}

impl HookPoint {
    pub fn new(id: HookPointId, point: Point) -> Self {
        Self { id, point }
    }
}

/// Broad behavioural class of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseClass {
    Shape,
    Line,
    Connector,
}

/// Domain role of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ObjectType {
    #[default]
    Plain,
    ShapeContainer,
    /// Label riding on another object; moves with its associate.
    EventLabel,
    FloorWall,
}

/// Directional attachment stored on the dependent object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hook {
    /// Object this hook is attached to.
    pub target: ObjectId,
    pub cell: Option<CellId>,
    /// Point on the dependent object that is attached.
    pub hook_point: HookPointId,
    /// Attach location in the target's normalised frame space.
    pub connect: Point,
    pub update: bool,
    pub connect_flags: HookFlags,
}

impl Hook {
    pub fn new(target: ObjectId, hook_point: HookPointId, connect: Point) -> Self {
        Self {
            target,
            cell: None,
            hook_point,
            connect,
            update: false,
            connect_flags: HookFlags::empty(),
        }
    }
}

/// Result code of a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitCode {
    Border,
    Inside,
    /// On a free endpoint of a polyline.
    PolyLineEnd,
    InContainer,
}

impl HitCode {
    /// Numeric code used by the drawing format.
    pub fn code(self) -> u16 {
        match self {
            HitCode::Border => 40,
            HitCode::Inside => 41,
            HitCode::PolyLineEnd => 73,
            HitCode::InContainer => 101,
        }
    }
}

/// Part of a line that was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitSegment {
    Start,
    End,
    Edge(usize),
}

/// Outcome of an object's own hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeHit {
    pub code: HitCode,
    pub segment: Option<HitSegment>,
}

impl ShapeHit {
    pub fn new(code: HitCode) -> Self {
        Self { code, segment: None }
    }
}

/// Tolerances for hit tests.
#[derive(Debug, Clone, Copy)]
pub struct HitOptions {
    /// Report polyline endpoints separately.
    pub precise: bool,
    pub line_tolerance: f64,
    pub endpoint_radius: f64,
    pub border_width: f64,
}

impl HitOptions {
    pub fn from_config(config: &EngineConfig, precise: bool) -> Self {
        Self {
            precise,
            line_tolerance: config.line_hit_tolerance,
            endpoint_radius: config.endpoint_radius,
            border_width: config.border_width,
        }
    }
}

/// A connection location offered by a target, in its normalised frame space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetPoint {
    pub point: Point,
    pub cell: Option<CellId>,
}

impl TargetPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            point: Point::new(x, y),
            cell: None,
        }
    }
}

/// Polygon-closing attachment found by [`Drawable::close_polygon`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinHit {
    pub target: ObjectId,
    pub segment: HitSegment,
    pub point: Point,
}

/// Connection preview recorded on the dragged object while a drag hovers a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingLink {
    pub target: ObjectId,
    pub hook_point: HookPointId,
    pub point: Point,
}

/// Variant-specific geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectKind {
    Shape(ShapeBody),
    Line(LineBody),
    Connector(ConnectorBody),
    Container(ContainerBody),
}

/// A drawing object record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingObject {
    /// Assigned by the store on insertion.
    pub id: ObjectId,
    pub frame: Rect,
    /// Rotation in degrees.
    pub rotation: f64,
    pub flags: ObjectFlags,
    pub extra_flags: ExtraFlags,
    /// What this object may hook onto.
    pub hook_flags: HookFlags,
    /// What may hook onto this object.
    pub target_flags: HookFlags,
    pub hooks: Vec<Hook>,
    pub max_hooks: usize,
    pub object_type: ObjectType,
    /// Associated object for labels.
    pub assoc_id: Option<ObjectId>,
    pub has_text: bool,
    pub kind: ObjectKind,
    #[serde(skip)]
    pub pending_link: Option<PendingLink>,
}

impl DrawingObject {
    fn with_kind(frame: Rect, kind: ObjectKind) -> Self {
        Self {
            id: ObjectId(0),
            frame,
            rotation: 0.0,
            flags: ObjectFlags::empty(),
            extra_flags: ExtraFlags::empty(),
            hook_flags: HookFlags::empty(),
            target_flags: HookFlags::empty(),
            hooks: Vec::new(),
            max_hooks: 1,
            object_type: ObjectType::Plain,
            assoc_id: None,
            has_text: false,
            kind,
            pending_link: None,
        }
    }

    /// A plain shape that hooks onto lines and accepts shapes and lines.
    pub fn shape(frame: Rect) -> Self {
        let mut obj = Self::with_kind(frame.abs(), ObjectKind::Shape(ShapeBody::default()));
        obj.hook_flags = HookFlags::LINE;
        obj.target_flags = HookFlags::SHAPE | HookFlags::LINE;
        obj
    }

    /// A line through the given vertices.
    pub fn line(points: Vec<Point>, kind: LineKind) -> Self {
        let body = LineBody::new(points, kind);
        let frame = body.bounds();
        let mut obj = Self::with_kind(frame, ObjectKind::Line(body));
        obj.hook_flags = HookFlags::SHAPE | HookFlags::LINE;
        obj.target_flags = HookFlags::SHAPE | HookFlags::LINE | HookFlags::ATTACH_TO_LINE;
        obj.max_hooks = 2;
        obj
    }

    /// A connector array along the given spine.
    pub fn connector(spine: Vec<Point>) -> Self {
        let body = ConnectorBody::new(spine);
        let frame = body.bounds();
        let mut obj = Self::with_kind(frame, ObjectKind::Connector(body));
        obj.hook_flags = HookFlags::SHAPE;
        obj.target_flags = HookFlags::SHAPE;
        obj
    }

    /// A shape container laid out in the given arrangement.
    pub fn container(frame: Rect, arrangement: Arrangement) -> Self {
        let mut obj = Self::with_kind(
            frame.abs(),
            ObjectKind::Container(ContainerBody::new(arrangement)),
        );
        obj.object_type = ObjectType::ShapeContainer;
        obj.target_flags = HookFlags::SHAPE;
        obj
    }

    pub fn with_flags(mut self, flags: ObjectFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_extra_flags(mut self, flags: ExtraFlags) -> Self {
        self.extra_flags = flags;
        self
    }

    pub fn with_hook_flags(mut self, flags: HookFlags) -> Self {
        self.hook_flags = flags;
        self
    }

    pub fn with_target_flags(mut self, flags: HookFlags) -> Self {
        self.target_flags = flags;
        self
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_type(mut self, object_type: ObjectType) -> Self {
        self.object_type = object_type;
        self
    }

    pub fn with_text(mut self) -> Self {
        self.has_text = true;
        self
    }

    pub fn base_class(&self) -> BaseClass {
        match self.kind {
            ObjectKind::Shape(_) | ObjectKind::Container(_) => BaseClass::Shape,
            ObjectKind::Line(_) => BaseClass::Line,
            ObjectKind::Connector(_) => BaseClass::Connector,
        }
    }

    pub fn is_container(&self) -> bool {
        self.object_type == ObjectType::ShapeContainer
    }

    /// Open or closed polyline whose segments must match during connection search.
    pub fn is_polygon(&self) -> bool {
        matches!(&self.kind, ObjectKind::Line(l) if l.kind == LineKind::Polyline)
    }

    pub fn is_segmented_line(&self) -> bool {
        matches!(&self.kind, ObjectKind::Line(l) if l.kind == LineKind::Segmented)
    }

    pub fn as_container(&self) -> Option<&ContainerBody> {
        match &self.kind {
            ObjectKind::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_container_mut(&mut self) -> Option<&mut ContainerBody> {
        match &mut self.kind {
            ObjectKind::Container(c) => Some(c),
            _ => None,
        }
    }

    /// True if one of this object's hooks points at `target`.
    pub fn is_hooked_to(&self, target: ObjectId) -> bool {
        self.hooks.iter().any(|h| h.target == target)
    }

    /// Frame used for move bounds and enclosure tests.
    pub fn move_rect(&self) -> Rect {
        rotated_bounds(self.frame, self.rotation)
    }

    /// Document position of one of this object's hook points.
    pub fn hook_to_point(&self, hook_point: HookPointId) -> Point {
        if let ObjectKind::Line(line) = &self.kind {
            if let Some(p) = line.endpoint(hook_point) {
                return p;
            }
        }
        let f = self.frame;
        let c = f.center();
        let local = match hook_point {
            HookPointId::KTL => Point::new(f.x0, f.y0),
            HookPointId::KTR => Point::new(f.x1, f.y0),
            HookPointId::KBL => Point::new(f.x0, f.y1),
            HookPointId::KBR => Point::new(f.x1, f.y1),
            HookPointId::KTC => Point::new(c.x, f.y0),
            HookPointId::KBC => Point::new(c.x, f.y1),
            HookPointId::KLC => Point::new(f.x0, c.y),
            HookPointId::KRC => Point::new(f.x1, c.y),
            _ => c,
        };
        rotate_point(local, c, self.rotation)
    }

    /// Frame used when auto-inserting into a line; quarter turns swap the sides.
    pub fn insert_frame(&self) -> Rect {
        let quadrant = ((self.rotation + 45.0) / 90.0).floor() as i64;
        if quadrant.rem_euclid(2) == 0 {
            return self.frame;
        }
        let c = self.frame.center();
        let (hw, hh) = (self.frame.height() / 2.0, self.frame.width() / 2.0);
        Rect::new(c.x - hw, c.y - hh, c.x + hw, c.y + hh)
    }

    /// True if the variant's geometry crosses `rect`.
    pub fn frame_intersects(&self, rect: Rect) -> bool {
        match &self.kind {
            ObjectKind::Line(l) => l.intersects_rect(rect),
            ObjectKind::Connector(c) => c.intersects_rect(rect),
            _ => self.frame.intersect(rect).area() > 0.0,
        }
    }

    /// Move the object and its variant geometry.
    pub fn translate(&mut self, delta: Vec2) {
        self.frame = self.frame + delta;
        match &mut self.kind {
            ObjectKind::Line(l) => l.translate(delta),
            ObjectKind::Connector(c) => c.translate(delta),
            ObjectKind::Shape(_) | ObjectKind::Container(_) => {}
        }
    }
}

/// Geometric capabilities consumed by hit testing, connection search and move sets.
pub trait Drawable {
    /// Frame tested before the precise hit; `dragged` is the object being dropped, if any.
    fn hit_test_frame(&self, dragged: Option<&DrawingObject>) -> Rect;

    fn hit(&self, point: Point, opts: &HitOptions) -> Option<ShapeHit>;

    /// Connection locations near `hook`, in normalised frame space.
    fn target_points(
        &self,
        hook: &HookPoint,
        hook_flags: HookFlags,
        dragged: &DrawingObject,
    ) -> Option<Vec<TargetPoint>>;

    /// Map target points to document space.
    fn perimeter_points(&self, targets: &[TargetPoint]) -> Vec<Point>;

    /// Hook point of `dragged` that should attach at `at`.
    fn best_hook(&self, dragged: &DrawingObject, hook_point: HookPointId, at: Point) -> HookPointId;

    fn allow_hook(&self, hook: &HookPoint, dragged: &DrawingObject, dist_sq: f64, limit: f64) -> bool;

    /// True if `dragged` can be dropped into this object; adjusts `container_pt` to the slot.
    fn is_shape_container(&self, dragged: &DrawingObject, container_pt: &mut HookPoint) -> bool;

    fn enclosed_objects(&self, visible: &[&DrawingObject]) -> Vec<ObjectId>;

    fn on_connect(&mut self, target: ObjectId, hook_point: HookPointId, point: Point);

    fn on_disconnect(&mut self);

    fn close_polygon(&self, hook_points: &[HookPoint], radius: f64) -> Option<JoinHit>;
}

impl Drawable for DrawingObject {
    fn hit_test_frame(&self, dragged: Option<&DrawingObject>) -> Rect {
        match &self.kind {
            ObjectKind::Shape(_) => self.move_rect(),
            ObjectKind::Line(_) | ObjectKind::Connector(_) => self.frame,
            ObjectKind::Container(c) => c.hit_test_frame(self.frame, dragged),
        }
    }

    fn hit(&self, point: Point, opts: &HitOptions) -> Option<ShapeHit> {
        match &self.kind {
            ObjectKind::Shape(s) => s.hit(self, point, opts),
            ObjectKind::Line(l) => l.hit(point, opts),
            ObjectKind::Connector(c) => c.hit(point, opts),
            ObjectKind::Container(_) => {
                rect_contains(self.frame, point).then(|| ShapeHit::new(HitCode::Inside))
            }
        }
    }

    fn target_points(
        &self,
        hook: &HookPoint,
        _hook_flags: HookFlags,
        dragged: &DrawingObject,
    ) -> Option<Vec<TargetPoint>> {
        match &self.kind {
            ObjectKind::Shape(s) => Some(s.target_points()),
            ObjectKind::Line(l) => l.target_points(self.frame, hook, dragged),
            ObjectKind::Connector(c) => c.target_points(self.frame, hook),
            ObjectKind::Container(c) => Some(c.target_points()),
        }
    }

    fn perimeter_points(&self, targets: &[TargetPoint]) -> Vec<Point> {
        let center = self.frame.center();
        targets
            .iter()
            .map(|t| {
                let p = denormalize_in_frame(t.point, self.frame, DIM_MAX);
                rotate_point(p, center, self.rotation)
            })
            .collect()
    }

    fn best_hook(&self, dragged: &DrawingObject, hook_point: HookPointId, at: Point) -> HookPointId {
        match &self.kind {
            ObjectKind::Line(_) | ObjectKind::Connector(_) => {
                line::facing_side_hook(dragged, hook_point, at)
            }
            ObjectKind::Shape(_) | ObjectKind::Container(_) => hook_point,
        }
    }

    fn allow_hook(&self, hook: &HookPoint, dragged: &DrawingObject, dist_sq: f64, limit: f64) -> bool {
        match &self.kind {
            ObjectKind::Line(_) => {
                !(dragged.base_class() == BaseClass::Shape
                    && hook.id.is_side_center()
                    && dist_sq > limit)
            }
            _ => true,
        }
    }

    fn is_shape_container(&self, dragged: &DrawingObject, container_pt: &mut HookPoint) -> bool {
        match &self.kind {
            ObjectKind::Container(c) => c.accepts(dragged, container_pt),
            _ => false,
        }
    }

    fn enclosed_objects(&self, visible: &[&DrawingObject]) -> Vec<ObjectId> {
        match &self.kind {
            ObjectKind::Shape(s) => s.enclosed_objects(self, visible),
            ObjectKind::Container(c) => c.contents.clone(),
            ObjectKind::Line(_) | ObjectKind::Connector(_) => Vec::new(),
        }
    }

    fn on_connect(&mut self, target: ObjectId, hook_point: HookPointId, point: Point) {
        self.pending_link = Some(PendingLink {
            target,
            hook_point,
            point,
        });
    }

    fn on_disconnect(&mut self) {
        self.pending_link = None;
    }

    fn close_polygon(&self, hook_points: &[HookPoint], radius: f64) -> Option<JoinHit> {
        match &self.kind {
            ObjectKind::Line(l) => l.close_polygon(self.id, hook_points, radius),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_center_ids() {
        assert!(HookPointId::KTC.is_side_center());
        assert!(HookPointId(512).is_side_center());
        assert!(!HookPointId::KTL.is_side_center());
        assert!(!HookPointId(600).is_side_center());
    }

    #[test]
    fn test_base_class() {
        let container = DrawingObject::container(Rect::new(0.0, 0.0, 50.0, 50.0), Arrangement::Row);
        assert_eq!(container.base_class(), BaseClass::Shape);
        assert!(container.is_container());
        let line = DrawingObject::line(vec![Point::ZERO, Point::new(10.0, 0.0)], LineKind::Straight);
        assert_eq!(line.base_class(), BaseClass::Line);
    }

    #[test]
    fn test_hook_to_point_rotated() {
        let obj = DrawingObject::shape(Rect::new(0.0, 0.0, 20.0, 10.0)).with_rotation(90.0);
        let p = obj.hook_to_point(HookPointId::KRC);
        assert!((p.x - 10.0).abs() < 1e-9);
        assert!((p.y - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_line_hook_points_are_endpoints() {
        let line = DrawingObject::line(
            vec![Point::new(5.0, 5.0), Point::new(50.0, 5.0), Point::new(50.0, 40.0)],
            LineKind::Segmented,
        );
        assert_eq!(line.hook_to_point(HookPointId::KTL), Point::new(5.0, 5.0));
        assert_eq!(line.hook_to_point(HookPointId::KTR), Point::new(50.0, 40.0));
    }

    #[test]
    fn test_perimeter_points_denormalize() {
        let obj = DrawingObject::shape(Rect::new(0.0, 0.0, 10.0, 10.0));
        let pts = obj.perimeter_points(&[TargetPoint::new(DIM_MAX, 0.0)]);
        assert_eq!(pts, vec![Point::new(10.0, 0.0)]);
    }

    #[test]
    fn test_insert_frame_swaps_on_quarter_turn() {
        let obj = DrawingObject::shape(Rect::new(0.0, 0.0, 40.0, 10.0)).with_rotation(90.0);
        let f = obj.insert_frame();
        assert_eq!(f.width(), 10.0);
        assert_eq!(f.height(), 40.0);
        let upright = obj.clone().with_rotation(180.0);
        assert_eq!(upright.insert_frame(), upright.frame);
    }

    #[test]
    fn test_connect_notifications() {
        let mut obj = DrawingObject::shape(Rect::new(0.0, 0.0, 10.0, 10.0));
        obj.on_connect(ObjectId(3), HookPointId::KTC, Point::new(1.0, 2.0));
        assert_eq!(obj.pending_link.map(|p| p.target), Some(ObjectId(3)));
        obj.on_disconnect();
        assert!(obj.pending_link.is_none());
    }

    #[test]
    fn test_translate_moves_line_vertices() {
        let mut line = DrawingObject::line(vec![Point::ZERO, Point::new(10.0, 0.0)], LineKind::Straight);
        line.translate(Vec2::new(5.0, 5.0));
        assert_eq!(line.hook_to_point(HookPointId::KTL), Point::new(5.0, 5.0));
        assert_eq!(line.frame.x0, 5.0);
    }
}
