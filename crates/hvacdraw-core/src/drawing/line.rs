//! Lines: straight runs, segmented (orthogonal) runs and polylines.

use super::{
    BaseClass, DIM_MAX, DrawingObject, HitCode, HitOptions, HitSegment, HookPoint, HookPointId,
    JoinHit, ObjectId, ShapeHit, TargetPoint,
};
use crate::geometry::{
    bounds_of, closest_point_on_polyline, line_segments_intersect_rect, normalize_in_frame,
};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// How a line routes between its vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineKind {
    Straight,
    Segmented,
    Polyline,
}

/// Line-specific data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineBody {
    pub points: Vec<Point>,
    pub kind: LineKind,
    /// Polylines only: last vertex joins the first.
    pub closed: bool,
}

impl LineBody {
    pub fn new(points: Vec<Point>, kind: LineKind) -> Self {
        Self {
            points,
            kind,
            closed: false,
        }
    }

    pub fn bounds(&self) -> Rect {
        bounds_of(&self.points).unwrap_or(Rect::ZERO)
    }

    /// Vertices including the closing segment.
    pub fn path(&self) -> Vec<Point> {
        let mut path = self.points.clone();
        if self.closed {
            if let Some(first) = self.points.first() {
                path.push(*first);
            }
        }
        path
    }

    pub(super) fn endpoint(&self, hook_point: HookPointId) -> Option<Point> {
        match hook_point {
            HookPointId::KTL => self.points.first().copied(),
            HookPointId::KTR => self.points.last().copied(),
            _ => None,
        }
    }

    pub(super) fn translate(&mut self, delta: Vec2) {
        for p in &mut self.points {
            *p += delta;
        }
    }

    pub(super) fn hit(&self, point: Point, opts: &HitOptions) -> Option<ShapeHit> {
        if opts.precise && !self.closed {
            let near = |p: Option<&Point>| p.is_some_and(|p| (*p - point).hypot() <= opts.endpoint_radius);
            if near(self.points.first()) {
                return Some(ShapeHit {
                    code: HitCode::PolyLineEnd,
                    segment: Some(HitSegment::Start),
                });
            }
            if near(self.points.last()) {
                return Some(ShapeHit {
                    code: HitCode::PolyLineEnd,
                    segment: Some(HitSegment::End),
                });
            }
        }
        let (index, on_line) = closest_point_on_polyline(point, &self.path())?;
        ((on_line - point).hypot() <= opts.line_tolerance).then_some(ShapeHit {
            code: HitCode::Border,
            segment: Some(HitSegment::Edge(index)),
        })
    }

    pub(super) fn target_points(
        &self,
        frame: Rect,
        hook: &HookPoint,
        dragged: &DrawingObject,
    ) -> Option<Vec<TargetPoint>> {
        if self.kind == LineKind::Polyline
            && dragged.base_class() == BaseClass::Shape
            && hook.id.is_side_center()
        {
            return None;
        }
        let (_, on_line) = closest_point_on_polyline(hook.point, &self.path())?;
        let n = normalize_in_frame(on_line, frame, DIM_MAX);
        Some(vec![TargetPoint::new(n.x, n.y)])
    }

    pub(super) fn close_polygon(
        &self,
        id: ObjectId,
        hook_points: &[HookPoint],
        radius: f64,
    ) -> Option<JoinHit> {
        if self.kind != LineKind::Polyline || self.closed || self.points.len() <= 3 {
            return None;
        }
        let moving = hook_points.first()?;
        let (segment, other) = match moving.id {
            HookPointId::KTL => (HitSegment::End, *self.points.last()?),
            HookPointId::KTR => (HitSegment::Start, *self.points.first()?),
            _ => return None,
        };
        ((other - moving.point).hypot() <= radius).then_some(JoinHit {
            target: id,
            segment,
            point: other,
        })
    }

    pub(super) fn intersects_rect(&self, rect: Rect) -> bool {
        line_segments_intersect_rect(&self.path(), rect)
    }
}

/// Turn a dragged shape's side-centre hook toward the attach location.
pub(super) fn facing_side_hook(dragged: &DrawingObject, hook_point: HookPointId, at: Point) -> HookPointId {
    if dragged.base_class() != BaseClass::Shape || !hook_point.is_side_center() || hook_point.is_custom() {
        return hook_point;
    }
    let d = at - dragged.frame.center();
    if d.x.abs() >= d.y.abs() {
        if d.x >= 0.0 { HookPointId::KRC } else { HookPointId::KLC }
    } else if d.y >= 0.0 {
        HookPointId::KBC
    } else {
        HookPointId::KTC
    }
}
