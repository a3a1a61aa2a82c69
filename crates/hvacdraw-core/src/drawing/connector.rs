//! Connector arrays: a spine that shapes hang from.

use super::{DIM_MAX, HitCode, HitOptions, HitSegment, HookPoint, ShapeHit, TargetPoint};
use crate::geometry::{
    bounds_of, closest_point_on_polyline, line_segments_intersect_rect, normalize_in_frame,
};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorBody {
    pub spine: Vec<Point>,
}

impl ConnectorBody {
    pub fn new(spine: Vec<Point>) -> Self {
        Self { spine }
    }

    pub fn bounds(&self) -> Rect {
        bounds_of(&self.spine).unwrap_or(Rect::ZERO)
    }

    pub(super) fn translate(&mut self, delta: Vec2) {
        for p in &mut self.spine {
            *p += delta;
        }
    }

    pub(super) fn hit(&self, point: Point, opts: &HitOptions) -> Option<ShapeHit> {
        let (index, on_spine) = closest_point_on_polyline(point, &self.spine)?;
        ((on_spine - point).hypot() <= opts.line_tolerance).then_some(ShapeHit {
            code: HitCode::Border,
            segment: Some(HitSegment::Edge(index)),
        })
    }

    pub(super) fn target_points(&self, frame: Rect, hook: &HookPoint) -> Option<Vec<TargetPoint>> {
        let (_, on_spine) = closest_point_on_polyline(hook.point, &self.spine)?;
        let n = normalize_in_frame(on_spine, frame, DIM_MAX);
        Some(vec![TargetPoint::new(n.x, n.y)])
    }

    pub(super) fn intersects_rect(&self, rect: Rect) -> bool {
        line_segments_intersect_rect(&self.spine, rect)
    }
}
