//! Plain shapes (equipment symbols, rooms, boxes).

use super::{DIM_MAX, DrawingObject, HitCode, HitOptions, ObjectId, ShapeHit, TargetPoint};
use crate::geometry::{rect_contains, rect_encloses, rotate_point};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Shape-specific data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeBody {
    /// Custom connection points in normalised frame space; side centres when empty.
    pub connect_points: Vec<Point>,
    /// A closed outline that carries the shapes drawn inside it.
    pub encloses: bool,
}

impl ShapeBody {
    pub fn with_connect_points(points: Vec<Point>) -> Self {
        Self {
            connect_points: points,
            encloses: false,
        }
    }

    pub(super) fn hit(&self, obj: &DrawingObject, point: Point, opts: &HitOptions) -> Option<ShapeHit> {
        let f = obj.frame;
        let local = rotate_point(point, f.center(), -obj.rotation);
        if !rect_contains(f, local) {
            return None;
        }
        let edge = (local.x - f.x0)
            .min(f.x1 - local.x)
            .min(local.y - f.y0)
            .min(f.y1 - local.y);
        let code = if edge <= opts.border_width {
            HitCode::Border
        } else {
            HitCode::Inside
        };
        Some(ShapeHit::new(code))
    }

    pub(super) fn target_points(&self) -> Vec<TargetPoint> {
        if !self.connect_points.is_empty() {
            return self
                .connect_points
                .iter()
                .map(|p| TargetPoint::new(p.x, p.y))
                .collect();
        }
        let half = DIM_MAX / 2.0;
        vec![
            TargetPoint::new(half, 0.0),
            TargetPoint::new(DIM_MAX, half),
            TargetPoint::new(half, DIM_MAX),
            TargetPoint::new(0.0, half),
        ]
    }

    pub(super) fn enclosed_objects(&self, obj: &DrawingObject, visible: &[&DrawingObject]) -> Vec<ObjectId> {
        if !self.encloses {
            return Vec::new();
        }
        let outline = obj.move_rect();
        visible
            .iter()
            .filter(|o| o.id != obj.id && rect_encloses(outline, o.move_rect()))
            .map(|o| o.id)
            .collect()
    }
}
