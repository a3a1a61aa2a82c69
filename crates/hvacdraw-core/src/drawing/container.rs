//! Shape containers: ordered slots that shapes are dropped into.

use super::{
    BaseClass, CellId, DIM_MAX, DrawingObject, HookPoint, HookPointId, ObjectId, ObjectType,
    TargetPoint,
};
use crate::flags::ObjectFlags;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// How a container lays out its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arrangement {
    Row,
    Column,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerBody {
    pub contents: Vec<ObjectId>,
    pub arrangement: Arrangement,
    /// Fixed-width slots instead of packed children.
    pub sparse: bool,
    pub h_spacing: f64,
    pub v_spacing: f64,
    pub child_width: f64,
}

impl ContainerBody {
    pub fn new(arrangement: Arrangement) -> Self {
        Self {
            contents: Vec::new(),
            arrangement,
            sparse: false,
            h_spacing: 10.0,
            v_spacing: 10.0,
            child_width: 50.0,
        }
    }

    /// Frame grown by the spacing a dropped shape needs.
    pub(super) fn hit_test_frame(&self, frame: Rect, dragged: Option<&DrawingObject>) -> Rect {
        let mut out = frame;
        let Some(dragged) = dragged.filter(|d| d.base_class() == BaseClass::Shape) else {
            return out;
        };
        if self.sparse {
            out.x0 -= self.h_spacing + self.child_width / 2.0;
            out.x1 += self.child_width / 2.0;
        } else {
            out.x1 += self.h_spacing + dragged.frame.width() / 2.0;
        }
        out.y1 += 2.0 * self.v_spacing;
        out
    }

    pub(super) fn accepts(&self, dragged: &DrawingObject, container_pt: &mut HookPoint) -> bool {
        if dragged.base_class() != BaseClass::Shape
            || dragged.object_type == ObjectType::ShapeContainer
            || dragged.flags.contains(ObjectFlags::LOCK)
        {
            return false;
        }
        if self.sparse || self.arrangement == Arrangement::Column {
            container_pt.id = HookPointId::KCT;
        } else {
            container_pt.point.x -= dragged.frame.width() / 2.0;
            container_pt.point.y += dragged.frame.height() / 2.0;
            container_pt.id = HookPointId::KCL;
        }
        true
    }

    /// The next free slot.
    pub(super) fn target_points(&self) -> Vec<TargetPoint> {
        let (x, y) = match self.arrangement {
            Arrangement::Column => (DIM_MAX / 2.0, 0.0),
            Arrangement::Row => (0.0, DIM_MAX / 2.0),
        };
        vec![TargetPoint {
            point: Point::new(x, y),
            cell: Some(self.contents.len() as CellId),
        }]
    }
}
