//! Geometry helpers shared by hit testing and connection search.

use kurbo::{Point, Rect, Vec2};

/// Closest point to `point` on the segment a→b.
pub fn closest_point_on_segment(point: Point, a: Point, b: Point) -> Point {
    let seg = b - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return a;
    }
    let t = ((point - a).dot(seg) / len_sq).clamp(0.0, 1.0);
    a + seg * t
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    (point - closest_point_on_segment(point, a, b)).hypot()
}

/// Minimum distance from a point to a polyline (sequence of connected segments).
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

/// Closest point on a polyline, with the index of the segment it lies on.
pub fn closest_point_on_polyline(point: Point, points: &[Point]) -> Option<(usize, Point)> {
    if points.len() == 1 {
        return Some((0, points[0]));
    }
    let mut best: Option<(usize, Point, f64)> = None;
    for (index, w) in points.windows(2).enumerate() {
        let candidate = closest_point_on_segment(point, w[0], w[1]);
        let dist = (point - candidate).hypot2();
        if best.is_none_or(|(_, _, d)| dist < d) {
            best = Some((index, candidate, dist));
        }
    }
    best.map(|(index, p, _)| (index, p))
}

/// Index of the point with the smallest squared distance to `to`.
///
/// Exact ties keep the lowest index.
pub fn nearest_point_index(points: &[Point], to: Point) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, p) in points.iter().enumerate() {
        let dist = (*p - to).hypot2();
        if best.is_none_or(|(_, d)| dist < d) {
            best = Some((index, dist));
        }
    }
    best.map(|(index, _)| index)
}

/// Rotate a point around a centre by `degrees` (clockwise in screen space).
pub fn rotate_point(point: Point, center: Point, degrees: f64) -> Point {
    if degrees == 0.0 {
        return point;
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    let d = point - center;
    Point::new(
        center.x + d.x * cos - d.y * sin,
        center.y + d.x * sin + d.y * cos,
    )
}

/// Axis-aligned bounds of a rectangle rotated about its centre.
pub fn rotated_bounds(rect: Rect, degrees: f64) -> Rect {
    if degrees % 360.0 == 0.0 {
        return rect;
    }
    let center = rect.center();
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ]
    .map(|c| rotate_point(c, center, degrees));
    bounds_of(&corners).unwrap_or(rect)
}

/// Bounds of a point set.
pub fn bounds_of(points: &[Point]) -> Option<Rect> {
    let (first, rest) = points.split_first()?;
    Some(
        rest.iter()
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
    )
}

/// Grow a frame around its centre so neither side is below `min`.
pub fn inflate_to_min(rect: Rect, min: f64) -> Rect {
    let mut out = rect.abs();
    if out.width() < min {
        let cx = out.center().x;
        out.x0 = cx - min / 2.0;
        out.x1 = cx + min / 2.0;
    }
    if out.height() < min {
        let cy = out.center().y;
        out.y0 = cy - min / 2.0;
        out.y1 = cy + min / 2.0;
    }
    out
}

/// Closed containment test (edges count as inside).
pub fn rect_contains(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// True if `inner` lies entirely within `outer`.
pub fn rect_encloses(outer: Rect, inner: Rect) -> bool {
    inner.x0 >= outer.x0 && inner.x1 <= outer.x1 && inner.y0 >= outer.y0 && inner.y1 <= outer.y1
}

/// Map a document point into the 0..`scale` space of `frame`.
pub fn normalize_in_frame(point: Point, frame: Rect, scale: f64) -> Point {
    let axis = |v: f64, lo: f64, len: f64| if len > 0.0 { (v - lo) / len * scale } else { 0.0 };
    Point::new(
        axis(point.x, frame.x0, frame.width()),
        axis(point.y, frame.y0, frame.height()),
    )
}

/// Inverse of [`normalize_in_frame`].
pub fn denormalize_in_frame(point: Point, frame: Rect, scale: f64) -> Point {
    frame.origin() + Vec2::new(point.x / scale * frame.width(), point.y / scale * frame.height())
}

/// Test if any line segment (defined by consecutive points) intersects or is inside a rectangle.
pub fn line_segments_intersect_rect(points: &[Point], rect: Rect) -> bool {
    if points.iter().any(|p| rect_contains(rect, *p)) {
        return true;
    }
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    points.windows(2).any(|w| {
        (0..4).any(|i| segments_intersect(w[0], w[1], corners[i], corners[(i + 1) % 4]))
    })
}

/// Test if two line segments (a-b) and (c-d) intersect.
fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let cross = |o: Point, p: Point, q: Point| (p - o).cross(q - o);
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);
    if d1 * d2 < 0.0 && d3 * d4 < 0.0 {
        return true;
    }
    // Collinear: an endpoint lies on the other segment
    let on_segment = |p: Point, q: Point, r: Point| {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    };
    (d1.abs() < 1e-10 && on_segment(c, d, a))
        || (d2.abs() < 1e-10 && on_segment(c, d, b))
        || (d3.abs() < 1e-10 && on_segment(a, b, c))
        || (d4.abs() < 1e-10 && on_segment(a, b, d))
}
