//! Stateless planar geometry used by attachment and scenario selection.
//!
//! All functions take plain [`Point`]s; none of them look at the graph.
//! Segments are parameterised as `A + t·(B − A)` with `t ∈ [0, 1]`.

use std::cmp::Ordering;

use wf_core::{EdgeKey, Point};

/// Orientation values with magnitude below this are treated as zero.
const ORIENT_EPS: f64 = 1e-12;

// ── Projection ────────────────────────────────────────────────────────────────

/// Result of projecting a point onto a segment.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Projection {
    /// Unclamped projection parameter.  Callers use it to decide whether the
    /// foot of the perpendicular lies inside the segment.
    pub t: f64,
    /// Closest point on the segment (clamped parameter).
    pub point: Point,
    /// Distance from the query point to `point`.
    pub distance: f64,
}

impl Projection {
    /// `true` when the perpendicular foot lies on the segment.
    #[inline]
    pub fn within_segment(&self) -> bool {
        (0.0..=1.0).contains(&self.t)
    }
}

/// Project `p` onto the segment `a → b`.
///
/// A zero-length segment projects everything onto `a` with `t = 0`.
pub fn project_point_onto_segment(p: Point, a: Point, b: Point) -> Projection {
    let vx = b.x - a.x;
    let vy = b.y - a.y;
    let len_sq = vx * vx + vy * vy;
    if len_sq == 0.0 {
        return Projection { t: 0.0, point: a, distance: p.distance(a) };
    }
    let t = ((p.x - a.x) * vx + (p.y - a.y) * vy) / len_sq;
    let point = a.lerp(b, t.clamp(0.0, 1.0));
    Projection { t, point, distance: p.distance(point) }
}

/// A projection tagged with the edge it was computed for.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EdgeProjection {
    pub edge:       EdgeKey,
    pub projection: Projection,
}

/// The `k` candidate edges whose in-segment projection (`0 ≤ t ≤ 1`) is
/// closest to `point`, nearest first.  Equal distances are ordered by edge
/// key so the result does not depend on candidate order.
pub fn nearest_edge_projection<I>(point: Point, candidates: I, k: usize) -> Vec<EdgeProjection>
where
    I: IntoIterator<Item = (EdgeKey, Point, Point)>,
{
    if k == 0 {
        return Vec::new();
    }
    let mut hits: Vec<EdgeProjection> = candidates
        .into_iter()
        .map(|(edge, a, b)| EdgeProjection { edge, projection: project_point_onto_segment(point, a, b) })
        .filter(|h| h.projection.within_segment())
        .collect();
    hits.sort_by(compare_hits);
    hits.truncate(k);
    hits
}

fn compare_hits(x: &EdgeProjection, y: &EdgeProjection) -> Ordering {
    x.projection
        .distance
        .total_cmp(&y.projection.distance)
        .then_with(|| x.edge.cmp(&y.edge))
}

// ── Segment intersection ──────────────────────────────────────────────────────

/// Twice the signed area of triangle `abc`: positive for a counter-clockwise
/// turn, negative for clockwise, zero for collinear points.
#[inline]
pub fn orientation(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

#[inline]
fn sign(v: f64) -> i8 {
    if v > ORIENT_EPS {
        1
    } else if v < -ORIENT_EPS {
        -1
    } else {
        0
    }
}

/// `c` lies within the bounding box of `a`–`b` (used once collinearity with
/// the segment is known).
#[inline]
fn within_bbox(a: Point, b: Point, c: Point) -> bool {
    c.x >= a.x.min(b.x) && c.x <= a.x.max(b.x) && c.y >= a.y.min(b.y) && c.y <= a.y.max(b.y)
}

/// Do segments `p1–p2` and `p3–p4` intersect?
///
/// Bounding-box rejection first, then orientation signs.  Proper crossings
/// and an endpoint touching the other segment count as intersecting.  Two
/// collinear segments never intersect, even when they overlap.
pub fn segments_intersect(p1: Point, p2: Point, p3: Point, p4: Point) -> bool {
    if p1.x.max(p2.x) < p3.x.min(p4.x)
        || p3.x.max(p4.x) < p1.x.min(p2.x)
        || p1.y.max(p2.y) < p3.y.min(p4.y)
        || p3.y.max(p4.y) < p1.y.min(p2.y)
    {
        return false;
    }

    let o1 = sign(orientation(p1, p2, p3));
    let o2 = sign(orientation(p1, p2, p4));
    let o3 = sign(orientation(p3, p4, p1));
    let o4 = sign(orientation(p3, p4, p2));

    if o1 == 0 && o2 == 0 {
        return false;
    }
    if o1 * o2 < 0 && o3 * o4 < 0 {
        return true;
    }

    (o1 == 0 && within_bbox(p1, p2, p3))
        || (o2 == 0 && within_bbox(p1, p2, p4))
        || (o3 == 0 && within_bbox(p3, p4, p1))
        || (o4 == 0 && within_bbox(p3, p4, p2))
}

// ── Circle clipping ───────────────────────────────────────────────────────────

/// Parameters in the open interval `(0, 1)` where segment `a → b` crosses the
/// circle of `radius` around `center`, ascending.
///
/// A segment with both endpoints inside the circle cannot cross it and
/// returns no roots without solving the quadratic.  A tangent (double) root
/// is not a crossing.
pub fn circle_segment_clip(center: Point, radius: f64, a: Point, b: Point) -> Vec<f64> {
    let r_sq = radius * radius;
    if a.distance_sq(center) <= r_sq && b.distance_sq(center) <= r_sq {
        return Vec::new();
    }

    // |A + tV − C|² = R²  →  (V·V)t² + 2(F·V)t + (F·F − R²) = 0,  F = A − C
    let vx = b.x - a.x;
    let vy = b.y - a.y;
    let fx = a.x - center.x;
    let fy = a.y - center.y;

    let qa = vx * vx + vy * vy;
    if qa == 0.0 {
        return Vec::new();
    }
    let qb = 2.0 * (fx * vx + fy * vy);
    let qc = fx * fx + fy * fy - r_sq;

    let disc = qb * qb - 4.0 * qa * qc;
    if disc <= 0.0 {
        return Vec::new();
    }
    let root = disc.sqrt();
    [(-qb - root) / (2.0 * qa), (-qb + root) / (2.0 * qa)]
        .into_iter()
        .filter(|&t| t > 0.0 && t < 1.0)
        .collect()
}

/// How a segment relates to a circular zone.
#[derive(Clone, Debug, PartialEq)]
pub enum CircleCoverage {
    /// The whole segment lies inside the circle.
    Inside,
    /// No part of the segment (beyond isolated boundary points) is inside.
    Outside,
    /// The segment enters and/or leaves the circle at these parameters.
    Partial(Vec<f64>),
}

/// Classify segment `a → b` against the circle.
pub fn classify_circle_segment(center: Point, radius: f64, a: Point, b: Point) -> CircleCoverage {
    let r_sq = radius * radius;
    let a_inside = a.distance_sq(center) <= r_sq;
    let b_inside = b.distance_sq(center) <= r_sq;
    if a_inside && b_inside {
        return CircleCoverage::Inside;
    }

    let roots = circle_segment_clip(center, radius, a, b);
    if !roots.is_empty() {
        return CircleCoverage::Partial(roots);
    }

    // No interior crossing: an endpoint sits exactly on the boundary or the
    // segment misses the circle.  The midpoint decides which.
    if a.midpoint(b).distance_sq(center) <= r_sq {
        CircleCoverage::Inside
    } else {
        CircleCoverage::Outside
    }
}
