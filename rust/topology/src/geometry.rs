// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar geometry primitives used by the builder.
//!
//! Bounding boxes, signed ring area, point-to-segment projection and
//! collinearity under a distance tolerance. Everything is plain 2D with
//! double precision; no projection handling.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Bounds {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Self { min, max }
    }

    /// Bounds of a coordinate list, or `None` if it is empty.
    pub fn from_coords(coords: &[[f64; 2]]) -> Option<Self> {
        let (first, rest) = coords.split_first()?;
        let mut bounds = Self::new(*first, *first);
        for c in rest {
            bounds.include(*c);
        }
        Some(bounds)
    }

    /// Bounds of the segment `a`-`b`.
    pub fn of_segment(a: Point2<f64>, b: Point2<f64>) -> Self {
        Self {
            min: [a.x.min(b.x), a.y.min(b.y)],
            max: [a.x.max(b.x), a.y.max(b.y)],
        }
    }

    pub fn include(&mut self, c: [f64; 2]) {
        self.min[0] = self.min[0].min(c[0]);
        self.min[1] = self.min[1].min(c[1]);
        self.max[0] = self.max[0].max(c[0]);
        self.max[1] = self.max[1].max(c[1]);
    }

    /// Grows the box by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            min: [self.min[0] - margin, self.min[1] - margin],
            max: [self.max[0] + margin, self.max[1] + margin],
        }
    }

    pub fn union(&self, other: &Bounds) -> Self {
        Self {
            min: [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            max: [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        }
    }

    /// Closed-interval overlap test: touching boxes intersect.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min[0] <= other.max[0]
            && other.min[0] <= self.max[0]
            && self.min[1] <= other.max[1]
            && other.min[1] <= self.max[1]
    }
}

pub fn point(c: [f64; 2]) -> Point2<f64> {
    Point2::new(c[0], c[1])
}

/// Shoelace area of a ring. Positive for counter-clockwise rings.
///
/// Accepts closed (first = last) and open rings alike: the closing pair of
/// a closed ring contributes nothing.
pub fn signed_area(ring: &[[f64; 2]]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..n {
        let p = ring[i];
        let q = ring[(i + 1) % n];
        twice += p[0] * q[1] - q[0] * p[1];
    }
    twice / 2.0
}

/// Projects `p` onto segment `a`-`b`.
///
/// Returns the clamped segment parameter `t` in `[0, 1]` and the distance
/// from `p` to the projected point.
pub fn project_onto_segment(p: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> (f64, f64) {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return (0.0, (p - a).norm());
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    let foot = a + ab * t;
    (t, (p - foot).norm())
}

/// Point at parameter `t` along `a`-`b`.
pub fn lerp(a: Point2<f64>, b: Point2<f64>, t: f64) -> Point2<f64> {
    a + (b - a) * t
}

pub fn polyline_length(points: &[Point2<f64>]) -> f64 {
    points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
}

/// Point halfway along a polyline, measured by length.
pub fn polyline_midpoint(points: &[Point2<f64>]) -> Option<Point2<f64>> {
    let first = *points.first()?;
    let half = polyline_length(points) / 2.0;
    let mut walked = 0.0;
    for w in points.windows(2) {
        let len = (w[1] - w[0]).norm();
        if len > 0.0 && walked + len >= half {
            return Some(lerp(w[0], w[1], (half - walked) / len));
        }
        walked += len;
    }
    Some(first)
}

/// `true` if `v` lies within `tolerance` of the segment `a`-`b` and strictly
/// between its ends, so `a`-`v`-`b` reads as one straight run.
pub fn is_collinear(a: Point2<f64>, v: Point2<f64>, b: Point2<f64>, tolerance: f64) -> bool {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return false;
    }
    let t = (v - a).dot(&ab) / len_sq;
    if t <= 0.0 || t >= 1.0 {
        return false;
    }
    let (_, dist) = project_onto_segment(v, a, b);
    dist <= tolerance
}

/// Length of `a`-`b` covered by `c`-`d` when both ends of `c`-`d` lie within
/// `tolerance` of the line through `a`-`b`; zero otherwise.
pub fn collinear_overlap(
    a: Point2<f64>,
    b: Point2<f64>,
    c: Point2<f64>,
    d: Point2<f64>,
    tolerance: f64,
) -> f64 {
    let ab = b - a;
    let len = ab.norm();
    if len == 0.0 {
        return 0.0;
    }
    let dir = ab / len;
    let place = |p: Point2<f64>| {
        let ap = p - a;
        (ap.dot(&dir), (ap.x * dir.y - ap.y * dir.x).abs())
    };
    let (tc, hc) = place(c);
    let (td, hd) = place(d);
    if hc > tolerance || hd > tolerance {
        return 0.0;
    }
    let lo = tc.min(td).max(0.0);
    let hi = tc.max(td).min(len);
    (hi - lo).max(0.0)
}
