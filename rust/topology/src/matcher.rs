// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Segment matching.
//!
//! Pairs every directed primitive edge with the coincident, oppositely
//! directed edge of a neighbouring polygon. Matching runs in two steps:
//!
//! 1. **Splitting.** An edge is cut at every neighbour vertex lying within
//!    tolerance of its interior. After this step a border that two polygons
//!    digitised with different vertex density is made of identical pieces on
//!    both sides, so partial overlaps reduce to exact matches. The cut set is
//!    finite (neighbour vertices only), so splitting always terminates.
//! 2. **Pairing.** For each piece the reversed pieces of neighbour polygons
//!    are ranked by summed endpoint distance, then by polygon id. Pieces are
//!    claimed in input order; each piece is consumed exactly once, either as
//!    half of a shared border or as an exterior border.
//!
//! Splitting and ranking only read the arena and the indices and run on the
//! rayon pool. Claiming is a single ordered pass so repeated builds pair
//! identically.

use rayon::prelude::*;
use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::arena::VertexArena;
use crate::decompose::{DecomposedRing, PrimitiveEdge};
use crate::error::Warning;
use crate::feature::{PolygonFeature, RingRole};
use crate::geometry::{lerp, point, project_onto_segment, Bounds};
use crate::index::CandidateIndex;
use crate::keys::{Face, PolygonId, VertexKey};

/// A primitive edge, or one piece of it after splitting.
#[derive(Debug, Clone, PartialEq)]
pub struct SubEdge {
    pub polygon: usize,
    pub ring: usize,
    pub role: RingRole,
    pub origin: VertexKey,
    pub dest: VertexKey,
    /// Source position of `origin`; for cut points, the projection onto the
    /// source segment.
    pub origin_at: [f64; 2],
    pub dest_at: [f64; 2],
}

impl From<&PrimitiveEdge> for SubEdge {
    fn from(e: &PrimitiveEdge) -> Self {
        Self {
            polygon: e.polygon,
            ring: e.ring,
            role: e.role,
            origin: e.origin,
            dest: e.dest,
            origin_at: e.origin_at,
            dest_at: e.dest_at,
        }
    }
}

/// How the two sides of a candidate edge were determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pairing {
    /// No neighbour matched; the right side is the exterior.
    Exterior,
    /// Two polygons share the segment.
    Shared,
    /// A hole ring was matched by another polygon's exterior ring. The edge
    /// runs along the hole, so `left` is the polygon with the hole.
    HoleFill,
}

/// One canonical edge candidate emitted by the matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeCandidate {
    pub origin: VertexKey,
    pub dest: VertexKey,
    pub left: Face,
    pub right: Face,
    pub pairing: Pairing,
    /// Feature whose ring the candidate follows.
    pub polygon: usize,
}

/// Everything the matcher produced for one build.
#[derive(Debug, Default)]
pub struct MatchOutcome {
    pub candidates: Vec<EdgeCandidate>,
    pub warnings: Vec<Warning>,
    pub primitive_edges: usize,
    pub sub_edges: usize,
    pub shared: usize,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    edge: usize,
    distance: f64,
}

/// Matches the decomposed rings of `features` against each other.
///
/// `rings` must come from [`decompose`](crate::decompose::decompose) over the
/// same `features` and `arena`; `index` must cover every feature.
pub fn match_segments(
    features: &[PolygonFeature],
    rings: &[DecomposedRing],
    arena: &VertexArena,
    index: &CandidateIndex,
    tolerance: f64,
) -> MatchOutcome {
    let matcher = SegmentMatcher::new(features, rings, arena, index, tolerance);
    let pieces = matcher.split_edges();
    matcher.pair(pieces)
}

struct SegmentMatcher<'a> {
    features: &'a [PolygonFeature],
    rings: &'a [DecomposedRing],
    arena: &'a VertexArena,
    index: &'a CandidateIndex,
    tolerance: f64,
    vertices: RTree<GeomWithData<[f64; 2], VertexKey>>,
    owners: FxHashMap<VertexKey, SmallVec<[usize; 4]>>,
}

impl<'a> SegmentMatcher<'a> {
    fn new(
        features: &'a [PolygonFeature],
        rings: &'a [DecomposedRing],
        arena: &'a VertexArena,
        index: &'a CandidateIndex,
        tolerance: f64,
    ) -> Self {
        let mut owners: FxHashMap<VertexKey, SmallVec<[usize; 4]>> = FxHashMap::default();
        for ring in rings {
            for key in ring.vertices() {
                let list = owners.entry(key).or_default();
                if !list.contains(&ring.polygon) {
                    list.push(ring.polygon);
                }
            }
        }

        let vertices = RTree::bulk_load(
            arena
                .iter()
                .map(|(key, v)| GeomWithData::new([v.x, v.y], key))
                .collect(),
        );

        Self {
            features,
            rings,
            arena,
            index,
            tolerance,
            vertices,
            owners,
        }
    }

    fn split_edges(&self) -> Vec<SubEdge> {
        let edges: Vec<&PrimitiveEdge> = self.rings.iter().flat_map(|r| r.edges.iter()).collect();
        let pieces: Vec<Vec<SubEdge>> = edges.par_iter().map(|e| self.split(e)).collect();
        pieces.into_iter().flatten().collect()
    }

    /// Cuts `edge` at every vertex of a neighbour polygon that lies within
    /// tolerance of its interior.
    fn split(&self, edge: &PrimitiveEdge) -> Vec<SubEdge> {
        let a = self.arena.position(edge.origin);
        let b = self.arena.position(edge.dest);
        let search = Bounds::of_segment(a, b).expand(self.tolerance);

        let neighbours: Vec<usize> = self
            .index
            .query_overlapping(&search)
            .into_iter()
            .filter(|&p| p != edge.polygon)
            .collect();
        if neighbours.is_empty() {
            return vec![SubEdge::from(edge)];
        }

        let mut cuts: Vec<(f64, VertexKey)> = Vec::new();
        for v in self
            .vertices
            .locate_in_envelope_intersecting(&AABB::from_corners(search.min, search.max))
        {
            let key = v.data;
            if key == edge.origin || key == edge.dest {
                continue;
            }
            let on_neighbour = self
                .owners
                .get(&key)
                .map_or(false, |owners| {
                    owners.iter().any(|p| neighbours.binary_search(p).is_ok())
                });
            if !on_neighbour {
                continue;
            }
            // Any ε-near vertex that did not snap to an end cuts the edge,
            // however close to that end it projects.
            let (t, dist) = project_onto_segment(point(*v.geom()), a, b);
            if dist <= self.tolerance && t > 0.0 && t < 1.0 {
                cuts.push((t, key));
            }
        }

        if cuts.is_empty() {
            return vec![SubEdge::from(edge)];
        }
        cuts.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));
        cuts.dedup_by_key(|c| c.1);

        let source_a = point(edge.origin_at);
        let source_b = point(edge.dest_at);
        let mut pieces = Vec::with_capacity(cuts.len() + 1);
        let mut from = (edge.origin, edge.origin_at);
        for (t, key) in cuts {
            let at = lerp(source_a, source_b, t);
            let at = [at.x, at.y];
            pieces.push(SubEdge {
                origin: from.0,
                origin_at: from.1,
                dest: key,
                dest_at: at,
                ..SubEdge::from(edge)
            });
            from = (key, at);
        }
        pieces.push(SubEdge {
            origin: from.0,
            origin_at: from.1,
            ..SubEdge::from(edge)
        });
        pieces
    }

    fn pair(&self, pieces: Vec<SubEdge>) -> MatchOutcome {
        let mut directed: FxHashMap<(VertexKey, VertexKey), SmallVec<[usize; 2]>> =
            FxHashMap::default();
        for (i, piece) in pieces.iter().enumerate() {
            directed
                .entry((piece.origin, piece.dest))
                .or_default()
                .push(i);
        }

        let ranked: Vec<Vec<Candidate>> = (0..pieces.len())
            .into_par_iter()
            .map(|i| self.rank(i, &pieces, &directed))
            .collect();

        let mut outcome = MatchOutcome {
            primitive_edges: self.rings.iter().map(|r| r.edges.len()).sum(),
            sub_edges: pieces.len(),
            ..MatchOutcome::default()
        };

        let mut claimed = vec![false; pieces.len()];
        for i in 0..pieces.len() {
            if claimed[i] {
                continue;
            }
            claimed[i] = true;
            let edge = &pieces[i];

            let open: Vec<Candidate> = ranked[i]
                .iter()
                .copied()
                .filter(|c| !claimed[c.edge])
                .collect();

            let Some(best) = open.first().copied() else {
                outcome.candidates.push(EdgeCandidate {
                    origin: edge.origin,
                    dest: edge.dest,
                    left: self.face(edge.polygon),
                    right: Face::Exterior,
                    pairing: Pairing::Exterior,
                    polygon: edge.polygon,
                });
                continue;
            };
            claimed[best.edge] = true;

            let tied: Vec<PolygonId> = open
                .iter()
                .take_while(|c| c.distance == best.distance)
                .map(|c| self.id(pieces[c.edge].polygon).clone())
                .collect();
            if tied.len() > 1 {
                let warning = Warning::TopologyAmbiguity {
                    polygon: self.id(edge.polygon).clone(),
                    segment: [
                        self.arena.vertex_coords(edge.origin).unwrap_or(edge.origin_at),
                        self.arena.vertex_coords(edge.dest).unwrap_or(edge.dest_at),
                    ],
                    chosen: self.id(pieces[best.edge].polygon).clone(),
                    tied,
                };
                warn!(%warning, "topology ambiguity");
                outcome.warnings.push(warning);
            }

            let other = &pieces[best.edge];
            let (from, to) = if edge.role == RingRole::Exterior && other.role == RingRole::Hole {
                (other, edge)
            } else {
                (edge, other)
            };
            let pairing = if from.role == RingRole::Hole && to.role == RingRole::Exterior {
                Pairing::HoleFill
            } else {
                Pairing::Shared
            };
            outcome.shared += 1;
            outcome.candidates.push(EdgeCandidate {
                origin: from.origin,
                dest: from.dest,
                left: self.face(from.polygon),
                right: self.face(to.polygon),
                pairing,
                polygon: from.polygon,
            });
        }

        debug!(
            primitive_edges = outcome.primitive_edges,
            sub_edges = outcome.sub_edges,
            shared = outcome.shared,
            exterior = outcome.candidates.len() - outcome.shared,
            "segments matched"
        );
        outcome
    }

    /// Reversed pieces of neighbour polygons that coincide with piece `i`,
    /// best first.
    fn rank(
        &self,
        i: usize,
        pieces: &[SubEdge],
        directed: &FxHashMap<(VertexKey, VertexKey), SmallVec<[usize; 2]>>,
    ) -> Vec<Candidate> {
        let edge = &pieces[i];
        let Some(reversed) = directed.get(&(edge.dest, edge.origin)) else {
            return Vec::new();
        };

        let search = Bounds::of_segment(
            self.arena.position(edge.origin),
            self.arena.position(edge.dest),
        )
        .expand(self.tolerance);
        let neighbours = self.index.query_overlapping(&search);

        let mut ranked: Vec<Candidate> = reversed
            .iter()
            .copied()
            .filter(|&j| {
                let other = &pieces[j];
                other.polygon != edge.polygon && neighbours.binary_search(&other.polygon).is_ok()
            })
            .map(|j| Candidate {
                edge: j,
                distance: endpoint_distance(edge, &pieces[j]),
            })
            .collect();

        ranked.sort_by(|x, y| {
            x.distance
                .total_cmp(&y.distance)
                .then_with(|| {
                    self.id(pieces[x.edge].polygon)
                        .cmp(self.id(pieces[y.edge].polygon))
                })
                .then(x.edge.cmp(&y.edge))
        });
        ranked
    }

    fn id(&self, polygon: usize) -> &PolygonId {
        &self.features[polygon].id
    }

    fn face(&self, polygon: usize) -> Face {
        Face::Polygon(self.id(polygon).clone())
    }
}

/// Summed distance between the ends of `edge` and the opposite ends of the
/// reversed piece `other`, measured on source coordinates.
fn endpoint_distance(edge: &SubEdge, other: &SubEdge) -> f64 {
    let d = |p: [f64; 2], q: [f64; 2]| (p[0] - q[0]).hypot(p[1] - q[1]);
    d(edge.origin_at, other.dest_at) + d(edge.dest_at, other.origin_at)
}
