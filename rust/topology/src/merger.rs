// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topology merging.
//!
//! Turns the matcher's candidate stream into canonical edges:
//!
//! - candidates occupying a segment already accepted are dropped and counted,
//! - a candidate with the same face on both sides is either tagged as a
//!   hole-in-parent border or rejected with [`Error::SelfAdjacency`],
//! - with `merge_collinear` set, runs of segments meeting at degree-2
//!   vertices in a straight line with the same faces become one polyline.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::arena::VertexArena;
use crate::config::MeshConfig;
use crate::error::{Error, Result};
use crate::geometry::is_collinear;
use crate::keys::{Face, VertexKey};
use crate::matcher::{EdgeCandidate, Pairing};

/// A canonical edge before vertex ids are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedEdge {
    /// Vertex chain, at least two entries.
    pub vertices: Vec<VertexKey>,
    pub left: Face,
    pub right: Face,
    /// The same polygon lies on both sides: one of its parts fills a hole
    /// of another.
    pub hole_in_parent: bool,
    /// Feature whose ring first emitted the edge.
    pub polygon: usize,
}

#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub edges: Vec<MergedEdge>,
    /// Candidates dropped because their segment was already accepted.
    pub ignored_duplicates: usize,
}

#[derive(Debug, Clone)]
struct Segment {
    origin: VertexKey,
    dest: VertexKey,
    left: Face,
    right: Face,
    hole_in_parent: bool,
    polygon: usize,
}

impl Segment {
    fn reversed(&self) -> Self {
        Self {
            origin: self.dest,
            dest: self.origin,
            left: self.right.clone(),
            right: self.left.clone(),
            ..self.clone()
        }
    }

    /// This segment oriented so that it ends at `v`.
    fn ending_at(&self, v: VertexKey) -> Self {
        if self.dest == v {
            self.clone()
        } else {
            self.reversed()
        }
    }

    /// This segment oriented so that it starts at `v`.
    fn starting_at(&self, v: VertexKey) -> Self {
        if self.origin == v {
            self.clone()
        } else {
            self.reversed()
        }
    }

    fn same_faces(&self, other: &Segment) -> bool {
        self.left == other.left
            && self.right == other.right
            && self.hole_in_parent == other.hole_in_parent
    }
}

/// Merges matcher candidates into canonical edges.
pub fn merge_topology(
    candidates: Vec<EdgeCandidate>,
    arena: &VertexArena,
    config: &MeshConfig,
) -> Result<MergeOutcome> {
    let total = candidates.len();
    let mut seen: FxHashSet<(VertexKey, VertexKey)> = FxHashSet::default();
    let mut segments = Vec::with_capacity(total);
    let mut ignored_duplicates = 0;

    for c in candidates {
        let key = if c.origin <= c.dest {
            (c.origin, c.dest)
        } else {
            (c.dest, c.origin)
        };
        if !seen.insert(key) {
            trace!(left = %c.left, right = %c.right, "duplicate edge ignored");
            ignored_duplicates += 1;
            continue;
        }

        let mut hole_in_parent = false;
        if c.left == c.right {
            match (c.pairing, c.left.polygon()) {
                (Pairing::HoleFill, Some(_)) => hole_in_parent = true,
                (_, polygon) => {
                    let at = |k: VertexKey| arena.vertex_coords(k).unwrap_or([f64::NAN; 2]);
                    return Err(Error::SelfAdjacency {
                        polygon: polygon.cloned().unwrap_or_else(|| "<exterior>".into()),
                        at: [at(c.origin), at(c.dest)],
                    });
                }
            }
        }

        segments.push(Segment {
            origin: c.origin,
            dest: c.dest,
            left: c.left,
            right: c.right,
            hole_in_parent,
            polygon: c.polygon,
        });
    }

    let edges = if config.merge_collinear {
        ChainMerger::new(&segments, arena, config.tolerance).run()
    } else {
        segments
            .into_iter()
            .map(|s| MergedEdge {
                vertices: vec![s.origin, s.dest],
                left: s.left,
                right: s.right,
                hole_in_parent: s.hole_in_parent,
                polygon: s.polygon,
            })
            .collect()
    };

    debug!(
        candidates = total,
        duplicates = ignored_duplicates,
        edges = edges.len(),
        merge_collinear = config.merge_collinear,
        "topology merged"
    );

    Ok(MergeOutcome {
        edges,
        ignored_duplicates,
    })
}

struct ChainMerger<'a> {
    segments: &'a [Segment],
    arena: &'a VertexArena,
    tolerance: f64,
    incident: FxHashMap<VertexKey, SmallVec<[usize; 4]>>,
}

impl<'a> ChainMerger<'a> {
    fn new(segments: &'a [Segment], arena: &'a VertexArena, tolerance: f64) -> Self {
        let mut incident: FxHashMap<VertexKey, SmallVec<[usize; 4]>> = FxHashMap::default();
        for (i, s) in segments.iter().enumerate() {
            incident.entry(s.origin).or_default().push(i);
            incident.entry(s.dest).or_default().push(i);
        }
        Self {
            segments,
            arena,
            tolerance,
            incident,
        }
    }

    fn run(&self) -> Vec<MergedEdge> {
        let mut visited = vec![false; self.segments.len()];
        let mut edges = Vec::new();

        for i in 0..self.segments.len() {
            if visited[i] {
                continue;
            }

            // Walk back to the start of the run, keeping i's orientation.
            let mut start = (i, self.segments[i].clone());
            while let Some((j, prev)) = self.other_at(start.0, start.1.origin) {
                let prev = prev.ending_at(start.1.origin);
                if j == i || visited[j] || !self.joinable(&prev, &start.1) {
                    break;
                }
                start = (j, prev);
            }

            visited[start.0] = true;
            let mut vertices = vec![start.1.origin, start.1.dest];
            let mut current = start.clone();
            while let Some((j, next)) = self.other_at(current.0, current.1.dest) {
                let next = next.starting_at(current.1.dest);
                if visited[j] || !self.joinable(&current.1, &next) {
                    break;
                }
                visited[j] = true;
                vertices.push(next.dest);
                current = (j, next);
            }

            let head = &start.1;
            edges.push(MergedEdge {
                vertices,
                left: head.left.clone(),
                right: head.right.clone(),
                hole_in_parent: head.hole_in_parent,
                polygon: self.segments[i].polygon,
            });
        }

        edges
    }

    /// The other segment at `v` when `v` has exactly two incident segments.
    fn other_at(&self, current: usize, v: VertexKey) -> Option<(usize, &Segment)> {
        let at = self.incident.get(&v)?;
        if at.len() != 2 {
            return None;
        }
        let j = if at[0] == current { at[1] } else { at[0] };
        Some((j, &self.segments[j]))
    }

    /// `a` ends where `b` starts; both continue in a straight line with the
    /// same faces.
    fn joinable(&self, a: &Segment, b: &Segment) -> bool {
        a.same_faces(b)
            && is_collinear(
                self.arena.position(a.origin),
                self.arena.position(a.dest),
                self.arena.position(b.dest),
                self.tolerance,
            )
    }
}
