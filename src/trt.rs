//! The TBR enumeration table: `trti` (edges in traversal order), `trt`
//! (prefix-sum offsets for the bisection edges that actually produce
//! neighbors) and the per-bisection reconnection-edge lists (`bedges`,
//! computed on demand rather than cached, since every bisection's list is
//! a cheap DFS).

use crate::edge::EdgeData;
use crate::entity::{EdgeId, EntityRef, NodeId, RingId};
use crate::error::{TrError, TrResult};
use crate::pool::Pool;
use crate::ring;
use smallvec::SmallVec;

type Edges = Pool<EdgeId, EdgeData>;

/// Where a reconnection attaches: into the interior of an edge (the
/// common case), or directly to a node when that side of a bisection is a
/// single, edge-less leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconnectPoint {
    /// Subdivide this edge and attach there.
    Edge(EdgeId),
    /// Attach directly to this (single-node) subtree.
    Node(NodeId),
}

impl ReconnectPoint {
    /// The edge to splice into, or `None` for the single-node case.
    pub fn edge(self) -> Option<EdgeId> {
        match self {
            ReconnectPoint::Edge(e) => Some(e),
            ReconnectPoint::Node(_) => None,
        }
    }
}

fn gen_recurse(edges: &Edges, ring: RingId, out: &mut Vec<ReconnectPoint>) {
    let mut siblings: SmallVec<[RingId; 4]> = SmallVec::new();
    ring::for_each_other(edges, ring, |sibling| siblings.push(sibling));
    for sibling in siblings {
        out.push(ReconnectPoint::Edge(sibling.edge()));
        gen_recurse(edges, sibling.other(), out);
    }
}

/// Build the list of reconnection points in the subtree reached from
/// `start_ring`, pretending the edge `start_ring` belongs to has already
/// been bisected away.
///
/// The node at `start_ring` is special-cased per its degree (excluding
/// the bisected edge): a lone leaf contributes a single `Node` entry; a
/// degree-3 node is elided (its two remaining edges are what TBR would
/// merge into one, post-bisection) with only the first kept as an
/// explicit entry so identity-reversal can be detected; degree >= 4 nodes
/// remain relevant and contribute every other edge explicitly.
pub fn bisection_edge_list_gen(edges: &Edges, start_ring: RingId) -> Vec<ReconnectPoint> {
    let node = ring::node_of(edges, start_ring);
    let degree = ring::degree(edges, start_ring);
    let mut out = Vec::new();
    match degree {
        0 => unreachable!("ring arithmetic never yields a detached ring here"),
        1 => out.push(ReconnectPoint::Node(node)),
        2 => unreachable!("tree invariant violated: node of degree 2"),
        3 => {
            let first = ring::next(edges, start_ring);
            out.push(ReconnectPoint::Edge(first.edge()));
            gen_recurse(edges, first.other(), &mut out);
            let second = ring::next(edges, first);
            gen_recurse(edges, second.other(), &mut out);
        }
        _ => {
            let mut siblings: SmallVec<[RingId; 4]> = SmallVec::new();
            ring::for_each_other(edges, start_ring, |sibling| siblings.push(sibling));
            for sibling in siblings {
                out.push(ReconnectPoint::Edge(sibling.edge()));
                gen_recurse(edges, sibling.other(), &mut out);
            }
        }
    }
    out
}

/// The two reconnection-point lists produced by (logically) bisecting
/// `bisect`.
pub struct Bedges {
    /// Reconnection points in the subtree attached to end `0`.
    pub side_a: Vec<ReconnectPoint>,
    /// Reconnection points in the subtree attached to end `1`.
    pub side_b: Vec<ReconnectPoint>,
}

impl Bedges {
    /// Number of distinct TBR neighbors this bisection contributes (all
    /// `(a, b)` pairs except the one that reverses the bisection).
    pub fn nneighbors(&self) -> u32 {
        (self.side_a.len() as u32 * self.side_b.len() as u32).saturating_sub(1)
    }
}

/// Generate [`Bedges`] for bisecting edge `bisect`.
pub fn bedges_gen(edges: &Edges, bisect: EdgeId) -> Bedges {
    Bedges {
        side_a: bisection_edge_list_gen(edges, bisect.ring0()),
        side_b: bisection_edge_list_gen(edges, bisect.ring1()),
    }
}

#[derive(Clone, Copy, Debug)]
struct TrtRow {
    offset: u32,
    bisect_edge: EdgeId,
}

/// The lazily rebuilt TBR enumeration table.
#[derive(Clone)]
pub struct Trt {
    trti: Vec<EdgeId>,
    rows: Vec<TrtRow>,
    total: u32,
    valid: bool,
}

impl Trt {
    /// An empty, invalid table (forces a rebuild on first use).
    pub fn new() -> Self {
        Trt {
            trti: Vec::new(),
            rows: Vec::new(),
            total: 0,
            valid: false,
        }
    }

    /// Mark the table stale; the next call that needs it rebuilds from
    /// scratch.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Whether the table reflects the tree's current topology.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The edges of the tree, in the traversal order the table was built
    /// from.
    pub fn trti(&self) -> &[EdgeId] {
        &self.trti
    }

    /// Total number of distinct TBR neighbors across every bisection.
    pub fn nneighbors(&self) -> u32 {
        self.total
    }

    /// Rebuild `trti` and `trt` from the tree rooted at `base`. No-op if
    /// already valid.
    pub fn rebuild(&mut self, edges: &Edges, nodes: &Pool<NodeId, crate::node::NodeData>, base: NodeId) {
        if self.valid {
            return;
        }
        self.trti.clear();
        self.rows.clear();
        self.total = 0;

        if !base.is_none() {
            let head = nodes[base].ring;
            let mut firsts = Vec::new();
            ring::for_each(edges, head, |r| firsts.push(r));
            for r in firsts {
                self.trti.push(r.edge());
                walk_bisect_edges(edges, r.other(), &mut self.trti);
            }
        }

        let mut offset = 0u32;
        for &e in &self.trti {
            let bedges = bedges_gen(edges, e);
            let n = bedges.nneighbors();
            if n != 0 {
                self.rows.push(TrtRow {
                    offset,
                    bisect_edge: e,
                });
                offset += n;
            }
        }
        self.total = offset;
        self.valid = true;
        log::trace!(
            "trt::rebuild: {} bisection edges, {} total neighbors",
            self.rows.len(),
            self.total
        );
    }

    /// Resolve a global neighbor index into `(bisect, reconnect_a,
    /// reconnect_b)`.
    pub fn neighbor(
        &self,
        edges: &Edges,
        index: u32,
    ) -> TrResult<(EdgeId, ReconnectPoint, ReconnectPoint)> {
        if index >= self.total {
            return Err(TrError::NeighborOutOfRange {
                index,
                nneighbors: self.total,
            });
        }
        let row_idx = self.rows.partition_point(|r| r.offset <= index) - 1;
        let row = self.rows[row_idx];
        let bedges = bedges_gen(edges, row.bisect_edge);

        let mut rem = index - row.offset;
        rem += 1; // skip the identity reconnection
        let a = bedges.side_a[(rem / bedges.side_b.len() as u32) as usize];
        let b = bedges.side_b[(rem % bedges.side_b.len() as u32) as usize];
        Ok((row.bisect_edge, a, b))
    }
}

impl Default for Trt {
    fn default() -> Self {
        Self::new()
    }
}

fn walk_bisect_edges(edges: &Edges, ring: RingId, out: &mut Vec<EdgeId>) {
    let mut siblings: SmallVec<[RingId; 4]> = SmallVec::new();
    ring::for_each_other(edges, ring, |sibling| siblings.push(sibling));
    for sibling in siblings {
        out.push(sibling.edge());
        walk_bisect_edges(edges, sibling.other(), out);
    }
}
