//! The tree itself: arenas for nodes and edges, plus the lazily
//! recomputed bookkeeping (`ntaxa`, `nedges`, the TBR enumeration table)
//! that structural mutation invalidates.

use crate::edge::EdgeData;
use crate::entity::{EdgeId, EntityRef, NodeId, RingId};
use crate::error::TrResult;
use crate::mp::Mp;
use crate::node::NodeData;
use crate::pool::Pool;
use crate::ring;
use crate::tbr;
use crate::tbr_mp::Held;
use crate::trt::Trt;
use smallvec::SmallVec;

/// An unrooted, multifurcating phylogenetic tree.
///
/// Structural mutation (attaching/detaching edges, splicing nodes during
/// a [`crate::tbr`] step) only ever sets [`Tree::modified`]; derived state
/// - taxon/edge counts, the TBR enumeration table, held-neighbor results -
/// is recomputed lazily, the next time something asks for it, by
/// [`Tree::update`].
pub struct Tree {
    nodes: Pool<NodeId, NodeData>,
    edges: Pool<EdgeId, EdgeData>,
    base: NodeId,
    ntaxa: u32,
    nedges: u32,
    modified: bool,
    trt: Trt,
    held: Vec<Held>,
}

impl Tree {
    /// An empty tree: no nodes, no edges, no base.
    pub fn new() -> Self {
        Tree {
            nodes: Pool::new(),
            edges: Pool::new(),
            base: NodeId::NONE,
            ntaxa: 0,
            nedges: 0,
            modified: false,
            trt: Trt::new(),
            held: Vec::new(),
        }
    }

    /// Deep-copy this tree's arenas and bookkeeping. Mutating the copy
    /// (e.g. to speculatively apply a TBR step) never touches `self`.
    pub fn dup(&self) -> Self {
        Tree {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            base: self.base,
            ntaxa: self.ntaxa,
            nedges: self.nedges,
            modified: self.modified,
            trt: self.trt.clone(),
            held: self.held.clone(),
        }
    }

    // -- node arena -------------------------------------------------------

    /// Allocate a fresh internal node, unattached.
    pub fn node_new_internal(&mut self) -> NodeId {
        self.nodes.alloc(NodeData::new_internal()).expect("node arena exhausted")
    }

    /// Allocate a fresh leaf node for `taxon_num`, unattached.
    pub fn node_new_leaf(&mut self, taxon_num: u32) -> NodeId {
        self.nodes
            .alloc(NodeData::new_leaf(taxon_num))
            .expect("node arena exhausted")
    }

    /// Free a node. The node must be degree 0 (fully detached).
    pub fn node_delete(&mut self, n: NodeId) {
        assert_eq!(
            self.nodes[n].ring,
            RingId::NONE,
            "node_delete called on a node that still has attached edges"
        );
        self.nodes.free(n);
        self.modified = true;
    }

    /// The node's current degree (number of attached edges).
    pub fn node_degree(&self, n: NodeId) -> u32 {
        ring::degree(&self.edges, self.nodes[n].ring)
    }

    /// `taxon_num` for `n`, or `crate::TAXON_NONE` if internal.
    pub fn node_taxon(&self, n: NodeId) -> u32 {
        self.nodes[n].taxon_num
    }

    /// Opaque per-node auxiliary slot.
    pub fn node_aux_get(&self, n: NodeId) -> u32 {
        self.nodes[n].aux
    }

    /// Set the opaque per-node auxiliary slot.
    pub fn node_aux_set(&mut self, n: NodeId, aux: u32) {
        self.nodes[n].aux = aux;
    }

    /// Visit every ring element around `n`'s incidence list.
    pub fn node_rings(&self, n: NodeId, visit: impl FnMut(RingId)) {
        ring::for_each(&self.edges, self.nodes[n].ring, visit);
    }

    // -- edge arena -------------------------------------------------------

    /// Allocate a fresh edge with both ends detached.
    pub fn edge_new(&mut self) -> EdgeId {
        let placeholder = EdgeData::new(EdgeId::from_u32(0));
        let id = self.edges.alloc(placeholder).expect("edge arena exhausted");
        self.edges[id] = EdgeData::new(id);
        self.modified = true;
        id
    }

    /// Free an edge. Both ends must be detached.
    pub fn edge_delete(&mut self, e: EdgeId) {
        assert_eq!(self.edges[e].end(0).node, NodeId::NONE);
        assert_eq!(self.edges[e].end(1).node, NodeId::NONE);
        self.edges.free(e);
        self.modified = true;
    }

    /// Attach end `end` of edge `e` to `node`, threading it into `node`'s
    /// incidence ring. The end must currently be detached.
    pub fn edge_attach(&mut self, e: EdgeId, end: u8, node: NodeId) {
        let r = e.ring(end);
        debug_assert_eq!(self.edges[e].end(end).node, NodeId::NONE);
        let head = self.nodes[node].ring;
        if head.is_none() {
            ring::make_singleton(&mut self.edges, r, node);
            self.nodes[node].ring = r;
        } else {
            ring::insert_after(&mut self.edges, head, r, node);
        }
        self.modified = true;
    }

    /// Detach end `end` of edge `e` from whatever node it was attached to.
    pub fn edge_detach(&mut self, e: EdgeId, end: u8) {
        let r = e.ring(end);
        let node = self.edges[e].end(end).node;
        debug_assert!(!node.is_none(), "edge_detach on an already-detached end");
        let survivor = ring::remove(&mut self.edges, r);
        if self.nodes[node].ring == r {
            self.nodes[node].ring = survivor;
        }
        self.modified = true;
    }

    /// The node attached to ring element `r`, or `NodeId::NONE` if
    /// detached.
    pub fn ring_node(&self, r: RingId) -> NodeId {
        ring::node_of(&self.edges, r)
    }

    /// Branch length of `e`.
    pub fn edge_length(&self, e: EdgeId) -> f64 {
        self.edges[e].length
    }

    /// Set the branch length of `e`.
    pub fn edge_length_set(&mut self, e: EdgeId, length: f64) {
        self.edges[e].length = length;
    }

    /// Opaque per-edge auxiliary slot.
    pub fn edge_aux_get(&self, e: EdgeId) -> u32 {
        self.edges[e].aux
    }

    /// Set the opaque per-edge auxiliary slot.
    pub fn edge_aux_set(&mut self, e: EdgeId, aux: u32) {
        self.edges[e].aux = aux;
    }

    /// Borrow the edge arena, for modules that need raw ring access
    /// (`ps`, `tbr`, `canon`, `trt`).
    pub(crate) fn edges(&self) -> &Pool<EdgeId, EdgeData> {
        &self.edges
    }

    pub(crate) fn edges_mut(&mut self) -> &mut Pool<EdgeId, EdgeData> {
        &mut self.edges
    }

    pub(crate) fn nodes(&self) -> &Pool<NodeId, NodeData> {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut Pool<NodeId, NodeData> {
        &mut self.nodes
    }

    pub(crate) fn held_mut(&mut self) -> &mut Vec<Held> {
        &mut self.held
    }

    /// Results from the most recent `tbr_*_neighbors_mp` call.
    pub fn held(&self) -> &[Held] {
        &self.held
    }

    pub(crate) fn trt(&self) -> &Trt {
        &self.trt
    }

    pub(crate) fn trt_mut(&mut self) -> &mut Trt {
        &mut self.trt
    }

    pub(crate) fn mark_modified(&mut self) {
        self.modified = true;
    }

    // -- base / whole-tree bookkeeping ------------------------------------

    /// The node currently used as the root of traversal/canonicalization.
    /// Purely a traversal anchor; the tree itself is unrooted.
    pub fn base_get(&self) -> NodeId {
        self.base
    }

    /// Set the traversal anchor.
    pub fn base_set(&mut self, base: NodeId) {
        self.base = base;
    }

    /// Number of taxa (leaf nodes) in the tree.
    pub fn ntaxa(&mut self) -> u32 {
        self.update();
        self.ntaxa
    }

    /// Number of edges in the tree.
    pub fn nedges(&mut self) -> u32 {
        self.update();
        self.nedges
    }

    /// Recompute `ntaxa`/`nedges` and invalidate the TBR table if the tree
    /// has been structurally modified since the last call. Idempotent and
    /// cheap when nothing changed.
    pub fn update(&mut self) {
        if !self.modified {
            return;
        }
        let mut ntaxa = 0u32;
        let mut nedges = 0u32;
        if !self.base.is_none() {
            self.walk_count(self.base, RingId::NONE, &mut ntaxa, &mut nedges);
        }
        self.ntaxa = ntaxa;
        self.nedges = nedges;
        self.trt.invalidate();
        self.modified = false;
        log::trace!("tree::update: ntaxa={} nedges={}", ntaxa, nedges);
    }

    /// Make sure the TBR enumeration table reflects the current topology,
    /// rebuilding it if stale.
    pub(crate) fn ensure_trt(&mut self) {
        self.update();
        if !self.trt.is_valid() {
            let base = self.base;
            self.trt.rebuild(&self.edges, &self.nodes, base);
        }
    }

    /// Total number of distinct TBR neighbors reachable by bisecting any
    /// edge of the tree and reconnecting anywhere but the identity.
    pub fn tbr_nneighbors(&mut self) -> u32 {
        self.ensure_trt();
        self.trt.nneighbors()
    }

    /// Resolve a global TBR neighbor index into the `(bisect, reconnect_a,
    /// reconnect_b)` triple that [`crate::tbr::tbr`] (or
    /// [`Tree::apply_tbr_neighbor`]) expects.
    pub fn tbr_neighbor(
        &mut self,
        index: u32,
    ) -> TrResult<(EdgeId, crate::trt::ReconnectPoint, crate::trt::ReconnectPoint)> {
        self.ensure_trt();
        self.trt.neighbor(&self.edges, index)
    }

    /// Apply the TBR neighbor at global index `index` (as enumerated by
    /// the lazily rebuilt TBR table), mutating this tree in place. Pass
    /// `mp` when a parsimony scorer's character views need to stay
    /// consistent with the new topology.
    pub fn apply_tbr_neighbor(&mut self, mp: Option<&mut Mp>, index: u32) -> TrResult<()> {
        self.ensure_trt();
        let (bisect, reconnect_a, reconnect_b) = self.trt.neighbor(&self.edges, index)?;
        tbr::tbr(self, mp, bisect, reconnect_a, reconnect_b);
        Ok(())
    }

    fn walk_count(&self, node: NodeId, from: RingId, ntaxa: &mut u32, nedges: &mut u32) {
        if self.nodes[node].is_leaf() {
            *ntaxa += 1;
        }
        let mut to_visit: SmallVec<[RingId; 4]> = SmallVec::new();
        ring::for_each(&self.edges, self.nodes[node].ring, |r| {
            if r != from {
                to_visit.push(r);
            }
        });
        for r in to_visit {
            *nedges += 1;
            let other_ring = r.other();
            let other_node = ring::node_of(&self.edges, other_ring);
            self.walk_count(other_node, other_ring, ntaxa, nedges);
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
