//! Nodes: leaves carry a taxon number, internal nodes join three or more
//! edges.

use crate::entity::RingId;

/// A node in the tree.
///
/// `ring` names one ring element in the node's incidence list; the degree
/// of the node is the length of that list (see [`crate::ring::degree`]).
/// A node with `ring == RingId::NONE` is degree 0: only ever true of a
/// freshly allocated, not-yet-attached node.
#[derive(Clone, Copy, Debug)]
pub struct NodeData {
    /// `taxon_num`: `NONE` for internal nodes, otherwise the caller-chosen
    /// identity of the leaf this node represents.
    pub taxon_num: u32,
    /// Entry point into this node's incidence ring.
    pub ring: RingId,
    /// Opaque caller-owned slot, mirroring the original design's per-node
    /// auxiliary pointer.
    pub aux: u32,
}

impl NodeData {
    /// A fresh internal node, unattached (degree 0).
    pub fn new_internal() -> Self {
        NodeData {
            taxon_num: crate::entity::NONE_INDEX,
            ring: RingId::NONE,
            aux: crate::entity::NONE_INDEX,
        }
    }

    /// A fresh leaf node for the given taxon, unattached (degree 0).
    pub fn new_leaf(taxon_num: u32) -> Self {
        NodeData {
            taxon_num,
            ring: RingId::NONE,
            aux: crate::entity::NONE_INDEX,
        }
    }

    /// Whether this node represents a taxon rather than an internal join.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.taxon_num != crate::entity::NONE_INDEX
    }
}
