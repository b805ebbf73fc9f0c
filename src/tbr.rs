//! Tree Bisection and Reconnection.
//!
//! Detach the bisection edge, reduce each resulting subtree's attachment
//! point to a single node (extracting a now-degree-2 node, or noting a
//! bare lone leaf), splice a node into the middle of each reconnection
//! edge as needed, then reattach the bisection edge between the two
//! attachment points.
//!
//! Ring elements stay tied to the same edge for their entire life (see
//! [`crate::entity::RingId`]), so when a node is extracted or spliced in,
//! whichever external bookkeeping is keyed by ring index - here, a
//! [`Mp`]'s per-ring character views - has to be carried along by hand;
//! `mp` is threaded through every step for exactly that reason, and can
//! be `None` when the caller only cares about topology.

use crate::entity::{EdgeId, EntityRef, NodeId, RingId};
use crate::mp::Mp;
use crate::trt::ReconnectPoint;
use crate::tree::Tree;
use smallvec::SmallVec;

struct Spares {
    edges: Vec<EdgeId>,
    nodes: Vec<NodeId>,
}

impl Spares {
    fn new() -> Self {
        Spares {
            edges: Vec::new(),
            nodes: Vec::new(),
        }
    }
}

/// Reduce `node` to nothing if it would otherwise be left with degree 2
/// (a degree-2 node can't persist in a valid tree), preserving whichever
/// of its two remaining edges is a reconnection point so the caller can
/// still splice into it. Returns `Some(node)` if `node` had degree 0 -
/// i.e. it was the only node left in its subtree and must be reattached
/// directly.
fn node_extract(
    tree: &mut Tree,
    mut mp: Option<&mut Mp>,
    node: NodeId,
    reconnect_a: Option<EdgeId>,
    reconnect_b: Option<EdgeId>,
    spares: &mut Spares,
) -> Option<NodeId> {
    match tree.node_degree(node) {
        0 => Some(node),
        1 => unreachable!("degree-2 internal node mid-TBR: tree invariant violated"),
        2 => {
            let mut rings: SmallVec<[RingId; 4]> = SmallVec::new();
            tree.node_rings(node, |r| rings.push(r));
            let ring_a = rings[0];
            let ring_b = rings[1];
            let edge_a = ring_a.edge();
            let edge_b = ring_b.edge();
            let ring_a_other = ring_a.other();
            let ring_b_other = ring_b.other();
            let node_a = tree.ring_node(ring_a_other);
            let node_b = tree.ring_node(ring_b_other);

            tree.edge_detach(edge_a, 0);
            tree.edge_detach(edge_a, 1);
            tree.edge_detach(edge_b, 0);
            tree.edge_detach(edge_b, 1);
            spares.nodes.push(node);

            if Some(edge_b) != reconnect_a && Some(edge_b) != reconnect_b {
                // Splice node_a/node_b back together with edge_a; edge_b
                // becomes a spare. ring_a_other already carries node_a's
                // view, so it stays put; ring_a takes over node_b's side,
                // inheriting ring_b_other's view.
                if let Some(m) = mp.as_deref_mut() {
                    m.swap_ring_ps(ring_a, ring_b_other);
                }
                tree.edge_attach(edge_a, ring_a_other.end(), node_a);
                tree.edge_attach(edge_a, ring_a.end(), node_b);
                spares.edges.push(edge_b);
            } else {
                debug_assert!(Some(edge_a) != reconnect_a && Some(edge_a) != reconnect_b);
                if let Some(m) = mp.as_deref_mut() {
                    m.swap_ring_ps(ring_b, ring_a_other);
                }
                tree.edge_attach(edge_b, ring_b_other.end(), node_b);
                tree.edge_attach(edge_b, ring_b.end(), node_a);
                spares.edges.push(edge_a);
            }
            None
        }
        _ => None,
    }
}

/// Splice a node into the middle of `edge`, reusing a spare node/edge
/// pair if one is available, and return the new node.
fn node_splice(tree: &mut Tree, mut mp: Option<&mut Mp>, edge: EdgeId, spares: &mut Spares) -> NodeId {
    let ring_a = edge.ring0();
    let node_a = tree.ring_node(ring_a);
    let ring_b = edge.ring1();
    let node_b = tree.ring_node(ring_b);

    let new_edge = spares.edges.pop().unwrap_or_else(|| tree.edge_new());
    let ring = new_edge.ring0();
    let new_node = spares.nodes.pop().unwrap_or_else(|| tree.node_new_internal());

    tree.edge_detach(edge, 0);
    tree.edge_detach(edge, 1);

    if let Some(m) = mp.as_deref_mut() {
        m.swap_ring_ps(ring_b, ring);
    }

    tree.edge_attach(edge, 0, node_a);
    tree.edge_attach(edge, 1, new_node);
    tree.edge_attach(new_edge, 0, node_b);
    tree.edge_attach(new_edge, 1, new_node);

    new_node
}

/// Bisect `bisect`, then reconnect at `reconnect_a` (on the side that was
/// attached to `bisect`'s end 0) and `reconnect_b` (end 1). `mp`, if
/// given, is kept consistent with the resulting topology: its per-ring
/// character views are exactly as valid afterward as they were before.
pub fn tbr(
    tree: &mut Tree,
    mut mp: Option<&mut Mp>,
    bisect: EdgeId,
    reconnect_a: ReconnectPoint,
    reconnect_b: ReconnectPoint,
) {
    tree.update();
    log::debug!(
        "tbr: bisecting {:?}, reconnecting at {:?} / {:?}",
        bisect,
        reconnect_a,
        reconnect_b
    );

    let node_a = tree.ring_node(bisect.ring0());
    let node_b = tree.ring_node(bisect.ring1());

    tree.edge_detach(bisect, 0);
    tree.edge_detach(bisect, 1);

    let reconnect_a_edge = reconnect_a.edge();
    let reconnect_b_edge = reconnect_b.edge();

    let mut spares = Spares::new();
    let lone_a = node_extract(
        tree,
        mp.as_deref_mut(),
        node_a,
        reconnect_a_edge,
        reconnect_b_edge,
        &mut spares,
    );
    let lone_b = node_extract(
        tree,
        mp.as_deref_mut(),
        node_b,
        reconnect_a_edge,
        reconnect_b_edge,
        &mut spares,
    );

    let attach_a = match reconnect_a {
        ReconnectPoint::Edge(e) => Some(node_splice(tree, mp.as_deref_mut(), e, &mut spares)),
        ReconnectPoint::Node(_) => None,
    };
    let attach_b = match reconnect_b {
        ReconnectPoint::Edge(e) => Some(node_splice(tree, mp.as_deref_mut(), e, &mut spares)),
        ReconnectPoint::Node(_) => None,
    };

    match (lone_a, lone_b) {
        (Some(na), _) => {
            let other = attach_a
                .or(attach_b)
                .expect("the non-lone side of a bisection must supply a splice attachment");
            tree.edge_attach(bisect, 0, na);
            tree.edge_attach(bisect, 1, other);
        }
        (None, Some(nb)) => {
            let other = attach_a
                .or(attach_b)
                .expect("the non-lone side of a bisection must supply a splice attachment");
            tree.edge_attach(bisect, 0, other);
            tree.edge_attach(bisect, 1, nb);
        }
        (None, None) => {
            let a = attach_a.expect("reconnect_a must name an edge when side A has more than one node");
            let b = attach_b.expect("reconnect_b must name an edge when side B has more than one node");
            tree.edge_attach(bisect, 0, a);
            tree.edge_attach(bisect, 1, b);
        }
    }

    for e in spares.edges {
        tree.edge_delete(e);
    }
    for n in spares.nodes {
        tree.node_delete(n);
    }

    tree.update();
}
