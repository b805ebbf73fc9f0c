//! Canonicalization: a deterministic representative of each unrooted
//! topology, used for structural equality and hashing.
//!
//! 1. Retarget `base` to the minimum-taxon leaf reachable from the
//!    current `base`.
//! 2. Walk the tree from there; at each internal node, recursively
//!    canonicalize every subtree but the one leading back toward `base`,
//!    record the minimum taxon seen in each, and rebuild that node's
//!    incidence ring sorted ascending by that key, with the
//!    toward-`base` ring kept first.

use crate::entity::{EntityRef, NodeId, RingId};
use crate::ring;
use crate::tree::Tree;
use smallvec::SmallVec;

/// Canonicalize `tree` in place: retarget `base`, reorder every incidence
/// ring, and invalidate the TBR table (ring order feeds `trti`).
pub fn canonize(tree: &mut Tree) {
    tree.update();
    if tree.base_get().is_none() {
        return;
    }

    let new_base = lowest_taxon_node(tree);
    log::trace!(
        "canonize: retargeting base from {:?} to {:?}",
        tree.base_get(),
        new_base
    );
    tree.base_set(new_base);

    let head = tree.nodes()[new_base].ring;
    if !head.is_none() {
        canonize_recurse(tree, head.other());
    }

    tree.mark_modified();
    tree.update();
}

fn lowest_taxon_node(tree: &Tree) -> NodeId {
    let base = tree.base_get();
    let mut best: Option<NodeId> = None;
    walk_lowest(tree, base, RingId::NONE, &mut best);
    best.unwrap_or(base)
}

fn walk_lowest(tree: &Tree, node: NodeId, from: RingId, best: &mut Option<NodeId>) {
    let taxon = tree.node_taxon(node);
    if taxon != crate::entity::NONE_INDEX {
        let better = match *best {
            None => true,
            Some(b) => taxon < tree.node_taxon(b),
        };
        if better {
            *best = Some(node);
        }
    }

    let mut to_visit: SmallVec<[RingId; 4]> = SmallVec::new();
    ring::for_each(tree.edges(), tree.nodes()[node].ring, |r| {
        if r != from {
            to_visit.push(r);
        }
    });
    for r in to_visit {
        let other = r.other();
        walk_lowest(tree, ring::node_of(tree.edges(), other), other, best);
    }
}

/// Canonicalize the subtree reached by `ring_from` (the ring element, on
/// the node being visited, that leads back toward `base`). Returns the
/// minimum taxon number in this subtree (including the node itself, if a
/// leaf).
fn canonize_recurse(tree: &mut Tree, ring_from: RingId) -> u32 {
    let node = ring::node_of(tree.edges(), ring_from);
    let taxon = tree.node_taxon(node);
    if taxon != crate::entity::NONE_INDEX {
        return taxon;
    }

    let mut siblings: SmallVec<[RingId; 4]> = SmallVec::new();
    ring::for_each_other(tree.edges(), ring_from, |r| siblings.push(r));

    let mut keyed: SmallVec<[(u32, RingId); 4]> = siblings
        .into_iter()
        .map(|r| {
            let min = canonize_recurse(tree, r.other());
            (min, r)
        })
        .collect();
    keyed.sort_by_key(|(key, _)| *key);

    let mut order = Vec::with_capacity(keyed.len() + 1);
    order.push(ring_from);
    order.extend(keyed.iter().map(|(_, r)| *r));
    relink_incidence(tree, node, &order);

    keyed.into_iter().map(|(key, _)| key).min().unwrap_or(taxon)
}

/// Rebuild node `node`'s circular incidence list so its members appear in
/// exactly `order`, and make `order[0]` the list head.
fn relink_incidence(tree: &mut Tree, node: NodeId, order: &[RingId]) {
    let edges = tree.edges_mut();
    let n = order.len();
    for i in 0..n {
        let next = order[(i + 1) % n];
        let prev = order[(i + n - 1) % n];
        let ring_data = edges[order[i].edge()].ring_mut(order[i]);
        ring_data.next = next;
        ring_data.prev = prev;
    }
    tree.nodes_mut()[node].ring = order[0];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Tree;

    fn build_2_3_0_1(t: &mut Tree) -> (NodeId, NodeId) {
        let l0 = t.node_new_leaf(0);
        let l1 = t.node_new_leaf(1);
        let l2 = t.node_new_leaf(2);
        let l3 = t.node_new_leaf(3);
        let u = t.node_new_internal(); // joins 2,3
        let v = t.node_new_internal(); // joins 0,1

        let e1 = t.edge_new();
        t.edge_attach(e1, 0, u);
        t.edge_attach(e1, 1, l2);
        let e2 = t.edge_new();
        t.edge_attach(e2, 0, u);
        t.edge_attach(e2, 1, l3);
        let e3 = t.edge_new();
        t.edge_attach(e3, 0, u);
        t.edge_attach(e3, 1, v);
        let e4 = t.edge_new();
        t.edge_attach(e4, 0, v);
        t.edge_attach(e4, 1, l0);
        let e5 = t.edge_new();
        t.edge_attach(e5, 0, v);
        t.edge_attach(e5, 1, l1);

        t.base_set(l2);
        (u, v)
    }

    #[test]
    fn canonize_retargets_base_to_minimum_taxon() {
        let mut t = Tree::new();
        build_2_3_0_1(&mut t);
        canonize(&mut t);
        assert_eq!(t.node_taxon(t.base_get()), 0);
    }

    #[test]
    fn canonize_is_idempotent() {
        let mut t = Tree::new();
        build_2_3_0_1(&mut t);
        canonize(&mut t);
        let base_once = t.base_get();
        canonize(&mut t);
        assert_eq!(t.base_get(), base_once);
    }
}
