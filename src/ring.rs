//! Operations on the circular incidence list threaded through a node's
//! ring elements.
//!
//! Grounded on the `qli`/`qri` intrusive circular doubly-linked list
//! macros the original tree representation builds its node incidence
//! lists from: a ring element's `next`/`prev` point to other ring
//! elements attached to the *same node*, not to the other end of the
//! same edge (that relationship is `RingId::other`, plain index
//! arithmetic with no list traversal at all). A node with degree `d` has
//! `d` ring elements chained into one circular list; `NodeData::ring`
//! names an arbitrary member used as the list's entry point.

use crate::edge::EdgeData;
use crate::entity::{EntityRef, NodeId, RingId};
use crate::pool::Pool;

type Edges = Pool<crate::entity::EdgeId, EdgeData>;

/// The node a ring element is currently attached to, or `NodeId::NONE` if
/// detached.
pub fn node_of(edges: &Edges, r: RingId) -> NodeId {
    edges[r.edge()].ring(r).node
}

/// The next ring element around the same node's incidence list.
pub fn next(edges: &Edges, r: RingId) -> RingId {
    edges[r.edge()].ring(r).next
}

/// The previous ring element around the same node's incidence list.
pub fn prev(edges: &Edges, r: RingId) -> RingId {
    edges[r.edge()].ring(r).prev
}

fn set_next(edges: &mut Edges, r: RingId, next: RingId) {
    edges[r.edge()].ring_mut(r).next = next;
}

fn set_prev(edges: &mut Edges, r: RingId, prev: RingId) {
    edges[r.edge()].ring_mut(r).prev = prev;
}

/// Splice `r` into `node`'s incidence list, immediately before `at`
/// (`qli_before_insert`). `r` must currently be a detached singleton.
pub fn insert_before(edges: &mut Edges, at: RingId, r: RingId, node: NodeId) {
    let before = prev(edges, at);
    set_next(edges, before, r);
    set_prev(edges, r, before);
    set_next(edges, r, at);
    set_prev(edges, at, r);
    edges[r.edge()].ring_mut(r).node = node;
}

/// Splice `r` into `node`'s incidence list, immediately after `at`
/// (`qli_after_insert`). `r` must currently be a detached singleton.
pub fn insert_after(edges: &mut Edges, at: RingId, r: RingId, node: NodeId) {
    let after = next(edges, at);
    insert_before(edges, after, r, node);
}

/// Make `r` the sole member of a fresh, detached singleton ring, and
/// attach it to `node` as that node's only incidence-list member.
pub fn make_singleton(edges: &mut Edges, r: RingId, node: NodeId) {
    set_next(edges, r, r);
    set_prev(edges, r, r);
    edges[r.edge()].ring_mut(r).node = node;
}

/// Remove `r` from whatever incidence list it's threaded into, leaving it
/// a detached singleton (`qli_remove`). Returns the ring element that was
/// `r`'s neighbor before removal, or `RingId::NONE` if `r` was already a
/// singleton (i.e. its node had degree 1).
pub fn remove(edges: &mut Edges, r: RingId) -> RingId {
    let before = prev(edges, r);
    let after = next(edges, r);
    if before == r {
        debug_assert_eq!(after, r);
        edges[r.edge()].ring_mut(r).node = NodeId::NONE;
        return RingId::NONE;
    }
    set_next(edges, before, after);
    set_prev(edges, after, before);
    set_next(edges, r, r);
    set_prev(edges, r, r);
    edges[r.edge()].ring_mut(r).node = NodeId::NONE;
    before
}

/// Count the ring elements reachable from `r` by repeatedly following
/// `next`, i.e. the degree of the node `r` is attached to.
pub fn degree(edges: &Edges, r: RingId) -> u32 {
    if r.is_none() {
        return 0;
    }
    let mut count = 1;
    let mut cur = next(edges, r);
    while cur != r {
        count += 1;
        cur = next(edges, cur);
    }
    count
}

/// Visit every ring element in the incidence list `r` belongs to, starting
/// at `r` and following `next` around once (`qli_foreach`).
pub fn for_each(edges: &Edges, r: RingId, mut visit: impl FnMut(RingId)) {
    if r.is_none() {
        return;
    }
    let mut cur = r;
    loop {
        visit(cur);
        cur = next(edges, cur);
        if cur == r {
            break;
        }
    }
}

/// Visit every ring element in `r`'s incidence list *other than* `r`
/// itself.
pub fn for_each_other(edges: &Edges, r: RingId, mut visit: impl FnMut(RingId)) {
    if r.is_none() {
        return;
    }
    let mut cur = next(edges, r);
    while cur != r {
        visit(cur);
        cur = next(edges, cur);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EdgeId;

    fn fresh_edges(n: u32) -> Edges {
        let mut pool: Edges = Pool::new();
        for _ in 0..n {
            // reserve slots; EdgeId values assigned are 0..n in order since
            // the pool starts empty and never frees here.
            let id = pool.alloc(EdgeData::new(EdgeId::from_u32(0))).unwrap();
            pool[id] = EdgeData::new(id);
        }
        pool
    }

    #[test]
    fn three_way_node_ring() {
        let mut edges = fresh_edges(3);
        let node = NodeId::from_u32(0);
        let r0 = EdgeId::from_u32(0).ring0();
        let r1 = EdgeId::from_u32(1).ring0();
        let r2 = EdgeId::from_u32(2).ring0();

        make_singleton(&mut edges, r0, node);
        insert_after(&mut edges, r0, r1, node);
        insert_after(&mut edges, r1, r2, node);

        assert_eq!(degree(&edges, r0), 3);
        let mut seen = Vec::new();
        for_each(&edges, r0, |r| seen.push(r));
        assert_eq!(seen.len(), 3);
        assert!(seen.contains(&r0) && seen.contains(&r1) && seen.contains(&r2));

        let mut others = Vec::new();
        for_each_other(&edges, r0, |r| others.push(r));
        assert_eq!(others.len(), 2);
        assert!(!others.contains(&r0));

        let neighbor = remove(&mut edges, r1);
        assert_ne!(neighbor, RingId::NONE);
        assert_eq!(degree(&edges, r0), 2);
        assert_eq!(node_of(&edges, r1), NodeId::NONE);
    }

    #[test]
    fn singleton_remove_returns_none() {
        let mut edges = fresh_edges(1);
        let node = NodeId::from_u32(0);
        let r0 = EdgeId::from_u32(0).ring0();
        make_singleton(&mut edges, r0, node);
        assert_eq!(degree(&edges, r0), 1);
        assert_eq!(remove(&mut edges, r0), RingId::NONE);
    }
}
