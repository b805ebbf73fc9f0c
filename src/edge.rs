//! Edges and the two ring elements attached to each one.
//!
//! An edge owns exactly two ring elements, at indices `2*e` and `2*e + 1`
//! (see [`EdgeId::ring0`](crate::entity::EdgeId::ring0) /
//! [`ring1`](crate::entity::EdgeId::ring1)); there is no separate arena for
//! rings; a [`RingId`] is resolved back to its [`RingData`] by indexing the
//! edge pool and picking the end.

use crate::entity::{NodeId, RingId};

/// One end of an edge, as seen from the node it attaches to.
///
/// `next`/`prev` thread this ring element into the circular incidence list
/// of the node it's attached to (see [`crate::ring`]); a ring element that
/// isn't currently attached to any node (mid-detach) has `next == prev ==
/// self`, matching the convention a circular list with a single member
/// uses.
#[derive(Clone, Copy, Debug)]
pub struct RingData {
    /// The node this ring element attaches the edge to.
    pub node: NodeId,
    /// Next ring element around `node`'s incidence list.
    pub next: RingId,
    /// Previous ring element around `node`'s incidence list.
    pub prev: RingId,
}

impl RingData {
    /// A detached ring element: singleton circular list, no owning node.
    pub fn detached() -> Self {
        // `self_id` is patched in once the owning `EdgeId` is known, by
        // `EdgeData::new`.
        RingData {
            node: NodeId::NONE,
            next: RingId::NONE,
            prev: RingId::NONE,
        }
    }
}

/// An edge: two ring ends plus the data associated with the edge itself.
#[derive(Clone, Copy, Debug)]
pub struct EdgeData {
    ends: [RingData; 2],
    /// Branch length, in whatever units the caller assigns. `NAN` marks
    /// "unset".
    pub length: f64,
    /// Opaque caller-owned slot, mirroring the original design's per-edge
    /// auxiliary pointer.
    pub aux: u32,
}

impl EdgeData {
    /// A fresh edge with both ends detached (singleton rings) and no
    /// length set.
    pub fn new(self_id: crate::entity::EdgeId) -> Self {
        let mut data = EdgeData {
            ends: [RingData::detached(), RingData::detached()],
            length: f64::NAN,
            aux: crate::entity::NONE_INDEX,
        };
        data.ends[0].next = self_id.ring0();
        data.ends[0].prev = self_id.ring0();
        data.ends[1].next = self_id.ring1();
        data.ends[1].prev = self_id.ring1();
        data
    }

    /// Borrow the ring data for end `0` or `1`.
    #[inline]
    pub fn end(&self, end: u8) -> &RingData {
        &self.ends[end as usize]
    }

    /// Mutably borrow the ring data for end `0` or `1`.
    #[inline]
    pub fn end_mut(&mut self, end: u8) -> &mut RingData {
        &mut self.ends[end as usize]
    }

    /// Borrow the ring data named by `r` directly.
    #[inline]
    pub fn ring(&self, r: RingId) -> &RingData {
        self.end(r.end())
    }

    /// Mutably borrow the ring data named by `r` directly.
    #[inline]
    pub fn ring_mut(&mut self, r: RingId) -> &mut RingData {
        self.end_mut(r.end())
    }
}
