//! Fitch parsimony scoring: character preparation from raw IUPAC taxon
//! strings, the whole-tree score, and the partial/final scoring passes a
//! TBR neighbor search reuses at every bisection.
//!
//! Scoring only handles nodes of degree 1 (leaves) and degree 3
//! (ordinary bifurcations, including the transient degree-2-as-seen
//! case where a degree-3 node sits adjacent to a logically bisected
//! edge). Higher-degree internal nodes are outside what this traversal
//! implements; see [`Mp::score_recurse`].

use crate::entity::{EdgeId, EntityRef, NodeId, RingId};
use crate::error::{TrError, TrResult};
use crate::ps::{PsArena, PsId};
use crate::ring;
use crate::tree::Tree;
use smallvec::SmallVec;

/// Owns every per-ring and per-edge [`crate::ps::Ps`] a tree's character
/// matrix needs, plus the informative-character bookkeeping `prepare`
/// derives from the raw taxon strings.
pub struct Mp {
    arena: PsArena,
    ring_ps: Vec<PsId>,
    edge_ps: Vec<PsId>,
    ninformative: u32,
}

fn iupac_code(ch: u8) -> Option<u8> {
    match ch {
        b'N' | b'n' | b'X' | b'x' | b'-' => Some(0xf),
        b'V' | b'v' => Some(0xe),
        b'H' | b'h' => Some(0xd),
        b'M' | b'm' => Some(0xc),
        b'D' | b'd' => Some(0xb),
        b'R' | b'r' => Some(0xa),
        b'W' | b'w' => Some(0x9),
        b'A' | b'a' => Some(0x8),
        b'B' | b'b' => Some(0x7),
        b'S' | b's' => Some(0x6),
        b'Y' | b'y' => Some(0x5),
        b'C' | b'c' => Some(0x4),
        b'K' | b'k' => Some(0x3),
        b'G' | b'g' => Some(0x2),
        b'T' | b't' => Some(0x1),
        _ => None,
    }
}

/// For each character column, count occurrences of each of the 14
/// unambiguous-or-compound IUPAC codes (1..=14; `N`/`X`/`-` are treated as
/// uncertainty and never counted) across taxa, then mark the column
/// informative iff two disjoint codes each occur in at least two taxa.
fn informative_mask(taxa: &[Vec<u8>], nchars: usize) -> (Vec<bool>, u32) {
    let mut mask = vec![false; nchars];
    let mut ninformative = 0;
    for i in 0..nchars {
        let mut codes = [0u32; 15];
        for row in taxa {
            let code = iupac_code(row[i]).expect("character validated before informative_mask");
            if code != 0xf {
                codes[code as usize] += 1;
            }
        }
        'outer: for x in 1..15 {
            for y in 1..15 {
                if x & y == 0 && codes[x] >= 2 && codes[y] >= 2 {
                    mask[i] = true;
                    ninformative += 1;
                    break 'outer;
                }
            }
        }
    }
    (mask, ninformative)
}

fn validate_taxa(taxa: &[Vec<u8>], nchars: usize) -> TrResult<()> {
    for (taxon, row) in taxa.iter().enumerate() {
        if row.len() != nchars {
            return Err(TrError::TaxonLengthMismatch {
                taxon: taxon as u32,
                expected: nchars,
                actual: row.len(),
            });
        }
        for (column, &ch) in row.iter().enumerate() {
            if iupac_code(ch).is_none() {
                return Err(TrError::InvalidCharacter {
                    taxon: taxon as u32,
                    column,
                    ch: ch as char,
                });
            }
        }
    }
    Ok(())
}

impl Mp {
    /// An empty scorer. `use_simd` is forwarded to the underlying
    /// [`PsArena`]; see [`crate::ps::simd::available`].
    pub fn new(use_simd: bool) -> Self {
        Mp {
            arena: PsArena::new(use_simd),
            ring_ps: Vec::new(),
            edge_ps: Vec::new(),
            ninformative: 0,
        }
    }

    /// Number of informative characters the last `prepare` call retained
    /// (equal to `taxa[0].len()` when `eliminate_uninformative` is false).
    pub fn ninformative(&self) -> u32 {
        self.ninformative
    }

    fn ring_slot(&self, r: RingId) -> PsId {
        self.ring_ps[r.as_u32() as usize]
    }

    fn edge_slot(&self, e: EdgeId) -> PsId {
        self.edge_ps[e.as_u32() as usize]
    }

    /// Prepare character state for every ring and edge reachable from
    /// `tree`'s base, from the per-taxon IUPAC strings in `taxa` (indexed
    /// by `taxon_num`). `eliminate_uninformative` applies the classic
    /// two-disjoint-states-in-two-taxa parsimony-informativeness filter.
    pub fn prepare(
        &mut self,
        tree: &Tree,
        taxa: &[Vec<u8>],
        eliminate_uninformative: bool,
    ) -> TrResult<()> {
        let nchars = taxa.first().map_or(0, |t| t.len());
        validate_taxa(taxa, nchars)?;

        let (mask, ninformative) = if eliminate_uninformative {
            informative_mask(taxa, nchars)
        } else {
            (vec![true; nchars], nchars as u32)
        };
        self.ninformative = ninformative;
        log::debug!(
            "mp::prepare: {} of {} characters retained",
            ninformative,
            nchars
        );

        let capacity = tree.edges().capacity();
        self.ring_ps = vec![PsId::NONE; capacity * 2];
        self.edge_ps = vec![PsId::NONE; capacity];

        let base = tree.base_get();
        if base.is_none() {
            return Ok(());
        }
        let head = tree.nodes()[base].ring;
        let mut firsts = Vec::new();
        ring::for_each(tree.edges(), head, |r| firsts.push(r));
        for r in firsts {
            self.prepare_edge(r.edge());
            self.prepare_ring(tree, r, taxa, &mask);
            self.prepare_recurse(tree, r.other(), taxa, &mask);
        }
        Ok(())
    }

    fn prepare_edge(&mut self, e: EdgeId) {
        let idx = e.as_u32() as usize;
        if !self.edge_ps[idx].is_none() {
            self.arena.free(self.edge_ps[idx]);
        }
        self.edge_ps[idx] = self.arena.alloc(self.ninformative);
    }

    fn prepare_ring(&mut self, tree: &Tree, r: RingId, taxa: &[Vec<u8>], mask: &[bool]) {
        let idx = r.as_u32() as usize;
        if !self.ring_ps[idx].is_none() {
            self.arena.free(self.ring_ps[idx]);
        }
        let id = self.arena.alloc(self.ninformative);
        self.ring_ps[idx] = id;

        let node = ring::node_of(tree.edges(), r);
        let taxon = tree.node_taxon(node);
        if taxon != crate::entity::NONE_INDEX {
            let ps = self.arena.get_mut(id);
            ps.score = 0;
            ps.subtrees_score = 0;
            let row = &taxa[taxon as usize];
            let mut j = 0usize;
            for (i, &ch) in row.iter().enumerate() {
                if !mask[i] {
                    continue;
                }
                let code = iupac_code(ch).expect("validated in prepare");
                ps.char_set(code, j);
                j += 1;
            }
        }
    }

    fn prepare_recurse(&mut self, tree: &Tree, ring: RingId, taxa: &[Vec<u8>], mask: &[bool]) {
        self.prepare_ring(tree, ring, taxa, mask);
        let mut siblings = Vec::new();
        ring::for_each_other(tree.edges(), ring, |s| siblings.push(s));
        for s in siblings {
            self.prepare_edge(s.edge());
            self.prepare_ring(tree, s, taxa, mask);
            self.prepare_recurse(tree, s.other(), taxa, mask);
        }
    }

    /// Release every PS this scorer allocated. The scorer may be
    /// `prepare`d again afterward.
    pub fn finish(&mut self) {
        self.arena = PsArena::new(false);
        self.ring_ps.clear();
        self.edge_ps.clear();
        self.ninformative = 0;
    }

    fn degree_excluding(
        &self,
        tree: &Tree,
        ring: RingId,
        bisect: EdgeId,
    ) -> (u32, bool, SmallVec<[RingId; 4]>) {
        let mut others = SmallVec::new();
        ring::for_each_other(tree.edges(), ring, |r| others.push(r));
        let mut degree = 1u32;
        let mut adjacent = false;
        for &r in &others {
            if r.edge() != bisect {
                degree += 1;
            } else {
                adjacent = true;
            }
        }
        (degree, adjacent, others)
    }

    /// Post-order: compute (and cache) partial scores for every view in
    /// the subtree reached from `ring`, pretending edge `bisect` has
    /// already been removed (pass `EdgeId::NONE` to score an un-bisected
    /// tree). Returns the PS to use as this subtree's combining input.
    fn score_recurse(&mut self, tree: &Tree, ring: RingId, bisect: EdgeId) -> PsId {
        let (degree, adjacent, others) = self.degree_excluding(tree, ring, bisect);
        match degree {
            1 => self.ring_slot(ring),
            2 => {
                debug_assert!(adjacent);
                self.arena.invalidate_view(self.ring_slot(ring));
                let continuation = others
                    .iter()
                    .copied()
                    .find(|r| r.edge() != bisect)
                    .expect("degree-2-excluding-bisect node has exactly one other ring");
                self.score_recurse(tree, continuation.other(), bisect)
            }
            3 if !adjacent => {
                let ring_a = others[0];
                let ring_b = others[1];
                let ps_a = self.score_recurse(tree, ring_a.other(), bisect);
                let ps_b = self.score_recurse(tree, ring_b.other(), bisect);
                let target = self.ring_slot(ring);
                self.arena.pscore(target, ps_a, ps_b);
                target
            }
            _ => panic!("multifurcating node parsimony scoring is not implemented"),
        }
    }

    /// Pre-order: having already computed one valid view at every node via
    /// [`Mp::score_recurse`], fill in the remaining views and every edge's
    /// PS along the way.
    fn views_recurse(&mut self, tree: &Tree, ring: RingId, ps: PsId, bisect: EdgeId) {
        let (degree, adjacent, others) = self.degree_excluding(tree, ring, bisect);
        match degree {
            1 => {}
            2 => {
                debug_assert!(adjacent);
                let continuation = others
                    .iter()
                    .copied()
                    .find(|r| r.edge() != bisect)
                    .expect("degree-2-excluding-bisect node has exactly one other ring");
                self.arena.invalidate_view(self.ring_slot(continuation));
                self.views_recurse(tree, continuation.other(), ps, bisect);
            }
            3 if !adjacent => {
                let ring_a = others[0];
                let ring_a_other = ring_a.other();
                let ring_b = others[1];
                let ring_b_other = ring_b.other();

                let ps_a = self.ring_slot(ring_a);
                let ps_a_other = self.ring_slot(ring_a_other);
                let ps_b = self.ring_slot(ring_b);
                let ps_b_other = self.ring_slot(ring_b_other);

                self.arena.pscore(ps_a, ps, ps_b_other);
                let edge_a_ps = self.edge_slot(ring_a.edge());
                self.arena.pscore(edge_a_ps, ps_a, ps_a_other);
                self.views_recurse(tree, ring_a_other, ps_a, bisect);

                self.arena.pscore(ps_b, ps, ps_a_other);
                let edge_b_ps = self.edge_slot(ring_b.edge());
                self.arena.pscore(edge_b_ps, ps_b, ps_b_other);
                self.views_recurse(tree, ring_b_other, ps_b, bisect);
            }
            _ => panic!("multifurcating node parsimony scoring is not implemented"),
        }
    }

    /// Compute partial scores for every edge reachable from `edges[0]`
    /// (the edge adjacent to a bisection, or `None` paired with any full
    /// edge list for a whole-tree score). Returns `true` ("too expensive,
    /// stop looking") if the subtree's score already exceeds `maxscore`.
    fn bisection_edge_list_mp(
        &mut self,
        tree: &Tree,
        first_edge: Option<EdgeId>,
        bisect: EdgeId,
        maxscore: u32,
    ) -> bool {
        let Some(e0) = first_edge else {
            return false;
        };
        let ring_a = e0.ring0();
        let ring_b = e0.ring1();
        let ps_a = self.score_recurse(tree, ring_a, bisect);
        let ps_b = self.score_recurse(tree, ring_b, bisect);

        let target = self.edge_slot(e0);
        self.arena.pscore(target, ps_a, ps_b);
        if self.arena.get(target).subtrees_score + self.arena.get(target).score > maxscore {
            return true;
        }

        self.views_recurse(tree, ring_a, ps_b, bisect);
        self.views_recurse(tree, ring_b, ps_a, bisect);
        false
    }

    /// The parsimony score of the whole tree as currently topologized.
    pub fn score(&mut self, tree: &Tree) -> u32 {
        let base = tree.base_get();
        if base.is_none() {
            return 0;
        }
        let head = tree.nodes()[base].ring;
        if head.is_none() {
            return 0;
        }
        let edge = head.edge();
        let ps_a = self.score_recurse(tree, edge.ring0(), EdgeId::NONE);
        let ps_b = self.score_recurse(tree, edge.ring1(), EdgeId::NONE);
        self.arena.fscore(ps_a, ps_b, u32::MAX).unwrap_or(u32::MAX)
    }

    /// Final score for the pairing of the two views at `a` and `b`, or
    /// `None` if it would exceed `maxscore`.
    pub(crate) fn fscore_views(&self, a: PsId, b: PsId, maxscore: u32) -> Option<u32> {
        self.arena.fscore(a, b, maxscore)
    }

    pub(crate) fn arena_mut(&mut self) -> &mut PsArena {
        &mut self.arena
    }

    pub(crate) fn bisection_scores(
        &mut self,
        tree: &Tree,
        side_a_first_edge: Option<EdgeId>,
        side_b_first_edge: Option<EdgeId>,
        bisect: EdgeId,
        maxscore: u32,
    ) -> bool {
        self.bisection_edge_list_mp(tree, side_a_first_edge, bisect, maxscore)
            || self.bisection_edge_list_mp(tree, side_b_first_edge, bisect, maxscore)
    }

    pub(crate) fn lone_node_ps(&self, tree: &Tree, node: NodeId) -> PsId {
        let head = tree.nodes()[node].ring;
        self.ring_slot(head)
    }

    pub(crate) fn edge_ps_handle(&self, e: EdgeId) -> PsId {
        self.edge_slot(e)
    }

    /// Swap the cached views at two rings, used by `tbr` to keep each
    /// ring's character data attached to the subtree it actually
    /// describes across an extract/splice step. A no-op if this scorer
    /// hasn't been `prepare`d (so a caller that never cares about
    /// character data can pass `None` for the whole operation). Grows
    /// the backing arrays and allocates fresh, pad-filled PSes on demand
    /// for rings/edges TBR has just created, mirroring how the original
    /// tree's ring/edge records always carry a PS slot regardless of
    /// when they were allocated.
    pub(crate) fn swap_ring_ps(&mut self, a: RingId, b: RingId) {
        if self.ring_ps.is_empty() {
            return;
        }
        self.ensure_ring_capacity(a);
        self.ensure_ring_capacity(b);
        self.ring_ps.swap(a.as_u32() as usize, b.as_u32() as usize);
    }

    fn ensure_ring_capacity(&mut self, r: RingId) {
        let idx = r.as_u32() as usize;
        if idx >= self.ring_ps.len() {
            self.ring_ps.resize(idx + 1, PsId::NONE);
        }
        if self.ring_ps[idx].is_none() {
            self.ring_ps[idx] = self.arena.alloc(self.ninformative);
        }
        let eidx = r.edge().as_u32() as usize;
        if eidx >= self.edge_ps.len() {
            self.edge_ps.resize(eidx + 1, PsId::NONE);
        }
        if self.edge_ps[eidx].is_none() {
            self.edge_ps[eidx] = self.arena.alloc(self.ninformative);
        }
    }
}
