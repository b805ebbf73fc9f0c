//! Property-based checks of the universal invariants, run over randomly
//! generated small unrooted binary trees and character matrices rather
//! than one fixed example.

use polytomy::canon::canonize;
use polytomy::entity::{EntityRef, NodeId, RingId};
use polytomy::mp::Mp;
use polytomy::tree::Tree;
use proptest::prelude::*;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Build an unrooted binary tree over `ntaxa` leaves by repeatedly
/// splicing a new leaf into the middle of a randomly chosen existing
/// edge, the way a random-attachment tree generator would. Returns the
/// tree plus the full list of internal nodes and edges it built, since
/// the public API has no way to enumerate them after the fact.
fn random_binary_tree(ntaxa: u32, picks: &[usize]) -> (Tree, Vec<NodeId>, Vec<polytomy::EdgeId>) {
    let mut t = Tree::new();
    let l0 = t.node_new_leaf(0);
    let l1 = t.node_new_leaf(1);
    let e0 = t.edge_new();
    t.edge_attach(e0, 0, l0);
    t.edge_attach(e0, 1, l1);
    t.base_set(l0);

    let mut edges = vec![e0];
    let mut internals = Vec::new();

    for (i, &pick) in (2..ntaxa).zip(picks.iter().cycle()) {
        let idx = pick % edges.len();
        let e = edges[idx];
        let node_a = t.ring_node(e.ring0());
        let node_b = t.ring_node(e.ring1());

        t.edge_detach(e, 0);
        t.edge_detach(e, 1);
        let hub = t.node_new_internal();
        internals.push(hub);
        t.edge_attach(e, 0, node_a);
        t.edge_attach(e, 1, hub);

        let e_b = t.edge_new();
        t.edge_attach(e_b, 0, node_b);
        t.edge_attach(e_b, 1, hub);

        let leaf = t.node_new_leaf(i);
        let e_leaf = t.edge_new();
        t.edge_attach(e_leaf, 0, hub);
        t.edge_attach(e_leaf, 1, leaf);

        edges.push(e_b);
        edges.push(e_leaf);
    }

    (t, internals, edges)
}

/// A rooting-independent structural signature: a leaf is its taxon
/// number, an internal node is the sorted, parenthesized signatures of
/// its subtrees excluding the one the traversal arrived from. Two trees
/// with the same topology (whatever their node identities or ring order)
/// produce identical strings.
fn topology_signature(tree: &Tree, node: NodeId, from: RingId) -> String {
    let taxon = tree.node_taxon(node);
    if taxon != polytomy::TAXON_NONE {
        return format!("t{}", taxon);
    }
    let mut rings = Vec::new();
    tree.node_rings(node, |r| {
        if r != from {
            rings.push(r);
        }
    });
    let mut subtrees: Vec<String> = rings
        .into_iter()
        .map(|r| {
            let other = r.other();
            topology_signature(tree, tree.ring_node(other), other)
        })
        .collect();
    subtrees.sort();
    format!("({})", subtrees.join(","))
}

/// Structural signature of the whole tree, rooted at its traversal
/// anchor. `base` never moves off a leaf during TBR (only internal nodes
/// are ever extracted/spliced), so the same anchor node remains valid
/// across a bisection and across `Tree::dup`.
fn signature(tree: &Tree) -> String {
    topology_signature(tree, tree.base_get(), RingId::NONE)
}

fn dna_matrix(ntaxa: usize, nchars: usize, codes: &[u8]) -> Vec<Vec<u8>> {
    const BASES: &[u8] = b"ACGT";
    (0..ntaxa)
        .map(|i| {
            (0..nchars)
                .map(|j| BASES[codes[(i * nchars + j) % codes.len()] as usize % 4])
                .collect()
        })
        .collect()
}

proptest! {
    #[test]
    fn ring_duality_and_degree_2_freedom(
        ntaxa in 4u32..9,
        picks in prop::collection::vec(0usize..997, 1..16),
    ) {
        init();
        let (t, internals, edges) = random_binary_tree(ntaxa, &picks);

        for &e in &edges {
            let node_a = t.ring_node(e.ring0());
            let node_b = t.ring_node(e.ring1());
            prop_assert_ne!(node_a, node_b);
            prop_assert!(!node_a.is_none());
            prop_assert!(!node_b.is_none());
        }

        for &n in &internals {
            prop_assert_ne!(t.node_degree(n), 2);
        }
    }

    #[test]
    fn tbr_round_trip_recovers_original_topology(
        picks in prop::collection::vec(0usize..997, 1..10),
        neighbor_pick in 0usize..997,
    ) {
        init();
        let (mut t, _internals, _edges) = random_binary_tree(6, &picks);
        let original = signature(&t);

        let nneighbors = t.tbr_nneighbors();
        prop_assume!(nneighbors > 0);
        let k = (neighbor_pick as u32) % nneighbors;

        let mut rearranged = t.dup();
        rearranged.apply_tbr_neighbor(None, k).unwrap();
        // The identity reconnection is excluded from enumeration, so a
        // TBR step always changes the topology.
        prop_assert_ne!(signature(&rearranged), original.clone());

        // Reversibility: the rearranged tree's own neighbor set must
        // include a step back to the original topology.
        let back_nneighbors = rearranged.tbr_nneighbors();
        let recovered = (0..back_nneighbors).any(|j| {
            let mut candidate = rearranged.dup();
            candidate.apply_tbr_neighbor(None, j).unwrap();
            signature(&candidate) == original
        });
        prop_assert!(
            recovered,
            "no TBR neighbor of the rearranged tree recovers the original topology"
        );
    }

    #[test]
    fn canonicalize_is_idempotent_on_random_trees(
        picks in prop::collection::vec(0usize..997, 1..10),
    ) {
        init();
        let (mut t, _internals, _edges) = random_binary_tree(6, &picks);
        canonize(&mut t);
        let base_once = t.base_get();
        let ntaxa_once = t.ntaxa();
        canonize(&mut t);
        prop_assert_eq!(t.base_get(), base_once);
        prop_assert_eq!(t.ntaxa(), ntaxa_once);
        // Canonicalization always retargets to the globally minimum taxon.
        prop_assert_eq!(t.node_taxon(t.base_get()), 0);
    }

    #[test]
    fn scalar_and_simd_scorers_agree(
        picks in prop::collection::vec(0usize..997, 1..10),
        codes in prop::collection::vec(0u8..4, 6 * 8),
    ) {
        init();
        let (t, _internals, _edges) = random_binary_tree(6, &picks);
        let matrix = dna_matrix(6, 8, &codes);

        let mut scalar = Mp::new(false);
        scalar.prepare(&t, &matrix, false).unwrap();
        let mut simd = Mp::new(true);
        simd.prepare(&t, &matrix, false).unwrap();

        let mut t_scalar = t.dup();
        let mut t_simd = t.dup();
        prop_assert_eq!(scalar.score(&mut t_scalar), simd.score(&mut t_simd));
    }

    #[test]
    fn pad_characters_do_not_change_the_score(
        picks in prop::collection::vec(0usize..997, 1..10),
        codes in prop::collection::vec(0u8..4, 6 * 4),
        pad_len in 0usize..31,
    ) {
        init();
        let (t, _internals, _edges) = random_binary_tree(6, &picks);
        let base_matrix = dna_matrix(6, 4, &codes);
        let padded: Vec<Vec<u8>> = base_matrix
            .iter()
            .map(|row| {
                let mut row = row.clone();
                row.extend(std::iter::repeat(b'-').take(pad_len));
                row
            })
            .collect();

        let mut t1 = t.dup();
        let mut mp1 = Mp::new(false);
        mp1.prepare(&t1, &base_matrix, false).unwrap();
        let unpadded_score = mp1.score(&mut t1);

        let mut t2 = t.dup();
        let mut mp2 = Mp::new(false);
        mp2.prepare(&t2, &padded, false).unwrap();
        let padded_score = mp2.score(&mut t2);

        prop_assert_eq!(unpadded_score, padded_score);
    }
}
