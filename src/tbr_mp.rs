//! Parsimony-guided TBR neighbor search: score every reconnection in the
//! TBR neighborhood of a tree and hold the ones worth keeping, per one of
//! three policies.

use crate::mp::Mp;
use crate::trt::{bedges_gen, ReconnectPoint};
use crate::tree::Tree;

fn ps_for(tree: &Tree, mp: &Mp, point: ReconnectPoint) -> crate::ps::PsId {
    match point {
        ReconnectPoint::Edge(e) => mp.edge_ps_handle(e),
        ReconnectPoint::Node(n) => mp.lone_node_ps(tree, n),
    }
}

/// A single held TBR neighbor: its position in the global neighbor
/// enumeration (see [`Tree::tbr_neighbor`](crate::tree::Tree)) and the
/// parsimony score it scored at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Held {
    /// Global index into the TBR neighborhood, resolvable back to a
    /// `(bisect, reconnect_a, reconnect_b)` triple via the tree's TBR
    /// table.
    pub neighbor_index: u32,
    /// Parsimony score of that neighbor.
    pub score: u32,
}

/// Which neighbors a search keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoldHow {
    /// Keep only neighbors tied for the best score seen so far.
    ///
    /// Once `max_hold` is reached, further ties are silently dropped
    /// instead of replacing a held entry, so the retained set is biased
    /// toward whichever ties were encountered first in traversal order
    /// rather than a uniform sample of the tied neighbors. Preserved
    /// as-is rather than replaced with reservoir sampling.
    Best,
    /// Keep every neighbor at least as good as the tree being searched
    /// from.
    Better,
    /// Keep every neighbor, regardless of score.
    All,
}

/// No cap on the number of held neighbors.
pub const HOLD_ALL: u32 = u32::MAX;

fn hold(held: &mut Vec<Held>, max_hold: u32, neighbor_index: u32, score: u32) -> bool {
    if (held.len() as u32) < max_hold {
        held.push(Held {
            neighbor_index,
            score,
        });
        false
    } else {
        true
    }
}

/// Score every TBR neighbor of `tree` and hold results per `how`,
/// capped at `max_hold` entries. `maxscore` is the worst score worth
/// exploring at all (pass `u32::MAX` for "no cap").
pub fn tbr_neighbors_mp(
    tree: &mut Tree,
    mp: &mut Mp,
    max_hold: u32,
    maxscore: u32,
    how: HoldHow,
) -> Vec<Held> {
    tree.ensure_trt();
    let mut held = Vec::new();
    let mut curmax = maxscore;

    let trti: Vec<_> = tree.trt().trti().to_vec();
    let mut neighbor = 0u32;

    for &bisect in &trti {
        let bedges = bedges_gen(tree.edges(), bisect);
        let nneighbors = bedges.nneighbors();
        if nneighbors == 0 {
            continue;
        }

        let too_expensive = mp.bisection_scores(
            tree,
            bedges.side_a[0].edge(),
            bedges.side_b[0].edge(),
            bisect,
            curmax,
        );
        if too_expensive {
            neighbor += nneighbors;
            continue;
        }

        for (j, &a) in bedges.side_a.iter().enumerate() {
            let ps_a = ps_for(tree, mp, a);
            for (k, &b) in bedges.side_b.iter().enumerate() {
                if j == 0 && k == 0 {
                    continue;
                }
                let ps_b = ps_for(tree, mp, b);

                let score = mp
                    .fscore_views(ps_a, ps_b, curmax)
                    .unwrap_or(curmax.saturating_add(1));

                match how {
                    HoldHow::Best => {
                        if score < curmax {
                            held.clear();
                        }
                        if score <= curmax || held.is_empty() {
                            if hold(&mut held, max_hold, neighbor, score) {
                                curmax = score.saturating_sub(1);
                            } else {
                                curmax = score;
                            }
                        }
                    }
                    HoldHow::Better => {
                        if score <= curmax {
                            hold(&mut held, max_hold, neighbor, score);
                            curmax = score.saturating_sub(1);
                        }
                    }
                    HoldHow::All => {
                        hold(&mut held, max_hold, neighbor, score);
                    }
                }

                neighbor += 1;
            }
        }
    }

    held
}

/// Keep only the best-scoring neighbor(s), up to `max_hold`.
pub fn tbr_best_neighbors_mp(tree: &mut Tree, mp: &mut Mp, max_hold: u32) -> Vec<Held> {
    tbr_neighbors_mp(tree, mp, max_hold, crate::MAXSCORE_NONE, HoldHow::Best)
}

/// Keep every neighbor strictly better than `tree`'s current score, up to
/// `max_hold`.
pub fn tbr_better_neighbors_mp(tree: &mut Tree, mp: &mut Mp, max_hold: u32) -> Vec<Held> {
    let score = mp.score(tree);
    let ceiling = score.saturating_sub(1);
    tbr_neighbors_mp(tree, mp, max_hold, ceiling, HoldHow::Better)
}

/// Keep every neighbor, regardless of score.
pub fn tbr_all_neighbors_mp(tree: &mut Tree, mp: &mut Mp) -> Vec<Held> {
    tbr_neighbors_mp(tree, mp, HOLD_ALL, crate::MAXSCORE_NONE, HoldHow::All)
}
