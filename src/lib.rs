//! Unrooted multifurcating phylogenetic trees, Fitch parsimony scoring, and
//! systematic enumeration of Tree Bisection and Reconnection (TBR)
//! neighbors.
//!
//! Nodes, edges and the "rings" that join them are allocated out of
//! per-[`Tree`](tree::Tree) arenas, so that structural edits never touch
//! memory outside the tree they belong to and can be undone cheaply by
//! [`Tree::dup`](tree::Tree::dup)-ing before mutating. Handles
//! ([`NodeId`](entity::NodeId), [`EdgeId`](entity::EdgeId),
//! [`RingId`](entity::RingId)) are plain indices into those arenas; they
//! carry no lifetime and can be copied, stored, and compared freely.
//!
//! This crate does not parse FASTA files, distance matrices, or Newick
//! strings, does not build an initial tree via neighbor-joining, and does
//! not provide scripting-language bindings. Those are collaborators that
//! consume the API described here.

#![deny(missing_docs, trivial_numeric_casts, unused_extern_crates)]
#![warn(unused_import_braces)]

pub mod canon;
pub mod edge;
pub mod entity;
pub mod error;
pub mod mp;
pub mod node;
pub mod pool;
pub mod ps;
pub mod ring;
pub mod tbr;
pub mod tbr_mp;
pub mod tree;
pub mod trt;

pub use crate::edge::EdgeData;
pub use crate::entity::{EdgeId, NodeId, RingId};
pub use crate::error::{TrError, TrResult};
pub use crate::node::NodeData;
pub use crate::tbr_mp::{Held, HoldHow};
pub use crate::tree::Tree;

/// Sentinel taxon number for internal (non-leaf) nodes.
pub const TAXON_NONE: u32 = u32::MAX;

/// Sentinel meaning "no maximum score limit" for [`mp::Mp::score`]-driven
/// TBR scoring.
pub const MAXSCORE_NONE: u32 = u32::MAX;

/// Sentinel meaning "hold every neighbor, unbounded" for the TBR-MP driver.
pub const HOLD_ALL: u32 = u32::MAX;
