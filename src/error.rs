//! Error types returned at API boundaries.
//!
//! Internal invariant violations (a degree-2 node surviving into the
//! parsimony scorer, a cache disagreeing with a debug recomputation) are
//! bugs in this crate and panic rather than returning a `Result`. Only
//! conditions a caller can legitimately trigger - allocation failure,
//! malformed taxon strings, an out-of-range neighbor index - are modeled
//! as errors here.

use thiserror::Error;

/// Errors that can be returned from the public API of this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrError {
    /// An arena failed to grow to the requested capacity.
    #[error("allocation failure growing {kind} arena to {requested} entries")]
    AllocFailure {
        /// Which arena (`"node"`, `"edge"`, `"ring"`) failed to grow.
        kind: &'static str,
        /// The capacity that was requested.
        requested: usize,
    },

    /// `mp_prepare` encountered a byte in a taxon string that is not a
    /// recognized IUPAC nucleotide code (including `N`/`X`/`-`).
    #[error("invalid character {ch:?} in taxon {taxon} at column {column}")]
    InvalidCharacter {
        /// The taxon number whose string contains the bad byte.
        taxon: u32,
        /// The zero-based column at which the bad byte occurs.
        column: usize,
        /// The offending byte, rendered as a `char` when possible.
        ch: char,
    },

    /// Every taxon string must have the same length, equal to `nchars`.
    #[error("taxon {taxon} has length {actual}, expected {expected}")]
    TaxonLengthMismatch {
        /// The taxon number with the mismatched length.
        taxon: u32,
        /// The length that was expected (`nchars`).
        expected: usize,
        /// The length the taxon string actually has.
        actual: usize,
    },

    /// A TBR neighbor index was not in `[0, tbr_nneighbors())`.
    #[error("TBR neighbor index {index} is out of range (nneighbors = {nneighbors})")]
    NeighborOutOfRange {
        /// The index that was requested.
        index: u32,
        /// The valid exclusive upper bound at the time of the call.
        nneighbors: u32,
    },
}

/// Convenience alias for results returned by this crate's public API.
pub type TrResult<T> = Result<T, TrError>;
