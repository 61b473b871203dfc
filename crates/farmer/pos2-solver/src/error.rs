//! Typed errors for partial-proof reconstruction.

/// Failures that can occur while reconstructing full proofs from a partial
/// proof's 16 fragments.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    /// Parameter construction failed.
    #[error(transparent)]
    Proof(#[from] pos2_primitives::error::ProofError),
    /// More candidate full proofs were found than the output buffer budget
    /// allows. A genuine plot's fragments produce one match, occasionally a
    /// handful — this many spurious matches means adversarial or malformed
    /// input fragments, not a normal solve.
    #[error("too many candidate proofs found (limit {limit})")]
    TooManyMatches {
        /// The configured cap that was hit.
        limit: usize,
    },
}

/// Convenient alias for fallible solver operations.
pub type SolverResult<T> = Result<T, SolverError>;
