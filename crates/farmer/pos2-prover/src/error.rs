//! Typed errors for challenge scanning.

/// Failures that can occur while answering a challenge against a plot file.
#[derive(Debug, thiserror::Error)]
pub enum ProverError {
    /// Parameter construction failed.
    #[error(transparent)]
    Proof(#[from] pos2_primitives::error::ProofError),
    /// Reading the plot file failed.
    #[error(transparent)]
    PlotFile(#[from] pos2_format::PlotFileError),
}

/// Convenient alias for fallible prover operations.
pub type ProverResult<T> = Result<T, ProverError>;
