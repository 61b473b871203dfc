//! Typed errors for the plotting pipeline.

/// Failures that can occur while building or writing a plot.
#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    /// Parameter construction failed (bad `k`/`strength`, or Feistel
    /// parameters that don't admit distinct round keys).
    #[error(transparent)]
    Proof(#[from] pos2_primitives::error::ProofError),
    /// Writing the finished plot file failed.
    #[error(transparent)]
    PlotFile(#[from] pos2_format::PlotFileError),
}

/// Convenient alias for fallible plotting operations.
pub type PlotResult<T> = Result<T, PlotError>;
