//! Unified error type the CLI and C ABI surfaces report through, folding
//! every crate-specific error into one taxonomy via `#[from]`.

/// Everything that can go wrong in a `pos2-cli` command or FFI call.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Plot, proof or params construction failed.
    #[error(transparent)]
    Proof(#[from] pos2_primitives::error::ProofError),
    /// A presented proof failed validation.
    #[error(transparent)]
    Validation(#[from] pos2_primitives::validator::ValidationError),
    /// Reading or writing a plot file failed.
    #[error(transparent)]
    PlotFile(#[from] pos2_format::PlotFileError),
    /// Building a plot failed.
    #[error(transparent)]
    Plot(#[from] pos2_plotter::PlotError),
    /// Scanning a plot file for a challenge failed.
    #[error(transparent)]
    Prove(#[from] pos2_prover::ProverError),
    /// Partial-proof reconstruction failed.
    #[error(transparent)]
    Solve(#[from] pos2_solver::SolverError),
    /// An argument didn't decode the way its flag promised.
    #[error("invalid {field}: {reason}")]
    InvalidArgument {
        /// Name of the offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
    /// Underlying I/O failure (opening a plot file, writing output, ...).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenient alias for fallible CLI operations.
pub type CliResult<T> = Result<T, CliError>;
