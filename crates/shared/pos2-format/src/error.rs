//! Typed errors for the on-disk plot file format.

/// Failures reading or writing a plot file.
#[derive(Debug, thiserror::Error)]
pub enum PlotFileError {
    /// Underlying I/O failure.
    #[error("plot file I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The file doesn't start with the `"pos2"` magic.
    #[error("not a pos2 plot file")]
    BadMagic,
    /// An on-disk format version this build doesn't understand.
    #[error("unsupported plot format version {0}")]
    UnsupportedVersion(u8),
    /// A delta value exceeded the `stub_bits`-complement byte range the
    /// per-chunk delta/stub split can represent.
    #[error("delta {delta} does not fit in the chunk's stub width ({stub_bits} bits)")]
    DeltaOverflow {
        /// The delta value that didn't fit.
        delta: u64,
        /// The configured stub width in bits.
        stub_bits: u32,
    },
    /// A requested fragment range crossed a chunk boundary; queries must stay
    /// within a single chunk's span.
    #[error("range does not fit within a single chunk")]
    RangeCrossesChunk,
    /// A chunk index was out of bounds.
    #[error("chunk index {index} out of bounds ({num_chunks} chunks)")]
    ChunkIndexOutOfBounds {
        /// Requested index.
        index: u64,
        /// Total number of chunks in the file.
        num_chunks: u64,
    },
    /// The entropy-coded byte stream was truncated or malformed.
    #[error("corrupt entropy-coded stream")]
    CorruptStream,
}

/// Convenient alias for fallible plot file operations.
pub type PlotFileResult<T> = Result<T, PlotFileError>;
