//! Typed error taxonomy shared across the proof-of-space core.

/// Failures that can occur while deriving parameters, hashing or pairing.
///
/// Pairing *rejection* (a candidate failing a probabilistic filter) is
/// deliberately not a variant here — callers see that as `None`, not an error.
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    /// `k` is odd, out of the supported range, or otherwise not usable.
    #[error("invalid k: {0}")]
    InvalidK(u32),
    /// `strength` (table 3 match-key bits) is out of range.
    #[error("invalid strength: {0}")]
    InvalidStrength(u8),
    /// Feistel parameters don't admit distinct round keys (`3k > 256` or `k > 32`).
    #[error("feistel parameters do not admit distinct round keys for k={k}, rounds={rounds}")]
    InvalidFeistelParams {
        /// Half block width in bits.
        k: u32,
        /// Number of Feistel rounds requested.
        rounds: u32,
    },
    /// A bit width passed to the hash primitives exceeds what the primitive supports.
    #[error("unsupported bit width {0}")]
    UnsupportedBitWidth(u32),
}

/// Convenient alias for fallible core operations.
pub type ProofResult<T> = Result<T, ProofError>;
