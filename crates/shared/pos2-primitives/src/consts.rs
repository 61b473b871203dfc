//! Compile-time tunables. All of these are part of the plot format contract —
//! changing any of them invalidates every previously written plot file.

/// Total number of x-values backing a full proof.
pub const TOTAL_XS_IN_PROOF: usize = 128;
/// Total number of table-1 pairs backing a full proof.
pub const TOTAL_T1_PAIRS_IN_PROOF: usize = 64;
/// Total number of table-2 pairs backing a full proof.
pub const TOTAL_T2_PAIRS_IN_PROOF: usize = 32;
/// Total number of table-3 pairs backing a full proof.
pub const TOTAL_T3_PAIRS_IN_PROOF: usize = 16;
/// Total number of proof fragments backing a full proof (one per table-3 pair).
pub const TOTAL_PROOF_FRAGMENTS_IN_PROOF: usize = 16;

/// Depth of a quality chain.
pub const NUM_CHAIN_LINKS: usize = 16;
/// Expected proofs per challenge is `1 / 2^AVERAGE_PROOFS_PER_CHALLENGE_BITS`.
pub const AVERAGE_PROOFS_PER_CHALLENGE_BITS: u32 = 5;

/// Width, in bits, of the scan range / chaining-set range above `2^k`: each
/// range spans `2^(k + PROOF_FRAGMENT_SCAN_FILTER_RANGE_BITS)` fragment values.
pub const PROOF_FRAGMENT_SCAN_FILTER_RANGE_BITS: u32 = 13;

/// Default Feistel round count.
pub const DEFAULT_FEISTEL_ROUNDS: usize = 4;

/// Minus this many bits from `k` to get the stub width used by the plot file codec.
pub const PLOT_FILE_MINUS_STUB_BITS: u32 = 2;

/// Each plot-file chunk spans this many bits of fragment value range above `2^k`.
pub const PLOT_FILE_CHUNK_SPAN_RANGE_BITS: u32 = 16;

/// Baseline on-disk format version.
pub const PLOT_FORMAT_VERSION: u8 = 1;
/// Format version used when the "retain x-values to T3" debug mode is enabled.
pub const PLOT_FORMAT_VERSION_RETAIN_X: u8 = 3;
