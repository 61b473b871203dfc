//! Keyed hash primitives: the ChaCha8-based word generator `g`, the
//! BLAKE3-style single-block compression used for pairing/matching/chaining,
//! and the AES-round-based alternative hash `hash_x`.

pub mod aes_hash;
pub mod blake3_block;
pub mod chacha8;

use blake3_block::{compress_128, compress_256};
pub use blake3_block::{Result128, Result256};
use chacha8::ChaCha8Generator;

/// Table-id salts mixed into the pairing/matching compression's block words,
/// keeping table 1/2/3 pairing calls and the match-target derivation from
/// colliding even when their meta inputs happen to coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSalt(pub u32);

/// The three fields a pairing hash can produce: `match_info` (always
/// present), `meta` (present when `out_meta_bits > 0`), and `test` (present
/// when `num_test_bits > 0`). Callers that only request a subset get zeros in
/// the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PairingOutput {
    /// The match_info this pairing produces, masked to the requested width.
    pub match_info: u32,
    /// The combined meta value carried forward to the next table's pairing.
    pub meta: u64,
    /// The zero-test value a caller compares against a threshold or zero.
    pub test: u32,
}

fn mask32(value: u32, bits: u32) -> u32 {
    if bits >= 32 {
        value
    } else {
        value & ((1u32 << bits) - 1)
    }
}

fn mask64(value: u64, bits: u32) -> u64 {
    if bits >= 64 {
        value
    } else {
        value & ((1u64 << bits) - 1)
    }
}

/// Bundles the plot-id-keyed generator together with the plot id itself, since
/// every pairing/matching/chaining call also mixes in the raw plot id.
#[derive(Debug, Clone)]
pub struct ProofHashing {
    plot_id: [u8; 32],
    k: u32,
    chacha: ChaCha8Generator,
}

impl ProofHashing {
    /// Build the hashing context for a given plot id and `k`.
    pub fn new(plot_id: [u8; 32], k: u32) -> Self {
        let chacha = ChaCha8Generator::new(&plot_id, k);
        Self { plot_id, k, chacha }
    }

    /// `g(x)`: the ChaCha8-keyed word generator, masked to `k` bits.
    pub fn g(&self, x: u32) -> u32 {
        self.chacha.g(x)
    }

    /// `g_range_16(base)`: the 16-word block backing one group of `g` outputs.
    pub fn g_range_16(&self, base: u32, out: &mut [u32; 16]) {
        self.chacha.g_range_16(base, out);
    }

    fn plot_id_words(&self) -> [u32; 8] {
        let mut words = [0u32; 8];
        for (i, w) in words.iter_mut().enumerate() {
            let o = i * 4;
            *w = u32::from_le_bytes([
                self.plot_id[o],
                self.plot_id[o + 1],
                self.plot_id[o + 2],
                self.plot_id[o + 3],
            ]);
        }
        words
    }

    /// The pairing hash for `table_id`, mixing the two candidates' meta
    /// values (each `in_meta_bits` wide) with the plot id and a table-specific
    /// salt. `num_match_info_bits` is the width to mask the low-order result
    /// word to for [`PairingOutput::match_info`]; `out_meta_bits` and
    /// `num_test_bits` gate whether [`PairingOutput::meta`]/`test` are
    /// populated at all — a zero width skips computing (and masking) that
    /// field, mirroring upstream's optional trailing pairing outputs.
    ///
    /// Special case: when `num_match_info_bits == 0 && out_meta_bits == 0 &&
    /// num_test_bits > 0`, the test value is read from the *first* result word
    /// rather than the fourth — table 5's pairing is test-only and has no
    /// match_info/meta to occupy that slot first.
    pub fn pairing(
        &self,
        salt: TableSalt,
        meta_l: u64,
        meta_r: u64,
        in_meta_bits: u32,
        num_match_info_bits: u32,
        out_meta_bits: u32,
        num_test_bits: u32,
    ) -> PairingOutput {
        let mut block = [0u32; 16];
        block[0..8].copy_from_slice(&self.plot_id_words());
        block[8] = salt.0;
        if in_meta_bits <= 32 {
            block[9] = meta_l as u32;
            block[10] = meta_r as u32;
        } else {
            block[9] = meta_l as u32;
            block[10] = (meta_l >> 32) as u32;
            block[11] = meta_r as u32;
            block[12] = (meta_r >> 32) as u32;
        }
        let res = compress_256(&block);

        if num_match_info_bits == 0 && out_meta_bits == 0 && num_test_bits > 0 {
            return PairingOutput {
                match_info: 0,
                meta: 0,
                test: mask32(res[0], num_test_bits),
            };
        }

        let match_info = mask32(res[0], num_match_info_bits);
        if out_meta_bits == 0 {
            return PairingOutput { match_info, meta: 0, test: 0 };
        }
        let meta_raw = u64::from(res[1]) | (u64::from(res[2]) << 32);
        let meta = mask64(meta_raw, out_meta_bits);
        if num_test_bits == 0 {
            return PairingOutput { match_info, meta, test: 0 };
        }
        let test = mask32(res[3], num_test_bits);
        PairingOutput { match_info, meta, test }
    }

    /// The matching-target hash for `table_id`: the `num_target_bits`-wide
    /// value a candidate declaring `match_key` against `meta` (`num_meta_bits`
    /// wide) must hit for a partner to accept it.
    pub fn matching_target(
        &self,
        salt: TableSalt,
        match_key: u32,
        meta: u64,
        num_meta_bits: u32,
        num_target_bits: u32,
    ) -> u32 {
        let mut block = [0u32; 16];
        block[0..8].copy_from_slice(&self.plot_id_words());
        block[8] = salt.0;
        block[9] = match_key;
        block[10] = meta as u32;
        if num_meta_bits > 32 {
            block[11] = (meta >> 32) as u32;
        }
        let out = compress_128(&block);
        mask32(out[0], num_target_bits)
    }

    /// Derive a challenge-and-plot-id-bound hash, the entry point both
    /// `challengeWithPlotIdHash` and its grouped-plot-id variant resolve to
    /// (see DESIGN.md: this crate does not implement plot grouping, so the two
    /// are one and the same function here).
    pub fn challenge_with_plot_id_hash(&self, challenge: &[u8; 32]) -> Result256 {
        let mut block = [0u32; 16];
        for (i, w) in block[0..8].iter_mut().enumerate() {
            let o = i * 4;
            *w = u32::from_le_bytes([
                challenge[o],
                challenge[o + 1],
                challenge[o + 2],
                challenge[o + 3],
            ]);
        }
        block[8..16].copy_from_slice(&self.plot_id_words());
        compress_256(&block)
    }

    /// Extend a quality chain by one link: hash the previous link's state
    /// together with the proof fragment and the 0-based link iteration.
    ///
    /// Block-word layout (frozen per the grounding ledger): words 0..7 carry
    /// `prev.r` (the previous link's upper half), word 8/9 carry the fragment
    /// split low/high, word 10 carries the iteration index, words 11..15 are
    /// zero.
    pub fn link_hash(&self, prev: &Result256, fragment: u64, iteration: u32) -> Result256 {
        let mut block = [0u32; 16];
        block[0..8].copy_from_slice(&prev[0..8]);
        block[8] = fragment as u32;
        block[9] = (fragment >> 32) as u32;
        block[10] = iteration;
        compress_256(&block)
    }

    /// `k` this hashing context was constructed with.
    pub fn k(&self) -> u32 {
        self.k
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regression_plot_id() -> [u8; 32] {
        let mut id = [0u8; 32];
        for (i, b) in id.iter_mut().enumerate() {
            *b = ((i as u32) * 11 + 5) as u8;
        }
        id
    }

    #[test]
    fn pairing_is_deterministic_and_salt_sensitive() {
        let hashing = ProofHashing::new(regression_plot_id(), 24);
        let a = hashing.pairing(TableSalt(1), 10, 20, 48, 24, 48, 0);
        let b = hashing.pairing(TableSalt(1), 10, 20, 48, 24, 48, 0);
        let c = hashing.pairing(TableSalt(2), 10, 20, 48, 24, 48, 0);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn pairing_test_only_special_case_reads_first_word() {
        let hashing = ProofHashing::new(regression_plot_id(), 24);
        let full = hashing.pairing(TableSalt(5), 10, 20, 48, 0, 0, 32);
        assert_eq!(full.match_info, 0);
        assert_eq!(full.meta, 0);
        // Distinguishable from the ordinary (match_info, meta, test) path,
        // which would instead read the fourth result word.
        let ordinary = hashing.pairing(TableSalt(5), 10, 20, 48, 24, 48, 32);
        assert_ne!(full.test, ordinary.test);
    }

    #[test]
    fn matching_target_is_match_key_sensitive() {
        let hashing = ProofHashing::new(regression_plot_id(), 24);
        let a = hashing.matching_target(TableSalt(1), 0, 0x1234, 24, 16);
        let b = hashing.matching_target(TableSalt(1), 1, 0x1234, 24, 16);
        assert_ne!(a, b);
    }

    #[test]
    fn link_hash_chains_depend_on_iteration() {
        let hashing = ProofHashing::new(regression_plot_id(), 24);
        let prev = hashing.challenge_with_plot_id_hash(&[7u8; 32]);
        let a = hashing.link_hash(&prev, 99, 0);
        let b = hashing.link_hash(&prev, 99, 1);
        assert_ne!(a, b);
    }
}
