//! Recomputes the table 1 → 3 pairing cascade from a proof's raw x-values,
//! confirming each ancestor pair actually matches rather than trusting the
//! plot file's bookkeeping, then assembles and validates the resulting
//! 16-fragment quality chain.

use crate::chain::{self, Chain};
use crate::consts::{NUM_CHAIN_LINKS, TOTAL_PROOF_FRAGMENTS_IN_PROOF};
use crate::core::{pairing_t1, pairing_t2, pairing_t3, validate_match_info_pairing, PairingResult};
use crate::fragment::{ProofFragment, ProofFragmentCodec};
use crate::hash::{ProofHashing, Result256};
use crate::params::{ProofParams, Range};

/// Why a proof failed to validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required pairing at the given table id did not match.
    #[error("table {table_id} pairing did not match")]
    PairingMismatch {
        /// 1-based table id (1..=3) whose pairing failed to reproduce.
        table_id: u32,
    },
    /// The quality chain the recovered fragments form did not validate.
    #[error("chain did not validate")]
    ChainMismatch,
}

/// Validate a single table-1 pair of x-values: both sides' own match_info
/// (`g(x)`) must genuinely pair before the pairing hash itself is even
/// computed.
pub fn validate_table_1_pair(
    hashing: &ProofHashing,
    params: &ProofParams,
    x_l: u32,
    x_r: u32,
) -> Result<PairingResult, ValidationError> {
    let match_info_l = hashing.g(x_l);
    let match_info_r = hashing.g(x_r);
    if !validate_match_info_pairing(hashing, params, 1, u64::from(x_l), match_info_l, match_info_r) {
        return Err(ValidationError::PairingMismatch { table_id: 1 });
    }
    pairing_t1(hashing, params, x_l, x_r).ok_or(ValidationError::PairingMismatch { table_id: 1 })
}

/// Validate the two table-1 pairs underneath one table-2 pair, then the
/// table-2 pairing itself, from 4 x-values.
pub fn validate_table_2_pairs(
    hashing: &ProofHashing,
    params: &ProofParams,
    xs: &[u32; 4],
) -> Result<PairingResult, ValidationError> {
    let left = validate_table_1_pair(hashing, params, xs[0], xs[1])?;
    let right = validate_table_1_pair(hashing, params, xs[2], xs[3])?;
    if !validate_match_info_pairing(hashing, params, 2, left.meta, left.match_info, right.match_info) {
        return Err(ValidationError::PairingMismatch { table_id: 2 });
    }
    pairing_t2(hashing, params, left.meta, right.meta).ok_or(ValidationError::PairingMismatch { table_id: 2 })
}

/// Validate the table-2 pairs and the table-3 pairing above them, from 8
/// x-values, returning the resulting proof fragment.
pub fn validate_table_3_pairs(
    hashing: &ProofHashing,
    params: &ProofParams,
    fragment_codec: &ProofFragmentCodec,
    xs: &[u32; 8],
) -> Result<ProofFragment, ValidationError> {
    let left_xs: [u32; 4] = xs[0..4].try_into().unwrap();
    let right_xs: [u32; 4] = xs[4..8].try_into().unwrap();
    let left = validate_table_2_pairs(hashing, params, &left_xs)?;
    let right = validate_table_2_pairs(hashing, params, &right_xs)?;
    if !validate_match_info_pairing(hashing, params, 3, left.meta, left.match_info, right.match_info) {
        return Err(ValidationError::PairingMismatch { table_id: 3 });
    }
    let x_bits_l = left.x_bits.expect("table-2 pairing always yields x_bits");
    let x_bits_r = right.x_bits.expect("table-2 pairing always yields x_bits");
    pairing_t3(hashing, params, left.meta, right.meta, x_bits_l, x_bits_r, fragment_codec)
        .ok_or(ValidationError::PairingMismatch { table_id: 3 })
}

/// Validate a full 128-x-value proof: 16 table-3 pairs, each recomputed from
/// 8 x-values into a [`ProofFragment`] with every ancestor pairing re-checked
/// bottom-up against its own match_info, assembled into a [`Chain`] and
/// checked against the challenge's two chaining-set ranges.
///
/// Table 4/5 construction plays no part here — those exist only to prune a
/// plot file at write time, never to re-derive a presented proof.
pub fn validate_full_proof(
    hashing: &ProofHashing,
    params: &ProofParams,
    fragment_codec: &ProofFragmentCodec,
    xs: &[u32; 128],
    initial_challenge: &Result256,
    range_a: Range,
    range_b: Range,
) -> Result<Chain, ValidationError> {
    let mut fragments = [ProofFragment(0); TOTAL_PROOF_FRAGMENTS_IN_PROOF];
    for i in 0..TOTAL_PROOF_FRAGMENTS_IN_PROOF {
        let chunk: [u32; 8] = xs[i * 8..i * 8 + 8].try_into().unwrap();
        fragments[i] = validate_table_3_pairs(hashing, params, fragment_codec, &chunk)?;
    }

    let chain = Chain { fragments };
    let chaining_set_bits = params.chaining_set_bits();
    if !chain::validate(
        hashing,
        &chain,
        initial_challenge,
        chaining_set_bits,
        range_a,
        range_b,
    ) {
        return Err(ValidationError::ChainMismatch);
    }
    debug_assert_eq!(chain.fragments.len(), NUM_CHAIN_LINKS);
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_params_and_hashing(k: u32) -> (ProofParams, ProofHashing) {
        let mut plot_id = [0u8; 32];
        for (i, b) in plot_id.iter_mut().enumerate() {
            *b = ((i as u32) * 29 + 5) as u8;
        }
        (ProofParams::new(plot_id, k, 4).unwrap(), ProofHashing::new(plot_id, k))
    }

    #[test]
    fn validate_table_1_pair_accepts_a_genuinely_matching_pair() {
        let (params, hashing) = test_params_and_hashing(18);
        let mut found = None;
        'search: for x_l in 0u32..512 {
            for x_r in 0u32..8192 {
                if pairing_t1(&hashing, &params, x_l, x_r).is_none() {
                    continue;
                }
                let match_info_l = hashing.g(x_l);
                let match_info_r = hashing.g(x_r);
                if validate_match_info_pairing(&hashing, &params, 1, u64::from(x_l), match_info_l, match_info_r) {
                    found = Some((x_l, x_r));
                    break 'search;
                }
            }
        }
        let (x_l, x_r) = found.expect("expected a genuinely matching table-1 pair in range");
        assert!(validate_table_1_pair(&hashing, &params, x_l, x_r).is_ok());
    }

    #[test]
    fn validate_table_1_pair_rejects_an_unrelated_pair() {
        let (params, hashing) = test_params_and_hashing(18);
        if let Err(err) = validate_table_1_pair(&hashing, &params, 5, 5) {
            assert_eq!(err, ValidationError::PairingMismatch { table_id: 1 });
        }
    }
}
