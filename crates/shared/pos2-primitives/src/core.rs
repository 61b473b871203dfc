//! Section bucketing, match filters, the per-table pairing functions that
//! decide whether two candidates from adjacent tables combine into a match,
//! and the two-sided match_info check that confirms two already-known
//! match_info values actually pair.

use crate::fragment::{ProofFragment, ProofFragmentCodec};
use crate::hash::{ProofHashing, TableSalt};
use crate::params::ProofParams;

/// Rotate `section` by one step within a `num_section_bits`-wide ring and
/// advance it by one modulo `num_sections` — the forward direction used when
/// deriving a partner's expected section from a candidate's own section.
pub fn matching_section(num_section_bits: u32, section: u32) -> u32 {
    let num_sections = 1u32 << num_section_bits;
    let mask = num_sections - 1;
    let rotated_left = ((section << 1) | (section >> (num_section_bits - 1))) & mask;
    let rotated_left_plus_1 = (rotated_left + 1) & mask;
    ((rotated_left_plus_1 >> 1) | (rotated_left_plus_1 << (num_section_bits - 1))) & mask
}

/// Inverse of [`matching_section`]: recovers a candidate's own section given
/// its partner's expected section.
pub fn inverse_matching_section(num_section_bits: u32, section: u32) -> u32 {
    let num_sections = 1u32 << num_section_bits;
    let mask = num_sections - 1;
    let rotated_left = ((section << 1) | (section >> (num_section_bits - 1))) & mask;
    let rotated_left_minus_1 = rotated_left.wrapping_sub(1) & mask;
    ((rotated_left_minus_1 >> 1) | (rotated_left_minus_1 << (num_section_bits - 1))) & mask
}

/// Cheap pre-filter: XOR-fold the low 16 bits of `(a + b)^2` down to 4 bits and
/// compare against zero. Rejects most non-matching pairs before the expensive
/// pairing hash runs.
pub fn match_filter_4(a: u32, b: u32) -> bool {
    let sum = a.wrapping_add(b);
    let squared = sum.wrapping_mul(sum) & 0xFFFF;
    let folded = (squared ^ (squared >> 4) ^ (squared >> 8) ^ (squared >> 12)) & 0xF;
    folded == 0
}

/// As [`match_filter_4`], but folds down to 16 bits instead of 4 — an
/// alternative, lower-rejection-rate filter kept for completeness and tested,
/// though no pairing function currently wires it in (mirroring the upstream
/// implementation, which also keeps it unused alongside `match_filter_4`).
pub fn match_filter_16(a: u32, b: u32) -> bool {
    let sum = a.wrapping_add(b);
    let squared = sum.wrapping_mul(sum) & 0xFFFF_FFFF;
    let folded = squared ^ (squared >> 16);
    folded == 0
}

/// Outcome of a successful table-1/2/4 pairing: the combined meta value to
/// carry forward, this candidate's own match_info (the next table's
/// bucketing key), and — for table 2 only — the `x_bits` half propagated on
/// to table 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairingResult {
    /// Combined meta value. Raw `x_l‖x_r` concatenation at table 1;
    /// hash-derived at tables 2 and 4.
    pub meta: u64,
    /// This pair's own match_info: `section ‖ match_key ‖ target`, `k` bits.
    pub match_info: u32,
    /// Table 2's `x_bits` output (top `k/2` bits of each parent x-pair's
    /// first x-value, concatenated): `Some` only for table-2 results.
    pub x_bits: Option<u32>,
}

fn salt_for(table_id: u32) -> TableSalt {
    TableSalt(table_id)
}

/// Synthesize the match_info target a candidate presenting `meta` expects
/// from a partner declaring `match_key`, for `table_id`'s bucketing scheme.
pub fn synthesize_matching_target(
    hashing: &ProofHashing,
    params: &ProofParams,
    table_id: u32,
    meta: u64,
    match_key: u32,
) -> u32 {
    hashing.matching_target(
        salt_for(table_id),
        match_key,
        meta,
        params.num_meta_bits(table_id),
        params.num_match_target_bits(table_id),
    )
}

/// Confirm that `match_info_r` is a genuine partner for a left candidate
/// presenting `meta_l`/`match_info_l` at `table_id`: the right side's section
/// must be `meta_l`'s matching section, and the right side's declared target
/// must equal the target `meta_l` synthesizes for the right's own match_key.
///
/// This is the two-sided check table construction's bucketing guarantees by
/// construction, but which a verifier recomputing match_info bottom-up from
/// raw x-values must check explicitly.
pub fn validate_match_info_pairing(
    hashing: &ProofHashing,
    params: &ProofParams,
    table_id: u32,
    meta_l: u64,
    match_info_l: u32,
    match_info_r: u32,
) -> bool {
    let section_l = params.extract_section_from_match_info(u64::from(match_info_l));
    let section_r = params.extract_section_from_match_info(u64::from(match_info_r));
    if section_r != matching_section(params.num_section_bits(), section_l) {
        return false;
    }
    let match_key_r = params.extract_match_key_from_match_info(table_id, u64::from(match_info_r));
    let match_target_r = params.extract_match_target_from_match_info(table_id, u64::from(match_info_r));
    match_target_r == synthesize_matching_target(hashing, params, table_id, meta_l, match_key_r)
}

/// Try to pair two table-1 (x-value) candidates. Unlike every other table,
/// the resulting meta is the raw `x_l‖x_r` concatenation rather than a hash
/// output — table 2 needs direct access to the x-value bits to derive its
/// own `x_bits` field.
pub fn pairing_t1(hashing: &ProofHashing, params: &ProofParams, x_l: u32, x_r: u32) -> Option<PairingResult> {
    if !match_filter_4(x_l, x_r) {
        return None;
    }
    let k = params.k();
    let out = hashing.pairing(salt_for(1), u64::from(x_l), u64::from(x_r), k, k, 0, 0);
    let meta = (u64::from(x_l) << k) | u64::from(x_r);
    Some(PairingResult {
        meta,
        match_info: out.match_info,
        x_bits: None,
    })
}

/// The top `k/2` bits of the top `k` bits of a `2k`-bit meta value — i.e. the
/// upper half of that meta's originating x-value.
fn meta_x_bits_component(meta: u64, k: u32) -> u32 {
    let half = k / 2;
    ((meta >> (k + half)) & ((1u64 << half) - 1)) as u32
}

/// Try to pair two table-2 candidates, producing both the combined meta for
/// table 3 and the `x_bits` half table 3 needs to build its proof fragment.
pub fn pairing_t2(hashing: &ProofHashing, params: &ProofParams, meta_l: u64, meta_r: u64) -> Option<PairingResult> {
    if !match_filter_4(meta_l as u32, meta_r as u32) {
        return None;
    }
    let in_bits = params.num_pairing_meta_bits();
    let k = params.k();
    let out = hashing.pairing(salt_for(2), meta_l, meta_r, in_bits, k, in_bits, 0);
    let half = k / 2;
    let x_bits = (meta_x_bits_component(meta_l, k) << half) | meta_x_bits_component(meta_r, k);
    Some(PairingResult {
        meta: out.meta,
        match_info: out.match_info,
        x_bits: Some(x_bits),
    })
}

/// Try to pair two table-3 candidates. Table 3 additionally requires an
/// exact, `strength`-bit zero test on the pairing hash's low bits, and on
/// success encrypts the two parents' `x_bits` into a [`ProofFragment`]. Table
/// 3 carries no match_info or meta of its own forward — the fragment is the
/// only payload table 4 construction needs.
pub fn pairing_t3(
    hashing: &ProofHashing,
    params: &ProofParams,
    meta_l: u64,
    meta_r: u64,
    x_bits_l: u32,
    x_bits_r: u32,
    fragment_codec: &ProofFragmentCodec,
) -> Option<ProofFragment> {
    if !match_filter_4(meta_l as u32, meta_r as u32) {
        return None;
    }
    let in_bits = params.num_pairing_meta_bits();
    let strength = u32::from(params.strength());
    let out = hashing.pairing(salt_for(3), meta_l, meta_r, in_bits, 0, 0, strength);
    if out.test != 0 {
        return None;
    }
    Some(fragment_codec.encode(x_bits_l, x_bits_r))
}

/// Table-4 threshold: the pairing hash's test word must fall below a
/// calibrated value tuning table 4's output rate.
const T4_THRESHOLD: u32 = 0x1999_9999;

/// Try to pair two table-4 candidates. `order_bits_l` is the left fragment's
/// order bit pair (from [`ProofFragmentCodec::order_bits`]); its low bit
/// becomes the resulting match_info's top bit, with the remaining `k - 1`
/// bits coming from the pairing hash.
pub fn pairing_t4(
    hashing: &ProofHashing,
    params: &ProofParams,
    meta_l: u64,
    meta_r: u64,
    order_bits_l: u32,
) -> Option<PairingResult> {
    if !match_filter_4(meta_l as u32, meta_r as u32) {
        return None;
    }
    let in_bits = params.num_pairing_meta_bits();
    let k = params.k();
    let out = hashing.pairing(salt_for(4), meta_l, meta_r, in_bits, k - 1, in_bits, 32);
    if out.test >= T4_THRESHOLD {
        return None;
    }
    let match_info = ((order_bits_l & 1) << (k - 1)) | out.match_info;
    Some(PairingResult {
        meta: out.meta,
        match_info,
        x_bits: None,
    })
}

/// Table-5 threshold: roughly 39.85% acceptance rate on the pairing hash's
/// test word, expressed (as upstream does) as a doubled 31-bit constant.
const T5_THRESHOLD: u64 = 855_570_511 << 1;

/// Try to pair two table-5 candidates. Table 5 is terminal: a surviving pair
/// produces no payload of its own, only the back-pointer the plotter stashes.
pub fn pairing_t5(hashing: &ProofHashing, params: &ProofParams, meta_l: u64, meta_r: u64) -> bool {
    if !match_filter_4(meta_l as u32, meta_r as u32) {
        return false;
    }
    let in_bits = params.num_pairing_meta_bits();
    let out = hashing.pairing(salt_for(5), meta_l, meta_r, in_bits, 0, 0, 32);
    u64::from(out.test) < T5_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_params_and_hashing(k: u32) -> (ProofParams, ProofHashing) {
        let mut plot_id = [0u8; 32];
        for (i, b) in plot_id.iter_mut().enumerate() {
            *b = ((i as u32) * 11 + 5) as u8;
        }
        (
            ProofParams::new(plot_id, k, 8).unwrap(),
            ProofHashing::new(plot_id, k),
        )
    }

    #[test]
    fn matching_section_known_values() {
        // Ground truth: matching_section(num_section_bits=3, section=0) == 4.
        assert_eq!(matching_section(3, 0), 4);
        assert_eq!(inverse_matching_section(3, 4), 0);
    }

    #[test]
    fn matching_section_round_trips() {
        for bits in 2..=8 {
            for s in 0..(1u32 << bits) {
                let fwd = matching_section(bits, s);
                assert_eq!(inverse_matching_section(bits, fwd), s);
            }
        }
    }

    #[test]
    fn matching_section_is_not_a_plain_rotation() {
        // A pure rotate-left-1/rotate-right-1 pair would satisfy the round
        // trip test above too, without the +1/-1 step actually mattering.
        // Confirm the +1 step really changes the result versus a bare rotate.
        for bits in 2..=8 {
            for s in 0..(1u32 << bits) {
                let mask = (1u32 << bits) - 1;
                let plain_rotate = ((s << 1) | (s >> (bits - 1))) & mask;
                if plain_rotate != mask {
                    assert_ne!(matching_section(bits, s), plain_rotate);
                }
            }
        }
    }

    #[test]
    fn match_filter_4_accepts_equal_and_opposite_pairs() {
        assert!(match_filter_4(0, 0));
    }

    #[test]
    fn pairing_t1_meta_is_raw_x_concatenation() {
        let (params, hashing) = test_params_and_hashing(24);
        for x in 0u32..4096 {
            if let Some(r) = pairing_t1(&hashing, &params, x, x.wrapping_add(1)) {
                assert_eq!(r.meta, (u64::from(x) << 24) | u64::from(x + 1));
                return;
            }
        }
        panic!("no table-1 pairing found in search range");
    }

    #[test]
    fn pairing_is_deterministic() {
        let (params, hashing) = test_params_and_hashing(24);
        for x in 0u32..8 {
            let a = pairing_t1(&hashing, &params, x, x + 1);
            let b = pairing_t1(&hashing, &params, x, x + 1);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn validate_match_info_pairing_accepts_a_candidates_matching_target() {
        let (params, hashing) = test_params_and_hashing(18);
        let meta_l = 0x2468u64;
        let match_info_l = hashing.g(meta_l as u32);
        let section_l = params.extract_section_from_match_info(u64::from(match_info_l));
        let section_r = matching_section(params.num_section_bits(), section_l);
        let match_key_r = 0u32;
        let target_r = synthesize_matching_target(&hashing, &params, 1, meta_l, match_key_r);
        let match_key_bits = params.num_match_key_bits(1);
        let match_info_r = (section_r << (params.k() - params.num_section_bits()))
            | (match_key_r << params.num_match_target_bits(1))
            | target_r;
        let _ = match_key_bits;
        assert!(validate_match_info_pairing(
            &hashing,
            &params,
            1,
            meta_l,
            match_info_l,
            match_info_r
        ));
    }

    #[test]
    fn validate_match_info_pairing_rejects_a_wrong_section() {
        let (params, hashing) = test_params_and_hashing(18);
        let meta_l = 0x2468u64;
        let match_info_l = hashing.g(meta_l as u32);
        // A match_info built entirely from zero bits is extremely unlikely to
        // land in the actual matching section.
        assert!(!validate_match_info_pairing(&hashing, &params, 1, meta_l, match_info_l, 0));
    }
}
