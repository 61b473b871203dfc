//! Partial-proof reconstruction.
//!
//! A "partial proof" is the 16 [`ProofFragment`]s a quality chain is built
//! from. Each fragment Feistel-decrypts losslessly into two table-2 `x_bits`
//! halves; splitting those in turn yields the 64 half-width (`k/2`-bit)
//! table-1 `x_bits` values the full 128-x proof is defined over — the upper
//! half of one x-value out of every table-1 pair. [`solve`] walks back up
//! the same table 1 → 3 pairing cascade [`pos2_primitives::core`] and
//! `pos2-plotter`'s table construction use, restricted at table 1 to the
//! known half per slot, to recover every x-value combination consistent with
//! the given fragments.
//!
//! Skips the "compress duplicate x_bits via a lookup table" step spec.md's
//! algorithm sketch describes before table-1 enumeration — a performance
//! optimization (several of the 64 slots are often equal and would otherwise
//! be searched twice), not a correctness requirement; every slot is searched
//! independently here.

pub mod error;

use pos2_primitives::consts::{
    TOTAL_PROOF_FRAGMENTS_IN_PROOF, TOTAL_T1_PAIRS_IN_PROOF, TOTAL_T2_PAIRS_IN_PROOF, TOTAL_XS_IN_PROOF,
};
use pos2_primitives::core::{
    pairing_t1, pairing_t2, pairing_t3, synthesize_matching_target, validate_match_info_pairing,
};
use pos2_primitives::fragment::{ProofFragment, ProofFragmentCodec};
use pos2_primitives::hash::ProofHashing;
use pos2_primitives::params::ProofParams;
use rayon::prelude::*;

pub use error::{SolverError, SolverResult};

/// Hard cap on the number of candidate full proofs [`solve`] will assemble.
/// A genuine plot's fragments produce one match, rarely more than a
/// handful; more than this indicates adversarial or malformed fragments.
const MAX_CANDIDATE_PROOFS: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct T1Candidate {
    xs: [u32; 2],
    meta: u64,
    match_info: u32,
}

#[derive(Debug, Clone, Copy)]
struct T2Candidate {
    xs: [u32; 4],
    meta: u64,
    match_info: u32,
}

/// Every x-value in `0..2^k`, bucketed by `(section, match_key)` read off its
/// own match_info (`g(x)`) and sorted by declared target within each bucket —
/// lets a left candidate's synthesized partner target be found by binary
/// search instead of scanning the whole domain, without materializing the
/// full two-level bucket-join `pos2-plotter` uses for bulk table construction.
struct XIndex {
    buckets: Vec<Vec<Vec<(u32, u32)>>>,
}

impl XIndex {
    fn build(hashing: &ProofHashing, params: &ProofParams) -> Self {
        let num_x = 1u64 << params.k();
        let match_infos: Vec<u32> = (0..num_x as u32).into_par_iter().map(|x| hashing.g(x)).collect();

        let num_sections = params.num_sections() as usize;
        let num_match_keys = params.num_match_keys(1) as usize;
        let mut buckets = vec![vec![Vec::new(); num_match_keys]; num_sections];
        for (x, &match_info) in match_infos.iter().enumerate() {
            let section = params.extract_section_from_match_info(u64::from(match_info)) as usize;
            let match_key = params.extract_match_key_from_match_info(1, u64::from(match_info)) as usize;
            let target = params.extract_match_target_from_match_info(1, u64::from(match_info));
            buckets[section][match_key].push((target, x as u32));
        }
        for section in &mut buckets {
            for bucket in section {
                bucket.sort_unstable_by_key(|&(t, _)| t);
            }
        }
        Self { buckets }
    }

    /// Every `x_r` that genuinely pairs with `x_l` at table 1.
    fn partners_of(&self, hashing: &ProofHashing, params: &ProofParams, x_l: u32) -> Vec<u32> {
        let meta_l = u64::from(x_l);
        let match_info_l = hashing.g(x_l);
        let section_l = params.extract_section_from_match_info(u64::from(match_info_l));
        let section_r = pos2_primitives::core::matching_section(params.num_section_bits(), section_l) as usize;

        let mut out = Vec::new();
        for match_key_r in 0..params.num_match_keys(1) {
            let target_r = synthesize_matching_target(hashing, params, 1, meta_l, match_key_r);
            let bucket = &self.buckets[section_r][match_key_r as usize];
            let start = bucket.partition_point(|&(t, _)| t < target_r);
            let end = bucket[start..].partition_point(|&(t, _)| t == target_r) + start;
            out.extend(bucket[start..end].iter().map(|&(_, x)| x));
        }
        out
    }
}

/// Every `(x_l, x_r)` table-1 candidate whose `x_l` has `known_half` as its
/// top `half_bits` bits.
fn table1_candidates_for_half(
    hashing: &ProofHashing,
    params: &ProofParams,
    index: &XIndex,
    known_half: u32,
    half_bits: u32,
) -> Vec<T1Candidate> {
    let left_candidates = 0u32..(1u32 << half_bits);

    left_candidates
        .into_par_iter()
        .flat_map_iter(|low| {
            let x_l = (known_half << half_bits) | low;
            index
                .partners_of(hashing, params, x_l)
                .into_iter()
                .filter_map(move |x_r| {
                    pairing_t1(hashing, params, x_l, x_r).map(|result| T1Candidate {
                        xs: [x_l, x_r],
                        meta: result.meta,
                        match_info: result.match_info,
                    })
                })
        })
        .collect()
}

/// Reconstruct every candidate full proof consistent with the 16 fragments a
/// quality chain was built from.
pub fn solve(
    hashing: &ProofHashing,
    params: &ProofParams,
    fragment_codec: &ProofFragmentCodec,
    fragments: &[ProofFragment; TOTAL_PROOF_FRAGMENTS_IN_PROOF],
) -> SolverResult<Vec<[u32; TOTAL_XS_IN_PROOF]>> {
    let k = params.k();
    let half_bits = k / 2;
    let half_mask = (1u32 << half_bits) - 1;

    let mut t2_xbits = [0u32; TOTAL_T2_PAIRS_IN_PROOF];
    for (i, &fragment) in fragments.iter().enumerate() {
        let (xl, xr) = fragment_codec.decode(fragment);
        t2_xbits[2 * i] = xl;
        t2_xbits[2 * i + 1] = xr;
    }

    let mut half_known = [0u32; TOTAL_T1_PAIRS_IN_PROOF];
    for (p, &xbits) in t2_xbits.iter().enumerate() {
        half_known[2 * p] = xbits >> half_bits;
        half_known[2 * p + 1] = xbits & half_mask;
    }

    tracing::debug!(k, "building x-index and reconstructing table 1 candidates for 64 half-width slots");
    let index = XIndex::build(hashing, params);

    let mut t1_candidates: Vec<Vec<T1Candidate>> = Vec::with_capacity(TOTAL_T1_PAIRS_IN_PROOF);
    for &known_half in &half_known {
        let candidates = table1_candidates_for_half(hashing, params, &index, known_half, half_bits);
        if candidates.is_empty() {
            tracing::debug!("no table-1 candidates for a required slot, no proof possible");
            return Ok(Vec::new());
        }
        t1_candidates.push(candidates);
    }

    let mut t2_candidates: Vec<Vec<T2Candidate>> = Vec::with_capacity(TOTAL_T2_PAIRS_IN_PROOF);
    for p in 0..TOTAL_T2_PAIRS_IN_PROOF {
        let left = &t1_candidates[2 * p];
        let right = &t1_candidates[2 * p + 1];
        let mut out = Vec::new();
        for l in left {
            for r in right {
                if !validate_match_info_pairing(hashing, params, 2, l.meta, l.match_info, r.match_info) {
                    continue;
                }
                if let Some(result) = pairing_t2(hashing, params, l.meta, r.meta) {
                    out.push(T2Candidate {
                        xs: [l.xs[0], l.xs[1], r.xs[0], r.xs[1]],
                        meta: result.meta,
                        match_info: result.match_info,
                    });
                }
            }
        }
        if out.is_empty() {
            return Ok(Vec::new());
        }
        t2_candidates.push(out);
    }

    let mut t3_candidates: Vec<Vec<[u32; 8]>> = Vec::with_capacity(TOTAL_PROOF_FRAGMENTS_IN_PROOF);
    for i in 0..TOTAL_PROOF_FRAGMENTS_IN_PROOF {
        let left = &t2_candidates[2 * i];
        let right = &t2_candidates[2 * i + 1];
        let target_fragment = fragments[i];
        let x_bits_l = t2_xbits[2 * i];
        let x_bits_r = t2_xbits[2 * i + 1];
        let mut out = Vec::new();
        for l in left {
            for r in right {
                if !validate_match_info_pairing(hashing, params, 3, l.meta, l.match_info, r.match_info) {
                    continue;
                }
                if let Some(fragment) = pairing_t3(hashing, params, l.meta, r.meta, x_bits_l, x_bits_r, fragment_codec)
                {
                    if fragment == target_fragment {
                        let mut xs = [0u32; 8];
                        xs[0..4].copy_from_slice(&l.xs);
                        xs[4..8].copy_from_slice(&r.xs);
                        out.push(xs);
                    }
                }
            }
        }
        if out.is_empty() {
            tracing::debug!(fragment = i, "no table-3 candidate reproduced the given fragment");
            return Ok(Vec::new());
        }
        t3_candidates.push(out);
    }

    let mut proofs = Vec::new();
    let mut current = Vec::with_capacity(TOTAL_PROOF_FRAGMENTS_IN_PROOF);
    cartesian_product(&t3_candidates, &mut current, &mut proofs)?;
    Ok(proofs)
}

/// Depth-first Cartesian product over the 16 per-fragment candidate lists,
/// assembling each combination into a single 128-x-value array in group
/// order.
fn cartesian_product(
    groups: &[Vec<[u32; 8]>],
    current: &mut Vec<[u32; 8]>,
    out: &mut Vec<[u32; TOTAL_XS_IN_PROOF]>,
) -> SolverResult<()> {
    if current.len() == groups.len() {
        if out.len() >= MAX_CANDIDATE_PROOFS {
            return Err(SolverError::TooManyMatches {
                limit: MAX_CANDIDATE_PROOFS,
            });
        }
        let mut xs = [0u32; TOTAL_XS_IN_PROOF];
        for (i, block) in current.iter().enumerate() {
            xs[i * 8..i * 8 + 8].copy_from_slice(block);
        }
        out.push(xs);
        return Ok(());
    }

    let depth = current.len();
    for &candidate in &groups[depth] {
        current.push(candidate);
        cartesian_product(groups, current, out)?;
        current.pop();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_params_and_hashing(k: u32, strength: u8) -> (ProofParams, ProofHashing) {
        let mut plot_id = [0u8; 32];
        for (i, b) in plot_id.iter_mut().enumerate() {
            *b = ((i as u32) * 13 + 7) as u8;
        }
        (ProofParams::new(plot_id, k, strength).unwrap(), ProofHashing::new(plot_id, k))
    }

    #[test]
    fn solve_does_not_panic_on_arbitrary_fragments() {
        let (params, hashing) = test_params_and_hashing(18, 4);
        let fragment_codec = ProofFragmentCodec::new(&params).unwrap();
        let mask = (1u64 << params.k()) - 1;
        let fragments = [ProofFragment(mask); TOTAL_PROOF_FRAGMENTS_IN_PROOF];

        // No claim about whether arbitrary (almost certainly never-plotted)
        // fragments solve to anything -- only that the search terminates and
        // reports either an empty result or candidate proofs, never panics.
        let _ = solve(&hashing, &params, &fragment_codec, &fragments).unwrap();
    }

    #[test]
    fn solve_recovers_the_true_xs_behind_real_plotted_fragments() {
        let (params, hashing) = test_params_and_hashing(18, 4);
        let fragment_codec = ProofFragmentCodec::new(&params).unwrap();

        let t1 = pos2_plotter::table::build_table1(&hashing, &params);
        let t2 = pos2_plotter::table::build_table2(&hashing, &params, &t1);
        let t3 = pos2_plotter::table::build_table3(&hashing, &params, &fragment_codec, &t2);
        assert!(
            t3.len() >= TOTAL_PROOF_FRAGMENTS_IN_PROOF,
            "need at least 16 surviving table-3 fragments for this test, found {}",
            t3.len()
        );

        let mut fragments = [ProofFragment(0); TOTAL_PROOF_FRAGMENTS_IN_PROOF];
        let mut expected = [0u32; TOTAL_XS_IN_PROOF];
        for i in 0..TOTAL_PROOF_FRAGMENTS_IN_PROOF {
            fragments[i] = t3[i].fragment;
            expected[i * 8..i * 8 + 8].copy_from_slice(&t3[i].xs);
        }

        let proofs = solve(&hashing, &params, &fragment_codec, &fragments).unwrap();
        assert!(!proofs.is_empty());
        assert!(proofs.contains(&expected));
    }
}
