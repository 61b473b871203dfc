//! Table construction for tables 1 through 3: each level buckets the previous
//! level's survivors by `(section, match_key)`, merge-joins each section
//! against its matching section via [`matchjoin::join_section`], and hands
//! genuine candidate pairs to the real pairing function.
//!
//! Kept as three concretely-typed functions rather than one generic one:
//! each level produces a differently-shaped node (table 2 additionally
//! carries `x_bits`, table 3 produces the actual [`ProofFragment`] and
//! carries both its parents' match_info instead of one of its own), and
//! writing that out plainly is clearer than threading it through generics.

use crate::matchjoin::{bucket_by_section_and_match_key, join_section};
use crate::xgen;
use pos2_primitives::core::{pairing_t1, pairing_t2, pairing_t3};
use pos2_primitives::fragment::{ProofFragment, ProofFragmentCodec};
use pos2_primitives::hash::ProofHashing;
use pos2_primitives::params::ProofParams;
use rayon::prelude::*;

/// A surviving table-1 pair: its combined meta, its own match_info (table
/// 2's bucketing key), and the two x-values behind it.
#[derive(Debug, Clone, Copy)]
pub struct T1Node {
    /// `(x_l << k) | x_r`.
    pub meta: u64,
    /// This pair's own match_info, input to table 2's bucketing.
    pub match_info: u32,
    /// The pair's x-values, in order.
    pub xs: [u32; 2],
}

/// A surviving table-2 pair.
#[derive(Debug, Clone, Copy)]
pub struct T2Node {
    /// Hash-derived combined meta, input to table 3's pairing.
    pub meta: u64,
    /// This pair's own match_info, input to table 3's bucketing.
    pub match_info: u32,
    /// The `x_bits` half table 3 needs to build its proof fragment.
    pub x_bits: u32,
    /// The four x-values behind this pair, in order.
    pub xs: [u32; 4],
}

/// A surviving table-3 pair: the actual on-disk [`ProofFragment`], plus both
/// parents' own `(meta, match_info)` — table 3 produces no match_info of its
/// own, so table-4 construction buckets directly off whichever parent a
/// fragment's encrypted bits route to.
#[derive(Debug, Clone, Copy)]
pub struct T3Node {
    /// The fragment a validator or solver would recompute from `xs`.
    pub fragment: ProofFragment,
    /// The eight x-values behind this pair, in order.
    pub xs: [u32; 8],
    /// Left table-2 parent's own meta.
    pub meta_l: u64,
    /// Left table-2 parent's own match_info.
    pub match_info_l: u32,
    /// Right table-2 parent's own meta.
    pub meta_r: u64,
    /// Right table-2 parent's own match_info.
    pub match_info_r: u32,
}

/// Build every surviving table-1 pair over the full `0..2^k` x-value range.
/// Sections are independent join problems, so the per-section loop runs
/// data-parallel.
pub fn build_table1(hashing: &ProofHashing, params: &ProofParams) -> Vec<T1Node> {
    let candidates = xgen::generate_x_candidates(hashing, params);
    let match_infos: Vec<u32> = candidates.iter().map(|c| c.match_info).collect();
    let buckets = bucket_by_section_and_match_key(params, 1, &match_infos);

    (0..params.num_sections())
        .into_par_iter()
        .flat_map_iter(|section_l| {
            let pairs = join_section(
                hashing,
                params,
                1,
                section_l,
                &buckets,
                |i| u64::from(candidates[i].x),
                |i| match_infos[i],
            );
            pairs.into_iter().filter_map(move |(li, ri)| {
                let x_l = candidates[li].x;
                let x_r = candidates[ri].x;
                pairing_t1(hashing, params, x_l, x_r).map(|result| T1Node {
                    meta: result.meta,
                    match_info: result.match_info,
                    xs: [x_l, x_r],
                })
            })
        })
        .collect()
}

/// Build every surviving table-2 pair from table 1's survivors.
pub fn build_table2(hashing: &ProofHashing, params: &ProofParams, t1: &[T1Node]) -> Vec<T2Node> {
    let match_infos: Vec<u32> = t1.iter().map(|n| n.match_info).collect();
    let buckets = bucket_by_section_and_match_key(params, 2, &match_infos);

    (0..params.num_sections())
        .into_par_iter()
        .flat_map_iter(|section_l| {
            let pairs = join_section(hashing, params, 2, section_l, &buckets, |i| t1[i].meta, |i| match_infos[i]);
            pairs.into_iter().filter_map(move |(li, ri)| {
                let left = &t1[li];
                let right = &t1[ri];
                pairing_t2(hashing, params, left.meta, right.meta).map(|result| T2Node {
                    meta: result.meta,
                    match_info: result.match_info,
                    x_bits: result.x_bits.expect("table-2 pairing always yields x_bits"),
                    xs: [left.xs[0], left.xs[1], right.xs[0], right.xs[1]],
                })
            })
        })
        .collect()
}

/// Build every surviving table-3 pair (one [`ProofFragment`] each) from table
/// 2's survivors.
pub fn build_table3(
    hashing: &ProofHashing,
    params: &ProofParams,
    fragment_codec: &ProofFragmentCodec,
    t2: &[T2Node],
) -> Vec<T3Node> {
    let match_infos: Vec<u32> = t2.iter().map(|n| n.match_info).collect();
    let buckets = bucket_by_section_and_match_key(params, 3, &match_infos);

    (0..params.num_sections())
        .into_par_iter()
        .flat_map_iter(|section_l| {
            let pairs = join_section(hashing, params, 3, section_l, &buckets, |i| t2[i].meta, |i| match_infos[i]);
            pairs.into_iter().filter_map(move |(li, ri)| {
                let left = &t2[li];
                let right = &t2[ri];
                pairing_t3(
                    hashing,
                    params,
                    left.meta,
                    right.meta,
                    left.x_bits,
                    right.x_bits,
                    fragment_codec,
                )
                .map(|fragment| {
                    let mut xs = [0u32; 8];
                    xs[0..4].copy_from_slice(&left.xs);
                    xs[4..8].copy_from_slice(&right.xs);
                    T3Node {
                        fragment,
                        xs,
                        meta_l: left.meta,
                        match_info_l: left.match_info,
                        meta_r: right.meta,
                        match_info_r: right.match_info,
                    }
                })
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pos2_primitives::core::validate_match_info_pairing;

    fn test_params_and_hashing(k: u32) -> (ProofParams, ProofHashing) {
        let mut plot_id = [0u8; 32];
        for (i, b) in plot_id.iter_mut().enumerate() {
            *b = ((i as u32) * 13 + 1) as u8;
        }
        (ProofParams::new(plot_id, k, 6).unwrap(), ProofHashing::new(plot_id, k))
    }

    #[test]
    fn table1_survivors_reproduce_under_pairing_t1_and_genuinely_pair() {
        let (params, hashing) = test_params_and_hashing(18);
        let t1 = build_table1(&hashing, &params);
        assert!(!t1.is_empty());
        for node in &t1 {
            assert_eq!(node.meta, (u64::from(node.xs[0]) << params.k()) | u64::from(node.xs[1]));
            let match_info_l = hashing.g(node.xs[0]);
            let match_info_r = hashing.g(node.xs[1]);
            assert!(validate_match_info_pairing(
                &hashing,
                &params,
                1,
                u64::from(node.xs[0]),
                match_info_l,
                match_info_r
            ));
        }
    }

    #[test]
    fn table3_survivors_carry_eight_distinct_xs_worth_of_provenance() {
        let (params, hashing) = test_params_and_hashing(18);
        let codec = ProofFragmentCodec::new(&params).unwrap();
        let t1 = build_table1(&hashing, &params);
        let t2 = build_table2(&hashing, &params, &t1);
        let t3 = build_table3(&hashing, &params, &codec, &t2);
        for node in &t3 {
            assert_eq!(node.xs.len(), 8);
            assert!(validate_match_info_pairing(
                &hashing,
                &params,
                3,
                node.meta_l,
                node.match_info_l,
                node.match_info_r
            ));
        }
    }
}
