//! Section × match-key bucketing and the matching-target-synthesis merge-join
//! that finds every candidate pair at a table construction level.
//!
//! Every candidate's own match_info already carries its section and
//! match_key (the high and middle bit fields); a left candidate's expected
//! partner, for a given match_key, is synthesized via
//! [`synthesize_matching_target`] and binary-searched against the declared
//! targets of right-hand candidates sharing the matching section and that
//! match_key — a sorted two-pointer merge join per `(section, match_key)`
//! bucket, not a scan over the whole population.

use pos2_primitives::core::{matching_section, synthesize_matching_target};
use pos2_primitives::hash::ProofHashing;
use pos2_primitives::params::ProofParams;

/// Bucket every candidate's index by `(section, match_key)`, both read off
/// its own match_info.
pub fn bucket_by_section_and_match_key(params: &ProofParams, table_id: u32, match_infos: &[u32]) -> Vec<Vec<Vec<usize>>> {
    let num_sections = params.num_sections() as usize;
    let num_match_keys = params.num_match_keys(table_id) as usize;
    let mut buckets = vec![vec![Vec::new(); num_match_keys]; num_sections];
    for (i, &match_info) in match_infos.iter().enumerate() {
        let section = params.extract_section_from_match_info(u64::from(match_info)) as usize;
        let match_key = params.extract_match_key_from_match_info(table_id, u64::from(match_info)) as usize;
        buckets[section][match_key].push(i);
    }
    buckets
}

/// Every candidate pair `(left_index, right_index)` where the left's section
/// is `section_l` and the right genuinely matches it: right's section is
/// `section_l`'s matching section, and right's declared target equals the
/// target left's meta synthesizes for right's own match_key.
pub fn join_section(
    hashing: &ProofHashing,
    params: &ProofParams,
    table_id: u32,
    section_l: u32,
    buckets: &[Vec<Vec<usize>>],
    meta_of: impl Fn(usize) -> u64,
    match_info_of: impl Fn(usize) -> u32,
) -> Vec<(usize, usize)> {
    let section_r = matching_section(params.num_section_bits(), section_l) as usize;
    let left_indices: Vec<usize> = buckets[section_l as usize].iter().flatten().copied().collect();
    if left_indices.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    for match_key_r in 0..params.num_match_keys(table_id) {
        let right_bucket = &buckets[section_r][match_key_r as usize];
        if right_bucket.is_empty() {
            continue;
        }

        let mut left_targets: Vec<(u32, usize)> = left_indices
            .iter()
            .map(|&li| (synthesize_matching_target(hashing, params, table_id, meta_of(li), match_key_r), li))
            .collect();
        left_targets.sort_unstable_by_key(|&(t, _)| t);

        let mut right_targets: Vec<(u32, usize)> = right_bucket
            .iter()
            .map(|&ri| (params.extract_match_target_from_match_info(table_id, u64::from(match_info_of(ri))), ri))
            .collect();
        right_targets.sort_unstable_by_key(|&(t, _)| t);

        let mut li = 0usize;
        let mut ri = 0usize;
        while li < left_targets.len() && ri < right_targets.len() {
            let lt = left_targets[li].0;
            let rt = right_targets[ri].0;
            if lt == rt {
                let li_end = left_targets[li..].partition_point(|&(t, _)| t == lt) + li;
                let ri_end = right_targets[ri..].partition_point(|&(t, _)| t == rt) + ri;
                for &(_, l) in &left_targets[li..li_end] {
                    for &(_, r) in &right_targets[ri..ri_end] {
                        out.push((l, r));
                    }
                }
                li = li_end;
                ri = ri_end;
            } else if lt < rt {
                li += 1;
            } else {
                ri += 1;
            }
        }
    }
    out
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
    fn join_section_only_returns_pairs_whose_match_info_actually_pairs() {
        let (params, hashing) = test_params_and_hashing(18);
        let xs: Vec<u32> = (0u32..20_000).collect();
        let match_infos: Vec<u32> = xs.iter().map(|&x| hashing.g(x)).collect();
        let buckets = bucket_by_section_and_match_key(&params, 1, &match_infos);
        for section_l in 0..params.num_sections() {
            let pairs = join_section(&hashing, &params, 1, section_l, &buckets, |i| u64::from(xs[i]), |i| match_infos[i]);
            for (li, ri) in pairs {
                assert!(validate_match_info_pairing(
                    &hashing,
                    &params,
                    1,
                    u64::from(xs[li]),
                    match_infos[li],
                    match_infos[ri]
                ));
            }
        }
    }
}
