//! Table 4/5 construction and the liveness pass that prunes table 3 down to
//! only the fragments reachable from a surviving table-5 pair.
//!
//! Unlike tables 1-3, table 4 candidates aren't drawn from the whole
//! population: table 3's fragments are first routed into `2 * num_partitions`
//! partitions (each fragment lands in *two* partitions — its lateral and its
//! `r_t4` partition, mirroring the encrypted fragment's own bit layout,
//! carrying whichever table-2 parent's `(meta, match_info)` that side routes
//! to), and table 4 pairing only ever compares fragments that share a
//! partition.

use std::collections::BTreeSet;

use crate::matchjoin::{bucket_by_section_and_match_key, join_section};
use crate::table::T3Node;
use pos2_primitives::core::pairing_t4;
use pos2_primitives::core::pairing_t5;
use pos2_primitives::fragment::{ProofFragment, ProofFragmentCodec};
use pos2_primitives::hash::ProofHashing;
use pos2_primitives::params::ProofParams;
use rayon::prelude::*;

/// A table-3 survivor's contribution to one table-4 partition: the parent
/// side (left or right) whose `(meta, match_info)` this partition slot
/// carries, plus the table-3 index it traces back to.
#[derive(Debug, Clone, Copy)]
struct T3PartitionedCandidate {
    meta: u64,
    match_info: u32,
    t3_index: usize,
}

/// A surviving table-4 pair: its combined meta and match_info, and the
/// table-3 indices it was built from.
#[derive(Debug, Clone, Copy)]
pub struct T4Node {
    /// Hash-derived combined meta, input to table 5's pairing.
    pub meta: u64,
    /// This pair's own match_info, input to table 5's bucketing.
    pub match_info: u32,
    /// Index of the left parent in the table-3 survivor slice.
    pub t3_l: usize,
    /// Index of the right parent in the table-3 survivor slice.
    pub t3_r: usize,
}

/// Route every table-3 survivor into its two table-4 partitions: its left
/// parent's `(meta, match_info)` into its lateral partition, its right
/// parent's into its `r_t4` partition.
fn partition_table3(fragment_codec: &ProofFragmentCodec, params: &ProofParams, t3: &[T3Node]) -> Vec<Vec<T3PartitionedCandidate>> {
    let num_partitions = params.num_partitions();
    let mut partitions = vec![Vec::new(); (2 * num_partitions) as usize];
    for (i, node) in t3.iter().enumerate() {
        let lateral = fragment_codec.lateral_to_t4_partition(node.fragment, num_partitions);
        let r = fragment_codec.r_t4_partition(node.fragment, num_partitions);
        partitions[lateral as usize].push(T3PartitionedCandidate {
            meta: node.meta_l,
            match_info: node.match_info_l,
            t3_index: i,
        });
        partitions[r as usize].push(T3PartitionedCandidate {
            meta: node.meta_r,
            match_info: node.match_info_r,
            t3_index: i,
        });
    }
    partitions
}

/// Build every surviving table-4 pair, one partition's candidate pool at a
/// time.
pub fn build_table4(
    hashing: &ProofHashing,
    params: &ProofParams,
    fragment_codec: &ProofFragmentCodec,
    t3: &[T3Node],
) -> Vec<T4Node> {
    let partitions = partition_table3(fragment_codec, params, t3);

    partitions
        .into_par_iter()
        .flat_map_iter(|members| {
            let mut out = Vec::new();
            if members.len() < 2 {
                return out;
            }
            let match_infos: Vec<u32> = members.iter().map(|m| m.match_info).collect();
            let buckets = bucket_by_section_and_match_key(params, 4, &match_infos);

            for section_l in 0..params.num_sections() {
                let pairs = join_section(
                    hashing,
                    params,
                    4,
                    section_l,
                    &buckets,
                    |i| members[i].meta,
                    |i| match_infos[i],
                );
                for (li, ri) in pairs {
                    let left = &members[li];
                    let right = &members[ri];
                    if left.t3_index == right.t3_index {
                        continue;
                    }
                    let order_bits_l = fragment_codec.order_bits(t3[left.t3_index].fragment);
                    if let Some(result) = pairing_t4(hashing, params, left.meta, right.meta, order_bits_l) {
                        out.push(T4Node {
                            meta: result.meta,
                            match_info: result.match_info,
                            t3_l: left.t3_index,
                            t3_r: right.t3_index,
                        });
                    }
                }
            }
            out
        })
        .collect()
}

/// Build every surviving table-5 pair: `(t4_l, t4_r)` index pairs into `t4`.
/// Table 5 is terminal — a survivor carries no payload of its own.
pub fn build_table5(hashing: &ProofHashing, params: &ProofParams, t4: &[T4Node]) -> Vec<(usize, usize)> {
    let match_infos: Vec<u32> = t4.iter().map(|n| n.match_info).collect();
    let buckets = bucket_by_section_and_match_key(params, 5, &match_infos);

    (0..params.num_sections())
        .into_par_iter()
        .flat_map_iter(|section_l| {
            let pairs = join_section(hashing, params, 5, section_l, &buckets, |i| t4[i].meta, |i| match_infos[i]);
            pairs.into_iter().filter_map(move |(li, ri)| {
                if li == ri {
                    return None;
                }
                if pairing_t5(hashing, params, t4[li].meta, t4[ri].meta) {
                    Some((li, ri))
                } else {
                    None
                }
            })
        })
        .collect()
}

/// Every table-3 index reachable from a table-5 survivor, via its two
/// table-4 parents.
pub fn live_table3_indices(t4: &[T4Node], t5: &[(usize, usize)]) -> BTreeSet<usize> {
    let mut live = BTreeSet::new();
    for &(l, r) in t5 {
        live.insert(t4[l].t3_l);
        live.insert(t4[l].t3_r);
        live.insert(t4[r].t3_l);
        live.insert(t4[r].t3_r);
    }
    live
}

/// The pruned set of proof fragments a plot file actually stores: every
/// table-3 fragment reachable from some table-5 survivor.
pub fn surviving_fragments(t3: &[T3Node], live: &BTreeSet<usize>) -> Vec<ProofFragment> {
    live.iter().map(|&i| t3[i].fragment).collect()
}

/// As [`surviving_fragments`], but also returns each survivor's eight-x-value
/// provenance — only populated when the plot is built with `retain_x` set.
pub fn surviving_fragments_with_xs(t3: &[T3Node], live: &BTreeSet<usize>) -> Vec<(ProofFragment, [u32; 8])> {
    live.iter().map(|&i| (t3[i].fragment, t3[i].xs)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{build_table1, build_table2, build_table3};

    fn test_params_and_hashing(k: u32) -> (ProofParams, ProofHashing) {
        let mut plot_id = [0u8; 32];
        for (i, b) in plot_id.iter_mut().enumerate() {
            *b = ((i as u32) * 17 + 9) as u8;
        }
        (ProofParams::new(plot_id, k, 6).unwrap(), ProofHashing::new(plot_id, k))
    }

    #[test]
    fn live_indices_only_reference_real_table3_entries() {
        let (params, hashing) = test_params_and_hashing(18);
        let codec = ProofFragmentCodec::new(&params).unwrap();
        let t1 = build_table1(&hashing, &params);
        let t2 = build_table2(&hashing, &params, &t1);
        let t3 = build_table3(&hashing, &params, &codec, &t2);
        let t4 = build_table4(&hashing, &params, &codec, &t3);
        let t5 = build_table5(&hashing, &params, &t4);
        let live = live_table3_indices(&t4, &t5);
        for &idx in &live {
            assert!(idx < t3.len());
        }
        let fragments = surviving_fragments(&t3, &live);
        assert_eq!(fragments.len(), live.len());
    }
}
