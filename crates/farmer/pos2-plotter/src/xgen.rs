//! Table-1 candidate generation: `g(x)` for every `x` in `0..2^k`, yielding
//! each candidate's own match_info (the `ChaCha8`-derived value table-1
//! bucketing keys on) alongside the x-value itself.

use pos2_primitives::hash::ProofHashing;
use pos2_primitives::params::ProofParams;
use rayon::prelude::*;

/// One table-1 candidate: an x-value and its own match_info, `g(x)`.
#[derive(Debug, Clone, Copy)]
pub struct XCandidate {
    /// The x-value.
    pub x: u32,
    /// `g(x)`, this candidate's own match_info.
    pub match_info: u32,
}

/// Every `x` in `0..2^k` paired with its own match_info, computed 16 at a
/// time off the same `ChaCha8` block `g` itself uses. Groups run
/// data-parallel; the flattened result stays ascending in `x`.
pub fn generate_x_candidates(hashing: &ProofHashing, params: &ProofParams) -> Vec<XCandidate> {
    let num_groups = 1u32 << (params.k() - 4);
    (0..num_groups)
        .into_par_iter()
        .flat_map_iter(|group| {
            let base = group * 16;
            let mut out = [0u32; 16];
            hashing.g_range_16(base, &mut out);
            (0..16u32).map(move |i| XCandidate {
                x: base + i,
                match_info: out[i as usize],
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_params_and_hashing(k: u32) -> (ProofParams, ProofHashing) {
        let mut plot_id = [0u8; 32];
        for (i, b) in plot_id.iter_mut().enumerate() {
            *b = ((i as u32) * 7 + 3) as u8;
        }
        (ProofParams::new(plot_id, k, 8).unwrap(), ProofHashing::new(plot_id, k))
    }

    #[test]
    fn every_x_appears_exactly_once() {
        let (params, hashing) = test_params_and_hashing(18);
        let candidates = generate_x_candidates(&hashing, &params);
        assert_eq!(candidates.len(), 1usize << params.k());
        for (i, c) in candidates.iter().enumerate() {
            assert_eq!(c.x, i as u32);
        }
    }

    #[test]
    fn match_info_matches_g() {
        let (params, hashing) = test_params_and_hashing(18);
        let candidates = generate_x_candidates(&hashing, &params);
        for c in candidates.iter().take(64) {
            assert_eq!(c.match_info, hashing.g(c.x));
        }
    }
}
