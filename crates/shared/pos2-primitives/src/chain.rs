//! Quality chains: a depth-[`NUM_CHAIN_LINKS`] sequence of proof fragments,
//! alternating between two challenge-derived scan sets, each link gated by a
//! zero-bit filter on the running link hash. Built by a depth-first search
//! with an explicit state stack (rather than recursion) so the search can be
//! abandoned or resumed without unwinding the call stack.

use crate::consts::{AVERAGE_PROOFS_PER_CHALLENGE_BITS, NUM_CHAIN_LINKS};
use crate::fragment::ProofFragment;
use crate::hash::{ProofHashing, Result256};
use crate::params::Range;

/// A depth-[`NUM_CHAIN_LINKS`] quality chain: fragments alternate between set
/// A (even depths) and set B (odd depths).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chain {
    /// The chain's fragments, in depth order.
    pub fragments: [ProofFragment; NUM_CHAIN_LINKS],
}

/// Number of low zero bits the link hash at depth `i` must have for a
/// candidate fragment to extend the chain. The first link is the most
/// permissive (cuts the fan-out before it can explode); the last is the
/// strictest, folding in the target chains-per-challenge rate.
pub fn passing_zeros_needed(i: usize, chaining_set_bits: u32) -> u32 {
    if i == 0 {
        chaining_set_bits.saturating_sub(2)
    } else if i == NUM_CHAIN_LINKS - 1 {
        chaining_set_bits + 2 + AVERAGE_PROOFS_PER_CHALLENGE_BITS
    } else {
        chaining_set_bits
    }
}

fn passes_filter(next: &Result256, needed: u32) -> bool {
    if needed == 0 {
        return true;
    }
    debug_assert!(needed < 32, "zero-bit filter width must fit a u32 word");
    (next[0] & ((1u32 << needed) - 1)) == 0
}

/// Search for every quality chain reachable from `initial_challenge` by
/// alternately drawing from `set_a` (even depths) and `set_b` (odd depths).
pub fn find_links(
    hashing: &ProofHashing,
    initial_challenge: &Result256,
    chaining_set_bits: u32,
    set_a: &[ProofFragment],
    set_b: &[ProofFragment],
) -> Vec<Chain> {
    struct State {
        challenge: Result256,
        depth: usize,
        fragments: Vec<ProofFragment>,
    }

    let mut results = Vec::new();
    let mut stack = vec![State {
        challenge: *initial_challenge,
        depth: 0,
        fragments: Vec::with_capacity(NUM_CHAIN_LINKS),
    }];

    while let Some(state) = stack.pop() {
        if state.depth == NUM_CHAIN_LINKS {
            let mut fragments = [ProofFragment(0); NUM_CHAIN_LINKS];
            fragments.copy_from_slice(&state.fragments);
            results.push(Chain { fragments });
            continue;
        }

        let set = if state.depth % 2 == 0 { set_a } else { set_b };
        let needed = passing_zeros_needed(state.depth, chaining_set_bits);
        for &fragment in set {
            let next = hashing.link_hash(&state.challenge, fragment.0, state.depth as u32);
            if !passes_filter(&next, needed) {
                continue;
            }
            let mut fragments = state.fragments.clone();
            fragments.push(fragment);
            stack.push(State {
                challenge: next,
                depth: state.depth + 1,
                fragments,
            });
        }
    }

    results
}

/// Validate a previously-assembled [`Chain`]: every link's fragment must lie
/// in the depth-appropriate range and pass the zero-bit filter relative to the
/// running challenge hash.
pub fn validate(
    hashing: &ProofHashing,
    chain: &Chain,
    initial_challenge: &Result256,
    chaining_set_bits: u32,
    range_a: Range,
    range_b: Range,
) -> bool {
    let mut current = *initial_challenge;
    for (i, fragment) in chain.fragments.iter().enumerate() {
        let range = if i % 2 == 0 { range_a } else { range_b };
        if !range.contains(fragment.0) {
            return false;
        }
        let next = hashing.link_hash(&current, fragment.0, i as u32);
        let needed = passing_zeros_needed(i, chaining_set_bits);
        if !passes_filter(&next, needed) {
            return false;
        }
        current = next;
    }
    true
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
    fn found_chains_validate() {
        let hashing = ProofHashing::new(regression_plot_id(), 24);
        let challenge = hashing.challenge_with_plot_id_hash(&[3u8; 32]);
        let chaining_set_bits = 11;
        let range_a = Range { start: 0, end: 1 << 20 };
        let range_b = Range { start: 0, end: 1 << 20 };
        let set_a: Vec<ProofFragment> = (0..200u64).map(|v| ProofFragment(v * 37)).collect();
        let set_b: Vec<ProofFragment> = (0..200u64).map(|v| ProofFragment(v * 53 + 11)).collect();

        let chains = find_links(&hashing, &challenge, chaining_set_bits, &set_a, &set_b);
        for chain in &chains {
            assert!(validate(
                &hashing,
                chain,
                &challenge,
                chaining_set_bits,
                range_a,
                range_b
            ));
        }
    }

    #[test]
    fn swapping_two_same_parity_fragments_fails_validation() {
        let hashing = ProofHashing::new(regression_plot_id(), 24);
        let challenge = hashing.challenge_with_plot_id_hash(&[3u8; 32]);
        let chaining_set_bits = 8;
        let range_a = Range { start: 0, end: 1 << 20 };
        let range_b = Range { start: 0, end: 1 << 20 };
        let set_a: Vec<ProofFragment> = (0..400u64).map(|v| ProofFragment(v * 19)).collect();
        let set_b: Vec<ProofFragment> = (0..400u64).map(|v| ProofFragment(v * 23 + 5)).collect();

        let same_parity_pair = |chain: &Chain| {
            (0..NUM_CHAIN_LINKS)
                .flat_map(|i| ((i + 2)..NUM_CHAIN_LINKS).step_by(2).map(move |j| (i, j)))
                .find(|&(i, j)| chain.fragments[i] != chain.fragments[j])
        };

        let chains = find_links(&hashing, &challenge, chaining_set_bits, &set_a, &set_b);
        let Some((chain, (i, j))) = chains
            .into_iter()
            .find_map(|chain| same_parity_pair(&chain).map(|pair| (chain, pair)))
        else {
            return;
        };

        let mut mutated = chain;
        mutated.fragments.swap(i, j);
        assert!(!validate(
            &hashing,
            &mutated,
            &challenge,
            chaining_set_bits,
            range_a,
            range_b
        ));
    }

    #[test]
    fn passing_zeros_needed_is_strictest_at_last_link() {
        let bits = 6;
        assert!(passing_zeros_needed(0, bits) < passing_zeros_needed(1, bits));
        assert!(passing_zeros_needed(NUM_CHAIN_LINKS - 1, bits) > passing_zeros_needed(1, bits));
    }
}
