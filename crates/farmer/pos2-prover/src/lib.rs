//! Challenge scanning: given an open plot file and a 32-byte challenge,
//! derives the two chaining-set ranges the challenge selects, reads the plot
//! chunks those ranges cover, runs the secondary scan filter, and hands the
//! survivors to the chainer.

pub mod error;

use std::io::{Read, Seek};

use pos2_primitives::chain::{find_links, passing_zeros_needed, Chain};
use pos2_primitives::consts::PLOT_FILE_CHUNK_SPAN_RANGE_BITS;
use pos2_primitives::fragment::ProofFragment;
use pos2_primitives::hash::{ProofHashing, Result256};
use pos2_primitives::params::{ProofParams, Range};
use pos2_format::PlotFileReader;

pub use error::{ProverError, ProverResult};

/// The two challenge-derived chaining sets a scan pulls candidates from.
#[derive(Debug, Clone, Copy)]
pub struct ChainingSets {
    /// Even-forced chaining-set index for set A.
    pub set_a_index: u32,
    /// Odd-forced chaining-set index for set B.
    pub set_b_index: u32,
    /// Fragment-value range set A covers.
    pub range_a: Range,
    /// Fragment-value range set B covers.
    pub range_b: Range,
}

/// Derive the chaining sets a challenge selects: `hash.r[0]` (forced even)
/// picks set A, `hash.r[1]` (forced odd) picks set B, guaranteeing the two
/// never collide.
pub fn chaining_sets(hashing: &ProofHashing, params: &ProofParams, challenge: &[u8; 32]) -> ChainingSets {
    let hash = hashing.challenge_with_plot_id_hash(challenge);
    let mask = (1u32 << params.num_chaining_sets_bits()) - 1;
    let set_a_index = hash[0] & mask & !1;
    let set_b_index = (hash[1] & mask) | 1;
    ChainingSets {
        set_a_index,
        set_b_index,
        range_a: params.chaining_set_range(set_a_index),
        range_b: params.chaining_set_range(set_b_index),
    }
}

fn chunk_span() -> u64 {
    1u64 << PLOT_FILE_CHUNK_SPAN_RANGE_BITS
}

/// Read every fragment value in `range`, spanning as many plot-file chunks
/// as the range (typically far wider than one chunk) requires.
fn read_values_in_range<R: Read + Seek>(
    reader: &mut PlotFileReader<R>,
    range: Range,
) -> ProverResult<Vec<u64>> {
    let span = chunk_span();
    let start_chunk = range.start / span;
    let end_chunk = (range.end - 1) / span;
    let num_chunks = reader.num_chunks();

    let mut out = Vec::new();
    for chunk_index in start_chunk..=end_chunk {
        if chunk_index >= num_chunks {
            break;
        }
        let chunk = reader.read_chunk(chunk_index)?;
        out.extend(chunk.values.into_iter().filter(|v| range.contains(*v)));
    }
    Ok(out)
}

/// The secondary scan filter: a depth-0 chain-link-hash zero-bit test,
/// applied before the full chain search so the chainer's fan-out starts from
/// an already-thinned candidate set. Mirrors `chain::passing_zeros_needed`'s
/// depth-0 threshold; see `pos2_primitives::chain` for the shared formula.
fn scan_filter(
    hashing: &ProofHashing,
    initial_challenge: &Result256,
    chaining_set_bits: u32,
    values: Vec<u64>,
) -> Vec<ProofFragment> {
    let needed = passing_zeros_needed(0, chaining_set_bits);
    values
        .into_iter()
        .map(ProofFragment)
        .filter(|fragment| {
            if needed == 0 {
                return true;
            }
            let next = hashing.link_hash(initial_challenge, fragment.0, 0);
            (next[0] & ((1u32 << needed) - 1)) == 0
        })
        .collect()
}

/// Answer a challenge against an open plot file: derive the chaining sets,
/// read and scan-filter their chunks, and return every quality chain found.
pub fn prove<R: Read + Seek>(
    reader: &mut PlotFileReader<R>,
    hashing: &ProofHashing,
    params: &ProofParams,
    challenge: &[u8; 32],
) -> ProverResult<Vec<Chain>> {
    let sets = chaining_sets(hashing, params, challenge);
    let initial_challenge = hashing.challenge_with_plot_id_hash(challenge);
    let chaining_set_bits = params.chaining_set_bits();

    tracing::debug!(
        set_a = sets.set_a_index,
        set_b = sets.set_b_index,
        "derived chaining sets"
    );

    let values_a = read_values_in_range(reader, sets.range_a)?;
    let values_b = read_values_in_range(reader, sets.range_b)?;

    let filtered_a = scan_filter(hashing, &initial_challenge, chaining_set_bits, values_a);
    let filtered_b = scan_filter(hashing, &initial_challenge, chaining_set_bits, values_b);

    tracing::debug!(
        set_a_len = filtered_a.len(),
        set_b_len = filtered_b.len(),
        "scan filter survivors"
    );

    Ok(find_links(
        hashing,
        &initial_challenge,
        chaining_set_bits,
        &filtered_a,
        &filtered_b,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pos2_format::{write_plot_file, PlotHeader};
    use std::io::Cursor;

    fn test_params_and_hashing(k: u32) -> (ProofParams, ProofHashing) {
        let mut plot_id = [0u8; 32];
        for (i, b) in plot_id.iter_mut().enumerate() {
            *b = ((i as u32) * 19 + 1) as u8;
        }
        (ProofParams::new(plot_id, k, 6).unwrap(), ProofHashing::new(plot_id, k))
    }

    #[test]
    fn chaining_sets_have_distinct_forced_parities() {
        let (params, hashing) = test_params_and_hashing(20);
        let sets = chaining_sets(&hashing, &params, &[9u8; 32]);
        assert_eq!(sets.set_a_index % 2, 0);
        assert_eq!(sets.set_b_index % 2, 1);
        assert_ne!(sets.set_a_index, sets.set_b_index);
    }

    #[test]
    fn prove_runs_without_error_on_an_empty_plot() {
        let (params, hashing) = test_params_and_hashing(20);
        let header = PlotHeader::new(*params.plot_id(), 20, 6, [0u8; 112], false);
        let mut buf = Vec::new();
        write_plot_file(&mut buf, &header, &[]).unwrap();

        let mut reader = PlotFileReader::open(Cursor::new(buf)).unwrap();
        let chains = prove(&mut reader, &hashing, &params, &[1u8; 32]).unwrap();
        assert!(chains.is_empty());
    }
}
