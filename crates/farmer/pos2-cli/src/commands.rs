//! Shared command implementations, called from both the CLI binary
//! ([`crate::main`]) and the C ABI ([`crate::ffi`]) so the two surfaces never
//! drift apart.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use pos2_format::PlotFileReader;
use pos2_plotter::{PlotStats, TracingProgressSink};
use pos2_primitives::chain::Chain;
use pos2_primitives::fragment::{ProofFragment, ProofFragmentCodec};
use pos2_primitives::hash::ProofHashing;
use pos2_primitives::params::ProofParams;
use pos2_primitives::validator::validate_full_proof;

use crate::error::{CliError, CliResult};

/// Parse a hex string into a fixed-size byte array.
pub fn parse_hex_bytes<const N: usize>(field: &'static str, s: &str) -> CliResult<[u8; N]> {
    let bytes = hex::decode(s.trim()).map_err(|err| CliError::InvalidArgument {
        field,
        reason: err.to_string(),
    })?;
    bytes.try_into().map_err(|bytes: Vec<u8>| CliError::InvalidArgument {
        field,
        reason: format!("expected {N} bytes, got {}", bytes.len()),
    })
}

/// Parse the 512-byte hex encoding of a full proof's 128 big-endian x-values.
pub fn parse_xs(s: &str) -> CliResult<[u32; 128]> {
    let bytes = hex::decode(s.trim()).map_err(|err| CliError::InvalidArgument {
        field: "xs",
        reason: err.to_string(),
    })?;
    if bytes.len() != 128 * 4 {
        return Err(CliError::InvalidArgument {
            field: "xs",
            reason: format!("expected {} bytes, got {}", 128 * 4, bytes.len()),
        });
    }
    let mut xs = [0u32; 128];
    for (x, chunk) in xs.iter_mut().zip(bytes.chunks_exact(4)) {
        *x = u32::from_be_bytes(chunk.try_into().unwrap());
    }
    Ok(xs)
}

/// Build a plot from scratch and write it to `path`, logging each phase.
pub fn plotter_test(
    path: &Path,
    plot_id: [u8; 32],
    k: u32,
    strength: u8,
    memo: [u8; 112],
    retain_x: bool,
) -> CliResult<PlotStats> {
    let mut writer = BufWriter::new(File::create(path)?);
    let stats = pos2_plotter::plot(&mut writer, plot_id, k, strength, memo, retain_x, &TracingProgressSink)?;
    writer.flush()?;
    Ok(stats)
}

/// Open a plot file and report its header fields.
pub fn prover_check(path: &Path) -> CliResult<(pos2_format::PlotHeader, u64)> {
    let mut reader = PlotFileReader::open(File::open(path)?)?;
    let num_chunks = reader.num_chunks();
    Ok((reader.header().clone(), num_chunks))
}

/// Scan a plot file for quality chains answering `challenge`.
pub fn prover_challenge(path: &Path, challenge: [u8; 32]) -> CliResult<Vec<Chain>> {
    let mut reader = PlotFileReader::open(File::open(path)?)?;
    let header = reader.header().clone();
    let params = ProofParams::new(header.plot_id, u32::from(header.k), header.strength)?;
    let hashing = ProofHashing::new(header.plot_id, u32::from(header.k));
    let chains = pos2_prover::prove(&mut reader, &hashing, &params, &challenge)?;
    Ok(chains)
}

/// Scan a plot file for quality chains, then reconstruct and validate a full
/// 128-x-value proof for each one found.
pub fn prover_verify(path: &Path, challenge: [u8; 32]) -> CliResult<Vec<[u32; 128]>> {
    let mut reader = PlotFileReader::open(File::open(path)?)?;
    let header = reader.header().clone();
    let params = ProofParams::new(header.plot_id, u32::from(header.k), header.strength)?;
    let hashing = ProofHashing::new(header.plot_id, u32::from(header.k));
    let fragment_codec = ProofFragmentCodec::new(&params)?;

    let chains = pos2_prover::prove(&mut reader, &hashing, &params, &challenge)?;
    let initial_challenge = hashing.challenge_with_plot_id_hash(&challenge);
    let sets = pos2_prover::chaining_sets(&hashing, &params, &challenge);

    let mut verified = Vec::new();
    for chain in &chains {
        let candidates = pos2_solver::solve(&hashing, &params, &fragment_codec, &chain.fragments)?;
        for xs in candidates {
            if validate_full_proof(
                &hashing,
                &params,
                &fragment_codec,
                &xs,
                &initial_challenge,
                sets.range_a,
                sets.range_b,
            )
            .is_ok()
            {
                verified.push(xs);
            }
        }
    }
    Ok(verified)
}

/// Reconstruct every full proof consistent with a 16-fragment quality chain
/// answering `challenge` against a plot file.
pub fn solver_run(path: &Path, challenge: [u8; 32]) -> CliResult<Vec<[u32; 128]>> {
    let mut reader = PlotFileReader::open(File::open(path)?)?;
    let header = reader.header().clone();
    let params = ProofParams::new(header.plot_id, u32::from(header.k), header.strength)?;
    let hashing = ProofHashing::new(header.plot_id, u32::from(header.k));
    let fragment_codec = ProofFragmentCodec::new(&params)?;

    let chains = pos2_prover::prove(&mut reader, &hashing, &params, &challenge)?;
    let mut out = Vec::new();
    for chain in &chains {
        let candidates = pos2_solver::solve(&hashing, &params, &fragment_codec, &chain.fragments)?;
        out.extend(candidates);
    }
    Ok(out)
}

/// Validate a standalone proof (raw x-values, no plot file involved).
pub fn verify_proof(
    plot_id: [u8; 32],
    k: u32,
    strength: u8,
    xs: &[u32; 128],
    challenge: [u8; 32],
) -> CliResult<Chain> {
    let params = ProofParams::new(plot_id, k, strength)?;
    let hashing = ProofHashing::new(plot_id, k);
    let fragment_codec = ProofFragmentCodec::new(&params)?;

    let initial_challenge = hashing.challenge_with_plot_id_hash(&challenge);
    let sets = pos2_prover::chaining_sets(&hashing, &params, &challenge);

    let chain = validate_full_proof(
        &hashing,
        &params,
        &fragment_codec,
        xs,
        &initial_challenge,
        sets.range_a,
        sets.range_b,
    )?;
    Ok(chain)
}

/// Format a fragment list as a compact hex string for printing.
pub fn fragments_to_hex(fragments: &[ProofFragment]) -> String {
    fragments.iter().map(|f| format!("{:016x}", f.0)).collect::<Vec<_>>().join(" ")
}
