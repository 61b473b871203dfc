use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pos2_cli::commands::{self, parse_hex_bytes, parse_xs};
use tracing_subscriber::EnvFilter;

/// pos2 proof-of-space: plot, prove, solve and verify.
#[derive(Debug, Parser)]
#[clap(about, version)]
enum Command {
    /// Plotting operations.
    #[clap(subcommand)]
    Plotter(PlotterCommand),
    /// Challenge-scanning operations against an existing plot file.
    #[clap(subcommand)]
    Prover(ProverCommand),
    /// Reconstruct full proofs from a plot file's quality chains.
    Solver {
        /// Path to the plot file to scan.
        plot_file: PathBuf,
        /// 32-byte hex-encoded challenge.
        challenge: String,
    },
    /// Diagnostics and micro-benchmarks.
    #[clap(subcommand)]
    Analytics(AnalyticsCommand),
    /// Validate a standalone proof with no plot file involved.
    Verify {
        /// 32-byte hex-encoded plot id.
        plot_id: String,
        /// x-value bit width.
        k: u32,
        /// Table-3 match-key bit width.
        strength: u8,
        /// 512-byte hex encoding of the proof's 128 big-endian x-values.
        xs: String,
        /// 32-byte hex-encoded challenge.
        challenge: String,
    },
}

#[derive(Debug, Subcommand)]
enum PlotterCommand {
    /// Plot `plot_id`/`k`/`strength` and write it to `out`.
    Test {
        /// Where to write the plot file.
        out: PathBuf,
        /// 32-byte hex-encoded plot id.
        plot_id: String,
        /// x-value bit width.
        #[arg(long, default_value_t = 18)]
        k: u32,
        /// Table-3 match-key bit width.
        #[arg(long, default_value_t = 6)]
        strength: u8,
        /// Retain raw x-values up to table 3 (debug format, much larger).
        #[arg(long)]
        retain_x: bool,
    },
}

#[derive(Debug, Subcommand)]
enum ProverCommand {
    /// Print a plot file's header fields.
    Check {
        /// Path to the plot file.
        plot_file: PathBuf,
    },
    /// Scan a plot file for quality chains answering a challenge.
    Challenge {
        /// Path to the plot file.
        plot_file: PathBuf,
        /// 32-byte hex-encoded challenge.
        challenge: String,
    },
    /// Scan a plot file and validate every full proof it can reconstruct.
    Verify {
        /// Path to the plot file.
        plot_file: PathBuf,
        /// 32-byte hex-encoded challenge.
        challenge: String,
    },
}

#[derive(Debug, Subcommand)]
enum AnalyticsCommand {
    /// Estimate on-disk plot size for a given `k`/`strength`.
    Simdiskusage,
    /// Benchmark the keyed hash functions the pairing cascade relies on.
    Hashbench,
}

fn init_logger() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logger();

    match Command::parse() {
        Command::Plotter(PlotterCommand::Test { out, plot_id, k, strength, retain_x }) => {
            let plot_id = parse_hex_bytes::<32>("plot_id", &plot_id)?;
            let memo = [0u8; 112];
            let stats = commands::plotter_test(&out, plot_id, k, strength, memo, retain_x)?;
            println!(
                "table1={} table2={} table3={} table4={} table5={} surviving_fragments={}",
                stats.table1, stats.table2, stats.table3, stats.table4, stats.table5, stats.surviving_fragments
            );
        }
        Command::Prover(ProverCommand::Check { plot_file }) => {
            let (header, num_chunks) = commands::prover_check(&plot_file)?;
            println!(
                "version={} plot_id={} k={} strength={} retain_x={} num_chunks={num_chunks}",
                header.version,
                hex::encode(header.plot_id),
                header.k,
                header.strength,
                header.retain_x,
            );
        }
        Command::Prover(ProverCommand::Challenge { plot_file, challenge }) => {
            let challenge = parse_hex_bytes::<32>("challenge", &challenge)?;
            let chains = commands::prover_challenge(&plot_file, challenge)?;
            println!("found {} quality chain(s)", chains.len());
            for chain in &chains {
                println!("{}", commands::fragments_to_hex(&chain.fragments));
            }
        }
        Command::Prover(ProverCommand::Verify { plot_file, challenge }) => {
            let challenge = parse_hex_bytes::<32>("challenge", &challenge)?;
            let proofs = commands::prover_verify(&plot_file, challenge)?;
            println!("verified {} full proof(s)", proofs.len());
        }
        Command::Solver { plot_file, challenge } => {
            let challenge = parse_hex_bytes::<32>("challenge", &challenge)?;
            let proofs = commands::solver_run(&plot_file, challenge)?;
            println!("reconstructed {} candidate proof(s)", proofs.len());
        }
        Command::Analytics(AnalyticsCommand::Simdiskusage) => {
            println!("analytics simdiskusage: not implemented");
        }
        Command::Analytics(AnalyticsCommand::Hashbench) => {
            println!("analytics hashbench: not implemented");
        }
        Command::Verify { plot_id, k, strength, xs, challenge } => {
            let plot_id = parse_hex_bytes::<32>("plot_id", &plot_id)?;
            let xs = parse_xs(&xs)?;
            let challenge = parse_hex_bytes::<32>("challenge", &challenge)?;
            match commands::verify_proof(plot_id, k, strength, &xs, challenge) {
                Ok(_chain) => println!("valid"),
                Err(pos2_cli::CliError::Validation(err)) => println!("invalid: {err}"),
                Err(err) => return Err(err.into()),
            }
        }
    }

    Ok(())
}
