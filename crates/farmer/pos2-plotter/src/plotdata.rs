//! Top-level plotting entry point: runs the table 1–5 cascade, prunes table 3
//! down to its surviving fragments, and writes the result out as a plot file.

use std::io::Write;

use pos2_format::{write_plot_file, PlotChunk, PlotHeader};
use pos2_primitives::consts::PLOT_FILE_CHUNK_SPAN_RANGE_BITS;
use pos2_primitives::fragment::ProofFragmentCodec;
use pos2_primitives::hash::ProofHashing;
use pos2_primitives::params::ProofParams;

use crate::error::PlotResult;
use crate::progress::PlotProgressSink;
use crate::prune::{self, T4Node};
use crate::radix::radix_sort_by_key;
use crate::table::{self, T1Node, T2Node, T3Node};

/// Counts gathered while building one plot, useful for logging and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlotStats {
    /// Surviving table-1 pairs.
    pub table1: usize,
    /// Surviving table-2 pairs.
    pub table2: usize,
    /// Surviving table-3 pairs (before pruning).
    pub table3: usize,
    /// Surviving table-4 pairs.
    pub table4: usize,
    /// Surviving table-5 pairs.
    pub table5: usize,
    /// Table-3 fragments retained after pruning — what actually gets written.
    pub surviving_fragments: usize,
}

fn chunk_index(value: u64) -> u64 {
    value >> PLOT_FILE_CHUNK_SPAN_RANGE_BITS
}

/// Build the sparse, sorted chunk list `write_plot_file` expects from a flat
/// list of surviving fragment values, each optionally paired with its
/// eight-x-value table-3 provenance (present only when the plot is built
/// with `retain_x`).
fn bucket_into_chunks(mut values: Vec<(u64, Option<[u32; 8]>)>) -> Vec<PlotChunk> {
    if values.is_empty() {
        return Vec::new();
    }
    radix_sort_by_key(&mut values, 8, |(v, _)| *v);
    let max_chunk = chunk_index(values.last().expect("checked non-empty above").0);
    let mut chunks = vec![(Vec::new(), Vec::new()); (max_chunk + 1) as usize];
    for (value, xs) in values {
        let (chunk_values, chunk_xs) = &mut chunks[chunk_index(value) as usize];
        chunk_values.push(value);
        if let Some(xs) = xs {
            chunk_xs.push(xs);
        }
    }
    chunks
        .into_iter()
        .map(|(values, xs)| {
            let xs = if xs.len() == values.len() { Some(xs) } else { None };
            PlotChunk { values, xs }
        })
        .collect()
}

/// Run the full five-table cascade for `(plot_id, k, strength)` and write the
/// resulting plot file to `writer`.
#[allow(clippy::too_many_arguments)]
pub fn plot<W: Write>(
    writer: &mut W,
    plot_id: [u8; 32],
    k: u32,
    strength: u8,
    memo: [u8; 112],
    retain_x: bool,
    progress: &dyn PlotProgressSink,
) -> PlotResult<PlotStats> {
    let params = ProofParams::new(plot_id, k, strength)?;
    let hashing = ProofHashing::new(plot_id, k);
    let fragment_codec = ProofFragmentCodec::new(&params)?;

    progress.phase_start("table 1");
    let t1: Vec<T1Node> = table::build_table1(&hashing, &params);
    progress.phase_end("table 1");

    progress.phase_start("table 2");
    let t2: Vec<T2Node> = table::build_table2(&hashing, &params, &t1);
    progress.phase_end("table 2");

    progress.phase_start("table 3");
    let t3: Vec<T3Node> = table::build_table3(&hashing, &params, &fragment_codec, &t2);
    progress.phase_end("table 3");

    progress.phase_start("table 4");
    let t4: Vec<T4Node> = prune::build_table4(&hashing, &params, &fragment_codec, &t3);
    progress.phase_end("table 4");

    progress.phase_start("table 5");
    let t5 = prune::build_table5(&hashing, &params, &t4);
    progress.phase_end("table 5");

    progress.phase_start("pruning");
    let live = prune::live_table3_indices(&t4, &t5);
    let stats = PlotStats {
        table1: t1.len(),
        table2: t2.len(),
        table3: t3.len(),
        table4: t4.len(),
        table5: t5.len(),
        surviving_fragments: live.len(),
    };
    progress.phase_end("pruning");

    progress.phase_start("writing");
    let header = PlotHeader::new(plot_id, k as u8, strength, memo, retain_x);
    let values: Vec<(u64, Option<[u32; 8]>)> = if retain_x {
        prune::surviving_fragments_with_xs(&t3, &live)
            .into_iter()
            .map(|(fragment, xs)| (fragment.0, Some(xs)))
            .collect()
    } else {
        prune::surviving_fragments(&t3, &live).into_iter().map(|fragment| (fragment.0, None)).collect()
    };
    let chunks = bucket_into_chunks(values);
    write_plot_file(writer, &header, &chunks)?;
    progress.phase_end("writing");

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullProgressSink;

    #[test]
    fn plot_writes_a_readable_file() {
        let mut plot_id = [0u8; 32];
        for (i, b) in plot_id.iter_mut().enumerate() {
            *b = ((i as u32) * 29 + 3) as u8;
        }
        let memo = [0u8; 112];
        let mut buf = Vec::new();
        let stats = plot(&mut buf, plot_id, 18, 6, memo, false, &NullProgressSink).unwrap();
        assert!(stats.table1 > 0);

        let mut reader = pos2_format::PlotFileReader::open(std::io::Cursor::new(buf)).unwrap();
        assert_eq!(reader.header().plot_id, plot_id);
        let mut total = 0u64;
        for i in 0..reader.num_chunks() {
            total += reader.read_chunk(i).unwrap().values.len() as u64;
        }
        assert_eq!(total as usize, stats.surviving_fragments);
    }

    #[test]
    fn retain_x_plots_carry_x_value_provenance() {
        let mut plot_id = [0u8; 32];
        for (i, b) in plot_id.iter_mut().enumerate() {
            *b = ((i as u32) * 29 + 3) as u8;
        }
        let memo = [0u8; 112];
        let mut buf = Vec::new();
        let stats = plot(&mut buf, plot_id, 18, 6, memo, true, &NullProgressSink).unwrap();

        let mut reader = pos2_format::PlotFileReader::open(std::io::Cursor::new(buf)).unwrap();
        assert!(reader.header().retain_x);
        let mut total = 0u64;
        for i in 0..reader.num_chunks() {
            let chunk = reader.read_chunk(i).unwrap();
            let xs = chunk.xs.expect("retain_x plot must carry x-values for every chunk");
            assert_eq!(xs.len(), chunk.values.len());
            total += chunk.values.len() as u64;
        }
        assert_eq!(total as usize, stats.surviving_fragments);
    }
}
