//! Sequential plot file writer and lazy, seek-based reader.
//!
//! Layout: fixed header, `num_chunks: u64`, a table of `num_chunks` absolute
//! `u64` chunk offsets, then the chunk bodies themselves. A reader only ever
//! touches the header and offset table eagerly; chunk bodies are decoded on
//! demand by [`PlotFileReader::read_chunk`].

use crate::chunk::{self, PlotChunk};
use crate::error::{PlotFileError, PlotFileResult};
use crate::header::PlotHeader;
use pos2_primitives::consts::PLOT_FILE_CHUNK_SPAN_RANGE_BITS;
use pos2_primitives::params::Range;
use std::io::{Read, Seek, SeekFrom, Write};

/// Number of fragment values spanned by a single chunk.
fn chunk_span() -> u64 {
    1u64 << PLOT_FILE_CHUNK_SPAN_RANGE_BITS
}

/// Write a complete plot file: header, offset table, then every chunk's
/// sorted values (each `chunks[i]` covering the half-open range
/// `[i * chunk_span, (i + 1) * chunk_span)`). `chunks[i].xs`, when present,
/// is persisted alongside the values for plots built with `retain_x`.
pub fn write_plot_file<W: Write>(
    writer: &mut W,
    header: &PlotHeader,
    chunks: &[PlotChunk],
) -> PlotFileResult<()> {
    header.write_to(writer)?;

    let num_chunks = chunks.len() as u64;
    writer.write_all(&num_chunks.to_le_bytes())?;

    let mut bodies = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        let base = (i as u64) * chunk_span();
        let (fse, stub, xsb) =
            chunk::encode_chunk(base, &chunk.values, chunk.xs.as_deref(), u32::from(header.k))?;
        bodies.push((chunk.values.len() as u32, fse, stub, xsb));
    }

    let header_len = PlotHeader::encoded_len() as u64;
    let offset_table_pos = header_len + 8;
    let first_chunk_offset = offset_table_pos + 8 * num_chunks;

    let mut offsets = Vec::with_capacity(bodies.len());
    let mut cursor = first_chunk_offset;
    for (_, fse, stub, xsb) in &bodies {
        offsets.push(cursor);
        let body_len = 4 + 4 + 4 + 4 + fse.len() as u64 + stub.len() as u64 + xsb.len() as u64;
        cursor += 8 + body_len;
    }
    for offset in &offsets {
        writer.write_all(&offset.to_le_bytes())?;
    }

    for (num_values, fse, stub, xsb) in &bodies {
        let body_len = (4 + 4 + 4 + 4 + fse.len() + stub.len() + xsb.len()) as u64;
        writer.write_all(&body_len.to_le_bytes())?;
        writer.write_all(&num_values.to_le_bytes())?;
        writer.write_all(&(fse.len() as u32).to_le_bytes())?;
        writer.write_all(&(stub.len() as u32).to_le_bytes())?;
        writer.write_all(&(xsb.len() as u32).to_le_bytes())?;
        writer.write_all(fse)?;
        writer.write_all(stub)?;
        writer.write_all(xsb)?;
    }

    Ok(())
}

/// A lazily-accessed plot file: header and offset table are read eagerly on
/// open, chunk bodies are decoded only when asked for.
pub struct PlotFileReader<R> {
    reader: R,
    header: PlotHeader,
    chunk_offsets: Vec<u64>,
}

impl<R: Read + Seek> PlotFileReader<R> {
    /// Open a plot file, reading its header and chunk-offset table.
    pub fn open(mut reader: R) -> PlotFileResult<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let header = PlotHeader::read_from(&mut reader)?;

        let mut num_chunks_buf = [0u8; 8];
        reader.read_exact(&mut num_chunks_buf)?;
        let num_chunks = u64::from_le_bytes(num_chunks_buf);

        let mut chunk_offsets = Vec::with_capacity(num_chunks as usize);
        for _ in 0..num_chunks {
            let mut offset_buf = [0u8; 8];
            reader.read_exact(&mut offset_buf)?;
            chunk_offsets.push(u64::from_le_bytes(offset_buf));
        }

        Ok(Self { reader, header, chunk_offsets })
    }

    /// The plot file's header.
    pub fn header(&self) -> &PlotHeader {
        &self.header
    }

    /// Total number of chunks in the file.
    pub fn num_chunks(&self) -> u64 {
        self.chunk_offsets.len() as u64
    }

    /// Decode and return chunk `index`.
    pub fn read_chunk(&mut self, index: u64) -> PlotFileResult<PlotChunk> {
        let num_chunks = self.num_chunks();
        let offset = *self
            .chunk_offsets
            .get(index as usize)
            .ok_or(PlotFileError::ChunkIndexOutOfBounds { index, num_chunks })?;

        self.reader.seek(SeekFrom::Start(offset))?;
        let mut len_buf = [0u8; 8];
        self.reader.read_exact(&mut len_buf)?;

        let mut num_values_buf = [0u8; 4];
        self.reader.read_exact(&mut num_values_buf)?;
        let num_values = u32::from_le_bytes(num_values_buf);

        let mut fse_size_buf = [0u8; 4];
        self.reader.read_exact(&mut fse_size_buf)?;
        let fse_size = u32::from_le_bytes(fse_size_buf) as usize;

        let mut stub_size_buf = [0u8; 4];
        self.reader.read_exact(&mut stub_size_buf)?;
        let stub_size = u32::from_le_bytes(stub_size_buf) as usize;

        let mut xs_size_buf = [0u8; 4];
        self.reader.read_exact(&mut xs_size_buf)?;
        let xs_size = u32::from_le_bytes(xs_size_buf) as usize;

        let mut fse_bytes = vec![0u8; fse_size];
        self.reader.read_exact(&mut fse_bytes)?;
        let mut stub_bytes = vec![0u8; stub_size];
        self.reader.read_exact(&mut stub_bytes)?;
        let mut xs_bytes = vec![0u8; xs_size];
        self.reader.read_exact(&mut xs_bytes)?;

        let base = index * chunk_span();
        chunk::decode_chunk(base, num_values, &fse_bytes, &stub_bytes, &xs_bytes, u32::from(self.header.k))
    }

    /// Return every fragment value within `range`, which must lie entirely
    /// within one chunk's span.
    pub fn get_proof_fragments_in_range(&mut self, range: Range) -> PlotFileResult<Vec<u64>> {
        let span = chunk_span();
        let start_chunk = range.start / span;
        let end_chunk = (range.end - 1) / span;
        if start_chunk != end_chunk {
            return Err(PlotFileError::RangeCrossesChunk);
        }
        let chunk = self.read_chunk(start_chunk)?;
        Ok(chunk.values.into_iter().filter(|v| range.contains(*v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_chunks() -> Vec<PlotChunk> {
        let span = chunk_span();
        let mut chunk0 = Vec::new();
        let mut v = 0u64;
        for i in 0..100u64 {
            v += 5 + (i % 3);
            chunk0.push(v);
        }
        let mut chunk1 = Vec::new();
        let mut v = span;
        for i in 0..50u64 {
            v += 7 + (i % 4);
            chunk1.push(v);
        }
        vec![PlotChunk { values: chunk0, xs: None }, PlotChunk { values: chunk1, xs: None }]
    }

    #[test]
    fn write_then_read_round_trips() {
        let header = crate::header::PlotHeader::new([3u8; 32], 24, 8, [0u8; 112], false);
        let chunks = sample_chunks();

        let mut buf = Vec::new();
        write_plot_file(&mut buf, &header, &chunks).unwrap();

        let mut reader = PlotFileReader::open(Cursor::new(buf)).unwrap();
        assert_eq!(reader.num_chunks(), 2);
        let c0 = reader.read_chunk(0).unwrap();
        assert_eq!(c0.values, chunks[0].values);
        let c1 = reader.read_chunk(1).unwrap();
        assert_eq!(c1.values, chunks[1].values);
    }

    #[test]
    fn write_then_read_round_trips_retained_xs() {
        let header = crate::header::PlotHeader::new([3u8; 32], 24, 8, [0u8; 112], true);
        let mut chunks = sample_chunks();
        for chunk in &mut chunks {
            let xs = (0..chunk.values.len() as u32).map(|i| [i; 8]).collect();
            chunk.xs = Some(xs);
        }

        let mut buf = Vec::new();
        write_plot_file(&mut buf, &header, &chunks).unwrap();

        let mut reader = PlotFileReader::open(Cursor::new(buf)).unwrap();
        let c0 = reader.read_chunk(0).unwrap();
        assert_eq!(c0.values, chunks[0].values);
        assert_eq!(c0.xs, chunks[0].xs);
    }

    #[test]
    fn range_query_within_chunk() {
        let header = crate::header::PlotHeader::new([3u8; 32], 24, 8, [0u8; 112], false);
        let chunks = sample_chunks();
        let mut buf = Vec::new();
        write_plot_file(&mut buf, &header, &chunks).unwrap();

        let mut reader = PlotFileReader::open(Cursor::new(buf)).unwrap();
        let first = chunks[0].values[0];
        let last = *chunks[0].values.last().unwrap();
        let values = reader
            .get_proof_fragments_in_range(Range { start: first, end: last + 1 })
            .unwrap();
        assert_eq!(values, chunks[0].values);
    }

    #[test]
    fn range_crossing_chunk_boundary_errors() {
        let header = crate::header::PlotHeader::new([3u8; 32], 24, 8, [0u8; 112], false);
        let chunks = sample_chunks();
        let mut buf = Vec::new();
        write_plot_file(&mut buf, &header, &chunks).unwrap();

        let mut reader = PlotFileReader::open(Cursor::new(buf)).unwrap();
        let span = chunk_span();
        let result = reader.get_proof_fragments_in_range(Range { start: span - 1, end: span + 1 });
        assert!(matches!(result, Err(PlotFileError::RangeCrossesChunk)));
    }
}
