//! Byte-stream entropy coder for chunk delta bytes.
//!
//! The reference implementation's `ChunkCompressor` calls out to an external
//! `POS2_FSE_compress`/`fse.h` that isn't part of this codebase — there is no
//! crate in the surrounding dependency stack that provides FSE/tANS either.
//! Rather than fabricate a dependency, this module hand-rolls a canonical
//! Huffman coder: it fills the same role (entropy-code a stream of
//! small-alphabet delta bytes before they hit disk) with an algorithm that's
//! straightforward to implement correctly without the original's probability
//! tables. See DESIGN.md for the substitution rationale.

use crate::error::{PlotFileError, PlotFileResult};
use std::collections::{BinaryHeap, HashMap};
use std::cmp::Reverse;

enum Node {
    Leaf(u8),
    Internal(usize, usize),
}

/// Code length (in bits) assigned to each of the 256 possible byte values;
/// `0` means the symbol never occurs in the input.
fn build_lengths(freqs: &[u64; 256]) -> [u16; 256] {
    let mut nodes: Vec<Node> = Vec::new();
    let mut freq_of: Vec<u64> = Vec::new();
    let mut heap: BinaryHeap<Reverse<(u64, u64, usize)>> = BinaryHeap::new();
    let mut seq = 0u64;

    for (sym, &f) in freqs.iter().enumerate() {
        if f > 0 {
            nodes.push(Node::Leaf(sym as u8));
            freq_of.push(f);
            heap.push(Reverse((f, seq, nodes.len() - 1)));
            seq += 1;
        }
    }

    if heap.is_empty() {
        return [0u16; 256];
    }

    while heap.len() > 1 {
        let Reverse((f1, _, i1)) = heap.pop().unwrap();
        let Reverse((f2, _, i2)) = heap.pop().unwrap();
        nodes.push(Node::Internal(i1, i2));
        let combined = f1 + f2;
        freq_of.push(combined);
        heap.push(Reverse((combined, seq, nodes.len() - 1)));
        seq += 1;
    }

    let Reverse((_, _, root)) = heap.pop().unwrap();
    let mut lengths = [0u16; 256];
    let mut stack = vec![(root, 0u16)];
    while let Some((idx, depth)) = stack.pop() {
        match nodes[idx] {
            Node::Leaf(sym) => lengths[sym as usize] = depth.max(1),
            Node::Internal(l, r) => {
                stack.push((l, depth + 1));
                stack.push((r, depth + 1));
            }
        }
    }
    lengths
}

/// Assign canonical codes from a lengths table: symbols are ordered by value,
/// codes within a length are assigned in ascending symbol order, and the
/// first code of each length is derived purely from shorter lengths' counts —
/// so encoder and decoder reconstruct identical codes from the lengths alone.
fn canonical_codes(lengths: &[u16; 256]) -> HashMap<u8, (u16, u32)> {
    let max_len = lengths.iter().copied().max().unwrap_or(0) as usize;
    let mut bl_count = vec![0u32; max_len + 1];
    for &len in lengths {
        if len > 0 {
            bl_count[len as usize] += 1;
        }
    }

    let mut first_code = vec![0u32; max_len + 2];
    let mut code = 0u32;
    for len in 1..=max_len {
        code = (code + bl_count[len - 1]) << 1;
        first_code[len] = code;
    }

    let mut next_code = first_code;
    let mut codes = HashMap::new();
    for sym in 0..256u32 {
        let len = lengths[sym as usize];
        if len == 0 {
            continue;
        }
        let c = next_code[len as usize];
        next_code[len as usize] += 1;
        codes.insert(sym as u8, (len, c));
    }
    codes
}

struct BitWriter {
    bytes: Vec<u8>,
    cur: u8,
    filled: u8,
}

impl BitWriter {
    fn new() -> Self {
        Self { bytes: Vec::new(), cur: 0, filled: 0 }
    }

    fn push_bits(&mut self, mut code: u32, len: u16) {
        for i in (0..len).rev() {
            let bit = ((code >> i) & 1) as u8;
            self.cur = (self.cur << 1) | bit;
            self.filled += 1;
            if self.filled == 8 {
                self.bytes.push(self.cur);
                self.cur = 0;
                self.filled = 0;
            }
        }
        let _ = &mut code;
    }

    fn finish(mut self) -> Vec<u8> {
        if self.filled > 0 {
            self.cur <<= 8 - self.filled;
            self.bytes.push(self.cur);
        }
        self.bytes
    }
}

struct BitReader<'a> {
    bytes: &'a [u8],
    byte_pos: usize,
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, byte_pos: 0, bit_pos: 0 }
    }

    fn next_bit(&mut self) -> PlotFileResult<u8> {
        let byte = *self
            .bytes
            .get(self.byte_pos)
            .ok_or(PlotFileError::CorruptStream)?;
        let bit = (byte >> (7 - self.bit_pos)) & 1;
        self.bit_pos += 1;
        if self.bit_pos == 8 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }
        Ok(bit)
    }
}

/// Compress `input` into a self-describing byte stream: a 256-entry code
/// length table followed by the bit-packed canonical Huffman codes.
pub fn compress(input: &[u8]) -> Vec<u8> {
    let mut freqs = [0u64; 256];
    for &b in input {
        freqs[b as usize] += 1;
    }
    let lengths = build_lengths(&freqs);
    let codes = canonical_codes(&lengths);

    let mut out = Vec::with_capacity(input.len() / 2 + 512);
    for &len in &lengths {
        out.extend_from_slice(&len.to_le_bytes());
    }

    let mut writer = BitWriter::new();
    for &b in input {
        if let Some(&(len, code)) = codes.get(&b) {
            writer.push_bits(code, len);
        }
    }
    out.extend_from_slice(&writer.finish());
    out
}

/// Decompress a stream produced by [`compress`], given the original number of
/// bytes (the bitstream carries no explicit end marker).
pub fn decompress(data: &[u8], num_values: usize) -> PlotFileResult<Vec<u8>> {
    if data.len() < 512 {
        return Err(PlotFileError::CorruptStream);
    }
    let mut lengths = [0u16; 256];
    for (sym, chunk) in data[0..512].chunks_exact(2).enumerate() {
        lengths[sym] = u16::from_le_bytes([chunk[0], chunk[1]]);
    }
    let codes = canonical_codes(&lengths);
    let mut by_len_code: HashMap<(u16, u32), u8> = HashMap::new();
    for (&sym, &(len, code)) in &codes {
        by_len_code.insert((len, code), sym);
    }

    if num_values == 0 {
        return Ok(Vec::new());
    }

    let mut reader = BitReader::new(&data[512..]);
    let mut out = Vec::with_capacity(num_values);
    while out.len() < num_values {
        let mut code = 0u32;
        let mut len = 0u16;
        loop {
            code = (code << 1) | u32::from(reader.next_bit()?);
            len += 1;
            if let Some(&sym) = by_len_code.get(&(len, code)) {
                out.push(sym);
                break;
            }
            if len > 256 {
                return Err(PlotFileError::CorruptStream);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_skewed_data() {
        let mut input = Vec::new();
        for i in 0..4000u32 {
            input.push((i % 7) as u8);
        }
        input.push(255);
        input.push(0);
        let compressed = compress(&input);
        let restored = decompress(&compressed, input.len()).unwrap();
        assert_eq!(restored, input);
    }

    #[test]
    fn round_trips_single_symbol() {
        let input = vec![42u8; 100];
        let compressed = compress(&input);
        let restored = decompress(&compressed, input.len()).unwrap();
        assert_eq!(restored, input);
    }

    #[test]
    fn round_trips_empty() {
        let input: Vec<u8> = Vec::new();
        let compressed = compress(&input);
        let restored = decompress(&compressed, 0).unwrap();
        assert_eq!(restored, input);
    }
}
