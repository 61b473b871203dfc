//! A plot file chunk: `num_values` monotonically increasing fragment values
//! within one `2^PLOT_FILE_CHUNK_SPAN_RANGE_BITS`-wide range, stored as a
//! delta-from-previous-value split into an entropy-coded high byte ("delta
//! byte") and a fixed-width low bit-field ("stub").

use crate::error::{PlotFileError, PlotFileResult};
use crate::entropy;
use pos2_primitives::consts::PLOT_FILE_MINUS_STUB_BITS;

/// One decoded chunk: the sorted fragment values it covers, plus — for plots
/// built with `retain_x` — each value's eight-x-value table-3 provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotChunk {
    /// Ascending fragment values, relative to nothing in particular — callers
    /// compare against the full chunk's base offset as needed.
    pub values: Vec<u64>,
    /// Per-value x-value provenance, one entry per `values[i]`. Only present
    /// on plots written with `retain_x` set.
    pub xs: Option<Vec<[u32; 8]>>,
}

/// The stub width for a plot built at parameter `k`: `k - PLOT_FILE_MINUS_STUB_BITS`.
pub fn stub_bits(k: u32) -> u32 {
    k - PLOT_FILE_MINUS_STUB_BITS
}

/// Encode a chunk's sorted values (the first relative to `base`), and
/// optionally each value's x-value provenance, into its on-disk
/// representation: `(fse_bytes, stub_bytes, xs_bytes)`. `xs_bytes` is empty
/// when `xs` is `None`.
pub fn encode_chunk(
    base: u64,
    values: &[u64],
    xs: Option<&[[u32; 8]]>,
    k: u32,
) -> PlotFileResult<(Vec<u8>, Vec<u8>, Vec<u8>)> {
    let bits = stub_bits(k);
    let stub_mask = (1u64 << bits) - 1;

    let mut delta_bytes = Vec::with_capacity(values.len());
    let mut stubs = Vec::with_capacity(values.len());
    let mut prev = base;
    for &v in values {
        let delta = v - prev;
        let delta_byte = delta >> bits;
        if delta_byte > 255 {
            return Err(PlotFileError::DeltaOverflow { delta, stub_bits: bits });
        }
        delta_bytes.push(delta_byte as u8);
        stubs.push(delta & stub_mask);
        prev = v;
    }

    let fse_bytes = entropy::compress(&delta_bytes);
    let stub_bytes = pack_stubs(&stubs, bits);
    let xs_bytes = match xs {
        Some(xs) => encode_xs(xs),
        None => Vec::new(),
    };
    Ok((fse_bytes, stub_bytes, xs_bytes))
}

/// Flatten each value's eight x-values into 32 little-endian bytes apiece.
fn encode_xs(xs: &[[u32; 8]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(xs.len() * 32);
    for group in xs {
        for x in group {
            out.extend_from_slice(&x.to_le_bytes());
        }
    }
    out
}

/// Inverse of [`encode_xs`].
fn decode_xs(xs_bytes: &[u8], num_values: usize) -> PlotFileResult<Vec<[u32; 8]>> {
    if xs_bytes.len() != num_values * 32 {
        return Err(PlotFileError::CorruptStream);
    }
    let mut out = Vec::with_capacity(num_values);
    for chunk in xs_bytes.chunks_exact(32) {
        let mut group = [0u32; 8];
        for (x, bytes) in group.iter_mut().zip(chunk.chunks_exact(4)) {
            *x = u32::from_le_bytes(bytes.try_into().expect("chunks_exact(4)"));
        }
        out.push(group);
    }
    Ok(out)
}

/// Decode a chunk from its on-disk parts back into absolute fragment values.
/// `xs_bytes` must be empty unless the chunk was encoded with x-value
/// provenance attached.
pub fn decode_chunk(
    base: u64,
    num_values: u32,
    fse_bytes: &[u8],
    stub_bytes: &[u8],
    xs_bytes: &[u8],
    k: u32,
) -> PlotFileResult<PlotChunk> {
    let bits = stub_bits(k);
    let num_values = num_values as usize;
    let delta_bytes = entropy::decompress(fse_bytes, num_values)?;
    let stubs = unpack_stubs(stub_bytes, bits, num_values)?;

    let mut values = Vec::with_capacity(num_values);
    let mut prev = base;
    for i in 0..num_values {
        let delta = (u64::from(delta_bytes[i]) << bits) | stubs[i];
        prev += delta;
        values.push(prev);
    }
    let xs = if xs_bytes.is_empty() { None } else { Some(decode_xs(xs_bytes, num_values)?) };
    Ok(PlotChunk { values, xs })
}

/// LSB-first bit-pack a sequence of `bits`-wide values using a rolling 64-bit
/// buffer, flushing whole bytes as they fill.
fn pack_stubs(stubs: &[u64], bits: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity((stubs.len() * bits as usize).div_ceil(8));
    let mut buffer: u64 = 0;
    let mut filled: u32 = 0;
    for &stub in stubs {
        buffer |= stub << filled;
        filled += bits;
        while filled >= 8 {
            out.push((buffer & 0xFF) as u8);
            buffer >>= 8;
            filled -= 8;
        }
    }
    if filled > 0 {
        out.push((buffer & 0xFF) as u8);
    }
    out
}

/// Inverse of [`pack_stubs`].
fn unpack_stubs(data: &[u8], bits: u32, count: usize) -> PlotFileResult<Vec<u64>> {
    let mask = (1u64 << bits) - 1;
    let mut out = Vec::with_capacity(count);
    let mut buffer: u64 = 0;
    let mut filled: u32 = 0;
    let mut byte_pos = 0usize;

    for _ in 0..count {
        while filled < bits {
            let byte = *data.get(byte_pos).ok_or(PlotFileError::CorruptStream)?;
            buffer |= u64::from(byte) << filled;
            filled += 8;
            byte_pos += 1;
        }
        out.push(buffer & mask);
        buffer >>= bits;
        filled -= bits;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_pack_round_trips() {
        let bits = 22;
        let stubs: Vec<u64> = (0..50).map(|i| (i * 12345) & ((1 << bits) - 1)).collect();
        let packed = pack_stubs(&stubs, bits);
        let unpacked = unpack_stubs(&packed, bits, stubs.len()).unwrap();
        assert_eq!(stubs, unpacked);
    }

    #[test]
    fn chunk_round_trips() {
        let k = 24;
        let base = 1_000_000u64;
        let mut values = Vec::new();
        let mut v = base;
        for i in 0..200u64 {
            v += 10 + (i % 5) * 3;
            values.push(v);
        }
        let (fse, stub, xsb) = encode_chunk(base, &values, None, k).unwrap();
        let decoded = decode_chunk(base, values.len() as u32, &fse, &stub, &xsb, k).unwrap();
        assert_eq!(decoded.values, values);
        assert!(decoded.xs.is_none());
    }

    #[test]
    fn chunk_round_trips_with_retained_xs() {
        let k = 24;
        let base = 1_000_000u64;
        let mut values = Vec::new();
        let mut xs = Vec::new();
        let mut v = base;
        for i in 0..50u64 {
            v += 10 + (i % 5) * 3;
            values.push(v);
            xs.push([i as u32; 8]);
        }
        let (fse, stub, xsb) = encode_chunk(base, &values, Some(&xs), k).unwrap();
        let decoded = decode_chunk(base, values.len() as u32, &fse, &stub, &xsb, k).unwrap();
        assert_eq!(decoded.values, values);
        assert_eq!(decoded.xs, Some(xs));
    }

    #[test]
    fn delta_overflow_is_rejected() {
        let k = 24;
        let base = 0u64;
        let values = vec![1u64 << 40];
        assert!(matches!(
            encode_chunk(base, &values, None, k),
            Err(PlotFileError::DeltaOverflow { .. })
        ));
    }
}
