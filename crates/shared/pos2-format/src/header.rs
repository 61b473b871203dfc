//! Fixed-size plot file header: magic, format version, plot id, proof
//! parameters and a free-form memo field.

use crate::error::{PlotFileError, PlotFileResult};
use pos2_primitives::consts::{PLOT_FORMAT_VERSION, PLOT_FORMAT_VERSION_RETAIN_X};
use std::io::{Read, Write};

const MAGIC: &[u8; 4] = b"pos2";
/// Memo layout: 32 bytes of farmer public key, 48 bytes of pool public key,
/// 32 bytes of plot seed — a fixed 112-byte free-form record.
const MEMO_LEN: usize = 32 + 48 + 32;

/// The fixed-size portion of a plot file, preceding the chunk-offset table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotHeader {
    /// On-disk format version.
    pub version: u8,
    /// 32-byte plot identifier.
    pub plot_id: [u8; 32],
    /// `k`: x-value bit width.
    pub k: u8,
    /// Table-3 match-key bit width.
    pub strength: u8,
    /// Free-form 112-byte memo.
    pub memo: [u8; MEMO_LEN],
    /// Whether this plot retains raw x-values up to table 3 (debug format).
    pub retain_x: bool,
}

impl PlotHeader {
    /// Whether `version` is one this build can read.
    pub fn is_supported_version(version: u8) -> bool {
        version == PLOT_FORMAT_VERSION || version == PLOT_FORMAT_VERSION_RETAIN_X
    }

    /// Construct a header for a fresh plot.
    pub fn new(plot_id: [u8; 32], k: u8, strength: u8, memo: [u8; MEMO_LEN], retain_x: bool) -> Self {
        let version = if retain_x {
            PLOT_FORMAT_VERSION_RETAIN_X
        } else {
            PLOT_FORMAT_VERSION
        };
        Self { version, plot_id, k, strength, memo, retain_x }
    }

    /// Serialize the header to `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> PlotFileResult<()> {
        writer.write_all(MAGIC)?;
        writer.write_all(&[self.version])?;
        writer.write_all(&self.plot_id)?;
        writer.write_all(&[self.k, self.strength])?;
        writer.write_all(&self.memo)?;
        Ok(())
    }

    /// Parse a header from `reader`.
    pub fn read_from<R: Read>(reader: &mut R) -> PlotFileResult<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(PlotFileError::BadMagic);
        }
        let mut version = [0u8; 1];
        reader.read_exact(&mut version)?;
        let version = version[0];
        if !Self::is_supported_version(version) {
            return Err(PlotFileError::UnsupportedVersion(version));
        }
        let mut plot_id = [0u8; 32];
        reader.read_exact(&mut plot_id)?;
        let mut k_strength = [0u8; 2];
        reader.read_exact(&mut k_strength)?;
        let mut memo = [0u8; MEMO_LEN];
        reader.read_exact(&mut memo)?;
        Ok(Self {
            version,
            plot_id,
            k: k_strength[0],
            strength: k_strength[1],
            memo,
            retain_x: version == PLOT_FORMAT_VERSION_RETAIN_X,
        })
    }

    /// Byte length of the fixed header, independent of its contents.
    pub const fn encoded_len() -> usize {
        4 + 1 + 32 + 2 + MEMO_LEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let header = PlotHeader::new([7u8; 32], 24, 8, [9u8; MEMO_LEN], false);
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), PlotHeader::encoded_len());
        let parsed = PlotHeader::read_from(&mut &buf[..]).unwrap();
        assert_eq!(header, parsed);
    }

    #[test]
    fn rejects_bad_magic() {
        let buf = vec![0u8; PlotHeader::encoded_len()];
        assert!(matches!(
            PlotHeader::read_from(&mut &buf[..]),
            Err(PlotFileError::BadMagic)
        ));
    }
}
