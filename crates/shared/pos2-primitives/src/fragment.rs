//! `ProofFragment`: the on-disk unit a plot file stores one per table-3 pair.
//! A fragment is the Feistel encryption of the two `k`-bit `x_bits` halves
//! (each itself two `k/2`-bit upper halves of an original x-value) contributed
//! by a table-3 pairing's left and right table-2 ancestors. Partition-routing
//! bit fields used by table 4/5 construction are plain bit-slices of the
//! *encrypted* fragment — no further decryption is needed to route a fragment
//! to its partition, only to recover the original `x_bits` halves.

use crate::consts::DEFAULT_FEISTEL_ROUNDS;
use crate::error::ProofResult;
use crate::feistel::FeistelCipher;
use crate::params::ProofParams;

/// A single proof fragment, opaque except through [`ProofFragmentCodec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::From, derive_more::Into)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ProofFragment(pub u64);

impl core::fmt::Display for ProofFragment {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Encodes/decodes [`ProofFragment`]s and slices out the partition-bit fields
/// table 4/5 construction needs, all relative to a fixed `ProofParams`.
#[derive(Debug, Clone)]
pub struct ProofFragmentCodec {
    cipher: FeistelCipher,
    k: u32,
    num_partition_bits: u32,
}

impl ProofFragmentCodec {
    /// Build a codec for the given parameters, keying the Feistel cipher off
    /// the plot id. The cipher's lane width is the full `k` (each lane holds
    /// one `x_bits` half), so the encrypted block is `2k` bits wide.
    pub fn new(params: &ProofParams) -> ProofResult<Self> {
        let k = params.k();
        let cipher = FeistelCipher::new(params.plot_id(), k, DEFAULT_FEISTEL_ROUNDS as u32)?;
        Ok(Self {
            cipher,
            k,
            num_partition_bits: params.num_partition_bits(),
        })
    }

    /// Encrypt a table-3 pairing's left/right `x_bits` (each `k` bits: two
    /// concatenated `k/2`-bit x-value upper halves) into a fragment.
    pub fn encode(&self, x_bits_l: u32, x_bits_r: u32) -> ProofFragment {
        let (el, er) = self.cipher.encrypt(x_bits_l, x_bits_r);
        ProofFragment((u64::from(el) << self.k) | u64::from(er))
    }

    /// Recover the `(x_bits_l, x_bits_r)` pair a fragment was built from.
    pub fn decode(&self, fragment: ProofFragment) -> (u32, u32) {
        let mask = (1u64 << self.k) - 1;
        let el = ((fragment.0 >> self.k) & mask) as u32;
        let er = (fragment.0 & mask) as u32;
        self.cipher.decrypt(el, er)
    }

    /// Order bits: the two bits immediately below the top `num_partition_bits`
    /// of the encrypted fragment.
    pub fn order_bits(&self, fragment: ProofFragment) -> u32 {
        let total_bits = 2 * self.k;
        let shift = total_bits - self.num_partition_bits - 2;
        ((fragment.0 >> shift) & 0b11) as u32
    }

    /// The top `num_partition_bits` of the encrypted fragment (MSB side).
    pub fn l_partition_bits(&self, fragment: ProofFragment) -> u32 {
        let total_bits = 2 * self.k;
        let shift = total_bits - self.num_partition_bits;
        ((fragment.0 >> shift) & ((1u64 << self.num_partition_bits) - 1)) as u32
    }

    /// The bottom `num_partition_bits` of the encrypted fragment (LSB side).
    pub fn r_partition_bits(&self, fragment: ProofFragment) -> u32 {
        (fragment.0 & ((1u64 << self.num_partition_bits) - 1)) as u32
    }

    /// The table-4-relative partition this fragment's left half routes to:
    /// `l_partition`, offset by `num_partitions` when the high order bit is set.
    pub fn lateral_to_t4_partition(&self, fragment: ProofFragment, num_partitions: u32) -> u32 {
        let l = self.l_partition_bits(fragment);
        if (self.order_bits(fragment) >> 1) == 0 {
            l
        } else {
            l + num_partitions
        }
    }

    /// The table-4-relative partition this fragment's right half routes to:
    /// `r_partition`, with the offset applied on the opposite order bit from
    /// [`lateral_to_t4_partition`].
    pub fn r_t4_partition(&self, fragment: ProofFragment, num_partitions: u32) -> u32 {
        let r = self.r_partition_bits(fragment);
        if (self.order_bits(fragment) & 1) == 0 {
            r + num_partitions
        } else {
            r
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_params(k: u32) -> ProofParams {
        let mut plot_id = [0u8; 32];
        for (i, b) in plot_id.iter_mut().enumerate() {
            *b = ((i as u32) * 11 + 5) as u8;
        }
        ProofParams::new(plot_id, k, 8).unwrap()
    }

    #[test]
    fn encode_decode_round_trips() {
        let params = test_params(24);
        let codec = ProofFragmentCodec::new(&params).unwrap();
        let mask = (1u32 << params.k()) - 1;
        for (l, r) in [(0u32, 0u32), (1, 2), (mask, mask / 2), (0x123456, 0xABCDEF)] {
            let fragment = codec.encode(l, r);
            assert_eq!(codec.decode(fragment), (l, r));
        }
    }

    #[test]
    fn partition_bits_are_raw_ciphertext_slices() {
        let params = test_params(24);
        let codec = ProofFragmentCodec::new(&params).unwrap();
        let fragment = codec.encode(123, 456);
        let total_bits = 2 * params.k();
        let expected_l = ((fragment.0 >> (total_bits - params.num_partition_bits()))
            & ((1u64 << params.num_partition_bits()) - 1)) as u32;
        assert_eq!(codec.l_partition_bits(fragment), expected_l);
        let expected_r = (fragment.0 & ((1u64 << params.num_partition_bits()) - 1)) as u32;
        assert_eq!(codec.r_partition_bits(fragment), expected_r);
    }

    #[test]
    fn t4_partition_offset_follows_order_bits() {
        let params = test_params(24);
        let codec = ProofFragmentCodec::new(&params).unwrap();
        let num_partitions = params.num_partitions();
        for seed in 0u32..64 {
            let fragment = codec.encode(seed, seed.wrapping_mul(7) + 3);
            let lateral = codec.lateral_to_t4_partition(fragment, num_partitions);
            let r = codec.r_t4_partition(fragment, num_partitions);
            assert!(lateral < 2 * num_partitions);
            assert!(r < 2 * num_partitions);
        }
    }
}
