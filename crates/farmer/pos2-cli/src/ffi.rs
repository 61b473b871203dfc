//! C ABI: thin, panic-safe wrappers around [`crate::commands`], exposed for
//! embedding `pos2-cli` into non-Rust callers (e.g. a node's consensus
//! verifier). Every entry point translates its typed [`crate::error::CliError`]
//! down to a small integer sentinel rather than unwinding across the FFI
//! boundary, which is undefined behavior.

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::ptr;

use crate::commands;

/// Call succeeded.
pub const POS2_OK: i32 = 0;
/// Call completed but the proof/challenge did not validate, which is not an error.
pub const POS2_INVALID: i32 = 1;
/// An argument (pointer, length, encoding) was unusable.
pub const POS2_BAD_ARGUMENT: i32 = 2;
/// An underlying operation failed (I/O, malformed plot file, bad params).
pub const POS2_ERROR: i32 = 3;
/// The call panicked; caught at the boundary rather than unwinding into C.
pub const POS2_PANIC: i32 = -1;

/// A quality chain as handed across the C ABI: 16 packed fragment values plus
/// the `strength` the plot/proof was built with, so a caller can feed it
/// straight into [`pos2_solve_partial_proof`] without a side channel.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct QualityChain {
    /// The chain's 16 fragment values, in depth order.
    pub fragments: [u64; 16],
    /// Table-3 match-key bit width the owning plot/proof used.
    pub strength: u8,
}

impl QualityChain {
    fn from_chain(chain: &pos2_primitives::chain::Chain, strength: u8) -> Self {
        let mut fragments = [0u64; 16];
        for (dst, src) in fragments.iter_mut().zip(chain.fragments.iter()) {
            *dst = src.0;
        }
        Self { fragments, strength }
    }
}

/// Copy up to `cap` [`QualityChain`]s into `out`, returning how many were
/// written.
///
/// # Safety
/// `out` must be valid for `cap` writes, or `cap` must be 0.
unsafe fn write_quality_chains(
    out: *mut QualityChain,
    cap: u32,
    strength: u8,
    chains: &[pos2_primitives::chain::Chain],
) -> u32 {
    let written = chains.len().min(cap as usize);
    if !out.is_null() {
        for (i, chain) in chains.iter().take(written).enumerate() {
            // SAFETY: caller guarantees `out` holds at least `cap` entries.
            unsafe { ptr::write(out.add(i), QualityChain::from_chain(chain, strength)) };
        }
    }
    written as u32
}

/// Read a `len`-byte buffer from a raw pointer into an owned array.
///
/// # Safety
/// `ptr` must be valid for reads of `N` bytes, or null.
unsafe fn read_array<const N: usize>(ptr: *const u8) -> Option<[u8; N]> {
    if ptr.is_null() {
        return None;
    }
    let mut out = [0u8; N];
    // SAFETY: caller guarantees `ptr` is valid for `N` bytes.
    unsafe { std::ptr::copy_nonoverlapping(ptr, out.as_mut_ptr(), N) };
    Some(out)
}

/// Read a `len`-element `u32` buffer from a raw pointer.
///
/// # Safety
/// `ptr` must be valid for reads of `N` `u32`s, or null.
unsafe fn read_u32_array<const N: usize>(ptr: *const u32) -> Option<[u32; N]> {
    if ptr.is_null() {
        return None;
    }
    let mut out = [0u32; N];
    // SAFETY: caller guarantees `ptr` is valid for `N` `u32`s.
    unsafe { std::ptr::copy_nonoverlapping(ptr, out.as_mut_ptr(), N) };
    Some(out)
}

/// Run `body`, catching panics and mapping the result to a sentinel.
fn guard(body: impl FnOnce() -> Result<bool, crate::error::CliError>) -> i32 {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(true)) => POS2_OK,
        Ok(Ok(false)) => POS2_INVALID,
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "pos2-cli ffi call failed");
            match err {
                crate::error::CliError::InvalidArgument { .. } => POS2_BAD_ARGUMENT,
                _ => POS2_ERROR,
            }
        }
        Err(_) => POS2_PANIC,
    }
}

/// Validate a standalone 128-x-value proof against `plot_id`/`k`/`strength`
/// and a 32-byte `challenge`. All pointers must reference buffers of exactly
/// the documented length. On success, the validated chain is written to
/// `out_chain` (ignored if null).
///
/// # Safety
/// `plot_id` and `challenge` must be valid for 32 byte reads; `xs` for 128
/// `u32` reads; `out_chain` must be valid for one write, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pos2_validate_proof(
    plot_id: *const u8,
    k: u32,
    strength: u8,
    xs: *const u32,
    challenge: *const u8,
    out_chain: *mut QualityChain,
) -> i32 {
    guard(|| {
        // SAFETY: pointer contracts are documented on this function.
        let plot_id = unsafe { read_array::<32>(plot_id) }.ok_or(crate::error::CliError::InvalidArgument {
            field: "plot_id",
            reason: "null pointer".to_string(),
        })?;
        // SAFETY: pointer contracts are documented on this function.
        let xs = unsafe { read_u32_array::<128>(xs) }.ok_or(crate::error::CliError::InvalidArgument {
            field: "xs",
            reason: "null pointer".to_string(),
        })?;
        // SAFETY: pointer contracts are documented on this function.
        let challenge = unsafe { read_array::<32>(challenge) }.ok_or(crate::error::CliError::InvalidArgument {
            field: "challenge",
            reason: "null pointer".to_string(),
        })?;

        match commands::verify_proof(plot_id, k, strength, &xs, challenge) {
            Ok(chain) => {
                if !out_chain.is_null() {
                    // SAFETY: caller guarantees `out_chain` is valid for one write.
                    unsafe { ptr::write(out_chain, QualityChain::from_chain(&chain, strength)) };
                }
                Ok(true)
            }
            Err(crate::error::CliError::Validation(_)) => Ok(false),
            Err(other) => Err(other),
        }
    })
}

/// Scan a plot file at `path` for quality chains answering `challenge`,
/// writing up to `num_outputs` of them into `out_chains` and the count
/// actually found (which may exceed `num_outputs`) into `out_count`.
///
/// The scan filter threshold is a plot-parameter-derived constant, not a
/// caller-supplied knob (see [`pos2_prover::chaining_sets`] and
/// `pos2_prover`'s internal `scan_filter`), so there is no separate
/// `scan_filter` argument here.
///
/// # Safety
/// `path` must be a valid, NUL-terminated C string. `challenge` must be valid
/// for 32 byte reads. `out_chains` must be valid for `num_outputs` writes, or
/// null if `num_outputs` is 0. `out_count` must be valid for one `u32` write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pos2_qualities_for_challenge(
    path: *const c_char,
    challenge: *const u8,
    out_chains: *mut QualityChain,
    num_outputs: u32,
    out_count: *mut u32,
) -> i32 {
    guard(|| {
        if path.is_null() || out_count.is_null() {
            return Err(crate::error::CliError::InvalidArgument {
                field: "path",
                reason: "null pointer".to_string(),
            });
        }
        // SAFETY: caller guarantees `path` is NUL-terminated.
        let path_str = unsafe { CStr::from_ptr(path) }
            .to_str()
            .map_err(|err| crate::error::CliError::InvalidArgument {
                field: "path",
                reason: err.to_string(),
            })?;
        // SAFETY: pointer contract documented on this function.
        let challenge = unsafe { read_array::<32>(challenge) }.ok_or(crate::error::CliError::InvalidArgument {
            field: "challenge",
            reason: "null pointer".to_string(),
        })?;

        let (header, _) = commands::prover_check(Path::new(path_str))?;
        let chains = commands::prover_challenge(Path::new(path_str), challenge)?;
        // SAFETY: pointer contracts documented on this function.
        unsafe { write_quality_chains(out_chains, num_outputs, header.strength, &chains) };
        // SAFETY: caller guarantees `out_count` is valid for one write.
        unsafe { ptr::write(out_count, chains.len() as u32) };
        Ok(true)
    })
}

/// Reconstruct full proofs from 16 packed fragment values, writing up to
/// `out_xs_cap` candidates (128 `u32`s each) into `out_xs` and the number
/// actually written into `out_count`.
///
/// # Safety
/// `plot_id` valid for 32 byte reads, `fragments` for 16 `u64` reads,
/// `out_xs` for `out_xs_cap * 128` `u32` writes, `out_count` for one write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pos2_solve_partial_proof(
    plot_id: *const u8,
    k: u32,
    strength: u8,
    fragments: *const u64,
    out_xs: *mut u32,
    out_xs_cap: u32,
    out_count: *mut u32,
) -> i32 {
    guard(|| {
        if fragments.is_null() || out_xs.is_null() || out_count.is_null() {
            return Err(crate::error::CliError::InvalidArgument {
                field: "fragments",
                reason: "null pointer".to_string(),
            });
        }
        // SAFETY: pointer contract documented on this function.
        let plot_id = unsafe { read_array::<32>(plot_id) }.ok_or(crate::error::CliError::InvalidArgument {
            field: "plot_id",
            reason: "null pointer".to_string(),
        })?;
        let mut raw_fragments = [0u64; 16];
        // SAFETY: caller guarantees `fragments` is valid for 16 `u64` reads.
        unsafe { std::ptr::copy_nonoverlapping(fragments, raw_fragments.as_mut_ptr(), 16) };
        let fragments: [pos2_primitives::fragment::ProofFragment; 16] =
            raw_fragments.map(pos2_primitives::fragment::ProofFragment);

        let params = pos2_primitives::params::ProofParams::new(plot_id, k, strength)?;
        let hashing = pos2_primitives::hash::ProofHashing::new(plot_id, k);
        let fragment_codec = pos2_primitives::fragment::ProofFragmentCodec::new(&params)?;
        let candidates = pos2_solver::solve(&hashing, &params, &fragment_codec, &fragments)?;

        let written = candidates.len().min(out_xs_cap as usize);
        for (i, xs) in candidates.iter().take(written).enumerate() {
            // SAFETY: caller guarantees `out_xs` holds `out_xs_cap * 128` `u32`s.
            unsafe { std::ptr::copy_nonoverlapping(xs.as_ptr(), out_xs.add(i * 128), 128) };
        }
        // SAFETY: caller guarantees `out_count` is valid for one write.
        unsafe { ptr::write(out_count, written as u32) };
        Ok(true)
    })
}

/// Plot `plot_id`/`k`/`strength` with the given 112-byte `memo` and write the
/// result to `out_path`.
///
/// # Safety
/// `plot_id` valid for 32 byte reads, `memo` for 112 byte reads, `out_path` a
/// valid NUL-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pos2_create_plot(
    plot_id: *const u8,
    k: u32,
    strength: u8,
    memo: *const u8,
    retain_x: u8,
    out_path: *const c_char,
) -> i32 {
    guard(|| {
        if out_path.is_null() {
            return Err(crate::error::CliError::InvalidArgument {
                field: "out_path",
                reason: "null pointer".to_string(),
            });
        }
        // SAFETY: pointer contract documented on this function.
        let plot_id = unsafe { read_array::<32>(plot_id) }.ok_or(crate::error::CliError::InvalidArgument {
            field: "plot_id",
            reason: "null pointer".to_string(),
        })?;
        // SAFETY: pointer contract documented on this function.
        let memo = unsafe { read_array::<112>(memo) }.ok_or(crate::error::CliError::InvalidArgument {
            field: "memo",
            reason: "null pointer".to_string(),
        })?;
        // SAFETY: caller guarantees `out_path` is NUL-terminated.
        let path_str = unsafe { CStr::from_ptr(out_path) }
            .to_str()
            .map_err(|err| crate::error::CliError::InvalidArgument {
                field: "out_path",
                reason: err.to_string(),
            })?;

        commands::plotter_test(Path::new(path_str), plot_id, k, strength, memo, retain_x != 0)?;
        Ok(true)
    })
}
