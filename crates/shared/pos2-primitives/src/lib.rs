//! Core proof-of-space primitives: keyed hashes, the Feistel fragment codec,
//! the table 1–5 pairing cascade, and full-proof validation.
//!
//! This crate has no notion of a plot file on disk or a challenge-scanning
//! loop — those live in `pos2-format` and `pos2-prover`/`pos2-solver`
//! respectively. Everything here is pure, allocation-light, and safe to call
//! from any thread.

pub mod chain;
pub mod consts;
pub mod core;
pub mod error;
pub mod feistel;
pub mod fragment;
pub mod hash;
pub mod params;
pub mod validator;

pub use chain::{find_links, passing_zeros_needed, Chain};
pub use error::{ProofError, ProofResult};
pub use fragment::{ProofFragment, ProofFragmentCodec};
pub use hash::ProofHashing;
pub use params::{ProofParams, Range};
pub use validator::{validate_full_proof, ValidationError};
