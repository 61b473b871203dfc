//! Five-table proof-of-space plotting pipeline: bucket-joins `x`-values
//! through the table 1→3 pairing cascade into [`pos2_primitives::fragment::ProofFragment`]s,
//! prunes them via the table 4/5 cascade, and writes the survivors out as a
//! [`pos2_format`] plot file.
//!
//! Deliberately implemented over plain `Vec`s rather than the SIMD/unsafe
//! bucket arrays a production plotter would use at `k` large enough to need
//! disk-backed streaming — see `DESIGN.md`.

pub mod error;
pub mod matchjoin;
pub mod plotdata;
pub mod progress;
pub mod prune;
pub mod radix;
pub mod table;
pub mod xgen;

pub use error::{PlotError, PlotResult};
pub use plotdata::{plot, PlotStats};
pub use progress::{NullProgressSink, PlotProgressSink, TracingProgressSink};
