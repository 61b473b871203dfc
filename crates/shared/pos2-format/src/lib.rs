//! On-disk plot file format: header, chunked delta/stub codec, and the
//! hand-rolled entropy coder backing the delta-byte stream.

pub mod chunk;
pub mod entropy;
pub mod error;
pub mod header;
pub mod plotfile;

pub use chunk::PlotChunk;
pub use error::{PlotFileError, PlotFileResult};
pub use header::PlotHeader;
pub use plotfile::{write_plot_file, PlotFileReader};
