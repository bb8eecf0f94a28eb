//! A library for parallel error-diffusion halftoning of CMYK (or up to 16 channel) rasters
//! into printable multi-level dot patterns.
//!
//! Each band of the input raster is bilinearly rescaled to the output resolution as part of
//! the diffusion loop, quantized into dot levels through a caller-supplied dot table, and its
//! residual error is spread with one of 17 kernels through a caller-supplied error table.
//! Optional adaptive white noise (hysteresis) breaks up worm artifacts in flat regions.
//!
//! The output of every band is one plane of dot levels per physical ink, an 8-bit preview,
//! and a tally of the dots printed per ink and level for ink usage reporting.
//!
//! # Features
//! - `threads`: runs the tasks of a band concurrently via [`rayon`]. Enabled by default.
//! - `serde`: derives `Serialize` and `Deserialize` for [`HalftoneOptions`], [`BandReport`],
//!   and [`DotVolumeTally`].
//!
//! # Example
//! ```
//! # use inkjet_halftone::{Halftoner, HalftoneOptions, InputRaster, LookupTables};
//! # fn main() -> Result<(), inkjet_halftone::HalftoneError> {
//! // tables are normally built from printer calibration data
//! let dot = (0..=255u16).map(|p| (p * 3 / 255) as u8).collect::<Vec<_>>();
//! let error = vec![0.0f32; 256 * inkjet_halftone::kernel_size(16)?];
//! let pct = [0.0, 0.35, 0.7, 1.0];
//!
//! let config = HalftoneOptions::new()
//!     .input_bit_depth(8)
//!     .image_bit_depth(8)
//!     .build(LookupTables::new(&dot, &error, &pct))?;
//!
//! // a 4x2 CMYK band, upscaled to 8x4
//! let cmyk = vec![64u8; 4 * 2 * 4];
//! let raster = InputRaster::new(&cmyk, 4, 2, 4)?;
//!
//! let mut halftoner = Halftoner::new(config, 8)?;
//! let mut output = halftoner.new_output(4)?;
//! let report = halftoner.halftone_band(&raster, &mut output)?;
//!
//! assert_eq!(output.ink(0).len(), 8 * 4);
//! assert_eq!(report.tally.total(), 8 * 4 * 4);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod api;
mod buffers;
mod diffusion;
mod dispatch;
mod error;
mod kernel;
mod output;
mod tables;
mod traits;
mod types;


pub use api::*;
pub use buffers::{ErrorBufferStore, ErrorPlane};
pub use diffusion::{NoiseSource, RowHalftoner};
pub use dispatch::{dispatch_band, plan, BandReport, Strategy, WorkUnit};
pub use error::{ErrorKind, HalftoneError, Result};
pub use kernel::{
    kernel_height, kernel_info, kernel_size, Kernel, KERNELS, KERNEL_WIDTH, NUM_KERNELS,
};
pub use output::{preview_value, DotVolumeTally, OutputBuffers, RowSink};
pub use tables::LookupTables;
pub use traits::*;
pub use types::*;

/// The maximum supported number of color channels (and physical inks) is `16`.
pub const MAX_CHANNELS: usize = 16;

/// The maximum supported number of dot levels, including "no dot", is `16`.
pub const MAX_DOT_LEVELS: usize = 16;

/// The maximum number of input rows in one band is `255`.
pub const MAX_BAND_ROWS: usize = u8::MAX as usize;

/// The maximum number of output rows in one band is `65535`.
pub const MAX_OUTPUT_ROWS: usize = u16::MAX as usize;
