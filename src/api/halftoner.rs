//! Contains the [`Halftoner`] session and the one-shot [`halftone`] function.

use crate::{
    dispatch_band, BandReport, DotVolumeTally, ErrorBufferStore, HalftoneError, InputRaster,
    OutputBuffers, Result, RunConfiguration, Sample,
};

/// A halftoning run over consecutive bands of one page.
///
/// The error buffers are allocated once and persist across bands,
/// so diffusion error carries from the bottom of one band into the top of the next.
///
/// # Examples
/// ```
/// # use inkjet_halftone::{Halftoner, HalftoneOptions, InputRaster, LookupTables};
/// # fn main() -> Result<(), inkjet_halftone::HalftoneError> {
/// let dot = (0..=255u16).map(|p| (p * 3 / 255) as u8).collect::<Vec<_>>();
/// let error = vec![0.0f32; 256 * 14];
/// let pct = [0.0, 0.33, 0.66, 1.0];
///
/// let config = HalftoneOptions::new()
///     .input_bit_depth(8)
///     .build(LookupTables::new(&dot, &error, &pct))?;
///
/// let mut halftoner = Halftoner::new(config, 8)?;
/// let band = vec![128u8; 4 * 4 * 4];
/// for _ in 0..3 {
///     let raster = InputRaster::new(&band, 4, 4, 4)?;
///     let mut output = halftoner.new_output(8)?;
///     halftoner.halftone_band(&raster, &mut output)?;
/// }
///
/// assert_eq!(halftoner.finish().total(), 8 * 8 * 4 * 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Halftoner<'a> {
    /// The run parameters and tables.
    config: RunConfiguration<'a>,
    /// Error carried between rows and bands.
    store: ErrorBufferStore,
    /// The output width every band is resampled to.
    output_width: usize,
    /// The number of bands halftoned so far.
    bands: u64,
    /// The run-global tally, by physical ink.
    tally: DotVolumeTally,
}

impl<'a> Halftoner<'a> {
    /// Starts a run producing `output_width` pixels per row.
    ///
    /// # Errors
    /// Returns [`HalftoneError::BufferBoundsExceeded`] if `output_width` is zero,
    /// or [`HalftoneError::Allocation`] if the error buffers cannot be allocated.
    pub fn new(config: RunConfiguration<'a>, output_width: usize) -> Result<Self> {
        if output_width == 0 {
            return Err(HalftoneError::BufferBoundsExceeded {
                what: "output width",
                expected: 1,
                actual: 0,
            });
        }

        let store = ErrorBufferStore::new(
            usize::from(config.kernel().height),
            config.channels(),
            output_width,
        )?;

        tracing::debug!(
            kernel = config.kernel().name,
            diffusion_depth = %config.diffusion_depth(),
            sample_depth = %config.sample_depth(),
            channels = config.channels(),
            dot_levels = config.dot_levels(),
            hysteresis = config.hysteresis(),
            threads = config.threads(),
            output_width,
            "starting halftoning run"
        );

        Ok(Self {
            config,
            store,
            output_width,
            bands: 0,
            tally: DotVolumeTally::new(),
        })
    }

    /// The run configuration.
    #[must_use]
    pub const fn config(&self) -> &RunConfiguration<'a> {
        &self.config
    }

    /// The output width.
    #[must_use]
    pub const fn output_width(&self) -> usize {
        self.output_width
    }

    /// The number of bands halftoned since the run started or was last reset.
    #[must_use]
    pub const fn bands(&self) -> u64 {
        self.bands
    }

    /// The accumulated diffusion error.
    #[must_use]
    pub const fn error_buffers(&self) -> &ErrorBufferStore {
        &self.store
    }

    /// Allocates output buffers for a band of `output_height` rows.
    ///
    /// # Errors
    /// Returns [`HalftoneError::BufferBoundsExceeded`] if `output_height` is zero,
    /// or [`HalftoneError::Allocation`] if the buffers cannot be allocated.
    pub fn new_output(&self, output_height: usize) -> Result<OutputBuffers> {
        OutputBuffers::new(self.output_width, output_height, self.config.channels())
    }

    /// Halftones the next band, resampling `raster` to the size of `output`.
    ///
    /// # Errors
    /// Returns [`HalftoneError::SampleDepthMismatch`] if the samples do not have the
    /// configured depth, or [`HalftoneError::BufferBoundsExceeded`] if the raster or
    /// `output` do not match the run's channel count and output width.
    /// A failed band leaves the run-global tally unchanged.
    pub fn halftone_band<S: Sample>(
        &mut self,
        raster: &InputRaster<'_, S>,
        output: &mut OutputBuffers,
    ) -> Result<BandReport> {
        HalftoneError::check_len("output width", self.output_width, output.width())?;

        let report = dispatch_band(&self.config, self.bands, *raster, &mut self.store, output)?;
        self.tally.merge(&report.tally);
        self.bands += 1;

        tracing::debug!(
            band = self.bands - 1,
            strategy = ?report.strategy,
            tasks = report.tasks,
            dots = report.tally.total(),
            "band halftoned"
        );

        Ok(report)
    }

    /// The dots emitted so far, by physical ink.
    #[must_use]
    pub const fn dot_volume(&self) -> &DotVolumeTally {
        &self.tally
    }

    /// Zeroes the accumulated error and the tally, e.g. to start a new page.
    pub fn reset(&mut self) {
        self.store.clear();
        self.tally.clear();
        self.bands = 0;
    }

    /// Ends the run, returning the final tally.
    #[must_use]
    pub fn finish(self) -> DotVolumeTally {
        tracing::debug!(bands = self.bands, dots = self.tally.total(), "halftoning run finished");
        self.tally
    }
}

/// Halftones a single band with fresh error buffers.
///
/// # Errors
/// Returns any error of [`Halftoner::new`], [`Halftoner::new_output`],
/// or [`Halftoner::halftone_band`].
pub fn halftone<S: Sample>(
    config: RunConfiguration<'_>,
    raster: &InputRaster<'_, S>,
    output_width: usize,
    output_height: usize,
) -> Result<(OutputBuffers, DotVolumeTally)> {
    let mut halftoner = Halftoner::new(config, output_width)?;
    let mut output = halftoner.new_output(output_height)?;
    halftoner.halftone_band(raster, &mut output)?;
    Ok((output, halftoner.finish()))
}
