//! The row halftone processor.
//!
//! One call halftones one output row of one channel: every output pixel is resampled from the
//! input band, adjusted by the accumulated error and (optionally) adaptive noise, quantized
//! through the dot table, and its residual error is spread over the error plane.

use crate::{
    BitDepth, DotVolumeTally, ErrorPlane, HalftoneError, InputRaster, Result, RowSink,
    RunConfiguration, Sample, ScanDirection, KERNEL_WIDTH, MAX_DOT_LEVELS, MAX_OUTPUT_ROWS,
};
use crate::kernel::KERNEL_CENTER;
use crate::output::preview_value;
use rand::{prelude::Distribution, SeedableRng};
use rand_distr::Uniform;
use rand_xoshiro::Xoroshiro128PlusPlus;

/// A seeded source of adaptive white noise.
///
/// Each task owns one, so noise is reproducible for a fixed seed and partition plan.
#[derive(Debug, Clone)]
pub struct NoiseSource {
    /// The generator.
    rng: Xoroshiro128PlusPlus,
    /// Raw draws in `0..spread`.
    distribution: Uniform<i32>,
    /// Subtracted from each raw draw to center it.
    offset: i32,
    /// Whether noise is injected at all.
    enabled: bool,
}

impl NoiseSource {
    /// Creates the noise source for `config`, mixing `key` into the configured seed.
    #[must_use]
    pub fn new(config: &RunConfiguration<'_>, key: u64) -> Self {
        let noise = config.noise();

        #[allow(clippy::cast_possible_truncation)]
        let (spread, offset) = (noise.spread as i32, noise.offset as i32);

        Self {
            rng: Xoroshiro128PlusPlus::seed_from_u64(config.seed() ^ key),
            distribution: Uniform::new(0, spread.max(1)),
            offset,
            enabled: config.noise_enabled(),
        }
    }

    /// Draws one noise offset, scaled by the local flatness `q`.
    #[inline]
    fn draw(&mut self, q: f32) -> i32 {
        if !self.enabled {
            return 0;
        }

        let raw = self.distribution.sample(&mut self.rng) - self.offset;

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        {
            (raw as f32 * q) as i32
        }
    }
}

/// Maps an output position onto the two nearest input positions and the fraction between them.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn corners(pos: usize, input_len: usize, output_len: usize) -> (usize, usize, f32) {
    let src = pos as f64 * input_len as f64 / output_len as f64;
    let last = input_len - 1;
    let lo = (src.floor() as usize).min(last);
    let hi = (src.ceil() as usize).min(last);
    let frac = if hi == lo { 0.0 } else { (src - lo as f64) as f32 };
    (lo, hi, frac)
}

/// Linear interpolation from `a` to `b`.
#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Adds the weights of one kernel to the error plane around `column`.
///
/// Slot `s` of every kernel row lands on `column + (s - 3) * step`;
/// contributions that fall outside of the row are dropped.
pub(crate) fn diffuse(plane: &mut ErrorPlane<'_>, column: usize, step: isize, weights: &[f32]) {
    let width = plane.width();
    for (row, weights) in weights.chunks_exact(KERNEL_WIDTH).enumerate() {
        for (slot, &error) in weights.iter().enumerate() {
            #[allow(clippy::cast_possible_wrap)]
            let offset = (slot as isize - KERNEL_CENTER as isize) * step;
            if let Some(target) = column.checked_add_signed(offset).filter(|&t| t < width) {
                plane.add(row, target, error);
            }
        }
    }
}

/// Halftones output rows of one band.
///
/// The processor is shared read-only by all tasks of a band;
/// each call mutates only the error plane, sink, noise source, and tally it is handed.
#[derive(Debug)]
pub struct RowHalftoner<'r, 'a, S> {
    /// The run parameters and tables.
    config: &'r RunConfiguration<'a>,
    /// The input band.
    raster: InputRaster<'r, S>,
    /// Output band width.
    output_width: usize,
    /// Output band height.
    output_height: usize,
    /// Scale from sample values to diffusion intensities.
    scale: f32,
    /// Preview value per dot level.
    preview: [u8; MAX_DOT_LEVELS],
}

impl<'r, 'a, S: Sample> RowHalftoner<'r, 'a, S> {
    /// Creates a processor that resamples `raster` to `output_width` by `output_height`.
    ///
    /// # Errors
    /// Returns [`HalftoneError::SampleDepthMismatch`] if `S` does not have the configured
    /// sample depth, or [`HalftoneError::BufferBoundsExceeded`] if the raster's channel count
    /// differs from the configuration or the output dimensions are empty or too tall.
    pub fn new(
        config: &'r RunConfiguration<'a>,
        raster: InputRaster<'r, S>,
        output_width: usize,
        output_height: usize,
    ) -> Result<Self> {
        let sample_bits = config.sample_depth().bits();
        if S::BITS != sample_bits {
            return Err(HalftoneError::SampleDepthMismatch {
                expected: sample_bits,
                actual: S::BITS,
            });
        }
        HalftoneError::check_len("raster channels", config.channels(), raster.channels())?;
        if output_width == 0 || output_height == 0 {
            return Err(HalftoneError::BufferBoundsExceeded {
                what: "output band area",
                expected: 1,
                actual: 0,
            });
        }
        if output_height > MAX_OUTPUT_ROWS {
            return Err(HalftoneError::BufferBoundsExceeded {
                what: "output band height",
                expected: MAX_OUTPUT_ROWS,
                actual: output_height,
            });
        }

        // 8-bit samples are widened when diffusing at 16 bits
        let scale = if S::BITS == 8 && config.diffusion_depth() == BitDepth::Sixteen {
            config.noise().scale
        } else {
            1.0
        };

        let mut preview = [0; MAX_DOT_LEVELS];
        for (value, &pct) in preview.iter_mut().zip(config.tables().dot_level_percent) {
            *value = preview_value(pct);
        }

        Ok(Self { config, raster, output_width, output_height, scale, preview })
    }

    /// The run configuration.
    #[must_use]
    pub const fn config(&self) -> &'r RunConfiguration<'a> {
        self.config
    }

    /// Output band width.
    #[must_use]
    pub const fn output_width(&self) -> usize {
        self.output_width
    }

    /// Output band height.
    #[must_use]
    pub const fn output_height(&self) -> usize {
        self.output_height
    }

    /// Bilinearly resamples `channel` at output column `column` between input rows `y`.
    fn resample(&self, column: usize, (y1, y2, fy): (usize, usize, f32), channel: usize) -> f32 {
        let (x1, x2, fx) = corners(column, self.raster.width(), self.output_width);
        let sample = |x, y| self.raster.sample(x, y, channel).to_f32() * self.scale;

        let top = lerp(sample(x1, y1), sample(x2, y1), fx);
        let bottom = lerp(sample(x1, y2), sample(x2, y2), fx);
        lerp(top, bottom, fy).clamp(0.0, self.config.max_pixel_value())
    }

    /// Checks that the buffers handed to [`RowHalftoner::process_row`] fit this band.
    fn check_row(
        &self,
        row: usize,
        channel: usize,
        plane: &ErrorPlane<'_>,
        sink: &RowSink<'_>,
    ) -> Result<()> {
        if row >= self.output_height {
            return Err(HalftoneError::BufferBoundsExceeded {
                what: "output row",
                expected: self.output_height,
                actual: row,
            });
        }
        if channel >= self.config.channels() {
            return Err(HalftoneError::BufferBoundsExceeded {
                what: "channel",
                expected: self.config.channels(),
                actual: channel,
            });
        }
        HalftoneError::check_len("error plane width", self.output_width, plane.width())?;
        HalftoneError::check_len(
            "error plane rows",
            usize::from(self.config.kernel().height),
            plane.rows(),
        )?;
        HalftoneError::check_len("ink row width", self.output_width, sink.ink.len())?;
        HalftoneError::check_len("preview row width", self.output_width, sink.preview.len())
    }

    /// Halftones output row `row` of logical channel `channel`.
    ///
    /// Error is read from and diffused into `plane`; dots are written to `sink`
    /// and counted in `tally` under the logical channel.
    ///
    /// # Errors
    /// Returns [`HalftoneError::BufferBoundsExceeded`] if `row` or `channel` is out of range,
    /// or if the plane or sink widths differ from the output width.
    pub fn process_row(
        &self,
        row: usize,
        channel: usize,
        plane: &mut ErrorPlane<'_>,
        sink: RowSink<'_>,
        noise: &mut NoiseSource,
        tally: &mut DotVolumeTally,
    ) -> Result<()> {
        self.check_row(row, channel, plane, &sink)?;
        let RowSink { ink, preview } = sink;

        let config = self.config;
        let tables = config.tables();
        let kernel_size = config.kernel().size();
        let max = config.max_pixel_value();
        #[allow(clippy::cast_possible_truncation)]
        let max_index = max as i32;

        let width = self.output_width;
        let direction = ScanDirection::for_row(row, config.serpentine());
        let rows = corners(row, self.raster.height(), self.output_height);

        let mut average = 0.0;
        for i in 0..width {
            let column = match direction {
                ScanDirection::Forward => i,
                ScanDirection::Reverse => width - 1 - i,
            };

            let value = self.resample(column, rows, channel);
            let error = plane.current(column);

            average = (average + value) / 2.0;
            let flatness = 1.0 - (average - value).abs() / max;

            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let intensity = if value > 0.0 {
                let adjusted =
                    ((value + error).round() as i32).saturating_add(noise.draw(flatness));
                adjusted.clamp(0, max_index) as usize
            } else {
                0
            };

            let dot = tables.dot[intensity];
            diffuse(plane, column, direction.step(), tables.error_weights(intensity, kernel_size));
            plane.shift(column);

            ink[column] = dot;
            preview[column] = self.preview[usize::from(dot)];
            tally.record(channel, dot);
        }

        Ok(())
    }
}
