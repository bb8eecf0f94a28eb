//! Contains the [`HalftoneOptions`] builder and the validated [`RunConfiguration`].

use crate::{
    kernel_info, BitDepth, HalftoneError, Kernel, LookupTables, Result, MAX_CHANNELS,
    MAX_DOT_LEVELS,
};

/// The hysteresis used when an out of range value is supplied.
pub const DEFAULT_HYSTERESIS: f32 = 0.15;

/// The default ink order: logical C, M, Y, K print on physical inks 1, 2, 3, 0.
pub const DEFAULT_INK_ORDER: [u8; MAX_CHANNELS] =
    [1, 2, 3, 0, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];

/// A builder struct to specify the parameters of a halftoning run.
///
/// Raw values are only stored by the setters;
/// validation and normalization happen in [`HalftoneOptions::build`].
///
/// # Examples
/// ```
/// # use inkjet_halftone::{HalftoneOptions, LookupTables};
/// # fn main() -> Result<(), inkjet_halftone::HalftoneError> {
/// let dot = vec![0u8; 256];
/// let error = vec![0.0f32; 256 * 14];
/// let pct = [0.0, 0.4, 0.7, 1.0];
///
/// let config = HalftoneOptions::new()
///     .kernel(16)
///     .input_bit_depth(8)
///     .image_bit_depth(8)
///     .hysteresis(0.0)
///     .threads(1)
///     .build(LookupTables::new(&dot, &error, &pct))?;
///
/// assert_eq!(config.max_pixel_value(), 255.0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HalftoneOptions {
    /// Index into the kernel catalog.
    kernel: u8,
    /// The bit depth error diffusion is performed at.
    input_bit_depth: u8,
    /// The bit depth of the input raster samples.
    image_bit_depth: u8,
    /// Whether the source image was RGB (and converted to 16-bit CMYK upstream).
    rgb_source: bool,
    /// White noise intensity.
    hysteresis: f32,
    /// Number of color channels.
    channels: u8,
    /// Number of dot levels, including "no dot".
    dot_levels: u8,
    /// Logical channel to physical ink.
    ink_order: [u8; MAX_CHANNELS],
    /// Whether to alternate the scan direction per row.
    serpentine: bool,
    /// Whether tasks may run concurrently.
    parallel: bool,
    /// The number of threads to plan for, `None` for the thread pool size.
    threads: Option<usize>,
    /// The seed for the noise generators.
    seed: u64,
}

impl Default for HalftoneOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl HalftoneOptions {
    /// Creates a new [`HalftoneOptions`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            kernel: 16,
            input_bit_depth: 16,
            image_bit_depth: 8,
            rgb_source: false,
            hysteresis: DEFAULT_HYSTERESIS,
            channels: 4,
            dot_levels: 4,
            ink_order: DEFAULT_INK_ORDER,
            serpentine: true,
            parallel: true,
            threads: None,
            seed: 0,
        }
    }

    /// Sets the error diffusion kernel (see [`KERNELS`](crate::KERNELS)).
    ///
    /// The default kernel is `16`.
    #[must_use]
    pub const fn kernel(mut self, index: u8) -> Self {
        self.kernel = index;
        self
    }

    /// Sets the bit depth error diffusion runs at, `8` or `16`.
    /// This must be at least the image bit depth.
    ///
    /// The default is `16`.
    #[must_use]
    pub const fn input_bit_depth(mut self, bits: u8) -> Self {
        self.input_bit_depth = bits;
        self
    }

    /// Sets the bit depth of the raster samples, `8` or `16`.
    ///
    /// The default is `8`.
    #[must_use]
    pub const fn image_bit_depth(mut self, bits: u8) -> Self {
        self.image_bit_depth = bits;
        self
    }

    /// Marks the source image as RGB. Such images arrive converted to 16-bit CMYK,
    /// which forces 16-bit samples and 16-bit diffusion.
    ///
    /// The default is `false`.
    #[must_use]
    pub const fn rgb_source(mut self, rgb: bool) -> Self {
        self.rgb_source = rgb;
        self
    }

    /// Sets the white noise intensity in `0.0..=1.0`. `0.0` disables noise.
    /// Values outside of the range are replaced by [`DEFAULT_HYSTERESIS`].
    ///
    /// The default is `0.15`.
    #[must_use]
    pub const fn hysteresis(mut self, hysteresis: f32) -> Self {
        self.hysteresis = hysteresis;
        self
    }

    /// Sets the number of color channels, `1..=16`.
    ///
    /// The default is `4` (CMYK).
    #[must_use]
    pub const fn channels(mut self, channels: u8) -> Self {
        self.channels = channels;
        self
    }

    /// Sets the number of dot levels including "no dot", `1..=16`.
    ///
    /// The default is `4` (none, small, medium, large).
    #[must_use]
    pub const fn dot_levels(mut self, levels: u8) -> Self {
        self.dot_levels = levels;
        self
    }

    /// Sets the mapping from logical channel to physical ink.
    /// The first `channels` entries must be a permutation of `0..channels`.
    ///
    /// The default is [`DEFAULT_INK_ORDER`].
    #[must_use]
    pub const fn ink_order(mut self, order: [u8; MAX_CHANNELS]) -> Self {
        self.ink_order = order;
        self
    }

    /// Sets whether rows alternate their scan direction.
    ///
    /// The default is `true`.
    #[must_use]
    pub const fn serpentine(mut self, serpentine: bool) -> Self {
        self.serpentine = serpentine;
        self
    }

    /// Sets whether the tasks of a band may run concurrently.
    ///
    /// The default is `true`.
    #[must_use]
    pub const fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the thread budget used to partition each band.
    ///
    /// By default, this is the size of the current `rayon` thread pool
    /// (or `1` without the `threads` feature).
    #[must_use]
    pub const fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Sets the seed for the noise generators.
    ///
    /// The default seed is `0`.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validates the options against `tables` and derives the per-run constants.
    ///
    /// # Errors
    /// Returns a configuration error (see [`HalftoneError::kind`]) if the kernel index,
    /// a bit depth, the channel or dot level count, the ink order, or a lookup table is invalid.
    pub fn build(self, tables: LookupTables<'_>) -> Result<RunConfiguration<'_>> {
        let kernel = kernel_info(self.kernel)?;
        let input_depth = BitDepth::try_from(self.input_bit_depth)?;
        let image_depth = BitDepth::try_from(self.image_bit_depth)?;

        if input_depth < image_depth {
            return Err(HalftoneError::IncompatibleBitDepth {
                input: self.input_bit_depth,
                image: self.image_bit_depth,
            });
        }

        if self.channels == 0 || usize::from(self.channels) > MAX_CHANNELS {
            return Err(HalftoneError::InvalidChannelCount(self.channels));
        }
        let channels = usize::from(self.channels);

        if self.dot_levels == 0 || usize::from(self.dot_levels) > MAX_DOT_LEVELS {
            return Err(HalftoneError::InvalidDotLevels(self.dot_levels));
        }

        let ink_order = &self.ink_order[..channels];
        let mut seen = [false; MAX_CHANNELS];
        for &ink in ink_order {
            let ink = usize::from(ink);
            if ink >= channels || seen[ink] {
                return Err(HalftoneError::InvalidInkOrder {
                    order: ink_order.to_vec(),
                    channels: self.channels,
                });
            }
            seen[ink] = true;
        }

        let hysteresis = if (0.0..=1.0).contains(&self.hysteresis) {
            self.hysteresis
        } else {
            tracing::warn!(
                hysteresis = self.hysteresis,
                default = DEFAULT_HYSTERESIS,
                "hysteresis out of range, using default"
            );
            DEFAULT_HYSTERESIS
        };

        // RGB sources are converted to 16-bit CMYK, so they always diffuse at 16 bits.
        let diffusion_depth = if self.rgb_source { BitDepth::Sixteen } else { input_depth };
        let sample_depth = if self.rgb_source { BitDepth::Sixteen } else { image_depth };

        tables.validate(diffusion_depth, kernel, self.dot_levels)?;

        Ok(RunConfiguration {
            kernel_index: self.kernel,
            kernel,
            input_depth,
            image_depth,
            diffusion_depth,
            sample_depth,
            rgb_source: self.rgb_source,
            hysteresis,
            noise: NoiseParams::new(diffusion_depth, hysteresis),
            channels,
            dot_levels: self.dot_levels,
            ink_order: self.ink_order,
            serpentine: self.serpentine,
            parallel: self.parallel,
            threads: self.threads.unwrap_or_else(default_threads).max(1),
            seed: self.seed,
            tables,
        })
    }
}

/// The thread budget used when none is given.
fn default_threads() -> usize {
    #[cfg(feature = "threads")]
    {
        rayon::current_num_threads()
    }
    #[cfg(not(feature = "threads"))]
    {
        1
    }
}

/// Constants derived once per run for sample scaling and noise injection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseParams {
    /// Scale from 8-bit to diffusion intensities, `257` at 16 bits, else `1`.
    pub scale: f32,
    /// The largest diffusion intensity, `65535` or `255`.
    pub max_pixel_value: f32,
    /// The noise range, `(4 + hysteresis * 24) * scale`.
    pub range: f32,
    /// Exclusive upper bound of the raw noise draw, `range + 1`.
    pub spread: f32,
    /// Offset subtracted from the raw draw, `range / 2`.
    pub offset: f32,
}

impl NoiseParams {
    /// Derives the noise constants for the given diffusion depth and hysteresis.
    #[must_use]
    pub fn new(diffusion_depth: BitDepth, hysteresis: f32) -> Self {
        let (scale, max_pixel_value) = match diffusion_depth {
            BitDepth::Sixteen => (257.0, 65535.0),
            BitDepth::Eight => (1.0, 255.0),
        };
        let range = (4.0 + hysteresis * 24.0) * scale;
        Self {
            scale,
            max_pixel_value,
            range,
            spread: range + 1.0,
            offset: range / 2.0,
        }
    }
}

/// The validated, immutable parameters of a halftoning run.
///
/// Created through [`HalftoneOptions::build`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunConfiguration<'a> {
    /// The selected kernel index.
    kernel_index: u8,
    /// The selected kernel.
    kernel: &'static Kernel,
    /// The configured diffusion depth.
    input_depth: BitDepth,
    /// The configured sample depth.
    image_depth: BitDepth,
    /// The effective diffusion depth (16-bit for RGB sources).
    diffusion_depth: BitDepth,
    /// The sample depth the raster must have (16-bit for RGB sources).
    sample_depth: BitDepth,
    /// Whether the source image was RGB.
    rgb_source: bool,
    /// The normalized hysteresis.
    hysteresis: f32,
    /// Derived scaling and noise constants.
    noise: NoiseParams,
    /// Number of color channels.
    channels: usize,
    /// Number of dot levels.
    dot_levels: u8,
    /// Logical channel to physical ink.
    ink_order: [u8; MAX_CHANNELS],
    /// Whether to alternate scan direction per row.
    serpentine: bool,
    /// Whether tasks may run concurrently.
    parallel: bool,
    /// The resolved thread budget.
    threads: usize,
    /// The noise seed.
    seed: u64,
    /// The lookup tables.
    tables: LookupTables<'a>,
}

impl<'a> RunConfiguration<'a> {
    /// The selected kernel index.
    #[must_use]
    pub const fn kernel_index(&self) -> u8 {
        self.kernel_index
    }

    /// The selected kernel.
    #[must_use]
    pub const fn kernel(&self) -> &'static Kernel {
        self.kernel
    }

    /// The configured diffusion bit depth.
    #[must_use]
    pub const fn input_depth(&self) -> BitDepth {
        self.input_depth
    }

    /// The configured image bit depth.
    #[must_use]
    pub const fn image_depth(&self) -> BitDepth {
        self.image_depth
    }

    /// The depth diffusion actually runs at; 16-bit whenever the source was RGB.
    #[must_use]
    pub const fn diffusion_depth(&self) -> BitDepth {
        self.diffusion_depth
    }

    /// The sample depth input rasters must have.
    #[must_use]
    pub const fn sample_depth(&self) -> BitDepth {
        self.sample_depth
    }

    /// Whether the source image was RGB.
    #[must_use]
    pub const fn rgb_source(&self) -> bool {
        self.rgb_source
    }

    /// The normalized hysteresis.
    #[must_use]
    pub const fn hysteresis(&self) -> f32 {
        self.hysteresis
    }

    /// Whether noise is injected at all.
    #[must_use]
    pub fn noise_enabled(&self) -> bool {
        self.hysteresis > 0.0
    }

    /// Derived scaling and noise constants.
    #[must_use]
    pub const fn noise(&self) -> &NoiseParams {
        &self.noise
    }

    /// The largest diffusion intensity.
    #[must_use]
    pub const fn max_pixel_value(&self) -> f32 {
        self.noise.max_pixel_value
    }

    /// Number of color channels.
    #[must_use]
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// Number of dot levels.
    #[must_use]
    pub const fn dot_levels(&self) -> u8 {
        self.dot_levels
    }

    /// The physical ink of each logical channel.
    #[must_use]
    pub fn ink_order(&self) -> &[u8] {
        &self.ink_order[..self.channels]
    }

    /// The physical ink a logical channel prints on.
    #[must_use]
    pub fn ink_of(&self, channel: usize) -> usize {
        usize::from(self.ink_order[channel])
    }

    /// Whether rows alternate their scan direction.
    #[must_use]
    pub const fn serpentine(&self) -> bool {
        self.serpentine
    }

    /// Whether tasks may run concurrently.
    #[must_use]
    pub const fn parallel(&self) -> bool {
        self.parallel
    }

    /// The thread budget.
    #[must_use]
    pub const fn threads(&self) -> usize {
        self.threads
    }

    /// The noise seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// The lookup tables.
    #[must_use]
    pub const fn tables(&self) -> &LookupTables<'a> {
        &self.tables
    }

    /// Returns a copy with a different thread budget and parallel flag.
    #[must_use]
    pub const fn with_threads(mut self, threads: usize, parallel: bool) -> Self {
        self.threads = if threads == 0 { 1 } else { threads };
        self.parallel = parallel;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{tests::*, ErrorKind};

    #[test]
    fn defaults() {
        let fx = Fixture::new(BitDepth::Sixteen, 16, 4);
        let config = HalftoneOptions::new().build(fx.tables()).unwrap();

        assert_eq!(config.kernel_index(), 16);
        assert_eq!(config.kernel().height, 2);
        assert_eq!(config.channels(), 4);
        assert_eq!(config.ink_order(), &[1, 2, 3, 0]);
        assert_eq!(config.ink_of(3), 0);
        assert!(config.serpentine() && config.parallel());
        assert_eq!(config.hysteresis(), 0.15);
        assert_eq!(config.max_pixel_value(), 65535.0);
        assert!(config.threads() >= 1);
    }

    #[test]
    fn incompatible_bit_depth() {
        let fx = Fixture::new(BitDepth::Eight, 16, 4);
        for kernel in 0..17 {
            for rgb in [false, true] {
                let err = HalftoneOptions::new()
                    .kernel(kernel)
                    .input_bit_depth(8)
                    .image_bit_depth(16)
                    .rgb_source(rgb)
                    .build(fx.tables())
                    .unwrap_err();

                assert_eq!(err, HalftoneError::IncompatibleBitDepth { input: 8, image: 16 });
                assert_eq!(err.kind(), ErrorKind::Configuration);
            }
        }
    }

    #[test]
    fn unsupported_values() {
        let fx = Fixture::new(BitDepth::Eight, 16, 4);
        let eight = HalftoneOptions::new().input_bit_depth(8);

        assert_eq!(
            eight.kernel(17).build(fx.tables()),
            Err(HalftoneError::InvalidKernelIndex(17))
        );
        assert_eq!(
            eight.image_bit_depth(10).build(fx.tables()),
            Err(HalftoneError::UnsupportedBitDepth(10))
        );
        assert_eq!(
            eight.channels(0).build(fx.tables()),
            Err(HalftoneError::InvalidChannelCount(0))
        );
        assert_eq!(
            eight.channels(17).build(fx.tables()),
            Err(HalftoneError::InvalidChannelCount(17))
        );
        assert_eq!(
            eight.dot_levels(17).build(fx.tables()),
            Err(HalftoneError::InvalidDotLevels(17))
        );
    }

    #[test]
    fn ink_order_must_be_permutation() {
        let fx = Fixture::new(BitDepth::Eight, 16, 4);
        let eight = HalftoneOptions::new().input_bit_depth(8);

        let mut order = DEFAULT_INK_ORDER;
        order[1] = 1;
        order[2] = 1;
        assert_eq!(
            eight.ink_order(order).build(fx.tables()),
            Err(HalftoneError::InvalidInkOrder { order: vec![1, 1, 1, 0], channels: 4 })
        );

        // the default order is not a permutation of 0..2
        assert!(eight.channels(2).build(fx.tables()).is_err());

        let mut order = DEFAULT_INK_ORDER;
        order[..2].copy_from_slice(&[1, 0]);
        assert!(eight.channels(2).ink_order(order).build(fx.tables()).is_ok());
    }

    #[test]
    fn hysteresis_normalized() {
        let fx = Fixture::new(BitDepth::Eight, 16, 4);
        let eight = HalftoneOptions::new().input_bit_depth(8);

        for h in [-0.01, 1.01, 5.0, f32::NAN, f32::INFINITY] {
            let config = eight.hysteresis(h).build(fx.tables()).unwrap();
            assert_eq!(config.hysteresis(), DEFAULT_HYSTERESIS);
        }
        for h in [0.0, 0.5, 1.0] {
            let config = eight.hysteresis(h).build(fx.tables()).unwrap();
            assert_eq!(config.hysteresis(), h);
        }
        assert!(!eight.hysteresis(0.0).build(fx.tables()).unwrap().noise_enabled());
    }

    #[test]
    fn noise_params() {
        let eight = NoiseParams::new(BitDepth::Eight, 0.5);
        assert_eq!(eight.scale, 1.0);
        assert_eq!(eight.max_pixel_value, 255.0);
        assert_eq!(eight.range, 16.0);
        assert_eq!(eight.spread, 17.0);
        assert_eq!(eight.offset, 8.0);

        let sixteen = NoiseParams::new(BitDepth::Sixteen, 0.0);
        assert_eq!(sixteen.scale, 257.0);
        assert_eq!(sixteen.max_pixel_value, 65535.0);
        assert_eq!(sixteen.range, 1028.0);
        assert_eq!(sixteen.spread, 1029.0);
        assert_eq!(sixteen.offset, 514.0);
    }

    #[test]
    fn rgb_forces_sixteen_bits() {
        let fx = Fixture::new(BitDepth::Sixteen, 16, 4);
        let config = HalftoneOptions::new()
            .input_bit_depth(8)
            .image_bit_depth(8)
            .rgb_source(true)
            .build(fx.tables())
            .unwrap();

        assert_eq!(config.diffusion_depth(), BitDepth::Sixteen);
        assert_eq!(config.sample_depth(), BitDepth::Sixteen);
        assert_eq!(config.max_pixel_value(), 65535.0);

        // 8-bit tables are too small for RGB sources
        let small = Fixture::new(BitDepth::Eight, 16, 4);
        assert!(matches!(
            HalftoneOptions::new().input_bit_depth(8).rgb_source(true).build(small.tables()),
            Err(HalftoneError::MissingLookupTable { .. })
        ));
    }

    #[test]
    fn table_size_mismatch() {
        let fx = Fixture::new(BitDepth::Eight, 16, 4);
        let err = HalftoneOptions::new().kernel(14).input_bit_depth(8).build(fx.tables());
        assert!(matches!(err, Err(HalftoneError::MissingLookupTable { table: "error", .. })));
    }
}
