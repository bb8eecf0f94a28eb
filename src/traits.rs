use num_traits::AsPrimitive;

/// A raster sample type the halftoner can read.
///
/// Implemented for `u8` (8 bits per channel) and `u16` (16 bits per channel).
pub trait Sample: AsPrimitive<f32> + Copy + Send + Sync + 'static {
    /// The number of bits per sample.
    const BITS: u8;

    /// Returns the sample widened to `f32`.
    #[inline]
    fn to_f32(self) -> f32 {
        self.as_()
    }
}

impl Sample for u8 {
    const BITS: u8 = 8;
}

impl Sample for u16 {
    const BITS: u8 = 16;
}
