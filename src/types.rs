//! Contains various types needed across the crate.

use crate::{HalftoneError, Result, Sample, MAX_BAND_ROWS, MAX_CHANNELS};
use std::fmt::Display;

/// A supported sample or diffusion bit depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BitDepth {
    /// 8 bits per channel.
    Eight,
    /// 16 bits per channel.
    Sixteen,
}

impl BitDepth {
    /// Returns the number of bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Eight => 8,
            Self::Sixteen => 16,
        }
    }

    /// Returns the largest representable intensity (`255` or `65535`).
    #[must_use]
    pub const fn max_value(self) -> u16 {
        match self {
            Self::Eight => u8::MAX as u16,
            Self::Sixteen => u16::MAX,
        }
    }

    /// Returns the number of distinct intensities, `2^bits`.
    #[must_use]
    pub const fn levels(self) -> usize {
        self.max_value() as usize + 1
    }
}

impl TryFrom<u8> for BitDepth {
    type Error = HalftoneError;

    fn try_from(bits: u8) -> Result<Self> {
        match bits {
            8 => Ok(Self::Eight),
            16 => Ok(Self::Sixteen),
            _ => Err(HalftoneError::UnsupportedBitDepth(bits)),
        }
    }
}

impl From<BitDepth> for u8 {
    fn from(depth: BitDepth) -> Self {
        depth.bits()
    }
}

impl Display for BitDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// The direction a raster row is scanned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanDirection {
    /// Left to right, starting at column 0.
    Forward,
    /// Right to left, starting at the last column.
    Reverse,
}

impl ScanDirection {
    /// Returns the scan direction of an output row.
    ///
    /// With serpentine rastering, even rows scan forward and odd rows scan in reverse.
    /// Otherwise every row scans forward.
    #[must_use]
    pub const fn for_row(row: usize, serpentine: bool) -> Self {
        if serpentine && row % 2 == 1 {
            Self::Reverse
        } else {
            Self::Forward
        }
    }

    /// Returns the column step, `1` or `-1`.
    #[must_use]
    pub const fn step(self) -> isize {
        match self {
            Self::Forward => 1,
            Self::Reverse => -1,
        }
    }
}

/// One of the two error buffer banks.
///
/// When rows are interlaced, even rows diffuse into the even bank and odd rows into the odd
/// bank so that the two halves of a band can be processed concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Parity {
    /// Bank 0, also used whenever rows are not interlaced.
    Even,
    /// Bank 1.
    Odd,
}

impl Parity {
    /// Both banks, in index order.
    pub const ALL: [Self; 2] = [Self::Even, Self::Odd];

    /// Returns the bank index.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Even => 0,
            Self::Odd => 1,
        }
    }

    /// Returns the parity of a row index.
    #[must_use]
    pub const fn of_row(row: usize) -> Self {
        if row % 2 == 0 {
            Self::Even
        } else {
            Self::Odd
        }
    }
}

/// A band of channel-interleaved, row-major input samples
/// (e.g., `CMYKCMYK...`, not `CCCC...MMMM...`).
///
/// The invariants `samples.len() == width * height * channels`,
/// `height <= MAX_BAND_ROWS`, and `1 <= channels <= MAX_CHANNELS`
/// are checked on construction.
///
/// # Examples
/// ```
/// # use inkjet_halftone::InputRaster;
/// # fn main() -> Result<(), inkjet_halftone::HalftoneError> {
/// let cmyk = vec![0u8; 4 * 3 * 4];
/// let raster = InputRaster::new(&cmyk, 4, 3, 4)?;
/// assert_eq!(raster.sample(3, 2, 1), 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct InputRaster<'a, S> {
    /// The samples.
    samples: &'a [S],
    /// Width in pixels.
    width: usize,
    /// Height in rows.
    height: usize,
    /// Samples per pixel.
    channels: usize,
}

impl<'a, S> Clone for InputRaster<'a, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, S> Copy for InputRaster<'a, S> {}

impl<'a, S: Sample> InputRaster<'a, S> {
    /// Creates a new [`InputRaster`] over `samples`.
    ///
    /// # Errors
    /// Returns [`HalftoneError::InvalidChannelCount`] if `channels` is not within `1..=16`,
    /// or [`HalftoneError::BufferBoundsExceeded`] if the band is empty, taller than
    /// [`MAX_BAND_ROWS`], or `samples` does not hold exactly `width * height * channels` samples.
    pub fn new(samples: &'a [S], width: usize, height: usize, channels: usize) -> Result<Self> {
        if channels == 0 || channels > MAX_CHANNELS {
            #[allow(clippy::cast_possible_truncation)]
            return Err(HalftoneError::InvalidChannelCount(channels.min(255) as u8));
        }
        if height > MAX_BAND_ROWS {
            return Err(HalftoneError::BufferBoundsExceeded {
                what: "input band height",
                expected: MAX_BAND_ROWS,
                actual: height,
            });
        }
        if width == 0 || height == 0 {
            return Err(HalftoneError::BufferBoundsExceeded {
                what: "input band area",
                expected: 1,
                actual: 0,
            });
        }
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(channels))
            .unwrap_or(usize::MAX);
        HalftoneError::check_len("input sample count", expected, samples.len())?;

        Ok(Self { samples, width, height, channels })
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Height in rows.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Samples per pixel.
    #[must_use]
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// The raw samples.
    #[must_use]
    pub const fn samples(&self) -> &'a [S] {
        self.samples
    }

    /// Returns the sample of `channel` at pixel (`x`, `y`).
    ///
    /// # Panics
    /// Panics if the coordinates are out of bounds.
    #[inline]
    #[must_use]
    pub fn sample(&self, x: usize, y: usize, channel: usize) -> S {
        self.samples[(y * self.width + x) * self.channels + channel]
    }
}
