//! Error types for halftoning runs.

use thiserror::Error;

/// The broad class of a [`HalftoneError`].
///
/// None of the classes are transient: retrying a failed run with the same inputs
/// fails the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The options or lookup tables are invalid; the run never starts.
    Configuration,
    /// A buffer could not be sized as configured.
    Allocation,
    /// Caller-supplied dimensions do not match the allocated buffers.
    Bounds,
}

/// Errors that can occur while configuring or running the halftoner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HalftoneError {
    /// The kernel index is outside of the kernel catalog.
    #[error("invalid kernel index {0} (expected 0..=16)")]
    InvalidKernelIndex(u8),

    /// Only 8 and 16 bit samples are supported.
    #[error("unsupported bit depth {0} (expected 8 or 16)")]
    UnsupportedBitDepth(u8),

    /// 8-bit diffusion cannot represent a 16-bit image.
    #[error("cannot use {input}-bit diffusion on a {image}-bit image")]
    IncompatibleBitDepth {
        /// The configured diffusion bit depth.
        input: u8,
        /// The configured image bit depth.
        image: u8,
    },

    /// The channel count must be within `1..=16`.
    #[error("invalid channel count {0} (expected 1..=16)")]
    InvalidChannelCount(u8),

    /// The dot level count must be within `1..=16`.
    #[error("invalid dot level count {0} (expected 1..=16)")]
    InvalidDotLevels(u8),

    /// The ink order is not a permutation of the channel indices.
    #[error("ink order {order:?} is not a permutation of 0..{channels}")]
    InvalidInkOrder {
        /// The ink order entries for the configured channels.
        order: Vec<u8>,
        /// The configured channel count.
        channels: u8,
    },

    /// A lookup table is empty or does not have the expected length.
    #[error("{table} lookup table has {actual} entries, expected {expected}")]
    MissingLookupTable {
        /// Which table is affected.
        table: &'static str,
        /// The expected number of entries.
        expected: usize,
        /// The supplied number of entries.
        actual: usize,
    },

    /// The dot table maps an intensity onto a dot level that does not exist.
    #[error("dot table maps intensity {intensity} to level {level}, but only {levels} levels exist")]
    InvalidDotLevel {
        /// The offending table index.
        intensity: usize,
        /// The dot level stored at that index.
        level: u8,
        /// The configured dot level count.
        levels: u8,
    },

    /// The raster samples do not match the configured image bit depth.
    #[error("raster has {actual}-bit samples, configuration expects {expected}-bit")]
    SampleDepthMismatch {
        /// The sample depth required by the configuration.
        expected: u8,
        /// The sample depth of the supplied raster.
        actual: u8,
    },

    /// A buffer could not be allocated.
    #[error("failed to allocate {what} ({elements} elements)")]
    Allocation {
        /// Which buffer failed.
        what: &'static str,
        /// The requested number of elements, saturated on overflow.
        elements: usize,
    },

    /// A buffer length or dimension does not match what the run was sized for.
    #[error("{what}: expected {expected}, got {actual}")]
    BufferBoundsExceeded {
        /// The dimension that was violated.
        what: &'static str,
        /// The expected value.
        expected: usize,
        /// The supplied value.
        actual: usize,
    },
}

impl HalftoneError {
    /// Returns the class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Allocation { .. } => ErrorKind::Allocation,
            Self::BufferBoundsExceeded { .. } => ErrorKind::Bounds,
            _ => ErrorKind::Configuration,
        }
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self.kind(), ErrorKind::Configuration)
    }

    /// Shorthand for a [`HalftoneError::BufferBoundsExceeded`] when `expected != actual`.
    pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::BufferBoundsExceeded { what, expected, actual })
        }
    }
}

/// Result type for halftoning operations.
pub type Result<T> = std::result::Result<T, HalftoneError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(HalftoneError::InvalidKernelIndex(17).kind(), ErrorKind::Configuration);
        assert_eq!(
            HalftoneError::Allocation { what: "error buffer", elements: usize::MAX }.kind(),
            ErrorKind::Allocation
        );
        assert_eq!(
            HalftoneError::BufferBoundsExceeded { what: "row width", expected: 4, actual: 3 }
                .kind(),
            ErrorKind::Bounds
        );
        assert!(HalftoneError::IncompatibleBitDepth { input: 8, image: 16 }.is_configuration());
    }

    #[test]
    fn check_len() {
        assert!(HalftoneError::check_len("x", 3, 3).is_ok());
        assert_eq!(
            HalftoneError::check_len("x", 3, 4),
            Err(HalftoneError::BufferBoundsExceeded { what: "x", expected: 3, actual: 4 })
        );
    }

    #[test]
    fn messages() {
        assert_eq!(
            HalftoneError::IncompatibleBitDepth { input: 8, image: 16 }.to_string(),
            "cannot use 8-bit diffusion on a 16-bit image"
        );
        assert_eq!(
            HalftoneError::InvalidKernelIndex(20).to_string(),
            "invalid kernel index 20 (expected 0..=16)"
        );
    }
}
