//! The externally built lookup tables that drive quantization and diffusion.

use crate::{BitDepth, HalftoneError, Kernel, Result};

/// Borrowed, read-only lookup tables for one halftoning run.
///
/// - `dot[p]` is the dot level printed for the error-adjusted intensity `p`.
/// - `error[p * kernel_size + row * 7 + slot]` is the error diffused into
///   kernel row `row`, weight slot `slot`, after printing intensity `p`.
/// - `dot_level_percent[level]` is the apparent darkness (`0.0..=1.0`) of a dot level,
///   used to render the preview.
///
/// The tables are validated against the configuration in
/// [`HalftoneOptions::build`](crate::HalftoneOptions::build).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookupTables<'a> {
    /// Dot level per intensity.
    pub dot: &'a [u8],
    /// Weighted residual error per intensity and kernel slot.
    pub error: &'a [f32],
    /// Preview darkness per dot level.
    pub dot_level_percent: &'a [f32],
}

impl<'a> LookupTables<'a> {
    /// Bundles the three tables.
    #[must_use]
    pub const fn new(dot: &'a [u8], error: &'a [f32], dot_level_percent: &'a [f32]) -> Self {
        Self { dot, error, dot_level_percent }
    }

    /// Checks the table sizes for the given diffusion depth and kernel,
    /// and that every dot table entry is a valid dot level.
    pub(crate) fn validate(&self, depth: BitDepth, kernel: &Kernel, dot_levels: u8) -> Result<()> {
        let intensities = depth.levels();

        check_table("dot", intensities, self.dot.len())?;
        check_table("error", intensities * kernel.size(), self.error.len())?;
        if self.dot_level_percent.len() < usize::from(dot_levels) {
            return Err(HalftoneError::MissingLookupTable {
                table: "dot level percent",
                expected: usize::from(dot_levels),
                actual: self.dot_level_percent.len(),
            });
        }

        if let Some((intensity, &level)) = self
            .dot
            .iter()
            .enumerate()
            .find(|&(_, &level)| level >= dot_levels)
        {
            return Err(HalftoneError::InvalidDotLevel { intensity, level, levels: dot_levels });
        }

        Ok(())
    }

    /// Returns the error table entries for intensity `p`.
    #[inline]
    pub(crate) fn error_weights(&self, p: usize, kernel_size: usize) -> &'a [f32] {
        let start = p * kernel_size;
        &self.error[start..(start + kernel_size)]
    }
}

/// Fails with [`HalftoneError::MissingLookupTable`] unless `actual == expected`.
fn check_table(table: &'static str, expected: usize, actual: usize) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(HalftoneError::MissingLookupTable { table, expected, actual })
    }
}
