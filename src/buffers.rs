//! The error buffer store: accumulated diffusion error for every bank, kernel row,
//! channel, and output column.
//!
//! The store is a single arena laid out as `[bank][channel][kernel row][column]`,
//! so that the rows of one (bank, channel) pair form a contiguous plane.
//! Planes are handed out as disjoint mutable borrows, one per task.

use crate::{HalftoneError, Parity, Result};

/// Allocates a zeroed `Vec<T>` of `len` elements, reporting failure instead of aborting.
pub(crate) fn try_zeroed<T: Copy + Default>(what: &'static str, len: usize) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| HalftoneError::Allocation { what, elements: len })?;
    buf.resize(len, T::default());
    Ok(buf)
}

/// Accumulated floating point diffusion error for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorBufferStore {
    /// Error rows per bank and channel (the kernel height).
    rows: usize,
    /// Number of channels.
    channels: usize,
    /// Output raster width.
    width: usize,
    /// The arena.
    data: Vec<f32>,
}

impl ErrorBufferStore {
    /// Allocates a zeroed store for two banks of `rows` kernel rows
    /// by `channels` channels by `width` columns.
    ///
    /// # Errors
    /// Returns [`HalftoneError::Allocation`] if the store cannot be sized.
    pub fn new(rows: usize, channels: usize, width: usize) -> Result<Self> {
        let len = Parity::ALL
            .len()
            .checked_mul(rows)
            .and_then(|n| n.checked_mul(channels))
            .and_then(|n| n.checked_mul(width))
            .ok_or(HalftoneError::Allocation { what: "error buffer", elements: usize::MAX })?;

        let data = try_zeroed("error buffer", len)?;
        Ok(Self { rows, channels, width, data })
    }

    /// The number of kernel rows per bank.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// The number of channels.
    #[must_use]
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// The output width the store was sized for.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Offset of the first element of a (bank, channel) plane.
    fn plane_start(&self, parity: Parity, channel: usize) -> usize {
        (parity.index() * self.channels + channel) * self.rows * self.width
    }

    /// Returns the accumulated error at the given position,
    /// or `None` if any index is out of bounds.
    #[must_use]
    pub fn get(&self, parity: Parity, row: usize, channel: usize, column: usize) -> Option<f32> {
        if row < self.rows && channel < self.channels && column < self.width {
            self.data.get(self.plane_start(parity, channel) + row * self.width + column).copied()
        } else {
            None
        }
    }

    /// Returns the error rows of one (bank, channel) pair.
    ///
    /// # Panics
    /// Panics if `channel` is out of bounds.
    #[must_use]
    pub fn plane_mut(&mut self, parity: Parity, channel: usize) -> ErrorPlane<'_> {
        assert!(channel < self.channels);
        let start = self.plane_start(parity, channel);
        let len = self.rows * self.width;
        ErrorPlane {
            rows: self.rows,
            width: self.width,
            data: &mut self.data[start..(start + len)],
        }
    }

    /// Splits the store into its `2 * channels` planes, indexed by
    /// `parity.index() * channels + channel`.
    pub(crate) fn planes_mut(&mut self) -> Vec<Option<ErrorPlane<'_>>> {
        let Self { rows, width, .. } = *self;
        let len = rows * width;
        if len == 0 {
            return (0..(2 * self.channels)).map(|_| None).collect();
        }

        self.data
            .chunks_exact_mut(len)
            .map(|data| Some(ErrorPlane { rows, width, data }))
            .collect()
    }

    /// Zeroes all accumulated error.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Returns `true` if no error is accumulated.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.data.iter().all(|&e| e == 0.0)
    }
}

/// The kernel rows of accumulated error for one (bank, channel) pair.
#[derive(Debug, PartialEq)]
pub struct ErrorPlane<'a> {
    /// Kernel rows.
    rows: usize,
    /// Output width.
    width: usize,
    /// `rows * width` errors.
    data: &'a mut [f32],
}

impl<'a> ErrorPlane<'a> {
    /// The number of kernel rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// The output width.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// The error to apply to `column` of the row being processed.
    #[inline]
    pub(crate) fn current(&self, column: usize) -> f32 {
        self.data[column]
    }

    /// Adds `error` to kernel row `row` at `column`.
    #[inline]
    pub(crate) fn add(&mut self, row: usize, column: usize, error: f32) {
        self.data[row * self.width + column] += error;
    }

    /// Moves the error of `column` up one kernel row and zeroes the last row.
    #[inline]
    pub(crate) fn shift(&mut self, column: usize) {
        let width = self.width;
        for row in 1..self.rows {
            self.data[(row - 1) * width + column] = self.data[row * width + column];
        }
        self.data[(self.rows - 1) * width + column] = 0.0;
    }

    /// One kernel row of errors.
    #[must_use]
    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[(row * self.width)..((row + 1) * self.width)]
    }

    /// Reborrows the plane for a shorter lifetime.
    pub fn reborrow(&mut self) -> ErrorPlane<'_> {
        ErrorPlane { rows: self.rows, width: self.width, data: &mut *self.data }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn zero_initialized() {
        let store = ErrorBufferStore::new(3, 4, 10).unwrap();
        assert!(store.is_clear());
        assert_eq!(store.data.len(), 2 * 3 * 4 * 10);
    }

    #[test]
    fn allocation_overflow() {
        assert_eq!(
            ErrorBufferStore::new(usize::MAX, 4, 10),
            Err(HalftoneError::Allocation { what: "error buffer", elements: usize::MAX })
        );
    }

    #[test]
    fn planes_are_disjoint() {
        let mut store = ErrorBufferStore::new(2, 3, 5).unwrap();

        let mut planes = store.planes_mut();
        assert_eq!(planes.len(), 6);
        for (i, plane) in planes.iter_mut().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            plane.as_mut().unwrap().add(1, 4, i as f32);
        }
        drop(planes);

        assert_eq!(store.get(Parity::Odd, 2, 0, 0), None);
        assert_eq!(store.get(Parity::Odd, 0, 3, 0), None);
        assert_eq!(store.get(Parity::Odd, 0, 0, 5), None);

        for parity in Parity::ALL {
            for channel in 0..3 {
                #[allow(clippy::cast_precision_loss)]
                let expected = (parity.index() * 3 + channel) as f32;
                assert_eq!(store.get(parity, 1, channel, 4), Some(expected));
                assert_eq!(store.get(parity, 0, channel, 4), Some(0.0));
            }
        }
    }

    #[test]
    fn shift_moves_rows_up() {
        let mut store = ErrorBufferStore::new(3, 1, 2).unwrap();
        let mut plane = store.plane_mut(Parity::Odd, 0);
        plane.add(0, 1, 1.0);
        plane.add(1, 1, 2.0);
        plane.add(2, 1, 3.0);
        plane.add(2, 0, 9.0);
        plane.shift(1);

        assert_eq!(plane.row(0), &[0.0, 2.0]);
        assert_eq!(plane.row(1), &[0.0, 3.0]);
        assert_eq!(plane.row(2), &[9.0, 0.0]);
        assert_eq!(plane.current(1), 2.0);

        assert!(!store.is_clear());
        store.clear();
        assert!(store.is_clear());
    }
}
