//! Output sinks: per-ink print planes, the 8-bit preview, and dot volume tallies.

use crate::{buffers::try_zeroed, HalftoneError, Result, MAX_CHANNELS, MAX_DOT_LEVELS};

/// Converts a dot level's apparent darkness into an 8-bit preview value.
#[inline]
#[must_use]
pub fn preview_value(dot_level_percent: f32) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        (dot_level_percent * 255.0).round().clamp(0.0, 255.0) as u8
    }
}

/// The halftoned output of one band.
///
/// - `ink(i)` holds one dot level per output pixel for physical ink `i`, row-major.
/// - `preview()` holds `channels` interleaved 8-bit values per output pixel, always
///   in logical channel order regardless of the configured ink order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputBuffers {
    /// Output width.
    width: usize,
    /// Output height.
    height: usize,
    /// Number of channels (and inks).
    channels: usize,
    /// Print planes, indexed by physical ink.
    inks: Vec<Vec<u8>>,
    /// Preview planes, indexed by logical channel. Interleaved into `preview` after a band.
    preview_planes: Vec<Vec<u8>>,
    /// Interleaved preview.
    preview: Vec<u8>,
}

impl OutputBuffers {
    /// Allocates zeroed output buffers for a `width` by `height` band with `channels` inks.
    ///
    /// # Errors
    /// Returns [`HalftoneError::InvalidChannelCount`] for a channel count outside `1..=16`,
    /// [`HalftoneError::BufferBoundsExceeded`] for an empty band, or
    /// [`HalftoneError::Allocation`] if the buffers cannot be sized.
    pub fn new(width: usize, height: usize, channels: usize) -> Result<Self> {
        if channels == 0 || channels > MAX_CHANNELS {
            #[allow(clippy::cast_possible_truncation)]
            return Err(HalftoneError::InvalidChannelCount(channels.min(255) as u8));
        }
        if width == 0 || height == 0 {
            return Err(HalftoneError::BufferBoundsExceeded {
                what: "output band area",
                expected: 1,
                actual: 0,
            });
        }

        let plane_len = width
            .checked_mul(height)
            .ok_or(HalftoneError::Allocation { what: "ink plane", elements: usize::MAX })?;
        let preview_len = plane_len
            .checked_mul(channels)
            .ok_or(HalftoneError::Allocation { what: "preview", elements: usize::MAX })?;

        let inks = (0..channels)
            .map(|_| try_zeroed("ink plane", plane_len))
            .collect::<Result<Vec<_>>>()?;
        let preview_planes = (0..channels)
            .map(|_| try_zeroed("preview plane", plane_len))
            .collect::<Result<Vec<_>>>()?;
        let preview = try_zeroed("preview", preview_len)?;

        Ok(Self { width, height, channels, inks, preview_planes, preview })
    }

    /// Output width.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Output height.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Number of channels.
    #[must_use]
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// The print plane of physical ink `ink`.
    ///
    /// # Panics
    /// Panics if `ink >= channels`.
    #[must_use]
    pub fn ink(&self, ink: usize) -> &[u8] {
        &self.inks[ink]
    }

    /// All print planes, indexed by physical ink.
    #[must_use]
    pub fn inks(&self) -> &[Vec<u8>] {
        &self.inks
    }

    /// The interleaved preview.
    #[must_use]
    pub fn preview(&self) -> &[u8] {
        &self.preview
    }

    /// Consumes the buffers, returning the print planes and the preview.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Vec<u8>>, Vec<u8>) {
        (self.inks, self.preview)
    }

    /// Splits the buffers into per-row sinks.
    ///
    /// The returned table is indexed by `[logical channel][row]`;
    /// each entry borrows the channel's ink row and preview row.
    pub(crate) fn row_sinks(&mut self, ink_order: &[u8]) -> Vec<Vec<Option<RowSink<'_>>>> {
        let width = self.width;

        // reorder the ink planes from physical to logical channel order
        let mut inks = self.inks.iter_mut().map(Some).collect::<Vec<_>>();
        let logical_inks = ink_order
            .iter()
            .filter_map(|&ink| inks[usize::from(ink)].take())
            .collect::<Vec<_>>();

        logical_inks
            .into_iter()
            .zip(&mut self.preview_planes)
            .map(|(ink, preview)| {
                ink.chunks_exact_mut(width)
                    .zip(preview.chunks_exact_mut(width))
                    .map(|(ink, preview)| Some(RowSink { ink, preview }))
                    .collect()
            })
            .collect()
    }

    /// Writes the preview planes into the interleaved preview.
    pub(crate) fn interleave_preview(&mut self) {
        let channels = self.channels;
        for (channel, plane) in self.preview_planes.iter().enumerate() {
            for (pixel, &value) in self.preview.chunks_exact_mut(channels).zip(plane) {
                pixel[channel] = value;
            }
        }
    }
}

/// The output row of one channel: a row of its physical ink plane and of its preview plane.
#[derive(Debug)]
pub struct RowSink<'a> {
    /// Dot levels, written to the channel's physical ink plane.
    pub(crate) ink: &'a mut [u8],
    /// Preview values for the channel.
    pub(crate) preview: &'a mut [u8],
}

impl<'a> RowSink<'a> {
    /// Creates a sink over an ink row and a preview row of the same width.
    #[must_use]
    pub fn new(ink: &'a mut [u8], preview: &'a mut [u8]) -> Self {
        Self { ink, preview }
    }
}

/// Dot counts per ink and dot level, used for ink usage reporting.
///
/// During a band each task counts by logical channel;
/// the run-global tally is indexed by physical ink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DotVolumeTally {
    /// `counts[ink][level]`.
    counts: [[u64; MAX_DOT_LEVELS]; MAX_CHANNELS],
}

impl Default for DotVolumeTally {
    fn default() -> Self {
        Self::new()
    }
}

impl DotVolumeTally {
    /// Creates an empty tally.
    #[must_use]
    pub const fn new() -> Self {
        Self { counts: [[0; MAX_DOT_LEVELS]; MAX_CHANNELS] }
    }

    /// Counts one dot.
    #[inline]
    pub(crate) fn record(&mut self, channel: usize, level: u8) {
        self.counts[channel][usize::from(level)] += 1;
    }

    /// The number of dots of `level` printed with `ink`.
    ///
    /// # Panics
    /// Panics if `ink >= 16` or `level >= 16`.
    #[must_use]
    pub fn get(&self, ink: usize, level: usize) -> u64 {
        self.counts[ink][level]
    }

    /// The dot counts of one ink, indexed by dot level.
    #[must_use]
    pub fn ink(&self, ink: usize) -> &[u64; MAX_DOT_LEVELS] {
        &self.counts[ink]
    }

    /// Total dots of any level (including "no dot") printed with `ink`.
    #[must_use]
    pub fn ink_total(&self, ink: usize) -> u64 {
        self.counts[ink].iter().sum()
    }

    /// Total dots over all inks and levels.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Mean darkness of `ink` over all its counted pixels,
    /// weighting each dot level by `dot_level_percent`.
    ///
    /// Returns `0.0` if nothing has been counted for `ink`.
    #[must_use]
    pub fn coverage(&self, ink: usize, dot_level_percent: &[f32]) -> f64 {
        let total = self.ink_total(ink);
        if total == 0 {
            return 0.0;
        }

        #[allow(clippy::cast_precision_loss)]
        let weighted = self.counts[ink]
            .iter()
            .zip(dot_level_percent)
            .map(|(&count, &pct)| count as f64 * f64::from(pct))
            .sum::<f64>();

        #[allow(clippy::cast_precision_loss)]
        {
            weighted / total as f64
        }
    }

    /// Adds another tally, index for index.
    pub fn merge(&mut self, other: &Self) {
        for (dst, src) in self.counts.iter_mut().zip(&other.counts) {
            for (d, &s) in dst.iter_mut().zip(src) {
                *d += s;
            }
        }
    }

    /// Adds a tally counted by logical channel into this tally indexed by physical ink.
    pub fn merge_by_ink(&mut self, logical: &Self, ink_order: &[u8]) {
        for (channel, &ink) in ink_order.iter().enumerate() {
            for (d, &s) in self.counts[usize::from(ink)].iter_mut().zip(&logical.counts[channel]) {
                *d += s;
            }
        }
    }

    /// Resets every count to zero.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn preview_values() {
        assert_eq!(preview_value(0.0), 0);
        assert_eq!(preview_value(1.0), 255);
        assert_eq!(preview_value(0.5), 128);
        assert_eq!(preview_value(2.0), 255);
        assert_eq!(preview_value(-1.0), 0);
    }

    #[test]
    fn buffer_sizes() {
        let out = OutputBuffers::new(5, 3, 4).unwrap();
        assert_eq!(out.inks().len(), 4);
        assert!(out.inks().iter().all(|plane| plane.len() == 15));
        assert_eq!(out.preview().len(), 60);

        assert!(OutputBuffers::new(0, 3, 4).is_err());
        assert_eq!(OutputBuffers::new(5, 3, 17), Err(HalftoneError::InvalidChannelCount(17)));
        assert!(matches!(
            OutputBuffers::new(usize::MAX, 2, 4),
            Err(HalftoneError::Allocation { .. })
        ));
    }

    #[test]
    fn row_sinks_follow_ink_order() {
        let mut out = OutputBuffers::new(2, 2, 3).unwrap();
        let mut sinks = out.row_sinks(&[2, 0, 1]);
        assert_eq!(sinks.len(), 3);

        for (channel, rows) in sinks.iter_mut().enumerate() {
            for (row, sink) in rows.iter_mut().enumerate() {
                let sink = sink.as_mut().unwrap();
                #[allow(clippy::cast_possible_truncation)]
                let value = (channel * 10 + row) as u8;
                sink.ink.fill(value);
                sink.preview.fill(value);
            }
        }
        drop(sinks);
        out.interleave_preview();

        assert_eq!(out.ink(2), &[0, 0, 1, 1]);
        assert_eq!(out.ink(0), &[10, 10, 11, 11]);
        assert_eq!(out.ink(1), &[20, 20, 21, 21]);
        assert_eq!(out.preview(), &[0, 10, 20, 0, 10, 20, 1, 11, 21, 1, 11, 21]);
    }

    #[test]
    fn tally_merge_by_ink() {
        let mut local = DotVolumeTally::new();
        local.record(0, 1);
        local.record(0, 1);
        local.record(3, 2);

        let mut global = DotVolumeTally::new();
        global.merge_by_ink(&local, &[1, 2, 3, 0]);
        assert_eq!(global.get(1, 1), 2);
        assert_eq!(global.get(0, 2), 1);
        assert_eq!(global.get(0, 1), 0);
        assert_eq!(global.total(), 3);

        global.merge(&global.clone());
        assert_eq!(global.ink_total(1), 4);

        global.clear();
        assert_eq!(global, DotVolumeTally::default());
    }

    #[test]
    fn coverage() {
        let mut tally = DotVolumeTally::new();
        tally.record(0, 0);
        tally.record(0, 3);
        let pct = [0.0, 0.25, 0.5, 1.0];
        assert_eq!(tally.coverage(0, &pct), 0.5);
        assert_eq!(tally.coverage(1, &pct), 0.0);
    }
}
