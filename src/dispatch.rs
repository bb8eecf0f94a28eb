//! The band dispatcher.
//!
//! A band is split into tasks according to the thread budget. Every task receives exclusive
//! ownership of the error planes and output rows it touches before any task starts,
//! so tasks share nothing mutable and the join is the only synchronization point.

use crate::{
    DotVolumeTally, ErrorBufferStore, ErrorPlane, HalftoneError, InputRaster, NoiseSource,
    OutputBuffers, Parity, Result, RowHalftoner, RowSink, RunConfiguration, Sample,
};
#[cfg(feature = "threads")]
use rayon::prelude::*;
use std::ops::Range;

/// How the rows and channels of a band are partitioned into tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Strategy {
    /// `channels * 2` tasks: one per channel and row parity, each with its own error bank.
    Interlaced,
    /// `channels` tasks: one per channel over all rows.
    PerChannel,
    /// 2 tasks: one per row parity, each looping over all channels.
    PerParity,
    /// A single task over all channels and rows.
    Sequential,
}

impl Strategy {
    /// Selects the strategy for a thread budget.
    ///
    /// | threads | strategy |
    /// |---------|----------|
    /// | `>= 8`  | [`Strategy::Interlaced`] |
    /// | `4..8`  | [`Strategy::PerChannel`] |
    /// | `2..4`  | [`Strategy::PerParity`] |
    /// | `< 2`, or `parallel` is `false` | [`Strategy::Sequential`] |
    #[must_use]
    pub const fn select(threads: usize, parallel: bool) -> Self {
        if !parallel {
            return Self::Sequential;
        }

        match threads {
            8.. => Self::Interlaced,
            4..=7 => Self::PerChannel,
            2..=3 => Self::PerParity,
            _ => Self::Sequential,
        }
    }
}

/// One task of a band: a range of channels and an arithmetic progression of rows,
/// diffusing into one error bank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkUnit {
    /// The error bank written by this task.
    pub bank: Parity,
    /// The logical channels processed, in order.
    pub channels: Range<usize>,
    /// The first output row.
    pub first_row: usize,
    /// The distance between consecutive rows, `1` or `2`.
    pub row_step: usize,
}

impl WorkUnit {
    /// The output rows of a band of `height` rows processed by this unit.
    pub fn rows(&self, height: usize) -> impl Iterator<Item = usize> {
        (self.first_row..height).step_by(self.row_step)
    }

    /// The key mixed into the noise seed of this unit's task.
    #[must_use]
    pub fn key(&self, band: u64) -> u64 {
        (band << 32) | ((self.bank.index() as u64) << 16) | self.channels.start as u64
    }
}

/// Computes the tasks of a band with `channels` channels.
///
/// Across the returned units every (row, channel) pair is covered exactly once,
/// and no two units share a (bank, channel) error plane.
#[must_use]
pub fn plan(strategy: Strategy, channels: usize) -> Vec<WorkUnit> {
    match strategy {
        Strategy::Interlaced => (0..channels)
            .flat_map(|channel| {
                Parity::ALL.map(|bank| WorkUnit {
                    bank,
                    channels: channel..(channel + 1),
                    first_row: bank.index(),
                    row_step: 2,
                })
            })
            .collect(),
        Strategy::PerChannel => (0..channels)
            .map(|channel| WorkUnit {
                bank: Parity::Even,
                channels: channel..(channel + 1),
                first_row: 0,
                row_step: 1,
            })
            .collect(),
        Strategy::PerParity => Parity::ALL
            .map(|bank| WorkUnit {
                bank,
                channels: 0..channels,
                first_row: bank.index(),
                row_step: 2,
            })
            .to_vec(),
        Strategy::Sequential => vec![WorkUnit {
            bank: Parity::Even,
            channels: 0..channels,
            first_row: 0,
            row_step: 1,
        }],
    }
}

/// The result of halftoning one band.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BandReport {
    /// The partitioning used.
    pub strategy: Strategy,
    /// The number of tasks run.
    pub tasks: usize,
    /// The dots emitted for this band, by physical ink.
    pub tally: DotVolumeTally,
}

/// The error plane and output rows of one channel within a task.
struct Lane<'p> {
    /// The logical channel.
    channel: usize,
    /// The channel's plane in the task's bank.
    plane: ErrorPlane<'p>,
    /// The rows to process, in order.
    rows: Vec<(usize, RowSink<'p>)>,
}

/// A work unit together with the buffers it owns.
struct Task<'p> {
    /// The partition.
    unit: WorkUnit,
    /// One lane per channel of the unit.
    lanes: Vec<Lane<'p>>,
}

/// The error reported when a partition hands out the same buffer twice.
const fn overlap(what: &'static str) -> HalftoneError {
    HalftoneError::BufferBoundsExceeded { what, expected: 1, actual: 0 }
}

/// Hands every task exclusive ownership of its error planes and output rows.
fn distribute<'p>(
    units: Vec<WorkUnit>,
    channels: usize,
    ink_order: &[u8],
    store: &'p mut ErrorBufferStore,
    output: &'p mut OutputBuffers,
) -> Result<Vec<Task<'p>>> {
    let height = output.height();
    let mut planes = store.planes_mut();
    let mut sinks = output.row_sinks(ink_order);

    units
        .into_iter()
        .map(|unit| -> Result<Task<'p>> {
            let lanes = unit
                .channels
                .clone()
                .map(|channel| -> Result<Lane<'p>> {
                    let plane = planes[unit.bank.index() * channels + channel]
                        .take()
                        .ok_or(overlap("error plane partition"))?;

                    let rows = unit
                        .rows(height)
                        .map(|row| {
                            sinks[channel][row]
                                .take()
                                .map(|sink| (row, sink))
                                .ok_or(overlap("output row partition"))
                        })
                        .collect::<Result<Vec<_>>>()?;

                    Ok(Lane { channel, plane, rows })
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(Task { unit, lanes })
        })
        .collect()
}

impl Task<'_> {
    /// Processes the task's lanes in order, returning its tally by logical channel.
    fn run<S: Sample>(
        self,
        halftoner: &RowHalftoner<'_, '_, S>,
        band: u64,
    ) -> Result<DotVolumeTally> {
        let Self { unit, lanes } = self;
        let mut noise = NoiseSource::new(halftoner.config(), unit.key(band));
        let mut tally = DotVolumeTally::new();

        for Lane { channel, mut plane, rows } in lanes {
            for (row, sink) in rows {
                halftoner.process_row(row, channel, &mut plane, sink, &mut noise, &mut tally)?;
            }
        }

        tracing::trace!(
            bank = unit.bank.index(),
            channels = ?unit.channels,
            first_row = unit.first_row,
            dots = tally.total(),
            "task finished"
        );

        Ok(tally)
    }
}

/// Runs the tasks, concurrently when the `threads` feature is enabled.
fn run_tasks<S: Sample>(
    tasks: Vec<Task<'_>>,
    halftoner: &RowHalftoner<'_, '_, S>,
    band: u64,
    concurrent: bool,
) -> Result<Vec<DotVolumeTally>> {
    #[cfg(feature = "threads")]
    {
        if concurrent {
            return tasks
                .into_par_iter()
                .map(|task| task.run(halftoner, band))
                .collect();
        }
    }

    #[cfg(not(feature = "threads"))]
    let _ = concurrent;

    tasks.into_iter().map(|task| task.run(halftoner, band)).collect()
}

/// Halftones one band of `raster` into `output`, carrying error in `store`.
///
/// `band` identifies the band within the run and is mixed into the noise seeds.
/// The returned report holds the tally of this band by physical ink.
///
/// # Errors
/// Returns [`HalftoneError::SampleDepthMismatch`] if the sample type does not match the
/// configuration, or [`HalftoneError::BufferBoundsExceeded`] if the raster, store, and
/// output dimensions do not agree with each other and the configuration.
pub fn dispatch_band<S: Sample>(
    config: &RunConfiguration<'_>,
    band: u64,
    raster: InputRaster<'_, S>,
    store: &mut ErrorBufferStore,
    output: &mut OutputBuffers,
) -> Result<BandReport> {
    let channels = config.channels();
    HalftoneError::check_len("output channels", channels, output.channels())?;
    HalftoneError::check_len("error buffer channels", channels, store.channels())?;
    HalftoneError::check_len(
        "error buffer rows",
        usize::from(config.kernel().height),
        store.rows(),
    )?;
    HalftoneError::check_len("error buffer width", output.width(), store.width())?;

    let halftoner = RowHalftoner::new(config, raster, output.width(), output.height())?;

    let strategy = Strategy::select(config.threads(), config.parallel());
    let units = plan(strategy, channels);
    let tasks = units.len();

    tracing::debug!(
        band,
        ?strategy,
        tasks,
        input_width = raster.width(),
        input_height = raster.height(),
        output_width = output.width(),
        output_height = output.height(),
        channels,
        "dispatching band"
    );

    let work = distribute(units, channels, config.ink_order(), store, output)?;
    let tallies = run_tasks(work, &halftoner, band, tasks > 1)?;

    let mut tally = DotVolumeTally::new();
    for local in &tallies {
        tally.merge_by_ink(local, config.ink_order());
    }

    output.interleave_preview();

    Ok(BandReport { strategy, tasks, tally })
}
