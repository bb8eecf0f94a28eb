#![allow(dead_code)]

use std::sync::OnceLock;

use inkjet_halftone::{kernel_size, BitDepth, LookupTables};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;

/// Owned lookup tables for a linear dot ramp.
pub struct Tables {
    pub dot: Vec<u8>,
    pub error: Vec<f32>,
    pub pct: Vec<f32>,
}

impl Tables {
    /// A linear ramp over `levels` dot levels whose residual follows the Floyd-Steinberg shape.
    pub fn ramp(depth: BitDepth, kernel: u8, levels: u8) -> Self {
        let max = f32::from(depth.max_value());
        let size = kernel_size(kernel).unwrap();
        let steps = f32::from(levels - 1);

        let pct = (0..levels).map(|l| f32::from(l) / steps).collect::<Vec<_>>();
        let mut dot = Vec::with_capacity(depth.levels());
        let mut error = vec![0.0; depth.levels() * size];

        for (p, weights) in error.chunks_exact_mut(size).enumerate() {
            let level = (p as f32 * steps / max).round() as u8;
            let residual = p as f32 - pct[usize::from(level)] * max;
            weights[4] = residual * 7.0 / 16.0;
            weights[9] = residual * 3.0 / 16.0;
            weights[10] = residual * 5.0 / 16.0;
            weights[11] = residual / 16.0;
            dot.push(level);
        }

        Self { dot, error, pct }
    }

    pub fn lookup(&self) -> LookupTables<'_> {
        LookupTables::new(&self.dot, &self.error, &self.pct)
    }
}

pub const KERNEL: u8 = 16;
pub const CHANNELS: usize = 4;
pub const BAND_WIDTH: usize = 600;
pub const BAND_HEIGHT: usize = 255;

static TABLES: OnceLock<Tables> = OnceLock::new();

pub fn tables() -> &'static Tables {
    TABLES.get_or_init(|| Tables::ramp(BitDepth::Sixteen, KERNEL, 4))
}

/// Smooth CMYK gradients: the worst case for worm artifacts.
pub fn smooth_band(width: usize, height: usize) -> Vec<u16> {
    let mut samples = Vec::with_capacity(width * height * CHANNELS);
    for y in 0..height {
        for x in 0..width {
            let t = (x * 65535 / width) as u32;
            let s = (y * 65535 / height) as u32;
            samples.extend([t, s, (t + s) / 2, 65535 - t].map(|v| v as u16));
        }
    }
    samples
}

/// Uniformly random samples: high frequency content with little noise injected.
pub fn noisy_band(width: usize, height: usize, seed: u64) -> Vec<u16> {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    (0..(width * height * CHANNELS)).map(|_| rng.gen()).collect()
}

static BANDS: OnceLock<Vec<(String, Vec<u16>)>> = OnceLock::new();

pub fn benchmark_bands() -> &'static [(String, Vec<u16>)] {
    BANDS.get_or_init(|| {
        vec![
            ("smooth".to_owned(), smooth_band(BAND_WIDTH, BAND_HEIGHT)),
            ("noisy".to_owned(), noisy_band(BAND_WIDTH, BAND_HEIGHT, 42)),
        ]
    })
}
