#[path = "../util/util.rs"]
mod util;

use util::{benchmark_bands, tables, BAND_HEIGHT, BAND_WIDTH, CHANNELS, KERNEL};

use std::time::Duration;

use criterion::{
    criterion_group, criterion_main, measurement::WallTime, Bencher, BenchmarkId, Criterion,
    SamplingMode,
};
use inkjet_halftone::{HalftoneOptions, Halftoner, InputRaster, RunConfiguration};

fn bench(
    c: &mut Criterion,
    group: &str,
    mut f: impl FnMut(&mut Bencher<WallTime>, &(usize, &[u16])),
) {
    let mut group = c.benchmark_group(group);
    group
        .sample_size(20)
        .noise_threshold(0.05)
        .sampling_mode(SamplingMode::Flat)
        .warm_up_time(Duration::from_secs(2));

    for threads in [1, 2, 4, 8] {
        for (name, band) in benchmark_bands() {
            group.bench_with_input(
                BenchmarkId::new(threads.to_string(), name),
                &(threads, band.as_slice()),
                &mut f,
            );
        }
    }
}

fn config(threads: usize, hysteresis: f32) -> RunConfiguration<'static> {
    HalftoneOptions::new()
        .kernel(KERNEL)
        .input_bit_depth(16)
        .image_bit_depth(16)
        .hysteresis(hysteresis)
        .threads(threads)
        .build(tables().lookup())
        .unwrap()
}

fn halftone_band(c: &mut Criterion, group: &str, scale: usize, hysteresis: f32) {
    bench(c, group, |b, &(threads, samples)| {
        let raster = InputRaster::new(samples, BAND_WIDTH, BAND_HEIGHT, CHANNELS).unwrap();
        let config = config(threads, hysteresis);
        let mut halftoner = Halftoner::new(config, BAND_WIDTH * scale).unwrap();
        let mut output = halftoner.new_output(BAND_HEIGHT * scale).unwrap();

        b.iter(|| halftoner.halftone_band(&raster, &mut output).unwrap())
    })
}

fn halftone_identity(c: &mut Criterion) {
    halftone_band(c, "halftone_identity", 1, 0.0);
}

fn halftone_upscale(c: &mut Criterion) {
    halftone_band(c, "halftone_upscale_2x", 2, 0.0);
}

fn halftone_noise(c: &mut Criterion) {
    halftone_band(c, "halftone_noise", 1, 0.15);
}

criterion_group!(benches, halftone_identity, halftone_upscale, halftone_noise);
criterion_main!(benches);
