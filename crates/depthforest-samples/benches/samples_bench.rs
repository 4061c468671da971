//! Criterion benchmarks for depth binning and batch sample collection.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use depthforest_samples::{
    BinTableGenerator, CollectionConfig, Frame, FrameNaming, ImageSize, InputDevice,
    MemoryImageSource, UniformBins, bin_depth,
};

const SIZE: ImageSize = ImageSize {
    width: 640,
    height: 480,
};

fn random_pair(rng: &mut ChaCha8Rng) -> (Frame<u8>, Frame<u16>) {
    let intensity = Frame::from_fn(SIZE, |_, _| if rng.gen_bool(0.3) { 0 } else { rng.r#gen() });
    let depth = Frame::from_fn(SIZE, |_, _| rng.gen_range(0..2000));
    (intensity, depth)
}

fn bench_bin_depth(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let (_, depth) = random_pair(&mut rng);
    let table = UniformBins.generate(true, 8, 1500).unwrap();

    c.bench_function("bin_depth_640x480", |b| {
        b.iter(|| bin_depth(&depth, &table));
    });
}

fn bench_load_batch(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let naming = FrameNaming::new(std::env::temp_dir(), "bench", InputDevice::Infrared);
    let mut source = MemoryImageSource::new();
    for i in 0..8 {
        let (intensity, depth) = random_pair(&mut rng);
        source.insert_pair(&naming, i, intensity, depth);
    }
    let cfg = CollectionConfig::new(naming, 0, 8, SIZE).unwrap().with_bins(8);

    c.bench_function("load_8_pairs_640x480_filtered", |b| {
        b.iter(|| cfg.load(&source).unwrap());
    });

    let low_memory = cfg.clone().with_train_on_zero(true);
    c.bench_function("load_8_pairs_640x480_low_memory", |b| {
        b.iter(|| low_memory.load(&source).unwrap());
    });
}

criterion_group!(benches, bench_bin_depth, bench_load_batch);
criterion_main!(benches);
