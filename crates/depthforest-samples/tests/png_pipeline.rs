//! End-to-end tests: PNG frame pairs on disk -> DataPointCollection.

use std::fs;

use depthforest_samples::{
    BinTableGenerator, ClassSelector, CollectionConfig, DepthUnits, FrameNaming, ImageSize,
    InputDevice, PngImageSource, SampleError, TrainingMode, UniformBins,
};
use image::{ImageBuffer, Luma};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tempfile::TempDir;

const WIDTH: u32 = 12;
const HEIGHT: u32 = 9;
const MAX_RANGE: u16 = 1200;

struct Pair {
    intensity: Vec<u8>,
    depth: Vec<u16>,
}

/// Write `n` random frame pairs named `s{i}ir.png` / `s{i}depth.png`.
fn write_pairs(dir: &TempDir, n: usize, seed: u64) -> Vec<Pair> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let intensity: Vec<u8> = (0..WIDTH * HEIGHT)
                .map(|_| if rng.gen_bool(0.4) { 0 } else { rng.gen_range(1..=255) })
                .collect();
            let depth: Vec<u16> = (0..WIDTH * HEIGHT)
                .map(|_| rng.gen_range(0..=MAX_RANGE + 100))
                .collect();
            let ir_img: ImageBuffer<Luma<u8>, Vec<u8>> =
                ImageBuffer::from_raw(WIDTH, HEIGHT, intensity.clone()).unwrap();
            let depth_img: ImageBuffer<Luma<u16>, Vec<u16>> =
                ImageBuffer::from_raw(WIDTH, HEIGHT, depth.clone()).unwrap();
            ir_img.save(dir.path().join(format!("s{i}ir.png"))).unwrap();
            depth_img
                .save(dir.path().join(format!("s{i}depth.png")))
                .unwrap();
            Pair { intensity, depth }
        })
        .collect()
}

fn config(dir: &TempDir, n: usize) -> CollectionConfig {
    let naming = FrameNaming::new(dir.path(), "s", InputDevice::Infrared);
    CollectionConfig::new(naming, 0, n, ImageSize::new(WIDTH as usize, HEIGHT as usize))
        .unwrap()
        .with_depth_units(DepthUnits::Millimeters {
            max_range: MAX_RANGE,
        })
        .with_bins(6)
}

#[test]
fn classification_matches_sequential_scan() {
    let dir = TempDir::new().unwrap();
    let pairs = write_pairs(&dir, 5, 7);
    let cfg = config(&dir, 5);
    let data = cfg.load(&PngImageSource).unwrap();

    let table = UniformBins.generate(true, 6, MAX_RANGE).unwrap();
    let step = (WIDTH * HEIGHT) as usize;
    let mut expected_indices = Vec::new();
    let mut expected_labels = Vec::new();
    for (img, pair) in pairs.iter().enumerate() {
        for (p, (&ir, &d)) in pair.intensity.iter().zip(&pair.depth).enumerate() {
            if ir != 0 {
                expected_indices.push(img * step + p);
                expected_labels.push(table.label(d));
            }
        }
    }

    assert_eq!(data.image_count(), 5);
    assert_eq!(data.indices().unwrap(), expected_indices.as_slice());
    assert_eq!(data.labels().unwrap(), expected_labels.as_slice());
    assert!(data.is_consistent());
    assert!(data.indices().unwrap().windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn regression_targets_are_raw_depths() {
    let dir = TempDir::new().unwrap();
    let pairs = write_pairs(&dir, 3, 11);
    let cfg = config(&dir, 3).with_mode(TrainingMode::Regression {
        target: ClassSelector::Class(3),
    });
    let data = cfg.load(&PngImageSource).unwrap();
    let table = data.bin_table().unwrap();

    assert_eq!(data.indices().unwrap().len(), data.targets().unwrap().len());
    for i in 0..data.count() {
        let pos = data.position(i);
        let pixel = pos.row * WIDTH as usize + pos.col;
        let depth = pairs[pos.image].depth[pixel];
        assert_eq!(data.target(i), Some(depth));
        assert_eq!(table.label(depth), 3);
        assert_ne!(data.intensity(i), 0);
    }
}

#[test]
fn missing_file_skips_pair() {
    let dir = TempDir::new().unwrap();
    let pairs = write_pairs(&dir, 3, 3);
    fs::remove_file(dir.path().join("s1depth.png")).unwrap();
    let data = config(&dir, 3)
        .with_train_on_zero(true)
        .load(&PngImageSource)
        .unwrap();

    assert!(data.low_memory());
    assert_eq!(data.report().failed_loads, 1);
    assert_eq!(data.image_count(), 2);
    assert_eq!(data.count(), 2 * (WIDTH * HEIGHT) as usize);
    // the third pair now occupies corpus slot 1
    let step = data.step();
    let expected = pairs[2].intensity[0];
    assert_eq!(data.intensity(step), expected);
}

#[test]
fn eight_bit_depth_aborts_batch() {
    let dir = TempDir::new().unwrap();
    write_pairs(&dir, 2, 5);
    let bad: ImageBuffer<Luma<u8>, Vec<u8>> = ImageBuffer::from_pixel(WIDTH, HEIGHT, Luma([4]));
    bad.save(dir.path().join("s1depth.png")).unwrap();

    let result = config(&dir, 2).load(&PngImageSource);
    assert!(matches!(
        result,
        Err(SampleError::UnexpectedPixelFormat { .. })
    ));
}

#[test]
fn offset_first_index() {
    let dir = TempDir::new().unwrap();
    write_pairs(&dir, 4, 9);
    let naming = FrameNaming::new(dir.path(), "s", InputDevice::Infrared);
    let cfg = CollectionConfig::new(naming, 2, 2, ImageSize::new(WIDTH as usize, HEIGHT as usize))
        .unwrap()
        .with_train_on_zero(true);
    let data = cfg.load(&PngImageSource).unwrap();
    assert_eq!(data.image_count(), 2);
    assert_eq!(data.report().requested, 2);
}
