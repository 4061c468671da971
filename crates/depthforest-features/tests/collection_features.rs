//! Feature responses evaluated over collections built from frame pairs.

use depthforest_features::{
    AnyFeatureResponse, FeatureResponse, PixelSubtractionResponse, RandomHyperplaneResponse,
};
use depthforest_samples::{
    CollectionConfig, FeatureGeometry, Frame, FrameNaming, ImageSize, InputDevice,
    MemoryImageSource,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const SIZE: ImageSize = ImageSize {
    width: 16,
    height: 12,
};

fn collection(geometry: FeatureGeometry, patch_size: usize) -> depthforest_samples::DataPointCollection {
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    let naming = FrameNaming::new(std::env::temp_dir(), "feat", InputDevice::Webcam);
    let mut source = MemoryImageSource::new();
    for i in 0..3 {
        let intensity = Frame::from_fn(SIZE, |_, _| rng.gen_range(0..=255u8));
        let depth = Frame::from_fn(SIZE, |_, _| rng.gen_range(1..1500u16));
        source.insert_pair(&naming, i, intensity, depth);
    }
    CollectionConfig::new(naming, 0, 3, SIZE)
        .unwrap()
        .with_patch_size(patch_size)
        .with_geometry(geometry)
        .load(&source)
        .unwrap()
}

#[test]
fn in_bounds_samples_always_evaluate() {
    let data = collection(FeatureGeometry::PixelDifference, 5);
    assert_eq!(data.dimension(), 25);
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    for _ in 0..20 {
        let f = AnyFeatureResponse::create_random(FeatureGeometry::PixelDifference, &mut rng, data.dimension());
        for sample in 0..data.count() {
            let within = data.offset_in_bounds(sample, f.max_offset());
            assert_eq!(f.try_response(&data, sample).is_some(), within);
        }
    }
}

#[test]
fn subtraction_matches_definition_across_images() {
    let data = collection(FeatureGeometry::PixelDifference, 3);
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let f = PixelSubtractionResponse::create_random(&mut rng, data.dimension());
    let [o0, o1] = f.offsets();
    for sample in (0..data.count()).filter(|&s| data.offset_in_bounds(s, f.max_offset())) {
        let pos = data.position(sample);
        let image = &data.images()[pos.image];
        let at = |o: depthforest_features::Offset| {
            f64::from(image.get(
                (pos.row as i32 + o.dy) as usize,
                (pos.col as i32 + o.dx) as usize,
            ))
        };
        assert_eq!(f.response(&data, sample), at(o0) - at(o1));
    }
}

#[test]
fn hyperplane_with_patch_side_dimension() {
    let data = collection(FeatureGeometry::Hyperplane, 9);
    assert_eq!(data.dimension(), 9);
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let f = RandomHyperplaneResponse::create_random(&mut rng, data.dimension());
    assert_eq!(f.offsets().len(), 9);
    assert!(f.max_offset() <= 1);
    let any = AnyFeatureResponse::Hyperplane(f.clone());
    let centre = data.count() / 2;
    if data.offset_in_bounds(centre, 1) {
        assert_eq!(any.response(&data, centre), f.response(&data, centre));
    }
}

#[test]
fn same_seed_gives_same_features_and_responses() {
    let data = collection(FeatureGeometry::PixelDifference, 5);
    let draw = |seed: u64| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..10)
            .map(|_| AnyFeatureResponse::create_random(FeatureGeometry::PixelDifference, &mut rng, 25))
            .collect::<Vec<_>>()
    };
    let a = draw(99);
    let b = draw(99);
    assert_eq!(a, b);
    for (fa, fb) in a.iter().zip(&b) {
        for sample in 0..data.count() {
            assert_eq!(fa.try_response(&data, sample), fb.try_response(&data, sample));
        }
    }
}
