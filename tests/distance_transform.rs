use headmatch::lowlevel::{TARGET, UNASSIGNED};
use headmatch::{
    AdaptiveConfig, AdaptiveFilter, ChamferDistance, ChamferKernel, DistanceTable, Distances,
    ImageView, OwnedImage, PixelFilter,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const KERNELS: [ChamferKernel; 4] = [
    ChamferKernel::Chamfer3,
    ChamferKernel::Chamfer5,
    ChamferKernel::Chamfer7,
    ChamferKernel::Chamfer13,
];

fn single_target(width: usize, height: usize, tx: usize, ty: usize) -> Vec<bool> {
    let mut mask = vec![false; width * height];
    mask[ty * width + tx] = true;
    mask
}

fn random_mask(width: usize, height: usize, density: f64, seed: u64) -> Vec<bool> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..width * height)
        .map(|_| rng.random_range(0.0..1.0) < density)
        .collect()
}

#[test]
fn chamfer3_single_target_uses_axial_and_diagonal_weights() {
    let mask = single_target(6, 6, 0, 0);
    let view = ImageView::from_slice(&mask, 6, 6).unwrap();
    let table: DistanceTable = ChamferDistance::new(ChamferKernel::Chamfer3)
        .compute(view)
        .unwrap();
    assert_eq!(table.value(0, 0), TARGET);
    assert_eq!(table.value(1, 0), 3);
    assert_eq!(table.value(0, 1), 3);
    assert_eq!(table.value(1, 1), 4);
    assert_eq!(table.value(2, 1), 7);
    assert_eq!(table.value(5, 5), 20);
    assert_eq!(table.normalizer(), 3);
}

#[test]
fn distances_grow_with_chebyshev_rings() {
    let size = 20;
    let mask = single_target(size, size, 0, 0);
    let view = ImageView::from_slice(&mask, size, size).unwrap();
    for kernel in KERNELS {
        let table: DistanceTable = ChamferDistance::new(kernel).compute(view).unwrap();
        assert_eq!(table.value(0, 0), 0);
        let mut previous_min = 0;
        for ring in 1..size {
            let ring_min = (0..=ring)
                .flat_map(|i| [table.value(ring, i), table.value(i, ring)])
                .min()
                .unwrap();
            assert!(ring_min >= previous_min, "{kernel:?} ring {ring}");
            previous_min = ring_min;

            assert!(table.value(ring, 0) > table.value(ring - 1, 0));
            assert!(table.value(0, ring) > table.value(0, ring - 1));
            assert!(table.value(ring, ring) > table.value(ring - 1, ring - 1));
        }
    }
}

#[test]
fn centered_target_is_symmetric() {
    let mask = single_target(15, 15, 7, 7);
    let view = ImageView::from_slice(&mask, 15, 15).unwrap();
    for kernel in KERNELS {
        let table: DistanceTable = ChamferDistance::new(kernel).compute(view).unwrap();
        for y in 0..15 {
            for x in 0..15 {
                let v = table.value(x, y);
                assert_eq!(v, table.value(14 - x, y));
                assert_eq!(v, table.value(x, 14 - y));
                assert_eq!(v, table.value(y, x));
            }
        }
    }
}

#[test]
fn empty_reference_leaves_everything_unassigned() {
    let mask = vec![false; 12];
    let view = ImageView::from_slice(&mask, 4, 3).unwrap();
    let table: DistanceTable = ChamferDistance::default().compute(view).unwrap();
    for y in 0..3 {
        for x in 0..4 {
            assert_eq!(table.value(x, y), UNASSIGNED);
        }
    }
}

#[test]
fn short_and_integer_tables_agree() {
    let mask = random_mask(40, 30, 0.02, 99);
    let view = ImageView::from_slice(&mask, 40, 30).unwrap();
    let chamfer = ChamferDistance::new(ChamferKernel::Chamfer5);
    let short: DistanceTable<i16> = chamfer.compute(view).unwrap();
    let wide: DistanceTable<i32> = chamfer.compute(view).unwrap();
    for y in 0..30 {
        for x in 0..40 {
            assert_eq!(short.value(x, y), wide.value(x, y));
        }
    }
}

#[test]
fn copies_and_views_keep_values_and_normalizer() {
    let (width, height) = (37, 29);
    let mask = random_mask(width, height, 0.05, 42);
    let view = ImageView::from_slice(&mask, width, height).unwrap();
    let table: DistanceTable = ChamferDistance::new(ChamferKernel::Chamfer7)
        .compute(view)
        .unwrap();

    let mut rng = StdRng::seed_from_u64(4242);
    for _ in 0..25 {
        let rw = rng.random_range(1..=width);
        let rh = rng.random_range(1..=height);
        let rx = rng.random_range(0..=width - rw);
        let ry = rng.random_range(0..=height - rh);

        let copy = table.copy(rx, ry, rw, rh).unwrap();
        let region = table.view(rx, ry, rw, rh).unwrap();
        assert_eq!(copy.normalizer(), 14);
        assert_eq!(region.normalizer(), 14);
        for y in 0..rh {
            for x in 0..rw {
                let expected = table.value(x + rx, y + ry);
                assert_eq!(copy.value(x, y), expected);
                assert_eq!(Distances::value(&region, x, y), expected);
            }
        }
    }
}

#[test]
fn nested_views_compose_offsets() {
    let mask = random_mask(20, 20, 0.1, 8);
    let view = ImageView::from_slice(&mask, 20, 20).unwrap();
    let table: DistanceTable = ChamferDistance::default().compute(view).unwrap();
    let outer = table.view(3, 4, 12, 10).unwrap();
    let inner = outer.view(2, 1, 5, 5).unwrap();
    assert_eq!(inner.get(4, 4), Some(table.value(9, 9)));
    assert_eq!(inner.get(5, 0), None);
    assert_eq!(inner.to_table().unwrap().value(0, 0), table.value(5, 5));
    assert!(outer.view(8, 0, 5, 1).is_err());
}

#[test]
fn to_back_measures_ink_thickness() {
    let mut page = OwnedImage::filled(9, 9, 255).unwrap();
    for y in 2..7 {
        for x in 2..7 {
            page.set(x, y, 0);
        }
    }
    let chamfer = ChamferDistance::new(ChamferKernel::Chamfer3);
    let to_back: DistanceTable = chamfer.compute_to_back(&page).unwrap();
    assert_eq!(to_back.value(0, 0), 0);
    assert_eq!(to_back.value(2, 2), 3);
    assert_eq!(to_back.value(4, 4), 9);

    let to_fore: DistanceTable = chamfer.compute_to_fore(&page).unwrap();
    assert_eq!(to_fore.value(4, 4), 0);
    assert_eq!(to_fore.value(0, 4), 6);
    assert_eq!(to_fore.value(0, 0), 8);
}

#[test]
fn filtered_distances_match_filtered_image() {
    let mut rng = StdRng::seed_from_u64(17);
    let data = (0..48 * 32).map(|_| rng.random_range(0..=255u8)).collect();
    let page = OwnedImage::new(data, 48, 32).unwrap();
    let cfg = AdaptiveConfig {
        half_window: 5,
        ..AdaptiveConfig::default()
    };
    let filter = AdaptiveFilter::with_sliding_tile(&page, cfg).unwrap();
    let chamfer = ChamferDistance::default();
    let direct: DistanceTable = chamfer.compute_filtered(&filter).unwrap();

    let filter = AdaptiveFilter::with_full_tile(&page, cfg).unwrap();
    let binary = filter.filtered_image().unwrap();
    let via_image: DistanceTable = chamfer.compute_to_fore(&binary).unwrap();
    assert_eq!(direct, via_image);
}
