use headmatch::{
    AdaptiveConfig, ChamferDistance, ChamferKernel, DistanceTable, FilterConfig, MatchConfig,
    Matcher, OwnedImage, ProceduralRenderer, Shape, ShapeRenderer, TemplateFactory, TileStrategy,
};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn make_page(width: usize, height: usize) -> OwnedImage {
    let mut page = OwnedImage::filled(width, height, 235).unwrap();
    for y in 0..height {
        for x in 0..width {
            let shade = 225 + ((x * 13) ^ (y * 7)) % 25;
            page.set(x, y, shade as u8);
        }
    }
    for staff_line in (40..height).step_by(12) {
        for x in 0..width {
            page.set(x, staff_line, 30);
        }
    }
    let head = ProceduralRenderer::new()
        .render(Shape::NoteheadBlack, Shape::NoteheadBlack.glyph_code(), 48)
        .unwrap()
        .to_gray()
        .unwrap();
    for (i, x0) in (20..width - head.width()).step_by(60).enumerate() {
        let y0 = 30 + (i * 17) % (height - head.height() - 30);
        for y in 0..head.height() {
            for x in 0..head.width() {
                let v = head.data()[y * head.width() + x];
                if v < 128 {
                    page.set(x0 + x, y0 + y, v);
                }
            }
        }
    }
    page
}

fn bench_binarize(c: &mut Criterion) {
    let page = make_page(640, 320);
    for (name, tile) in [
        ("adaptive_full_tile", TileStrategy::Full),
        ("adaptive_sliding_tile", TileStrategy::Sliding),
    ] {
        let cfg = FilterConfig::Adaptive {
            cfg: AdaptiveConfig::default(),
            tile,
        };
        c.bench_function(name, |b| {
            b.iter(|| {
                let filter = cfg.build(&page).unwrap();
                black_box(filter.filtered_image().unwrap())
            });
        });
    }
}

fn bench_chamfer(c: &mut Criterion) {
    let page = make_page(640, 320);
    for (name, kernel) in [
        ("chamfer3", ChamferKernel::Chamfer3),
        ("chamfer5", ChamferKernel::Chamfer5),
    ] {
        let transform = ChamferDistance::new(kernel);
        c.bench_function(name, |b| {
            b.iter(|| {
                let table: DistanceTable = transform.compute_to_fore(&page).unwrap();
                black_box(table)
            });
        });
    }
}

fn bench_match(c: &mut Criterion) {
    let page = make_page(640, 320);
    let table: DistanceTable = ChamferDistance::default().compute_to_fore(&page).unwrap();
    let factory = TemplateFactory::new(ProceduralRenderer::new());
    let template = factory.template(Shape::NoteheadBlack, 48).unwrap();

    let matcher = Matcher::new(template.clone());
    c.bench_function("match_all_black_head", |b| {
        b.iter(|| black_box(matcher.match_all(&table, 0.5).unwrap()));
    });

    if cfg!(feature = "rayon") {
        let matcher_par = Matcher::new(template).with_config(MatchConfig {
            parallel: true,
            ..MatchConfig::default()
        });
        c.bench_function("match_all_black_head_parallel", |b| {
            b.iter(|| black_box(matcher_par.match_all(&table, 0.5).unwrap()));
        });
    }

    c.bench_function("catalog_build_48", |b| {
        b.iter(|| {
            let factory = TemplateFactory::new(ProceduralRenderer::new());
            black_box(factory.catalog(48).unwrap())
        });
    });
}

criterion_group!(benches, bench_binarize, bench_chamfer, bench_match);
criterion_main!(benches);
