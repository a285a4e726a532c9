use headmatch::{
    nms_matches, ChamferDistance, ChamferKernel, DistanceTable, FilterConfig, GlobalConfig,
    HeadMatchError, MatchConfig, Matcher, OwnedImage, ProceduralRenderer, Shape, ShapeRenderer,
    TemplateFactory,
};

fn stamp(page: &mut OwnedImage, shape: Shape, point_size: u32, x0: usize, y0: usize) {
    let symbol = ProceduralRenderer::new()
        .render(shape, shape.glyph_code(), point_size)
        .unwrap();
    let gray = symbol.to_gray().unwrap();
    for y in 0..gray.height() {
        for x in 0..gray.width() {
            let v = gray.data()[y * gray.width() + x];
            if v < 128 {
                page.set(x0 + x, y0 + y, v);
            }
        }
    }
}

fn page() -> OwnedImage {
    let mut page = OwnedImage::filled(160, 90, 255).unwrap();
    stamp(&mut page, Shape::NoteheadBlack, 48, 20, 25);
    stamp(&mut page, Shape::NoteheadVoid, 48, 100, 30);
    page
}

fn distances(page: &OwnedImage) -> DistanceTable {
    let filter = FilterConfig::Global(GlobalConfig::default())
        .build(page)
        .unwrap();
    let binary = filter.filtered_image().unwrap();
    ChamferDistance::default().compute_to_fore(&binary).unwrap()
}

#[test]
fn match_all_finds_stamped_heads() {
    let page = page();
    let table = distances(&page);
    let factory = TemplateFactory::new(ProceduralRenderer::new());
    let catalog = factory.catalog(48).unwrap();

    let black = Matcher::new(catalog.template(Shape::NoteheadBlack).clone());
    let mut matches = black.match_all(&table, 0.3).unwrap();
    assert!(matches.iter().all(|m| m.score <= 0.3));
    assert!(matches
        .windows(2)
        .all(|w| (w[0].y, w[0].x) < (w[1].y, w[1].x)));
    let kept = nms_matches(&mut matches, 5);
    let best = kept.first().unwrap();
    assert_eq!((best.x, best.y), (20, 25));

    let void = Matcher::new(catalog.template(Shape::NoteheadVoid).clone());
    let mut matches = void.match_all(&table, 0.3).unwrap();
    let kept = nms_matches(&mut matches, 5);
    assert_eq!((kept[0].x, kept[0].y), (100, 30));

    let black_on_void = black.evaluate(100, 30, None, &table).unwrap();
    let void_on_void = void.evaluate(100, 30, None, &table).unwrap();
    assert!(void_on_void < black_on_void);
}

#[test]
fn match_all_rejects_small_tables() {
    let factory = TemplateFactory::new(ProceduralRenderer::new());
    let template = factory.template(Shape::NoteheadBlack, 48).unwrap();
    let (w, h) = (template.width(), template.height());
    let table = DistanceTable::<i32>::new(w - 1, h + 5, 3).unwrap();
    let err = Matcher::new(template).match_all(&table, 0.5).unwrap_err();
    assert!(matches!(err, HeadMatchError::RoiOutOfBounds { .. }));
}

#[test]
fn match_all_requires_the_template_kernel() {
    let page = page();
    let table: DistanceTable = ChamferDistance::new(ChamferKernel::Chamfer5)
        .compute_to_fore(&page)
        .unwrap();
    let factory = TemplateFactory::new(ProceduralRenderer::new());
    let template = factory.template(Shape::NoteheadBlack, 48).unwrap();
    let err = Matcher::new(template).match_all(&table, 0.5).unwrap_err();
    assert_eq!(
        err,
        HeadMatchError::NormalizerMismatch {
            template: 3,
            table: 5
        }
    );
}

#[test]
fn matcher_rejects_invalid_weights() {
    let page = page();
    let table = distances(&page);
    let factory = TemplateFactory::new(ProceduralRenderer::new());
    let template = factory.template(Shape::NoteheadBlack, 48).unwrap();
    let matcher = Matcher::new(template).with_config(MatchConfig {
        max_distance: 0.0,
        ..MatchConfig::default()
    });
    assert!(matcher.match_all(&table, 0.5).is_err());
}
