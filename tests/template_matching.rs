use headmatch::image::Rect;
use headmatch::lowlevel::{KeyPoint, TemplateGeometry, UNASSIGNED};
use headmatch::{
    Anchor, ChamferDistance, ChamferKernel, DistanceTable, HeadMatchError, MatchConfig,
    OwnedImage, ProceduralRenderer, Shape, ShapeRenderer, Template, TemplateBuilder, NO_MATCH,
};

const PAD: usize = 20;

/// Renders `shape` the way the builder does and pastes it on a white page.
fn page_with(
    builder: &TemplateBuilder<ProceduralRenderer>,
    shape: Shape,
    point_size: u32,
) -> OwnedImage {
    let size = builder.render_size(shape, point_size);
    let symbol = builder
        .renderer()
        .render(shape, shape.glyph_code(), size)
        .unwrap();
    let gray = symbol.to_gray().unwrap();
    let mut page =
        OwnedImage::filled(gray.width() + 2 * PAD, gray.height() + 2 * PAD, 255).unwrap();
    for y in 0..gray.height() {
        for x in 0..gray.width() {
            page.set(x + PAD, y + PAD, gray.data()[y * gray.width() + x]);
        }
    }
    page
}

fn tiny_template(key_points: Vec<KeyPoint>) -> Template {
    let geometry = TemplateGeometry {
        width: 4,
        height: 4,
        symbol_bounds: Rect::new(0, 0, 4, 4),
        slim_bounds: Rect::new(1, 1, 2, 2),
    };
    Template::new(Shape::NoteheadBlack, 32, geometry, 3, key_points)
        .unwrap()
        .with_offset(Anchor::Center, 2.0, 2.0)
}

fn kp(x: i32, y: i32, distance: i32) -> KeyPoint {
    KeyPoint { x, y, distance }
}

#[test]
fn templates_match_their_own_rendering() {
    let builder = TemplateBuilder::new(ProceduralRenderer::new());
    let cfg = MatchConfig::default();
    for point_size in [32, 48, 64, 96] {
        for shape in Shape::ALL {
            let template = builder.build(shape, point_size).unwrap();
            let page = page_with(&builder, shape, point_size);
            let table: DistanceTable = ChamferDistance::default().compute_to_fore(&page).unwrap();

            let (dx, dy) = template.offset(Anchor::Center).unwrap().rounded();
            let (x, y) = (PAD as i32 + dx, PAD as i32 + dy);
            let own = template
                .evaluate(x, y, Some(Anchor::Center), &table, &cfg)
                .unwrap();
            // Only key points next to the template frame may differ.
            assert!(own < 0.16, "{} at {point_size} scored {own}", shape.name());

            for (sx, sy) in [(2, 0), (-2, 0), (0, 2), (0, -2)] {
                let shifted = template
                    .evaluate(x + sx, y + sy, Some(Anchor::Center), &table, &cfg)
                    .unwrap();
                assert!(
                    shifted > own,
                    "{} at {point_size} shifted by ({sx},{sy})",
                    shape.name()
                );
            }
        }
    }
}

#[test]
fn score_is_weighted_rms_over_normalizer() {
    let template = tiny_template(vec![kp(0, 0, 0), kp(1, 0, 3), kp(2, 0, -6)]);
    let mut table = DistanceTable::<i32>::new(4, 4, 3).unwrap();
    table.fill(3);
    let score = template
        .evaluate(0, 0, None, &table, &MatchConfig::default())
        .unwrap();
    // Fore 3 vs 0 (w 1), back 3 vs 3 (w 0.5), hole 3 vs 6 (w 1).
    let expected = (18.0f64 / 2.5).sqrt() / 3.0;
    assert!((score - expected).abs() < 1e-12);
}

#[test]
fn out_of_bounds_key_points_are_ignored() {
    let inside = vec![kp(0, 0, 0), kp(1, 1, 3), kp(1, 0, 4)];
    let mut all = inside.clone();
    all.extend([kp(3, 3, 6), kp(3, 0, 0), kp(2, 3, -3)]);
    let partial = tiny_template(inside);
    let full = tiny_template(all);

    let mut table = DistanceTable::<i32>::new(6, 6, 3).unwrap();
    for y in 0..6 {
        for x in 0..6 {
            table.set_value(x, y, ((x * 7 + y * 5) % 11) as i32);
        }
    }
    let cfg = MatchConfig::default();
    // Origin (4, 4): only key points with x, y < 2 land inside the table.
    let a = partial.evaluate(4, 4, None, &table, &cfg).unwrap();
    let b = full.evaluate(4, 4, None, &table, &cfg).unwrap();
    assert_eq!(a, b);

    let c = partial.evaluate(-1, -1, None, &table, &cfg).unwrap();
    let d = tiny_template(vec![kp(1, 1, 3)])
        .evaluate(-1, -1, None, &table, &cfg)
        .unwrap();
    assert_eq!(c, d);
}

#[test]
fn unassigned_cells_are_neutral() {
    let template = tiny_template(vec![kp(0, 0, 0), kp(1, 0, 3)]);
    let mut table = DistanceTable::<i32>::new(4, 4, 3).unwrap();
    table.fill(0);
    table.set_value(1, 0, UNASSIGNED);
    let score = template
        .evaluate(0, 0, None, &table, &MatchConfig::default())
        .unwrap();
    assert_eq!(score, 0.0);
}

#[test]
fn nothing_to_compare_is_no_match() {
    let template = tiny_template(vec![kp(0, 0, 0), kp(1, 1, 3)]);
    let table = DistanceTable::<i32>::new(4, 4, 3).unwrap();
    let cfg = MatchConfig::default();
    assert_eq!(template.evaluate(0, 0, None, &table, &cfg).unwrap(), NO_MATCH);
    assert_eq!(template.evaluate(50, 50, None, &table, &cfg).unwrap(), NO_MATCH);
}

#[test]
fn kernel_mismatch_is_reported() {
    let template = tiny_template(vec![kp(0, 0, 0)]);
    let table = DistanceTable::<i32>::new(4, 4, 5).unwrap();
    let err = template
        .evaluate(0, 0, None, &table, &MatchConfig::default())
        .unwrap_err();
    assert_eq!(
        err,
        HeadMatchError::NormalizerMismatch {
            template: 3,
            table: 5
        }
    );
}

#[test]
fn anchor_shifts_the_origin() {
    let template = tiny_template(vec![kp(0, 0, 0)]).with_offset(Anchor::MiddleLeft, 0.6, 2.4);
    assert_eq!(template.upper_left(10, 10, None).unwrap(), (10, 10));
    assert_eq!(template.upper_left(10, 10, Some(Anchor::Center)).unwrap(), (8, 8));
    assert_eq!(
        template.upper_left(10, 10, Some(Anchor::MiddleLeft)).unwrap(),
        (9, 8)
    );
    assert_eq!(
        template.bounds_at(10, 10, Some(Anchor::Center)).unwrap(),
        Rect::new(8, 8, 4, 4)
    );
    assert_eq!(
        template.symbol_bounds_at(10, 10, Some(Anchor::Center)).unwrap(),
        Rect::new(8, 8, 4, 4)
    );
}

#[test]
fn undefined_anchor_is_an_error() {
    let builder = TemplateBuilder::new(ProceduralRenderer::new());
    let whole = builder.build(Shape::WholeNote, 64).unwrap();
    assert!(whole.offset(Anchor::Center).is_some());
    assert!(whole.offset(Anchor::TopLeftStem).is_none());

    let table = DistanceTable::<i32>::new(100, 100, 3).unwrap();
    let err = whole
        .evaluate(50, 50, Some(Anchor::RightStem), &table, &MatchConfig::default())
        .unwrap_err();
    assert_eq!(
        err,
        HeadMatchError::UndefinedAnchor {
            anchor: Anchor::RightStem,
            shape: Shape::WholeNote
        }
    );
}

#[test]
fn stem_anchors_follow_the_slim_box() {
    let builder = TemplateBuilder::new(ProceduralRenderer::new());
    let black = builder.build(Shape::NoteheadBlack, 64).unwrap();
    let slim = black.slim_bounds();
    let (x, y) = (f64::from(slim.x), f64::from(slim.y));
    let (w, h) = (f64::from(slim.width), f64::from(slim.height));
    let close = |a: f64, b: f64| (a - b).abs() < 1e-9;

    let center = black.offset(Anchor::Center).unwrap();
    assert!(close(center.x, x + w / 2.0));
    assert!(close(center.y, y + h / 2.0));
    assert!(close(black.offset(Anchor::MiddleLeft).unwrap().x, x));
    assert!(close(black.offset(Anchor::MiddleRight).unwrap().x, x + w));

    let top_left = black.offset(Anchor::TopLeftStem).unwrap();
    assert!(close(top_left.x, x + 0.1 * w));
    assert!(close(top_left.y, y + 0.5 * h));
    let top_right = black.offset(Anchor::TopRightStem).unwrap();
    assert!(close(top_right.x, x + 0.9 * w));
    assert!(close(top_right.y, y + 0.2 * h));
    let bottom_left = black.offset(Anchor::BottomLeftStem).unwrap();
    assert!(close(bottom_left.y, y + 0.8 * h));
    let bottom_right = black.offset(Anchor::BottomRightStem).unwrap();
    assert!(close(bottom_right.y, y + 0.5 * h));
    assert_eq!(black.offsets().count(), 9);

    let cross = builder.build(Shape::NoteheadCross, 64).unwrap();
    let slim = cross.slim_bounds();
    let top_right = cross.offset(Anchor::TopRightStem).unwrap();
    assert!(close(top_right.y, f64::from(slim.y)));
    let bottom_left = cross.offset(Anchor::BottomLeftStem).unwrap();
    assert!(close(bottom_left.y, f64::from(slim.y + slim.height)));
}

#[test]
fn hollow_heads_carry_negative_key_points() {
    let builder = TemplateBuilder::new(ProceduralRenderer::new());
    for shape in Shape::ALL {
        let template = builder.build(shape, 64).unwrap();
        let holes = template.key_points().iter().filter(|k| k.distance < 0).count();
        assert_eq!(holes > 0, shape.has_hole(), "{}", shape.name());
        assert!(template.key_points().iter().any(|k| k.distance == 0));
        assert!(template.key_points().len() < template.width() * template.height());
    }
}

#[test]
fn hole_ratio_detects_filled_holes() {
    let builder = TemplateBuilder::new(ProceduralRenderer::new());
    let void = builder.build(Shape::NoteheadVoid, 64).unwrap();
    let (w, h) = (void.width(), void.height());

    let hollow = page_with(&builder, Shape::NoteheadVoid, 64);
    let table: DistanceTable = ChamferDistance::default().compute_to_fore(&hollow).unwrap();
    let ratio = void.evaluate_hole(PAD as i32, PAD as i32, None, &table).unwrap();
    assert_eq!(ratio, 1.0);

    let filled = OwnedImage::filled(w + 2 * PAD, h + 2 * PAD, 0).unwrap();
    let table: DistanceTable = ChamferDistance::default().compute_to_fore(&filled).unwrap();
    let ratio = void.evaluate_hole(PAD as i32, PAD as i32, None, &table).unwrap();
    assert_eq!(ratio, 0.0);
}

#[test]
fn foreground_pixels_report_inked_key_points() {
    let builder = TemplateBuilder::new(ProceduralRenderer::new());
    let black = builder.build(Shape::NoteheadBlack, 64).unwrap();
    let page = page_with(&builder, Shape::NoteheadBlack, 64);
    let fore = black.key_points().iter().filter(|k| k.distance == 0).count();
    assert_eq!(black.foreground_pixels(PAD as i32, PAD as i32, &page).len(), fore);

    let blank = OwnedImage::filled(page.width(), page.height(), 255).unwrap();
    assert!(black.foreground_pixels(PAD as i32, PAD as i32, &blank).is_empty());
}

#[test]
fn text_renderings_name_the_shape() {
    let builder = TemplateBuilder::new(ProceduralRenderer::new());
    let template = builder.build(Shape::Breve, 48).unwrap();
    let shown = template.to_string();
    assert!(shown.starts_with("{Template breve size:48"));
    assert!(shown.contains(" C:("));
    let dump = template.dump();
    assert!(dump.starts_with("Template breve:"));
    assert_eq!(dump.lines().filter(|l| l.contains("=>")).count(), 3);
}

#[test]
fn template_kernel_follows_the_configuration() {
    let builder = TemplateBuilder::new(ProceduralRenderer::new()).with_config(
        headmatch::TemplateConfig {
            kernel: ChamferKernel::Chamfer5,
            ..Default::default()
        },
    );
    let template = builder.build(Shape::NoteheadBlack, 48).unwrap();
    assert_eq!(template.normalizer(), 5);
}
