use headmatch::lowlevel::RenderedSymbol;
use headmatch::{
    HeadMatchError, HeadMatchResult, ProceduralRenderer, Shape, ShapeRenderer, TemplateFactory,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct CountingRenderer {
    inner: ProceduralRenderer,
    calls: AtomicUsize,
    refuse: Option<Shape>,
}

impl ShapeRenderer for CountingRenderer {
    fn render(&self, shape: Shape, code: u32, point_size: u32) -> HeadMatchResult<RenderedSymbol> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.refuse == Some(shape) {
            return Err(HeadMatchError::MissingGlyph { shape, code });
        }
        self.inner.render(shape, code, point_size)
    }
}

#[test]
fn catalog_is_built_once_per_size() {
    let factory = TemplateFactory::new(CountingRenderer::default());
    let first = factory.catalog(48).unwrap();
    let second = factory.catalog(48).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    for shape in Shape::ALL {
        assert!(Arc::ptr_eq(first.template(shape), second.template(shape)));
        assert_eq!(first.template(shape).shape(), shape);
    }
    assert_eq!(first.len(), Shape::ALL.len());
    assert_eq!(
        factory.builder().renderer().calls.load(Ordering::SeqCst),
        Shape::ALL.len()
    );

    let template = factory.template(Shape::NoteheadVoid, 48).unwrap();
    assert!(Arc::ptr_eq(&template, first.template(Shape::NoteheadVoid)));
}

#[test]
fn sizes_are_cached_independently() {
    let factory = TemplateFactory::new(ProceduralRenderer::new());
    let small = factory.catalog(40).unwrap();
    let large = factory.catalog(64).unwrap();
    assert_eq!(small.point_size(), 40);
    assert_eq!(large.point_size(), 64);
    assert!(
        small.template(Shape::NoteheadBlack).width() < large.template(Shape::NoteheadBlack).width()
    );
    assert_eq!(factory.cached_sizes(), vec![40, 64]);
}

#[test]
fn concurrent_first_requests_share_one_build() {
    let factory = TemplateFactory::new(CountingRenderer::default());
    let catalogs: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| factory.catalog(56).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for catalog in &catalogs[1..] {
        assert!(Arc::ptr_eq(&catalogs[0], catalog));
    }
    assert_eq!(
        factory.builder().renderer().calls.load(Ordering::SeqCst),
        Shape::ALL.len()
    );
}

#[test]
fn failed_builds_are_not_cached() {
    let factory = TemplateFactory::new(CountingRenderer {
        refuse: Some(Shape::WholeNote),
        ..CountingRenderer::default()
    });
    let err = factory.catalog(48).unwrap_err();
    assert_eq!(
        err,
        HeadMatchError::MissingGlyph {
            shape: Shape::WholeNote,
            code: 119
        }
    );
    assert!(factory.cached_sizes().is_empty());

    let calls = factory.builder().renderer().calls.load(Ordering::SeqCst);
    assert!(factory.catalog(48).is_err());
    assert!(factory.builder().renderer().calls.load(Ordering::SeqCst) > calls);
}

#[test]
fn small_point_sizes_build_every_shape() {
    let factory = TemplateFactory::new(ProceduralRenderer::new());
    for point_size in [16, 20, 23] {
        let catalog = factory.catalog(point_size).unwrap();
        assert_eq!(catalog.len(), Shape::ALL.len());
        for (shape, template) in catalog.iter() {
            assert_eq!(template.shape(), shape);
            assert!(!template.key_points().is_empty());
        }
    }
    assert_eq!(factory.cached_sizes(), vec![16, 20, 23]);
}
