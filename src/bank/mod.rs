//! Per-size template catalogs and the process-wide cache that owns them.
//!
//! A `Catalog` holds one template per supported shape, all built eagerly for
//! a single point size. `TemplateFactory` caches catalogs by size. Each size
//! gets its own slot guarded by a mutex, so concurrent first requests for one
//! size build it exactly once while requests for other sizes proceed. Built
//! catalogs are immutable and shared through `Arc`.

use crate::template::{Shape, ShapeRenderer, Template, TemplateBuilder, TemplateConfig};
use crate::trace::{trace_event, trace_span};
use crate::util::HeadMatchResult;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Templates of every supported shape at one point size.
#[derive(Debug)]
pub struct Catalog {
    point_size: u32,
    templates: BTreeMap<Shape, Arc<Template>>,
}

impl Catalog {
    /// Builds the template of every shape in [`Shape::ALL`].
    pub fn build<R: ShapeRenderer>(
        builder: &TemplateBuilder<R>,
        point_size: u32,
    ) -> HeadMatchResult<Self> {
        let _span = trace_span!("build_catalog", point_size = point_size).entered();
        let mut templates = BTreeMap::new();
        for shape in Shape::ALL {
            let template = builder.build(shape, point_size)?;
            templates.insert(shape, Arc::new(template));
        }
        trace_event!("catalog_built", templates = templates.len());
        Ok(Self {
            point_size,
            templates,
        })
    }

    pub fn point_size(&self) -> u32 {
        self.point_size
    }

    /// Template of `shape`; every shape is present in a built catalog.
    pub fn template(&self, shape: Shape) -> &Arc<Template> {
        &self.templates[&shape]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Shape, &Arc<Template>)> + '_ {
        self.templates.iter().map(|(s, t)| (*s, t))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

type CatalogSlot = Arc<Mutex<Option<Arc<Catalog>>>>;

/// Builds catalogs on demand and keeps them for the factory lifetime.
pub struct TemplateFactory<R> {
    builder: TemplateBuilder<R>,
    slots: Mutex<HashMap<u32, CatalogSlot>>,
}

impl<R: ShapeRenderer> TemplateFactory<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            builder: TemplateBuilder::new(renderer),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_config(mut self, config: TemplateConfig) -> Self {
        self.builder = self.builder.with_config(config);
        self
    }

    pub fn builder(&self) -> &TemplateBuilder<R> {
        &self.builder
    }

    /// Catalog for `point_size`, built on first request.
    ///
    /// A failed build is reported to the caller and not cached, so a later
    /// request tries again.
    pub fn catalog(&self, point_size: u32) -> HeadMatchResult<Arc<Catalog>> {
        let slot = {
            let mut slots = lock(&self.slots);
            Arc::clone(slots.entry(point_size).or_default())
        };
        let mut entry = lock(&slot);
        if let Some(catalog) = entry.as_ref() {
            return Ok(Arc::clone(catalog));
        }
        let catalog = Arc::new(Catalog::build(&self.builder, point_size)?);
        *entry = Some(Arc::clone(&catalog));
        Ok(catalog)
    }

    /// Template of `shape` at `point_size`, through the catalog cache.
    pub fn template(&self, shape: Shape, point_size: u32) -> HeadMatchResult<Arc<Template>> {
        Ok(Arc::clone(self.catalog(point_size)?.template(shape)))
    }

    /// Point sizes whose catalog is currently built, in ascending order.
    pub fn cached_sizes(&self) -> Vec<u32> {
        let slots: Vec<(u32, CatalogSlot)> = lock(&self.slots)
            .iter()
            .map(|(size, slot)| (*size, Arc::clone(slot)))
            .collect();
        let mut sizes: Vec<u32> = slots
            .into_iter()
            .filter(|(_, slot)| lock(slot).is_some())
            .map(|(size, _)| size)
            .collect();
        sizes.sort_unstable();
        sizes
    }
}

// A panic during a build leaves the slot empty, which is still consistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
