//! Low-level building blocks for custom matching pipelines.
//!
//! These items expose tile strategies, raw table access and the template
//! construction stages for advanced use cases beyond the high-level
//! `TemplateFactory` and `Matcher` API.

pub use crate::distance::palette;
pub use crate::distance::{DistanceCell, INK_MAX, TARGET, UNASSIGNED};
pub use crate::filter::{
    FilterContext, FullTile, GlobalFilter, IntegralTile, SlidingTile, TileStrategy, WindowSums,
    BACK_VALUE, FORE_VALUE,
};
pub use crate::image::RgbImage;
pub use crate::template::{
    decorate, AnchorOffset, Classification, KeyPoint, PixelKind, RenderedSymbol,
    TemplateGeometry,
};
