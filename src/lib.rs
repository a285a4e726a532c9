//! HeadMatch locates note heads on scanned music pages by chamfer template
//! matching.
//!
//! A page is binarized with a global or adaptive local threshold, turned into
//! a table of distances to the nearest ink, and compared against templates
//! built once per shape and point size. Templates record the distance
//! expected at each relevant pixel; the mismatch score is a weighted RMS of
//! the differences, in pixels. Parallel scanning is available via the
//! `rayon` feature and PNG/JPEG loading via `image-io`.

mod trace;

pub mod bank;
mod candidate;
pub mod distance;
pub mod filter;
pub mod image;
pub mod lowlevel;
pub mod search;
pub mod template;
pub mod util;

pub use bank::{Catalog, TemplateFactory};
pub use distance::{ChamferDistance, ChamferKernel, DistanceTable, DistanceView, Distances};
pub use filter::{
    AdaptiveConfig, AdaptiveFilter, FilterConfig, GlobalConfig, PixelFilter, TileStrategy,
};
pub use image::{ImageView, OwnedImage, RasterSource, Rect};
pub use template::{
    Anchor, ProceduralRenderer, Shape, ShapeRenderer, Template, TemplateBuilder, TemplateConfig,
    NO_MATCH,
};
pub use util::{HeadMatchError, HeadMatchResult};

pub use candidate::nms::nms_matches;
pub use search::{HeadMatch, MatchConfig, Matcher};
