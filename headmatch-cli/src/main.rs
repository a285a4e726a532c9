use clap::Parser;
use headmatch::image::io::{load_gray_image, save_gray_image, save_rgb_image};
use headmatch::{
    nms_matches, AdaptiveConfig, Anchor, ChamferDistance, ChamferKernel, FilterConfig,
    GlobalConfig, HeadMatch, HeadMatchError, HeadMatchResult, MatchConfig, Matcher,
    ProceduralRenderer, Shape, Template, TemplateConfig, TemplateFactory, TileStrategy,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "HeadMatch CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ShapeConfig {
    NoteheadBlack,
    NoteheadBlackSmall,
    NoteheadVoid,
    NoteheadVoidSmall,
    NoteheadCross,
    WholeNote,
    WholeNoteSmall,
    Breve,
}

impl From<ShapeConfig> for Shape {
    fn from(value: ShapeConfig) -> Self {
        match value {
            ShapeConfig::NoteheadBlack => Shape::NoteheadBlack,
            ShapeConfig::NoteheadBlackSmall => Shape::NoteheadBlackSmall,
            ShapeConfig::NoteheadVoid => Shape::NoteheadVoid,
            ShapeConfig::NoteheadVoidSmall => Shape::NoteheadVoidSmall,
            ShapeConfig::NoteheadCross => Shape::NoteheadCross,
            ShapeConfig::WholeNote => Shape::WholeNote,
            ShapeConfig::WholeNoteSmall => Shape::WholeNoteSmall,
            ShapeConfig::Breve => Shape::Breve,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum KernelConfig {
    Chamfer3,
    Chamfer5,
    Chamfer7,
    Chamfer13,
}

impl From<KernelConfig> for ChamferKernel {
    fn from(value: KernelConfig) -> Self {
        match value {
            KernelConfig::Chamfer3 => ChamferKernel::Chamfer3,
            KernelConfig::Chamfer5 => ChamferKernel::Chamfer5,
            KernelConfig::Chamfer7 => ChamferKernel::Chamfer7,
            KernelConfig::Chamfer13 => ChamferKernel::Chamfer13,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum FilterKind {
    Global,
    Adaptive,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TileConfig {
    Full,
    Sliding,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct FilterJson {
    kind: FilterKind,
    tile: TileConfig,
    threshold: u8,
    half_window: usize,
    mean_coeff: f64,
    std_dev_coeff: f64,
}

impl Default for FilterJson {
    fn default() -> Self {
        let adaptive = AdaptiveConfig::default();
        Self {
            kind: FilterKind::Adaptive,
            tile: TileConfig::Full,
            threshold: GlobalConfig::default().threshold,
            half_window: adaptive.half_window,
            mean_coeff: adaptive.mean_coeff,
            std_dev_coeff: adaptive.std_dev_coeff,
        }
    }
}

impl From<&FilterJson> for FilterConfig {
    fn from(value: &FilterJson) -> Self {
        match value.kind {
            FilterKind::Global => FilterConfig::Global(GlobalConfig {
                threshold: value.threshold,
            }),
            FilterKind::Adaptive => FilterConfig::Adaptive {
                cfg: AdaptiveConfig {
                    half_window: value.half_window,
                    mean_coeff: value.mean_coeff,
                    std_dev_coeff: value.std_dev_coeff,
                },
                tile: match value.tile {
                    TileConfig::Full => TileStrategy::Full,
                    TileConfig::Sliding => TileStrategy::Sliding,
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct TemplateJson {
    binarization_threshold: u8,
    stem_dx: f64,
    stem_dy: f64,
    min_cells_per_side: usize,
    small_ratio: f64,
    max_key_point_distance: Option<i32>,
    save_templates: bool,
    template_dir: PathBuf,
    magnification: usize,
}

impl Default for TemplateJson {
    fn default() -> Self {
        let cfg = TemplateConfig::default();
        Self {
            binarization_threshold: cfg.binarization_threshold,
            stem_dx: cfg.stem_dx,
            stem_dy: cfg.stem_dy,
            min_cells_per_side: cfg.min_cells_per_side,
            small_ratio: cfg.small_ratio,
            max_key_point_distance: cfg.max_key_point_distance,
            save_templates: cfg.save_templates,
            template_dir: cfg.template_dir,
            magnification: cfg.magnification,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MatchConfigJson {
    fore_weight: f64,
    back_weight: f64,
    max_distance: f64,
    good_distance: f64,
    really_bad_distance: f64,
    parallel: bool,
    nms_radius: usize,
}

impl Default for MatchConfigJson {
    fn default() -> Self {
        let cfg = MatchConfig::default();
        Self {
            fore_weight: cfg.fore_weight,
            back_weight: cfg.back_weight,
            max_distance: cfg.max_distance,
            good_distance: cfg.good_distance,
            really_bad_distance: cfg.really_bad_distance,
            parallel: cfg.parallel,
            nms_radius: 4,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    image_path: String,
    output_path: Option<String>,
    point_size: u32,
    shapes: Vec<ShapeConfig>,
    kernel: KernelConfig,
    filter: FilterJson,
    template: TemplateJson,
    #[serde(rename = "match")]
    match_cfg: MatchConfigJson,
    filtered_path: Option<String>,
    distances_path: Option<String>,
    distance_image_max: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_path: String::new(),
            output_path: None,
            point_size: 64,
            shapes: vec![
                ShapeConfig::NoteheadBlack,
                ShapeConfig::NoteheadVoid,
                ShapeConfig::WholeNote,
            ],
            kernel: KernelConfig::Chamfer3,
            filter: FilterJson::default(),
            template: TemplateJson::default(),
            match_cfg: MatchConfigJson::default(),
            filtered_path: None,
            distances_path: None,
            distance_image_max: 3.0,
        }
    }
}

#[derive(Debug, Serialize)]
struct MatchRecord {
    shape: &'static str,
    x: i32,
    y: i32,
    center_x: f64,
    center_y: f64,
    score: f64,
    impact: f64,
    good: bool,
}

#[derive(Debug, Serialize)]
struct Output {
    point_size: u32,
    matches: Vec<MatchRecord>,
}

/// Describes a match, locating the head by the template CENTER anchor.
fn match_record(
    template: &Template,
    m: &HeadMatch,
    cfg: &MatchConfig,
) -> HeadMatchResult<MatchRecord> {
    let center = template
        .offset(Anchor::Center)
        .ok_or(HeadMatchError::UndefinedAnchor {
            anchor: Anchor::Center,
            shape: template.shape(),
        })?;
    Ok(MatchRecord {
        shape: template.shape().name(),
        x: m.x,
        y: m.y,
        center_x: f64::from(m.x) + center.x,
        center_y: f64::from(m.y) + center.y,
        score: m.score,
        impact: cfg.impact_of(m.score),
        good: cfg.is_good(m.score),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("headmatch=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.image_path.is_empty() {
        return Err("image_path must be set in the config".into());
    }
    if config.shapes.is_empty() {
        return Err("shapes must list at least one shape".into());
    }

    let page = load_gray_image(&config.image_path)?;
    let filter = FilterConfig::from(&config.filter).build(page.view())?;
    let filtered = filter.filtered_image()?;
    if let Some(path) = &config.filtered_path {
        save_gray_image(&filtered, path)?;
    }

    let kernel = ChamferKernel::from(config.kernel);
    let distances = ChamferDistance::new(kernel).compute_to_fore::<i32, _>(&filtered)?;
    if let Some(path) = &config.distances_path {
        save_rgb_image(&distances.to_image(config.distance_image_max)?, path)?;
    }

    let template_cfg = TemplateConfig {
        binarization_threshold: config.template.binarization_threshold,
        kernel,
        stem_dx: config.template.stem_dx,
        stem_dy: config.template.stem_dy,
        min_cells_per_side: config.template.min_cells_per_side,
        small_ratio: config.template.small_ratio,
        max_key_point_distance: config.template.max_key_point_distance,
        save_templates: config.template.save_templates,
        template_dir: config.template.template_dir.clone(),
        magnification: config.template.magnification,
    };
    let match_cfg = MatchConfig {
        fore_weight: config.match_cfg.fore_weight,
        back_weight: config.match_cfg.back_weight,
        max_distance: config.match_cfg.max_distance,
        good_distance: config.match_cfg.good_distance,
        really_bad_distance: config.match_cfg.really_bad_distance,
        parallel: config.match_cfg.parallel,
    };

    let factory = TemplateFactory::new(ProceduralRenderer::new()).with_config(template_cfg);
    let catalog = factory.catalog(config.point_size)?;

    let mut records = Vec::new();
    for shape in config.shapes.iter().copied().map(Shape::from) {
        let template = Arc::clone(catalog.template(shape));
        let matcher = Matcher::new(Arc::clone(&template)).with_config(match_cfg.clone());
        let mut matches: Vec<HeadMatch> = matcher.match_all(&distances, match_cfg.max_distance)?;
        for m in nms_matches(&mut matches, config.match_cfg.nms_radius) {
            records.push(match_record(&template, &m, &match_cfg)?);
        }
    }
    records.sort_by(|a, b| a.score.total_cmp(&b.score));
    tracing::info!(
        matches = records.len(),
        good = records.iter().filter(|r| r.good).count(),
        "matching finished"
    );

    let output = Output {
        point_size: config.point_size,
        matches: records,
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
