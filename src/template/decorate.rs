//! Magnified debug rendering of a template.

use crate::image::RgbImage;
use crate::template::{Classification, PixelKind, Template};
use crate::util::{HeadMatchError, HeadMatchResult};

const FORE_COLOR: [u8; 3] = [0, 0, 0];
const BACK_COLOR: [u8; 3] = [255, 200, 200];
const HOLE_COLOR: [u8; 3] = [255, 175, 175];
const IRRELEVANT_COLOR: [u8; 3] = [255, 255, 255];
const GRID_COLOR: [u8; 3] = [210, 210, 210];
const FRAME_COLOR: [u8; 3] = [128, 128, 128];
const LABEL_COLOR: [u8; 3] = [0, 0, 160];
const SLIM_COLOR: [u8; 3] = [0, 170, 0];
const ANCHOR_COLOR: [u8; 3] = [230, 0, 0];

/// 3x5 bitmaps of the decimal digits, one row per entry, MSB on the left.
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

/// Draws each template pixel as a `magnification`-sized cell.
///
/// Cells are colored by pixel kind, labeled with the absolute key point
/// distance when it fits, and overlaid with the slim box and anchors.
pub fn decorate(
    classification: &Classification,
    template: &Template,
    magnification: usize,
) -> HeadMatchResult<RgbImage> {
    if magnification == 0 {
        return Err(HeadMatchError::InvalidInput("magnification must be positive"));
    }
    let m = magnification as i64;
    let (w, h) = (classification.width(), classification.height());
    let mut img = RgbImage::filled(w * magnification + 1, h * magnification + 1, IRRELEVANT_COLOR)?;

    for y in 0..h {
        for x in 0..w {
            let color = match classification.kind(x, y) {
                PixelKind::Fore => FORE_COLOR,
                PixelKind::Back => BACK_COLOR,
                PixelKind::Hole => HOLE_COLOR,
                PixelKind::Irrelevant => IRRELEVANT_COLOR,
            };
            img.fill_rect(x as i64 * m, y as i64 * m, m, m, color);
        }
    }

    if m >= 4 {
        for i in 0..=w as i64 {
            img.fill_rect(i * m, 0, 1, h as i64 * m, GRID_COLOR);
        }
        for j in 0..=h as i64 {
            img.fill_rect(0, j * m, w as i64 * m, 1, GRID_COLOR);
        }
    }
    img.stroke_rect(0, 0, w as i64 * m + 1, h as i64 * m + 1, FRAME_COLOR);

    for kp in template.key_points() {
        if kp.distance != 0 {
            let (x, y) = (i64::from(kp.x) * m, i64::from(kp.y) * m);
            draw_number(&mut img, x, y, m, kp.distance.unsigned_abs());
        }
    }

    let slim = template.slim_bounds();
    img.stroke_rect(
        i64::from(slim.x) * m,
        i64::from(slim.y) * m,
        i64::from(slim.width) * m + 1,
        i64::from(slim.height) * m + 1,
        SLIM_COLOR,
    );

    let arm = (m / 2).max(2);
    for (_, offset) in template.offsets() {
        let ax = (offset.x * m as f64).round() as i64;
        let ay = (offset.y * m as f64).round() as i64;
        img.fill_rect(ax - arm, ay, 2 * arm + 1, 1, ANCHOR_COLOR);
        img.fill_rect(ax, ay - arm, 1, 2 * arm + 1, ANCHOR_COLOR);
    }
    Ok(img)
}

/// Writes `value` in the top-left corner of a cell, skipped when too wide.
fn draw_number(img: &mut RgbImage, x: i64, y: i64, cell: i64, value: u32) {
    let text = value.to_string();
    let needed = 4 * text.len() as i64 + 1;
    if needed > cell || cell < 7 {
        return;
    }
    for (i, ch) in text.bytes().enumerate() {
        let glyph = &DIGITS[usize::from(ch - b'0')];
        let gx = x + 1 + 4 * i as i64;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..3 {
                if bits & (0b100 >> col) != 0 {
                    img.put(gx + col, y + 1 + row as i64, LABEL_COLOR);
                }
            }
        }
    }
}
