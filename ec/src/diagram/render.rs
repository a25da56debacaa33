//! Raster rendering of a vertical node chain

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use tracing::debug;

use super::font::{self, GLYPH_HEIGHT, GLYPH_SPACING, GLYPH_WIDTH};

const SCALE: u32 = 2;
const MARGIN: u32 = 24;
const PADDING_X: u32 = 18;
const PADDING_Y: u32 = 12;
const GAP: u32 = 36;
const ARROW_HEAD: u32 = 8;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const STAGE_FILL: Rgba<u8> = Rgba([242, 240, 255, 255]);
const TERMINAL_FILL: Rgba<u8> = Rgba([225, 225, 225, 255]);
const BORDER: Rgba<u8> = Rgba([123, 104, 238, 255]);
const INK: Rgba<u8> = Rgba([51, 51, 51, 255]);

/// Draw `labels` as boxes stacked top to bottom, joined by arrows
///
/// Labels starting with `__` are drawn as start/end terminals.
pub fn render_chain(labels: &[&str]) -> RgbaImage {
    debug!(nodes = labels.len(), "render_chain: called");
    let box_w = labels.iter().map(|l| font::text_width(l, SCALE)).max().unwrap_or(0) + 2 * PADDING_X;
    let box_h = GLYPH_HEIGHT * SCALE + 2 * PADDING_Y;
    let count = labels.len() as u32;

    let width = box_w + 2 * MARGIN;
    let height = count * box_h + count.saturating_sub(1) * GAP + 2 * MARGIN;
    let mut img = RgbaImage::from_pixel(width, height, BACKGROUND);

    let center_x = MARGIN + box_w / 2;
    for (i, label) in labels.iter().enumerate() {
        let top = MARGIN + i as u32 * (box_h + GAP);
        let fill = if label.starts_with("__") { TERMINAL_FILL } else { STAGE_FILL };
        fill_rect(&mut img, MARGIN, top, box_w, box_h, fill);
        stroke_rect(&mut img, MARGIN, top, box_w, box_h, BORDER);

        let text_x = MARGIN + (box_w - font::text_width(label, SCALE)) / 2;
        draw_text(&mut img, text_x, top + PADDING_Y, label, INK);

        if i + 1 < labels.len() {
            let from = top + box_h;
            draw_arrow(&mut img, center_x, from, from + GAP, INK);
        }
    }
    img
}

/// Encode an image as PNG bytes
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

fn put(img: &mut RgbaImage, x: u32, y: u32, color: Rgba<u8>) {
    if x < img.width() && y < img.height() {
        img.put_pixel(x, y, color);
    }
}

fn fill_rect(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    for py in y..y + h {
        for px in x..x + w {
            put(img, px, py, color);
        }
    }
}

fn stroke_rect(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    let (right, bottom) = (x + w - 1, y + h - 1);
    for px in x..=right {
        put(img, px, y, color);
        put(img, px, bottom, color);
    }
    for py in y..=bottom {
        put(img, x, py, color);
        put(img, right, py, color);
    }
}

fn draw_text(img: &mut RgbaImage, x: u32, y: u32, text: &str, color: Rgba<u8>) {
    let advance = (GLYPH_WIDTH + GLYPH_SPACING) * SCALE;
    for (i, c) in text.chars().enumerate() {
        let origin_x = x + i as u32 * advance;
        for gy in 0..GLYPH_HEIGHT {
            for gx in 0..GLYPH_WIDTH {
                if font::is_set(c, gx, gy) {
                    fill_rect(img, origin_x + gx * SCALE, y + gy * SCALE, SCALE, SCALE, color);
                }
            }
        }
    }
}

/// Vertical arrow from `y0` down to `y1`, tip touching `y1`
fn draw_arrow(img: &mut RgbaImage, x: u32, y0: u32, y1: u32, color: Rgba<u8>) {
    let shaft_end = y1.saturating_sub(ARROW_HEAD);
    fill_rect(img, x.saturating_sub(1), y0, 2, shaft_end.saturating_sub(y0), color);
    for dy in 0..ARROW_HEAD {
        let half = ARROW_HEAD - dy;
        let y = shaft_end + dy;
        for px in x.saturating_sub(half)..=x + half {
            put(img, px, y, color);
        }
    }
}
