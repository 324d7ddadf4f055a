//! Information overlay burned into sampled frames.
//!
//! Text is rendered from the public-domain 8x8 bitmap font in
//! [`font8x8`](https://crates.io/crates/font8x8), scaled by an integer factor
//! and outlined so it stays legible on any background.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgb, RgbImage};

use crate::config::OverlayStyle;
use crate::decoder::ChannelOrder;
use crate::frame_type::FrameType;

const GLYPH_SIZE: u32 = 8;

/// Horizontal anchoring of a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    /// `x` is the left edge of every line.
    Left,
    /// `x` is the horizontal centre of every line.
    Center,
    /// `x` is the right edge of every line.
    Right,
}

/// Swap channels in place so the image is RGB.
pub fn normalize_channels(image: &mut RgbImage, order: ChannelOrder) {
    if order == ChannelOrder::Bgr {
        for pixel in image.pixels_mut() {
            pixel.0.swap(0, 2);
        }
    }
}

/// Burn the standard slot overlay into `image`.
///
/// Top left: `SOURCE: <file name>`. Top right, right-aligned:
/// `FRAME TYPE: <type>` over `FRAME: <position>/<total>`.
pub fn annotate_frame(
    image: &mut RgbImage,
    style: &OverlayStyle,
    file_name: &str,
    frame_type: FrameType,
    position: u64,
    total_frames: u64,
) {
    if !style.enabled {
        return;
    }

    let source_text = format!("SOURCE: {file_name}");
    draw_text(image, &source_text, style.margin, style.margin, Align::Left, style);

    let frame_text = format!("FRAME TYPE: {frame_type}\nFRAME: {position}/{total_frames}");
    let right_edge = image.width().saturating_sub(style.margin);
    draw_text(image, &frame_text, right_edge, style.margin, Align::Right, style);
}

/// Width in pixels of one line of text at `scale`.
pub fn text_width(line: &str, scale: u32) -> u32 {
    line.chars().count() as u32 * GLYPH_SIZE * scale
}

/// Draw possibly multi-line `text` with its first line's top at `y`.
///
/// Pixels that fall outside the image are clipped.
pub fn draw_text(image: &mut RgbImage, text: &str, x: u32, y: u32, align: Align, style: &OverlayStyle) {
    let scale = style.scale.max(1);
    let line_height = GLYPH_SIZE * scale + 2 * scale;

    // Outline first so neighbouring glyph fills are never covered.
    for pass_is_border in [true, false] {
        for (line_index, line) in text.lines().enumerate() {
            let width = text_width(line, scale);
            let left = match align {
                Align::Left => i64::from(x),
                Align::Center => i64::from(x) - i64::from(width / 2),
                Align::Right => i64::from(x) - i64::from(width),
            };
            let top = i64::from(y) + i64::from(line_height) * line_index as i64;

            for (char_index, character) in line.chars().enumerate() {
                let Some(glyph) = BASIC_FONTS.get(character) else {
                    continue;
                };
                let glyph_left = left + i64::from(GLYPH_SIZE * scale) * char_index as i64;
                draw_glyph(image, &glyph, glyph_left, top, scale, pass_is_border, style);
            }
        }
    }
}

fn draw_glyph(
    image: &mut RgbImage,
    glyph: &[u8; 8],
    left: i64,
    top: i64,
    scale: u32,
    border: bool,
    style: &OverlayStyle,
) {
    let scale = i64::from(scale);
    for (row, bits) in glyph.iter().enumerate() {
        for column in 0..GLYPH_SIZE as i64 {
            if bits & (1 << column) == 0 {
                continue;
            }
            let px = left + column * scale;
            let py = top + row as i64 * scale;
            if border {
                fill_rect(image, px - scale, py - scale, 3 * scale, style.border_color);
            } else {
                fill_rect(image, px, py, scale, style.text_color);
            }
        }
    }
}

fn fill_rect(image: &mut RgbImage, left: i64, top: i64, size: i64, color: Rgb<u8>) {
    let (width, height) = (i64::from(image.width()), i64::from(image.height()));
    for y in top.max(0)..(top + size).min(height) {
        for x in left.max(0)..(left + size).min(width) {
            image.put_pixel(x as u32, y as u32, color);
        }
    }
}
