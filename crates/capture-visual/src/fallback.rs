use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use rusttype::Scale;
use tracing::info;

use crate::assets::FallbackAssets;

/// Maximum characters per annotation line.
pub const FALLBACK_WRAP_WIDTH: usize = 50;

const TEXT_ORIGIN: (i32, i32) = (15, 15);
const FONT_SIZE: f32 = 20.0;
const STROKE_WIDTH: i32 = 2;
const LINE_SPACING: i32 = 4;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Builds the placeholder shown in place of a failed capture.
///
/// `size` is the exact output size; without it the placeholder keeps its
/// own dimensions. The placeholder is shrunk to fit (never enlarged) and
/// centered on white, then `message` is drawn word-wrapped in the top-left
/// corner with a white outline.
pub fn generate_fallback(
    assets: &FallbackAssets,
    size: Option<(u32, u32)>,
    message: Option<&str>,
) -> DynamicImage {
    let placeholder = assets.placeholder();
    let (width, height) = size.unwrap_or((placeholder.width(), placeholder.height()));
    info!(
        target: "capture-visual",
        width,
        height,
        "generating fallback image"
    );

    let thumb = if placeholder.width() > width || placeholder.height() > height {
        placeholder.resize(width, height, FilterType::Lanczos3)
    } else {
        placeholder.clone()
    };
    let thumb = thumb.to_rgb8();

    let mut canvas = RgbImage::from_pixel(width, height, WHITE);
    let x = (width.saturating_sub(thumb.width()) / 2) as i64;
    let y = (height.saturating_sub(thumb.height()) / 2) as i64;
    imageops::overlay(&mut canvas, &thumb, x, y);

    if let Some(message) = message.filter(|m| !m.trim().is_empty()) {
        draw_annotation(&mut canvas, assets, message);
    }
    DynamicImage::ImageRgb8(canvas)
}

fn draw_annotation(canvas: &mut RgbImage, assets: &FallbackAssets, message: &str) {
    let font = assets.font();
    let scale = Scale::uniform(FONT_SIZE);
    let metrics = font.v_metrics(scale);
    let line_height =
        (metrics.ascent - metrics.descent + metrics.line_gap).ceil() as i32 + LINE_SPACING;

    let (x0, mut y) = TEXT_ORIGIN;
    for line in wrap(message, FALLBACK_WRAP_WIDTH) {
        for dx in -STROKE_WIDTH..=STROKE_WIDTH {
            for dy in -STROKE_WIDTH..=STROKE_WIDTH {
                if (dx, dy) != (0, 0) && dx * dx + dy * dy <= STROKE_WIDTH * STROKE_WIDTH {
                    draw_text_mut(canvas, WHITE, x0 + dx, y + dy, scale, font, &line);
                }
            }
        }
        draw_text_mut(canvas, BLACK, x0, y, scale, font, &line);
        y += line_height;
    }
}

/// Greedy word wrap; words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        loop {
            let needed = if current_len == 0 { chars.len() } else { current_len + 1 + chars.len() };
            if needed <= width {
                if current_len > 0 {
                    current.push(' ');
                    current_len += 1;
                }
                current.extend(chars.iter());
                current_len += chars.len();
                break;
            }
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
                continue;
            }
            let rest = chars.split_off(width);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}
