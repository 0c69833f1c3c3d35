use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use image::ColorType;
use serde::{Deserialize, Serialize};
use shotter_capture_store::CaptureFormat;

use crate::errors::VisualError;

/// What a persisted capture looks like on disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDetails {
    pub file_size: u64,
    pub mime_type: String,
    pub resolution: (u32, u32),
    pub mode: String,
    pub bit_depth: u32,
    pub has_transparency: bool,
    pub palette_size: Option<usize>,
}

pub fn inspect(path: &Path, format: CaptureFormat) -> Result<ImageDetails, VisualError> {
    let file_size = fs::metadata(path)?.len();
    match format {
        CaptureFormat::Png => inspect_png(path, file_size),
        CaptureFormat::Bmp => inspect_generic(path, file_size, format),
    }
}

fn inspect_png(path: &Path, file_size: u64) -> Result<ImageDetails, VisualError> {
    let decoder = png::Decoder::new(BufReader::new(File::open(path)?));
    let reader = decoder.read_info()?;
    let info = reader.info();
    let depth = info.bit_depth as u32;
    let (mode, bit_depth) = match info.color_type {
        png::ColorType::Grayscale if depth == 1 => ("1", 1),
        png::ColorType::Grayscale if depth == 16 => ("I;16", 16),
        png::ColorType::Grayscale => ("L", 8),
        png::ColorType::GrayscaleAlpha => ("LA", 16),
        png::ColorType::Rgb => ("RGB", 24),
        png::ColorType::Rgba => ("RGBA", 32),
        png::ColorType::Indexed => ("P", 8),
    };
    let palette_size = match info.color_type {
        png::ColorType::Indexed => info.palette.as_ref().map(|p| p.len() / 3),
        _ => None,
    };
    let has_transparency = info.trns.is_some() || matches!(mode, "RGBA" | "LA");
    Ok(ImageDetails {
        file_size,
        mime_type: CaptureFormat::Png.mime_type().to_string(),
        resolution: (info.width, info.height),
        mode: mode.to_string(),
        bit_depth,
        has_transparency,
        palette_size,
    })
}

fn inspect_generic(
    path: &Path,
    file_size: u64,
    format: CaptureFormat,
) -> Result<ImageDetails, VisualError> {
    let image = image::open(path)?;
    let (mode, bit_depth) = match image.color() {
        ColorType::L8 => ("L", 8),
        ColorType::La8 => ("LA", 16),
        ColorType::Rgba8 => ("RGBA", 32),
        ColorType::L16 => ("I;16", 16),
        _ => ("RGB", 24),
    };
    Ok(ImageDetails {
        file_size,
        mime_type: format.mime_type().to_string(),
        resolution: (image.width(), image.height()),
        mode: mode.to_string(),
        bit_depth,
        has_transparency: image.color().has_alpha(),
        palette_size: None,
    })
}
