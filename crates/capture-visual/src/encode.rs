use std::io::Cursor;

use color_quant::NeuQuant;
use image::{DynamicImage, ImageOutputFormat};
use shotter_capture_store::CaptureFormat;
use tracing::{debug, warn};

use crate::errors::VisualError;

/// NeuQuant sampling factor: 1 is slowest and best, 30 fastest.
const QUANT_SAMPLE_FACTOR: i32 = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    pub format: CaptureFormat,
    /// Adaptive palette size (1..=256); honored for PNG only.
    pub palette_colors: Option<u16>,
}

fn output_format(format: CaptureFormat) -> ImageOutputFormat {
    match format {
        CaptureFormat::Png => ImageOutputFormat::Png,
        CaptureFormat::Bmp => ImageOutputFormat::Bmp,
    }
}

/// Encodes `image` for persistence.
///
/// When the configured encoder rejects the image, the capture is re-encoded
/// as plain RGB in the same container instead of being lost.
pub fn encode(image: &DynamicImage, options: &EncodeOptions) -> Result<Vec<u8>, VisualError> {
    let primary = match (options.format, options.palette_colors) {
        (CaptureFormat::Png, Some(colors)) => encode_indexed(image, colors),
        (format, _) => write_plain(image, format),
    };
    match primary {
        Ok(bytes) => Ok(bytes),
        Err(err) => {
            warn!(
                target: "capture-visual",
                format = %options.format,
                ?err,
                "encoder failed, falling back to plain rgb"
            );
            write_plain(&DynamicImage::ImageRgb8(image.to_rgb8()), options.format)
        }
    }
}

fn write_plain(image: &DynamicImage, format: CaptureFormat) -> Result<Vec<u8>, VisualError> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, output_format(format))?;
    Ok(out.into_inner())
}

fn encode_indexed(image: &DynamicImage, colors: u16) -> Result<Vec<u8>, VisualError> {
    if !(1..=256).contains(&colors) {
        return Err(VisualError::Encode(format!(
            "palette size {colors} outside 1..=256"
        )));
    }
    debug!(target: "capture-visual", colors, "quantizing to adaptive palette");
    let rgba = image.to_rgba8();
    let quant = NeuQuant::new(QUANT_SAMPLE_FACTOR, colors as usize, rgba.as_raw());
    let indices: Vec<u8> = rgba
        .pixels()
        .map(|pixel| quant.index_of(&pixel.0) as u8)
        .collect();

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, rgba.width(), rgba.height());
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(quant.color_map_rgb());
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&indices)?;
        writer.finish()?;
    }
    Ok(out)
}
