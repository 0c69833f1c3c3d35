use image::imageops::FilterType;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Post-processing steps applied to every capture before encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostProcess {
    pub invert: bool,
    pub grayscale: bool,
    /// Exact output size; applied only when the image differs.
    pub resize: Option<(u32, u32)>,
}

impl PostProcess {
    /// Runs invert, then grayscale, then the exact resize.
    ///
    /// Inverting must happen while the image still has its color channels.
    pub fn apply(&self, mut image: DynamicImage) -> DynamicImage {
        if self.invert {
            debug!(target: "capture-visual", "inverting image");
            image.invert();
        }
        if self.grayscale {
            debug!(target: "capture-visual", "converting image to grayscale");
            image = image.grayscale();
        }
        if let Some((width, height)) = self.resize {
            if (image.width(), image.height()) != (width, height) {
                debug!(
                    target: "capture-visual",
                    from_width = image.width(),
                    from_height = image.height(),
                    width,
                    height,
                    "resizing image"
                );
                image = image.resize_exact(width, height, FilterType::Lanczos3);
            }
        }
        image
    }
}

#[cfg(test)]
mod tests {
    use image::{ColorType, Rgb, RgbImage};

    use super::*;

    fn sample() -> DynamicImage {
        let mut img = RgbImage::from_pixel(4, 2, Rgb([200, 10, 10]));
        img.put_pixel(0, 0, Rgb([0, 0, 0]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn noop_by_default() {
        let out = PostProcess::default().apply(sample());
        assert_eq!(out.to_rgb8().as_raw(), sample().to_rgb8().as_raw());
    }

    #[test]
    fn invert_before_grayscale() {
        let steps = PostProcess {
            invert: true,
            grayscale: true,
            resize: None,
        };
        let out = steps.apply(sample());
        assert_eq!(out.color(), ColorType::L8);
        // Black becomes white after inversion, and stays white through grayscale.
        assert_eq!(out.to_luma8().get_pixel(0, 0).0, [255]);
    }

    #[test]
    fn resizes_only_when_size_differs() {
        let steps = PostProcess {
            resize: Some((8, 8)),
            ..Default::default()
        };
        let out = steps.apply(sample());
        assert_eq!((out.width(), out.height()), (8, 8));

        let same = PostProcess {
            resize: Some((4, 2)),
            ..Default::default()
        };
        assert_eq!(
            same.apply(sample()).to_rgb8().as_raw(),
            sample().to_rgb8().as_raw()
        );
    }
}
