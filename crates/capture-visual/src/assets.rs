use std::fs;
use std::path::Path;

use image::DynamicImage;
use rusttype::Font;

use crate::errors::VisualError;

pub const PLACEHOLDER_FILE: &str = "error.png";
pub const FONT_FILE: &str = "DejaVuSansMono.ttf";

static EMBEDDED_PLACEHOLDER: &[u8] = include_bytes!("../assets/error.png");
static EMBEDDED_FONT: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

/// Placeholder graphic and annotation font used when a render fails.
#[derive(Clone)]
pub struct FallbackAssets {
    placeholder: DynamicImage,
    font: Font<'static>,
}

impl FallbackAssets {
    /// Assets compiled into the binary.
    pub fn embedded() -> Result<Self, VisualError> {
        let placeholder = image::load_from_memory(EMBEDDED_PLACEHOLDER)
            .map_err(|err| VisualError::Asset(format!("placeholder: {err}")))?;
        let font = Font::try_from_bytes(EMBEDDED_FONT)
            .ok_or_else(|| VisualError::Asset("font: invalid font data".into()))?;
        Ok(Self { placeholder, font })
    }

    /// Loads `error.png` and `DejaVuSansMono.ttf` from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, VisualError> {
        let placeholder_path = dir.join(PLACEHOLDER_FILE);
        let placeholder = image::open(&placeholder_path).map_err(|err| {
            VisualError::Asset(format!("{}: {err}", placeholder_path.display()))
        })?;
        let font_path = dir.join(FONT_FILE);
        let bytes = fs::read(&font_path)
            .map_err(|err| VisualError::Asset(format!("{}: {err}", font_path.display())))?;
        let font = Font::try_from_vec(bytes).ok_or_else(|| {
            VisualError::Asset(format!("{}: invalid font data", font_path.display()))
        })?;
        Ok(Self { placeholder, font })
    }

    pub fn placeholder(&self) -> &DynamicImage {
        &self.placeholder
    }

    pub fn font(&self) -> &Font<'static> {
        &self.font
    }
}

impl std::fmt::Debug for FallbackAssets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackAssets")
            .field("placeholder", &(self.placeholder.width(), self.placeholder.height()))
            .finish_non_exhaustive()
    }
}
