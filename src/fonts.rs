//! Typefaces used on the flyer and text measurement.
//!
//! Fonts are the one resource whose absence is fatal: a flyer without text
//! is useless, so [`FontSet::load_dir`] fails the run up front instead of
//! degrading page by page the way images do.

use crate::error::FlyerError;
use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// File names of the five faces inside a font directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFiles {
    pub bold_condensed: String,
    pub extrabold_condensed: String,
    pub regular_condensed: String,
    pub extrabold: String,
    pub semibold: String,
}

impl Default for FontFiles {
    fn default() -> Self {
        Self {
            bold_condensed: "Mark Simonson - Proxima Nova Alt Condensed Bold.otf".into(),
            extrabold_condensed: "Mark Simonson - Proxima Nova Alt Condensed Extrabold.otf".into(),
            regular_condensed: "Mark Simonson - Proxima Nova Alt Condensed Regular.otf".into(),
            extrabold: "Mark Simonson - Proxima Nova Extrabold.otf".into(),
            semibold: "Mark Simonson - Proxima Nova Semibold.otf".into(),
        }
    }
}

/// The loaded faces. Cloning is cheap (each face is reference-counted).
#[derive(Clone)]
pub struct FontSet {
    /// Timestamp badge and SKU text.
    pub bold_condensed: FontArc,
    /// Store name label.
    pub extrabold_condensed: FontArc,
    /// Product titles.
    pub regular_condensed: FontArc,
    /// Slogan.
    pub extrabold: FontArc,
    /// Product brand line.
    pub semibold: FontArc,
}

impl fmt::Debug for FontSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontSet")
            .field("glyphs", &self.bold_condensed.glyph_count())
            .finish_non_exhaustive()
    }
}

impl FontSet {
    /// Load the default face file names from `dir`.
    pub fn load_dir(dir: &Path) -> Result<Self, FlyerError> {
        Self::load_files(dir, &FontFiles::default())
    }

    /// Load the given face file names from `dir`.
    pub fn load_files(dir: &Path, files: &FontFiles) -> Result<Self, FlyerError> {
        Ok(Self {
            bold_condensed: load_font(&dir.join(&files.bold_condensed))?,
            extrabold_condensed: load_font(&dir.join(&files.extrabold_condensed))?,
            regular_condensed: load_font(&dir.join(&files.regular_condensed))?,
            extrabold: load_font(&dir.join(&files.extrabold))?,
            semibold: load_font(&dir.join(&files.semibold))?,
        })
    }

    /// Use one face for every role.
    pub fn uniform(font: FontArc) -> Self {
        Self {
            bold_condensed: font.clone(),
            extrabold_condensed: font.clone(),
            regular_condensed: font.clone(),
            extrabold: font.clone(),
            semibold: font,
        }
    }
}

/// Read and parse a single font file.
pub fn load_font(path: &Path) -> Result<FontArc, FlyerError> {
    let bytes = std::fs::read(path).map_err(|_| FlyerError::FontNotFound {
        path: path.to_path_buf(),
    })?;
    let font = FontArc::try_from_vec(bytes).map_err(|e| FlyerError::FontInvalid {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    debug!("Loaded font {}", path.display());
    Ok(font)
}

/// Advance width of `text` at `px` pixels, kerning included.
///
/// Every dynamically sized badge on the page is built from this number.
pub fn text_width(font: &FontArc, px: f32, text: &str) -> u32 {
    let scaled = font.as_scaled(PxScale::from(px));
    let mut width = 0.0f32;
    let mut previous: Option<GlyphId> = None;
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = previous {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        previous = Some(id);
    }
    width.max(0.0).ceil() as u32
}
