use serde::{ Deserialize, Serialize };

use std::fs;
use std::path::Path;

use crate::error::{ PlateError, Result };

/// Parameters of the grayscale -> bilateral -> gaussian -> canny chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Side of the square bilateral window, in pixels.
    pub bilateral_window: u32,
    pub bilateral_sigma_color: f32,
    pub bilateral_sigma_spatial: f32,
    /// 1.1 is what a 5x5 kernel with an automatic sigma works out to.
    pub gaussian_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            bilateral_window: 11,
            bilateral_sigma_color: 17.0,
            bilateral_sigma_spatial: 17.0,
            gaussian_sigma: 1.1,
            canny_low: 170.0,
            canny_high: 200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// How many of the largest-area rectangles are scored.
    pub max_rects_to_consider: usize,
    /// Wanted height / width ratio of a plate.
    pub target_aspect: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self { max_rects_to_consider: 10, target_aspect: 0.5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightStyle {
    pub color: [u8; 3],
    pub thickness: u32,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self { color: [0, 255, 0], thickness: 2 }
    }
}

/// Everything the detector can be tuned with.
///
/// Every field has a default, so a config file only needs to name what it
/// overrides:
///
/// ```toml
/// rect_threshold = 8000.0
///
/// [selector]
/// target_aspect = 0.25
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    pub preprocess: PreprocessConfig,
    /// Max allowed `bounding_rect.area - contour.area` for a contour to
    /// count as rectangular.
    pub rect_threshold: f64,
    pub selector: SelectorConfig,
    pub highlight: HighlightStyle,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            preprocess: PreprocessConfig::default(),
            rect_threshold: 10000.0,
            selector: SelectorConfig::default(),
            highlight: HighlightStyle::default(),
        }
    }
}

impl FinderConfig {

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: FinderConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Rejects values the image primitives would panic on or that make the
    /// selection meaningless.
    pub fn validate(&self) -> Result<()> {
        let p = &self.preprocess;
        if p.bilateral_window == 0 {
            return Err(invalid("bilateral_window must be at least 1"));
        }
        if !(p.bilateral_sigma_color > 0.0 && p.bilateral_sigma_spatial > 0.0) {
            return Err(invalid("bilateral sigmas must be positive"));
        }
        if !(p.gaussian_sigma > 0.0) {
            return Err(invalid("gaussian_sigma must be positive"));
        }
        if p.canny_low < 0.0 || p.canny_low > p.canny_high {
            return Err(invalid("canny thresholds must satisfy 0 <= canny_low <= canny_high"));
        }
        if !(self.rect_threshold > 0.0) {
            return Err(invalid("rect_threshold must be positive"));
        }
        if self.selector.max_rects_to_consider == 0 {
            return Err(invalid("max_rects_to_consider must be at least 1"));
        }
        if !(self.selector.target_aspect > 0.0 && self.selector.target_aspect.is_finite()) {
            return Err(invalid("target_aspect must be a positive number"));
        }
        if self.highlight.thickness == 0 {
            return Err(invalid("highlight thickness must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> PlateError {
    PlateError::InvalidConfig(msg.to_string())
}
