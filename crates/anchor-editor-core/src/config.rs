//! Editor configuration
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration. Values are checked by [`EditorConfig::validate`] when
//! loaded through [`EditorConfig::from_str`] or [`EditorConfig::from_file`].

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::coords::PageSize;
use crate::palette::{Color, SignerPalette};

/// Tunables for one editing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Logical page canvas width in px (default: 540)
    #[serde(default = "default_canvas_width")]
    pub canvas_width: f64,
    /// Logical page canvas height in px (default: 765)
    #[serde(default = "default_canvas_height")]
    pub canvas_height: f64,
    /// Smallest anchor edge in canvas px (default: 1)
    #[serde(default = "default_min_anchor_size")]
    pub min_anchor_size_px: f64,
    /// Screen px a held selection must move before it becomes a drag (default: 3)
    #[serde(default = "default_drag_threshold")]
    pub drag_threshold_px: f64,
    /// Screen px radius of resize handle hit areas (default: 6)
    #[serde(default = "default_handle_hit_radius")]
    pub handle_hit_radius_px: f64,
    #[serde(default)]
    pub zoom: ZoomConfig,
    /// Offset applied to duplicated anchors, in canvas px (default: 20)
    #[serde(default = "default_duplicate_offset")]
    pub duplicate_offset_px: f64,
    /// Margin added to a text height estimate when suggesting a field height (default: 14)
    #[serde(default = "default_overflow_margin")]
    pub overflow_margin_px: f64,
    #[serde(default = "default_font_size")]
    pub default_font_size_pt: f64,
    /// Custom signer palette; the built-in palette is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<Color>>,
    /// Whether a session with no anchors may be saved (default: true)
    #[serde(default = "default_allow_empty_save")]
    pub allow_empty_save: bool,
}

fn default_canvas_width() -> f64 {
    540.0
}

fn default_canvas_height() -> f64 {
    765.0
}

fn default_min_anchor_size() -> f64 {
    1.0
}

fn default_drag_threshold() -> f64 {
    3.0
}

fn default_handle_hit_radius() -> f64 {
    6.0
}

fn default_duplicate_offset() -> f64 {
    20.0
}

fn default_overflow_margin() -> f64 {
    14.0
}

fn default_font_size() -> f64 {
    12.0
}

fn default_allow_empty_save() -> bool {
    true
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
            min_anchor_size_px: default_min_anchor_size(),
            drag_threshold_px: default_drag_threshold(),
            handle_hit_radius_px: default_handle_hit_radius(),
            zoom: ZoomConfig::default(),
            duplicate_offset_px: default_duplicate_offset(),
            overflow_margin_px: default_overflow_margin(),
            default_font_size_pt: default_font_size(),
            palette: None,
            allow_empty_save: default_allow_empty_save(),
        }
    }
}

/// Zoom bounds and step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomConfig {
    #[serde(default = "default_zoom_min")]
    pub min: f64,
    #[serde(default = "default_zoom_max")]
    pub max: f64,
    #[serde(default = "default_zoom_step")]
    pub step: f64,
    #[serde(default = "default_zoom_default")]
    pub default: f64,
}

fn default_zoom_min() -> f64 {
    0.5
}

fn default_zoom_max() -> f64 {
    2.0
}

fn default_zoom_step() -> f64 {
    0.1
}

fn default_zoom_default() -> f64 {
    1.0
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: default_zoom_min(),
            max: default_zoom_max(),
            step: default_zoom_step(),
            default: default_zoom_default(),
        }
    }
}

impl ZoomConfig {
    /// Clamp a zoom factor into bounds and round it to two decimals.
    /// Non-finite input yields the default zoom.
    pub fn clamp(&self, zoom: f64) -> f64 {
        if !zoom.is_finite() {
            return self.default;
        }
        let clamped = zoom.clamp(self.min, self.max);
        (clamped * 100.0).round() / 100.0
    }
}

impl EditorConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read editor config: {}", path.display()))?;
        Self::from_str(&content)
            .with_context(|| format!("Invalid editor config: {}", path.display()))
    }

    /// Parse and validate configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the editor cannot work with
    pub fn validate(&self) -> anyhow::Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !positive(self.canvas_width) || !positive(self.canvas_height) {
            bail!(
                "Canvas size must be positive, got {}x{}",
                self.canvas_width,
                self.canvas_height
            );
        }
        if !positive(self.min_anchor_size_px) {
            bail!("min_anchor_size_px must be positive");
        }
        if !self.drag_threshold_px.is_finite() || self.drag_threshold_px < 0.0 {
            bail!("drag_threshold_px must not be negative");
        }
        if !self.handle_hit_radius_px.is_finite() || self.handle_hit_radius_px < 0.0 {
            bail!("handle_hit_radius_px must not be negative");
        }

        let zoom = &self.zoom;
        if !positive(zoom.min) || !positive(zoom.max) || zoom.min > zoom.max {
            bail!("Invalid zoom bounds: min {} max {}", zoom.min, zoom.max);
        }
        if !positive(zoom.step) {
            bail!("Zoom step must be positive");
        }
        if !(zoom.min..=zoom.max).contains(&zoom.default) {
            bail!(
                "Default zoom {} is outside {}..={}",
                zoom.default,
                zoom.min,
                zoom.max
            );
        }

        if !positive(self.default_font_size_pt) {
            bail!("default_font_size_pt must be positive");
        }
        if matches!(&self.palette, Some(colors) if colors.is_empty()) {
            bail!("palette must contain at least one colour");
        }
        Ok(())
    }

    pub fn page_size(&self) -> PageSize {
        PageSize::new(self.canvas_width, self.canvas_height)
    }

    pub fn palette(&self) -> SignerPalette {
        self.palette
            .clone()
            .map(SignerPalette::new)
            .unwrap_or_default()
    }

    /// See [`ZoomConfig::clamp`]
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        self.zoom.clamp(zoom)
    }
}
