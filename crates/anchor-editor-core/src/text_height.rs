//! Rendered text height estimation
//!
//! A monospace approximation used to warn that text will probably overflow a
//! field box before the field is committed. It does not measure glyphs and is
//! expected to be off by 10-15%.

use serde::{Deserialize, Serialize};

/// Line height as a multiple of the font size
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// Average glyph advance as a multiple of the font size
pub const AVG_CHAR_WIDTH_FACTOR: f64 = 0.55;

/// Estimate the rendered height of `text` wrapped into `field_width_px`.
///
/// Each explicit newline starts a paragraph; an empty paragraph still takes
/// one line. Lengths are counted in characters, not bytes.
pub fn estimate(text: &str, field_width_px: f64, font_size_pt: f64) -> f64 {
    if font_size_pt.is_nan() || font_size_pt <= 0.0 {
        return 0.0;
    }

    let line_height = font_size_pt * LINE_HEIGHT_FACTOR;
    let chars_per_line = chars_per_line(field_width_px, font_size_pt);

    let lines: usize = text
        .split('\n')
        .map(|paragraph| {
            let len = paragraph.chars().count();
            if len == 0 {
                1
            } else {
                len.div_ceil(chars_per_line)
            }
        })
        .sum();

    lines as f64 * line_height
}

/// Characters that fit on one line. Never zero, so that a field narrower
/// than a single glyph still wraps one character per line.
fn chars_per_line(field_width_px: f64, font_size_pt: f64) -> usize {
    let avg_char_width = font_size_pt * AVG_CHAR_WIDTH_FACTOR;
    let fit = (field_width_px / avg_char_width).floor();
    if fit.is_finite() && fit >= 1.0 {
        fit as usize
    } else {
        1
    }
}

/// Result of comparing estimated text height against a field box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverflowCheck {
    pub estimated_height: f64,
    pub field_height: f64,
    pub overflows: bool,
    /// Height the field would need, including the safety margin
    pub suggested_height: f64,
}

/// Check whether `text` is likely to overflow a field of the given size
pub fn check_overflow(
    text: &str,
    field_width_px: f64,
    field_height_px: f64,
    font_size_pt: f64,
    margin_px: f64,
) -> OverflowCheck {
    let estimated_height = estimate(text, field_width_px, font_size_pt);
    OverflowCheck {
        estimated_height,
        field_height: field_height_px,
        overflows: estimated_height > field_height_px,
        suggested_height: estimated_height.ceil() + margin_px,
    }
}
