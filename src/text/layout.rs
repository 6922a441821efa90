//! Font-metrics/layout service for scrambled text.
//!
//! The scramble algorithm itself is a pure state machine over cells; this
//! module is the only place that knows how wide a glyph is or where a cell
//! sits, so the engine stays unit-testable without a rendering surface.

use kurbo::Point;

use crate::foundation::error::{StageError, StageResult};

/// Width of the gap between words, in multiples of the font size (`em`).
const WORD_GAP_EM: f64 = 0.5;

/// Measures glyph advances for a fixed font configuration.
pub trait GlyphMetrics {
    /// Advance width of `ch`, in pixels.
    fn advance(&self, ch: char) -> f64;

    /// Font size in pixels; also used as the line height of a cell.
    fn font_size(&self) -> f64;
}

/// Fixed-advance metrics. Real text would plug a shaping library in behind
/// [`GlyphMetrics`]; the choreography only needs stable cell widths so
/// scrambled glyphs never reflow the line.
#[derive(Clone, Copy, Debug)]
pub struct MonospaceMetrics {
    pub advance: f64,
    pub font_size: f64,
}

impl MonospaceMetrics {
    pub fn new(advance: f64, font_size: f64) -> StageResult<Self> {
        if !(advance.is_finite() && font_size.is_finite()) || advance <= 0.0 || font_size <= 0.0 {
            return Err(StageError::validation(
                "glyph metrics must be finite and > 0",
            ));
        }
        Ok(Self { advance, font_size })
    }
}

impl GlyphMetrics for MonospaceMetrics {
    fn advance(&self, _ch: char) -> f64 {
        self.advance
    }

    fn font_size(&self) -> f64 {
        self.font_size
    }
}

/// One measured character position produced by [`layout_cells`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellSlot {
    pub ch: char,
    pub center: Point,
    pub width: f64,
    /// Index of the word this character belongs to.
    pub word: usize,
}

/// Split `text` into words, then characters, assigning each character a fixed
/// measured width and a center point on a single line starting at `origin`.
/// Inter-word spacing is preserved as layout (a word gap), not as cells.
pub fn layout_cells(text: &str, metrics: &dyn GlyphMetrics, origin: Point) -> Vec<CellSlot> {
    let mut cells = Vec::new();
    let mut x = origin.x;
    let y = origin.y + metrics.font_size() / 2.0;
    let gap = metrics.font_size() * WORD_GAP_EM;

    for (i, word) in text.split_whitespace().enumerate() {
        if i > 0 {
            x += gap;
        }
        for ch in word.chars() {
            // One extra pixel so adjacent noise glyphs cannot overlap.
            let width = metrics.advance(ch) + 1.0;
            cells.push(CellSlot {
                ch,
                center: Point::new(x + width / 2.0, y),
                width,
                word: i,
            });
            x += width;
        }
    }
    cells
}

#[cfg(test)]
#[path = "../../tests/unit/text/layout.rs"]
mod tests;
