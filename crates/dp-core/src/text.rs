//! Line breaking for text placements.
//!
//! Text is broken by character count: the average glyph advance is
//! estimated from the font size, the number of characters that fit between
//! the anchor and the right edge of the canvas becomes the line length, and
//! each line advances one `font_size` down from the previous baseline.

use crate::model::{TextBlock, TextLine};
use kurbo::Point;

/// Estimated average advance of one character, as a fraction of the font size.
pub const AVERAGE_ADVANCE_EM: f32 = 0.5;

/// Lay out `text` anchored at `origin`, wrapping at `canvas_width`.
pub fn layout_text(text: &str, origin: Point, font_size: f32, canvas_width: f64) -> TextBlock {
    let chars: Vec<char> = text.chars().collect();
    let advance = (font_size * AVERAGE_ADVANCE_EM) as f64;
    let rest_width = canvas_width - origin.x;

    let per_line = if advance <= 0.0 {
        1
    } else {
        (rest_width / advance).floor().max(1.0) as usize
    };

    let mut y = origin.y;
    let lines = chars
        .chunks(per_line)
        .map(|chunk| {
            y += font_size as f64;
            TextLine {
                text: chunk.iter().collect(),
                baseline: Point::new(origin.x, y),
            }
        })
        .collect();

    TextBlock {
        origin,
        font_size,
        lines,
    }
}
