//! # Text Layout
//!
//! Greedy line breaking over UAX#14 break opportunities, measured with the
//! standard font metrics from [`FontContext`].

use crate::font::{FontContext, FontKey};
use unicode_linebreak::linebreaks;

/// A line of text after line-breaking.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLine {
    /// The text of the line, trailing spaces included.
    pub text: String,
    /// Advance width of `text`.
    pub width: f64,
    /// Width without trailing spaces, used for alignment.
    pub visible_width: f64,
    /// The line ended at an explicit newline.
    pub hard_break: bool,
}

fn is_newline(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Split text into unbreakable chunks at UAX#14 break opportunities.
///
/// `linebreaks()` yields the byte offset AFTER each break, so every chunk
/// carries its trailing spaces (and newline, for mandatory breaks).
fn break_chunks(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    for (byte_offset, _) in linebreaks(text) {
        if byte_offset > start {
            chunks.push(&text[start..byte_offset]);
        }
        start = byte_offset;
    }
    chunks
}

pub struct TextLayout<'a> {
    fonts: &'a FontContext,
    font: &'a FontKey,
    font_size: f64,
}

impl<'a> TextLayout<'a> {
    pub fn new(fonts: &'a FontContext, font: &'a FontKey, font_size: f64) -> Self {
        Self {
            fonts,
            font,
            font_size,
        }
    }

    fn measure(&self, s: &str) -> f64 {
        self.fonts.measure_string(s, self.font, self.font_size)
    }

    fn make_line(&self, text: String, hard_break: bool) -> BrokenLine {
        let width = self.measure(&text);
        let visible_width = self.measure(text.trim_end_matches(' '));
        BrokenLine {
            text,
            width,
            visible_width,
            hard_break,
        }
    }

    /// Break `text` into lines of at most `max_width`.
    ///
    /// The first line only has `first_width` available (a run continuing a
    /// partly filled line). If not even the first chunk fits there, the first
    /// returned line is empty, meaning "wrap before this text".
    ///
    /// Always returns at least one line.
    pub fn break_into_lines(&self, text: &str, first_width: f64, max_width: f64) -> Vec<BrokenLine> {
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut current_width = 0.0;
        let mut available = first_width;

        for chunk in break_chunks(text) {
            let hard = chunk.ends_with(is_newline);
            let content = chunk.trim_end_matches(is_newline);
            let width = self.measure(content);
            let visible = self.measure(content.trim_end_matches(' '));

            let wraps = current_width + visible > available
                && (!current.is_empty() || available < max_width);
            if wraps {
                lines.push(self.make_line(std::mem::take(&mut current), false));
                current_width = 0.0;
                available = max_width;
            }

            if visible > available {
                // A single word wider than the line: break between characters.
                for ch in content.chars() {
                    let cw = self.fonts.char_width(ch, self.font, self.font_size);
                    if current_width + cw > available && !current.is_empty() && ch != ' ' {
                        lines.push(self.make_line(std::mem::take(&mut current), false));
                        current_width = 0.0;
                        available = max_width;
                    }
                    current.push(ch);
                    current_width += cw;
                }
            } else {
                current.push_str(content);
                current_width += width;
            }

            if hard {
                lines.push(self.make_line(std::mem::take(&mut current), true));
                current_width = 0.0;
                available = max_width;
            }
        }

        if !current.is_empty() || lines.is_empty() || lines.last().is_some_and(|l| l.hard_break) {
            lines.push(self.make_line(current, false));
        }

        lines
    }

    /// Height of `text` wrapped to `max_width`, at `line_height` per line.
    pub fn wrapped_height(&self, text: &str, max_width: f64, line_height: f64) -> f64 {
        self.break_into_lines(text, max_width, max_width).len() as f64 * line_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str, first: f64, max: f64) -> Vec<BrokenLine> {
        let fc = FontContext::new();
        let key = FontKey::new("Helvetica", false);
        TextLayout::new(&fc, &key, 12.0).break_into_lines(text, first, max)
    }

    #[test]
    fn test_single_line() {
        let out = lines("Hello", 200.0, 200.0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "Hello");
    }

    #[test]
    fn test_line_break_at_space() {
        let out = lines("Hello World", 40.0, 40.0);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "Hello ");
        assert_eq!(out[1].text, "World");
        assert!(out[0].visible_width < out[0].width);
    }

    #[test]
    fn test_explicit_newline() {
        let out = lines("Hello\nWorld", 200.0, 200.0);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "Hello");
        assert!(out[0].hard_break);
        assert_eq!(out[1].text, "World");
    }

    #[test]
    fn test_empty_string() {
        let out = lines("", 200.0, 200.0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].width, 0.0);
    }

    #[test]
    fn test_continued_line_wraps_first() {
        // Only 5pt left on the current line: "World" cannot start there.
        let out = lines("World", 5.0, 200.0);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "");
        assert_eq!(out[1].text, "World");
    }

    #[test]
    fn test_long_word_is_split() {
        let out = lines("Supercalifragilistic", 30.0, 30.0);
        assert!(out.len() > 1);
        let joined: String = out.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(joined, "Supercalifragilistic");
        assert!(out.iter().all(|l| l.width <= 30.0 + 1e-9));
    }

    #[test]
    fn test_wrapped_height() {
        let fc = FontContext::new();
        let key = FontKey::new("Helvetica", false);
        let tl = TextLayout::new(&fc, &key, 10.0);
        assert_eq!(tl.wrapped_height("one", 100.0, 12.0), 12.0);
        assert!(tl.wrapped_height("one two three four five six", 40.0, 12.0) > 12.0);
    }
}
