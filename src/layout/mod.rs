//! # Page Surface
//!
//! The paginated drawing surface the renderer writes into.
//!
//! Rendering produces a stream of [`DrawOp`] instructions: text runs, cursor
//! advances, rules and page breaks. [`PageSurface::apply`] records each op
//! and lays it out immediately against a vertical cursor:
//!
//! 1. Text runs are broken into lines that fit the content width. A run
//!    marked `continued` leaves its last line open, so the next run carries
//!    on from where it stopped.
//! 2. When a line is closed it is aligned, checked against the bottom
//!    margin (starting a new page if it would cross it), placed, and the
//!    cursor moves down one line height.
//! 3. `MoveDown` advances the cursor by lines of the current font;
//!    `Advance` by points; `PageBreak` opens a new page with the cursor back
//!    at the top margin.
//!
//! Text boxes are the exception: they are placed at an explicit x and width
//! on the current cursor line and do not move the cursor. Table rows use
//! them and advance the cursor themselves once the row is drawn.

use crate::config::{Edges, RenderConfig};
use crate::font::{FontContext, FontKey};
use crate::text::TextLayout;

/// Horizontal alignment of a text run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// A run of text in a single font.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub font: FontKey,
    pub size: f64,
    pub align: Align,
    /// The next run continues on the same line.
    pub continued: bool,
}

/// One drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Select the current font; later `MoveDown`s are measured in it.
    Font { font: FontKey, size: f64 },
    /// Flow text at the cursor.
    Text(TextRun),
    /// Text wrapped inside a box at `x` on the cursor line. Cursor unchanged.
    TextBox { run: TextRun, x: f64, width: f64 },
    /// Move the cursor down by a number of lines of the current font.
    MoveDown(f64),
    /// Move the cursor down by points.
    Advance(f64),
    /// Horizontal rule at the cursor.
    Rule { from_x: f64, to_x: f64 },
    PageBreak,
}

/// A laid-out page.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<LayoutElement>,
}

/// A positioned element on a page. Coordinates are measured from the top-left
/// corner; for text, `y` is the baseline.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub draw: DrawCommand,
}

#[derive(Debug, Clone)]
pub enum DrawCommand {
    Text {
        text: String,
        font: FontKey,
        font_size: f64,
        /// Extra space added to each space character (justification).
        word_spacing: f64,
    },
    Line {
        thickness: f64,
    },
}

/// Part of the currently open line.
#[derive(Debug, Clone)]
struct Segment {
    text: String,
    font: FontKey,
    size: f64,
    width: f64,
}

/// The drawing surface: cursor, font state, finished pages and the op log.
pub struct PageSurface {
    fonts: FontContext,
    width: f64,
    height: f64,
    margin: Edges,
    line_height: f64,
    y: f64,
    page_index: usize,
    font: FontKey,
    font_size: f64,
    current: LayoutPage,
    pages: Vec<LayoutPage>,
    ops: Vec<DrawOp>,
    pending: Vec<Segment>,
    pending_align: Align,
}

impl PageSurface {
    pub fn new(config: &RenderConfig) -> Self {
        let (width, height) = config.page_size.dimensions();
        PageSurface {
            fonts: FontContext::new(),
            width,
            height,
            margin: config.margin,
            line_height: config.line_height,
            y: config.margin.top,
            page_index: 0,
            font: FontKey::new(&config.font_family, false),
            font_size: config.font_size,
            current: LayoutPage {
                width,
                height,
                elements: Vec::new(),
            },
            pages: Vec::new(),
            ops: Vec::new(),
            pending: Vec::new(),
            pending_align: Align::Left,
        }
    }

    // ─── Queries ────────────────────────────────────────────────────

    pub fn cursor_y(&self) -> f64 {
        self.y
    }

    /// Zero-based index of the page being drawn.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_count(&self) -> usize {
        self.page_index + 1
    }

    pub fn top(&self) -> f64 {
        self.margin.top
    }

    pub fn left(&self) -> f64 {
        self.margin.left
    }

    pub fn content_width(&self) -> f64 {
        self.width - self.margin.horizontal()
    }

    /// Nothing has moved the cursor off the top of the first page.
    pub fn at_origin(&self) -> bool {
        self.page_index == 0 && self.y == self.margin.top && self.pending.is_empty()
    }

    /// Every op applied so far, in order.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Line height for a font size.
    pub fn line_height_for(&self, size: f64) -> f64 {
        size * self.line_height
    }

    /// Height of `text` wrapped into a box of `width`.
    pub fn measure_box(&self, text: &str, font: &FontKey, size: f64, width: f64) -> f64 {
        TextLayout::new(&self.fonts, font, size).wrapped_height(
            text,
            width,
            self.line_height_for(size),
        )
    }

    // ─── Drawing ────────────────────────────────────────────────────

    pub fn apply(&mut self, op: DrawOp) {
        match &op {
            DrawOp::Font { font, size } => {
                self.font = font.clone();
                self.font_size = *size;
            }
            DrawOp::Text(run) => self.flow_text(run),
            DrawOp::TextBox { run, x, width } => self.place_box(run, *x, *width),
            DrawOp::MoveDown(lines) => {
                self.close_line(false, false);
                self.y += lines * self.line_height_for(self.font_size);
            }
            DrawOp::Advance(points) => {
                self.close_line(false, false);
                self.y += points;
            }
            DrawOp::Rule { from_x, to_x } => {
                self.close_line(false, false);
                self.current.elements.push(LayoutElement {
                    x: *from_x,
                    y: self.y,
                    width: to_x - from_x,
                    draw: DrawCommand::Line { thickness: 0.5 },
                });
            }
            DrawOp::PageBreak => {
                self.close_line(false, false);
                self.new_page();
            }
        }
        self.ops.push(op);
    }

    /// Finish the document and return its pages.
    pub fn finish(mut self) -> Vec<LayoutPage> {
        self.close_line(false, false);
        self.pages.push(self.current);
        self.pages
    }

    fn new_page(&mut self) {
        let next = LayoutPage {
            width: self.width,
            height: self.height,
            elements: Vec::new(),
        };
        self.pages.push(std::mem::replace(&mut self.current, next));
        self.page_index += 1;
        self.y = self.margin.top;
    }

    fn flow_text(&mut self, run: &TextRun) {
        self.font = run.font.clone();
        self.font_size = run.size;
        if self.pending.is_empty() {
            self.pending_align = run.align;
        }

        let used: f64 = self.pending.iter().map(|s| s.width).sum();
        let max_width = self.content_width();
        let lines = TextLayout::new(&self.fonts, &run.font, run.size).break_into_lines(
            &run.text,
            max_width - used,
            max_width,
        );

        let last = lines.len() - 1;
        for (i, line) in lines.into_iter().enumerate() {
            if !line.text.is_empty() {
                self.pending.push(Segment {
                    text: line.text,
                    font: run.font.clone(),
                    size: run.size,
                    width: line.width,
                });
            }
            if i < last {
                // Wrapped lines stretch when justified; hard breaks don't.
                self.close_line(!line.hard_break, true);
                self.pending_align = run.align;
            } else if !run.continued {
                self.close_line(false, true);
            }
        }
    }

    /// Close the open line: align it, paginate, place it, advance the cursor.
    /// With `force`, an empty line still takes up one line height.
    fn close_line(&mut self, wrapped: bool, force: bool) {
        let segments = std::mem::take(&mut self.pending);
        if segments.is_empty() && !force {
            return;
        }

        let max_size = segments
            .iter()
            .map(|s| s.size)
            .fold(0.0_f64, f64::max)
            .max(if segments.is_empty() { self.font_size } else { 0.0 });
        let line_height = self.line_height_for(max_size);

        if self.y + line_height > self.height - self.margin.bottom && self.y > self.margin.top {
            self.new_page();
        }

        let content_width = self.content_width();
        let visible_width = visible_width(&segments, &self.fonts);
        let slack = (content_width - visible_width).max(0.0);
        let spaces = count_inner_spaces(&segments);

        let (offset, word_spacing) = match self.pending_align {
            Align::Left => (0.0, 0.0),
            Align::Center => (slack / 2.0, 0.0),
            Align::Right => (slack, 0.0),
            Align::Justify if wrapped && spaces > 0 => (0.0, slack / spaces as f64),
            Align::Justify => (0.0, 0.0),
        };

        let ascent = segments
            .iter()
            .map(|s| self.fonts.ascent(&s.font, s.size))
            .fold(0.0_f64, f64::max);
        let baseline = self.y + ascent;

        let mut x = self.margin.left + offset;
        for seg in segments {
            let seg_spaces = seg.text.chars().filter(|c| *c == ' ').count() as f64;
            let advance = seg.width + word_spacing * seg_spaces;
            self.current.elements.push(LayoutElement {
                x,
                y: baseline,
                width: seg.width,
                draw: DrawCommand::Text {
                    text: seg.text,
                    font: seg.font,
                    font_size: seg.size,
                    word_spacing,
                },
            });
            x += advance;
        }

        self.y += line_height;
        self.pending_align = Align::Left;
    }

    fn place_box(&mut self, run: &TextRun, x: f64, width: f64) {
        let layout = TextLayout::new(&self.fonts, &run.font, run.size);
        let line_height = self.line_height_for(run.size);
        let ascent = self.fonts.ascent(&run.font, run.size);
        let mut top = self.y;

        for line in layout.break_into_lines(&run.text, width, width) {
            let offset = match run.align {
                Align::Center => (width - line.visible_width).max(0.0) / 2.0,
                Align::Right => (width - line.visible_width).max(0.0),
                Align::Left | Align::Justify => 0.0,
            };
            if !line.text.is_empty() {
                self.current.elements.push(LayoutElement {
                    x: x + offset,
                    y: top + ascent,
                    width: line.width,
                    draw: DrawCommand::Text {
                        text: line.text,
                        font: run.font.clone(),
                        font_size: run.size,
                        word_spacing: 0.0,
                    },
                });
            }
            top += line_height;
        }
    }
}

fn visible_width(segments: &[Segment], fonts: &FontContext) -> f64 {
    let Some((last, rest)) = segments.split_last() else {
        return 0.0;
    };
    let leading: f64 = rest.iter().map(|s| s.width).sum();
    leading + fonts.measure_string(last.text.trim_end_matches(' '), &last.font, last.size)
}

/// Spaces between words on the line, excluding trailing spaces.
fn count_inner_spaces(segments: &[Segment]) -> usize {
    let joined: String = segments.iter().map(|s| s.text.as_str()).collect();
    joined.trim_end_matches(' ').chars().filter(|c| *c == ' ').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, bold: bool, continued: bool) -> TextRun {
        TextRun {
            text: text.to_string(),
            font: FontKey::new("Helvetica", bold),
            size: 12.0,
            align: Align::Left,
            continued,
        }
    }

    fn text_elements(page: &LayoutPage) -> Vec<(f64, f64, String)> {
        page.elements
            .iter()
            .filter_map(|e| match &e.draw {
                DrawCommand::Text { text, .. } => Some((e.x, e.y, text.clone())),
                DrawCommand::Line { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_continued_runs_share_a_line() {
        let mut surface = PageSurface::new(&RenderConfig::default());
        surface.apply(DrawOp::Text(run("Hello ", false, true)));
        surface.apply(DrawOp::Text(run("World", true, false)));
        assert!((surface.cursor_y() - 64.4).abs() < 1e-9);

        let pages = surface.finish();
        let texts = text_elements(&pages[0]);
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].1, texts[1].1, "same baseline");
        assert!(texts[1].0 > texts[0].0);
    }

    #[test]
    fn test_move_down_uses_current_font() {
        let mut surface = PageSurface::new(&RenderConfig::default());
        surface.apply(DrawOp::Font {
            font: FontKey::new("Helvetica", false),
            size: 10.0,
        });
        surface.apply(DrawOp::MoveDown(2.0));
        assert!((surface.cursor_y() - (50.0 + 24.0)).abs() < 1e-9);
        assert!(!surface.at_origin());
    }

    #[test]
    fn test_center_alignment() {
        let mut surface = PageSurface::new(&RenderConfig::default());
        let mut r = run("Hi", false, false);
        r.align = Align::Center;
        surface.apply(DrawOp::Text(r));
        let pages = surface.finish();
        let (x, _, _) = text_elements(&pages[0])[0].clone();
        assert!(x > 250.0 && x < 310.0, "x = {}", x);
    }

    #[test]
    fn test_automatic_page_break() {
        let mut surface = PageSurface::new(&RenderConfig::default());
        for _ in 0..60 {
            surface.apply(DrawOp::Text(run("line", false, false)));
        }
        assert_eq!(surface.page_index(), 1);
        assert_eq!(surface.page_count(), 2);
        let pages = surface.finish();
        assert_eq!(pages.len(), 2);
        assert!(text_elements(&pages[0]).iter().all(|(_, y, _)| *y <= 742.0));
    }

    #[test]
    fn test_page_break_resets_cursor() {
        let mut surface = PageSurface::new(&RenderConfig::default());
        surface.apply(DrawOp::Text(run("a", false, false)));
        surface.apply(DrawOp::PageBreak);
        assert_eq!(surface.cursor_y(), surface.top());
        assert_eq!(surface.page_index(), 1);
        assert!(!surface.at_origin());
    }

    #[test]
    fn test_text_box_does_not_move_cursor() {
        let mut surface = PageSurface::new(&RenderConfig::default());
        surface.apply(DrawOp::TextBox {
            run: run("a fairly long description that wraps", false, false),
            x: 200.0,
            width: 60.0,
        });
        assert_eq!(surface.cursor_y(), 50.0);
        let pages = surface.finish();
        let texts = text_elements(&pages[0]);
        assert!(texts.len() > 1);
        assert!(texts.iter().all(|(x, _, _)| *x == 200.0));
    }

    #[test]
    fn test_ops_are_recorded() {
        let mut surface = PageSurface::new(&RenderConfig::default());
        surface.apply(DrawOp::Text(run("x", false, false)));
        surface.apply(DrawOp::MoveDown(1.0));
        assert_eq!(surface.ops().len(), 2);
        assert!(matches!(surface.ops()[1], DrawOp::MoveDown(_)));
    }
}
