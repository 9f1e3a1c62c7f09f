//! # Markup Parser
//!
//! Reads the HTML subset invoice templates are written in and turns it into
//! blocks the renderer can draw:
//!
//! - `<h1>`..`<h3>` become [`Block::Heading`]
//! - `<p>` becomes [`Block::Paragraph`], aligned by its `class` (or inline
//!   `text-align` style) and split into plain and bold [`Span`]s
//! - `<strong>` / `<b>` mark bold spans, `<br>` is a line break, every other
//!   inline tag is dropped and its text kept
//!
//! The markup is parsed as an HTML fragment, so entities, attribute quoting
//! and unclosed tags follow the HTML parsing rules. Text outside those blocks
//! is ignored and whitespace collapses as it does in a browser.

use scraper::node::Element;
use scraper::{ElementRef, Html};

use crate::layout::Align;

/// A block-level element.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph { align: Align, spans: Vec<Span> },
}

/// An inline run of paragraph text.
#[derive(Debug, Clone, PartialEq)]
pub enum Span {
    Plain(String),
    Bold(String),
}

impl Span {
    pub fn text(&self) -> &str {
        match self {
            Span::Plain(t) | Span::Bold(t) => t,
        }
    }

    pub fn is_bold(&self) -> bool {
        matches!(self, Span::Bold(_))
    }

    fn text_mut(&mut self) -> &mut String {
        match self {
            Span::Plain(t) | Span::Bold(t) => t,
        }
    }
}

// ─── Inline text ────────────────────────────────────────────────────

/// Collects the span stream of one block.
#[derive(Default)]
struct SpanBuilder {
    spans: Vec<Span>,
    /// The last character emitted, for whitespace collapsing.
    last: Option<char>,
}

impl SpanBuilder {
    fn push_str(&mut self, text: &str, bold: bool) {
        let span_matches = matches!(self.spans.last(), Some(s) if s.is_bold() == bold);
        if !span_matches {
            self.spans.push(if bold {
                Span::Bold(String::new())
            } else {
                Span::Plain(String::new())
            });
        }
        if let Some(span) = self.spans.last_mut() {
            span.text_mut().push_str(text);
        }
    }

    /// Append a text node with HTML whitespace collapsing. `&nbsp;` is kept.
    fn push_text(&mut self, raw: &str, bold: bool) {
        let mut collapsed = String::with_capacity(raw.len());
        for ch in raw.chars() {
            if ch.is_whitespace() && ch != '\u{a0}' {
                if matches!(self.last, None | Some(' ') | Some('\n')) {
                    continue;
                }
                collapsed.push(' ');
                self.last = Some(' ');
            } else {
                collapsed.push(ch);
                self.last = Some(ch);
            }
        }
        if !collapsed.is_empty() {
            self.push_str(&collapsed, bold);
        }
    }

    fn line_break(&mut self, bold: bool) {
        self.push_str("\n", bold);
        self.last = Some('\n');
    }

    fn finish(mut self) -> Vec<Span> {
        if let Some(last) = self.spans.last_mut() {
            let trimmed = last.text().trim_end().len();
            last.text_mut().truncate(trimmed);
        }
        self.spans.retain(|s| !s.text().is_empty());
        self.spans
    }
}

/// Walk the inline content of `element`, in document order.
fn collect_inline(element: ElementRef<'_>, bold: bool, out: &mut SpanBuilder) {
    for child in element.children() {
        if let Some(el) = ElementRef::wrap(child) {
            match el.value().name() {
                "br" => out.line_break(bold),
                "strong" | "b" => collect_inline(el, true, out),
                "script" | "style" => {}
                _ => collect_inline(el, bold, out),
            }
        } else if let Some(text) = child.value().as_text() {
            out.push_text(text, bold);
        }
    }
}

// ─── Blocks ─────────────────────────────────────────────────────────

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        _ => None,
    }
}

fn heading(element: ElementRef<'_>, level: u8) -> Option<Block> {
    let mut builder = SpanBuilder::default();
    collect_inline(element, false, &mut builder);
    let text: String = builder.finish().iter().map(Span::text).collect();
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(Block::Heading {
        level,
        text: text.to_string(),
    })
}

fn paragraph(element: ElementRef<'_>) -> Option<Block> {
    let mut builder = SpanBuilder::default();
    collect_inline(element, false, &mut builder);
    let spans = builder.finish();
    if spans.is_empty() {
        return None;
    }
    Some(Block::Paragraph {
        align: parse_align(element.value()),
        spans,
    })
}

fn walk_blocks(element: ElementRef<'_>, blocks: &mut Vec<Block>) {
    for child in element.children().filter_map(ElementRef::wrap) {
        let name = child.value().name();
        if let Some(level) = heading_level(name) {
            blocks.extend(heading(child, level));
        } else if name == "p" {
            blocks.extend(paragraph(child));
        } else {
            walk_blocks(child, blocks);
        }
    }
}

/// Parse markup into blocks, in document order. Empty blocks are skipped.
pub fn parse_blocks(src: &str) -> Vec<Block> {
    let fragment = Html::parse_fragment(src);
    let mut blocks = Vec::new();
    walk_blocks(fragment.root_element(), &mut blocks);
    blocks
}

/// Alignment from `class="... center ..."` or `style="text-align: right"`.
/// Only the part of a class after its last `-` counts, so `ql-align-right`
/// and `text-center` both match.
fn parse_align(element: &Element) -> Align {
    for value in [element.attr("class"), element.attr("style")]
        .into_iter()
        .flatten()
    {
        let value = value.to_ascii_lowercase();
        for token in value.split(|c: char| c.is_whitespace() || c == ';' || c == ':') {
            let align = match token.rsplit('-').next().unwrap_or(token) {
                "center" => Align::Center,
                "right" => Align::Right,
                "justify" => Align::Justify,
                _ => continue,
            };
            return align;
        }
    }
    Align::Left
}

// ─── Plain text ─────────────────────────────────────────────────────

fn breaks_line(name: &str) -> bool {
    matches!(
        name,
        "p" | "br" | "div" | "li" | "tr" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
    )
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(el) = ElementRef::wrap(child) {
            let name = el.value().name();
            if matches!(name, "script" | "style") {
                continue;
            }
            let breaks = breaks_line(name);
            if breaks {
                out.push('\n');
            }
            collect_text(el, out);
            if breaks {
                out.push('\n');
            }
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
}

/// Readable plain text of any markup. Block boundaries and `<br>` become
/// line breaks, whitespace collapses within a line and blank lines are
/// dropped.
pub fn strip_tags(src: &str) -> String {
    let fragment = Html::parse_fragment(src);
    let mut raw = String::with_capacity(src.len());
    collect_text(fragment.root_element(), &mut raw);

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(s: &str) -> Span {
        Span::Plain(s.to_string())
    }

    fn bold(s: &str) -> Span {
        Span::Bold(s.to_string())
    }

    #[test]
    fn test_paragraph_with_bold_span() {
        let blocks = parse_blocks("<p>Hello <strong>World</strong>!</p>");
        assert_eq!(
            blocks,
            vec![Block::Paragraph {
                align: Align::Left,
                spans: vec![plain("Hello "), bold("World"), plain("!")],
            }]
        );
    }

    #[test]
    fn test_every_bold_span_is_kept() {
        let blocks = parse_blocks("<p><b>Due:</b> 1/1 and <strong>Total:</strong> $5</p>");
        let Block::Paragraph { spans, .. } = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(
            spans,
            &vec![bold("Due:"), plain(" 1/1 and "), bold("Total:"), plain(" $5")]
        );
    }

    #[test]
    fn test_document_order_and_headings() {
        let blocks = parse_blocks("<h2>Bill To</h2><p>Ada</p><h1>Invoice</h1>");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], Block::Heading { level: 2, text: "Bill To".to_string() });
        assert!(matches!(blocks[1], Block::Paragraph { .. }));
        assert_eq!(blocks[2], Block::Heading { level: 1, text: "Invoice".to_string() });
    }

    #[test]
    fn test_blocks_nested_in_containers() {
        let blocks = parse_blocks("<div><section><h3>Notes</h3><p>Net 30</p></section></div>");
        assert_eq!(blocks[0], Block::Heading { level: 3, text: "Notes".to_string() });
        assert_eq!(blocks[1], Block::Paragraph { align: Align::Left, spans: vec![plain("Net 30")] });
    }

    #[test]
    fn test_alignment_classes() {
        let cases = [
            (r#"<p class="center">x</p>"#, Align::Center),
            (r#"<p class="ql-align-right">x</p>"#, Align::Right),
            (r#"<p class='text-justify big'>x</p>"#, Align::Justify),
            (r#"<p style="text-align: center">x</p>"#, Align::Center),
            (r#"<p class="lead">x</p>"#, Align::Left),
            ("<p>x</p>", Align::Left),
        ];
        for (src, expected) in cases {
            let blocks = parse_blocks(src);
            assert!(
                matches!(&blocks[0], Block::Paragraph { align, .. } if *align == expected),
                "{}",
                src
            );
        }
    }

    #[test]
    fn test_greater_than_inside_attribute() {
        let blocks = parse_blocks(r#"<p class="center" title="a > b">Total</p>"#);
        assert_eq!(
            blocks,
            vec![Block::Paragraph {
                align: Align::Center,
                spans: vec![plain("Total")],
            }]
        );
    }

    #[test]
    fn test_whitespace_collapses() {
        let blocks = parse_blocks("<p>\n  Thank   you\n  for <em>your</em>\tbusiness  </p>");
        assert_eq!(
            blocks[0],
            Block::Paragraph {
                align: Align::Left,
                spans: vec![plain("Thank you for your business")],
            }
        );
    }

    #[test]
    fn test_line_break_and_entities() {
        let blocks = parse_blocks("<p>Tom &amp; Jerry<br/>12 &lt; 13&#33;</p>");
        assert_eq!(
            blocks[0],
            Block::Paragraph {
                align: Align::Left,
                spans: vec![plain("Tom & Jerry\n12 < 13!")],
            }
        );
    }

    #[test]
    fn test_nbsp_does_not_collapse() {
        let blocks = parse_blocks("<p>a&nbsp;&nbsp;b</p>");
        assert_eq!(blocks[0], Block::Paragraph { align: Align::Left, spans: vec![plain("a\u{a0}\u{a0}b")] });
    }

    #[test]
    fn test_empty_blocks_skipped() {
        assert!(parse_blocks("<p>  </p><h1></h1><p><br></p>").is_empty());
    }

    #[test]
    fn test_unrecognized_markup_yields_no_blocks() {
        assert!(parse_blocks("<div><span>Just text</span></div>").is_empty());
        assert!(parse_blocks("plain text only").is_empty());
    }

    #[test]
    fn test_implicit_paragraph_close() {
        let blocks = parse_blocks("<p>one<p>two</p>");
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_unclosed_tags_still_parse() {
        let blocks = parse_blocks("<h1>Invoice</h1><p>Total <b>$5");
        assert_eq!(
            blocks,
            vec![
                Block::Heading { level: 1, text: "Invoice".to_string() },
                Block::Paragraph { align: Align::Left, spans: vec![plain("Total "), bold("$5")] },
            ]
        );
    }

    #[test]
    fn test_less_than_in_text() {
        let blocks = parse_blocks("<p>a < b</p>");
        assert_eq!(blocks[0], Block::Paragraph { align: Align::Left, spans: vec![plain("a < b")] });
    }

    #[test]
    fn test_strip_tags() {
        let text = strip_tags("<div><h1>Invoice</h1><p>Hello <b>there</b></p><span>x &amp; y</span></div>");
        assert_eq!(text, "Invoice\nHello there\nx & y");
    }

    #[test]
    fn test_strip_tags_table_cells() {
        let text = strip_tags("<table><tr><td>INV-001</td><td>$5.00</td></tr><tr><td>Tile</td></tr></table>");
        assert_eq!(text, "INV-001$5.00\nTile");
    }

    #[test]
    fn test_strip_tags_skips_script() {
        assert_eq!(strip_tags("<p>shown</p><script>var x = 1;</script>"), "shown");
    }
}
