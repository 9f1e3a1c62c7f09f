//! # Markup Renderer
//!
//! Turns expanded template markup into draw instructions on a
//! [`PageSurface`]. [`RenderContext`] owns the surface for the whole pass, so
//! the cursor, current page and current font are threaded through every
//! drawing call rather than living in shared state.
//!
//! Markup that renders nothing at all (no headings or paragraphs) is drawn
//! again as tag-stripped plain text so a document always comes out.

use tracing::{debug, info, warn};

use crate::assemble::InvoiceData;
use crate::config::{BlockOrder, RenderConfig};
use crate::font::FontKey;
use crate::layout::{Align, DrawOp, PageSurface, TextRun};
use crate::markup::{self, Block, Span};

/// Lines drawn when no default invoice template exists.
pub const MISSING_TEMPLATE_MESSAGE: [&str; 3] = [
    "No default invoice template",
    "Create an invoice template and mark it as the default",
    "to generate invoices.",
];

/// Job table columns and their widths in points.
pub const JOB_COLUMNS: [(&str, f64); 5] = [
    ("Project", 100.0),
    ("Job", 100.0),
    ("Description", 160.0),
    ("Status", 70.0),
    ("Price", 70.0),
];

const JOB_TABLE_TITLE: &str = "Job Details";

/// Vertical gap under each table row.
const ROW_GAP: f64 = 4.0;

/// X position of each job table column, accumulated from `left`.
pub fn column_offsets(left: f64) -> [f64; 5] {
    let mut offsets = [0.0; 5];
    let mut x = left;
    for (offset, (_, width)) in offsets.iter_mut().zip(JOB_COLUMNS) {
        *offset = x;
        x += width;
    }
    offsets
}

pub struct RenderContext<'a> {
    surface: &'a mut PageSurface,
    config: &'a RenderConfig,
}

impl<'a> RenderContext<'a> {
    pub fn new(surface: &'a mut PageSurface, config: &'a RenderConfig) -> Self {
        Self { surface, config }
    }

    fn body_font(&self) -> FontKey {
        FontKey::new(&self.config.font_family, false)
    }

    fn run(&self, text: &str, bold: bool, size: f64, align: Align, continued: bool) -> TextRun {
        TextRun {
            text: text.to_string(),
            font: FontKey::new(&self.config.font_family, bold),
            size,
            align,
            continued,
        }
    }

    /// Render expanded markup, falling back to plain text when it draws
    /// nothing.
    pub fn render_markup(&mut self, src: &str) {
        let blocks = markup::parse_blocks(src);
        debug!(blocks = blocks.len(), "rendering markup");
        self.render_blocks(&blocks);
        if self.surface.at_origin() {
            warn!("markup produced no output, rendering as plain text");
            self.render_plain_text(&markup::strip_tags(src));
        }
    }

    fn render_blocks(&mut self, blocks: &[Block]) {
        match self.config.block_order {
            BlockOrder::Document => {
                for block in blocks {
                    self.render_block(block);
                }
            }
            BlockOrder::HeadingsFirst => {
                for level in 1..=3 {
                    for block in blocks {
                        if matches!(block, Block::Heading { level: l, .. } if *l == level) {
                            self.render_block(block);
                        }
                    }
                }
                for block in blocks {
                    if matches!(block, Block::Paragraph { .. }) {
                        self.render_block(block);
                    }
                }
            }
        }
    }

    fn render_block(&mut self, block: &Block) {
        match block {
            Block::Heading { level, text } => self.render_heading(*level, text),
            Block::Paragraph { align, spans } => self.render_paragraph(*align, spans),
        }
    }

    /// Bold heading at its level's size, then back to the body font.
    pub fn render_heading(&mut self, level: u8, text: &str) {
        let size = self.config.heading_size(level);
        let run = self.run(text, true, size, Align::Left, false);
        self.surface.apply(DrawOp::Text(run));
        self.surface.apply(DrawOp::Font {
            font: self.body_font(),
            size: self.config.font_size,
        });
        self.surface.apply(DrawOp::MoveDown(self.config.heading_spacing));
    }

    /// One run per span; all but the last continue on the same line.
    pub fn render_paragraph(&mut self, align: Align, spans: &[Span]) {
        let Some(last) = spans.len().checked_sub(1) else {
            return;
        };
        for (i, span) in spans.iter().enumerate() {
            let run = self.run(span.text(), span.is_bold(), self.config.font_size, align, i < last);
            self.surface.apply(DrawOp::Text(run));
        }
        self.surface.apply(DrawOp::MoveDown(self.config.paragraph_spacing));
    }

    /// The whole text as one left-aligned body block.
    pub fn render_plain_text(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        let run = self.run(text, false, self.config.font_size, Align::Left, false);
        self.surface.apply(DrawOp::Text(run));
    }

    /// The fixed message drawn instead of a template.
    pub fn render_missing_template(&mut self) {
        info!("no default invoice template, rendering fallback message");
        for line in MISSING_TEMPLATE_MESSAGE {
            let run = self.run(line, false, self.config.font_size, Align::Center, false);
            self.surface.apply(DrawOp::Text(run));
        }
    }

    /// The job listing: a title, a bold header row, then one row per job.
    pub fn render_job_table(&mut self, data: &InvoiceData) {
        let threshold = self.config.break_threshold();
        let size = self.config.table_font_size;
        let offsets = column_offsets(self.surface.left());
        let table_right = offsets[4] + JOB_COLUMNS[4].1;

        self.render_heading(2, JOB_TABLE_TITLE);

        let header = JOB_COLUMNS.map(|(name, _)| name.to_string());
        self.render_row(&header, true, &offsets, threshold);
        self.surface.apply(DrawOp::Rule {
            from_x: offsets[0],
            to_x: table_right,
        });
        self.surface.apply(DrawOp::Advance(ROW_GAP));

        let mut rows = 0;
        for project in &data.projects {
            let project_name = project.fields.get("name").unwrap_or_default();
            for job in &project.jobs {
                let cells = [
                    project_name.to_string(),
                    job.get("title").unwrap_or_default().to_string(),
                    job.get("description").unwrap_or_default().to_string(),
                    job.get("status").unwrap_or_default().to_string(),
                    job.get("price").unwrap_or_default().to_string(),
                ];
                self.render_row(&cells, false, &offsets, threshold);
                rows += 1;
            }
        }
        debug!(rows, size, pages = self.surface.page_count(), "job table rendered");
    }

    /// Draw one table row. The row height is the tallest wrapped cell; if
    /// the row would end past `threshold` it moves to a new page first.
    fn render_row(&mut self, cells: &[String; 5], bold: bool, offsets: &[f64; 5], threshold: f64) {
        let size = self.config.table_font_size;
        let font = FontKey::new(&self.config.font_family, bold);
        let row_height = cells
            .iter()
            .zip(JOB_COLUMNS)
            .map(|(text, (_, width))| self.surface.measure_box(text, &font, size, width))
            .fold(0.0_f64, f64::max);

        if self.surface.cursor_y() + row_height > threshold
            && self.surface.cursor_y() > self.surface.top()
        {
            debug!(y = self.surface.cursor_y(), threshold, "job table page break");
            self.surface.apply(DrawOp::PageBreak);
        }

        for (i, text) in cells.iter().enumerate() {
            let (_, width) = JOB_COLUMNS[i];
            let align = if i == 4 { Align::Right } else { Align::Left };
            let run = self.run(text, bold, size, align, false);
            self.surface.apply(DrawOp::TextBox {
                run,
                x: offsets[i],
                width,
            });
        }
        self.surface.apply(DrawOp::Advance(row_height + ROW_GAP));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutPage;

    fn render(markup: &str, config: &RenderConfig) -> PageSurface {
        let mut surface = PageSurface::new(config);
        RenderContext::new(&mut surface, config).render_markup(markup);
        surface
    }

    fn text_runs(surface: &PageSurface) -> Vec<TextRun> {
        surface
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text(run) => Some(run.clone()),
                _ => None,
            })
            .collect()
    }

    fn page_texts(page: &LayoutPage) -> Vec<String> {
        page.elements
            .iter()
            .filter_map(|e| match &e.draw {
                crate::layout::DrawCommand::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn project(name: &str, jobs: &[(&str, &str)]) -> crate::model::Project {
        crate::model::Project {
            name: name.to_string(),
            jobs: jobs
                .iter()
                .map(|(title, description)| crate::model::Job {
                    title: title.to_string(),
                    description: Some(description.to_string()),
                    price: Some(10.0),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    fn data_with(projects: Vec<crate::model::Project>) -> InvoiceData {
        let invoice: crate::model::Invoice = serde_json::from_value(serde_json::json!({
            "invoiceNumber": "INV-001",
            "issueDate": "2024-01-15",
            "dueDate": "2024-02-14",
            "status": "draft",
            "totalAmount": 0,
            "taxRate": 0,
            "taxAmount": 0,
            "customer": { "name": "Ada" },
        }))
        .unwrap();
        let invoice = crate::model::Invoice { projects, ..invoice };
        InvoiceData::assemble(&invoice, &RenderConfig::default().format_options())
    }

    #[test]
    fn test_paragraph_runs_continue() {
        let surface = render("<p>Hello <strong>World</strong>!</p>", &RenderConfig::default());
        let runs = text_runs(&surface);

        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].text, "Hello ");
        assert!(runs[0].continued && !runs[0].font.is_bold());
        assert_eq!(runs[1].text, "World");
        assert!(runs[1].continued && runs[1].font.is_bold());
        assert_eq!(runs[2].text, "!");
        assert!(!runs[2].continued && !runs[2].font.is_bold());
        assert!(runs.iter().all(|r| r.align == Align::Left));
        assert!(matches!(surface.ops().last(), Some(DrawOp::MoveDown(l)) if *l == 1.0));
    }

    #[test]
    fn test_heading_ops() {
        let surface = render("<h1>Invoice</h1>", &RenderConfig::default());
        let ops = surface.ops();

        assert!(matches!(&ops[0], DrawOp::Text(r) if r.size == 20.0 && r.font.is_bold()));
        assert!(matches!(&ops[1], DrawOp::Font { font, size } if !font.is_bold() && *size == 12.0));
        assert!(matches!(ops[2], DrawOp::MoveDown(l) if l == 0.5));
    }

    #[test]
    fn test_heading_sizes() {
        let surface = render("<h2>B</h2><h3>C</h3>", &RenderConfig::default());
        let sizes: Vec<f64> = text_runs(&surface).iter().map(|r| r.size).collect();
        assert_eq!(sizes, vec![16.0, 14.0]);
    }

    #[test]
    fn test_document_order_is_default() {
        let surface = render("<p>body</p><h1>Title</h1>", &RenderConfig::default());
        let texts: Vec<String> = text_runs(&surface).into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["body", "Title"]);
    }

    #[test]
    fn test_headings_first_order() {
        let config = RenderConfig {
            block_order: BlockOrder::HeadingsFirst,
            ..Default::default()
        };
        let surface = render("<p>body</p><h3>c</h3><h1>a</h1><h2>b</h2>", &config);
        let texts: Vec<String> = text_runs(&surface).into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["a", "b", "c", "body"]);
    }

    #[test]
    fn test_unrecognized_markup_falls_back_to_plain_text() {
        let surface = render("<div>Thanks for <span>your</span> business</div>", &RenderConfig::default());
        let runs = text_runs(&surface);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Thanks for your business");
        assert!(!surface.at_origin());
    }

    #[test]
    fn test_unclosed_markup_renders_blocks() {
        let surface = render("<h1>Invoice</h1><p>Total <b>$5", &RenderConfig::default());
        let runs = text_runs(&surface);
        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["Invoice", "Total ", "$5"]);
        assert!(runs[2].font.is_bold() && !runs[2].continued);
    }

    #[test]
    fn test_attribute_with_angle_bracket_keeps_alignment() {
        let surface = render(r#"<p class="center" title="a > b">Total</p>"#, &RenderConfig::default());
        let runs = text_runs(&surface);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Total");
        assert_eq!(runs[0].align, Align::Center);
    }

    #[test]
    fn test_empty_markup_draws_nothing() {
        let surface = render("", &RenderConfig::default());
        assert!(surface.ops().is_empty());
    }

    #[test]
    fn test_missing_template_message() {
        let config = RenderConfig::default();
        let mut surface = PageSurface::new(&config);
        RenderContext::new(&mut surface, &config).render_missing_template();
        let runs = text_runs(&surface);

        assert_eq!(runs.len(), 3);
        for (run, line) in runs.iter().zip(MISSING_TEMPLATE_MESSAGE) {
            assert_eq!(run.text, line);
            assert_eq!(run.align, Align::Center);
        }
    }

    #[test]
    fn test_column_offsets_accumulate() {
        assert_eq!(column_offsets(50.0), [50.0, 150.0, 250.0, 410.0, 480.0]);
    }

    #[test]
    fn test_job_table_rows() {
        let config = RenderConfig::default();
        let data = data_with(vec![
            project("Kitchen", &[("Tile", "Floor tile"), ("Paint", "Two coats")]),
            project("Bath", &[]),
        ]);
        let mut surface = PageSurface::new(&config);
        RenderContext::new(&mut surface, &config).render_job_table(&data);

        let boxes: Vec<(String, f64)> = surface
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::TextBox { run, x, .. } => Some((run.text.clone(), *x)),
                _ => None,
            })
            .collect();
        // Header plus two job rows.
        assert_eq!(boxes.len(), 15);
        assert_eq!(boxes[0], ("Project".to_string(), 50.0));
        assert_eq!(boxes[5], ("Kitchen".to_string(), 50.0));
        assert_eq!(boxes[7], ("Floor tile".to_string(), 250.0));
        assert_eq!(boxes[9], ("$10.00".to_string(), 480.0));
        assert!(surface.ops().iter().any(|op| matches!(op, DrawOp::Rule { .. })));

        let pages = surface.finish();
        assert!(page_texts(&pages[0]).contains(&"Job Details".to_string()));
    }

    #[test]
    fn test_job_table_breaks_at_threshold() {
        let config = RenderConfig {
            page_break_threshold: Some(200.0),
            ..Default::default()
        };
        let jobs: Vec<(&str, &str)> = (0..20).map(|_| ("Job", "Short")).collect();
        let data = data_with(vec![project("Big", &jobs)]);
        let mut surface = PageSurface::new(&config);
        RenderContext::new(&mut surface, &config).render_job_table(&data);

        assert!(surface.page_count() > 1);
        let breaks = surface
            .ops()
            .iter()
            .filter(|op| matches!(op, DrawOp::PageBreak))
            .count();
        assert_eq!(breaks, surface.page_count() - 1);
        assert!(surface.cursor_y() <= 200.0);
    }

    #[test]
    fn test_tall_description_advances_further() {
        let config = RenderConfig::default();
        let long = "A long description that needs several lines inside its narrow column to fit";
        let short_data = data_with(vec![project("P", &[("Job", "Short")])]);
        let long_data = data_with(vec![project("P", &[("Job", long)])]);

        let mut short_surface = PageSurface::new(&config);
        RenderContext::new(&mut short_surface, &config).render_job_table(&short_data);
        let mut long_surface = PageSurface::new(&config);
        RenderContext::new(&mut long_surface, &config).render_job_table(&long_data);

        assert!(long_surface.cursor_y() > short_surface.cursor_y());
    }
}
