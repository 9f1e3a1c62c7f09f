//! Render configuration.
//!
//! Every knob has a default, so an empty JSON object `{}` is a valid config.
//! The defaults reproduce the layout the invoices have always had: US Letter,
//! 50pt margins, 12pt Helvetica body text.

use serde::{Deserialize, Serialize};

use crate::error::InvoicerError;
use crate::format::FormatOptions;

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum PageSize {
    A4,
    #[default]
    Letter,
    Legal,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Edge values (top, right, bottom, left) used for page margins.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }
}

/// Order in which markup blocks are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockOrder {
    /// One pass over blocks in source order.
    #[default]
    Document,
    /// All h1 blocks, then h2, then h3, then paragraphs. Matches invoices
    /// generated by earlier releases.
    HeadingsFirst,
}

/// Configuration for a single invoice render.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    pub page_size: PageSize,
    pub margin: Edges,
    /// Body font family. Helvetica and Courier are available; anything else
    /// falls back to Helvetica.
    pub font_family: String,
    pub font_size: f64,
    /// Font sizes for h1, h2 and h3.
    pub heading_sizes: [f64; 3],
    /// Line height as a multiple of the font size.
    pub line_height: f64,
    /// Lines moved down after each heading.
    pub heading_spacing: f64,
    /// Lines moved down after each paragraph.
    pub paragraph_spacing: f64,
    /// Cursor position past which a job table row starts a new page.
    /// Defaults to the page height minus the bottom margin.
    pub page_break_threshold: Option<f64>,
    pub block_order: BlockOrder,
    /// Append a job listing table after the template body.
    pub job_table: bool,
    pub table_font_size: f64,
    /// chrono format string for dates.
    pub date_format: String,
    pub author: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::Letter,
            margin: Edges::uniform(50.0),
            font_family: "Helvetica".to_string(),
            font_size: 12.0,
            heading_sizes: [20.0, 16.0, 14.0],
            line_height: 1.2,
            heading_spacing: 0.5,
            paragraph_spacing: 1.0,
            page_break_threshold: None,
            block_order: BlockOrder::Document,
            job_table: false,
            table_font_size: 10.0,
            date_format: FormatOptions::DEFAULT_DATE_FORMAT.to_string(),
            author: None,
        }
    }
}

impl RenderConfig {
    pub fn from_json(json: &str) -> Result<Self, InvoicerError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Font size for a heading level (1-3); other levels clamp.
    pub fn heading_size(&self, level: u8) -> f64 {
        let idx = (level.clamp(1, 3) - 1) as usize;
        self.heading_sizes[idx]
    }

    pub fn break_threshold(&self) -> f64 {
        let (_, height) = self.page_size.dimensions();
        self.page_break_threshold
            .unwrap_or(height - self.margin.bottom)
    }

    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            date_format: self.date_format.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let cfg = RenderConfig::from_json("{}").unwrap();
        assert_eq!(cfg.font_size, 12.0);
        assert_eq!(cfg.page_size.dimensions(), (612.0, 792.0));
        assert_eq!(cfg.block_order, BlockOrder::Document);
    }

    #[test]
    fn test_partial_override() {
        let cfg = RenderConfig::from_json(
            r#"{ "pageSize": "A4", "blockOrder": "headingsFirst", "jobTable": true }"#,
        )
        .unwrap();
        assert_eq!(cfg.page_size.dimensions(), (595.28, 841.89));
        assert_eq!(cfg.block_order, BlockOrder::HeadingsFirst);
        assert!(cfg.job_table);
        assert_eq!(cfg.margin.left, 50.0);
    }

    #[test]
    fn test_break_threshold_default_and_override() {
        let mut cfg = RenderConfig::default();
        assert_eq!(cfg.break_threshold(), 742.0);
        cfg.page_break_threshold = Some(700.0);
        assert_eq!(cfg.break_threshold(), 700.0);
    }

    #[test]
    fn test_heading_size_clamps() {
        let cfg = RenderConfig::default();
        assert_eq!(cfg.heading_size(1), 20.0);
        assert_eq!(cfg.heading_size(3), 14.0);
        assert_eq!(cfg.heading_size(6), 14.0);
    }
}
