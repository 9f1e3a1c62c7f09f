//! # Font Management
//!
//! Invoices are set in the standard PDF fonts, which need no embedding.
//! Helvetica and Courier are available in regular and bold; any other family
//! falls back to Helvetica.

pub mod metrics;

pub use metrics::StandardFontMetrics;

/// A font family + weight pair as requested by the renderer.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontKey {
    pub family: String,
    pub weight: u32,
}

impl FontKey {
    pub fn new(family: &str, bold: bool) -> Self {
        FontKey {
            family: family.to_string(),
            weight: if bold { 700 } else { 400 },
        }
    }

    pub fn is_bold(&self) -> bool {
        self.weight >= 600
    }
}

/// The standard PDF fonts this engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    Courier,
    CourierBold,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
        }
    }

    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica => &metrics::HELVETICA,
            Self::HelveticaBold => &metrics::HELVETICA_BOLD,
            Self::Courier | Self::CourierBold => &metrics::COURIER,
        }
    }
}

/// Shared font context used by layout and PDF serialization.
#[derive(Debug, Default, Clone, Copy)]
pub struct FontContext;

impl FontContext {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a font key, snapping weight to regular/bold and falling back
    /// to Helvetica for unknown families.
    pub fn resolve(&self, key: &FontKey) -> StandardFont {
        let bold = key.is_bold();
        match (key.family.to_ascii_lowercase().as_str(), bold) {
            ("courier", false) => StandardFont::Courier,
            ("courier", true) => StandardFont::CourierBold,
            (_, false) => StandardFont::Helvetica,
            (_, true) => StandardFont::HelveticaBold,
        }
    }

    pub fn char_width(&self, ch: char, key: &FontKey, font_size: f64) -> f64 {
        self.resolve(key).metrics().char_width(ch, font_size)
    }

    /// Measure the width of a string in points.
    pub fn measure_string(&self, text: &str, key: &FontKey, font_size: f64) -> f64 {
        self.resolve(key).metrics().measure_string(text, font_size)
    }

    /// Distance from the top of a line box to the baseline.
    pub fn ascent(&self, key: &FontKey, font_size: f64) -> f64 {
        self.resolve(key).metrics().ascender as f64 * font_size / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_context_bold_wider() {
        let ctx = FontContext::new();
        let regular = ctx.char_width('b', &FontKey::new("Helvetica", false), 12.0);
        let bold = ctx.char_width('b', &FontKey::new("Helvetica", true), 12.0);
        assert!(bold > regular, "Bold b should be wider than regular b");
    }

    #[test]
    fn test_font_context_fallback() {
        let ctx = FontContext::new();
        let key = FontKey::new("Comic Sans", true);
        assert_eq!(ctx.resolve(&key), StandardFont::HelveticaBold);
    }

    #[test]
    fn test_courier_is_monospaced() {
        let ctx = FontContext::new();
        let key = FontKey::new("Courier", false);
        assert_eq!(ctx.resolve(&key).pdf_name(), "Courier");
        assert!((ctx.measure_string("iiii", &key, 10.0) - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_weight_snapping() {
        let ctx = FontContext::new();
        let semi = FontKey { family: "Helvetica".to_string(), weight: 600 };
        assert_eq!(ctx.resolve(&semi), StandardFont::HelveticaBold);
    }
}
