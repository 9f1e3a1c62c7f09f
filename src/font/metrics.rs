//! Advance widths for the standard PDF fonts, in 1/1000 em units.
//!
//! Tables cover printable ASCII (0x20..=0x7E) and come from the Adobe AFM
//! files. Characters outside the table use the font's default width.

/// Width table and vertical metrics of one standard font face.
pub struct StandardFontMetrics {
    widths: &'static [u16; 95],
    default_width: u16,
    pub ascender: i16,
    pub descender: i16,
}

impl StandardFontMetrics {
    /// Advance width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let cp = ch as u32;
        let w = if (0x20..=0x7E).contains(&cp) {
            self.widths[(cp - 0x20) as usize]
        } else {
            self.default_width
        };
        w as f64 * font_size / 1000.0
    }

    /// Width of a string in points.
    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|c| self.char_width(c, font_size)).sum()
    }
}

#[rustfmt::skip]
static HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 333,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

static COURIER_WIDTHS: [u16; 95] = [600; 95];

pub static HELVETICA: StandardFontMetrics = StandardFontMetrics {
    widths: &HELVETICA_WIDTHS,
    default_width: 556,
    ascender: 718,
    descender: -207,
};

pub static HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
    widths: &HELVETICA_BOLD_WIDTHS,
    default_width: 556,
    ascender: 718,
    descender: -207,
};

pub static COURIER: StandardFontMetrics = StandardFontMetrics {
    widths: &COURIER_WIDTHS,
    default_width: 600,
    ascender: 629,
    descender: -157,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_width() {
        assert!((HELVETICA.char_width(' ', 12.0) - 3.336).abs() < 0.001);
    }

    #[test]
    fn test_table_edges() {
        assert_eq!(HELVETICA.char_width('~', 1000.0), 584.0);
        assert_eq!(HELVETICA_BOLD.char_width('@', 1000.0), 975.0);
        assert_eq!(COURIER.char_width('W', 1000.0), 600.0);
    }

    #[test]
    fn test_non_ascii_uses_default() {
        assert_eq!(HELVETICA.char_width('é', 1000.0), 556.0);
    }
}
