//! Display formatting for placeholder values.

use chrono::NaiveDate;

/// Shown for absent dates and budgets.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone)]
pub struct FormatOptions {
    pub date_format: String,
}

impl FormatOptions {
    /// US locale short date, e.g. `1/15/2024`.
    pub const DEFAULT_DATE_FORMAT: &'static str = "%-m/%-d/%Y";
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            date_format: Self::DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

/// `1234.5` → `$1234.50`
pub fn money(value: f64) -> String {
    // `{:.2}` alone rounds ties to even; round half away from zero first.
    let cents = (value * 100.0).round() / 100.0;
    // -0.0 prints as "-0.00"
    let cents = if cents == 0.0 { 0.0 } else { cents };
    format!("${:.2}", cents)
}

/// `8` → `8%`, `8.25` → `8.25%`
pub fn percent(value: f64) -> String {
    format!("{}%", value)
}

pub fn status(value: &str) -> String {
    value.to_uppercase()
}

pub fn date(value: NaiveDate, opts: &FormatOptions) -> String {
    value.format(&opts.date_format).to_string()
}

pub fn opt_date(value: Option<NaiveDate>, opts: &FormatOptions) -> String {
    match value {
        Some(d) => date(d, opts),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn opt_money(value: Option<f64>) -> String {
    match value {
        Some(v) => money(v),
        None => NOT_AVAILABLE.to_string(),
    }
}
