//! Structured error types for invoice generation.
//!
//! Only failures that happen before a document is opened cross the public
//! API: bad JSON input, a missing invoice, a failing data source, or an I/O
//! error while streaming bytes out. Markup problems are recovered inside the
//! renderer and never surface here.

use thiserror::Error;

/// The unified error type returned by all public invoicer API functions.
#[derive(Debug, Error)]
pub enum InvoicerError {
    /// JSON input failed to parse as an invoice store, invoice or config.
    #[error("{}", parse_message(.source, .hint))]
    Parse {
        source: serde_json::Error,
        hint: String,
    },

    /// No invoice matches the requested invoice number or id.
    #[error("Invoice '{key}' not found")]
    InvoiceNotFound { key: String },

    /// The data source collaborator failed to load the aggregate.
    #[error("Data source error: {0}")]
    Source(String),

    /// Writing the PDF byte stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn parse_message(source: &serde_json::Error, hint: &str) -> String {
    if hint.is_empty() {
        format!("Failed to parse input: {}", source)
    } else {
        format!("Failed to parse input: {}\n  Hint: {}", source, hint)
    }
}

impl From<serde_json::Error> for InvoicerError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the invoice schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input, is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        InvoicerError::Parse { source: e, hint }
    }
}
