//! # Invoicer
//!
//! Turns an invoice (customer, projects and their jobs) plus an HTML-ish
//! invoice template into a paginated PDF.
//!
//! Templates reference invoice values with `{{invoice.totalAmount}}`-style
//! placeholders and repeat fragments per project and per job with
//! `{{#each projects}} ... {{#each jobs}} ... {{/each}} ... {{/each}}`. The
//! expanded markup is a small HTML subset (headings, paragraphs, bold spans,
//! alignment classes) drawn with the standard PDF fonts.
//!
//! ## Architecture
//!
//! ```text
//! InvoiceSource (JSON store, ...)
//!       ↓
//!   [assemble]  - Flatten the invoice into formatted values + collections
//!       ↓
//!   [template]  - Parse placeholders/loops, evaluate against the data
//!       ↓
//!   [markup]    - Parse the expanded HTML subset into blocks and spans
//!       ↓
//!   [render]    - Blocks → draw ops on a paginated surface
//!       ↓
//!   [layout]    - Wrap, align and paginate against a vertical cursor
//!       ↓
//!   [pdf]       - Serialize to PDF bytes
//! ```
//!
//! With no default template the template stages are skipped and a fixed
//! message is drawn instead.

pub mod assemble;
pub mod config;
pub mod error;
pub mod font;
pub mod format;
pub mod layout;
pub mod markup;
pub mod model;
pub mod pdf;
pub mod render;
pub mod template;
pub mod text;

use std::io;

use tracing::debug;

use assemble::{InvoiceData, InvoiceSource};
use config::RenderConfig;
use error::InvoicerError;
use layout::PageSurface;
use model::{Invoice, Metadata, TemplateKind};
use pdf::PdfWriter;
use render::RenderContext;

/// Expand a template body against an invoice, returning the markup.
pub fn expand_invoice_template(invoice: &Invoice, body: &str, config: &RenderConfig) -> String {
    let data = InvoiceData::assemble(invoice, &config.format_options());
    template::expand(body, &data)
}

/// Draw an invoice onto a fresh surface. With `template` absent only the
/// missing-template message is drawn.
pub fn draw_invoice(invoice: &Invoice, template: Option<&str>, config: &RenderConfig) -> PageSurface {
    let mut surface = PageSurface::new(config);
    let mut ctx = RenderContext::new(&mut surface, config);

    match template {
        Some(body) => {
            let data = InvoiceData::assemble(invoice, &config.format_options());
            let markup = template::expand(body, &data);
            debug!(bytes = markup.len(), "template expanded");
            ctx.render_markup(&markup);
            if config.job_table {
                ctx.render_job_table(&data);
            }
        }
        None => ctx.render_missing_template(),
    }

    debug!(pages = surface.page_count(), "invoice drawn");
    surface
}

/// Render an invoice to PDF bytes.
///
/// This is the primary entry point. Rendering never fails: markup problems
/// fall back to plain text and a missing template draws a fixed message.
pub fn render_invoice(invoice: &Invoice, template: Option<&str>, config: &RenderConfig) -> Vec<u8> {
    let pages = draw_invoice(invoice, template, config).finish();
    let metadata = Metadata::for_invoice(invoice, config.author.as_deref());
    PdfWriter::new().write(&pages, &metadata)
}

/// Render an invoice and write the PDF to `out`.
pub fn render_invoice_to<W: io::Write>(
    invoice: &Invoice,
    template: Option<&str>,
    config: &RenderConfig,
    out: &mut W,
) -> Result<(), InvoicerError> {
    let pages = draw_invoice(invoice, template, config).finish();
    let metadata = Metadata::for_invoice(invoice, config.author.as_deref());
    PdfWriter::new().write_to(&pages, &metadata, out)
}

/// Load an invoice and its default template from `source` and write the
/// PDF to `out`. Loading errors are returned before anything is written.
pub fn generate_invoice_pdf<S, W>(
    source: &S,
    key: &str,
    config: &RenderConfig,
    out: &mut W,
) -> Result<(), InvoicerError>
where
    S: InvoiceSource + ?Sized,
    W: io::Write,
{
    let invoice = source.load_invoice(key)?;
    let template = source.default_template(TemplateKind::Invoice)?;
    debug!(
        invoice = %invoice.invoice_number,
        template = template.as_ref().and_then(|t| t.name.as_deref()).unwrap_or("<none>"),
        "generating invoice pdf"
    );
    render_invoice_to(&invoice, template.as_ref().map(|t| t.body.as_str()), config, out)
}

/// Render an invoice described as JSON to PDF bytes.
pub fn render_json(
    invoice_json: &str,
    template: Option<&str>,
    config: &RenderConfig,
) -> Result<Vec<u8>, InvoicerError> {
    let invoice: Invoice = serde_json::from_str(invoice_json)?;
    Ok(render_invoice(&invoice, template, config))
}
