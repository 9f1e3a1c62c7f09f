//! # Invoicer CLI
//!
//! Usage:
//!   invoicer render store.json --invoice INV-001 -o invoice.pdf
//!   invoicer expand store.json --invoice INV-001
//!   invoicer example > store.json
//!
//! A store is a JSON document `{ "invoices": [...], "templates": [...] }`;
//! `-` reads it from stdin.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use invoicer::assemble::{InvoiceSource, JsonStore};
use invoicer::config::RenderConfig;
use invoicer::model::TemplateKind;

/// Render invoice PDFs from templates.
#[derive(Parser, Debug)]
#[command(name = "invoicer", version, about, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "INVOICER_VERBOSE")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render an invoice to PDF.
    Render {
        /// Store JSON file, or `-` for stdin.
        store: PathBuf,

        /// Invoice number or id.
        #[arg(short, long)]
        invoice: String,

        /// Output PDF path.
        #[arg(short, long, default_value = "invoice.pdf")]
        output: PathBuf,

        /// Render config JSON file.
        #[arg(short, long, env = "INVOICER_CONFIG")]
        config: Option<PathBuf>,

        /// Append a table listing every job.
        #[arg(long)]
        job_table: bool,
    },
    /// Print the expanded template markup for an invoice.
    Expand {
        /// Store JSON file, or `-` for stdin.
        store: PathBuf,

        /// Invoice number or id.
        #[arg(short, long)]
        invoice: String,

        /// Render config JSON file (date format).
        #[arg(short, long, env = "INVOICER_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Print an example store.
    Example,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Render {
            store,
            invoice,
            output,
            config,
            job_table,
        } => {
            let store = load_store(&store)?;
            let mut config = load_config(config.as_deref())?;
            config.job_table |= job_table;

            let file = File::create(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            let mut out = BufWriter::new(file);
            invoicer::generate_invoice_pdf(&store, &invoice, &config, &mut out)
                .with_context(|| format!("Failed to render invoice '{}'", invoice))?;
            out.flush()?;
            info!(path = %output.display(), "wrote invoice pdf");
        }
        Command::Expand {
            store,
            invoice,
            config,
        } => {
            let store = load_store(&store)?;
            let config = load_config(config.as_deref())?;
            let inv = store.load_invoice(&invoice)?;
            match store.default_template(TemplateKind::Invoice)? {
                Some(template) => {
                    let markup = invoicer::expand_invoice_template(&inv, &template.body, &config);
                    println!("{}", markup);
                }
                None => anyhow::bail!("No default invoice template in store"),
            }
        }
        Command::Example => print!("{}", example_store_json()),
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_store(path: &Path) -> Result<JsonStore> {
    let json = read_input(path)?;
    JsonStore::from_json(&json).with_context(|| format!("Invalid store {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<RenderConfig> {
    match path {
        Some(path) => {
            let json = read_input(path)?;
            RenderConfig::from_json(&json)
                .with_context(|| format!("Invalid config {}", path.display()))
        }
        None => Ok(RenderConfig::default()),
    }
}

fn example_store_json() -> &'static str {
    r##"{
  "invoices": [
    {
      "id": 1,
      "invoiceNumber": "INV-2024-001",
      "issueDate": "2024-03-01",
      "dueDate": "2024-03-31",
      "status": "sent",
      "totalAmount": 1620.0,
      "taxRate": 8,
      "taxAmount": 120.0,
      "notes": "Payment due within 30 days.",
      "customer": {
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "phone": "555-0100",
        "address": "12 Analytical Way, London"
      },
      "projects": [
        {
          "name": "Kitchen Remodel",
          "description": "Full kitchen renovation",
          "status": "in_progress",
          "budget": 5000,
          "startDate": "2024-01-10",
          "jobs": [
            { "title": "Demolition", "description": "Remove old cabinets and counters", "status": "completed", "price": 600 },
            { "title": "Tile", "description": "Backsplash and floor tile", "status": "completed", "price": 900 }
          ]
        },
        {
          "name": "Bathroom",
          "status": "planned",
          "jobs": []
        }
      ]
    }
  ],
  "templates": [
    {
      "name": "Standard invoice",
      "type": "invoice",
      "isDefault": true,
      "body": "<h1>Invoice {{invoice.invoiceNumber}}</h1><p class=\"right\">Issued {{invoice.issueDate}}, due {{invoice.dueDate}}</p><h2>Bill To</h2><p>{{customer.name}}<br>{{customer.billingAddress}}<br>{{customer.email}}</p>{{#each projects}}<h3>{{project.name}}</h3><p>{{project.description}}</p>{{#each jobs}}<p><strong>{{job.title}}</strong> {{job.description}}: {{job.price}}</p>{{/each}}{{/each}}<p>Subtotal: <strong>{{invoice.subtotal}}</strong></p><p>Tax ({{invoice.taxRate}}): {{invoice.taxAmount}}</p><p>Total: <strong>{{invoice.totalAmount}}</strong></p><p class=\"center\">{{invoice.notes}}</p>"
    }
  ]
}
"##
}
