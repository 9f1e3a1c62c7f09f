//! Data assembly.
//!
//! Flattens an invoice aggregate into the values a template can reference:
//! scalar `invoice.*` and `customer.*` values, plus the repeatable project and
//! job collections. Everything here is already formatted for display.
//!
//! Loading the aggregate is the job of an [`InvoiceSource`]. [`JsonStore`] is
//! the file-backed source used by the CLI and tests.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use crate::error::InvoicerError;
use crate::format::{self, FormatOptions};
use crate::model::{select_default, Invoice, Job, Project, Template, TemplateKind};

/// Formatted field values of one collection item, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, String>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    fn set(&mut self, field: &str, value: impl Into<String>) {
        self.fields.insert(field.to_string(), value.into());
    }
}

/// One project and its jobs, ready for loop expansion.
#[derive(Debug, Clone, Default)]
pub struct ProjectData {
    pub fields: Record,
    pub jobs: Vec<Record>,
}

/// The flattened invoice: global values plus the projects collection.
#[derive(Debug, Clone, Default)]
pub struct InvoiceData {
    values: BTreeMap<String, String>,
    pub projects: Vec<ProjectData>,
    pub subtotal: f64,
}

impl InvoiceData {
    pub fn assemble(invoice: &Invoice, opts: &FormatOptions) -> Self {
        let subtotal = invoice.subtotal();
        let customer = &invoice.customer;

        let mut values = BTreeMap::new();
        let mut put = |key: &str, value: String| {
            values.insert(key.to_string(), value);
        };

        put("invoice.invoiceNumber", invoice.invoice_number.clone());
        put("invoice.issueDate", format::date(invoice.issue_date, opts));
        put("invoice.dueDate", format::date(invoice.due_date, opts));
        put("invoice.status", format::status(&invoice.status));
        put("invoice.totalAmount", format::money(invoice.total_amount));
        put("invoice.taxRate", format::percent(invoice.tax_rate));
        put("invoice.taxAmount", format::money(invoice.tax_amount));
        put("invoice.subtotal", format::money(subtotal));
        put("invoice.notes", invoice.notes.clone().unwrap_or_default());

        put("customer.name", customer.name.clone());
        put("customer.email", customer.email.clone().unwrap_or_default());
        put("customer.phone", customer.phone.clone().unwrap_or_default());
        put("customer.address", customer.address.clone().unwrap_or_default());
        put(
            "customer.billingAddress",
            customer
                .billing_address
                .clone()
                .or_else(|| customer.address.clone())
                .unwrap_or_default(),
        );

        let projects = invoice
            .projects
            .iter()
            .map(|p| project_data(p, opts))
            .collect::<Vec<_>>();

        debug!(
            invoice = %invoice.invoice_number,
            projects = projects.len(),
            subtotal,
            "assembled invoice data"
        );

        InvoiceData {
            values,
            projects,
            subtotal,
        }
    }

    /// Look up a global value such as `invoice.subtotal`.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

fn project_data(project: &Project, opts: &FormatOptions) -> ProjectData {
    let mut fields = Record::default();
    fields.set("name", project.name.clone());
    fields.set("description", project.description.clone().unwrap_or_default());
    fields.set("status", project.status.clone().unwrap_or_default());
    fields.set("budget", format::opt_money(project.budget));
    fields.set("startDate", format::opt_date(project.start_date, opts));
    fields.set("endDate", format::opt_date(project.end_date, opts));

    ProjectData {
        fields,
        jobs: project.jobs.iter().map(|j| job_record(j, opts)).collect(),
    }
}

fn job_record(job: &Job, opts: &FormatOptions) -> Record {
    let mut rec = Record::default();
    rec.set("title", job.title.clone());
    rec.set("description", job.description.clone().unwrap_or_default());
    rec.set("status", job.status.clone().unwrap_or_default());
    rec.set("price", format::money(job.price_or_zero()));
    rec.set("startDate", format::opt_date(job.start_date, opts));
    rec.set("endDate", format::opt_date(job.end_date, opts));
    rec
}

// ─── Data sources ───────────────────────────────────────────────────

/// The persistence collaborator that supplies invoice aggregates and
/// templates.
pub trait InvoiceSource {
    /// Load an invoice with its customer, projects and jobs. `key` is an
    /// invoice number or a numeric id.
    fn load_invoice(&self, key: &str) -> Result<Invoice, InvoicerError>;

    /// The default template of a kind, if one is flagged.
    fn default_template(&self, kind: TemplateKind) -> Result<Option<Template>, InvoicerError>;
}

/// An [`InvoiceSource`] backed by a JSON document of the form
/// `{ "invoices": [...], "templates": [...] }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonStore {
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default)]
    pub templates: Vec<Template>,
}

impl JsonStore {
    pub fn from_json(json: &str) -> Result<Self, InvoicerError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl InvoiceSource for JsonStore {
    fn load_invoice(&self, key: &str) -> Result<Invoice, InvoicerError> {
        self.invoices
            .iter()
            .find(|inv| {
                inv.invoice_number == key || inv.id.is_some_and(|id| id.to_string() == key)
            })
            .cloned()
            .ok_or_else(|| InvoicerError::InvoiceNotFound {
                key: key.to_string(),
            })
    }

    fn default_template(&self, kind: TemplateKind) -> Result<Option<Template>, InvoicerError> {
        Ok(select_default(&self.templates, kind).cloned())
    }
}
