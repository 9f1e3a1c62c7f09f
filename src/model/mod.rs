//! # Invoice Model
//!
//! The input representation for the generation pipeline: an invoice
//! aggregate (invoice, customer, projects, jobs) and the stored templates.
//!
//! Field names follow the JSON the business application produces, which is
//! camelCase with ORM-style capitalized association names (`Customer`,
//! `Projects`, `Jobs`). Decimal columns frequently arrive as strings, so
//! every numeric field accepts either a JSON number or a numeric string.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// An invoice with its eagerly-loaded customer, projects and jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub invoice_number: String,
    #[serde(deserialize_with = "de_date")]
    pub issue_date: NaiveDate,
    #[serde(deserialize_with = "de_date")]
    pub due_date: NaiveDate,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "de_number")]
    pub total_amount: f64,
    #[serde(default, deserialize_with = "de_number")]
    pub tax_rate: f64,
    #[serde(default, deserialize_with = "de_number")]
    pub tax_amount: f64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(alias = "Customer")]
    pub customer: Customer,
    #[serde(default, alias = "Projects")]
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Falls back to `address` when absent.
    #[serde(default)]
    pub billing_address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "de_opt_number")]
    pub budget: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de_opt_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, alias = "Jobs")]
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Absent prices count as zero.
    #[serde(default, deserialize_with = "de_opt_number")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de_opt_date")]
    pub end_date: Option<NaiveDate>,
}

impl Job {
    pub fn price_or_zero(&self) -> f64 {
        self.price.unwrap_or(0.0)
    }
}

impl Invoice {
    /// Sum of every job price across every project.
    pub fn subtotal(&self) -> f64 {
        self.projects
            .iter()
            .flat_map(|p| p.jobs.iter())
            .map(Job::price_or_zero)
            .sum()
    }
}

/// Which kind of document a template renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Invoice,
    Estimate,
    #[serde(other)]
    Other,
}

/// A stored template body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: TemplateKind,
    pub body: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Pick the default template for a kind: the first one flagged `isDefault`.
pub fn select_default(templates: &[Template], kind: TemplateKind) -> Option<&Template> {
    templates.iter().find(|t| t.kind == kind && t.is_default)
}

/// Document info written into the PDF.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

impl Metadata {
    pub fn for_invoice(invoice: &Invoice, author: Option<&str>) -> Self {
        Metadata {
            title: Some(format!("Invoice {}", invoice.invoice_number)),
            author: author.map(str::to_string),
            subject: Some(format!("Invoice for {}", invoice.customer.name)),
        }
    }
}

// ─── Lenient deserializers ──────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

fn number_from(raw: NumberOrString) -> Result<f64, String> {
    match raw {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid numeric string '{}'", s)),
    }
}

fn de_number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let raw = NumberOrString::deserialize(d)?;
    number_from(raw).map_err(serde::de::Error::custom)
}

fn de_opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    match Option::<NumberOrString>::deserialize(d)? {
        None => Ok(None),
        Some(NumberOrString::String(s)) if s.trim().is_empty() => Ok(None),
        Some(raw) => number_from(raw).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Parse `YYYY-MM-DD` or an RFC 3339 timestamp into a calendar date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_utc().date())
}

fn de_date<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
    let s = String::deserialize(d)?;
    parse_date(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", s)))
}

fn de_opt_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
    match Option::<String>::deserialize(d)? {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_date(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", s))),
    }
}
