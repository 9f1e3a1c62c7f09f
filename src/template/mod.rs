//! Template expansion.
//!
//! Takes a template body with `{{scope.field}}` placeholders and
//! `{{#each projects}}` / `{{#each jobs}}` loop blocks, parses it into a
//! [`Node`] tree, and evaluates the tree against assembled [`InvoiceData`].
//!
//! Resolution rules:
//! - `invoice.*` and `customer.*` resolve everywhere, inside loops or not.
//! - `project.*` resolves inside a projects loop, `job.*` inside a jobs loop.
//! - A jobs loop iterates the jobs of the innermost project. Outside any
//!   projects loop it has no data and expands to nothing; so does a loop over
//!   an unknown collection.
//! - Tokens that do not resolve are emitted verbatim.
//!
//! Substituted values are HTML-escaped, since the expanded body is parsed as
//! markup afterwards. Template text itself is copied unchanged.

mod parser;

pub use parser::{parse, Node};

use tracing::debug;

use crate::assemble::{InvoiceData, ProjectData, Record};

/// The projects collection name in `{{#each projects}}`.
pub const PROJECTS: &str = "projects";
/// The jobs collection name in `{{#each jobs}}`.
pub const JOBS: &str = "jobs";

/// Evaluation context: the data plus the loop items currently in scope.
#[derive(Clone, Copy)]
struct EvalContext<'d> {
    data: &'d InvoiceData,
    project: Option<&'d ProjectData>,
    job: Option<&'d Record>,
}

impl<'d> EvalContext<'d> {
    fn new(data: &'d InvoiceData) -> Self {
        EvalContext {
            data,
            project: None,
            job: None,
        }
    }

    /// Resolve `scope.field` against the loop bindings, then global values.
    fn resolve(&self, path: &str) -> Option<&'d str> {
        let (scope, field) = path.split_once('.')?;
        match scope {
            "invoice" | "customer" => self.data.value(path),
            "project" => self.project?.fields.get(field),
            "job" => self.job?.get(field),
            _ => None,
        }
    }

    fn with_project(&self, project: &'d ProjectData) -> Self {
        EvalContext {
            project: Some(project),
            job: None,
            ..*self
        }
    }

    fn with_job(&self, job: &'d Record) -> Self {
        EvalContext {
            job: Some(job),
            ..*self
        }
    }
}

/// Expand a template body against invoice data.
pub fn expand(body: &str, data: &InvoiceData) -> String {
    let nodes = parse(body);
    evaluate(&nodes, data)
}

/// Evaluate parsed nodes against invoice data.
pub fn evaluate(nodes: &[Node], data: &InvoiceData) -> String {
    let mut out = String::new();
    evaluate_nodes(nodes, &EvalContext::new(data), &mut out);
    out
}

fn evaluate_nodes(nodes: &[Node], ctx: &EvalContext<'_>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Placeholder { path } => match ctx.resolve(path) {
                Some(value) => push_escaped(out, value),
                None => out.push_str(&Node::placeholder_token(path)),
            },
            Node::Each { collection, body } => evaluate_each(collection, body, ctx, out),
        }
    }
}

/// Append `value` with the characters markup would read as syntax escaped.
fn push_escaped(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

fn evaluate_each(collection: &str, body: &[Node], ctx: &EvalContext<'_>, out: &mut String) {
    match collection {
        PROJECTS => {
            for project in &ctx.data.projects {
                evaluate_nodes(body, &ctx.with_project(project), out);
            }
        }
        JOBS => {
            let Some(project) = ctx.project else {
                debug!("jobs loop outside a projects loop expands to nothing");
                return;
            };
            for job in &project.jobs {
                evaluate_nodes(body, &ctx.with_job(job), out);
            }
        }
        other => debug!(collection = other, "unknown loop collection expands to nothing"),
    }
}
