//! Recursive-descent parser for the template grammar.
//!
//! ```text
//! template    := node*
//! node        := text | placeholder | each
//! placeholder := "{{" path "}}"
//! each        := "{{#each " name "}}" node* "{{/each}}"
//! ```
//!
//! Parsing never fails. Anything that does not form a complete construct
//! (an unterminated `{{`, an `{{#each}}` without its `{{/each}}`, a stray
//! `{{/each}}`) is kept as literal text.

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const EACH_OPEN: &str = "{{#each";
const EACH_CLOSE: &str = "{{/each}}";

/// A node of the parsed template.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, emitted unchanged.
    Text(String),
    /// `{{path}}`, e.g. `invoice.invoiceNumber`.
    Placeholder { path: String },
    /// `{{#each collection}} body {{/each}}`.
    Each { collection: String, body: Vec<Node> },
}

impl Node {
    /// The source text of a placeholder token.
    pub fn placeholder_token(path: &str) -> String {
        format!("{}{}{}", OPEN, path, CLOSE)
    }
}

/// Parse a template body into nodes.
pub fn parse(src: &str) -> Vec<Node> {
    let mut parser = Parser { src, pos: 0 };
    let (nodes, _) = parser.parse_nodes(0);
    nodes
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Parse nodes until EOF or, when `depth > 0`, the matching `{{/each}}`.
    /// Returns the nodes and whether a closing marker ended the sequence.
    fn parse_nodes(&mut self, depth: usize) -> (Vec<Node>, bool) {
        let mut nodes = Vec::new();

        loop {
            let rest = &self.src[self.pos..];
            let Some(rel) = rest.find(OPEN) else {
                push_text(&mut nodes, rest);
                self.pos = self.src.len();
                return (nodes, false);
            };

            let start = self.pos + rel;
            push_text(&mut nodes, &self.src[self.pos..start]);
            let tail = &self.src[start..];

            if tail.starts_with(EACH_CLOSE) {
                self.pos = start + EACH_CLOSE.len();
                if depth > 0 {
                    return (nodes, true);
                }
                push_text(&mut nodes, EACH_CLOSE);
                continue;
            }

            let Some(close_rel) = tail.find(CLOSE) else {
                push_text(&mut nodes, tail);
                self.pos = self.src.len();
                return (nodes, false);
            };
            let end = start + close_rel;
            let inner = &self.src[start + OPEN.len()..end];

            // "{{ {{invoice.x}}": the first braces are literal
            if inner.contains(OPEN) {
                push_text(&mut nodes, OPEN);
                self.pos = start + OPEN.len();
                continue;
            }

            if let Some(name) = each_name(tail, inner) {
                let marker = &self.src[start..end + CLOSE.len()];
                self.pos = end + CLOSE.len();
                let (body, closed) = self.parse_nodes(depth + 1);
                if closed {
                    nodes.push(Node::Each {
                        collection: name.to_string(),
                        body,
                    });
                    continue;
                }
                // Unclosed: the open marker stays literal, EOF reached.
                push_text(&mut nodes, marker);
                nodes.extend(body);
                return (nodes, false);
            }

            nodes.push(Node::Placeholder {
                path: inner.to_string(),
            });
            self.pos = end + CLOSE.len();
        }
    }
}

/// If the token starting at `tail` is `{{#each name}}`, return `name`.
fn each_name<'s>(tail: &str, inner: &'s str) -> Option<&'s str> {
    if !tail.starts_with(EACH_OPEN) {
        return None;
    }
    let after = &inner["#each".len()..];
    if !after.starts_with(char::is_whitespace) {
        return None;
    }
    let name = after.trim();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Text(prev)) = nodes.last_mut() {
        prev.push_str(text);
    } else {
        nodes.push(Node::Text(text.to_string()));
    }
}
