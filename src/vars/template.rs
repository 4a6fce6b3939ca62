//! Template evaluation
//!
//! Templates are plain text with `{{ ... }}` actions. An action is one of:
//!
//! - `{{ .key }}` or `{{ .outer.inner }}` - a value from the namespace
//! - `{{ "text" }}` or `` {{ `text` }} `` - a string literal (useful to emit `{{`)
//! - `{{/* comment */}}` - renders nothing
//!
//! A `-` directly inside the delimiters (`{{- .x -}}`) trims the whitespace
//! on that side of the action.

use crate::error::{InterpolationError, InterpolationResult};
use crate::vars::{Namespace, Value};
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

fn field_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\.[A-Za-z0-9_-]+)+$").expect("field pattern is a valid regex")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Field(Vec<String>),
}

/// A parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parse template source
    pub fn parse(source: &str) -> InterpolationResult<Self> {
        let mut nodes = Vec::new();
        let mut rest = source;
        let mut trim_next = false;

        while let Some(open) = rest.find(OPEN) {
            let body_start = open + OPEN.len();
            let close = rest[body_start..]
                .find(CLOSE)
                .map(|i| body_start + i)
                .ok_or_else(|| {
                    InterpolationError::InvalidSyntax(format!(
                        "unclosed action in {:?}",
                        source
                    ))
                })?;

            let mut body = &rest[body_start..close];
            let trim_left = has_trim_marker(body.strip_prefix('-'), true);
            if trim_left {
                body = &body[1..];
            }
            let trim_right = has_trim_marker(body.strip_suffix('-'), false);
            if trim_right {
                body = &body[..body.len() - 1];
            }

            let mut text = &rest[..open];
            if trim_next {
                text = text.trim_start();
            }
            if trim_left {
                text = text.trim_end();
            }
            push_text(&mut nodes, text);

            if let Some(node) = parse_action(body.trim())? {
                nodes.push(node);
            }

            rest = &rest[close + CLOSE.len()..];
            trim_next = trim_right;
        }

        let tail = if trim_next { rest.trim_start() } else { rest };
        push_text(&mut nodes, tail);

        Ok(Template { nodes })
    }

    /// Key paths referenced by this template, in order of appearance
    pub fn references(&self) -> impl Iterator<Item = &[String]> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Field(path) => Some(path.as_slice()),
            Node::Text(_) => None,
        })
    }

    /// Render against a namespace
    pub fn render(&self, ns: &Namespace) -> InterpolationResult<String> {
        self.render_tracked(ns).map(|(out, _)| out)
    }

    /// Render against a namespace, also returning the byte ranges of the
    /// output that were inserted from the namespace
    pub fn render_tracked(
        &self,
        ns: &Namespace,
    ) -> InterpolationResult<(String, Vec<Range<usize>>)> {
        let mut out = String::new();
        let mut inserted = Vec::new();
        for node in &self.nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Field(path) => {
                    let start = out.len();
                    out.push_str(lookup(ns, path)?);
                    if out.len() > start {
                        inserted.push(start..out.len());
                    }
                }
            }
        }
        Ok((out, inserted))
    }
}

/// Parse and render `source` against `ns` in one step
pub fn render(source: &str, ns: &Namespace) -> InterpolationResult<String> {
    if !source.contains(OPEN) {
        return Ok(source.to_string());
    }
    Template::parse(source)?.render(ns)
}

/// Render every string of a list
pub fn render_list(list: &[String], ns: &Namespace) -> InterpolationResult<Vec<String>> {
    list.iter().map(|s| render(s, ns)).collect()
}

fn lookup<'a>(ns: &'a Namespace, path: &[String]) -> InterpolationResult<&'a str> {
    let dotted = format!(".{}", path.join("."));
    if path.is_empty() {
        return Err(InterpolationError::NotScalar(".".to_string()));
    }
    match ns.lookup(path) {
        Some(Value::Text(text)) => Ok(text),
        Some(Value::Map(_)) => Err(InterpolationError::NotScalar(dotted)),
        None => Err(InterpolationError::UndefinedVariable(dotted)),
    }
}

// A trim marker is a `-` separated from the action body by whitespace.
fn has_trim_marker(stripped: Option<&str>, left: bool) -> bool {
    match stripped {
        Some(body) => {
            let next = if left {
                body.chars().next()
            } else {
                body.chars().last()
            };
            next.map_or(false, char::is_whitespace)
        }
        None => false,
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

fn parse_action(body: &str) -> InterpolationResult<Option<Node>> {
    if body.starts_with("/*") && body.ends_with("*/") && body.len() >= 4 {
        return Ok(None);
    }
    if body == "." {
        return Ok(Some(Node::Field(Vec::new())));
    }
    if field_pattern().is_match(body) {
        let path = body[1..].split('.').map(str::to_string).collect();
        return Ok(Some(Node::Field(path)));
    }
    if let Some(raw) = body.strip_prefix('`') {
        return match raw.strip_suffix('`') {
            Some(inner) if !inner.contains('`') => Ok(Some(Node::Text(inner.to_string()))),
            _ => Err(InterpolationError::InvalidSyntax(format!(
                "unterminated raw string in action {:?}",
                body
            ))),
        };
    }
    if body.starts_with('"') {
        return unquote(body).map(|s| Some(Node::Text(s)));
    }
    if body.is_empty() {
        return Err(InterpolationError::InvalidSyntax(
            "missing value for action".to_string(),
        ));
    }
    Err(InterpolationError::InvalidSyntax(format!(
        "unsupported action {:?}",
        body
    )))
}

fn unquote(body: &str) -> InterpolationResult<String> {
    let invalid = || InterpolationError::InvalidSyntax(format!("malformed string {}", body));

    let mut chars = body.chars().skip(1);
    let mut out = String::new();
    loop {
        match chars.next().ok_or_else(invalid)? {
            '"' => break,
            '\\' => match chars.next().ok_or_else(invalid)? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                c @ ('"' | '\\') => out.push(c),
                _ => return Err(invalid()),
            },
            c => out.push(c),
        }
    }
    if chars.next().is_some() {
        return Err(invalid());
    }
    Ok(out)
}
