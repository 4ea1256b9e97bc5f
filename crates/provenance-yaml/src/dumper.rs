//! Writing wrapped trees as block YAML annotated with provenance.

use crate::error::DumpError;
use provenance_core::{ProvenanceStep, Scalar, ValueKind, WrappedValue};
use std::fmt::Write;
use std::path::Path;
use yaml_rust2::Yaml;

/// Where provenance comments are placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommentStyle {
    /// After the value, on the same line
    #[default]
    Trailing,
    /// On a line of its own above the value
    Leading,
}

/// Renders wrapped trees as YAML.
///
/// With comments enabled, every node is annotated with its current
/// provenance step, for example `# env.yaml:3:9 | env | merge`.
#[derive(Debug, Clone)]
pub struct ProvenanceDumper {
    include_provenance_comments: bool,
    comment_style: CommentStyle,
    indent: usize,
}

impl Default for ProvenanceDumper {
    fn default() -> Self {
        Self {
            include_provenance_comments: true,
            comment_style: CommentStyle::default(),
            indent: 2,
        }
    }
}

impl ProvenanceDumper {
    pub fn new(include_provenance_comments: bool) -> Self {
        Self {
            include_provenance_comments,
            ..Self::default()
        }
    }

    pub fn with_comment_style(mut self, comment_style: CommentStyle) -> Self {
        self.comment_style = comment_style;
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent.max(1);
        self
    }

    /// Render `value` as a YAML document.
    pub fn dumps(&self, value: &WrappedValue) -> String {
        let mut out = String::new();
        match value.kind() {
            ValueKind::Mapping(entries) if !entries.is_empty() => {
                self.leading_comment(&mut out, value, 0);
                self.write_mapping(&mut out, value, 0);
            }
            ValueKind::Sequence(items) if !items.is_empty() => {
                self.leading_comment(&mut out, value, 0);
                self.write_sequence(&mut out, value, 0);
            }
            _ => self.write_line(&mut out, 0, &inline_value(value), value),
        }
        out
    }

    /// Render `value` and write it to `path`.
    pub fn dump(&self, value: &WrappedValue, path: impl AsRef<Path>) -> Result<(), DumpError> {
        let path = path.as_ref();
        std::fs::write(path, self.dumps(value)).map_err(|source| DumpError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Wrote annotated YAML");
        Ok(())
    }

    fn write_mapping(&self, out: &mut String, value: &WrappedValue, depth: usize) {
        for (key, child) in value.entries() {
            let key = render_string(key);
            if is_block(child) {
                self.write_line(out, depth, &format!("{}:", key), child);
                self.write_block(out, child, depth + 1);
            } else {
                self.write_line(out, depth, &format!("{}: {}", key, inline_value(child)), child);
            }
        }
    }

    fn write_sequence(&self, out: &mut String, value: &WrappedValue, depth: usize) {
        for item in value.iter() {
            if is_block(item) {
                self.write_line(out, depth, "-", item);
                self.write_block(out, item, depth + 1);
            } else {
                self.write_line(out, depth, &format!("- {}", inline_value(item)), item);
            }
        }
    }

    fn write_block(&self, out: &mut String, value: &WrappedValue, depth: usize) {
        if value.is_mapping() {
            self.write_mapping(out, value, depth);
        } else {
            self.write_sequence(out, value, depth);
        }
    }

    fn write_line(&self, out: &mut String, depth: usize, text: &str, node: &WrappedValue) {
        let pad = " ".repeat(depth * self.indent);
        match self.comment(node) {
            Some(comment) if self.comment_style == CommentStyle::Trailing => {
                let _ = writeln!(out, "{}{}  # {}", pad, text, comment);
            }
            Some(comment) => {
                let _ = writeln!(out, "{}# {}", pad, comment);
                let _ = writeln!(out, "{}{}", pad, text);
            }
            None => {
                let _ = writeln!(out, "{}{}", pad, text);
            }
        }
    }

    fn leading_comment(&self, out: &mut String, node: &WrappedValue, depth: usize) {
        if let Some(comment) = self.comment(node) {
            let _ = writeln!(out, "{}# {}", " ".repeat(depth * self.indent), comment);
        }
    }

    fn comment(&self, node: &WrappedValue) -> Option<String> {
        if !self.include_provenance_comments {
            return None;
        }
        Some(describe_step(node.provenance().current()))
    }
}

/// One-line description of a step: location, category and operation,
/// separated by ` | `.
pub fn describe_step(step: &ProvenanceStep) -> String {
    let mut parts = Vec::with_capacity(3);
    if !step.location().is_unknown() {
        parts.push(step.location().to_string());
    }
    match step.subcategory() {
        Some(subcategory) => parts.push(format!("{}/{}", step.category(), subcategory)),
        None => parts.push(step.category().to_string()),
    }
    if let Some(operation) = step.modified_by() {
        parts.push(operation.to_string());
    }
    parts.join(" | ")
}

fn is_block(value: &WrappedValue) -> bool {
    !value.is_scalar() && !value.is_empty()
}

/// Text of a value that fits on one line: scalars and empty containers.
fn inline_value(value: &WrappedValue) -> String {
    match value.kind() {
        ValueKind::Scalar(scalar) => render_scalar(scalar),
        ValueKind::Sequence(_) => "[]".to_string(),
        ValueKind::Mapping(_) => "{}".to_string(),
    }
}

fn render_scalar(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Null => "null".to_string(),
        Scalar::Boolean(b) => b.to_string(),
        Scalar::Integer(i) => i.to_string(),
        Scalar::Float(f) if f.is_nan() => ".nan".to_string(),
        Scalar::Float(f) if f.is_infinite() => {
            if *f > 0.0 { ".inf" } else { "-.inf" }.to_string()
        }
        Scalar::Float(f) => format!("{:?}", f),
        Scalar::String(s) => render_string(s),
    }
}

/// A string as a plain scalar when that reads back as the same string,
/// otherwise double-quoted.
fn render_string(s: &str) -> String {
    if needs_quotes(s) {
        quote(s)
    } else {
        s.to_string()
    }
}

fn needs_quotes(s: &str) -> bool {
    let Some(first) = s.chars().next() else {
        return true;
    };
    if !matches!(Yaml::from_str(s), Yaml::String(_)) {
        return true;
    }
    if "-?:,[]{}#&*!|>'\"%@`".contains(first) || first.is_whitespace() {
        return true;
    }
    if s.ends_with(char::is_whitespace) || s.ends_with(':') {
        return true;
    }
    s.contains(": ") || s.contains(" #") || s.chars().any(char::is_control)
}

fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            c if c.is_control() => {
                let _ = write!(quoted, "\\u{:04X}", c as u32);
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
