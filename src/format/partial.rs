// SPDX-License-Identifier: MIT OR Apache-2.0

//! Templates that tolerate missing fields.

use std::collections::BTreeSet;

use super::pipeline::{FormatStage, Rendering};
use crate::log_record::{EXTRA_KEY, LogRecord};

/// Default template: level, logger name, message, then leftover context.
pub const DEFAULT_FORMAT: &str = "{levelname} {name}: {message} {_extra}";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field { name: String, spec: Option<String> },
}

/// Renders the message line from a `{field}` template.
///
/// A field is looked up first among the record's attributes (`name`, `levelname`,
/// `message`, `module`, `pathname`, `lineno`, `thread`, `relative`), then among its
/// context fields.  Fields that exist in neither render as an empty string rather
/// than failing the record.
///
/// `{_extra}` renders every context field the template does not name elsewhere, as
/// `key=repr(value)` pairs.  For a dotted name such as `{user.id}` the part before
/// the first dot counts as named.
///
/// `{{` and `}}` are literal braces.  A spec after `:` may give an alignment
/// (`<`, `>`, `^`) and a width; other specs are ignored.
///
/// ```
/// use contextlog::format::PartialFormatter;
/// use contextlog::{Level, LogRecord, fields};
///
/// let record = LogRecord::new(Level::Info, "app", "started")
///     .with_fields(fields! { ctx = "test", port = 80 });
/// let f = PartialFormatter::new("{levelname} {message} port={port} user={user} [{_extra}]");
/// assert_eq!(f.format(&record), r#"INFO started port=80 user= [ctx="test"]"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialFormatter {
    template: String,
    segments: Vec<Segment>,
    named: BTreeSet<String>,
}

impl PartialFormatter {
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let segments = parse(&template);
        let named = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Field { name, .. } => Some(head(name).to_owned()),
                Segment::Literal(_) => None,
            })
            .collect();
        PartialFormatter {
            template,
            segments,
            named,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Renders the message line for `record`.
    pub fn format(&self, record: &LogRecord) -> String {
        let mut out = String::new();
        // where the text written by the latest literal begins
        let mut literal_start = 0;
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(text) => {
                    literal_start = out.len();
                    out.push_str(text);
                }
                Segment::Field { name, spec } => {
                    let value = self.lookup(record, name);
                    let last = i + 1 == self.segments.len();
                    if last && name == EXTRA_KEY && spec.is_none() && value.is_empty() {
                        //drop the separator in front of an empty trailing `{_extra}`
                        let kept = out.trim_end().len().max(literal_start);
                        out.truncate(kept);
                        break;
                    }
                    match spec {
                        Some(spec) => pad(&mut out, &value, spec),
                        None => out.push_str(&value),
                    }
                    literal_start = out.len();
                }
            }
        }
        out
    }

    fn lookup(&self, record: &LogRecord, name: &str) -> String {
        if name == EXTRA_KEY {
            return record
                .fields()
                .filtered(|key| !self.named.contains(key))
                .to_string();
        }
        if let Some(attribute) = record.attribute(name) {
            return attribute;
        }
        record
            .fields()
            .get(name)
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}

impl Default for PartialFormatter {
    fn default() -> Self {
        PartialFormatter::new(DEFAULT_FORMAT)
    }
}

impl FormatStage for PartialFormatter {
    fn render(&self, record: &LogRecord, rendering: &mut Rendering) {
        rendering.message = self.format(record);
    }
}

fn head(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

fn parse(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut field = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    field.push(c);
                }
                if !closed {
                    //unterminated: keep as text
                    literal.push('{');
                    literal.push_str(&field);
                    continue;
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                let (name, spec) = match field.split_once(':') {
                    Some((name, spec)) => (name.trim().to_owned(), Some(spec.to_owned())),
                    None => (field.trim().to_owned(), None),
                };
                segments.push(Segment::Field { name, spec });
            }
            c => literal.push(c),
        }
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

fn pad(out: &mut String, value: &str, spec: &str) {
    let (align, width) = match spec.chars().next() {
        Some(a @ ('<' | '>' | '^')) => (a, &spec[1..]),
        _ => ('<', spec),
    };
    let Ok(width) = width.parse::<usize>() else {
        out.push_str(value);
        return;
    };
    let fill = width.saturating_sub(value.chars().count());
    let (before, after) = match align {
        '>' => (fill, 0),
        '^' => (fill / 2, fill - fill / 2),
        _ => (0, fill),
    };
    out.extend(std::iter::repeat_n(' ', before));
    out.push_str(value);
    out.extend(std::iter::repeat_n(' ', after));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Level, fields};

    fn record() -> LogRecord {
        LogRecord::new(Level::Warning, "app::db", "slow query")
            .with_fields(fields! { ctx = "test", ms = 1200, user = "ann" })
            .with_location("src/db.rs", 42)
    }

    #[test]
    fn attributes_and_fields() {
        let f = PartialFormatter::new("{pathname}:{lineno} {levelname} {name} {message} ms={ms}");
        assert_eq!(
            f.format(&record()),
            "src/db.rs:42 WARNING app::db slow query ms=1200"
        );
    }

    #[test]
    fn missing_fields_render_empty() {
        let f = PartialFormatter::new("[{request_id}] {message} {also.missing}|");
        assert_eq!(f.format(&record()), "[] slow query |");
    }

    #[test]
    fn extra_holds_unconsumed_fields() {
        let f = PartialFormatter::new("{message} user={user} {_extra}");
        assert_eq!(
            f.format(&record()),
            r#"slow query user=ann ctx="test" ms=1200"#
        );
        // a field named after `{_extra}` still counts as consumed
        let f = PartialFormatter::new("{_extra} / {ms}");
        assert_eq!(f.format(&record()), r#"ctx="test" user="ann" / 1200"#);
    }

    #[test]
    fn extra_is_a_pure_view() {
        let f = PartialFormatter::new("{message} {_extra}");
        let record = record();
        let first = f.format(&record);
        let second = f.format(&record);
        assert_eq!(first, second);
        assert_eq!(record.fields().len(), 3);
    }

    #[test]
    fn dotted_name_consumes_head() {
        let f = PartialFormatter::new("{ctx.anything} {_extra}");
        assert_eq!(f.format(&record()), r#" ms=1200 user="ann""#);
    }

    #[test]
    fn escapes_and_unterminated() {
        let f = PartialFormatter::new("{{literal}} {message} {oops");
        assert_eq!(f.format(&record()), "{literal} slow query {oops");
    }

    #[test]
    fn alignment() {
        let f = PartialFormatter::new("|{levelname:<8}|{ms:>6}|{user:^7}|{message:x}|");
        assert_eq!(
            f.format(&record()),
            "|WARNING |  1200|  ann  |slow query|"
        );
    }

    #[test]
    fn empty_extra_trims_trailing_space() {
        let record = LogRecord::new(Level::Info, "n", "plain");
        assert_eq!(PartialFormatter::default().format(&record), "INFO n: plain");
    }

    #[test]
    fn other_trailing_space_is_kept() {
        let record = LogRecord::new(Level::Info, "n", "padded  ");
        let f = PartialFormatter::new("{levelname} {message}");
        assert_eq!(f.format(&record), "INFO padded  ");
        let f = PartialFormatter::new("{message:<10} ");
        assert_eq!(f.format(&record), "padded     ");
        // only the separator goes, never the message before it
        let f = PartialFormatter::new("{message} {_extra}");
        assert_eq!(f.format(&record), "padded  ");
        let f = PartialFormatter::new("{message}{_extra}");
        assert_eq!(f.format(&record), "padded  ");
    }
}
