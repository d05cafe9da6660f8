// datadag/src/template.rs

//! Date-relative URL templates.
//!
//! A template is literal text with `{{ expr }}` placeholders. Each expression
//! starts from the run's logical date and pipes it through filters:
//!
//! ```text
//! https://example.org/{{ run_date | months_ago(1) | format("%Y") }}/data.csv
//! https://example.org/Terms{{ run_date | format("%Y%m") }}.zip
//! ```
//!
//! | source / filter   | input | output | meaning                                |
//! |-------------------|-------|--------|----------------------------------------|
//! | `run_date`        |       | date   | logical date of the run                |
//! | `ds`              |       | text   | logical date as `%Y-%m-%d`             |
//! | `days_ago(n)`     | date  | date   | subtract `n` days                      |
//! | `months_ago(n)`   | date  | date   | subtract `n` months, clamped to month end |
//! | `years_ago(n)`    | date  | date   | subtract `n` years, clamped to month end  |
//! | `format("fmt")`   | date  | text   | chrono strftime formatting             |
//! | `lower`, `upper`  | text  | text   | case mapping                           |
//!
//! Templates are parsed once when the pipeline is built, so syntax errors
//! surface at registration. Rendering happens per run.

use crate::error::{DagError, DagResult};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Days, Months, Utc};
use std::fmt::Write;

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
  source: String,
  segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
  Literal(String),
  Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Expr {
  source: Source,
  filters: Vec<Filter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
  RunDate,
  Ds,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Filter {
  DaysAgo(u32),
  MonthsAgo(u32),
  YearsAgo(u32),
  Format(String),
  Lower,
  Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
  Date,
  Text,
}

enum Value {
  Date(DateTime<Utc>),
  Text(String),
}

impl UrlTemplate {
  /// Parses `source`, validating every placeholder.
  pub fn parse(source: &str) -> DagResult<Self> {
    let mut segments = Vec::new();
    let mut rest = source;

    while let Some(open) = rest.find("{{") {
      if open > 0 {
        segments.push(Segment::Literal(rest[..open].to_string()));
      }
      let after_open = &rest[open + 2..];
      let close = after_open
        .find("}}")
        .ok_or_else(|| template_error(source, "unterminated '{{' placeholder"))?;
      let expr = parse_expr(source, after_open[..close].trim())?;
      segments.push(Segment::Expr(expr));
      rest = &after_open[close + 2..];
    }
    if !rest.is_empty() {
      segments.push(Segment::Literal(rest.to_string()));
    }

    Ok(Self {
      source: source.to_string(),
      segments,
    })
  }

  pub fn as_str(&self) -> &str {
    &self.source
  }

  /// True when the template has no placeholders.
  pub fn is_static(&self) -> bool {
    self.segments.iter().all(|s| matches!(s, Segment::Literal(_)))
  }

  /// Produces the final URL for a run with the given logical date.
  pub fn render(&self, logical_date: DateTime<Utc>) -> DagResult<String> {
    let mut out = String::with_capacity(self.source.len());
    for segment in &self.segments {
      match segment {
        Segment::Literal(text) => out.push_str(text),
        Segment::Expr(expr) => match self.eval(expr, logical_date)? {
          Value::Text(text) => out.push_str(&text),
          Value::Date(date) => self.write_date(&mut out, date, DEFAULT_DATE_FORMAT)?,
        },
      }
    }
    Ok(out)
  }

  fn eval(&self, expr: &Expr, logical_date: DateTime<Utc>) -> DagResult<Value> {
    let mut value = match expr.source {
      Source::RunDate => Value::Date(logical_date),
      Source::Ds => {
        let mut text = String::new();
        self.write_date(&mut text, logical_date, DEFAULT_DATE_FORMAT)?;
        Value::Text(text)
      }
    };

    // Kinds were checked at parse time; a mismatch here would be a parser bug.
    for filter in &expr.filters {
      value = match (filter, value) {
        (Filter::DaysAgo(n), Value::Date(d)) => Value::Date(
          d.checked_sub_days(Days::new(u64::from(*n)))
            .ok_or_else(|| template_error(&self.source, "date out of range"))?,
        ),
        (Filter::MonthsAgo(n), Value::Date(d)) => Value::Date(
          d.checked_sub_months(Months::new(*n))
            .ok_or_else(|| template_error(&self.source, "date out of range"))?,
        ),
        (Filter::YearsAgo(n), Value::Date(d)) => {
          let months = n
            .checked_mul(12)
            .ok_or_else(|| template_error(&self.source, "year offset too large"))?;
          Value::Date(
            d.checked_sub_months(Months::new(months))
              .ok_or_else(|| template_error(&self.source, "date out of range"))?,
          )
        }
        (Filter::Format(fmt), Value::Date(d)) => {
          let mut text = String::new();
          self.write_date(&mut text, d, fmt)?;
          Value::Text(text)
        }
        (Filter::Lower, Value::Text(t)) => Value::Text(t.to_lowercase()),
        (Filter::Upper, Value::Text(t)) => Value::Text(t.to_uppercase()),
        (filter, _) => {
          return Err(template_error(
            &self.source,
            &format!("filter {:?} applied to a value of the wrong kind", filter),
          ))
        }
      };
    }
    Ok(value)
  }

  fn write_date(&self, out: &mut String, date: DateTime<Utc>, fmt: &str) -> DagResult<()> {
    write!(out, "{}", date.format(fmt)).map_err(|_| template_error(&self.source, "date formatting failed"))
  }
}

impl std::fmt::Display for UrlTemplate {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.source)
  }
}

fn template_error(template: &str, message: &str) -> DagError {
  DagError::TemplateError {
    template: template.to_string(),
    message: message.to_string(),
  }
}

fn parse_expr(template: &str, text: &str) -> DagResult<Expr> {
  let mut parts = split_pipes(text).into_iter();
  let source = match parts.next().map(str::trim) {
    Some("run_date") => Source::RunDate,
    Some("ds") => Source::Ds,
    Some("") | None => return Err(template_error(template, "empty placeholder")),
    Some(other) => {
      return Err(template_error(
        template,
        &format!("unknown value '{}', expected 'run_date' or 'ds'", other),
      ))
    }
  };

  let mut kind = match source {
    Source::RunDate => Kind::Date,
    Source::Ds => Kind::Text,
  };
  let mut filters = Vec::new();
  for part in parts {
    let filter = parse_filter(template, part.trim())?;
    let (expects, produces) = match &filter {
      Filter::DaysAgo(_) | Filter::MonthsAgo(_) | Filter::YearsAgo(_) => (Kind::Date, Kind::Date),
      Filter::Format(_) => (Kind::Date, Kind::Text),
      Filter::Lower | Filter::Upper => (Kind::Text, Kind::Text),
    };
    if kind != expects {
      return Err(template_error(
        template,
        &format!("filter '{}' needs a {:?} value but got {:?}", part.trim(), expects, kind),
      ));
    }
    kind = produces;
    filters.push(filter);
  }

  Ok(Expr { source, filters })
}

fn parse_filter(template: &str, text: &str) -> DagResult<Filter> {
  let (name, arg) = match text.find('(') {
    Some(open) => {
      let inner = text[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| template_error(template, &format!("missing ')' in '{}'", text)))?;
      (text[..open].trim(), Some(inner.trim()))
    }
    None => (text, None),
  };

  let int_arg = |arg: Option<&str>| -> DagResult<u32> {
    arg
      .and_then(|a| a.parse::<u32>().ok())
      .ok_or_else(|| template_error(template, &format!("'{}' needs a non-negative integer argument", name)))
  };

  match name {
    "days_ago" => Ok(Filter::DaysAgo(int_arg(arg)?)),
    "months_ago" => Ok(Filter::MonthsAgo(int_arg(arg)?)),
    "years_ago" => Ok(Filter::YearsAgo(int_arg(arg)?)),
    "format" => {
      let fmt = arg
        .and_then(unquote)
        .ok_or_else(|| template_error(template, "'format' needs a quoted strftime argument"))?;
      if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
        return Err(template_error(template, &format!("invalid strftime format '{}'", fmt)));
      }
      Ok(Filter::Format(fmt.to_string()))
    }
    "lower" | "upper" if arg.is_some() => {
      Err(template_error(template, &format!("'{}' takes no argument", name)))
    }
    "lower" => Ok(Filter::Lower),
    "upper" => Ok(Filter::Upper),
    other => Err(template_error(template, &format!("unknown filter '{}'", other))),
  }
}

fn unquote(arg: &str) -> Option<&str> {
  let bytes = arg.as_bytes();
  if bytes.len() >= 2 && (bytes[0] == b'"' || bytes[0] == b'\'') && bytes[bytes.len() - 1] == bytes[0] {
    Some(&arg[1..arg.len() - 1])
  } else {
    None
  }
}

/// Splits on `|` outside of quoted arguments.
fn split_pipes(text: &str) -> Vec<&str> {
  let mut parts = Vec::new();
  let mut quote: Option<char> = None;
  let mut start = 0;
  for (idx, ch) in text.char_indices() {
    match (quote, ch) {
      (None, '"') | (None, '\'') => quote = Some(ch),
      (Some(q), c) if c == q => quote = None,
      (None, '|') => {
        parts.push(&text[start..idx]);
        start = idx + 1;
      }
      _ => {}
    }
  }
  parts.push(&text[start..]);
  parts
}
