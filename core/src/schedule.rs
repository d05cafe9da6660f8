// datadag/src/schedule.rs

//! Cron schedules for pipeline triggering.
//!
//! Descriptors use the classic five-field form (`minute hour dom month dow`).
//! The `cron` crate expects a leading seconds field and numbers weekdays
//! 1-7 from Sunday, so five-field expressions are rewritten before parsing.
//! Six/seven-field expressions and `@daily`-style aliases pass through.
//!
//! Classic cron fires when *either* a restricted day-of-month or a restricted
//! day-of-week matches, while `cron` requires both. A five-field expression
//! restricting both days is therefore split into two schedules whose ticks
//! are merged.

use crate::error::{DagError, DagResult};
use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct CronSchedule {
  expression: String,
  schedules: Vec<Schedule>,
}

impl CronSchedule {
  pub fn parse(expression: &str) -> DagResult<Self> {
    let trimmed = expression.trim();
    let schedules = normalize(trimmed)?
      .iter()
      .map(|normalized| Schedule::from_str(normalized).map_err(|e| invalid(expression, &e.to_string())))
      .collect::<DagResult<Vec<_>>>()?;
    Ok(Self {
      expression: trimmed.to_string(),
      schedules,
    })
  }

  /// The expression as written in the descriptor.
  pub fn expression(&self) -> &str {
    &self.expression
  }

  /// First trigger instant strictly after `after`.
  pub fn next_after(&self, after: &DateTime<Utc>) -> Option<DateTime<Utc>> {
    self.schedules.iter().filter_map(|s| s.after(after).next()).min()
  }

  /// Last trigger instant strictly before `before`.
  pub fn previous_before(&self, before: &DateTime<Utc>) -> Option<DateTime<Utc>> {
    self.schedules.iter().filter_map(|s| s.after(before).next_back()).max()
  }

  /// Trigger instants strictly after `after`, in order.
  pub fn upcoming(&self, after: &DateTime<Utc>) -> impl Iterator<Item = DateTime<Utc>> + '_ {
    std::iter::successors(self.next_after(after), move |tick| self.next_after(tick))
  }
}

impl std::fmt::Display for CronSchedule {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.expression)
  }
}

fn invalid(expression: &str, message: &str) -> DagError {
  DagError::config("", format!("invalid schedule '{}': {}", expression, message))
}

/// Rewrites `expression` into one or two `cron` expressions.
fn normalize(expression: &str) -> DagResult<Vec<String>> {
  if expression.starts_with('@') {
    return Ok(vec![expression.to_string()]);
  }
  let fields: Vec<&str> = expression.split_whitespace().collect();
  match fields.len() {
    5 => {
      let (minute, hour, dom, month) = (fields[0], fields[1], fields[2], fields[3]);
      let dow = shift_weekdays(fields[4]).ok_or_else(|| invalid(expression, "bad day-of-week field"))?;
      if is_restricted(dom) && is_restricted(&dow) {
        return Ok(vec![
          format!("0 {} {} {} {} *", minute, hour, dom, month),
          format!("0 {} {} * {} {}", minute, hour, month, dow),
        ]);
      }
      Ok(vec![format!("0 {} {} {} {} {}", minute, hour, dom, month, dow)])
    }
    6 | 7 => Ok(vec![fields.join(" ")]),
    n => Err(invalid(expression, &format!("expected 5 fields, found {}", n))),
  }
}

fn is_restricted(field: &str) -> bool {
  field != "*" && field != "?"
}

/// Maps classic weekday numbers (0-7, Sunday = 0 or 7) onto the 1-7
/// numbering `cron` uses. Names, `*` and `?` are left alone.
fn shift_weekdays(field: &str) -> Option<String> {
  let shift_one = |token: &str| -> Option<String> {
    if token.chars().all(|c| c.is_ascii_digit()) && !token.is_empty() {
      let n: u32 = token.parse().ok()?;
      return match n {
        0 | 7 => Some("1".to_string()),
        1..=6 => Some((n + 1).to_string()),
        _ => None,
      };
    }
    Some(token.to_string())
  };

  let mut items = Vec::new();
  for item in field.split(',') {
    let (range, step) = match item.split_once('/') {
      Some((range, step)) => (range, Some(step)),
      None => (item, None),
    };
    let shifted = match range.split_once('-') {
      // "5-7" would become "6-1"; spell out a wrap to Sunday as a list instead.
      Some((lo, "7")) if lo != "0" && step.is_none() && lo.chars().all(|c| c.is_ascii_digit()) => {
        format!("{}-7,1", shift_one(lo)?)
      }
      Some((lo, "7")) => format!("{}-7", shift_one(lo)?),
      Some((lo, hi)) => format!("{}-{}", shift_one(lo)?, shift_one(hi)?),
      None => shift_one(range)?,
    };
    match step {
      Some(step) => items.push(format!("{}/{}", shifted, step)),
      None => items.push(shifted),
    }
  }
  Some(items.join(","))
}
