//! A small predicate builder for the analytical queries.
//!
//! Clauses are static column expressions; values are bound positionally, so
//! a placeholder's number always matches its slot in the parameter list no
//! matter which optional filters are present.

use lapor_core::window::DateWindow;
use rusqlite::types::Value;

use crate::encode::encode_dt;

#[derive(Debug, Default)]
pub struct Predicates {
  clauses: Vec<String>,
  params:  Vec<Value>,
}

impl Predicates {
  pub fn new() -> Self { Self::default() }

  /// Inclusive `created_at` bounds on `column`.
  pub fn window(column: &'static str, window: &DateWindow) -> Self {
    let mut preds = Self::new();
    if let Some(start) = window.start {
      preds.compare(column, ">=", Value::Text(encode_dt(start)));
    }
    if let Some(end) = window.end {
      preds.compare(column, "<=", Value::Text(encode_dt(end)));
    }
    preds
  }

  /// Add a value-free clause, e.g. `fr.latitude IS NOT NULL`.
  pub fn require(&mut self, clause: &'static str) -> &mut Self {
    self.clauses.push(clause.to_owned());
    self
  }

  /// Add `column op ?N` with `value` bound at `N`.
  pub fn compare(&mut self, column: &'static str, op: &'static str, value: Value) -> &mut Self {
    let placeholder = self.bind(value);
    self.clauses.push(format!("{column} {op} {placeholder}"));
    self
  }

  /// Bind a value used elsewhere in the statement; returns its placeholder.
  pub fn bind(&mut self, value: Value) -> String {
    self.params.push(value);
    format!("?{}", self.params.len())
  }

  /// `WHERE a AND b`, or nothing.
  pub fn where_clause(&self) -> String {
    if self.clauses.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", self.clauses.join(" AND "))
    }
  }

  pub fn params(&self) -> rusqlite::ParamsFromIter<std::slice::Iter<'_, Value>> {
    rusqlite::params_from_iter(self.params.iter())
  }
}
