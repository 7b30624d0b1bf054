//! A single row of a history file.

use std::fmt;

use chrono::{Local, NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, PartialEq)]
/// A cell value. Nulls are written as empty cells.
pub enum Field {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Field {
    /// Infers a field from a CSV cell: integer, then float, then text.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return Field::Null;
        }
        if let Ok(v) = s.parse::<i64>() {
            return Field::Int(v);
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Field::Float(v),
            _ => Field::Text(s.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Field::Int(v) => Some(*v as f64),
            Field::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Null => Ok(()),
            Field::Int(v) => write!(f, "{}", v),
            // keeps a decimal point so floats read back as floats
            Field::Float(v) => write!(f, "{:?}", v),
            Field::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<Option<i32>> for Field {
    fn from(v: Option<i32>) -> Self {
        v.map_or(Field::Null, |v| Field::Int(v as i64))
    }
}

impl From<Option<f64>> for Field {
    fn from(v: Option<f64>) -> Self {
        match v {
            Some(v) if v.is_finite() => Field::Float(v),
            _ => Field::Null,
        }
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Field::Text(s.to_string())
    }
}

impl From<String> for Field {
    fn from(s: String) -> Self {
        Field::Text(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Named fields in insertion order.
pub struct HistoryRow {
    fields: Vec<(String, Field)>,
}

impl HistoryRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `column`, replacing any earlier value for it.
    pub fn set(&mut self, column: &str, value: impl Into<Field>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(c, _)| c == column) {
            Some((_, v)) => *v = value,
            None => self.fields.push((column.to_string(), value)),
        }
    }

    pub fn with(mut self, column: &str, value: impl Into<Field>) -> Self {
        self.set(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Field> {
        self.fields.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    /// Returns the value of `column` as text, if it is present and not null.
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column)
            .filter(|v| !v.is_null())
            .map(|v| v.to_string())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(c, _)| c.as_str())
    }
}

/// The run date and update timestamp stamped onto every row of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStamp {
    pub run_date: NaiveDate,
    pub updated_at: NaiveDateTime,
}

impl RunStamp {
    pub fn now() -> Self {
        let now = Local::now().naive_local();
        RunStamp {
            run_date: now.date(),
            updated_at: now,
        }
    }

    pub fn at(updated_at: NaiveDateTime) -> Self {
        RunStamp {
            run_date: updated_at.date(),
            updated_at,
        }
    }

    pub fn run_date(&self) -> String {
        self.run_date.format("%Y-%m-%d").to_string()
    }

    pub fn update_time(&self) -> String {
        self.updated_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

// -- Tests -------------------------------------------------------------------
