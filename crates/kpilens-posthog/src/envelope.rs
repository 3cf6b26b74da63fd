//! The three interchangeable shapes the query API wraps its rows in.

use serde_json::Value;

/// Where a payload's rows were found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Envelope<'a> {
    /// `{ "results": [...] }`
    Results(&'a [Value]),
    /// `{ "result": [...] }`
    Result(&'a [Value]),
    /// `[...]`
    Bare(&'a [Value]),
    /// Anything else: a scalar, `null`, or an object without rows.
    Empty,
}

impl<'a> Envelope<'a> {
    /// `results` wins over `result`, which wins over a bare array.
    pub fn of(raw: &'a Value) -> Self {
        if let Some(rows) = raw.get("results").and_then(Value::as_array) {
            return Self::Results(rows);
        }
        if let Some(rows) = raw.get("result").and_then(Value::as_array) {
            return Self::Result(rows);
        }
        match raw.as_array() {
            Some(rows) => Self::Bare(rows),
            None => Self::Empty,
        }
    }

    pub fn rows(self) -> &'a [Value] {
        match self {
            Self::Results(rows) | Self::Result(rows) | Self::Bare(rows) => rows,
            Self::Empty => &[],
        }
    }
}

pub fn rows(raw: &Value) -> &[Value] {
    Envelope::of(raw).rows()
}
