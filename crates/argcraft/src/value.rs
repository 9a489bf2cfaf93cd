//! Parsed argument values.

use serde::Serialize;
use std::fmt;

/// The scalar type an argument's raw text is converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueKind {
    #[default]
    String,
    Integer,
    Float,
    Boolean,
}

impl ValueKind {
    /// Convert one raw piece of text into a scalar [`Value`].
    ///
    /// Returns a short reason on failure; the caller attaches the argument name.
    pub fn convert(self, raw: &str) -> Result<Value, String> {
        match self {
            Self::String => Ok(Value::String(raw.to_string())),
            Self::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| format!("'{raw}' is not an integer")),
            Self::Float => raw
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| format!("'{raw}' is not a number")),
            Self::Boolean => parse_bool(raw)
                .map(Value::Boolean)
                .ok_or_else(|| format!("'{raw}' is not a boolean")),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// One resolved value: a scalar, a sequence of scalars, or nothing.
///
/// Sequences never nest; [`Value::list`] flattens any nested sequence it is given.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Unset,
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    List(Vec<Value>),
}

impl Value {
    /// Build a sequence, flattening nested sequences and dropping unset entries.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        let mut out = Vec::new();
        for item in items {
            match item {
                Self::Unset => {}
                Self::List(inner) => out.extend(inner.into_iter().filter(Value::is_set)),
                scalar => out.push(scalar),
            }
        }
        Self::List(out)
    }

    /// Clear the value back to [`Value::Unset`].
    pub fn reset(&mut self) {
        *self = Self::Unset;
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Scalars in this value: the elements of a sequence, or the value itself.
    pub fn items(&self) -> &[Value] {
        match self {
            Self::Unset => &[],
            Self::List(items) => items,
            scalar => std::slice::from_ref(scalar),
        }
    }
}

impl fmt::Display for Value {
    /// Sequences are joined with `,`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => Ok(()),
            Self::String(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::list(items.into_iter().map(Into::into))
    }
}
