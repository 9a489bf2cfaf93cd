use indexmap::IndexMap;
use serde::Serialize;

use crate::value::Value;

static UNSET: Value = Value::Unset;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Explicit,
    Environment,
    Default,
}

/// One argument's outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolved {
    pub value: Value,
    /// True only when the value came from the argument vector.
    pub was_provided: bool,
    pub source: Option<Source>,
}

/// Advisory message produced while parsing, e.g. use of a deprecated argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub name: String,
    pub message: String,
}

/// The result set of a successful parse, keyed by canonical name.
///
/// Every declared argument has an entry, in declaration order (named
/// arguments first, then positionals); absent ones hold [`Value::Unset`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Matches {
    values: IndexMap<String, Resolved>,
    rest: Vec<String>,
    notices: Vec<Notice>,
}

impl Matches {
    /// The value for `name`, or [`Value::Unset`] if absent or undeclared.
    pub fn get(&self, name: &str) -> &Value {
        self.values.get(name).map(|r| &r.value).unwrap_or(&UNSET)
    }

    pub fn resolved(&self, name: &str) -> Option<&Resolved> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).as_str()
    }

    /// String values of `name`, whether it resolved to a scalar or a sequence.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.get(name).items().iter().filter_map(Value::as_str).collect()
    }

    /// Whether a flag resolved to `true` from any source.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).as_bool().unwrap_or(false)
    }

    /// Whether `name` has a value from any source.
    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_set()
    }

    /// Whether `name` was given in the argument vector.
    pub fn was_provided(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(|r| r.was_provided)
    }

    pub fn source(&self, name: &str) -> Option<Source> {
        self.values.get(name).and_then(|r| r.source)
    }

    /// Bare values no declaration consumed.
    pub fn rest(&self) -> &[String] {
        &self.rest
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resolved)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Canonical names that were given explicitly, in declaration order.
    pub fn provided(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|(_, r)| r.was_provided).map(|(k, _)| k)
    }
}

impl Matches {
    pub(crate) fn insert(&mut self, name: String, resolved: Resolved) {
        self.values.insert(name, resolved);
    }

    pub(crate) fn push_rest(&mut self, value: &str) {
        self.rest.push(value.to_string());
    }

    pub(crate) fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}
