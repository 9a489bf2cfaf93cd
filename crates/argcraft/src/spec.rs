//! Declarations for named arguments and positional slots.
//!
//! Both are plain builders: configure with chained calls, then hand the
//! finished spec to [`Registry`](crate::Registry). Nothing is validated until
//! registration, so the order of builder calls only matters where one call
//! overrides another (`flag()`/`takes_value()` are last-write-wins).

use std::fmt;
use std::sync::Arc;

use crate::error::Violation;
use crate::value::{Value, ValueKind};

/// Custom acceptance check for one raw value piece.
pub type Validator = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Permitted number of values. `max == None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub const FLAG: Self = Self { min: 0, max: Some(0) };
    pub const ONE: Self = Self { min: 1, max: Some(1) };

    /// Validate a raw `(min, max)` pair where `max == -1` means unbounded.
    pub fn from_raw(min: isize, max: isize) -> Result<Self, String> {
        if min < 0 {
            return Err("min_values cannot be negative".to_string());
        }
        if max == -1 {
            return Ok(Self {
                min: min as usize,
                max: None,
            });
        }
        if max <= 0 {
            return Err("max_values must be > 0, or -1 for unbounded".to_string());
        }
        if min > max {
            return Err(format!("min_values ({min}) exceeds max_values ({max})"));
        }
        Ok(Self {
            min: min as usize,
            max: Some(max as usize),
        })
    }

    pub fn is_unbounded(&self) -> bool {
        self.max.is_none()
    }

    /// Whether `count` more values would still fit.
    pub fn has_room(&self, count: usize) -> bool {
        self.max.is_none_or(|max| count < max)
    }
}

/// Value-handling settings shared by named and positional arguments.
#[derive(Clone)]
pub(crate) struct ValueRules {
    pub(crate) kind: ValueKind,
    pub(crate) min_values: isize,
    pub(crate) max_values: isize,
    pub(crate) allowed_values: Vec<String>,
    pub(crate) validator: Option<Validator>,
    pub(crate) validation_error: Option<String>,
    pub(crate) value_delimiter: Option<char>,
    pub(crate) case_sensitive: bool,
    pub(crate) allow_hyphen_values: bool,
    pub(crate) default_value: Value,
    pub(crate) env_var: Option<String>,
}

impl ValueRules {
    fn new(min_values: isize, max_values: isize) -> Self {
        Self {
            kind: ValueKind::String,
            min_values,
            max_values,
            allowed_values: Vec::new(),
            validator: None,
            validation_error: None,
            value_delimiter: None,
            case_sensitive: true,
            allow_hyphen_values: false,
            default_value: Value::Unset,
            env_var: None,
        }
    }

    pub(crate) fn arity(&self) -> Arity {
        Arity::from_raw(self.min_values, self.max_values).unwrap_or(Arity::ONE)
    }

    /// Split one raw token on the value delimiter.
    pub(crate) fn split<'a>(&self, raw: &'a str) -> Vec<&'a str> {
        match self.value_delimiter {
            Some(d) => raw.split(d).collect(),
            None => vec![raw],
        }
    }

    pub(crate) fn is_allowed(&self, piece: &str) -> bool {
        if self.allowed_values.is_empty() {
            return true;
        }
        if self.case_sensitive {
            self.allowed_values.iter().any(|a| a == piece)
        } else {
            self.allowed_values
                .iter()
                .any(|a| a.eq_ignore_ascii_case(piece))
        }
    }

    /// Run the allowed-set, validator and type checks on one piece.
    pub(crate) fn accept(&self, name: &str, piece: &str) -> Result<Value, Violation> {
        let reject = |fallback: String| Violation::InvalidValue {
            name: name.to_string(),
            value: piece.to_string(),
            message: self.validation_error.clone().unwrap_or(fallback),
        };
        if !self.is_allowed(piece) {
            return Err(reject(format!(
                "possible values: {}",
                self.allowed_values.join(", ")
            )));
        }
        if let Some(validator) = &self.validator {
            if !validator(piece) {
                return Err(reject("rejected by validator".to_string()));
            }
        }
        self.kind.convert(piece).map_err(reject)
    }
}

impl fmt::Debug for ValueRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueRules")
            .field("kind", &self.kind)
            .field("min_values", &self.min_values)
            .field("max_values", &self.max_values)
            .field("allowed_values", &self.allowed_values)
            .field("validator", &self.validator.as_ref().map(|_| "<fn>"))
            .field("value_delimiter", &self.value_delimiter)
            .field("case_sensitive", &self.case_sensitive)
            .field("allow_hyphen_values", &self.allow_hyphen_values)
            .field("default_value", &self.default_value)
            .field("env_var", &self.env_var)
            .finish()
    }
}

/// A named argument (`--name`, `-n`, or an alias).
#[derive(Debug, Clone)]
pub struct ArgumentSpec {
    pub(crate) name: String,
    pub(crate) shorts: Vec<char>,
    pub(crate) aliases: Vec<String>,
    pub(crate) description: String,
    pub(crate) value_name: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) is_flag: bool,
    pub(crate) rules: ValueRules,
    pub(crate) conflicts_with: Vec<String>,
    pub(crate) mandated: Vec<String>,
    pub(crate) requires_one_of: Vec<String>,
    pub(crate) required: bool,
    pub(crate) hidden: bool,
    pub(crate) deprecated: bool,
    pub(crate) deprecated_message: Option<String>,
}

impl ArgumentSpec {
    /// A new flag with canonical long name `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shorts: Vec::new(),
            aliases: Vec::new(),
            description: String::new(),
            value_name: None,
            category: None,
            is_flag: true,
            rules: ValueRules::new(0, 0),
            conflicts_with: Vec::new(),
            mandated: Vec::new(),
            requires_one_of: Vec::new(),
            required: false,
            hidden: false,
            deprecated: false,
            deprecated_message: None,
        }
    }

    pub fn short(mut self, short: char) -> Self {
        if !self.shorts.contains(&short) {
            self.shorts.push(short);
        }
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        if !self.aliases.contains(&alias) {
            self.aliases.push(alias);
        }
        self
    }

    /// Replace the alias list.
    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn help(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn value_name(mut self, value_name: impl Into<String>) -> Self {
        self.value_name = Some(value_name.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Make this a boolean switch. Resets the arity to `(0, 0)`.
    pub fn flag(mut self) -> Self {
        self.is_flag = true;
        self.rules.min_values = 0;
        self.rules.max_values = 0;
        self
    }

    /// Make this take values. An arity of `(0, 0)` becomes `(1, 1)`.
    pub fn takes_value(mut self) -> Self {
        self.is_flag = false;
        if self.rules.min_values == 0 && self.rules.max_values == 0 {
            self.rules.min_values = 1;
            self.rules.max_values = 1;
        }
        self
    }

    /// Set the value count range; `max == -1` is unbounded. Checked at registration.
    pub fn value_range(mut self, min: isize, max: isize) -> Self {
        self.rules.min_values = min;
        self.rules.max_values = max;
        self
    }

    pub fn value_kind(mut self, kind: ValueKind) -> Self {
        self.rules.kind = kind;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.rules.default_value = value.into();
        self
    }

    pub fn allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn validator(mut self, f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.rules.validator = Some(Arc::new(f));
        self
    }

    pub fn validation_error(mut self, message: impl Into<String>) -> Self {
        self.rules.validation_error = Some(message.into());
        self
    }

    pub fn conflicts_with<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conflicts_with = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn mandated<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mandated = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn requires_one_of<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires_one_of = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn deprecated(mut self, message: impl Into<String>) -> Self {
        self.deprecated = true;
        let message = message.into();
        self.deprecated_message = (!message.is_empty()).then_some(message);
        self
    }

    pub fn value_delimiter(mut self, delimiter: char) -> Self {
        self.rules.value_delimiter = Some(delimiter);
        self
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.rules.case_sensitive = yes;
        self
    }

    pub fn allow_hyphen_values(mut self, yes: bool) -> Self {
        self.rules.allow_hyphen_values = yes;
        self
    }

    pub fn env_var(mut self, var: impl Into<String>) -> Self {
        self.rules.env_var = Some(var.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shorts(&self) -> &[char] {
        &self.shorts
    }

    pub fn alias_names(&self) -> &[String] {
        &self.aliases
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn get_value_name(&self) -> Option<&str> {
        self.value_name.as_deref()
    }

    pub fn get_category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn is_flag(&self) -> bool {
        self.is_flag
    }

    pub fn is_takes_value(&self) -> bool {
        !self.is_flag
    }

    /// The value count range. Only meaningful for a registered spec.
    pub fn arity(&self) -> Arity {
        if self.is_flag {
            Arity::FLAG
        } else {
            self.rules.arity()
        }
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    pub fn get_deprecated_message(&self) -> Option<&str> {
        self.deprecated_message.as_deref()
    }

    pub fn get_default_value(&self) -> &Value {
        &self.rules.default_value
    }

    pub fn get_env_var(&self) -> Option<&str> {
        self.rules.env_var.as_deref()
    }

    pub fn get_allowed_values(&self) -> &[String] {
        &self.rules.allowed_values
    }

    pub fn get_value_delimiter(&self) -> Option<char> {
        self.rules.value_delimiter
    }

    pub fn get_conflicts_with(&self) -> &[String] {
        &self.conflicts_with
    }

    pub fn get_mandated(&self) -> &[String] {
        &self.mandated
    }

    pub fn get_requires_one_of(&self) -> &[String] {
        &self.requires_one_of
    }

    /// Registration-time consistency checks that don't need the rest of the registry.
    pub(crate) fn check(&self) -> Result<(), crate::RegistrationError> {
        use crate::RegistrationError;

        if self.is_flag {
            if self.rules.min_values != 0 || self.rules.max_values != 0 {
                return Err(RegistrationError::InvalidArity {
                    name: self.name.clone(),
                    reason: "flags cannot take values".to_string(),
                });
            }
        } else {
            Arity::from_raw(self.rules.min_values, self.rules.max_values).map_err(|reason| {
                RegistrationError::InvalidArity {
                    name: self.name.clone(),
                    reason,
                }
            })?;
        }

        let relations = [
            ("conflicts_with", &self.conflicts_with),
            ("mandated", &self.mandated),
            ("requires_one_of", &self.requires_one_of),
        ];
        for (relation, names) in relations {
            if names.iter().any(|n| n == &self.name) {
                return Err(RegistrationError::SelfReference {
                    name: self.name.clone(),
                    relation,
                });
            }
        }
        Ok(())
    }
}

/// A positional slot. Defaults to exactly one string value.
#[derive(Debug, Clone)]
pub struct PositionalSpec {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) value_name: Option<String>,
    pub(crate) rules: ValueRules,
    pub(crate) index: usize,
    pub(crate) deprecated: bool,
    pub(crate) deprecated_message: Option<String>,
}

impl PositionalSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            value_name: None,
            rules: ValueRules::new(1, 1),
            index: 0,
            deprecated: false,
            deprecated_message: None,
        }
    }

    pub fn help(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn value_name(mut self, value_name: impl Into<String>) -> Self {
        self.value_name = Some(value_name.into());
        self
    }

    pub fn value_range(mut self, min: isize, max: isize) -> Self {
        self.rules.min_values = min;
        self.rules.max_values = max;
        self
    }

    /// Accept an unbounded trailing run of values (at least one).
    pub fn variadic(mut self) -> Self {
        if self.rules.min_values < 1 {
            self.rules.min_values = 1;
        }
        self.rules.max_values = -1;
        self
    }

    pub fn value_kind(mut self, kind: ValueKind) -> Self {
        self.rules.kind = kind;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.rules.default_value = value.into();
        self
    }

    pub fn env_var(mut self, var: impl Into<String>) -> Self {
        self.rules.env_var = Some(var.into());
        self
    }

    pub fn allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn validator(mut self, f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.rules.validator = Some(Arc::new(f));
        self
    }

    pub fn validation_error(mut self, message: impl Into<String>) -> Self {
        self.rules.validation_error = Some(message.into());
        self
    }

    pub fn value_delimiter(mut self, delimiter: char) -> Self {
        self.rules.value_delimiter = Some(delimiter);
        self
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.rules.case_sensitive = yes;
        self
    }

    pub fn allow_hyphen_values(mut self, yes: bool) -> Self {
        self.rules.allow_hyphen_values = yes;
        self
    }

    pub fn deprecated(mut self, message: impl Into<String>) -> Self {
        self.deprecated = true;
        let message = message.into();
        self.deprecated_message = (!message.is_empty()).then_some(message);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn get_value_name(&self) -> Option<&str> {
        self.value_name.as_deref()
    }

    /// Position assigned at registration.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn arity(&self) -> Arity {
        self.rules.arity()
    }

    pub fn is_variadic(&self) -> bool {
        self.rules.max_values == -1
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    pub fn get_default_value(&self) -> &Value {
        &self.rules.default_value
    }

    pub fn get_env_var(&self) -> Option<&str> {
        self.rules.env_var.as_deref()
    }

    pub fn get_allowed_values(&self) -> &[String] {
        &self.rules.allowed_values
    }

    /// Whether a missing token can still be filled from env or a default.
    pub(crate) fn has_fallback(&self) -> bool {
        self.rules.env_var.is_some() || self.rules.default_value.is_set()
    }

    pub(crate) fn check(&self) -> Result<(), crate::RegistrationError> {
        Arity::from_raw(self.rules.min_values, self.rules.max_values)
            .map(|_| ())
            .map_err(|reason| crate::RegistrationError::InvalidArity {
                name: self.name.clone(),
                reason,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_and_takes_value_are_last_write_wins() {
        let spec = ArgumentSpec::new("out").flag().takes_value();
        assert!(spec.is_takes_value());
        assert_eq!(spec.arity(), Arity::ONE);

        let spec = ArgumentSpec::new("out")
            .takes_value()
            .value_range(1, 3)
            .flag();
        assert!(spec.is_flag());
        assert_eq!(spec.arity(), Arity::FLAG);
        assert!(spec.check().is_ok());
    }

    #[test]
    fn takes_value_keeps_explicit_range() {
        let spec = ArgumentSpec::new("tags").value_range(2, -1).takes_value();
        assert_eq!(spec.arity(), Arity { min: 2, max: None });
    }

    #[test]
    fn arity_rejects_bad_ranges() {
        assert!(Arity::from_raw(-1, 2).is_err());
        assert!(Arity::from_raw(3, 2).is_err());
        assert!(Arity::from_raw(0, 0).is_err());
        assert!(Arity::from_raw(0, -2).is_err());
        assert_eq!(Arity::from_raw(4, -1), Ok(Arity { min: 4, max: None }));
    }

    #[test]
    fn flag_with_values_fails_check() {
        let spec = ArgumentSpec::new("verbose").value_range(1, 1);
        assert!(spec.is_flag());
        assert!(spec.check().is_err());
    }

    #[test]
    fn self_reference_is_rejected() {
        let spec = ArgumentSpec::new("a").mandated(["b", "a"]);
        let err = spec.check().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::SelfReference);
    }

    #[test]
    fn accept_honors_case_sensitivity() {
        let spec = ArgumentSpec::new("fmt")
            .takes_value()
            .allowed_values(["json", "plain"]);
        assert!(spec.rules.accept("fmt", "JSON").is_err());

        let spec = spec.case_sensitive(false);
        assert_eq!(
            spec.rules.accept("fmt", "JSON"),
            Ok(Value::String("JSON".to_string()))
        );
    }

    #[test]
    fn accept_uses_validation_error_message() {
        let spec = ArgumentSpec::new("port")
            .takes_value()
            .validator(|s| s.len() <= 5)
            .validation_error("port is too long");
        let Err(Violation::InvalidValue { message, .. }) = spec.rules.accept("port", "123456")
        else {
            panic!("expected InvalidValue");
        };
        assert_eq!(message, "port is too long");
    }
}
