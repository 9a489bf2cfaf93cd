use anyhow::{Context, Result, bail};
use argcraft::{ArgumentSpec, HelpMeta, PositionalSpec, Registry, Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A program's argument declarations, as read from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Declaration {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub usage: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgDecl>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positionals: Vec<PositionalDecl>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindDecl {
    #[default]
    String,
    Integer,
    Float,
    Boolean,
}

impl From<KindDecl> for ValueKind {
    fn from(kind: KindDecl) -> Self {
        match kind {
            KindDecl::String => ValueKind::String,
            KindDecl::Integer => ValueKind::Integer,
            KindDecl::Float => ValueKind::Float,
            KindDecl::Boolean => ValueKind::Boolean,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArgDecl {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub short: Vec<char>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// `false` declares a flag.
    #[serde(default)]
    pub takes_value: bool,

    /// `[min, max]`; `max = -1` is unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<[isize; 2]>,

    #[serde(default)]
    pub kind: KindDecl,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts_with: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mandated: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires_one_of: Vec<String>,

    #[serde(default)]
    pub hidden: bool,

    /// Deprecation message; an empty string marks deprecation without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_delimiter: Option<char>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,

    #[serde(default)]
    pub allow_hyphen_values: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PositionalDecl {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_name: Option<String>,

    /// Slot among the required positionals; defaults to the next free one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<isize>,

    #[serde(default)]
    pub optional: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<[isize; 2]>,

    #[serde(default)]
    pub variadic: bool,

    #[serde(default)]
    pub kind: KindDecl,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_delimiter: Option<char>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,

    #[serde(default)]
    pub allow_hyphen_values: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
}

impl Declaration {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read declaration: {}", path.display()))?;
        let decl: Declaration = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse declaration: {}", path.display()))?;
        if decl.name.trim().is_empty() {
            bail!("declaration {} has an empty name", path.display());
        }
        Ok(decl)
    }

    pub fn help_meta(&self) -> HelpMeta {
        HelpMeta {
            name: self.name.clone(),
            summary: self.summary.clone(),
            usage: self.usage.clone(),
            description: self.description.clone(),
        }
    }

    /// Build the registry and check that every relation names a declared argument.
    pub fn registry(&self) -> Result<Registry> {
        let mut registry = Registry::new();

        for arg in &self.args {
            let spec = arg
                .to_spec()
                .with_context(|| format!("invalid argument '{}'", arg.name))?;
            registry
                .register(spec)
                .with_context(|| format!("failed to register argument '{}'", arg.name))?;
        }

        for pos in &self.positionals {
            let spec = pos
                .to_spec()
                .with_context(|| format!("invalid positional '{}'", pos.name))?;
            let position = pos
                .position
                .unwrap_or(registry.required_positionals().len() as isize);
            registry
                .register_positional(spec, position)
                .with_context(|| format!("failed to register positional '{}'", pos.name))?;
        }
        for pos in self.positionals.iter().filter(|p| p.optional) {
            registry
                .make_optional(&pos.name)
                .with_context(|| format!("failed to make '{}' optional", pos.name))?;
        }

        registry
            .validate_references()
            .context("declaration references an undeclared argument")?;
        Ok(registry)
    }
}

impl ArgDecl {
    fn to_spec(&self) -> Result<ArgumentSpec> {
        let mut spec = ArgumentSpec::new(&self.name)
            .aliases(self.aliases.iter().cloned())
            .conflicts_with(self.conflicts_with.iter().cloned())
            .mandated(self.mandated.iter().cloned())
            .requires_one_of(self.requires_one_of.iter().cloned());
        for c in &self.short {
            spec = spec.short(*c);
        }
        if let Some(help) = &self.help {
            spec = spec.help(help);
        }
        if let Some(value_name) = &self.value_name {
            spec = spec.value_name(value_name);
        }
        if let Some(category) = &self.category {
            spec = spec.category(category);
        }
        if self.takes_value || self.values.is_some() {
            spec = spec.takes_value().value_kind(self.kind.into());
            if let Some([min, max]) = self.values {
                spec = spec.value_range(min, max);
            }
        }
        if self.required {
            spec = spec.required();
        }
        if let Some(default) = &self.default {
            spec = spec.default_value(json_to_value(default)?);
        }
        if !self.allowed_values.is_empty() {
            spec = spec.allowed_values(self.allowed_values.iter().cloned());
        }
        if let Some(message) = &self.validation_error {
            spec = spec.validation_error(message);
        }
        if self.hidden {
            spec = spec.hidden();
        }
        if let Some(message) = &self.deprecated {
            spec = spec.deprecated(message);
        }
        if let Some(delimiter) = self.value_delimiter {
            spec = spec.value_delimiter(delimiter);
        }
        if let Some(yes) = self.case_sensitive {
            spec = spec.case_sensitive(yes);
        }
        if self.allow_hyphen_values {
            spec = spec.allow_hyphen_values(true);
        }
        if let Some(var) = &self.env {
            spec = spec.env_var(var);
        }
        Ok(spec)
    }
}

impl PositionalDecl {
    fn to_spec(&self) -> Result<PositionalSpec> {
        let mut spec = PositionalSpec::new(&self.name).value_kind(self.kind.into());
        if let Some(help) = &self.help {
            spec = spec.help(help);
        }
        if let Some(value_name) = &self.value_name {
            spec = spec.value_name(value_name);
        }
        if let Some([min, max]) = self.values {
            spec = spec.value_range(min, max);
        }
        if self.variadic {
            spec = spec.variadic();
        }
        if let Some(default) = &self.default {
            spec = spec.default_value(json_to_value(default)?);
        }
        if !self.allowed_values.is_empty() {
            spec = spec.allowed_values(self.allowed_values.iter().cloned());
        }
        if let Some(message) = &self.validation_error {
            spec = spec.validation_error(message);
        }
        if let Some(delimiter) = self.value_delimiter {
            spec = spec.value_delimiter(delimiter);
        }
        if let Some(yes) = self.case_sensitive {
            spec = spec.case_sensitive(yes);
        }
        if self.allow_hyphen_values {
            spec = spec.allow_hyphen_values(true);
        }
        if let Some(message) = &self.deprecated {
            spec = spec.deprecated(message);
        }
        if let Some(var) = &self.env {
            spec = spec.env_var(var);
        }
        Ok(spec)
    }
}

fn json_to_value(json: &serde_json::Value) -> Result<Value> {
    Ok(match json {
        serde_json::Value::Null => Value::Unset,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => match n.as_f64() {
                Some(f) => Value::Float(f),
                None => bail!("default {n} is out of range"),
            },
        },
        serde_json::Value::Array(items) => {
            Value::list(items.iter().map(json_to_value).collect::<Result<Vec<_>>>()?)
        }
        serde_json::Value::Object(_) => bail!("default value cannot be an object"),
    })
}
