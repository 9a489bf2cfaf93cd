//! Plain-text help rendering from a [`Registry`].
//!
//! Rendering makes no parsing decisions; it only reads declarations.

use crate::registry::Registry;
use crate::spec::{ArgumentSpec, PositionalSpec};
use crate::value::Value;

/// Program-level text shown around the argument tables.
#[derive(Debug, Clone, Default)]
pub struct HelpMeta {
    pub name: String,
    pub summary: String,
    pub usage: String,
    pub description: String,
}

fn format_value_name(value_name: Option<&str>, name: &str) -> String {
    value_name
        .map(|s| s.to_string())
        .unwrap_or_else(|| name.to_ascii_uppercase())
}

fn format_positional_left(spec: &PositionalSpec, required: bool) -> String {
    let mut n = format_value_name(spec.get_value_name(), spec.name());
    if spec.is_variadic() || spec.arity().max.is_some_and(|m| m > 1) {
        n.push_str("...");
    }
    if required {
        format!("<{n}>")
    } else {
        format!("[{n}]")
    }
}

fn format_arg_left(spec: &ArgumentSpec) -> String {
    let mut names: Vec<String> = spec.shorts().iter().map(|c| format!("-{c}")).collect();
    names.push(format!("--{}", spec.name()));
    names.extend(spec.alias_names().iter().map(|a| format!("--{a}")));
    let mut out = names.join(", ");
    if spec.is_takes_value() {
        let n = format_value_name(spec.get_value_name(), spec.name());
        if spec.arity().max == Some(1) {
            out.push_str(&format!(" <{n}>"));
        } else {
            out.push_str(&format!(" <{n}>..."));
        }
    }
    out
}

fn append_note(out: &mut String, note: &str) {
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(note);
}

fn format_common_help(
    description: &str,
    default_value: &Value,
    env_var: Option<&str>,
    allowed: &[String],
) -> String {
    let mut out = description.trim().to_string();
    if !allowed.is_empty() {
        append_note(&mut out, &format!("[possible values: {}]", allowed.join(", ")));
    }
    if default_value.is_set() {
        append_note(&mut out, &format!("[default: {default_value}]"));
    }
    if let Some(env) = env_var {
        append_note(&mut out, &format!("[env: {env}]"));
    }
    out
}

fn format_arg_help(spec: &ArgumentSpec) -> String {
    let mut out = format_common_help(
        spec.description(),
        spec.get_default_value(),
        spec.get_env_var(),
        spec.get_allowed_values(),
    );
    if spec.is_required() {
        append_note(&mut out, "(required)");
    }
    if spec.is_deprecated() {
        let note = match spec.get_deprecated_message() {
            Some(msg) => format!("(deprecated: {msg})"),
            None => "(deprecated)".to_string(),
        };
        append_note(&mut out, &note);
    }
    out
}

fn push_rows(out: &mut String, title: &str, rows: Vec<(String, String)>) {
    if rows.is_empty() {
        return;
    }
    out.push_str(&format!("\n{title}:\n"));
    let width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    for (left, help) in rows {
        if help.is_empty() {
            out.push_str(&format!("  {}\n", left));
        } else {
            out.push_str(&format!("  {:width$}  {}\n", left, help, width = width));
        }
    }
}

fn default_usage(registry: &Registry, name: &str) -> String {
    let mut out = name.to_string();
    if registry.arguments().iter().any(|a| !a.is_hidden()) {
        out.push_str(" [OPTIONS]");
    }
    for p in registry.required_positionals() {
        out.push(' ');
        out.push_str(&format_positional_left(p, true));
    }
    for p in registry.optional_positionals() {
        out.push(' ');
        out.push_str(&format_positional_left(p, false));
    }
    out
}

/// Render help text: header, usage, positionals, then options grouped by
/// category. Hidden arguments are left out.
pub fn render(registry: &Registry, meta: &HelpMeta) -> String {
    let mut out = String::new();
    if meta.summary.trim().is_empty() {
        out.push_str(&meta.name);
        out.push('\n');
    } else {
        out.push_str(&format!("{} - {}\n", meta.name, meta.summary.trim()));
    }

    if meta.usage.trim().is_empty() {
        out.push_str(&format!("\nUsage: {}\n", default_usage(registry, &meta.name)));
    } else {
        out.push_str(&format!("\nUsage: {}\n", meta.usage.trim()));
    }

    if !meta.description.trim().is_empty() {
        out.push('\n');
        out.push_str(meta.description.trim_end());
        out.push('\n');
    }

    let required = registry.required_positionals().len();
    let positionals: Vec<(String, String)> = registry
        .positionals()
        .enumerate()
        .map(|(i, p)| {
            let mut help = format_common_help(
                p.description(),
                p.get_default_value(),
                p.get_env_var(),
                p.get_allowed_values(),
            );
            if p.is_deprecated() {
                append_note(&mut help, "(deprecated)");
            }
            (format_positional_left(p, i < required), help)
        })
        .collect();
    push_rows(&mut out, "Arguments", positionals);

    // uncategorised first, then categories in first-seen order
    let mut categories: Vec<Option<&str>> = vec![None];
    for arg in registry.arguments() {
        if !arg.is_hidden() && !categories.contains(&arg.get_category()) {
            categories.push(arg.get_category());
        }
    }
    for category in categories {
        let rows: Vec<(String, String)> = registry
            .arguments()
            .iter()
            .filter(|a| !a.is_hidden() && a.get_category() == category)
            .map(|a| (format_arg_left(a), format_arg_help(a)))
            .collect();
        push_rows(&mut out, category.unwrap_or("Options"), rows);
    }

    out
}
