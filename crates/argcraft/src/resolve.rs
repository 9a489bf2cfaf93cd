//! The parsing engine.
//!
//! A parse runs in fixed phases: tokens are first split into named
//! occurrences and free values, free values are handed to positionals, named
//! occurrences are validated, every declaration's provenance is settled, and
//! finally cross-argument constraints are checked. Structural problems
//! (unknown tokens, arity) stop the parse immediately; value and constraint
//! problems are collected and reported together at the end.

use std::collections::HashMap;

use crate::check::check_constraints;
use crate::env::{Environment, ProcessEnv};
use crate::error::{ParseError, Violation, Violations};
use crate::matches::{Matches, Notice, Resolved, Source};
use crate::registry::{ArgId, Registry};
use crate::spec::{ArgumentSpec, PositionalSpec, ValueRules};
use crate::token::{Token, TokenKind, Tokenizer};
use crate::value::{Value, ValueKind};

impl Registry {
    /// Parse `argv` (program name first) using the process environment.
    pub fn parse<S: AsRef<str>>(&self, argv: &[S]) -> Result<Matches, ParseError> {
        self.parse_with_env(argv, &ProcessEnv)
    }

    /// Parse `argv` (program name first), consulting `env` for arguments that
    /// declare an environment variable and got no explicit value.
    ///
    /// Value precedence is:
    /// 1) argv
    /// 2) env
    /// 3) default value
    pub fn parse_with_env<S, E>(&self, argv: &[S], env: &E) -> Result<Matches, ParseError>
    where
        S: AsRef<str>,
        E: Environment + ?Sized,
    {
        Resolver {
            registry: self,
            env,
            violations: Vec::new(),
        }
        .run(argv)
    }
}

/// A run of tokens after splitting.
#[derive(Debug)]
enum Segment<'a> {
    /// One occurrence of a named argument and the raw values it claimed.
    Named {
        id: ArgId,
        values: Vec<&'a str>,
        attached: bool,
    },
    Unknown(&'a str),
    Free(Token<'a>),
}

/// How a declaration's collected values become one [`Value`].
#[derive(Debug, Clone, Copy)]
enum Shape {
    Flag,
    Scalar,
    List,
}

impl Shape {
    fn of(is_flag: bool, rules: &ValueRules) -> Self {
        if is_flag {
            Self::Flag
        } else if rules.arity().max == Some(1) {
            Self::Scalar
        } else {
            Self::List
        }
    }

    fn build(self, mut values: Vec<Value>) -> Value {
        match self {
            Self::Flag => Value::Boolean(values.pop().and_then(|v| v.as_bool()).unwrap_or(true)),
            // repeated occurrences: last one wins
            Self::Scalar => values.pop().unwrap_or_default(),
            Self::List => Value::list(values),
        }
    }
}

struct Resolver<'r, 'e, E: ?Sized> {
    registry: &'r Registry,
    env: &'e E,
    violations: Vec<Violation>,
}

impl<'r, 'e, E: Environment + ?Sized> Resolver<'r, 'e, E> {
    fn run<S: AsRef<str>>(mut self, argv: &[S]) -> Result<Matches, ParseError> {
        self.registry.validate_references()?;

        let tokens: Vec<Token<'_>> = Tokenizer::new(argv).iter().collect();
        let segments = self.split(&tokens);

        tracing::debug!(tokens = tokens.len(), "positional phase");
        let free: Vec<Token<'_>> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Free(token) => Some(*token),
                _ => None,
            })
            .collect();
        let (positional, rest) = self.assign_positionals(&free)?;

        tracing::debug!("named phase");
        let named = self.collect_named(&segments)?;
        if let Some(token) = rest.iter().find(|t| t.is_hyphen_value()) {
            return Err(ParseError::UnknownArgument {
                token: token.raw.to_string(),
            });
        }

        tracing::debug!("resolving provenance");
        let registry = self.registry;
        let mut matches = Matches::default();
        for (i, spec) in registry.arguments().iter().enumerate() {
            let explicit = named.get(&ArgId(i)).cloned();
            self.resolve_argument(spec, explicit, &mut matches);
        }
        for spec in registry.positionals() {
            let explicit = positional.get(spec.name()).cloned();
            self.resolve_positional(spec, explicit, &mut matches);
        }
        for token in rest {
            matches.push_rest(token.raw);
        }

        tracing::debug!("constraint phase");
        self.violations
            .extend(check_constraints(self.registry, &matches));

        if self.violations.is_empty() {
            Ok(matches)
        } else {
            Err(ParseError::Violations(Violations(self.violations)))
        }
    }

    /// Split tokens into named occurrences and free values.
    fn split<'a>(&self, tokens: &[Token<'a>]) -> Vec<Segment<'a>> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let token = tokens[i];
            i += 1;
            match token.kind {
                TokenKind::Value => out.push(Segment::Free(token)),
                TokenKind::Separator => {}
                // a positional may accept it; otherwise it ends up malformed
                TokenKind::Dash => out.push(Segment::Free(token)),
                TokenKind::Long { name, value } => match self.registry.find_by_token(name) {
                    Some(id) => i = self.claim(id, value, tokens, i, &mut out),
                    None => out.push(Segment::Unknown(token.raw)),
                },
                TokenKind::Short { body } => {
                    if let Some(id) = self.registry.find_by_token(body) {
                        i = self.claim(id, None, tokens, i, &mut out);
                    } else if token.is_hyphen_value() {
                        out.push(Segment::Free(token));
                    } else {
                        i = self.cluster(token, body, tokens, i, &mut out);
                    }
                }
            }
        }
        self.release_for_positionals(&mut out);
        out
    }

    /// Expand `-abc` into its short forms. A value-taking member ends the
    /// cluster and takes the remainder (or the following tokens).
    fn cluster<'a>(
        &self,
        token: Token<'a>,
        body: &'a str,
        tokens: &[Token<'a>],
        next: usize,
        out: &mut Vec<Segment<'a>>,
    ) -> usize {
        for (k, c) in body.char_indices() {
            let Some(id) = self.registry.find_short(c) else {
                out.push(Segment::Unknown(token.raw));
                return next;
            };
            if self.registry.arg(id).is_flag() {
                out.push(Segment::Named {
                    id,
                    values: Vec::new(),
                    attached: false,
                });
                continue;
            }
            let rest = &body[k + c.len_utf8()..];
            let rest = rest.strip_prefix('=').unwrap_or(rest);
            let attached = (!rest.is_empty()).then_some(rest);
            return self.claim(id, attached, tokens, next, out);
        }
        next
    }

    /// Record one occurrence of `id`, claiming following tokens as values up
    /// to the argument's maximum. Returns the index of the next unclaimed token.
    fn claim<'a>(
        &self,
        id: ArgId,
        attached: Option<&'a str>,
        tokens: &[Token<'a>],
        mut next: usize,
        out: &mut Vec<Segment<'a>>,
    ) -> usize {
        if let Some(value) = attached {
            out.push(Segment::Named {
                id,
                values: vec![value],
                attached: true,
            });
            return next;
        }

        let spec = self.registry.arg(id);
        let mut values = Vec::new();
        if spec.is_takes_value() {
            let arity = spec.arity();
            let mut pieces = 0;
            while let Some(token) = tokens.get(next) {
                if !arity.has_room(pieces) || !self.accepts_token(&spec.rules, token) {
                    break;
                }
                pieces += spec.rules.split(token.raw).len();
                values.push(token.raw);
                next += 1;
            }
        }
        tracing::trace!(name = spec.name(), values = values.len(), "claimed");
        out.push(Segment::Named {
            id,
            values,
            attached: false,
        });
        next
    }

    fn accepts_token(&self, rules: &ValueRules, token: &Token<'_>) -> bool {
        match token.kind {
            TokenKind::Value => true,
            TokenKind::Separator => false,
            _ if rules.allow_hyphen_values => {
                token.is_hyphen_value()
                    || token
                        .body()
                        .and_then(|b| self.registry.find_by_token(b))
                        .is_none()
            }
            _ => false,
        }
    }

    /// Named arguments claim greedily. If that leaves the required
    /// positionals short, hand back surplus trailing values (beyond each
    /// occurrence's minimum), starting from the last occurrence.
    fn release_for_positionals(&self, out: &mut Vec<Segment<'_>>) {
        let needed: usize = self
            .registry
            .required_positionals()
            .iter()
            .map(|p| p.arity().min)
            .sum();
        let free = out
            .iter()
            .filter(|s| matches!(s, Segment::Free(_)))
            .count();
        let mut deficit = needed.saturating_sub(free);

        let mut at = out.len();
        while deficit > 0 && at > 0 {
            at -= 1;
            let released = {
                let Segment::Named {
                    id,
                    values,
                    attached: false,
                } = &mut out[at]
                else {
                    continue;
                };
                let rules = &self.registry.arg(*id).rules;
                let min = rules.arity().min;
                let mut released = Vec::new();
                while deficit > 0 {
                    let Some((last, kept)) = values.split_last() else {
                        break;
                    };
                    let kept_pieces: usize = kept.iter().map(|v| rules.split(v).len()).sum();
                    if kept_pieces < min || !Token::classify(last).is_value() {
                        break;
                    }
                    released.push(*last);
                    values.pop();
                    deficit -= 1;
                }
                released
            };
            for (k, raw) in released.into_iter().rev().enumerate() {
                out.insert(
                    at + 1 + k,
                    Segment::Free(Token {
                        raw,
                        kind: TokenKind::Value,
                    }),
                );
            }
        }
    }

    /// Feed free values to required positionals, then optional ones.
    /// Returns the values per positional and the unclaimed remainder.
    fn assign_positionals<'a>(
        &mut self,
        free: &[Token<'a>],
    ) -> Result<(HashMap<&'r str, Vec<Value>>, Vec<Token<'a>>), ParseError> {
        let registry = self.registry;
        let mut out = HashMap::new();
        let mut cursor = 0;

        let required = registry.required_positionals();
        for (k, spec) in required.iter().enumerate() {
            let reserve: usize = required[k + 1..].iter().map(|p| p.arity().min).sum();
            let available = (free.len() - cursor).saturating_sub(reserve);
            if available == 0 {
                if spec.has_fallback() {
                    continue;
                }
                return Err(ParseError::MissingPositional {
                    name: spec.name().to_string(),
                });
            }
            let taken = self.fill_positional(spec, &free[cursor..cursor + available])?;
            out.insert(spec.name(), taken.1);
            cursor += taken.0;
        }

        for spec in registry.optional_positionals() {
            let available = free.len() - cursor;
            if available == 0 {
                break;
            }
            let taken = self.fill_positional(spec, &free[cursor..])?;
            out.insert(spec.name(), taken.1);
            cursor += taken.0;
        }

        Ok((out, free[cursor..].to_vec()))
    }

    /// Take as many of `available` as the positional's maximum allows.
    fn fill_positional(
        &mut self,
        spec: &PositionalSpec,
        available: &[Token<'_>],
    ) -> Result<(usize, Vec<Value>), ParseError> {
        let arity = spec.arity();
        let take = arity.max.map_or(available.len(), |m| m.min(available.len()));
        let tokens = &available[..take];

        if let Some(token) = tokens
            .iter()
            .find(|t| t.is_hyphen_value() && !spec.rules.allow_hyphen_values)
        {
            return Err(ParseError::UnknownArgument {
                token: token.raw.to_string(),
            });
        }

        let pieces: Vec<&str> = tokens.iter().flat_map(|t| spec.rules.split(t.raw)).collect();
        self.check_count(spec.name(), &spec.rules, pieces.len())?;
        tracing::trace!(name = spec.name(), values = pieces.len(), "positional");
        Ok((take, self.accept_all(spec.name(), &spec.rules, &pieces)))
    }

    /// Validate every named occurrence and gather its accepted values.
    fn collect_named(
        &mut self,
        segments: &[Segment<'_>],
    ) -> Result<HashMap<ArgId, Vec<Value>>, ParseError> {
        let mut out: HashMap<ArgId, Vec<Value>> = HashMap::new();
        for segment in segments {
            match segment {
                Segment::Free(_) => {}
                Segment::Unknown(token) => {
                    return Err(ParseError::UnknownArgument {
                        token: token.to_string(),
                    });
                }
                Segment::Named { id, values, .. } => {
                    let spec = self.registry.arg(*id);
                    if spec.is_flag() {
                        if !values.is_empty() {
                            return Err(ParseError::UnexpectedValue {
                                name: spec.name().to_string(),
                            });
                        }
                        out.entry(*id).or_default().push(Value::Boolean(true));
                        continue;
                    }
                    let pieces: Vec<&str> =
                        values.iter().flat_map(|v| spec.rules.split(v)).collect();
                    self.check_count(spec.name(), &spec.rules, pieces.len())?;
                    let accepted = self.accept_all(spec.name(), &spec.rules, &pieces);
                    out.entry(*id).or_default().extend(accepted);
                }
            }
        }
        Ok(out)
    }

    fn check_count(&self, name: &str, rules: &ValueRules, found: usize) -> Result<(), ParseError> {
        let arity = rules.arity();
        if found < arity.min {
            return Err(ParseError::InsufficientValues {
                name: name.to_string(),
                min: arity.min,
                found,
            });
        }
        if let Some(max) = arity.max {
            if found > max {
                return Err(ParseError::TooManyValues {
                    name: name.to_string(),
                    max,
                    found,
                });
            }
        }
        Ok(())
    }

    fn accept_all(&mut self, name: &str, rules: &ValueRules, pieces: &[&str]) -> Vec<Value> {
        let mut out = Vec::with_capacity(pieces.len());
        for piece in pieces {
            match rules.accept(name, piece) {
                Ok(value) => out.push(value),
                Err(violation) => self.violations.push(violation),
            }
        }
        out
    }

    fn resolve_argument(
        &mut self,
        spec: &ArgumentSpec,
        explicit: Option<Vec<Value>>,
        matches: &mut Matches,
    ) {
        let shape = Shape::of(spec.is_flag(), &spec.rules);
        let resolved = self.provenance(spec.name(), &spec.rules, shape, explicit);

        if spec.is_required() && !resolved.value.is_set() {
            self.violations.push(Violation::MissingRequiredArgument {
                name: spec.name().to_string(),
            });
        }
        if resolved.was_provided && spec.is_deprecated() {
            self.deprecation(matches, spec.name(), spec.get_deprecated_message());
        }
        matches.insert(spec.name().to_string(), resolved);
    }

    fn resolve_positional(
        &mut self,
        spec: &PositionalSpec,
        explicit: Option<Vec<Value>>,
        matches: &mut Matches,
    ) {
        let shape = Shape::of(false, &spec.rules);
        let resolved = self.provenance(spec.name(), &spec.rules, shape, explicit);

        let required = self
            .registry
            .required_positionals()
            .iter()
            .any(|p| p.name() == spec.name());
        if required && !resolved.value.is_set() {
            self.violations.push(Violation::MissingRequiredArgument {
                name: spec.name().to_string(),
            });
        }
        if resolved.was_provided && spec.is_deprecated() {
            self.deprecation(matches, spec.name(), spec.deprecated_message.as_deref());
        }
        matches.insert(spec.name().to_string(), resolved);
    }

    /// explicit > environment > default > unset.
    fn provenance(
        &mut self,
        name: &str,
        rules: &ValueRules,
        shape: Shape,
        explicit: Option<Vec<Value>>,
    ) -> Resolved {
        if let Some(values) = explicit {
            return Resolved {
                value: shape.build(values),
                was_provided: true,
                source: Some(Source::Explicit),
            };
        }

        if let Some(var) = rules.env_var.as_deref() {
            if let Some(raw) = self.env.var(var) {
                tracing::trace!(name, var, "value from environment");
                let values = match shape {
                    Shape::Flag => match ValueKind::Boolean.convert(&raw) {
                        Ok(v) => vec![v],
                        Err(message) => {
                            self.violations.push(Violation::InvalidValue {
                                name: name.to_string(),
                                value: raw.clone(),
                                message,
                            });
                            Vec::new()
                        }
                    },
                    _ => {
                        let pieces = rules.split(&raw);
                        self.accept_all(name, rules, &pieces)
                    }
                };
                return Resolved {
                    value: shape.build(values),
                    was_provided: false,
                    source: Some(Source::Environment),
                };
            }
        }

        if rules.default_value.is_set() {
            return Resolved {
                value: rules.default_value.clone(),
                was_provided: false,
                source: Some(Source::Default),
            };
        }

        Resolved {
            value: Value::Unset,
            was_provided: false,
            source: None,
        }
    }

    fn deprecation(&self, matches: &mut Matches, name: &str, message: Option<&str>) {
        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| format!("'{name}' is deprecated"));
        tracing::warn!(name, "{message}");
        matches.push_notice(Notice {
            name: name.to_string(),
            message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::env::NoEnv;

    fn parse(reg: &Registry, argv: &[&str]) -> Result<Matches, ParseError> {
        reg.parse_with_env(argv, &NoEnv)
    }

    #[test]
    fn short_help_flag_is_provided() {
        let mut reg = Registry::new();
        reg.register(ArgumentSpec::new("help").short('h').flag())
            .unwrap();
        let m = parse(&reg, &["prog", "-h"]).unwrap();
        assert!(m.was_provided("help"));
        assert_eq!(m.get("help"), &Value::Boolean(true));
        assert_eq!(m.source("help"), Some(Source::Explicit));
    }

    #[test]
    fn delimited_value_counts_each_piece() {
        let mut reg = Registry::new();
        reg.register(
            ArgumentSpec::new("name")
                .takes_value()
                .value_range(1, 2)
                .value_delimiter(','),
        )
        .unwrap();
        let m = parse(&reg, &["prog", "--name", "a,b"]).unwrap();
        assert_eq!(m.get_all("name"), ["a", "b"]);

        let err = parse(&reg, &["prog", "--name", "a,b,c"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooManyValues);
    }

    #[test]
    fn missing_required_positional() {
        let mut reg = Registry::new();
        reg.register_positional(PositionalSpec::new("file"), 0)
            .unwrap();
        let err = parse(&reg, &["prog"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingPositional {
                name: "file".to_string()
            }
        );
    }

    #[test]
    fn env_fills_missing_value() {
        let mut reg = Registry::new();
        reg.register(ArgumentSpec::new("token").takes_value().env_var("TOKEN"))
            .unwrap();
        let env = vec![("TOKEN".to_string(), "abc".to_string())];
        let m = reg.parse_with_env(&["prog"], &env).unwrap();
        assert_eq!(m.get_str("token"), Some("abc"));
        assert_eq!(m.source("token"), Some(Source::Environment));
        assert!(!m.was_provided("token"));
    }

    #[test]
    fn explicit_beats_env_beats_default() {
        let mut reg = Registry::new();
        reg.register(
            ArgumentSpec::new("format")
                .takes_value()
                .env_var("FORMAT")
                .default_value("plain"),
        )
        .unwrap();
        let env = vec![("FORMAT".to_string(), "json".to_string())];

        let m = reg
            .parse_with_env(&["prog", "--format", "xml"], &env)
            .unwrap();
        assert_eq!(m.get_str("format"), Some("xml"));
        assert_eq!(m.source("format"), Some(Source::Explicit));

        let m = reg.parse_with_env(&["prog"], &env).unwrap();
        assert_eq!(m.get_str("format"), Some("json"));

        let m = reg.parse_with_env(&["prog"], &NoEnv).unwrap();
        assert_eq!(m.get_str("format"), Some("plain"));
        assert_eq!(m.source("format"), Some(Source::Default));
    }

    #[test]
    fn env_is_consulted_once_per_argument() {
        use std::cell::Cell;

        let mut reg = Registry::new();
        reg.register(ArgumentSpec::new("a").takes_value().env_var("A"))
            .unwrap();
        reg.register(ArgumentSpec::new("b").takes_value().env_var("B"))
            .unwrap();
        let calls = Cell::new(0);
        let env = crate::FnEnv(|_: &str| {
            calls.set(calls.get() + 1);
            None::<String>
        });
        reg.parse_with_env(&["prog", "--a", "x"], &env).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn unknown_argument_is_fatal() {
        let mut reg = Registry::new();
        reg.register(ArgumentSpec::new("verbose")).unwrap();
        let err = parse(&reg, &["prog", "--verbos"]).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(
            err,
            ParseError::UnknownArgument {
                token: "--verbos".to_string()
            }
        );
    }

    #[test]
    fn insufficient_values_at_end_of_input() {
        let mut reg = Registry::new();
        reg.register(ArgumentSpec::new("pair").takes_value().value_range(2, 2))
            .unwrap();
        let err = parse(&reg, &["prog", "--pair", "a"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::InsufficientValues {
                name: "pair".to_string(),
                min: 2,
                found: 1
            }
        );
    }

    #[test]
    fn unbounded_argument_stops_at_next_argument() {
        let mut reg = Registry::new();
        reg.register(ArgumentSpec::new("files").takes_value().value_range(1, -1))
            .unwrap();
        reg.register(ArgumentSpec::new("verbose").short('v')).unwrap();
        let m = parse(&reg, &["prog", "--files", "a", "b", "c", "-v"]).unwrap();
        assert_eq!(m.get_all("files"), ["a", "b", "c"]);
        assert!(m.flag("verbose"));
    }

    #[test]
    fn unbounded_argument_leaves_room_for_required_positional() {
        let mut reg = Registry::new();
        reg.register(ArgumentSpec::new("files").takes_value().value_range(1, -1))
            .unwrap();
        reg.register_positional(PositionalSpec::new("dest"), 0)
            .unwrap();
        let m = parse(&reg, &["prog", "--files", "a", "b", "out"]).unwrap();
        assert_eq!(m.get_all("files"), ["a", "b"]);
        assert_eq!(m.get_str("dest"), Some("out"));
    }

    #[test]
    fn positionals_interleave_with_named() {
        let mut reg = Registry::new();
        reg.register(ArgumentSpec::new("verbose").short('v')).unwrap();
        reg.register(ArgumentSpec::new("output").short('o').takes_value())
            .unwrap();
        reg.register_positional(PositionalSpec::new("src"), 0)
            .unwrap();
        reg.register_positional(PositionalSpec::new("dst"), 1)
            .unwrap();
        let m = parse(&reg, &["prog", "-v", "a", "-o", "log.txt", "b"]).unwrap();
        assert_eq!(m.get_str("src"), Some("a"));
        assert_eq!(m.get_str("dst"), Some("b"));
        assert_eq!(m.get_str("output"), Some("log.txt"));
    }

    #[test]
    fn variadic_positional_reserves_for_later_required() {
        let mut reg = Registry::new();
        reg.register_positional(PositionalSpec::new("first").value_range(1, 3), 0)
            .unwrap();
        reg.register_positional(PositionalSpec::new("last"), 1)
            .unwrap();
        reg.register_positional(PositionalSpec::new("extra"), 2)
            .unwrap();
        reg.make_optional("extra").unwrap();

        let m = parse(&reg, &["prog", "a", "b", "c"]).unwrap();
        assert_eq!(m.get_all("first"), ["a", "b"]);
        assert_eq!(m.get_str("last"), Some("c"));
        assert_eq!(m.get("extra"), &Value::Unset);

        let mut reg = Registry::new();
        reg.register_positional(PositionalSpec::new("src"), 0)
            .unwrap();
        reg.register_positional(PositionalSpec::new("more").variadic(), 1)
            .unwrap();
        let m = parse(&reg, &["prog", "a", "b", "c"]).unwrap();
        assert_eq!(m.get_str("src"), Some("a"));
        assert_eq!(m.get_all("more"), ["b", "c"]);
    }

    #[test]
    fn optional_positional_uses_default_when_absent() {
        let mut reg = Registry::new();
        reg.register_positional(PositionalSpec::new("input"), 0)
            .unwrap();
        reg.register_positional(PositionalSpec::new("level").value_kind(ValueKind::Integer).default_value(3i64), 1)
            .unwrap();
        reg.make_optional("level").unwrap();

        let m = parse(&reg, &["prog", "in.txt"]).unwrap();
        assert_eq!(m.get("level"), &Value::Integer(3));
        assert_eq!(m.source("level"), Some(Source::Default));

        let m = parse(&reg, &["prog", "in.txt", "7", "spare"]).unwrap();
        assert_eq!(m.get("level"), &Value::Integer(7));
        assert_eq!(m.rest(), ["spare"]);
    }

    #[test]
    fn required_positional_with_fallback_is_not_fatal() {
        let mut reg = Registry::new();
        reg.register_positional(PositionalSpec::new("target").env_var("TARGET"), 0)
            .unwrap();
        let err = parse(&reg, &["prog"]).unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let env = vec![("TARGET".to_string(), "x86".to_string())];
        let m = reg.parse_with_env(&["prog"], &env).unwrap();
        assert_eq!(m.get_str("target"), Some("x86"));
    }

    #[test]
    fn hyphen_values_need_permission() {
        let mut reg = Registry::new();
        reg.register(ArgumentSpec::new("offset").takes_value().value_kind(ValueKind::Integer))
            .unwrap();
        let err = parse(&reg, &["prog", "--offset", "-5"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientValues);

        let mut reg = Registry::new();
        reg.register(
            ArgumentSpec::new("offset")
                .takes_value()
                .value_kind(ValueKind::Integer)
                .allow_hyphen_values(true),
        )
        .unwrap();
        let m = parse(&reg, &["prog", "--offset", "-5"]).unwrap();
        assert_eq!(m.get("offset"), &Value::Integer(-5));
    }

    #[test]
    fn lone_dash_positional() {
        let mut reg = Registry::new();
        reg.register_positional(PositionalSpec::new("input"), 0)
            .unwrap();
        let err = parse(&reg, &["prog", "-"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);

        let mut reg = Registry::new();
        reg.register_positional(PositionalSpec::new("input").allow_hyphen_values(true), 0)
            .unwrap();
        let m = parse(&reg, &["prog", "-"]).unwrap();
        assert_eq!(m.get_str("input"), Some("-"));
    }

    #[test]
    fn attached_values_and_clusters() {
        let mut reg = Registry::new();
        reg.register(ArgumentSpec::new("verbose").short('v')).unwrap();
        reg.register(ArgumentSpec::new("quiet").short('q')).unwrap();
        reg.register(ArgumentSpec::new("output").short('o').takes_value())
            .unwrap();

        let m = parse(&reg, &["prog", "-vqoout.txt"]).unwrap();
        assert!(m.flag("verbose"));
        assert!(m.flag("quiet"));
        assert_eq!(m.get_str("output"), Some("out.txt"));

        let m = parse(&reg, &["prog", "--output=a.txt"]).unwrap();
        assert_eq!(m.get_str("output"), Some("a.txt"));

        let err = parse(&reg, &["prog", "--verbose=yes"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedValue);

        let err = parse(&reg, &["prog", "-vx"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn separator_ends_named_processing() {
        let mut reg = Registry::new();
        reg.register(ArgumentSpec::new("verbose").short('v')).unwrap();
        reg.register_positional(PositionalSpec::new("args").variadic(), 0)
            .unwrap();
        let m = parse(&reg, &["prog", "-v", "--", "-v", "--verbose"]).unwrap();
        assert!(m.flag("verbose"));
        assert_eq!(m.get_all("args"), ["-v", "--verbose"]);
    }

    #[test]
    fn invalid_values_and_missing_required_are_batched() {
        let mut reg = Registry::new();
        reg.register(
            ArgumentSpec::new("mode")
                .takes_value()
                .allowed_values(["fast", "slow"]),
        )
        .unwrap();
        reg.register(
            ArgumentSpec::new("count")
                .takes_value()
                .value_kind(ValueKind::Integer),
        )
        .unwrap();
        reg.register(ArgumentSpec::new("name").takes_value().required())
            .unwrap();

        let err = parse(&reg, &["prog", "--mode", "medium", "--count", "ten"]).unwrap_err();
        let kinds: Vec<ErrorKind> = err.violations().iter().map(Violation::kind).collect();
        assert_eq!(
            kinds,
            [
                ErrorKind::InvalidValue,
                ErrorKind::InvalidValue,
                ErrorKind::MissingRequiredArgument
            ]
        );
    }

    #[test]
    fn repeated_occurrences_accumulate() {
        let mut reg = Registry::new();
        reg.register(ArgumentSpec::new("tag").short('t').takes_value().value_range(1, 2))
            .unwrap();
        reg.register(ArgumentSpec::new("out").takes_value()).unwrap();
        let m = parse(&reg, &["prog", "-t", "a", "-t", "b", "--out", "x", "--out", "y"]).unwrap();
        assert_eq!(m.get_all("tag"), ["a", "b"]);
        assert_eq!(m.get_str("out"), Some("y"));
    }

    #[test]
    fn deprecated_use_is_a_notice() {
        let mut reg = Registry::new();
        reg.register(ArgumentSpec::new("old").deprecated("use --new instead"))
            .unwrap();
        let m = parse(&reg, &["prog", "--old"]).unwrap();
        assert_eq!(m.notices().len(), 1);
        assert_eq!(m.notices()[0].message, "use --new instead");

        let m = parse(&reg, &["prog"]).unwrap();
        assert!(m.notices().is_empty());
    }

    #[test]
    fn flag_from_environment() {
        let mut reg = Registry::new();
        reg.register(ArgumentSpec::new("color").env_var("COLOR")).unwrap();
        let env = vec![("COLOR".to_string(), "off".to_string())];
        let m = reg.parse_with_env(&["prog"], &env).unwrap();
        assert_eq!(m.get("color"), &Value::Boolean(false));
        assert_eq!(m.source("color"), Some(Source::Environment));
    }

    #[test]
    fn parsing_twice_is_identical() {
        let mut reg = Registry::new();
        reg.register(ArgumentSpec::new("level").takes_value().default_value("1"))
            .unwrap();
        reg.register_positional(PositionalSpec::new("files").variadic(), 0)
            .unwrap();
        let argv = ["prog", "a", "--level", "2", "b"];
        assert_eq!(parse(&reg, &argv).unwrap(), parse(&reg, &argv).unwrap());
    }

    #[test]
    fn accepted_values_survive_rejoin() {
        let mut reg = Registry::new();
        reg.register(
            ArgumentSpec::new("langs")
                .takes_value()
                .value_range(1, -1)
                .value_delimiter(',')
                .allowed_values(["rust", "c", "go"]),
        )
        .unwrap();
        let m = parse(&reg, &["prog", "--langs", "rust,go"]).unwrap();
        let joined = m.get("langs").to_string();
        let again = parse(&reg, &["prog", "--langs", joined.as_str()]).unwrap();
        assert_eq!(again.get("langs"), m.get("langs"));
    }
}
