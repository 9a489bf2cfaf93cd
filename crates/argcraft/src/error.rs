//! Error taxonomy for registration and parsing.

use std::fmt;
use thiserror::Error;

/// Flat classification of every failure the engine reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DuplicateName,
    PositionOutOfRange,
    InvalidArity,
    NegativePosition,
    SelfReference,
    VariadicPlacement,
    NotPositional,
    NotRequired,
    UnknownReference,
    UnknownArgument,
    InsufficientValues,
    TooManyValues,
    UnexpectedValue,
    MissingPositional,
    InvalidValue,
    MissingRequiredArgument,
    ConflictingArguments,
    MissingDependency,
    UnsatisfiedAlternative,
}

/// Raised while building a [`Registry`](crate::Registry). The registry is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("'{key}' is already registered for '{existing}'")]
    DuplicateName { key: String, existing: String },

    #[error("position {position} is out of range (next free position is {next})")]
    PositionOutOfRange { position: usize, next: usize },

    #[error("invalid arity for '{name}': {reason}")]
    InvalidArity { name: String, reason: String },

    #[error("positional '{name}' cannot have a negative position ({position})")]
    NegativePosition { name: String, position: isize },

    #[error("'{name}' cannot reference itself in {relation}")]
    SelfReference { name: String, relation: &'static str },

    #[error("variadic positional '{name}' must be the last in its group")]
    VariadicPlacement { name: String },

    #[error("'{name}' is not a positional argument")]
    NotPositional { name: String },

    #[error("positional '{name}' is not required")]
    NotRequired { name: String },

    #[error("'{name}' {relation} unknown argument '{other}'")]
    UnknownReference {
        name: String,
        relation: &'static str,
        other: String,
    },
}

impl RegistrationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateName { .. } => ErrorKind::DuplicateName,
            Self::PositionOutOfRange { .. } => ErrorKind::PositionOutOfRange,
            Self::InvalidArity { .. } => ErrorKind::InvalidArity,
            Self::NegativePosition { .. } => ErrorKind::NegativePosition,
            Self::SelfReference { .. } => ErrorKind::SelfReference,
            Self::VariadicPlacement { .. } => ErrorKind::VariadicPlacement,
            Self::NotPositional { .. } => ErrorKind::NotPositional,
            Self::NotRequired { .. } => ErrorKind::NotRequired,
            Self::UnknownReference { .. } => ErrorKind::UnknownReference,
        }
    }
}

/// One recoverable finding. These are collected across a parse and reported together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("invalid value '{value}' for '{name}': {message}")]
    InvalidValue {
        name: String,
        value: String,
        message: String,
    },

    #[error("missing required argument '{name}'")]
    MissingRequiredArgument { name: String },

    #[error("argument '{name}' cannot be used with '{other}'")]
    ConflictingArguments { name: String, other: String },

    #[error("argument '{name}' requires '{dependency}'")]
    MissingDependency { name: String, dependency: String },

    #[error("argument '{name}' requires one of: {}", alternatives.join(", "))]
    UnsatisfiedAlternative {
        name: String,
        alternatives: Vec<String>,
    },
}

impl Violation {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidValue { .. } => ErrorKind::InvalidValue,
            Self::MissingRequiredArgument { .. } => ErrorKind::MissingRequiredArgument,
            Self::ConflictingArguments { .. } => ErrorKind::ConflictingArguments,
            Self::MissingDependency { .. } => ErrorKind::MissingDependency,
            Self::UnsatisfiedAlternative { .. } => ErrorKind::UnsatisfiedAlternative,
        }
    }

    /// The argument the finding is about.
    pub fn name(&self) -> &str {
        match self {
            Self::InvalidValue { name, .. }
            | Self::MissingRequiredArgument { name }
            | Self::ConflictingArguments { name, .. }
            | Self::MissingDependency { name, .. }
            | Self::UnsatisfiedAlternative { name, .. } => name,
        }
    }
}

/// Every violation found by a single parse, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Violations(pub Vec<Violation>);

impl Violations {
    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_kind(&self, kind: ErrorKind) -> bool {
        self.0.iter().any(|v| v.kind() == kind)
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Why a parse did not produce a [`Matches`](crate::Matches).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("schema error: {0}")]
    Schema(#[from] RegistrationError),

    #[error("unknown argument '{token}'")]
    UnknownArgument { token: String },

    #[error("'{name}' expects at least {min} value(s), found {found}")]
    InsufficientValues { name: String, min: usize, found: usize },

    #[error("'{name}' accepts at most {max} value(s), found {found}")]
    TooManyValues { name: String, max: usize, found: usize },

    #[error("flag '{name}' does not take a value")]
    UnexpectedValue { name: String },

    #[error("missing positional argument '{name}'")]
    MissingPositional { name: String },

    #[error("{0}")]
    Violations(Violations),
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Schema(err) => err.kind(),
            Self::UnknownArgument { .. } => ErrorKind::UnknownArgument,
            Self::InsufficientValues { .. } => ErrorKind::InsufficientValues,
            Self::TooManyValues { .. } => ErrorKind::TooManyValues,
            Self::UnexpectedValue { .. } => ErrorKind::UnexpectedValue,
            Self::MissingPositional { .. } => ErrorKind::MissingPositional,
            Self::Violations(v) => v
                .0
                .first()
                .map(Violation::kind)
                .unwrap_or(ErrorKind::InvalidValue),
        }
    }

    /// Whether the parse halted before reaching the constraint phase.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Violations(_))
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Violations(v) => &v.0,
            _ => &[],
        }
    }

    /// The "show guidance" signal handed to whatever renders help.
    pub fn help_request(&self) -> HelpRequest {
        let subject = match self {
            Self::Schema(_) => None,
            Self::UnknownArgument { token } => Some(token.clone()),
            Self::InsufficientValues { name, .. }
            | Self::TooManyValues { name, .. }
            | Self::UnexpectedValue { name }
            | Self::MissingPositional { name } => Some(name.clone()),
            Self::Violations(v) => v.0.first().map(|v| v.name().to_string()),
        };
        HelpRequest {
            kind: self.kind(),
            subject,
            message: Some(self.to_string()),
        }
    }
}

/// Request for the help collaborator to display guidance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpRequest {
    pub kind: ErrorKind,
    /// Offending argument name or token.
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violations_display_one_per_line() {
        let err = ParseError::Violations(Violations(vec![
            Violation::MissingRequiredArgument {
                name: "out".to_string(),
            },
            Violation::ConflictingArguments {
                name: "a".to_string(),
                other: "b".to_string(),
            },
        ]));
        assert!(!err.is_fatal());
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(
            err.to_string(),
            "missing required argument 'out'\nargument 'a' cannot be used with 'b'"
        );
    }

    #[test]
    fn help_request_carries_subject() {
        let err = ParseError::UnknownArgument {
            token: "--nope".to_string(),
        };
        let req = err.help_request();
        assert!(err.is_fatal());
        assert_eq!(req.kind, ErrorKind::UnknownArgument);
        assert_eq!(req.subject.as_deref(), Some("--nope"));
        assert_eq!(req.message.as_deref(), Some("unknown argument '--nope'"));
    }
}
