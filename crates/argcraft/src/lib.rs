//! Declarative command-line argument parsing.
//!
//! Arguments are declared with [`ArgumentSpec`] and [`PositionalSpec`],
//! collected in a [`Registry`], and resolved against an argument vector by
//! [`Registry::parse`]. Each value resolves with the precedence
//! explicit > environment > default, and cross-argument constraints are
//! checked over explicitly provided arguments only.
//!
//! ```
//! use argcraft::{ArgumentSpec, NoEnv, PositionalSpec, Registry};
//!
//! let mut reg = Registry::new();
//! reg.register(ArgumentSpec::new("verbose").short('v')).unwrap();
//! reg.register_positional(PositionalSpec::new("file"), 0).unwrap();
//!
//! let m = reg.parse_with_env(&["prog", "-v", "a.txt"], &NoEnv).unwrap();
//! assert!(m.flag("verbose"));
//! assert_eq!(m.get_str("file"), Some("a.txt"));
//! ```

mod check;
pub mod env;
mod error;
pub mod help;
mod matches;
mod registry;
mod resolve;
mod spec;
pub mod token;
mod value;

pub use check::check_constraints;
pub use env::{Environment, FnEnv, NoEnv, ProcessEnv};
pub use error::{
    ErrorKind, HelpRequest, ParseError, RegistrationError, Violation, Violations,
};
pub use help::HelpMeta;
pub use matches::{Matches, Notice, Resolved, Source};
pub use registry::{ArgId, Registry};
pub use spec::{Arity, ArgumentSpec, PositionalSpec, Validator};
pub use token::{Token, TokenKind, Tokenizer, Tokens};
pub use value::{Value, ValueKind};
