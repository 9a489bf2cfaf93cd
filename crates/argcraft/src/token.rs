//! Structural classification of raw arguments.
//!
//! The tokenizer only looks at prefixes. Deciding which declaration a token
//! belongs to, or whether `-5` is a value, is left to the resolver.

/// What a token looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind<'a> {
    /// `--name` or `--name=value`.
    Long {
        name: &'a str,
        value: Option<&'a str>,
    },
    /// `-x`, `-xyz`, `-5`.
    Short { body: &'a str },
    /// A lone `-`.
    Dash,
    /// The first bare `--`.
    Separator,
    /// Anything else, and everything after the separator.
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub raw: &'a str,
    pub kind: TokenKind<'a>,
}

impl<'a> Token<'a> {
    pub fn classify(raw: &'a str) -> Self {
        let kind = if raw == "--" {
            TokenKind::Separator
        } else if raw == "-" {
            TokenKind::Dash
        } else if let Some(rest) = raw.strip_prefix("--") {
            match rest.split_once('=') {
                Some((name, value)) => TokenKind::Long {
                    name,
                    value: Some(value),
                },
                None => TokenKind::Long {
                    name: rest,
                    value: None,
                },
            }
        } else if let Some(body) = raw.strip_prefix('-') {
            TokenKind::Short { body }
        } else {
            TokenKind::Value
        };
        Self { raw, kind }
    }

    /// Bare tokens, including everything after `--`.
    pub fn is_value(&self) -> bool {
        matches!(self.kind, TokenKind::Value)
    }

    /// A lone `-` or a negative number: tokens that only make sense as values.
    pub fn is_hyphen_value(&self) -> bool {
        match self.kind {
            TokenKind::Dash => true,
            TokenKind::Short { body } => is_number(body),
            _ => false,
        }
    }

    /// The name part with its prefix stripped, for dash-prefixed tokens.
    pub fn body(&self) -> Option<&'a str> {
        match self.kind {
            TokenKind::Long { name, .. } => Some(name),
            TokenKind::Short { body } => Some(body),
            _ => None,
        }
    }
}

fn is_number(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_digit() || c == '.') && s.parse::<f64>().is_ok()
}

/// A re-iterable view of an argument vector, skipping the program name.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer<'a, S> {
    argv: &'a [S],
}

impl<'a, S: AsRef<str>> Tokenizer<'a, S> {
    pub fn new(argv: &'a [S]) -> Self {
        Self { argv }
    }

    /// Start a fresh pass over the tokens.
    pub fn iter(&self) -> Tokens<'a, S> {
        Tokens {
            argv: self.argv,
            next: 1,
            after_separator: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tokens<'a, S> {
    argv: &'a [S],
    next: usize,
    after_separator: bool,
}

impl<'a, S: AsRef<str>> Iterator for Tokens<'a, S> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.argv.get(self.next)?.as_ref();
        self.next += 1;
        if self.after_separator {
            return Some(Token {
                raw,
                kind: TokenKind::Value,
            });
        }
        let token = Token::classify(raw);
        if token.kind == TokenKind::Separator {
            self.after_separator = true;
        }
        Some(token)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.argv.len().saturating_sub(self.next);
        (left, Some(left))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds<'a>(argv: &'a [&'a str]) -> Vec<TokenKind<'a>> {
        Tokenizer::new(argv).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn skips_program_name_and_classifies_prefixes() {
        let k = kinds(&["prog", "--out=a.txt", "--verbose", "-v", "file", "-"]);
        assert_eq!(
            k,
            vec![
                TokenKind::Long {
                    name: "out",
                    value: Some("a.txt")
                },
                TokenKind::Long {
                    name: "verbose",
                    value: None
                },
                TokenKind::Short { body: "v" },
                TokenKind::Value,
                TokenKind::Dash,
            ]
        );
    }

    #[test]
    fn separator_turns_the_rest_into_values() {
        let k = kinds(&["prog", "--", "--verbose", "--", "-x"]);
        assert_eq!(
            k,
            vec![
                TokenKind::Separator,
                TokenKind::Value,
                TokenKind::Value,
                TokenKind::Value,
            ]
        );
    }

    #[test]
    fn negative_numbers_are_hyphen_values() {
        assert!(Token::classify("-5").is_hyphen_value());
        assert!(Token::classify("-0.25").is_hyphen_value());
        assert!(Token::classify("-").is_hyphen_value());
        assert!(!Token::classify("-v").is_hyphen_value());
        assert!(!Token::classify("--5").is_hyphen_value());
    }

    #[test]
    fn restarting_yields_the_same_sequence() {
        let argv = vec!["prog".to_string(), "a".to_string(), "--b".to_string()];
        let tokenizer = Tokenizer::new(&argv);
        let first: Vec<_> = tokenizer.iter().collect();
        let second: Vec<_> = tokenizer.iter().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }
}
