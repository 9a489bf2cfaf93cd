//! Environment-variable sources consulted for arguments that declare `env_var`.

use std::collections::HashMap;

/// Answers "what is the value of variable `name`?".
///
/// The resolver asks at most once per argument per parse, and only when the
/// argument got no explicit value.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
}

/// The current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// An environment with no variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnv;

impl Environment for NoEnv {
    fn var(&self, _name: &str) -> Option<String> {
        None
    }
}

impl Environment for [(String, String)] {
    fn var(&self, name: &str) -> Option<String> {
        self.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    }
}

impl Environment for Vec<(String, String)> {
    fn var(&self, name: &str) -> Option<String> {
        self.as_slice().var(name)
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Adapts a lookup closure.
#[derive(Debug, Clone, Copy)]
pub struct FnEnv<F>(pub F);

impl<F> Environment for FnEnv<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, name: &str) -> Option<String> {
        (self.0)(name)
    }
}

impl<E: Environment + ?Sized> Environment for &E {
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_list_returns_first_match() {
        let env = vec![
            ("TOKEN".to_string(), "abc".to_string()),
            ("TOKEN".to_string(), "later".to_string()),
        ];
        assert_eq!(env.var("TOKEN").as_deref(), Some("abc"));
        assert_eq!(env.var("OTHER"), None);
    }

    #[test]
    fn closures_are_environments() {
        let env = FnEnv(|name: &str| (name == "HOME").then(|| "/home/me".to_string()));
        assert_eq!(env.var("HOME").as_deref(), Some("/home/me"));
        assert_eq!(NoEnv.var("HOME"), None);
    }
}
