//! Cross-argument constraints: conflicts, dependencies and alternatives.

use std::collections::HashSet;

use crate::error::Violation;
use crate::matches::Matches;
use crate::registry::Registry;

/// Check every explicitly provided argument's relations against the full
/// provided set. Findings come back in declaration order; a mutual conflict
/// is reported once.
pub fn check_constraints(registry: &Registry, matches: &Matches) -> Vec<Violation> {
    let mut out = Vec::new();
    let mut conflicts: HashSet<(&str, &str)> = HashSet::new();

    for spec in registry.arguments() {
        let name = spec.name();
        if !matches.was_provided(name) {
            continue;
        }

        for other in spec.get_conflicts_with() {
            if !matches.was_provided(other) {
                continue;
            }
            let pair = if name <= other.as_str() {
                (name, other.as_str())
            } else {
                (other.as_str(), name)
            };
            if conflicts.insert(pair) {
                out.push(Violation::ConflictingArguments {
                    name: name.to_string(),
                    other: other.clone(),
                });
            }
        }

        for dependency in spec.get_mandated() {
            if !matches.was_provided(dependency) {
                out.push(Violation::MissingDependency {
                    name: name.to_string(),
                    dependency: dependency.clone(),
                });
            }
        }

        let alternatives = spec.get_requires_one_of();
        if !alternatives.is_empty() && !alternatives.iter().any(|a| matches.was_provided(a)) {
            out.push(Violation::UnsatisfiedAlternative {
                name: name.to_string(),
                alternatives: alternatives.to_vec(),
            });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::env::NoEnv;
    use crate::spec::ArgumentSpec;

    fn registry() -> Registry {
        let mut reg = Registry::new();
        reg.register(ArgumentSpec::new("tcp").conflicts_with(["udp"]))
            .unwrap();
        reg.register(ArgumentSpec::new("udp").conflicts_with(["tcp"]))
            .unwrap();
        reg.register(ArgumentSpec::new("port").takes_value().mandated(["host"]))
            .unwrap();
        reg.register(ArgumentSpec::new("host").takes_value()).unwrap();
        reg.register(ArgumentSpec::new("listen").requires_one_of(["tcp", "udp"]))
            .unwrap();
        reg
    }

    #[test]
    fn mutual_conflict_reported_once_naming_both() {
        let reg = registry();
        let err = reg
            .parse_with_env(&["prog", "--tcp", "--udp"], &NoEnv)
            .unwrap_err();
        let v = err.violations();
        assert_eq!(v.len(), 1);
        assert_eq!(
            v[0],
            Violation::ConflictingArguments {
                name: "tcp".to_string(),
                other: "udp".to_string()
            }
        );
    }

    #[test]
    fn all_findings_are_batched() {
        let reg = registry();
        let err = reg
            .parse_with_env(&["prog", "--port", "80", "--listen"], &NoEnv)
            .unwrap_err();
        let kinds: Vec<ErrorKind> = err.violations().iter().map(Violation::kind).collect();
        assert_eq!(
            kinds,
            [ErrorKind::MissingDependency, ErrorKind::UnsatisfiedAlternative]
        );
    }

    #[test]
    fn satisfied_relations_pass() {
        let reg = registry();
        let m = reg
            .parse_with_env(
                &["prog", "--listen", "--udp", "--port", "80", "--host", "h"],
                &NoEnv,
            )
            .unwrap();
        assert!(check_constraints(&reg, &m).is_empty());
    }

    #[test]
    fn defaults_do_not_count_as_provided() {
        let mut reg = Registry::new();
        reg.register(ArgumentSpec::new("a").mandated(["b"])).unwrap();
        reg.register(ArgumentSpec::new("b").takes_value().default_value("x"))
            .unwrap();
        let err = reg.parse_with_env(&["prog", "--a"], &NoEnv).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingDependency);
    }
}
