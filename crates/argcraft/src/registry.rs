//! Owner of every declared argument and the lookup indexes over them.

use std::collections::HashMap;

use crate::error::RegistrationError;
use crate::spec::{ArgumentSpec, PositionalSpec};

/// Index of an [`ArgumentSpec`] inside its [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArgId(pub(crate) usize);

/// The set of declarations a parse runs against.
///
/// Named arguments are append-only. Positionals live in two ordered groups:
/// required ones are consumed first, then optional ones.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    args: Vec<ArgumentSpec>,
    long: HashMap<String, ArgId>,
    short: HashMap<char, ArgId>,
    required: Vec<PositionalSpec>,
    optional: Vec<PositionalSpec>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named argument.
    ///
    /// Fails if the spec is inconsistent on its own, or if its name, an alias
    /// or a short form is already taken by another argument.
    pub fn register(&mut self, spec: ArgumentSpec) -> Result<ArgId, RegistrationError> {
        spec.check()?;

        let mut keys: Vec<&str> = vec![spec.name.as_str()];
        for alias in &spec.aliases {
            if alias != &spec.name && !keys.contains(&alias.as_str()) {
                keys.push(alias);
            }
        }
        for key in &keys {
            if let Some(existing) = self.owner_of(key) {
                return Err(RegistrationError::DuplicateName {
                    key: key.to_string(),
                    existing: existing.to_string(),
                });
            }
        }
        for short in &spec.shorts {
            if let Some(id) = self.short.get(short) {
                return Err(RegistrationError::DuplicateName {
                    key: format!("-{short}"),
                    existing: self.args[id.0].name.clone(),
                });
            }
        }

        let id = ArgId(self.args.len());
        for key in keys {
            self.long.insert(key.to_string(), id);
        }
        for short in &spec.shorts {
            self.short.insert(*short, id);
        }
        tracing::trace!(name = %spec.name, "registered argument");
        self.args.push(spec);
        Ok(id)
    }

    /// Place a required positional at `position`.
    ///
    /// `position == count` appends, `position < count` replaces the spec in
    /// that slot, anything larger is out of range.
    pub fn register_positional(
        &mut self,
        mut spec: PositionalSpec,
        position: isize,
    ) -> Result<(), RegistrationError> {
        if position < 0 {
            return Err(RegistrationError::NegativePosition {
                name: spec.name.clone(),
                position,
            });
        }
        let position = position as usize;
        let next = self.required.len();
        if position > next {
            return Err(RegistrationError::PositionOutOfRange { position, next });
        }
        spec.check()?;

        let replacing = self.required.get(position).map(|p| p.name.as_str());
        if replacing != Some(spec.name.as_str()) {
            if let Some(existing) = self.owner_of(&spec.name) {
                return Err(RegistrationError::DuplicateName {
                    key: spec.name.clone(),
                    existing: existing.to_string(),
                });
            }
        }

        spec.index = position;
        let mut required = self.required.clone();
        if position == next {
            required.push(spec);
        } else {
            required[position] = spec;
        }
        check_variadic(&required, &self.optional)?;
        self.required = required;
        Ok(())
    }

    /// Move a required positional into the optional group.
    ///
    /// Remaining required positionals keep their relative order and are
    /// renumbered; the optional group stays ordered by position.
    pub fn make_optional(&mut self, name: &str) -> Result<(), RegistrationError> {
        let Some(at) = self.required.iter().position(|p| p.name == name) else {
            if self.optional.iter().any(|p| p.name == name) {
                return Err(RegistrationError::NotRequired {
                    name: name.to_string(),
                });
            }
            return Err(RegistrationError::NotPositional {
                name: name.to_string(),
            });
        };

        let mut required = self.required.clone();
        let moved = required.remove(at);
        let mut optional = self.optional.clone();
        let slot = optional
            .iter()
            .position(|p| p.index > moved.index)
            .unwrap_or(optional.len());
        optional.insert(slot, moved);
        for (i, p) in required.iter_mut().enumerate() {
            p.index = i;
        }
        check_variadic(&required, &optional)?;

        self.required = required;
        self.optional = optional;
        Ok(())
    }

    /// Look up a token body (prefix already stripped).
    ///
    /// Single-character bodies try short forms first, then long names and aliases.
    pub fn find_by_token(&self, body: &str) -> Option<ArgId> {
        let mut chars = body.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(id) = self.short.get(&c) {
                return Some(*id);
            }
        }
        self.long.get(body).copied()
    }

    pub fn find_short(&self, c: char) -> Option<ArgId> {
        self.short.get(&c).copied()
    }

    /// Look up a named argument by canonical name or alias.
    pub fn get(&self, name: &str) -> Option<&ArgumentSpec> {
        self.long.get(name).map(|id| &self.args[id.0])
    }

    pub fn arg(&self, id: ArgId) -> &ArgumentSpec {
        &self.args[id.0]
    }

    pub fn arguments(&self) -> &[ArgumentSpec] {
        &self.args
    }

    pub fn required_positionals(&self) -> &[PositionalSpec] {
        &self.required
    }

    pub fn optional_positionals(&self) -> &[PositionalSpec] {
        &self.optional
    }

    pub fn positional(&self, name: &str) -> Option<&PositionalSpec> {
        self.positionals().find(|p| p.name == name)
    }

    /// Required positionals followed by optional ones, in consumption order.
    pub fn positionals(&self) -> impl Iterator<Item = &PositionalSpec> {
        self.required.iter().chain(self.optional.iter())
    }

    /// Whether `name` is the canonical name of any argument or positional.
    pub fn contains(&self, name: &str) -> bool {
        self.args.iter().any(|a| a.name == name) || self.positional(name).is_some()
    }

    /// Check that every relation points at a declared argument.
    pub fn validate_references(&self) -> Result<(), RegistrationError> {
        for arg in &self.args {
            let relations = [
                ("conflicts with", &arg.conflicts_with),
                ("requires", &arg.mandated),
                ("requires one of", &arg.requires_one_of),
            ];
            for (relation, names) in relations {
                if let Some(other) = names.iter().find(|n| !self.contains(n)) {
                    return Err(RegistrationError::UnknownReference {
                        name: arg.name.clone(),
                        relation,
                        other: other.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn owner_of(&self, key: &str) -> Option<&str> {
        if let Some(id) = self.long.get(key) {
            return Some(&self.args[id.0].name);
        }
        self.positional(key).map(|p| p.name.as_str())
    }
}

fn check_variadic(
    required: &[PositionalSpec],
    optional: &[PositionalSpec],
) -> Result<(), RegistrationError> {
    let mut seen: Option<&str> = None;
    for group in [required, optional] {
        for (i, p) in group.iter().enumerate() {
            if !p.is_variadic() {
                continue;
            }
            if seen.is_some() || i + 1 != group.len() {
                return Err(RegistrationError::VariadicPlacement {
                    name: p.name.clone(),
                });
            }
            seen = Some(&p.name);
        }
    }
    Ok(())
}
