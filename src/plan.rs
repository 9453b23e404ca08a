//! Substitution plan
//!
//! Resolves the registry and an optional override source into the ordered
//! pair lists the rewriter scans. Pure logic, no I/O.

use tracing::info;

use crate::overrides::{OverridePair, ParsedOverrides};
use crate::registry::MacroRegistry;

/// Where a resolved required value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Override,
    Default,
}

/// The effective pairs for one rewriting pass.
///
/// # Invariants
///
/// - `required` holds exactly one pair per registry required entry, in
///   registry order.
/// - `optional` order is the order the pairs were supplied in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionPlan {
    pub required: Vec<OverridePair>,
    pub optional: Vec<OverridePair>,
    /// Parallel to `required`
    pub sources: Vec<ValueSource>,
}

impl SubstitutionPlan {
    /// Registry defaults only; optional pairs come from the optional registry
    pub fn from_registry(registry: &MacroRegistry) -> Self {
        Self {
            required: registry.required().iter().map(|e| e.to_pair()).collect(),
            optional: registry.optional().iter().map(|e| e.to_pair()).collect(),
            sources: vec![ValueSource::Default; registry.required().len()],
        }
    }

    /// Registry required entries resolved against an override source.
    ///
    /// The first override for a name wins. Required macros missing from the
    /// source fall back to the registry default. Optional pairs are taken from
    /// the source unchanged.
    pub fn resolve(registry: &MacroRegistry, overrides: &ParsedOverrides) -> Self {
        let mut required = Vec::with_capacity(registry.required().len());
        let mut sources = Vec::with_capacity(registry.required().len());

        for entry in registry.required() {
            match overrides.required_value(&entry.name) {
                Some(value) => {
                    required.push(OverridePair::new(&entry.name, value));
                    sources.push(ValueSource::Override);
                }
                None => {
                    info!(
                        "{} macro not found in external setup file. Assigning default value: {}",
                        entry.name, entry.default_value
                    );
                    required.push(entry.to_pair());
                    sources.push(ValueSource::Default);
                }
            }
        }

        Self {
            required,
            optional: overrides.optional.clone(),
            sources,
        }
    }

    /// Required macros that fell back to their registry default
    pub fn defaulted(&self) -> impl Iterator<Item = &OverridePair> {
        self.required
            .iter()
            .zip(self.sources.iter())
            .filter(|(_, s)| **s == ValueSource::Default)
            .map(|(p, _)| p)
    }

    /// Resolved value for a macro, required pairs first
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.required
            .iter()
            .chain(self.optional.iter())
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// One line per pair, in the form the CLI `plan` command prints
    pub fn describe(&self, include_optional: bool) -> Vec<String> {
        let optional: &[OverridePair] = if include_optional { &self.optional } else { &[] };
        self.required
            .iter()
            .chain(optional.iter())
            .map(|p| {
                format!(
                    "A value of '{}' will be assigned to the '{}' macro.",
                    p.value, p.name
                )
            })
            .collect()
    }
}
