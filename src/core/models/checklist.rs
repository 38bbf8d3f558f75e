//! Checklist model
//!
//! A validated, ordered list of rules. Construction enforces that every
//! reference points to a rule defined strictly earlier, so the list is a DAG
//! expressed in execution order and can run front to back.

use std::collections::{HashMap, HashSet};

use glob::Pattern;
use serde::Serialize;

use super::Rule;
use crate::core::error::RuleDefinitionError;

/// An ordered rule list with no forward references and no duplicates
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Checklist {
    rules: Vec<Rule>,
}

impl Checklist {
    /// Validate and wrap a rule list
    ///
    /// Fails on empty names, duplicate names, references to rules that do
    /// not exist, and references to rules that are not defined earlier.
    pub fn new(rules: Vec<Rule>) -> Result<Self, RuleDefinitionError> {
        let all: HashSet<&str> = rules.iter().map(|r| r.name.as_str()).collect();
        let mut defined: HashSet<&str> = HashSet::with_capacity(rules.len());

        for (index, rule) in rules.iter().enumerate() {
            if rule.name.trim().is_empty() {
                return Err(RuleDefinitionError::EmptyName(index));
            }

            for reference in rule.references() {
                if defined.contains(reference) {
                    continue;
                }
                let err = if all.contains(reference) {
                    RuleDefinitionError::ForwardReference {
                        rule: rule.name.clone(),
                        reference: reference.to_string(),
                    }
                } else {
                    RuleDefinitionError::UnknownReference {
                        rule: rule.name.clone(),
                        reference: reference.to_string(),
                    }
                };
                return Err(err);
            }

            if !defined.insert(rule.name.as_str()) {
                return Err(RuleDefinitionError::DuplicateName(rule.name.clone()));
            }
        }

        Ok(Self { rules })
    }

    /// The rules, in execution order
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the checklist is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Look up a rule by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Direct dependencies of a rule
    #[must_use]
    pub fn dependencies(&self, name: &str) -> Vec<&str> {
        self.get(name).map(Rule::references).unwrap_or_default()
    }

    /// Keep only the rules matching any glob pattern, plus everything they
    /// transitively depend on
    ///
    /// Order is preserved. An empty pattern list selects everything.
    pub fn select(&self, patterns: &[String]) -> Result<Self, RuleDefinitionError> {
        if patterns.is_empty() {
            return Ok(self.clone());
        }

        let compiled = patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| RuleDefinitionError::InvalidPattern {
                    pattern: p.clone(),
                    message: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let index: HashMap<&str, &Rule> = self.rules.iter().map(|r| (r.name.as_str(), r)).collect();
        let mut keep: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = self
            .rules
            .iter()
            .filter(|r| compiled.iter().any(|p| p.matches(&r.name)))
            .map(|r| r.name.as_str())
            .collect();

        if stack.is_empty() {
            return Err(RuleDefinitionError::EmptySelection(patterns.join(", ")));
        }

        while let Some(name) = stack.pop() {
            if !keep.insert(name) {
                continue;
            }
            if let Some(rule) = index.get(name) {
                stack.extend(rule.references());
            }
        }

        let rules = self
            .rules
            .iter()
            .filter(|r| keep.contains(r.name.as_str()))
            .cloned()
            .collect();
        Ok(Self { rules })
    }
}

impl<'a> IntoIterator for &'a Checklist {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
