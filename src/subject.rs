//! Subject normalization
//!
//! Curriculum documents and user queries spell subjects inconsistently
//! ("math", "maths", "Mathematics", "english_language"). The mapper folds
//! all known surface forms onto one canonical name so that exact-match
//! index filtering works. Unknown subjects pass through unchanged; the
//! retrieval layer tolerates novel subjects rather than rejecting them.

use crate::config::SubjectMappings;
use std::collections::{BTreeMap, BTreeSet};

/// Maps subject surface forms to canonical subject names
#[derive(Debug, Clone)]
pub struct SubjectMapper {
    standard: BTreeSet<String>,
    aliases: BTreeMap<String, String>,
}

impl SubjectMapper {
    /// Build a mapper from configured alias tables
    pub fn new(mappings: &SubjectMappings) -> Self {
        Self {
            standard: mappings.standard_subjects.iter().cloned().collect(),
            aliases: mappings.aliases.clone(),
        }
    }

    /// Convert any subject input to its canonical form.
    ///
    /// Total over strings: lowercases, trims, replaces underscores with
    /// spaces, then resolves aliases. Inputs that are already canonical or
    /// entirely unknown come back unchanged.
    pub fn normalize(&self, subject: &str) -> String {
        let subject = subject.to_lowercase().trim().replace('_', " ");

        if let Some(canonical) = self.aliases.get(&subject) {
            return canonical.clone();
        }

        // Already standard, or unknown: pass through
        subject
    }

    /// Whether a (normalized) subject is one of the standard names
    pub fn is_standard(&self, subject: &str) -> bool {
        self.standard.contains(subject)
    }

    /// All standard subject names
    pub fn standard_subjects(&self) -> Vec<&str> {
        self.standard.iter().map(String::as_str).collect()
    }
}

impl Default for SubjectMapper {
    fn default() -> Self {
        Self::new(&SubjectMappings::default())
    }
}
