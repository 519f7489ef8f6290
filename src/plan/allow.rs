//! # Allow-lists
//!
//! An allow-list is an ordered set of entries, each either a plain name or
//! an operation declaring the names it handles. An empty allow-list means
//! unrestricted mode.
//!
//! The union of declared names is computed once when the list is built, so
//! per-request validation is a set lookup.

use std::collections::HashSet;

use tracing::debug;

use crate::spec::QuerySpec;

use super::errors::{PlanError, PlanResult};
use super::filters::AllowedFilter;
use super::sorts::AllowedSort;

/// An entry that can appear in an [`AllowList`]
pub trait AllowEntry {
    /// Every name this entry accepts
    fn declared_names(&self) -> Vec<&str>;
}

impl AllowEntry for String {
    fn declared_names(&self) -> Vec<&str> {
        vec![self.as_str()]
    }
}

/// Ordered allow-list with a precomputed name index
#[derive(Debug, Clone)]
pub struct AllowList<T> {
    entries: Vec<T>,
    names: HashSet<String>,
    malformed: Option<String>,
}

impl<T: AllowEntry> AllowList<T> {
    pub fn new(entries: Vec<T>) -> Self {
        let mut names = HashSet::new();
        let mut malformed = None;

        for (index, entry) in entries.iter().enumerate() {
            let declared = entry.declared_names();
            if malformed.is_none() {
                if declared.is_empty() {
                    malformed = Some(format!("allow-list entry #{} declares no names", index));
                } else if declared.iter().any(|name| name.is_empty()) {
                    malformed = Some(format!("allow-list entry #{} declares an empty name", index));
                }
            }
            names.extend(declared.into_iter().map(str::to_string));
        }

        Self {
            entries,
            names,
            malformed,
        }
    }

    /// Whether `name` is declared by any entry
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Reject lists holding an entry that declares nothing usable
    pub fn check_structure(&self) -> PlanResult<()> {
        match &self.malformed {
            Some(reason) => Err(PlanError::configuration(reason.clone())),
            None => Ok(()),
        }
    }
}

impl<T> AllowList<T> {
    /// An empty, unrestricted list
    pub fn unrestricted() -> Self {
        Self {
            entries: Vec::new(),
            names: HashSet::new(),
            malformed: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }
}

impl<T> Default for AllowList<T> {
    fn default() -> Self {
        Self::unrestricted()
    }
}

impl<T: AllowEntry> FromIterator<T> for AllowList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<T: AllowEntry> From<Vec<T>> for AllowList<T> {
    fn from(entries: Vec<T>) -> Self {
        Self::new(entries)
    }
}

/// Check every supplied filter key against the filter allow-list
pub fn validate_filters(spec: &QuerySpec, allow: &AllowList<AllowedFilter>) -> PlanResult<()> {
    if allow.is_empty() {
        return Ok(());
    }
    allow.check_structure()?;

    for key in spec.filters.keys() {
        if !allow.contains(key) {
            debug!(filter = %key, "filter rejected by allow-list");
            return Err(PlanError::InvalidFilter(key.clone()));
        }
    }

    Ok(())
}

/// Check every supplied sort name against the sort allow-list
pub fn validate_sorts(spec: &QuerySpec, allow: &AllowList<AllowedSort>) -> PlanResult<()> {
    if allow.is_empty() {
        return Ok(());
    }
    allow.check_structure()?;

    for directive in &spec.sort {
        if !allow.contains(&directive.name) {
            debug!(sort = %directive.name, "sort rejected by allow-list");
            return Err(PlanError::InvalidSort(directive.name.clone()));
        }
    }

    Ok(())
}
