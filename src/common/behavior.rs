// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/duckdb-behavioral)

//! Behavior name interning.
//!
//! Patterns and events refer to behaviors by name, but matching compares
//! them once per event per leaf. Names are interned into a [`BehaviorId`]
//! so each comparison is a single integer equality.
//!
//! The registry is an explicit value. Whoever compiles patterns and builds
//! events owns one and passes it to both, so two registries never share ids.

use std::collections::HashMap;
use std::fmt;

/// Interned identifier of a behavior name.
///
/// Two ids are equal iff they were produced by the same [`BehaviorRegistry`]
/// for the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BehaviorId(usize);

impl BehaviorId {
    /// Position of the name in its registry.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for BehaviorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Append-only name → id table.
#[derive(Debug, Clone, Default)]
pub struct BehaviorRegistry {
    names: Vec<Box<str>>,
    ids: HashMap<Box<str>, BehaviorId>,
}

impl BehaviorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `name`, assigning the next free id on first sight.
    ///
    /// # Examples
    ///
    /// ```
    /// use behavior_pattern::common::behavior::BehaviorRegistry;
    ///
    /// let mut registry = BehaviorRegistry::new();
    /// let a = registry.intern("login");
    /// assert_eq!(registry.intern("login"), a);
    /// assert_ne!(registry.intern("logout"), a);
    /// ```
    pub fn intern(&mut self, name: &str) -> BehaviorId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = BehaviorId(self.names.len());
        self.names.push(name.into());
        self.ids.insert(name.into(), id);
        id
    }

    /// Looks up an already-interned name without inserting it.
    pub fn get(&self, name: &str) -> Option<BehaviorId> {
        self.ids.get(name).copied()
    }

    /// Returns the name behind `id`, or `None` if `id` came from another registry.
    pub fn name(&self, id: BehaviorId) -> Option<&str> {
        self.names.get(id.0).map(AsRef::as_ref)
    }

    /// Number of distinct names interned so far.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no name has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_dense_and_stable() {
        let mut registry = BehaviorRegistry::new();
        let a = registry.intern("A");
        let b = registry.intern("B");
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(registry.intern("A"), a);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_get_does_not_insert() {
        let mut registry = BehaviorRegistry::new();
        assert!(registry.get("A").is_none());
        assert!(registry.is_empty());
        let a = registry.intern("A");
        assert_eq!(registry.get("A"), Some(a));
    }

    #[test]
    fn test_name_roundtrip() {
        let mut registry = BehaviorRegistry::new();
        let id = registry.intern("page view");
        assert_eq!(registry.name(id), Some("page view"));
        assert_eq!(registry.name(BehaviorId(42)), None);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut registry = BehaviorRegistry::new();
        assert_ne!(registry.intern("click"), registry.intern("Click"));
    }

    #[test]
    fn test_registries_are_independent() {
        let mut first = BehaviorRegistry::new();
        let mut second = BehaviorRegistry::new();
        second.intern("other");
        let in_first = first.intern("A");
        let in_second = second.intern("A");
        assert_ne!(in_first, in_second);
    }
}
