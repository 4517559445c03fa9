//! Core types shared across the generator: configuration, per-class metadata,
//! and the insertion-ordered class registry threaded through one run.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

// ---------------------------------------------------------------------------
// Generator configuration — replaces hardcoded marker names
// ---------------------------------------------------------------------------

/// Runtime configuration for a generator run. Loaded from `.reflgen.toml` or defaults.
#[derive(Debug, Clone)]
pub struct GenConfig {
    /// Attribute names accepted inside `[[...]]` as the reflection marker.
    pub refl_attributes: Vec<String>,
    /// Any of these appearing in a class body makes the class a component.
    pub component_markers: Vec<String>,
    /// Macro whose parenthesized argument list names the implemented bases.
    pub impls_macro: String,
    /// Sentinel base added to every component.
    pub component_base: String,
    /// Keywords that open a class declaration.
    pub class_keywords: Vec<String>,
    /// Keyword erased before scanning (`class Foo final : ...`).
    pub strip_keyword: String,
}

impl GenConfig {
    pub fn new() -> Self {
        Self {
            refl_attributes: ["refl", "akari::refl"].iter().map(|s| s.to_string()).collect(),
            component_markers: ["AKR_DECL_COMP", "AKR_IMPLS"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            impls_macro: "AKR_IMPLS".to_string(),
            component_base: "Component".to_string(),
            class_keywords: vec!["class".to_string()],
            strip_keyword: "final".to_string(),
        }
    }
}

impl Default for GenConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Per-class metadata
// ---------------------------------------------------------------------------

/// Everything the emitter needs to know about one reflected class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassMeta {
    pub name: String,
    /// Reflected fields in first-occurrence order.
    pub fields: Vec<String>,
    /// Reflected methods in first-occurrence order; starts with `commit` for components.
    pub methods: Vec<String>,
    /// Implemented bases. Sorted so the generated code is stable across runs.
    pub bases: BTreeSet<String>,
    pub is_component: bool,
}

impl ClassMeta {
    pub fn new(name: impl Into<String>) -> Self {
        ClassMeta {
            name: name.into(),
            fields: Vec::new(),
            methods: Vec::new(),
            bases: BTreeSet::new(),
            is_component: false,
        }
    }
}

/// Drop repeated entries, keeping the first occurrence of each.
pub fn dedup_preserving_order(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

// ---------------------------------------------------------------------------
// Class registry (accumulator for one run)
// ---------------------------------------------------------------------------

/// Insertion-ordered map of class name → metadata.
///
/// Re-inserting an existing name replaces the record but keeps its original
/// position, so emission order is the order classes were first discovered.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ClassRegistry {
    classes: Vec<ClassMeta>,
    #[serde(skip)]
    name_index: HashMap<String, usize>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the one it replaced (if any).
    pub fn insert(&mut self, meta: ClassMeta) -> Option<ClassMeta> {
        match self.name_index.get(&meta.name) {
            Some(&idx) => Some(std::mem::replace(&mut self.classes[idx], meta)),
            None => {
                self.name_index.insert(meta.name.clone(), self.classes.len());
                self.classes.push(meta);
                None
            }
        }
    }

    /// Look up a class by name.
    pub fn get(&self, name: &str) -> Option<&ClassMeta> {
        self.name_index.get(name).map(|&i| &self.classes[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClassMeta> {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl<'a> IntoIterator for &'a ClassRegistry {
    type Item = &'a ClassMeta;
    type IntoIter = std::slice::Iter<'a, ClassMeta>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first_occurrence_order() {
        let mut items: Vec<String> =
            ["b", "a", "b", "c", "a"].iter().map(|s| s.to_string()).collect();
        dedup_preserving_order(&mut items);
        assert_eq!(items, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_registry_last_write_wins_in_place() {
        let mut reg = ClassRegistry::new();
        reg.insert(ClassMeta::new("Foo"));
        reg.insert(ClassMeta::new("Bar"));

        let mut replacement = ClassMeta::new("Foo");
        replacement.fields.push("x".to_string());
        let old = reg.insert(replacement);

        assert!(old.is_some_and(|m| m.fields.is_empty()), "old record should be returned");
        assert_eq!(reg.len(), 2);
        let names: Vec<&str> = reg.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Foo", "Bar"], "replaced class should keep its position");
        assert_eq!(reg.get("Foo").map(|m| m.fields.clone()), Some(vec!["x".to_string()]));
    }

    #[test]
    fn test_default_config_matches_akari_markers() {
        let config = GenConfig::default();
        assert!(config.refl_attributes.iter().any(|a| a == "refl"));
        assert!(config.refl_attributes.iter().any(|a| a == "akari::refl"));
        assert_eq!(config.impls_macro, "AKR_IMPLS");
        assert_eq!(config.component_base, "Component");
        assert_eq!(config.strip_keyword, "final");
    }
}
