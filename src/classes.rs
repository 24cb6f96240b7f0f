// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Path classes - canonical, hierarchically derived classification labels
//!
//! Every label lives in a [`PathClassRegistry`] arena and is addressed by a
//! [`PathClassKey`]. The registry guarantees that each derived id string has
//! exactly one record, so two keys are equal exactly when they name the same
//! label.

use crate::color::{self, Rgb};
use crate::error::{CatalogError, Result};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Separator joining a parent id and a child name
pub const DERIVED_SEPARATOR: &str = ": ";

/// Source of registry ids; each registry gets its own
static NEXT_REGISTRY: AtomicU64 = AtomicU64::new(1);

/// Handle to a label record inside a [`PathClassRegistry`].
///
/// A key is only valid in the registry that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathClassKey {
    registry: u64,
    index: usize,
}

#[derive(Debug, Clone)]
struct PathClassRecord {
    name: Option<String>,
    parent: Option<PathClassKey>,
    id: String,
    argb: u32,
}

/// Arena of canonical path classes
#[derive(Debug)]
pub struct PathClassRegistry {
    id: u64,
    records: Vec<PathClassRecord>,
    by_id: HashMap<String, PathClassKey>,
}

impl Default for PathClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PathClassRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_REGISTRY.fetch_add(1, AtomicOrdering::Relaxed),
            records: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    fn key_at(&self, index: usize) -> PathClassKey {
        PathClassKey {
            registry: self.id,
            index,
        }
    }

    /// Compute the derived id for `name` under `parent`
    #[must_use]
    pub fn derived_id(parent_id: Option<&str>, name: Option<&str>) -> String {
        match (parent_id, name) {
            (Some(parent), Some(name)) => format!("{parent}{DERIVED_SEPARATOR}{name}"),
            (None, Some(name)) => name.to_string(),
            (_, None) => String::new(),
        }
    }

    /// Get or create the root class `name`
    pub fn create(&mut self, name: &str) -> Result<PathClassKey> {
        self.create_with(Some(name), None, None, true)
    }

    /// Get or create `name` derived from `parent`
    pub fn derive(&mut self, parent: PathClassKey, name: &str) -> Result<PathClassKey> {
        self.create_with(Some(name), None, Some(parent), true)
    }

    /// The null class (no name, no parent)
    pub fn null_class(&mut self) -> PathClassKey {
        match self.by_id.get("") {
            Some(&key) => key,
            None => self.insert(None, None, String::new(), None),
        }
    }

    /// Return the canonical class for `(parent, name)`, creating it if needed.
    ///
    /// With `exist_ok = false` an existing id is an error. An existing record
    /// keeps its color; `color` only applies to new records, which otherwise
    /// get a color derived from their id.
    pub fn create_with(
        &mut self,
        name: Option<&str>,
        color: Option<Rgb>,
        parent: Option<PathClassKey>,
        exist_ok: bool,
    ) -> Result<PathClassKey> {
        if name.is_none() && parent.is_some() {
            return Err(CatalogError::InvalidArgument(
                "cannot create a derived path class with name=None".into(),
            ));
        }
        if let Some(name) = name {
            if name.is_empty() {
                return Err(CatalogError::InvalidArgument(
                    "path class name must not be empty".into(),
                ));
            }
        }
        let parent_id = match parent {
            Some(key) => Some(self.record(key)?.id.clone()),
            None => None,
        };
        let id = Self::derived_id(parent_id.as_deref(), name);

        if let Some(&existing) = self.by_id.get(&id) {
            if !exist_ok {
                return Err(CatalogError::AlreadyExists { id });
            }
            return Ok(existing);
        }

        tracing::debug!("Creating path class '{}'", id);
        Ok(self.insert(name.map(String::from), parent, id, color))
    }

    fn insert(
        &mut self,
        name: Option<String>,
        parent: Option<PathClassKey>,
        id: String,
        color: Option<Rgb>,
    ) -> PathClassKey {
        let rgb = color.unwrap_or_else(|| default_color(&id));
        let key = self.key_at(self.records.len());
        self.by_id.insert(id.clone(), key);
        self.records.push(PathClassRecord {
            name,
            parent,
            id,
            argb: color::make_rgb(rgb.r, rgb.g, rgb.b),
        });
        key
    }

    fn check_key(&self, key: PathClassKey) -> Result<usize> {
        if key.registry != self.id {
            return Err(CatalogError::InvalidArgument(format!(
                "path class key {} belongs to another registry",
                key.index
            )));
        }
        if key.index >= self.records.len() {
            return Err(CatalogError::InvalidArgument(format!(
                "unknown path class key {}",
                key.index
            )));
        }
        Ok(key.index)
    }

    fn record(&self, key: PathClassKey) -> Result<&PathClassRecord> {
        let index = self.check_key(key)?;
        Ok(&self.records[index])
    }

    fn record_mut(&mut self, key: PathClassKey) -> Result<&mut PathClassRecord> {
        let index = self.check_key(key)?;
        Ok(&mut self.records[index])
    }

    /// View a class by key
    pub fn get(&self, key: PathClassKey) -> Result<PathClass<'_>> {
        self.record(key)?;
        Ok(PathClass { registry: self, key })
    }

    /// Look up a class by its derived id
    #[must_use]
    pub fn find(&self, id: &str) -> Option<PathClass<'_>> {
        self.by_id
            .get(id)
            .map(|&key| PathClass { registry: self, key })
    }

    /// True if a canonical class exists for `id`
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Number of canonical classes
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no class was created yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All classes in creation order
    pub fn iter(&self) -> impl Iterator<Item = PathClass<'_>> {
        (0..self.records.len()).map(move |i| PathClass {
            registry: self,
            key: self.key_at(i),
        })
    }

    /// Replace the RGB part of a class color, keeping its alpha
    pub fn set_color(&mut self, key: PathClassKey, rgb: Rgb) -> Result<()> {
        let record = self.record_mut(key)?;
        let a = color::alpha(record.argb);
        record.argb = color::make_rgba(rgb.r, rgb.g, rgb.b, a);
        Ok(())
    }

    /// Replace the alpha of a class color (0.0-1.0), keeping its RGB part
    pub fn set_alpha(&mut self, key: PathClassKey, alpha: f64) -> Result<()> {
        let a = color::alpha_channel(alpha)?;
        let record = self.record_mut(key)?;
        let rgb = Rgb::from_argb(record.argb);
        record.argb = color::make_rgba(rgb.r, rgb.g, rgb.b, a);
        Ok(())
    }

    /// Overwrite the packed ARGB value of a class
    pub(crate) fn set_argb(&mut self, key: PathClassKey, argb: u32) -> Result<()> {
        self.record_mut(key)?.argb = argb;
        Ok(())
    }

    /// Names from the origin down to `key`, empty for the null class
    pub(crate) fn lineage(&self, key: PathClassKey) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut current = Some(key);
        while let Some(k) = current {
            let record = self.record(k)?;
            if let Some(name) = &record.name {
                names.push(name.clone());
            }
            current = record.parent;
        }
        names.reverse();
        Ok(names)
    }

    /// Recreate a class from its lineage, creating missing ancestors
    pub(crate) fn resolve_lineage(&mut self, names: &[String]) -> Result<PathClassKey> {
        if names.is_empty() {
            return Ok(self.null_class());
        }
        let mut parent = None;
        for name in names {
            parent = Some(self.create_with(Some(name), None, parent, true)?);
        }
        parent.ok_or_else(|| CatalogError::InvalidArgument("empty lineage".into()))
    }
}

/// Deterministic color for classes created without one
fn default_color(id: &str) -> Rgb {
    let digest = Sha256::digest(id.as_bytes());
    Rgb::new(digest[0], digest[1], digest[2])
}

/// Borrowed view of a canonical class
#[derive(Clone, Copy)]
pub struct PathClass<'a> {
    registry: &'a PathClassRegistry,
    key: PathClassKey,
}

impl<'a> PathClass<'a> {
    fn record(&self) -> &'a PathClassRecord {
        &self.registry.records[self.key.index]
    }

    /// Arena key of this class
    #[must_use]
    pub fn key(&self) -> PathClassKey {
        self.key
    }

    /// Own name, `None` for the null class
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        self.record().name.as_deref()
    }

    /// Canonical derived id
    #[must_use]
    pub fn id(&self) -> &'a str {
        &self.record().id
    }

    /// Direct parent
    #[must_use]
    pub fn parent(&self) -> Option<PathClass<'a>> {
        self.record().parent.map(|key| PathClass {
            registry: self.registry,
            key,
        })
    }

    /// Root ancestor; the class itself when it has no parent
    #[must_use]
    pub fn origin(&self) -> PathClass<'a> {
        let mut current = *self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// True if `other` is a strict ancestor of this class
    #[must_use]
    pub fn is_derived_from(&self, other: &PathClass<'_>) -> bool {
        let mut current = self.parent();
        while let Some(class) = current {
            if class.same_as(other) {
                return true;
            }
            current = class.parent();
        }
        false
    }

    /// True if this class is a strict ancestor of `other`
    #[must_use]
    pub fn is_ancestor_of(&self, other: &PathClass<'_>) -> bool {
        other.is_derived_from(self)
    }

    /// RGB part of the color
    #[must_use]
    pub fn color(&self) -> Rgb {
        Rgb::from_argb(self.record().argb)
    }

    /// Alpha normalised to 0.0-1.0
    #[must_use]
    pub fn alpha(&self) -> f64 {
        f64::from(color::alpha(self.record().argb)) / 255.0
    }

    /// Packed ARGB value
    #[must_use]
    pub fn argb(&self) -> u32 {
        self.record().argb
    }

    /// False only for the null class
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.record().name.is_some()
    }

    /// True if the class has a parent
    #[must_use]
    pub fn is_derived_class(&self) -> bool {
        self.record().parent.is_some()
    }

    /// Order two classes by id
    #[must_use]
    pub fn compare(&self, other: &PathClass<'_>) -> Ordering {
        self.id().cmp(other.id())
    }
}

impl PathClass<'_> {
    fn same_as(&self, other: &PathClass<'_>) -> bool {
        std::ptr::eq(self.registry, other.registry) && self.key == other.key
    }
}

impl PartialEq for PathClass<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for PathClass<'_> {}

impl fmt::Debug for PathClass<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<PathClass '{}'>", self.id())
    }
}

impl fmt::Display for PathClass<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_create_returns_canonical_key() {
        let mut registry = PathClassRegistry::new();
        let a = registry.create("Tumor").unwrap();
        let b = registry.create("Tumor").unwrap();
        assert_eq!(a, b);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_exist_ok_false_rejects_duplicates() {
        let mut registry = PathClassRegistry::new();
        registry.create("Stroma").unwrap();
        let err = registry
            .create_with(Some("Stroma"), None, None, false)
            .unwrap_err();
        assert!(matches!(err, CatalogError::AlreadyExists { ref id } if id == "Stroma"));
    }

    #[test]
    fn test_null_name_cannot_have_parent() {
        let mut registry = PathClassRegistry::new();
        let parent = registry.create("Tumor").unwrap();
        let err = registry
            .create_with(None, None, Some(parent), true)
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidArgument(_)));
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let mut other = PathClassRegistry::new();
        other.create("a").unwrap();
        let foreign = other.create("b").unwrap();

        let mut registry = PathClassRegistry::new();
        let err = registry.derive(foreign, "child").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidArgument(_)));
    }

    #[test]
    fn test_foreign_keys_are_rejected_by_populated_registry() {
        let mut standalone = PathClassRegistry::new();
        let tumor = standalone.create("Tumor").unwrap();

        let mut registry = PathClassRegistry::new();
        let stroma = registry.create("Stroma").unwrap();
        assert_ne!(tumor, stroma);

        assert!(matches!(registry.get(tumor), Err(CatalogError::InvalidArgument(_))));
        assert!(matches!(
            registry.derive(tumor, "Positive"),
            Err(CatalogError::InvalidArgument(_))
        ));
        assert!(registry.set_alpha(tumor, 0.5).is_err());
        assert!(registry.lineage(tumor).is_err());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(stroma).unwrap().id(), "Stroma");
    }

    #[test]
    fn test_derived_id_and_origin() {
        let mut registry = PathClassRegistry::new();
        let tumor = registry.create("Tumor").unwrap();
        let positive = registry.derive(tumor, "Positive").unwrap();
        let strong = registry.derive(positive, "3+").unwrap();

        let view = registry.get(strong).unwrap();
        assert_eq!(view.id(), "Tumor: Positive: 3+");
        assert_eq!(view.name(), Some("3+"));
        assert_eq!(view.origin().key(), tumor);
        assert!(view.is_derived_class());

        let root = registry.get(tumor).unwrap();
        assert_eq!(root.origin(), root);
        assert!(!root.is_derived_class());
    }

    #[test]
    fn test_ancestry_is_strict() {
        let mut registry = PathClassRegistry::new();
        let tumor = registry.create("Tumor").unwrap();
        let positive = registry.derive(tumor, "Positive").unwrap();
        let stroma = registry.create("Stroma").unwrap();

        let tumor = registry.get(tumor).unwrap();
        let positive = registry.get(positive).unwrap();
        let stroma = registry.get(stroma).unwrap();

        assert!(positive.is_derived_from(&tumor));
        assert!(tumor.is_ancestor_of(&positive));
        assert!(!tumor.is_derived_from(&tumor));
        assert!(!positive.is_derived_from(&stroma));
        assert!(!stroma.is_ancestor_of(&positive));
    }

    #[test]
    fn test_color_and_alpha_preserve_each_other() {
        let mut registry = PathClassRegistry::new();
        let key = registry
            .create_with(Some("Immune"), Some(Rgb::new(1, 2, 3)), None, true)
            .unwrap();
        assert_eq!(registry.get(key).unwrap().color(), Rgb::new(1, 2, 3));
        assert!((registry.get(key).unwrap().alpha() - 1.0).abs() < f64::EPSILON);

        registry.set_alpha(key, 0.5).unwrap();
        assert_eq!(registry.get(key).unwrap().color(), Rgb::new(1, 2, 3));

        registry.set_color(key, Rgb::new(200, 100, 50)).unwrap();
        let view = registry.get(key).unwrap();
        assert_eq!(view.color(), Rgb::new(200, 100, 50));
        assert!((view.alpha() - 127.0 / 255.0).abs() < 1e-9);
    }

    #[test]
    fn test_existing_class_keeps_color() {
        let mut registry = PathClassRegistry::new();
        let key = registry
            .create_with(Some("Necrosis"), Some(Rgb::new(9, 9, 9)), None, true)
            .unwrap();
        let again = registry
            .create_with(Some("Necrosis"), Some(Rgb::new(1, 1, 1)), None, true)
            .unwrap();
        assert_eq!(key, again);
        assert_eq!(registry.get(key).unwrap().color(), Rgb::new(9, 9, 9));
    }

    #[test]
    fn test_default_color_is_deterministic() {
        let mut a = PathClassRegistry::new();
        let mut b = PathClassRegistry::new();
        let ka = a.create("Other").unwrap();
        let kb = b.create("Other").unwrap();
        assert_eq!(a.get(ka).unwrap().color(), b.get(kb).unwrap().color());
    }

    #[test]
    fn test_null_class() {
        let mut registry = PathClassRegistry::new();
        let null = registry.null_class();
        assert_eq!(registry.null_class(), null);
        let view = registry.get(null).unwrap();
        assert!(!view.is_valid());
        assert_eq!(view.id(), "");
        assert_eq!(view.name(), None);
    }

    #[test]
    fn test_lineage_round_trip() {
        let mut registry = PathClassRegistry::new();
        let tumor = registry.create("Tumor").unwrap();
        let positive = registry.derive(tumor, "Positive").unwrap();
        let lineage = registry.lineage(positive).unwrap();
        assert_eq!(lineage, vec!["Tumor".to_string(), "Positive".to_string()]);

        let mut fresh = PathClassRegistry::new();
        let rebuilt = fresh.resolve_lineage(&lineage).unwrap();
        assert_eq!(fresh.get(rebuilt).unwrap().id(), "Tumor: Positive");
        assert_eq!(fresh.len(), 2);
    }

    #[test]
    fn test_equality_is_identity_and_ordering_is_separate() {
        let mut registry = PathClassRegistry::new();
        let a = registry.create("a").unwrap();
        let b = registry.create("b").unwrap();
        let (va, vb) = (registry.get(a).unwrap(), registry.get(b).unwrap());
        assert_ne!(va, vb);
        assert_eq!(va.compare(&vb), Ordering::Less);
        assert_eq!(va.compare(&va), Ordering::Equal);

        let mut other = PathClassRegistry::new();
        let a2 = other.create("a").unwrap();
        // Same id in a different registry is a different label
        assert_ne!(va, other.get(a2).unwrap());
    }

    proptest! {
        #[test]
        fn derived_id_joins_parent_and_name(
            parent in "[A-Za-z][A-Za-z0-9 ]{0,12}",
            name in "[A-Za-z][A-Za-z0-9 ]{0,12}",
        ) {
            let mut registry = PathClassRegistry::new();
            let p = registry.create(&parent).unwrap();
            let c = registry.derive(p, &name).unwrap();
            let child = registry.get(c).unwrap();
            prop_assert_eq!(child.id(), format!("{parent}: {name}"));
            prop_assert_eq!(registry.get(p).unwrap().id(), parent.as_str());
            prop_assert!(child.is_derived_from(&registry.get(p).unwrap()));
            prop_assert!(child.origin().parent().is_none());
        }
    }
}
