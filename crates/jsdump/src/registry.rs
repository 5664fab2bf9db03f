//! Two interned maps — scope status and object status — each owning a "done"
//! table whose Do-level only ever advances (§4.3).
//!
//! The driver only ever dumps bindings in the global scope (§4.6 step 1 resets
//! the scope cursor to global at the start of every file, and nothing in the
//! spec drives a binding in a non-global scope), so unlike `ObjectInfo` this
//! registry keeps a single `ScopeInfo` for the global scope rather than one
//! per live `Scope`. `Scope::outer_scope` is still walked directly (not
//! through this registry) by the shadowing oracle in `dumper`.

use ahash::AHashMap;

use crate::{config::Do, selector::Parts};

/// Dump-status record for the global scope's variable bindings.
#[derive(Debug, Default)]
pub struct ScopeInfo {
    done: AHashMap<String, Do>,
}

impl ScopeInfo {
    #[must_use]
    pub fn current_do(&self, name: &str) -> Option<Do> {
        self.done.get(name).copied()
    }

    /// Raises `name`'s Do-level to `max(existing, requested)`. Never downgrades.
    pub fn advance(&mut self, name: &str, todo: Do) -> Do {
        let entry = self.done.entry(name.to_owned()).or_insert(todo);
        *entry = (*entry).max(todo);
        *entry
    }
}

/// Dump-status record for one live object: its canonical reference (once
/// assigned) and the Do-level reached for each of its own-properties.
#[derive(Debug, Default)]
pub struct ObjectInfo {
    /// The Parts at which this object was first emitted with at least DECL.
    /// Once set, every further mention of the object uses `fromParts(ref)`
    /// and this never changes (§3 `ObjectInfo.ref` invariant).
    reference: Option<Parts>,
    done: AHashMap<String, Do>,
}

impl ObjectInfo {
    #[must_use]
    pub fn reference(&self) -> Option<&Parts> {
        self.reference.as_ref()
    }

    /// Sets the canonical reference. Panics if called twice with different
    /// Parts — `ref` must never change once assigned.
    pub fn set_reference(&mut self, parts: Parts) {
        if let Some(existing) = &self.reference {
            assert_eq!(*existing, parts, "ObjectInfo.ref must never change once set");
            return;
        }
        self.reference = Some(parts);
    }

    #[must_use]
    pub fn current_do(&self, property: &str) -> Option<Do> {
        self.done.get(property).copied()
    }

    pub fn advance(&mut self, property: &str, todo: Do) -> Do {
        let entry = self.done.entry(property.to_owned()).or_insert(todo);
        *entry = (*entry).max(todo);
        *entry
    }
}

/// Owned by the Dumper instance and never exposed outside it (§5): the only
/// shared, mutable state of a dump run.
#[derive(Debug, Default)]
pub struct BindingRegistry<Id> {
    global: ScopeInfo,
    objects: AHashMap<Id, ObjectInfo>,
}

impl<Id: std::hash::Hash + Eq + Copy> BindingRegistry<Id> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global_scope(&mut self) -> &mut ScopeInfo {
        &mut self.global
    }

    pub fn global_scope_ref(&self) -> &ScopeInfo {
        &self.global
    }

    /// Gets or lazily creates the `ObjectInfo` for `id`.
    pub fn object(&mut self, id: Id) -> &mut ObjectInfo {
        self.objects.entry(id).or_default()
    }

    #[must_use]
    pub fn object_ref(&self, id: Id) -> Option<&ObjectInfo> {
        self.objects.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_info_advance_is_monotonic_max() {
        let mut scope = ScopeInfo::default();
        assert_eq!(scope.advance("x", Do::Decl), Do::Decl);
        assert_eq!(scope.advance("x", Do::Skip), Do::Decl, "must never downgrade");
        assert_eq!(scope.advance("x", Do::Recurse), Do::Recurse);
    }

    #[test]
    fn object_info_ref_is_set_once() {
        let mut info = ObjectInfo::default();
        assert!(info.reference().is_none());
        let parts = Parts::to_parts("a").unwrap();
        info.set_reference(parts.clone());
        assert_eq!(info.reference(), Some(&parts));
    }

    #[test]
    #[should_panic(expected = "must never change")]
    fn object_info_ref_cannot_change() {
        let mut info = ObjectInfo::default();
        info.set_reference(Parts::to_parts("a").unwrap());
        info.set_reference(Parts::to_parts("b").unwrap());
    }
}
