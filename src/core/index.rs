//! Lookup from template identity and pool name to bin slot.
//!
//! Only mutated by register/unregister. Spawn and despawn only read it, and
//! name lookups borrow the caller's `&str`, so the hot path never allocates.

use std::collections::HashMap;

use slotmap::new_key_type;

use crate::core::types::TemplateId;
use crate::core::PoolError;

new_key_type! {
    /// Stable slot of a bin in the registry arena.
    pub struct BinKey;
}

/// Secondary index over the registry's bins.
#[derive(Debug, Default)]
pub struct LookupIndex {
    by_template: HashMap<TemplateId, BinKey>,
    by_name: HashMap<String, TemplateId>,
}

impl LookupIndex {
    /// Empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `name` and `template` are both free.
    ///
    /// # Errors
    ///
    /// `DuplicateName` or `DuplicateTemplate`.
    pub fn check_free(&self, name: &str, template: TemplateId) -> Result<(), PoolError> {
        if self.by_name.contains_key(name) {
            return Err(PoolError::DuplicateName(name.to_string()));
        }
        if self.by_template.contains_key(&template) {
            let existing = self
                .by_name
                .iter()
                .find_map(|(n, t)| (*t == template).then(|| n.clone()))
                .unwrap_or_default();
            return Err(PoolError::DuplicateTemplate { template, existing });
        }
        Ok(())
    }

    /// Index a bin. Leaves the index untouched on error.
    ///
    /// # Errors
    ///
    /// `DuplicateName` or `DuplicateTemplate`.
    pub fn insert(
        &mut self,
        name: &str,
        template: TemplateId,
        key: BinKey,
    ) -> Result<(), PoolError> {
        self.check_free(name, template)?;
        self.by_template.insert(template, key);
        self.by_name.insert(name.to_string(), template);
        Ok(())
    }

    /// Remove the entries for `name`, returning its template and slot.
    pub fn remove(&mut self, name: &str) -> Option<(TemplateId, BinKey)> {
        let template = self.by_name.remove(name)?;
        let key = self.by_template.remove(&template)?;
        Some((template, key))
    }

    /// Whether a pool named `name` is indexed.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Whether `template` has a pool.
    #[must_use]
    pub fn contains_template(&self, template: TemplateId) -> bool {
        self.by_template.contains_key(&template)
    }

    /// Slot of the bin for `template`.
    #[must_use]
    pub fn bin_for_template(&self, template: TemplateId) -> Option<BinKey> {
        self.by_template.get(&template).copied()
    }

    /// Template pooled under `name`.
    #[must_use]
    pub fn template_for_name(&self, name: &str) -> Option<TemplateId> {
        self.by_name.get(name).copied()
    }

    /// Slot of the bin named `name`.
    #[must_use]
    pub fn bin_for_name(&self, name: &str) -> Option<BinKey> {
        self.template_for_name(name)
            .and_then(|template| self.bin_for_template(template))
    }

    /// Indexed pool names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// Number of indexed bins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_template.len()
    }

    /// Whether nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_template.is_empty()
    }
}
