use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use exportdesk_core::{DomainError, DomainResult};

/// Variant identifier.
///
/// Canonical form: a UUID assigned when the variant is created, carried as a
/// string on the wire, and compared with exact equality everywhere.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantId(Uuid);

exportdesk_core::impl_uuid_id!(VariantId, "VariantId");

/// One size/price option nested in a product document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub size: String,
    pub unit: String,
    pub purchasing_price: f64,
}

/// Field values for a variant about to be created or overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantDraft {
    pub size: String,
    pub unit: String,
    pub purchasing_price: f64,
}

impl VariantDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.size.trim().is_empty() {
            return Err(DomainError::validation("size cannot be empty"));
        }
        if self.unit.trim().is_empty() {
            return Err(DomainError::validation("unit cannot be empty"));
        }
        if !self.purchasing_price.is_finite() {
            return Err(DomainError::validation("purchasing_price must be a number"));
        }
        if self.purchasing_price < 0.0 {
            return Err(DomainError::validation("purchasing_price cannot be negative"));
        }
        Ok(())
    }
}

/// Validate a full variant sequence as supplied by a client: every entry must
/// pass the field checks and ids must be distinct within the sequence.
pub fn validate_entries(entries: &[Variant]) -> DomainResult<()> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        let draft = VariantDraft {
            size: entry.size.clone(),
            unit: entry.unit.clone(),
            purchasing_price: entry.purchasing_price,
        };
        draft.validate()?;
        if !seen.insert(entry.id) {
            return Err(DomainError::validation(format!(
                "duplicate variant id: {}",
                entry.id
            )));
        }
    }
    Ok(())
}

/// The ordered variant sequence of one product.
///
/// Every variant mutation is a full read-modify-write at the store level: the
/// store loads the sequence into a `VariantSet`, hands it to a transform, and
/// writes the whole sequence back. The dirty flag tells the store whether the
/// transform changed anything; clean sets skip the write-back (and therefore
/// the version bump) entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantSet {
    entries: Vec<Variant>,
    dirty: bool,
}

impl VariantSet {
    pub fn new(entries: Vec<Variant>) -> Self {
        Self {
            entries,
            dirty: false,
        }
    }

    pub fn entries(&self) -> &[Variant] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Variant> {
        self.entries
    }

    /// Whether a transform changed the sequence since construction.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: VariantId) -> Option<&Variant> {
        self.entries.iter().find(|v| v.id == id)
    }

    /// Append a new variant with a fresh identifier at the end of the
    /// sequence. Order is insertion order.
    pub fn add(&mut self, draft: VariantDraft) -> Variant {
        let variant = Variant {
            id: VariantId::new(),
            size: draft.size,
            unit: draft.unit,
            purchasing_price: draft.purchasing_price,
        };
        self.entries.push(variant.clone());
        self.dirty = true;
        variant
    }

    /// Replace the fields of the first variant whose id matches, in place.
    ///
    /// The identifier itself is never changed. Returns `None` (and leaves the
    /// sequence untouched) when no entry matches.
    pub fn update(&mut self, id: VariantId, draft: VariantDraft) -> Option<Variant> {
        let entry = self.entries.iter_mut().find(|v| v.id == id)?;
        entry.size = draft.size;
        entry.unit = draft.unit;
        entry.purchasing_price = draft.purchasing_price;
        self.dirty = true;
        Some(entry.clone())
    }

    /// Remove every variant whose id matches, preserving the order of the
    /// remainder. Returns how many entries were removed; zero is not an
    /// error and leaves the set clean.
    pub fn remove(&mut self, id: VariantId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|v| v.id != id);
        let removed = before - self.entries.len();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }
}
