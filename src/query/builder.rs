use mongodb::bson::{Bson, Document};

use super::{FieldUpdate, Patch, UpdateOperator};

/// Value stored under `$unset`; the server ignores it.
const UNSET_MARKER: &str = "";

/// Driver-level update document built from a [`Patch`].
///
/// Assignments are collected under `$set`, removals under `$unset`. Groups left
/// empty are dropped when the document is compiled, since the server rejects
/// update documents holding an empty operator object
/// (<https://jira.mongodb.org/browse/SERVER-26961>).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateDocument {
    set: Document,
    unset: Document,
}

impl UpdateDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: String, value: Bson) {
        self.unset.remove(&field);
        self.set.insert(field, value);
    }

    pub fn unset(&mut self, field: String) {
        self.set.remove(&field);
        self.unset.insert(field, UNSET_MARKER);
    }

    /// True when compiling would produce no operator at all.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }

    pub fn into_document(self) -> Document {
        let mut doc = Document::new();
        if !self.set.is_empty() {
            doc.insert(UpdateOperator::Set.as_str(), self.set);
        }
        if !self.unset.is_empty() {
            doc.insert(UpdateOperator::Unset.as_str(), self.unset);
        }
        doc
    }
}

impl From<Patch> for UpdateDocument {
    fn from(patch: Patch) -> Self {
        let mut update = Self::new();
        for (field, value) in patch {
            match value {
                FieldUpdate::Set(v) => update.set(field, v),
                FieldUpdate::Unset => update.unset(field),
                FieldUpdate::Keep => {}
            }
        }
        update
    }
}

impl From<UpdateDocument> for Document {
    fn from(value: UpdateDocument) -> Self {
        value.into_document()
    }
}
