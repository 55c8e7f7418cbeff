use mongodb::bson::{self, Bson, Document};
use serde::Serialize;

/// The update requested for a single field.
///
/// [`FieldUpdate::Keep`] and [`FieldUpdate::Unset`] are deliberately distinct:
/// the former leaves the stored field untouched, the latter removes it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldUpdate<T> {
    #[default]
    Keep,
    Unset,
    Set(T),
}

impl<T> FieldUpdate<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FieldUpdate<U> {
        match self {
            Self::Keep => FieldUpdate::Keep,
            Self::Unset => FieldUpdate::Unset,
            Self::Set(v) => FieldUpdate::Set(f(v)),
        }
    }
}

/// A partial record describing how a stored document has to change.
///
/// Fields are kept in insertion order; writing the same field twice keeps the
/// last update at the position of the first one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    fields: Vec<(String, FieldUpdate<Bson>)>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a patch assigning every field serialized from `record`.
    ///
    /// Fields skipped by serde (e.g. `skip_serializing_if`) are left untouched.
    pub fn try_from_record<S: Serialize>(record: &S) -> Result<Self, bson::ser::Error> {
        Ok(bson::to_document(record)?.into())
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.put(field.into(), FieldUpdate::Set(value.into()));
        self
    }

    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.put(field.into(), FieldUpdate::Unset);
        self
    }

    pub fn field<T: Into<Bson>>(mut self, field: impl Into<String>, update: FieldUpdate<T>) -> Self {
        self.put(field.into(), update.map(Into::into));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldUpdate<Bson>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn put(&mut self, field: String, update: FieldUpdate<Bson>) {
        let existing = self.fields.iter().position(|(k, _)| *k == field);

        match (existing, update) {
            (Some(idx), FieldUpdate::Keep) => {
                self.fields.remove(idx);
            }
            (None, FieldUpdate::Keep) => {}
            (Some(idx), update) => self.fields[idx].1 = update,
            (None, update) => self.fields.push((field, update)),
        }
    }
}

impl From<Document> for Patch {
    fn from(doc: Document) -> Self {
        doc.into_iter()
            .map(|(k, v)| (k, FieldUpdate::Set(v)))
            .collect()
    }
}

impl FromIterator<(String, FieldUpdate<Bson>)> for Patch {
    fn from_iter<I: IntoIterator<Item = (String, FieldUpdate<Bson>)>>(iter: I) -> Self {
        let mut patch = Self::new();
        for (field, update) in iter {
            patch.put(field, update);
        }
        patch
    }
}

impl IntoIterator for Patch {
    type Item = (String, FieldUpdate<Bson>);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
