use mongodb::bson::{Bson, Document};
use std::fmt;
use std::str::FromStr;

/// Field update operators accepted by
/// [`FacadeCollection::update_fields_with_special_op`](crate::repo::FacadeCollection::update_fields_with_special_op).
///
/// See <https://www.mongodb.com/docs/manual/reference/operator/update-field/>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOperator {
    CurrentDate,
    Inc,
    Min,
    Max,
    Mul,
    Rename,
    Set,
    SetOnInsert,
    Unset,
    AddToSet,
    Pop,
    Push,
    Pull,
}

impl UpdateOperator {
    pub const ALL: [UpdateOperator; 13] = [
        Self::CurrentDate,
        Self::Inc,
        Self::Min,
        Self::Max,
        Self::Mul,
        Self::Rename,
        Self::Set,
        Self::SetOnInsert,
        Self::Unset,
        Self::AddToSet,
        Self::Pop,
        Self::Push,
        Self::Pull,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CurrentDate => "$currentDate",
            Self::Inc => "$inc",
            Self::Min => "$min",
            Self::Max => "$max",
            Self::Mul => "$mul",
            Self::Rename => "$rename",
            Self::Set => "$set",
            Self::SetOnInsert => "$setOnInsert",
            Self::Unset => "$unset",
            Self::AddToSet => "$addToSet",
            Self::Pop => "$pop",
            Self::Push => "$push",
            Self::Pull => "$pull",
        }
    }
}

impl fmt::Display for UpdateOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown update operator `{0}`")]
pub struct UnknownOperator(pub String);

impl FromStr for UpdateOperator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownOperator(s.to_owned()))
    }
}

/// Typed builder for an operator update document.
///
/// Repeating an operator merges its fields into the same group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorUpdate {
    doc: Document,
}

impl OperatorUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, op: UpdateOperator, fields: Document) -> Self {
        let key = op.as_str();
        match self.doc.get_mut(key) {
            Some(Bson::Document(group)) => {
                for (k, v) in fields {
                    group.insert(k, v);
                }
            }
            _ => {
                self.doc.insert(key, fields);
            }
        }
        self
    }

    pub fn inc(self, field: impl Into<String>, by: impl Into<Bson>) -> Self {
        self.single(UpdateOperator::Inc, field, by)
    }

    pub fn set_on_insert(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.single(UpdateOperator::SetOnInsert, field, value)
    }

    pub fn push(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.single(UpdateOperator::Push, field, value)
    }

    pub fn pull(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.single(UpdateOperator::Pull, field, value)
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    fn single(self, op: UpdateOperator, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        let mut fields = Document::new();
        fields.insert(field.into(), value.into());
        self.with(op, fields)
    }
}

impl From<OperatorUpdate> for Document {
    fn from(value: OperatorUpdate) -> Self {
        value.into_document()
    }
}
