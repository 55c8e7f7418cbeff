use mongodb::bson;

#[derive(thiserror::Error, Debug)]
pub enum FacadeError {
    #[error("store error :: {0}")]
    StoreError(#[from] crate::store::Error),
    #[error("record serialization error :: {0}")]
    SerializationError(#[from] bson::ser::Error),
    #[error("record deserialization error :: {0}")]
    DeserializationError(#[from] bson::de::Error),
    #[error("update contains no field to set or unset")]
    EmptyUpdate,
}
