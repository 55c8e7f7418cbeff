//! # Store seam
//!
//! [`CollectionBackend`] is the capability set the collection facade needs from a
//! document store: insert one/many, find one/many, find-one-and-update, delete one
//! and count. It is implemented for [`mongodb::Collection<Document>`]; every call is
//! a plain delegation to the driver and errors are returned uninterpreted.

use mongodb::bson::{Bson, Document};
use std::future::Future;

use crate::query::{FindOpts, UpdateOpts};

mod mongo;

#[cfg(test)]
pub(crate) mod memory;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("driver error :: {0}")]
    Driver(#[from] mongodb::error::Error),
    #[error("backend error :: {0}")]
    Backend(String),
}

/// Outcome of a find-one-and-update request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// An already stored record matched the criteria and was updated.
    pub updated_existing: bool,
}

pub trait CollectionBackend: Send + Sync {
    /// Collection name, used for logging.
    fn name(&self) -> &str;

    /// Inserts `doc` and returns the identifier the store assigned (or kept).
    fn insert_one(&self, doc: Document) -> impl Future<Output = Result<Bson, Error>> + Send;

    /// Inserts `docs` returning their identifiers, ordered by input position.
    fn insert_many(
        &self,
        docs: Vec<Document>,
    ) -> impl Future<Output = Result<Vec<Bson>, Error>> + Send;

    fn find_one(
        &self,
        filter: Document,
        opts: FindOpts,
    ) -> impl Future<Output = Result<Option<Document>, Error>> + Send;

    fn find(
        &self,
        filter: Document,
        opts: FindOpts,
    ) -> impl Future<Output = Result<Vec<Document>, Error>> + Send;

    fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        opts: UpdateOpts,
    ) -> impl Future<Output = Result<UpdateOutcome, Error>> + Send;

    /// Deletes at most one record and returns how many were deleted.
    fn delete_one(&self, filter: Document) -> impl Future<Output = Result<u64, Error>> + Send;

    fn count(
        &self,
        filter: Document,
        opts: FindOpts,
    ) -> impl Future<Output = Result<u64, Error>> + Send;
}
