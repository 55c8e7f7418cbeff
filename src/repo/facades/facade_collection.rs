use log::{debug, trace};
use mongodb::{
    Collection,
    bson::{self, Bson, Document, doc},
};
use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;

use super::FacadeError;
use crate::params::ID_FIELD;
use crate::query::{FindOpts, Patch, UpdateDocument, UpdateOpts};
use crate::store::CollectionBackend;

/// Record-level operations over a single collection.
///
/// `T` is the caller's record type; it must carry the `_id` unique identifier
/// field (usually as `Option<ObjectId>` skipped when `None`, so that the store
/// assigns it on insert).
///
/// ```no_run
/// # use mongocrud::{registry::{Registry, ConnectOptions}, repo::FacadeCollection};
/// # use mongodb::bson::Document;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = Registry::new();
/// registry
///     .initialize("main", "mongodb://localhost/app", ConnectOptions::new())
///     .await?;
///
/// let users = registry.database("main")?.collection::<Document>("users");
/// let facade: FacadeCollection<'_, Document> = FacadeCollection::new(&users);
/// let total = facade.get_total_count(Document::new(), None).await?;
/// # Ok(())
/// # }
/// ```
pub struct FacadeCollection<'a, T, B = Collection<Document>> {
    collection: &'a B,
    _record: PhantomData<fn() -> T>,
}

impl<'a, T, B> FacadeCollection<'a, T, B>
where
    T: Serialize + DeserializeOwned,
    B: CollectionBackend,
{
    pub fn new(collection: &'a B) -> Self {
        Self {
            collection,
            _record: PhantomData,
        }
    }

    pub fn collection(&self) -> &'a B {
        self.collection
    }

    /// Inserts `record` and returns its identifier.
    pub async fn create_one(&self, record: &T) -> Result<Bson, FacadeError> {
        let doc = bson::to_document(record)?;
        let id = self.collection.insert_one(doc).await?;

        trace!("created record {} in `{}`", id, self.collection.name());
        Ok(id)
    }

    /// Inserts `records` and returns their identifiers.
    ///
    /// Records without an identifier get one assigned by the store.
    pub async fn create_many(&self, records: &[T]) -> Result<Vec<Bson>, FacadeError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let docs = records
            .iter()
            .map(bson::to_document)
            .collect::<Result<Vec<_>, _>>()?;
        let ids = self.collection.insert_many(docs).await?;

        debug!("created {} records in `{}`", ids.len(), self.collection.name());
        Ok(ids)
    }

    /// Applies `update` to the first record matching `criteria`.
    ///
    /// Fields set to [`FieldUpdate::Unset`](crate::query::FieldUpdate::Unset) are
    /// removed from the record, fields not mentioned are left untouched.
    /// Returns `true` if an existing record was matched and updated; with
    /// [`UpdateOpts::upsert`] a record may be created, which still returns `false`.
    pub async fn update_one(
        &self,
        criteria: Document,
        update: Patch,
        options: impl Into<Option<UpdateOpts>>,
    ) -> Result<bool, FacadeError> {
        let update = UpdateDocument::from(update);
        if update.is_empty() {
            return Err(FacadeError::EmptyUpdate);
        }

        self.find_one_and_update(criteria, update.into_document(), options)
            .await
    }

    /// Applies a caller-built operator document (`$inc`, `$push`, `$setOnInsert`, ...)
    /// to the first record matching `criteria`, without any validation.
    ///
    /// Returns `true` if an existing record was matched and updated.
    pub async fn update_fields_with_special_op(
        &self,
        criteria: Document,
        update: impl Into<Document>,
        options: impl Into<Option<UpdateOpts>>,
    ) -> Result<bool, FacadeError> {
        self.find_one_and_update(criteria, update.into(), options)
            .await
    }

    pub async fn get_one_by_id(
        &self,
        id: impl Into<Bson>,
        options: impl Into<Option<FindOpts>>,
    ) -> Result<Option<T>, FacadeError> {
        let id: Bson = id.into();
        self.get_one(doc! { ID_FIELD: id }, options).await
    }

    /// Returns one record matching `criteria`, the store decides which one when
    /// several match (unless a sort is provided).
    pub async fn get_one(
        &self,
        criteria: Document,
        options: impl Into<Option<FindOpts>>,
    ) -> Result<Option<T>, FacadeError> {
        let found = self
            .collection
            .find_one(criteria, options.into().unwrap_or_default())
            .await?;

        Ok(found.map(bson::from_document).transpose()?)
    }

    /// Returns every record matching `criteria` (all records when empty).
    pub async fn get_many(
        &self,
        criteria: Document,
        options: impl Into<Option<FindOpts>>,
    ) -> Result<Vec<T>, FacadeError> {
        let docs = self
            .collection
            .find(criteria, options.into().unwrap_or_default())
            .await?;

        trace!("fetched {} records from `{}`", docs.len(), self.collection.name());

        Ok(docs
            .into_iter()
            .map(bson::from_document)
            .collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn get_total_count(
        &self,
        criteria: Document,
        options: impl Into<Option<FindOpts>>,
    ) -> Result<u64, FacadeError> {
        Ok(self
            .collection
            .count(criteria, options.into().unwrap_or_default())
            .await?)
    }

    /// Deletes the record identified by `id`, returning how many records were
    /// deleted (`0` or `1`).
    pub async fn delete_one_by_id(&self, id: impl Into<Bson>) -> Result<u64, FacadeError> {
        let id: Bson = id.into();
        let deleted = self.collection.delete_one(doc! { ID_FIELD: id }).await?;

        if deleted > 0 {
            debug!("deleted record from `{}`", self.collection.name());
        }
        Ok(deleted)
    }

    async fn find_one_and_update(
        &self,
        criteria: Document,
        update: Document,
        options: impl Into<Option<UpdateOpts>>,
    ) -> Result<bool, FacadeError> {
        let outcome = self
            .collection
            .find_one_and_update(criteria, update, options.into().unwrap_or_default())
            .await?;

        Ok(outcome.updated_existing)
    }
}
