use futures::TryStreamExt;
use log::trace;
use mongodb::{
    Collection,
    bson::{Bson, Document},
    options::{CountOptions, FindOneAndUpdateOptions, FindOneOptions, FindOptions, ReturnDocument},
};

use super::{CollectionBackend, Error, UpdateOutcome};
use crate::query::{FindOpts, UpdateOpts};

impl CollectionBackend for Collection<Document> {
    fn name(&self) -> &str {
        Collection::name(self)
    }

    async fn insert_one(&self, doc: Document) -> Result<Bson, Error> {
        let res = Collection::insert_one(self, doc).await?;
        Ok(res.inserted_id)
    }

    async fn insert_many(&self, docs: Vec<Document>) -> Result<Vec<Bson>, Error> {
        let res = Collection::insert_many(self, docs).await?;

        // The driver reports ids keyed by input position
        let mut ids: Vec<(usize, Bson)> = res.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(idx, _)| *idx);

        Ok(ids.into_iter().map(|(_, id)| id).collect())
    }

    async fn find_one(&self, filter: Document, opts: FindOpts) -> Result<Option<Document>, Error> {
        let mut options = FindOneOptions::default();
        options.projection = opts.projection;
        options.sort = opts.sort;
        options.skip = opts.skip;

        Ok(Collection::find_one(self, filter)
            .with_options(options)
            .await?)
    }

    async fn find(&self, filter: Document, opts: FindOpts) -> Result<Vec<Document>, Error> {
        let mut options = FindOptions::default();
        options.projection = opts.projection;
        options.sort = opts.sort;
        options.skip = opts.skip;
        options.limit = opts.limit;

        let cursor = Collection::find(self, filter)
            .with_options(options)
            .await?;

        Ok(cursor.try_collect().await?)
    }

    async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        opts: UpdateOpts,
    ) -> Result<UpdateOutcome, Error> {
        // Asking for the pre-image makes the driver return a document exactly
        // when an existing record was matched and updated.
        let mut options = FindOneAndUpdateOptions::default();
        options.return_document = Some(ReturnDocument::Before);
        options.upsert = Some(opts.upsert);
        options.sort = opts.sort;

        let before = Collection::find_one_and_update(self, filter, update)
            .with_options(options)
            .await?;

        trace!(
            "find-one-and-update on `{}` matched existing: {}",
            Collection::name(self),
            before.is_some()
        );

        Ok(UpdateOutcome {
            updated_existing: before.is_some(),
        })
    }

    async fn delete_one(&self, filter: Document) -> Result<u64, Error> {
        Ok(Collection::delete_one(self, filter).await?.deleted_count)
    }

    async fn count(&self, filter: Document, opts: FindOpts) -> Result<u64, Error> {
        Ok(Collection::count_documents(self, filter)
            .with_options(count_options(opts))
            .await?)
    }
}

/// `limit(0)` means "no limit" for [`FindOpts`], but the count pipeline would turn
/// it into a `$limit: 0` stage that the server rejects.
fn count_options(opts: FindOpts) -> CountOptions {
    let mut options = CountOptions::default();
    options.skip = opts.skip;
    options.limit = opts.limit.filter(|l| *l != 0).map(i64::unsigned_abs);
    options
}
