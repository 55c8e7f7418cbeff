use mongodb::bson::Document;

/// Options for read operations (`get_one*`, `get_many`, `get_total_count`).
///
/// Counting only honours `skip` and `limit`. Single-record lookups ignore `limit`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOpts {
    pub projection: Option<Document>,
    pub sort: Option<Document>,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
}

impl FindOpts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Options for find-one-and-update operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOpts {
    /// Insert a new record when nothing matches the criteria.
    pub upsert: bool,
    /// Picks which record is updated when several match.
    pub sort: Option<Document>,
}

impl UpdateOpts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }

    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }
}
