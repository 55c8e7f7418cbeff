//! In-memory [`CollectionBackend`] used by unit tests.
//!
//! Only top-level equality criteria are supported. Update documents are
//! validated the way the server does: they must be made of operators only and
//! no operator group may be empty.

use mongodb::bson::{Bson, Document, oid::ObjectId};
use std::cmp::Ordering;
use std::sync::Mutex;

use super::{CollectionBackend, Error, UpdateOutcome};
use crate::params::ID_FIELD;
use crate::query::{FindOpts, UpdateOpts};

pub struct MemoryCollection {
    name: String,
    docs: Mutex<Vec<Document>>,
}

impl MemoryCollection {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            docs: Mutex::new(Vec::new()),
        }
    }

    /// Stores `docs` as they are, assigning identifiers where missing.
    pub fn fill(&self, docs: Vec<Document>) {
        let mut stored = self.docs.lock().expect("memory collection poisoned");
        for doc in docs {
            let (_, doc) = with_id(doc);
            stored.push(doc);
        }
    }

    /// Copy of all stored records, in insertion order.
    pub fn snapshot(&self) -> Vec<Document> {
        self.docs.lock().expect("memory collection poisoned").clone()
    }

    /// Like [`Self::snapshot`] with identifiers removed.
    pub fn snapshot_without_ids(&self) -> Vec<Document> {
        self.snapshot()
            .into_iter()
            .map(|mut d| {
                d.remove(ID_FIELD);
                d
            })
            .collect()
    }

    fn matching(docs: &[Document], filter: &Document, sort: Option<&Document>) -> Vec<usize> {
        let mut idxs: Vec<usize> = docs
            .iter()
            .enumerate()
            .filter(|(_, d)| matches(d, filter))
            .map(|(i, _)| i)
            .collect();

        if let Some(sort) = sort {
            idxs.sort_by(|a, b| sort_order(&docs[*a], &docs[*b], sort));
        }

        idxs
    }
}

impl CollectionBackend for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert_one(&self, doc: Document) -> Result<Bson, Error> {
        let mut stored = self.docs.lock().expect("memory collection poisoned");
        insert(&mut stored, doc)
    }

    async fn insert_many(&self, docs: Vec<Document>) -> Result<Vec<Bson>, Error> {
        let mut stored = self.docs.lock().expect("memory collection poisoned");
        docs.into_iter().map(|d| insert(&mut stored, d)).collect()
    }

    async fn find_one(&self, filter: Document, opts: FindOpts) -> Result<Option<Document>, Error> {
        let opts = FindOpts {
            limit: Some(1),
            ..opts
        };
        Ok(self.find(filter, opts).await?.into_iter().next())
    }

    async fn find(&self, filter: Document, opts: FindOpts) -> Result<Vec<Document>, Error> {
        let stored = self.docs.lock().expect("memory collection poisoned");
        let idxs = Self::matching(&stored, &filter, opts.sort.as_ref());

        let skip = opts.skip.unwrap_or(0) as usize;
        let limit = match opts.limit {
            Some(l) if l != 0 => l.unsigned_abs() as usize,
            _ => usize::MAX,
        };

        Ok(idxs
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|i| project(&stored[i], opts.projection.as_ref()))
            .collect())
    }

    async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        opts: UpdateOpts,
    ) -> Result<UpdateOutcome, Error> {
        validate_update(&update)?;

        let mut stored = self.docs.lock().expect("memory collection poisoned");
        let target = Self::matching(&stored, &filter, opts.sort.as_ref())
            .into_iter()
            .next();

        if let Some(idx) = target {
            let mut updated = stored[idx].clone();
            apply_update(&mut updated, &update, false)?;
            stored[idx] = updated;
            return Ok(UpdateOutcome {
                updated_existing: true,
            });
        }

        if opts.upsert {
            let mut doc: Document = filter
                .into_iter()
                .filter(|(k, _)| !k.starts_with('$'))
                .collect();
            apply_update(&mut doc, &update, true)?;
            insert(&mut stored, doc)?;
        }

        Ok(UpdateOutcome {
            updated_existing: false,
        })
    }

    async fn delete_one(&self, filter: Document) -> Result<u64, Error> {
        let mut stored = self.docs.lock().expect("memory collection poisoned");
        match stored.iter().position(|d| matches(d, &filter)) {
            Some(idx) => {
                stored.remove(idx);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn count(&self, filter: Document, opts: FindOpts) -> Result<u64, Error> {
        let stored = self.docs.lock().expect("memory collection poisoned");
        let mut n = Self::matching(&stored, &filter, None).len() as u64;
        n = n.saturating_sub(opts.skip.unwrap_or(0));
        if let Some(limit) = opts.limit.filter(|l| *l != 0) {
            n = n.min(limit.unsigned_abs());
        }
        Ok(n)
    }
}

fn with_id(doc: Document) -> (Bson, Document) {
    if let Some(id) = doc.get(ID_FIELD) {
        return (id.clone(), doc);
    }

    let id = Bson::ObjectId(ObjectId::new());
    let mut out = Document::new();
    out.insert(ID_FIELD, id.clone());
    for (k, v) in doc {
        out.insert(k, v);
    }
    (id, out)
}

fn insert(stored: &mut Vec<Document>, doc: Document) -> Result<Bson, Error> {
    let (id, doc) = with_id(doc);
    if stored.iter().any(|d| d.get(ID_FIELD) == Some(&id)) {
        return Err(Error::Backend(format!(
            "E11000 duplicate key error dup key: {{ _id: {id} }}"
        )));
    }
    stored.push(doc);
    Ok(id)
}

fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(k, v)| doc.get(k) == Some(v))
}

fn is_truthy(v: &Bson) -> bool {
    match v {
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(n) => *n != 0.0,
        Bson::Boolean(b) => *b,
        _ => true,
    }
}

fn project(doc: &Document, projection: Option<&Document>) -> Document {
    let Some(projection) = projection.filter(|p| !p.is_empty()) else {
        return doc.clone();
    };

    let inclusive = projection
        .iter()
        .any(|(k, v)| k != ID_FIELD && is_truthy(v));

    if inclusive {
        let keep_id = projection.get(ID_FIELD).is_none_or(is_truthy);
        doc.iter()
            .filter(|(k, _)| {
                if *k == ID_FIELD {
                    keep_id
                } else {
                    projection.contains_key(k.as_str())
                }
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    } else {
        doc.iter()
            .filter(|(k, _)| !projection.contains_key(k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

fn as_number(v: &Bson) -> Option<f64> {
    match v {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

fn compare(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Bson::String(a)), Some(Bson::String(b))) => a.cmp(b),
        (Some(Bson::Boolean(a)), Some(Bson::Boolean(b))) => a.cmp(b),
        (Some(Bson::ObjectId(a)), Some(Bson::ObjectId(b))) => a.bytes().cmp(&b.bytes()),
        (Some(a), Some(b)) => match (as_number(a), as_number(b)) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}

fn sort_order(a: &Document, b: &Document, sort: &Document) -> Ordering {
    for (field, direction) in sort {
        let ord = compare(a.get(field), b.get(field));
        let ord = if as_number(direction).is_some_and(|d| d < 0.0) {
            ord.reverse()
        } else {
            ord
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn validate_update(update: &Document) -> Result<(), Error> {
    if update.is_empty() {
        return Err(Error::Backend("update document requires atomic operators".into()));
    }

    for (op, group) in update {
        if !op.starts_with('$') {
            return Err(Error::Backend(format!(
                "update document requires atomic operators, found `{op}`"
            )));
        }
        match group {
            Bson::Document(group) if group.is_empty() => {
                return Err(Error::Backend(format!(
                    "'{op}' is empty. You must specify a field like so: {{{op}: {{<field>: ...}}}}"
                )));
            }
            Bson::Document(_) => {}
            _ => {
                return Err(Error::Backend(format!(
                    "modifiers operate on fields but we found another type instead for `{op}`"
                )));
            }
        }
    }

    Ok(())
}

fn increment(current: Option<&Bson>, by: &Bson) -> Result<Bson, Error> {
    let Some(current) = current else {
        return Ok(by.clone());
    };
    match (current, by) {
        // int32 overflow widens to int64, int64 overflow is an error like on the server
        (Bson::Int32(a), Bson::Int32(b)) => Ok(match a.checked_add(*b) {
            Some(sum) => Bson::Int32(sum),
            None => Bson::Int64(i64::from(*a) + i64::from(*b)),
        }),
        (Bson::Int64(_) | Bson::Int32(_), Bson::Int64(_) | Bson::Int32(_)) => {
            let (a, b) = (as_long(current), as_long(by));
            a.zip(b)
                .and_then(|(a, b)| a.checked_add(b))
                .map(Bson::Int64)
                .ok_or_else(|| Error::Backend("Failed to apply $inc operations: overflow".into()))
        }
        (a, b) => match (as_number(a), as_number(b)) {
            (Some(a), Some(b)) => Ok(Bson::Double(a + b)),
            _ => Err(Error::Backend(
                "cannot apply $inc to a value of non-numeric type".into(),
            )),
        },
    }
}

fn as_long(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        _ => None,
    }
}

fn apply_update(doc: &mut Document, update: &Document, inserting: bool) -> Result<(), Error> {
    for (op, group) in update {
        let Bson::Document(group) = group else {
            continue;
        };

        match op.as_str() {
            "$set" => {
                for (k, v) in group {
                    doc.insert(k.clone(), v.clone());
                }
            }
            "$setOnInsert" => {
                if inserting {
                    for (k, v) in group {
                        doc.insert(k.clone(), v.clone());
                    }
                }
            }
            "$unset" => {
                for k in group.keys() {
                    doc.remove(k);
                }
            }
            "$inc" => {
                for (k, v) in group {
                    let next = increment(doc.get(k), v)?;
                    doc.insert(k.clone(), next);
                }
            }
            "$push" => {
                for (k, v) in group {
                    match doc.get_mut(k) {
                        Some(Bson::Array(values)) => values.push(v.clone()),
                        Some(_) => {
                            return Err(Error::Backend(format!(
                                "the field '{k}' must be an array"
                            )));
                        }
                        None => {
                            doc.insert(k.clone(), Bson::Array(vec![v.clone()]));
                        }
                    }
                }
            }
            "$pull" => {
                for (k, v) in group {
                    if let Some(Bson::Array(values)) = doc.get_mut(k) {
                        values.retain(|e| e != v);
                    }
                }
            }
            "$rename" => {
                for (from, to) in group {
                    let Bson::String(to) = to else {
                        return Err(Error::Backend("$rename target must be a string".into()));
                    };
                    if let Some(v) = doc.remove(from) {
                        doc.insert(to.clone(), v);
                    }
                }
            }
            other => {
                return Err(Error::Backend(format!(
                    "operator `{other}` not supported by the memory backend"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[tokio::test]
    async fn rejects_empty_operator_groups() {
        let c = MemoryCollection::new("t");
        c.fill(vec![doc! { "a": 1 }]);

        let err = c
            .find_one_and_update(
                doc! { "a": 1 },
                doc! { "$set": { "a": 2 }, "$unset": {} },
                UpdateOpts::default(),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("'$unset' is empty"));
        assert_eq!(c.snapshot_without_ids(), vec![doc! { "a": 1 }]);
    }

    #[test]
    fn increment_widens_on_overflow() {
        assert_eq!(
            increment(Some(&Bson::Int32(i32::MAX)), &Bson::Int32(1)).unwrap(),
            Bson::Int64(i64::from(i32::MAX) + 1)
        );
        assert_eq!(
            increment(Some(&Bson::Int32(2)), &Bson::Int32(3)).unwrap(),
            Bson::Int32(5)
        );
        assert_eq!(
            increment(Some(&Bson::Int64(1)), &Bson::Int32(-4)).unwrap(),
            Bson::Int64(-3)
        );
        assert!(increment(Some(&Bson::Int64(i64::MAX)), &Bson::Int32(1)).is_err());
    }

    #[test]
    fn projection_modes() {
        let d = doc! { "_id": 1, "name": "Mark", "same": "same" };
        assert_eq!(
            project(&d, Some(&doc! { "name": 1 })),
            doc! { "_id": 1, "name": "Mark" }
        );
        assert_eq!(
            project(&d, Some(&doc! { "same": 0 })),
            doc! { "_id": 1, "name": "Mark" }
        );
        assert_eq!(
            project(&d, Some(&doc! { "name": 1, "_id": 0 })),
            doc! { "name": "Mark" }
        );
    }
}
