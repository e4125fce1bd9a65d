//! Remote document store adapter.
//!
//! The dashboard is built against a hosted document database exposing three
//! primitives: full-collection snapshot subscriptions, merge-writes to a
//! document, and creation with a generated id. [`RemoteStore`] captures that
//! surface; [`LocalStore`] implements it against a single JSON file so the
//! CLI and the tests run without a hosted backend.
//!
//! Every write re-broadcasts a complete snapshot to each live subscription of
//! the touched collection. A snapshot always fully supersedes the previous
//! one; subscribers never see partial merges.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use crate::error::{ReadError, WriteError};

/// The five persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Tasks,
    Users,
    Departments,
    Projects,
    Notifications,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Tasks,
        Collection::Users,
        Collection::Departments,
        Collection::Projects,
        Collection::Notifications,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Tasks => "tasks",
            Collection::Users => "users",
            Collection::Departments => "departments",
            Collection::Projects => "projects",
            Collection::Notifications => "notifications",
        }
    }
}

/// A full point-in-time copy of one collection: document id plus fields.
pub type Snapshot = Vec<(String, Value)>;

/// Server-side scoping applied to a subscription before delivery.
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Keep only documents whose field equals the given value.
    pub field_equals: Option<(&'static str, Value)>,
    /// Order by this field, descending. Fields are compared as their JSON
    /// string form, which sorts ISO timestamps chronologically.
    pub order_desc: Option<&'static str>,
}

impl Query {
    /// The notification scope: documents for one recipient, newest first.
    pub fn recipient(user_id: &str) -> Query {
        Query {
            field_equals: Some(("userId", Value::String(user_id.to_string()))),
            order_desc: Some("timestamp"),
        }
    }
}

/// A live subscription to one collection.
///
/// Dropping the subscription releases it; the store stops delivering to a
/// dropped receiver on its next broadcast.
pub struct Subscription {
    rx: watch::Receiver<Snapshot>,
}

impl Subscription {
    /// The latest delivered snapshot, marking it as seen.
    pub fn current(&mut self) -> Snapshot {
        self.rx.borrow_and_update().clone()
    }

    /// Waits until a snapshot newer than the last seen one is delivered.
    pub async fn changed(&mut self) -> Result<(), ReadError> {
        self.rx
            .changed()
            .await
            .map_err(|_| ReadError::SubscriptionClosed)
    }
}

/// The write/subscribe surface of the hosted document database.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Subscribe to a collection. The subscription is seeded with the current
    /// contents, so the first `current()` is never behind the store.
    fn subscribe(&self, collection: Collection, query: Query) -> Subscription;

    /// Merge the fields of `patch` into an existing document.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Value,
    ) -> Result<(), WriteError>;

    /// Create or overwrite the document at a caller-chosen id.
    async fn put(&self, collection: Collection, id: &str, doc: Value) -> Result<(), WriteError>;

    /// Create a document with a generated id; returns the id.
    async fn create(&self, collection: Collection, doc: Value) -> Result<String, WriteError>;
}

/// On-disk layout: one JSON object per collection, id to fields.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    tasks: BTreeMap<String, Value>,
    #[serde(default)]
    users: BTreeMap<String, Value>,
    #[serde(default)]
    departments: BTreeMap<String, Value>,
    #[serde(default)]
    projects: BTreeMap<String, Value>,
    #[serde(default)]
    notifications: BTreeMap<String, Value>,
}

impl StoreData {
    fn collection(&self, c: Collection) -> &BTreeMap<String, Value> {
        match c {
            Collection::Tasks => &self.tasks,
            Collection::Users => &self.users,
            Collection::Departments => &self.departments,
            Collection::Projects => &self.projects,
            Collection::Notifications => &self.notifications,
        }
    }

    fn collection_mut(&mut self, c: Collection) -> &mut BTreeMap<String, Value> {
        match c {
            Collection::Tasks => &mut self.tasks,
            Collection::Users => &mut self.users,
            Collection::Departments => &mut self.departments,
            Collection::Projects => &mut self.projects,
            Collection::Notifications => &mut self.notifications,
        }
    }
}

struct Subscriber {
    collection: Collection,
    query: Query,
    tx: watch::Sender<Snapshot>,
}

struct Inner {
    data: StoreData,
    subscribers: Vec<Subscriber>,
}

/// JSON-file-backed implementation of [`RemoteStore`].
///
/// All state lives under one file; every acknowledged write is persisted with
/// a temp-file-and-rename before subscribers are notified. `in_memory()`
/// skips persistence and is what the tests use.
pub struct LocalStore {
    path: Option<PathBuf>,
    inner: Mutex<Inner>,
}

impl LocalStore {
    /// Load the store from a JSON file, starting empty if the file doesn't
    /// exist or doesn't parse.
    pub fn open(path: &Path) -> Self {
        let data = if path.exists() {
            let mut buf = String::new();
            match File::open(path).and_then(|mut f| f.read_to_string(&mut buf)) {
                Ok(_) => match serde_json::from_str(&buf) {
                    Ok(data) => data,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "store file unreadable, starting fresh");
                        StoreData::default()
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "store file unreadable, starting fresh");
                    StoreData::default()
                }
            }
        } else {
            StoreData::default()
        };
        LocalStore {
            path: Some(path.to_path_buf()),
            inner: Mutex::new(Inner {
                data,
                subscribers: Vec::new(),
            }),
        }
    }

    /// A store with no backing file.
    pub fn in_memory() -> Self {
        LocalStore {
            path: None,
            inner: Mutex::new(Inner {
                data: StoreData::default(),
                subscribers: Vec::new(),
            }),
        }
    }

    /// Atomic-ish write via temp + rename.
    fn persist(&self, data: &StoreData) -> Result<(), WriteError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        let body = serde_json::to_string_pretty(data)?;
        f.write_all(body.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    fn snapshot_for(data: &StoreData, collection: Collection, query: &Query) -> Snapshot {
        let mut docs: Snapshot = data
            .collection(collection)
            .iter()
            .filter(|(_, fields)| match &query.field_equals {
                Some((field, expected)) => fields.get(*field) == Some(expected),
                None => true,
            })
            .map(|(id, fields)| (id.clone(), fields.clone()))
            .collect();
        if let Some(field) = query.order_desc {
            docs.sort_by(|(_, a), (_, b)| {
                let ka = a.get(field).and_then(Value::as_str).unwrap_or_default();
                let kb = b.get(field).and_then(Value::as_str).unwrap_or_default();
                kb.cmp(ka)
            });
        }
        docs
    }

    /// Deliver fresh snapshots to every live subscriber of `collection`.
    fn broadcast(inner: &mut Inner, collection: Collection) {
        inner.subscribers.retain(|s| !s.tx.is_closed());
        for sub in inner.subscribers.iter().filter(|s| s.collection == collection) {
            let snap = Self::snapshot_for(&inner.data, collection, &sub.query);
            sub.tx.send_replace(snap);
        }
    }

    fn commit(
        &self,
        inner: &mut Inner,
        collection: Collection,
        id: &str,
    ) -> Result<(), WriteError> {
        self.persist(&inner.data)?;
        tracing::debug!(collection = collection.name(), id, "write acknowledged");
        Self::broadcast(inner, collection);
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for LocalStore {
    fn subscribe(&self, collection: Collection, query: Query) -> Subscription {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let snap = Self::snapshot_for(&inner.data, collection, &query);
        let (tx, rx) = watch::channel(snap);
        inner.subscribers.push(Subscriber {
            collection,
            query,
            tx,
        });
        Subscription { rx }
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Value,
    ) -> Result<(), WriteError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let patch = match patch {
            Value::Object(map) => map,
            _ => return Err(WriteError::Rejected("patch must be an object".to_string())),
        };
        let doc = inner
            .data
            .collection_mut(collection)
            .get_mut(id)
            .ok_or_else(|| WriteError::NotFound {
                collection: collection.name(),
                id: id.to_string(),
            })?;
        match doc {
            Value::Object(fields) => {
                for (k, v) in patch {
                    fields.insert(k, v);
                }
            }
            _ => return Err(WriteError::Rejected("document is not an object".to_string())),
        }
        self.commit(&mut inner, collection, id)
    }

    async fn put(&self, collection: Collection, id: &str, doc: Value) -> Result<(), WriteError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner
            .data
            .collection_mut(collection)
            .insert(id.to_string(), doc);
        self.commit(&mut inner, collection, id)
    }

    async fn create(&self, collection: Collection, doc: Value) -> Result<String, WriteError> {
        let id = uuid::Uuid::new_v4().to_string();
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner
            .data
            .collection_mut(collection)
            .insert(id.clone(), doc);
        self.commit(&mut inner, collection, &id)?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn create_then_update_merges_fields() {
        let store = LocalStore::in_memory();
        let id = store
            .create(Collection::Tasks, json!({"title": "a", "status": "To Do"}))
            .await
            .unwrap();
        store
            .update(Collection::Tasks, &id, json!({"status": "Review"}))
            .await
            .unwrap();

        let mut sub = store.subscribe(Collection::Tasks, Query::default());
        let snap = sub.current();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].1["title"], json!("a"));
        assert_eq!(snap[0].1["status"], json!("Review"));
    }

    #[tokio::test]
    async fn update_of_missing_document_is_not_found() {
        let store = LocalStore::in_memory();
        let err = store
            .update(Collection::Tasks, "nope", json!({"status": "Review"}))
            .await
            .unwrap_err();
        assert!(matches!(err, WriteError::NotFound { collection: "tasks", .. }));
    }

    #[tokio::test]
    async fn subscription_is_seeded_and_sees_later_writes() {
        let store = LocalStore::in_memory();
        store
            .put(Collection::Departments, "d-1", json!({"id": "d-1", "name": "Ops"}))
            .await
            .unwrap();

        let mut sub = store.subscribe(Collection::Departments, Query::default());
        assert_eq!(sub.current().len(), 1);

        store
            .put(Collection::Departments, "d-2", json!({"id": "d-2", "name": "Sales"}))
            .await
            .unwrap();
        sub.changed().await.unwrap();
        assert_eq!(sub.current().len(), 2);
    }

    #[tokio::test]
    async fn recipient_query_filters_and_orders_newest_first() {
        let store = LocalStore::in_memory();
        for (user, ts) in [
            ("u-1", "2025-01-01T10:00:00Z"),
            ("u-2", "2025-01-03T10:00:00Z"),
            ("u-1", "2025-01-02T10:00:00Z"),
        ] {
            store
                .create(
                    Collection::Notifications,
                    json!({"userId": user, "timestamp": ts, "read": false}),
                )
                .await
                .unwrap();
        }

        let mut sub = store.subscribe(Collection::Notifications, Query::recipient("u-1"));
        let snap = sub.current();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].1["timestamp"], json!("2025-01-02T10:00:00Z"));
        assert_eq!(snap[1].1["timestamp"], json!("2025-01-01T10:00:00Z"));
    }

    #[tokio::test]
    async fn store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = LocalStore::open(&path);
        let id = store
            .create(Collection::Projects, json!({"name": "Atlas", "progress": 40}))
            .await
            .unwrap();
        drop(store);

        let store = LocalStore::open(&path);
        let mut sub = store.subscribe(Collection::Projects, Query::default());
        let snap = sub.current();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].0, id);
        assert_eq!(snap[0].1["name"], json!("Atlas"));
    }
}
