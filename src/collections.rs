//! Live entity collections.
//!
//! [`Workspace`] is the in-memory view of the five remote collections. It is
//! a cache, not the source of truth: every snapshot event replaces the whole
//! mapping for its collection, so a view never mixes stale and fresh entries
//! of one kind. Before the first snapshot arrives a mapping is simply empty;
//! consumers cannot (and must not) tell the two cases apart.
//!
//! Documents that fail to decode are skipped with a warning rather than
//! poisoning the snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::ReadError;
use crate::notify::Notification;
use crate::org::{Department, Project, User};
use crate::session::Session;
use crate::store::{Collection, Query, RemoteStore, Snapshot};
use crate::task::Task;

/// One delivered snapshot, tagged with its collection.
pub struct SnapshotEvent {
    pub collection: Collection,
    pub docs: Snapshot,
}

/// The in-memory view of all five collections, plus a revision counter that
/// increments on every applied snapshot. Derived consumers recompute only
/// when the revision moves.
#[derive(Debug, Default)]
pub struct Workspace {
    pub tasks: HashMap<String, Task>,
    pub users: HashMap<String, User>,
    pub departments: HashMap<String, Department>,
    pub projects: HashMap<String, Project>,
    /// Scoped to the signed-in user, in delivered (newest-first) order.
    pub notifications: Vec<Notification>,
    revision: u64,
}

impl Workspace {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace the mapping for the event's collection with the snapshot
    /// contents. Full replace, never an incremental merge.
    pub fn apply(&mut self, event: SnapshotEvent) {
        match event.collection {
            Collection::Tasks => self.tasks = decode_map(event.collection, event.docs),
            Collection::Users => self.users = decode_map(event.collection, event.docs),
            Collection::Departments => {
                self.departments = decode_map(event.collection, event.docs)
            }
            Collection::Projects => self.projects = decode_map(event.collection, event.docs),
            Collection::Notifications => {
                self.notifications = decode_seq(event.collection, event.docs)
            }
        }
        self.revision += 1;
    }

    /// One-shot load: subscribe to every collection and apply the seed
    /// snapshots. Used by the one-off CLI commands; `spawn_sync` is the live
    /// equivalent.
    pub fn hydrate(store: &dyn RemoteStore, session: &Session) -> Workspace {
        let mut ws = Workspace::default();
        for collection in Collection::ALL {
            let mut sub = store.subscribe(collection, query_for(collection, session));
            ws.apply(SnapshotEvent {
                collection,
                docs: sub.current(),
            });
        }
        ws
    }
}

fn query_for(collection: Collection, session: &Session) -> Query {
    match collection {
        Collection::Notifications => Query::recipient(&session.user_id),
        _ => Query::default(),
    }
}

/// Decode one document, injecting the document id over any stored `id` field.
fn decode<T: DeserializeOwned>(
    collection: Collection,
    id: String,
    mut fields: Value,
) -> Result<T, ReadError> {
    if let Value::Object(map) = &mut fields {
        map.insert("id".to_string(), Value::String(id.clone()));
    }
    serde_json::from_value(fields).map_err(|source| ReadError::Decode {
        collection: collection.name(),
        id,
        source,
    })
}

fn decode_or_skip<T: DeserializeOwned>(collection: Collection, id: String, fields: Value) -> Option<T> {
    match decode(collection, id, fields) {
        Ok(entity) => Some(entity),
        Err(err) => {
            tracing::warn!(%err, "skipping undecodable document");
            None
        }
    }
}

fn decode_map<T: DeserializeOwned>(collection: Collection, docs: Snapshot) -> HashMap<String, T> {
    docs.into_iter()
        .filter_map(|(id, fields)| Some((id.clone(), decode_or_skip(collection, id, fields)?)))
        .collect()
}

fn decode_seq<T: DeserializeOwned>(collection: Collection, docs: Snapshot) -> Vec<T> {
    docs.into_iter()
        .filter_map(|(id, fields)| decode_or_skip(collection, id, fields))
        .collect()
}

/// Owns the per-collection forwarder tasks and keeps the store adapter alive
/// while they run. Dropping the handle aborts the forwarders, which releases
/// the underlying subscriptions; required when the session ends so a stale
/// identity stops receiving data.
pub struct SyncHandle {
    forwarders: Vec<JoinHandle<()>>,
    _store: Arc<dyn RemoteStore>,
}

impl SyncHandle {
    pub fn shutdown(self) {}
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        for task in &self.forwarders {
            task.abort();
        }
    }
}

/// Start live synchronisation: one forwarder per collection, each pushing
/// its seed snapshot and every subsequent change into a single event channel.
/// Events from different collections arrive independently and in no
/// guaranteed relative order.
pub fn spawn_sync(
    store: Arc<dyn RemoteStore>,
    session: &Session,
) -> (mpsc::Receiver<SnapshotEvent>, SyncHandle) {
    let (tx, rx) = mpsc::channel(16);
    let mut forwarders = Vec::new();
    for collection in Collection::ALL {
        let mut sub = store.subscribe(collection, query_for(collection, session));
        let tx = tx.clone();
        forwarders.push(tokio::spawn(async move {
            loop {
                let docs = sub.current();
                if tx.send(SnapshotEvent { collection, docs }).await.is_err() {
                    break;
                }
                if sub.changed().await.is_err() {
                    break;
                }
            }
        }));
    }
    let handle = SyncHandle {
        forwarders,
        _store: store,
    };
    (rx, handle)
}
