//! Error kinds for the dashboard core.
//!
//! No error here is fatal to the process: each is scoped to the operation
//! that produced it. Writes are never optimistic, so a failed command leaves
//! local state untouched and needs no rollback.

use thiserror::Error;

/// Session invalid, expired, or absent. Routes the caller to sign-in.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("not signed in")]
    SignedOut,

    #[error("session store: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt session file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A remote write was rejected. Surfaces to the initiating command.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("document {id} not found in {collection}")]
    NotFound { collection: &'static str, id: String },

    #[error("write rejected: {0}")]
    Rejected(String),

    #[error("encode: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
}

/// A subscription or snapshot decode failed. The view keeps showing stale or
/// empty data until resubscription succeeds.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("decode {collection}/{id}: {source}")]
    Decode {
        collection: &'static str,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("subscription closed")]
    SubscriptionClosed,
}

/// The AI insight request failed. Non-fatal; callers show a localized
/// fallback message.
#[derive(Error, Debug)]
pub enum AiError {
    #[error("missing API key (set {0})")]
    MissingApiKey(&'static str),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("empty response from service")]
    EmptyResponse,
}

/// Crate-wide aggregate used at the CLI boundary.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// CLI-level misuse: unknown or ambiguous identifiers, bad arguments.
    #[error("{0}")]
    Usage(String),
}

pub type Result<T> = std::result::Result<T, Error>;
