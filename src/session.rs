//! Signed-in session identity.
//!
//! Stands in for the hosted authentication collaborator: the current user's
//! id and display name, persisted under the data directory so one sign-in
//! spans CLI invocations. No session means every data command fails with
//! [`AuthError::SignedOut`] and no subscriptions are opened.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// The authenticated identity commands act as.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub user_id: String,
    pub display_name: String,
}

fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join("session.json")
}

impl Session {
    /// Record a signed-in identity.
    pub fn sign_in(data_dir: &Path, user_id: &str, display_name: &str) -> Result<Session, AuthError> {
        let session = Session {
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
        };
        fs::create_dir_all(data_dir)?;
        fs::write(
            session_path(data_dir),
            serde_json::to_string_pretty(&session)?,
        )?;
        Ok(session)
    }

    /// The current signed-in identity, or `SignedOut` if there is none.
    pub fn current(data_dir: &Path) -> Result<Session, AuthError> {
        let path = session_path(data_dir);
        if !path.exists() {
            return Err(AuthError::SignedOut);
        }
        let buf = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&buf)?)
    }

    /// End the session. Idempotent.
    pub fn sign_out(data_dir: &Path) -> Result<(), AuthError> {
        let path = session_path(data_dir);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}
