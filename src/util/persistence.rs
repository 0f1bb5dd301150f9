use std::fs;
use std::io;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde_json::Error as SerdeError;

use crate::domain::session::ValuationSession;

const APP_QUALIFIER: &str = "in";
const APP_ORG: &str = "WorthyTen";
const APP_NAME: &str = "WorthyTen";

fn draft_file() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join("draft_session.json"))
}

/// Load a previously saved in-progress valuation, if any. Unreadable or
/// stale-format drafts are treated as absent.
pub fn load_draft_session() -> Option<ValuationSession> {
    let path = draft_file()?;
    let data = fs::read_to_string(path).ok()?;
    serde_json::from_str(&data).ok()
}

pub fn save_draft_session(session: &ValuationSession) -> Result<(), PersistSaveError> {
    let path = draft_file().ok_or(PersistSaveError::StorageUnavailable)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(session)?;
    fs::write(path, json)?;
    Ok(())
}

/// Discard the draft, e.g. once a pickup request has been booked.
pub fn clear_draft_session() {
    if let Some(path) = draft_file() {
        let _ = fs::remove_file(path);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistSaveError {
    #[error("storage directory unavailable")]
    StorageUnavailable,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] SerdeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::DeviceCategory;

    #[test]
    fn draft_survives_a_round_trip_and_clears() {
        // Skip on machines without a resolvable config dir.
        if draft_file().is_none() {
            return;
        }

        let session =
            ValuationSession::new("Apple", "iPhone 13", DeviceCategory::Phone, 60_000.0);
        save_draft_session(&session).expect("draft saved");

        let loaded = load_draft_session().expect("draft loads");
        assert_eq!(loaded, session);

        clear_draft_session();
        assert!(load_draft_session().is_none());
    }
}
