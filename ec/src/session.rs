//! Session folders
//!
//! Every analysis run writes its artifacts into
//! `<sessions-dir>/<YYYYMMDD>_<HHMM>_<xxxx>/`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::diagram::DIAGRAM_FILE;
use crate::report::REPORT_FILE;

/// Errors raised by the session store
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid session id: {0}")]
    InvalidId(String),

    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SessionError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

const CREATE_ATTEMPTS: usize = 8;

/// One analysis run and the folder holding its artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub folder: PathBuf,
}

impl Session {
    /// Create a fresh session folder under `root`
    pub fn create(root: impl AsRef<Path>) -> Result<Self, SessionError> {
        let root = root.as_ref();
        debug!(root = %root.display(), "Session::create: called");
        fs::create_dir_all(root).map_err(|e| SessionError::io(root, e))?;

        let stamp = Local::now().format("%Y%m%d_%H%M").to_string();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let suffix: String = Uuid::new_v4().simple().to_string().chars().take(4).collect();
            let id = format!("{}_{}", stamp, suffix);
            let folder = root.join(&id);
            match fs::create_dir(&folder) {
                Ok(()) => {
                    info!("Created session folder: {}", folder.display());
                    return Ok(Self { id, folder });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempt < CREATE_ATTEMPTS => {
                    debug!(%id, "Session::create: id collision");
                }
                Err(e) => return Err(SessionError::io(&folder, e)),
            }
        }
    }

    pub fn report_path(&self) -> PathBuf {
        self.folder.join(REPORT_FILE)
    }

    pub fn diagram_path(&self) -> PathBuf {
        self.folder.join(DIAGRAM_FILE)
    }
}

/// Listing entry for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    /// `YYYY-MM-DD HH:MM`, or the raw id when it does not parse
    pub created_at: String,
    pub has_summary: bool,
    pub has_diagram: bool,
}

/// Contents of one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionDetail {
    pub session_id: String,
    /// Markdown report, empty when it was never written
    pub summary: String,
    pub has_diagram: bool,
    pub diagram_url: Option<String>,
}

/// Reject ids that could escape the sessions directory
pub fn validate_session_id(id: &str) -> Result<(), SessionError> {
    let valid = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(SessionError::InvalidId(id.to_string()))
    }
}

/// Creation time encoded in a session id
fn created_at(id: &str) -> String {
    let parts: Vec<&str> = id.split('_').collect();
    if let [date, time, _suffix] = parts[..]
        && let Ok(parsed) = NaiveDateTime::parse_from_str(&format!("{}{}", date, time), "%Y%m%d%H%M")
    {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    id.to_string()
}

/// All sessions under `root`, newest id first
pub fn list_sessions(root: impl AsRef<Path>) -> Result<Vec<SessionInfo>, SessionError> {
    let root = root.as_ref();
    debug!(root = %root.display(), "list_sessions: called");
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut sessions = Vec::new();
    for entry in fs::read_dir(root).map_err(|e| SessionError::io(root, e))? {
        let entry = entry.map_err(|e| SessionError::io(root, e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let session_id = entry.file_name().to_string_lossy().into_owned();
        sessions.push(SessionInfo {
            created_at: created_at(&session_id),
            has_summary: path.join(REPORT_FILE).exists(),
            has_diagram: path.join(DIAGRAM_FILE).exists(),
            session_id,
        });
    }

    sessions.sort_by(|a, b| b.session_id.cmp(&a.session_id));
    Ok(sessions)
}

/// Folder of an existing session
pub fn session_folder(root: impl AsRef<Path>, id: &str) -> Result<PathBuf, SessionError> {
    validate_session_id(id)?;
    let folder = root.as_ref().join(id);
    if !folder.is_dir() {
        return Err(SessionError::NotFound(id.to_string()));
    }
    Ok(folder)
}

/// Load the report and diagram status of one session
pub fn load_session(root: impl AsRef<Path>, id: &str) -> Result<SessionDetail, SessionError> {
    debug!(%id, "load_session: called");
    let folder = session_folder(root, id)?;

    let report = folder.join(REPORT_FILE);
    let summary = if report.exists() {
        fs::read_to_string(&report).map_err(|e| SessionError::io(&report, e))?
    } else {
        String::new()
    };

    let has_diagram = folder.join(DIAGRAM_FILE).exists();
    Ok(SessionDetail {
        session_id: id.to_string(),
        summary,
        has_diagram,
        diagram_url: has_diagram.then(|| format!("/sessions/{}/{}", id, DIAGRAM_FILE)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_session_folder() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("sessions");

        let session = Session::create(&root).unwrap();
        assert!(session.folder.is_dir());
        assert_eq!(session.folder, root.join(&session.id));

        let parts: Vec<&str> = session.id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 8);
        assert_eq!(parts[1].len(), 4);
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
        assert!(validate_session_id(&session.id).is_ok());
    }

    #[test]
    fn test_sessions_are_distinct() {
        let dir = TempDir::new().unwrap();
        let a = Session::create(dir.path()).unwrap();
        let b = Session::create(dir.path()).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_list_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(list_sessions(dir.path().join("none")).unwrap().is_empty());
    }

    #[test]
    fn test_list_sorted_newest_first() {
        let dir = TempDir::new().unwrap();
        for id in ["20240101_0900_aaaa", "20240305_1415_bbbb", "scratch"] {
            fs::create_dir(dir.path().join(id)).unwrap();
        }
        fs::write(dir.path().join("20240305_1415_bbbb").join(REPORT_FILE), "# r").unwrap();
        fs::write(dir.path().join("stray.txt"), "x").unwrap();

        let sessions = list_sessions(dir.path()).unwrap();
        let ids: Vec<_> = sessions.iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, vec!["scratch", "20240305_1415_bbbb", "20240101_0900_aaaa"]);

        assert_eq!(sessions[0].created_at, "scratch");
        assert_eq!(sessions[1].created_at, "2024-03-05 14:15");
        assert!(sessions[1].has_summary);
        assert!(!sessions[2].has_summary);
        assert!(!sessions[2].has_diagram);
    }

    #[test]
    fn test_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let session = Session::create(dir.path()).unwrap();
        fs::write(session.report_path(), "# Report").unwrap();
        fs::write(session.diagram_path(), b"png").unwrap();

        let detail = load_session(dir.path(), &session.id).unwrap();
        assert_eq!(detail.summary, "# Report");
        assert!(detail.has_diagram);
        assert_eq!(
            detail.diagram_url,
            Some(format!("/sessions/{}/workflow_diagram.png", session.id))
        );
    }

    #[test]
    fn test_load_without_artifacts() {
        let dir = TempDir::new().unwrap();
        let session = Session::create(dir.path()).unwrap();

        let detail = load_session(dir.path(), &session.id).unwrap();
        assert!(detail.summary.is_empty());
        assert!(!detail.has_diagram);
        assert!(detail.diagram_url.is_none());
    }

    #[test]
    fn test_load_missing_and_invalid() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_session(dir.path(), "20240101_0000_ffff"),
            Err(SessionError::NotFound(_))
        ));
        assert!(matches!(load_session(dir.path(), "../etc"), Err(SessionError::InvalidId(_))));
        assert!(matches!(load_session(dir.path(), ""), Err(SessionError::InvalidId(_))));
    }
}
