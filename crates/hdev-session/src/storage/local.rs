//! Local filesystem session storage
//!
//! Sessions are stored as pretty-printed JSON under an explicit base
//! directory:
//! - root sessions at `<base>/<session_id>/root.json`
//! - compacted sessions at `<base>/<parent_session_id>/<session_id>.json`

use super::{SessionFilter, SessionInfo, SessionStore, StorageError, StorageResult};
use crate::Session;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

const ROOT_FILE_NAME: &str = "root.json";

/// Session ids become path components and must stay inside the base directory
fn validate_id(session_id: &str) -> StorageResult<()> {
    let invalid = session_id.is_empty()
        || session_id == "."
        || session_id.contains("..")
        || session_id.contains(['/', '\\', '\0']);
    if invalid {
        return Err(StorageError::InvalidId(session_id.to_string()));
    }
    Ok(())
}

/// Local filesystem session storage
pub struct LocalSessionStore {
    /// Base directory for session files
    base_path: PathBuf,
}

impl LocalSessionStore {
    /// Create storage rooted at `base_path`
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Base directory of this store
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// File path a session is written to
    pub fn session_path(&self, session: &Session) -> PathBuf {
        match session.parent_session_id {
            None => self
                .base_path
                .join(&session.session_id)
                .join(ROOT_FILE_NAME),
            Some(ref parent) => self
                .base_path
                .join(parent)
                .join(format!("{}.json", session.session_id)),
        }
    }

    /// Find the file holding `session_id`, if any
    async fn locate(&self, session_id: &str) -> StorageResult<Option<PathBuf>> {
        validate_id(session_id)?;
        let root_path = self.base_path.join(session_id).join(ROOT_FILE_NAME);
        if fs::try_exists(&root_path).await? {
            return Ok(Some(root_path));
        }

        if !fs::try_exists(&self.base_path).await? {
            return Ok(None);
        }

        let file_name = format!("{}.json", session_id);
        let mut entries = fs::read_dir(&self.base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let candidate = entry.path().join(&file_name);
            if fs::try_exists(&candidate).await? {
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }

    async fn read_session(path: &Path) -> StorageResult<Session> {
        let content = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl SessionStore for LocalSessionStore {
    async fn save(&self, session: &Session) -> StorageResult<()> {
        validate_id(&session.session_id)?;
        if let Some(parent) = &session.parent_session_id {
            validate_id(parent)?;
        }
        let path = self.session_path(session);
        let dir = path
            .parent()
            .ok_or_else(|| StorageError::InvalidData(format!("no parent for {:?}", path)))?;
        fs::create_dir_all(dir).await?;

        let mut record = session.clone();
        if fs::try_exists(&path).await? {
            match Self::read_session(&path).await {
                Ok(existing) => record.metadata.created_at = existing.metadata.created_at,
                Err(e) => warn!("Ignoring unreadable session file {:?}: {}", path, e),
            }
        }
        record.metadata.touch();

        let content = serde_json::to_string_pretty(&record)?;
        let tmp_path = dir.join(format!(".{}.{}.tmp", session.session_id, Uuid::new_v4()));
        fs::write(&tmp_path, content).await?;
        fs::rename(&tmp_path, &path).await?;

        debug!("Saved session {} to {:?}", session.session_id, path);
        Ok(())
    }

    async fn load(&self, session_id: &str) -> StorageResult<Session> {
        let path = self
            .locate(session_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(session_id.to_string()))?;

        let session = Self::read_session(&path).await?;
        if session.session_id != session_id {
            return Err(StorageError::InvalidData(format!(
                "file {:?} holds session {}, expected {}",
                path, session.session_id, session_id
            )));
        }

        debug!("Loaded session {} from {:?}", session_id, path);
        Ok(session)
    }

    async fn exists(&self, session_id: &str) -> StorageResult<bool> {
        Ok(self.locate(session_id).await?.is_some())
    }

    async fn list(&self, filter: &SessionFilter) -> StorageResult<Vec<SessionInfo>> {
        if !fs::try_exists(&self.base_path).await? {
            return Ok(Vec::new());
        }

        let mut sessions = Vec::new();
        let mut dirs = fs::read_dir(&self.base_path).await?;

        while let Some(dir) = dirs.next_entry().await? {
            if !dir.file_type().await?.is_dir() {
                continue;
            }

            let mut files = fs::read_dir(dir.path()).await?;
            while let Some(file) = files.next_entry().await? {
                let path = file.path();

                // Only process .json files
                if path.extension().and_then(|s| s.to_str()) != Some("json") {
                    continue;
                }

                match Self::read_session(&path).await {
                    Ok(session) => {
                        let info = SessionInfo::from(&session);
                        if filter.matches(&info) {
                            sessions.push(info);
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read session from {:?}: {}", path, e);
                    }
                }
            }
        }

        // Sort by modified time (newest first)
        sessions.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));

        if let Some(limit) = filter.limit {
            sessions.truncate(limit);
        }

        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Message, ModelSpec};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_test_storage() -> (LocalSessionStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalSessionStore::new(temp_dir.path());
        (storage, temp_dir)
    }

    fn spec() -> ModelSpec {
        ModelSpec::new("test-model", 100_000, 4_096)
    }

    #[tokio::test]
    async fn test_save_and_load_root() {
        let (storage, temp) = create_test_storage();

        let mut session = Session::new(spec());
        session.add_message(Message::user("Hello"));
        session.add_message(Message::assistant("Hi there!"));
        storage.save(&session).await.unwrap();

        let expected = temp.path().join(session.id()).join("root.json");
        assert!(expected.exists());

        let loaded = storage.load(session.id()).await.unwrap();
        assert_eq!(loaded.messages, session.messages);
        assert!(loaded.is_root());
    }

    #[tokio::test]
    async fn test_child_stored_under_parent() {
        let (storage, temp) = create_test_storage();

        let root = Session::new(spec());
        storage.save(&root).await.unwrap();

        let child = Session::new(spec()).with_parent(root.id());
        storage.save(&child).await.unwrap();

        let expected = temp
            .path()
            .join(root.id())
            .join(format!("{}.json", child.id()));
        assert!(expected.exists());

        let loaded = storage.load(child.id()).await.unwrap();
        assert_eq!(loaded.parent_session_id.as_deref(), Some(root.id()));
    }

    #[tokio::test]
    async fn test_rejects_ids_outside_base() {
        let (storage, temp) = create_test_storage();

        assert!(matches!(
            storage.exists("../x").await,
            Err(StorageError::InvalidId(_))
        ));
        assert!(matches!(
            storage.load("a/b").await,
            Err(StorageError::InvalidId(_))
        ));

        let mut session = Session::new(spec());
        session.session_id = "../evil".to_string();
        assert!(matches!(
            storage.save(&session).await,
            Err(StorageError::InvalidId(_))
        ));

        let child = Session::new(spec()).with_parent("..");
        assert!(matches!(
            storage.save(&child).await,
            Err(StorageError::InvalidId(_))
        ));
        assert!(!temp.path().join("..").join("evil").exists());
        assert!(std::fs::read_dir(temp.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_save_is_idempotent_and_keeps_created_at() {
        let (storage, _temp) = create_test_storage();

        let session = Session::new(spec());
        storage.save(&session).await.unwrap();
        let first = storage.load(session.id()).await.unwrap();

        let mut later = session.clone();
        later.metadata.created_at = chrono::Utc::now() + chrono::Duration::hours(1);
        storage.save(&later).await.unwrap();
        storage.save(&later).await.unwrap();

        let second = storage.load(session.id()).await.unwrap();
        assert_eq!(second.metadata.created_at, first.metadata.created_at);
        assert_eq!(storage.list(&SessionFilter::new()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_not_found() {
        let (storage, _temp) = create_test_storage();

        let result = storage.load("nonexistent").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(!storage.exists("nonexistent").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_with_filter() {
        let (storage, _temp) = create_test_storage();

        let root = Session::new(spec());
        storage.save(&root).await.unwrap();
        storage.save(&Session::new(spec())).await.unwrap();
        storage
            .save(&Session::new(spec()).with_parent(root.id()))
            .await
            .unwrap();

        let all = storage.list(&SessionFilter::new()).await.unwrap();
        assert_eq!(all.len(), 3);

        let roots = storage
            .list(&SessionFilter::new().roots_only())
            .await
            .unwrap();
        assert_eq!(roots.len(), 2);

        let children = storage
            .list(&SessionFilter::new().children_of(root.id()))
            .await
            .unwrap();
        assert_eq!(children.len(), 1);

        let limited = storage
            .list(&SessionFilter::new().with_limit(1))
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_lineage_walks_to_root() {
        let (storage, _temp) = create_test_storage();

        let root = Session::new(spec());
        storage.save(&root).await.unwrap();

        let mut parent_id = root.id().to_string();
        for _ in 0..3 {
            let child = Session::new(spec()).with_parent(parent_id.clone());
            storage.save(&child).await.unwrap();
            parent_id = child.id().to_string();
        }

        let chain = storage.lineage(&parent_id).await.unwrap();
        assert_eq!(chain.len(), 4);
        assert_eq!(chain.first().unwrap(), &parent_id);
        assert_eq!(chain.last().unwrap(), root.id());
    }

    #[tokio::test]
    async fn test_lineage_detects_cycle() {
        let (storage, _temp) = create_test_storage();

        let a = Session::with_id("a", spec()).with_parent("b");
        let b = Session::with_id("b", spec()).with_parent("a");
        storage.save(&a).await.unwrap();
        storage.save(&b).await.unwrap();

        let result = storage.lineage("a").await;
        assert!(matches!(result, Err(StorageError::LineageCycle(_))));
    }

    #[tokio::test]
    async fn test_concurrent_saves_on_distinct_ids() {
        let (storage, _temp) = create_test_storage();
        let storage = Arc::new(storage);

        let mut handles = Vec::new();
        for i in 0..8 {
            let storage = Arc::clone(&storage);
            handles.push(tokio::spawn(async move {
                let mut session = Session::new(spec());
                session.add_message(Message::user(format!("message {}", i)));
                storage.save(&session).await.unwrap();
                session.session_id
            }));
        }

        for handle in handles {
            let id = handle.await.unwrap();
            assert!(storage.exists(&id).await.unwrap());
        }
    }
}
