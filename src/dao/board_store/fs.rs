//! Filesystem-backed board store.
//!
//! Boards live as individual JSON files under a configured directory; the
//! file stem is the board id. Files that fail to decode are skipped during
//! listing and reported as malformed on direct lookup.

use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use tracing::warn;

use crate::dao::{
    board_store::BoardStore,
    models::{BoardEntity, BoardListItemEntity},
    storage::{StorageError, StorageResult},
};

/// Board store reading JSON board files from a directory.
#[derive(Debug, Clone)]
pub struct FsBoardStore {
    boards_dir: PathBuf,
}

impl FsBoardStore {
    /// Create a store over the given directory. The directory is probed
    /// lazily; a missing directory surfaces through [`BoardStore::health_check`].
    pub fn new(boards_dir: impl Into<PathBuf>) -> Self {
        Self {
            boards_dir: boards_dir.into(),
        }
    }

    fn board_path(&self, id: &str) -> PathBuf {
        self.boards_dir.join(format!("{id}.json"))
    }

    async fn read_board(path: &Path, id: &str) -> StorageResult<BoardEntity> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|source| {
            StorageError::unavailable(format!("cannot read {}", path.display()), source)
        })?;
        let mut entity: BoardEntity = serde_json::from_str(&contents).map_err(|source| {
            StorageError::malformed(id, format!("cannot decode {}", path.display()), source)
        })?;
        // The file stem is authoritative over whatever id the file carries.
        entity.id = id.to_owned();
        Ok(entity)
    }

    async fn list(&self) -> StorageResult<Vec<BoardListItemEntity>> {
        let mut entries = tokio::fs::read_dir(&self.boards_dir)
            .await
            .map_err(|source| {
                StorageError::unavailable(
                    format!("cannot read boards directory {}", self.boards_dir.display()),
                    source,
                )
            })?;

        let mut boards = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|source| {
            StorageError::unavailable("cannot iterate boards directory".to_owned(), source)
        })? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            match Self::read_board(&path, id).await {
                Ok(entity) => boards.push(BoardListItemEntity::from(&entity)),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable board file");
                }
            }
        }

        boards.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(boards)
    }

    async fn find(&self, id: String) -> StorageResult<Option<BoardEntity>> {
        let path = self.board_path(&id);
        match tokio::fs::try_exists(&path).await {
            Ok(true) => Self::read_board(&path, &id).await.map(Some),
            Ok(false) => Ok(None),
            Err(source) => Err(StorageError::unavailable(
                format!("cannot probe {}", path.display()),
                source,
            )),
        }
    }

    async fn probe(&self) -> StorageResult<()> {
        let metadata = tokio::fs::metadata(&self.boards_dir)
            .await
            .map_err(|source| {
                StorageError::unavailable(
                    format!("boards directory {} is missing", self.boards_dir.display()),
                    source,
                )
            })?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(StorageError::Unavailable {
                message: format!("{} is not a directory", self.boards_dir.display()),
                source: std::io::Error::from(std::io::ErrorKind::NotADirectory).into(),
            })
        }
    }
}

impl BoardStore for FsBoardStore {
    fn list_boards(&self) -> BoxFuture<'static, StorageResult<Vec<BoardListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list().await })
    }

    fn find_board(&self, id: String) -> BoxFuture<'static, StorageResult<Option<BoardEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find(id).await })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.probe().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_board_json() -> &'static str {
        r#"{
            "id": "ignored",
            "title": "General Knowledge",
            "rounds": [{
                "name": "Round 1",
                "categories": [{
                    "name": "History",
                    "clues": [
                        {"text": "q1", "answer": "a1", "value": 100},
                        {"text": "q2", "answer": "a2", "value": 200, "timeout_ms": 8000}
                    ]
                }]
            }]
        }"#
    }

    #[tokio::test]
    async fn finds_and_lists_boards_by_file_stem() {
        let dir = std::env::temp_dir().join(format!("boards-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("general.json"), sample_board_json())
            .await
            .unwrap();
        tokio::fs::write(dir.join("notes.txt"), "not a board")
            .await
            .unwrap();

        let store = FsBoardStore::new(&dir);
        let listed = store.list_boards().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "general");
        assert_eq!(listed[0].clue_count, 2);

        let board = store
            .find_board("general".into())
            .await
            .unwrap()
            .expect("board should exist");
        assert_eq!(board.id, "general");
        assert_eq!(board.title, "General Knowledge");
        assert_eq!(board.rounds[0].categories[0].clues[1].timeout_ms, Some(8000));

        assert!(store.find_board("missing".into()).await.unwrap().is_none());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn works_behind_the_store_trait_object() {
        let dir = std::env::temp_dir().join(format!("boards-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("general.json"), sample_board_json())
            .await
            .unwrap();

        // Installed stores are held as trait objects; the probe and lookups
        // must resolve through the trait, not inherent methods.
        let store: std::sync::Arc<dyn BoardStore> = std::sync::Arc::new(FsBoardStore::new(&dir));
        store.health_check().await.unwrap();
        assert_eq!(store.list_boards().await.unwrap().len(), 1);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn health_check_requires_the_directory() {
        let dir = std::env::temp_dir().join(format!("boards-{}", uuid::Uuid::new_v4()));
        let store = FsBoardStore::new(&dir);
        assert!(store.health_check().await.is_err());

        tokio::fs::create_dir_all(&dir).await.unwrap();
        assert!(store.health_check().await.is_ok());
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
