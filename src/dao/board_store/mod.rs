pub mod fs;

use futures::future::BoxFuture;

use crate::dao::{
    models::{BoardEntity, BoardListItemEntity},
    storage::StorageResult,
};

/// Abstraction over the persistence layer for question boards.
pub trait BoardStore: Send + Sync {
    fn list_boards(&self) -> BoxFuture<'static, StorageResult<Vec<BoardListItemEntity>>>;
    fn find_board(&self, id: String) -> BoxFuture<'static, StorageResult<Option<BoardEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
