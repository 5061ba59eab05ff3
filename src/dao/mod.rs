/// Board storage and retrieval operations.
pub mod board_store;
/// Stored model definitions.
pub mod models;
/// Storage abstraction layer shared by board backends.
pub mod storage;
