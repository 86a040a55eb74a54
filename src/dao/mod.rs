/// Session and chat log storage backends.
pub mod arena_store;
/// Database model definitions.
pub mod models;
/// Storage error types shared by every backend.
pub mod storage;
