/// Persisted blob layout and conversions.
pub mod models;
/// Key/blob storage backends.
pub mod snapshot_store;
/// Storage abstraction layer errors.
pub mod storage;
