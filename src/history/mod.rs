pub mod blob_store;
pub mod record;
pub mod store;

pub use blob_store::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use record::{NewTranslation, TranslationRecord};
pub use store::HistoryStore;
