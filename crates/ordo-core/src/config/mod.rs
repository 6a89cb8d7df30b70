pub mod store;

pub use store::{GlobalEntryMode, StoreConfig, SyncMode};
