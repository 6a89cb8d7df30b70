pub mod event;
pub mod meta;
pub mod snapshot;

pub use event::{CommitInfo, Event, EventMetadata, GlobalEntry, Sequence, Version};
pub use meta::{StoreMeta, StreamInfo};
pub use snapshot::Snapshot;
