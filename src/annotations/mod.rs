//! Durable user annotations: node tags and viewer preferences.

mod preferences;
mod storage;
mod tags;

pub use preferences::{PreferenceStore, Preferences};
pub use storage::{BrowserStorage, KeyValueBackend, MemoryBackend, default_backend};
pub use tags::{AnnotationStore, Tag, TagStore};
