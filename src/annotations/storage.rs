use std::collections::HashMap;

use crate::error::{GraphError, Result};

/// Synchronous string key-value storage.
pub trait KeyValueBackend {
	/// `Ok(None)` when the key was never written.
	fn read(&self, key: &str) -> Result<Option<String>>;
	/// Writes the value stored under `key`.
	fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<B: KeyValueBackend + ?Sized> KeyValueBackend for Box<B> {
	fn read(&self, key: &str) -> Result<Option<String>> {
		(**self).read(key)
	}

	fn write(&mut self, key: &str, value: &str) -> Result<()> {
		(**self).write(key, value)
	}
}

/// In-process storage, for tests and when `localStorage` is unavailable.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
	entries: HashMap<String, String>,
}

impl KeyValueBackend for MemoryBackend {
	fn read(&self, key: &str) -> Result<Option<String>> {
		Ok(self.entries.get(key).cloned())
	}

	fn write(&mut self, key: &str, value: &str) -> Result<()> {
		self.entries.insert(key.to_string(), value.to_string());
		Ok(())
	}
}

/// The browser's `localStorage`.
#[derive(Clone, Debug)]
pub struct BrowserStorage {
	storage: web_sys::Storage,
}

impl BrowserStorage {
	/// Opens `window.localStorage`. Fails outside a browser or when storage is disabled.
	pub fn local() -> Result<Self> {
		let window = web_sys::window().ok_or(GraphError::RenderTargetUnavailable)?;
		let storage = window
			.local_storage()
			.map_err(|e| GraphError::Storage(format!("{e:?}")))?
			.ok_or_else(|| GraphError::Storage("localStorage disabled".into()))?;
		Ok(Self { storage })
	}
}

impl KeyValueBackend for BrowserStorage {
	fn read(&self, key: &str) -> Result<Option<String>> {
		self.storage
			.get_item(key)
			.map_err(|e| GraphError::Storage(format!("{e:?}")))
	}

	fn write(&mut self, key: &str, value: &str) -> Result<()> {
		self.storage
			.set_item(key, value)
			.map_err(|e| GraphError::Storage(format!("{e:?}")))
	}
}

/// `localStorage` when present, memory otherwise.
pub fn default_backend() -> Box<dyn KeyValueBackend> {
	match BrowserStorage::local() {
		Ok(storage) => Box::new(storage),
		Err(e) => {
			log::warn!("falling back to in-memory storage: {e}");
			Box::new(MemoryBackend::default())
		}
	}
}
