use log::warn;

use super::storage::KeyValueBackend;

const SHORT_LABELS_KEY: &str = "txgraph.prefs.shortLabels";
const PINNED_KEY: &str = "txgraph.prefs.globallyPinned";

/// Viewer settings that outlive a page reload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Preferences {
	/// Abbreviate hashes and addresses in node labels.
	pub short_labels: bool,
	/// Freeze the layout; only dragged nodes move.
	pub globally_pinned: bool,
}

/// Each preference lives under its own key so one can be written without the
/// other.
pub struct PreferenceStore {
	backend: Box<dyn KeyValueBackend>,
	current: Preferences,
}

impl PreferenceStore {
	/// Reads both flags. Missing or unreadable values are `false`.
	pub fn open(backend: Box<dyn KeyValueBackend>) -> Self {
		let current = Preferences {
			short_labels: read_flag(backend.as_ref(), SHORT_LABELS_KEY),
			globally_pinned: read_flag(backend.as_ref(), PINNED_KEY),
		};
		Self { backend, current }
	}

	/// Get.
	pub fn get(&self) -> Preferences {
		self.current
	}

	/// Persists immediately; a failed write is logged and the in-memory value kept.
	pub fn set_short_labels(&mut self, on: bool) {
		self.current.short_labels = on;
		self.write_flag(SHORT_LABELS_KEY, on);
	}

	/// Set globally pinned.
	pub fn set_globally_pinned(&mut self, on: bool) {
		self.current.globally_pinned = on;
		self.write_flag(PINNED_KEY, on);
	}

	/// Into backend.
	pub fn into_backend(self) -> Box<dyn KeyValueBackend> {
		self.backend
	}

	fn write_flag(&mut self, key: &str, on: bool) {
		if let Err(e) = self.backend.write(key, if on { "true" } else { "false" }) {
			warn!("could not persist {key}: {e}");
		}
	}
}

fn read_flag(backend: &dyn KeyValueBackend, key: &str) -> bool {
	match backend.read(key) {
		Ok(value) => value.as_deref() == Some("true"),
		Err(e) => {
			warn!("could not read {key}: {e}");
			false
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::annotations::storage::MemoryBackend;

	#[test]
	fn defaults_off() {
		let prefs = PreferenceStore::open(Box::new(MemoryBackend::default()));
		assert_eq!(prefs.get(), Preferences::default());
	}

	#[test]
	fn flags_persist_independently() {
		let mut prefs = PreferenceStore::open(Box::new(MemoryBackend::default()));
		prefs.set_globally_pinned(true);
		let mut prefs = PreferenceStore::open(prefs.into_backend());
		assert!(prefs.get().globally_pinned);
		assert!(!prefs.get().short_labels);

		prefs.set_short_labels(true);
		prefs.set_globally_pinned(false);
		let prefs = PreferenceStore::open(prefs.into_backend());
		assert_eq!(
			prefs.get(),
			Preferences {
				short_labels: true,
				globally_pinned: false
			}
		);
	}
}
