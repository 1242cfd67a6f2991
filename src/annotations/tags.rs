use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::storage::KeyValueBackend;
use crate::components::tx_graph::NodeKind;
use crate::error::{GraphError, Result};

const TAGS_KEY: &str = "txgraph.tags";

/// A user label attached to a node id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
	/// UUID v4.
	pub id: String,
	/// Node id.
	pub node_id: String,
	/// Kind of the node when it was tagged.
	pub node_kind: NodeKind,
	/// Trimmed, never empty.
	pub text: String,
	/// CSS colour used for the node ring.
	pub color: String,
	/// Created at.
	pub created_at: DateTime<Utc>,
	/// Updated at.
	pub updated_at: DateTime<Utc>,
}

/// Node-id → tags mapping used for styling and the tag panel.
///
/// Every call is synchronous and durable once it returns.
pub trait AnnotationStore {
	/// Tags on `node_id`, oldest first.
	fn tags_for_node(&self, node_id: &str) -> Vec<Tag>;

	/// Creates a tag. Blank text is rejected with [`GraphError::EmptyTagText`].
	fn add_tag(
		&mut self,
		node_id: &str,
		node_kind: NodeKind,
		text: &str,
		color: &str,
	) -> Result<Tag>;

	/// `Ok(None)` when no tag has `tag_id`. Blank text is an error, as for
	/// [`add_tag`](Self::add_tag).
	fn update_tag(&mut self, tag_id: &str, text: &str, color: &str) -> Result<Option<Tag>>;

	/// `Ok(false)` when no tag has `tag_id`.
	fn remove_tag(&mut self, tag_id: &str) -> Result<bool>;

	/// Whether `node_id` carries at least one tag.
	fn has_tags(&self, node_id: &str) -> bool {
		!self.tags_for_node(node_id).is_empty()
	}

	/// Colour of the oldest tag, used for the node ring.
	fn primary_color(&self, node_id: &str) -> Option<String> {
		self.tags_for_node(node_id).into_iter().next().map(|t| t.color)
	}
}

/// Tag list persisted as one JSON document.
#[derive(Debug)]
pub struct TagStore<B> {
	backend: B,
	tags: Vec<Tag>,
}

impl<B: KeyValueBackend> TagStore<B> {
	/// Loads whatever the backend holds. Unreadable data starts an empty list.
	pub fn open(backend: B) -> Self {
		let tags = match backend.read(TAGS_KEY) {
			Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
				warn!("discarding unreadable tag data: {e}");
				Vec::new()
			}),
			Ok(None) => Vec::new(),
			Err(e) => {
				warn!("could not read tags: {e}");
				Vec::new()
			}
		};
		debug!("loaded {} tags", tags.len());
		Self { backend, tags }
	}

	/// Gives back the backend, e.g. to reopen the store over the same data.
	pub fn into_backend(self) -> B {
		self.backend
	}

	fn persist(&mut self) -> Result<()> {
		let json = serde_json::to_string(&self.tags)?;
		self.backend.write(TAGS_KEY, &json)
	}
}

impl<B: KeyValueBackend> AnnotationStore for TagStore<B> {
	fn tags_for_node(&self, node_id: &str) -> Vec<Tag> {
		self.tags
			.iter()
			.filter(|t| t.node_id == node_id)
			.cloned()
			.collect()
	}

	fn add_tag(
		&mut self,
		node_id: &str,
		node_kind: NodeKind,
		text: &str,
		color: &str,
	) -> Result<Tag> {
		let text = text.trim();
		if text.is_empty() {
			return Err(GraphError::EmptyTagText);
		}
		let now = Utc::now();
		let tag = Tag {
			id: Uuid::new_v4().to_string(),
			node_id: node_id.to_string(),
			node_kind,
			text: text.to_string(),
			color: color.to_string(),
			created_at: now,
			updated_at: now,
		};
		self.tags.push(tag.clone());
		if let Err(e) = self.persist() {
			self.tags.pop();
			return Err(e);
		}
		Ok(tag)
	}

	fn update_tag(&mut self, tag_id: &str, text: &str, color: &str) -> Result<Option<Tag>> {
		let text = text.trim();
		if text.is_empty() {
			return Err(GraphError::EmptyTagText);
		}
		let Some(tag) = self.tags.iter_mut().find(|t| t.id == tag_id) else {
			return Ok(None);
		};
		let previous = tag.clone();
		tag.text = text.to_string();
		tag.color = color.to_string();
		tag.updated_at = Utc::now();
		let updated = tag.clone();
		if let Err(e) = self.persist() {
			if let Some(tag) = self.tags.iter_mut().find(|t| t.id == tag_id) {
				*tag = previous;
			}
			return Err(e);
		}
		Ok(Some(updated))
	}

	fn remove_tag(&mut self, tag_id: &str) -> Result<bool> {
		let Some(pos) = self.tags.iter().position(|t| t.id == tag_id) else {
			return Ok(false);
		};
		let removed = self.tags.remove(pos);
		if let Err(e) = self.persist() {
			self.tags.insert(pos, removed);
			return Err(e);
		}
		Ok(true)
	}

	fn primary_color(&self, node_id: &str) -> Option<String> {
		self.tags
			.iter()
			.find(|t| t.node_id == node_id)
			.map(|t| t.color.clone())
	}
}
