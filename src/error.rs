//! Error type shared by the graph core, the annotation store and the canvas.

use thiserror::Error;

/// Everything that can go wrong between a ledger payload and a drawn frame.
///
/// None of these reach the host application: the session converts them into a
/// [`GraphStatus`](crate::components::tx_graph::GraphStatus) message.
#[derive(Debug, Error)]
pub enum GraphError {
	/// Input did not match any accepted payload shape, or a record inside it
	/// was missing a required field.
	#[error("unsupported ledger data: {0}")]
	DataShape(String),

	/// The canvas or its 2D context is not available (component not mounted).
	#[error("render target unavailable")]
	RenderTargetUnavailable,

	/// Reading or writing durable storage failed.
	#[error("storage failure: {0}")]
	Storage(String),

	/// A tag needs visible text.
	#[error("tag text must not be empty")]
	EmptyTagText,

	/// Tag data could not be encoded.
	#[error(transparent)]
	Serialization(#[from] serde_json::Error),
}

impl GraphError {
	pub(crate) fn data_shape(msg: impl Into<String>) -> Self {
		Self::DataShape(msg.into())
	}
}

/// Result alias used throughout the crate.
pub type Result<T, E = GraphError> = std::result::Result<T, E>;
