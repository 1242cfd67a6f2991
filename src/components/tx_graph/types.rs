use serde::{Deserialize, Serialize};

use crate::ledger::{BlockHeader, TxRecord};

/// Node id for an address or contract.
pub fn address_node_id(address: &str) -> String {
	format!("addr-{address}")
}

/// Node id for a transaction, by hash or by input position when unhashed.
/// Positional ids carry a `#`, which never appears in a hash.
pub fn tx_node_id(hash: Option<&str>, index: usize) -> String {
	match hash {
		Some(hash) if !hash.is_empty() => format!("tx-{hash}"),
		_ => format!("tx-#{index}"),
	}
}

/// Node id for a block.
pub fn block_node_id(number: u64) -> String {
	format!("block-{number}")
}

/// What a node stands for; drives radius, colour and panels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
	/// Externally owned account.
	Address,
	/// Address that received call data, or that the host flagged.
	Contract,
	/// Transaction.
	Transaction,
	/// Block.
	Block,
}

impl NodeKind {
	/// Visual radius in layout units. Collision keeps centres two radii apart.
	pub fn radius(self) -> f64 {
		match self {
			Self::Address | Self::Contract => 10.0,
			Self::Transaction => 7.0,
			Self::Block => 14.0,
		}
	}

	/// Fill colour on the canvas.
	pub fn color(self) -> &'static str {
		match self {
			Self::Address => "#4e79a7",
			Self::Contract => "#f28e2b",
			Self::Transaction => "#59a14f",
			Self::Block => "#b07aa1",
		}
	}
}

/// Which side of a transaction an address was first seen on. Styling only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
	/// Sender side of the first transaction that introduced the node.
	#[serde(rename = "from", alias = "source")]
	From,
	/// Recipient side.
	#[serde(rename = "to", alias = "destination")]
	To,
}

/// Direction of value or containment along a link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
	/// Sender to transaction.
	Send,
	/// Transaction to recipient.
	Receive,
	/// Block to transaction it contains.
	Interact,
}

impl LinkKind {
	/// Stroke colour on the canvas.
	pub fn color(self) -> &'static str {
		match self {
			Self::Send => "rgba(225, 87, 89, 0.7)",
			Self::Receive => "rgba(89, 161, 79, 0.7)",
			Self::Interact => "rgba(160, 160, 190, 0.5)",
		}
	}
}

/// The domain record a node stands for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NodePayload {
	/// Address or contract.
	Address {
		/// Address as it appeared in the records.
		address: String,
		/// Mirrors [`NodeKind::Contract`].
		is_contract: bool,
	},
	/// The full transaction record.
	Transaction(TxRecord),
	/// Header of the containing block.
	Block(BlockHeader),
}

/// One vertex of the transaction graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
	/// Unique within a graph; see the `*_node_id` helpers.
	pub id: String,
	/// Kind.
	pub kind: NodeKind,
	/// Informational; links carry the direction.
	pub role: Option<NodeRole>,
	/// Transferred value in wei, as received.
	pub value: Option<String>,
	/// Block number.
	pub block_number: Option<u64>,
	/// Hash.
	pub hash: Option<String>,
	/// Timestamp.
	pub timestamp: Option<u64>,
	/// Source record for panels and host callbacks.
	pub payload: NodePayload,
}

impl GraphNode {
	/// Text drawn next to the node.
	pub fn label(&self, short: bool) -> String {
		match &self.payload {
			NodePayload::Block(block) if short => format!("#{}", block.number),
			NodePayload::Block(block) => format!("Block #{}", block.number),
			NodePayload::Address { address, .. } if short => shorten(address),
			NodePayload::Address { address, .. } => address.clone(),
			NodePayload::Transaction(_) => {
				let hash = self.hash.as_deref().unwrap_or("tx");
				if short { shorten(hash) } else { hash.to_string() }
			}
		}
	}
}

/// `0x12345678…cdef` style abbreviation for long hex strings.
fn shorten(s: &str) -> String {
	let count = s.chars().count();
	if count <= 12 {
		return s.to_string();
	}
	let head: String = s.chars().take(6).collect();
	let tail: String = s.chars().skip(count - 4).collect();
	format!("{head}…{tail}")
}

/// Directed edge between two node ids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
	/// Node the link starts at.
	pub source_id: String,
	/// Node the link points to.
	pub target_id: String,
	/// Value carried by send and receive links.
	pub value: Option<String>,
	/// Kind.
	pub kind: LinkKind,
	/// Gas fields, set on send links only.
	pub gas: Option<String>,
	/// Price per gas unit in wei.
	pub gas_price: Option<String>,
	/// Gas consumed, when a receipt was available.
	pub gas_used: Option<String>,
}

/// Nodes and links produced by one build.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	/// Nodes.
	pub nodes: Vec<GraphNode>,
	/// Every endpoint names a node in `nodes`.
	pub links: Vec<GraphLink>,
}

impl GraphData {
	/// Is empty.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Node by id.
	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id == id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ids_are_prefixed_domain_keys() {
		assert_eq!(address_node_id("0xabc"), "addr-0xabc");
		assert_eq!(tx_node_id(Some("0xaaa"), 3), "tx-0xaaa");
		assert_eq!(tx_node_id(None, 3), "tx-#3");
		assert_eq!(tx_node_id(Some(""), 4), "tx-#4");
		assert_ne!(tx_node_id(Some("4"), 0), tx_node_id(None, 4));
		assert_eq!(block_node_id(100), "block-100");
	}

	#[test]
	fn role_accepts_both_spellings() {
		let roles: Vec<NodeRole> =
			serde_json::from_str(r#"["from", "source", "to", "destination"]"#).unwrap();
		assert_eq!(roles, vec![NodeRole::From, NodeRole::From, NodeRole::To, NodeRole::To]);
	}

	#[test]
	fn short_labels_abbreviate_addresses() {
		let node = GraphNode {
			id: address_node_id("0x1234567890abcdef1234"),
			kind: NodeKind::Address,
			role: None,
			value: None,
			block_number: None,
			hash: None,
			timestamp: None,
			payload: NodePayload::Address {
				address: "0x1234567890abcdef1234".into(),
				is_contract: false,
			},
		};
		assert_eq!(node.label(true), "0x1234…1234");
		assert_eq!(node.label(false), "0x1234567890abcdef1234");
	}
}
