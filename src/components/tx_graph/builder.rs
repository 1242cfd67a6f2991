//! Ledger payload → typed node/link graph.

use std::collections::HashSet;

use log::{debug, warn};

use super::types::{
	GraphData, GraphLink, GraphNode, LinkKind, NodeKind, NodePayload, NodeRole, address_node_id,
	block_node_id, tx_node_id,
};
use crate::error::{GraphError, Result};
use crate::ledger::{BlockHeader, LedgerPayload, TxRecord, ZERO_ADDRESS, contract_addresses};

/// Output of a build. An empty graph without an error is the "no data" state.
#[derive(Debug, Default)]
pub struct BuildResult {
	/// Nodes and links; empty for no data or an error.
	pub graph: GraphData,
	/// Node for the entity the user searched for.
	pub focus_id: Option<String>,
	/// Set when the input was malformed; the graph is then empty.
	pub error: Option<GraphError>,
}

impl BuildResult {
	/// Valid input without any transactions.
	pub fn is_no_data(&self) -> bool {
		self.error.is_none() && self.graph.is_empty()
	}

	fn failed(error: GraphError) -> Self {
		warn!("graph build failed: {error}");
		Self {
			error: Some(error),
			..Default::default()
		}
	}
}

/// Builds a graph from a typed payload. `known_contracts` adds to the
/// call-data heuristic.
pub fn build_graph(payload: &LedgerPayload, known_contracts: &HashSet<String>) -> BuildResult {
	if payload.transactions().is_empty() {
		debug!("payload carries no transactions");
		return BuildResult::default();
	}
	let mut contracts = contract_addresses(payload.transactions());
	contracts.extend(known_contracts.iter().cloned());

	let mut builder = GraphBuilder::new(contracts);
	match builder.build(payload) {
		Ok(focus_id) => {
			let graph = builder.finish();
			debug!(
				"built graph with {} nodes and {} links",
				graph.nodes.len(),
				graph.links.len()
			);
			BuildResult {
				graph,
				focus_id,
				error: None,
			}
		}
		Err(e) => BuildResult::failed(e),
	}
}

/// Same as [`build_graph`] for JSON that has not been discriminated yet.
pub fn build_graph_from_json(
	value: &serde_json::Value,
	known_contracts: &HashSet<String>,
) -> BuildResult {
	match LedgerPayload::from_json(value) {
		Ok(payload) => build_graph(&payload, known_contracts),
		Err(e) => BuildResult::failed(e),
	}
}

struct GraphBuilder {
	contracts: HashSet<String>,
	seen: HashSet<String>,
	graph: GraphData,
}

impl GraphBuilder {
	fn new(contracts: HashSet<String>) -> Self {
		Self {
			contracts,
			seen: HashSet::new(),
			graph: GraphData::default(),
		}
	}

	fn finish(self) -> GraphData {
		self.graph
	}

	fn build(&mut self, payload: &LedgerPayload) -> Result<Option<String>> {
		match payload {
			LedgerPayload::BlockWithTransactions { block, .. } => {
				let block_id = self.block_node(block);
				self.transactions(payload.transactions(), Some(&block_id))?;
				Ok(Some(block_id))
			}
			LedgerPayload::SingleTransaction { transaction } => {
				let block_id = transaction.block_number.map(|number| {
					self.block_node(&BlockHeader {
						number,
						timestamp: transaction.timestamp,
						..Default::default()
					})
				});
				let txs = std::slice::from_ref(transaction);
				let ids = self.transactions(txs, block_id.as_deref())?;
				Ok(ids.into_iter().next())
			}
			LedgerPayload::AddressWithTransactions { address, .. } => {
				let focus = self.address_node(address, None);
				self.transactions(payload.transactions(), None)?;
				Ok(Some(focus))
			}
		}
	}

	fn transactions(&mut self, txs: &[TxRecord], block_id: Option<&str>) -> Result<Vec<String>> {
		let mut ids = Vec::with_capacity(txs.len());
		for (index, tx) in txs.iter().enumerate() {
			if let Some(id) = self.transaction(index, tx, block_id)? {
				ids.push(id);
			}
		}
		Ok(ids)
	}

	fn transaction(
		&mut self,
		index: usize,
		tx: &TxRecord,
		block_id: Option<&str>,
	) -> Result<Option<String>> {
		let tx_id = tx_node_id(tx.hash.as_deref(), index);
		let from = tx
			.from
			.as_deref()
			.filter(|from| !from.is_empty())
			.ok_or_else(|| GraphError::data_shape(format!("{tx_id} has no sender")))?;
		if self.seen.contains(&tx_id) {
			debug!("skipping repeated record {tx_id}");
			return Ok(None);
		}

		self.push_node(GraphNode {
			id: tx_id.clone(),
			kind: NodeKind::Transaction,
			role: None,
			value: tx.value.clone(),
			block_number: tx.block_number,
			hash: tx.hash.clone(),
			timestamp: tx.timestamp,
			payload: NodePayload::Transaction(tx.clone()),
		});

		let from_id = self.address_node(from, Some(NodeRole::From));
		let to = tx.to.as_deref().filter(|to| !to.is_empty()).unwrap_or(ZERO_ADDRESS);
		let to_id = self.address_node(to, Some(NodeRole::To));

		if let Some(block_id) = block_id {
			self.push_link(block_id, &tx_id, LinkKind::Interact, None, None);
		}
		self.push_link(&from_id, &tx_id, LinkKind::Send, tx.value.clone(), Some(tx));
		self.push_link(&tx_id, &to_id, LinkKind::Receive, tx.value.clone(), None);
		Ok(Some(tx_id))
	}

	fn block_node(&mut self, block: &BlockHeader) -> String {
		let id = block_node_id(block.number);
		if !self.seen.contains(&id) {
			self.push_node(GraphNode {
				id: id.clone(),
				kind: NodeKind::Block,
				role: None,
				value: None,
				block_number: Some(block.number),
				hash: block.hash.clone(),
				timestamp: block.timestamp,
				payload: NodePayload::Block(block.clone()),
			});
		}
		id
	}

	/// Creates the address node on first sight; later sightings reuse it.
	fn address_node(&mut self, address: &str, role: Option<NodeRole>) -> String {
		let id = address_node_id(address);
		if !self.seen.contains(&id) {
			let is_contract = self.contracts.contains(address);
			self.push_node(GraphNode {
				id: id.clone(),
				kind: if is_contract {
					NodeKind::Contract
				} else {
					NodeKind::Address
				},
				role,
				value: None,
				block_number: None,
				hash: None,
				timestamp: None,
				payload: NodePayload::Address {
					address: address.to_string(),
					is_contract,
				},
			});
		}
		id
	}

	fn push_node(&mut self, node: GraphNode) {
		self.seen.insert(node.id.clone());
		self.graph.nodes.push(node);
	}

	fn push_link(
		&mut self,
		source: &str,
		target: &str,
		kind: LinkKind,
		value: Option<String>,
		gas_from: Option<&TxRecord>,
	) {
		self.graph.links.push(GraphLink {
			source_id: source.to_string(),
			target_id: target.to_string(),
			value,
			kind,
			gas: gas_from.and_then(|tx| tx.gas.clone()),
			gas_price: gas_from.and_then(|tx| tx.gas_price.clone()),
			gas_used: gas_from.and_then(|tx| tx.gas_used.clone()),
		});
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn tx(hash: &str, from: &str, to: &str, value: &str) -> TxRecord {
		TxRecord {
			hash: Some(hash.into()),
			from: Some(from.into()),
			to: Some(to.into()),
			value: Some(value.into()),
			..Default::default()
		}
	}

	fn block_100() -> LedgerPayload {
		LedgerPayload::BlockWithTransactions {
			block: BlockHeader {
				number: 100,
				..Default::default()
			},
			transactions: Some(vec![
				tx("0xaaa", "0x1", "0x2", "1000000000000000000"),
				tx("0xbbb", "0x2", "0x3", "2000000000000000000"),
			]),
		}
	}

	fn link_triples(graph: &GraphData) -> Vec<(&str, &str, LinkKind)> {
		graph
			.links
			.iter()
			.map(|l| (l.source_id.as_str(), l.target_id.as_str(), l.kind))
			.collect()
	}

	#[test]
	fn block_with_two_transactions() {
		let result = build_graph(&block_100(), &HashSet::new());
		assert!(result.error.is_none());
		assert_eq!(result.focus_id.as_deref(), Some("block-100"));

		let mut ids: Vec<&str> = result.graph.nodes.iter().map(|n| n.id.as_str()).collect();
		ids.sort_unstable();
		assert_eq!(
			ids,
			vec!["addr-0x1", "addr-0x2", "addr-0x3", "block-100", "tx-0xaaa", "tx-0xbbb"]
		);

		assert_eq!(
			link_triples(&result.graph),
			vec![
				("block-100", "tx-0xaaa", LinkKind::Interact),
				("addr-0x1", "tx-0xaaa", LinkKind::Send),
				("tx-0xaaa", "addr-0x2", LinkKind::Receive),
				("block-100", "tx-0xbbb", LinkKind::Interact),
				("addr-0x2", "tx-0xbbb", LinkKind::Send),
				("tx-0xbbb", "addr-0x3", LinkKind::Receive),
			]
		);
	}

	#[test]
	fn role_does_not_split_an_address() {
		let result = build_graph(&block_100(), &HashSet::new());
		let addr2: Vec<_> = result.graph.nodes.iter().filter(|n| n.id == "addr-0x2").collect();
		assert_eq!(addr2.len(), 1);
		assert_eq!(addr2[0].role, Some(NodeRole::To));
	}

	#[test]
	fn every_link_references_a_node() {
		let payload = LedgerPayload::AddressWithTransactions {
			address: "0x1".into(),
			transactions: Some(vec![
				tx("0xa", "0x1", "0x1", "5"),
				TxRecord {
					hash: None,
					from: Some("0x9".into()),
					to: None,
					input: Some("0x6080".into()),
					..Default::default()
				},
				tx("0xc", "0x4", "0x1", "1"),
			]),
		};
		let result = build_graph(&payload, &HashSet::new());
		let ids: HashSet<&str> = result.graph.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids.len(), result.graph.nodes.len());
		for link in &result.graph.links {
			assert!(ids.contains(link.source_id.as_str()), "{}", link.source_id);
			assert!(ids.contains(link.target_id.as_str()), "{}", link.target_id);
		}
		assert!(ids.contains("tx-#1"));
		assert!(ids.contains(format!("addr-{ZERO_ADDRESS}").as_str()));
		assert_eq!(result.focus_id.as_deref(), Some("addr-0x1"));
	}

	#[test]
	fn decimal_hash_does_not_swallow_an_unhashed_record() {
		let payload = LedgerPayload::BlockWithTransactions {
			block: BlockHeader {
				number: 5,
				..Default::default()
			},
			transactions: Some(vec![
				tx("1", "0x1", "0x2", "1"),
				TxRecord {
					from: Some("0x3".into()),
					to: Some("0x4".into()),
					..Default::default()
				},
			]),
		};
		let result = build_graph(&payload, &HashSet::new());
		let txs = result
			.graph
			.nodes
			.iter()
			.filter(|n| n.kind == NodeKind::Transaction)
			.count();
		assert_eq!(txs, 2);
	}

	#[test]
	fn rebuild_is_deterministic() {
		let a = build_graph(&block_100(), &HashSet::new());
		let b = build_graph(&block_100(), &HashSet::new());
		assert_eq!(a.graph, b.graph);
	}

	#[test]
	fn send_link_carries_gas() {
		let payload = LedgerPayload::SingleTransaction {
			transaction: TxRecord {
				gas: Some("21000".into()),
				gas_price: Some("30".into()),
				gas_used: Some("21000".into()),
				block_number: Some(7),
				..tx("0xaaa", "0x1", "0x2", "1")
			},
		};
		let result = build_graph(&payload, &HashSet::new());
		assert_eq!(result.focus_id.as_deref(), Some("tx-0xaaa"));
		assert!(result.graph.node("block-7").is_some());
		let send = result.graph.links.iter().find(|l| l.kind == LinkKind::Send).unwrap();
		assert_eq!(send.gas.as_deref(), Some("21000"));
		assert_eq!(send.gas_price.as_deref(), Some("30"));
		let receive = result.graph.links.iter().find(|l| l.kind == LinkKind::Receive).unwrap();
		assert_eq!(receive.gas, None);
	}

	#[test]
	fn contracts_are_typed() {
		let payload = LedgerPayload::AddressWithTransactions {
			address: "0x1".into(),
			transactions: Some(vec![
				TxRecord {
					input: Some("0xa9059cbb".into()),
					..tx("0xa", "0x1", "0xc0", "0")
				},
				tx("0xb", "0x1", "0xe0", "0"),
			]),
		};
		let known = HashSet::from(["0xe0".to_string()]);
		let result = build_graph(&payload, &known);
		assert_eq!(result.graph.node("addr-0xc0").unwrap().kind, NodeKind::Contract);
		assert_eq!(result.graph.node("addr-0xe0").unwrap().kind, NodeKind::Contract);
		assert_eq!(result.graph.node("addr-0x1").unwrap().kind, NodeKind::Address);
	}

	#[test]
	fn empty_list_is_no_data() {
		let payload = LedgerPayload::BlockWithTransactions {
			block: BlockHeader::default(),
			transactions: Some(vec![]),
		};
		let result = build_graph(&payload, &HashSet::new());
		assert!(result.is_no_data());
		assert!(result.graph.nodes.is_empty());
		assert!(result.graph.links.is_empty());
	}

	#[test]
	fn malformed_input_returns_empty_graph_and_error() {
		let result = build_graph_from_json(
			&json!({
				"kind": "block",
				"block": { "number": 1 },
				"transactions": [{ "hash": "0x1" }]
			}),
			&HashSet::new(),
		);
		assert!(result.graph.is_empty());
		assert!(matches!(result.error, Some(GraphError::DataShape(_))));
		assert!(!result.is_no_data());

		let result = build_graph_from_json(&json!([1, 2, 3]), &HashSet::new());
		assert!(result.graph.is_empty());
		assert!(result.error.is_some());
	}

	#[test]
	fn repeated_hash_keeps_one_node() {
		let payload = LedgerPayload::AddressWithTransactions {
			address: "0x1".into(),
			transactions: Some(vec![tx("0xa", "0x1", "0x2", "1"), tx("0xa", "0x1", "0x2", "1")]),
		};
		let result = build_graph(&payload, &HashSet::new());
		assert_eq!(result.graph.nodes.len(), 3);
		assert_eq!(result.graph.links.len(), 2);
	}
}
