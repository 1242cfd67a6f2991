//! Ledger records as delivered by the data service.
//!
//! The service layer fetches one of three shapes and hands it over as a
//! [`LedgerPayload`]. The variant is inspected once, by the graph builder, and
//! never again downstream.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// Address used for the `to` side of contract-creation transactions.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// A single transaction record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRecord {
	/// `None` or empty for records the node keys by position.
	pub hash: Option<String>,
	/// Sender. Required.
	pub from: Option<String>,
	/// Absent for contract creation.
	pub to: Option<String>,
	/// Amount in the smallest unit, as a decimal string.
	pub value: Option<String>,
	/// Call data, hex encoded.
	pub input: Option<String>,
	/// Gas limit.
	pub gas: Option<String>,
	/// Gas price.
	pub gas_price: Option<String>,
	/// Gas used.
	pub gas_used: Option<String>,
	/// Containing block, when mined.
	pub block_number: Option<u64>,
	/// Unix seconds.
	pub timestamp: Option<u64>,
}

impl TxRecord {
	/// True when the record carries call data (anything beyond `0x`).
	pub fn has_call_data(&self) -> bool {
		self.input
			.as_deref()
			.map(|input| !input.is_empty() && input != "0x")
			.unwrap_or(false)
	}
}

/// Header fields of a block.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
	/// Block height.
	pub number: u64,
	/// Block hash.
	pub hash: Option<String>,
	/// Unix seconds.
	pub timestamp: Option<u64>,
	/// Fee recipient.
	pub miner: Option<String>,
}

/// The three accepted input shapes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerPayload {
	/// A block and the transactions it contains.
	#[serde(rename = "block")]
	BlockWithTransactions {
		/// Header of the block.
		block: BlockHeader,
		/// `None` when the service omitted the list.
		#[serde(default)]
		transactions: Option<Vec<TxRecord>>,
	},
	/// One transaction looked up by hash.
	#[serde(rename = "transaction")]
	SingleTransaction {
		/// The looked-up record.
		transaction: TxRecord,
	},
	/// An address and its recent transactions.
	#[serde(rename = "address")]
	AddressWithTransactions {
		/// The searched address.
		address: String,
		/// Most recent first, as the service returns them.
		#[serde(default)]
		transactions: Option<Vec<TxRecord>>,
	},
}

impl LedgerPayload {
	/// Parses loosely typed JSON from the service layer.
	pub fn from_json(value: &serde_json::Value) -> Result<Self> {
		serde_json::from_value(value.clone()).map_err(|e| GraphError::data_shape(e.to_string()))
	}

	/// Transactions carried by the payload, in input order.
	pub fn transactions(&self) -> &[TxRecord] {
		match self {
			Self::BlockWithTransactions { transactions, .. }
			| Self::AddressWithTransactions { transactions, .. } => {
				transactions.as_deref().unwrap_or_default()
			}
			Self::SingleTransaction { transaction } => std::slice::from_ref(transaction),
		}
	}
}

/// Addresses that received non-empty call data somewhere in `txs`.
pub fn contract_addresses(txs: &[TxRecord]) -> HashSet<String> {
	txs.iter()
		.filter(|tx| tx.has_call_data())
		.filter_map(|tx| tx.to.clone())
		.collect()
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn parses_block_payload() {
		let payload = LedgerPayload::from_json(&json!({
			"kind": "block",
			"block": { "number": 100, "hash": "0xb100" },
			"transactions": [
				{ "hash": "0xaaa", "from": "0x1", "to": "0x2", "value": "1", "gasPrice": "7" }
			]
		}))
		.unwrap();

		match &payload {
			LedgerPayload::BlockWithTransactions { block, .. } => assert_eq!(block.number, 100),
			other => panic!("unexpected variant {other:?}"),
		}
		assert_eq!(payload.transactions().len(), 1);
		assert_eq!(payload.transactions()[0].gas_price.as_deref(), Some("7"));
	}

	#[test]
	fn absent_transaction_list_is_empty() {
		let payload =
			LedgerPayload::from_json(&json!({ "kind": "address", "address": "0x1" })).unwrap();
		assert!(payload.transactions().is_empty());
	}

	#[test]
	fn unknown_shape_is_a_data_shape_error() {
		let err = LedgerPayload::from_json(&json!({ "kind": "mempool" })).unwrap_err();
		assert!(matches!(err, GraphError::DataShape(_)));

		let err =
			LedgerPayload::from_json(&json!({ "kind": "block", "block": "100" })).unwrap_err();
		assert!(matches!(err, GraphError::DataShape(_)));
	}

	#[test]
	fn contract_heuristic_ignores_empty_call_data() {
		let txs = vec![
			TxRecord {
				to: Some("0xc0".into()),
				input: Some("0xa9059cbb".into()),
				..Default::default()
			},
			TxRecord {
				to: Some("0xe0".into()),
				input: Some("0x".into()),
				..Default::default()
			},
			TxRecord {
				to: None,
				input: Some("0x6080".into()),
				..Default::default()
			},
		];
		let contracts = contract_addresses(&txs);
		assert_eq!(contracts.len(), 1);
		assert!(contracts.contains("0xc0"));
	}
}
