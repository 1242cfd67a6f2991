use leptos::prelude::*;
use log::warn;

use super::component::RuntimeHandle;
use super::types::{GraphNode, NodePayload};
use crate::annotations::AnnotationStore;
use crate::error::Result;

const TAG_COLORS: &[&str] = &["#e15759", "#f28e2b", "#edc948", "#59a14f", "#76b7b2", "#af7aa1"];

fn next_color(current: &str) -> &'static str {
	let i = TAG_COLORS.iter().position(|c| *c == current).map_or(0, |i| i + 1);
	TAG_COLORS[i % TAG_COLORS.len()]
}

/// Runs one tag mutation against the mounted session, logging failures.
fn edit_tags<T>(runtime: RuntimeHandle, f: impl FnOnce(&mut dyn AnnotationStore) -> Result<T>) {
	runtime.try_update_value(|rt| {
		if let Some(session) = rt.session.as_mut() {
			if let Err(e) = f(session.annotations_mut()) {
				warn!("tag edit failed: {e}");
			}
		}
	});
}

/// Tag list and editor for one node.
#[component]
pub fn TagPanel(
	runtime: RuntimeHandle,
	node: GraphNode,
	/// Bumped after every tag mutation so lists and the canvas refresh.
	version: RwSignal<u64>,
	on_close: Callback<()>,
) -> impl IntoView {
	let (text, set_text) = signal(String::new());
	let (color, set_color) = signal(TAG_COLORS[0].to_string());

	let node_id = node.id.clone();
	let tags = move || {
		version.track();
		runtime
			.try_with_value(|rt| {
				rt.session
					.as_ref()
					.map(|s| s.annotations().tags_for_node(&node_id))
			})
			.flatten()
			.unwrap_or_default()
	};

	let add_id = node.id.clone();
	let add = move |_| {
		let (t, c) = (text.get_untracked(), color.get_untracked());
		runtime.try_update_value(|rt| {
			if let Some(session) = rt.session.as_mut() {
				if let Err(e) = session.add_tag(&add_id, &t, &c) {
					warn!("could not tag {add_id}: {e}");
				}
			}
		});
		set_text.set(String::new());
		version.update(|v| *v += 1);
	};

	view! {
		<aside class="graph-panel tag-panel">
			<header>
				<h3>{node.label(false)}</h3>
				<button on:click=move |_| on_close.run(())>"×"</button>
			</header>
			<ul>
				{move || {
					tags()
						.into_iter()
						.map(|tag| {
							let (recolor_id, remove_id) = (tag.id.clone(), tag.id.clone());
							let (tag_text, tag_color) = (tag.text.clone(), tag.color.clone());
							let recolor = move |_| {
								edit_tags(runtime, |store| {
									store.update_tag(&recolor_id, &tag_text, next_color(&tag_color))
								});
								version.update(|v| *v += 1);
							};
							let remove = move |_| {
								edit_tags(runtime, |store| store.remove_tag(&remove_id));
								version.update(|v| *v += 1);
							};
							view! {
								<li style=format!("border-left: 4px solid {}", tag.color)>
									<span>{tag.text}</span>
									<button on:click=recolor>"colour"</button>
									<button on:click=remove>"remove"</button>
								</li>
							}
						})
						.collect_view()
				}}
			</ul>
			<input
				type="text"
				placeholder="Add tag"
				prop:value=text
				on:input=move |ev| set_text.set(event_target_value(&ev))
			/>
			<select on:change=move |ev| set_color.set(event_target_value(&ev))>
				{TAG_COLORS
					.iter()
					.copied()
					.map(|c| view! { <option value=c>{c}</option> })
					.collect_view()}
			</select>
			<button on:click=add>"Add"</button>
		</aside>
	}
}

/// Field/value rows shown by the inspection panel.
pub fn inspection_rows(node: &GraphNode) -> Vec<(&'static str, String)> {
	let mut rows = Vec::new();
	let mut push = |name: &'static str, value: Option<String>| {
		if let Some(value) = value {
			rows.push((name, value));
		}
	};
	match &node.payload {
		NodePayload::Transaction(tx) => {
			push("Hash", tx.hash.clone());
			push("From", tx.from.clone());
			push("To", tx.to.clone().or_else(|| Some("contract creation".into())));
			push("Value", tx.value.clone());
			push("Gas", tx.gas.clone());
			push("Gas price", tx.gas_price.clone());
			push("Gas used", tx.gas_used.clone());
			push("Block", tx.block_number.map(|n| n.to_string()));
			push("Timestamp", tx.timestamp.map(|t| t.to_string()));
		}
		NodePayload::Block(block) => {
			push("Number", Some(block.number.to_string()));
			push("Hash", block.hash.clone());
			push("Miner", block.miner.clone());
			push("Timestamp", block.timestamp.map(|t| t.to_string()));
		}
		NodePayload::Address {
			address,
			is_contract,
		} => {
			push("Address", Some(address.clone()));
			push(
				"Type",
				Some(if *is_contract { "contract" } else { "account" }.into()),
			);
		}
	}
	rows
}

/// Read-only details for transactions and blocks.
#[component]
pub fn InspectPanel(node: GraphNode, on_close: Callback<()>) -> impl IntoView {
	let rows = inspection_rows(&node);
	view! {
		<aside class="graph-panel inspect-panel">
			<header>
				<h3>{node.label(true)}</h3>
				<button on:click=move |_| on_close.run(())>"×"</button>
			</header>
			<dl>
				{rows
					.into_iter()
					.map(|(name, value)| view! {
						<dt>{name}</dt>
						<dd>{value}</dd>
					})
					.collect_view()}
			</dl>
		</aside>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::tx_graph::NodeKind;
	use crate::ledger::TxRecord;

	#[test]
	fn transaction_rows_mark_contract_creation() {
		let node = GraphNode {
			id: "tx-0xaaa".into(),
			kind: NodeKind::Transaction,
			role: None,
			value: Some("1".into()),
			block_number: None,
			hash: Some("0xaaa".into()),
			timestamp: None,
			payload: NodePayload::Transaction(TxRecord {
				hash: Some("0xaaa".into()),
				from: Some("0x1".into()),
				value: Some("1".into()),
				..Default::default()
			}),
		};
		let rows = inspection_rows(&node);
		assert_eq!(rows[0], ("Hash", "0xaaa".to_string()));
		assert!(rows.contains(&("To", "contract creation".to_string())));
		assert!(!rows.iter().any(|(name, _)| *name == "Gas"));
	}

	#[test]
	fn tag_colours_cycle() {
		assert_eq!(next_color(TAG_COLORS[0]), TAG_COLORS[1]);
		assert_eq!(next_color(TAG_COLORS[TAG_COLORS.len() - 1]), TAG_COLORS[0]);
		assert_eq!(next_color("#123456"), TAG_COLORS[0]);
	}
}
