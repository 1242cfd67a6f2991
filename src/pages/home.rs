use leptos::prelude::*;
use log::info;

use crate::components::tx_graph::{GraphNode, TxGraphCanvas};
use crate::ledger::{BlockHeader, LedgerPayload, TxRecord};

/// Sample block standing in for the data service.
fn sample_block() -> LedgerPayload {
	let tx = |hash: &str, from: &str, to: Option<&str>, value: &str, input: &str| TxRecord {
		hash: Some(hash.into()),
		from: Some(from.into()),
		to: to.map(Into::into),
		value: Some(value.into()),
		input: Some(input.into()),
		gas: Some("21000".into()),
		gas_price: Some("30000000000".into()),
		block_number: Some(100),
		..Default::default()
	};
	LedgerPayload::BlockWithTransactions {
		block: BlockHeader {
			number: 100,
			hash: Some("0xb100".into()),
			timestamp: Some(1_700_000_000),
			miner: Some("0x9".into()),
		},
		transactions: Some(vec![
			tx("0xaaa", "0x1", Some("0x2"), "1000000000000000000", "0x"),
			tx("0xbbb", "0x2", Some("0x3"), "2000000000000000000", "0x"),
			tx("0xccc", "0x3", Some("0xc0ffee"), "0", "0xa9059cbb"),
			tx("0xddd", "0x1", None, "0", "0x6080604052"),
			tx("0xeee", "0x4", Some("0x4"), "5", "0x"),
		]),
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let data = Signal::derive(move || Some(sample_block()));
	let (selected, set_selected) = signal(None::<String>);

	let on_activated = Callback::new(move |node: GraphNode| {
		info!("node activated: {}", node.id);
		set_selected.set(Some(node.label(false)));
	});

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<TxGraphCanvas data=data fullscreen=true on_node_activated=on_activated />
				<div class="graph-overlay">
					<h1>"Transaction Graph"</h1>
					<p class="subtitle">
						"Drag nodes to pin them. Click to select. Right-click to tag."
					</p>
					<p class="selection">{move || selected.get().unwrap_or_default()}</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
