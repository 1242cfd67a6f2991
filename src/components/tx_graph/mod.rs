//! Transaction graph view: graph building, force layout, pointer
//! interaction and the canvas component tying them together.

mod builder;
mod component;
mod forces;
mod gesture;
mod panels;
mod render;
mod session;
mod simulation;
mod types;
mod viewport;

pub use builder::{BuildResult, build_graph, build_graph_from_json};
pub use component::TxGraphCanvas;
pub use forces::{Body, ForceConfig};
pub use gesture::{CLICK_COOLDOWN_MS, DRAG_THRESHOLD};
pub use panels::inspection_rows;
pub use session::{GraphEvent, GraphSession, GraphStatus, Panel};
pub use simulation::{Bounds, Phase, Simulation};
pub use types::{
	GraphData, GraphLink, GraphNode, LinkKind, NodeKind, NodePayload, NodeRole, address_node_id,
	block_node_id, tx_node_id,
};
pub use viewport::{FOCUS_SCALE, MAX_SCALE, MIN_SCALE, ViewTransform, Viewport, fit_to_view};
