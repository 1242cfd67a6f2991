use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};

use super::builder::{BuildResult, build_graph, build_graph_from_json};
use super::forces::ForceConfig;
use super::gesture::{GestureTracker, Release};
use super::simulation::Simulation;
use super::types::{GraphData, GraphNode, NodeKind};
use super::viewport::{ViewTransform, Viewport, center_on, fit_to_view};
use crate::annotations::{AnnotationStore, PreferenceStore, Preferences, Tag};
use crate::error::{GraphError, Result};
use crate::ledger::LedgerPayload;

/// What the canvas should show instead of (or along with) the graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphStatus {
	/// Nothing loaded yet, or the payload had no transactions.
	NoData,
	/// A simulation exists for the current graph.
	Ready,
	/// Message for the "render failed" placeholder.
	Failed(String),
}

/// Raised to the host. Both carry the full node including its payload.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphEvent {
	/// Single click without a drag.
	NodeActivated(GraphNode),
	/// NodeDoubleActivated.
	NodeDoubleActivated(GraphNode),
}

/// Side panel requested by a secondary interaction.
#[derive(Clone, Debug, PartialEq)]
pub enum Panel {
	/// Tag editor. Offered for every node kind on double-click.
	Tags(GraphNode),
	/// Read-only details for transactions and blocks.
	Inspect(GraphNode),
}

/// Everything one mounted graph view owns: the current graph, its single
/// simulation, pointer state, view transform, tags and preferences.
pub struct GraphSession {
	graph: GraphData,
	focus_id: Option<String>,
	status: GraphStatus,
	simulation: Option<Simulation>,
	/// Fixed coordinates by node id, kept across loads until a reset.
	pinned: HashMap<String, (f64, f64)>,
	gestures: GestureTracker,
	transform: ViewTransform,
	viewport: Viewport,
	annotations: Box<dyn AnnotationStore>,
	preferences: PreferenceStore,
	known_contracts: HashSet<String>,
	config: ForceConfig,
	hovered: Option<String>,
	mounted: bool,
}

impl GraphSession {
	/// Creates a mounted session for a canvas of the given size.
	pub fn mount(
		viewport: Viewport,
		annotations: Box<dyn AnnotationStore>,
		preferences: PreferenceStore,
	) -> Self {
		info!("graph session mounted at {}x{}", viewport.width, viewport.height);
		Self {
			graph: GraphData::default(),
			focus_id: None,
			status: GraphStatus::NoData,
			simulation: None,
			pinned: HashMap::new(),
			gestures: GestureTracker::default(),
			transform: ViewTransform::default(),
			viewport,
			annotations,
			preferences,
			known_contracts: HashSet::new(),
			config: ForceConfig::default(),
			hovered: None,
			mounted: true,
		}
	}

	/// Replaces the force constants used by later loads.
	pub fn with_config(mut self, config: ForceConfig) -> Self {
		self.config = config;
		self
	}

	/// Addresses the host already knows to be contracts.
	pub fn set_known_contracts(&mut self, contracts: HashSet<String>) {
		self.known_contracts = contracts;
	}

	/// Stops the simulation and drops pointer state. Later calls are no-ops.
	pub fn teardown(&mut self) {
		if !self.mounted {
			return;
		}
		if let Some(sim) = self.simulation.as_mut() {
			sim.stop();
		}
		self.gestures = GestureTracker::default();
		self.hovered = None;
		self.pinned.clear();
		self.mounted = false;
		info!("graph session torn down");
	}

	/// `false` after [`teardown`](Self::teardown).
	pub fn is_mounted(&self) -> bool {
		self.mounted
	}

	/// Builds and installs a graph from a typed payload.
	pub fn load(&mut self, payload: &LedgerPayload) -> &GraphStatus {
		let result = build_graph(payload, &self.known_contracts);
		self.install(result)
	}

	/// Like [`load`](Self::load) for untyped JSON.
	pub fn load_json(&mut self, value: &serde_json::Value) -> &GraphStatus {
		let result = build_graph_from_json(value, &self.known_contracts);
		self.install(result)
	}

	/// Replaces the graph. The previous simulation is stopped first. Fixed
	/// coordinates survive any number of loads, including empty or failed
	/// ones, and are re-applied to nodes present in the next graph.
	fn install(&mut self, result: BuildResult) -> &GraphStatus {
		if !self.mounted {
			debug!("ignoring graph data for an unmounted session");
			return &self.status;
		}
		if let Some(mut old) = self.simulation.take() {
			old.stop();
			self.sync_pinned(&old);
		}
		self.gestures = GestureTracker::default();
		self.hovered = None;
		self.focus_id = result.focus_id;

		if let Some(e) = result.error {
			self.graph = GraphData::default();
			self.status = GraphStatus::Failed(e.to_string());
			return &self.status;
		}
		self.graph = result.graph;
		if self.graph.is_empty() {
			self.status = GraphStatus::NoData;
			return &self.status;
		}

		let mut sim = Simulation::new(
			&self.graph,
			self.viewport.width,
			self.viewport.height,
			self.config.clone(),
		);
		sim.carry_fixed(&self.pinned);
		sim.set_global_pin(self.preferences.get().globally_pinned);
		info!(
			"loaded graph: {} nodes, {} links, {} fixed carried over",
			self.graph.nodes.len(),
			self.graph.links.len(),
			sim.fixed_coordinates().len()
		);
		self.simulation = Some(sim);
		self.status = GraphStatus::Ready;
		&self.status
	}

	/// Folds the outgoing simulation's fixed coordinates into the session
	/// map. Nodes it released are dropped; nodes it never had are kept.
	fn sync_pinned(&mut self, old: &Simulation) {
		for body in old.bodies() {
			match (body.fx, body.fy) {
				(Some(x), Some(y)) => {
					self.pinned.insert(body.id.clone(), (x, y));
				}
				_ => {
					self.pinned.remove(&body.id);
				}
			}
		}
	}

	/// Marks the view as failed, e.g. when the canvas context is missing.
	pub fn fail(&mut self, error: &GraphError) {
		warn!("graph view failed: {error}");
		self.status = GraphStatus::Failed(error.to_string());
	}

	/// One animation frame. Returns whether anything moved.
	pub fn tick(&mut self) -> bool {
		if !self.mounted {
			return false;
		}
		self.simulation.as_mut().is_some_and(|sim| sim.tick())
	}

	/// Starts a gesture at a canvas-relative point. Returns the id of the node
	/// taken hold of, or `None` when the press starts a background pan.
	pub fn pointer_down(&mut self, sx: f64, sy: f64, now: f64) -> Option<&str> {
		if !self.mounted {
			return None;
		}
		let (gx, gy) = self.transform.screen_to_graph(sx, sy);
		let hit = self.simulation.as_ref().and_then(|sim| {
			let id = sim.node_at(gx, gy)?;
			Some((id.to_string(), sim.position(id)?))
		});
		match (hit, self.simulation.as_mut()) {
			(Some((id, (x, y))), Some(sim)) => {
				self.gestures.press_node(&id, (gx, gy), (x, y), now);
				sim.fix(&id, x, y);
				if !sim.is_globally_pinned() {
					sim.set_alpha_target(sim.config.drag_alpha_target);
					sim.restart(None);
				}
				self.gestures.held_node()
			}
			_ => {
				self.gestures.press_background(
					(sx, sy),
					(self.transform.translate_x, self.transform.translate_y),
				);
				None
			}
		}
	}

	/// Drags the held node, pans, or updates the hover target.
	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if !self.mounted {
			return;
		}
		let (gx, gy) = self.transform.screen_to_graph(sx, sy);
		if let Some((id, x, y)) = self.gestures.drag_to((gx, gy)) {
			if let Some(sim) = self.simulation.as_mut() {
				sim.fix(id, x, y);
			}
		} else if let Some((tx, ty)) = self.gestures.pan_to((sx, sy)) {
			self.transform.translate_x = tx;
			self.transform.translate_y = ty;
		} else {
			self.hovered = self
				.simulation
				.as_ref()
				.and_then(|sim| sim.node_at(gx, gy))
				.map(str::to_string);
		}
	}

	/// Ends the current gesture. A short press on a node is a click: its fixed
	/// coordinate is cleared and, outside the drag cool-down, it is activated.
	pub fn pointer_up(&mut self, now: f64) -> Option<GraphEvent> {
		if !self.mounted {
			return None;
		}
		let release = self.gestures.release(now);
		let sim = self.simulation.as_mut()?;
		sim.set_alpha_target(0.0);
		match release {
			Release::Committed { node_id } => {
				debug!("{node_id} pinned by drag");
				None
			}
			Release::Clicked { node_id } => {
				sim.release(&node_id);
				self.graph.node(&node_id).cloned().map(GraphEvent::NodeActivated)
			}
			Release::Suppressed { node_id } => {
				sim.release(&node_id);
				None
			}
			Release::Panned | Release::Nothing => None,
		}
	}

	/// Pointer left the canvas: finish the gesture as a release.
	pub fn pointer_leave(&mut self, now: f64) -> Option<GraphEvent> {
		self.hovered = None;
		self.pointer_up(now)
	}

	/// Zooms about the pointer, out for positive `delta_y`.
	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		if !self.mounted {
			return;
		}
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		self.transform.zoom_at(sx, sy, factor);
	}

	/// Double-click opens the tag panel. It never resets the view.
	pub fn double_click(&mut self, sx: f64, sy: f64, now: f64) -> Option<(GraphEvent, Panel)> {
		let node = self.clickable_node_at(sx, sy, now)?;
		Some((GraphEvent::NodeDoubleActivated(node.clone()), Panel::Tags(node)))
	}

	/// Right-click: tags for addresses and contracts, inspection otherwise.
	pub fn context_menu(&mut self, sx: f64, sy: f64, now: f64) -> Option<Panel> {
		let node = self.clickable_node_at(sx, sy, now)?;
		Some(match node.kind {
			NodeKind::Address | NodeKind::Contract => Panel::Tags(node),
			NodeKind::Transaction | NodeKind::Block => Panel::Inspect(node),
		})
	}

	fn clickable_node_at(&self, sx: f64, sy: f64, now: f64) -> Option<GraphNode> {
		if !self.mounted || !self.gestures.click_allowed(now) {
			return None;
		}
		let (gx, gy) = self.transform.screen_to_graph(sx, sy);
		let id = self.simulation.as_ref()?.node_at(gx, gy)?;
		self.graph.node(id).cloned()
	}

	/// Clears every fixed coordinate and the view transform.
	pub fn reset(&mut self) {
		if !self.mounted {
			return;
		}
		if let Some(sim) = self.simulation.as_mut() {
			sim.reset();
		}
		self.pinned.clear();
		self.transform = ViewTransform::default();
		info!("graph layout reset");
	}

	/// Persists the flag and applies it to the running simulation.
	pub fn set_globally_pinned(&mut self, pinned: bool) {
		self.preferences.set_globally_pinned(pinned);
		if let Some(sim) = self.simulation.as_mut() {
			sim.set_global_pin(pinned);
		}
		info!("global pin {}", if pinned { "on" } else { "off" });
	}

	/// Set short labels.
	pub fn set_short_labels(&mut self, on: bool) {
		self.preferences.set_short_labels(on);
	}

	/// Scales and centres the view on the current layout.
	pub fn fit_to_view(&mut self) {
		let Some(sim) = self.simulation.as_ref() else {
			self.transform = ViewTransform::default();
			return;
		};
		self.transform = fit_to_view(sim.bounds(), sim.len(), self.viewport);
	}

	/// Centres the searched-for node at a closer zoom.
	pub fn recenter_on_focus(&mut self) -> bool {
		let Some(pos) = self
			.focus_id
			.as_deref()
			.and_then(|id| self.simulation.as_ref()?.position(id))
		else {
			return false;
		};
		self.transform = center_on(pos.0, pos.1, self.viewport);
		true
	}

	/// Canvas was resized; the centering force follows the new centre.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.viewport = Viewport { width, height };
		if let Some(sim) = self.simulation.as_mut() {
			sim.set_center(width, height);
		}
	}

	/// Tags a node of the current graph by id.
	pub fn add_tag(&mut self, node_id: &str, text: &str, color: &str) -> Result<Tag> {
		let kind = self
			.graph
			.node(node_id)
			.map(|n| n.kind)
			.ok_or_else(|| GraphError::data_shape(format!("no node {node_id}")))?;
		self.annotations.add_tag(node_id, kind, text, color)
	}

	/// Graph.
	pub fn graph(&self) -> &GraphData {
		&self.graph
	}

	/// Node.
	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.graph.node(id)
	}

	/// Status.
	pub fn status(&self) -> &GraphStatus {
		&self.status
	}

	/// Node of the entity the payload was fetched for.
	pub fn focus_id(&self) -> Option<&str> {
		self.focus_id.as_deref()
	}

	/// Hovered.
	pub fn hovered(&self) -> Option<&str> {
		self.hovered.as_deref()
	}

	/// Node currently under the pointer's hold, if any.
	pub fn held_node(&self) -> Option<&str> {
		self.gestures.held_node()
	}

	/// `None` when there is no graph to lay out.
	pub fn simulation(&self) -> Option<&Simulation> {
		self.simulation.as_ref()
	}

	/// Transform.
	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	/// Viewport.
	pub fn viewport(&self) -> Viewport {
		self.viewport
	}

	/// Preferences.
	pub fn preferences(&self) -> Preferences {
		self.preferences.get()
	}

	/// Annotations.
	pub fn annotations(&self) -> &dyn AnnotationStore {
		self.annotations.as_ref()
	}

	/// Annotations mut.
	pub fn annotations_mut(&mut self) -> &mut dyn AnnotationStore {
		self.annotations.as_mut()
	}
}
