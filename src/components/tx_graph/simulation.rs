use std::collections::HashMap;
use std::f64::consts::PI;

use log::{debug, warn};

use super::forces::{self, Body, ForceConfig, Spring};
use super::types::{GraphData, GraphLink};

/// Extra pick tolerance around a node, in layout units.
pub const HIT_SLACK: f64 = 4.0;

/// Lifecycle of one simulation instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	/// Positions seeded, no tick run yet.
	Seeded,
	/// Ticking with alpha above `alpha_min`.
	Running,
	/// Alpha fell below `alpha_min`; ticks are no-ops until a restart.
	Settled,
	/// Stopped by its owner. Ticks are no-ops until a restart.
	Stopped,
}

/// Axis-aligned box around all node centres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	/// Left edge.
	pub min_x: f64,
	/// Top edge.
	pub min_y: f64,
	/// Right edge.
	pub max_x: f64,
	/// Bottom edge.
	pub max_y: f64,
}

/// Force simulation over an id-keyed position table.
#[derive(Debug)]
pub struct Simulation {
	bodies: Vec<Body>,
	index: HashMap<String, usize>,
	springs: Vec<Spring>,
	/// Force constants. Changes apply from the next tick.
	pub config: ForceConfig,
	alpha: f64,
	alpha_target: f64,
	alpha_decay: f64,
	center: (f64, f64),
	phase: Phase,
	globally_pinned: bool,
}

impl Simulation {
	/// Seeds one body per node on a circle around `(width / 2, height / 2)`.
	pub fn new(graph: &GraphData, width: f64, height: f64, config: ForceConfig) -> Self {
		let (cx, cy) = (width / 2.0, height / 2.0);
		let n = graph.nodes.len();
		let ring = 100.0_f64.max(n as f64 * 6.0);

		let mut bodies = Vec::with_capacity(n);
		let mut index = HashMap::with_capacity(n);
		for (i, node) in graph.nodes.iter().enumerate() {
			let angle = (i as f64) * 2.0 * PI / n as f64;
			bodies.push(Body::new(
				node.id.clone(),
				cx + ring * angle.cos(),
				cy + ring * angle.sin(),
				node.kind.radius(),
			));
			index.insert(node.id.clone(), i);
		}

		let mut sim = Self {
			bodies,
			index,
			springs: Vec::new(),
			alpha: 1.0,
			alpha_target: 0.0,
			alpha_decay: config.alpha_decay,
			config,
			center: (cx, cy),
			phase: Phase::Seeded,
			globally_pinned: false,
		};
		sim.set_links(&graph.links);
		sim
	}

	/// Resolves links against the current table by node id. Links naming
	/// unknown nodes are dropped.
	pub fn set_links(&mut self, links: &[GraphLink]) {
		let mut degree = vec![0usize; self.bodies.len()];
		let mut resolved = Vec::with_capacity(links.len());
		for link in links {
			match (self.index.get(&link.source_id), self.index.get(&link.target_id)) {
				(Some(&s), Some(&t)) if s != t => {
					degree[s] += 1;
					degree[t] += 1;
					resolved.push((s, t));
				}
				(Some(_), Some(_)) => {}
				_ => warn!(
					"dropping link {} -> {}: endpoint not in node table",
					link.source_id, link.target_id
				),
			}
		}
		self.springs = resolved
			.into_iter()
			.map(|(s, t)| Spring {
				source: s,
				target: t,
				strength: 1.0 / degree[s].min(degree[t]) as f64,
				bias: degree[s] as f64 / (degree[s] + degree[t]) as f64,
			})
			.collect();
	}

	/// Advances one step. Returns `false` when the simulation is inert.
	pub fn tick(&mut self) -> bool {
		if matches!(self.phase, Phase::Settled | Phase::Stopped) {
			return false;
		}
		self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
		if self.alpha < self.config.alpha_min {
			self.alpha = self.alpha.max(0.0);
			self.phase = Phase::Settled;
			debug!("simulation settled");
			return false;
		}
		self.phase = Phase::Running;

		let cfg = &self.config;
		forces::apply_links(&mut self.bodies, &self.springs, cfg.link_distance, self.alpha);
		forces::apply_many_body(
			&mut self.bodies,
			cfg.charge,
			cfg.charge_distance_min,
			self.alpha,
		);
		forces::apply_collision(&mut self.bodies, cfg.collide_strength);

		let keep = 1.0 - cfg.velocity_decay;
		for b in &mut self.bodies {
			match (b.fx, b.fy) {
				(Some(fx), Some(fy)) => {
					b.x = fx;
					b.y = fy;
					b.vx = 0.0;
					b.vy = 0.0;
				}
				_ => {
					b.vx *= keep;
					b.vy *= keep;
					b.x += b.vx;
					b.y += b.vy;
				}
			}
		}
		forces::apply_centering(
			&mut self.bodies,
			self.center.0,
			self.center.1,
			cfg.center_strength,
		);
		true
	}

	/// Puts the simulation back in motion, optionally with fresh energy.
	/// Fixed coordinates are re-applied before returning.
	pub fn restart(&mut self, alpha: Option<f64>) {
		if let Some(alpha) = alpha {
			self.alpha = alpha;
		}
		self.phase = Phase::Running;
		self.apply_fixed();
	}

	/// Returns `false` if it was already stopped.
	pub fn stop(&mut self) -> bool {
		if self.phase == Phase::Stopped {
			return false;
		}
		self.phase = Phase::Stopped;
		true
	}

	/// Energy the simulation relaxes toward; non-zero keeps it warm.
	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target;
	}

	/// Global pin collapses alpha on the next tick; releasing it restarts.
	pub fn set_global_pin(&mut self, pinned: bool) {
		if self.globally_pinned == pinned {
			return;
		}
		self.globally_pinned = pinned;
		if pinned {
			self.alpha_decay = 1.0;
			self.alpha_target = 0.0;
		} else {
			self.alpha_decay = self.config.alpha_decay;
			if self.phase != Phase::Stopped {
				self.restart(Some(self.config.unpin_alpha));
			}
		}
	}

	/// Whether global pin is on.
	pub fn is_globally_pinned(&self) -> bool {
		self.globally_pinned
	}

	/// Clears every fixed coordinate. Unpinned simulations restart at full
	/// energy; pinned ones stay where they are.
	pub fn reset(&mut self) {
		for b in &mut self.bodies {
			b.fx = None;
			b.fy = None;
		}
		self.alpha_target = 0.0;
		if !self.globally_pinned {
			self.restart(Some(1.0));
		}
	}

	/// Fixes a node at `(x, y)`; it is shown there immediately.
	pub fn fix(&mut self, id: &str, x: f64, y: f64) -> bool {
		let Some(b) = self.body_mut(id) else {
			return false;
		};
		b.fx = Some(x);
		b.fy = Some(y);
		b.x = x;
		b.y = y;
		b.vx = 0.0;
		b.vy = 0.0;
		true
	}

	/// Clears the node's fixed coordinate.
	pub fn release(&mut self, id: &str) -> bool {
		let Some(b) = self.body_mut(id) else {
			return false;
		};
		b.fx = None;
		b.fy = None;
		true
	}

	/// Every fixed coordinate by node id.
	pub fn fixed_coordinates(&self) -> HashMap<String, (f64, f64)> {
		self.bodies
			.iter()
			.filter_map(|b| match (b.fx, b.fy) {
				(Some(fx), Some(fy)) => Some((b.id.clone(), (fx, fy))),
				_ => None,
			})
			.collect()
	}

	/// Re-applies coordinates carried over from a previous table. Ids that no
	/// longer exist are ignored.
	pub fn carry_fixed(&mut self, fixed: &HashMap<String, (f64, f64)>) {
		for (id, &(x, y)) in fixed {
			self.fix(id, x, y);
		}
	}

	fn apply_fixed(&mut self) {
		for b in &mut self.bodies {
			if let (Some(fx), Some(fy)) = (b.fx, b.fy) {
				b.x = fx;
				b.y = fy;
				b.vx = 0.0;
				b.vy = 0.0;
			}
		}
	}

	/// Body by node id.
	pub fn body(&self, id: &str) -> Option<&Body> {
		self.index.get(id).map(|&i| &self.bodies[i])
	}

	fn body_mut(&mut self, id: &str) -> Option<&mut Body> {
		self.index.get(id).copied().map(|i| &mut self.bodies[i])
	}

	/// Current layout position.
	pub fn position(&self, id: &str) -> Option<(f64, f64)> {
		self.body(id).map(|b| (b.x, b.y))
	}

	/// Bodies in node order.
	pub fn bodies(&self) -> &[Body] {
		&self.bodies
	}

	/// Links that resolved to two distinct bodies.
	pub fn springs(&self) -> &[Spring] {
		&self.springs
	}

	/// `None` for an empty table.
	pub fn bounds(&self) -> Option<Bounds> {
		let first = self.bodies.first()?;
		let init = Bounds {
			min_x: first.x,
			min_y: first.y,
			max_x: first.x,
			max_y: first.y,
		};
		Some(self.bodies.iter().fold(init, |acc, b| Bounds {
			min_x: acc.min_x.min(b.x),
			min_y: acc.min_y.min(b.y),
			max_x: acc.max_x.max(b.x),
			max_y: acc.max_y.max(b.y),
		}))
	}

	/// Topmost node under a point in layout coordinates.
	pub fn node_at(&self, x: f64, y: f64) -> Option<&str> {
		self.bodies
			.iter()
			.rev()
			.find(|b| {
				let (dx, dy) = (b.x - x, b.y - y);
				(dx * dx + dy * dy).sqrt() <= b.radius + HIT_SLACK
			})
			.map(|b| b.id.as_str())
	}

	/// Moves the centering target to the middle of a `width` by `height` canvas.
	pub fn set_center(&mut self, width: f64, height: f64) {
		self.center = (width / 2.0, height / 2.0);
	}

	/// Current energy.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Current lifecycle phase.
	pub fn phase(&self) -> Phase {
		self.phase
	}

	/// Settled or stopped: ticks do nothing until a restart.
	pub fn is_inert(&self) -> bool {
		matches!(self.phase, Phase::Settled | Phase::Stopped)
	}

	/// Number of bodies.
	pub fn len(&self) -> usize {
		self.bodies.len()
	}

	/// `true` when the graph had no nodes.
	pub fn is_empty(&self) -> bool {
		self.bodies.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;
	use crate::components::tx_graph::builder::build_graph;
	use crate::ledger::{BlockHeader, LedgerPayload, TxRecord};

	fn sample_graph() -> GraphData {
		let tx = |hash: &str, from: &str, to: &str| TxRecord {
			hash: Some(hash.into()),
			from: Some(from.into()),
			to: Some(to.into()),
			..Default::default()
		};
		let payload = LedgerPayload::BlockWithTransactions {
			block: BlockHeader {
				number: 100,
				..Default::default()
			},
			transactions: Some(vec![tx("0xaaa", "0x1", "0x2"), tx("0xbbb", "0x2", "0x3")]),
		};
		build_graph(&payload, &HashSet::new()).graph
	}

	fn sim() -> Simulation {
		Simulation::new(&sample_graph(), 800.0, 600.0, ForceConfig::default())
	}

	fn run(sim: &mut Simulation, ticks: usize) {
		for _ in 0..ticks {
			sim.tick();
		}
	}

	#[test]
	fn seeds_on_a_circle_around_centre() {
		let sim = sim();
		assert_eq!(sim.phase(), Phase::Seeded);
		for b in sim.bodies() {
			let r = ((b.x - 400.0).powi(2) + (b.y - 300.0).powi(2)).sqrt();
			assert!((r - 100.0).abs() < 1e-9);
		}
	}

	#[test]
	fn every_link_becomes_a_spring() {
		let sim = sim();
		assert_eq!(sim.springs().len(), 6);
	}

	#[test]
	fn unknown_endpoints_are_dropped() {
		let mut sim = sim();
		let mut links = sample_graph().links;
		links[0].target_id = "tx-missing".into();
		sim.set_links(&links);
		assert_eq!(sim.springs().len(), 5);
	}

	#[test]
	fn alpha_decays_until_inert() {
		let mut sim = sim();
		assert!(sim.tick());
		let a1 = sim.alpha();
		sim.tick();
		assert!(sim.alpha() < a1);

		run(&mut sim, 500);
		assert_eq!(sim.phase(), Phase::Settled);
		let before: Vec<_> = sim.bodies().to_vec();
		assert!(!sim.tick());
		assert_eq!(sim.bodies(), before.as_slice());
	}

	#[test]
	fn fixed_node_is_never_integrated() {
		let mut sim = sim();
		assert!(sim.fix("addr-0x2", 10.0, 20.0));
		run(&mut sim, 200);
		assert_eq!(sim.position("addr-0x2"), Some((10.0, 20.0)));
		assert!(sim.bodies().iter().all(|b| b.x.is_finite() && b.y.is_finite()));
	}

	#[test]
	fn fixed_node_survives_global_pin_toggle() {
		let mut sim = sim();
		sim.fix("tx-0xaaa", 5.0, 5.0);
		sim.set_global_pin(true);
		run(&mut sim, 3);
		sim.set_global_pin(false);
		run(&mut sim, 50);
		assert_eq!(sim.position("tx-0xaaa"), Some((5.0, 5.0)));
	}

	#[test]
	fn global_pin_freezes_unfixed_nodes() {
		let mut sim = sim();
		run(&mut sim, 10);
		sim.set_global_pin(true);
		let before: Vec<_> = sim.bodies().iter().map(|b| (b.x, b.y)).collect();
		assert!(!sim.tick());
		run(&mut sim, 20);
		let after: Vec<_> = sim.bodies().iter().map(|b| (b.x, b.y)).collect();
		assert_eq!(before, after);
		assert!(sim.is_inert());
	}

	#[test]
	fn unpin_restarts() {
		let mut sim = sim();
		sim.set_global_pin(true);
		sim.tick();
		assert!(sim.is_inert());
		sim.set_global_pin(false);
		assert!((sim.alpha() - 0.3).abs() < 1e-12);
		assert!(sim.tick());
	}

	#[test]
	fn reset_clears_fixed_and_restarts() {
		let mut sim = sim();
		sim.fix("addr-0x1", 0.0, 0.0);
		run(&mut sim, 600);
		assert!(sim.is_inert());

		sim.reset();
		assert!(sim.fixed_coordinates().is_empty());
		assert_eq!(sim.alpha(), 1.0);
		assert!(sim.tick());
		assert_ne!(sim.position("addr-0x1"), Some((0.0, 0.0)));
	}

	#[test]
	fn reset_while_pinned_stays_inert() {
		let mut sim = sim();
		sim.set_global_pin(true);
		sim.tick();
		sim.fix("addr-0x1", 1.0, 1.0);
		sim.reset();
		assert!(sim.fixed_coordinates().is_empty());
		assert!(!sim.tick());
	}

	#[test]
	fn stop_is_idempotent() {
		let mut sim = sim();
		assert!(sim.stop());
		assert!(!sim.stop());
		assert!(!sim.tick());
		sim.restart(Some(0.5));
		assert!(sim.tick());
	}

	#[test]
	fn restart_reapplies_fixed_coordinates() {
		let mut sim = sim();
		sim.fix("block-100", 42.0, 24.0);
		sim.bodies[sim.index["block-100"]].x = 0.0;
		sim.restart(None);
		assert_eq!(sim.position("block-100"), Some((42.0, 24.0)));
	}

	#[test]
	fn collision_keeps_nodes_apart() {
		let mut sim = sim();
		run(&mut sim, 400);
		let bodies = sim.bodies();
		for i in 0..bodies.len() {
			for j in (i + 1)..bodies.len() {
				let (a, b) = (&bodies[i], &bodies[j]);
				let d = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
				assert!(d > (a.radius + b.radius) * 0.9, "{} {}", a.id, b.id);
			}
		}
	}

	#[test]
	fn hit_test_prefers_topmost() {
		let mut sim = sim();
		sim.fix("addr-0x1", 50.0, 50.0);
		sim.fix("addr-0x3", 52.0, 50.0);
		assert_eq!(sim.node_at(51.0, 50.0), Some("addr-0x3"));
		assert_eq!(sim.node_at(500.0, 500.0), None);
	}

	#[test]
	fn carried_coordinates_skip_unknown_ids() {
		let mut sim = sim();
		let carried = HashMap::from([
			("addr-0x1".to_string(), (1.0, 2.0)),
			("addr-gone".to_string(), (3.0, 4.0)),
		]);
		sim.carry_fixed(&carried);
		assert_eq!(sim.fixed_coordinates().len(), 1);
		assert_eq!(sim.position("addr-0x1"), Some((1.0, 2.0)));
	}
}
