//! Pointer gesture state: drag-vs-click disambiguation and background pan.
//!
//! This module only tracks pointer geometry and timing. The session applies
//! the outcome to the simulation (fixing or releasing a node).

/// Displacement in layout units above which a release commits a drag.
pub const DRAG_THRESHOLD: f64 = 5.0;
/// Window after a committed drag during which clicks are swallowed.
pub const CLICK_COOLDOWN_MS: f64 = 50.0;

#[derive(Clone, Debug, PartialEq)]
pub struct DragState {
	pub node_id: String,
	pub started_at: f64,
	/// Pointer at press, layout coordinates.
	pub pointer_start: (f64, f64),
	/// Node position at press.
	pub node_start: (f64, f64),
	/// Where the node is currently held.
	pub node_now: (f64, f64),
}

impl DragState {
	pub fn displacement(&self) -> f64 {
		let (dx, dy) = (
			self.node_now.0 - self.node_start.0,
			self.node_now.1 - self.node_start.1,
		);
		(dx * dx + dy * dy).sqrt()
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct PanState {
	/// Pointer at press, screen coordinates.
	pub start: (f64, f64),
	pub translate_start: (f64, f64),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Gesture {
	#[default]
	Idle,
	Drag(DragState),
	Pan(PanState),
}

/// What a pointer release amounted to.
#[derive(Clone, Debug, PartialEq)]
pub enum Release {
	/// The node moved far enough and stays fixed where it was dropped.
	Committed { node_id: String },
	/// A click on a node; its fixed coordinate must be cleared.
	Clicked { node_id: String },
	/// A click inside the cool-down window. Cleared like a click, no event.
	Suppressed { node_id: String },
	Panned,
	Nothing,
}

#[derive(Clone, Debug, Default)]
pub struct GestureTracker {
	gesture: Gesture,
	last_commit_at: Option<f64>,
}

impl GestureTracker {
	pub fn press_node(
		&mut self,
		node_id: &str,
		pointer: (f64, f64),
		node_pos: (f64, f64),
		now: f64,
	) {
		self.gesture = Gesture::Drag(DragState {
			node_id: node_id.to_string(),
			started_at: now,
			pointer_start: pointer,
			node_start: node_pos,
			node_now: node_pos,
		});
	}

	pub fn press_background(&mut self, screen: (f64, f64), translate: (f64, f64)) {
		self.gesture = Gesture::Pan(PanState {
			start: screen,
			translate_start: translate,
		});
	}

	/// New held position of the dragged node for a pointer at `pointer`
	/// (layout coordinates), or `None` when no node is held.
	pub fn drag_to(&mut self, pointer: (f64, f64)) -> Option<(&str, f64, f64)> {
		let Gesture::Drag(drag) = &mut self.gesture else {
			return None;
		};
		drag.node_now = (
			drag.node_start.0 + pointer.0 - drag.pointer_start.0,
			drag.node_start.1 + pointer.1 - drag.pointer_start.1,
		);
		Some((drag.node_id.as_str(), drag.node_now.0, drag.node_now.1))
	}

	/// Translation for a background pan with the pointer at `screen`.
	pub fn pan_to(&self, screen: (f64, f64)) -> Option<(f64, f64)> {
		let Gesture::Pan(pan) = &self.gesture else {
			return None;
		};
		Some((
			pan.translate_start.0 + screen.0 - pan.start.0,
			pan.translate_start.1 + screen.1 - pan.start.1,
		))
	}

	pub fn release(&mut self, now: f64) -> Release {
		match std::mem::take(&mut self.gesture) {
			Gesture::Idle => Release::Nothing,
			Gesture::Pan(_) => Release::Panned,
			Gesture::Drag(drag) if drag.displacement() > DRAG_THRESHOLD => {
				self.last_commit_at = Some(now);
				Release::Committed {
					node_id: drag.node_id,
				}
			}
			Gesture::Drag(drag) if self.click_allowed(now) => Release::Clicked {
				node_id: drag.node_id,
			},
			Gesture::Drag(drag) => Release::Suppressed {
				node_id: drag.node_id,
			},
		}
	}

	/// False within [`CLICK_COOLDOWN_MS`] of the last committed drag.
	pub fn click_allowed(&self, now: f64) -> bool {
		self.last_commit_at
			.map(|at| now - at >= CLICK_COOLDOWN_MS)
			.unwrap_or(true)
	}

	pub fn held_node(&self) -> Option<&str> {
		match &self.gesture {
			Gesture::Drag(drag) => Some(drag.node_id.as_str()),
			_ => None,
		}
	}

	pub fn is_idle(&self) -> bool {
		self.gesture == Gesture::Idle
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn small_move_is_a_click() {
		let mut g = GestureTracker::default();
		g.press_node("addr-0x1", (10.0, 10.0), (12.0, 12.0), 0.0);
		assert_eq!(g.drag_to((13.0, 14.0)), Some(("addr-0x1", 15.0, 16.0)));
		assert_eq!(
			g.release(120.0),
			Release::Clicked {
				node_id: "addr-0x1".into()
			}
		);
		assert!(g.is_idle());
	}

	#[test]
	fn exactly_threshold_is_still_a_click() {
		let mut g = GestureTracker::default();
		g.press_node("n", (0.0, 0.0), (0.0, 0.0), 0.0);
		g.drag_to((3.0, 4.0));
		assert!(matches!(g.release(10.0), Release::Clicked { .. }));
	}

	#[test]
	fn long_move_commits_and_starts_cooldown() {
		let mut g = GestureTracker::default();
		g.press_node("n", (0.0, 0.0), (0.0, 0.0), 0.0);
		g.drag_to((30.0, 0.0));
		assert_eq!(g.release(500.0), Release::Committed { node_id: "n".into() });

		assert!(!g.click_allowed(520.0));
		g.press_node("n", (30.0, 0.0), (30.0, 0.0), 530.0);
		assert_eq!(g.release(540.0), Release::Suppressed { node_id: "n".into() });

		assert!(g.click_allowed(550.0));
		g.press_node("n", (30.0, 0.0), (30.0, 0.0), 560.0);
		assert_eq!(g.release(600.0), Release::Clicked { node_id: "n".into() });
	}

	#[test]
	fn pan_follows_pointer_in_screen_space() {
		let mut g = GestureTracker::default();
		g.press_background((100.0, 100.0), (5.0, -5.0));
		assert_eq!(g.drag_to((1.0, 1.0)), None);
		assert_eq!(g.pan_to((130.0, 90.0)), Some((35.0, -15.0)));
		assert_eq!(g.release(0.0), Release::Panned);
		assert_eq!(g.pan_to((0.0, 0.0)), None);
	}

	#[test]
	fn release_without_press_is_nothing() {
		let mut g = GestureTracker::default();
		assert_eq!(g.release(0.0), Release::Nothing);
		assert!(g.click_allowed(0.0));
	}
}
