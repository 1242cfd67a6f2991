//! Pan/zoom transform and the fit/recenter computations.

use log::warn;

use super::simulation::Bounds;

/// Smallest zoom factor.
pub const MIN_SCALE: f64 = 0.1;
/// Largest zoom factor.
pub const MAX_SCALE: f64 = 4.0;
/// Margin added around the node bounding box by fit-to-view, in layout units.
pub const FIT_PADDING: f64 = 40.0;
/// Zoom used when recentering on the focus node.
pub const FOCUS_SCALE: f64 = 1.5;

/// Screen = layout * scale + translate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	/// Scale.
	pub scale: f64,
	/// Translate x.
	pub translate_x: f64,
	/// Translate y.
	pub translate_y: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			scale: 1.0,
			translate_x: 0.0,
			translate_y: 0.0,
		}
	}
}

impl ViewTransform {
	/// Inverse of [`graph_to_screen`](Self::graph_to_screen).
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.translate_x) / self.scale,
			(sy - self.translate_y) / self.scale,
		)
	}

	/// Layout coordinates to canvas pixels.
	pub fn graph_to_screen(&self, gx: f64, gy: f64) -> (f64, f64) {
		(
			gx * self.scale + self.translate_x,
			gy * self.scale + self.translate_y,
		)
	}

	/// Zooms by `factor` keeping the screen point `(sx, sy)` still.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
		let ratio = new_scale / self.scale;
		self.translate_x = sx - (sx - self.translate_x) * ratio;
		self.translate_y = sy - (sy - self.translate_y) * ratio;
		self.scale = new_scale;
	}

	/// Is finite.
	pub fn is_finite(&self) -> bool {
		self.scale.is_finite() && self.translate_x.is_finite() && self.translate_y.is_finite()
	}

	/// Falls back to the default transform for NaN or infinite results.
	fn or_default(self) -> Self {
		if self.is_finite() && self.scale > 0.0 {
			self
		} else {
			warn!("discarding non-finite view transform {self:?}");
			Self::default()
		}
	}
}

/// Canvas size in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	/// Width.
	pub width: f64,
	/// Height.
	pub height: f64,
}

impl Viewport {
	/// Center.
	pub fn center(&self) -> (f64, f64) {
		(self.width / 2.0, self.height / 2.0)
	}
}

/// Transform that centres `bounds` and scales it to fit. With fewer than two
/// nodes there is nothing to fit and the default transform is returned.
pub fn fit_to_view(bounds: Option<Bounds>, node_count: usize, viewport: Viewport) -> ViewTransform {
	let Some(b) = bounds.filter(|_| node_count > 1) else {
		return ViewTransform::default();
	};
	let width = b.max_x - b.min_x + 2.0 * FIT_PADDING;
	let height = b.max_y - b.min_y + 2.0 * FIT_PADDING;
	let scale = (viewport.width / width)
		.min(viewport.height / height)
		.clamp(MIN_SCALE, MAX_SCALE);
	let (mid_x, mid_y) = ((b.min_x + b.max_x) / 2.0, (b.min_y + b.max_y) / 2.0);
	let (cx, cy) = viewport.center();
	ViewTransform {
		scale,
		translate_x: cx - mid_x * scale,
		translate_y: cy - mid_y * scale,
	}
	.or_default()
}

/// Transform placing the layout point `(x, y)` at the viewport centre.
pub fn center_on(x: f64, y: f64, viewport: Viewport) -> ViewTransform {
	let (cx, cy) = viewport.center();
	ViewTransform {
		scale: FOCUS_SCALE,
		translate_x: cx - x * FOCUS_SCALE,
		translate_y: cy - y * FOCUS_SCALE,
	}
	.or_default()
}

#[cfg(test)]
mod tests {
	use super::*;

	const VIEW: Viewport = Viewport {
		width: 800.0,
		height: 600.0,
	};

	fn bounds(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Option<Bounds> {
		Some(Bounds {
			min_x,
			min_y,
			max_x,
			max_y,
		})
	}

	#[test]
	fn fit_centres_the_box() {
		let t = fit_to_view(bounds(0.0, 0.0, 320.0, 120.0), 5, VIEW);
		// width 400 with padding fits 800 at scale 2
		assert!((t.scale - 2.0).abs() < 1e-12);
		let (sx, sy) = t.graph_to_screen(160.0, 60.0);
		assert!((sx - 400.0).abs() < 1e-9);
		assert!((sy - 300.0).abs() < 1e-9);
	}

	#[test]
	fn fit_is_idempotent() {
		let b = bounds(-50.0, 10.0, 900.0, 700.0);
		assert_eq!(fit_to_view(b, 9, VIEW), fit_to_view(b, 9, VIEW));
	}

	#[test]
	fn fit_respects_scale_bounds() {
		let tiny = fit_to_view(bounds(0.0, 0.0, 0.0, 1.0), 2, VIEW);
		assert!(tiny.scale <= MAX_SCALE);
		let huge = fit_to_view(bounds(0.0, 0.0, 1e6, 1e6), 2, VIEW);
		assert_eq!(huge.scale, MIN_SCALE);
	}

	#[test]
	fn degenerate_inputs_use_default() {
		assert_eq!(fit_to_view(None, 0, VIEW), ViewTransform::default());
		assert_eq!(
			fit_to_view(bounds(3.0, 3.0, 3.0, 3.0), 1, VIEW),
			ViewTransform::default()
		);
		assert_eq!(
			fit_to_view(bounds(f64::NAN, 0.0, 1.0, 1.0), 2, VIEW),
			ViewTransform::default()
		);
	}

	#[test]
	fn zoom_is_clamped_and_anchored() {
		let mut t = ViewTransform::default();
		let before = t.screen_to_graph(100.0, 100.0);
		t.zoom_at(100.0, 100.0, 1.1);
		let after = t.screen_to_graph(100.0, 100.0);
		assert!((before.0 - after.0).abs() < 1e-9 && (before.1 - after.1).abs() < 1e-9);

		for _ in 0..100 {
			t.zoom_at(0.0, 0.0, 1.1);
		}
		assert_eq!(t.scale, MAX_SCALE);
		for _ in 0..200 {
			t.zoom_at(0.0, 0.0, 0.9);
		}
		assert_eq!(t.scale, MIN_SCALE);
	}

	#[test]
	fn center_on_puts_point_mid_screen() {
		let t = center_on(10.0, -20.0, VIEW);
		assert_eq!(t.scale, FOCUS_SCALE);
		assert_eq!(t.graph_to_screen(10.0, -20.0), (400.0, 300.0));
	}
}
