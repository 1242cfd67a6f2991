//! Force terms applied on every simulation tick.
//!
//! Each function nudges body velocities (or, for centering, positions of
//! unfixed bodies). Integration happens afterwards in the simulation.

/// Tunables for the layout. Defaults suit graphs of a few hundred nodes.
#[derive(Clone, Debug)]
pub struct ForceConfig {
	/// Rest length of a link spring.
	pub link_distance: f64,
	/// Many-body strength. Negative repels.
	pub charge: f64,
	/// Distances below this are clamped in the many-body term.
	pub charge_distance_min: f64,
	/// Fraction of the barycentre offset removed per tick.
	pub center_strength: f64,
	/// How much of an overlap is resolved per tick.
	pub collide_strength: f64,
	/// Fraction of velocity lost per tick.
	pub velocity_decay: f64,
	/// Below this the simulation settles.
	pub alpha_min: f64,
	/// Fraction of the gap to `alpha_target` closed per tick.
	pub alpha_decay: f64,
	/// Alpha target while a node is held by the pointer.
	pub drag_alpha_target: f64,
	/// Alpha given back when global pin is released.
	pub unpin_alpha: f64,
}

impl Default for ForceConfig {
	fn default() -> Self {
		let alpha_min: f64 = 0.001;
		Self {
			link_distance: 60.0,
			charge: -250.0,
			charge_distance_min: 1.0,
			center_strength: 0.1,
			collide_strength: 0.7,
			velocity_decay: 0.4,
			alpha_min,
			// reaches alpha_min from 1.0 in ~300 ticks
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			drag_alpha_target: 0.3,
			unpin_alpha: 0.3,
		}
	}
}

/// One node in the position table.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
	/// Node id.
	pub id: String,
	/// Layout position.
	pub x: f64,
	/// Layout position.
	pub y: f64,
	/// Velocity, consumed by the next integration step.
	pub vx: f64,
	/// Velocity, consumed by the next integration step.
	pub vy: f64,
	/// Fixed x; when set together with `fy` the body does not integrate.
	pub fx: Option<f64>,
	/// Fixed y, paired with `fx`.
	pub fy: Option<f64>,
	/// Collision and hit radius.
	pub radius: f64,
}

impl Body {
	/// Unfixed body at rest.
	pub fn new(id: impl Into<String>, x: f64, y: f64, radius: f64) -> Self {
		Self {
			id: id.into(),
			x,
			y,
			vx: 0.0,
			vy: 0.0,
			fx: None,
			fy: None,
			radius,
		}
	}

	/// Either fixed coordinate is set.
	pub fn is_fixed(&self) -> bool {
		self.fx.is_some() || self.fy.is_some()
	}
}

/// A link resolved against the current position table.
#[derive(Clone, Debug)]
pub struct Spring {
	pub source: usize,
	pub target: usize,
	pub strength: f64,
	/// Share of the correction taken by the target.
	pub bias: f64,
}

/// Deterministic stand-in for random jiggle on coincident points.
fn jiggle(i: usize, j: usize) -> f64 {
	(i as f64 - j as f64 + 0.5) * 1e-6
}

pub fn apply_links(bodies: &mut [Body], springs: &[Spring], distance: f64, alpha: f64) {
	for s in springs {
		let (src, tgt) = (&bodies[s.source], &bodies[s.target]);
		let mut dx = tgt.x + tgt.vx - src.x - src.vx;
		let mut dy = tgt.y + tgt.vy - src.y - src.vy;
		if dx == 0.0 && dy == 0.0 {
			dx = jiggle(s.target, s.source);
		}
		let l = (dx * dx + dy * dy).sqrt();
		let k = (l - distance) / l * alpha * s.strength;
		dx *= k;
		dy *= k;
		bodies[s.target].vx -= dx * s.bias;
		bodies[s.target].vy -= dy * s.bias;
		bodies[s.source].vx += dx * (1.0 - s.bias);
		bodies[s.source].vy += dy * (1.0 - s.bias);
	}
}

/// Pairwise repulsion, inversely proportional to distance.
pub fn apply_many_body(bodies: &mut [Body], charge: f64, distance_min: f64, alpha: f64) {
	let min2 = distance_min * distance_min;
	for i in 0..bodies.len() {
		for j in (i + 1)..bodies.len() {
			let mut dx = bodies[j].x - bodies[i].x;
			let dy = bodies[j].y - bodies[i].y;
			let mut l2 = dx * dx + dy * dy;
			if l2 == 0.0 {
				dx = jiggle(i, j);
				l2 = dx * dx;
			}
			if l2 < min2 {
				l2 = (min2 * l2).sqrt();
			}
			let w = charge * alpha / l2;
			bodies[i].vx += dx * w;
			bodies[i].vy += dy * w;
			bodies[j].vx -= dx * w;
			bodies[j].vy -= dy * w;
		}
	}
}

/// Shifts unfixed bodies so the barycentre moves toward `(cx, cy)`.
pub fn apply_centering(bodies: &mut [Body], cx: f64, cy: f64, strength: f64) {
	if bodies.is_empty() {
		return;
	}
	let n = bodies.len() as f64;
	let (sx, sy) = bodies
		.iter()
		.fold((0.0, 0.0), |(sx, sy), b| (sx + b.x, sy + b.y));
	let (ox, oy) = ((sx / n - cx) * strength, (sy / n - cy) * strength);
	for b in bodies.iter_mut().filter(|b| !b.is_fixed()) {
		b.x -= ox;
		b.y -= oy;
	}
}

/// Pushes apart bodies whose centres are closer than the sum of their radii.
pub fn apply_collision(bodies: &mut [Body], strength: f64) {
	for i in 0..bodies.len() {
		for j in (i + 1)..bodies.len() {
			let (a, b) = (&bodies[i], &bodies[j]);
			let r = a.radius + b.radius;
			let mut dx = (a.x + a.vx) - (b.x + b.vx);
			let dy = (a.y + a.vy) - (b.y + b.vy);
			let mut l2 = dx * dx + dy * dy;
			if l2 >= r * r {
				continue;
			}
			if l2 == 0.0 {
				dx = jiggle(i, j);
				l2 = dx * dx;
			}
			let l = l2.sqrt();
			let k = (r - l) / l * strength;
			let (ra2, rb2) = (a.radius * a.radius, b.radius * b.radius);
			let share = rb2 / (ra2 + rb2);
			bodies[i].vx += dx * k * share;
			bodies[i].vy += dy * k * share;
			bodies[j].vx -= dx * k * (1.0 - share);
			bodies[j].vy -= dy * k * (1.0 - share);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn many_body_only_repels() {
		let mut bodies = vec![Body::new("a", 0.0, 0.0, 5.0), Body::new("b", 10.0, 0.0, 5.0)];
		apply_many_body(&mut bodies, -100.0, 1.0, 1.0);
		assert!(bodies[0].vx < 0.0);
		assert!(bodies[1].vx > 0.0);
	}

	#[test]
	fn link_pulls_stretched_pair_together() {
		let mut bodies = vec![Body::new("a", 0.0, 0.0, 5.0), Body::new("b", 200.0, 0.0, 5.0)];
		let springs = [Spring {
			source: 0,
			target: 1,
			strength: 1.0,
			bias: 0.5,
		}];
		apply_links(&mut bodies, &springs, 50.0, 1.0);
		assert!(bodies[0].vx > 0.0);
		assert!(bodies[1].vx < 0.0);
	}

	#[test]
	fn collision_separates_overlap_and_ignores_distant() {
		let mut bodies = vec![Body::new("a", 0.0, 0.0, 10.0), Body::new("b", 5.0, 0.0, 10.0)];
		apply_collision(&mut bodies, 1.0);
		assert!(bodies[0].vx < 0.0);
		assert!(bodies[1].vx > 0.0);

		let mut far = vec![Body::new("a", 0.0, 0.0, 10.0), Body::new("b", 50.0, 0.0, 10.0)];
		apply_collision(&mut far, 1.0);
		assert_eq!(far[0].vx, 0.0);
	}

	#[test]
	fn centering_leaves_fixed_bodies() {
		let mut fixed = Body::new("a", 100.0, 100.0, 5.0);
		fixed.fx = Some(100.0);
		fixed.fy = Some(100.0);
		let mut bodies = vec![fixed, Body::new("b", 300.0, 100.0, 5.0)];
		apply_centering(&mut bodies, 0.0, 0.0, 1.0);
		assert_eq!((bodies[0].x, bodies[0].y), (100.0, 100.0));
		assert_eq!((bodies[1].x, bodies[1].y), (100.0, 0.0));
	}

	#[test]
	fn coincident_bodies_stay_finite() {
		let mut bodies = vec![Body::new("a", 1.0, 1.0, 5.0), Body::new("b", 1.0, 1.0, 5.0)];
		apply_many_body(&mut bodies, -100.0, 1.0, 1.0);
		apply_collision(&mut bodies, 0.7);
		assert!(bodies.iter().all(|b| b.vx.is_finite() && b.vy.is_finite()));
		assert_ne!(bodies[0].vx, bodies[1].vx);
	}
}
