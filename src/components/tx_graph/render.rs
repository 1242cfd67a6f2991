use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::session::{GraphSession, GraphStatus};
use super::simulation::Simulation;
use super::types::LinkKind;

const BACKGROUND: &str = "#1a1a2e";

pub fn render(session: &GraphSession, ctx: &CanvasRenderingContext2d) {
	let viewport = session.viewport();
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, viewport.width, viewport.height);

	let Some(sim) = session.simulation() else {
		draw_status(session, ctx);
		return;
	};
	let t = session.transform();
	ctx.save();
	let _ = ctx.translate(t.translate_x, t.translate_y);
	let _ = ctx.scale(t.scale, t.scale);
	draw_links(session, sim, ctx, t.scale);
	draw_nodes(session, sim, ctx, t.scale);
	ctx.restore();
}

fn draw_status(session: &GraphSession, ctx: &CanvasRenderingContext2d) {
	let text = match session.status() {
		GraphStatus::NoData => "No graph data".to_string(),
		GraphStatus::Failed(msg) => format!("Render failed: {msg}"),
		GraphStatus::Ready => return,
	};
	let viewport = session.viewport();
	ctx.set_fill_style_str("rgba(255, 255, 255, 0.6)");
	ctx.set_font("14px sans-serif");
	ctx.set_text_align("center");
	let _ = ctx.fill_text(&text, viewport.width / 2.0, viewport.height / 2.0);
	ctx.set_text_align("start");
}

fn draw_links(session: &GraphSession, sim: &Simulation, ctx: &CanvasRenderingContext2d, k: f64) {
	let (line_width, arrow_size) = (1.5 / k, 7.0 / k);

	for link in &session.graph().links {
		let (Some(src), Some(tgt)) = (sim.body(&link.source_id), sim.body(&link.target_id)) else {
			continue;
		};
		ctx.set_stroke_style_str(link.kind.color());
		ctx.set_line_width(line_width);
		if link.kind == LinkKind::Interact {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(4.0 / k),
				&JsValue::from_f64(4.0 / k),
			));
		}

		if src.id == tgt.id {
			// self-transfer loop above the node
			ctx.begin_path();
			let _ = ctx.arc(src.x, src.y - src.radius * 1.6, src.radius, 0.0, 2.0 * PI);
			ctx.stroke();
			let _ = ctx.set_line_dash(&js_sys::Array::new());
			continue;
		}

		let (dx, dy) = (tgt.x - src.x, tgt.y - src.y);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
			continue;
		}
		let (ux, uy) = (dx / dist, dy / dist);
		ctx.begin_path();
		ctx.move_to(src.x + ux * src.radius, src.y + uy * src.radius);
		ctx.line_to(
			tgt.x - ux * (tgt.radius + arrow_size),
			tgt.y - uy * (tgt.radius + arrow_size),
		);
		ctx.stroke();
		let _ = ctx.set_line_dash(&js_sys::Array::new());

		ctx.set_fill_style_str(link.kind.color());
		let (tip_x, tip_y) = (tgt.x - ux * tgt.radius, tgt.y - uy * tgt.radius);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
}

fn draw_nodes(session: &GraphSession, sim: &Simulation, ctx: &CanvasRenderingContext2d, k: f64) {
	let short = session.preferences().short_labels;
	let annotations = session.annotations();

	for node in &session.graph().nodes {
		let Some(body) = sim.body(&node.id) else {
			continue;
		};
		let (x, y, r) = (body.x, body.y, body.radius);
		let hovered = session.hovered() == Some(node.id.as_str())
			|| session.held_node() == Some(node.id.as_str());

		ctx.begin_path();
		let _ = ctx.arc(x, y, if hovered { r * 1.2 } else { r }, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(node.kind.color());
		ctx.fill();

		if let Some(color) = annotations.primary_color(&node.id) {
			ctx.begin_path();
			let _ = ctx.arc(x, y, r + 3.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&color);
			ctx.set_line_width(2.5 / k);
			ctx.stroke();
		}

		if session.focus_id() == Some(node.id.as_str()) {
			ctx.begin_path();
			let _ = ctx.arc(x, y, r + 6.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str("rgba(255, 255, 255, 0.8)");
			ctx.set_line_width(1.0 / k);
			ctx.stroke();
		}

		if body.is_fixed() {
			ctx.begin_path();
			let _ = ctx.arc(x, y, 2.0 / k, 0.0, 2.0 * PI);
			ctx.set_fill_style_str("white");
			ctx.fill();
		}

		let alpha = if hovered { 1.0 } else { 0.75 };
		ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {alpha})"));
		ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
		let _ = ctx.fill_text(&node.label(short), x + r + 3.0, y + 3.0);
	}
}
