use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlAnchorElement, HtmlCanvasElement, MouseEvent, WheelEvent, Window,
};

use super::panels::{InspectPanel, TagPanel};
use super::render;
use super::session::{GraphEvent, GraphSession, Panel};
use super::types::GraphNode;
use super::viewport::Viewport;
use crate::annotations::{PreferenceStore, Preferences, TagStore, default_backend};
use crate::error::{GraphError, Result};
use crate::ledger::LedgerPayload;

/// Browser-side state of one mounted canvas.
#[derive(Default)]
pub struct CanvasRuntime {
	pub(super) session: Option<GraphSession>,
	frame: Option<Closure<dyn FnMut()>>,
	frame_id: Option<i32>,
	resize: Option<Closure<dyn FnMut()>>,
}

impl CanvasRuntime {
	/// Stops the session, cancels the pending frame and detaches listeners.
	fn teardown(&mut self) {
		if let Some(session) = self.session.as_mut() {
			session.teardown();
		}
		if let Some(window) = web_sys::window() {
			if let Some(id) = self.frame_id.take() {
				let _ = window.cancel_animation_frame(id);
			}
			if let Some(cb) = self.resize.take() {
				let _ = window
					.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}
		self.frame = None;
	}
}

pub type RuntimeHandle = StoredValue<CanvasRuntime, LocalStorage>;

fn with_session<U>(runtime: RuntimeHandle, f: impl FnOnce(&mut GraphSession) -> U) -> Option<U> {
	runtime
		.try_update_value(|rt| rt.session.as_mut().map(f))
		.flatten()
}

fn window_size(window: &Window) -> (f64, f64) {
	let dim = |v: std::result::Result<JsValue, JsValue>, fallback| {
		v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback)
	};
	(dim(window.inner_width(), 800.0), dim(window.inner_height(), 600.0))
}

/// Pointer position relative to the canvas. `None` when it is not mounted.
fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn schedule_frame(runtime: RuntimeHandle) {
	let Some(window) = web_sys::window() else {
		return;
	};
	let id = runtime
		.try_with_value(|rt| {
			rt.frame
				.as_ref()
				.and_then(|cb| window.request_animation_frame(cb.as_ref().unchecked_ref()).ok())
		})
		.flatten();
	runtime.try_update_value(|rt| rt.frame_id = id);
}

fn export_snapshot(canvas: &HtmlCanvasElement) -> Result<()> {
	let js = |e: JsValue| GraphError::Storage(format!("{e:?}"));
	let url = canvas.to_data_url().map_err(js)?;
	let document = web_sys::window()
		.and_then(|w| w.document())
		.ok_or(GraphError::RenderTargetUnavailable)?;
	let anchor: HtmlAnchorElement = document
		.create_element("a")
		.map_err(js)?
		.dyn_into()
		.map_err(|_| GraphError::RenderTargetUnavailable)?;
	anchor.set_href(&url);
	anchor.set_download("transaction-graph.png");
	anchor.click();
	Ok(())
}

fn init(
	runtime: RuntimeHandle,
	canvas: HtmlCanvasElement,
	size: (f64, f64),
	fullscreen: bool,
) -> Result<Preferences> {
	let window: Window = web_sys::window().ok_or(GraphError::RenderTargetUnavailable)?;
	let (w, h) = size;
	canvas.set_width(w as u32);
	canvas.set_height(h as u32);

	let ctx: CanvasRenderingContext2d = canvas
		.get_context("2d")
		.ok()
		.flatten()
		.and_then(|c| c.dyn_into().ok())
		.ok_or(GraphError::RenderTargetUnavailable)?;

	let session = GraphSession::mount(
		Viewport {
			width: w,
			height: h,
		},
		Box::new(TagStore::open(default_backend())),
		PreferenceStore::open(default_backend()),
	);
	let prefs = session.preferences();

	let resize = fullscreen.then(|| {
		let canvas = canvas.clone();
		let cb = Closure::<dyn FnMut()>::new(move || {
			let Some(win) = web_sys::window() else {
				return;
			};
			let (nw, nh) = window_size(&win);
			canvas.set_width(nw as u32);
			canvas.set_height(nh as u32);
			with_session(runtime, |s| s.resize(nw, nh));
		});
		let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		cb
	});

	let frame = Closure::<dyn FnMut()>::new(move || {
		let alive = runtime
			.try_update_value(|rt| {
				let Some(session) = rt.session.as_mut() else {
					return false;
				};
				if !session.is_mounted() {
					return false;
				}
				session.tick();
				render::render(session, &ctx);
				true
			})
			.unwrap_or(false);
		if alive {
			schedule_frame(runtime);
		}
	});

	runtime.try_update_value(|rt| {
		rt.session = Some(session);
		rt.frame = Some(frame);
		rt.resize = resize;
	});
	schedule_frame(runtime);
	Ok(prefs)
}

/// Interactive transaction graph on a canvas.
///
/// Re-renders whenever `data` changes; pinned node positions and tags are
/// kept across payloads. Activation events go to the optional callbacks.
#[component]
pub fn TxGraphCanvas(
	/// Latest payload from the data service; `None` until the first fetch.
	#[prop(into)]
	data: Signal<Option<LedgerPayload>>,
	/// Size the canvas to the window and follow resizes.
	#[prop(default = false)]
	fullscreen: bool,
	/// Canvas width; defaults to the parent's width.
	#[prop(default = None)]
	width: Option<f64>,
	/// Canvas height; defaults to the parent's height.
	#[prop(default = None)]
	height: Option<f64>,
	/// Called on a plain click on a node.
	#[prop(optional, into)]
	on_node_activated: Option<Callback<GraphNode>>,
	/// Called on a double-click on a node.
	#[prop(optional, into)]
	on_node_double_activated: Option<Callback<GraphNode>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let runtime: RuntimeHandle = StoredValue::new_local(CanvasRuntime::default());
	let prefs = RwSignal::new(Preferences::default());
	let panel = RwSignal::new(None::<Panel>);
	let tags_version = RwSignal::new(0u64);
	let init_error = RwSignal::new(None::<String>);

	let emit = move |event: GraphEvent| match event {
		GraphEvent::NodeActivated(node) => {
			debug!("activated {}", node.id);
			if let Some(cb) = on_node_activated {
				cb.run(node);
			}
		}
		GraphEvent::NodeDoubleActivated(node) => {
			if let Some(cb) = on_node_double_activated {
				cb.run(node);
			}
		}
	};

	Effect::new(move |_| {
		let payload = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();

		let mounted = runtime.try_with_value(|rt| rt.session.is_some()).unwrap_or(false);
		if !mounted {
			let size = match web_sys::window() {
				Some(window) if fullscreen => window_size(&window),
				_ => (
					width.unwrap_or_else(|| {
						canvas
							.parent_element()
							.map(|p| p.client_width() as f64)
							.unwrap_or(800.0)
					}),
					height.unwrap_or_else(|| {
						canvas
							.parent_element()
							.map(|p| p.client_height() as f64)
							.unwrap_or(600.0)
					}),
				),
			};
			match init(runtime, canvas, size, fullscreen) {
				Ok(p) => prefs.set(p),
				Err(e) => {
					warn!("graph canvas unavailable: {e}");
					init_error.set(Some(e.to_string()));
					return;
				}
			}
		}

		// the previous simulation is stopped inside load
		panel.set(None);
		if let Some(payload) = payload {
			with_session(runtime, |s| {
				s.load(&payload);
			});
		}
	});

	on_cleanup(move || {
		runtime.try_update_value(|rt| rt.teardown());
	});

	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		with_session(runtime, |s| {
			s.pointer_down(x, y, js_sys::Date::now());
		});
	};

	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		with_session(runtime, |s| s.pointer_move(x, y));
	};

	let on_mouseup = move |_: MouseEvent| {
		let now = js_sys::Date::now();
		if let Some(event) = with_session(runtime, |s| s.pointer_up(now)).flatten() {
			emit(event);
		}
	};

	let on_mouseleave = move |_: MouseEvent| {
		let now = js_sys::Date::now();
		if let Some(event) = with_session(runtime, |s| s.pointer_leave(now)).flatten() {
			emit(event);
		}
	};

	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		with_session(runtime, |s| s.wheel(x, y, ev.delta_y()));
	};

	let on_dblclick = move |ev: MouseEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		let now = js_sys::Date::now();
		if let Some((event, p)) = with_session(runtime, |s| s.double_click(x, y, now)).flatten() {
			emit(event);
			panel.set(Some(p));
		}
	};

	let on_contextmenu = move |ev: MouseEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		let now = js_sys::Date::now();
		if let Some(p) = with_session(runtime, |s| s.context_menu(x, y, now)).flatten() {
			panel.set(Some(p));
		}
	};

	let toggle_pin = move |_: MouseEvent| {
		let pinned = !prefs.get_untracked().globally_pinned;
		with_session(runtime, |s| s.set_globally_pinned(pinned));
		prefs.update(|p| p.globally_pinned = pinned);
	};

	let toggle_labels = move |_: MouseEvent| {
		let short = !prefs.get_untracked().short_labels;
		with_session(runtime, |s| s.set_short_labels(short));
		prefs.update(|p| p.short_labels = short);
	};

	let snapshot = move |_: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		if let Err(e) = export_snapshot(&canvas) {
			warn!("snapshot failed: {e}");
		}
	};

	let close = Callback::new(move |_: ()| panel.set(None));

	view! {
		<div class="tx-graph" style="position: relative;">
			<canvas
				node_ref=canvas_ref
				class="tx-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:dblclick=on_dblclick
				on:contextmenu=on_contextmenu
				style="display: block; cursor: grab;"
			/>
			<div class="graph-toolbar">
				<button on:click=move |_| {
					with_session(runtime, |s| s.reset());
				}>"Reset"</button>
				<button on:click=move |_| {
					with_session(runtime, |s| s.fit_to_view());
				}>"Fit"</button>
				<button on:click=move |_| {
					with_session(runtime, |s| s.recenter_on_focus());
				}>"Focus"</button>
				<button on:click=toggle_pin>
					{move || {
					if prefs.get().globally_pinned { "Unpin layout" } else { "Pin layout" }
				}}
				</button>
				<button on:click=toggle_labels>
					{move || {
					if prefs.get().short_labels { "Full labels" } else { "Short labels" }
				}}
				</button>
				<button on:click=snapshot>"Snapshot"</button>
			</div>
			{move || {
				init_error
					.get()
					.map(|msg| view! { <p class="graph-error">"Render failed: " {msg}</p> })
			}}
			{move || {
				panel
					.get()
					.map(|p| match p {
						Panel::Tags(node) => {
							view! {
								<TagPanel
									runtime=runtime
									node=node
									version=tags_version
									on_close=close
								/>
							}
								.into_any()
						}
						Panel::Inspect(node) => {
							view! { <InspectPanel node=node on_close=close /> }.into_any()
						}
					})
			}}
		</div>
	}
}
