use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use leptos::prelude::*;
use log::{error, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Event, HtmlCanvasElement, MouseEvent};

use super::config::DashboardConfig;
use super::projection::AlbersUsa;
use super::render;
use super::scene::Tooltip;
use super::state::{DashboardController, DashboardEvent};
use super::types::{ColorMode, DatasetBundle};

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok()??.dyn_into().ok()
}

fn canvas_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top()))
}

/// The map, the flight network overlay and the selection controls.
#[component]
pub fn DashboardCanvas(bundle: Arc<DatasetBundle>, #[prop(optional)] config: DashboardConfig) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let controller: Rc<RefCell<Option<DashboardController>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
	let (tooltip, set_tooltip) = signal(None::<Tooltip>);
	let (panel_text, set_panel_text) = signal(String::new());
	let (failure, set_failure) = signal(None::<String>);

	let (controller_init, animate_init, bundle_init, config_init) =
		(controller.clone(), animate.clone(), bundle.clone(), config.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		canvas.set_width(config_init.width as u32);
		canvas.set_height(config_init.height as u32);
		let Some(ctx) = context_2d(&canvas) else {
			error!("canvas has no 2d context");
			set_failure.set(Some("Canvas rendering is unavailable".into()));
			return;
		};

		let started = AlbersUsa::new(config_init.projection_scale, config_init.projection_translate)
			.map(AlbersUsa::into_projection)
			.and_then(|projection| DashboardController::new(bundle_init.clone(), &config_init, projection.as_ref()));
		match started {
			Ok(c) => *controller_init.borrow_mut() = Some(c),
			Err(err) => {
				error!("dashboard failed to start: {err}");
				set_failure.set(Some(err.to_string()));
				return;
			}
		}

		let (controller_anim, animate_inner) = (controller_init.clone(), animate_init.clone());
		let mut last_frame: Option<f64> = None;
		*animate_init.borrow_mut() = Some(Closure::new(move |now: f64| {
			if let Some(ref mut c) = *controller_anim.borrow_mut() {
				c.tick(last_frame.map_or(0.0, |last| now - last));
				render::render(c, &ctx);
			}
			last_frame = Some(now);
			if let (Some(window), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let (Some(window), Some(cb)) = (web_sys::window(), animate_init.borrow().as_ref()) {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let dispatch: Rc<dyn Fn(DashboardEvent)> = {
		let controller = controller.clone();
		Rc::new(move |event: DashboardEvent| {
			let update = controller.borrow_mut().as_mut().map(|c| {
				c.handle(event);
				(c.scene.tooltip.clone(), c.scene.panel_text.clone())
			});
			if let Some((tip, text)) = update {
				set_tooltip.set(tip);
				set_panel_text.set(text);
			}
		})
	};

	let d = dispatch.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some((x, y)) = canvas_point(canvas_ref, &ev) {
			d(DashboardEvent::PointerMoved { x, y });
		}
	};
	let d = dispatch.clone();
	let on_mouseleave = move |_: MouseEvent| d(DashboardEvent::PointerLeft);
	let d = dispatch.clone();
	let on_click = move |ev: MouseEvent| {
		if let Some((x, y)) = canvas_point(canvas_ref, &ev) {
			d(DashboardEvent::Clicked { x, y });
		}
	};

	let d = dispatch.clone();
	let on_period = move |ev: Event| d(DashboardEvent::PeriodSelected(event_target_value(&ev)));
	let d = dispatch.clone();
	let on_metric = move |ev: Event| d(DashboardEvent::CentralitySelected(event_target_value(&ev)));
	let d = dispatch.clone();
	let on_color_mode = move |ev: Event| {
		let label = event_target_value(&ev);
		match ColorMode::from_label(&label) {
			Some(mode) => d(DashboardEvent::ColorModeSelected(mode)),
			None => warn!("unknown color mode `{label}`"),
		}
	};
	let d = dispatch;
	let on_airports = move |ev: Event| d(DashboardEvent::AirportLayerToggled(event_target_checked(&ev)));

	let period_options = bundle
		.periods
		.iter()
		.map(|p| view! { <option value=p.to_string()>{p.to_string()}</option> })
		.collect_view();
	let metric_options = bundle
		.metrics
		.iter()
		.map(|m| {
			view! {
				<option value=m.label() selected={*m == config.default_metric}>
					{m.label()}
				</option>
			}
		})
		.collect_view();
	let color_mode_options = ColorMode::ALL
		.iter()
		.map(|m| {
			view! {
				<option value=m.label() selected={*m == config.default_color_mode}>
					{m.label()}
				</option>
			}
		})
		.collect_view();

	view! {
		<div class="dashboard">
			<div class="dashboard-controls">
				<label>"Month " <select on:change=on_period>{period_options}</select></label>
				<label>"Centrality " <select on:change=on_metric>{metric_options}</select></label>
				<label>"County color " <select on:change=on_color_mode>{color_mode_options}</select></label>
				<label>
					<input type="checkbox" checked=true on:change=on_airports />
					" Airports"
				</label>
			</div>
			{move || failure.get().map(|msg| view! { <p class="dashboard-error">{msg}</p> })}
			<div class="dashboard-map" style="position: relative;">
				<canvas
					node_ref=canvas_ref
					class="dashboard-canvas"
					on:mousemove=on_mousemove
					on:mouseleave=on_mouseleave
					on:click=on_click
					style="display: block;"
				/>
				{move || {
					tooltip
						.get()
						.map(|tip| {
							view! {
								<div
									class="dashboard-tooltip"
									style=format!(
										"position: absolute; left: {}px; top: {}px; pointer-events: none;",
										tip.x,
										tip.y,
									)
								>
									{tip.lines.into_iter().map(|line| view! { <div>{line}</div> }).collect_view()}
								</div>
							}
						})
				}}
			</div>
			<div class="county-panel">{move || panel_text.get()}</div>
		</div>
	}
}
