use std::f64::consts::PI;

use geo::{MultiLineString, MultiPolygon};
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::scene::{BorderKind, Legend, Scene};
use super::state::DashboardController;

const ACTIVE_STROKE: &str = "#ffffff";

pub fn render(controller: &DashboardController, ctx: &CanvasRenderingContext2d) {
	let scene = &controller.scene;
	ctx.clear_rect(0.0, 0.0, controller.width, controller.height);
	draw_counties(scene, ctx);
	draw_borders(scene, ctx);
	if scene.airports_visible {
		draw_flights(scene, controller.flight_progress(), ctx);
		draw_airports(scene, ctx);
	}
	ctx.save();
	let _ = ctx.translate(controller.legend_origin.0, controller.legend_origin.1);
	draw_legend(&scene.legend, ctx);
	ctx.restore();
}

fn trace(shape: &MultiPolygon<f64>, ctx: &CanvasRenderingContext2d) {
	ctx.begin_path();
	for polygon in shape {
		for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
			let mut points = ring.coords();
			let Some(first) = points.next() else {
				continue;
			};
			ctx.move_to(first.x, first.y);
			for p in points {
				ctx.line_to(p.x, p.y);
			}
			ctx.close_path();
		}
	}
}

fn trace_lines(lines: &MultiLineString<f64>, ctx: &CanvasRenderingContext2d) {
	ctx.begin_path();
	for line in lines {
		let mut points = line.coords();
		let Some(first) = points.next() else {
			continue;
		};
		ctx.move_to(first.x, first.y);
		for p in points {
			ctx.line_to(p.x, p.y);
		}
	}
}

fn draw_counties(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	for county in &scene.counties {
		let Some(fill) = &county.fill else {
			continue;
		};
		trace(&county.outline, ctx);
		ctx.set_fill_style_str(&fill.css());
		ctx.fill();
	}
	// active outline goes on top of every neighbour's fill
	if let Some(county) = scene.counties.iter().find(|c| c.active && c.fill.is_some()) {
		trace(&county.outline, ctx);
		ctx.set_stroke_style_str(ACTIVE_STROKE);
		ctx.set_line_width(2.0);
		ctx.stroke();
	}
}

fn draw_borders(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	for border in &scene.borders {
		if border.kind == BorderKind::County && !scene.county_borders_visible {
			continue;
		}
		let (color, width) = border.kind.stroke();
		trace_lines(&border.lines, ctx);
		ctx.set_stroke_style_str(color);
		ctx.set_line_width(width);
		ctx.stroke();
	}
}

fn draw_flights(scene: &Scene, progress: f64, ctx: &CanvasRenderingContext2d) {
	for flight in &scene.flights {
		let length = flight.length();
		ctx.set_stroke_style_str(flight.direction.stroke());
		ctx.set_line_width(flight.width);
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(length),
			&JsValue::from_f64(length),
		));
		ctx.set_line_dash_offset(flight.dash_offset(progress));
		ctx.begin_path();
		ctx.move_to(flight.from.x, flight.from.y);
		ctx.line_to(flight.to.x, flight.to.y);
		ctx.stroke();
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
	ctx.set_line_dash_offset(0.0);
}

fn draw_airports(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	for marker in &scene.airports {
		ctx.begin_path();
		let _ = ctx.arc(marker.center.x, marker.center.y, marker.radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(marker.fill.css());
		ctx.fill();
	}
}

fn draw_legend(legend: &Legend, ctx: &CanvasRenderingContext2d) {
	if let Some(swatch) = &legend.swatch {
		let gradient = ctx.create_linear_gradient(0.0, swatch.y, 0.0, swatch.y + swatch.height);
		let _ = gradient.add_color_stop(0.0, &swatch.top.to_string());
		let _ = gradient.add_color_stop(1.0, &swatch.bottom.to_string());
		#[allow(deprecated)]
		ctx.set_fill_style(&gradient);
		ctx.fill_rect(swatch.x, swatch.y, swatch.width, swatch.height);
	}

	if let Some(circle) = &legend.circle {
		ctx.begin_path();
		let _ = ctx.arc(circle.center.x, circle.center.y, circle.radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str("red");
		ctx.fill();
	}

	ctx.set_fill_style_str("black");
	ctx.set_font("12px sans-serif");
	for label in &legend.labels {
		let _ = ctx.fill_text(&label.text, label.x, label.y);
	}
}
