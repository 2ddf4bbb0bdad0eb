//! The render boundary: plain data describing everything on the canvas.
//!
//! Renderers produce these values and the canvas painter in `render.rs`
//! draws them; nothing else touches the surface.

use std::rc::Rc;

use geo::{Coord, MultiLineString, MultiPolygon, Rect};

use super::scale::Rgb;
use super::types::CountyId;

pub const NO_DATA_COLOR: &str = "#d9d9d9";

#[derive(Clone, Debug, PartialEq)]
pub enum Fill {
	Scaled(Rgb),
	/// The county has no value for the active slice.
	NoData,
}

impl Fill {
	pub fn css(&self) -> String {
		match self {
			Fill::Scaled(rgb) => rgb.to_string(),
			Fill::NoData => NO_DATA_COLOR.to_string(),
		}
	}
}

#[derive(Clone, Debug)]
pub struct CountyShape {
	pub id: CountyId,
	pub name: String,
	/// Screen-space outline, shared with the projected boundary cache.
	pub outline: Rc<MultiPolygon<f64>>,
	pub bounds: Option<Rect<f64>>,
	/// `None` when the county layer is switched off.
	pub fill: Option<Fill>,
	pub active: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorderKind {
	County,
	State,
	Nation,
}

impl BorderKind {
	pub fn stroke(self) -> (&'static str, f64) {
		match self {
			BorderKind::County => ("#3d3d3d", 0.5),
			BorderKind::State | BorderKind::Nation => ("#000000", 1.0),
		}
	}
}

/// Screen-space border lines, stroked but never filled.
#[derive(Clone, Debug)]
pub struct BorderPath {
	pub kind: BorderKind,
	pub lines: Rc<MultiLineString<f64>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerFill {
	/// The airport appears in a flight record this period.
	Red,
	Grey,
}

impl MarkerFill {
	pub fn css(self) -> &'static str {
		match self {
			MarkerFill::Red => "red",
			MarkerFill::Grey => "grey",
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct AirportMarker {
	pub code: String,
	pub name: String,
	pub center: Coord<f64>,
	pub radius: f64,
	pub fill: MarkerFill,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlightDirection {
	Outgoing,
	Incoming,
}

impl FlightDirection {
	pub fn stroke(self) -> &'static str {
		match self {
			FlightDirection::Outgoing => "yellow",
			FlightDirection::Incoming => "orange",
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct FlightPath {
	pub direction: FlightDirection,
	pub neighbor: String,
	pub from: Coord<f64>,
	pub to: Coord<f64>,
	pub width: f64,
}

impl FlightPath {
	pub fn length(&self) -> f64 {
		let (dx, dy) = (self.to.x - self.from.x, self.to.y - self.from.y);
		(dx * dx + dy * dy).sqrt()
	}

	/// Dash offset of the stroke-reveal at `progress` in `[0, 1]`: the full
	/// length hides the line, zero shows all of it.
	pub fn dash_offset(&self, progress: f64) -> f64 {
		self.length() * (1.0 - progress.clamp(0.0, 1.0))
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct LegendLabel {
	pub x: f64,
	pub y: f64,
	pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GradientSwatch {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
	pub top: Rgb,
	pub bottom: Rgb,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceCircle {
	pub center: Coord<f64>,
	pub radius: f64,
}

/// Legend primitives, positioned relative to the legend origin.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Legend {
	pub swatch: Option<GradientSwatch>,
	pub circle: Option<ReferenceCircle>,
	pub labels: Vec<LegendLabel>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tooltip {
	pub x: f64,
	pub y: f64,
	/// First line is the heading.
	pub lines: Vec<String>,
}

#[cfg(test)]
impl Tooltip {
	pub fn text(&self) -> String {
		self.lines.join(" / ")
	}
}

#[derive(Clone, Debug)]
pub struct Scene {
	pub counties: Vec<CountyShape>,
	pub borders: Vec<BorderPath>,
	pub airports: Vec<AirportMarker>,
	pub flights: Vec<FlightPath>,
	pub legend: Legend,
	pub tooltip: Option<Tooltip>,
	pub panel_text: String,
	pub county_borders_visible: bool,
	pub airports_visible: bool,
}

impl Default for Scene {
	fn default() -> Self {
		Self {
			counties: Vec::new(),
			borders: Vec::new(),
			airports: Vec::new(),
			flights: Vec::new(),
			legend: Legend::default(),
			tooltip: None,
			panel_text: String::new(),
			county_borders_visible: true,
			airports_visible: true,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn flight_reveal_runs_from_hidden_to_drawn() {
		let flight = FlightPath {
			direction: FlightDirection::Outgoing,
			neighbor: "LAX".into(),
			from: Coord { x: 0.0, y: 0.0 },
			to: Coord { x: 30.0, y: 40.0 },
			width: 1.0,
		};
		assert_eq!(flight.length(), 50.0);
		assert_eq!(flight.dash_offset(0.0), 50.0);
		assert_eq!(flight.dash_offset(0.5), 25.0);
		assert_eq!(flight.dash_offset(1.0), 0.0);
		// progress outside [0, 1] is clamped
		assert_eq!(flight.dash_offset(-1.0), 50.0);
		assert_eq!(flight.dash_offset(3.0), 0.0);
	}
}
