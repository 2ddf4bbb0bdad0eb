use std::collections::BTreeMap;

use geo::Coord;
use log::debug;

use super::projection::Projection;
use super::scale::{ScaleSet, rescale_edge_weight};
use super::scene::{AirportMarker, FlightDirection, FlightPath, MarkerFill, Tooltip};
use super::slice::AirportSlices;
use super::types::{Airport, CentralityMetric, MetricValues};

/// Radius of an airport with no flight records in the period.
pub const IDLE_RADIUS: f64 = 0.5;
/// Smallest pointer target, in pixels, regardless of drawn radius.
pub const HIT_RADIUS: f64 = 3.0;

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectedAirport {
	pub name: String,
	pub center: Coord<f64>,
}

/// Screen positions for every airport the projection can place. Airports
/// outside it (and flights to them) are never drawn.
pub fn project_airports(lookup: &BTreeMap<String, Airport>, project: &Projection) -> BTreeMap<String, ProjectedAirport> {
	lookup
		.iter()
		.filter_map(|(code, airport)| {
			let (x, y) = airport.coords;
			let Some(center) = project(Coord { x, y }) else {
				debug!("airport {code} is outside the projection");
				return None;
			};
			Some((
				code.clone(),
				ProjectedAirport {
					name: airport.name.clone(),
					center,
				},
			))
		})
		.collect()
}

pub fn airport_radius(code: &str, slices: &AirportSlices<'_>, metric: CentralityMetric, scales: &ScaleSet) -> f64 {
	if !slices.has_flights(code) {
		return IDLE_RADIUS;
	}
	let value = slices
		.centrality_of(code)
		.and_then(|m| m.get(&metric))
		.copied()
		.unwrap_or(0.0);
	scales.radius.apply(value).max(0.0)
}

pub fn render_airports(
	airports: &BTreeMap<String, ProjectedAirport>,
	slices: &AirportSlices<'_>,
	metric: CentralityMetric,
	scales: &ScaleSet,
) -> Vec<AirportMarker> {
	airports
		.iter()
		.map(|(code, airport)| AirportMarker {
			code: code.clone(),
			name: airport.name.clone(),
			center: airport.center,
			radius: airport_radius(code, slices, metric, scales),
			fill: if slices.has_flights(code) { MarkerFill::Red } else { MarkerFill::Grey },
		})
		.collect()
}

/// Topmost marker under a screen point.
pub fn airport_at(markers: &[AirportMarker], at: Coord<f64>) -> Option<&AirportMarker> {
	markers.iter().rev().find(|m| {
		let (dx, dy) = (m.center.x - at.x, m.center.y - at.y);
		(dx * dx + dy * dy).sqrt() <= m.radius.max(HIT_RADIUS)
	})
}

fn directed_paths(
	origin: Coord<f64>,
	neighbors: &BTreeMap<String, f64>,
	airports: &BTreeMap<String, ProjectedAirport>,
	direction: FlightDirection,
) -> Vec<FlightPath> {
	let valid: Vec<(&String, f64, Coord<f64>)> = neighbors
		.iter()
		.filter_map(|(code, &weight)| airports.get(code).map(|a| (code, weight, a.center)))
		.collect();
	let widths = rescale_edge_weight(valid.iter().map(|&(_, weight, _)| weight));
	valid
		.into_iter()
		.map(|(code, weight, center)| {
			let (from, to) = match direction {
				FlightDirection::Outgoing => (origin, center),
				FlightDirection::Incoming => (center, origin),
			};
			FlightPath {
				direction,
				neighbor: code.clone(),
				from,
				to,
				width: widths.apply(weight),
			}
		})
		.collect()
}

/// Outgoing lines first, then incoming, each with its own width scale.
pub fn flight_paths(
	code: &str,
	airports: &BTreeMap<String, ProjectedAirport>,
	slices: &AirportSlices<'_>,
) -> Vec<FlightPath> {
	let Some(origin) = airports.get(code).map(|a| a.center) else {
		return Vec::new();
	};
	let mut paths = directed_paths(origin, slices.outgoing(code), airports, FlightDirection::Outgoing);
	paths.extend(directed_paths(origin, slices.incoming(code), airports, FlightDirection::Incoming));
	paths
}

pub fn airport_tooltip(marker: &AirportMarker, centrality: Option<&MetricValues>, metrics: &[CentralityMetric]) -> Tooltip {
	let mut lines = vec![marker.name.clone()];
	match centrality {
		Some(values) => lines.extend(
			metrics
				.iter()
				.filter_map(|m| values.get(m).map(|v| format!("{m}: {v:.2}"))),
		),
		None => lines.push("No centrality data".to_string()),
	}
	Tooltip {
		x: marker.center.x,
		y: marker.center.y - marker.radius - 10.0,
		lines,
	}
}

/// Which airport's flights are on screen, and how far their reveal has run.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum FlightHover {
	#[default]
	Idle,
	Airport { code: String, elapsed_ms: f64 },
}

impl FlightHover {
	pub fn code(&self) -> Option<&str> {
		match self {
			FlightHover::Idle => None,
			FlightHover::Airport { code, .. } => Some(code),
		}
	}

	/// Returns false when already hovering `code`.
	pub fn enter(&mut self, code: &str) -> bool {
		if self.code() == Some(code) {
			return false;
		}
		*self = FlightHover::Airport {
			code: code.to_string(),
			elapsed_ms: 0.0,
		};
		true
	}

	pub fn leave(&mut self) {
		*self = FlightHover::Idle;
	}

	pub fn tick(&mut self, dt_ms: f64) {
		if let FlightHover::Airport { elapsed_ms, .. } = self {
			*elapsed_ms += dt_ms;
		}
	}

	/// Linear reveal progress in `[0, 1]`.
	pub fn progress(&self, duration_ms: f64) -> f64 {
		match self {
			FlightHover::Idle => 0.0,
			FlightHover::Airport { elapsed_ms, .. } if duration_ms > 0.0 => (elapsed_ms / duration_ms).min(1.0),
			FlightHover::Airport { .. } => 1.0,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::dashboard::projection::AlbersUsa;
	use crate::components::dashboard::slice::SliceResolver;
	use crate::components::dashboard::state::tests::fixture;
	use crate::components::dashboard::types::Period;

	fn scales_for(slices: &AirportSlices<'_>, metric: CentralityMetric) -> ScaleSet {
		let mut scales = ScaleSet::default();
		scales.rescale_radius(slices.centrality.values().filter_map(|m| m.get(&metric).copied()));
		scales
	}

	#[test]
	fn airports_without_flights_are_small_and_grey() {
		let bundle = fixture();
		let projection = AlbersUsa::new(1300.0, (487.5, 305.0)).unwrap().into_projection();
		let airports = project_airports(&bundle.airports, projection.as_ref());
		let slices = SliceResolver::new(&bundle).resolve_airport_slices(Period::new(2, 20));
		let metric = CentralityMetric::HarmonicCentrality;
		let markers = render_airports(&airports, &slices, metric, &scales_for(&slices, metric));

		let jfk = markers.iter().find(|m| m.code == "JFK").unwrap();
		assert_eq!(jfk.radius, IDLE_RADIUS);
		assert_eq!(jfk.fill, MarkerFill::Grey);
		assert!(flight_paths("JFK", &airports, &slices).is_empty());

		let ord = markers.iter().find(|m| m.code == "ORD").unwrap();
		assert_eq!(ord.fill, MarkerFill::Red);
		assert!(ord.radius > IDLE_RADIUS);
	}

	#[test]
	fn unprojectable_airports_are_skipped() {
		let bundle = fixture();
		let projection = AlbersUsa::new(1300.0, (487.5, 305.0)).unwrap().into_projection();
		let airports = project_airports(&bundle.airports, projection.as_ref());
		assert!(!airports.contains_key("LHR"));
		assert!(airports.contains_key("ORD"));
	}

	#[test]
	fn missing_centrality_falls_back_to_zero_and_clamps() {
		let bundle = fixture();
		let slices = SliceResolver::new(&bundle).resolve_airport_slices(Period::new(3, 20));
		let metric = CentralityMetric::HarmonicCentrality;
		let scales = scales_for(&slices, metric);
		// DEN flies this period but has no centrality row; 0 sits below the
		// domain so the scale goes negative and is clamped
		assert!(scales.radius.apply(0.0) < 0.0);
		assert_eq!(airport_radius("DEN", &slices, metric, &scales), 0.0);
	}

	#[test]
	fn flight_paths_split_by_direction_and_drop_unknown_neighbors() {
		let bundle = fixture();
		let projection = AlbersUsa::new(1300.0, (487.5, 305.0)).unwrap().into_projection();
		let airports = project_airports(&bundle.airports, projection.as_ref());
		let slices = SliceResolver::new(&bundle).resolve_airport_slices(Period::new(3, 20));

		let paths = flight_paths("ORD", &airports, &slices);
		let outgoing: Vec<_> = paths.iter().filter(|p| p.direction == FlightDirection::Outgoing).collect();
		let incoming: Vec<_> = paths.iter().filter(|p| p.direction == FlightDirection::Incoming).collect();
		// YYZ and LHR are not drawable
		assert_eq!(outgoing.iter().map(|p| p.neighbor.as_str()).collect::<Vec<_>>(), ["DEN", "LAX"]);
		assert_eq!(incoming.len(), 1);

		// widths are scaled per direction: the heaviest edge in each is widest
		let lax = outgoing.iter().find(|p| p.neighbor == "LAX").unwrap();
		assert!((lax.width - 5.0).abs() < 1e-9);
		assert!((incoming[0].width - 5.0).abs() < 1e-9);
		assert_eq!(incoming[0].to, airports["ORD"].center);
	}

	#[test]
	fn hover_enters_once_and_resets_on_leave() {
		let mut hover = FlightHover::default();
		assert!(hover.enter("ORD"));
		hover.tick(1000.0);
		assert!(!hover.enter("ORD"));
		assert_eq!(hover.progress(2000.0), 0.5);
		assert!(hover.enter("LAX"));
		assert_eq!(hover.progress(2000.0), 0.0);
		hover.tick(5000.0);
		assert_eq!(hover.progress(2000.0), 1.0);
		hover.leave();
		assert_eq!(hover, FlightHover::Idle);
		assert_eq!(hover.progress(2000.0), 0.0);
	}
}
