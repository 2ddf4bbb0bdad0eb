use std::rc::Rc;

use geo::{BoundingRect, Contains, Coord, Intersects, MultiPolygon, Point, Rect};
use log::debug;

use super::projection::{Projection, project_multipolygon};
use super::scale::ScaleSet;
use super::scene::{CountyShape, Fill, Tooltip};
use super::slice::CountySlice;
use super::types::{CentralityMetric, ColorMode, CountyFeature, CountyId, CountyValues};

/// A county outline already in screen space. Projected once at startup.
#[derive(Clone, Debug)]
pub struct ProjectedCounty {
	pub id: CountyId,
	pub name: String,
	pub outline: Rc<MultiPolygon<f64>>,
	pub bounds: Option<Rect<f64>>,
}

pub fn project_counties(features: &[CountyFeature], project: &Projection) -> Vec<ProjectedCounty> {
	features
		.iter()
		.filter_map(|feature| {
			let outline = project_multipolygon(&feature.geometry, project);
			if outline.0.is_empty() {
				debug!("county {} ({}) is outside the projection", feature.id, feature.name);
				return None;
			}
			Some(ProjectedCounty {
				id: feature.id,
				name: feature.name.clone(),
				bounds: outline.bounding_rect(),
				outline: Rc::new(outline),
			})
		})
		.collect()
}

/// The single highlighted county. Clicking it again, or clicking empty map
/// space, clears it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CountySelection {
	active: Option<CountyId>,
}

impl CountySelection {
	pub fn active(&self) -> Option<CountyId> {
		self.active
	}

	/// Returns whether `county` is active afterwards.
	pub fn toggle(&mut self, county: CountyId) -> bool {
		if self.active == Some(county) {
			self.active = None;
			false
		} else {
			self.active = Some(county);
			true
		}
	}

	pub fn clear(&mut self) {
		self.active = None;
	}
}

pub fn render_counties(
	counties: &[ProjectedCounty],
	slice: &CountySlice<'_>,
	metric: CentralityMetric,
	scales: &ScaleSet,
	mode: ColorMode,
	selection: &CountySelection,
) -> Vec<CountyShape> {
	counties
		.iter()
		.map(|county| {
			let fill = match mode {
				ColorMode::None => None,
				_ => Some(match slice.value(county.id, metric) {
					Some(value) if value.is_finite() => Fill::Scaled(scales.color.apply(value)),
					_ => Fill::NoData,
				}),
			};
			CountyShape {
				id: county.id,
				name: county.name.clone(),
				outline: county.outline.clone(),
				bounds: county.bounds,
				fill,
				active: selection.active() == Some(county.id),
			}
		})
		.collect()
}

/// Topmost county under a screen point.
pub fn county_at(counties: &[CountyShape], at: Coord<f64>) -> Option<&CountyShape> {
	let point = Point::from(at);
	counties.iter().rev().find(|county| {
		county.bounds.is_some_and(|b| b.intersects(&point))
			&& county.outline.contains(&point)
	})
}

pub fn format_value(value: f64) -> String {
	format!("{value}")
}

pub fn county_tooltip(county: &CountyShape, counts: &CountyValues, at: Coord<f64>) -> Tooltip {
	let count = counts
		.get(&county.id)
		.map(|&v| format_value(v))
		.unwrap_or_else(|| "No data".to_string());
	Tooltip {
		x: at.x,
		y: at.y,
		lines: vec![format!("County: {}", county.name), format!("Case Count: {count}")],
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::dashboard::scale::CASE_COLOR_LOW;
	use crate::components::dashboard::slice::SliceResolver;
	use crate::components::dashboard::state::tests::{fixture, projected_fixture_counties};
	use crate::components::dashboard::types::Period;

	#[test]
	fn fills_come_from_the_color_scale() {
		let bundle = fixture();
		let counties = projected_fixture_counties(&bundle);
		let slice = SliceResolver::new(&bundle).resolve_county_slice(ColorMode::CaseData, Period::new(3, 20));
		let mut scales = ScaleSet::default();
		scales.rescale_color(slice.values(CentralityMetric::HarmonicCentrality));

		let shapes = render_counties(
			&counties,
			&slice,
			CentralityMetric::HarmonicCentrality,
			&scales,
			ColorMode::CaseData,
			&CountySelection::default(),
		);
		let by_name = |name: &str| shapes.iter().find(|s| s.name == name).unwrap();
		assert_eq!(by_name("X").fill, Some(Fill::Scaled(scales.color.apply(150.0))));
		assert_eq!(by_name("Z").fill, Some(Fill::Scaled(CASE_COLOR_LOW)));
		// no recorded cases is distinct from zero cases
		assert_eq!(by_name("W").fill, Some(Fill::NoData));
	}

	#[test]
	fn color_mode_none_leaves_counties_unfilled() {
		let bundle = fixture();
		let counties = projected_fixture_counties(&bundle);
		let shapes = render_counties(
			&counties,
			&CountySlice::Empty,
			CentralityMetric::HarmonicCentrality,
			&ScaleSet::default(),
			ColorMode::None,
			&CountySelection::default(),
		);
		assert!(shapes.iter().all(|s| s.fill.is_none()));
	}

	#[test]
	fn selection_is_a_strict_toggle() {
		let mut selection = CountySelection::default();
		assert!(selection.toggle(1));
		assert!(selection.toggle(2));
		assert_eq!(selection.active(), Some(2));
		assert!(!selection.toggle(2));
		assert_eq!(selection.active(), None);
	}

	#[test]
	fn tooltip_shows_raw_value_or_no_data() {
		let bundle = fixture();
		let counties = projected_fixture_counties(&bundle);
		let shapes = render_counties(
			&counties,
			&CountySlice::Empty,
			CentralityMetric::HarmonicCentrality,
			&ScaleSet::default(),
			ColorMode::None,
			&CountySelection::default(),
		);
		let counts = &bundle.cases.per_100k[&Period::new(3, 20)];
		let x = shapes.iter().find(|s| s.name == "X").unwrap();
		let w = shapes.iter().find(|s| s.name == "W").unwrap();
		let origin = Coord { x: 0.0, y: 0.0 };
		assert_eq!(county_tooltip(x, counts, origin).text(), "County: X / Case Count: 150");
		assert_eq!(county_tooltip(w, counts, origin).text(), "County: W / Case Count: No data");
	}

	#[test]
	fn hit_test_finds_county_under_point() {
		let bundle = fixture();
		let counties = projected_fixture_counties(&bundle);
		let shapes = render_counties(
			&counties,
			&CountySlice::Empty,
			CentralityMetric::HarmonicCentrality,
			&ScaleSet::default(),
			ColorMode::None,
			&CountySelection::default(),
		);
		let hit = county_at(&shapes, Coord { x: 487.5, y: 305.0 }).map(|c| c.name.as_str());
		assert_eq!(hit, Some("X"));
		assert!(county_at(&shapes, Coord { x: 5.0, y: 5.0 }).is_none());
	}
}
