use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use geo::Coord;
use log::{info, warn};

use super::choropleth::{self, CountySelection, ProjectedCounty};
use super::config::DashboardConfig;
use super::error::DashboardError;
use super::legend;
use super::network::{self, FlightHover, ProjectedAirport};
use super::projection::{Projection, project_lines};
use super::scale::ScaleSet;
use super::scene::{AirportMarker, BorderKind, BorderPath, CountyShape, Scene};
use super::slice::SliceResolver;
use super::types::{CentralityMetric, ColorMode, DatasetBundle, Period};

/// The shared selection every layer is drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DashboardState {
	pub period: Period,
	pub metric: CentralityMetric,
	pub color_mode: ColorMode,
}

/// Everything the controls and the canvas can ask of the dashboard.
#[derive(Clone, Debug, PartialEq)]
pub enum DashboardEvent {
	PeriodSelected(String),
	CentralitySelected(String),
	ColorModeSelected(ColorMode),
	AirportLayerToggled(bool),
	PointerMoved { x: f64, y: f64 },
	PointerLeft,
	Clicked { x: f64, y: f64 },
}

/// Sole owner and mutator of [`DashboardState`] and the [`Scene`].
pub struct DashboardController {
	bundle: Arc<DatasetBundle>,
	state: DashboardState,
	counties: Vec<ProjectedCounty>,
	airports: BTreeMap<String, ProjectedAirport>,
	selection: CountySelection,
	pub hover: FlightHover,
	pub scene: Scene,
	pub width: f64,
	pub height: f64,
	pub legend_origin: (f64, f64),
	reveal_ms: f64,
}

impl DashboardController {
	pub fn new(bundle: Arc<DatasetBundle>, config: &DashboardConfig, project: &Projection) -> Result<Self, DashboardError> {
		let period = *bundle
			.periods
			.first()
			.ok_or_else(|| DashboardError::MissingSlice("period list".into()))?;
		let metric = if bundle.has_metric(config.default_metric) {
			config.default_metric
		} else {
			*bundle
				.metrics
				.first()
				.ok_or_else(|| DashboardError::MissingSlice("centrality metrics".into()))?
		};

		let counties = choropleth::project_counties(&bundle.boundaries.counties, project);
		let airports = network::project_airports(&bundle.airports, project);

		let boundaries = &bundle.boundaries;
		let borders: Vec<BorderPath> = [
			(BorderKind::County, &boundaries.county_mesh),
			(BorderKind::State, &boundaries.state_mesh),
			(BorderKind::Nation, &boundaries.nation),
		]
		.into_iter()
		.map(|(kind, lines)| BorderPath {
			kind,
			lines: Rc::new(project_lines(lines, project)),
		})
		.collect();

		info!(
			"dashboard ready: {} periods, {} counties, {} airports",
			bundle.periods.len(),
			counties.len(),
			airports.len()
		);

		let mut controller = Self {
			bundle,
			state: DashboardState {
				period,
				metric,
				color_mode: config.default_color_mode,
			},
			counties,
			airports,
			selection: CountySelection::default(),
			hover: FlightHover::default(),
			scene: Scene {
				borders,
				..Scene::default()
			},
			width: config.width,
			height: config.height,
			legend_origin: config.legend_origin,
			reveal_ms: config.flight_reveal_ms,
		};
		controller.render();
		Ok(controller)
	}

	#[cfg(test)]
	pub fn state(&self) -> &DashboardState {
		&self.state
	}

	/// Full pass: resolve slices, re-domain scales, then counties, airports
	/// and flights, and the legend last since it reads the final domains.
	fn render(&mut self) {
		let bundle = self.bundle.clone();
		let DashboardState { period, metric, color_mode } = self.state;
		let resolver = SliceResolver::new(&bundle);
		let county_slice = resolver.resolve_county_slice(color_mode, period);
		let airport_slices = resolver.resolve_airport_slices(period);

		let mut scales = ScaleSet::default();
		scales.rescale_color(county_slice.values(metric));
		scales.rescale_radius(airport_slices.centrality.values().filter_map(|m| m.get(&metric).copied()));

		self.scene.counties = choropleth::render_counties(
			&self.counties,
			&county_slice,
			metric,
			&scales,
			color_mode,
			&self.selection,
		);
		self.scene.county_borders_visible = color_mode != ColorMode::None;

		self.scene.airports = network::render_airports(&self.airports, &airport_slices, metric, &scales);
		self.scene.flights = match self.hover.code() {
			Some(code) => network::flight_paths(code, &self.airports, &airport_slices),
			None => Vec::new(),
		};

		self.scene.legend = legend::render_legend(&scales, color_mode, metric, airport_slices.max_centrality(metric));
	}

	pub fn on_period_change(&mut self, label: &str) -> Result<(), DashboardError> {
		let period: Period = label.parse()?;
		if !self.bundle.has_period(period) {
			return Err(DashboardError::InvalidSelection(format!("period `{label}` is not available")));
		}
		info!("period -> {period}");
		self.state.period = period;
		self.render();
		Ok(())
	}

	pub fn on_centrality_change(&mut self, label: &str) -> Result<(), DashboardError> {
		let metric = CentralityMetric::from_label(label)
			.filter(|m| self.bundle.has_metric(*m))
			.ok_or_else(|| DashboardError::InvalidSelection(format!("centrality metric `{label}`")))?;
		info!("centrality -> {metric}");
		self.state.metric = metric;
		self.render();
		Ok(())
	}

	/// Switching to [`ColorMode::None`] removes the county layer, so any county
	/// selection goes with it.
	pub fn on_color_mode_change(&mut self, mode: ColorMode) {
		info!("color mode -> {}", mode.label());
		if mode == ColorMode::None && self.selection.active().is_some() {
			self.selection.clear();
			self.scene.panel_text.clear();
		}
		self.state.color_mode = mode;
		self.render();
	}

	/// Show or hide the airport layer without a render pass.
	pub fn on_airport_layer_toggle(&mut self, visible: bool) {
		self.scene.airports_visible = visible;
		if !visible {
			self.clear_flights();
			self.scene.tooltip = None;
		}
	}

	fn clear_flights(&mut self) {
		self.hover.leave();
		self.scene.flights.clear();
	}

	fn hovered_airport(&self, at: Coord<f64>) -> Option<&AirportMarker> {
		self.scene
			.airports_visible
			.then(|| network::airport_at(&self.scene.airports, at))
			.flatten()
	}

	fn hovered_county(&self, at: Coord<f64>) -> Option<&CountyShape> {
		(self.state.color_mode != ColorMode::None)
			.then(|| choropleth::county_at(&self.scene.counties, at))
			.flatten()
	}

	pub fn on_pointer_move(&mut self, at: Coord<f64>) {
		let bundle = self.bundle.clone();
		let resolver = SliceResolver::new(&bundle);
		let DashboardState { period, color_mode, .. } = self.state;

		if let Some(marker) = self.hovered_airport(at).cloned() {
			let slices = resolver.resolve_airport_slices(period);
			if self.hover.enter(&marker.code) {
				self.scene.flights = network::flight_paths(&marker.code, &self.airports, &slices);
			}
			self.scene.tooltip = Some(network::airport_tooltip(
				&marker,
				slices.centrality_of(&marker.code),
				&bundle.metrics,
			));
			return;
		}

		if self.hover.code().is_some() {
			self.clear_flights();
		}
		self.scene.tooltip = self.hovered_county(at).map(|county| {
			choropleth::county_tooltip(county, resolver.resolve_case_counts(color_mode, period), at)
		});
	}

	pub fn on_pointer_leave(&mut self) {
		self.clear_flights();
		self.scene.tooltip = None;
	}

	pub fn on_click(&mut self, at: Coord<f64>) {
		if let Some(marker) = self.hovered_airport(at) {
			self.scene.panel_text = marker.name.clone();
			return;
		}
		match self.hovered_county(at).map(|c| (c.id, c.name.clone())) {
			Some((id, name)) => {
				self.scene.panel_text = if self.selection.toggle(id) { name } else { String::new() };
			}
			None => {
				self.selection.clear();
				self.scene.panel_text.clear();
			}
		}
		let active = self.selection.active();
		for county in &mut self.scene.counties {
			county.active = active == Some(county.id);
		}
	}

	/// Advance the flight reveal animation.
	pub fn tick(&mut self, dt_ms: f64) {
		self.hover.tick(dt_ms);
	}

	pub fn flight_progress(&self) -> f64 {
		self.hover.progress(self.reveal_ms)
	}

	/// Apply one UI event. Invalid selections leave the state untouched.
	pub fn handle(&mut self, event: DashboardEvent) {
		let result = match event {
			DashboardEvent::PeriodSelected(label) => self.on_period_change(&label),
			DashboardEvent::CentralitySelected(label) => self.on_centrality_change(&label),
			DashboardEvent::ColorModeSelected(mode) => {
				self.on_color_mode_change(mode);
				Ok(())
			}
			DashboardEvent::AirportLayerToggled(visible) => {
				self.on_airport_layer_toggle(visible);
				Ok(())
			}
			DashboardEvent::PointerMoved { x, y } => {
				self.on_pointer_move(Coord { x, y });
				Ok(())
			}
			DashboardEvent::PointerLeft => {
				self.on_pointer_leave();
				Ok(())
			}
			DashboardEvent::Clicked { x, y } => {
				self.on_click(Coord { x, y });
				Ok(())
			}
		};
		if let Err(err) = result {
			warn!("ignoring event: {err}");
		}
	}
}
