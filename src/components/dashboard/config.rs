use super::types::{CentralityMetric, ColorMode};

/// Where the data lives and how the dashboard is laid out.
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardConfig {
	/// Prefix joined with every file name below.
	pub data_root: String,
	pub case_file: String,
	pub period_file: String,
	/// One TopoJSON topology holding counties, states and the nation.
	pub boundary_file: String,
	pub airport_file: String,
	pub edge_file: String,
	pub reversed_edge_file: String,
	pub centrality_file: String,
	pub risk_file: String,

	pub width: f64,
	pub height: f64,
	pub projection_scale: f64,
	pub projection_translate: (f64, f64),
	/// Top-left corner of the legend on the canvas.
	pub legend_origin: (f64, f64),
	pub flight_reveal_ms: f64,

	/// Initial metric; replaced by the first available one when absent.
	pub default_metric: CentralityMetric,
	pub default_color_mode: ColorMode,
}

impl Default for DashboardConfig {
	fn default() -> Self {
		Self {
			data_root: "./data".into(),
			case_file: "data.json".into(),
			period_file: "months.csv".into(),
			boundary_file: "counties.json".into(),
			airport_file: "airport_lookup.json".into(),
			edge_file: "YearMonthEdgesSick.json".into(),
			reversed_edge_file: "YearMonthEdgesSickDestFirst.json".into(),
			centrality_file: "YearMonthCentrality.json".into(),
			risk_file: "risk_scores.json".into(),
			width: 1120.0,
			height: 610.0,
			projection_scale: 1300.0,
			projection_translate: (487.5, 305.0),
			legend_origin: (985.0, 20.0),
			flight_reveal_ms: 2000.0,
			default_metric: CentralityMetric::HarmonicCentrality,
			default_color_mode: ColorMode::CaseData,
		}
	}
}

impl DashboardConfig {
	pub fn url(&self, file: &str) -> String {
		format!("{}/{}", self.data_root.trim_end_matches('/'), file)
	}
}
