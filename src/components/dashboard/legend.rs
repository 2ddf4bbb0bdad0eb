use geo::Coord;

use super::choropleth::format_value;
use super::scale::ScaleSet;
use super::scene::{GradientSwatch, Legend, LegendLabel, ReferenceCircle};
use super::types::{CentralityMetric, ColorMode};

const SWATCH_X: f64 = 20.0;
const SWATCH_Y: f64 = 20.0;
const SWATCH_WIDTH: f64 = 20.0;
const SWATCH_HEIGHT: f64 = 200.0;
const LABEL_X: f64 = 45.0;

fn label(x: f64, y: f64, text: impl Into<String>) -> LegendLabel {
	LegendLabel { x, y, text: text.into() }
}

/// Rebuild the legend from the scales the map and markers were drawn with.
/// `max_centrality` is the largest value of `metric` across the period's
/// airports.
pub fn render_legend(
	scales: &ScaleSet,
	mode: ColorMode,
	metric: CentralityMetric,
	max_centrality: Option<f64>,
) -> Legend {
	let mut legend = Legend::default();

	if mode != ColorMode::None {
		let max = scales.color.domain.max;
		legend.swatch = Some(GradientSwatch {
			x: SWATCH_X,
			y: SWATCH_Y,
			width: SWATCH_WIDTH,
			height: SWATCH_HEIGHT,
			top: scales.color.apply(max),
			bottom: scales.color.apply(0.0),
		});
		legend.labels.push(label(LABEL_X, SWATCH_Y + SWATCH_HEIGHT, "0"));
		legend.labels.push(label(LABEL_X, SWATCH_Y + 10.0, format_value(max)));
		let units = match mode {
			ColorMode::RiskScore => format!("Risk Score: {metric}"),
			_ => "Cases per 100,000".to_string(),
		};
		legend.labels.push(label(60.0, 125.0, units));
	}

	let max_centrality = max_centrality.unwrap_or(0.0);
	legend.circle = Some(ReferenceCircle {
		center: Coord { x: 30.0, y: 250.0 },
		radius: scales.radius.apply(max_centrality).max(0.0),
	});
	legend.labels.push(label(LABEL_X, 255.0, format!("Max {metric}: ")));
	legend.labels.push(label(LABEL_X, 275.0, format_value(max_centrality)));

	legend
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::dashboard::scale::{CASE_COLOR_HIGH, CASE_COLOR_LOW, RADIUS_RANGE};

	fn texts(legend: &Legend) -> Vec<&str> {
		legend.labels.iter().map(|l| l.text.as_str()).collect()
	}

	#[test]
	fn case_legend_spans_the_color_domain() {
		let mut scales = ScaleSet::default();
		scales.rescale_color([300.0, 150.0]);
		scales.rescale_radius([0.2, 0.8]);
		let legend = render_legend(&scales, ColorMode::CaseData, CentralityMetric::PageRank, Some(0.8));

		let swatch = legend.swatch.as_ref().unwrap();
		assert_eq!(swatch.top, CASE_COLOR_HIGH);
		assert_eq!(swatch.bottom, CASE_COLOR_LOW);
		assert_eq!(
			texts(&legend),
			["0", "300", "Cases per 100,000", "Max PageRank: ", "0.8"]
		);
		assert_eq!(legend.circle.as_ref().unwrap().radius, RADIUS_RANGE.1);
	}

	#[test]
	fn risk_legend_names_the_metric() {
		let legend = render_legend(
			&ScaleSet::default(),
			ColorMode::RiskScore,
			CentralityMetric::HubScore,
			None,
		);
		assert!(texts(&legend).contains(&"Risk Score: Hub Score"));
	}

	#[test]
	fn no_color_mode_keeps_only_the_node_reference() {
		let legend = render_legend(
			&ScaleSet::default(),
			ColorMode::None,
			CentralityMetric::HarmonicCentrality,
			Some(2.0),
		);
		assert!(legend.swatch.is_none());
		assert!(legend.circle.is_some());
		assert_eq!(texts(&legend), ["Max Harmonic Centrality: ", "2"]);
	}
}
