//! Startup load: fetch every resource concurrently, then decode them into a
//! [`DatasetBundle`]. Nothing is drawn until all of them have arrived.

use std::collections::{BTreeMap, BTreeSet};

use csv::{ReaderBuilder, Trim};
use log::{debug, info, warn};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use super::config::DashboardConfig;
use super::error::DashboardError;
use super::types::{
	Airport, CaseTable, CentralityMetric, CountyId, DatasetBundle, EdgeSlice, MetricValues, Period,
};
use super::topology::parse_boundaries;

/// year → month → value, as every period-keyed resource is laid out.
type Nested<T> = BTreeMap<String, BTreeMap<String, T>>;

#[derive(Deserialize)]
struct RawAirport {
	name: String,
	coords: (f64, f64),
}

#[derive(Deserialize)]
struct RawEdge {
	weight: f64,
}

/// The undecoded text of every resource.
#[derive(Clone, Debug, Default)]
pub struct RawSources {
	pub cases: String,
	pub periods: String,
	/// TopoJSON with `counties`, `states` and `nation` objects.
	pub boundaries: String,
	pub airports: String,
	pub edges: String,
	pub edges_reversed: String,
	pub centrality: String,
	pub risk: String,
}

fn from_json<T: DeserializeOwned>(resource: &str, text: &str) -> Result<T, DashboardError> {
	serde_json::from_str(text).map_err(|e| DashboardError::parse(resource, e))
}

fn county_id(key: &str) -> Option<CountyId> {
	key.trim().parse().ok()
}

fn flatten_periods<T>(resource: &str, nested: Nested<T>) -> BTreeMap<Period, T> {
	let mut out = BTreeMap::new();
	for (year, months) in nested {
		for (month, value) in months {
			match Period::from_table_keys(&year, &month) {
				Some(period) => {
					out.insert(period, value);
				}
				None => debug!("{resource}: skipping period {month}/{year}"),
			}
		}
	}
	out
}

/// Columns are named `"M/Y cases per 100k"` or `"M/Y cases"`.
pub fn parse_cases(text: &str) -> Result<CaseTable, DashboardError> {
	let columns: BTreeMap<String, BTreeMap<String, serde_json::Value>> = from_json("case data", text)?;
	let mut table = CaseTable::default();
	for (column, rows) in columns {
		let Some((label, kind)) = column.split_once(' ') else {
			continue;
		};
		let Ok(period) = label.parse::<Period>() else {
			debug!("case data: skipping column `{column}`");
			continue;
		};
		let target = match kind {
			"cases per 100k" => &mut table.per_100k,
			"cases" => &mut table.raw,
			_ => continue,
		};
		let values = rows
			.into_iter()
			.filter_map(|(id, value)| Some((county_id(&id)?, value.as_f64()?)))
			.collect();
		target.insert(period, values);
	}
	Ok(table)
}

/// The period list is the header row of `months.csv`.
pub fn parse_periods(text: &str) -> Result<Vec<Period>, DashboardError> {
	let mut reader = ReaderBuilder::new()
		.has_headers(true)
		.trim(Trim::All)
		.from_reader(text.as_bytes());
	let header = reader.headers().map_err(|e| DashboardError::parse("period list", e))?;
	let periods: Vec<Period> = header
		.iter()
		.filter(|cell| !cell.is_empty())
		.filter_map(|cell| match cell.parse() {
			Ok(period) => Some(period),
			Err(_) => {
				warn!("period list: ignoring `{cell}`");
				None
			}
		})
		.collect();
	if periods.is_empty() {
		return Err(DashboardError::parse("period list", "no periods in header"));
	}
	Ok(periods)
}

/// Shared by the centrality and risk tables: period → entity → metric name →
/// value. Metric names outside [`CentralityMetric`] are dropped.
fn parse_metric_table<K: Ord>(
	resource: &str,
	text: &str,
	key: impl Fn(&str) -> Option<K>,
) -> Result<BTreeMap<Period, BTreeMap<K, MetricValues>>, DashboardError> {
	let nested: Nested<BTreeMap<String, BTreeMap<String, serde_json::Value>>> = from_json(resource, text)?;
	let mut unknown = BTreeSet::new();
	let table = flatten_periods(resource, nested)
		.into_iter()
		.map(|(period, entities)| {
			let entities = entities
				.into_iter()
				.filter_map(|(entity, values)| {
					let values: MetricValues = values
						.into_iter()
						.filter_map(|(name, value)| match CentralityMetric::from_label(&name) {
							Some(metric) => Some((metric, value.as_f64()?)),
							None => {
								unknown.insert(name);
								None
							}
						})
						.collect();
					Some((key(&entity)?, values))
				})
				.collect();
			(period, entities)
		})
		.collect();
	if !unknown.is_empty() {
		warn!("{resource}: ignoring unknown metrics {unknown:?}");
	}
	Ok(table)
}

pub fn parse_centrality(text: &str) -> Result<BTreeMap<Period, BTreeMap<String, MetricValues>>, DashboardError> {
	parse_metric_table("centrality table", text, |code| Some(code.to_string()))
}

pub fn parse_risk(text: &str) -> Result<BTreeMap<Period, BTreeMap<CountyId, MetricValues>>, DashboardError> {
	parse_metric_table("risk table", text, county_id)
}

pub fn parse_edges(resource: &str, text: &str) -> Result<BTreeMap<Period, EdgeSlice>, DashboardError> {
	let nested: Nested<BTreeMap<String, BTreeMap<String, RawEdge>>> = from_json(resource, text)?;
	Ok(flatten_periods(resource, nested)
		.into_iter()
		.map(|(period, airports)| {
			let airports = airports
				.into_iter()
				.map(|(code, neighbors)| {
					let neighbors = neighbors
						.into_iter()
						.map(|(neighbor, edge)| (neighbor, edge.weight))
						.collect();
					(code, neighbors)
				})
				.collect();
			(period, airports)
		})
		.collect())
}

pub fn parse_airports(text: &str) -> Result<BTreeMap<String, Airport>, DashboardError> {
	let raw: BTreeMap<String, RawAirport> = from_json("airport lookup", text)?;
	Ok(raw
		.into_iter()
		.map(|(code, a)| {
			(
				code,
				Airport {
					name: a.name,
					coords: a.coords,
				},
			)
		})
		.collect())
}

impl DatasetBundle {
	pub fn from_sources(sources: &RawSources) -> Result<Self, DashboardError> {
		let centrality = parse_centrality(&sources.centrality)?;
		let metrics = DatasetBundle::reference_metrics(&centrality);
		if metrics.is_empty() {
			warn!("centrality table carries no known metrics");
		}
		Ok(DatasetBundle {
			cases: parse_cases(&sources.cases)?,
			risk: parse_risk(&sources.risk)?,
			centrality,
			edges: parse_edges("outgoing flights", &sources.edges)?,
			edges_reversed: parse_edges("incoming flights", &sources.edges_reversed)?,
			airports: parse_airports(&sources.airports)?,
			boundaries: parse_boundaries(&sources.boundaries)?,
			periods: parse_periods(&sources.periods)?,
			metrics,
		})
	}
}

fn js_reason(value: &JsValue) -> String {
	value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

async fn fetch_text(url: String) -> Result<String, DashboardError> {
	let window = web_sys::window().ok_or_else(|| DashboardError::load(&url, "no window"))?;
	let response = JsFuture::from(window.fetch_with_str(&url))
		.await
		.map_err(|e| DashboardError::load(&url, js_reason(&e)))?;
	let response: Response = response
		.dyn_into()
		.map_err(|_| DashboardError::load(&url, "fetch did not return a Response"))?;
	if !response.ok() {
		return Err(DashboardError::load(&url, format!("HTTP {}", response.status())));
	}
	let body = response.text().map_err(|e| DashboardError::load(&url, js_reason(&e)))?;
	let body = JsFuture::from(body)
		.await
		.map_err(|e| DashboardError::load(&url, js_reason(&e)))?;
	body.as_string()
		.ok_or_else(|| DashboardError::load(&url, "body is not text"))
}

/// Fetch all resources concurrently. The first failure aborts the load.
pub async fn load_bundle(config: &DashboardConfig) -> Result<DatasetBundle, DashboardError> {
	let (cases, periods, boundaries, airports, edges, edges_reversed, centrality, risk) = futures::try_join!(
		fetch_text(config.url(&config.case_file)),
		fetch_text(config.url(&config.period_file)),
		fetch_text(config.url(&config.boundary_file)),
		fetch_text(config.url(&config.airport_file)),
		fetch_text(config.url(&config.edge_file)),
		fetch_text(config.url(&config.reversed_edge_file)),
		fetch_text(config.url(&config.centrality_file)),
		fetch_text(config.url(&config.risk_file)),
	)?;
	info!("fetched all dashboard resources from {}", config.data_root);
	DatasetBundle::from_sources(&RawSources {
		cases,
		periods,
		boundaries,
		airports,
		edges,
		edges_reversed,
		centrality,
		risk,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn case_columns_split_by_kind() {
		let table = parse_cases(
			r#"{
				"3/20 cases per 100k": {"1001": 150.0, "01003": 2.5, "bad": 1.0, "1005": null, "1007": "n/a"},
				"3/20 cases": {"1001": 83},
				"County Name": {"1001": "Autauga"}
			}"#,
		)
		.unwrap();
		let period = Period::new(3, 20);
		assert_eq!(table.per_100k[&period], BTreeMap::from([(1001, 150.0), (1003, 2.5)]));
		assert_eq!(table.raw[&period][&1001], 83.0);
		assert_eq!(table.per_100k.len(), 1);
	}

	#[test]
	fn periods_come_from_the_csv_header_in_order() {
		let periods = parse_periods("\"3/20\",2/20,4/20,oops\n1,2,3,4\n").unwrap();
		assert_eq!(periods, vec![Period::new(3, 20), Period::new(2, 20), Period::new(4, 20)]);
		assert!(parse_periods("").is_err());
	}

	#[test]
	fn quoted_header_cells_are_unescaped() {
		let periods = parse_periods("\"5/20\",\"note, with \"\"quotes\"\"\",6/20\n").unwrap();
		assert_eq!(periods, vec![Period::new(5, 20), Period::new(6, 20)]);
		assert!(matches!(parse_periods("label,other\n"), Err(DashboardError::Parse { .. })));
	}

	#[test]
	fn centrality_drops_unknown_metrics() {
		let table = parse_centrality(
			r#"{"2020": {"2": {"ABQ": {"Harmonic Centrality": 0.5, "PageRank": 0.1, "Closeness": 3.0}}}}"#,
		)
		.unwrap();
		let entry = &table[&Period::new(2, 20)]["ABQ"];
		assert_eq!(entry.len(), 2);
		assert_eq!(entry[&CentralityMetric::PageRank], 0.1);
		assert_eq!(
			DatasetBundle::reference_metrics(&table),
			vec![CentralityMetric::HarmonicCentrality, CentralityMetric::PageRank]
		);
	}

	#[test]
	fn risk_is_keyed_by_county() {
		let table = parse_risk(r#"{"2020": {"3": {"1001": {"PageRank": 0.4}}}}"#).unwrap();
		assert_eq!(table[&Period::new(3, 20)][&1001][&CentralityMetric::PageRank], 0.4);
	}

	#[test]
	fn edges_keep_weights() {
		let table = parse_edges("edges", r#"{"2020": {"3": {"ORD": {"LAX": {"weight": 10.5}}}}}"#).unwrap();
		assert_eq!(table[&Period::new(3, 20)]["ORD"]["LAX"], 10.5);
	}

	#[test]
	fn airports_decode() {
		let airports = parse_airports(r#"{"ORD": {"name": "Chicago O'Hare", "coords": [-87.9, 41.98]}}"#).unwrap();
		assert_eq!(airports["ORD"].name, "Chicago O'Hare");
		assert_eq!(airports["ORD"].coords, (-87.9, 41.98));
	}

	#[test]
	fn malformed_json_is_a_parse_error() {
		assert!(matches!(parse_airports("{"), Err(DashboardError::Parse { .. })));
	}
}
