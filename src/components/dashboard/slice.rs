//! Pulls the per-period sub-tables out of the [`DatasetBundle`].
//!
//! Absence is a normal outcome here: every `resolve_*` hands back an empty
//! map instead of failing, so renderers can treat it as "no signal".

use std::collections::BTreeMap;

use log::debug;

use super::error::DashboardError;
use super::types::{
	CentralityMetric, CentralitySlice, ColorMode, CountyId, CountyValues, DatasetBundle, EdgeSlice,
	MetricValues, Period, RiskSlice,
};

static EMPTY_COUNTY_VALUES: CountyValues = BTreeMap::new();
static EMPTY_RISK: RiskSlice = BTreeMap::new();
static EMPTY_CENTRALITY: CentralitySlice = BTreeMap::new();
static EMPTY_EDGES: EdgeSlice = BTreeMap::new();
static EMPTY_NEIGHBORS: BTreeMap<String, f64> = BTreeMap::new();

/// The values backing the choropleth for one period.
#[derive(Clone, Copy, Debug)]
pub enum CountySlice<'a> {
	Cases(&'a CountyValues),
	/// Still keyed by metric; narrowed with [`CountySlice::value`].
	Risk(&'a RiskSlice),
	Empty,
}

impl<'a> CountySlice<'a> {
	pub fn value(&self, county: CountyId, metric: CentralityMetric) -> Option<f64> {
		match self {
			CountySlice::Cases(values) => values.get(&county).copied(),
			CountySlice::Risk(risk) => risk.get(&county).and_then(|m| m.get(&metric)).copied(),
			CountySlice::Empty => None,
		}
	}

	/// Every value the color scale should see.
	pub fn values(&self, metric: CentralityMetric) -> Vec<f64> {
		match self {
			CountySlice::Cases(values) => values.values().copied().collect(),
			CountySlice::Risk(risk) => risk.values().filter_map(|m| m.get(&metric).copied()).collect(),
			CountySlice::Empty => Vec::new(),
		}
	}
}

/// Flight and centrality data for one period.
#[derive(Clone, Copy, Debug)]
pub struct AirportSlices<'a> {
	pub forward: &'a EdgeSlice,
	pub reversed: &'a EdgeSlice,
	pub centrality: &'a CentralitySlice,
}

impl<'a> AirportSlices<'a> {
	pub fn outgoing(&self, code: &str) -> &'a BTreeMap<String, f64> {
		self.forward.get(code).unwrap_or(&EMPTY_NEIGHBORS)
	}

	pub fn incoming(&self, code: &str) -> &'a BTreeMap<String, f64> {
		self.reversed.get(code).unwrap_or(&EMPTY_NEIGHBORS)
	}

	/// Whether the airport shows up in any flight record this period.
	pub fn has_flights(&self, code: &str) -> bool {
		self.forward.contains_key(code) || self.reversed.contains_key(code)
	}

	pub fn centrality_of(&self, code: &str) -> Option<&'a MetricValues> {
		self.centrality.get(code)
	}

	pub fn max_centrality(&self, metric: CentralityMetric) -> Option<f64> {
		self.centrality
			.values()
			.filter_map(|m| m.get(&metric).copied())
			.filter(|v| v.is_finite())
			.fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
	}
}

pub struct SliceResolver<'a> {
	bundle: &'a DatasetBundle,
}

impl<'a> SliceResolver<'a> {
	pub fn new(bundle: &'a DatasetBundle) -> Self {
		Self { bundle }
	}

	pub fn try_case_slice(&self, period: Period) -> Result<&'a CountyValues, DashboardError> {
		self.bundle
			.cases
			.per_100k
			.get(&period)
			.ok_or_else(|| DashboardError::MissingSlice(format!("cases per 100k for {period}")))
	}

	pub fn try_risk_slice(&self, period: Period) -> Result<&'a RiskSlice, DashboardError> {
		self.bundle
			.risk
			.get(&period)
			.ok_or_else(|| DashboardError::MissingSlice(format!("risk scores for {period}")))
	}

	pub fn resolve_county_slice(&self, mode: ColorMode, period: Period) -> CountySlice<'a> {
		let slice = match mode {
			ColorMode::CaseData => self.try_case_slice(period).map(CountySlice::Cases),
			ColorMode::RiskScore => self.try_risk_slice(period).map(CountySlice::Risk),
			ColorMode::None => return CountySlice::Empty,
		};
		slice.unwrap_or_else(|err| {
			debug!("{err}, rendering counties without values");
			match mode {
				ColorMode::RiskScore => CountySlice::Risk(&EMPTY_RISK),
				_ => CountySlice::Cases(&EMPTY_COUNTY_VALUES),
			}
		})
	}

	/// Case numbers shown in county tooltips. Always from the case table: the
	/// per-100k column that also shades the map, except in risk mode where the
	/// raw counts are shown when the source has them.
	pub fn resolve_case_counts(&self, mode: ColorMode, period: Period) -> &'a CountyValues {
		let cases = &self.bundle.cases;
		let raw = match mode {
			ColorMode::RiskScore => cases.raw.get(&period),
			_ => None,
		};
		raw.or_else(|| cases.per_100k.get(&period)).unwrap_or(&EMPTY_COUNTY_VALUES)
	}

	pub fn resolve_airport_slices(&self, period: Period) -> AirportSlices<'a> {
		let lookup = |table: &'a BTreeMap<Period, EdgeSlice>, what: &str| {
			table.get(&period).unwrap_or_else(|| {
				debug!("no {what} flight records for {period}");
				&EMPTY_EDGES
			})
		};
		AirportSlices {
			forward: lookup(&self.bundle.edges, "outgoing"),
			reversed: lookup(&self.bundle.edges_reversed, "incoming"),
			centrality: self.bundle.centrality.get(&period).unwrap_or(&EMPTY_CENTRALITY),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::dashboard::state::tests::fixture;

	#[test]
	fn every_listed_period_resolves_airport_slices() {
		let bundle = fixture();
		let resolver = SliceResolver::new(&bundle);
		for &period in &bundle.periods {
			let slices = resolver.resolve_airport_slices(period);
			for code in bundle.airports.keys().map(String::as_str).chain(["XXX"]) {
				let listed = slices.forward.contains_key(code) || slices.reversed.contains_key(code);
				assert_eq!(slices.has_flights(code), listed, "{code} in {period}");
				assert_eq!(slices.outgoing(code).is_empty(), !slices.forward.contains_key(code));
				assert_eq!(slices.incoming(code).is_empty(), !slices.reversed.contains_key(code));
			}
		}

		// 4/20 is listed but carries no flight data
		let apr = resolver.resolve_airport_slices(Period::new(4, 20));
		assert!(apr.forward.is_empty());
		assert!(apr.reversed.is_empty());
		assert!(apr.centrality.is_empty());
		assert!(!apr.has_flights("ORD"));
		// 2/20 only has ORD -> LAX
		let feb = resolver.resolve_airport_slices(Period::new(2, 20));
		assert!(feb.has_flights("ORD") && feb.has_flights("LAX"));
		assert!(!feb.has_flights("JFK"));
	}

	#[test]
	fn county_slice_follows_color_mode() {
		let bundle = fixture();
		let resolver = SliceResolver::new(&bundle);
		let period = Period::new(3, 20);

		let cases = resolver.resolve_county_slice(ColorMode::CaseData, period);
		assert_eq!(cases.value(1, CentralityMetric::PageRank), Some(150.0));

		let risk = resolver.resolve_county_slice(ColorMode::RiskScore, period);
		assert_eq!(risk.value(1, CentralityMetric::PageRank), Some(0.4));
		assert_eq!(risk.value(1, CentralityMetric::HubScore), None);

		assert!(matches!(resolver.resolve_county_slice(ColorMode::None, period), CountySlice::Empty));
	}

	#[test]
	fn missing_period_gives_empty_county_slice() {
		let bundle = fixture();
		let resolver = SliceResolver::new(&bundle);
		let slice = resolver.resolve_county_slice(ColorMode::RiskScore, Period::new(4, 20));
		assert!(slice.values(CentralityMetric::PageRank).is_empty());
		assert!(matches!(
			resolver.try_risk_slice(Period::new(4, 20)),
			Err(DashboardError::MissingSlice(_))
		));
	}

	#[test]
	fn tooltip_counts_come_from_case_table() {
		let bundle = fixture();
		let resolver = SliceResolver::new(&bundle);
		let feb = Period::new(2, 20);
		assert_eq!(resolver.resolve_case_counts(ColorMode::CaseData, feb).get(&1), Some(&40.0));
		assert_eq!(resolver.resolve_case_counts(ColorMode::RiskScore, feb).get(&1), Some(&12.0));
		// 3/20 has no raw column
		let mar = Period::new(3, 20);
		assert_eq!(resolver.resolve_case_counts(ColorMode::RiskScore, mar).get(&1), Some(&150.0));
	}
}
