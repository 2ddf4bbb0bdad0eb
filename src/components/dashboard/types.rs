use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use geo::{MultiLineString, MultiPolygon};

use super::error::DashboardError;

/// Counties are keyed by their numeric FIPS code (leading zeros dropped).
pub type CountyId = u32;

/// Per-county scalar values for one period.
pub type CountyValues = BTreeMap<CountyId, f64>;

/// Metric name → value for one entity.
pub type MetricValues = BTreeMap<CentralityMetric, f64>;

/// Per-county risk scores for one period, one score per centrality metric.
pub type RiskSlice = BTreeMap<CountyId, MetricValues>;

/// Airport code → centrality scores for one period.
pub type CentralitySlice = BTreeMap<String, MetricValues>;

/// Airport code → neighbor code → edge weight for one period.
pub type EdgeSlice = BTreeMap<String, BTreeMap<String, f64>>;

/// A selectable "month/year" period such as `3/20`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
	/// Two-digit year, as used in the labels.
	pub year: u16,
	pub month: u8,
}

impl Period {
	#[cfg(test)]
	pub fn new(month: u8, year: u16) -> Self {
		Self { year, month }
	}

	/// Build a period from the nested table keys (`"2020"`, `"3"`).
	pub fn from_table_keys(year: &str, month: &str) -> Option<Self> {
		let year: u16 = year.trim().parse().ok()?;
		let month: u8 = month.trim().parse().ok()?;
		let year = if year >= 2000 { year - 2000 } else { year };
		(1..=12).contains(&month).then_some(Self { year, month })
	}
}

impl fmt::Display for Period {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.month, self.year)
	}
}

impl FromStr for Period {
	type Err = DashboardError;

	fn from_str(label: &str) -> Result<Self, Self::Err> {
		let invalid = || DashboardError::InvalidSelection(format!("period `{label}`"));
		let (month, year) = label.trim().split_once('/').ok_or_else(invalid)?;
		let month: u8 = month.parse().map_err(|_| invalid())?;
		let year: u16 = year.parse().map_err(|_| invalid())?;
		if !(1..=12).contains(&month) {
			return Err(invalid());
		}
		Ok(Self { year, month })
	}
}

/// The centrality measures the dashboard knows how to display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CentralityMetric {
	AuthorityScore,
	Eccentricity,
	EigenvectorCentrality,
	HarmonicCentrality,
	HubScore,
	PageRank,
}

impl CentralityMetric {
	pub const ALL: [CentralityMetric; 6] = [
		CentralityMetric::AuthorityScore,
		CentralityMetric::Eccentricity,
		CentralityMetric::EigenvectorCentrality,
		CentralityMetric::HarmonicCentrality,
		CentralityMetric::HubScore,
		CentralityMetric::PageRank,
	];

	/// The column name used in the centrality and risk tables.
	pub fn label(self) -> &'static str {
		match self {
			CentralityMetric::AuthorityScore => "Authority Score",
			CentralityMetric::Eccentricity => "Eccentricity",
			CentralityMetric::EigenvectorCentrality => "Eigenvector Centrality",
			CentralityMetric::HarmonicCentrality => "Harmonic Centrality",
			CentralityMetric::HubScore => "Hub Score",
			CentralityMetric::PageRank => "PageRank",
		}
	}

	pub fn from_label(label: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|m| m.label() == label)
	}
}

impl fmt::Display for CentralityMetric {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// How the county layer is shaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorMode {
	#[default]
	CaseData,
	RiskScore,
	None,
}

impl ColorMode {
	pub const ALL: [ColorMode; 3] = [ColorMode::CaseData, ColorMode::RiskScore, ColorMode::None];

	pub fn label(self) -> &'static str {
		match self {
			ColorMode::CaseData => "Case Data",
			ColorMode::RiskScore => "Risk Score",
			ColorMode::None => "None",
		}
	}

	pub fn from_label(label: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|m| m.label() == label)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Airport {
	pub name: String,
	/// Longitude, latitude in degrees.
	pub coords: (f64, f64),
}

#[derive(Clone, Debug)]
pub struct CountyFeature {
	pub id: CountyId,
	pub name: String,
	/// Lon/lat geometry.
	pub geometry: MultiPolygon<f64>,
}

/// Decoded from the boundary topology. Meshes hold only arcs shared by two
/// different counties (or states), so coastlines are left to the nation
/// outline.
#[derive(Clone, Debug)]
pub struct CountyBoundaries {
	pub counties: Vec<CountyFeature>,
	pub county_mesh: MultiLineString<f64>,
	pub state_mesh: MultiLineString<f64>,
	pub nation: MultiLineString<f64>,
}

impl Default for CountyBoundaries {
	fn default() -> Self {
		Self {
			counties: Vec::new(),
			county_mesh: MultiLineString::new(Vec::new()),
			state_mesh: MultiLineString::new(Vec::new()),
			nation: MultiLineString::new(Vec::new()),
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct CaseTable {
	/// "M/Y cases per 100k" columns.
	pub per_100k: BTreeMap<Period, CountyValues>,
	/// "M/Y cases" columns (raw counts), when the source carries them.
	pub raw: BTreeMap<Period, CountyValues>,
}

/// Everything the dashboard reads. Built once after the initial load and
/// never mutated.
#[derive(Clone, Debug, Default)]
pub struct DatasetBundle {
	pub cases: CaseTable,
	pub risk: BTreeMap<Period, RiskSlice>,
	pub centrality: BTreeMap<Period, CentralitySlice>,
	pub edges: BTreeMap<Period, EdgeSlice>,
	pub edges_reversed: BTreeMap<Period, EdgeSlice>,
	pub airports: BTreeMap<String, Airport>,
	pub boundaries: CountyBoundaries,
	pub periods: Vec<Period>,
	/// Metrics present in the reference centrality entry.
	pub metrics: Vec<CentralityMetric>,
}

impl DatasetBundle {
	pub fn has_period(&self, period: Period) -> bool {
		self.periods.contains(&period)
	}

	pub fn has_metric(&self, metric: CentralityMetric) -> bool {
		self.metrics.contains(&metric)
	}

	/// Metrics carried by the first airport entry of the earliest period
	/// with centrality data.
	pub fn reference_metrics(centrality: &BTreeMap<Period, CentralitySlice>) -> Vec<CentralityMetric> {
		centrality
			.values()
			.find_map(|slice| slice.values().next())
			.map(|entry| entry.keys().copied().collect())
			.unwrap_or_default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn period_labels_parse_and_print() {
		let period: Period = "3/20".parse().unwrap();
		assert_eq!(period, Period::new(3, 20));
		assert_eq!(period.to_string(), "3/20");
		assert!("13/20".parse::<Period>().is_err());
		assert!("march".parse::<Period>().is_err());
	}

	#[test]
	fn periods_order_by_year_then_month() {
		let mut periods = vec![Period::new(2, 21), Period::new(11, 20), Period::new(3, 20)];
		periods.sort();
		assert_eq!(periods, vec![Period::new(3, 20), Period::new(11, 20), Period::new(2, 21)]);
	}

	#[test]
	fn table_keys_map_to_periods() {
		assert_eq!(Period::from_table_keys("2020", "2"), Some(Period::new(2, 20)));
		assert_eq!(Period::from_table_keys("2020", "0"), None);
		assert_eq!(Period::from_table_keys("x", "2"), None);
	}

	#[test]
	fn metric_labels_round_trip() {
		for metric in CentralityMetric::ALL {
			assert_eq!(CentralityMetric::from_label(metric.label()), Some(metric));
		}
		assert_eq!(CentralityMetric::from_label("Betweenness"), None);
		assert_eq!(ColorMode::from_label("Risk Score"), Some(ColorMode::RiskScore));
	}
}
