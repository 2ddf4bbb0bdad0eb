//! Geographic projection service.
//!
//! The rest of the dashboard only sees [`Projection`]: an opaque lon/lat →
//! screen mapping that may refuse points it cannot place. [`AlbersUsa`] is the
//! composite conic projection (lower 48 plus Alaska and Hawaii insets) the
//! default dashboard is laid out for.

use geo::{Coord, LineString, MultiLineString, MultiPolygon, Polygon};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use super::error::DashboardError;

/// lon/lat degrees → screen pixels. `None` when the point falls outside every
/// region the projection covers.
pub type Projection = dyn Fn(Coord<f64>) -> Option<Coord<f64>>;

const EPSILON: f64 = 1e-6;

/// Unit sphere, so projected coordinates are in sphere radii.
const GEOGRAPHIC: &str = "+proj=longlat +a=1 +b=1 +no_defs";

fn aea(lat_1: f64, lat_2: f64, lon_0: f64) -> String {
	format!("+proj=aea +lat_1={lat_1} +lat_2={lat_2} +lat_0=0 +lon_0={lon_0} +a=1 +b=1 +no_defs")
}

/// One conic region: the point `center` lands on `translate`, `k` pixels per
/// radius, and anything projected outside `clip` is refused.
struct Inset {
	proj: Proj,
	origin: (f64, f64),
	k: f64,
	translate: (f64, f64),
	/// `[x0, y0, x1, y1]` in screen space.
	clip: [f64; 4],
}

impl Inset {
	fn new(
		geographic: &Proj,
		definition: &str,
		center: (f64, f64),
		k: f64,
		translate: (f64, f64),
		clip: [f64; 4],
	) -> Result<Self, DashboardError> {
		let proj = Proj::from_proj_string(definition)
			.map_err(|e| DashboardError::Projection(format!("{definition}: {e}")))?;
		let origin = unit_point(geographic, &proj, center.0, center.1)
			.ok_or_else(|| DashboardError::Projection(format!("{definition}: center is not projectable")))?;
		Ok(Self {
			proj,
			origin,
			k,
			translate,
			clip,
		})
	}

	fn project(&self, geographic: &Proj, lon: f64, lat: f64) -> Option<Coord<f64>> {
		let (x, y) = unit_point(geographic, &self.proj, lon, lat)?;
		let sx = self.translate.0 + self.k * (x - self.origin.0);
		let sy = self.translate.1 - self.k * (y - self.origin.1);
		let [x0, y0, x1, y1] = self.clip;
		(sx >= x0 && sx <= x1 && sy >= y0 && sy <= y1).then_some(Coord { x: sx, y: sy })
	}
}

fn unit_point(geographic: &Proj, proj: &Proj, lon: f64, lat: f64) -> Option<(f64, f64)> {
	let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
	transform(geographic, proj, &mut point).ok()?;
	(point.0.is_finite() && point.1.is_finite()).then_some((point.0, point.1))
}

/// Composite projection for the United States.
pub struct AlbersUsa {
	geographic: Proj,
	lower48: Inset,
	alaska: Inset,
	hawaii: Inset,
}

impl AlbersUsa {
	pub fn new(k: f64, translate: (f64, f64)) -> Result<Self, DashboardError> {
		let geographic = Proj::from_proj_string(GEOGRAPHIC)
			.map_err(|e| DashboardError::Projection(format!("{GEOGRAPHIC}: {e}")))?;
		let (x, y) = translate;
		let lower48 = Inset::new(
			&geographic,
			&aea(29.5, 45.5, -96.0),
			(-96.6, 38.7),
			k,
			(x, y),
			[x - 0.455 * k, y - 0.238 * k, x + 0.455 * k, y + 0.238 * k],
		)?;
		let alaska = Inset::new(
			&geographic,
			&aea(55.0, 65.0, -154.0),
			(-156.0, 58.5),
			k * 0.35,
			(x - 0.307 * k, y + 0.201 * k),
			[
				x - 0.425 * k + EPSILON,
				y + 0.120 * k + EPSILON,
				x - 0.214 * k - EPSILON,
				y + 0.234 * k - EPSILON,
			],
		)?;
		let hawaii = Inset::new(
			&geographic,
			&aea(8.0, 18.0, -157.0),
			(-160.0, 19.9),
			k,
			(x - 0.205 * k, y + 0.212 * k),
			[
				x - 0.214 * k + EPSILON,
				y + 0.166 * k + EPSILON,
				x - 0.115 * k - EPSILON,
				y + 0.234 * k - EPSILON,
			],
		)?;
		Ok(Self {
			geographic,
			lower48,
			alaska,
			hawaii,
		})
	}

	pub fn project(&self, coord: Coord<f64>) -> Option<Coord<f64>> {
		let g = &self.geographic;
		self.lower48
			.project(g, coord.x, coord.y)
			.or_else(|| self.alaska.project(g, coord.x, coord.y))
			.or_else(|| self.hawaii.project(g, coord.x, coord.y))
	}

	pub fn into_projection(self) -> Box<Projection> {
		Box::new(move |coord| self.project(coord))
	}
}

/// Project every ring of a shape, dropping points the projection refuses and
/// rings left with fewer than three points.
pub fn project_multipolygon(shape: &MultiPolygon<f64>, project: &Projection) -> MultiPolygon<f64> {
	let ring = |ls: &LineString<f64>| -> Option<LineString<f64>> {
		let coords: Vec<Coord<f64>> = ls.coords().filter_map(|c| project(*c)).collect();
		(coords.len() >= 3).then(|| LineString::new(coords))
	};
	MultiPolygon::new(
		shape
			.iter()
			.filter_map(|polygon| {
				let exterior = ring(polygon.exterior())?;
				let interiors = polygon.interiors().iter().filter_map(ring).collect();
				Some(Polygon::new(exterior, interiors))
			})
			.collect(),
	)
}

/// Project border lines. A refused point splits its line, so no segment is
/// drawn across a region the projection cannot place.
pub fn project_lines(lines: &MultiLineString<f64>, project: &Projection) -> MultiLineString<f64> {
	let mut out = Vec::new();
	for line in lines {
		let mut run: Vec<Coord<f64>> = Vec::new();
		for c in line.coords() {
			match project(*c) {
				Some(p) => run.push(p),
				None if run.len() >= 2 => out.push(LineString::new(std::mem::take(&mut run))),
				None => run.clear(),
			}
		}
		if run.len() >= 2 {
			out.push(LineString::new(run));
		}
	}
	MultiLineString::new(out)
}
