//! Boundary topology decoding: county polygons, shared-arc border meshes and
//! the nation outline, all from one TopoJSON resource laid out with
//! `counties`, `states` and `nation` objects.

use std::collections::BTreeMap;

use geo::{Coord, LineString, MultiLineString, MultiPolygon, Polygon};
use log::debug;
use topojson::{Geometry, TopoJson, Topology, Value};

use super::error::DashboardError;
use super::types::{CountyBoundaries, CountyFeature, CountyId};

const RESOURCE: &str = "boundary topology";

type DecodedArc = Vec<Coord<f64>>;

/// Arcs in lon/lat. Quantized topologies store delta-encoded integer
/// positions that the transform maps back.
fn decode_arcs(topology: &Topology) -> Vec<DecodedArc> {
	topology
		.arcs
		.iter()
		.map(|arc| {
			let (mut x, mut y) = (0.0, 0.0);
			arc.iter()
				.filter(|p| p.len() >= 2)
				.map(|p| match &topology.transform {
					Some(t) => {
						x += p[0];
						y += p[1];
						Coord {
							x: x * t.scale[0] + t.translate[0],
							y: y * t.scale[1] + t.translate[1],
						}
					}
					None => Coord { x: p[0], y: p[1] },
				})
				.collect()
		})
		.collect()
}

/// A negative index `~i` refers to arc `i` walked backwards.
fn arc_slot(index: i32) -> usize {
	if index < 0 { !index as usize } else { index as usize }
}

/// Joins arcs end to start; each arc repeats the previous one's last point.
fn stitch(arcs: &[DecodedArc], indexes: &[i32]) -> LineString<f64> {
	let mut coords: Vec<Coord<f64>> = Vec::new();
	for &index in indexes {
		let Some(arc) = arcs.get(arc_slot(index)) else {
			debug!("{RESOURCE}: arc {index} out of range");
			continue;
		};
		coords.pop();
		if index < 0 {
			coords.extend(arc.iter().rev());
		} else {
			coords.extend(arc.iter());
		}
	}
	LineString::new(coords)
}

fn polygon(arcs: &[DecodedArc], rings: &[Vec<i32>]) -> Option<Polygon<f64>> {
	let (exterior, interiors) = rings.split_first()?;
	Some(Polygon::new(
		stitch(arcs, exterior),
		interiors.iter().map(|r| stitch(arcs, r)).collect(),
	))
}

fn shape(arcs: &[DecodedArc], value: &Value) -> Option<MultiPolygon<f64>> {
	match value {
		Value::Polygon(rings) => polygon(arcs, rings).map(|p| MultiPolygon::new(vec![p])),
		Value::MultiPolygon(polygons) => Some(polygons.iter().filter_map(|p| polygon(arcs, p)).collect()),
		_ => None,
	}
}

/// Every arc index a geometry walks, in order.
fn arc_indexes(value: &Value) -> Vec<i32> {
	match value {
		Value::LineString(line) => line.clone(),
		Value::MultiLineString(lines) | Value::Polygon(lines) => lines.concat(),
		Value::MultiPolygon(polygons) => polygons.iter().flat_map(|p| p.concat()).collect(),
		_ => Vec::new(),
	}
}

fn object<'a>(topology: &'a Topology, name: &str) -> Result<&'a Geometry, DashboardError> {
	topology
		.objects
		.iter()
		.find(|o| o.name == name)
		.map(|o| &o.geometry)
		.ok_or_else(|| DashboardError::parse(RESOURCE, format!("no `{name}` object")))
}

/// The member geometries of an object: a collection's children, or itself.
fn members(geometry: &Geometry) -> Vec<&Geometry> {
	match &geometry.value {
		Value::GeometryCollection(children) => children.iter().collect(),
		_ => vec![geometry],
	}
}

/// Arcs whose first and last user are different members, i.e. interior
/// borders. Arcs on the outer edge of the object have a single user.
fn shared_mesh(arcs: &[DecodedArc], members: &[&Geometry]) -> MultiLineString<f64> {
	let mut users: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
	for (member, geometry) in members.iter().enumerate() {
		for index in arc_indexes(&geometry.value) {
			users
				.entry(arc_slot(index))
				.and_modify(|(_, last)| *last = member)
				.or_insert((member, member));
		}
	}
	users
		.into_iter()
		.filter(|(_, (first, last))| first != last)
		.filter_map(|(slot, _)| arcs.get(slot))
		.map(|arc| LineString::new(arc.clone()))
		.collect()
}

fn outline(arcs: &[DecodedArc], members: &[&Geometry]) -> MultiLineString<f64> {
	members
		.iter()
		.filter_map(|g| shape(arcs, &g.value))
		.flat_map(|shape| shape.0)
		.flat_map(|p| {
			let (exterior, interiors) = p.into_inner();
			std::iter::once(exterior).chain(interiors)
		})
		.collect()
}

/// County ids come as zero-padded strings (`"01001"`) or plain numbers.
fn county_id(geometry: &Geometry) -> Option<CountyId> {
	match serde_json::to_value(&geometry.id).ok()? {
		serde_json::Value::String(s) => s.trim().parse().ok(),
		serde_json::Value::Number(n) => CountyId::try_from(n.as_u64()?).ok(),
		_ => None,
	}
}

fn county(arcs: &[DecodedArc], geometry: &Geometry) -> Option<CountyFeature> {
	let Some(id) = county_id(geometry) else {
		debug!("{RESOURCE}: county without a usable id");
		return None;
	};
	let name = geometry
		.properties
		.as_ref()
		.and_then(|p| p.get("name"))
		.and_then(|v| v.as_str())
		.unwrap_or_default()
		.to_string();
	let Some(geometry) = shape(arcs, &geometry.value) else {
		debug!("{RESOURCE}: county {id} has no polygon geometry");
		return None;
	};
	Some(CountyFeature { id, name, geometry })
}

pub fn parse_boundaries(text: &str) -> Result<CountyBoundaries, DashboardError> {
	let topology = match text.parse::<TopoJson>().map_err(|e| DashboardError::parse(RESOURCE, e))? {
		TopoJson::Topology(topology) => topology,
		_ => return Err(DashboardError::parse(RESOURCE, "expected a Topology")),
	};
	let arcs = decode_arcs(&topology);

	let counties = members(object(&topology, "counties")?);
	let states = members(object(&topology, "states")?);
	let nation = members(object(&topology, "nation")?);

	Ok(CountyBoundaries {
		counties: counties.iter().filter_map(|g| county(&arcs, g)).collect(),
		county_mesh: shared_mesh(&arcs, &counties),
		state_mesh: shared_mesh(&arcs, &states),
		nation: outline(&arcs, &nation),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	// Two unit squares side by side sharing arc 0, the edge x = 0. One state
	// covers both, and the nation is that state.
	const TWO_COUNTIES: &str = r#"{
		"type": "Topology",
		"arcs": [
			[[0, 0], [0, 1]],
			[[0, 1], [-1, 1], [-1, 0], [0, 0]],
			[[0, 0], [1, 0], [1, 1], [0, 1]]
		],
		"objects": {
			"counties": {"type": "GeometryCollection", "geometries": [
				{"type": "Polygon", "id": "01001", "properties": {"name": "A"}, "arcs": [[0, 1]]},
				{"type": "Polygon", "id": 1003, "properties": {"name": "B"}, "arcs": [[2, -1]]}
			]},
			"states": {"type": "GeometryCollection", "geometries": [
				{"type": "Polygon", "id": "01", "arcs": [[1, 2]]}
			]},
			"nation": {"type": "GeometryCollection", "geometries": [
				{"type": "Polygon", "arcs": [[1, 2]]}
			]}
		}
	}"#;

	fn points(line: &LineString<f64>) -> Vec<(f64, f64)> {
		line.coords().map(|c| (c.x, c.y)).collect()
	}

	#[test]
	fn counties_are_stitched_from_arcs() {
		let boundaries = parse_boundaries(TWO_COUNTIES).unwrap();
		let ids: Vec<_> = boundaries.counties.iter().map(|c| (c.id, c.name.as_str())).collect();
		assert_eq!(ids, [(1001, "A"), (1003, "B")]);

		let b = boundaries.counties[1].geometry.0[0].exterior();
		assert_eq!(points(b), [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]);
	}

	#[test]
	fn meshes_keep_only_shared_arcs() {
		let boundaries = parse_boundaries(TWO_COUNTIES).unwrap();
		assert_eq!(boundaries.county_mesh.0.len(), 1);
		assert_eq!(points(&boundaries.county_mesh.0[0]), [(0.0, 0.0), (0.0, 1.0)]);
		// a single state has no interior borders
		assert!(boundaries.state_mesh.0.is_empty());
		assert_eq!(boundaries.nation.0.len(), 1);
		assert_eq!(boundaries.nation.0[0].0.len(), 7);
	}

	#[test]
	fn quantized_arcs_are_delta_decoded() {
		let text = r#"{
			"type": "Topology",
			"transform": {"scale": [0.5, 0.5], "translate": [-1, 0]},
			"arcs": [[[2, 0], [0, 2]]],
			"objects": {
				"counties": {"type": "GeometryCollection", "geometries": []},
				"states": {"type": "GeometryCollection", "geometries": []},
				"nation": {"type": "LineString", "arcs": [0]}
			}
		}"#;
		let topology = match text.parse::<TopoJson>().unwrap() {
			TopoJson::Topology(t) => t,
			_ => panic!("not a topology"),
		};
		let arcs = decode_arcs(&topology);
		assert_eq!(arcs, vec![vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 1.0 }]]);
	}

	#[test]
	fn missing_objects_are_a_parse_error() {
		let text = r#"{"type": "Topology", "arcs": [], "objects": {}}"#;
		assert!(matches!(parse_boundaries(text), Err(DashboardError::Parse { .. })));
		assert!(matches!(parse_boundaries("{"), Err(DashboardError::Parse { .. })));
	}
}
