//! Value → visual mappings shared by every layer.
//!
//! Scales only remember their current domain. The controller builds a fresh
//! [`ScaleSet`] on every render pass and re-domains it from the active slice;
//! edge-weight scales are built per hover, one per direction.

use std::fmt;

pub const CASE_COLOR_LOW: Rgb = Rgb { r: 0x90, g: 0xEE, b: 0x90 };
pub const CASE_COLOR_HIGH: Rgb = Rgb { r: 0x80, g: 0x00, b: 0x26 };
pub const COLOR_EXPONENT: f64 = 0.25;

pub const RADIUS_RANGE: (f64, f64) = (1.0, 10.0);

pub const EDGE_WIDTH_RANGE: (f64, f64) = (1.0, 5.0);
pub const EDGE_EXPONENT: f64 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
	pub r: u8,
	pub g: u8,
	pub b: u8,
}

impl fmt::Display for Rgb {
	/// CSS form: `rgb(r, g, b)`.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
	}
}

/// Output types a scale can interpolate between.
pub trait Interpolate: Copy {
	fn interpolate(a: Self, b: Self, t: f64) -> Self;
}

impl Interpolate for f64 {
	fn interpolate(a: Self, b: Self, t: f64) -> Self {
		a + (b - a) * t
	}
}

impl Interpolate for Rgb {
	fn interpolate(a: Self, b: Self, t: f64) -> Self {
		let channel = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round().clamp(0.0, 255.0) as u8;
		Rgb {
			r: channel(a.r, b.r),
			g: channel(a.g, b.g),
			b: channel(a.b, b.b),
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Domain {
	pub min: f64,
	pub max: f64,
}

impl Domain {
	pub fn new(min: f64, max: f64) -> Self {
		Self { min, max }
	}

	/// `[0, max(values)]`, or `[0, 0]` when there is nothing finite.
	pub fn zero_to_max(values: impl IntoIterator<Item = f64>) -> Self {
		let max = values
			.into_iter()
			.filter(|v| v.is_finite())
			.fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))));
		Self::new(0.0, max.unwrap_or(0.0))
	}

	/// `[min(values), max(values)]`, or `[0, 0]` when there is nothing finite.
	pub fn extent(values: impl IntoIterator<Item = f64>) -> Self {
		values
			.into_iter()
			.filter(|v| v.is_finite())
			.fold(None, |acc: Option<Domain>, v| {
				Some(acc.map_or(Domain::new(v, v), |d| Domain::new(d.min.min(v), d.max.max(v))))
			})
			.unwrap_or_default()
	}

	pub fn is_degenerate(&self) -> bool {
		self.min == self.max
	}
}

/// Sign-preserving power, so negative inputs stay ordered.
fn powish(x: f64, exponent: f64) -> f64 {
	if x < 0.0 { -(-x).powf(exponent) } else { x.powf(exponent) }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
	pub domain: Domain,
	pub range: (f64, f64),
}

impl LinearScale {
	pub fn new(range: (f64, f64)) -> Self {
		Self {
			domain: Domain::default(),
			range,
		}
	}

	/// Unclamped: values outside the domain extrapolate past the range.
	pub fn apply(&self, x: f64) -> f64 {
		let Domain { min, max } = self.domain;
		let t = if self.domain.is_degenerate() { 0.0 } else { (x - min) / (max - min) };
		f64::interpolate(self.range.0, self.range.1, t)
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PowScale<R: Interpolate> {
	pub exponent: f64,
	pub domain: Domain,
	pub range: (R, R),
}

impl<R: Interpolate> PowScale<R> {
	pub fn new(exponent: f64, range: (R, R)) -> Self {
		Self {
			exponent,
			domain: Domain::default(),
			range,
		}
	}

	/// A degenerate domain maps everything to the range start.
	pub fn apply(&self, x: f64) -> R {
		let (lo, hi) = (powish(self.domain.min, self.exponent), powish(self.domain.max, self.exponent));
		let t = if lo == hi { 0.0 } else { (powish(x, self.exponent) - lo) / (hi - lo) };
		let t = if t.is_finite() { t } else { 0.0 };
		R::interpolate(self.range.0, self.range.1, t)
	}
}

/// The scales every render pass is built from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleSet {
	pub color: PowScale<Rgb>,
	pub radius: LinearScale,
}

impl Default for ScaleSet {
	fn default() -> Self {
		Self {
			color: PowScale::new(COLOR_EXPONENT, (CASE_COLOR_LOW, CASE_COLOR_HIGH)),
			radius: LinearScale::new(RADIUS_RANGE),
		}
	}
}

impl ScaleSet {
	pub fn rescale_color(&mut self, values: impl IntoIterator<Item = f64>) {
		self.color.domain = Domain::zero_to_max(values);
	}

	pub fn rescale_radius(&mut self, values: impl IntoIterator<Item = f64>) {
		self.radius.domain = Domain::extent(values);
	}
}

/// Stroke-width scale for one airport's edges in one direction.
pub fn rescale_edge_weight(values: impl IntoIterator<Item = f64>) -> PowScale<f64> {
	let mut scale = PowScale::new(EDGE_EXPONENT, EDGE_WIDTH_RANGE);
	scale.domain = Domain::zero_to_max(values);
	scale
}
