use std::ops::{Add, Div, Index, IndexMut, Mul, Neg, Sub};

pub use kurbo::{Rect, Vec2};

/// Tolerance used by every setter and comparison in the engine.
///
/// Changes smaller than this are treated as "no change" and do not notify observers.
pub const EPSILON: f64 = 1e-4;

/// Legacy encoding of an unset axis (any negative value reads back as unset).
pub const UNFIXED_SENTINEL: f64 = -1.0;

/// Scalar comparison with [`EPSILON`] tolerance.
pub fn nearly_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

/// One of the three layout axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Horizontal axis (left to right).
    X,
    /// Vertical axis (bottom to top).
    Y,
    /// Depth axis.
    Z,
}

impl Axis {
    /// All axes in component order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

/// Three-component vector used for positions, sizes and anchors.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// All components zero.
    pub const ZERO: Self = Self::splat(0.0);
    /// All components one.
    pub const ONE: Self = Self::splat(1.0);
    /// All components one half (centered anchor).
    pub const HALF: Self = Self::splat(0.5);

    /// Build a vector from components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Build a vector with every component set to `v`.
    pub const fn splat(v: f64) -> Self {
        Self { x: v, y: v, z: v }
    }

    /// Apply `f` to each component.
    pub fn map(self, mut f: impl FnMut(f64) -> f64) -> Self {
        Self::new(f(self.x), f(self.y), f(self.z))
    }

    /// Combine two vectors component by component.
    pub fn zip_map(self, other: Self, mut f: impl FnMut(f64, f64) -> f64) -> Self {
        Self::new(f(self.x, other.x), f(self.y, other.y), f(self.z, other.z))
    }

    /// Componentwise product.
    pub fn mul_elem(self, other: Self) -> Self {
        self.zip_map(other, |a, b| a * b)
    }

    /// Componentwise minimum.
    pub fn min_elem(self, other: Self) -> Self {
        self.zip_map(other, f64::min)
    }

    /// Componentwise maximum.
    pub fn max_elem(self, other: Self) -> Self {
        self.zip_map(other, f64::max)
    }

    /// Replace negative components with zero.
    pub fn clamp_non_negative(self) -> Self {
        self.map(|v| v.max(0.0))
    }

    /// True when every component is within [`EPSILON`] of `other`.
    pub fn nearly_eq(self, other: Self) -> bool {
        nearly_eq(self.x, other.x) && nearly_eq(self.y, other.y) && nearly_eq(self.z, other.z)
    }

    /// True when every component is `>= 0`.
    pub fn is_non_negative(self) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.z >= 0.0
    }

    /// Project onto the xy plane.
    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Copy with one axis replaced.
    pub fn with(mut self, axis: Axis, v: f64) -> Self {
        self[axis] = v;
        self
    }
}

impl Index<Axis> for Vec3 {
    type Output = f64;

    fn index(&self, axis: Axis) -> &f64 {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}

impl IndexMut<Axis> for Vec3 {
    fn index_mut(&mut self, axis: Axis) -> &mut f64 {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.zip_map(rhs, |a, b| a + b)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.zip_map(rhs, |a, b| a - b)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self {
        self.map(|v| -v)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self.map(|v| v * rhs)
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        self.map(|v| v / rhs)
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

/// Per-axis optional bound; `None` is an unfixed axis.
///
/// Legacy data encodes an unfixed axis as a negative number; [`Bound3::from_sentinel`] and
/// [`Bound3::to_sentinel`] convert between the two representations.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bound3 {
    /// X bound.
    pub x: Option<f64>,
    /// Y bound.
    pub y: Option<f64>,
    /// Z bound.
    pub z: Option<f64>,
}

impl Bound3 {
    /// Every axis unfixed.
    pub const UNFIXED: Self = Self {
        x: None,
        y: None,
        z: None,
    };

    /// Build a bound from per-axis options.
    pub const fn new(x: Option<f64>, y: Option<f64>, z: Option<f64>) -> Self {
        Self { x, y, z }
    }

    /// Every axis fixed to the matching component of `v`.
    pub const fn fixed(v: Vec3) -> Self {
        Self::new(Some(v.x), Some(v.y), Some(v.z))
    }

    /// Read legacy sentinel data: negative components become unfixed.
    pub fn from_sentinel(v: Vec3) -> Self {
        let axis = |c: f64| (c >= 0.0).then_some(c);
        Self::new(axis(v.x), axis(v.y), axis(v.z))
    }

    /// Write legacy sentinel data: unfixed axes become [`UNFIXED_SENTINEL`].
    pub fn to_sentinel(self) -> Vec3 {
        Vec3::new(
            self.x.unwrap_or(UNFIXED_SENTINEL),
            self.y.unwrap_or(UNFIXED_SENTINEL),
            self.z.unwrap_or(UNFIXED_SENTINEL),
        )
    }

    /// Bound on one axis.
    pub fn get(self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Replace the bound on one axis.
    pub fn set(&mut self, axis: Axis, v: Option<f64>) {
        match axis {
            Axis::X => self.x = v,
            Axis::Y => self.y = v,
            Axis::Z => self.z = v,
        }
    }

    /// True when no axis is fixed.
    pub fn is_unfixed(self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none()
    }

    /// Fixed axes taken from `self`, the rest from `fallback`.
    pub fn or(self, fallback: Vec3) -> Vec3 {
        Vec3::new(
            self.x.unwrap_or(fallback.x),
            self.y.unwrap_or(fallback.y),
            self.z.unwrap_or(fallback.z),
        )
    }

    /// Epsilon comparison; two unfixed axes are equal, fixed and unfixed never are.
    pub fn nearly_eq(self, other: Self) -> bool {
        Axis::ALL
            .iter()
            .all(|&axis| match (self.get(axis), other.get(axis)) {
                (None, None) => true,
                (Some(a), Some(b)) => nearly_eq(a, b),
                _ => false,
            })
    }
}

impl From<Vec3> for Bound3 {
    fn from(v: Vec3) -> Self {
        Self::fixed(v)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
