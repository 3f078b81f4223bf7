use num::Float;
use std::fmt::Display;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A 3D vector generic over any floating point type.
///
/// Used both for orbital parameter triples `(altitude, inclination, eccentricity)`
/// and for cartesian visualisation coordinates.
///
/// # Type Parameters
/// * `T` - The component type, usually `f64`.
#[derive(Debug, PartialEq, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct Vec3D<T> {
    /// The first component.
    x: T,
    /// The second component.
    y: T,
    /// The third component.
    z: T,
}

impl<T: Copy> Vec3D<T> {
    /// Creates a new vector with the given components.
    ///
    /// # Arguments
    /// * `x` - The first component.
    /// * `y` - The second component.
    /// * `z` - The third component.
    pub const fn new(x: T, y: T, z: T) -> Self { Self { x, y, z } }

    /// Returns the first component.
    pub const fn x(&self) -> T { self.x }

    /// Returns the second component.
    pub const fn y(&self) -> T { self.y }

    /// Returns the third component.
    pub const fn z(&self) -> T { self.z }

    /// Returns the components as an array in `(x, y, z)` order.
    pub const fn to_array(self) -> [T; 3] { [self.x, self.y, self.z] }
}

impl<T: Float> Vec3D<T> {
    /// Creates a zero vector (x = 0, y = 0, z = 0).
    pub fn zero() -> Self { Self::new(T::zero(), T::zero(), T::zero()) }

    /// Computes the Euclidean norm of the vector.
    ///
    /// # Returns
    /// The magnitude `sqrt(x² + y² + z²)`.
    pub fn abs(&self) -> T { (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt() }

    /// Creates a vector pointing from `self` to `other`, i.e. `other - self`.
    ///
    /// # Arguments
    /// * `other` - The target vector.
    pub fn to(&self, other: &Vec3D<T>) -> Vec3D<T> { *other - *self }

    /// Computes the Euclidean distance between `self` and `other`.
    pub fn euclid_distance(&self, other: &Self) -> T { self.to(other).abs() }

    /// Checks whether every component is finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Tries to build a vector from a slice.
    ///
    /// # Returns
    /// `None` if `values` does not hold exactly three elements.
    pub fn from_slice(values: &[T]) -> Option<Self> {
        match values {
            [x, y, z] => Some(Self::new(*x, *y, *z)),
            _ => None,
        }
    }
}

impl<T: Float> Add for Vec3D<T> {
    type Output = Vec3D<T>;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl<T: Float> AddAssign for Vec3D<T> {
    fn add_assign(&mut self, rhs: Self) { *self = *self + rhs; }
}

impl<T: Float> Sub for Vec3D<T> {
    type Output = Vec3D<T>;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl<T: Float> Neg for Vec3D<T> {
    type Output = Vec3D<T>;

    fn neg(self) -> Self::Output { Self::new(-self.x, -self.y, -self.z) }
}

impl<T: Float> Mul<T> for Vec3D<T> {
    type Output = Vec3D<T>;

    /// Implements the `*` operator for a `Vec3D` and a scalar.
    fn mul(self, rhs: T) -> Self::Output { Self::new(self.x * rhs, self.y * rhs, self.z * rhs) }
}

impl<T: Display> Display for Vec3D<T> {
    /// Formats as `[x, y, z]`, honouring a requested precision for every component.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "[{:.p$}, {:.p$}, {:.p$}]", self.x, self.y, self.z),
            None => write!(f, "[{}, {}, {}]", self.x, self.y, self.z),
        }
    }
}
