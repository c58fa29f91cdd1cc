use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Inclusive range `[min, max]` a parameter value is allowed to take.
///
/// Serialized as `{"min": .., "max": ..}`, which is also the shape of a
/// constraint entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

/// Parameter name to permissible range.
pub type ParameterBounds<K> = BTreeMap<K, Bounds>;

impl Bounds {
    /// Creates bounds from two endpoints, in either order.
    #[must_use]
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            min: f64::min(a, b),
            max: f64::max(a, b),
        }
    }

    /// Creates bounds that admit a single value.
    #[must_use]
    pub const fn fixed(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Returns `true` if the range collapses to a single value.
    ///
    /// Such a parameter is a constant: sampling returns `min` and no operator
    /// divides by the width.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        self.width() <= f64::EPSILON * self.min.abs().max(1.0)
    }

    /// Returns `true` if both endpoints are finite numbers.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Clips `value` into the range. `NaN` maps to `min`.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        }
    }

    /// Position of `value` inside the range, in `[0, 1]`.
    ///
    /// Fixed ranges report `0.5`.
    #[must_use]
    pub fn position(&self, value: f64) -> f64 {
        if self.is_fixed() {
            0.5
        } else {
            ((self.clamp(value) - self.min) / self.width()).clamp(0.0, 1.0)
        }
    }

    /// Inverse of [`Bounds::position`].
    ///
    /// Interpolates between the endpoints without forming `max - min`, so a range
    /// wider than `f64::MAX` still yields a finite value.
    #[must_use]
    pub fn at_position(&self, position: f64) -> f64 {
        let t = position.clamp(0.0, 1.0);
        self.clamp(self.min * (1.0 - t) + self.max * t)
    }

    /// Returns the overlap of two ranges, or `None` if they are disjoint.
    #[must_use]
    pub fn intersect(&self, other: &Bounds) -> Option<Bounds> {
        let min = f64::max(self.min, other.min);
        let max = f64::min(self.max, other.max);
        (min <= max).then_some(Bounds { min, max })
    }

    /// Draws a value uniformly from the range.
    pub fn sample<R>(&self, rng: &mut R) -> f64
    where
        R: Rng + ?Sized,
    {
        if self.is_fixed() {
            self.min
        } else {
            self.at_position(rng.random::<f64>())
        }
    }
}

impl From<(f64, f64)> for Bounds {
    fn from((min, max): (f64, f64)) -> Self {
        Self::new(min, max)
    }
}
