//! Power-basis (monomial) curves.

use serde::{Deserialize, Serialize};
use spl_core::{Result, SplError};
use spl_math::{DVec3, Interval, Point3, Vector3};

use super::Curve;

/// A curve in the power basis: `C(t) = sum_i coefficients[i] * t^i`,
/// evaluated by Horner's scheme over a parameter interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerBasisCurve {
    pub coefficients: Vec<Vector3>,
    pub interval: Interval,
}

impl PowerBasisCurve {
    pub fn new(coefficients: Vec<Vector3>) -> Result<Self> {
        Self::with_interval(coefficients, Interval::UNIT)
    }

    pub fn with_interval(coefficients: Vec<Vector3>, interval: Interval) -> Result<Self> {
        if coefficients.is_empty() {
            return Err(SplError::Geometry(
                "Power-basis curve requires at least one coefficient".into(),
            ));
        }
        Ok(Self {
            coefficients,
            interval,
        })
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Horner evaluation of the coefficient vector at clamped `t`.
    fn horner(coefficients: &[Vector3], t: f64) -> Point3 {
        coefficients
            .iter()
            .rev()
            .fold(DVec3::ZERO, |acc, &c| acc * t + c)
    }

    /// Evaluate the curve and its derivatives up to `order` at `t`.
    ///
    /// Entry 0 is the point; entries above the degree are zero. Derivative
    /// coefficients come from shifting the coefficient vector.
    pub fn derivatives(&self, t: f64, order: usize) -> Vec<Vector3> {
        let t = self.interval.clamp(t);
        let mut result = Vec::with_capacity(order + 1);
        let mut coefficients = self.coefficients.clone();

        for _ in 0..=order {
            if coefficients.is_empty() {
                result.push(DVec3::ZERO);
                continue;
            }
            result.push(Self::horner(&coefficients, t));
            // Differentiate: a_i t^i -> i a_i t^(i-1)
            coefficients = coefficients
                .iter()
                .enumerate()
                .skip(1)
                .map(|(i, &c)| i as f64 * c)
                .collect();
        }

        result
    }
}

impl Curve for PowerBasisCurve {
    fn point_at(&self, t: f64) -> Point3 {
        Self::horner(&self.coefficients, self.interval.clamp(t))
    }

    fn domain(&self) -> (f64, f64) {
        (self.interval.lo, self.interval.hi)
    }
}
