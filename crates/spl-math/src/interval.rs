use serde::{Deserialize, Serialize};
use spl_core::{Result, SplError};

/// A closed parameter interval `[lo, hi]` with `lo < hi`.
///
/// Curves and surfaces expose an external interval that may differ from the
/// native domain of their knot vector; [`Interval::map_to`] performs the
/// affine remap between the two.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Interval {
    pub fn new(lo: f64, hi: f64) -> Result<Self> {
        if lo >= hi {
            return Err(SplError::Geometry(format!(
                "Interval requires lo < hi, got [{}, {}]",
                lo, hi
            )));
        }
        Ok(Self { lo, hi })
    }

    /// The unit interval `[0, 1]`.
    pub const UNIT: Interval = Interval { lo: 0.0, hi: 1.0 };

    pub fn length(&self) -> f64 {
        self.hi - self.lo
    }

    /// Clamp `t` into the interval.
    pub fn clamp(&self, t: f64) -> f64 {
        t.clamp(self.lo, self.hi)
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.lo && t <= self.hi
    }

    /// Point at normalized position `s` in `[0, 1]`.
    pub fn lerp(&self, s: f64) -> f64 {
        self.lo + s * (self.hi - self.lo)
    }

    /// Normalized position of `t` within the interval.
    pub fn normalize(&self, t: f64) -> f64 {
        (t - self.lo) / (self.hi - self.lo)
    }

    /// Affinely map `t` from this interval onto `other`.
    ///
    /// `t` is clamped into this interval first, so the result always lies
    /// inside `other`.
    pub fn map_to(&self, other: &Interval, t: f64) -> f64 {
        other.lerp(self.normalize(self.clamp(t)))
    }

    /// Chain-rule scale factor relating derivatives taken with respect to
    /// this interval's parameter to derivatives with respect to `other`'s.
    pub fn derivative_scale(&self, other: &Interval) -> f64 {
        other.length() / self.length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_rejects_degenerate() {
        assert!(Interval::new(1.0, 1.0).is_err());
        assert!(Interval::new(2.0, 1.0).is_err());
        assert!(Interval::new(0.0, 1.0).is_ok());
    }

    #[test]
    fn test_clamp() {
        let iv = Interval::new(0.0, 2.0).unwrap();
        assert_eq!(iv.clamp(-1.0), 0.0);
        assert_eq!(iv.clamp(3.0), 2.0);
        assert_eq!(iv.clamp(1.5), 1.5);
    }

    #[test]
    fn test_map_to() {
        let ext = Interval::UNIT;
        let knots = Interval::new(2.0, 6.0).unwrap();
        assert_relative_eq!(ext.map_to(&knots, 0.0), 2.0);
        assert_relative_eq!(ext.map_to(&knots, 0.5), 4.0);
        assert_relative_eq!(ext.map_to(&knots, 1.0), 6.0);
        // Out-of-range parameters clamp before mapping
        assert_relative_eq!(ext.map_to(&knots, 1.5), 6.0);
    }

    #[test]
    fn test_derivative_scale() {
        let ext = Interval::UNIT;
        let knots = Interval::new(0.0, 4.0).unwrap();
        assert_relative_eq!(ext.derivative_scale(&knots), 4.0);
    }
}
