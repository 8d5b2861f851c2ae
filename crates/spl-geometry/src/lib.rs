//! SplineEngine geometry: power-basis, Bezier, B-spline, and NURBS
//! curves and surfaces.
//!
//! Evaluation, derivatives, knot insertion, knot refinement, and Bezier
//! decomposition over immutable value types. Refinement operations return
//! new objects; nothing mutates in place.

pub mod curve;
pub mod nurbs;
pub mod surface;

pub use curve::Curve;
pub use surface::Surface;
