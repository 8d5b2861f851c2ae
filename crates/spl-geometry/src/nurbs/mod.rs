//! NURBS core algorithms: knot vector utilities, De Boor evaluation,
//! knot insertion and refinement, Bezier decomposition.

pub mod decompose;
pub mod eval;
pub mod knot;
pub mod refine;

pub use knot::{basis_functions, ders_basis_functions, find_span};
pub use refine::Direction;
