//! Algebra backend for the two-board equation environment.
//!
//! [`AlgebraEngine`] is the interface the environment is written against;
//! [`SymbolicEngine`] implements it over canonical [`tb_ast::Expr`] trees
//! with exact rational arithmetic, factorization over Q, numeric root
//! finding and a Galois-group test for radical solvability.

pub mod budget;
pub mod engine;
pub mod error;
pub mod factorization;
pub mod galois;
pub mod numeric;
pub mod polynomial;
pub mod rational_roots;
pub mod simplify;
pub mod solve;
pub mod substitute;

pub use budget::{Budget, BudgetExceeded, Work};
pub use engine::{AlgebraEngine, EngineLimits, Root, Shape, SolvableGroup, SymbolicEngine};
pub use error::EngineError;
pub use galois::GaloisGroup;
pub use polynomial::Polynomial;
