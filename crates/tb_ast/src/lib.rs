pub mod build;
pub mod display;
pub mod equation;
pub mod expression;
pub mod ordering;
pub mod traversal;

pub use equation::Equation;
pub use expression::{is_builtin_function, Constant, Expr, BUILTIN_FUNCTIONS};
pub use traversal::{contains_variable, free_variables, has_undefined_function, rewrite};
