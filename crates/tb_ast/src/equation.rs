use crate::build;
use crate::expression::Expr;
use std::fmt;

/// `lhs = rhs`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Equation {
    pub lhs: Expr,
    pub rhs: Expr,
}

impl Equation {
    pub fn new(lhs: Expr, rhs: Expr) -> Self {
        Self { lhs, rhs }
    }

    /// `lhs - rhs`, the expression whose zeros solve the equation.
    pub fn difference(&self) -> Expr {
        build::sub(self.lhs.clone(), self.rhs.clone())
    }

    /// Applies `f` to both sides.
    pub fn map<F: FnMut(&Expr) -> Expr>(&self, mut f: F) -> Equation {
        Equation::new(f(&self.lhs), f(&self.rhs))
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}
