//! The algebra backend interface and its default implementation.

use crate::budget::{Budget, Work};
use crate::error::EngineError;
use crate::factorization::factor_over_rationals;
use crate::galois::{galois_group, GaloisGroup};
use crate::numeric::evaluate;
use crate::polynomial::Polynomial;
use crate::{simplify, solve, substitute};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;
use tb_ast::{build, Expr};

/// A root of a univariate equation: an exact closed form when one is
/// known, and always a numeric approximation.
#[derive(Debug, Clone, PartialEq)]
pub struct Root<E> {
    pub exact: Option<E>,
    pub approx: Complex64,
    /// Square-free polynomial in the solved variable that vanishes here.
    pub factor: Option<E>,
}

pub trait SolvableGroup {
    fn is_solvable(&self) -> bool;
    fn name(&self) -> String;
}

impl SolvableGroup for GaloisGroup {
    fn is_solvable(&self) -> bool {
        GaloisGroup::is_solvable(self)
    }

    fn name(&self) -> String {
        GaloisGroup::name(self)
    }
}

/// Top-level structure of an expression, as far as callers need to walk it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape<E> {
    Number,
    Symbol(String),
    Sum(Vec<E>),
    Product(Vec<E>),
    Power {
        base: E,
        exponent: E,
        /// The exponent, when it is an integer that fits in `i64`.
        integer_exponent: Option<i64>,
    },
    /// Constants and function applications.
    Other(Vec<E>),
}

/// Everything the environment asks of a computer algebra system.
///
/// Expressions are values: every operation returns a new expression and
/// structurally equal expressions compare equal.
pub trait AlgebraEngine {
    type Expr: Clone + Eq + Ord + Hash + fmt::Debug + fmt::Display;
    type Poly: Clone + fmt::Debug + fmt::Display;
    type Group: SolvableGroup + Clone + fmt::Debug;

    fn parse(&self, text: &str) -> Result<Self::Expr, EngineError>;
    /// `(lhs, rhs)`; a bare expression `e` reads as `e = 0`.
    fn parse_equation(&self, text: &str) -> Result<(Self::Expr, Self::Expr), EngineError>;

    fn number(&self, n: i64) -> Self::Expr;
    fn symbol(&self, name: &str) -> Self::Expr;
    fn add(&self, a: &Self::Expr, b: &Self::Expr) -> Self::Expr;
    fn sub(&self, a: &Self::Expr, b: &Self::Expr) -> Self::Expr;
    fn mul(&self, a: &Self::Expr, b: &Self::Expr) -> Self::Expr;
    /// Division by an exact zero yields the engine's undefined value.
    fn div(&self, a: &Self::Expr, b: &Self::Expr) -> Self::Expr;
    fn pow(&self, base: &Self::Expr, exponent: &Self::Expr) -> Self::Expr;
    fn neg(&self, a: &Self::Expr) -> Self::Expr;

    fn shape(&self, e: &Self::Expr) -> Shape<Self::Expr>;
    fn free_variables(&self, e: &Self::Expr) -> BTreeSet<String>;
    fn has_undefined_function(&self, e: &Self::Expr) -> bool;
    /// True for values produced by invalid operations such as `1/0`.
    fn is_undefined(&self, e: &Self::Expr) -> bool;
    /// Exact zero test, simplifying first.
    fn is_zero(&self, e: &Self::Expr) -> bool;
    fn numeric_value(&self, e: &Self::Expr) -> Option<Complex64>;

    fn simplify(&self, e: &Self::Expr) -> Result<Self::Expr, EngineError>;
    fn expand(&self, e: &Self::Expr) -> Result<Self::Expr, EngineError>;
    fn factor(&self, e: &Self::Expr) -> Result<Self::Expr, EngineError>;
    fn collect(&self, e: &Self::Expr, var: &str) -> Result<Self::Expr, EngineError>;
    fn substitute(
        &self,
        e: &Self::Expr,
        target: &Self::Expr,
        replacement: &Self::Expr,
    ) -> Result<Self::Expr, EngineError>;

    /// Irreducible factors over Q with multiplicities; fails when `e` is not
    /// a polynomial in `var`.
    fn factor_polynomial(
        &self,
        e: &Self::Expr,
        var: &str,
    ) -> Result<Vec<(Self::Poly, u32)>, EngineError>;
    fn degree(&self, p: &Self::Poly) -> usize;
    fn galois_group(&self, p: &Self::Poly) -> Result<Self::Group, EngineError>;
    fn solve_for_roots(&self, e: &Self::Expr, var: &str)
        -> Result<Vec<Root<Self::Expr>>, EngineError>;
}

/// Work limits applied to every engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineLimits {
    /// Terms produced while expanding a single expression.
    pub max_expand_terms: u64,
    /// Largest polynomial degree converted from an expression.
    pub max_degree: usize,
    /// Largest square-free part split by the numeric factor search.
    pub max_factor_degree: usize,
    /// Durand-Kerner sweeps per root-finding call.
    pub max_root_iterations: u64,
    /// Candidate checks and polynomial divisions.
    pub max_poly_ops: u64,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_expand_terms: 20_000,
            max_degree: 64,
            max_factor_degree: 12,
            max_root_iterations: 5_000,
            max_poly_ops: 100_000,
        }
    }
}

impl EngineLimits {
    pub fn budget(&self) -> Budget {
        Budget::new()
            .with_limit(Work::ExpandTerms, self.max_expand_terms)
            .with_limit(Work::RootSweeps, self.max_root_iterations)
            .with_limit(Work::FactorCandidates, self.max_poly_ops)
            .with_limit(Work::PolyDivisions, self.max_poly_ops)
    }
}

/// The built-in engine over canonical [`Expr`] trees.
#[derive(Debug, Clone, Default)]
pub struct SymbolicEngine {
    limits: EngineLimits,
}

impl SymbolicEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: EngineLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &EngineLimits {
        &self.limits
    }
}

impl AlgebraEngine for SymbolicEngine {
    type Expr = Expr;
    type Poly = Polynomial;
    type Group = GaloisGroup;

    fn parse(&self, text: &str) -> Result<Expr, EngineError> {
        Ok(tb_parser::parse(text)?)
    }

    fn parse_equation(&self, text: &str) -> Result<(Expr, Expr), EngineError> {
        let eq = tb_parser::parse_equation(text)?;
        Ok((eq.lhs, eq.rhs))
    }

    fn number(&self, n: i64) -> Expr {
        Expr::int(n)
    }

    fn symbol(&self, name: &str) -> Expr {
        Expr::var(name)
    }

    fn add(&self, a: &Expr, b: &Expr) -> Expr {
        build::add2(a.clone(), b.clone())
    }

    fn sub(&self, a: &Expr, b: &Expr) -> Expr {
        build::sub(a.clone(), b.clone())
    }

    fn mul(&self, a: &Expr, b: &Expr) -> Expr {
        build::mul2(a.clone(), b.clone())
    }

    fn div(&self, a: &Expr, b: &Expr) -> Expr {
        build::div(a.clone(), b.clone())
    }

    fn pow(&self, base: &Expr, exponent: &Expr) -> Expr {
        build::pow(base.clone(), exponent.clone())
    }

    fn neg(&self, a: &Expr) -> Expr {
        build::neg(a.clone())
    }

    fn shape(&self, e: &Expr) -> Shape<Expr> {
        match e {
            Expr::Number(_) => Shape::Number,
            Expr::Variable(name) => Shape::Symbol(name.clone()),
            Expr::Add(terms) => Shape::Sum(terms.clone()),
            Expr::Mul(factors) => Shape::Product(factors.clone()),
            Expr::Pow(base, exp) => Shape::Power {
                base: base.as_ref().clone(),
                exponent: exp.as_ref().clone(),
                integer_exponent: exp.as_i64(),
            },
            Expr::Constant(_) => Shape::Other(Vec::new()),
            Expr::Function(_, args) => Shape::Other(args.clone()),
        }
    }

    fn free_variables(&self, e: &Expr) -> BTreeSet<String> {
        tb_ast::free_variables(e)
    }

    fn has_undefined_function(&self, e: &Expr) -> bool {
        tb_ast::has_undefined_function(e)
    }

    fn is_undefined(&self, e: &Expr) -> bool {
        e.is_undefined()
    }

    fn is_zero(&self, e: &Expr) -> bool {
        e.is_zero() || self.simplify(e).is_ok_and(|s| s.is_zero())
    }

    fn numeric_value(&self, e: &Expr) -> Option<Complex64> {
        evaluate(e)
    }

    fn simplify(&self, e: &Expr) -> Result<Expr, EngineError> {
        simplify::simplify(e, self.limits.max_degree, &mut self.limits.budget())
    }

    fn expand(&self, e: &Expr) -> Result<Expr, EngineError> {
        Ok(simplify::expand(e, &mut self.limits.budget())?)
    }

    fn factor(&self, e: &Expr) -> Result<Expr, EngineError> {
        simplify::factor(
            e,
            self.limits.max_degree,
            self.limits.max_factor_degree,
            &mut self.limits.budget(),
        )
    }

    fn collect(&self, e: &Expr, var: &str) -> Result<Expr, EngineError> {
        Ok(simplify::collect(e, var, &mut self.limits.budget())?)
    }

    fn substitute(&self, e: &Expr, target: &Expr, replacement: &Expr) -> Result<Expr, EngineError> {
        Ok(substitute::substitute(e, target, replacement))
    }

    fn factor_polynomial(&self, e: &Expr, var: &str) -> Result<Vec<(Polynomial, u32)>, EngineError> {
        let mut budget = self.limits.budget();
        let expanded = simplify::expand(e, &mut budget)?;
        let poly = Polynomial::from_expr_bounded(&expanded, var, self.limits.max_degree)
            .ok_or_else(|| EngineError::NotPolynomial {
                expr: e.to_string(),
                var: var.to_string(),
            })?;
        let list = factor_over_rationals(&poly, self.limits.max_factor_degree, &mut budget)?;
        Ok(list.factors)
    }

    fn degree(&self, p: &Polynomial) -> usize {
        p.degree()
    }

    fn galois_group(&self, p: &Polynomial) -> Result<GaloisGroup, EngineError> {
        galois_group(p, &mut self.limits.budget())
    }

    fn solve_for_roots(&self, e: &Expr, var: &str) -> Result<Vec<Root<Expr>>, EngineError> {
        solve::solve_for_roots(e, var, &self.limits, &mut self.limits.budget())
    }
}
