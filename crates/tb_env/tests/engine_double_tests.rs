//! Episodes over engines that fail in controlled ways.

use num_complex::Complex64;
use std::collections::BTreeSet;
use tb_ast::Expr;
use tb_engine::{
    AlgebraEngine, EngineError, GaloisGroup, Polynomial, Root, Shape, SymbolicEngine,
};
use tb_env::{assess_solvability, Action, EnvConfig, Episode, Solvability};

/// Delegates to [`SymbolicEngine`] except where a flag says to fail.
#[derive(Default)]
struct Faulty {
    inner: SymbolicEngine,
    galois_fails: bool,
    factoring_fails: bool,
}

impl AlgebraEngine for Faulty {
    type Expr = Expr;
    type Poly = Polynomial;
    type Group = GaloisGroup;

    fn parse(&self, text: &str) -> Result<Expr, EngineError> {
        self.inner.parse(text)
    }
    fn parse_equation(&self, text: &str) -> Result<(Expr, Expr), EngineError> {
        self.inner.parse_equation(text)
    }
    fn number(&self, n: i64) -> Expr {
        self.inner.number(n)
    }
    fn symbol(&self, name: &str) -> Expr {
        self.inner.symbol(name)
    }
    fn add(&self, a: &Expr, b: &Expr) -> Expr {
        self.inner.add(a, b)
    }
    fn sub(&self, a: &Expr, b: &Expr) -> Expr {
        self.inner.sub(a, b)
    }
    fn mul(&self, a: &Expr, b: &Expr) -> Expr {
        self.inner.mul(a, b)
    }
    fn div(&self, a: &Expr, b: &Expr) -> Expr {
        self.inner.div(a, b)
    }
    fn pow(&self, base: &Expr, exponent: &Expr) -> Expr {
        self.inner.pow(base, exponent)
    }
    fn neg(&self, a: &Expr) -> Expr {
        self.inner.neg(a)
    }
    fn shape(&self, e: &Expr) -> Shape<Expr> {
        self.inner.shape(e)
    }
    fn free_variables(&self, e: &Expr) -> BTreeSet<String> {
        self.inner.free_variables(e)
    }
    fn has_undefined_function(&self, e: &Expr) -> bool {
        self.inner.has_undefined_function(e)
    }
    fn is_undefined(&self, e: &Expr) -> bool {
        self.inner.is_undefined(e)
    }
    fn is_zero(&self, e: &Expr) -> bool {
        self.inner.is_zero(e)
    }
    fn numeric_value(&self, e: &Expr) -> Option<Complex64> {
        self.inner.numeric_value(e)
    }
    fn simplify(&self, e: &Expr) -> Result<Expr, EngineError> {
        self.inner.simplify(e)
    }
    fn expand(&self, e: &Expr) -> Result<Expr, EngineError> {
        self.inner.expand(e)
    }
    fn factor(&self, e: &Expr) -> Result<Expr, EngineError> {
        self.inner.factor(e)
    }
    fn collect(&self, e: &Expr, var: &str) -> Result<Expr, EngineError> {
        self.inner.collect(e, var)
    }
    fn substitute(&self, e: &Expr, target: &Expr, replacement: &Expr) -> Result<Expr, EngineError> {
        self.inner.substitute(e, target, replacement)
    }
    fn factor_polynomial(&self, e: &Expr, var: &str) -> Result<Vec<(Polynomial, u32)>, EngineError> {
        if self.factoring_fails {
            return Err(EngineError::Numeric("factoring disabled".into()));
        }
        self.inner.factor_polynomial(e, var)
    }
    fn degree(&self, p: &Polynomial) -> usize {
        self.inner.degree(p)
    }
    fn galois_group(&self, p: &Polynomial) -> Result<GaloisGroup, EngineError> {
        if self.galois_fails {
            return Err(EngineError::Undecidable("Galois group disabled".into()));
        }
        self.inner.galois_group(p)
    }
    fn solve_for_roots(&self, e: &Expr, var: &str) -> Result<Vec<Root<Expr>>, EngineError> {
        self.inner.solve_for_roots(e, var)
    }
}

fn declare_unsolvable(engine: Faulty, text: &str) -> f64 {
    let mut ep = Episode::from_text(engine, text, None, EnvConfig::multi_root()).unwrap();
    ep.step(Action::DeclareUnsolvable).unwrap()
}

#[test]
fn galois_failure_scores_as_wrong() {
    let engine = Faulty {
        galois_fails: true,
        ..Faulty::default()
    };
    let reward = declare_unsolvable(engine, "x^5 - x - 1 = 0");
    assert!((reward + 4.5).abs() < 1e-12);
}

#[test]
fn galois_failure_irrelevant_below_degree_five() {
    let engine = Faulty {
        galois_fails: true,
        ..Faulty::default()
    };
    let e = engine.parse("x^4 - 2").unwrap();
    assert_eq!(assess_solvability(&engine, &e, "x"), Solvability::Solvable);
}

#[test]
fn factoring_failure_is_unknown() {
    let engine = Faulty {
        factoring_fails: true,
        ..Faulty::default()
    };
    let e = engine.parse("x^2 - 1").unwrap();
    assert_eq!(assess_solvability(&engine, &e, "x"), Solvability::Unknown);
    // Roots are still found; only the verdict is lost.
    let mut ep = Episode::from_text(engine, "x^2 - 1 = 0", None, EnvConfig::multi_root()).unwrap();
    ep.step(Action::Write("1".into())).unwrap();
    let one = ep.engine().number(1);
    let reward = ep
        .step(Action::Substitute {
            target: None,
            expr: one,
        })
        .unwrap();
    assert_eq!(reward, 1.0);
}

#[test]
fn healthy_double_matches_symbolic_engine() {
    let reward = declare_unsolvable(Faulty::default(), "x^5 - x - 1 = 0");
    assert!((reward - 4.5).abs() < 1e-12);
}
