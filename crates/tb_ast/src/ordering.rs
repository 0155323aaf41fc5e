//! Presentation order.
//!
//! Canonical storage order (the derived `Ord`) puts numbers first, which is
//! convenient for algorithms but reads badly. Display sorts sum terms by
//! descending degree with the constant term last, and product factors by base.

use crate::expression::Expr;
use num_rational::BigRational;
use num_traits::Zero;
use std::cmp::Ordering;

/// Total degree of a term in its symbolic factors.
pub fn term_degree(e: &Expr) -> BigRational {
    match e {
        Expr::Number(_) | Expr::Constant(_) => BigRational::zero(),
        Expr::Variable(_) | Expr::Function(..) => BigRational::from_integer(1.into()),
        Expr::Pow(b, exp) => match exp.as_ref() {
            Expr::Number(n) => term_degree(b) * n,
            _ => term_degree(b),
        },
        Expr::Mul(factors) => factors
            .iter()
            .fold(BigRational::zero(), |acc, f| acc + term_degree(f)),
        Expr::Add(terms) => terms
            .iter()
            .map(term_degree)
            .max()
            .unwrap_or_else(BigRational::zero),
    }
}

fn is_constant_term(e: &Expr) -> bool {
    matches!(e, Expr::Number(_))
}

/// Order of terms inside a displayed sum.
pub fn compare_terms(a: &Expr, b: &Expr) -> Ordering {
    match (is_constant_term(a), is_constant_term(b)) {
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }
    term_degree(b)
        .cmp(&term_degree(a))
        .then_with(|| display_key(a).cmp(display_key(b)))
        .then_with(|| a.cmp(b))
}

/// Order of factors inside a displayed product.
pub fn compare_factors(a: &Expr, b: &Expr) -> Ordering {
    let rank = |e: &Expr| match e {
        Expr::Number(_) => 0,
        Expr::Constant(_) => 1,
        Expr::Pow(base, _) if base.is_number() => 2,
        Expr::Add(_) => 4,
        _ => 3,
    };
    rank(a)
        .cmp(&rank(b))
        .then_with(|| display_key(a).cmp(display_key(b)))
        .then_with(|| a.cmp(b))
}

/// The base a factor or term is "about", for alphabetical grouping.
fn display_key(e: &Expr) -> &Expr {
    match e {
        Expr::Pow(base, _) => display_key(base),
        Expr::Mul(factors) => factors
            .iter()
            .find(|f| !f.is_number())
            .map(display_key)
            .unwrap_or(e),
        _ => e,
    }
}
