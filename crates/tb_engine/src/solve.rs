//! Roots of rational functions in one variable.

use crate::budget::Budget;
use crate::engine::{EngineLimits, Root};
use crate::error::EngineError;
use crate::factorization::factor_over_rationals;
use crate::numeric::{evaluate, evaluate_with, polynomial_roots};
use crate::polynomial::Polynomial;
use crate::simplify::{expand, numer_denom};
use num_complex::Complex64;
use num_rational::BigRational;
use num_traits::ToPrimitive;
use std::collections::BTreeMap;
use tb_ast::{build, Expr};
use tracing::debug;

/// A denominator this small at a candidate root marks a pole.
const POLE_TOLERANCE: f64 = 1e-9;

/// Distinct roots of `e` in `var`, exact where the irreducible factor has
/// degree at most two. Poles of `e` are excluded.
pub fn solve_for_roots(
    e: &Expr,
    var: &str,
    limits: &EngineLimits,
    budget: &mut Budget,
) -> Result<Vec<Root<Expr>>, EngineError> {
    let (n, d) = numer_denom(e);
    let n = expand(&n, budget)?;
    let poly = Polynomial::from_expr_bounded(&n, var, limits.max_degree).ok_or_else(|| {
        EngineError::NotPolynomial {
            expr: n.to_string(),
            var: var.to_string(),
        }
    })?;
    if poly.is_constant() {
        return Ok(Vec::new());
    }

    let mut roots = Vec::new();
    match factor_over_rationals(&poly, limits.max_factor_degree, budget) {
        Ok(list) => {
            for (factor, _) in &list.factors {
                roots.extend(roots_of_irreducible(factor, budget)?);
            }
        }
        Err(EngineError::Undecidable(reason)) => {
            debug!(%reason, "solving numerically without factoring");
            let square_free = poly.square_free_part();
            let factor = square_free.to_expr();
            for z in polynomial_roots(&square_free, budget)? {
                roots.push(Root {
                    exact: None,
                    approx: z,
                    factor: Some(factor.clone()),
                });
            }
        }
        Err(other) => return Err(other),
    }

    let d = expand(&d, budget)?;
    if !d.is_number() {
        roots.retain(|root| {
            let mut env = BTreeMap::new();
            env.insert(var.to_string(), root.approx);
            evaluate_with(&d, &env).is_some_and(|v| v.norm() > POLE_TOLERANCE)
        });
    }
    roots.sort_by(|a, b| {
        a.approx
            .re
            .total_cmp(&b.approx.re)
            .then(a.approx.im.total_cmp(&b.approx.im))
    });
    Ok(roots)
}

fn roots_of_irreducible(f: &Polynomial, budget: &mut Budget) -> Result<Vec<Root<Expr>>, EngineError> {
    match f.degree() {
        1 => {
            let r = -f.coeff(0) / f.coeff(1);
            let approx = Complex64::new(r.to_f64().unwrap_or(f64::NAN), 0.0);
            Ok(vec![Root {
                exact: Some(Expr::Number(r)),
                approx,
                factor: Some(f.to_expr()),
            }])
        }
        2 => {
            let (a, b, c) = (f.coeff(2), f.coeff(1), f.coeff(0));
            let disc = &b * &b - BigRational::from_integer(4.into()) * &a * &c;
            let sqrt_disc = build::sqrt(Expr::Number(disc));
            let two_a = Expr::Number(BigRational::from_integer(2.into()) * a);
            let mut out = Vec::with_capacity(2);
            for sign in [-1, 1] {
                let exact = build::div(
                    build::add2(
                        Expr::Number(-b.clone()),
                        build::mul2(Expr::int(sign), sqrt_disc.clone()),
                    ),
                    two_a.clone(),
                );
                let approx = evaluate(&exact).ok_or_else(|| {
                    EngineError::Numeric(format!("cannot evaluate root {}", exact))
                })?;
                out.push(Root {
                    exact: Some(exact),
                    approx,
                    factor: Some(f.to_expr()),
                });
            }
            Ok(out)
        }
        _ => {
            let factor = f.to_expr();
            Ok(polynomial_roots(f, budget)?
                .into_iter()
                .map(|z| Root {
                    exact: None,
                    approx: z,
                    factor: Some(factor.clone()),
                })
                .collect())
        }
    }
}
