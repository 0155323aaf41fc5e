//! Factorization of univariate polynomials over Q.
//!
//! Square-free parts are split in two stages: rational roots give the
//! linear factors exactly, then products of k numeric roots (smallest k
//! first) are rounded to integer polynomials and confirmed by exact
//! division. The first confirmed product for a given k is irreducible, since
//! any proper factor would have been found at a smaller k.

use crate::budget::{Budget, Work};
use crate::error::EngineError;
use crate::numeric::polynomial_roots;
use crate::polynomial::Polynomial;
use crate::rational_roots::find_rational_roots;
use num_bigint::BigInt;
use num_complex::Complex64;
use num_rational::BigRational;
use num_traits::{One, ToPrimitive};
use tb_ast::{build, Expr};
use tracing::debug;

/// Rounded coefficients must lie this close to an integer.
const INTEGER_TOLERANCE: f64 = 1e-4;
/// Beyond this magnitude an `f64` no longer pins down an integer.
const MAX_EXACT_F64: f64 = 4.0e15;

/// `content * product(factor^multiplicity)`. Factors are irreducible over Q,
/// primitive with positive leading coefficient, and sorted by degree.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorList {
    pub content: BigRational,
    pub factors: Vec<(Polynomial, u32)>,
}

impl FactorList {
    /// The product as an expression that keeps its factored shape.
    pub fn to_expr(&self) -> Expr {
        let parts: Vec<Expr> = self
            .factors
            .iter()
            .map(|(f, m)| build::pow(f.to_expr(), Expr::int(i64::from(*m))))
            .collect();
        let content = Expr::Number(self.content.clone());
        match parts.as_slice() {
            [] => content,
            // A lone sum would absorb its coefficient when built canonically.
            [single @ Expr::Add(_)] if !self.content.is_one() => {
                Expr::Mul(vec![content, single.clone()])
            }
            _ => build::mul(parts.into_iter().chain(std::iter::once(content))),
        }
    }
}

pub fn factor_over_rationals(
    p: &Polynomial,
    max_degree: usize,
    budget: &mut Budget,
) -> Result<FactorList, EngineError> {
    if p.is_constant() {
        return Ok(FactorList {
            content: p.coeff(0),
            factors: Vec::new(),
        });
    }

    let mut factors = Vec::new();
    for (part, multiplicity) in p.square_free_decomposition() {
        for f in split_square_free(&part, max_degree, budget)? {
            factors.push((f, multiplicity));
        }
    }
    factors.sort_by(|a, b| {
        a.0.degree()
            .cmp(&b.0.degree())
            .then_with(|| a.0.coeffs.cmp(&b.0.coeffs))
    });

    let lead_product = factors.iter().fold(BigRational::one(), |acc, (f, m)| {
        acc * num_traits::pow(f.leading_coeff(), *m as usize)
    });
    Ok(FactorList {
        content: p.leading_coeff() / lead_product,
        factors,
    })
}

/// Irreducible factors of a square-free polynomial.
fn split_square_free(
    part: &Polynomial,
    max_degree: usize,
    budget: &mut Budget,
) -> Result<Vec<Polynomial>, EngineError> {
    let var = part.var.clone();
    let mut rest = part.primitive().1;
    let mut out = Vec::new();

    for r in find_rational_roots(&rest) {
        let linear = Polynomial::new(
            vec![
                -BigRational::from_integer(r.numer().clone()),
                BigRational::from_integer(r.denom().clone()),
            ],
            &var,
        );
        if let Some(q) = rest.exact_div(&linear) {
            rest = q.primitive().1;
            out.push(linear);
        }
    }

    match rest.degree() {
        0 => {}
        // No rational roots left, so nothing splits off below degree 4.
        1..=3 => out.push(rest),
        n if n > max_degree => {
            return Err(EngineError::Undecidable(format!(
                "degree {} exceeds the factoring limit {}",
                n, max_degree
            )));
        }
        _ => out.extend(split_numerically(rest, budget)?),
    }
    Ok(out)
}

fn split_numerically(
    mut rest: Polynomial,
    budget: &mut Budget,
) -> Result<Vec<Polynomial>, EngineError> {
    let mut roots = polynomial_roots(&rest, budget)?;
    let mut out = Vec::new();
    let mut k = 2;

    while 2 * k <= rest.degree() {
        let lead = rest.leading_coeff().to_f64().unwrap_or(f64::NAN);
        let mut found = None;
        let mut subset: Vec<usize> = (0..k).collect();
        loop {
            budget.charge(Work::FactorCandidates, 1)?;
            if let Some(candidate) = candidate_factor(&roots, &subset, lead, &rest.var) {
                if let Some(q) = rest.exact_div(&candidate) {
                    found = Some((candidate, q));
                    break;
                }
            }
            if !next_combination(&mut subset, roots.len()) {
                break;
            }
        }
        match found {
            Some((candidate, q)) => {
                debug!(factor = %candidate, "split off factor");
                for &i in subset.iter().rev() {
                    roots.remove(i);
                }
                out.push(candidate);
                rest = q.primitive().1;
            }
            None => k += 1,
        }
    }
    out.push(rest);
    Ok(out)
}

/// `lead * prod(x - roots[i])` rounded to a primitive integer polynomial.
fn candidate_factor(
    roots: &[Complex64],
    subset: &[usize],
    lead: f64,
    var: &str,
) -> Option<Polynomial> {
    let mut coeffs = vec![Complex64::new(lead, 0.0)];
    for &i in subset {
        let r = roots[i];
        let mut next = vec![Complex64::new(0.0, 0.0); coeffs.len() + 1];
        for (j, c) in coeffs.iter().enumerate() {
            next[j + 1] += c;
            next[j] -= c * r;
        }
        coeffs = next;
    }

    let mut ints = Vec::with_capacity(coeffs.len());
    for c in coeffs {
        let rounded = c.re.round();
        if !rounded.is_finite()
            || rounded.abs() > MAX_EXACT_F64
            || c.im.abs() > INTEGER_TOLERANCE * (1.0 + c.re.abs())
            || (c.re - rounded).abs() > INTEGER_TOLERANCE * (1.0 + c.re.abs())
        {
            return None;
        }
        ints.push(BigRational::from_integer(BigInt::from(rounded as i64)));
    }
    let poly = Polynomial::new(ints, var);
    (poly.degree() == subset.len()).then(|| poly.primitive().1)
}

/// Advances `idx` to the next k-subset of `0..n` in lexicographic order.
fn next_combination(idx: &mut [usize], n: usize) -> bool {
    let k = idx.len();
    for i in (0..k).rev() {
        if idx[i] < n - k + i {
            idx[i] += 1;
            for j in (i + 1)..k {
                idx[j] = idx[j - 1] + 1;
            }
            return true;
        }
    }
    false
}
