//! Expression-level rewrites: expansion, simplification, collection and
//! factoring.

use crate::budget::{Budget, BudgetExceeded, Work};
use crate::error::EngineError;
use crate::factorization::factor_over_rationals;
use crate::polynomial::Polynomial;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use std::collections::BTreeMap;
use tb_ast::build;
use tb_ast::ordering::compare_terms;
use tb_ast::{contains_variable, free_variables, Expr};

fn terms_of(e: &Expr) -> Vec<Expr> {
    match e {
        Expr::Add(terms) => terms.clone(),
        other => vec![other.clone()],
    }
}

fn factors_of(e: &Expr) -> Vec<Expr> {
    match e {
        Expr::Mul(factors) => factors.clone(),
        other => vec![other.clone()],
    }
}

/// Distributes products over sums and multiplies out integer powers of
/// sums (negative ones inside the reciprocal).
pub fn expand(e: &Expr, budget: &mut Budget) -> Result<Expr, BudgetExceeded> {
    Ok(match e {
        Expr::Add(terms) => build::add(
            terms
                .iter()
                .map(|t| expand(t, budget))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Expr::Mul(factors) => {
            let mut acc = Expr::one();
            for f in factors {
                let f = expand(f, budget)?;
                acc = multiply_out(&acc, &f, budget)?;
            }
            acc
        }
        Expr::Pow(base, exp) => {
            let b = expand(base, budget)?;
            match (exp.as_i64(), &b) {
                (Some(n), Expr::Add(_)) if n >= 2 => expand_power(&b, n, budget)?,
                (Some(n), Expr::Add(_)) if n <= -2 => {
                    build::pow(expand_power(&b, -n, budget)?, Expr::int(-1))
                }
                _ => build::pow(b, expand(exp, budget)?),
            }
        }
        Expr::Function(name, args) => build::function(
            name,
            args.iter()
                .map(|a| expand(a, budget))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        _ => e.clone(),
    })
}

fn expand_power(base: &Expr, n: i64, budget: &mut Budget) -> Result<Expr, BudgetExceeded> {
    let mut acc = base.clone();
    for _ in 1..n {
        acc = multiply_out(&acc, base, budget)?;
    }
    Ok(acc)
}

fn multiply_out(a: &Expr, b: &Expr, budget: &mut Budget) -> Result<Expr, BudgetExceeded> {
    let ta = terms_of(a);
    let tb = terms_of(b);
    budget.charge(Work::ExpandTerms, (ta.len() * tb.len()) as u64)?;
    Ok(build::add(
        ta.iter()
            .flat_map(|x| tb.iter().map(move |y| build::mul2(x.clone(), y.clone())))
            .collect::<Vec<_>>(),
    ))
}

/// Writes `e` as `numerator / denominator` over a common denominator,
/// without expanding either part.
pub fn numer_denom(e: &Expr) -> (Expr, Expr) {
    match e {
        Expr::Number(n) => (
            Expr::Number(BigRational::from_integer(n.numer().clone())),
            Expr::Number(BigRational::from_integer(n.denom().clone())),
        ),
        Expr::Add(terms) => {
            let mut num = Expr::zero();
            let mut den = Expr::one();
            for t in terms {
                let (tn, td) = numer_denom(t);
                if td == den {
                    num = build::add2(num, tn);
                } else {
                    num = build::add2(build::mul2(num, td.clone()), build::mul2(tn, den.clone()));
                    den = build::mul2(den, td);
                }
            }
            (num, den)
        }
        Expr::Mul(factors) => {
            let mut num = Vec::with_capacity(factors.len());
            let mut den = Vec::new();
            for f in factors {
                let (n, d) = numer_denom(f);
                num.push(n);
                den.push(d);
            }
            (build::mul(num), build::mul(den))
        }
        Expr::Pow(base, exp) => match exp.as_number() {
            Some(k) if k.is_negative() => {
                let flipped = Expr::Number(-k);
                if k.is_integer() {
                    let (bn, bd) = numer_denom(base);
                    (build::pow(bd, flipped.clone()), build::pow(bn, flipped))
                } else {
                    (Expr::one(), build::pow(base.as_ref().clone(), flipped))
                }
            }
            Some(k) if k.is_integer() => {
                let (bn, bd) = numer_denom(base);
                (build::pow(bn, exp.as_ref().clone()), build::pow(bd, exp.as_ref().clone()))
            }
            _ => (e.clone(), Expr::one()),
        },
        _ => (e.clone(), Expr::one()),
    }
}

/// Coefficient of the term that displays first.
fn leading_coefficient(e: &Expr) -> BigRational {
    terms_of(e)
        .into_iter()
        .min_by(compare_terms)
        .map(|t| build::split_coefficient(t).0)
        .unwrap_or_else(BigRational::one)
}

/// Rational simplification: a single fraction with expanded numerator and
/// denominator, common univariate factors cancelled and the denominator's
/// leading coefficient normalised to one. Idempotent.
pub fn simplify(e: &Expr, max_degree: usize, budget: &mut Budget) -> Result<Expr, EngineError> {
    let (n, d) = numer_denom(e);
    let mut n = expand(&n, budget)?;
    let mut d = expand(&d, budget)?;

    if d.is_zero() {
        return Ok(Expr::undefined());
    }
    if n.is_zero() {
        return Ok(Expr::zero());
    }
    if let Some(c) = d.as_number() {
        return Ok(build::mul2(Expr::Number(c.recip()), n));
    }

    if let Some((cn, cd)) = cancel_univariate(&n, &d, max_degree, budget)? {
        n = cn;
        d = cd;
        if let Some(c) = d.as_number() {
            return Ok(build::mul2(Expr::Number(c.recip()), n));
        }
    }

    let lead = leading_coefficient(&d);
    let ratio = leading_coefficient(&n) / &lead;
    if n == build::mul2(Expr::Number(ratio.clone()), d.clone()) {
        return Ok(Expr::Number(ratio));
    }
    if !lead.is_one() {
        let scale = Expr::Number(lead.recip());
        n = build::mul2(scale.clone(), n);
        d = build::mul2(scale, d);
    }
    Ok(build::mul2(n, build::pow(d, Expr::int(-1))))
}

fn cancel_univariate(
    n: &Expr,
    d: &Expr,
    max_degree: usize,
    budget: &mut Budget,
) -> Result<Option<(Expr, Expr)>, BudgetExceeded> {
    let mut vars = free_variables(n);
    vars.extend(free_variables(d));
    if vars.len() != 1 {
        return Ok(None);
    }
    let Some(var) = vars.into_iter().next() else {
        return Ok(None);
    };
    let (Some(pn), Some(pd)) = (
        Polynomial::from_expr_bounded(n, &var, max_degree),
        Polynomial::from_expr_bounded(d, &var, max_degree),
    ) else {
        return Ok(None);
    };
    budget.charge(Work::PolyDivisions, 1)?;
    let g = pn.gcd(&pd);
    if g.is_constant() {
        return Ok(None);
    }
    Ok(Some((pn.div_rem(&g).0.to_expr(), pd.div_rem(&g).0.to_expr())))
}

/// Groups the terms of the expanded `e` by their power of `var`.
pub fn collect(e: &Expr, var: &str, budget: &mut Budget) -> Result<Expr, BudgetExceeded> {
    let expanded = expand(e, budget)?;
    let mut groups: BTreeMap<BigRational, Vec<Expr>> = BTreeMap::new();
    let mut out = Vec::new();

    for term in terms_of(&expanded) {
        match split_power_of(&term, var) {
            Some((k, coeff)) => groups.entry(k).or_default().push(coeff),
            None => out.push(term),
        }
    }
    let x = Expr::var(var);
    for (k, coeffs) in groups {
        let c = build::add(coeffs);
        if k.is_zero() {
            out.push(c);
        } else {
            out.push(build::mul2(c, build::pow(x.clone(), Expr::Number(k))));
        }
    }
    Ok(build::add(out))
}

/// `(k, c)` with `term = c * var^k` and `c` free of `var`.
fn split_power_of(term: &Expr, var: &str) -> Option<(BigRational, Expr)> {
    let mut power = BigRational::zero();
    let mut rest = Vec::new();
    for f in factors_of(term) {
        match &f {
            Expr::Variable(v) if v == var => power += BigRational::one(),
            Expr::Pow(b, k) if matches!(b.as_ref(), Expr::Variable(v) if v == var) => {
                power += k.as_number()?;
            }
            other if contains_variable(other, var) => return None,
            _ => rest.push(f.clone()),
        }
    }
    Some((power, build::mul(rest)))
}

/// Factors numerator and denominator. Univariate polynomials are factored
/// completely over Q; everything else gets its common content and
/// monomial pulled out.
pub fn factor(
    e: &Expr,
    max_degree: usize,
    max_factor_degree: usize,
    budget: &mut Budget,
) -> Result<Expr, EngineError> {
    let (n, d) = numer_denom(e);
    let n = expand(&n, budget)?;
    let d = expand(&d, budget)?;
    if d.is_zero() {
        return Ok(Expr::undefined());
    }
    if let Some(c) = d.as_number() {
        let scaled = build::mul2(Expr::Number(c.recip()), n);
        return factor_part(&scaled, max_degree, max_factor_degree, budget);
    }
    let n = factor_part(&n, max_degree, max_factor_degree, budget)?;
    let d = factor_part(&d, max_degree, max_factor_degree, budget)?;
    Ok(build::div(n, d))
}

fn factor_part(
    p: &Expr,
    max_degree: usize,
    max_factor_degree: usize,
    budget: &mut Budget,
) -> Result<Expr, EngineError> {
    let vars = free_variables(p);
    if vars.len() == 1 {
        if let Some(var) = vars.iter().next() {
            if let Some(poly) = Polynomial::from_expr_bounded(p, var, max_degree) {
                match factor_over_rationals(&poly, max_factor_degree, budget) {
                    Ok(list) => return Ok(list.to_expr()),
                    Err(EngineError::Undecidable(reason)) => {
                        tracing::debug!(%reason, "falling back to common factors");
                    }
                    Err(other) => return Err(other),
                }
            }
        }
    }
    Ok(pull_common_factor(p))
}

fn rational_gcd(a: &BigRational, b: &BigRational) -> BigRational {
    BigRational::new(a.numer().gcd(b.numer()), a.denom().lcm(b.denom()))
}

/// Positive integer powers of each factor in a coefficient-free term.
fn integer_powers(rest: &Expr) -> BTreeMap<Expr, BigInt> {
    factors_of(rest)
        .iter()
        .filter(|f| !f.is_one())
        .filter_map(|f| {
            let (base, exp) = build::base_and_exponent(f);
            let k = exp.as_number().filter(|k| k.is_integer() && k.is_positive())?;
            Some((base, k.to_integer()))
        })
        .collect()
}

/// `c * m * (p / (c * m))` with `c` the rational content and `m` the
/// largest monomial dividing every term.
fn pull_common_factor(p: &Expr) -> Expr {
    let Expr::Add(terms) = p else {
        return p.clone();
    };
    let mut content: Option<BigRational> = None;
    let mut common: Option<BTreeMap<Expr, BigInt>> = None;
    for t in terms {
        let (c, rest) = build::split_coefficient(t.clone());
        content = Some(match content {
            None => c.abs(),
            Some(g) => rational_gcd(&g, &c),
        });
        let powers = integer_powers(&rest);
        common = Some(match common {
            None => powers,
            Some(prev) => prev
                .into_iter()
                .filter_map(|(base, k)| {
                    let other = powers.get(&base)?;
                    Some((base, k.min(other.clone())))
                })
                .collect(),
        });
    }

    let mut content = content.unwrap_or_else(BigRational::one);
    if terms.iter().min_by(|a, b| compare_terms(a, b)).is_some_and(Expr::has_negative_sign) {
        content = -content;
    }
    let monomial = build::mul(
        common
            .unwrap_or_default()
            .into_iter()
            .map(|(base, k)| build::pow(base, Expr::Number(BigRational::from_integer(k)))),
    );
    if content.is_one() && monomial.is_one() {
        return p.clone();
    }

    let divisor = build::mul2(Expr::Number(content.clone()), monomial.clone());
    let inner = build::add(
        terms
            .iter()
            .map(|t| build::div(t.clone(), divisor.clone()))
            .collect::<Vec<_>>(),
    );
    let mut factors: Vec<Expr> = factors_of(&monomial)
        .into_iter()
        .filter(|f| !f.is_one())
        .collect();
    factors.push(inner);
    factors.sort();
    if !content.is_one() {
        factors.insert(0, Expr::Number(content));
    }
    if factors.len() == 1 {
        return factors.swap_remove(0);
    }
    Expr::Mul(factors)
}
