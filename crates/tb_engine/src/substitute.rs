//! Structural substitution.
//!
//! Besides exact subtree matches, a target is found inside
//! - powers of the same base: `x^6` with target `x^2` gives `u^3`;
//! - products containing all of its factors: `3*u^2*v` with target `u*v`;
//! - sums containing all of its terms, up to sign and a constant offset.

use num_rational::BigRational;
use num_traits::{One, Zero};
use std::collections::BTreeMap;
use tb_ast::build;
use tb_ast::Expr;

pub fn substitute(e: &Expr, target: &Expr, replacement: &Expr) -> Expr {
    if e == target {
        return replacement.clone();
    }
    if let Some(hit) = power_match(e, target, replacement) {
        return hit;
    }
    let recurse = |x: &Expr| substitute(x, target, replacement);
    match e {
        Expr::Mul(factors) => product_match(factors, target, replacement)
            .unwrap_or_else(|| build::mul(factors.iter().map(recurse).collect::<Vec<_>>())),
        Expr::Add(terms) => sum_match(terms, target, replacement)
            .unwrap_or_else(|| build::add(terms.iter().map(recurse).collect::<Vec<_>>())),
        Expr::Pow(base, exp) => build::pow(recurse(base.as_ref()), recurse(exp.as_ref())),
        Expr::Function(name, args) => build::function(name, args.iter().map(recurse).collect()),
        _ => e.clone(),
    }
}

fn power_match(node: &Expr, target: &Expr, replacement: &Expr) -> Option<Expr> {
    let (Expr::Pow(tb, te), Expr::Pow(nb, ne)) = (target, node) else {
        return None;
    };
    if tb != nb {
        return None;
    }
    let ratio = ne.as_number()? / te.as_number()?;
    if !ratio.is_integer() || ratio.is_zero() {
        return None;
    }
    Some(build::pow(replacement.clone(), Expr::Number(ratio)))
}

/// Base to numeric exponent, plus the factors without a numeric exponent.
fn power_map(factors: &[Expr]) -> (BTreeMap<Expr, BigRational>, Vec<Expr>) {
    let mut powers = BTreeMap::new();
    let mut others = Vec::new();
    for f in factors {
        let (base, exp) = build::base_and_exponent(f);
        match exp {
            Expr::Number(k) => {
                *powers.entry(base).or_insert_with(BigRational::zero) += k;
            }
            _ => others.push(f.clone()),
        }
    }
    (powers, others)
}

fn product_match(factors: &[Expr], target: &Expr, replacement: &Expr) -> Option<Expr> {
    let Expr::Mul(target_factors) = target else {
        return None;
    };
    let (target_powers, target_others) = power_map(target_factors);
    if !target_others.is_empty() || target_powers.keys().any(Expr::is_number) {
        return None;
    }

    let mut coefficient = BigRational::one();
    let mut rest = Vec::new();
    for f in factors {
        match f {
            Expr::Number(c) => coefficient *= c,
            other => rest.push(other.clone()),
        }
    }
    let (mut powers, others) = power_map(&rest);

    let mut times: Option<BigRational> = None;
    for (base, t) in &target_powers {
        let n = powers.get(base)?;
        if (n * t) <= BigRational::zero() {
            return None;
        }
        let k = (n / t).floor();
        times = Some(match times {
            Some(prev) if prev < k => prev,
            _ => k,
        });
    }
    let times = times.filter(|k| *k >= BigRational::one())?;

    for (base, t) in &target_powers {
        if let Some(n) = powers.get_mut(base) {
            *n -= t * &times;
        }
    }
    let mut out = vec![
        Expr::Number(coefficient),
        build::pow(replacement.clone(), Expr::Number(times)),
    ];
    out.extend(
        powers
            .into_iter()
            .map(|(base, k)| substitute(&build::pow(base, Expr::Number(k)), target, replacement)),
    );
    out.extend(others.iter().map(|f| substitute(f, target, replacement)));
    Some(build::mul(out))
}

fn sum_match(terms: &[Expr], target: &Expr, replacement: &Expr) -> Option<Expr> {
    let Expr::Add(target_terms) = target else {
        return None;
    };
    let split_constant = |items: &[Expr]| -> (BigRational, Vec<Expr>) {
        let mut constant = BigRational::zero();
        let mut rest = Vec::new();
        for t in items {
            match t {
                Expr::Number(n) => constant += n,
                other => rest.push(other.clone()),
            }
        }
        (constant, rest)
    };
    let (target_constant, target_rest) = split_constant(target_terms);
    let (node_constant, node_rest) = split_constant(terms);

    for sign in [BigRational::one(), -BigRational::one()] {
        let mut remaining = node_rest.clone();
        let mut matched = true;
        for t in &target_rest {
            let wanted = build::mul2(Expr::Number(sign.clone()), t.clone());
            match remaining.iter().position(|r| *r == wanted) {
                Some(pos) => {
                    remaining.remove(pos);
                }
                None => {
                    matched = false;
                    break;
                }
            }
        }
        if !matched {
            continue;
        }
        let offset = &node_constant - &sign * &target_constant;
        let mut out = vec![
            build::mul2(Expr::Number(sign), replacement.clone()),
            Expr::Number(offset),
        ];
        out.extend(remaining.iter().map(|r| substitute(r, target, replacement)));
        return Some(build::add(out));
    }
    None
}
