//! Canonicalising constructors.
//!
//! Every compound expression in the workspace goes through these functions,
//! so two expressions that are equal after flattening, number folding and
//! like-term/like-factor combination compare equal structurally.

use crate::expression::{Constant, Expr};
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::collections::BTreeMap;

/// Largest integer exponent evaluated exactly on a rational base.
pub const MAX_EXACT_EXPONENT: u64 = 4096;
/// Results of exact powers are capped at this many bits.
const MAX_RESULT_BITS: u64 = 1 << 16;
/// Root indices above this are left unevaluated.
const MAX_ROOT_INDEX: u64 = 64;
const TRIAL_DIVISION_LIMIT: u64 = 10_000;

pub fn add<I: IntoIterator<Item = Expr>>(terms: I) -> Expr {
    let mut constant = BigRational::zero();
    let mut collected: BTreeMap<Expr, BigRational> = BTreeMap::new();
    let mut stack: Vec<Expr> = terms.into_iter().collect();

    while let Some(term) = stack.pop() {
        match term {
            Expr::Add(inner) => stack.extend(inner),
            Expr::Number(n) => constant += n,
            Expr::Constant(Constant::Undefined) => return Expr::undefined(),
            other => {
                let (c, rest) = split_coefficient(other);
                *collected.entry(rest).or_insert_with(BigRational::zero) += c;
            }
        }
    }

    let mut out: Vec<Expr> = collected
        .into_iter()
        .filter(|(_, c)| !c.is_zero())
        .map(|(rest, c)| with_coefficient(c, rest))
        .collect();
    if !constant.is_zero() {
        out.push(Expr::Number(constant));
    }

    match out.len() {
        0 => Expr::zero(),
        1 => out.swap_remove(0),
        _ => {
            out.sort();
            Expr::Add(out)
        }
    }
}

pub fn mul<I: IntoIterator<Item = Expr>>(factors: I) -> Expr {
    let mut coeff = BigRational::one();
    let mut powers: BTreeMap<Expr, Vec<Expr>> = BTreeMap::new();
    let mut stack: Vec<Expr> = factors.into_iter().collect();

    while let Some(factor) = stack.pop() {
        match factor {
            Expr::Mul(inner) => stack.extend(inner),
            Expr::Number(n) => coeff *= n,
            Expr::Constant(Constant::Undefined) => return Expr::undefined(),
            Expr::Pow(base, exp) => powers.entry(*base).or_default().push(*exp),
            other => powers.entry(other).or_default().push(Expr::one()),
        }
    }
    if coeff.is_zero() {
        return Expr::zero();
    }

    let mut rest = Vec::new();
    // Positive rational bases sharing an exponent: 2^(1/2) * 3^(1/2) = 6^(1/2).
    let mut radicals: BTreeMap<BigRational, Vec<BigRational>> = BTreeMap::new();
    let mut unsettled = false;

    for (base, exps) in powers {
        match pow(base, add(exps)) {
            Expr::Number(n) => coeff *= n,
            Expr::Constant(Constant::Undefined) => return Expr::undefined(),
            Expr::Pow(b, e) => match (*b, *e) {
                (Expr::Number(b), Expr::Number(e)) if b.is_positive() => {
                    radicals.entry(e).or_default().push(b)
                }
                (b, e) => rest.push(Expr::Pow(Box::new(b), Box::new(e))),
            },
            product @ Expr::Mul(_) => {
                unsettled = true;
                rest.push(product);
            }
            other => rest.push(other),
        }
    }

    for (exp, mut bases) in radicals {
        if bases.len() == 1 {
            let base = bases.swap_remove(0);
            rest.push(Expr::Pow(
                Box::new(Expr::Number(base)),
                Box::new(Expr::Number(exp)),
            ));
            continue;
        }
        let product = bases
            .into_iter()
            .fold(BigRational::one(), |acc, b| acc * b);
        match pow(Expr::Number(product), Expr::Number(exp)) {
            Expr::Number(n) => coeff *= n,
            product @ Expr::Mul(_) => {
                unsettled = true;
                rest.push(product);
            }
            other => rest.push(other),
        }
    }

    if unsettled {
        rest.push(Expr::Number(coeff));
        return mul(rest);
    }
    if rest.is_empty() {
        return Expr::Number(coeff);
    }
    rest.sort();
    if rest.len() == 1 {
        if coeff.is_one() {
            return rest.swap_remove(0);
        }
        if let Expr::Add(terms) = &rest[0] {
            // A rational coefficient distributes over a single sum.
            return add(
                terms
                    .iter()
                    .map(|t| mul([Expr::Number(coeff.clone()), t.clone()])),
            );
        }
    }
    if !coeff.is_one() {
        rest.insert(0, Expr::Number(coeff));
    }
    Expr::Mul(rest)
}

pub fn pow(base: Expr, exp: Expr) -> Expr {
    if base.is_undefined() || exp.is_undefined() {
        return Expr::undefined();
    }
    if exp.is_zero() {
        return Expr::one();
    }
    if exp.is_one() {
        return base;
    }
    if let (Expr::Number(b), Expr::Number(e)) = (&base, &exp) {
        return numeric_pow(b, e);
    }
    if base.is_one() {
        return Expr::one();
    }
    if base.is_zero() {
        if let Expr::Number(e) = &exp {
            return if e.is_positive() {
                Expr::zero()
            } else {
                Expr::undefined()
            };
        }
    }

    let integer_exp = exp.as_number().filter(|n| n.is_integer()).cloned();
    if let Some(n) = integer_exp {
        return match base {
            Expr::Pow(b, e) => pow(*b, mul([*e, exp])),
            Expr::Mul(factors) => mul(factors.into_iter().map(|f| pow(f, exp.clone()))),
            Expr::Constant(Constant::I) => imaginary_power(&n.to_integer()),
            other => Expr::Pow(Box::new(other), Box::new(exp)),
        };
    }
    Expr::Pow(Box::new(base), Box::new(exp))
}

pub fn add2(a: Expr, b: Expr) -> Expr {
    add([a, b])
}

pub fn mul2(a: Expr, b: Expr) -> Expr {
    mul([a, b])
}

pub fn neg(e: Expr) -> Expr {
    mul([Expr::int(-1), e])
}

pub fn sub(a: Expr, b: Expr) -> Expr {
    add([a, neg(b)])
}

pub fn div(a: Expr, b: Expr) -> Expr {
    mul([a, pow(b, Expr::int(-1))])
}

pub fn sqrt(e: Expr) -> Expr {
    pow(e, Expr::rational(1, 2))
}

/// Applies a named function, evaluating the few trivial special values.
pub fn function(name: &str, args: Vec<Expr>) -> Expr {
    if args.iter().any(Expr::is_undefined) {
        return Expr::undefined();
    }
    match (name, args.as_slice()) {
        ("abs", [Expr::Number(n)]) => Expr::Number(n.abs()),
        ("log", [a]) if a.is_one() => Expr::zero(),
        ("log", [Expr::Constant(Constant::E)]) => Expr::one(),
        ("sin" | "tan", [a]) if a.is_zero() => Expr::zero(),
        ("cos", [a]) if a.is_zero() => Expr::one(),
        _ => Expr::Function(name.to_string(), args),
    }
}

/// Splits a term into its numeric coefficient and the remaining factor(s).
pub fn split_coefficient(term: Expr) -> (BigRational, Expr) {
    match term {
        Expr::Number(n) => (n, Expr::one()),
        Expr::Mul(mut factors) => match factors.first() {
            Some(Expr::Number(c)) => {
                let c = c.clone();
                factors.remove(0);
                let rest = if factors.len() == 1 {
                    factors.swap_remove(0)
                } else {
                    Expr::Mul(factors)
                };
                (c, rest)
            }
            _ => (BigRational::one(), Expr::Mul(factors)),
        },
        other => (BigRational::one(), other),
    }
}

/// Inverse of [`split_coefficient`] for an already canonical `rest`.
pub fn with_coefficient(c: BigRational, rest: Expr) -> Expr {
    if c.is_zero() {
        return Expr::zero();
    }
    if c.is_one() {
        return rest;
    }
    match rest {
        Expr::Number(n) => Expr::Number(c * n),
        Expr::Mul(mut factors) => {
            factors.insert(0, Expr::Number(c));
            Expr::Mul(factors)
        }
        other => Expr::Mul(vec![Expr::Number(c), other]),
    }
}

/// `(base, exponent)` view of a factor; non-powers have exponent 1.
pub fn base_and_exponent(factor: &Expr) -> (Expr, Expr) {
    match factor {
        Expr::Pow(b, e) => (b.as_ref().clone(), e.as_ref().clone()),
        other => (other.clone(), Expr::one()),
    }
}

fn imaginary_power(n: &BigInt) -> Expr {
    match n.mod_floor(&BigInt::from(4)).to_u8() {
        Some(0) => Expr::one(),
        Some(1) => Expr::imaginary_unit(),
        Some(2) => Expr::int(-1),
        _ => Expr::Mul(vec![Expr::int(-1), Expr::imaginary_unit()]),
    }
}

fn raw_pow(base: &BigRational, exp: &BigRational) -> Expr {
    Expr::Pow(
        Box::new(Expr::Number(base.clone())),
        Box::new(Expr::Number(exp.clone())),
    )
}

fn numeric_pow(base: &BigRational, exp: &BigRational) -> Expr {
    if exp.is_integer() {
        return integer_pow(base, &exp.to_integer()).unwrap_or_else(|| raw_pow(base, exp));
    }
    if base.is_zero() {
        return if exp.is_positive() {
            Expr::zero()
        } else {
            Expr::undefined()
        };
    }
    if base.is_one() {
        return Expr::one();
    }
    let minus_one = -BigRational::one();
    if *base == minus_one {
        return minus_one_power(exp);
    }
    if base.is_negative() {
        // Principal branch: (-a)^e = (-1)^e * a^e for a > 0.
        return mul([minus_one_power(exp), positive_rational_power(&-base, exp)]);
    }
    positive_rational_power(base, exp)
}

fn integer_pow(base: &BigRational, n: &BigInt) -> Option<Expr> {
    if base.is_zero() {
        return Some(if n.is_negative() {
            Expr::undefined()
        } else if n.is_zero() {
            Expr::one()
        } else {
            Expr::zero()
        });
    }
    let k = n.abs().to_u64().filter(|k| *k <= MAX_EXACT_EXPONENT)?;
    let bits = base.numer().bits().max(base.denom().bits());
    if bits.saturating_mul(k) > MAX_RESULT_BITS {
        return None;
    }
    let k = k as usize;
    let numer = num_traits::pow(base.numer().clone(), k);
    let denom = num_traits::pow(base.denom().clone(), k);
    let value = if n.is_negative() {
        BigRational::new(denom, numer)
    } else {
        BigRational::new(numer, denom)
    };
    Some(Expr::Number(value))
}

/// `(-1)^e` with `e` reduced into `[0, 2)`.
fn minus_one_power(exp: &BigRational) -> Expr {
    let two = BigRational::from_integer(BigInt::from(2));
    let r = exp - (exp / &two).floor() * &two;
    if r.is_zero() {
        return Expr::one();
    }
    if r.is_one() {
        return Expr::int(-1);
    }
    let half = BigRational::new(BigInt::one(), BigInt::from(2));
    if r == half {
        return Expr::imaginary_unit();
    }
    if r == half * BigInt::from(3) {
        return Expr::Mul(vec![Expr::int(-1), Expr::imaginary_unit()]);
    }
    raw_pow(&-BigRational::one(), &r)
}

/// `b^e` for `b > 0` and non-integral `e`, written as `c * r^(1/m)` with
/// rational `c`, square-free-in-`m` integer radicand `r` and minimal index `m`.
fn positive_rational_power(base: &BigRational, exp: &BigRational) -> Expr {
    let whole = exp.floor();
    let frac = exp - &whole;
    let (Some(k), Some(n)) = (frac.numer().to_u64(), frac.denom().to_u64()) else {
        return raw_pow(base, exp);
    };
    if n > MAX_ROOT_INDEX {
        return raw_pow(base, exp);
    }
    let p = base.numer();
    let q = base.denom();
    let bits = p.bits() * k + q.bits() * (n - k);
    if bits > MAX_RESULT_BITS {
        return raw_pow(base, exp);
    }

    // b^(k/n) = (p^k * q^(n-k))^(1/n) / q
    let radicand = p.pow(k as u32) * q.pow((n - k) as u32);
    let (outside, inside, index) = extract_root(&radicand, n);

    let scale = match integer_pow(base, &whole.to_integer()) {
        Some(Expr::Number(s)) => s,
        _ => return raw_pow(base, exp),
    };
    let coefficient = scale * BigRational::new(outside, q.clone());
    if inside.is_one() {
        return Expr::Number(coefficient);
    }
    let radical = Expr::Pow(
        Box::new(Expr::Number(BigRational::from_integer(inside))),
        Box::new(Expr::Number(BigRational::new(
            BigInt::one(),
            BigInt::from(index),
        ))),
    );
    with_coefficient(coefficient, radical)
}

/// Splits `radicand^(1/index)` into `outside * inside^(1/reduced_index)`.
fn extract_root(radicand: &BigInt, index: u64) -> (BigInt, BigInt, u64) {
    let mut remaining = radicand.clone();
    let mut factors: Vec<(BigInt, u64)> = Vec::new();

    let mut d: u64 = 2;
    while d <= TRIAL_DIVISION_LIMIT && BigInt::from(d * d) <= remaining {
        let divisor = BigInt::from(d);
        let mut count = 0;
        while (&remaining % &divisor).is_zero() {
            remaining = &remaining / &divisor;
            count += 1;
        }
        if count > 0 {
            factors.push((divisor, count));
        }
        d += if d == 2 { 1 } else { 2 };
    }
    if remaining > BigInt::one() {
        let perfect = (2..=index as u32)
            .rev()
            .map(|j| (j, remaining.nth_root(j)))
            .find(|(j, root)| root.pow(*j) == remaining);
        match perfect {
            Some((j, root)) => factors.push((root, u64::from(j))),
            None => factors.push((remaining, 1)),
        }
    }

    let mut outside = BigInt::one();
    let mut residues = Vec::new();
    for (p, e) in factors {
        outside *= p.pow((e / index) as u32);
        let r = e % index;
        if r > 0 {
            residues.push((p, r));
        }
    }
    let g = residues.iter().fold(index, |acc, (_, r)| acc.gcd(r));
    let inside = residues
        .iter()
        .fold(BigInt::one(), |acc, (p, r)| acc * p.pow((r / g) as u32));
    (outside, inside, index / g)
}
