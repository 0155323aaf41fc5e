//! Galois groups of irreducible polynomials, as far as solvability by
//! radicals needs them.
//!
//! Degrees up to four are always solvable. A polynomial `g(x^k)` is
//! solvable exactly when `g` is. Irreducible quintics are classified with
//! the sextic resolvent of the F20-invariant
//!
//! ```text
//! θ = x1²(x2x5 + x3x4) + x2²(x1x3 + x4x5) + x3²(x1x5 + x2x4)
//!   + x4²(x1x2 + x3x5) + x5²(x1x4 + x2x3)
//! ```
//!
//! The resolvent is built exactly: its power sums are orbit sums of the
//! monomials of `θ^k`, which reduce to power sums of the quintic's roots.
//! When it is square-free it has an integer root iff the group lies in F20,
//! and the discriminant being a square separates the rest. Other degrees are
//! undecided.

use crate::budget::Budget;
use crate::error::EngineError;
use crate::numeric::polynomial_roots;
use crate::polynomial::{is_rational_square, Polynomial};
use crate::rational_roots::{rational_root_candidates, MAX_CANDIDATES};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Integer shifts `x -> x + s` tried while the resolvent has repeated roots.
const TSCHIRNHAUS_SHIFTS: [i64; 7] = [0, 1, -1, 2, -2, 3, -3];
/// Relative error assumed for a numerically located resolvent root.
const ROOT_RELATIVE_ERROR: f64 = 1e-9;
/// Widest run of integers checked around one numeric root.
const MAX_ROUNDING_WINDOW: f64 = 64.0;

/// Exponent vectors of the ten monomials of θ.
const THETA: [[u8; 5]; 10] = [
    [2, 1, 0, 0, 1],
    [2, 0, 1, 1, 0],
    [1, 2, 1, 0, 0],
    [0, 2, 0, 1, 1],
    [1, 0, 2, 0, 1],
    [0, 1, 2, 1, 0],
    [1, 1, 0, 2, 0],
    [0, 0, 1, 2, 1],
    [1, 0, 0, 1, 2],
    [0, 1, 1, 0, 2],
];
/// Index of the stabiliser of θ (F20) in S5.
const STABILISER_ORDER: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GaloisGroup {
    /// Degree at most four.
    Classical { degree: usize },
    /// `f(x) = g(x^k)`; inherits solvability from the group of `g`.
    Composite {
        degree: usize,
        inner: Box<GaloisGroup>,
    },
    Cyclic5OrDihedral5,
    Frobenius20,
    Alternating5,
    Symmetric5,
}

impl GaloisGroup {
    pub fn is_solvable(&self) -> bool {
        match self {
            GaloisGroup::Classical { .. } => true,
            GaloisGroup::Composite { inner, .. } => inner.is_solvable(),
            GaloisGroup::Cyclic5OrDihedral5 | GaloisGroup::Frobenius20 => true,
            GaloisGroup::Alternating5 | GaloisGroup::Symmetric5 => false,
        }
    }

    pub fn name(&self) -> String {
        match self {
            GaloisGroup::Classical { degree } => format!("degree-{} (classical)", degree),
            GaloisGroup::Composite { degree, inner } => {
                format!("degree-{} radical extension of {}", degree, inner.name())
            }
            GaloisGroup::Cyclic5OrDihedral5 => "C5 or D5".to_string(),
            GaloisGroup::Frobenius20 => "F20".to_string(),
            GaloisGroup::Alternating5 => "A5".to_string(),
            GaloisGroup::Symmetric5 => "S5".to_string(),
        }
    }

    /// Group order, when it is pinned down.
    pub fn order(&self) -> Option<usize> {
        match self {
            GaloisGroup::Frobenius20 => Some(20),
            GaloisGroup::Alternating5 => Some(60),
            GaloisGroup::Symmetric5 => Some(120),
            _ => None,
        }
    }
}

impl fmt::Display for GaloisGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Galois group of an irreducible polynomial over Q.
///
/// The answer is meaningless for reducible input.
pub fn galois_group(p: &Polynomial, budget: &mut Budget) -> Result<GaloisGroup, EngineError> {
    let p = p.primitive().1;
    let degree = p.degree();
    if degree <= 4 {
        return Ok(GaloisGroup::Classical { degree });
    }
    if let Some((_, inner)) = p.power_decomposition() {
        let inner = galois_group(&inner, budget)?;
        return Ok(GaloisGroup::Composite {
            degree,
            inner: Box::new(inner),
        });
    }
    if degree == 5 {
        return quintic_group(&p, budget);
    }
    Err(EngineError::Undecidable(format!(
        "no Galois group test for irreducible degree {}",
        degree
    )))
}

fn quintic_group(p: &Polynomial, budget: &mut Budget) -> Result<GaloisGroup, EngineError> {
    let square = is_rational_square(&p.discriminant());
    let base = p
        .monic_integral()
        .ok_or_else(|| EngineError::Undecidable("quintic is not integral".to_string()))?;

    for shift in TSCHIRNHAUS_SHIFTS {
        let q = base.shift(&BigRational::from_integer(BigInt::from(shift)));
        let resolvent = sextic_resolvent(&q)
            .ok_or_else(|| EngineError::Undecidable("shifted quintic is not integral".to_string()))?;
        if resolvent.gcd(&resolvent.derivative()).degree() > 0 {
            debug!(shift, "resolvent has repeated roots, shifting");
            continue;
        }
        let in_f20 = has_integer_root(&resolvent, budget)?;
        return Ok(match (in_f20, square) {
            (true, true) => GaloisGroup::Cyclic5OrDihedral5,
            (true, false) => GaloisGroup::Frobenius20,
            (false, true) => GaloisGroup::Alternating5,
            (false, false) => GaloisGroup::Symmetric5,
        });
    }
    Err(EngineError::Undecidable(
        "resolvent has repeated roots for every shift".to_string(),
    ))
}

type Sparse = FxHashMap<[u8; 5], BigInt>;

fn sparse_mul(a: &Sparse, b: &Sparse) -> Sparse {
    let mut out = Sparse::default();
    for (ea, ca) in a {
        for (eb, cb) in b {
            let e = std::array::from_fn(|i| ea[i] + eb[i]);
            *out.entry(e).or_insert_with(BigInt::zero) += ca * cb;
        }
    }
    out.retain(|_, c| !c.is_zero());
    out
}

/// Set partitions of `{0, .., n-1}` with their Möbius weights
/// `prod (-1)^(|B|-1) (|B|-1)!`.
fn weighted_set_partitions(n: usize) -> Vec<(i64, Vec<Vec<usize>>)> {
    fn extend(i: usize, n: usize, blocks: &mut Vec<Vec<usize>>, out: &mut Vec<Vec<Vec<usize>>>) {
        if i == n {
            out.push(blocks.clone());
            return;
        }
        for b in 0..blocks.len() {
            blocks[b].push(i);
            extend(i + 1, n, blocks, out);
            blocks[b].pop();
        }
        blocks.push(vec![i]);
        extend(i + 1, n, blocks, out);
        blocks.pop();
    }

    let mut partitions = Vec::new();
    extend(0, n, &mut Vec::new(), &mut partitions);
    partitions
        .into_iter()
        .map(|blocks| {
            let weight: i64 = blocks
                .iter()
                .map(|b| {
                    let factorial: i64 = (1..b.len() as i64).product();
                    if b.len() % 2 == 0 {
                        -factorial
                    } else {
                        factorial
                    }
                })
                .product();
            (weight, blocks)
        })
        .collect()
}

/// `p[k] = sum of r^k` over the roots of a monic quintic, for `k <= upto`.
/// `coeffs` is lowest degree first.
fn root_power_sums(coeffs: &[BigInt], upto: usize) -> Vec<BigInt> {
    // a[k] is the coefficient of x^(5-k).
    let a: Vec<&BigInt> = (0..=5).map(|k| &coeffs[5 - k]).collect();
    let mut p = vec![BigInt::from(5)];
    for k in 1..=upto {
        let mut s: BigInt = (1..=(k - 1).min(5)).map(|i| a[i] * &p[k - i]).sum();
        if k <= 5 {
            s += a[k] * BigInt::from(k);
        }
        p.push(-s);
    }
    p
}

/// `sum over sigma in S5 of prod r_sigma(i)^e_i`, by Möbius inversion over
/// set partitions of the positions.
fn orbit_sum(e: &[u8; 5], p: &[BigInt], partitions: &[(i64, Vec<Vec<usize>>)]) -> BigInt {
    partitions
        .iter()
        .map(|(weight, blocks)| {
            blocks.iter().fold(BigInt::from(*weight), |acc, block| {
                let degree: usize = block.iter().map(|&i| e[i] as usize).sum();
                acc * &p[degree]
            })
        })
        .sum()
}

/// Exact `prod (y - θ_j)` over the six cosets of F20, for a monic integral
/// quintic. Lowest degree first, in the variable `y`.
fn sextic_resolvent(q: &Polynomial) -> Option<Polynomial> {
    let coeffs = q.integer_coeffs()?;
    if q.degree() != 5 || !coeffs[5].is_one() {
        return None;
    }
    let p = root_power_sums(&coeffs, 4 * 6);
    let partitions = weighted_set_partitions(5);
    let theta: Sparse = THETA.iter().map(|e| (*e, BigInt::one())).collect();

    // Power sums of the six resolvent roots.
    let mut power = Sparse::default();
    power.insert([0; 5], BigInt::one());
    let mut sums = vec![BigInt::from(6)];
    for _ in 1..=6 {
        power = sparse_mul(&power, &theta);
        let mut by_shape = Sparse::default();
        for (e, c) in &power {
            let mut shape = *e;
            shape.sort_unstable();
            *by_shape.entry(shape).or_insert_with(BigInt::zero) += c;
        }
        let total: BigInt = by_shape
            .iter()
            .map(|(shape, c)| c * orbit_sum(shape, &p, &partitions))
            .sum();
        sums.push(total / STABILISER_ORDER);
    }

    // Newton's identities.
    let mut e = vec![BigInt::one()];
    for k in 1..=6 {
        let s: BigInt = (1..=k)
            .map(|i| {
                let term = &e[k - i] * &sums[i];
                if i % 2 == 1 {
                    term
                } else {
                    -term
                }
            })
            .sum();
        e.push(s / BigInt::from(k));
    }
    let resolvent = (0..=6)
        .map(|j| {
            let k = 6 - j;
            let c = if k % 2 == 0 { e[k].clone() } else { -e[k].clone() };
            BigRational::from_integer(c)
        })
        .collect();
    Some(Polynomial::new(resolvent, "y"))
}

/// Whether a monic integral resolvent has an integer root. Small constant
/// terms are settled by the rational root theorem; otherwise integers near
/// each numeric root are tried exactly.
fn has_integer_root(resolvent: &Polynomial, budget: &mut Budget) -> Result<bool, EngineError> {
    let is_root = |m: &BigRational| resolvent.eval(m).is_zero();
    let ints = resolvent
        .integer_coeffs()
        .ok_or_else(|| EngineError::Undecidable("resolvent is not integral".to_string()))?;
    let candidates = rational_root_candidates(&ints, MAX_CANDIDATES);
    if !candidates.is_empty() {
        return Ok(candidates.iter().any(is_root));
    }

    for z in polynomial_roots(resolvent, budget)? {
        let reach = 1.0 + z.re.abs() * ROOT_RELATIVE_ERROR;
        if z.im.abs() > reach {
            continue;
        }
        if reach > MAX_ROUNDING_WINDOW {
            return Err(EngineError::Undecidable(
                "resolvent roots too large to round".to_string(),
            ));
        }
        let centre = z.re.round() as i64;
        let window = reach.ceil() as i64;
        let found = (centre - window..=centre + window)
            .map(|m| BigRational::from_integer(BigInt::from(m)))
            .any(|m| is_root(&m));
        if found {
            return Ok(true);
        }
    }
    Ok(false)
}
