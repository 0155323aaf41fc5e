//! Rational root theorem search.

use crate::polynomial::Polynomial;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::collections::BTreeSet;

/// Coefficients whose magnitude passes this are not factored for divisors.
const MAX_COEFF_MAGNITUDE: u64 = 1_000_000_000_000;
/// Give up instead of testing more `p/q` pairs than this.
pub const MAX_CANDIDATES: usize = 2000;

/// Positive divisors of `n`, or `None` when `n` is zero or too large.
fn divisors(n: &BigInt) -> Option<Vec<u64>> {
    let n = n.abs().to_u64().filter(|n| (1..=MAX_COEFF_MAGNITUDE).contains(n))?;
    let mut small = Vec::new();
    let mut large = Vec::new();
    let mut d = 1u64;
    while d * d <= n {
        if n % d == 0 {
            small.push(d);
            if d * d != n {
                large.push(n / d);
            }
        }
        d += 1;
    }
    small.extend(large.into_iter().rev());
    Some(small)
}

/// Every `±p/q` with `p | a0` and `q | an`, deduplicated and sorted.
/// Empty when the candidate set would be too large to try.
pub fn rational_root_candidates(int_coeffs: &[BigInt], limit: usize) -> BTreeSet<BigRational> {
    let mut out = BTreeSet::new();
    let (Some(a0), Some(an)) = (int_coeffs.first(), int_coeffs.last()) else {
        return out;
    };
    if a0.is_zero() {
        out.insert(BigRational::zero());
        return out;
    }
    let (Some(ps), Some(qs)) = (divisors(a0), divisors(an)) else {
        return out;
    };
    if 2 * ps.len() * qs.len() > limit {
        return out;
    }
    for p in &ps {
        for q in &qs {
            let r = BigRational::new(BigInt::from(*p), BigInt::from(*q));
            out.insert(-r.clone());
            out.insert(r);
        }
    }
    out
}

/// Distinct rational roots of `p`, ascending.
///
/// Works on the square-free part and divides each root out as it is found.
/// Coefficients too large to factor give a partial (possibly empty) answer.
pub fn find_rational_roots(p: &Polynomial) -> Vec<BigRational> {
    let mut found = BTreeSet::new();
    let mut rest = p.square_free_part();

    while rest.degree() >= 1 {
        let root = if rest.coeff(0).is_zero() {
            Some(BigRational::zero())
        } else {
            rest.primitive()
                .1
                .integer_coeffs()
                .and_then(|ints| {
                    rational_root_candidates(&ints, MAX_CANDIDATES)
                        .into_iter()
                        .find(|r| rest.eval(r).is_zero())
                })
        };
        let Some(root) = root else {
            break;
        };
        let linear = Polynomial::new(vec![-root.clone(), BigRational::one()], &rest.var);
        rest = rest.div_rem(&linear).0;
        found.insert(root);
    }
    found.into_iter().collect()
}
