//! Floating-point evaluation and polynomial root finding.

use crate::budget::{Budget, Work};
use crate::error::EngineError;
use crate::polynomial::Polynomial;
use num_complex::Complex64;
use num_traits::ToPrimitive;
use std::collections::BTreeMap;
use std::f64::consts::{E, PI, TAU};
use tb_ast::{Constant, Expr};

/// Relative step size below which Durand-Kerner has converged.
const CONVERGENCE: f64 = 1e-14;
/// Accepted when the iteration budget ends before [`CONVERGENCE`].
const LOOSE_CONVERGENCE: f64 = 1e-7;
const MAX_SWEEPS: usize = 5000;
const POLISH_STEPS: usize = 3;

pub fn evaluate(e: &Expr) -> Option<Complex64> {
    evaluate_with(e, &BTreeMap::new())
}

/// Principal-branch value of `e` with variables taken from `bindings`.
/// `None` for undefined, unbound, non-finite or unknown-function results.
pub fn evaluate_with(e: &Expr, bindings: &BTreeMap<String, Complex64>) -> Option<Complex64> {
    let value = match e {
        Expr::Number(n) => Complex64::new(n.to_f64()?, 0.0),
        Expr::Constant(Constant::Pi) => Complex64::new(PI, 0.0),
        Expr::Constant(Constant::E) => Complex64::new(E, 0.0),
        Expr::Constant(Constant::I) => Complex64::new(0.0, 1.0),
        Expr::Constant(Constant::Undefined) => return None,
        Expr::Variable(name) => *bindings.get(name)?,
        Expr::Function(name, args) => {
            let [arg] = args.as_slice() else {
                return None;
            };
            let z = evaluate_with(arg, bindings)?;
            match name.as_str() {
                "sin" => z.sin(),
                "cos" => z.cos(),
                "tan" => z.tan(),
                "log" => z.ln(),
                "abs" => Complex64::new(z.norm(), 0.0),
                _ => return None,
            }
        }
        Expr::Pow(base, exp) => {
            let b = evaluate_with(base, bindings)?;
            match exp.as_i64() {
                Some(k) if k.unsigned_abs() <= 64 => b.powi(k as i32),
                _ => {
                    let x = evaluate_with(exp, bindings)?;
                    if b.norm() == 0.0 {
                        if x.re > 0.0 {
                            Complex64::new(0.0, 0.0)
                        } else {
                            return None;
                        }
                    } else {
                        b.powc(x)
                    }
                }
            }
        }
        Expr::Mul(factors) => {
            let mut acc = Complex64::new(1.0, 0.0);
            for f in factors {
                acc *= evaluate_with(f, bindings)?;
            }
            acc
        }
        Expr::Add(terms) => {
            let mut acc = Complex64::new(0.0, 0.0);
            for t in terms {
                acc += evaluate_with(t, bindings)?;
            }
            acc
        }
    };
    value.is_finite().then_some(value)
}

/// `|a - b|` within `tol`, relative to the larger magnitude (at least 1).
pub fn approx_eq(a: Complex64, b: Complex64, tol: f64) -> bool {
    (a - b).norm() <= tol * a.norm().max(b.norm()).max(1.0)
}

fn horner(coeffs: &[Complex64], z: Complex64) -> Complex64 {
    coeffs
        .iter()
        .rev()
        .fold(Complex64::new(0.0, 0.0), |acc, c| acc * z + c)
}

/// All complex roots of `p` (with multiplicity), sorted by real then
/// imaginary part. Intended for square-free input; repeated roots converge
/// slowly and only to [`LOOSE_CONVERGENCE`].
pub fn polynomial_roots(p: &Polynomial, budget: &mut Budget) -> Result<Vec<Complex64>, EngineError> {
    let n = p.degree();
    if p.is_zero() || n == 0 {
        return Ok(Vec::new());
    }
    let coeffs = p.monic().complex_coeffs();
    if coeffs.iter().any(|c| !c.is_finite()) {
        return Err(EngineError::Numeric(
            "coefficients exceed double precision".to_string(),
        ));
    }
    if n == 1 {
        return Ok(vec![-coeffs[0]]);
    }

    // Fujiwara bound on root magnitude.
    let radius = 2.0
        * (0..n)
            .map(|i| coeffs[i].norm().powf(1.0 / (n - i) as f64))
            .fold(0.0f64, f64::max);
    if radius == 0.0 {
        return Ok(vec![Complex64::new(0.0, 0.0); n]);
    }

    let mut z: Vec<Complex64> = (0..n)
        .map(|k| Complex64::from_polar(radius, TAU * k as f64 / n as f64 + 0.4))
        .collect();
    let mut last_step = f64::INFINITY;

    for _ in 0..MAX_SWEEPS {
        budget.charge(Work::RootSweeps, 1)?;
        last_step = 0.0;
        for k in 0..n {
            let value = horner(&coeffs, z[k]);
            let mut denom = Complex64::new(1.0, 0.0);
            for j in 0..n {
                if j != k {
                    denom *= z[k] - z[j];
                }
            }
            if denom.norm() == 0.0 {
                denom = Complex64::new(f64::EPSILON, 0.0);
            }
            let step = value / denom;
            z[k] -= step;
            last_step = last_step.max(step.norm() / (1.0 + z[k].norm()));
        }
        if last_step < CONVERGENCE {
            break;
        }
    }
    if last_step.is_nan() || last_step >= LOOSE_CONVERGENCE {
        return Err(EngineError::Numeric(format!(
            "root finding did not converge for degree {}",
            n
        )));
    }

    let derivative: Vec<Complex64> = coeffs
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, c)| *c * i as f64)
        .collect();
    for root in z.iter_mut() {
        for _ in 0..POLISH_STEPS {
            let d = horner(&derivative, *root);
            if d.norm() == 0.0 {
                break;
            }
            let candidate = *root - horner(&coeffs, *root) / d;
            if horner(&coeffs, candidate).norm() <= horner(&coeffs, *root).norm() {
                *root = candidate;
            } else {
                break;
            }
        }
        if root.im.abs() <= 1e-12 * (1.0 + root.re.abs()) {
            root.im = 0.0;
        }
        if root.re.abs() <= 1e-12 * (1.0 + root.im.abs()) {
            root.re = 0.0;
        }
    }
    z.sort_by(|a, b| a.re.total_cmp(&b.re).then(a.im.total_cmp(&b.im)));
    Ok(z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_parser::parse;

    #[test]
    fn test_evaluate() {
        let v = evaluate(&parse("2*pi + 1").unwrap()).unwrap();
        assert!((v.re - (2.0 * PI + 1.0)).abs() < 1e-12);
        assert!(evaluate(&parse("x + 1").unwrap()).is_none());
        assert!(evaluate(&parse("f(2)").unwrap()).is_none());

        let cube_root = evaluate(&parse("(-1)^(1/3)").unwrap()).unwrap();
        assert!(approx_eq(cube_root, Complex64::new(0.5, 3f64.sqrt() / 2.0), 1e-12));
    }

    #[test]
    fn test_evaluate_with_bindings() {
        let mut env = BTreeMap::new();
        env.insert("x".to_string(), Complex64::new(2.0, 0.0));
        let v = evaluate_with(&parse("x^3 - 5*x").unwrap(), &env).unwrap();
        assert!(approx_eq(v, Complex64::new(-2.0, 0.0), 1e-12));
    }

    #[test]
    fn test_polynomial_roots() {
        let p = Polynomial::from_integers(&[6, -5, 1], "x");
        let roots = polynomial_roots(&p, &mut Budget::new()).unwrap();
        assert_eq!(roots.len(), 2);
        assert!(approx_eq(roots[0], Complex64::new(2.0, 0.0), 1e-10));
        assert!(approx_eq(roots[1], Complex64::new(3.0, 0.0), 1e-10));
    }

    #[test]
    fn test_complex_roots() {
        // x^2 + 1
        let p = Polynomial::from_integers(&[1, 0, 1], "x");
        let roots = polynomial_roots(&p, &mut Budget::new()).unwrap();
        assert!(approx_eq(roots[0], Complex64::new(0.0, -1.0), 1e-10));
        assert!(approx_eq(roots[1], Complex64::new(0.0, 1.0), 1e-10));
    }

    #[test]
    fn test_quintic_roots_satisfy_polynomial() {
        let p = Polynomial::from_integers(&[-1, -1, 0, 0, 0, 1], "x");
        let roots = polynomial_roots(&p, &mut Budget::new()).unwrap();
        assert_eq!(roots.len(), 5);
        for r in roots {
            assert!(p.eval_complex(r).norm() < 1e-9);
        }
    }

    #[test]
    fn test_iteration_budget() {
        let mut budget = Budget::new().with_limit(Work::RootSweeps, 1);
        let p = Polynomial::from_integers(&[-1, -1, 0, 0, 0, 1], "x");
        assert!(matches!(
            polynomial_roots(&p, &mut budget),
            Err(EngineError::Budget(_))
        ));
    }
}
