//! Turning a solved board back into a value for the unknown.

use crate::board::SubstitutionRecord;
use tb_engine::numeric::approx_eq;
use tb_engine::{AlgebraEngine, Root, Shape};
use tracing::{debug, warn};

/// Relative distance within which a proven zero of a factor is taken to be
/// the listed root of that factor.
const IDENTIFY_TOLERANCE: f64 = 1e-6;

/// Both sides agree and nothing is left to solve for.
pub fn is_tautology<E: AlgebraEngine>(engine: &E, lhs: &E::Expr, rhs: &E::Expr) -> bool {
    if !engine.free_variables(lhs).is_empty() || !engine.free_variables(rhs).is_empty() {
        return false;
    }
    let difference = engine.sub(lhs, rhs);
    match engine.simplify(&difference) {
        Ok(d) => engine.is_zero(&d),
        Err(err) => {
            debug!(error = %err, "tautology check failed to simplify");
            false
        }
    }
}

pub struct Resolver<'e, E: AlgebraEngine> {
    engine: &'e E,
    max_passes: usize,
    tolerance: f64,
}

impl<'e, E: AlgebraEngine> Resolver<'e, E> {
    pub fn new(engine: &'e E, max_passes: usize, tolerance: f64) -> Self {
        Self {
            engine,
            max_passes,
            tolerance,
        }
    }

    /// The value the substitution chain assigns to `unknown`.
    ///
    /// Targets `b^n` with integer `n` are inverted to `b -> value^(1/n)`.
    /// The chain is applied to `unknown` until nothing changes; `None` if that
    /// takes more than the configured number of passes.
    pub fn candidate(&self, unknown: &str, record: &SubstitutionRecord<E::Expr>) -> Option<E::Expr> {
        let rules: Vec<(E::Expr, E::Expr)> = record
            .iter()
            .map(|(target, value)| self.invert_power(target, value))
            .collect();

        let mut current = self.engine.symbol(unknown);
        let mut settled = false;
        for _ in 0..self.max_passes {
            let mut changed = false;
            for (target, value) in &rules {
                let next = match self.engine.substitute(&current, target, value) {
                    Ok(next) => next,
                    Err(err) => {
                        debug!(error = %err, "substitution chain failed");
                        return None;
                    }
                };
                if next != current {
                    current = next;
                    changed = true;
                }
            }
            if !changed {
                settled = true;
                break;
            }
        }
        if !settled {
            warn!(
                unknown,
                passes = self.max_passes,
                "substitution chain does not converge"
            );
            return None;
        }
        Some(self.engine.simplify(&current).unwrap_or(current))
    }

    fn invert_power(&self, target: &E::Expr, value: &E::Expr) -> (E::Expr, E::Expr) {
        if let Shape::Power {
            base,
            integer_exponent: Some(n),
            ..
        } = self.engine.shape(target)
        {
            if n != 0 {
                let inverse = self
                    .engine
                    .div(&self.engine.number(1), &self.engine.number(n));
                return (base, self.engine.pow(value, &inverse));
            }
        }
        (target.clone(), value.clone())
    }

    /// Symbolic zero test of the difference, then a numeric comparison
    /// relative to the larger magnitude.
    pub fn equivalent(&self, a: &E::Expr, b: &E::Expr) -> bool {
        let difference = self.engine.sub(a, b);
        if self.engine.is_zero(&difference) {
            return true;
        }
        match (self.engine.numeric_value(a), self.engine.numeric_value(b)) {
            (Some(x), Some(y)) => approx_eq(x, y, self.tolerance),
            _ => false,
        }
    }

    /// Whether `candidate` is the true root `root` of the equation in
    /// `unknown`.
    ///
    /// Roots without a closed form are also accepted when the candidate is
    /// an exact zero of their factor and numerically nearest to them.
    pub fn matches_root(&self, candidate: &E::Expr, root: &Root<E::Expr>, unknown: &str) -> bool {
        if let Some(exact) = &root.exact {
            if self.equivalent(candidate, exact) {
                return true;
            }
        }
        let Some(z) = self.engine.numeric_value(candidate) else {
            return false;
        };
        if approx_eq(z, root.approx, self.tolerance) {
            return true;
        }
        root.exact.is_none()
            && approx_eq(z, root.approx, IDENTIFY_TOLERANCE)
            && root
                .factor
                .as_ref()
                .is_some_and(|f| self.annihilates(f, unknown, candidate))
    }

    fn annihilates(&self, factor: &E::Expr, unknown: &str, candidate: &E::Expr) -> bool {
        let at = self
            .engine
            .substitute(factor, &self.engine.symbol(unknown), candidate)
            .and_then(|e| self.engine.simplify(&e));
        match at {
            Ok(value) => self.engine.is_zero(&value),
            Err(err) => {
                debug!(error = %err, "could not evaluate factor at candidate");
                false
            }
        }
    }
}
