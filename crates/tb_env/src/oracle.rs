use serde::Serialize;
use std::fmt;
use tb_engine::{AlgebraEngine, SolvableGroup};
use tracing::{debug, warn};

/// Whether the roots of an episode's polynomial are expressible by radicals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Solvability {
    Solvable,
    NotSolvable,
    /// The engine could not decide.
    Unknown,
}

impl fmt::Display for Solvability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Solvability::Solvable => f.write_str("solvable"),
            Solvability::NotSolvable => f.write_str("not solvable"),
            Solvability::Unknown => f.write_str("unknown"),
        }
    }
}

/// Irreducible factors up to this degree always have radical roots.
pub const CLASSICAL_DEGREE: usize = 4;

/// Decides radical solvability of `e = 0` in `var`, factor by factor.
///
/// The first factor with a non-solvable Galois group decides the answer;
/// any engine failure before that makes it [`Solvability::Unknown`].
pub fn assess_solvability<E: AlgebraEngine>(engine: &E, e: &E::Expr, var: &str) -> Solvability {
    let factors = match engine.factor_polynomial(e, var) {
        Ok(factors) => factors,
        Err(err) => {
            warn!(expr = %e, var, error = %err, "factorization failed; solvability unknown");
            return Solvability::Unknown;
        }
    };

    for (factor, _) in &factors {
        let degree = engine.degree(factor);
        if degree <= CLASSICAL_DEGREE {
            continue;
        }
        match engine.galois_group(factor) {
            Ok(group) if group.is_solvable() => {
                debug!(%factor, group = %group.name(), "solvable factor");
            }
            Ok(group) => {
                debug!(%factor, group = %group.name(), "factor not solvable by radicals");
                return Solvability::NotSolvable;
            }
            Err(err) => {
                warn!(%factor, error = %err, "Galois group undecided; solvability unknown");
                return Solvability::Unknown;
            }
        }
    }
    Solvability::Solvable
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_engine::SymbolicEngine;

    fn verdict(text: &str) -> Solvability {
        let engine = SymbolicEngine::new();
        let e = engine.parse(text).unwrap();
        assess_solvability(&engine, &e, "x")
    }

    #[test]
    fn test_low_degree_is_solvable() {
        assert_eq!(verdict("x^2 - 5*x + 6"), Solvability::Solvable);
        assert_eq!(verdict("x^4 + x + 1"), Solvability::Solvable);
        assert_eq!(verdict("7"), Solvability::Solvable);
    }

    #[test]
    fn test_quintics() {
        assert_eq!(verdict("x^5 - x - 1"), Solvability::NotSolvable);
        assert_eq!(verdict("x^5 - 32"), Solvability::Solvable);
        assert_eq!(verdict("(x^5 - x - 1)*(x - 2)"), Solvability::NotSolvable);
    }

    #[test]
    fn test_failures_are_unknown() {
        assert_eq!(verdict("1/x + x"), Solvability::Unknown);
        assert_eq!(verdict("x^7 - x - 1"), Solvability::Unknown);
    }
}
