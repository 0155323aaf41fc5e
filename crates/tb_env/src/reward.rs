//! Episode scoring.
//!
//! `L` is the length of the initial equation `lhs = rhs` with whitespace
//! removed and `n` the number of actions taken, the scoring one included.

use crate::config::Variant;
use crate::oracle::Solvability;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardCalculator {
    length: usize,
}

impl RewardCalculator {
    pub fn new(initial_equation: &str) -> Self {
        Self {
            length: initial_equation.chars().filter(|c| !c.is_whitespace()).count(),
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    fn full(&self) -> f64 {
        self.length as f64
    }

    /// `0.5 * L^(1/n)`: a correct declaration is worth less the longer it took.
    fn half_root(&self, steps: usize) -> f64 {
        0.5 * self.full().powf(1.0 / steps.max(1) as f64)
    }

    pub fn verified_root(&self, variant: Variant) -> f64 {
        match variant {
            Variant::SingleRoot => self.full(),
            Variant::MultiRoot => 1.0,
        }
    }

    pub fn declare_complete(&self, found: usize, total: usize, steps: usize) -> f64 {
        if found == total && total > 0 {
            self.full()
        } else if found > total {
            -self.half_root(steps)
        } else if found < total {
            found as f64 - (total - found) as f64
        } else {
            self.half_root(steps)
        }
    }

    pub fn declare_unsolvable(&self, verdict: Solvability, steps: usize) -> f64 {
        match verdict {
            Solvability::NotSolvable => self.half_root(steps),
            Solvability::Solvable | Solvability::Unknown => -self.half_root(steps),
        }
    }
}
