//! Work meter for engine calls.
//!
//! Each public [`SymbolicEngine`](crate::SymbolicEngine) call starts a fresh
//! [`Budget`] from its [`EngineLimits`](crate::EngineLimits). Loops whose
//! cost depends on the input charge it as they go, and the first counter to
//! pass its limit aborts the call with [`BudgetExceeded`].

use std::fmt;
use thiserror::Error;

/// What a charge is counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Work {
    /// Term products formed while multiplying sums out.
    ExpandTerms,
    /// Polynomial gcds taken to cancel a quotient.
    PolyDivisions,
    /// Root subsets tried as candidate factors.
    FactorCandidates,
    /// Durand-Kerner sweeps.
    RootSweeps,
}

impl Work {
    const COUNT: usize = 4;

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Work {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Work::ExpandTerms => "expansion terms",
            Work::PolyDivisions => "polynomial divisions",
            Work::FactorCandidates => "factor candidates",
            Work::RootSweeps => "root-finding sweeps",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("engine budget exhausted: {spent} {work} (limit {limit})")]
pub struct BudgetExceeded {
    pub work: Work,
    pub spent: u64,
    pub limit: u64,
}

/// Per-[`Work`] counters with optional limits.
#[derive(Debug, Clone, Default)]
pub struct Budget {
    limits: [Option<u64>; Work::COUNT],
    spent: [u64; Work::COUNT],
}

impl Budget {
    /// A budget that never runs out.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, work: Work, limit: u64) -> Self {
        self.limits[work.slot()] = Some(limit);
        self
    }

    pub fn limit(&self, work: Work) -> Option<u64> {
        self.limits[work.slot()]
    }

    pub fn spent(&self, work: Work) -> u64 {
        self.spent[work.slot()]
    }

    pub fn charge(&mut self, work: Work, amount: u64) -> Result<(), BudgetExceeded> {
        let spent = &mut self.spent[work.slot()];
        *spent = spent.saturating_add(amount);
        match self.limits[work.slot()] {
            Some(limit) if *spent > limit => Err(BudgetExceeded {
                work,
                spent: *spent,
                limit,
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charges_accumulate_until_the_limit() {
        let mut budget = Budget::new().with_limit(Work::ExpandTerms, 100);
        budget.charge(Work::ExpandTerms, 60).unwrap();
        budget.charge(Work::ExpandTerms, 40).unwrap();
        let err = budget.charge(Work::ExpandTerms, 1).unwrap_err();
        assert_eq!(err.spent, 101);
        assert_eq!(err.limit, 100);
        assert_eq!(err.work, Work::ExpandTerms);
    }

    #[test]
    fn counters_are_independent() {
        let mut budget = Budget::new().with_limit(Work::RootSweeps, 3);
        budget.charge(Work::PolyDivisions, 1_000_000).unwrap();
        budget.charge(Work::RootSweeps, 3).unwrap();
        assert_eq!(budget.spent(Work::PolyDivisions), 1_000_000);
        assert_eq!(budget.limit(Work::PolyDivisions), None);
        assert!(budget.charge(Work::RootSweeps, 1).is_err());
    }

    #[test]
    fn message_names_the_work() {
        let err = BudgetExceeded {
            work: Work::FactorCandidates,
            spent: 12,
            limit: 10,
        };
        assert_eq!(
            err.to_string(),
            "engine budget exhausted: 12 factor candidates (limit 10)"
        );
    }
}
