use crate::config::Variant;
use serde::Serialize;
use std::fmt;

/// What an agent may see of an episode. Holds no ground truth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardSnapshot {
    pub variant: Variant,
    pub unknown: String,
    pub initial: String,
    pub lhs: String,
    pub rhs: String,
    pub workspace: Vec<String>,
    pub substitutions: Vec<SubstitutionEntry>,
    pub found_roots: Vec<String>,
    pub steps: usize,
    pub complete_declared: bool,
    pub unsolvable_declared: bool,
    pub solved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubstitutionEntry {
    pub target: String,
    pub value: String,
}

impl BoardSnapshot {
    pub fn equation(&self) -> String {
        format!("{} = {}", self.lhs, self.rhs)
    }

    pub fn is_terminal(&self) -> bool {
        self.complete_declared || self.unsolvable_declared || self.solved
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for BoardSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Initial:     {}", self.initial)?;
        writeln!(f, "  Real:        {}", self.equation())?;
        writeln!(f, "  Imaginary:   {:?}", self.workspace)?;
        if !self.substitutions.is_empty() {
            let chain: Vec<String> = self
                .substitutions
                .iter()
                .map(|s| format!("{} -> {}", s.target, s.value))
                .collect();
            writeln!(f, "  Chain:       {}", chain.join(", "))?;
        }
        writeln!(f, "  Roots found: {}", self.found_roots.len())?;
        match self.variant {
            Variant::SingleRoot => writeln!(f, "  Solved:      {}", self.solved)?,
            Variant::MultiRoot => {
                writeln!(f, "  Complete:    {}", self.complete_declared)?
            }
        }
        writeln!(f, "  Unsolvable:  {}", self.unsolvable_declared)?;
        write!(f, "  Steps:       {}", self.steps)
    }
}
