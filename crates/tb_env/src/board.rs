//! Mutable episode state: both boards plus bookkeeping.

/// The imaginary board: free text, append-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workspace {
    entries: Vec<String>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: impl Into<String>) {
        self.entries.push(text.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Substitutions made so far, in first-insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionRecord<X> {
    pairs: Vec<(X, X)>,
}

impl<X> Default for SubstitutionRecord<X> {
    fn default() -> Self {
        Self { pairs: Vec::new() }
    }
}

impl<X: PartialEq> SubstitutionRecord<X> {
    /// Records `target -> value`. A target seen before keeps its position and
    /// takes the new value.
    pub fn insert(&mut self, target: X, value: X) {
        match self.pairs.iter_mut().find(|(t, _)| *t == target) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((target, value)),
        }
    }

    pub fn get(&self, target: &X) -> Option<&X> {
        self.pairs.iter().find(|(t, _)| t == target).map(|(_, v)| v)
    }
}

impl<X> SubstitutionRecord<X> {
    pub fn iter(&self) -> impl Iterator<Item = &(X, X)> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }
}

#[derive(Debug, Clone)]
pub struct BoardState<X> {
    pub lhs: X,
    pub rhs: X,
    pub workspace: Workspace,
    pub substitutions: SubstitutionRecord<X>,
    /// Verified roots, pairwise inequivalent.
    pub found_roots: Vec<X>,
    pub steps: usize,
    pub complete_declared: bool,
    pub unsolvable_declared: bool,
    /// Single-root variant only.
    pub solved: bool,
}

impl<X> BoardState<X> {
    pub fn new(lhs: X, rhs: X) -> Self {
        Self {
            lhs,
            rhs,
            workspace: Workspace::new(),
            substitutions: SubstitutionRecord::default(),
            found_roots: Vec::new(),
            steps: 0,
            complete_declared: false,
            unsolvable_declared: false,
            solved: false,
        }
    }

    /// True once any flag that freezes the episode is set.
    pub fn is_terminal(&self) -> bool {
        self.complete_declared || self.unsolvable_declared || self.solved
    }
}
