//! Which expressions the workspace lets the agent use.
//!
//! Every contiguous substring of every entry that parses (and mentions no
//! undefined function) is constructible. The set is then closed under the
//! field atoms that come for free: operands of sums, products and powers,
//! negations of numbers, and the constants `0`, `1` and `-1`.

use crate::config::ExtractionPolicy;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use std::fmt;
use tb_engine::{AlgebraEngine, Shape};
use tracing::{trace, warn};

/// Constructible expressions, in the engine's canonical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValiditySet<X: Ord> {
    items: BTreeSet<X>,
}

impl<X: Ord> Default for ValiditySet<X> {
    fn default() -> Self {
        Self {
            items: BTreeSet::new(),
        }
    }
}

impl<X: Ord> ValiditySet<X> {
    pub fn contains(&self, e: &X) -> bool {
        self.items.contains(e)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &X> {
        self.items.iter()
    }
}

impl<X: Ord + fmt::Display> ValiditySet<X> {
    pub fn to_strings(&self) -> Vec<String> {
        self.items.iter().map(|e| e.to_string()).collect()
    }
}

impl<X: Ord + fmt::Display> fmt::Display for ValiditySet<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.to_strings().join(", "))
    }
}

pub struct Extractor<'e, E: AlgebraEngine> {
    engine: &'e E,
    policy: ExtractionPolicy,
    max_entry_chars: usize,
}

impl<'e, E: AlgebraEngine> Extractor<'e, E> {
    pub fn new(engine: &'e E, policy: ExtractionPolicy, max_entry_chars: usize) -> Self {
        Self {
            engine,
            policy,
            max_entry_chars,
        }
    }

    /// The validity set of `entries`. `known` is consulted only under the
    /// strict policy.
    pub fn extract<S: AsRef<str>>(
        &self,
        entries: &[S],
        known: &BTreeSet<String>,
    ) -> ValiditySet<E::Expr> {
        let mut accepted = BTreeSet::new();
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut attempts = 0usize;

        for entry in entries {
            let text = self.capped(entry.as_ref());
            let bounds: Vec<usize> = text
                .char_indices()
                .map(|(i, _)| i)
                .chain(std::iter::once(text.len()))
                .collect();
            for (a, &start) in bounds.iter().enumerate() {
                for &end in &bounds[a + 1..] {
                    let piece = text[start..end].trim();
                    if piece.is_empty() || !seen.insert(piece) {
                        continue;
                    }
                    attempts += 1;
                    if let Some(e) = self.accept(piece, known) {
                        accepted.insert(e);
                    }
                }
            }
        }

        let mut items = BTreeSet::new();
        for e in &accepted {
            self.close_over_atoms(e, &mut items);
        }
        items.extend(accepted);
        trace!(
            entries = entries.len(),
            attempts,
            constructible = items.len(),
            "extracted workspace expressions"
        );
        ValiditySet { items }
    }

    fn capped<'s>(&self, text: &'s str) -> &'s str {
        match text.char_indices().nth(self.max_entry_chars) {
            Some((cut, _)) => {
                warn!(
                    limit = self.max_entry_chars,
                    length = text.chars().count(),
                    "workspace entry truncated before extraction"
                );
                &text[..cut]
            }
            None => text,
        }
    }

    fn accept(&self, piece: &str, known: &BTreeSet<String>) -> Option<E::Expr> {
        let e = self.engine.parse(piece).ok()?;
        if self.engine.has_undefined_function(&e) || self.engine.is_undefined(&e) {
            return None;
        }
        if self.policy == ExtractionPolicy::Strict
            && !self.engine.free_variables(&e).is_subset(known)
        {
            return None;
        }
        Some(e)
    }

    fn close_over_atoms(&self, e: &E::Expr, out: &mut BTreeSet<E::Expr>) {
        out.insert(e.clone());
        match self.engine.shape(e) {
            Shape::Number => {
                out.insert(self.engine.neg(e));
                self.insert_units(out);
            }
            Shape::Symbol(_) => self.insert_units(out),
            Shape::Sum(operands) | Shape::Product(operands) => {
                for operand in &operands {
                    self.close_over_atoms(operand, out);
                }
            }
            Shape::Power { base, exponent, .. } => {
                self.close_over_atoms(&base, out);
                self.close_over_atoms(&exponent, out);
            }
            Shape::Other(_) => {}
        }
    }

    fn insert_units(&self, out: &mut BTreeSet<E::Expr>) {
        out.insert(self.engine.number(0));
        out.insert(self.engine.number(1));
        out.insert(self.engine.number(-1));
    }
}
