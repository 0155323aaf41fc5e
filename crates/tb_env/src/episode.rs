//! The state machine: one episode, one action per turn.

use crate::action::{Action, ActionDescriptor, CopySource};
use crate::board::BoardState;
use crate::config::{EnvConfig, Variant};
use crate::error::EnvError;
use crate::extractor::{Extractor, ValiditySet};
use crate::oracle::{assess_solvability, Solvability};
use crate::resolver::{is_tautology, Resolver};
use crate::reward::RewardCalculator;
use crate::snapshot::{BoardSnapshot, SubstitutionEntry};
use std::collections::BTreeSet;
use tb_engine::{AlgebraEngine, Root, Shape, SymbolicEngine};
use tracing::{debug, info, warn};

/// Preferred unknown when the caller does not name one.
const DEFAULT_UNKNOWN: &str = "x";

enum Outcome {
    Continue,
    Terminal(f64),
}

pub struct Episode<E: AlgebraEngine = SymbolicEngine> {
    engine: E,
    config: EnvConfig,
    unknown: String,
    initial_lhs: E::Expr,
    initial_rhs: E::Expr,
    initial_text: String,
    rewards: RewardCalculator,
    // Hidden ground truth, fixed at construction.
    roots: Vec<Root<E::Expr>>,
    verdict: Solvability,
    state: BoardState<E::Expr>,
}

impl Episode<SymbolicEngine> {
    /// An episode over the built-in engine, limited by `config.engine`.
    pub fn symbolic(text: &str, unknown: Option<&str>, config: EnvConfig) -> Result<Self, EnvError> {
        let engine = SymbolicEngine::with_limits(config.engine);
        Self::from_text(engine, text, unknown, config)
    }
}

impl<E: AlgebraEngine> Episode<E> {
    /// Parses `lhs = rhs` (or `expr`, read as `expr = 0`).
    pub fn from_text(
        engine: E,
        text: &str,
        unknown: Option<&str>,
        config: EnvConfig,
    ) -> Result<Self, EnvError> {
        let (lhs, rhs) = engine.parse_equation(text)?;
        Self::new(engine, lhs, rhs, unknown, config)
    }

    pub fn new(
        engine: E,
        lhs: E::Expr,
        rhs: E::Expr,
        unknown: Option<&str>,
        config: EnvConfig,
    ) -> Result<Self, EnvError> {
        let initial_text = format!("{} = {}", lhs, rhs);
        let unknown = match unknown {
            Some(name) => name.to_string(),
            None => pick_unknown(&engine, &lhs, &rhs)
                .ok_or_else(|| EnvError::NoUnknown(initial_text.clone()))?,
        };

        let difference = engine.sub(&lhs, &rhs);
        let roots = match engine.solve_for_roots(&difference, &unknown) {
            Ok(roots) => roots,
            Err(err) => {
                warn!(equation = %initial_text, error = %err, "could not compute roots; assuming none");
                Vec::new()
            }
        };
        let verdict = assess_solvability(&engine, &difference, &unknown);
        if verdict == Solvability::Unknown {
            warn!(equation = %initial_text, "solvability by radicals is unknown");
        }
        debug!(
            equation = %initial_text,
            unknown = %unknown,
            variant = %config.variant,
            "episode created"
        );

        Ok(Self {
            rewards: RewardCalculator::new(&initial_text),
            state: BoardState::new(lhs.clone(), rhs.clone()),
            engine,
            config,
            unknown,
            initial_lhs: lhs,
            initial_rhs: rhs,
            initial_text,
            roots,
            verdict,
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn unknown(&self) -> &str {
        &self.unknown
    }

    pub fn initial_equation(&self) -> &str {
        &self.initial_text
    }

    /// `L`, the scale of the length-based rewards.
    pub fn reward_length(&self) -> usize {
        self.rewards.length()
    }

    pub fn state(&self) -> &BoardState<E::Expr> {
        &self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Variables currently on the equation board.
    pub fn board_variables(&self) -> BTreeSet<String> {
        let mut vars = self.engine.free_variables(&self.state.lhs);
        vars.extend(self.engine.free_variables(&self.state.rhs));
        vars
    }

    /// Expressions the workspace currently allows as substitution values.
    pub fn constructible(&self) -> ValiditySet<E::Expr> {
        self.extractor()
            .extract(self.state.workspace.entries(), &self.board_variables())
    }

    pub fn inspect(&self) -> BoardSnapshot {
        let s = &self.state;
        BoardSnapshot {
            variant: self.config.variant,
            unknown: self.unknown.clone(),
            initial: self.initial_text.clone(),
            lhs: s.lhs.to_string(),
            rhs: s.rhs.to_string(),
            workspace: s.workspace.entries().to_vec(),
            substitutions: s
                .substitutions
                .iter()
                .map(|(t, v)| SubstitutionEntry {
                    target: t.to_string(),
                    value: v.to_string(),
                })
                .collect(),
            found_roots: s.found_roots.iter().map(|r| r.to_string()).collect(),
            steps: s.steps,
            complete_declared: s.complete_declared,
            unsolvable_declared: s.unsolvable_declared,
            solved: s.solved,
        }
    }

    /// Resolves a descriptor and steps with it.
    pub fn step_descriptor(&mut self, descriptor: &ActionDescriptor) -> Result<f64, EnvError> {
        let action = descriptor.resolve(&self.engine)?;
        self.step(action)
    }

    /// Executes one action and returns its reward.
    ///
    /// On error nothing changes, the step counter included.
    pub fn step(&mut self, action: Action<E::Expr>) -> Result<f64, EnvError> {
        if self.state.is_terminal() {
            return Err(EnvError::TerminalState);
        }
        if self.config.variant == Variant::SingleRoot
            && matches!(action, Action::Reset | Action::DeclareComplete)
        {
            return Err(EnvError::UnsupportedAction {
                action: action.name(),
                variant: self.config.variant,
            });
        }

        let name = action.name();
        let mut next = self.state.clone();
        next.steps += 1;
        debug!(step = next.steps, action = name, "dispatching");

        let reward = match self.apply(&mut next, action)? {
            Outcome::Terminal(reward) => reward,
            Outcome::Continue => self.check_for_root(&mut next),
        };
        self.state = next;
        Ok(reward)
    }

    fn apply(&self, next: &mut BoardState<E::Expr>, action: Action<E::Expr>) -> Result<Outcome, EnvError> {
        let engine = &self.engine;
        match action {
            Action::Add(e) => self.both_sides(next, |side| Ok(engine.add(side, &e)))?,
            Action::Sub(e) => self.both_sides(next, |side| Ok(engine.sub(side, &e)))?,
            Action::Mul(e) => {
                if engine.is_zero(&e) {
                    return Err(EnvError::ZeroOperand {
                        operation: "multiply",
                    });
                }
                self.both_sides(next, |side| Ok(engine.mul(side, &e)))?
            }
            Action::Div(e) => {
                if engine.is_zero(&e) {
                    return Err(EnvError::ZeroOperand { operation: "divide" });
                }
                self.both_sides(next, |side| Ok(engine.div(side, &e)))?
            }
            Action::Simplify => self.both_sides(next, |side| engine.simplify(side))?,
            Action::Expand => self.both_sides(next, |side| engine.expand(side))?,
            Action::Factor => self.both_sides(next, |side| engine.factor(side))?,
            Action::Collect(var) => {
                let var = var.unwrap_or_else(|| self.unknown.clone());
                self.both_sides(next, |side| engine.collect(side, &var))?
            }
            Action::RaiseToPower(p) => {
                if !matches!(engine.shape(&p), Shape::Number) {
                    return Err(EnvError::InvalidArgument {
                        action: "power",
                        reason: format!("exponent `{}` is not a rational number", p),
                    });
                }
                self.both_sides(next, |side| Ok(engine.pow(side, &p)))?
            }
            Action::Write(text) => next.workspace.push(text),
            Action::Copy(source) => match source {
                CopySource::Equation => {
                    next.workspace.push(next.lhs.to_string());
                    next.workspace.push(next.rhs.to_string());
                }
                CopySource::Lhs => next.workspace.push(next.lhs.to_string()),
                CopySource::Rhs => next.workspace.push(next.rhs.to_string()),
                CopySource::Expr(e) => next.workspace.push(e.to_string()),
            },
            Action::Substitute { target, expr } => {
                let target = target.unwrap_or_else(|| engine.symbol(&self.unknown));
                let mut known = engine.free_variables(&next.lhs);
                known.extend(engine.free_variables(&next.rhs));
                let valid = self.extractor().extract(next.workspace.entries(), &known);
                if !valid.contains(&expr) {
                    return Err(EnvError::Unconstructible {
                        expr: expr.to_string(),
                        available: valid.to_strings(),
                    });
                }
                self.both_sides(next, |side| engine.substitute(side, &target, &expr))?;
                debug!(target = %target, value = %expr, "substituted");
                next.substitutions.insert(target, expr);
            }
            Action::Reset => {
                next.lhs = self.initial_lhs.clone();
                next.rhs = self.initial_rhs.clone();
                if self.config.reset_clears_substitutions {
                    next.substitutions.clear();
                }
            }
            Action::DeclareComplete => {
                next.complete_declared = true;
                let reward =
                    self.rewards
                        .declare_complete(next.found_roots.len(), self.roots.len(), next.steps);
                info!(
                    found = next.found_roots.len(),
                    steps = next.steps,
                    reward,
                    "declared complete"
                );
                return Ok(Outcome::Terminal(reward));
            }
            Action::DeclareUnsolvable => {
                next.unsolvable_declared = true;
                let reward = self.rewards.declare_unsolvable(self.verdict, next.steps);
                info!(steps = next.steps, reward, "declared unsolvable");
                return Ok(Outcome::Terminal(reward));
            }
        }
        Ok(Outcome::Continue)
    }

    /// Computes both new sides before touching either.
    fn both_sides<F>(&self, next: &mut BoardState<E::Expr>, mut f: F) -> Result<(), EnvError>
    where
        F: FnMut(&E::Expr) -> Result<E::Expr, tb_engine::EngineError>,
    {
        let lhs = f(&next.lhs)?;
        let rhs = f(&next.rhs)?;
        next.lhs = lhs;
        next.rhs = rhs;
        Ok(())
    }

    fn check_for_root(&self, next: &mut BoardState<E::Expr>) -> f64 {
        if !is_tautology(&self.engine, &next.lhs, &next.rhs) {
            return 0.0;
        }
        let resolver = Resolver::new(
            &self.engine,
            self.config.max_resolution_passes,
            self.config.numeric_tolerance,
        );
        let Some(candidate) = resolver.candidate(&self.unknown, &next.substitutions) else {
            return 0.0;
        };
        if !self.roots.iter().any(|r| resolver.matches_root(&candidate, r, &self.unknown)) {
            debug!(candidate = %candidate, "board is a tautology but the candidate is not a root");
            return 0.0;
        }
        if next
            .found_roots
            .iter()
            .any(|found| resolver.equivalent(&candidate, found))
        {
            debug!(candidate = %candidate, "root already found");
            return 0.0;
        }

        info!(root = %candidate, found = next.found_roots.len() + 1, "verified root");
        next.found_roots.push(candidate);
        if self.config.variant == Variant::SingleRoot {
            next.solved = true;
        }
        self.rewards.verified_root(self.config.variant)
    }

    fn extractor(&self) -> Extractor<'_, E> {
        Extractor::new(
            &self.engine,
            self.config.extraction,
            self.config.max_entry_chars,
        )
    }
}

fn pick_unknown<E: AlgebraEngine>(engine: &E, lhs: &E::Expr, rhs: &E::Expr) -> Option<String> {
    let mut vars = engine.free_variables(lhs);
    vars.extend(engine.free_variables(rhs));
    if vars.contains(DEFAULT_UNKNOWN) {
        return Some(DEFAULT_UNKNOWN.to_string());
    }
    vars.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(text: &str, config: EnvConfig) -> Episode {
        Episode::symbolic(text, None, config).unwrap()
    }

    fn num(ep: &Episode, n: i64) -> tb_ast::Expr {
        ep.engine().number(n)
    }

    #[test]
    fn test_unknown_detection() {
        let ep = episode("y^2 = 2*x", EnvConfig::default());
        assert_eq!(ep.unknown(), "x");
        let ep = episode("t^2 - 1", EnvConfig::default());
        assert_eq!(ep.unknown(), "t");
        assert!(matches!(
            Episode::symbolic("3 = 3", None, EnvConfig::default()),
            Err(EnvError::NoUnknown(_))
        ));
    }

    #[test]
    fn test_field_operations() {
        let mut ep = episode("2*x + 3 = 7", EnvConfig::default());
        let three = num(&ep, 3);
        let two = num(&ep, 2);
        ep.step(Action::Sub(three)).unwrap();
        ep.step(Action::Div(two)).unwrap();
        assert_eq!(ep.inspect().equation(), "x = 2");
        assert_eq!(ep.state().steps, 2);
    }

    #[test]
    fn test_zero_operand_rejected() {
        let mut ep = episode("x - 1 = 0", EnvConfig::default());
        let zero = ep.engine().parse("x - x").unwrap();
        assert!(matches!(
            ep.step(Action::Mul(zero.clone())),
            Err(EnvError::ZeroOperand { operation: "multiply" })
        ));
        assert!(matches!(
            ep.step(Action::Div(zero)),
            Err(EnvError::ZeroOperand { operation: "divide" })
        ));
        assert_eq!(ep.state().steps, 0);
    }

    #[test]
    fn test_copy_sources() {
        let mut ep = episode("x^2 = 4", EnvConfig::default());
        ep.step(Action::Copy(CopySource::Equation)).unwrap();
        ep.step(Action::Copy(CopySource::Rhs)).unwrap();
        assert_eq!(ep.state().workspace.entries(), ["x^2", "4", "4"]);
    }

    #[test]
    fn test_power_requires_number() {
        let mut ep = episode("x^2 = 4", EnvConfig::default());
        let x = ep.engine().symbol("x");
        assert!(matches!(
            ep.step(Action::RaiseToPower(x)),
            Err(EnvError::InvalidArgument { action: "power", .. })
        ));
        let half = ep.engine().parse("1/2").unwrap();
        ep.step(Action::RaiseToPower(half)).unwrap();
        assert_eq!(ep.inspect().rhs, "2");
    }

    #[test]
    fn test_single_root_rejects_multi_root_actions() {
        let mut ep = episode("x - 5 = 0", EnvConfig::single_root());
        assert!(matches!(
            ep.step(Action::Reset),
            Err(EnvError::UnsupportedAction { action: "reset", .. })
        ));
        assert!(matches!(
            ep.step(Action::DeclareComplete),
            Err(EnvError::UnsupportedAction { .. })
        ));
        assert_eq!(ep.state().steps, 0);
    }

    #[test]
    fn test_reset_keeps_workspace() {
        let mut ep = episode("x - 5 = 0", EnvConfig::default());
        ep.step(Action::Write("5".into())).unwrap();
        let five = num(&ep, 5);
        ep.step(Action::Substitute { target: None, expr: five }).unwrap();
        ep.step(Action::Reset).unwrap();
        let snap = ep.inspect();
        assert_eq!(snap.equation(), "x - 5 = 0");
        assert_eq!(snap.workspace, vec!["5"]);
        assert!(snap.substitutions.is_empty());
        assert_eq!(snap.found_roots, vec!["5"]);
    }

    #[test]
    fn test_reset_may_keep_substitutions() {
        let config = EnvConfig {
            reset_clears_substitutions: false,
            ..EnvConfig::default()
        };
        let mut ep = episode("x - 5 = 0", config);
        ep.step(Action::Write("5".into())).unwrap();
        let five = num(&ep, 5);
        ep.step(Action::Substitute { target: None, expr: five }).unwrap();
        ep.step(Action::Reset).unwrap();
        assert_eq!(ep.inspect().substitutions.len(), 1);
    }

    #[test]
    fn test_snapshot_json_has_no_ground_truth() {
        let ep = episode("x^5 - x - 1 = 0", EnvConfig::default());
        let json = ep.inspect().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        let mut expected = vec![
            "variant",
            "unknown",
            "initial",
            "lhs",
            "rhs",
            "workspace",
            "substitutions",
            "found_roots",
            "steps",
            "complete_declared",
            "unsolvable_declared",
            "solved",
        ];
        expected.sort_unstable();
        assert_eq!(keys, expected);
        assert_eq!(value["lhs"], "x^5 - x - 1");
        assert_eq!(value["variant"], "multi_root");
    }
}
