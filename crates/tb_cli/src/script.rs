//! Runs a list of action descriptors against an episode and reports the
//! outcome of each step.

use serde::Serialize;
use std::fmt::Write as _;
use tb_env::{ActionDescriptor, BoardSnapshot, Episode};
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub steps: Vec<StepRecord>,
    pub total_reward: f64,
    pub errors: usize,
    pub board: BoardSnapshot,
}

/// One-line rendering of a descriptor, close to what `play` accepts.
pub fn describe(d: &ActionDescriptor) -> String {
    let mut out = d.kind.clone();
    if let Some(text) = &d.text {
        let _ = write!(out, " {:?}", text);
    }
    match (&d.target, &d.expr) {
        (Some(t), Some(e)) => {
            let _ = write!(out, " {} -> {}", t, e);
        }
        (Some(t), None) => {
            let _ = write!(out, " {}", t);
        }
        (None, Some(e)) => {
            let _ = write!(out, " {}", e);
        }
        (None, None) => {}
    }
    out
}

/// Executes `script` in order. A failed action leaves the board as it was;
/// execution continues unless `stop_on_error` is set.
pub fn run_script(episode: &mut Episode, script: &[ActionDescriptor], stop_on_error: bool) -> RunReport {
    let mut steps = Vec::with_capacity(script.len());
    let mut total_reward = 0.0;
    let mut errors = 0;

    for descriptor in script {
        let action = describe(descriptor);
        match episode.step_descriptor(descriptor) {
            Ok(reward) => {
                total_reward += reward;
                steps.push(StepRecord {
                    action,
                    reward: Some(reward),
                    error: None,
                });
            }
            Err(e) => {
                debug!(%action, error = %e, "scripted action rejected");
                errors += 1;
                steps.push(StepRecord {
                    action,
                    reward: None,
                    error: Some(e.to_string()),
                });
                if stop_on_error {
                    break;
                }
            }
        }
    }

    RunReport {
        steps,
        total_reward,
        errors,
        board: episode.inspect(),
    }
}

pub fn render_text(episode: &Episode, report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Equation: {}  ({}, unknown {}, L = {})",
        episode.initial_equation(),
        episode.config().variant,
        episode.unknown(),
        episode.reward_length()
    );
    for (i, step) in report.steps.iter().enumerate() {
        match (&step.reward, &step.error) {
            (Some(r), _) => {
                let _ = writeln!(out, "[{:>2}] {:<40} reward {}", i + 1, step.action, r);
            }
            (None, Some(e)) => {
                let _ = writeln!(out, "[{:>2}] {:<40} error: {}", i + 1, step.action, e);
            }
            (None, None) => {}
        }
    }
    let _ = writeln!(out, "Board:");
    let _ = writeln!(out, "{}", report.board);
    let _ = write!(out, "Total reward: {}", report.total_reward);
    out
}
