//! End-to-end episodes driven through the public API.

use tb_engine::{AlgebraEngine, SymbolicEngine};
use tb_env::{Action, ActionDescriptor, CopySource, EnvConfig, EnvError, Episode};

fn multi(text: &str) -> Episode {
    Episode::symbolic(text, None, EnvConfig::multi_root()).unwrap()
}

fn single(text: &str) -> Episode {
    Episode::symbolic(text, None, EnvConfig::single_root()).unwrap()
}

fn write(ep: &mut Episode, text: &str) -> f64 {
    ep.step(Action::Write(text.to_string())).unwrap()
}

fn substitute(ep: &mut Episode, target: Option<&str>, value: &str) -> Result<f64, EnvError> {
    let engine = ep.engine().clone();
    let target = target.map(|t| engine.parse(t).unwrap());
    let expr = engine.parse(value).unwrap();
    ep.step(Action::Substitute { target, expr })
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn linear_single_root() {
    let mut ep = single("x - 5 = 0");
    assert_eq!(ep.reward_length(), 5);
    assert_eq!(ep.step(Action::Copy(CopySource::Equation)).unwrap(), 0.0);
    assert_eq!(write(&mut ep, "5"), 0.0);
    assert_eq!(substitute(&mut ep, Some("x"), "5").unwrap(), 5.0);
    assert!(ep.inspect().solved);
    assert!(matches!(
        ep.step(Action::Write("more".into())),
        Err(EnvError::TerminalState)
    ));
}

#[test]
fn linear_multi_root() {
    let mut ep = multi("x - 5 = 0");
    write(&mut ep, "5");
    assert_eq!(substitute(&mut ep, None, "5").unwrap(), 1.0);
    assert!(!ep.is_terminal());
    assert_eq!(ep.step(Action::DeclareComplete).unwrap(), 5.0);
}

#[test]
fn quadratic_both_roots_with_reset() {
    let mut ep = multi("x^2 - 5*x + 6 = 0");
    assert_eq!(ep.reward_length(), 11);
    ep.step(Action::Copy(CopySource::Equation)).unwrap();
    write(&mut ep, "(-5)^2 - 4*1*6");
    write(&mut ep, "sqrt(1)");
    write(&mut ep, "(5 + 1)/2");
    write(&mut ep, "(5 - 1)/2");

    assert_eq!(substitute(&mut ep, None, "2").unwrap(), 1.0);
    assert_eq!(ep.inspect().equation(), "0 = 0");
    assert_eq!(ep.step(Action::Reset).unwrap(), 0.0);
    assert_eq!(ep.inspect().equation(), "x^2 - 5*x + 6 = 0");
    assert_eq!(substitute(&mut ep, None, "3").unwrap(), 1.0);

    assert_eq!(ep.step(Action::DeclareComplete).unwrap(), 11.0);
    let snap = ep.inspect();
    assert_eq!(snap.found_roots, vec!["2", "3"]);
    assert_eq!(snap.steps, 9);
    assert!(snap.complete_declared);
}

#[test]
fn quadratic_incomplete_declaration() {
    let mut ep = multi("x^2 - 5*x + 6 = 0");
    write(&mut ep, "2");
    assert_eq!(substitute(&mut ep, None, "2").unwrap(), 1.0);
    assert_eq!(ep.step(Action::DeclareComplete).unwrap(), 0.0);
}

#[test]
fn repeated_root_is_not_rewarded_twice() {
    let mut ep = multi("x^2 - 5*x + 6 = 0");
    write(&mut ep, "2");
    assert_eq!(substitute(&mut ep, None, "2").unwrap(), 1.0);
    ep.step(Action::Reset).unwrap();
    assert_eq!(substitute(&mut ep, None, "2").unwrap(), 0.0);
    assert_eq!(ep.inspect().found_roots.len(), 1);
}

#[test]
fn unsolvable_quintic_declared() {
    let mut ep = multi("x^5 - x - 1 = 0");
    let reward = ep.step(Action::DeclareUnsolvable).unwrap();
    assert!(close(reward, 0.5 * 9.0));
    assert!(ep.inspect().unsolvable_declared);
}

#[test]
fn quintic_with_large_coefficients_declared() {
    let mut ep = multi("x^5 - 37*x - 1234 = 0");
    assert_eq!(ep.reward_length(), 15);
    let reward = ep.step(Action::DeclareUnsolvable).unwrap();
    assert!(close(reward, 0.5 * 15.0));
}

#[test]
fn solvable_quintic_declared_unsolvable() {
    let mut ep = single("x^5 - 32 = 0");
    let reward = ep.step(Action::DeclareUnsolvable).unwrap();
    assert!(close(reward, -0.5 * 8.0));
}

#[test]
fn declaration_reward_shrinks_with_steps() {
    let mut ep = multi("x^5 - x - 1 = 0");
    write(&mut ep, "scratch");
    let reward = ep.step(Action::DeclareUnsolvable).unwrap();
    assert!(close(reward, 0.5 * 9f64.sqrt()));
}

#[test]
fn number_buried_in_prose() {
    let mut ep = multi("x - 3 = 0");
    write(&mut ep, "hello world 🎲");
    let err = substitute(&mut ep, None, "3").unwrap_err();
    assert!(matches!(err, EnvError::Unconstructible { .. }));
    assert_eq!(ep.inspect().steps, 1);

    write(&mut ep, "the answer is probably 3 maybe");
    assert_eq!(substitute(&mut ep, None, "3").unwrap(), 1.0);
}

#[test]
fn strict_extraction_rejects_foreign_symbols() {
    let mut ep = single("x^2 - 2 = 0");
    write(&mut ep, "u + 1");
    let err = substitute(&mut ep, None, "u + 1").unwrap_err();
    match err {
        EnvError::Unconstructible { expr, available } => {
            assert_eq!(expr, "u + 1");
            assert!(available.contains(&"1".to_string()));
            assert!(!available.contains(&"u + 1".to_string()));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn field_operations_then_substitution() {
    let mut ep = single("2*x + 3 = 7");
    let engine = ep.engine().clone();
    ep.step(Action::Sub(engine.number(3))).unwrap();
    ep.step(Action::Simplify).unwrap();
    ep.step(Action::Div(engine.number(2))).unwrap();
    ep.step(Action::Simplify).unwrap();
    assert_eq!(ep.inspect().equation(), "x = 2");
    write(&mut ep, "2");
    assert_eq!(ep.reward_length(), 7);
    assert_eq!(substitute(&mut ep, None, "2").unwrap(), 7.0);
}

#[test]
fn cube_root_by_radical() {
    let mut ep = single("x^3 - 2 = 0");
    write(&mut ep, "2**(1/3)");
    let reward = substitute(&mut ep, None, "2^(1/3)").unwrap();
    assert_eq!(reward, ep.reward_length() as f64);
}

#[test]
fn large_cube_root_is_credited() {
    let mut ep = multi("x^3 = 3000000000000000000");
    write(&mut ep, "3000000000000000000^(1/3)");
    let reward = substitute(&mut ep, None, "3000000000000000000^(1/3)").unwrap();
    assert_eq!(reward, 1.0);
    assert_eq!(ep.inspect().found_roots.len(), 1);
}

#[test]
fn power_target_is_inverted() {
    let mut ep = multi("x^4 - 16 = 0");
    write(&mut ep, "u and 4");
    assert_eq!(substitute(&mut ep, None, "u").unwrap(), 0.0);
    assert_eq!(ep.inspect().equation(), "u^4 - 16 = 0");
    assert_eq!(substitute(&mut ep, Some("u^2"), "4").unwrap(), 1.0);
    assert_eq!(ep.inspect().found_roots, vec!["2"]);
}

#[test]
fn cardano_cubic() {
    let mut ep = multi("x^3 - 3*x - 1 = 0");
    write(&mut ep, "u + v");
    substitute(&mut ep, None, "u + v").unwrap();
    ep.step(Action::Expand).unwrap();
    ep.step(Action::Simplify).unwrap();
    let engine = ep.engine().clone();
    let expected = engine
        .parse("u^3 + 3*u^2*v + 3*u*v^2 + v^3 - 3*u - 3*v - 1")
        .unwrap();
    assert_eq!(ep.state().lhs, expected);

    write(&mut ep, "1");
    substitute(&mut ep, Some("u*v"), "1").unwrap();
    ep.step(Action::Simplify).unwrap();
    assert_eq!(ep.inspect().equation(), "u^3 + v^3 - 1 = 0");

    write(&mut ep, "(1 + I*sqrt(3))/2");
    write(&mut ep, "(1 - I*sqrt(3))/2");
    assert_eq!(substitute(&mut ep, Some("u^3"), "(1 + I*sqrt(3))/2").unwrap(), 0.0);
    assert_eq!(substitute(&mut ep, Some("v^3"), "(1 - I*sqrt(3))/2").unwrap(), 1.0);

    let snap = ep.inspect();
    assert_eq!(snap.equation(), "0 = 0");
    assert_eq!(snap.found_roots.len(), 1);
    assert_eq!(snap.substitutions.len(), 4);
}

#[test]
fn cyclic_chain_yields_no_root() {
    let mut ep = multi("x - 1 = 0");
    write(&mut ep, "u x");
    substitute(&mut ep, None, "u").unwrap();
    substitute(&mut ep, Some("u"), "x").unwrap();
    assert_eq!(ep.inspect().equation(), "x - 1 = 0");
    // Clears the board without ever giving x a value.
    assert_eq!(substitute(&mut ep, Some("x - 1"), "0").unwrap(), 0.0);
    assert_eq!(ep.inspect().equation(), "0 = 0");
    assert!(ep.inspect().found_roots.is_empty());
    assert_eq!(ep.step(Action::DeclareComplete).unwrap(), -1.0);
}

#[test]
fn terminal_state_is_frozen() {
    let mut ep = multi("x^2 - 1 = 0");
    ep.step(Action::DeclareUnsolvable).unwrap();
    let before = ep.inspect();
    for action in [
        Action::Write("1".into()),
        Action::Simplify,
        Action::Reset,
        Action::DeclareComplete,
        Action::DeclareUnsolvable,
    ] {
        assert!(matches!(ep.step(action), Err(EnvError::TerminalState)));
    }
    assert_eq!(ep.inspect(), before);
}

#[test]
fn failed_actions_leave_state_untouched() {
    let config = EnvConfig {
        engine: tb_engine::EngineLimits {
            max_expand_terms: 50,
            ..Default::default()
        },
        ..EnvConfig::multi_root()
    };
    let mut ep = Episode::symbolic("(x + y + 1)^8 = 0", Some("x"), config).unwrap();
    write(&mut ep, "note");
    let before = ep.inspect();
    assert!(matches!(ep.step(Action::Expand), Err(EnvError::Engine(_))));
    assert_eq!(ep.inspect(), before);
}

#[test]
fn descriptors_drive_an_episode() {
    let mut ep = multi("x - 5 = 0");
    let script = ActionDescriptor::script_from_json(
        r#"[
            {"kind": "copy"},
            {"kind": "write", "text": "5"},
            {"kind": "substitute", "target": "x", "expr": "5"},
            {"kind": "declare_complete"}
        ]"#,
    )
    .unwrap();
    let rewards: Vec<f64> = script
        .iter()
        .map(|d| ep.step_descriptor(d).unwrap())
        .collect();
    assert_eq!(rewards, vec![0.0, 0.0, 1.0, 5.0]);

    let mut fresh = multi("x - 5 = 0");
    assert!(matches!(
        fresh.step_descriptor(&ActionDescriptor::new("fly")),
        Err(EnvError::UnknownAction(_))
    ));
    assert_eq!(fresh.inspect().steps, 0);
}

#[test]
fn constant_equation_with_named_unknown() {
    let mut ep = Episode::symbolic("2 = 2", Some("x"), EnvConfig::multi_root()).unwrap();
    let l = ep.reward_length() as f64;
    let reward = ep.step(Action::DeclareComplete).unwrap();
    assert!(close(reward, 0.5 * l));
}

#[test]
fn generic_over_the_engine() {
    fn run<E: AlgebraEngine>(engine: E) -> f64 {
        let mut ep = Episode::from_text(engine, "x + 1 = 0", None, EnvConfig::multi_root()).unwrap();
        ep.step(Action::Write("-1".into())).unwrap();
        let minus_one = ep.engine().number(-1);
        ep.step(Action::Substitute {
            target: None,
            expr: minus_one,
        })
        .unwrap()
    }
    assert_eq!(run(SymbolicEngine::new()), 1.0);
}
