//! Scripted episodes for `tb_cli demo`.

use clap::ValueEnum;
use tb_env::{ActionDescriptor, Variant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Demo {
    /// x - 5 = 0, copied, written and substituted
    Linear,
    /// Both roots of x^2 - 5x + 6 with a reset in between
    Quadratic,
    /// Only one quadratic root before declaring completion
    Incomplete,
    /// The real cube root of 2
    Cubic,
    /// Cardano's substitution on x^3 - 3x - 1
    Cardano,
    /// x^5 - x - 1, correctly declared unsolvable
    Quintic,
    /// x^5 - 32, wrongly declared unsolvable
    SolvableQuintic,
    /// Isolating x with field operations first
    Operations,
    /// A root hidden in workspace prose
    Prose,
}

impl Demo {
    pub fn equation(self) -> &'static str {
        match self {
            Demo::Linear => "x - 5 = 0",
            Demo::Quadratic | Demo::Incomplete => "x^2 - 5*x + 6 = 0",
            Demo::Cubic => "x^3 - 2 = 0",
            Demo::Cardano => "x^3 - 3*x - 1 = 0",
            Demo::Quintic => "x^5 - x - 1 = 0",
            Demo::SolvableQuintic => "x^5 - 32 = 0",
            Demo::Operations => "2*x + 3 = 7",
            Demo::Prose => "x - 3 = 0",
        }
    }

    pub fn variant(self) -> Variant {
        match self {
            Demo::Linear | Demo::Cubic | Demo::SolvableQuintic | Demo::Operations => {
                Variant::SingleRoot
            }
            _ => Variant::MultiRoot,
        }
    }

    pub fn script(self) -> Vec<ActionDescriptor> {
        let write = |text: &str| ActionDescriptor::new("write").with_text(text);
        let subs = |expr: &str| ActionDescriptor::new("substitute").with_expr(expr);
        let subs_at =
            |target: &str, expr: &str| ActionDescriptor::new("substitute").with_target(target).with_expr(expr);
        let bare = ActionDescriptor::new;

        match self {
            Demo::Linear => vec![bare("copy"), write("5"), subs_at("x", "5")],
            Demo::Quadratic => vec![
                bare("copy"),
                write("(-5)^2 - 4*1*6"),
                write("sqrt(1)"),
                write("(5 + 1)/2"),
                write("(5 - 1)/2"),
                subs("2"),
                bare("reset"),
                subs("3"),
                bare("declare_complete"),
            ],
            Demo::Incomplete => vec![write("2"), subs("2"), bare("declare_complete")],
            Demo::Cubic => vec![write("2**(1/3)"), subs("2^(1/3)")],
            Demo::Cardano => vec![
                write("u + v"),
                subs("u + v"),
                bare("expand"),
                bare("simplify"),
                write("1"),
                subs_at("u*v", "1"),
                bare("simplify"),
                write("(1 + I*sqrt(3))/2"),
                write("(1 - I*sqrt(3))/2"),
                subs_at("u^3", "(1 + I*sqrt(3))/2"),
                subs_at("v^3", "(1 - I*sqrt(3))/2"),
            ],
            Demo::Quintic | Demo::SolvableQuintic => vec![bare("declare_unsolvable")],
            Demo::Operations => vec![
                ActionDescriptor::new("sub").with_expr("3"),
                bare("simplify"),
                ActionDescriptor::new("div").with_expr("2"),
                bare("simplify"),
                write("2"),
                subs("2"),
            ],
            Demo::Prose => vec![
                write("hello world 🎲"),
                subs("3"),
                write("the answer is probably 3 maybe"),
                subs("3"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_engine::SymbolicEngine;

    #[test]
    fn every_script_resolves() {
        let engine = SymbolicEngine::new();
        for demo in Demo::value_variants() {
            for d in demo.script() {
                assert!(d.resolve(&engine).is_ok(), "{:?}: {:?}", demo, d);
            }
        }
    }

    #[test]
    fn value_names_are_kebab_case() {
        let name = Demo::SolvableQuintic
            .to_possible_value()
            .map(|v| v.get_name().to_string());
        assert_eq!(name.as_deref(), Some("solvable-quintic"));
    }
}
