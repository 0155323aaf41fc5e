//! The closed set of moves, and the loose descriptor drivers send.

use crate::error::EnvError;
use serde::{Deserialize, Serialize};
use tb_engine::AlgebraEngine;

/// What `Copy` puts on the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopySource<X> {
    /// Both sides, as two entries.
    Equation,
    Lhs,
    Rhs,
    Expr(X),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<X> {
    Add(X),
    Sub(X),
    Mul(X),
    Div(X),
    Simplify,
    Expand,
    Factor,
    /// Group by powers of a variable; `None` means the unknown.
    Collect(Option<String>),
    RaiseToPower(X),
    Write(String),
    Copy(CopySource<X>),
    /// Replace `target` (default: the unknown) by a constructible `expr`.
    Substitute { target: Option<X>, expr: X },
    Reset,
    DeclareComplete,
    DeclareUnsolvable,
}

impl<X> Action<X> {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Add(_) => "add",
            Action::Sub(_) => "sub",
            Action::Mul(_) => "mul",
            Action::Div(_) => "div",
            Action::Simplify => "simplify",
            Action::Expand => "expand",
            Action::Factor => "factor",
            Action::Collect(_) => "collect",
            Action::RaiseToPower(_) => "power",
            Action::Write(_) => "write",
            Action::Copy(_) => "copy",
            Action::Substitute { .. } => "substitute",
            Action::Reset => "reset",
            Action::DeclareComplete => "declare_complete",
            Action::DeclareUnsolvable => "declare_unsolvable",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Action::DeclareComplete | Action::DeclareUnsolvable)
    }
}

/// Serialisable, string-typed form of an [`Action`].
///
/// ```json
/// {"kind": "substitute", "target": "u^3", "expr": "(1 + I*sqrt(3))/2"}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ActionDescriptor {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            ..Self::default()
        }
    }

    pub fn with_expr(mut self, expr: &str) -> Self {
        self.expr = Some(expr.to_string());
        self
    }

    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    /// Parses a JSON array of descriptors.
    pub fn script_from_json(json: &str) -> Result<Vec<ActionDescriptor>, EnvError> {
        serde_json::from_str(json).map_err(|e| EnvError::InvalidArgument {
            action: "script",
            reason: e.to_string(),
        })
    }

    /// Turns the descriptor into an [`Action`], parsing every expression
    /// argument with `engine`.
    pub fn resolve<E: AlgebraEngine>(&self, engine: &E) -> Result<Action<E::Expr>, EnvError> {
        let kind = normalize_kind(&self.kind);
        let action = match kind.as_str() {
            "add" => Action::Add(self.required_expr(engine, "add")?),
            "sub" | "subtract" => Action::Sub(self.required_expr(engine, "sub")?),
            "mul" | "multiply" => Action::Mul(self.required_expr(engine, "mul")?),
            "div" | "divide" => Action::Div(self.required_expr(engine, "div")?),
            "simplify" => Action::Simplify,
            "expand" => Action::Expand,
            "factor" => Action::Factor,
            "collect" => Action::Collect(self.collect_variable()?),
            "power" | "raise_to_power" | "pow" => {
                Action::RaiseToPower(self.required_expr(engine, "power")?)
            }
            "write" => {
                let text = self
                    .text
                    .as_ref()
                    .or(self.expr.as_ref())
                    .ok_or(EnvError::MissingArgument {
                        action: "write",
                        argument: "text",
                    })?;
                Action::Write(text.clone())
            }
            "copy" => Action::Copy(self.copy_source(engine)?),
            "substitute" | "subs" => {
                let expr = self.required_expr(engine, "substitute")?;
                let target = match &self.target {
                    Some(text) => Some(parse_argument(engine, "substitute", text)?),
                    None => None,
                };
                Action::Substitute { target, expr }
            }
            "reset" => Action::Reset,
            "declare_complete" | "complete" => Action::DeclareComplete,
            "declare_unsolvable" | "unsolvable" => Action::DeclareUnsolvable,
            _ => return Err(EnvError::UnknownAction(self.kind.clone())),
        };
        Ok(action)
    }

    fn required_expr<E: AlgebraEngine>(
        &self,
        engine: &E,
        action: &'static str,
    ) -> Result<E::Expr, EnvError> {
        let text = self.expr.as_ref().ok_or(EnvError::MissingArgument {
            action,
            argument: "expr",
        })?;
        parse_argument(engine, action, text)
    }

    fn collect_variable(&self) -> Result<Option<String>, EnvError> {
        match self.target.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(name) if is_identifier(name) => Ok(Some(name.to_string())),
            Some(other) => Err(EnvError::InvalidArgument {
                action: "collect",
                reason: format!("`{}` is not a variable name", other),
            }),
        }
    }

    fn copy_source<E: AlgebraEngine>(&self, engine: &E) -> Result<CopySource<E::Expr>, EnvError> {
        if let Some(text) = &self.expr {
            return Ok(CopySource::Expr(parse_argument(engine, "copy", text)?));
        }
        let source = self.target.as_deref().map(|t| t.trim().to_ascii_lowercase());
        match source.as_deref() {
            None | Some("") | Some("equation") | Some("both") => Ok(CopySource::Equation),
            Some("lhs") | Some("left") => Ok(CopySource::Lhs),
            Some("rhs") | Some("right") => Ok(CopySource::Rhs),
            Some(other) => Err(EnvError::InvalidArgument {
                action: "copy",
                reason: format!("unknown copy source `{}`", other),
            }),
        }
    }
}

fn parse_argument<E: AlgebraEngine>(
    engine: &E,
    action: &'static str,
    text: &str,
) -> Result<E::Expr, EnvError> {
    engine.parse(text).map_err(|e| EnvError::InvalidArgument {
        action,
        reason: format!("`{}`: {}", text, e),
    })
}

fn normalize_kind(kind: &str) -> String {
    kind.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_engine::SymbolicEngine;

    #[test]
    fn test_resolve_arithmetic() {
        let engine = SymbolicEngine::new();
        let action = ActionDescriptor::new("Subtract")
            .with_expr("3")
            .resolve(&engine)
            .unwrap();
        assert_eq!(action, Action::Sub(engine.number(3)));
    }

    #[test]
    fn test_resolve_substitute_with_target() {
        let engine = SymbolicEngine::new();
        let action = ActionDescriptor::new("substitute")
            .with_target("u^3")
            .with_expr("1")
            .resolve(&engine)
            .unwrap();
        match action {
            Action::Substitute { target, expr } => {
                assert_eq!(target.unwrap().to_string(), "u^3");
                assert_eq!(expr, engine.number(1));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_write_prefers_text() {
        let engine = SymbolicEngine::new();
        let action = ActionDescriptor::new("write")
            .with_text("hello 3")
            .resolve(&engine)
            .unwrap();
        assert_eq!(action, Action::Write("hello 3".into()));
    }

    #[test]
    fn test_copy_sources() {
        let engine = SymbolicEngine::new();
        let copy = |target: Option<&str>| {
            let mut d = ActionDescriptor::new("copy");
            if let Some(t) = target {
                d = d.with_target(t);
            }
            d.resolve(&engine)
        };
        assert_eq!(copy(None).unwrap(), Action::Copy(CopySource::Equation));
        assert_eq!(copy(Some("RHS")).unwrap(), Action::Copy(CopySource::Rhs));
        assert!(matches!(
            copy(Some("middle")),
            Err(EnvError::InvalidArgument { action: "copy", .. })
        ));
    }

    #[test]
    fn test_resolution_errors() {
        let engine = SymbolicEngine::new();
        assert!(matches!(
            ActionDescriptor::new("teleport").resolve(&engine),
            Err(EnvError::UnknownAction(k)) if k == "teleport"
        ));
        assert!(matches!(
            ActionDescriptor::new("mul").resolve(&engine),
            Err(EnvError::MissingArgument { action: "mul", argument: "expr" })
        ));
        assert!(matches!(
            ActionDescriptor::new("div").with_expr("2 +").resolve(&engine),
            Err(EnvError::InvalidArgument { action: "div", .. })
        ));
        assert!(matches!(
            ActionDescriptor::new("collect").with_target("x+1").resolve(&engine),
            Err(EnvError::InvalidArgument { action: "collect", .. })
        ));
    }

    #[test]
    fn test_script_from_json() {
        let script = ActionDescriptor::script_from_json(
            r#"[{"kind": "write", "text": "5"}, {"kind": "declare-complete"}]"#,
        )
        .unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script[0].text.as_deref(), Some("5"));
        let engine = SymbolicEngine::new();
        assert_eq!(script[1].resolve(&engine).unwrap(), Action::DeclareComplete);
    }
}
