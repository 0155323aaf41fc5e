use crate::config::Variant;
use tb_engine::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("the episode is already in a terminal state")]
    TerminalState,

    #[error("cannot {operation} both sides by zero")]
    ZeroOperand { operation: &'static str },

    #[error("`{expr}` cannot be extracted from the workspace; available: {{{}}}", available.join(", "))]
    Unconstructible {
        expr: String,
        available: Vec<String>,
    },

    #[error("{action} is not available in the {variant} variant")]
    UnsupportedAction {
        action: &'static str,
        variant: Variant,
    },

    #[error("unknown action kind: {0}")]
    UnknownAction(String),

    #[error("{action} requires `{argument}`")]
    MissingArgument {
        action: &'static str,
        argument: &'static str,
    },

    #[error("invalid argument for {action}: {reason}")]
    InvalidArgument {
        action: &'static str,
        reason: String,
    },

    #[error("no unknown to solve for in `{0}`")]
    NoUnknown(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconstructible_lists_candidates() {
        let err = EnvError::Unconstructible {
            expr: "7".into(),
            available: vec!["-1".into(), "0".into(), "1".into()],
        };
        assert_eq!(
            err.to_string(),
            "`7` cannot be extracted from the workspace; available: {-1, 0, 1}"
        );
    }

    #[test]
    fn test_engine_errors_pass_through() {
        let err: EnvError = EngineError::Undecidable("degree 7".into()).into();
        assert!(matches!(err, EnvError::Engine(_)));
    }
}
