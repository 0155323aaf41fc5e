use crate::budget::BudgetExceeded;
use tb_parser::ParseError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("'{expr}' is not a polynomial in {var}")]
    NotPolynomial { expr: String, var: String },

    #[error(transparent)]
    Budget(#[from] BudgetExceeded),

    #[error("Cannot decide: {0}")]
    Undecidable(String),

    #[error("Numeric failure: {0}")]
    Numeric(String),
}
