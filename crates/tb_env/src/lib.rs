//! The two-board equation environment.
//!
//! An [`Episode`] holds an equation (the real board) and a free-text
//! workspace (the imaginary board). The agent transforms the equation with
//! field operations and engine rewrites, and may substitute into it only
//! expressions that can be read off the workspace. Reaching `0 = 0` with no
//! variables left resolves the substitution chain into a value for the
//! unknown, which is rewarded if it is one of the equation's roots.
//! Declaring the equation unsolvable by radicals is scored against a
//! factorization and Galois-group verdict computed when the episode starts.

pub mod action;
pub mod board;
pub mod config;
pub mod episode;
pub mod error;
pub mod extractor;
pub mod oracle;
pub mod resolver;
pub mod reward;
pub mod snapshot;

pub use action::{Action, ActionDescriptor, CopySource};
pub use board::{BoardState, SubstitutionRecord, Workspace};
pub use config::{EnvConfig, ExtractionPolicy, Variant};
pub use episode::Episode;
pub use error::EnvError;
pub use extractor::{Extractor, ValiditySet};
pub use oracle::{assess_solvability, Solvability};
pub use resolver::Resolver;
pub use reward::RewardCalculator;
pub use snapshot::{BoardSnapshot, SubstitutionEntry};
