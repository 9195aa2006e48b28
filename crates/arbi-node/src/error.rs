//! Errors surfaced by the applier.

use arbi_cases::CaseError;
use arbi_core::error::{IssuanceError, ParamsError, RevenueError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    #[error(transparent)] Params(#[from] ParamsError),
    #[error(transparent)] Issuance(#[from] IssuanceError),
    #[error(transparent)] Revenue(#[from] RevenueError),
    #[error(transparent)] Case(#[from] CaseError),
    #[error("invalid command on line {line}: {reason}")] InvalidCommand { line: usize, reason: String },
}
