//! Error types.
//!
//! - `GrowthError` is returned by the library (tables, curves, fitting, cache).
//! - `AppError` is what the `gc` binary reports: a message plus a process exit code.

use thiserror::Error;

use crate::domain::SpeciesType;

/// Errors raised while building growth curves and carbon curves.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GrowthError {
    #[error("yield table has no rows")]
    EmptyYieldTable,

    #[error("age {age} is beyond the last tabulated age {max_age}")]
    AgeOutOfRange { age: usize, max_age: usize },

    #[error("no PERD factor configured for {0}")]
    MissingPerdFactor(SpeciesType),

    #[error("smoothing fit failed: {0}")]
    FitFailed(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type GrowthResult<T> = Result<T, GrowthError>;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<GrowthError> for AppError {
    fn from(err: GrowthError) -> Self {
        AppError::new(4, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
