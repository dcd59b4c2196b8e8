//! Error types for pillar calculation.

use strum::Display;
use thiserror::Error;

use crate::chinese::cycle::{ParsePillarError, Stem};
use crate::converter::ConversionError;

/// An input field of a birth moment.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    Year,
    Month,
    Day,
    Hour,
    Minute,
}

/// One of the four pillars.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum PillarKind {
    Year,
    Month,
    Day,
    Hour,
}

/// Errors returned by [`PillarCalculator`](crate::calculator::PillarCalculator).
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum SajuError {
    /// The caller supplied a value outside its allowed range.
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: Field, reason: String },
    /// The converter failed or broke its contract. The cause is available
    /// through [`std::error::Error::source`].
    #[error("calculation failed")]
    CalculationFailure(#[from] CalculationFailure),
}

impl SajuError {
    pub(crate) fn invalid_input(field: Field, reason: impl Into<String>) -> Self {
        SajuError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Get the error category for metrics and logging.
    pub fn category(&self) -> &'static str {
        match self {
            SajuError::InvalidInput { .. } => "client_error",
            SajuError::CalculationFailure(_) => "server_error",
        }
    }

    /// Calculations are deterministic, so repeating a failed one never helps.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Cause of a [`SajuError::CalculationFailure`].
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum CalculationFailure {
    #[error("solar to lunar conversion failed")]
    Conversion(#[from] ConversionError),
    #[error("converter returned no {0} pillar")]
    MissingPillar(PillarKind),
    #[error("converter returned a malformed {kind} pillar")]
    MalformedPillar {
        kind: PillarKind,
        #[source]
        source: ParsePillarError,
    },
}

/// A recoverable oddity met while deriving the hour pillar. Reported through
/// `tracing` and never returned to the caller.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("day stem `{day_stem}` has no hour-stem row, falling back to the {fallback} row")]
pub struct ConversionAnomaly {
    pub day_stem: char,
    pub fallback: Stem,
}
