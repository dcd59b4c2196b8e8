//! Calculator settings.
//!
//! Settings deserialize from partial JSON (missing fields take their
//! defaults) or are read from the environment:
//!
//! | Variable             | Values                        | Default          |
//! |----------------------|-------------------------------|------------------|
//! | `SAJU_HOUR_PILLAR`   | `auto`, `table`               | `auto`           |
//! | `SAJU_YEAR_BOUNDARY` | `lunar-new-year`, `li-chun`   | `lunar-new-year` |
//! | `SAJU_EXACT_TERMS`   | `true`, `false`               | `false`          |

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calculator::HourPillarMode;
use crate::converter::YearBoundary;

pub const HOUR_PILLAR_VAR: &str = "SAJU_HOUR_PILLAR";
pub const YEAR_BOUNDARY_VAR: &str = "SAJU_YEAR_BOUNDARY";
pub const EXACT_TERMS_VAR: &str = "SAJU_EXACT_TERMS";

/// Settings for [`PillarCalculator::from_config`](crate::PillarCalculator::from_config).
///
/// ```
/// use saju::CalculatorConfig;
/// use saju::calculator::HourPillarMode;
///
/// let config: CalculatorConfig = serde_json::from_str(r#"{"hour_pillar": "table"}"#).unwrap();
/// assert_eq!(HourPillarMode::Table, config.hour_pillar);
/// assert!(!config.exact_terms);
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    pub hour_pillar: HourPillarMode,
    pub year_boundary: YearBoundary,
    /// Compare birth instants against solar term instants rather than dates.
    pub exact_terms: bool,
}

impl CalculatorConfig {
    /// Reads settings from the process environment. Unset variables keep
    /// their defaults; unparseable ones are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            hour_pillar: parse_var(&lookup, HOUR_PILLAR_VAR, defaults.hour_pillar),
            year_boundary: parse_var(&lookup, YEAR_BOUNDARY_VAR, defaults.year_boundary),
            exact_terms: parse_var(&lookup, EXACT_TERMS_VAR, defaults.exact_terms),
        }
    }
}

fn parse_var<T>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    let Some(value) = lookup(key) else {
        return default;
    };
    match value.trim().to_lowercase().parse() {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!(key, value = %value, error = %err, "ignoring unparseable setting");
            default
        }
    }
}
