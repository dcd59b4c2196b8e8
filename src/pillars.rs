//! Birth moments and the four-pillar chart.

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::chinese::cycle::{Pillar, Stem};

/// A birth date and civil clock time on the proleptic Gregorian calendar.
///
/// Fields are signed so that out-of-range input can be represented and
/// rejected with a precise error.
///
/// ```
/// use saju::BirthMoment;
///
/// let birth: BirthMoment =
///     serde_json::from_str(r#"{"year": 1990, "month": 12, "day": 25, "hour": 12}"#).unwrap();
/// assert_eq!(BirthMoment::new(1990, 12, 25, 12), birth);
/// assert_eq!(0, birth.minute);
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BirthMoment {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    #[serde(default)]
    pub minute: i32,
}

impl BirthMoment {
    /// A birth moment on the hour.
    pub fn new(year: i32, month: i32, day: i32, hour: i32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute: 0,
        }
    }
    pub fn with_minute(mut self, minute: i32) -> Self {
        self.minute = minute;
        self
    }
}

/// A Saju chart: year, month, day and hour pillars.
///
/// The day master is always the stem of the day pillar; there is no way to
/// build a chart where the two disagree.
///
/// ```
/// use saju::FourPillars;
///
/// let chart = FourPillars::new(
///     "庚午".parse().unwrap(),
///     "戊子".parse().unwrap(),
///     "甲子".parse().unwrap(),
///     "庚午".parse().unwrap(),
/// );
/// assert_eq!('甲', chart.day_master().as_char());
/// assert_eq!(
///     r#"{"year":"庚午","month":"戊子","day":"甲子","hour":"庚午","dayMaster":"甲"}"#,
///     serde_json::to_string(&chart).unwrap()
/// );
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FourPillars {
    year: Pillar,
    month: Pillar,
    day: Pillar,
    hour: Pillar,
}

impl FourPillars {
    pub fn new(year: Pillar, month: Pillar, day: Pillar, hour: Pillar) -> Self {
        Self {
            year,
            month,
            day,
            hour,
        }
    }
    pub fn year(&self) -> Pillar {
        self.year
    }
    pub fn month(&self) -> Pillar {
        self.month
    }
    pub fn day(&self) -> Pillar {
        self.day
    }
    pub fn hour(&self) -> Pillar {
        self.hour
    }
    /// 日主：the stem of the day pillar.
    pub fn day_master(&self) -> Stem {
        self.day.stem()
    }
}

impl fmt::Display for FourPillars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.year, self.month, self.day, self.hour)
    }
}

impl Serialize for FourPillars {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FourPillars", 5)?;
        state.serialize_field("year", &self.year)?;
        state.serialize_field("month", &self.month)?;
        state.serialize_field("day", &self.day)?;
        state.serialize_field("hour", &self.hour)?;
        state.serialize_field("dayMaster", &self.day_master())?;
        state.end()
    }
}
