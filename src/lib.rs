//! Saju (四柱) four-pillar charts from Gregorian birth moments.
//!
//! A chart is four stem-branch pairs for the year, month, day and hour of
//! birth. [`PillarCalculator`] validates the birth moment, hands the date to
//! a [`SolarToLunarConverter`](converter::SolarToLunarConverter) and derives
//! the hour pillar from the day stem. The crate ships its own converter,
//! [`EphemerisConverter`](converter::EphemerisConverter), built on a Chinese
//! lunisolar calendar computed from solar and lunar ephemerides for the years
//! 1899 to 2101.
//!
//! # Examples
//!
//! Computing a chart:
//!
//! ```
//! use saju::PillarCalculator;
//! use saju::converter::EphemerisConverter;
//!
//! let calculator = PillarCalculator::new(EphemerisConverter::new());
//! let chart = calculator.compute_pillars(1990, 12, 25, 12, 0).unwrap();
//!
//! assert_eq!("甲子", chart.day().to_string());
//! assert_eq!(
//!     r#"{"year":"庚午","month":"戊子","day":"甲子","hour":"庚午","dayMaster":"甲"}"#,
//!     serde_json::to_string(&chart).unwrap()
//! );
//! ```
//!
//! The Chinese calendar underneath:
//!
//! ```
//! use saju::Date;
//! use saju::chinese::{Annus, Month::*};
//!
//! let date = Date::from_gregorian(2000, 1, 1).unwrap();
//! let annus = Annus::from_date(date).unwrap();
//!
//! assert_eq!(Ok((1999, Common(11), 25)), annus.ymd_for(date));
//! ```

pub mod calculator;
pub mod chinese;
pub mod config;
pub mod converter;
pub mod date;
pub mod error;
pub mod interpret;
pub mod logging;
pub mod pillars;
pub mod time_scales;

pub use calculator::PillarCalculator;
pub use config::CalculatorConfig;
pub use date::{Date, YearType};
pub use error::SajuError;
pub use pillars::{BirthMoment, FourPillars};
