//! The four-pillar calculator.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, error, warn};

use crate::chinese::cycle::{Branch, HOUR_STEM_TABLE, Pillar, hour_stem_row};
use crate::config::CalculatorConfig;
use crate::converter::{EphemerisConverter, LunarResult, SolarMoment, SolarToLunarConverter};
use crate::error::{CalculationFailure, ConversionAnomaly, Field, PillarKind, SajuError};
use crate::pillars::{BirthMoment, FourPillars};

/// Supported birth years.
pub const YEAR_RANGE: RangeInclusive<i32> = 1900..=2100;

/// How the hour pillar is obtained.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum HourPillarMode {
    /// Take the converter's hour pillar when it provides one, otherwise use
    /// the hour-stem table.
    #[default]
    Auto,
    /// Always use the hour-stem table.
    Table,
}

/// Computes [`FourPillars`] from a birth moment through a
/// [`SolarToLunarConverter`].
///
/// # Example
///
/// ```
/// use saju::PillarCalculator;
/// use saju::converter::EphemerisConverter;
///
/// let calculator = PillarCalculator::new(EphemerisConverter::new());
/// let chart = calculator.compute_pillars(1990, 12, 25, 12, 0).unwrap();
///
/// assert_eq!("庚午 戊子 甲子 庚午", chart.to_string());
/// assert_eq!('甲', chart.day_master().as_char());
/// ```
#[derive(Debug, Clone)]
pub struct PillarCalculator<C> {
    converter: C,
    hour_pillar: HourPillarMode,
}

impl PillarCalculator<EphemerisConverter> {
    /// Builds a calculator over the built-in converter.
    pub fn from_config(config: &CalculatorConfig) -> Self {
        let converter = EphemerisConverter::new()
            .with_year_boundary(config.year_boundary)
            .with_exact_terms(config.exact_terms);
        PillarCalculator::new(converter).with_hour_pillar(config.hour_pillar)
    }
}

impl<C: SolarToLunarConverter> PillarCalculator<C> {
    pub fn new(converter: C) -> Self {
        Self {
            converter,
            hour_pillar: HourPillarMode::default(),
        }
    }
    pub fn with_hour_pillar(mut self, mode: HourPillarMode) -> Self {
        self.hour_pillar = mode;
        self
    }
    pub fn hour_pillar_mode(&self) -> HourPillarMode {
        self.hour_pillar
    }
    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// Computes the chart for the given birth date and time.
    ///
    /// Fields are validated in the order year, month, day, hour, minute;
    /// whether the day exists in its month is left to the converter.
    pub fn compute_pillars(
        &self,
        year: i32,
        month: i32,
        day: i32,
        hour: i32,
        minute: i32,
    ) -> Result<FourPillars, SajuError> {
        self.compute(&BirthMoment {
            year,
            month,
            day,
            hour,
            minute,
        })
    }

    /// Same as [`compute_pillars`](Self::compute_pillars).
    pub fn compute(&self, birth: &BirthMoment) -> Result<FourPillars, SajuError> {
        let &BirthMoment {
            year,
            month,
            day,
            hour,
            minute,
        } = birth;
        debug!(year, month, day, hour, minute, "computing four pillars");

        validate(birth)?;
        let result = self.compute_valid(birth);
        match &result {
            Ok(pillars) => debug!(
                %pillars,
                day_master = %pillars.day_master(),
                "computed four pillars"
            ),
            Err(err) => error!(
                year,
                month,
                day,
                hour,
                minute,
                error = %err,
                cause = %error_chain(err),
                "four pillar calculation failed"
            ),
        }
        result
    }

    fn compute_valid(&self, birth: &BirthMoment) -> Result<FourPillars, SajuError> {
        let moment = SolarMoment::new(birth.year, birth.month, birth.day, birth.hour, birth.minute);
        let lunar = self
            .converter
            .convert(&moment)
            .map_err(CalculationFailure::from)?;

        let year = parse_pillar(PillarKind::Year, Some(&lunar.year_pillar))?;
        let month = parse_pillar(PillarKind::Month, Some(&lunar.month_pillar))?;
        let day = parse_pillar(PillarKind::Day, Some(&lunar.day_pillar))?;
        let hour = self.hour_pillar(&lunar, day, birth.hour as u32)?;

        Ok(FourPillars::new(year, month, day, hour))
    }

    fn hour_pillar(
        &self,
        lunar: &LunarResult,
        day: Pillar,
        hour: u32,
    ) -> Result<Pillar, CalculationFailure> {
        match self.hour_pillar {
            HourPillarMode::Auto if self.converter.supports_native_hour_pillar() => {
                parse_pillar(PillarKind::Hour, lunar.hour_pillar.as_deref())
            }
            _ => Ok(table_hour_pillar(day.stem().as_char(), hour)),
        }
    }
}

fn validate(birth: &BirthMoment) -> Result<(), SajuError> {
    check(Field::Year, birth.year, YEAR_RANGE)?;
    check(Field::Month, birth.month, 1..=12)?;
    check(Field::Day, birth.day, 1..=31)?;
    check(Field::Hour, birth.hour, 0..=23)?;
    check(Field::Minute, birth.minute, 0..=59)
}

fn check(field: Field, value: i32, range: RangeInclusive<i32>) -> Result<(), SajuError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(SajuError::invalid_input(
            field,
            format!("{value} is outside {}..={}", range.start(), range.end()),
        ))
    }
}

fn parse_pillar(kind: PillarKind, code: Option<&str>) -> Result<Pillar, CalculationFailure> {
    match code {
        None | Some("") => Err(CalculationFailure::MissingPillar(kind)),
        Some(code) => code
            .parse()
            .map_err(|source| CalculationFailure::MalformedPillar { kind, source }),
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut chain = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain.join(": ")
}

/// The two-hour branch slot of a clock hour in `0..=23`: 子 (0) spans 23:00
/// to 00:59, 丑 (1) spans 01:00 to 02:59, and so on.
///
/// ```
/// use saju::calculator::hour_slot;
///
/// assert_eq!(0, hour_slot(23));
/// assert_eq!(0, hour_slot(0));
/// assert_eq!(6, hour_slot(12));
/// assert_eq!(11, hour_slot(22));
/// ```
pub fn hour_slot(hour: u32) -> usize {
    if hour == 23 || hour == 0 {
        0
    } else {
        (hour as usize + 1) / 2
    }
}

/// Hour pillar from the hour-stem table. A day stem missing from the table
/// is reported as a [`ConversionAnomaly`] and the 甲 row is used.
fn table_hour_pillar(day_stem: char, hour: u32) -> Pillar {
    let slot = hour_slot(hour);
    let row = hour_stem_row(day_stem).unwrap_or_else(|| {
        let (fallback, row) = &HOUR_STEM_TABLE[0];
        let anomaly = ConversionAnomaly {
            day_stem,
            fallback: *fallback,
        };
        warn!(%anomaly, "conversion anomaly");
        row
    });
    Pillar::new(row[slot], Branch::from_index(slot as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ConversionError;
    use assert_matches::assert_matches;

    /// Converter returning canned pillars.
    struct Canned {
        day_pillar: &'static str,
        hour_pillar: Option<&'static str>,
        native: bool,
    }

    impl SolarToLunarConverter for Canned {
        fn convert(&self, _: &SolarMoment) -> Result<LunarResult, ConversionError> {
            Ok(LunarResult {
                year_pillar: "庚午".to_owned(),
                month_pillar: "戊子".to_owned(),
                day_pillar: self.day_pillar.to_owned(),
                hour_pillar: self.hour_pillar.map(str::to_owned),
                lunar_date: None,
            })
        }
        fn supports_native_hour_pillar(&self) -> bool {
            self.native
        }
    }

    fn canned(day_pillar: &'static str) -> Canned {
        Canned {
            day_pillar,
            hour_pillar: None,
            native: false,
        }
    }

    #[test]
    fn slots() {
        let expected = [0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 0];
        for (hour, std) in expected.into_iter().enumerate() {
            assert_eq!(std, hour_slot(hour as u32), "{hour}");
            assert_eq!(((hour + 1) % 24) / 2, hour_slot(hour as u32), "{hour}");
        }
    }

    #[test]
    fn table_path() {
        let calculator = PillarCalculator::new(canned("甲子"));
        let chart = calculator.compute_pillars(1990, 12, 25, 12, 0).unwrap();
        assert_eq!("庚午", chart.hour().to_string());
        let chart = calculator.compute_pillars(1990, 12, 25, 23, 30).unwrap();
        assert_eq!("甲子", chart.hour().to_string());

        let calculator = PillarCalculator::new(canned("丁卯"));
        let chart = calculator.compute_pillars(1990, 12, 25, 1, 0).unwrap();
        assert_eq!("辛丑", chart.hour().to_string());
    }

    #[test]
    fn native_path() {
        let converter = Canned {
            day_pillar: "甲子",
            hour_pillar: Some("壬申"),
            native: true,
        };
        let calculator = PillarCalculator::new(&converter);
        let chart = calculator.compute_pillars(1990, 12, 25, 12, 0).unwrap();
        assert_eq!("壬申", chart.hour().to_string());

        let calculator = calculator.with_hour_pillar(HourPillarMode::Table);
        let chart = calculator.compute_pillars(1990, 12, 25, 12, 0).unwrap();
        assert_eq!("庚午", chart.hour().to_string());
    }

    #[test]
    fn native_path_contract_violations() {
        for (hour_pillar, expected) in [
            (None, CalculationFailure::MissingPillar(PillarKind::Hour)),
            (Some(""), CalculationFailure::MissingPillar(PillarKind::Hour)),
        ] {
            let calculator = PillarCalculator::new(Canned {
                day_pillar: "甲子",
                hour_pillar,
                native: true,
            });
            assert_eq!(
                Err(SajuError::CalculationFailure(expected)),
                calculator.compute_pillars(1990, 12, 25, 12, 0)
            );
        }
        let calculator = PillarCalculator::new(Canned {
            day_pillar: "甲子",
            hour_pillar: Some("午時"),
            native: true,
        });
        assert_matches!(
            calculator.compute_pillars(1990, 12, 25, 12, 0),
            Err(SajuError::CalculationFailure(CalculationFailure::MalformedPillar {
                kind: PillarKind::Hour,
                ..
            }))
        );
    }

    #[test]
    fn malformed_day_pillar() {
        for code in ["", "甲", "子甲", "XY", "甲丑"] {
            let calculator = PillarCalculator::new(canned(code));
            let err = calculator.compute_pillars(1990, 12, 25, 12, 0).unwrap_err();
            assert_eq!("server_error", err.category(), "{code}");
            assert_matches!(
                err,
                SajuError::CalculationFailure(
                    CalculationFailure::MissingPillar(PillarKind::Day)
                        | CalculationFailure::MalformedPillar {
                            kind: PillarKind::Day,
                            ..
                        }
                )
            );
        }
    }

    #[test]
    fn validation_order() {
        let calculator = PillarCalculator::new(canned("甲子"));
        assert_matches!(
            calculator.compute_pillars(1899, 13, 0, 24, 60),
            Err(SajuError::InvalidInput {
                field: Field::Year,
                ..
            })
        );
        assert_matches!(
            calculator.compute_pillars(1900, 13, 0, 24, 60),
            Err(SajuError::InvalidInput {
                field: Field::Month,
                ..
            })
        );
        assert_matches!(
            calculator.compute_pillars(1900, 12, 0, 24, 60),
            Err(SajuError::InvalidInput { field: Field::Day, .. })
        );
        assert_matches!(
            calculator.compute_pillars(1900, 12, 31, 24, 60),
            Err(SajuError::InvalidInput {
                field: Field::Hour,
                ..
            })
        );
        assert_matches!(
            calculator.compute_pillars(1900, 12, 31, 23, 60),
            Err(SajuError::InvalidInput {
                field: Field::Minute,
                ..
            })
        );
        assert_eq!(
            Err(SajuError::InvalidInput {
                field: Field::Year,
                reason: "2101 is outside 1900..=2100".to_owned()
            }),
            calculator.compute_pillars(2101, 1, 1, 0, 0)
        );
    }

    #[test]
    fn conversion_error_is_failure() {
        struct Failing;
        impl SolarToLunarConverter for Failing {
            fn convert(&self, moment: &SolarMoment) -> Result<LunarResult, ConversionError> {
                Err(ConversionError::InvalidDate {
                    year: moment.year,
                    month: moment.month,
                    day: moment.day,
                })
            }
        }
        let err = PillarCalculator::new(Failing)
            .compute_pillars(2021, 2, 30, 0, 0)
            .unwrap_err();
        assert_eq!(
            SajuError::CalculationFailure(CalculationFailure::Conversion(
                ConversionError::InvalidDate {
                    year: 2021,
                    month: 2,
                    day: 30
                }
            )),
            err
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn unknown_day_stem_falls_back() {
        assert_eq!("甲子", table_hour_pillar('子', 0).to_string());
        assert_eq!("庚午", table_hour_pillar('?', 12).to_string());
        assert_eq!("丙子", table_hour_pillar('乙', 23).to_string());
    }

    #[test]
    fn config() {
        let config = CalculatorConfig {
            hour_pillar: HourPillarMode::Table,
            ..Default::default()
        };
        let calculator = PillarCalculator::from_config(&config);
        assert_eq!(HourPillarMode::Table, calculator.hour_pillar_mode());
        assert!(!calculator.converter().exact_terms());
    }
}
