//! Solar-to-lunar conversion.
//!
//! The pillar calculator treats conversion as a black box behind
//! [`SolarToLunarConverter`]. [`EphemerisConverter`] is the implementation
//! shipped with this crate, built on the Chinese calendar in
//! [`crate::chinese`].

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::debug;

use crate::chinese::cycle::{Branch, Pillar, Stem};
use crate::chinese::{
    self, Annus, CST_OFFSET_MINUTES, LunarDate, SolarTermErr, ephemeris, sexagenary_for_year,
};
use crate::date::Date;
use crate::time_scales::Ut;

/// A Gregorian civil date and time of day, as handed to a converter.
///
/// Fields are signed so that out-of-range values reach the converter intact
/// and are rejected there.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SolarMoment {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
}

impl SolarMoment {
    /// Creates a moment at the start of the given minute.
    pub fn new(year: i32, month: i32, day: i32, hour: i32, minute: i32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second: 0,
        }
    }
}

/// The result of a conversion. Pillars are two-character stem-branch codes
/// such as `甲子`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LunarResult {
    pub year_pillar: String,
    pub month_pillar: String,
    pub day_pillar: String,
    /// Present only for converters that compute the hour pillar themselves.
    pub hour_pillar: Option<String>,
    pub lunar_date: Option<LunarDate>,
}

/// A converter refused its input.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ConversionError {
    #[error("{year:04}-{month:02}-{day:02} is not a valid Gregorian date")]
    InvalidDate { year: i32, month: i32, day: i32 },
    #[error("{hour:02}:{minute:02}:{second:02} is not a valid time of day")]
    InvalidTime { hour: i32, minute: i32, second: i32 },
    #[error("{date} is outside the range covered by the ephemeris")]
    OutOfRange { date: String },
}

/// Converts a Gregorian moment into sexagenary pillars.
///
/// Implementations must fail with [`ConversionError`] for dates that do not
/// exist, rather than normalizing them.
pub trait SolarToLunarConverter {
    fn convert(&self, moment: &SolarMoment) -> Result<LunarResult, ConversionError>;

    /// Whether [`LunarResult::hour_pillar`] is filled in by [`convert`](Self::convert).
    fn supports_native_hour_pillar(&self) -> bool {
        false
    }
}

impl<C: SolarToLunarConverter + ?Sized> SolarToLunarConverter for &C {
    fn convert(&self, moment: &SolarMoment) -> Result<LunarResult, ConversionError> {
        (**self).convert(moment)
    }
    fn supports_native_hour_pillar(&self) -> bool {
        (**self).supports_native_hour_pillar()
    }
}

/// Where the year pillar changes.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum YearBoundary {
    /// 正月初一
    #[default]
    LunarNewYear,
    /// 立春
    LiChun,
}

/// Converter backed by the computed ephemeris, reckoning dates in China
/// Standard Time.
///
/// # Example
///
/// ```
/// use saju::converter::{EphemerisConverter, SolarMoment, SolarToLunarConverter};
///
/// let result = EphemerisConverter::new()
///     .convert(&SolarMoment::new(1990, 12, 25, 12, 0))
///     .unwrap();
/// assert_eq!("庚午", result.year_pillar);
/// assert_eq!("戊子", result.month_pillar);
/// assert_eq!("甲子", result.day_pillar);
/// assert_eq!(Some("庚午".to_owned()), result.hour_pillar);
/// ```
#[derive(Debug, Copy, Clone, Default)]
pub struct EphemerisConverter {
    year_boundary: YearBoundary,
    exact_terms: bool,
}

impl EphemerisConverter {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_year_boundary(mut self, year_boundary: YearBoundary) -> Self {
        self.year_boundary = year_boundary;
        self
    }
    /// Compare the birth instant against solar term instants instead of
    /// comparing calendar dates.
    pub fn with_exact_terms(mut self, exact_terms: bool) -> Self {
        self.exact_terms = exact_terms;
        self
    }
    pub fn year_boundary(&self) -> YearBoundary {
        self.year_boundary
    }
    pub fn exact_terms(&self) -> bool {
        self.exact_terms
    }

    /// Returns `(annus, term)` for the solar term in effect, term `1..=24`
    /// counted from 立春.
    fn solar_term(
        &self,
        annus: &Annus,
        date: Date,
        second_of_day: u32,
    ) -> Result<(i32, u32), SolarTermErr> {
        if self.exact_terms {
            annus.solar_term_at(Ut::from_local(date, second_of_day, CST_OFFSET_MINUTES))
        } else {
            annus
                .solar_term_for(date)
                .map(|(annus, term, _)| (annus, term))
        }
    }
}

impl SolarToLunarConverter for EphemerisConverter {
    fn convert(&self, moment: &SolarMoment) -> Result<LunarResult, ConversionError> {
        let &SolarMoment {
            year,
            month,
            day,
            hour,
            minute,
            second,
        } = moment;
        if !(0..24).contains(&hour) || !(0..60).contains(&minute) || !(0..60).contains(&second) {
            return Err(ConversionError::InvalidTime {
                hour,
                minute,
                second,
            });
        }
        let out_of_range = || ConversionError::OutOfRange {
            date: format!("{year:04}-{month:02}-{day:02}"),
        };
        if !(ephemeris::FIRST_ANNUS - 1..=ephemeris::LAST_ANNUS).contains(&year) {
            return Err(out_of_range());
        }
        let date =
            Date::from_gregorian(year, month, day).ok_or(ConversionError::InvalidDate {
                year,
                month,
                day,
            })?;

        let annus = Annus::from_date(date).ok_or_else(out_of_range)?;
        let lunar_date = annus.lunar_date_for(date).map_err(|_| out_of_range())?;
        let second_of_day = (hour * 3600 + minute * 60 + second) as u32;
        let (term_annus, term) = self
            .solar_term(&annus, date, second_of_day)
            .map_err(|_| out_of_range())?;

        // 冬至、小寒、大寒 precede the 立春 of their annus
        let li_chun_year = if term >= 22 { term_annus - 1 } else { term_annus };
        let year_pillar = Pillar::from_sexagenary(sexagenary_for_year(match self.year_boundary {
            YearBoundary::LunarNewYear => lunar_date.year,
            YearBoundary::LiChun => li_chun_year,
        }));
        let month_pillar = month_pillar(li_chun_year, term);
        let day_pillar = Pillar::from_sexagenary(date.sexagenary());
        let hour_pillar = native_hour_pillar(day_pillar.stem(), hour as u32);

        debug!(
            date = %date.iso_gregorian(),
            lunar = %lunar_date,
            solar_term = chinese::fmt::solar_term(term),
            "converted solar moment"
        );

        Ok(LunarResult {
            year_pillar: year_pillar.to_string(),
            month_pillar: month_pillar.to_string(),
            day_pillar: day_pillar.to_string(),
            hour_pillar: Some(hour_pillar.to_string()),
            lunar_date: Some(lunar_date),
        })
    }

    fn supports_native_hour_pillar(&self) -> bool {
        true
    }
}

/// Month pillar for solar term `term` (`1..=24` from 立春) of the year
/// starting at 立春 of `li_chun_year`.
///
/// Each 節 starts a month, 立春 starting the 寅 month. The stem of the 寅
/// month follows the year stem: 甲己 → 丙, 乙庚 → 戊, 丙辛 → 庚, 丁壬 → 壬,
/// 戊癸 → 甲.
fn month_pillar(li_chun_year: i32, term: u32) -> Pillar {
    let month_index = (term as i64 - 1) / 2;
    let year_stem = Pillar::from_sexagenary(sexagenary_for_year(li_chun_year)).stem();
    let first_stem = (year_stem.index() as i64 % 5) * 2 + 2;
    Pillar::new(
        Stem::from_index(first_stem + month_index),
        Branch::from_index(month_index + 2),
    )
}

/// Hour pillar counted on from the day: the 子 hour of a 甲 day is 甲子 and
/// every two hours advance one step in the sexagenary cycle.
fn native_hour_pillar(day_stem: Stem, hour: u32) -> Pillar {
    let slot = ((hour + 1) / 2 % 12) as i64;
    Pillar::new(
        Stem::from_index(2 * day_stem.index() as i64 + slot),
        Branch::from_index(slot),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chinese::Month::*;
    use assert_matches::assert_matches;

    fn convert(converter: &EphemerisConverter, (y, m, d, h, min): (i32, i32, i32, i32, i32)) -> LunarResult {
        converter.convert(&SolarMoment::new(y, m, d, h, min)).unwrap()
    }

    #[test]
    fn chart_1990_12_25() {
        let result = convert(&EphemerisConverter::new(), (1990, 12, 25, 12, 0));
        assert_eq!("庚午", result.year_pillar);
        assert_eq!("戊子", result.month_pillar);
        assert_eq!("甲子", result.day_pillar);
        assert_eq!(Some("庚午".to_owned()), result.hour_pillar);
        assert_eq!(
            Some(LunarDate {
                year: 1990,
                month: Common(11),
                day: 9
            }),
            result.lunar_date
        );
    }

    #[test]
    fn leap_month_closing_an_annus() {
        let converter = EphemerisConverter::new();
        for (date, std, month_pillar) in [
            ((1984, 11, 23, 12, 0), (1984, Leap(10), 1), "乙亥"),
            ((1984, 12, 1, 12, 0), (1984, Leap(10), 9), "乙亥"),
            ((1984, 12, 15, 12, 0), (1984, Leap(10), 23), "丙子"),
            ((2014, 11, 1, 12, 0), (2014, Leap(9), 9), "甲戌"),
        ] {
            let result = convert(&converter, date);
            let (year, month, day) = std;
            assert_eq!(Some(LunarDate { year, month, day }), result.lunar_date, "{date:?}");
            assert_eq!(month_pillar, result.month_pillar, "{date:?}");
        }
    }

    #[test]
    fn invalid_input() {
        let converter = EphemerisConverter::new();
        assert_matches!(
            converter.convert(&SolarMoment::new(2021, 2, 30, 12, 0)),
            Err(ConversionError::InvalidDate {
                year: 2021,
                month: 2,
                day: 30
            })
        );
        assert_matches!(
            converter.convert(&SolarMoment::new(2021, 13, 1, 12, 0)),
            Err(ConversionError::InvalidDate { .. })
        );
        assert_matches!(
            converter.convert(&SolarMoment::new(2021, 2, 1, 24, 0)),
            Err(ConversionError::InvalidTime { hour: 24, .. })
        );
        let mut moment = SolarMoment::new(2021, 2, 1, 12, 0);
        moment.second = 60;
        assert_matches!(
            converter.convert(&moment),
            Err(ConversionError::InvalidTime { second: 60, .. })
        );
        assert_matches!(
            converter.convert(&SolarMoment::new(1800, 1, 1, 0, 0)),
            Err(ConversionError::OutOfRange { .. })
        );
        assert_matches!(
            converter.convert(&SolarMoment::new(2102, 6, 1, 0, 0)),
            Err(ConversionError::OutOfRange { .. })
        );
    }

    #[test]
    fn year_boundaries() {
        // 2000: 立春 on 02-04, 正月初一 on 02-05
        let lunar = EphemerisConverter::new();
        let li_chun = EphemerisConverter::new().with_year_boundary(YearBoundary::LiChun);
        for (date, by_lunar, by_li_chun) in [
            ((2000, 2, 3, 12, 0), "己卯", "己卯"),
            ((2000, 2, 4, 12, 0), "己卯", "庚辰"),
            ((2000, 2, 5, 12, 0), "庚辰", "庚辰"),
        ] {
            assert_eq!(by_lunar, convert(&lunar, date).year_pillar, "{date:?}");
            assert_eq!(by_li_chun, convert(&li_chun, date).year_pillar, "{date:?}");
        }
    }

    #[test]
    fn month_pillars() {
        let converter = EphemerisConverter::new();
        for (date, std) in [
            // 己卯年十二月丁丑, then 庚辰年正月戊寅
            ((2000, 2, 3, 12, 0), "丁丑"),
            ((2000, 2, 4, 12, 0), "戊寅"),
            ((2000, 3, 5, 12, 0), "己卯"),
            ((2000, 1, 1, 12, 0), "丙子"),
            ((2000, 12, 31, 12, 0), "戊子"),
            ((2026, 6, 15, 12, 0), "甲午"),
        ] {
            assert_eq!(std, convert(&converter, date).month_pillar, "{date:?}");
        }
    }

    #[test]
    fn five_tigers() {
        for (year, std) in [(1984, "丙寅"), (1985, "戊寅"), (1986, "庚寅"), (1987, "壬寅"), (1988, "甲寅")] {
            assert_eq!(std, month_pillar(year, 1).to_string());
            assert_eq!(std, month_pillar(year + 5, 2).to_string());
        }
        assert_eq!("丁丑", month_pillar(1984, 23).to_string());
        assert_eq!("丁丑", month_pillar(1984, 24).to_string());
    }

    #[test]
    fn exact_terms() {
        // 2017 立春 falls at about 23:34 on 02-03
        let by_date = EphemerisConverter::new();
        let exact = EphemerisConverter::new().with_exact_terms(true);
        let noon = (2017, 2, 3, 12, 0);
        let late = (2017, 2, 3, 23, 59);
        assert_eq!("壬寅", convert(&by_date, noon).month_pillar);
        assert_eq!("辛丑", convert(&exact, noon).month_pillar);
        assert_eq!("壬寅", convert(&exact, late).month_pillar);
        let exact_li_chun = exact.with_year_boundary(YearBoundary::LiChun);
        assert_eq!("丙申", convert(&exact_li_chun, noon).year_pillar);
        assert_eq!("丁酉", convert(&exact_li_chun, late).year_pillar);
    }

    #[test]
    fn native_hours() {
        assert_eq!("甲子", native_hour_pillar(Stem::Jia, 0).to_string());
        assert_eq!("甲子", native_hour_pillar(Stem::Jia, 23).to_string());
        assert_eq!("乙丑", native_hour_pillar(Stem::Jia, 1).to_string());
        assert_eq!("丙子", native_hour_pillar(Stem::Yi, 0).to_string());
        assert_eq!("癸亥", native_hour_pillar(Stem::Gui, 22).to_string());
    }

    #[test]
    fn day_changes_at_midnight() {
        let converter = EphemerisConverter::new();
        assert_eq!("甲子", convert(&converter, (1990, 12, 25, 23, 59)).day_pillar);
        assert_eq!("乙丑", convert(&converter, (1990, 12, 26, 0, 0)).day_pillar);
    }

    #[test]
    fn year_boundary_strings() {
        assert_eq!("li-chun", YearBoundary::LiChun.to_string());
        assert_eq!(Ok(YearBoundary::LunarNewYear), "lunar-new-year".parse());
        assert_eq!(
            YearBoundary::LiChun,
            serde_json::from_str::<YearBoundary>("\"li-chun\"").unwrap()
        );
    }
}
