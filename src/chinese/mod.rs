//! Chinese calendar
//!
//! Note: 為方便處理諸多術語，本模塊文檔用中文。
//!
//! 本程序依算得的天文曆表編算夏曆，見 [`ephemeris`]；干支見 [`cycle`]。
//! 日期一律以北京時間（UTC+8）定。

use std::fmt::Display;

use crate::date::Date;
use crate::time_scales::{Tdb, Ut};

pub mod cycle;
pub mod ephemeris;
pub mod fmt;

/// 「歲」，相鄰兩冬至間的時段，或自冬至所在月（十一月）至下一冬至前月（十月或閏十月）的時段。
///
/// 支持的年份取決於曆表數據，見 [`ephemeris`]。
///
/// 注意：「歲」與「年」在曆法上不同，年以正月為首，但曆法編算須以兩冬至間的「歲」為基礎，本程序亦以「歲」編排，並依日期計算所在「年」。
///
/// # 用例
///
/// ```
/// use saju::Date;
/// use saju::chinese::{Annus, Month::*};
///
/// let date = Date::from_gregorian(2000, 1, 1).unwrap();
/// let annus = Annus::from_date(date).unwrap();
///
/// assert_eq!(Ok((1999, Common(11), 25)), annus.ymd_for(date));
/// ```
#[derive(Debug, Clone)]
pub struct Annus {
    /// 序號，為該歲大部分時段所在的公元年
    pub annus: i32,
    /// 該歲的曆表
    pub ephemeris: &'static ephemeris::Annus,
    /// 全部月首，包括次一歲首月用以標記本歲最末日
    pub months: Vec<NewMoon>,
}
/// 月首信息
#[derive(Debug, Copy, Clone)]
pub struct NewMoon {
    /// 月名
    pub month: Month,
    /// 月首所在日期
    pub date: Date,
}
/// 月名，`Common` 為平月，`Leap` 為閏月。
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Month {
    Common(u32),
    Leap(u32),
}
impl Month {
    /// 取得月序號，無論平閏。
    pub fn num(&self) -> u32 {
        use Month::*;
        *match self {
            Common(v) | Leap(v) => v,
        }
    }
    /// 閏月為 `true`，平月為 `false`
    pub fn is_leap(&self) -> bool {
        matches!(self, Self::Leap(_))
    }
    /// 取得月名的文本形式，十一、十二月稱「冬月」「臘月」。
    pub fn name(&self) -> String {
        fmt::month(*self)
    }
}

/// 夏曆日期
///
/// ```
/// use saju::chinese::{LunarDate, Month::*};
///
/// let date = LunarDate { year: 2017, month: Leap(6), day: 1 };
/// assert_eq!("2017年閏六月初一", date.to_string());
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct LunarDate {
    /// 年，於正月初一遞增
    pub year: i32,
    pub month: Month,
    pub day: u32,
}

impl Display for LunarDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}年{}{}", self.year, self.month.name(), fmt::day(self.day))
    }
}

impl Annus {
    /// 取得與公元 `annus` 年對應的歲。
    ///
    /// 若曆表無該歲資料，或兩冬至間月數不合，則返回 `None`。
    ///
    /// # 用例
    ///
    /// ```
    /// use saju::chinese::Annus;
    ///
    /// let annus = Annus::new(2000).unwrap();
    /// ```
    pub fn new(annus: i32) -> Option<Self> {
        use Month::*;

        let ephemeris = ephemeris::Annus::get(annus)?;
        let new_moon_dates: Vec<_> = ephemeris.new_moon.iter().map(|&tdb| date_cst(tdb)).collect();
        let ws = date_cst(ephemeris.solar_term[0]);
        let ws_next = date_cst(ephemeris.solar_term[24]);
        let m11_idx = new_moon_dates.partition_point(|date| date <= &ws).checked_sub(1)?;
        let m11n_idx = new_moon_dates.partition_point(|date| date <= &ws_next).checked_sub(1)?;
        let mut needs_leap = match m11n_idx.checked_sub(m11_idx)? {
            12 => false,
            13 => true,
            _ => return None,
        };

        let mut months = Vec::with_capacity(m11n_idx - m11_idx + 1);
        let mut month = 10;
        let mut term = 0;
        for i in m11_idx..=m11n_idx {
            if needs_leap
                && *new_moon_dates.get(i + 1)? <= date_cst(*ephemeris.solar_term.get(term)?)
            {
                months.push(NewMoon {
                    month: Leap(month),
                    date: new_moon_dates[i],
                });
                needs_leap = false;
                continue;
            }
            month = month % 12 + 1;
            months.push(NewMoon {
                month: Common(month),
                date: new_moon_dates[i],
            });
            term += 2;
        }
        if needs_leap {
            return None;
        }

        Some(Annus {
            annus,
            ephemeris,
            months,
        })
    }
    /// 依特定日期取得其所在歲。
    ///
    /// 若曆表無該歲資料，或無歲包含該日，則返回 `None`。
    ///
    /// # 用例
    ///
    /// ```
    /// use saju::Date;
    /// use saju::chinese::Annus;
    ///
    /// let date = Date::from_gregorian(1999, 12, 31).unwrap();
    /// let annus = Annus::from_date(date).unwrap();
    ///
    /// assert_eq!(2000, annus.annus);
    /// ```
    pub fn from_date(date: Date) -> Option<Self> {
        let mut y = date.gregorian().0;
        let mut step = 0;
        loop {
            let annus = Self::new(y)?;

            let start = annus.months.first()?.date;
            let end = annus.months.last()?.date;

            if (start..end).contains(&date) {
                return Some(annus);
            }

            // 搜尋折返即無歲包含該日
            let next = if date < start { -1 } else { 1 };
            if step == -next {
                return None;
            }
            step = next;
            y += step;
        }
    }

    /// 取得給定日期在該歲的年月日，返回格式為 `(年, 月, 日)`。
    ///
    /// 若所給日期不在該歲，則回報 `Err` 並指出該日期在該歲之前還是之後。
    ///
    /// # 用例
    ///
    /// ```
    /// use saju::Date;
    /// use saju::chinese::{Annus, Month::*};
    ///
    /// let date = Date::from_gregorian(2000, 1, 1).unwrap();
    /// let annus = Annus::from_date(date).unwrap();
    ///
    /// assert_eq!(Ok((1999, Common(11), 25)), annus.ymd_for(date));
    /// ```
    pub fn ymd_for(&self, date: Date) -> Result<(i32, Month, u32), OtherAnnus> {
        let begin = self.months[0].date;
        let end = self.months[self.months.len() - 1].date;

        if date < begin {
            return Err(OtherAnnus::Before);
        } else if date >= end {
            return Err(OtherAnnus::After);
        }

        let m = self
            .months
            .iter()
            .take_while(|m| m.date <= date)
            .last()
            .ok_or(OtherAnnus::Before)?;
        let d = date.jdn() - m.date.jdn() + 1;
        let y = if m.month.num() >= 11 {
            self.annus - 1
        } else {
            self.annus
        };
        Ok((y, m.month, d))
    }

    /// 同 [`Annus::ymd_for`]，以 [`LunarDate`] 返回。
    pub fn lunar_date_for(&self, date: Date) -> Result<LunarDate, OtherAnnus> {
        self.ymd_for(date)
            .map(|(year, month, day)| LunarDate { year, month, day })
    }

    /// 取得給定日期所在節氣信息，若當日並無交節，則給出該日相對其前一個交節的日數差。返回值格式如下：
    ///
    /// - `.0`：取得的節氣所在歲（前一歲大雪可能落在該歲，故須回報所在歲）
    /// - `.1`：該節氣序號，1..=24 對應立春到大寒
    /// - `.2`：所給 `date` 在該節交節後第幾日，為 0 則表示當日交節
    ///
    /// 本方法支持自該歲首日至次歲冬至前日的區間。
    ///
    /// 若給定日期不在該歲，或曆表無法取得前一歲節氣數據，則回報 `Err`。
    ///
    /// # 用例
    ///
    /// ```
    /// use saju::Date;
    /// use saju::chinese::{Annus, Month::*};
    ///
    /// let date = Date::from_gregorian(2000, 1, 1).unwrap();
    /// let annus = Annus::from_date(date).unwrap();
    ///
    /// assert_eq!(Ok((2000, 22, 10)), annus.solar_term_for(date)); // 冬至過後第 10 天
    /// ```
    pub fn solar_term_for(&self, date: Date) -> Result<(i32, u32, u32), SolarTermErr> {
        use self::OtherAnnus::*;
        use SolarTermErr::*;
        if date < self.months[0].date {
            return Err(OtherAnnus(Before));
        } else if date >= date_cst(self.ephemeris.solar_term[24]) {
            return Err(OtherAnnus(After));
        }
        let (annus, terms) = if date < date_cst(self.ephemeris.solar_term[0]) {
            let last_annus = ephemeris::Annus::get(self.annus - 1).ok_or(NoData)?;
            (self.annus - 1, &last_annus.solar_term)
        } else {
            (self.annus, &self.ephemeris.solar_term)
        };
        let idx = terms[..24]
            .partition_point(|&tdb| date_cst(tdb) <= date)
            .checked_sub(1)
            .ok_or(NoData)?;
        let off = date - date_cst(terms[idx]);
        Ok((annus, (idx as u32 + 21) % 24 + 1, off as u32))
    }

    /// 取得給定時刻所在節氣，以交節時刻而非交節日期為界。返回值格式為
    /// `(所在歲, 節氣序號)`，節氣序號同 [`Annus::solar_term_for`]。
    ///
    /// 支持區間為該歲首日零時起至次歲冬至交節前。
    ///
    /// # 用例
    ///
    /// ```
    /// use saju::Date;
    /// use saju::chinese::Annus;
    /// use saju::time_scales::Ut;
    ///
    /// let date = Date::from_gregorian(2000, 1, 1).unwrap();
    /// let annus = Annus::from_date(date).unwrap();
    ///
    /// assert_eq!(Ok((2000, 22)), annus.solar_term_at(Ut::from_local(date, 12 * 3600, 480)));
    /// ```
    pub fn solar_term_at(&self, ut: Ut) -> Result<(i32, u32), SolarTermErr> {
        use self::OtherAnnus::*;
        use SolarTermErr::*;
        if ut < Ut::from_local(self.months[0].date, 0, CST_OFFSET_MINUTES) {
            return Err(OtherAnnus(Before));
        } else if ut >= Ut::convert(self.ephemeris.solar_term[24]) {
            return Err(OtherAnnus(After));
        }
        let (annus, terms) = if ut < Ut::convert(self.ephemeris.solar_term[0]) {
            let last_annus = ephemeris::Annus::get(self.annus - 1).ok_or(NoData)?;
            (self.annus - 1, &last_annus.solar_term)
        } else {
            (self.annus, &self.ephemeris.solar_term)
        };
        let idx = terms[..24]
            .partition_point(|&tdb| Ut::convert(tdb) <= ut)
            .checked_sub(1)
            .ok_or(NoData)?;
        Ok((annus, (idx as u32 + 21) % 24 + 1))
    }
}

/// 表示給定日期不在該歲，並指出其在前還是在後。
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OtherAnnus {
    Before,
    After,
}

/// 表示給定日期不在該歲，或曆表無法取得節氣數據。
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SolarTermErr {
    NoData,
    OtherAnnus(OtherAnnus),
}

/// 將給定曆表時間轉為北京時間（UTC+8）日期。
pub fn date_cst(tdb: Tdb) -> Date {
    Ut::convert(tdb).date_in_timezone(CST_OFFSET_MINUTES)
}

/// 北京時間相對 UTC 的分鐘數
pub const CST_OFFSET_MINUTES: i32 = 480;

/// 取得所給公元年的干支。
///
/// # 用例
///
/// ```
/// use saju::chinese::sexagenary_for_year;
///
/// assert_eq!(1, sexagenary_for_year(-2696));
/// ```
pub fn sexagenary_for_year(year: i32) -> u32 {
    (year.rem_euclid(60) as u32 + 2696) % 60 + 1
}
