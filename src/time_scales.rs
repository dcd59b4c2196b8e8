//! Deals with different time scales, specifically, conversion from TDB/TT into
//! UT (UTC or UT1).
//!
//! Only conversions necessary for other computations in this crate are
//! included for now.

use crate::date::Date;

/// [Barycentric dynamic time](https://en.wikipedia.org/wiki/Barycentric_Dynamical_Time),
/// represented in Julian date (JD).
///
/// Ephemeris data are typically computed in this
/// time scale, and should be converted to UT when calculating dates.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct Tdb(pub f64);

/// [Terristrial time](https://en.wikipedia.org/wiki/Terrestrial_Time),
/// represented in Julian date (JD).
///
/// Note: Because TT differs no more than centisenconds from TDB during
/// thousands of years, they are treated numerically the same in this crate for
/// calendar calculation.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct Tt(pub f64);

impl From<Tdb> for Tt {
    fn from(tdb: Tdb) -> Tt {
        Tt(tdb.0)
    }
}

impl From<Tai> for Tt {
    fn from(tai: Tai) -> Tt {
        Tt(tai.0 + 32.184 / 86400.0)
    }
}

/// [International atomic time](https://en.wikipedia.org/wiki/International_Atomic_Time),
/// represented in Julian date (JD).
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct Tai(pub f64);

impl From<Tt> for Tai {
    fn from(tt: Tt) -> Tai {
        Tai(tt.0 - 32.184 / 86400.0)
    }
}

impl From<Tdb> for Tai {
    fn from(tdb: Tdb) -> Tai {
        Tt::from(tdb).into()
    }
}

/// [Universal time](https://en.wikipedia.org/wiki/Universal_Time), the actual
/// civil time used for determining the actual date at a given time point.
///
/// This can be either UTC (coordinated universal time, based on TAI with leap
/// seconds) or UT1 (mean solar time on the Prime Meridian) depending on the
/// year. Specifically, UTC from 1972-01-01T00:00Z to the latest known leap
/// second, UT1 otherwise.
///
/// Before 1972, UT1 is interpolated from tabulated values of ΔT. After the
/// latest known leap second, it is extrapolated with
/// [a method described here](https://astro.ukho.gov.uk/nao/lvm/).
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct Ut(pub f64);

impl Ut {
    /// Converts a TAI (or other time scale easily convertible to TAI) into
    /// UT.
    ///
    /// # Example
    ///
    /// ```
    /// use saju::time_scales::{Tdb, Ut};
    /// let tdb = Tdb(2451543.166666667);
    /// let ut = Ut::convert(tdb);
    /// assert_eq!((1999, 12, 30), ut.date_in_timezone(0).gregorian());
    /// ```
    pub fn convert<T>(time: T) -> Self
    where
        T: Into<Tai>,
    {
        let tai = time.into();
        let leap_seconds::Data {
            starts,
            ref leap_seconds,
            expires,
            c2,
        } = *leap_seconds::data();

        if tai < starts {
            return Ut(tai.0 - delta_t::tai_minus_ut1(tai) / 86400.0);
        } else if tai > expires {
            let diff = leap_seconds::estimate(tai) + c2;
            return Ut(tai.0 - diff / 86400.0); // NOTE UT1, ne UTC
        }

        let ls = match leap_seconds.partition_point(|ls| ls.tai <= tai) {
            0 => return Ut(tai.0 - 10.0 / 86400.0),
            i => &leap_seconds[i - 1],
        };
        let leap = (tai.0 - ls.tai.0).min(2.0) / 2.0;
        Ut(tai.0 - (ls.delta_secs as f64 + leap) / 86400.0)
    }
    /// Creates a UT instant from a civil date and time of day, in a timezone
    /// ahead (east) of UTC by `tz_offset_minutes` minutes.
    ///
    /// # Example
    ///
    /// ```
    /// use saju::Date;
    /// use saju::time_scales::Ut;
    /// let date = Date::from_gregorian(2000, 1, 1).unwrap();
    /// let ut = Ut::from_local(date, 12 * 3600, 0);
    /// assert_eq!(2451545.0, ut.0);
    /// ```
    pub fn from_local(date: Date, second_of_day: u32, tz_offset_minutes: i32) -> Self {
        Ut(date.jdn() as f64 - 0.5 + second_of_day as f64 / 86400.0
            - tz_offset_minutes as f64 / 1440.0)
    }
    /// Returns the date at the time point in timezone ahead (east) of UTC by
    /// `tz_offset_minutes`minutes.
    ///
    /// For Beijing time (UTC+8), `tz_offset_minutes` should be +480.
    ///
    /// # Example
    ///
    /// ```
    /// use saju::time_scales::{Tdb, Ut};
    /// let tdb = Tdb(2451543.166666667);
    /// let ut = Ut::convert(tdb);
    /// assert_eq!((1999, 12, 30), ut.date_in_timezone(480).gregorian());
    /// ```
    pub fn date_in_timezone(&self, tz_offset_minutes: i32) -> Date {
        let jdn = (self.0 + tz_offset_minutes as f64 / 1440.0).round() as u32;
        Date::from_jdn(jdn)
    }
}

mod leap_seconds {
    use super::{Tai, Tt};
    use crate::date::Date;
    use once_cell::sync::Lazy;

    pub const DATES: &[(i32, i32, i32)] = &[
        (1972, 6, 30),
        (1972, 12, 31),
        (1973, 12, 31),
        (1974, 12, 31),
        (1975, 12, 31),
        (1976, 12, 31),
        (1977, 12, 31),
        (1978, 12, 31),
        (1979, 12, 31),
        (1981, 6, 30),
        (1982, 6, 30),
        (1983, 6, 30),
        (1985, 6, 30),
        (1987, 12, 31),
        (1989, 12, 31),
        (1990, 12, 31),
        (1992, 6, 30),
        (1993, 6, 30),
        (1994, 6, 30),
        (1995, 12, 31),
        (1997, 6, 30),
        (1998, 12, 31),
        (2005, 12, 31),
        (2008, 12, 31),
        (2012, 6, 30),
        (2015, 6, 30),
        (2016, 12, 31),
    ];
    pub const DATE_EXPIRES: (i32, i32, i32) = (2021, 12, 31);

    #[derive(Debug, Clone)]
    pub struct Data {
        pub starts: Tai,
        pub leap_seconds: Vec<LeapSecond>,
        pub expires: Tai,
        pub c2: f64,
    }
    #[derive(Debug, Clone)]
    pub struct LeapSecond {
        pub tai: Tai,
        pub delta_secs: i32,
    }

    static COMPUTED: Lazy<Data> = Lazy::new(|| {
        let starts = Tai(jdn_of(1972, 1, 1) as f64 + 10.0 / 86400.0);
        let leap_seconds = (10..)
            .zip(DATES)
            .map(|(delta_secs, &(y, m, d))| LeapSecond {
                tai: Tai(jdn_of(y, m, d) as f64 + (43199 + delta_secs) as f64 / 86400.0),
                delta_secs,
            })
            .collect();
        let (y, m, d) = DATE_EXPIRES;
        let expires = Tai(jdn_of(y, m, d) as f64 + (43199 + 10 + DATES.len()) as f64 / 86400.0);
        let c2 = (DATES.len() + 10) as f64 - estimate(expires);
        Data {
            starts,
            leap_seconds,
            expires,
            c2,
        }
    });

    fn jdn_of(y: i32, m: i32, d: i32) -> u32 {
        Date::from_gregorian(y, m, d)
            .unwrap_or_else(|| panic!("date not recognized: {:?}", (y, m, d)))
            .jdn()
    }

    pub fn data() -> &'static Data {
        &COMPUTED
    }

    pub fn estimate<T: Into<Tt>>(tt: T) -> f64 {
        use std::f64::consts::PI;
        let tt = tt.into();
        let y = (tt.0 - 2451544.5) / 365.2425 + 2000.0;
        let t = (y - 1825.0) / 100.0;
        31.4115 * t * t + 284.8435805251424 * (2.0 * PI * (t + 0.75) / 14.0).cos()
    }
}

mod delta_t {
    use super::{Tai, Tt};

    /// ΔT (TT − UT1) in seconds at the start of every fifth year from 1900,
    /// ending with the value implied by TAI − UTC = 10 s on 1972-01-01.
    const TABLE: &[(f64, f64)] = &[
        (1900.0, -2.7),
        (1905.0, 3.9),
        (1910.0, 10.5),
        (1915.0, 17.2),
        (1920.0, 21.2),
        (1925.0, 23.6),
        (1930.0, 24.0),
        (1935.0, 23.9),
        (1940.0, 24.3),
        (1945.0, 26.8),
        (1950.0, 29.1),
        (1955.0, 31.1),
        (1960.0, 33.2),
        (1965.0, 35.7),
        (1970.0, 40.2),
        (1972.0, 42.184),
    ];

    /// TAI − UT1 in seconds before 1972, linearly interpolated; clamped to the
    /// first tabulated value before 1900.
    pub fn tai_minus_ut1(tai: Tai) -> f64 {
        let y = (Tt::from(tai).0 - 2451544.5) / 365.2425 + 2000.0;
        let delta_t = match TABLE.partition_point(|&(year, _)| year <= y) {
            0 => TABLE[0].1,
            i if i == TABLE.len() => TABLE[i - 1].1,
            i => {
                let (y0, dt0) = TABLE[i - 1];
                let (y1, dt1) = TABLE[i];
                dt0 + (dt1 - dt0) * (y - y0) / (y1 - y0)
            }
        };
        delta_t - 32.184
    }
}
