//! 月相節氣曆表
//!
//! 節氣時刻依太陽視黃經求得，朔日依平朔加週期修正項求得，算法見 Jean Meeus,
//! *Astronomical Algorithms*（第二版）第 25、49 章。太陽黃經精度約 0.01°，
//! 即節氣時刻誤差約十五分鐘；朔時誤差在一分鐘內。
//!
//! 各歲曆表在首次取用時一次算出，其後只讀。

use std::f64::consts::PI;

use once_cell::sync::Lazy;

use crate::date::Date;
use crate::time_scales::Tdb;

/// 曆表所涵蓋的首歲
pub const FIRST_ANNUS: i32 = 1899;
/// 曆表所涵蓋的末歲
pub const LAST_ANNUS: i32 = 2101;

/// 保存一歲的曆表數據
#[derive(Debug)]
pub struct Annus {
    /// 序號，為該歲大部分時段所在公元年
    pub annus: i32,
    /// 從冬至開始的各節氣時刻，亦含次歲冬至以便計算末日
    pub solar_term: [Tdb; 25],
    /// 朔時刻，自冬至所在月之前一月起連續十六個
    pub new_moon: [Tdb; 16],
}

static DATA: Lazy<Vec<Annus>> = Lazy::new(|| (FIRST_ANNUS..=LAST_ANNUS).map(Annus::compute).collect());

impl Annus {
    /// 取得公元 `annus` 年對應的歳的曆表。
    ///
    /// 無數據則返回 `None`。
    pub fn get(annus: i32) -> Option<&'static Self> {
        DATA.binary_search_by_key(&annus, |an| an.annus)
            .ok()
            .map(|i| &DATA[i])
    }

    fn compute(annus: i32) -> Self {
        let guess = Date::from_gregorian(annus - 1, 12, 22)
            .map(|date| date.jdn() as f64)
            .unwrap_or_else(|| panic!("no winter solstice guess for annus {annus}"));
        let mut solar_term = [Tdb(0.0); 25];
        for (i, term) in solar_term.iter_mut().enumerate() {
            let longitude = (270.0 + 15.0 * i as f64) % 360.0;
            *term = solar_term_time(longitude, guess + i as f64 * TROPICAL_YEAR / 24.0);
        }

        let k0 = ((solar_term[0].0 - NEW_MOON_EPOCH) / SYNODIC_MONTH).floor() - 1.0;
        let mut new_moon = [Tdb(0.0); 16];
        for (i, nm) in new_moon.iter_mut().enumerate() {
            *nm = new_moon_time(k0 + i as f64);
        }

        Annus {
            annus,
            solar_term,
            new_moon,
        }
    }
}

const TROPICAL_YEAR: f64 = 365.242_19;
const SYNODIC_MONTH: f64 = 29.530_588_861;
const NEW_MOON_EPOCH: f64 = 2_451_550.097_66;

fn sin_deg(deg: f64) -> f64 {
    (deg * PI / 180.0).sin()
}

/// 將角度約化至 `[-180, 180)`。
fn wrap_signed(deg: f64) -> f64 {
    (deg + 180.0).rem_euclid(360.0) - 180.0
}

/// 太陽視黃經（度，`[0, 360)`），含章動及光行差改正。
///
/// # 用例
///
/// ```
/// use saju::chinese::ephemeris::apparent_solar_longitude;
/// use saju::time_scales::Tdb;
///
/// // 1992-10-13 0h TD
/// let lon = apparent_solar_longitude(Tdb(2448908.5));
/// assert!((lon - 199.909).abs() < 0.01);
/// ```
pub fn apparent_solar_longitude(tdb: Tdb) -> f64 {
    let t = (tdb.0 - 2_451_545.0) / 36525.0;
    let l0 = 280.46646 + 36000.76983 * t + 0.0003032 * t * t;
    let m = 357.52911 + 35999.05029 * t - 0.0001537 * t * t;
    let c = (1.914602 - 0.004817 * t - 0.000014 * t * t) * sin_deg(m)
        + (0.019993 - 0.000101 * t) * sin_deg(2.0 * m)
        + 0.000289 * sin_deg(3.0 * m);
    let omega = 125.04 - 1934.136 * t;
    (l0 + c - 0.00569 - 0.00478 * sin_deg(omega)).rem_euclid(360.0)
}

/// 求太陽視黃經達到 `longitude` 度的時刻，`guess` 須在真值前後數日內。
pub fn solar_term_time(longitude: f64, guess: f64) -> Tdb {
    let mut jd = guess;
    for _ in 0..10 {
        let diff = wrap_signed(longitude - apparent_solar_longitude(Tdb(jd)));
        jd += diff * TROPICAL_YEAR / 360.0;
        if diff.abs() < 1e-7 {
            break;
        }
    }
    Tdb(jd)
}

/// 第 `k` 個朔的時刻，`k = 0` 為 2000 年 1 月 6 日之朔。
///
/// # 用例
///
/// ```
/// use saju::chinese::ephemeris::new_moon_time;
///
/// // 1977-02-18 03:37:42 TD
/// let tdb = new_moon_time(-283.0);
/// assert!((tdb.0 - 2443192.65118).abs() < 1e-4);
/// ```
pub fn new_moon_time(k: f64) -> Tdb {
    let t = k / 1236.85;
    let (t2, t3, t4) = (t * t, t * t * t, t * t * t * t);

    let jde = NEW_MOON_EPOCH + SYNODIC_MONTH * k + 0.00015437 * t2 - 0.000000150 * t3
        + 0.00000000073 * t4;
    let e = 1.0 - 0.002516 * t - 0.0000074 * t2;
    let m = 2.5534 + 29.10535670 * k - 0.0000014 * t2 - 0.00000011 * t3;
    let mp = 201.5643 + 385.81693528 * k + 0.0107582 * t2 + 0.00001238 * t3 - 0.000000058 * t4;
    let f = 160.7108 + 390.67050284 * k - 0.0016118 * t2 - 0.00000227 * t3 + 0.000000011 * t4;
    let omega = 124.7746 - 1.56375588 * k + 0.0020672 * t2 + 0.00000215 * t3;

    let periodic = -0.40720 * sin_deg(mp)
        + 0.17241 * e * sin_deg(m)
        + 0.01608 * sin_deg(2.0 * mp)
        + 0.01039 * sin_deg(2.0 * f)
        + 0.00739 * e * sin_deg(mp - m)
        - 0.00514 * e * sin_deg(mp + m)
        + 0.00208 * e * e * sin_deg(2.0 * m)
        - 0.00111 * sin_deg(mp - 2.0 * f)
        - 0.00057 * sin_deg(mp + 2.0 * f)
        + 0.00056 * e * sin_deg(2.0 * mp + m)
        - 0.00042 * sin_deg(3.0 * mp)
        + 0.00042 * e * sin_deg(m + 2.0 * f)
        + 0.00038 * e * sin_deg(m - 2.0 * f)
        - 0.00024 * e * sin_deg(2.0 * mp - m)
        - 0.00017 * sin_deg(omega)
        - 0.00007 * sin_deg(mp + 2.0 * m)
        + 0.00004 * sin_deg(2.0 * mp - 2.0 * f)
        + 0.00004 * sin_deg(3.0 * m)
        + 0.00003 * sin_deg(mp + m - 2.0 * f)
        + 0.00003 * sin_deg(2.0 * mp + 2.0 * f)
        - 0.00003 * sin_deg(mp + m + 2.0 * f)
        + 0.00003 * sin_deg(mp - m + 2.0 * f)
        - 0.00002 * sin_deg(mp - m - 2.0 * f)
        - 0.00002 * sin_deg(3.0 * mp + m)
        + 0.00002 * sin_deg(4.0 * mp);

    // 行星攝動項：(係數, 起始角, 每朔增量)
    const PLANETARY: [(f64, f64, f64); 14] = [
        (0.000325, 299.77, 0.107408),
        (0.000165, 251.88, 0.016321),
        (0.000164, 251.83, 26.651886),
        (0.000126, 349.42, 36.412478),
        (0.000110, 84.66, 18.206239),
        (0.000062, 141.74, 53.303771),
        (0.000060, 207.14, 2.453732),
        (0.000056, 154.84, 7.306860),
        (0.000047, 34.52, 27.261239),
        (0.000042, 207.19, 0.121824),
        (0.000040, 291.34, 1.844379),
        (0.000037, 161.72, 24.198154),
        (0.000035, 239.56, 25.513099),
        (0.000023, 331.55, 3.592518),
    ];
    let planetary: f64 = PLANETARY
        .iter()
        .enumerate()
        .map(|(i, &(coeff, a0, rate))| {
            // A1 另有 T² 項
            let arg = a0 + rate * k - if i == 0 { 0.009173 * t2 } else { 0.0 };
            coeff * sin_deg(arg)
        })
        .sum();

    Tdb(jde + periodic + planetary)
}
