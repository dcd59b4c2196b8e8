//! 干支：十天干、十二地支、六十甲子及五鼠遁時干表
//!
//! 序號一律自 0 起：甲 = 0、子 = 0；六十甲子之序號則沿用本庫慣例，自 1（甲子）至 60（癸亥）。

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// 五行
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Element {
    Wood,
    Fire,
    Earth,
    Metal,
    Water,
}

impl Element {
    /// 五行之漢字
    pub fn as_char(&self) -> char {
        match self {
            Element::Wood => '木',
            Element::Fire => '火',
            Element::Earth => '土',
            Element::Metal => '金',
            Element::Water => '水',
        }
    }
}

/// 十天干
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Stem {
    Jia,
    Yi,
    Bing,
    Ding,
    Wu,
    Ji,
    Geng,
    Xin,
    Ren,
    Gui,
}

/// 十天干，依序
pub const STEMS: [Stem; 10] = {
    use Stem::*;
    [Jia, Yi, Bing, Ding, Wu, Ji, Geng, Xin, Ren, Gui]
};

const STEM_CHARS: [char; 10] = ['甲', '乙', '丙', '丁', '戊', '己', '庚', '辛', '壬', '癸'];
const STEM_HANGUL: [&str; 10] = ["갑", "을", "병", "정", "무", "기", "경", "신", "임", "계"];

impl Stem {
    /// 依序號取得天干，序號循環。
    ///
    /// ```
    /// use saju::chinese::cycle::Stem;
    ///
    /// assert_eq!(Stem::Jia, Stem::from_index(10));
    /// assert_eq!(Stem::Gui, Stem::from_index(-1));
    /// ```
    pub fn from_index(index: i64) -> Self {
        STEMS[index.rem_euclid(10) as usize]
    }
    /// 序號，甲為 0。
    pub fn index(&self) -> usize {
        *self as usize
    }
    pub fn as_char(&self) -> char {
        STEM_CHARS[self.index()]
    }
    /// 由漢字取得天干，非天干則返回 `None`。
    pub fn from_char(c: char) -> Option<Self> {
        STEM_CHARS.iter().position(|&s| s == c).map(|i| STEMS[i])
    }
    pub fn element(&self) -> Element {
        match self.index() / 2 {
            0 => Element::Wood,
            1 => Element::Fire,
            2 => Element::Earth,
            3 => Element::Metal,
            _ => Element::Water,
        }
    }
    /// 陽干為 `true`（甲丙戊庚壬）。
    pub fn is_yang(&self) -> bool {
        self.index() % 2 == 0
    }
    /// 韓文讀音。
    pub fn hangul(&self) -> &'static str {
        STEM_HANGUL[self.index()]
    }
    /// 韓文讀音連五行，如甲為「갑목」。
    ///
    /// ```
    /// use saju::chinese::cycle::Stem;
    ///
    /// assert_eq!("갑목", Stem::Jia.korean_name());
    /// assert_eq!("계수", Stem::Gui.korean_name());
    /// ```
    pub fn korean_name(&self) -> String {
        let element = match self.element() {
            Element::Wood => "목",
            Element::Fire => "화",
            Element::Earth => "토",
            Element::Metal => "금",
            Element::Water => "수",
        };
        format!("{}{}", self.hangul(), element)
    }
}

impl fmt::Display for Stem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl Serialize for Stem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 十二地支
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Branch {
    Zi,
    Chou,
    Yin,
    Mao,
    Chen,
    Si,
    Wu,
    Wei,
    Shen,
    You,
    Xu,
    Hai,
}

/// 十二地支，依序
pub const BRANCHES: [Branch; 12] = {
    use Branch::*;
    [Zi, Chou, Yin, Mao, Chen, Si, Wu, Wei, Shen, You, Xu, Hai]
};

const BRANCH_CHARS: [char; 12] = [
    '子', '丑', '寅', '卯', '辰', '巳', '午', '未', '申', '酉', '戌', '亥',
];
const BRANCH_HANGUL: [&str; 12] = [
    "자", "축", "인", "묘", "진", "사", "오", "미", "신", "유", "술", "해",
];

impl Branch {
    /// 依序號取得地支，序號循環。
    pub fn from_index(index: i64) -> Self {
        BRANCHES[index.rem_euclid(12) as usize]
    }
    /// 序號，子為 0。
    pub fn index(&self) -> usize {
        *self as usize
    }
    pub fn as_char(&self) -> char {
        BRANCH_CHARS[self.index()]
    }
    /// 由漢字取得地支，非地支則返回 `None`。
    pub fn from_char(c: char) -> Option<Self> {
        BRANCH_CHARS.iter().position(|&b| b == c).map(|i| BRANCHES[i])
    }
    /// 韓文讀音。
    pub fn hangul(&self) -> &'static str {
        BRANCH_HANGUL[self.index()]
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// 一柱干支，如「甲子」。
///
/// # 用例
///
/// ```
/// use saju::chinese::cycle::{Branch, Pillar, Stem};
///
/// let pillar: Pillar = "庚午".parse().unwrap();
/// assert_eq!(Stem::Geng, pillar.stem());
/// assert_eq!(Branch::Wu, pillar.branch());
/// assert_eq!(7, pillar.sexagenary());
/// assert_eq!("庚午", pillar.to_string());
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Pillar {
    stem: Stem,
    branch: Branch,
}

impl Pillar {
    pub fn new(stem: Stem, branch: Branch) -> Self {
        Self { stem, branch }
    }
    /// 由六十甲子序號（1 為甲子，60 為癸亥）取得干支，序號循環。
    pub fn from_sexagenary(num: u32) -> Self {
        let i = num as i64 - 1;
        Self::new(Stem::from_index(i), Branch::from_index(i))
    }
    /// 六十甲子序號，1 為甲子，60 為癸亥。
    ///
    /// 干支陰陽不合者（如「甲丑」）不在六十甲子之內，返回 `None`。
    pub fn checked_sexagenary(&self) -> Option<u32> {
        let (s, b) = (self.stem.index(), self.branch.index());
        (s % 2 == b % 2).then(|| ((6 * s + 55 * b) % 60) as u32 + 1)
    }
    /// 六十甲子序號；干支陰陽不合者返回 0。
    pub fn sexagenary(&self) -> u32 {
        self.checked_sexagenary().unwrap_or(0)
    }
    pub fn stem(&self) -> Stem {
        self.stem
    }
    pub fn branch(&self) -> Branch {
        self.branch
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.stem, self.branch)
    }
}

impl Serialize for Pillar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 干支文本無法解析。
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("`{0}` is not a stem-branch code")]
pub struct ParsePillarError(pub String);

impl FromStr for Pillar {
    type Err = ParsePillarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(s_char), Some(b_char), None) => {
                match (Stem::from_char(s_char), Branch::from_char(b_char)) {
                    (Some(stem), Some(branch)) => {
                        let pillar = Pillar::new(stem, branch);
                        pillar
                            .checked_sexagenary()
                            .map(|_| pillar)
                            .ok_or_else(|| ParsePillarError(s.to_owned()))
                    }
                    _ => Err(ParsePillarError(s.to_owned())),
                }
            }
            _ => Err(ParsePillarError(s.to_owned())),
        }
    }
}

/// 五鼠遁：依日干排時干，每行十二項依次對應子時至亥時。
///
/// 甲己、乙庚、丙辛、丁壬、戊癸兩兩同行。
pub static HOUR_STEM_TABLE: [(Stem, [Stem; 12]); 10] = {
    use Stem::*;
    [
        (Jia, [Jia, Yi, Bing, Ding, Wu, Ji, Geng, Xin, Ren, Gui, Jia, Yi]),
        (Ji, [Jia, Yi, Bing, Ding, Wu, Ji, Geng, Xin, Ren, Gui, Jia, Yi]),
        (Yi, [Bing, Ding, Wu, Ji, Geng, Xin, Ren, Gui, Jia, Yi, Bing, Ding]),
        (Geng, [Bing, Ding, Wu, Ji, Geng, Xin, Ren, Gui, Jia, Yi, Bing, Ding]),
        (Bing, [Wu, Ji, Geng, Xin, Ren, Gui, Jia, Yi, Bing, Ding, Wu, Ji]),
        (Xin, [Wu, Ji, Geng, Xin, Ren, Gui, Jia, Yi, Bing, Ding, Wu, Ji]),
        (Ding, [Geng, Xin, Ren, Gui, Jia, Yi, Bing, Ding, Wu, Ji, Geng, Xin]),
        (Ren, [Geng, Xin, Ren, Gui, Jia, Yi, Bing, Ding, Wu, Ji, Geng, Xin]),
        (Wu, [Ren, Gui, Jia, Yi, Bing, Ding, Wu, Ji, Geng, Xin, Ren, Gui]),
        (Gui, [Ren, Gui, Jia, Yi, Bing, Ding, Wu, Ji, Geng, Xin, Ren, Gui]),
    ]
};

/// 取得日干（以漢字給出）在五鼠遁表中的一行，日干不在表中則返回 `None`。
///
/// ```
/// use saju::chinese::cycle::{hour_stem_row, Stem};
///
/// assert_eq!(Stem::Bing, hour_stem_row('乙').unwrap()[0]);
/// assert!(hour_stem_row('子').is_none());
/// ```
pub fn hour_stem_row(day_stem: char) -> Option<&'static [Stem; 12]> {
    HOUR_STEM_TABLE
        .iter()
        .find(|(stem, _)| stem.as_char() == day_stem)
        .map(|(_, row)| row)
}
