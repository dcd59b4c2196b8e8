//! Properties that hold for every valid birth moment.

use proptest::prelude::*;
use saju::calculator::{HourPillarMode, hour_slot};
use saju::chinese::cycle::{HOUR_STEM_TABLE, Stem, hour_stem_row};
use saju::converter::EphemerisConverter;
use saju::{BirthMoment, Date, PillarCalculator};

fn birth_moment() -> impl Strategy<Value = BirthMoment> {
    (1900..=2100i32, 1..=12i32, 1..=31i32, 0..=23i32, 0..=59i32)
        .prop_filter("date must exist", |&(year, month, day, _, _)| {
            Date::from_gregorian(year, month, day).is_some()
        })
        .prop_map(|(year, month, day, hour, minute)| BirthMoment {
            year,
            month,
            day,
            hour,
            minute,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn day_master_is_day_stem(birth in birth_moment()) {
        let calculator = PillarCalculator::new(EphemerisConverter::new());
        let pillars = calculator.compute(&birth).unwrap();
        prop_assert_eq!(pillars.day().stem(), pillars.day_master());

        let json = serde_json::to_value(pillars).unwrap();
        let day = json["day"].as_str().unwrap().chars().next().unwrap();
        let day_master = json["dayMaster"].as_str().unwrap();
        prop_assert_eq!(day.to_string(), day_master);
    }

    #[test]
    fn deterministic(birth in birth_moment()) {
        let calculator = PillarCalculator::new(EphemerisConverter::new());
        let first = serde_json::to_string(&calculator.compute(&birth).unwrap()).unwrap();
        let second = serde_json::to_string(&calculator.compute(&birth).unwrap()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn hour_pillar_depends_on_day_stem_and_slot(birth in birth_moment(), other_minute in 0..=59i32) {
        let calculator = PillarCalculator::new(EphemerisConverter::new())
            .with_hour_pillar(HourPillarMode::Table);
        let pillars = calculator.compute(&birth).unwrap();
        let slot = hour_slot(birth.hour as u32);
        prop_assert_eq!(slot, pillars.hour().branch().index());
        let row = hour_stem_row(pillars.day_master().as_char()).unwrap();
        prop_assert_eq!(row[slot], pillars.hour().stem());

        let same_hour = calculator.compute(&BirthMoment { minute: other_minute, ..birth }).unwrap();
        prop_assert_eq!(pillars.hour(), same_hour.hour());
    }

    #[test]
    fn slot_continues_across_midnight(hour in 0..24u32) {
        let next = (hour + 1) % 24;
        let step = (hour_slot(next) + 12 - hour_slot(hour)) % 12;
        if hour % 2 == 1 {
            prop_assert_eq!(0, step, "{} -> {}", hour, next);
        } else {
            prop_assert_eq!(1, step, "{} -> {}", hour, next);
        }
    }
}

#[test]
fn hour_stem_rows_pair_up() {
    for (i, (stem, row)) in HOUR_STEM_TABLE.iter().enumerate() {
        let partner = Stem::from_index(stem.index() as i64 + 5);
        assert_eq!(row, hour_stem_row(partner.as_char()).unwrap(), "row {i}");
    }
}
