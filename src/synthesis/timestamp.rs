//! Business-hours timestamps for synthesized records.
//!
//! Records are spread across working days: every `records_per_day`
//! consecutive indices share a calendar offset from the anchor date, and
//! offsets landing on a weekend roll forward to the next Monday. The
//! time of day is random, biased toward the morning.

use crate::random::UniformRandomSource;
use chrono::{Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use rand_core::RngCore;

/// Probability of a morning (08:00-12:00) acquisition.
const MORNING_PROBABILITY: f64 = 0.6;

/// Default number of records assigned to each calendar offset.
pub const DEFAULT_RECORDS_PER_DAY: u64 = 10;

/// Maps sequence indices to working-day timestamps.
#[derive(Debug, Clone)]
pub struct TimestampAssigner {
    anchor: NaiveDate,
    records_per_day: u64,
}

impl TimestampAssigner {
    /// Creates an assigner starting at `anchor`.
    ///
    /// `records_per_day` of zero is treated as one.
    pub fn new(anchor: NaiveDate, records_per_day: u64) -> Self {
        Self {
            anchor,
            records_per_day: records_per_day.max(1),
        }
    }

    /// Returns the anchor date.
    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    /// Returns the working date for a sequence index.
    ///
    /// Deterministic and non-decreasing in `sequence_index`. Offsets past
    /// the end of the calendar saturate at its last weekday.
    pub fn date_for(&self, sequence_index: u64) -> NaiveDate {
        let offset = sequence_index / self.records_per_day;
        let Some(mut date) = self.anchor.checked_add_days(Days::new(offset)) else {
            return last_weekday();
        };
        while is_weekend(date) {
            match date.succ_opt() {
                Some(next) => date = next,
                None => return last_weekday(),
            }
        }
        date
    }

    /// Assigns a timestamp to a sequence index.
    pub fn assign<R: RngCore>(
        &self,
        sequence_index: u64,
        random: &mut UniformRandomSource<R>,
    ) -> NaiveDateTime {
        let date = self.date_for(sequence_index);

        let hour = if random.chance(MORNING_PROBABILITY) {
            random.range(8.0, 12.0)
        } else {
            random.range(12.0, 18.0)
        };
        let minute = random.range(0.0, 60.0);
        let second = random.range(0.0, 60.0);

        let seconds = hour as i64 * 3600 + minute as i64 * 60 + second as i64;
        date.and_time(NaiveTime::MIN) + Duration::seconds(seconds)
    }
}

/// Returns true for Saturday and Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Latest representable Monday-to-Friday date.
fn last_weekday() -> NaiveDate {
    let mut date = NaiveDate::MAX;
    while is_weekend(date) {
        match date.pred_opt() {
            Some(prev) => date = prev,
            None => break,
        }
    }
    date
}

/// First day of the month three months before `today`.
pub fn default_anchor(today: NaiveDate) -> NaiveDate {
    let first = today.with_day(1).unwrap_or(today);
    first.checked_sub_months(Months::new(3)).unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use proptest::prelude::*;

    fn anchor() -> NaiveDate {
        // A Friday
        NaiveDate::from_ymd_opt(2025, 1, 3).unwrap()
    }

    #[test]
    fn test_weekend_rolls_to_monday() {
        let assigner = TimestampAssigner::new(anchor(), 10);

        assert_eq!(assigner.date_for(0), anchor());
        assert_eq!(assigner.date_for(9), anchor());
        // Offsets 1 (Sat) and 2 (Sun) both land on Monday the 6th
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        assert_eq!(assigner.date_for(10), monday);
        assert_eq!(assigner.date_for(20), monday);
        assert_eq!(assigner.date_for(30), monday);
        assert_eq!(assigner.date_for(40), NaiveDate::from_ymd_opt(2025, 1, 7).unwrap());
    }

    #[test]
    fn test_business_hours() {
        let assigner = TimestampAssigner::new(anchor(), 10);
        let mut random = UniformRandomSource::seeded(21, 512).unwrap();

        let mut morning = 0;
        for i in 0..2_000 {
            let ts = assigner.assign(i, &mut random);
            assert!((8..18).contains(&ts.hour()), "hour {}", ts.hour());
            assert!(ts.minute() < 60 && ts.second() < 60);
            if ts.hour() < 12 {
                morning += 1;
            }
        }

        let share = morning as f64 / 2_000.0;
        assert!((share - 0.6).abs() < 0.05, "morning share {share}");
    }

    #[test]
    fn test_zero_records_per_day_treated_as_one() {
        let assigner = TimestampAssigner::new(anchor(), 0);
        assert_eq!(
            assigner.date_for(3),
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
        );
    }

    #[test]
    fn test_default_anchor() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 17).unwrap();
        assert_eq!(default_anchor(today), NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());

        let january = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        assert_eq!(default_anchor(january), NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
    }

    #[test]
    fn test_huge_index_saturates_on_weekday() {
        let assigner = TimestampAssigner::new(anchor(), 10);
        let mut random = UniformRandomSource::seeded(4, 16).unwrap();

        let far = assigner.date_for(10_000_000_000);
        let end = assigner.date_for(u64::MAX);
        assert!(!is_weekend(far));
        assert!(!is_weekend(end));
        assert!(far <= end);
        assert_eq!(end, last_weekday());
        assert!(end > NaiveDate::MAX - Duration::days(3));

        let ts = assigner.assign(u64::MAX, &mut random);
        assert_eq!(ts.date(), end);
        assert!((8..18).contains(&ts.hour()));
    }

    proptest! {
        #[test]
        fn prop_never_weekend(index in any::<u64>(), per_day in 1u64..50, seed in any::<u64>()) {
            let assigner = TimestampAssigner::new(anchor(), per_day);
            let mut random = UniformRandomSource::seeded(seed, 16).unwrap();
            let ts = assigner.assign(index, &mut random);
            prop_assert!(!is_weekend(ts.date()));
        }

        #[test]
        fn prop_dates_non_decreasing(index in 0u64..u64::MAX, per_day in 1u64..50) {
            let assigner = TimestampAssigner::new(anchor(), per_day);
            prop_assert!(assigner.date_for(index) <= assigner.date_for(index + 1));
        }
    }
}
