//! Date-range validation for period creation.

use chrono::NaiveDate;

use crate::error::LedgerError;

/// Validates that `start_date` is strictly before `end_date`.
///
/// # Errors
///
/// Returns `InvalidDateRange` otherwise.
pub fn validate_date_range(start_date: NaiveDate, end_date: NaiveDate) -> Result<(), LedgerError> {
    if start_date >= end_date {
        return Err(LedgerError::InvalidDateRange);
    }
    Ok(())
}

/// Checks if two inclusive date ranges overlap.
///
/// Two ranges [a_start, a_end] and [b_start, b_end] overlap if:
/// a_start <= b_end AND a_end >= b_start
#[must_use]
pub fn date_ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_valid_range() {
        assert!(validate_date_range(date(2026, 1, 1), date(2026, 1, 31)).is_ok());
    }

    #[test]
    fn test_equal_dates_rejected() {
        assert!(validate_date_range(date(2026, 1, 1), date(2026, 1, 1)).is_err());
    }

    #[test]
    fn test_adjacent_ranges_do_not_overlap() {
        assert!(!date_ranges_overlap(
            date(2026, 1, 1),
            date(2026, 1, 31),
            date(2026, 2, 1),
            date(2026, 2, 28),
        ));
    }

    #[test]
    fn test_shared_day_overlaps() {
        assert!(date_ranges_overlap(
            date(2026, 1, 1),
            date(2026, 1, 31),
            date(2026, 1, 31),
            date(2026, 2, 28),
        ));
    }

    /// Strategy for a day offset from a fixed epoch.
    fn day_strategy() -> impl Strategy<Value = NaiveDate> {
        (0i64..3650).prop_map(|offset| {
            date(2020, 1, 1) + chrono::Duration::days(offset)
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Overlap is symmetric in its two ranges.
        #[test]
        fn prop_overlap_symmetric(
            a_start in day_strategy(),
            a_len in 0i64..400,
            b_start in day_strategy(),
            b_len in 0i64..400,
        ) {
            let a_end = a_start + chrono::Duration::days(a_len);
            let b_end = b_start + chrono::Duration::days(b_len);
            prop_assert_eq!(
                date_ranges_overlap(a_start, a_end, b_start, b_end),
                date_ranges_overlap(b_start, b_end, a_start, a_end)
            );
        }

        /// A range always overlaps itself.
        #[test]
        fn prop_range_overlaps_itself(
            start in day_strategy(),
            len in 0i64..400,
        ) {
            let end = start + chrono::Duration::days(len);
            prop_assert!(date_ranges_overlap(start, end, start, end));
        }
    }
}
