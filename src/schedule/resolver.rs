//! Fire-time resolution.
//!
//! Pure conversion of a "HH:MM" wall-clock string into the two instants a
//! schedule needs: the checkout fire time and the login lead time one minute
//! earlier. Works on naive local datetimes so callers can pin "now" in tests.

use chrono::{Duration, NaiveDateTime, NaiveTime};

use super::ScheduleError;

/// Resolve `time_str` against `now` into `(checkout_at, login_at)`.
///
/// The target is placed on today's date; if that instant is not strictly in
/// the future, both instants roll forward by exactly 24 hours.
pub fn resolve_fire_times(
    now: NaiveDateTime,
    time_str: &str,
) -> Result<(NaiveDateTime, NaiveDateTime), ScheduleError> {
    let target = NaiveTime::parse_from_str(time_str, "%H:%M")
        .map_err(|_| ScheduleError::InvalidTimeFormat(time_str.to_string()))?;

    let mut checkout_at = now.date().and_time(target);
    if checkout_at <= now {
        checkout_at = checkout_at + Duration::hours(24);
    }
    let login_at = checkout_at - Duration::minutes(1);

    Ok((checkout_at, login_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn future_time_stays_on_today() {
        let (checkout_at, login_at) = resolve_fire_times(at(10, 0), "13:45").unwrap();
        assert_eq!(checkout_at, at(13, 45));
        assert_eq!(login_at, at(13, 44));
    }

    #[test]
    fn login_always_leads_by_one_minute() {
        for time in ["00:00", "00:01", "12:30", "23:59"] {
            let (checkout_at, login_at) = resolve_fire_times(at(6, 13), time).unwrap();
            assert_eq!(checkout_at - login_at, Duration::minutes(1));
        }
    }

    #[test]
    fn past_time_rolls_to_tomorrow() {
        let (checkout_at, login_at) = resolve_fire_times(at(15, 0), "13:45").unwrap();
        assert_eq!(checkout_at, at(13, 45) + Duration::hours(24));
        assert_eq!(login_at, checkout_at - Duration::minutes(1));
    }

    #[test]
    fn exact_now_rolls_to_tomorrow() {
        // "not strictly in the future" includes the current minute
        let (checkout_at, _) = resolve_fire_times(at(13, 45), "13:45").unwrap();
        assert_eq!(checkout_at, at(13, 45) + Duration::hours(24));
    }

    #[test]
    fn midnight_target_leads_into_previous_day() {
        let (checkout_at, login_at) = resolve_fire_times(at(23, 30), "00:00").unwrap();
        assert_eq!(
            checkout_at,
            NaiveDate::from_ymd_opt(2025, 8, 16)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        assert_eq!(login_at, at(23, 59));
    }

    #[test]
    fn single_digit_hour_parses() {
        let (checkout_at, _) = resolve_fire_times(at(6, 0), "7:30").unwrap();
        assert_eq!(checkout_at, at(7, 30));
    }

    #[test]
    fn malformed_input_is_rejected() {
        for bad in ["25:61", "abc", "12:5x", "", "12-30", "24:00"] {
            let err = resolve_fire_times(at(10, 0), bad).unwrap_err();
            assert!(matches!(err, ScheduleError::InvalidTimeFormat(_)), "{bad}");
        }
    }
}
