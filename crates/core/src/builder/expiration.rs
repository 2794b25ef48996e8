use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

pub const DEFAULT_LEAD_BUSINESS_DAYS: u32 = 7;

pub fn is_business_day(date: NaiveDate) -> bool {
    date.weekday() != Weekday::Sun
}

/// Counts `lead_business_days` non-Sunday days starting the day after `start`
/// and returns the day the count is reached, at midnight.
///
/// Returns `None` only when the walk runs off the end of the calendar.
pub fn compute_expiration(start: NaiveDateTime, lead_business_days: u32) -> Option<NaiveDateTime> {
    let mut counted = 0;
    start
        .date()
        .iter_days()
        .skip(1)
        .find(|day| {
            if is_business_day(*day) {
                counted += 1;
            }
            counted >= lead_business_days
        })
        .map(|day| day.and_time(NaiveTime::MIN))
}

pub fn default_expiration(now: NaiveDateTime, lead_business_days: u32) -> NaiveDate {
    compute_expiration(now, lead_business_days).map_or(now.date(), |expiration| expiration.date())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::{compute_expiration, default_expiration, is_business_day};
    use crate::builder::fixtures::monday_morning;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn seven_business_days_from_monday_skip_the_sunday() {
        let expiration = compute_expiration(monday_morning(), 7).expect("in range");
        assert_eq!(expiration, date(2024, 1, 9).and_time(NaiveTime::MIN));
    }

    #[test]
    fn counting_starts_the_day_after_start() {
        let saturday = date(2024, 1, 6).and_hms_opt(23, 59, 0).expect("valid time");
        // Sunday the 7th is skipped, Monday the 8th is the first business day.
        assert_eq!(default_expiration(saturday, 1), date(2024, 1, 8));
        assert_eq!(default_expiration(monday_morning(), 1), date(2024, 1, 2));
    }

    #[test]
    fn expiration_never_lands_on_sunday_for_positive_leads() {
        for lead in 1..=30 {
            let expiration = default_expiration(monday_morning(), lead);
            assert!(is_business_day(expiration), "lead {lead} landed on {expiration}");
        }
    }

    #[test]
    fn zero_lead_returns_next_calendar_day() {
        assert_eq!(default_expiration(monday_morning(), 0), date(2024, 1, 2));
    }
}
