use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use super::types::{DurationBreakdown, TimeStats};

const MS_PER_SECOND: f64 = 1_000.0;
const MS_PER_MINUTE: f64 = 60.0 * MS_PER_SECOND;
const MS_PER_HOUR: f64 = 60.0 * MS_PER_MINUTE;
const MS_PER_DAY: f64 = 24.0 * MS_PER_HOUR;
const MS_PER_YEAR: f64 = 365.2425 * MS_PER_DAY;
const MS_PER_MONTH: f64 = MS_PER_YEAR / 12.0;

/// Lived and remaining time for the live counters shown beside the grid.
///
/// The projected end of life is `birth` plus the whole years of
/// `life_expectancy_years` as calendar years, plus the fractional year as
/// mean Gregorian days. Both durations are clamped at zero.
pub fn time_stats(birth: NaiveDate, life_expectancy_years: f64, now: NaiveDateTime) -> TimeStats {
    let born = birth.and_time(NaiveTime::MIN);
    let death = projected_death(born, life_expectancy_years);
    TimeStats {
        elapsed: breakdown(now - born),
        remaining: breakdown(death - now),
    }
}

fn projected_death(born: NaiveDateTime, life_expectancy_years: f64) -> NaiveDateTime {
    let years = if life_expectancy_years.is_finite() {
        life_expectancy_years.max(0.0)
    } else {
        0.0
    };
    let whole_years = years.floor();
    let fraction_ms = ((years - whole_years) * MS_PER_YEAR).round() as i64;

    let months = u32::try_from((whole_years as u64).saturating_mul(12)).unwrap_or(u32::MAX);
    born.checked_add_months(Months::new(months))
        .and_then(|d| d.checked_add_signed(TimeDelta::milliseconds(fraction_ms)))
        .unwrap_or(NaiveDateTime::MAX)
}

fn breakdown(delta: TimeDelta) -> DurationBreakdown {
    let ms = (delta.num_milliseconds() as f64).max(0.0);
    DurationBreakdown {
        years: ms / MS_PER_YEAR,
        months: ms / MS_PER_MONTH,
        days: ms / MS_PER_DAY,
        hours: ms / MS_PER_HOUR,
        minutes: ms / MS_PER_MINUTE,
        seconds: ms / MS_PER_SECOND,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .expect("valid test date")
            .and_time(NaiveTime::MIN)
    }

    #[test]
    fn remaining_uses_calendar_years_plus_mean_fractional_year() {
        let birth = NaiveDate::from_ymd_opt(2000, 1, 1).expect("valid");
        let stats = time_stats(birth, 80.5, at(2000, 1, 1));

        assert_approx(stats.elapsed.seconds, 0.0);
        // 2000-01-01 to 2080-01-01 spans 20 leap days.
        let expected_days = 80.0 * 365.0 + 20.0 + 0.5 * 365.2425;
        assert_approx(stats.remaining.days, expected_days);
        assert_approx(stats.remaining.years, expected_days / 365.2425);
    }

    #[test]
    fn elapsed_units_are_consistent() {
        let birth = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid");
        let stats = time_stats(birth, 80.0, at(2024, 1, 11));

        assert_approx(stats.elapsed.days, 10.0);
        assert_approx(stats.elapsed.hours, 240.0);
        assert_approx(stats.elapsed.minutes, 14_400.0);
        assert_approx(stats.elapsed.seconds, 864_000.0);
        assert_approx(stats.elapsed.months, stats.elapsed.years * 12.0);
    }

    #[test]
    fn durations_clamp_at_zero() {
        let birth = NaiveDate::from_ymd_opt(1900, 1, 1).expect("valid");
        let stats = time_stats(birth, 70.0, at(2024, 1, 1));
        assert_eq!(stats.remaining, DurationBreakdown::default());

        let unborn = NaiveDate::from_ymd_opt(2030, 1, 1).expect("valid");
        let stats = time_stats(unborn, 70.0, at(2024, 1, 1));
        assert_eq!(stats.elapsed, DurationBreakdown::default());
    }

    #[test]
    fn non_finite_expectancy_is_treated_as_zero() {
        let birth = NaiveDate::from_ymd_opt(2000, 1, 1).expect("valid");
        let stats = time_stats(birth, f64::NAN, at(2024, 1, 1));
        assert_eq!(stats.remaining, DurationBreakdown::default());
    }
}
