use chrono::{Datelike, NaiveDate};

use super::types::{
    AllocationResult, Assumptions, LifeExpectancy, ParentLabel, ParentsDetail, PersonProfile,
};

const MONTHS_PER_YEAR: f64 = 12.0;
const HOURS_PER_DAY: f64 = 24.0;
const WEEKS_PER_YEAR: f64 = 52.0;
const DAYS_PER_YEAR: f64 = 365.0;
/// A nominal 30-day month of continuous time, in hours.
const HOURS_PER_NOMINAL_MONTH: f64 = 720.0;
const AVG_DAYS_PER_MONTH: f64 = 30.44;
/// A parent is singled out in the label only when they outlive the other
/// by more than this many years.
const PARENT_LABEL_GAP_YEARS: f64 = 5.0;

/// Partitions the remaining lifespan of `profile` into activity buckets.
///
/// `now` is the only clock input. The function is total: degenerate inputs
/// such as a future birth date or a zero life expectancy produce a
/// well-formed (possibly empty) result rather than an error.
pub fn compute(
    profile: &PersonProfile,
    assumptions: &Assumptions,
    own_life_expectancy: &LifeExpectancy,
    parent_life_expectancy: &LifeExpectancy,
    now: NaiveDate,
) -> AllocationResult {
    let elapsed_months = elapsed_months(profile.birth_date, now);
    let total_months = total_months(own_life_expectancy.age);
    let remaining_months = saturating_u32(i64::from(total_months) - elapsed_months);
    let remaining = f64::from(remaining_months);

    let sleep_months =
        non_negative(remaining * (assumptions.sleep_hours_per_day / HOURS_PER_DAY));

    let current_age = elapsed_months as f64 / MONTHS_PER_YEAR;
    let work_months = work_months(assumptions, current_age);
    let retirement_month_index = retirement_month_index(assumptions.retirement_age, total_months);
    let child_months = child_months(assumptions, current_age);

    let parents_detail = parents_detail(
        profile,
        parent_life_expectancy.age,
        remaining / MONTHS_PER_YEAR,
        now,
    );
    let parent_months = non_negative(
        parents_detail.effective_years
            * MONTHS_PER_YEAR
            * (assumptions.parent_visit_days_per_month / AVG_DAYS_PER_MONTH),
    );

    let allocated = sleep_months + work_months + child_months + parent_months;
    let free_months = non_negative(remaining - allocated);

    AllocationResult {
        elapsed_months,
        total_months,
        remaining_months,
        sleep_months,
        work_months,
        child_months,
        parent_months,
        free_months,
        retirement_month_index,
        parents_detail,
    }
}

/// Whole calendar months between `birth` and `now`. Day-of-month is
/// ignored, and the result is negative for a birth date in the future.
pub fn elapsed_months(birth: NaiveDate, now: NaiveDate) -> i64 {
    let years = i64::from(now.year()) - i64::from(birth.year());
    let months = i64::from(now.month()) - i64::from(birth.month());
    years * 12 + months
}

fn total_months(life_expectancy_years: f64) -> u32 {
    // Float-to-int casts saturate, and NaN maps to zero.
    (life_expectancy_years * MONTHS_PER_YEAR).floor().max(0.0) as u32
}

fn saturating_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

fn work_months(assumptions: &Assumptions, current_age: f64) -> f64 {
    let years_until_retire = (assumptions.retirement_age - current_age).max(0.0);
    let work_hours = years_until_retire
        * WEEKS_PER_YEAR
        * assumptions.work_days_per_week
        * assumptions.work_hours_per_day;
    non_negative(work_hours / HOURS_PER_NOMINAL_MONTH)
}

fn retirement_month_index(retirement_age: f64, total_months: u32) -> Option<u32> {
    let last = total_months.checked_sub(1)?;
    let index = (retirement_age * MONTHS_PER_YEAR).floor().max(0.0) as u32;
    Some(index.min(last))
}

fn child_months(assumptions: &Assumptions, current_age: f64) -> f64 {
    let window_start = assumptions.child_birth_age;
    let window_end = window_start + assumptions.child_raising_years;
    let years_left = if current_age < window_start {
        assumptions.child_raising_years
    } else if current_age < window_end {
        window_end - current_age
    } else {
        0.0
    };
    if years_left <= 0.0 {
        return 0.0;
    }
    let child_hours = years_left * DAYS_PER_YEAR * assumptions.child_hours_per_day;
    non_negative(child_hours / HOURS_PER_NOMINAL_MONTH)
}

/// Years a parent born on `birth` has left under `life_expectancy`, or zero
/// when the birth date is unknown or the expectancy is already exceeded.
fn parent_remaining_years(birth: Option<NaiveDate>, life_expectancy: f64, now: NaiveDate) -> f64 {
    let Some(birth) = birth else {
        return 0.0;
    };
    let age = elapsed_months(birth, now) as f64 / MONTHS_PER_YEAR;
    non_negative(life_expectancy - age)
}

fn parents_detail(
    profile: &PersonProfile,
    parent_life_expectancy: f64,
    own_remaining_years: f64,
    now: NaiveDate,
) -> ParentsDetail {
    let father = parent_remaining_years(profile.father_birth_date, parent_life_expectancy, now);
    let mother = parent_remaining_years(profile.mother_birth_date, parent_life_expectancy, now);

    // No visits after the subject's own death.
    let effective_years = father.max(mother).min(own_remaining_years);

    ParentsDetail {
        father_remaining_years: father,
        mother_remaining_years: mother,
        effective_years,
        label: parent_label(father, mother),
    }
}

fn parent_label(father: f64, mother: f64) -> ParentLabel {
    match (father > 0.0, mother > 0.0) {
        (true, true) if father > mother + PARENT_LABEL_GAP_YEARS => ParentLabel::Father,
        (true, true) if mother > father + PARENT_LABEL_GAP_YEARS => ParentLabel::Mother,
        (true, true) => ParentLabel::Parents,
        (true, false) => ParentLabel::Father,
        (false, true) => ParentLabel::Mother,
        (false, false) => ParentLabel::Parents,
    }
}
