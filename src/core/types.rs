use chrono::NaiveDate;
use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Sex {
    Male,
    Female,
}

/// Row key of the life-expectancy table. Parents are looked up under
/// `General`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Population {
    Male,
    Female,
    General,
}

impl From<Sex> for Population {
    fn from(value: Sex) -> Self {
        match value {
            Sex::Male => Population::Male,
            Sex::Female => Population::Female,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonProfile {
    pub birth_date: NaiveDate,
    pub sex: Sex,
    pub father_birth_date: Option<NaiveDate>,
    pub mother_birth_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assumptions {
    pub retirement_age: f64,
    pub sleep_hours_per_day: f64,
    pub work_days_per_week: f64,
    pub work_hours_per_day: f64,
    pub child_birth_age: f64,
    pub child_raising_years: f64,
    pub child_hours_per_day: f64,
    pub parent_visit_days_per_month: f64,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            retirement_age: 60.0,
            sleep_hours_per_day: 8.0,
            work_days_per_week: 5.0,
            work_hours_per_day: 8.0,
            child_birth_age: 30.0,
            child_raising_years: 18.0,
            child_hours_per_day: 5.0,
            parent_visit_days_per_month: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeExpectancy {
    pub age: f64,
    pub source: String,
    pub year: String,
    pub country: String,
    pub population: Population,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentLabel {
    Father,
    Mother,
    Parents,
}

impl ParentLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            ParentLabel::Father => "father",
            ParentLabel::Mother => "mother",
            ParentLabel::Parents => "parents",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentsDetail {
    pub father_remaining_years: f64,
    pub mother_remaining_years: f64,
    /// Visiting horizon after clamping to the subject's own remaining life.
    pub effective_years: f64,
    pub label: ParentLabel,
}

/// One computation's partition of a lifetime into month buckets.
///
/// Bucket sizes are fractional months and cover the remaining span only.
/// `free_months` is a clamped residual, so the named buckets may sum to
/// more than `remaining_months` when the assumptions over-commit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResult {
    pub elapsed_months: i64,
    pub total_months: u32,
    pub remaining_months: u32,
    pub sleep_months: f64,
    pub work_months: f64,
    pub child_months: f64,
    pub parent_months: f64,
    pub free_months: f64,
    /// `None` when the timeline has no months at all.
    pub retirement_month_index: Option<u32>,
    pub parents_detail: ParentsDetail,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Elapsed,
    Sleep,
    Work,
    Child,
    Parent,
    Free,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Elapsed,
        Category::Sleep,
        Category::Work,
        Category::Child,
        Category::Parent,
        Category::Free,
    ];

    pub fn glyph(self) -> char {
        match self {
            Category::Elapsed => '#',
            Category::Sleep => 'z',
            Category::Work => 'w',
            Category::Child => 'c',
            Category::Parent => 'p',
            Category::Free => '.',
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub index: u32,
    pub category: Category,
    pub retirement: bool,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTally {
    pub elapsed: u32,
    pub sleep: u32,
    pub work: u32,
    pub child: u32,
    pub parent: u32,
    pub free: u32,
}

impl CategoryTally {
    pub fn add(&mut self, category: Category) {
        let slot = match category {
            Category::Elapsed => &mut self.elapsed,
            Category::Sleep => &mut self.sleep,
            Category::Work => &mut self.work,
            Category::Child => &mut self.child,
            Category::Parent => &mut self.parent,
            Category::Free => &mut self.free,
        };
        *slot += 1;
    }

    pub fn get(&self, category: Category) -> u32 {
        match category {
            Category::Elapsed => self.elapsed,
            Category::Sleep => self.sleep,
            Category::Work => self.work,
            Category::Child => self.child,
            Category::Parent => self.parent,
            Category::Free => self.free,
        }
    }

    pub fn total(&self) -> u32 {
        Category::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationBreakdown {
    pub years: f64,
    pub months: f64,
    pub days: f64,
    pub hours: f64,
    pub minutes: f64,
    pub seconds: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeStats {
    pub elapsed: DurationBreakdown,
    pub remaining: DurationBreakdown,
}
