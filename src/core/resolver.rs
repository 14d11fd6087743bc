use super::types::{AllocationResult, Category, CategoryTally, Cell};

const CELLS_PER_ROW: usize = 12;
const RETIREMENT_GLYPH: char = 'R';

/// Classifies one month of the lifespan timeline.
///
/// Months before `elapsed_months` are elapsed. The rest are laid out as
/// contiguous runs of sleep, work, child and parent, in that order, with
/// anything past the four runs counted as free time.
pub fn category_of(month_index: u32, result: &AllocationResult) -> Category {
    let index = i64::from(month_index);
    if index < result.elapsed_months {
        return Category::Elapsed;
    }

    let mut relative = (index - result.elapsed_months) as f64;
    for (category, size) in [
        (Category::Sleep, result.sleep_months),
        (Category::Work, result.work_months),
        (Category::Child, result.child_months),
        (Category::Parent, result.parent_months),
    ] {
        if relative < size {
            return category;
        }
        relative -= size;
    }
    Category::Free
}

pub fn is_retirement_month(month_index: u32, result: &AllocationResult) -> bool {
    result.retirement_month_index == Some(month_index)
}

pub fn cell_at(month_index: u32, result: &AllocationResult) -> Cell {
    Cell {
        index: month_index,
        category: category_of(month_index, result),
        retirement: is_retirement_month(month_index, result),
    }
}

/// One cell per month in `[0, total_months)`.
pub fn grid_cells(result: &AllocationResult) -> Vec<Cell> {
    (0..result.total_months)
        .map(|index| cell_at(index, result))
        .collect()
}

/// Whole cells per category as they are painted on the grid. Unlike the
/// fractional bucket sizes these always sum to `total_months`.
pub fn category_tally(result: &AllocationResult) -> CategoryTally {
    let mut tally = CategoryTally::default();
    for index in 0..result.total_months {
        tally.add(category_of(index, result));
    }
    tally
}

/// Plain-text grid, one row per year of life.
pub fn render_text_grid(result: &AllocationResult) -> String {
    let cells = grid_cells(result);
    let mut out = String::with_capacity(cells.len() + cells.len() / CELLS_PER_ROW * 8);
    for (row, chunk) in cells.chunks(CELLS_PER_ROW).enumerate() {
        out.push_str(&format!("{row:>3} "));
        for cell in chunk {
            out.push(if cell.retirement {
                RETIREMENT_GLYPH
            } else {
                cell.category.glyph()
            });
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ParentLabel, ParentsDetail};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn allocation(
        elapsed: i64,
        total: u32,
        buckets: [f64; 4],
        retirement: Option<u32>,
    ) -> AllocationResult {
        let remaining = u32::try_from((i64::from(total) - elapsed).max(0)).expect("fits");
        let named: f64 = buckets.iter().sum();
        AllocationResult {
            elapsed_months: elapsed,
            total_months: total,
            remaining_months: remaining,
            sleep_months: buckets[0],
            work_months: buckets[1],
            child_months: buckets[2],
            parent_months: buckets[3],
            free_months: (f64::from(remaining) - named).max(0.0),
            retirement_month_index: retirement,
            parents_detail: ParentsDetail {
                father_remaining_years: 0.0,
                mother_remaining_years: 0.0,
                effective_years: 0.0,
                label: ParentLabel::Parents,
            },
        }
    }

    #[test]
    fn months_before_elapsed_are_elapsed() {
        let result = allocation(10, 40, [5.0, 5.0, 5.0, 5.0], None);
        for index in 0..10 {
            assert_eq!(category_of(index, &result), Category::Elapsed);
        }
        assert_eq!(category_of(10, &result), Category::Sleep);
    }

    #[test]
    fn buckets_are_contiguous_in_precedence_order() {
        let result = allocation(2, 20, [3.0, 2.0, 1.0, 2.0], None);
        let categories: Vec<Category> = (0..20).map(|i| category_of(i, &result)).collect();
        let mut expected = vec![Category::Elapsed; 2];
        expected.extend([Category::Sleep; 3]);
        expected.extend([Category::Work; 2]);
        expected.extend([Category::Child; 1]);
        expected.extend([Category::Parent; 2]);
        expected.extend([Category::Free; 10]);
        assert_eq!(categories, expected);
    }

    #[test]
    fn fractional_bucket_boundaries_are_consumed_cumulatively() {
        // sleep [0, 1.5), work [1.5, 2.0), child empty, parent [2.0, 3.25).
        let result = allocation(0, 6, [1.5, 0.5, 0.0, 1.25], None);
        assert_eq!(category_of(0, &result), Category::Sleep);
        assert_eq!(category_of(1, &result), Category::Sleep);
        assert_eq!(category_of(2, &result), Category::Parent);
        assert_eq!(category_of(3, &result), Category::Parent);
        assert_eq!(category_of(4, &result), Category::Free);
    }

    #[test]
    fn empty_buckets_are_skipped() {
        let result = allocation(0, 4, [0.0, 0.0, 0.0, 0.0], None);
        for index in 0..4 {
            assert_eq!(category_of(index, &result), Category::Free);
        }
    }

    #[test]
    fn negative_elapsed_offsets_bucket_runs() {
        let result = allocation(-2, 6, [3.0, 0.0, 0.0, 0.0], None);
        assert_eq!(category_of(0, &result), Category::Sleep);
        assert_eq!(category_of(1, &result), Category::Free);
    }

    #[test]
    fn retirement_flag_is_independent_of_category() {
        let result = allocation(5, 12, [2.0, 2.0, 0.0, 0.0], Some(3));
        let cell = cell_at(3, &result);
        assert!(cell.retirement);
        assert_eq!(cell.category, Category::Elapsed);
        assert!(!is_retirement_month(4, &result));

        let flagged: Vec<u32> = grid_cells(&result)
            .iter()
            .filter(|c| c.retirement)
            .map(|c| c.index)
            .collect();
        assert_eq!(flagged, vec![3]);
    }

    #[test]
    fn grid_covers_every_month_exactly_once() {
        let result = allocation(7, 30, [4.5, 3.0, 1.0, 0.5], Some(29));
        let cells = grid_cells(&result);
        assert_eq!(cells.len(), 30);
        assert!(cells.iter().enumerate().all(|(i, c)| c.index as usize == i));
    }

    #[test]
    fn tally_counts_painted_cells() {
        let result = allocation(2, 20, [3.0, 2.0, 1.0, 2.0], None);
        let tally = category_tally(&result);
        assert_eq!(tally.elapsed, 2);
        assert_eq!(tally.sleep, 3);
        assert_eq!(tally.work, 2);
        assert_eq!(tally.child, 1);
        assert_eq!(tally.parent, 2);
        assert_eq!(tally.free, 10);
        assert_eq!(tally.total(), 20);
    }

    #[test]
    fn text_grid_has_one_row_per_year_and_marks_retirement() {
        let result = allocation(12, 24, [6.0, 0.0, 0.0, 0.0], Some(20));
        let text = render_text_grid(&result);
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], "  0 ############");
        assert_eq!(rows[1], "  1 zzzzzz..R...");
    }

    #[test]
    fn empty_timeline_renders_nothing() {
        let result = allocation(0, 0, [0.0; 4], None);
        assert!(grid_cells(&result).is_empty());
        assert_eq!(render_text_grid(&result), "");
        assert_eq!(category_tally(&result).total(), 0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_category_is_elapsed_before_elapsed_months_and_tally_is_complete(
            elapsed in -24i64..900,
            total in 0u32..1200,
            sleep in 0u32..4000,
            work in 0u32..4000,
            child in 0u32..4000,
            parent in 0u32..4000
        ) {
            let buckets = [
                f64::from(sleep) / 10.0,
                f64::from(work) / 10.0,
                f64::from(child) / 10.0,
                f64::from(parent) / 10.0,
            ];
            let result = allocation(elapsed, total, buckets, total.checked_sub(1));
            let mut previous_rank = 0usize;
            for index in 0..total {
                let category = category_of(index, &result);
                if i64::from(index) < elapsed {
                    prop_assert_eq!(category, Category::Elapsed);
                } else {
                    prop_assert!(category != Category::Elapsed);
                }
                let rank = Category::ALL
                    .iter()
                    .position(|c| *c == category)
                    .expect("known category");
                prop_assert!(rank >= previous_rank);
                previous_rank = rank;
            }
            prop_assert_eq!(category_tally(&result).total(), total);
        }
    }
}
