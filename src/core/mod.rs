mod clock;
mod engine;
mod life_table;
mod resolver;
mod types;

pub use clock::time_stats;
pub use engine::{compute, elapsed_months};
pub use life_table::{LifeTable, LifeTableEntry, LookupError};
pub use resolver::{
    category_of, category_tally, cell_at, grid_cells, is_retirement_month, render_text_grid,
};
pub use types::{
    AllocationResult, Assumptions, Category, CategoryTally, Cell, DurationBreakdown,
    LifeExpectancy, ParentLabel, ParentsDetail, PersonProfile, Population, Sex, TimeStats,
};
