mod engine;
mod error;
mod format;
mod rates;
mod report;
mod summary;
mod types;

pub use engine::project;
pub use error::ProjectionError;
pub use format::{CurrencyFormatter, Language, LocaleCurrency, format_period_date};
pub use rates::{Rates, monthly_equivalent_rate};
pub use report::{ReportRow, render_table, report_headers, report_rows};
pub use summary::{Summary, describe, retirement_index, summarize};
pub use types::{
    Configuration, DEFAULT_MAX_ACCUMULATION_YEARS, DEFAULT_MAX_WITHDRAWAL_YEARS, Period,
    ProjectionOptions,
};
