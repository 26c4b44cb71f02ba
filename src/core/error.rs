use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error(
        "projection does not converge: balance {balance:.2} still exceeds salary {salary:.2} after {max_years} withdrawal years"
    )]
    NonConvergent {
        max_years: u32,
        balance: f64,
        salary: f64,
    },
    #[error("accumulation phase of {years} years exceeds the limit of {max_years} years")]
    AccumulationTooLong { years: i64, max_years: u32 },
    #[error("calendar year {year} is out of range")]
    YearOutOfRange { year: i64 },
}
