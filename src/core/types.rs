use serde::{Deserialize, Serialize};

/// Inputs to a projection run. Percentages are whole numbers, so `7.0` means 7%.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub salary: f64,
    /// Collected from the user but not used to seed the balance.
    pub initial_investment: f64,
    pub monthly_investment: f64,
    pub monthly_investment_readjustment: f64,
    pub investment_return_percentage: f64,
    pub taxes_percentage: f64,
    pub inflation_percentage: f64,
    pub current_age: i32,
    pub retirement_age: i32,
}

impl Configuration {
    pub fn with_salary(self, salary: f64) -> Self {
        Self { salary, ..self }
    }

    pub fn with_initial_investment(self, initial_investment: f64) -> Self {
        Self {
            initial_investment,
            ..self
        }
    }

    pub fn with_monthly_investment(self, monthly_investment: f64) -> Self {
        Self {
            monthly_investment,
            ..self
        }
    }

    pub fn with_monthly_investment_readjustment(self, readjustment: f64) -> Self {
        Self {
            monthly_investment_readjustment: readjustment,
            ..self
        }
    }

    pub fn with_investment_return_percentage(self, percentage: f64) -> Self {
        Self {
            investment_return_percentage: percentage,
            ..self
        }
    }

    pub fn with_taxes_percentage(self, percentage: f64) -> Self {
        Self {
            taxes_percentage: percentage,
            ..self
        }
    }

    pub fn with_inflation_percentage(self, percentage: f64) -> Self {
        Self {
            inflation_percentage: percentage,
            ..self
        }
    }

    pub fn with_current_age(self, current_age: i32) -> Self {
        Self {
            current_age,
            ..self
        }
    }

    pub fn with_retirement_age(self, retirement_age: i32) -> Self {
        Self {
            retirement_age,
            ..self
        }
    }

    /// Number of calendar years spent contributing before retirement.
    /// Negative when the retirement age is below the current age.
    pub fn accumulation_years(&self) -> i64 {
        i64::from(self.retirement_age) - i64::from(self.current_age)
    }
}

/// One simulated month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub year: i32,
    pub month: u32,
    pub monthly_investment: f64,
    pub salary: f64,
    pub total_investment: f64,
    pub total: f64,
    pub retired: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionOptions {
    /// Calendar year of the first accumulation month.
    pub start_year: i32,
    /// Longest accumulation phase accepted, in years.
    pub max_accumulation_years: u32,
    /// Withdrawal years simulated before the run is declared non-convergent.
    pub max_withdrawal_years: u32,
}

pub const DEFAULT_MAX_ACCUMULATION_YEARS: u32 = 150;
pub const DEFAULT_MAX_WITHDRAWAL_YEARS: u32 = 150;

impl ProjectionOptions {
    pub fn starting_in(start_year: i32) -> Self {
        Self {
            start_year,
            max_accumulation_years: DEFAULT_MAX_ACCUMULATION_YEARS,
            max_withdrawal_years: DEFAULT_MAX_WITHDRAWAL_YEARS,
        }
    }
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        use chrono::Datelike;

        Self::starting_in(chrono::Local::now().year())
    }
}
