use super::types::Configuration;

/// Growth factors derived once per run from the annual percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
    pub yearly_contribution_growth: f64,
    pub yearly_inflation: f64,
    pub monthly_return_rate: f64,
    pub tax_retention: f64,
}

impl Rates {
    pub fn from_config(config: &Configuration) -> Self {
        Self {
            yearly_contribution_growth: percent_factor(config.monthly_investment_readjustment),
            yearly_inflation: percent_factor(config.inflation_percentage),
            monthly_return_rate: monthly_equivalent_rate(config.investment_return_percentage),
            tax_retention: 1.0 - config.taxes_percentage / 100.0,
        }
    }

    /// After-tax return credited on `balance` for one month.
    pub fn monthly_income(&self, balance: f64) -> f64 {
        balance * self.monthly_return_rate * self.tax_retention
    }
}

fn percent_factor(percentage: f64) -> f64 {
    1.0 + percentage / 100.0
}

/// Monthly rate that compounds to the given annual percentage over 12 months.
pub fn monthly_equivalent_rate(annual_percentage: f64) -> f64 {
    percent_factor(annual_percentage).powf(1.0 / 12.0) - 1.0
}
