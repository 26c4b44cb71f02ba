use serde::Serialize;

use super::format::{CurrencyFormatter, Language, format_period_date};
use super::types::{Configuration, Period};

/// Figures behind the one-sentence description of a projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub retirement_age: i32,
    /// The salary as entered, before any inflation adjustment.
    pub salary: f64,
    pub end_age: i64,
    pub invested_at_retirement: f64,
    pub total_at_retirement: f64,
    pub first_period: Period,
    pub retirement_period: Period,
    pub last_period: Period,
}

/// Index of the first retired period, if the withdrawal phase produced any.
pub fn retirement_index(periods: &[Period]) -> Option<usize> {
    periods.iter().position(|p| p.retired)
}

/// Derives the summary figures. Returns `None` for an empty projection.
///
/// When no period is retired the last period stands in for the retirement
/// month, so the reported end age equals the retirement age.
pub fn summarize(config: &Configuration, periods: &[Period]) -> Option<Summary> {
    let first_period = *periods.first()?;
    let last_period = *periods.last()?;
    let retirement_period = retirement_index(periods)
        .map(|idx| periods[idx])
        .unwrap_or(last_period);

    Some(Summary {
        retirement_age: config.retirement_age,
        salary: config.salary,
        end_age: i64::from(last_period.year) - i64::from(retirement_period.year)
            + i64::from(config.retirement_age),
        invested_at_retirement: retirement_period.total_investment,
        total_at_retirement: retirement_period.total,
        first_period,
        retirement_period,
        last_period,
    })
}

impl Summary {
    /// Sentence in the formatter's language.
    pub fn describe(&self, fmt: &dyn CurrencyFormatter) -> String {
        let salary = fmt.format(self.salary);
        let invested = fmt.format(self.invested_at_retirement);
        let total = fmt.format(self.total_at_retirement);

        match fmt.language() {
            Language::Portuguese => format!(
                "Se aposentando aos {} anos, você consegue tirar um salário de {salary} reajustado pela inflação até os seus {} anos de idade. \
                 Valor investido: {invested}, valor com rendimentos: {total}.",
                self.retirement_age, self.end_age,
            ),
            Language::English => format!(
                "Retiring at {} years old, you can draw a salary of {salary} adjusted for inflation until you are {} years old. \
                 Amount invested: {invested}, amount with returns: {total}.",
                self.retirement_age, self.end_age,
            ),
        }
    }

    /// `YYYY/MM` span covered by the projection.
    pub fn date_range(&self) -> (String, String) {
        (
            format_period_date(&self.first_period),
            format_period_date(&self.last_period),
        )
    }
}

/// Convenience wrapper producing the sentence directly.
pub fn describe(
    config: &Configuration,
    periods: &[Period],
    fmt: &dyn CurrencyFormatter,
) -> Option<String> {
    summarize(config, periods).map(|summary| summary.describe(fmt))
}
