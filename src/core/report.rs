use serde::Serialize;

use super::format::{CurrencyFormatter, Language, format_period_date};
use super::types::Period;

pub fn report_headers(language: Language) -> [&'static str; 5] {
    match language {
        Language::Portuguese => [
            "Data",
            "Aporte mensal",
            "Total investido",
            "Total com juros",
            "Salário reajustado",
        ],
        Language::English => [
            "Date",
            "Monthly investment",
            "Total invested",
            "Total with returns",
            "Adjusted salary",
        ],
    }
}

/// A period with every column already rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub date: String,
    pub monthly_investment: String,
    pub total_investment: String,
    pub total: String,
    pub salary: String,
    pub retired: bool,
}

impl ReportRow {
    fn cells(&self) -> [&str; 5] {
        [
            self.date.as_str(),
            self.monthly_investment.as_str(),
            self.total_investment.as_str(),
            self.total.as_str(),
            self.salary.as_str(),
        ]
    }
}

pub fn report_rows(periods: &[Period], fmt: &dyn CurrencyFormatter) -> Vec<ReportRow> {
    periods
        .iter()
        .map(|period| ReportRow {
            date: format_period_date(period),
            monthly_investment: fmt.format(period.monthly_investment),
            total_investment: fmt.format(period.total_investment),
            total: fmt.format(period.total),
            salary: fmt.format(period.salary),
            retired: period.retired,
        })
        .collect()
}

/// Plain-text table with right-aligned money columns.
pub fn render_table(periods: &[Period], fmt: &dyn CurrencyFormatter) -> String {
    let rows = report_rows(periods, fmt);
    let headers = report_headers(fmt.language());

    let mut widths = headers.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, headers, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');
    for row in &rows {
        push_line(&mut out, row.cells(), &widths);
    }
    out
}

fn push_line(out: &mut String, cells: [&str; 5], widths: &[usize; 5]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(col, (cell, width))| {
            let pad = width.saturating_sub(cell.chars().count());
            if col == 0 {
                format!("{cell}{}", " ".repeat(pad))
            } else {
                format!("{}{cell}", " ".repeat(pad))
            }
        })
        .collect();
    out.push_str(line.join(" | ").trim_end());
    out.push('\n');
}
