use super::types::Period;

/// Renders a monetary amount for display.
pub trait CurrencyFormatter {
    fn format(&self, amount: f64) -> String;

    /// Language of the text shown around the amounts.
    fn language(&self) -> Language;

    /// Absent values render as an empty string, never as zero.
    fn format_optional(&self, amount: Option<f64>) -> String {
        amount.map(|value| self.format(value)).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Language {
    Portuguese,
    English,
}

/// Fixed locale and currency pairs used for display.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum LocaleCurrency {
    /// Brazilian real, `R$ 1.234,56`.
    #[default]
    PtBr,
    /// US dollar, `$1,234.56`.
    EnUs,
}

struct NumberStyle {
    symbol: &'static str,
    symbol_separator: &'static str,
    grouping: char,
    decimal: char,
}

impl LocaleCurrency {
    fn style(self) -> NumberStyle {
        match self {
            LocaleCurrency::PtBr => NumberStyle {
                symbol: "R$",
                symbol_separator: "\u{a0}",
                grouping: '.',
                decimal: ',',
            },
            LocaleCurrency::EnUs => NumberStyle {
                symbol: "$",
                symbol_separator: "",
                grouping: ',',
                decimal: '.',
            },
        }
    }
}

impl CurrencyFormatter for LocaleCurrency {
    fn format(&self, amount: f64) -> String {
        let style = self.style();
        if !amount.is_finite() {
            return format!("{}{}{}", style.symbol, style.symbol_separator, amount);
        }

        let cents = (amount.abs() * 100.0).round() as u64;
        let units = group_digits(cents / 100, style.grouping);
        let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };

        format!(
            "{sign}{}{}{units}{}{:02}",
            style.symbol,
            style.symbol_separator,
            style.decimal,
            cents % 100
        )
    }

    fn language(&self) -> Language {
        match self {
            LocaleCurrency::PtBr => Language::Portuguese,
            LocaleCurrency::EnUs => Language::English,
        }
    }
}

fn group_digits(value: u64, separator: char) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(c);
    }
    grouped
}

/// `YYYY/MM` label for a period.
pub fn format_period_date(period: &Period) -> String {
    format!("{}/{:02}", period.year, period.month)
}
