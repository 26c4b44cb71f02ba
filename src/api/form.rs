use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::core::Configuration;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{} ({}) is required", .0.label(), .0.id())]
    MissingField(FormField),
    #[error("{} ({}) must be a finite number", .0.label(), .0.id())]
    NotFinite(FormField),
    #[error("{} ({}) must be a whole number", .0.label(), .0.id())]
    NotWhole(FormField),
    #[error(
        "retirementAge ({retirement_age}) must be >= currentAge ({current_age})"
    )]
    RetirementBeforeCurrentAge { current_age: i32, retirement_age: i32 },
    #[error("unknown field `{0}`")]
    UnknownField(String),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FormField {
    Salary,
    InitialInvestment,
    MonthlyInvestment,
    MonthlyInvestmentReadjustment,
    TaxesPercentage,
    InvestmentReturnPercentage,
    InflationPercentage,
    CurrentAge,
    RetirementAge,
}

impl FormField {
    pub const ALL: [FormField; 9] = [
        FormField::Salary,
        FormField::InitialInvestment,
        FormField::MonthlyInvestment,
        FormField::MonthlyInvestmentReadjustment,
        FormField::TaxesPercentage,
        FormField::InvestmentReturnPercentage,
        FormField::InflationPercentage,
        FormField::CurrentAge,
        FormField::RetirementAge,
    ];

    pub fn id(self) -> &'static str {
        match self {
            FormField::Salary => "salary",
            FormField::InitialInvestment => "initialInvestment",
            FormField::MonthlyInvestment => "monthlyInvestment",
            FormField::MonthlyInvestmentReadjustment => "monthlyInvestmentReadjustment",
            FormField::TaxesPercentage => "taxesPercentage",
            FormField::InvestmentReturnPercentage => "investmentReturnPercentage",
            FormField::InflationPercentage => "inflationPercentage",
            FormField::CurrentAge => "currentAge",
            FormField::RetirementAge => "retirementAge",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::Salary => "Salary",
            FormField::InitialInvestment => "Initial investment",
            FormField::MonthlyInvestment => "Monthly investment",
            FormField::MonthlyInvestmentReadjustment => "Monthly investment readjustment (%)",
            FormField::TaxesPercentage => "Income tax (%)",
            FormField::InvestmentReturnPercentage => "Annual investment return (%)",
            FormField::InflationPercentage => "Inflation (%)",
            FormField::CurrentAge => "Current age",
            FormField::RetirementAge => "Retirement age",
        }
    }
}

impl FromStr for FormField {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Older clients spell the investment fields "Investiment".
        let normalized = s.replace("Investiment", "Investment");
        FormField::ALL
            .into_iter()
            .find(|field| field.id() == normalized)
            .ok_or_else(|| ConfigError::UnknownField(s.to_string()))
    }
}

/// Raw form state. Each field is `None` while blank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationForm {
    pub salary: Option<f64>,
    pub initial_investment: Option<f64>,
    pub monthly_investment: Option<f64>,
    pub monthly_investment_readjustment: Option<f64>,
    pub taxes_percentage: Option<f64>,
    pub investment_return_percentage: Option<f64>,
    pub inflation_percentage: Option<f64>,
    pub current_age: Option<f64>,
    pub retirement_age: Option<f64>,
}

impl Default for ConfigurationForm {
    fn default() -> Self {
        Self {
            salary: None,
            initial_investment: None,
            monthly_investment: None,
            monthly_investment_readjustment: Some(0.0),
            taxes_percentage: Some(15.0),
            investment_return_percentage: Some(7.0),
            inflation_percentage: Some(5.0),
            current_age: None,
            retirement_age: None,
        }
    }
}

/// Blank input clears the field; anything else that does not parse as a
/// number counts as zero.
pub fn parse_field_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(parse_leading_float(trimmed))
}

// Accepts the longest numeric prefix, so "12abc" reads as 12.
fn parse_leading_float(text: &str) -> f64 {
    let numeric_len = text
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .unwrap_or(text.len());
    (1..=numeric_len)
        .rev()
        .find_map(|end| text[..end].parse::<f64>().ok())
        .unwrap_or(0.0)
}

impl ConfigurationForm {
    pub fn get(&self, field: FormField) -> Option<f64> {
        match field {
            FormField::Salary => self.salary,
            FormField::InitialInvestment => self.initial_investment,
            FormField::MonthlyInvestment => self.monthly_investment,
            FormField::MonthlyInvestmentReadjustment => self.monthly_investment_readjustment,
            FormField::TaxesPercentage => self.taxes_percentage,
            FormField::InvestmentReturnPercentage => self.investment_return_percentage,
            FormField::InflationPercentage => self.inflation_percentage,
            FormField::CurrentAge => self.current_age,
            FormField::RetirementAge => self.retirement_age,
        }
    }

    /// Returns a copy with one field replaced.
    pub fn with(self, field: FormField, value: Option<f64>) -> Self {
        let mut next = self;
        let slot = match field {
            FormField::Salary => &mut next.salary,
            FormField::InitialInvestment => &mut next.initial_investment,
            FormField::MonthlyInvestment => &mut next.monthly_investment,
            FormField::MonthlyInvestmentReadjustment => {
                &mut next.monthly_investment_readjustment
            }
            FormField::TaxesPercentage => &mut next.taxes_percentage,
            FormField::InvestmentReturnPercentage => &mut next.investment_return_percentage,
            FormField::InflationPercentage => &mut next.inflation_percentage,
            FormField::CurrentAge => &mut next.current_age,
            FormField::RetirementAge => &mut next.retirement_age,
        };
        *slot = value;
        next
    }

    /// Applies one edit event from a text input identified by `id`.
    pub fn with_input(self, id: &str, raw: &str) -> Result<Self, ConfigError> {
        let field = id.parse::<FormField>()?;
        Ok(self.with(field, parse_field_value(raw)))
    }

    pub fn to_configuration(&self) -> Result<Configuration, ConfigError> {
        let current_age = self.whole(FormField::CurrentAge)?;
        let retirement_age = self.whole(FormField::RetirementAge)?;
        if retirement_age < current_age {
            return Err(ConfigError::RetirementBeforeCurrentAge {
                current_age,
                retirement_age,
            });
        }

        Ok(Configuration {
            salary: self.required(FormField::Salary)?,
            initial_investment: self.optional(FormField::InitialInvestment)?,
            monthly_investment: self.required(FormField::MonthlyInvestment)?,
            monthly_investment_readjustment: self
                .optional(FormField::MonthlyInvestmentReadjustment)?,
            investment_return_percentage: self.optional(FormField::InvestmentReturnPercentage)?,
            taxes_percentage: self.optional(FormField::TaxesPercentage)?,
            inflation_percentage: self.optional(FormField::InflationPercentage)?,
            current_age,
            retirement_age,
        })
    }

    fn required(&self, field: FormField) -> Result<f64, ConfigError> {
        let value = self
            .get(field)
            .ok_or(ConfigError::MissingField(field))?;
        finite(field, value)
    }

    fn optional(&self, field: FormField) -> Result<f64, ConfigError> {
        finite(field, self.get(field).unwrap_or(0.0))
    }

    fn whole(&self, field: FormField) -> Result<i32, ConfigError> {
        let value = self.required(field)?;
        if value.fract() != 0.0 || value.abs() > i32::MAX as f64 {
            return Err(ConfigError::NotWhole(field));
        }
        Ok(value as i32)
    }
}

fn finite(field: FormField, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NotFinite(field))
    }
}
