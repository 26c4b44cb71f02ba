use log::{debug, warn};

use super::error::ProjectionError;
use super::rates::Rates;
use super::types::{Configuration, Period, ProjectionOptions};

const MONTHS_PER_YEAR: u32 = 12;

/// Running balances carried from one month to the next and across the
/// retirement boundary.
#[derive(Debug)]
struct Ledger {
    monthly_investment: f64,
    salary: f64,
    total_investment: f64,
    total: f64,
}

impl Ledger {
    fn new(config: &Configuration) -> Self {
        Self {
            monthly_investment: config.monthly_investment,
            salary: config.salary,
            total_investment: 0.0,
            total: 0.0,
        }
    }

    fn can_withdraw(&self) -> bool {
        self.total > self.salary
    }

    fn period(&self, year: i32, month: u32, retired: bool) -> Period {
        Period {
            year,
            month,
            monthly_investment: self.monthly_investment,
            salary: self.salary,
            total_investment: self.total_investment,
            total: self.total,
            retired,
        }
    }
}

/// Runs the accumulation phase followed by the withdrawal phase and returns
/// every simulated month in order.
///
/// The withdrawal phase stops the first time the balance no longer exceeds
/// the inflation-adjusted salary. A run that is still solvent after
/// `options.max_withdrawal_years` is reported as
/// [`ProjectionError::NonConvergent`]; an accumulation phase longer than
/// `options.max_accumulation_years` is refused before any month is simulated.
pub fn project(
    config: &Configuration,
    options: &ProjectionOptions,
) -> Result<Vec<Period>, ProjectionError> {
    let span = config.accumulation_years();
    if span > i64::from(options.max_accumulation_years) {
        return Err(ProjectionError::AccumulationTooLong {
            years: span,
            max_years: options.max_accumulation_years,
        });
    }

    let rates = Rates::from_config(config);
    let mut ledger = Ledger::new(config);
    let mut periods = Vec::with_capacity(span.max(0) as usize * MONTHS_PER_YEAR as usize);

    let start_year = i64::from(options.start_year);
    let end_year = start_year + span;
    run_accumulation(&mut ledger, &rates, start_year, end_year, &mut periods)?;
    debug!(
        "accumulation finished after {} months: total={:.2} invested={:.2}",
        periods.len(),
        ledger.total,
        ledger.total_investment
    );

    let accumulation_months = periods.len();
    run_withdrawal(
        &mut ledger,
        &rates,
        end_year + 1,
        options.max_withdrawal_years,
        &mut periods,
    )?;
    debug!(
        "withdrawal finished after {} months: total={:.2} salary={:.2}",
        periods.len() - accumulation_months,
        ledger.total,
        ledger.salary
    );

    Ok(periods)
}

fn calendar_year(year: i64) -> Result<i32, ProjectionError> {
    i32::try_from(year).map_err(|_| ProjectionError::YearOutOfRange { year })
}

fn run_accumulation(
    ledger: &mut Ledger,
    rates: &Rates,
    start_year: i64,
    end_year: i64,
    periods: &mut Vec<Period>,
) -> Result<(), ProjectionError> {
    for year in start_year..end_year {
        let year = calendar_year(year)?;
        for month in 1..=MONTHS_PER_YEAR {
            ledger.total_investment += ledger.monthly_investment;
            // Contributions land after the month's return is credited.
            ledger.total += rates.monthly_income(ledger.total);
            ledger.total += ledger.monthly_investment;
            periods.push(ledger.period(year, month, false));
        }

        ledger.monthly_investment *= rates.yearly_contribution_growth;
        ledger.salary *= rates.yearly_inflation;
    }

    Ok(())
}

fn run_withdrawal(
    ledger: &mut Ledger,
    rates: &Rates,
    first_year: i64,
    max_years: u32,
    periods: &mut Vec<Period>,
) -> Result<(), ProjectionError> {
    ledger.monthly_investment = 0.0;

    let mut years_run = 0u32;
    while ledger.can_withdraw() {
        if years_run >= max_years {
            warn!(
                "withdrawal phase still solvent after {max_years} years (total={:.2}, salary={:.2})",
                ledger.total, ledger.salary
            );
            return Err(ProjectionError::NonConvergent {
                max_years,
                balance: ledger.total,
                salary: ledger.salary,
            });
        }

        let year = calendar_year(first_year + i64::from(years_run))?;
        for month in 1..=MONTHS_PER_YEAR {
            if !ledger.can_withdraw() {
                break;
            }
            ledger.total -= ledger.salary;
            ledger.total += rates.monthly_income(ledger.total);
            periods.push(ledger.period(year, month, true));
        }

        ledger.salary *= rates.yearly_inflation;
        years_run += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, prop_assume, proptest};

    const EPS: f64 = 1e-6;
    const START_YEAR: i32 = 2024;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_config() -> Configuration {
        Configuration {
            salary: 5_000.0,
            initial_investment: 0.0,
            monthly_investment: 1_000.0,
            monthly_investment_readjustment: 5.0,
            investment_return_percentage: 7.0,
            taxes_percentage: 15.0,
            inflation_percentage: 5.0,
            current_age: 30,
            retirement_age: 65,
        }
    }

    fn options() -> ProjectionOptions {
        ProjectionOptions::starting_in(START_YEAR)
    }

    fn run(config: &Configuration) -> Vec<Period> {
        project(config, &options()).expect("projection should converge")
    }

    fn retirement_index(periods: &[Period]) -> usize {
        periods
            .iter()
            .position(|p| p.retired)
            .unwrap_or(periods.len())
    }

    #[test]
    fn example_plan_accumulates_for_thirty_five_years() {
        let periods = run(&sample_config());
        assert_eq!(retirement_index(&periods), 35 * 12);
        assert_eq!(periods.len(), 521);

        let last_saving = periods[419];
        assert_eq!((last_saving.year, last_saving.month), (2058, 12));
        assert_approx_tol(last_saving.total, 2_639_041.065_634_090_5, 1e-4);

        let first_retired = periods[420];
        assert_eq!((first_retired.year, first_retired.month), (2060, 1));
        assert_approx(first_retired.monthly_investment, 0.0);
        assert_approx(first_retired.salary, 27_580.076_837_961_27);
    }

    #[test]
    fn same_age_retirement_produces_no_rows() {
        let config = sample_config().with_retirement_age(30);
        let periods = run(&config);
        assert!(periods.is_empty());
    }

    #[test]
    fn retirement_before_current_age_skips_accumulation() {
        let config = sample_config().with_current_age(40).with_retirement_age(35);
        assert!(run(&config).is_empty());
    }

    #[test]
    fn zero_return_plan_terminates_below_salary() {
        let config = Configuration {
            salary: 3_000.0,
            initial_investment: 0.0,
            monthly_investment: 1_000.0,
            monthly_investment_readjustment: 0.0,
            investment_return_percentage: 0.0,
            taxes_percentage: 15.0,
            inflation_percentage: 5.0,
            current_age: 30,
            retirement_age: 60,
        };
        let periods = run(&config);
        let last = periods.last().expect("periods");

        assert_eq!(periods.len(), 386);
        assert!(last.retired);
        assert_eq!((last.year, last.month), (2057, 2));
        assert!(last.total <= last.salary);
        assert_approx(last.total_investment, 360_000.0);
    }

    #[test]
    fn oracle_flat_one_year_plan_matches_hand_calculation() {
        let config = Configuration {
            salary: 1_000.0,
            initial_investment: 0.0,
            monthly_investment: 1_000.0,
            monthly_investment_readjustment: 10.0,
            investment_return_percentage: 0.0,
            taxes_percentage: 0.0,
            inflation_percentage: 0.0,
            current_age: 30,
            retirement_age: 31,
        };
        let periods = run(&config);

        assert_eq!(periods.len(), 23);
        for (i, period) in periods.iter().take(12).enumerate() {
            assert_eq!(period.year, START_YEAR);
            assert_eq!(period.month, i as u32 + 1);
            assert_approx(period.total, 1_000.0 * (i as f64 + 1.0));
        }

        // The calendar year right after the last contribution is skipped.
        let withdrawals = &periods[12..];
        assert!(withdrawals.iter().all(|p| p.year == START_YEAR + 2));
        assert_approx(withdrawals[0].total, 11_000.0);
        assert_approx(withdrawals[10].total, 1_000.0);
        assert_approx(withdrawals[10].total_investment, 12_000.0);
    }

    #[test]
    fn oracle_compound_growth_matches_hand_calculation() {
        let config = Configuration {
            salary: 2_000.0,
            initial_investment: 0.0,
            monthly_investment: 1_500.0,
            monthly_investment_readjustment: 2.0,
            investment_return_percentage: 6.0,
            taxes_percentage: 10.0,
            inflation_percentage: 3.0,
            current_age: 50,
            retirement_age: 52,
        };
        let periods = run(&config);

        assert_eq!(periods.len(), 42);
        assert_approx(periods[23].monthly_investment, 1_530.0);
        assert_approx(periods[23].salary, 2_060.0);
        assert_approx(periods[23].total_investment, 36_360.0);
        assert_approx(periods[23].total, 38_242.080_091_535_38);

        assert_approx(periods[24].salary, 2_121.8);
        assert_approx(periods[24].total, 36_278.515_652_337_29);

        let last = periods[41];
        assert_eq!((last.year, last.month), (2028, 6));
        assert_approx(last.salary, 2_185.454);
        assert_approx(last.total, 1_162.734_079_604_933_2);
    }

    #[test]
    fn initial_investment_does_not_seed_balance() {
        let base = sample_config();
        let seeded = base.with_initial_investment(250_000.0);
        assert_eq!(run(&base), run(&seeded));
    }

    #[test]
    fn sustainable_plan_reports_non_convergence() {
        let config = Configuration {
            salary: 100.0,
            initial_investment: 0.0,
            monthly_investment: 1_000.0,
            monthly_investment_readjustment: 0.0,
            investment_return_percentage: 12.0,
            taxes_percentage: 20.0,
            inflation_percentage: 0.0,
            current_age: 40,
            retirement_age: 42,
        };
        let err = project(&config, &options()).expect_err("must hit the withdrawal cap");
        let ProjectionError::NonConvergent {
            max_years,
            balance,
            salary,
        } = err.clone()
        else {
            panic!("expected non-convergence, got {err:?}");
        };
        assert_eq!(max_years, options().max_withdrawal_years);
        assert!(balance > salary);
    }

    #[test]
    fn withdrawal_cap_is_configurable() {
        let mut opts = options();
        opts.max_withdrawal_years = 0;
        let err = project(&sample_config(), &opts).expect_err("cap of zero years");
        assert!(matches!(
            err,
            ProjectionError::NonConvergent { max_years: 0, .. }
        ));
    }

    #[test]
    fn accumulation_longer_than_cap_is_refused() {
        let config = sample_config()
            .with_current_age(0)
            .with_retirement_age(100_000_000);
        let err = project(&config, &options()).expect_err("span far beyond the cap");
        assert_eq!(
            err,
            ProjectionError::AccumulationTooLong {
                years: 100_000_000,
                max_years: options().max_accumulation_years,
            }
        );

        let mut opts = options();
        opts.max_accumulation_years = 35;
        let periods = project(&sample_config(), &opts).expect("span equal to the cap");
        assert_eq!(retirement_index(&periods), 35 * 12);
    }

    #[test]
    fn extreme_ages_do_not_overflow() {
        let config = sample_config()
            .with_current_age(-2_000_000_000)
            .with_retirement_age(2_000_000_000);
        assert!(matches!(
            project(&config, &options()),
            Err(ProjectionError::AccumulationTooLong { years: 4_000_000_000, .. })
        ));

        let inverted = sample_config()
            .with_current_age(i32::MAX)
            .with_retirement_age(i32::MIN);
        let periods = project(&inverted, &options()).expect("nothing to simulate");
        assert!(periods.is_empty());
    }

    #[test]
    fn last_calendar_year_without_rows_is_accepted() {
        let config = sample_config().with_retirement_age(30);
        let periods = project(&config, &ProjectionOptions::starting_in(i32::MAX))
            .expect("no month needs a year past i32::MAX");
        assert!(periods.is_empty());
    }

    #[test]
    fn rows_past_the_last_calendar_year_are_refused() {
        let config = sample_config().with_retirement_age(31);
        let err = project(&config, &ProjectionOptions::starting_in(i32::MAX))
            .expect_err("first withdrawal year is out of range");
        assert_eq!(
            err,
            ProjectionError::YearOutOfRange {
                year: i64::from(i32::MAX) + 2
            }
        );
    }

    #[test]
    fn reruns_are_identical() {
        let config = sample_config();
        assert_eq!(run(&config), run(&config));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_projection_invariants_hold(
            salary in 500u32..20_000,
            monthly_investment in 0u32..10_000,
            readjustment_bp in 0i32..1_000,
            return_bp in -500i32..1_000,
            taxes_bp in 0u32..5_000,
            inflation_bp in 0u32..1_000,
            current_age in 18i32..70,
            span in 0i32..45,
        ) {
            let config = Configuration {
                salary: salary as f64,
                initial_investment: 0.0,
                monthly_investment: monthly_investment as f64,
                monthly_investment_readjustment: readjustment_bp as f64 / 100.0,
                investment_return_percentage: return_bp as f64 / 100.0,
                taxes_percentage: taxes_bp as f64 / 100.0,
                inflation_percentage: inflation_bp as f64 / 100.0,
                current_age,
                retirement_age: current_age + span,
            };

            let outcome = project(&config, &options());
            prop_assume!(!matches!(outcome, Err(ProjectionError::NonConvergent { .. })));
            let periods = outcome.expect("only non-convergence is expected to fail");

            let split = retirement_index(&periods);
            prop_assert_eq!(split, span as usize * 12);
            prop_assert!(periods[split..].iter().all(|p| p.retired));

            let mut invested = 0.0_f64;
            for (i, period) in periods[..split].iter().enumerate() {
                invested += period.monthly_investment;
                prop_assert!((period.total_investment - invested).abs() <= 1e-6 * invested.max(1.0));
                prop_assert_eq!(period.month, (i % 12) as u32 + 1);
                if i % 12 != 0 {
                    let previous = periods[i - 1];
                    prop_assert_eq!(period.monthly_investment, previous.monthly_investment);
                    prop_assert_eq!(period.salary, previous.salary);
                }
            }

            for pair in periods[split..].windows(2) {
                prop_assert_eq!(pair[0].total_investment, pair[1].total_investment);
                prop_assert_eq!(pair[1].monthly_investment, 0.0);
                if pair[0].year == pair[1].year {
                    prop_assert_eq!(pair[0].salary, pair[1].salary);
                    prop_assert_eq!(pair[1].month, pair[0].month + 1);
                }
            }

            // Every withdrawal was made from a balance above that month's salary,
            // and the run stopped only once the balance stopped covering it.
            if let Some(last) = periods[split..].last() {
                let inflation = 1.0 + config.inflation_percentage / 100.0;
                let next_salary = if last.month == 12 { last.salary * inflation } else { last.salary };
                prop_assert!(last.total <= next_salary);
            }
        }
    }
}
