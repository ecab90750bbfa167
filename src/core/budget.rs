use std::collections::HashSet;
use std::io::Write;

use tracing::debug;

use super::error::{CoreResult, invalid_input};
use super::types::{BudgetLine, BudgetPlan, TemplateKind};

pub const EMERGENCY_FUND_MONTHS: f64 = 6.0;

const FIFTY_THIRTY_TWENTY: &[(&str, f64)] =
    &[("Needs", 0.50), ("Wants", 0.30), ("Savings", 0.20)];

const BASIC_ESSENTIALS: &[(&str, f64)] = &[
    ("Rent", 0.30),
    ("Groceries", 0.15),
    ("Utilities", 0.10),
    ("Transport", 0.10),
    ("Entertainment", 0.10),
    ("Savings", 0.25),
];

const BLANK_TEMPLATE_CATEGORIES: &[&str] = &[
    "Income",
    "Rent",
    "Groceries",
    "Utilities",
    "Transport",
    "Entertainment",
    "Savings",
];

impl TemplateKind {
    pub fn fractions(self) -> Option<&'static [(&'static str, f64)]> {
        match self {
            TemplateKind::FiftyThirtyTwenty => Some(FIFTY_THIRTY_TWENTY),
            TemplateKind::BasicEssentials => Some(BASIC_ESSENTIALS),
            TemplateKind::Custom => None,
        }
    }
}

impl BudgetPlan {
    pub fn total_allocated(&self) -> f64 {
        self.lines.iter().map(|line| line.amount).sum()
    }

    pub fn remaining(&self) -> f64 {
        self.income - self.total_allocated()
    }

    pub fn amount_for(&self, category: &str) -> Option<f64> {
        self.lines
            .iter()
            .find(|line| line.category == category)
            .map(|line| line.amount)
    }

    /// Share of income in percent; zero when there is no income to divide.
    pub fn share_of_income(&self, line: &BudgetLine) -> f64 {
        if self.income <= 0.0 {
            0.0
        } else {
            line.amount / self.income * 100.0
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, f64)> {
        self.lines
            .iter()
            .map(|line| (line.category.as_str(), line.amount))
    }
}

pub fn allocate(
    income: f64,
    template: TemplateKind,
    custom: Option<&[(String, f64)]>,
) -> CoreResult<BudgetPlan> {
    if !income.is_finite() || income < 0.0 {
        return Err(invalid_input("income must be >= 0"));
    }

    let lines = match template.fractions() {
        Some(fractions) => {
            if custom.is_some() {
                debug!(?template, "ignoring custom categories for fixed template");
            }
            fractions
                .iter()
                .map(|(category, fraction)| BudgetLine {
                    category: (*category).to_string(),
                    amount: income * fraction,
                })
                .collect()
        }
        None => {
            let Some(categories) = custom else {
                return Err(invalid_input("custom template requires categories"));
            };
            custom_lines(categories)?
        }
    };

    Ok(BudgetPlan {
        income,
        template,
        lines,
    })
}

fn custom_lines(categories: &[(String, f64)]) -> CoreResult<Vec<BudgetLine>> {
    let mut seen = HashSet::new();
    let mut lines = Vec::with_capacity(categories.len());
    for (name, amount) in categories {
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid_input("category names must not be empty"));
        }
        if !seen.insert(name.to_string()) {
            return Err(invalid_input(format!("duplicate category '{name}'")));
        }
        if !amount.is_finite() || *amount < 0.0 {
            return Err(invalid_input(format!("amount for '{name}' must be >= 0")));
        }
        lines.push(BudgetLine {
            category: name.to_string(),
            amount: *amount,
        });
    }
    Ok(lines)
}

pub fn blank_template() -> BudgetPlan {
    BudgetPlan {
        income: 0.0,
        template: TemplateKind::Custom,
        lines: BLANK_TEMPLATE_CATEGORIES
            .iter()
            .map(|category| BudgetLine {
                category: (*category).to_string(),
                amount: 0.0,
            })
            .collect(),
    }
}

pub fn emergency_fund(avg_monthly_expenses: f64) -> CoreResult<f64> {
    if !avg_monthly_expenses.is_finite() || avg_monthly_expenses < 0.0 {
        return Err(invalid_input("monthly expenses must be >= 0"));
    }
    Ok(avg_monthly_expenses * EMERGENCY_FUND_MONTHS)
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv flush failed: {0}")]
    Io(#[from] std::io::Error),
}

pub fn write_csv<W: Write>(plan: &BudgetPlan, writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["Category", "Amount"])?;
    for (category, amount) in plan.rows() {
        csv_writer.write_record([category, format_amount(amount).as_str()])?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else {
        format!("{amount:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CoreError;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn fifty_thirty_twenty_splits_income_exactly() {
        let plan = allocate(50_000.0, TemplateKind::FiftyThirtyTwenty, None).expect("valid");
        let names: Vec<&str> = plan.rows().map(|(name, _)| name).collect();
        assert_eq!(names, ["Needs", "Wants", "Savings"]);
        assert_approx(plan.amount_for("Needs").expect("needs"), 25_000.0);
        assert_approx(plan.amount_for("Wants").expect("wants"), 15_000.0);
        assert_approx(plan.amount_for("Savings").expect("savings"), 10_000.0);
        assert_approx(plan.total_allocated(), 50_000.0);
        assert_approx(plan.remaining(), 0.0);
    }

    #[test]
    fn basic_essentials_fractions_sum_to_one() {
        let total: f64 = BASIC_ESSENTIALS.iter().map(|(_, f)| f).sum();
        assert_approx(total, 1.0);

        let plan = allocate(40_000.0, TemplateKind::BasicEssentials, None).expect("valid");
        assert_eq!(plan.lines.len(), 6);
        assert_approx(plan.amount_for("Rent").expect("rent"), 12_000.0);
        assert_approx(plan.amount_for("Savings").expect("savings"), 10_000.0);
        assert_approx(plan.remaining(), 0.0);
    }

    #[test]
    fn custom_amounts_are_echoed_and_overspend_is_surfaced() {
        let categories = vec![
            ("Rent".to_string(), 18_000.0),
            ("Food".to_string(), 9_500.5),
        ];
        let plan = allocate(20_000.0, TemplateKind::Custom, Some(categories.as_slice()))
            .expect("valid");
        assert_eq!(plan.lines[0].category, "Rent");
        assert_approx(plan.lines[1].amount, 9_500.5);
        assert_approx(plan.total_allocated(), 27_500.5);
        assert_approx(plan.remaining(), -7_500.5);
    }

    #[test]
    fn custom_requires_unique_named_categories() {
        let err = allocate(1_000.0, TemplateKind::Custom, None).expect_err("missing categories");
        assert!(matches!(err, CoreError::InvalidInput(_)));

        let dupes = vec![("Rent".to_string(), 1.0), (" Rent ".to_string(), 2.0)];
        let err = allocate(1_000.0, TemplateKind::Custom, Some(dupes.as_slice()))
            .expect_err("duplicate");
        assert!(err.to_string().contains("duplicate"));

        let blank = vec![("  ".to_string(), 1.0)];
        assert!(allocate(1_000.0, TemplateKind::Custom, Some(blank.as_slice())).is_err());

        let negative = vec![("Rent".to_string(), -1.0)];
        assert!(allocate(1_000.0, TemplateKind::Custom, Some(negative.as_slice())).is_err());
    }

    #[test]
    fn fixed_template_ignores_custom_categories() {
        let categories = vec![("Rent".to_string(), 99.0)];
        let plan = allocate(100.0, TemplateKind::FiftyThirtyTwenty, Some(categories.as_slice()))
            .expect("valid");
        assert!(plan.amount_for("Rent").is_none());
        assert_eq!(plan.lines.len(), 3);
    }

    #[test]
    fn rejects_negative_income() {
        assert!(matches!(
            allocate(-1.0, TemplateKind::FiftyThirtyTwenty, None),
            Err(CoreError::InvalidInput(_))
        ));
        assert!(allocate(f64::NAN, TemplateKind::BasicEssentials, None).is_err());
    }

    #[test]
    fn zero_income_shares_are_zero() {
        let plan = allocate(0.0, TemplateKind::FiftyThirtyTwenty, None).expect("valid");
        for line in &plan.lines {
            assert_approx(plan.share_of_income(line), 0.0);
        }

        let plan = allocate(200.0, TemplateKind::FiftyThirtyTwenty, None).expect("valid");
        assert_approx(plan.share_of_income(&plan.lines[1]), 30.0);
    }

    #[test]
    fn emergency_fund_is_six_months() {
        assert_approx(emergency_fund(20_000.0).expect("valid"), 120_000.0);
        assert_approx(emergency_fund(0.0).expect("valid"), 0.0);
        assert!(matches!(
            emergency_fund(-5.0),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn blank_template_lists_download_categories_at_zero() {
        let plan = blank_template();
        let names: Vec<&str> = plan.rows().map(|(name, _)| name).collect();
        assert_eq!(names, BLANK_TEMPLATE_CATEGORIES);
        assert!(plan.rows().all(|(_, amount)| amount == 0.0));
    }

    #[test]
    fn csv_export_writes_header_and_ordered_rows() {
        let categories = vec![
            ("Rent".to_string(), 1_200.0),
            ("Coffee, beans".to_string(), 12.5),
        ];
        let plan = allocate(2_000.0, TemplateKind::Custom, Some(categories.as_slice()))
            .expect("valid");
        let mut out = Vec::new();
        write_csv(&plan, &mut out).expect("csv export");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "Category,Amount\nRent,1200\n\"Coffee, beans\",12.50\n");
    }
}
