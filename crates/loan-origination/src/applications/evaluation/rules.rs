use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::super::catalog::{CategoryPolicy, RuleCatalog};
use super::super::domain::LoanApplication;
use super::EvaluationDetail;

/// Named underwriting checks, declared in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnderwritingRule {
    DebtToIncome,
    LoanToValue,
    EmploymentTenure,
    DocumentCompleteness,
}

impl UnderwritingRule {
    pub const ORDER: [UnderwritingRule; 4] = [
        UnderwritingRule::DebtToIncome,
        UnderwritingRule::LoanToValue,
        UnderwritingRule::EmploymentTenure,
        UnderwritingRule::DocumentCompleteness,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            UnderwritingRule::DebtToIncome => "Debt-to-income ratio",
            UnderwritingRule::LoanToValue => "Loan-to-value ratio",
            UnderwritingRule::EmploymentTenure => "Employment tenure",
            UnderwritingRule::DocumentCompleteness => "Document completeness",
        }
    }
}

impl fmt::Display for UnderwritingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub(crate) fn apply_rules(
    application: &LoanApplication,
    policy: &CategoryPolicy,
    catalog: &RuleCatalog,
    projected_payment: Decimal,
) -> Vec<EvaluationDetail> {
    UnderwritingRule::ORDER
        .into_iter()
        .map(|rule| match rule {
            UnderwritingRule::DebtToIncome => debt_to_income(
                application,
                projected_payment,
                catalog.debt_to_income_ceiling(),
            ),
            UnderwritingRule::LoanToValue => loan_to_value(application, policy),
            UnderwritingRule::EmploymentTenure => {
                employment_tenure(application, catalog.minimum_employment_years())
            }
            UnderwritingRule::DocumentCompleteness => document_completeness(application, catalog),
        })
        .collect()
}

fn debt_to_income(
    application: &LoanApplication,
    projected_payment: Decimal,
    ceiling: Decimal,
) -> EvaluationDetail {
    if application.monthly_income <= Decimal::ZERO {
        return EvaluationDetail {
            rule: UnderwritingRule::DebtToIncome,
            description: "monthly income must be positive to assess debt-to-income".to_string(),
            passed: false,
        };
    }

    let ratio = application
        .current_debt
        .checked_add(projected_payment)
        .and_then(|obligations| {
            obligations
                .checked_div(application.monthly_income)
                .map(|ratio| (obligations, ratio))
        });

    let (passed, description) = match ratio {
        Some((obligations, ratio)) => {
            let passed = ratio <= ceiling;
            let verb = if passed { "within" } else { "exceeds" };
            (
                passed,
                format!(
                    "debt-to-income ratio {} ({} monthly obligations incl. {} installment) {} ceiling {}",
                    ratio.round_dp(3),
                    obligations,
                    projected_payment,
                    verb,
                    ceiling
                ),
            )
        }
        None => (
            false,
            "monthly obligations exceed the supported numeric range".to_string(),
        ),
    };

    EvaluationDetail {
        rule: UnderwritingRule::DebtToIncome,
        description,
        passed,
    }
}

fn loan_to_value(application: &LoanApplication, policy: &CategoryPolicy) -> EvaluationDetail {
    let ceiling = policy.max_loan_to_value;
    let ratio = application
        .requested_amount
        .checked_div(application.property_value);

    let (passed, description) = match ratio {
        Some(ratio) if application.property_value > Decimal::ZERO => {
            let passed = ratio <= ceiling;
            let verb = if passed { "within" } else { "exceeds" };
            (
                passed,
                format!(
                    "loan-to-value ratio {} {} {} ceiling {}",
                    ratio.round_dp(3),
                    verb,
                    application.property_type,
                    ceiling
                ),
            )
        }
        _ => (
            false,
            "property value must be positive to assess loan-to-value".to_string(),
        ),
    };

    EvaluationDetail {
        rule: UnderwritingRule::LoanToValue,
        description,
        passed,
    }
}

fn employment_tenure(application: &LoanApplication, minimum_years: u32) -> EvaluationDetail {
    let passed = application.employment_years >= minimum_years;
    let description = if passed {
        format!(
            "{} year(s) of employment meets the {minimum_years} year minimum",
            application.employment_years
        )
    } else {
        format!(
            "{} year(s) of employment is below the {minimum_years} year minimum",
            application.employment_years
        )
    };

    EvaluationDetail {
        rule: UnderwritingRule::EmploymentTenure,
        description,
        passed,
    }
}

fn document_completeness(application: &LoanApplication, catalog: &RuleCatalog) -> EvaluationDetail {
    let missing: Vec<&str> = catalog
        .required_documents()
        .iter()
        .filter(|key| !application.documents.contains_key(key))
        .map(|key| key.code())
        .collect();

    let passed = missing.is_empty();
    let description = if passed {
        "all required documents provided".to_string()
    } else {
        format!("missing documents: {}", missing.join(", "))
    };

    EvaluationDetail {
        rule: UnderwritingRule::DocumentCompleteness,
        description,
        passed,
    }
}
