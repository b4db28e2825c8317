use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::catalog::{RuleCatalog, MAX_TERM_YEARS, MIN_TERM_YEARS};
use super::domain::{
    ApplicantId, ApplicationDraft, ApplicationId, DocumentKey, DocumentReference,
    LoanApplication, LoanStatus, PropertyType, UnknownPropertyType,
};

/// Field-level problem found while validating inbound data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every violation found in one pass over the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("invalid input: {}", summarize(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation::new(field, message)],
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.violations
            .iter()
            .any(|violation| violation.field == field)
    }
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error(transparent)]
    UnknownPropertyType(#[from] UnknownPropertyType),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Guard responsible for turning drafts into `LoanApplication` snapshots.
#[derive(Debug, Clone)]
pub struct IntakeGuard {
    catalog: Arc<RuleCatalog>,
}

impl IntakeGuard {
    pub fn new(catalog: Arc<RuleCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// Validate a draft and build the initial `InReview` snapshot.
    pub fn application_from_draft(
        &self,
        draft: ApplicationDraft,
        id: ApplicationId,
        now: DateTime<Utc>,
    ) -> Result<LoanApplication, IntakeError> {
        let property_type: PropertyType = draft.property_type.parse()?;
        let rate_range = self.catalog.range_for(property_type)?;

        let mut violations = Vec::new();

        if draft.applicant_id.trim().is_empty() {
            violations.push(FieldViolation::new("applicantId", "applicant is required"));
        }
        require_positive(&mut violations, "requestedAmount", draft.requested_amount);
        require_positive(&mut violations, "propertyValue", draft.property_value);
        require_positive(&mut violations, "monthlyIncome", draft.monthly_income);
        if draft.current_debt < Decimal::ZERO {
            violations.push(FieldViolation::new(
                "currentDebt",
                "must not be negative",
            ));
        }
        if draft.property_value > Decimal::ZERO && draft.requested_amount > draft.property_value {
            violations.push(FieldViolation::new(
                "requestedAmount",
                "must not exceed the property value",
            ));
        }
        if !(MIN_TERM_YEARS..=MAX_TERM_YEARS).contains(&draft.term) {
            violations.push(FieldViolation::new(
                "term",
                format!("must be between {MIN_TERM_YEARS} and {MAX_TERM_YEARS} years"),
            ));
        }
        if !rate_range.contains(draft.interest_rate) {
            violations.push(FieldViolation::new(
                "interestRate",
                format!("must be within {rate_range} for {property_type}"),
            ));
        }
        for (key, reference) in &draft.documents {
            violations.extend(document_violations(*key, reference));
        }

        if !violations.is_empty() {
            return Err(ValidationError { violations }.into());
        }

        Ok(LoanApplication {
            id,
            applicant: ApplicantId(draft.applicant_id.trim().to_string()),
            property_type,
            requested_amount: draft.requested_amount,
            property_value: draft.property_value,
            monthly_income: draft.monthly_income,
            current_debt: draft.current_debt,
            term: draft.term,
            interest_rate: draft.interest_rate,
            employment_years: draft.employment_years,
            documents: draft.documents,
            status: LoanStatus::InReview,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rate check used by the simulator, which has no full application to validate.
    pub fn check_rate(
        &self,
        property_type: PropertyType,
        interest_rate: Decimal,
    ) -> Result<(), IntakeError> {
        let range = self.catalog.range_for(property_type)?;
        if range.contains(interest_rate) {
            Ok(())
        } else {
            Err(ValidationError::single(
                "interestRate",
                format!("must be within {range} for {property_type}"),
            )
            .into())
        }
    }
}

pub fn document_violations(key: DocumentKey, reference: &DocumentReference) -> Vec<FieldViolation> {
    let mut violations = Vec::new();
    let field = format!("documents.{}", key.code());

    if reference.file_name.trim().is_empty() {
        violations.push(FieldViolation::new(
            format!("{field}.fileName"),
            "file name is required",
        ));
    }
    if reference.storage_key.trim().is_empty() {
        violations.push(FieldViolation::new(
            format!("{field}.storageKey"),
            "storage key is required",
        ));
    }

    violations
}

fn require_positive(violations: &mut Vec<FieldViolation>, field: &str, value: Decimal) {
    if value <= Decimal::ZERO {
        violations.push(FieldViolation::new(field, "must be greater than zero"));
    }
}
