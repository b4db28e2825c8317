use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cost::LoanTerms;

/// Identifier wrapper for loan applications.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to the applicant's user record, which lives outside the engine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicantId(pub String);

/// Financing category requested by the applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyType {
    FirstHome,
    SecondHome,
    Commercial,
    Renovation,
}

impl PropertyType {
    pub const ALL: [PropertyType; 4] = [
        PropertyType::FirstHome,
        PropertyType::SecondHome,
        PropertyType::Commercial,
        PropertyType::Renovation,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            PropertyType::FirstHome => "FIRST_HOME",
            PropertyType::SecondHome => "SECOND_HOME",
            PropertyType::Commercial => "COMMERCIAL",
            PropertyType::Renovation => "RENOVATION",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            PropertyType::FirstHome => "First home",
            PropertyType::SecondHome => "Second home",
            PropertyType::Commercial => "Commercial property",
            PropertyType::Renovation => "Renovation",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PropertyType {
    type Err = UnknownPropertyType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        PropertyType::ALL
            .into_iter()
            .find(|candidate| candidate.code().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| UnknownPropertyType(value.to_string()))
    }
}

/// Raised when a category code is not one of the financed property types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown property type '{0}'")]
pub struct UnknownPropertyType(pub String);

/// Supporting documents every application must eventually carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKey {
    IncomeProof,
    PropertyAppraisal,
    CreditHistory,
}

impl DocumentKey {
    pub const REQUIRED: [DocumentKey; 3] = [
        DocumentKey::IncomeProof,
        DocumentKey::PropertyAppraisal,
        DocumentKey::CreditHistory,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            DocumentKey::IncomeProof => "incomeProof",
            DocumentKey::PropertyAppraisal => "propertyAppraisal",
            DocumentKey::CreditHistory => "creditHistory",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            DocumentKey::IncomeProof => "Proof of income",
            DocumentKey::PropertyAppraisal => "Property appraisal certificate",
            DocumentKey::CreditHistory => "Credit history report",
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Pointer to an uploaded document. The blob itself is opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReference {
    pub file_name: String,
    pub content_type: String,
    pub storage_key: String,
}

/// Review lifecycle of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    InReview,
    PendingDocuments,
    InEvaluation,
    PreApproved,
    FinalApproval,
    Approved,
    InDisbursement,
    Rejected,
    Cancelled,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 9] = [
        LoanStatus::InReview,
        LoanStatus::PendingDocuments,
        LoanStatus::InEvaluation,
        LoanStatus::PreApproved,
        LoanStatus::FinalApproval,
        LoanStatus::Approved,
        LoanStatus::InDisbursement,
        LoanStatus::Rejected,
        LoanStatus::Cancelled,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            LoanStatus::InReview => "IN_REVIEW",
            LoanStatus::PendingDocuments => "PENDING_DOCUMENTS",
            LoanStatus::InEvaluation => "IN_EVALUATION",
            LoanStatus::PreApproved => "PRE_APPROVED",
            LoanStatus::FinalApproval => "FINAL_APPROVAL",
            LoanStatus::Approved => "APPROVED",
            LoanStatus::InDisbursement => "IN_DISBURSEMENT",
            LoanStatus::Rejected => "REJECTED",
            LoanStatus::Cancelled => "CANCELLED",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            LoanStatus::InReview => "Initial review",
            LoanStatus::PendingDocuments => "Pending documents",
            LoanStatus::InEvaluation => "In evaluation",
            LoanStatus::PreApproved => "Pre-approved",
            LoanStatus::FinalApproval => "Final approval",
            LoanStatus::Approved => "Approved",
            LoanStatus::InDisbursement => "In disbursement",
            LoanStatus::Rejected => "Rejected",
            LoanStatus::Cancelled => "Cancelled",
        }
    }

    /// Customer-facing explanation of what the status means.
    pub const fn description(self) -> &'static str {
        match self {
            LoanStatus::InReview => "Your application is going through its initial review.",
            LoanStatus::PendingDocuments => "Additional documents are required.",
            LoanStatus::InEvaluation => "Your application is being evaluated by our team.",
            LoanStatus::PreApproved => "Your application has been pre-approved.",
            LoanStatus::FinalApproval => "Your application is in final approval.",
            LoanStatus::Approved => "Your application has been approved.",
            LoanStatus::InDisbursement => "The loan disbursement is being processed.",
            LoanStatus::Rejected => "Your application does not meet the requirements.",
            LoanStatus::Cancelled => "The application has been cancelled.",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            LoanStatus::InDisbursement | LoanStatus::Rejected | LoanStatus::Cancelled
        )
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Role of whoever triggers a mutating operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    Applicant,
    Executive,
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorRole::Applicant => f.write_str("applicant"),
            ActorRole::Executive => f.write_str("executive"),
        }
    }
}

/// Identity passed explicitly into lifecycle and repository calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: ActorRole,
}

impl Actor {
    pub fn applicant(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: ActorRole::Applicant,
        }
    }

    pub fn executive(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: ActorRole::Executive,
        }
    }

    pub fn owns(&self, application: &LoanApplication) -> bool {
        self.role == ActorRole::Applicant && self.id == application.applicant.0
    }
}

/// Inbound application data as submitted by the intake form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDraft {
    pub applicant_id: String,
    pub property_type: String,
    pub requested_amount: Decimal,
    pub property_value: Decimal,
    pub monthly_income: Decimal,
    #[serde(default)]
    pub current_debt: Decimal,
    pub term: u32,
    pub interest_rate: Decimal,
    pub employment_years: u32,
    #[serde(default)]
    pub documents: BTreeMap<DocumentKey, DocumentReference>,
}

/// Validated application snapshot owned by the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplication {
    pub id: ApplicationId,
    pub applicant: ApplicantId,
    pub property_type: PropertyType,
    pub requested_amount: Decimal,
    pub property_value: Decimal,
    pub monthly_income: Decimal,
    pub current_debt: Decimal,
    /// Years.
    pub term: u32,
    /// Annual percentage.
    pub interest_rate: Decimal,
    pub employment_years: u32,
    pub documents: BTreeMap<DocumentKey, DocumentReference>,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoanApplication {
    pub fn loan_terms(&self) -> LoanTerms {
        LoanTerms {
            amount: self.requested_amount,
            interest_rate: self.interest_rate,
            term: self.term,
        }
    }

    pub fn missing_documents(&self) -> Vec<DocumentKey> {
        DocumentKey::REQUIRED
            .into_iter()
            .filter(|key| !self.documents.contains_key(key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_type_parses_codes_case_insensitively() {
        assert_eq!(
            "first_home".parse::<PropertyType>(),
            Ok(PropertyType::FirstHome)
        );
        assert_eq!(
            " COMMERCIAL ".parse::<PropertyType>(),
            Ok(PropertyType::Commercial)
        );
        assert_eq!(
            "BEACH_HOUSE".parse::<PropertyType>(),
            Err(UnknownPropertyType("BEACH_HOUSE".to_string()))
        );
    }

    #[test]
    fn only_disbursement_rejection_and_cancellation_are_terminal() {
        let terminal: Vec<LoanStatus> = LoanStatus::ALL
            .into_iter()
            .filter(|status| status.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            vec![
                LoanStatus::InDisbursement,
                LoanStatus::Rejected,
                LoanStatus::Cancelled
            ]
        );
    }

    #[test]
    fn status_codes_match_wire_format() {
        for status in LoanStatus::ALL {
            let encoded = serde_json::to_value(status).expect("status serializes");
            assert_eq!(encoded, serde_json::json!(status.code()));
        }
    }
}
