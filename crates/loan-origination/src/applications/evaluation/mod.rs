mod policy;
mod rules;

pub use policy::{APPROVAL_MESSAGE, REJECTION_MESSAGE};
pub use rules::UnderwritingRule;

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::RuleCatalog;
use super::cost::{self, CostError};
use super::domain::{ApplicationId, LoanApplication, UnknownPropertyType};

/// Stateless evaluator that applies the rule catalog to an application snapshot.
#[derive(Debug, Clone)]
pub struct EvaluationEngine {
    catalog: Arc<RuleCatalog>,
}

impl EvaluationEngine {
    pub fn new(catalog: RuleCatalog) -> Self {
        Self::shared(Arc::new(catalog))
    }

    pub fn shared(catalog: Arc<RuleCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// Runs every underwriting rule in catalog order. Never touches the application status.
    pub fn evaluate(
        &self,
        application: &LoanApplication,
    ) -> Result<EvaluationResult, EvaluationError> {
        let policy = self.catalog.policy_for(application.property_type)?;
        let projected_payment = cost::monthly_payment(&application.loan_terms())?;

        let evaluation_details =
            rules::apply_rules(application, policy, &self.catalog, projected_payment);
        let verdict = policy::decide(&evaluation_details);

        Ok(EvaluationResult {
            application_id: application.id.clone(),
            evaluation_details,
            approved: verdict.approved,
            message: verdict.message.to_string(),
            projected_monthly_payment: projected_payment,
        })
    }
}

/// Outcome of one rule, kept for audits and adverse-action notices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationDetail {
    #[serde(rename = "ruleName")]
    pub rule: UnderwritingRule,
    pub description: String,
    pub passed: bool,
}

/// Query-time projection over an application snapshot; never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub application_id: ApplicationId,
    pub evaluation_details: Vec<EvaluationDetail>,
    pub approved: bool,
    pub message: String,
    pub projected_monthly_payment: Decimal,
}

impl EvaluationResult {
    pub fn detail(&self, rule: UnderwritingRule) -> Option<&EvaluationDetail> {
        self.evaluation_details
            .iter()
            .find(|detail| detail.rule == rule)
    }

    pub fn failed_rules(&self) -> Vec<UnderwritingRule> {
        self.evaluation_details
            .iter()
            .filter(|detail| !detail.passed)
            .map(|detail| detail.rule)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    #[error(transparent)]
    UnknownPropertyType(#[from] UnknownPropertyType),
    #[error(transparent)]
    Cost(#[from] CostError),
}
