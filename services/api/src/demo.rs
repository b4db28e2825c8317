use crate::infra::{InMemoryApplicationRepository, LoggingNotificationSink};
use clap::Args;
use loan_origination::applications::{
    Actor, ApplicationDraft, DocumentKey, DocumentReference, EvaluationResult,
    LoanApplicationService, LoanStatus, LoanTerms, RuleCatalog, SimulationRequest,
};
use loan_origination::error::AppError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use std::sync::Arc;

type DemoService = LoanApplicationService<InMemoryApplicationRepository, LoggingNotificationSink>;

#[derive(Args, Debug)]
pub(crate) struct SimulateArgs {
    /// Property category (FIRST_HOME, SECOND_HOME, COMMERCIAL, RENOVATION)
    #[arg(long)]
    pub(crate) loan_type: String,
    /// Principal requested
    #[arg(long)]
    pub(crate) amount: Decimal,
    /// Term in years
    #[arg(long)]
    pub(crate) term: u32,
    /// Annual interest rate in percent
    #[arg(long)]
    pub(crate) rate: Decimal,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print the stored application payload after the lifecycle walk.
    #[arg(long)]
    pub(crate) show_payload: bool,
    /// Stop after the evaluation scenarios.
    #[arg(long)]
    pub(crate) skip_lifecycle: bool,
}

pub(crate) fn run_simulation(args: SimulateArgs) -> Result<(), AppError> {
    let (service, _) = demo_service();

    let quote = service.simulate(&SimulationRequest {
        loan_type: args.loan_type,
        amount: args.amount,
        term: args.term,
        interest_rate: args.rate,
    })?;
    let cost = service.calculate_cost(&LoanTerms {
        amount: args.amount,
        interest_rate: args.rate,
        term: args.term,
    })?;

    println!(
        "{} loan of {} over {} years at {}%",
        quote.loan_type.label(),
        args.amount,
        args.term,
        args.rate
    );
    println!("- Monthly payment: {}", quote.monthly_payment);
    println!("- Total cost: {}", cost.total_cost);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        show_payload,
        skip_lifecycle,
    } = args;
    let (service, notifications) = demo_service();
    let executive = Actor::executive("exec-demo");

    println!("Loan origination demo");
    print_catalog(service.catalog());

    println!("\nScenario 1: first home, 80000 of 100000 over 20 years at 4.0%");
    let approved = service.create_application(scenario_draft(dec!(80000)))?;
    println!("- Created {} -> {}", approved.id, approved.status.label());
    let verdict = service.evaluate(&approved.id)?;
    print_evaluation(&verdict);

    println!("\nScenario 2: same profile requesting 95000");
    let stretched = service.create_application(scenario_draft(dec!(95000)))?;
    let verdict = service.evaluate(&stretched.id)?;
    print_evaluation(&verdict);
    service.update_status(&stretched.id, LoanStatus::Rejected, &executive)?;
    println!("- Closed as {}", LoanStatus::Rejected.label());

    if skip_lifecycle {
        return Ok(());
    }

    println!("\nLifecycle walk for {}", approved.id);
    for status in [
        LoanStatus::InEvaluation,
        LoanStatus::PreApproved,
        LoanStatus::FinalApproval,
        LoanStatus::Approved,
        LoanStatus::InDisbursement,
    ] {
        let updated = service.update_status(&approved.id, status, &executive)?;
        println!(
            "- {}: {}",
            updated.status.label(),
            updated.status.description()
        );
    }

    let events = notifications.events();
    println!("\nNotifications dispatched: {}", events.len());
    for event in events {
        println!("  - {} {} -> {}", event.application_id, event.from, event.to);
    }

    if show_payload {
        let record = service.get_record(&approved.id)?;
        match serde_json::to_string_pretty(&record.view()) {
            Ok(json) => println!("\nStored application payload:\n{json}"),
            Err(err) => println!("\nStored application payload unavailable: {err}"),
        }
    }

    Ok(())
}

fn demo_service() -> (DemoService, Arc<LoggingNotificationSink>) {
    let notifications = Arc::new(LoggingNotificationSink::default());
    let service = LoanApplicationService::new(
        Arc::new(InMemoryApplicationRepository::default()),
        notifications.clone(),
        RuleCatalog::standard(),
    );
    (service, notifications)
}

fn scenario_draft(requested_amount: Decimal) -> ApplicationDraft {
    let documents: BTreeMap<DocumentKey, DocumentReference> = DocumentKey::REQUIRED
        .into_iter()
        .map(|key| {
            (
                key,
                DocumentReference {
                    file_name: format!("{}.pdf", key.code()),
                    content_type: "application/pdf".to_string(),
                    storage_key: format!("demo/applicant-1/{}.pdf", key.code()),
                },
            )
        })
        .collect();

    ApplicationDraft {
        applicant_id: "applicant-1".to_string(),
        property_type: "FIRST_HOME".to_string(),
        requested_amount,
        property_value: dec!(100000),
        monthly_income: dec!(2000),
        current_debt: dec!(200),
        term: 20,
        interest_rate: dec!(4.0),
        employment_years: 3,
        documents,
    }
}

fn print_catalog(catalog: &RuleCatalog) {
    println!("Rule catalog");
    for (property_type, policy) in catalog.categories() {
        println!(
            "- {}: rates {} | max LTV {}",
            property_type.label(),
            policy.rate_range,
            policy.max_loan_to_value
        );
    }
    println!(
        "- DTI ceiling {} | minimum employment {} year(s)",
        catalog.debt_to_income_ceiling(),
        catalog.minimum_employment_years()
    );
}

fn print_evaluation(result: &EvaluationResult) {
    println!(
        "- Projected monthly payment: {}",
        result.projected_monthly_payment
    );
    for detail in &result.evaluation_details {
        let mark = if detail.passed { "pass" } else { "FAIL" };
        println!("  [{mark}] {}: {}", detail.rule, detail.description);
    }
    println!(
        "- Verdict: {} ({})",
        if result.approved { "approved" } else { "rejected" },
        result.message
    );
}
