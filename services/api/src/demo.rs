use crate::infra::{InMemorySessionRepository, SimulatedScorer};
use clap::Args;
use kyc_onboarding::config::AppConfig;
use kyc_onboarding::error::AppError;
use kyc_onboarding::workflows::kyc::{
    DocumentSide, DocumentType, FinalDecisionPayload, ImagePayload, KycOnboardingService,
    KycServiceError, ReviewSummary, ScorerError, SessionId, UploadOutcome, Verdict,
    VerdictAggregator, VerdictConfig,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Upload retries the demo allows before giving up on the transfer.
const DEMO_UPLOAD_RETRIES: u32 = 5;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the scan retry budget (defaults to the configured policy)
    #[arg(long)]
    pub(crate) max_attempts: Option<u32>,
    /// Send possible duplicates to manual review instead of only flagging them
    #[arg(long)]
    pub(crate) escalate_duplicates: bool,
    /// Print the final review summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DecideArgs {
    /// Path to a final-decision JSON payload
    pub(crate) payload: PathBuf,
    /// Send possible duplicates to manual review instead of only flagging them
    #[arg(long)]
    pub(crate) escalate_duplicates: bool,
}

type DemoService = KycOnboardingService<InMemorySessionRepository, SimulatedScorer>;

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        max_attempts,
        escalate_duplicates,
        json,
    } = args;

    let mut policy = AppConfig::load()?.policy;
    if let Some(max_attempts) = max_attempts.filter(|value| *value > 0) {
        policy.max_attempts = max_attempts;
    }
    policy.escalate_duplicates |= escalate_duplicates;

    let service = KycOnboardingService::new(
        Arc::new(InMemorySessionRepository::default()),
        Arc::new(SimulatedScorer::default()),
        policy,
    );

    println!("KYC onboarding demo (simulated scorers)");
    let session = service.start()?;
    let id = session.session_id;
    println!("- Session {} opened at {}", id, session.stage_label);

    service.select_document(&id, DocumentSide::Identity, DocumentType::Pan)?;
    service.select_document(&id, DocumentSide::Address, DocumentType::Aadhaar)?;
    println!(
        "- Selected {} and {}",
        DocumentType::Pan.label(),
        DocumentType::Aadhaar.label()
    );
    advance(&service, &id)?;

    for side in DocumentSide::ordered() {
        scan_until_accepted(&service, &id, side)?;
    }
    advance(&service, &id)?;

    if !upload_until_complete(&service, &id)? {
        println!("  Upload never completed; the customer cannot continue");
        return Ok(());
    }
    advance(&service, &id)?;

    service.capture_live(&id, demo_image("live-selfie")?)?;
    let view = service.upload_reference_photo(&id, demo_image("reference-photo")?)?;
    match view.face_match_score {
        Some(score) => println!("- Face match scored {score}"),
        None => println!("- Face match pending"),
    }
    advance(&service, &id)?;

    let dedupe = service.check_duplicate(&id)?;
    if let Some(result) = dedupe.session.duplicate_check {
        println!(
            "- Duplicate check: {}",
            if result.duplicate {
                "possible duplicate"
            } else {
                "clear"
            }
        );
    }

    let summary = service.finalize(&id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        render_summary(&summary);
    }

    Ok(())
}

fn advance(service: &DemoService, id: &SessionId) -> Result<(), AppError> {
    let view = service.advance(id)?;
    println!("\nStage {}: {}", view.stage_number, view.stage_label);
    Ok(())
}

fn scan_until_accepted(
    service: &DemoService,
    id: &SessionId,
    side: DocumentSide,
) -> Result<(), AppError> {
    let budget = service.gate().budget();
    for _ in 0..budget.max_attempts {
        let outcome = service.scan_document(id, side, demo_image(&format!("{side}-scan"))?)?;
        let score = match side {
            DocumentSide::Identity => outcome.session.identity_score,
            DocumentSide::Address => outcome.session.address_score,
        };
        let Some(score) = score else { continue };
        println!("- {} scan scored {}", side.label(), score);
        if score.value() >= budget.pass_score {
            return Ok(());
        }
    }
    println!(
        "  {} scan budget spent; result deferred to manual review",
        side.label()
    );
    Ok(())
}

fn upload_until_complete(service: &DemoService, id: &SessionId) -> Result<bool, AppError> {
    for attempt in 1..=DEMO_UPLOAD_RETRIES {
        let outcome = service.upload_documents(id)?;
        let status = outcome.session.upload_status;
        println!("- Upload attempt {attempt}: {}", status.label());
        if status == UploadOutcome::Success {
            return Ok(true);
        }
    }
    Ok(false)
}

fn render_summary(summary: &ReviewSummary) {
    println!("\nReview");
    for document in &summary.documents {
        println!(
            "- {} proof: {} | quality {} | {} | {} | {} attempt(s)",
            document.side.label(),
            document.document_label,
            document.quality_label,
            document.status_label,
            document.authenticity,
            document.attempts
        );
    }
    println!("- Face match: {}", summary.face_match.label);
    println!(
        "- Upload: {} ({} attempt(s))",
        summary.upload_reliability, summary.upload_attempts
    );
    println!("- Duplicate check: {}", summary.duplicate_check);

    let verdict = &summary.verdict;
    println!(
        "\nVerdict: {} (risk {}) -> {}",
        verdict.status_label, verdict.risk_score, verdict.action
    );
    for reason in &verdict.reasons {
        println!("  - {reason}");
    }
}

fn demo_image(tag: &str) -> Result<ImagePayload, AppError> {
    ImagePayload::new(format!("data:image/jpeg;base64,{tag}")).map_err(|err| {
        AppError::Workflow(KycServiceError::Scorer(ScorerError::InvalidResult(
            err.to_string(),
        )))
    })
}

pub(crate) fn run_decide(args: DecideArgs) -> Result<(), AppError> {
    let mut policy = AppConfig::load()?.policy;
    policy.escalate_duplicates |= args.escalate_duplicates;

    let raw = std::fs::read_to_string(&args.payload)?;
    let verdict = decide_payload(&raw, policy)?;

    println!("{} (risk {})", verdict.final_status.label(), verdict.risk_score);
    for reason in &verdict.reasons {
        println!("- {reason}");
    }
    if verdict.duplicate_flagged {
        println!("- duplicate customer flagged");
    }
    Ok(())
}

pub(crate) fn decide_payload(raw: &str, policy: VerdictConfig) -> Result<Verdict, AppError> {
    let payload: FinalDecisionPayload = serde_json::from_str(raw)?;
    VerdictAggregator::new(policy)
        .decide_payload(payload)
        .map_err(|err| AppError::Workflow(KycServiceError::Payload(err)))
}
