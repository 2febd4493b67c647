use super::common::*;
use crate::workflows::kyc::case::KycCase;
use crate::workflows::kyc::domain::{DocumentSide, DuplicateCheckResult, UploadOutcome};
use crate::workflows::kyc::review::{upload_reliability, ReviewSummary};
use crate::workflows::kyc::verdict::{FinalStatus, VerdictAggregator};

#[test]
fn summary_reflects_case_and_verdict() {
    let mut case = scored_case(92, 58, Some(84));
    case.record_duplicate_check(DuplicateCheckResult::clear());
    let verdict = VerdictAggregator::default().decide_case(&case);

    let summary = ReviewSummary::build(&case, &verdict);

    let identity = &summary.documents[0];
    assert_eq!(identity.side, DocumentSide::Identity);
    assert_eq!(identity.document_label, "PAN Card");
    assert_eq!(identity.quality_label, "Good");
    assert_eq!(identity.status_label, "Accepted");
    assert_eq!(identity.authenticity, "Authentic");

    let address = &summary.documents[1];
    assert_eq!(address.document_label, "Aadhaar Card");
    assert_eq!(address.status_label, "Low Quality - Manual Review");
    assert_eq!(address.authenticity, "Verification Needed");

    assert_eq!(summary.face_match.label, "High Match - Accepted");
    assert_eq!(summary.upload_reliability, "Upload Successful");
    assert_eq!(summary.duplicate_check, "No duplicate found");
    assert_eq!(summary.verdict.final_status, FinalStatus::ManualReview);
    assert_eq!(summary.verdict.status_label, "Under Manual Review");
    assert_eq!(summary.verdict.action, "Okay");
}

#[test]
fn empty_case_renders_placeholders() {
    let case = KycCase::new();
    let verdict = VerdictAggregator::default().decide_case(&case);

    let summary = ReviewSummary::build(&case, &verdict);

    assert_eq!(summary.documents[0].document_label, "Not selected");
    assert_eq!(summary.documents[0].quality_label, "Not scanned");
    assert_eq!(summary.documents[0].status_label, "Not Scanned");
    assert_eq!(summary.face_match.label, "Face match pending");
    assert_eq!(summary.upload_reliability, "Upload Not Started");
    assert_eq!(summary.duplicate_check, "Not checked");
    assert_eq!(summary.verdict.final_status, FinalStatus::Rejected);
    assert_eq!(summary.verdict.action, "Retry KYC");
}

#[test]
fn upload_reliability_labels() {
    assert_eq!(upload_reliability(UploadOutcome::Success, 1), "Upload Successful");
    assert_eq!(
        upload_reliability(UploadOutcome::Success, 3),
        "Retried and Completed"
    );
    assert_eq!(upload_reliability(UploadOutcome::Failed, 2), "Upload Failed");
    assert_eq!(
        upload_reliability(UploadOutcome::NotStarted, 0),
        "Upload Not Started"
    );
}
