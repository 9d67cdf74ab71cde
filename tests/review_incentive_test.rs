// ABOUTME: Integration tests for the review incentive flow
// ABOUTME: One review and one discount code per purchase; duplicates conflict and mint nothing

mod common;

use common::{create_test_database, create_test_review_service, seed_order, RecordingMailer};
use planport::errors::ErrorCode;
use planport::notifications::EmailTemplate;
use planport::reviews::SubmitReviewRequest;

fn request(transaction_id: &str) -> SubmitReviewRequest {
    SubmitReviewRequest {
        transaction_id: transaction_id.into(),
        rating: 5,
        title: "Great coverage".into(),
        body: "Worked across three countries without a hitch.".into(),
    }
}

#[tokio::test]
async fn test_review_mints_code_and_sends_thank_you() -> anyhow::Result<()> {
    let database = create_test_database().await?;
    seed_order(&database, "txn_1", "buyer@example.com").await?;
    let mailer = RecordingMailer::new();
    let service = create_test_review_service(database.clone(), mailer.clone());

    let incentive = service.submit_review(request("txn_1")).await?;

    assert_eq!(incentive.discount_percent_off, 15);
    assert!(incentive.discount_code.starts_with("SAVE15-"));

    let code = database
        .get_discount_code(&incentive.discount_code)
        .await?
        .ok_or_else(|| anyhow::anyhow!("code row missing"))?;
    assert_eq!(
        code.created_for_transaction_id.as_deref(),
        Some("txn_1")
    );
    assert_eq!(code.created_for_email.as_deref(), Some("buyer@example.com"));
    assert!(code.expires_at.is_some());
    assert!(code.redeemed_at.is_none());

    let review = database
        .get_review_by_transaction("txn_1")
        .await?
        .ok_or_else(|| anyhow::anyhow!("review row missing"))?;
    assert_eq!(review.rating, 5);
    assert_eq!(review.email, "buyer@example.com");

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].template, EmailTemplate::ReviewThankYou);
    assert_eq!(sent[0].to, "buyer@example.com");
    assert_eq!(
        sent[0].variables["discount_code"],
        incentive.discount_code.as_str()
    );
    Ok(())
}

#[tokio::test]
async fn test_duplicate_review_conflicts_and_mints_no_second_code() -> anyhow::Result<()> {
    let database = create_test_database().await?;
    seed_order(&database, "txn_1", "buyer@example.com").await?;
    let mailer = RecordingMailer::new();
    let service = create_test_review_service(database.clone(), mailer.clone());

    let first = service.submit_review(request("txn_1")).await?;

    let err = service
        .submit_review(request("txn_1"))
        .await
        .expect_err("duplicate review must conflict");
    assert_eq!(err.code, ErrorCode::Conflict);

    // Still exactly one code for the transaction, and only one thank-you sent
    let minted = database
        .get_discount_code_for_transaction("txn_1")
        .await?
        .ok_or_else(|| anyhow::anyhow!("code row missing"))?;
    assert_eq!(minted.code, first.discount_code);
    assert_eq!(mailer.sent().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_review_for_unknown_transaction_is_not_found() -> anyhow::Result<()> {
    let database = create_test_database().await?;
    let mailer = RecordingMailer::new();
    let service = create_test_review_service(database.clone(), mailer.clone());

    let err = service
        .submit_review(request("txn_missing"))
        .await
        .expect_err("review without a purchase must fail");
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    assert!(mailer.sent().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_invalid_rating_rejected_before_any_write() -> anyhow::Result<()> {
    let database = create_test_database().await?;
    seed_order(&database, "txn_1", "buyer@example.com").await?;
    let mailer = RecordingMailer::new();
    let service = create_test_review_service(database.clone(), mailer.clone());

    let mut bad = request("txn_1");
    bad.rating = 6;
    let err = service
        .submit_review(bad)
        .await
        .expect_err("out-of-range rating must fail");
    assert_eq!(err.code, ErrorCode::ValueOutOfRange);

    assert!(database.get_review_by_transaction("txn_1").await?.is_none());
    assert!(database
        .get_discount_code_for_transaction("txn_1")
        .await?
        .is_none());
    Ok(())
}

#[tokio::test]
async fn test_thank_you_send_failure_still_returns_code() -> anyhow::Result<()> {
    let database = create_test_database().await?;
    seed_order(&database, "txn_1", "buyer@example.com").await?;
    let mailer = RecordingMailer::new();
    mailer.fail_all_sends();
    let service = create_test_review_service(database.clone(), mailer);

    let incentive = service.submit_review(request("txn_1")).await?;

    // The code is committed and returned even though the email never left
    let minted = database
        .get_discount_code(&incentive.discount_code)
        .await?;
    assert!(minted.is_some());
    Ok(())
}
