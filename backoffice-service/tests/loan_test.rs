mod common;

use common::{dec, dec_field, TestApp};
use serde_json::{json, Value};

async fn create_loan(app: &TestApp, principal: &str) -> Value {
    let response = app
        .post_json(
            "/loans",
            &json!({
                "lender_name": "State Bank",
                "principal": principal,
                "interest_rate": "9.5",
                "emi": "2500",
                "start_date": "2024-01-15"
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}

#[tokio::test]
async fn new_loan_is_active_with_full_outstanding() {
    let app = TestApp::spawn().await;

    let loan = create_loan(&app, "100000").await;

    assert_eq!(dec_field(&loan, "outstanding_amount"), dec("100000"));
    assert_eq!(dec_field(&loan, "total_principal_paid"), dec("0"));
    assert_eq!(loan["status"], "ACTIVE");
}

#[tokio::test]
async fn loan_payment_reduces_outstanding() {
    let app = TestApp::spawn().await;
    let loan = create_loan(&app, "100000").await;
    let loan_id = loan["loan_id"].as_str().unwrap();

    let response = app
        .post_json(
            &format!("/loans/{}/payments", loan_id),
            &json!({
                "interest_amount": "791.67",
                "principal_amount": "1708.33",
                "payment_date": "2024-02-15"
            }),
        )
        .await;

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(dec_field(&body["loan"], "outstanding_amount"), dec("98291.67"));
    assert_eq!(dec_field(&body["loan"], "total_interest_paid"), dec("791.67"));
    assert_eq!(body["loan"]["status"], "ACTIVE");

    let body: Value = app
        .get(&format!("/loans/{}/payments", loan_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn repaid_loan_closes_and_rejects_payments() {
    let app = TestApp::spawn().await;
    let loan = create_loan(&app, "1000").await;
    let loan_id = loan["loan_id"].as_str().unwrap();

    let response = app
        .post_json(
            &format!("/loans/{}/payments", loan_id),
            &json!({ "interest_amount": "10", "principal_amount": "1000" }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["loan"]["status"], "CLOSED");
    assert_eq!(dec_field(&body["loan"], "outstanding_amount"), dec("0"));

    let response = app
        .post_json(
            &format!("/loans/{}/payments", loan_id),
            &json!({ "interest_amount": "1" }),
        )
        .await;
    assert_eq!(response.status(), 400);

    let body: Value = app.get("/loans?status=closed").await.json().await.unwrap();
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn empty_loan_payment_is_rejected() {
    let app = TestApp::spawn().await;
    let loan = create_loan(&app, "1000").await;
    let loan_id = loan["loan_id"].as_str().unwrap();

    let response = app
        .post_json(&format!("/loans/{}/payments", loan_id), &json!({}))
        .await;

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn payment_on_unknown_loan_returns_404() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/loans/missing/payments",
            &json!({ "principal_amount": "10" }),
        )
        .await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn oversized_loan_amounts_are_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/loans",
            &json!({ "lender_name": "State Bank", "principal": "79228162514264337593543950335" }),
        )
        .await;
    assert_eq!(response.status(), 400);

    let loan = create_loan(&app, "1000").await;
    let loan_id = loan["loan_id"].as_str().unwrap();
    let response = app
        .post_json(
            &format!("/loans/{}/payments", loan_id),
            &json!({ "principal_amount": "79228162514264337593543950335" }),
        )
        .await;
    assert_eq!(response.status(), 400);
}
