mod common;

use common::{dec, dec_field, TestApp};
use serde_json::{json, Value};

#[tokio::test]
async fn create_sale_computes_derived_totals() {
    let app = TestApp::spawn().await;

    let sale = app.create_reference_sale().await;

    assert_eq!(dec_field(&sale, "subtotal"), dec("1300"));
    assert_eq!(dec_field(&sale, "after_discount"), dec("1200"));
    assert_eq!(dec_field(&sale, "gst_amount"), dec("216"));
    assert_eq!(dec_field(&sale, "grand_total"), dec("1416"));
    assert_eq!(dec_field(&sale, "remaining_amount"), dec("1416"));
    assert_eq!(dec_field(&sale, "balance_amount"), dec("1416"));
    assert_eq!(sale["payment_status"], "UNPAID");
    assert_eq!(sale["status"], "PENDING");
    assert_eq!(dec_field(&sale["items"][0], "amount"), dec("1000"));
}

#[tokio::test]
async fn client_supplied_derived_fields_are_ignored() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/sales",
            &json!({
                "client_id": "client-1",
                "items": [{ "item_id": "a", "quantity": "3", "unit_price": "10", "amount": "999" }],
                "grand_total": "1"
            }),
        )
        .await;

    assert_eq!(response.status(), 201);
    let sale: Value = response.json().await.unwrap();
    assert_eq!(dec_field(&sale["items"][0], "amount"), dec("30"));
    assert_eq!(dec_field(&sale, "grand_total"), dec("30"));
}

#[tokio::test]
async fn get_sale_returns_stored_record() {
    let app = TestApp::spawn().await;
    let sale = app.create_reference_sale().await;
    let sale_id = sale["sale_id"].as_str().unwrap();

    let response = app.get(&format!("/sales/{}", sale_id)).await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["sale_id"], sale_id);
    assert_eq!(dec_field(&body, "grand_total"), dec("1416"));
}

#[tokio::test]
async fn get_unknown_sale_returns_404() {
    let app = TestApp::spawn().await;

    let response = app.get("/sales/does-not-exist").await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn partial_then_full_payment_moves_sale_to_completed() {
    let app = TestApp::spawn().await;
    let sale = app.create_reference_sale().await;
    let sale_id = sale["sale_id"].as_str().unwrap();

    let response = app
        .post_json(
            &format!("/sales/{}/payments", sale_id),
            &json!({ "amount": "1415.99", "payment_method": "upi" }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["sale"]["payment_status"], "PARTIALLY_PAID");
    assert_eq!(body["sale"]["status"], "PARTIALLY_PAID");
    assert_eq!(dec_field(&body["sale"], "remaining_amount"), dec("0.01"));
    assert_eq!(dec_field(&body["payment"], "amount"), dec("1415.99"));

    let response = app
        .post_json(
            &format!("/sales/{}/payments", sale_id),
            &json!({ "amount": "0.01", "payment_method": "cash", "payment_date": "2024-04-01" }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["sale"]["payment_status"], "FULLY_PAID");
    assert_eq!(body["sale"]["status"], "COMPLETED");
    assert_eq!(dec_field(&body["sale"], "total_paid"), dec("1416"));
    assert_eq!(dec_field(&body["sale"], "paid_amount"), dec("1416"));
    assert_eq!(dec_field(&body["sale"], "remaining_amount"), dec("0"));

    let response = app.get(&format!("/sales/{}/payments", sale_id)).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn overpayment_clamps_remaining_to_zero() {
    let app = TestApp::spawn().await;
    let sale = app.create_reference_sale().await;
    let sale_id = sale["sale_id"].as_str().unwrap();

    let response = app
        .post_json(
            &format!("/sales/{}/payments", sale_id),
            &json!({ "amount": "2000", "payment_method": "bank_transfer" }),
        )
        .await;

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(dec_field(&body["sale"], "remaining_amount"), dec("0"));
    assert_eq!(body["sale"]["payment_status"], "FULLY_PAID");
}

#[tokio::test]
async fn update_sale_recomputes_totals_and_keeps_payments() {
    let app = TestApp::spawn().await;
    let sale = app.create_reference_sale().await;
    let sale_id = sale["sale_id"].as_str().unwrap();

    app.post_json(
        &format!("/sales/{}/payments", sale_id),
        &json!({ "amount": "500", "payment_method": "cash" }),
    )
    .await;

    let response = app
        .client()
        .put(app.url(&format!("/sales/{}", sale_id)))
        .json(&json!({ "discount": "0", "gst_percentage": "0" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(dec_field(&body, "grand_total"), dec("1300"));
    assert_eq!(dec_field(&body, "total_paid"), dec("500"));
    assert_eq!(dec_field(&body, "remaining_amount"), dec("800"));
    assert_eq!(body["payment_status"], "PARTIALLY_PAID");
}

#[tokio::test]
async fn cancelled_sale_is_sticky() {
    let app = TestApp::spawn().await;
    let sale = app.create_reference_sale().await;
    let sale_id = sale["sale_id"].as_str().unwrap();

    let response = app
        .post_json(&format!("/sales/{}/cancel", sale_id), &json!({}))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "CANCELLED");

    let response = app
        .post_json(
            &format!("/sales/{}/payments", sale_id),
            &json!({ "amount": "10", "payment_method": "cash" }),
        )
        .await;
    assert_eq!(response.status(), 400);

    let response = app
        .client()
        .put(app.url(&format!("/sales/{}", sale_id)))
        .json(&json!({ "discount": "0" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: Value = app
        .get(&format!("/sales/{}", sale_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "CANCELLED");
}

#[tokio::test]
async fn changes_preview_reports_fields_without_saving() {
    let app = TestApp::spawn().await;
    let sale = app.create_reference_sale().await;
    let sale_id = sale["sale_id"].as_str().unwrap();

    let response = app
        .post_json(
            &format!("/sales/{}/changes", sale_id),
            &json!({ "discount": "0" }),
        )
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["has_changes"], true);
    let fields: Vec<&str> = body["changes"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["field"].as_str())
        .collect();
    assert!(fields.contains(&"discount"));
    assert!(fields.contains(&"grand_total"));
    assert!(!fields.contains(&"client_id"));

    let stored: Value = app
        .get(&format!("/sales/{}", sale_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(dec_field(&stored, "discount"), dec("100"));
}

#[tokio::test]
async fn delete_sale_returns_204_then_404() {
    let app = TestApp::spawn().await;
    let sale = app.create_reference_sale().await;
    let sale_id = sale["sale_id"].as_str().unwrap();

    let response = app
        .client()
        .delete(app.url(&format!("/sales/{}", sale_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = app.get(&format!("/sales/{}", sale_id)).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn list_sales_filters_by_client_and_status() {
    let app = TestApp::spawn().await;
    app.create_reference_sale().await;
    app.create_reference_sale().await;
    app.post_json(
        "/sales",
        &json!({
            "client_id": "client-2",
            "items": [{ "item_id": "x", "quantity": "1", "unit_price": "50" }]
        }),
    )
    .await;

    let body: Value = app
        .get("/sales?client_id=client-1")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 2);

    let body: Value = app
        .get("/sales?status=pending&limit=1")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["limit"], 1);

    let response = app.get("/sales?status=shipped").await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn invalid_sale_inputs_are_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/sales",
            &json!({ "client_id": "", "items": [] }),
        )
        .await;
    assert_eq!(response.status(), 422);

    let response = app
        .post_json(
            "/sales",
            &json!({ "client_id": "c", "items": [], "gst_percentage": "150" }),
        )
        .await;
    assert_eq!(response.status(), 400);

    let response = app
        .post_json(
            "/sales",
            &json!({ "client_id": "c", "items": [], "discount": "-1" }),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn empty_sale_has_zero_totals() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json("/sales", &json!({ "client_id": "c", "items": [] }))
        .await;

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(dec_field(&body, "subtotal"), dec("0"));
    assert_eq!(dec_field(&body, "grand_total"), dec("0"));
    assert_eq!(body["payment_status"], "UNPAID");
}

#[tokio::test]
async fn oversized_quantity_is_a_bad_request() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/sales",
            &json!({
                "client_id": "c",
                "items": [{
                    "item_id": "a",
                    "quantity": "79228162514264337593543950335",
                    "unit_price": "2"
                }]
            }),
        )
        .await;
    assert_eq!(response.status(), 400);

    // The server is still serving after the rejection.
    let response = app.get("/health").await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn unknown_payment_method_is_rejected() {
    let app = TestApp::spawn().await;
    let sale = app.create_reference_sale().await;
    let sale_id = sale["sale_id"].as_str().unwrap();

    let response = app
        .post_json(
            &format!("/sales/{}/payments", sale_id),
            &json!({ "amount": "10", "payment_method": "gift-card-7731" }),
        )
        .await;
    assert_eq!(response.status(), 400);

    let body: Value = app
        .get(&format!("/sales/{}/payments", sale_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn concurrent_payments_sum_to_total_paid() {
    let app = TestApp::spawn().await;
    let sale = app.create_reference_sale().await;
    let sale_id = sale["sale_id"].as_str().unwrap().to_string();
    let path = format!("/sales/{}/payments", sale_id);

    let payment_body = json!({ "amount": "1", "payment_method": "cash" });
    let requests = (0..100).map(|_| app.post_json(&path, &payment_body));
    let responses = futures::future::join_all(requests).await;
    let created = responses.iter().filter(|r| r.status() == 201).count();

    let payments: Value = app.get(&path).await.json().await.unwrap();
    assert_eq!(payments["count"], created);

    let stored: Value = app
        .get(&format!("/sales/{}", sale_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(dec_field(&stored, "total_paid"), dec(&created.to_string()));
    assert!(stored["created_utc"].is_string());
}

#[tokio::test]
async fn preview_of_cancelled_sale_is_rejected() {
    let app = TestApp::spawn().await;
    let sale = app.create_reference_sale().await;
    let sale_id = sale["sale_id"].as_str().unwrap();

    app.post_json(&format!("/sales/{}/cancel", sale_id), &json!({}))
        .await;

    let response = app
        .post_json(
            &format!("/sales/{}/changes", sale_id),
            &json!({ "discount": "0" }),
        )
        .await;
    assert_eq!(response.status(), 400);
}
