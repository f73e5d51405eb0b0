mod common;

use common::{dec, dec_field, TestApp};
use serde_json::{json, Value};

async fn create_procurement(app: &TestApp, kind: &str, vendor_id: &str) -> Value {
    let response = app
        .post_json(
            "/procurements",
            &json!({
                "kind": kind,
                "vendor_id": vendor_id,
                "items": [
                    { "item_id": "steel", "quantity": "10", "unit_price": "80" },
                    { "item_id": "bolts", "quantity": "100", "unit_price": "2" }
                ],
                "gst_percentage": "5"
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}

#[tokio::test]
async fn create_procurement_computes_totals() {
    let app = TestApp::spawn().await;

    let procurement = create_procurement(&app, "RAW_MATERIAL", "vendor-1").await;

    assert_eq!(dec_field(&procurement, "subtotal"), dec("1000"));
    assert_eq!(dec_field(&procurement, "gst_amount"), dec("50"));
    assert_eq!(dec_field(&procurement, "grand_total"), dec("1050"));
    assert_eq!(procurement["kind"], "RAW_MATERIAL");
    assert!(procurement.get("payment_status").is_none());
}

#[tokio::test]
async fn update_procurement_recomputes_totals() {
    let app = TestApp::spawn().await;
    let procurement = create_procurement(&app, "TRADING_GOOD", "vendor-1").await;
    let id = procurement["procurement_id"].as_str().unwrap();

    let response = app
        .client()
        .put(app.url(&format!("/procurements/{}", id)))
        .json(&json!({
            "items": [{ "item_id": "steel", "quantity": "5", "unit_price": "80" }],
            "gst_percentage": "18"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(dec_field(&body, "subtotal"), dec("400"));
    assert_eq!(dec_field(&body, "gst_amount"), dec("72"));
    assert_eq!(dec_field(&body, "grand_total"), dec("472"));
}

#[tokio::test]
async fn list_procurements_filters_by_kind_and_vendor() {
    let app = TestApp::spawn().await;
    create_procurement(&app, "RAW_MATERIAL", "vendor-1").await;
    create_procurement(&app, "TRADING_GOOD", "vendor-1").await;
    create_procurement(&app, "RAW_MATERIAL", "vendor-2").await;

    let body: Value = app
        .get("/procurements?kind=raw_material")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 2);

    let body: Value = app
        .get("/procurements?vendor_id=vendor-1")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 2);

    let response = app.get("/procurements?kind=services").await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn delete_procurement_removes_it() {
    let app = TestApp::spawn().await;
    let procurement = create_procurement(&app, "RAW_MATERIAL", "vendor-1").await;
    let id = procurement["procurement_id"].as_str().unwrap();

    let response = app
        .client()
        .delete(app.url(&format!("/procurements/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = app.get(&format!("/procurements/{}", id)).await;
    assert_eq!(response.status(), 404);

    let response = app
        .client()
        .delete(app.url(&format!("/procurements/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn unknown_procurement_kind_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/procurements",
            &json!({ "kind": "SERVICES", "vendor_id": "vendor-1", "items": [] }),
        )
        .await;

    assert!(response.status().is_client_error());
}
