#![allow(dead_code)]

use backoffice_service::config::BackofficeConfig;
use backoffice_service::startup::Application;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    client: reqwest::Client,
}

impl TestApp {
    /// Spawn the service on a random port backed by the in-memory store.
    pub async fn spawn() -> Self {
        let app = Application::build(BackofficeConfig::in_memory())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Create the reference sale: 2 x 500 + 1 x 300, discount 100, GST 18%.
    pub async fn create_reference_sale(&self) -> Value {
        let response = self
            .post_json(
                "/sales",
                &serde_json::json!({
                    "client_id": "client-1",
                    "items": [
                        { "item_id": "item-a", "quantity": "2", "unit_price": "500" },
                        { "item_id": "item-b", "quantity": "1", "unit_price": "300" }
                    ],
                    "discount": "100",
                    "gst_percentage": "18"
                }),
            )
            .await;
        assert_eq!(response.status(), 201);
        response.json().await.expect("Failed to parse sale")
    }
}

/// Read a decimal field that may be serialized as a string or a number.
pub fn dec_field(body: &Value, field: &str) -> Decimal {
    match &body[field] {
        Value::String(s) => Decimal::from_str(s).expect("Invalid decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("Invalid decimal number"),
        other => panic!("Field {} is not a decimal: {:?}", field, other),
    }
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("Invalid decimal literal")
}
