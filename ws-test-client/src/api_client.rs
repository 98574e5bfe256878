use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach health check")?;

        if !response.status().is_success() {
            anyhow::bail!("Health check failed: {}", response.status());
        }
        Ok(())
    }

    pub async fn create_reservation(
        &self,
        user_id: &str,
        num_people: i32,
        special_request: &str,
    ) -> Result<Value> {
        let url = format!("{}/reservations", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "user_id": user_id,
                "reservation_date": "2026-12-24 19:30:00",
                "num_people": num_people,
                "special_request": special_request,
            }))
            .send()
            .await
            .context("Failed to create reservation")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            anyhow::bail!("Failed to create reservation: {} - Response: {}", status, body);
        }

        let api_response: Value = response.json().await.context("Failed to parse response")?;

        // Extract the data from ApiResponse wrapper
        api_response["data"]
            .as_object()
            .context("No data object in response")
            .map(|obj| Value::Object(obj.clone()))
    }
}
