//! Baserow REST client.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::RowStore;
use crate::config::{StoreConfig, LIST_PAGE_SIZE, REQUEST_TIMEOUT_SECS};
use crate::error::{MeasureError, Result};
use crate::model::{MeasurementDraft, MeasurementPatch, MeasurementRecord};

/// One page of a row listing.
#[derive(Debug, Deserialize)]
struct RowPage {
    #[serde(default)]
    next: Option<String>,
    results: Vec<MeasurementRecord>,
}

/// Create and update bodies carry the columns under `fields`.
#[derive(Debug, Serialize)]
struct FieldsPayload<'a, T> {
    fields: &'a T,
}

/// Row store backed by a Baserow table.
#[derive(Debug, Clone)]
pub struct BaserowStore {
    client: Client,
    config: StoreConfig,
}

impl BaserowStore {
    /// Create a client for the configured table.
    pub fn new(config: StoreConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&format!("Token {}", config.token)).map_err(|_| {
            MeasureError::InvalidSetting {
                name: crate::config::ENV_TOKEN.to_string(),
                value: "<token with invalid characters>".to_string(),
            }
        })?;
        headers.insert(AUTHORIZATION, token);

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// First page of the row listing.
    fn list_url(&self) -> String {
        format!(
            "{}?user_field_names=true&size={}",
            self.config.rows_url(),
            LIST_PAGE_SIZE
        )
    }

    /// Create endpoint.
    fn create_url(&self) -> String {
        format!("{}?user_field_names=true", self.config.rows_url())
    }

    /// Single-row endpoint.
    fn row_url(&self, id: u64) -> String {
        format!("{}{}/?user_field_names=true", self.config.rows_url(), id)
    }

    /// Send a request and return the response if it succeeded.
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Baserow returned {}: {}", status, body);
            return Err(MeasureError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Send a request and decode its JSON body.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl RowStore for BaserowStore {
    async fn list(&self) -> Result<Vec<MeasurementRecord>> {
        let mut rows = Vec::new();
        let mut url = Some(self.list_url());

        while let Some(page_url) = url {
            debug!("GET {}", page_url);
            let page: RowPage = self.send_json(self.client.get(&page_url)).await?;
            rows.extend(page.results);
            url = page.next;
        }

        debug!("Listed {} row(s)", rows.len());
        Ok(rows)
    }

    async fn create(&self, draft: &MeasurementDraft) -> Result<MeasurementRecord> {
        let url = self.create_url();
        debug!("POST {}", url);
        let body = FieldsPayload { fields: draft };
        self.send_json(self.client.post(&url).json(&body)).await
    }

    async fn update(&self, id: u64, patch: &MeasurementPatch) -> Result<MeasurementRecord> {
        let url = self.row_url(id);
        debug!("PATCH {}", url);
        let body = FieldsPayload { fields: patch };
        self.send_json(self.client.patch(&url).json(&body)).await
    }

    async fn delete(&self, id: u64) -> Result<()> {
        let url = self.row_url(id);
        debug!("DELETE {}", url);
        self.send(self.client.delete(&url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MeasurementData;
    use serde_json::json;

    fn store() -> BaserowStore {
        BaserowStore::new(StoreConfig::new("https://rows.example.com/", "secret", 314))
            .expect("Should build client")
    }

    #[test]
    fn test_urls() {
        let store = store();
        assert_eq!(
            store.list_url(),
            "https://rows.example.com/api/database/rows/table/314/?user_field_names=true&size=200"
        );
        assert_eq!(
            store.row_url(9),
            "https://rows.example.com/api/database/rows/table/314/9/?user_field_names=true"
        );
    }

    #[test]
    fn test_rejects_token_with_newline() {
        let result = BaserowStore::new(StoreConfig::new("https://x", "bad\ntoken", 1));
        assert!(matches!(result, Err(MeasureError::InvalidSetting { .. })));
    }

    #[test]
    fn test_payload_wraps_fields() {
        let patch = MeasurementPatch::default().with_contact("555-0199");
        let body = serde_json::to_value(FieldsPayload { fields: &patch }).unwrap();
        assert_eq!(body, json!({"fields": {"Contact": "555-0199"}}));

        let draft = MeasurementDraft::new(MeasurementData::new("Lee", "Den"));
        let body = serde_json::to_value(FieldsPayload { fields: &draft }).unwrap();
        assert_eq!(body["fields"]["Customer_Name"], json!("Lee"));
    }

    #[test]
    fn test_decode_page() {
        let page: RowPage = serde_json::from_value(json!({
            "count": 2,
            "next": "https://rows.example.com/api/database/rows/table/314/?page=2",
            "previous": null,
            "results": [
                {"id": 1, "Customer_Name": "Lee"},
                {"id": 2, "Customer_Name": "Ng", "Width_Cm": "80.00"}
            ]
        }))
        .unwrap();
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[1].geometry.avg_width, 80.0);
        assert!(page.next.is_some());
    }
}
