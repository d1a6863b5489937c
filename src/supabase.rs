// Supabase REST plumbing
// Thin client over the PostgREST interface; shared by the catalog
// fetcher and the lead store.

use crate::config::AppConfig;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors surfaced by the hosted data store.
///
/// `Upstream` carries the store's own message verbatim so callers can
/// embed it in user-visible responses unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Required Supabase credentials are absent from the configuration.
    #[error("Supabase credentials are not configured.")]
    Configuration,

    /// The store failed or rejected a read; message is the store's own.
    #[error("{0}")]
    Upstream(String),

    /// The store answered with a body that does not match the expected shape.
    #[error("unexpected response from Supabase: {0}")]
    InvalidResponse(String),

    /// Client-side failure unrelated to the store itself.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Authenticated client for a Supabase project's REST interface.
#[derive(Clone)]
pub struct SupabaseRest {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseRest {
    /// Build a client from configuration. Fails with
    /// [`StoreError::Configuration`] when credentials are absent.
    pub fn new(config: &AppConfig) -> Result<Self, StoreError> {
        let supabase = config.supabase.as_ref().ok_or(StoreError::Configuration)?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        Ok(SupabaseRest {
            client,
            base_url: supabase.url.trim_end_matches('/').to_string(),
            anon_key: supabase.anon_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Start a GET request against a table, with auth headers applied.
    pub fn get(&self, table: &str) -> RequestBuilder {
        self.client
            .get(self.table_url(table))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    /// Start a POST request against a table, with auth headers applied.
    pub fn post(&self, table: &str) -> RequestBuilder {
        self.client
            .post(self.table_url(table))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    /// Send a request and deserialize the JSON row array it returns.
    ///
    /// Non-2xx answers become [`StoreError::Upstream`] with the store's
    /// message extracted from the PostgREST error body.
    pub async fn send_rows<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Vec<T>, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Upstream(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Upstream(e.to_string()))?;

        if !status.is_success() {
            debug!(%status, "store request failed");
            return Err(StoreError::Upstream(upstream_message(status, &body)));
        }

        serde_json::from_str(&body)
            .map_err(|e| StoreError::InvalidResponse(format!("status {status}: {e}")))
    }
}

/// Pull the human-readable message out of a PostgREST error body,
/// falling back to the raw body or the status line.
fn upstream_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct PostgrestError {
        message: String,
    }

    if let Ok(err) = serde_json::from_str::<PostgrestError>(body) {
        return err.message;
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("store returned {status}")
    } else {
        trimmed.to_string()
    }
}
