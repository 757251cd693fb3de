//! Backend API client
//!
//! Thin wrapper over a blocking reqwest client. Errors are returned to the
//! caller untouched; deciding what a failure means is the loader's job.

use std::time::Duration;

use serde_json::Value;

use crate::types::{DatacentError, Department, Result};

/// Base URL used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

/// Request timeout used when nothing else is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Raw sales endpoint used for the fallback retry
pub const SALES_FALLBACK_PATH: &str = "/sales";

/// Query parameters for a GET request
pub type Query = [(&'static str, String)];

/// Anything that can GET a JSON document from the backend
pub trait Transport: Send + Sync {
    fn get_json(&self, path: &str, query: &Query) -> Result<Value>;
}

/// Endpoint path serving a department's data
pub fn endpoint(department: Department) -> &'static str {
    match department {
        Department::Sales => "/sales",
        Department::Manufacturing => "/analysis/manufacturing",
        Department::Field => "/field",
        Department::Testing => "/testing",
    }
}

/// Trim whitespace and trailing slashes; assume `http://` when no scheme is given.
/// Blank input falls back to [`DEFAULT_API_URL`].
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_API_URL.to_string();
    }
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Transport for ApiClient {
    fn get_json(&self, path: &str, query: &Query) -> Result<Value> {
        let url = self.url_for(path);
        tracing::debug!(%url, params = query.len(), "GET");

        let response = self.client.get(&url).query(query).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(DatacentError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text()?;
        let value = serde_json::from_str(&body)?;
        Ok(value)
    }
}
