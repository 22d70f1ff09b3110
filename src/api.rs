use crate::model::{Event, Pod, Records, ResourceKind, Service, TableData};
use crate::render;
use anyhow::{Context, Result};
use chrono::Local;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The single user-facing error kind: a message fit for the error banner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DisplayError {
    message: String,
}

impl DisplayError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// HTTP client for the aggregation backend serving /pods, /services, and
/// /events. Cheap to clone; refresh cycles carry their own copy.
#[derive(Debug, Clone)]
pub struct BackendGateway {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BackendGateway {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build backend http client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches one collection and converts it into table state. Every
    /// failure mode collapses into a DisplayError; nothing propagates
    /// beyond the loader boundary.
    pub async fn fetch_table(&self, kind: ResourceKind) -> Result<TableData, DisplayError> {
        let records = self.fetch_records(kind).await?;
        debug!("loaded {} {}", records.len(), kind.plural());

        let (headers, rows) = render::table_rows(&records);
        let mut table = TableData::default();
        table.set_rows(headers, rows, records, Local::now());
        Ok(table)
    }

    async fn fetch_records(&self, kind: ResourceKind) -> Result<Records, DisplayError> {
        let url = format!("{}{}", self.base_url, kind.endpoint());
        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.header("Authorization", token);
        }

        let response = request
            .send()
            .await
            .map_err(|error| transport_error(&self.base_url, kind, &error))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| transport_error(&self.base_url, kind, &error))?;

        interpret_payload(kind, status.is_success(), &body)
    }
}

/// Loads the Authorization token the backend expects. A missing file is
/// logged and tolerated; the backend will answer with its own error.
pub fn read_token_file(path: &str) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(raw) => {
            let token = raw.trim().to_string();
            if token.is_empty() { None } else { Some(token) }
        }
        Err(error) => {
            warn!("failed to read token file {path}: {error}");
            None
        }
    }
}

fn transport_error(base_url: &str, kind: ResourceKind, error: &reqwest::Error) -> DisplayError {
    if error.is_timeout() {
        DisplayError::new(format!("request to {} timed out", kind.endpoint()))
    } else if error.is_connect() {
        DisplayError::new(format!("cannot connect to backend at {base_url}"))
    } else {
        DisplayError::new(format!("request to {} failed: {error}", kind.endpoint()))
    }
}

/// Turns a response body into typed records, or into the DisplayError the
/// error banner will show. A non-success status fails regardless of
/// payload shape; an object payload carrying error/detail fails too.
fn interpret_payload(kind: ResourceKind, ok: bool, body: &str) -> Result<Records, DisplayError> {
    let payload: Value = serde_json::from_str(body).map_err(|_| {
        DisplayError::new(format!(
            "failed to parse response from {}: not valid JSON",
            kind.endpoint()
        ))
    })?;

    if !ok || payload.get("error").is_some() || payload.get("detail").is_some() {
        return Err(DisplayError::new(error_message(&payload)));
    }

    let records = match kind {
        ResourceKind::Pods => Records::Pods(parse_records::<Pod>(kind, payload)?),
        ResourceKind::Services => Records::Services(parse_records::<Service>(kind, payload)?),
        ResourceKind::Events => Records::Events(parse_records::<Event>(kind, payload)?),
    };
    Ok(records)
}

fn parse_records<T: serde::de::DeserializeOwned>(
    kind: ResourceKind,
    payload: Value,
) -> Result<Vec<T>, DisplayError> {
    serde_json::from_value(payload).map_err(|error| {
        DisplayError::new(format!(
            "unexpected payload shape from {}: {error}",
            kind.endpoint()
        ))
    })
}

/// Derives the banner message from an error payload, preferring the nested
/// detail message, then a detail string, then an error string, falling
/// back to the serialized payload.
fn error_message(payload: &Value) -> String {
    if let Some(message) = payload
        .get("detail")
        .and_then(|detail| detail.get("message"))
        .and_then(Value::as_str)
    {
        return message.to_string();
    }
    if let Some(detail) = payload.get("detail").and_then(Value::as_str) {
        return detail.to_string();
    }
    if let Some(error) = payload.get("error").and_then(Value::as_str) {
        return error.to_string();
    }
    payload.to_string()
}
