//! Client for the remote diary API.
//!
//! | Operation | Route |
//! |---|---|
//! | create diary | `POST /api/init` |
//! | append entry | `POST /api/log` |
//! | remove entry | `DELETE /api/rm/<id>/` |
//! | list entries | `GET /api/list` |
//! | verify key | `GET /api/verify` |
//! | wipe diary | `DELETE /api/wipe` |

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::entry::Entry;
use crate::error::{DiaryError, DiaryResult};
use crate::transport::{ApiRequest, ApiResponse, Method, Transport};

/// Result of a key verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Key is valid; the server's name for the diary
    Valid { diaryname: String },
    Invalid,
}

#[derive(Debug, Deserialize)]
struct InitResponse {
    key: String,
}

#[derive(Debug, Deserialize)]
struct WireEntry {
    id: u64,
    text: String,
    date: DateTime<Utc>,
}

impl From<WireEntry> for Entry {
    fn from(wire: WireEntry) -> Self {
        Entry::new(wire.id, wire.text, wire.date)
    }
}

/// Diary API client bound to one server.
#[derive(Clone)]
pub struct RemoteClient {
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for RemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn call(&self, request: ApiRequest) -> DiaryResult<ApiResponse> {
        debug!(
            base_url = %self.base_url,
            method = request.method.as_str(),
            path = %request.path,
            "diary API call"
        );
        Ok(self.transport.send(&self.base_url, &request)?)
    }

    /// Register a new diary with the server and return its key.
    pub fn init(&self, diaryname: &str, username: &str) -> DiaryResult<String> {
        let resp = self.call(
            ApiRequest::new(Method::Post, "/api/init")
                .field("diaryname", diaryname)
                .field("username", username),
        )?;
        ensure_success(&resp, "init")?;
        let init: InitResponse = serde_json::from_value(resp.body)?;
        if init.key.is_empty() {
            return Err(DiaryError::Protocol("server issued an empty key".to_string()));
        }
        Ok(init.key)
    }

    /// Append an entry. Returns the created entry when the server reports it.
    pub fn log(&self, key: &str, text: &str) -> DiaryResult<Option<Entry>> {
        let resp = self.call(
            ApiRequest::new(Method::Post, "/api/log")
                .field("text", text)
                .with_key(key),
        )?;
        ensure_ok(&resp, "log")?;
        match resp.body.get("entry") {
            Some(entry) if !entry.is_null() => {
                let wire: WireEntry = serde_json::from_value(entry.clone())?;
                Ok(Some(wire.into()))
            }
            _ => Ok(None),
        }
    }

    /// Remove entry `id`. A missing id is reported as
    /// [`DiaryError::EntryNotFound`].
    pub fn remove(&self, key: &str, id: u64) -> DiaryResult<()> {
        let resp = self.call(
            ApiRequest::new(Method::Delete, format!("/api/rm/{id}/")).with_key(key),
        )?;
        if resp.status == 404 {
            return Err(DiaryError::EntryNotFound(id));
        }
        ensure_ok(&resp, "rm").map_err(|err| match err {
            DiaryError::Rejected(_) => DiaryError::EntryNotFound(id),
            other => other,
        })
    }

    /// List entries in id order.
    pub fn list(&self, key: &str) -> DiaryResult<Vec<Entry>> {
        let resp = self.call(ApiRequest::new(Method::Get, "/api/list").with_key(key))?;
        ensure_success(&resp, "list")?;
        let result = resp
            .body
            .get("result")
            .cloned()
            .ok_or_else(|| DiaryError::Protocol("list response has no result".to_string()))?;
        if !result.is_array() {
            return Err(DiaryError::Rejected(format!("list: {result}")));
        }
        let wire: Vec<WireEntry> = serde_json::from_value(result)?;
        let mut entries: Vec<Entry> = wire.into_iter().map(Entry::from).collect();
        entries.sort_by_key(|entry| entry.id);
        Ok(entries)
    }

    /// Check a key. An unknown key is an answer, not an error.
    pub fn verify(&self, key: &str) -> DiaryResult<Verification> {
        let resp = self.call(ApiRequest::new(Method::Get, "/api/verify").with_key(key))?;
        if result_str(&resp.body) != Some("ok") {
            return Ok(Verification::Invalid);
        }
        let diaryname = resp
            .body
            .get("diaryname")
            .and_then(Value::as_str)
            .ok_or_else(|| DiaryError::Protocol("verify response has no diaryname".to_string()))?;
        Ok(Verification::Valid {
            diaryname: diaryname.to_string(),
        })
    }

    /// Ask the server to discard the diary and all its entries.
    pub fn wipe(&self, key: &str) -> DiaryResult<()> {
        let resp = self.call(ApiRequest::new(Method::Delete, "/api/wipe").with_key(key))?;
        ensure_success(&resp, "wipe")?;
        if result_str(&resp.body) == Some("error") {
            return Err(DiaryError::Rejected(format!("wipe: {}", resp.body)));
        }
        Ok(())
    }
}

fn result_str(body: &Value) -> Option<&str> {
    body.get("result").and_then(Value::as_str)
}

fn ensure_success(resp: &ApiResponse, op: &str) -> DiaryResult<()> {
    if resp.is_success() {
        Ok(())
    } else {
        Err(DiaryError::Rejected(format!(
            "{op}: HTTP {} {}",
            resp.status, resp.body
        )))
    }
}

fn ensure_ok(resp: &ApiResponse, op: &str) -> DiaryResult<()> {
    ensure_success(resp, op)?;
    match result_str(&resp.body) {
        Some("ok") => Ok(()),
        _ => Err(DiaryError::Rejected(format!("{op}: {}", resp.body))),
    }
}
