//! Embedded diary API server.
//!
//! [`DiaryServer`] implements the request handling behind the six diary
//! routes over SQLite. It knows nothing about sockets: an HTTP front end
//! hands it an [`ApiRequest`] and writes back the [`ApiResponse`], and
//! [`LoopbackTransport`] lets a [`crate::Config`] talk to it in-process.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DiaryError, DiaryResult, TransportError};
use crate::transport::{ApiRequest, ApiResponse, Method, Transport};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS diaries (
        key TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        username TEXT NOT NULL,
        created_at TEXT NOT NULL,
        next_id INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS entries (
        diary_key TEXT NOT NULL,
        id INTEGER NOT NULL,
        text TEXT NOT NULL,
        created_at TEXT NOT NULL,

        PRIMARY KEY (diary_key, id),
        FOREIGN KEY (diary_key) REFERENCES diaries(key) ON DELETE CASCADE
    );
"#;

/// SQLite-backed implementation of the diary API.
pub struct DiaryServer {
    conn: Mutex<Connection>,
}

impl DiaryServer {
    /// Server whose state lives only as long as the value.
    pub fn open_in_memory() -> DiaryResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Server persisted to a database file, created if missing.
    pub fn open(path: &Path) -> DiaryResult<Self> {
        Self::init(Connection::open(path)?)
    }

    fn init(conn: Connection) -> DiaryResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> DiaryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DiaryError::Storage("server connection poisoned".to_string()))
    }

    /// Route one request.
    pub fn handle(&self, request: &ApiRequest) -> ApiResponse {
        let path = request.path.trim_end_matches('/');
        let result = match (request.method, path) {
            (Method::Post, "/api/init") => self.route_init(request),
            (Method::Post, "/api/log") => self.with_diary(request, |key| self.route_log(key, request)),
            (Method::Get, "/api/list") => self.with_diary(request, |key| self.route_list(key)),
            (Method::Get, "/api/verify") => self.route_verify(request),
            (Method::Delete, "/api/wipe") => self.with_diary(request, |key| self.route_wipe(key)),
            (Method::Delete, p) if p.starts_with("/api/rm/") => {
                match p["/api/rm/".len()..].parse::<u64>() {
                    Ok(id) => self.with_diary(request, |key| self.route_rm(key, id)),
                    Err(_) => Ok(error_response(404, "no such entry")),
                }
            }
            _ => Ok(error_response(404, "no such route")),
        };

        result.unwrap_or_else(|err| error_response(500, &err.to_string()))
    }

    fn with_diary<F>(&self, request: &ApiRequest, f: F) -> DiaryResult<ApiResponse>
    where
        F: FnOnce(&str) -> DiaryResult<ApiResponse>,
    {
        let Some(key) = request.key.as_deref() else {
            return Ok(error_response(401, "missing key"));
        };
        if self.diary_name(key)?.is_none() {
            return Ok(error_response(401, "invalid key"));
        }
        f(key)
    }

    fn diary_name(&self, key: &str) -> DiaryResult<Option<String>> {
        let conn = self.lock_conn()?;
        Ok(conn
            .query_row("SELECT name FROM diaries WHERE key = ?", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?)
    }

    fn route_init(&self, request: &ApiRequest) -> DiaryResult<ApiResponse> {
        let diaryname = request.form_value("diaryname").map(str::trim).unwrap_or("");
        let username = request.form_value("username").map(str::trim).unwrap_or("");
        if diaryname.is_empty() || username.is_empty() {
            return Ok(error_response(400, "diaryname and username are required"));
        }

        let key = Uuid::new_v4().simple().to_string();
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO diaries (key, name, username, created_at) VALUES (?, ?, ?, ?)",
            (&key, diaryname, username, Utc::now().to_rfc3339()),
        )?;
        info!(diaryname, username, "server registered diary");

        Ok(ApiResponse::new(200, json!({ "key": key })))
    }

    fn route_log(&self, key: &str, request: &ApiRequest) -> DiaryResult<ApiResponse> {
        let text = request.form_value("text").unwrap_or("");
        if text.trim().is_empty() {
            return Ok(error_response(400, "text is required"));
        }

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        let id: i64 = tx.query_row("SELECT next_id FROM diaries WHERE key = ?", [key], |row| {
            row.get(0)
        })?;
        let created_at = Utc::now().to_rfc3339();
        tx.execute(
            "INSERT INTO entries (diary_key, id, text, created_at) VALUES (?, ?, ?, ?)",
            (key, id, text, &created_at),
        )?;
        tx.execute(
            "UPDATE diaries SET next_id = next_id + 1 WHERE key = ?",
            [key],
        )?;
        tx.commit()?;
        debug!(id, "server logged entry");

        Ok(ApiResponse::new(
            200,
            json!({
                "result": "ok",
                "entry": { "id": id, "text": text, "date": created_at },
            }),
        ))
    }

    fn route_rm(&self, key: &str, id: u64) -> DiaryResult<ApiResponse> {
        let id = i64::try_from(id).map_err(|_| DiaryError::EntryNotFound(id))?;
        let conn = self.lock_conn()?;
        let removed = conn.execute(
            "DELETE FROM entries WHERE diary_key = ? AND id = ?",
            (key, id),
        )?;
        if removed == 0 {
            return Ok(error_response(404, "no such entry"));
        }
        Ok(ApiResponse::new(200, json!({ "result": "ok" })))
    }

    fn route_list(&self, key: &str) -> DiaryResult<ApiResponse> {
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare("SELECT id, text, created_at FROM entries WHERE diary_key = ? ORDER BY id")?;
        let rows = stmt.query_map([key], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, text, created_at) = row?;
            let date = DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| DiaryError::Storage(format!("Invalid timestamp: {}", e)))?
                .with_timezone(&Utc);
            entries.push(json!({ "id": id, "text": text, "date": date }));
        }

        Ok(ApiResponse::new(200, json!({ "result": entries })))
    }

    fn route_verify(&self, request: &ApiRequest) -> DiaryResult<ApiResponse> {
        let name = match request.key.as_deref() {
            Some(key) => self.diary_name(key)?,
            None => None,
        };
        Ok(match name {
            Some(diaryname) => ApiResponse::new(200, json!({ "result": "ok", "diaryname": diaryname })),
            None => ApiResponse::new(200, json!({ "result": "error" })),
        })
    }

    fn route_wipe(&self, key: &str) -> DiaryResult<ApiResponse> {
        let conn = self.lock_conn()?;
        conn.execute("DELETE FROM diaries WHERE key = ?", [key])?;
        info!("server wiped diary");
        Ok(ApiResponse::new(200, json!({ "result": "ok" })))
    }

    /// Number of diaries the server currently knows.
    pub fn diary_count(&self) -> DiaryResult<usize> {
        let conn = self.lock_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM diaries", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn error_response(status: u16, message: &str) -> ApiResponse {
    ApiResponse::new(status, json!({ "result": "error", "message": message }))
}

/// Transport that serves one base URL from an in-process [`DiaryServer`].
///
/// Requests for any other base URL fail as unreachable, the same way a
/// connection to a host with nothing listening would.
#[derive(Clone)]
pub struct LoopbackTransport {
    base_url: String,
    server: Arc<DiaryServer>,
}

impl LoopbackTransport {
    pub fn new(base_url: impl Into<String>, server: Arc<DiaryServer>) -> Self {
        Self {
            base_url: base_url.into(),
            server,
        }
    }

    pub fn server(&self) -> &Arc<DiaryServer> {
        &self.server
    }
}

impl Transport for LoopbackTransport {
    fn send(&self, base_url: &str, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        if base_url.trim_end_matches('/') != self.base_url.trim_end_matches('/') {
            return Err(TransportError::Unreachable(format!(
                "connection refused: {base_url}"
            )));
        }
        Ok(self.server.handle(request))
    }
}
