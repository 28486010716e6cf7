//! HTTP backend for the sandbox UI
//! Simple HTTP/1.1 server using tokio and basic request handling. Every
//! engine call runs on the blocking pool; the `Database` mutex keeps them
//! one at a time.

use sql_sandbox::config::{parse_delimiter, SandboxConfig};
use sql_sandbox::engine::Database;
use sql_sandbox::error::SandboxError;
use sql_sandbox::export;
use sql_sandbox::ingestion::{CsvDialect, CsvImporter, ImportSpec};
use sql_sandbox::observability::init_tracing;
use sql_sandbox::presets::PRESETS;
use sql_sandbox::query::QueryExecutor;
use sql_sandbox::result::TabularResult;
use sql_sandbox::stats::StatsAggregator;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, warn};

const MAX_REQUEST_BYTES: usize = 16 * 1024 * 1024;
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared between all connections.
struct AppState {
    db: Arc<Database>,
    /// The result currently on screen. Replaced by every query, cleared by a failed one.
    current: Mutex<Option<TabularResult>>,
}

#[derive(Debug)]
struct Request {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    body: String,
}

#[derive(Debug)]
struct Response {
    status: u16,
    reason: &'static str,
    content_type: &'static str,
    extra_headers: Vec<(String, String)>,
    body: String,
}

impl Response {
    fn json(status: u16, reason: &'static str, body: serde_json::Value) -> Self {
        Self {
            status,
            reason,
            content_type: "application/json",
            extra_headers: Vec::new(),
            body: body.to_string(),
        }
    }

    fn ok(body: serde_json::Value) -> Self {
        Self::json(200, "OK", body)
    }

    fn error(status: u16, reason: &'static str, message: impl Into<String>) -> Self {
        Self::json(status, reason, json!({ "error": message.into() }))
    }

    fn from_sandbox_error(err: &SandboxError) -> Self {
        match err {
            SandboxError::NotInitialized => {
                Self::error(503, "Service Unavailable", err.to_string())
            }
            SandboxError::Io(_) | SandboxError::Json(_) | SandboxError::Config(_) => {
                Self::error(500, "Internal Server Error", err.to_string())
            }
            _ => Self::error(400, "Bad Request", err.to_string()),
        }
    }

    fn to_http(&self) -> String {
        let mut out = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
             Access-Control-Allow-Headers: Content-Type\r\n\
             Connection: close\r\n",
            self.status,
            self.reason,
            self.content_type,
            self.body.len()
        );
        for (name, value) in &self.extra_headers {
            out.push_str(&format!("{}: {}\r\n", name, value));
        }
        out.push_str("\r\n");
        out.push_str(&self.body);
        out
    }
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    query: String,
}

#[derive(Debug, Deserialize)]
struct ImportRequest {
    file_name: String,
    content: String,
    table_name: Option<String>,
    delimiter: Option<String>,
    #[serde(default)]
    quoted: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = SandboxConfig::from_env()?;
    init_tracing(&config.log_filter);

    let db = Arc::new(Database::open(config.seed)?);
    let state = Arc::new(AppState {
        db: Arc::clone(&db),
        current: Mutex::new(None),
    });

    let listener = TcpListener::bind(&config.listen).await?;
    info!(listen = %config.listen, seeded = config.seed, "SQL sandbox server listening");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, addr) = accepted?;
                debug!(peer = %addr, "New connection");
                tokio::spawn(handle_connection(stream, Arc::clone(&state)));
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    tokio::task::spawn_blocking(move || db.close()).await??;
    Ok(())
}

async fn handle_connection(mut stream: TcpStream, state: Arc<AppState>) {
    let buffer = match timeout(READ_TIMEOUT, read_request(&mut stream)).await {
        Ok(Ok(buffer)) => buffer,
        Ok(Err(e)) => {
            warn!("Failed to read from stream: {}", e);
            return;
        }
        Err(_) => {
            warn!("Request read timeout");
            return;
        }
    };

    if buffer.is_empty() {
        return;
    }

    let response = match String::from_utf8(buffer) {
        Ok(raw) => match parse_request(&raw) {
            Some(request) => handle_request(&state, &request).await,
            None => Response::error(400, "Bad Request", "malformed request"),
        },
        Err(_) => Response::error(400, "Bad Request", "request is not valid UTF-8"),
    };

    if let Err(e) = stream.write_all(response.to_http().as_bytes()).await {
        warn!("Failed to write response: {}", e);
    }
}

/// Read until the headers and the announced body have arrived.
async fn read_request(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 8192];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);

        if request_complete(&buffer)? {
            break;
        }

        if buffer.len() > MAX_REQUEST_BYTES {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "request too large",
            ));
        }
    }

    Ok(buffer)
}

/// Whether the headers and the whole announced body are in `buffer`.
/// Bodies announced larger than `MAX_REQUEST_BYTES` are refused.
fn request_complete(buffer: &[u8]) -> std::io::Result<bool> {
    let Some(headers_end) = find_headers_end(buffer) else {
        return Ok(false);
    };
    let head = String::from_utf8_lossy(&buffer[..headers_end]);
    let content_length = extract_content_length(&head).unwrap_or(0);
    if content_length > MAX_REQUEST_BYTES {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "request too large",
        ));
    }
    Ok(buffer.len() >= headers_end.saturating_add(content_length))
}

/// Offset just past the blank line ending the headers.
fn find_headers_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n").map(|pos| pos + 4)
}

fn extract_content_length(head: &str) -> Option<usize> {
    for line in head.lines() {
        if line.to_lowercase().starts_with("content-length:") {
            if let Some(value) = line.split(':').nth(1) {
                return value.trim().parse().ok();
            }
        }
    }
    None
}

fn parse_request(raw: &str) -> Option<Request> {
    let (head, body) = match raw.find("\r\n\r\n") {
        Some(pos) => (&raw[..pos], &raw[pos + 4..]),
        None => (raw, ""),
    };

    let mut lines = head.lines();
    let mut parts = lines.next()?.split_whitespace();
    let method = parts.next()?.to_string();
    let full_path = parts.next()?;

    // Drop the query string, normalize trailing slashes
    let path = full_path.split('?').next().unwrap_or(full_path);
    let mut path = path.trim_end_matches('/').to_string();
    if path.is_empty() {
        path = "/".to_string();
    }

    let mut headers = HashMap::new();
    for line in lines {
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }

    Some(Request {
        method,
        path,
        headers,
        body: body.to_string(),
    })
}

async fn handle_request(state: &AppState, request: &Request) -> Response {
    debug!(method = %request.method, path = %request.path, "Request");

    match (request.method.as_str(), request.path.as_str()) {
        ("OPTIONS", _) => Response {
            status: 204,
            reason: "No Content",
            content_type: "text/plain",
            extra_headers: Vec::new(),
            body: String::new(),
        },
        ("GET", "/api/health") => Response::ok(json!({ "status": "ok", "service": "sql-sandbox" })),
        ("GET", "/api/status") => {
            let db = Arc::clone(&state.db);
            match blocking(move || db.tables().map(|tables| (tables, db.schema_version()))).await {
                Ok((tables, schema_version)) => Response::ok(json!({
                    "initialized": true,
                    "schema_version": schema_version,
                    "tables": tables,
                })),
                Err(SandboxError::NotInitialized) => Response::ok(json!({
                    "initialized": false,
                    "schema_version": state.db.schema_version(),
                    "tables": [],
                })),
                Err(e) => Response::from_sandbox_error(&e),
            }
        }
        ("GET", "/api/tables") => {
            let db = Arc::clone(&state.db);
            match blocking(move || db.tables()).await {
                Ok(tables) => Response::ok(json!({ "tables": tables })),
                Err(e) => Response::from_sandbox_error(&e),
            }
        }
        ("GET", "/api/presets") => Response::ok(json!({ "presets": PRESETS })),
        ("GET", "/api/stats") => {
            let db = Arc::clone(&state.db);
            match blocking(move || Ok(StatsAggregator::new(&db).summarize())).await {
                Ok(stats) => Response::ok(json!({ "stats": stats })),
                Err(e) => Response::from_sandbox_error(&e),
            }
        }
        ("POST", "/api/query") => handle_query(state, request).await,
        ("POST", "/api/import") => handle_import(state, request).await,
        ("GET", "/api/export") => {
            let current = state.current.lock().await;
            match current.as_ref() {
                Some(result) => Response {
                    status: 200,
                    reason: "OK",
                    content_type: "text/csv",
                    extra_headers: vec![(
                        "Content-Disposition".to_string(),
                        format!(
                            "attachment; filename=\"{}\"",
                            export::export_file_name(Utc::now())
                        ),
                    )],
                    body: export::to_csv(result),
                },
                None => Response::error(404, "Not Found", "no result to export"),
            }
        }
        _ => Response::error(404, "Not Found", format!("no route for {} {}", request.method, request.path)),
    }
}

async fn handle_query(state: &AppState, request: &Request) -> Response {
    let body: QueryRequest = match parse_json_body(request) {
        Ok(body) => body,
        Err(response) => return response,
    };

    // Held across execution so the stored result is the last query to finish
    let mut current = state.current.lock().await;
    let db = Arc::clone(&state.db);
    let outcome = blocking(move || QueryExecutor::new(&db).execute(&body.query)).await;

    match outcome {
        Ok(result) => {
            let response = Response::ok(json!({ "result": &result }));
            *current = Some(result);
            response
        }
        Err(e) => {
            *current = None;
            Response::from_sandbox_error(&e)
        }
    }
}

async fn handle_import(state: &AppState, request: &Request) -> Response {
    let body: ImportRequest = match parse_json_body(request) {
        Ok(body) => body,
        Err(response) => return response,
    };

    let mut spec = ImportSpec::new(body.file_name, body.content).with_dialect(if body.quoted {
        CsvDialect::Quoted
    } else {
        CsvDialect::Simple
    });
    if let Some(table_name) = body.table_name.filter(|t| !t.trim().is_empty()) {
        spec = spec.with_table_name(table_name);
    }
    if let Some(delimiter) = body.delimiter.filter(|d| !d.is_empty()) {
        match parse_delimiter(&delimiter) {
            Ok(c) => spec = spec.with_delimiter(c),
            Err(e) => return Response::error(400, "Bad Request", format!("delimiter: {}", e)),
        }
    }

    let db = Arc::clone(&state.db);
    let outcome = blocking(move || {
        let summary = CsvImporter::new(&db).import(spec)?;
        // Schema changed: hand back fresh statistics with the summary
        let stats = StatsAggregator::new(&db).summarize();
        Ok((summary, stats))
    })
    .await;

    match outcome {
        Ok((summary, stats)) => Response::ok(json!({
            "message": format!(
                "Successfully imported {} rows into table '{}'",
                summary.row_count, summary.table_name
            ),
            "summary": summary,
            "stats": stats,
        })),
        Err(e) => {
            error!(error = %e, "Import failed");
            Response::from_sandbox_error(&e)
        }
    }
}

fn parse_json_body<T: serde::de::DeserializeOwned>(request: &Request) -> Result<T, Response> {
    if let Some(content_type) = request.headers.get("content-type") {
        if !content_type.starts_with("application/json") {
            return Err(Response::error(
                415,
                "Unsupported Media Type",
                "expected application/json",
            ));
        }
    }
    serde_json::from_str(request.body.trim())
        .map_err(|e| Response::error(400, "Bad Request", format!("invalid JSON body: {}", e)))
}

/// Run an engine call on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, SandboxError>
where
    F: FnOnce() -> Result<T, SandboxError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SandboxError::Execution(format!("engine task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use sql_sandbox::result::Scalar;

    fn state(seed: bool) -> AppState {
        AppState {
            db: Arc::new(Database::open(seed).unwrap()),
            current: Mutex::new(None),
        }
    }

    fn post(path: &str, body: serde_json::Value) -> Request {
        let raw = format!(
            "POST {} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\n\r\n{}",
            path, body
        );
        parse_request(&raw).unwrap()
    }

    fn get(path: &str) -> Request {
        parse_request(&format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", path)).unwrap()
    }

    fn body(response: &Response) -> serde_json::Value {
        serde_json::from_str(&response.body).unwrap()
    }

    #[test]
    fn test_parse_request() {
        let request = parse_request(
            "POST /api/query/?x=1 HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: 2\r\n\r\n{}",
        )
        .unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/api/query");
        assert_eq!(request.headers.get("content-length").map(String::as_str), Some("2"));
        assert_eq!(request.body, "{}");
    }

    #[test]
    fn test_content_length_and_headers_end() {
        assert_eq!(extract_content_length("POST / HTTP/1.1\r\ncontent-length: 42"), Some(42));
        assert_eq!(find_headers_end(b"GET / HTTP/1.1\r\n\r\nbody"), Some(18));
        assert_eq!(find_headers_end(b"GET / HTTP/1.1\r\n"), None);
    }

    #[test]
    fn test_request_complete() {
        assert!(!request_complete(b"POST / HTTP/1.1\r\nContent-Length: 4\r\n\r\nab").unwrap());
        assert!(request_complete(b"POST / HTTP/1.1\r\nContent-Length: 4\r\n\r\nabcd").unwrap());
        assert!(request_complete(b"GET / HTTP/1.1\r\n\r\n").unwrap());
        assert!(!request_complete(b"GET / HTTP/1.1\r\n").unwrap());
    }

    #[test]
    fn test_oversized_content_length_is_refused() {
        let huge = b"POST / HTTP/1.1\r\nContent-Length: 18446744073709551615\r\n\r\n{}";
        let err = request_complete(huge).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);

        let over = format!("POST / HTTP/1.1\r\nContent-Length: {}\r\n\r\n", MAX_REQUEST_BYTES + 1);
        assert!(request_complete(over.as_bytes()).is_err());
    }

    #[test]
    fn test_response_content_length_counts_bytes() {
        let response = Response::ok(json!({ "title": "Amélie" }));
        let http = response.to_http();
        assert!(http.contains(&format!("Content-Length: {}", response.body.len())));
        assert!(http.starts_with("HTTP/1.1 200 OK\r\n"));
    }

    #[tokio::test]
    async fn test_query_then_export() {
        let state = state(true);

        let response = handle_request(&state, &post("/api/query", json!({ "query": "SELECT COUNT(*) FROM movies" }))).await;
        assert_eq!(response.status, 200);
        assert_eq!(body(&response)["result"]["rows"], json!([[15.0]]));

        let export = handle_request(&state, &get("/api/export")).await;
        assert_eq!(export.status, 200);
        assert_eq!(export.body, "COUNT(*)\n\"15\"");
        assert!(export.extra_headers[0].1.contains("query_results_"));
    }

    #[tokio::test]
    async fn test_query_runs_under_result_lock() {
        let state = Arc::new(state(false));
        QueryExecutor::new(&state.db).execute("CREATE TABLE hits (n INTEGER)").unwrap();

        let held = state.current.lock().await;
        let task = {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                let request = post("/api/query", json!({ "query": "INSERT INTO hits VALUES (1)" }));
                handle_request(&state, &request).await.status
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        let count = QueryExecutor::new(&state.db).execute("SELECT COUNT(*) FROM hits").unwrap();
        assert_eq!(count.rows, vec![vec![Scalar::Number(0.0)]]);

        drop(held);
        assert_eq!(task.await.unwrap(), 200);
        let current = state.current.lock().await;
        assert_eq!(current.as_ref().map(|r| r.query.as_str()), Some("INSERT INTO hits VALUES (1)"));
    }

    #[tokio::test]
    async fn test_failed_query_clears_current_result() {
        let state = state(true);
        handle_request(&state, &post("/api/query", json!({ "query": "SELECT 1" }))).await;

        let response = handle_request(&state, &post("/api/query", json!({ "query": "SELECT * FROM nope" }))).await;
        assert_eq!(response.status, 400);
        assert!(body(&response)["error"].as_str().unwrap().contains("no such table"));

        let export = handle_request(&state, &get("/api/export")).await;
        assert_eq!(export.status, 404);
    }

    #[tokio::test]
    async fn test_import_returns_summary_and_stats() {
        let state = state(true);
        let response = handle_request(
            &state,
            &post(
                "/api/import",
                json!({ "file_name": "Films.csv", "content": "Title,Year\nInception,2010\nAvatar,2009\n" }),
            ),
        )
        .await;

        assert_eq!(response.status, 200);
        let payload = body(&response);
        assert_eq!(payload["summary"]["table_name"], "films");
        assert_eq!(payload["summary"]["row_count"], 2);
        assert_eq!(payload["stats"]["total_movies"], 15);
    }

    #[tokio::test]
    async fn test_import_without_data_is_rejected() {
        let state = state(false);
        let response = handle_request(
            &state,
            &post("/api/import", json!({ "file_name": "x.csv", "content": "a,b\n" })),
        )
        .await;
        assert_eq!(response.status, 400);
    }

    #[tokio::test]
    async fn test_uninitialized_engine() {
        let state = AppState {
            db: Arc::new(Database::uninitialized()),
            current: Mutex::new(None),
        };
        let response = handle_request(&state, &post("/api/query", json!({ "query": "SELECT 1" }))).await;
        assert_eq!(response.status, 503);

        let status = handle_request(&state, &get("/api/status")).await;
        assert_eq!(body(&status)["initialized"], false);
    }

    #[tokio::test]
    async fn test_stats_presets_and_unknown_route() {
        let state = state(false);

        let stats = handle_request(&state, &get("/api/stats")).await;
        assert_eq!(body(&stats)["stats"]["most_popular_genre"], "N/A");

        let presets = handle_request(&state, &get("/api/presets")).await;
        assert_eq!(body(&presets)["presets"].as_array().unwrap().len(), PRESETS.len());

        let missing = handle_request(&state, &get("/api/nothing")).await;
        assert_eq!(missing.status, 404);
    }

    #[tokio::test]
    async fn test_bad_json_body() {
        let state = state(false);
        let request = parse_request("POST /api/query HTTP/1.1\r\nContent-Type: application/json\r\n\r\nnot json").unwrap();
        let response = handle_request(&state, &request).await;
        assert_eq!(response.status, 400);
    }
}
