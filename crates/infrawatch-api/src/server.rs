use std::io::{self, BufRead, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use infrawatch_core::{
    component_scores, explain, score, validate_assets, validate_inputs, RepairBudget,
    RepairOptimizer, ValidationError,
};
use infrawatch_storage::{
    BridgeCatalog, InMemoryReportStore, NewReport, ReportRepository, StorageError,
};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::protocol::{
    Ack, BridgeView, CalculateRiskRequest, CalculateRiskResponse, ErrorBody,
    OptimizeRepairsRequest, OptimizeRepairsResponse, ReportCreated, StatusUpdateRequest,
};

const SERVICE_NAME: &str = "InfraWatch++ Backend API";
const MAX_BODY_BYTES: usize = 1 << 20;

pub struct ApiServer {
    catalog: BridgeCatalog,
    reports: Arc<Mutex<Box<dyn ReportRepository>>>,
    optimizer: RepairOptimizer,
    io_timeout: Duration,
}

#[derive(Debug, Error)]
enum ApiError {
    #[error("invalid json body: {0}")]
    Body(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    fn into_response(self) -> HttpResponse {
        match self {
            Self::Body(_) | Self::Validation(_) => HttpResponse::typed(
                400,
                &ErrorBody::with_message("invalid_request", self.to_string()),
            ),
            Self::Storage(StorageError::NotFound(_)) => {
                HttpResponse::typed(404, &ErrorBody::new("Report not found"))
            }
        }
    }
}

impl ApiServer {
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_parts(
            config,
            BridgeCatalog::seeded(),
            Box::new(InMemoryReportStore::new()),
        )
    }

    pub fn with_parts(
        config: &ServerConfig,
        catalog: BridgeCatalog,
        reports: Box<dyn ReportRepository>,
    ) -> Self {
        for drift in catalog.score_drift() {
            warn!(
                bridge = %drift.id,
                stored_fpi = drift.stored_fpi,
                computed_fpi = drift.computed_fpi,
                "stored fpi disagrees with the scoring formula; keeping stored value"
            );
        }
        Self {
            catalog,
            reports: Arc::new(Mutex::new(reports)),
            optimizer: RepairOptimizer::new(config.optimizer.clone()),
            io_timeout: config.io_timeout,
        }
    }

    pub fn serve_http(self: Arc<Self>, addr: &str) -> io::Result<()> {
        let listener = TcpListener::bind(addr)?;
        self.serve(listener)
    }

    /// Accepts connections until the listener fails; each connection is
    /// handled on its own thread.
    pub fn serve(self: Arc<Self>, listener: TcpListener) -> io::Result<()> {
        info!(addr = %listener.local_addr()?, "infrawatch http listening");
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let server = Arc::clone(&self);
                    std::thread::spawn(move || {
                        if let Err(err) = server.handle_http_connection(stream) {
                            warn!(error = %err, "http request error");
                        }
                    });
                }
                Err(err) => {
                    warn!(error = %err, "http accept error");
                }
            }
        }
        Ok(())
    }

    fn handle_http_connection(&self, mut stream: TcpStream) -> io::Result<()> {
        stream.set_read_timeout(Some(self.io_timeout))?;
        stream.set_write_timeout(Some(self.io_timeout))?;
        let req = match read_http_request(&stream)? {
            Incoming::Closed => return Ok(()),
            Incoming::TooLarge(declared) => {
                warn!(declared, limit = MAX_BODY_BYTES, "rejected oversized request body");
                let response = HttpResponse::typed(
                    413,
                    &ErrorBody::with_message(
                        "payload_too_large",
                        format!("request body of {declared} bytes exceeds {MAX_BODY_BYTES}"),
                    ),
                );
                return write_http_response(&mut stream, &response);
            }
            Incoming::Request(req) => req,
        };
        let response = self.dispatch(&req.method, &req.path, &req.body);
        debug!(
            method = %req.method,
            path = %req.path,
            status = response.status,
            "handled request"
        );
        write_http_response(&mut stream, &response)
    }

    /// Routes one request. The query string, if any, is ignored.
    pub fn dispatch(&self, method: &str, raw_path: &str, body: &[u8]) -> HttpResponse {
        let path = strip_query(raw_path);
        if method == "OPTIONS" {
            return HttpResponse::empty(204);
        }

        match (method, path) {
            ("GET", "/") => return HttpResponse::json(200, Self::index()),
            ("GET", "/health") => return HttpResponse::json(200, json!({"status": "ok"})),
            ("GET", "/api/bridges") => {
                let views: Vec<BridgeView<'_>> =
                    self.catalog.list().iter().map(BridgeView::from).collect();
                return HttpResponse::typed(200, &views);
            }
            ("POST", "/api/calculate-risk") => {
                return self.calculate_risk(body).unwrap_or_else(ApiError::into_response)
            }
            ("POST", "/api/optimize-repairs") => {
                return self
                    .optimize_repairs(body)
                    .unwrap_or_else(ApiError::into_response)
            }
            ("POST", "/api/reports") => {
                return self.create_report(body).unwrap_or_else(ApiError::into_response)
            }
            ("GET", "/api/reports") => return HttpResponse::typed(200, &self.reports.lock().list()),
            ("GET", "/api/report-stats") => {
                return HttpResponse::typed(200, &self.reports.lock().stats())
            }
            _ => {}
        }

        if let Some(id) = path.strip_prefix("/api/bridges/") {
            if method != "GET" {
                return method_not_allowed();
            }
            return match self.catalog.find(id) {
                Some(bridge) => HttpResponse::typed(200, &BridgeView::from(bridge)),
                None => HttpResponse::typed(404, &ErrorBody::new("Bridge not found")),
            };
        }

        if let Some(rest) = path.strip_prefix("/api/reports/") {
            if let Some(id) = rest.strip_suffix("/status") {
                if method != "PUT" {
                    return method_not_allowed();
                }
                return self
                    .update_report_status(id, body)
                    .unwrap_or_else(ApiError::into_response);
            }
            if method != "GET" {
                return method_not_allowed();
            }
            return match self.reports.lock().find_by_id(rest) {
                Some(report) => HttpResponse::typed(200, &report),
                None => HttpResponse::typed(404, &ErrorBody::new("Report not found")),
            };
        }

        if is_known_path(path) {
            return method_not_allowed();
        }
        HttpResponse::typed(
            404,
            &ErrorBody::with_message("not_found", format!("no route for {path}")),
        )
    }

    fn index() -> Value {
        json!({
            "message": SERVICE_NAME,
            "endpoints": {
                "/api/bridges": "GET - Get all bridges",
                "/api/bridges/:id": "GET - Get specific bridge",
                "/api/calculate-risk": "POST - Calculate FPI score",
                "/api/optimize-repairs": "POST - Get repair recommendations",
                "/api/reports": "GET/POST - List or submit reports",
                "/api/reports/:id": "GET - Get specific report",
                "/api/reports/:id/status": "PUT - Update report status",
                "/api/report-stats": "GET - Report statistics"
            }
        })
    }

    fn calculate_risk(&self, body: &[u8]) -> Result<HttpResponse, ApiError> {
        let req: CalculateRiskRequest = parse_body(body)?;
        validate_inputs(&req.inputs)?;

        let risk = score(&req.inputs);
        debug!(fpi = risk.fpi, category = risk.category.as_str(), "risk scored");
        let explanation = explain(
            &req.inputs,
            req.last_maintenance_date,
            Utc::now().date_naive(),
        );
        Ok(HttpResponse::typed(
            200,
            &CalculateRiskResponse {
                fpi: risk.fpi,
                risk_category: risk.category,
                explanation: explanation.text,
                component_scores: component_scores(&req.inputs),
            },
        ))
    }

    fn optimize_repairs(&self, body: &[u8]) -> Result<HttpResponse, ApiError> {
        let req: OptimizeRepairsRequest = parse_body(body)?;
        validate_assets(&req.assets)?;

        let plan = self
            .optimizer
            .optimize(&req.assets, RepairBudget::from_requested(req.budget));
        debug!(
            assets = req.assets.len(),
            budget = plan.budget,
            risk_reduction = plan.risk_reduction,
            "repair plan computed"
        );
        Ok(HttpResponse::typed(200, &OptimizeRepairsResponse::from(plan)))
    }

    fn create_report(&self, body: &[u8]) -> Result<HttpResponse, ApiError> {
        let submission: Map<String, Value> = parse_body(body)?;
        let report = self
            .reports
            .lock()
            .append(NewReport::from_submission(submission));
        info!(report = %report.id, problem_type = ?report.problem_type, "report submitted");
        Ok(HttpResponse::typed(
            200,
            &ReportCreated {
                success: true,
                message: "Report submitted successfully".to_string(),
                report_id: report.id,
            },
        ))
    }

    fn update_report_status(&self, id: &str, body: &[u8]) -> Result<HttpResponse, ApiError> {
        let req: StatusUpdateRequest = parse_body(body)?;
        let report = self.reports.lock().update_status(id, req.status)?;
        info!(report = %report.id, status = report.status.as_str(), "report status updated");
        Ok(HttpResponse::typed(
            200,
            &Ack {
                success: true,
                message: format!("Report status updated to {}", report.status.as_str()),
            },
        ))
    }
}

impl Default for ApiServer {
    fn default() -> Self {
        Self::new(&ServerConfig::default())
    }
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    Ok(serde_json::from_slice(body)?)
}

fn method_not_allowed() -> HttpResponse {
    HttpResponse::typed(
        405,
        &ErrorBody::with_message("method_not_allowed", "see GET / for supported endpoints"),
    )
}

fn is_known_path(path: &str) -> bool {
    matches!(
        path,
        "/" | "/health"
            | "/api/bridges"
            | "/api/calculate-risk"
            | "/api/optimize-repairs"
            | "/api/reports"
            | "/api/report-stats"
    )
}

fn strip_query(raw: &str) -> &str {
    raw.split_once('?').map_or(raw, |(path, _)| path)
}

#[derive(Debug)]
enum Incoming {
    Closed,
    /// Declared `Content-Length` above [`MAX_BODY_BYTES`]; the body is not read.
    TooLarge(usize),
    Request(HttpRequest),
}

#[derive(Debug)]
struct HttpRequest {
    method: String,
    path: String,
    body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl HttpResponse {
    fn json(status: u16, value: Value) -> Self {
        Self::typed(status, &value)
    }

    fn typed<T: Serialize + ?Sized>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                content_type: "application/json",
                body,
            },
            Err(err) => {
                warn!(error = %err, "failed to serialize response body");
                Self {
                    status: 500,
                    content_type: "application/json",
                    body: br#"{"error":"internal_error"}"#.to_vec(),
                }
            }
        }
    }

    fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: Vec::new(),
        }
    }

    /// Parsed JSON body; `None` for empty or non-JSON bodies.
    pub fn json_body(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

fn read_http_request(stream: &TcpStream) -> io::Result<Incoming> {
    let mut reader = io::BufReader::new(stream.try_clone()?);
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(Incoming::Closed);
    }
    let first = line.trim_end_matches(['\r', '\n']);
    if first.is_empty() {
        return Ok(Incoming::Closed);
    }

    let mut parts = first.split_whitespace();
    let Some(method) = parts.next() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid http request line (missing method)",
        ));
    };
    let Some(path) = parts.next() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid http request line (missing path)",
        ));
    };

    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 {
            break;
        }
        let header = header.trim_end_matches(['\r', '\n']);
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse::<usize>().unwrap_or(0);
            }
        }
    }
    if content_length > MAX_BODY_BYTES {
        return Ok(Incoming::TooLarge(content_length));
    }

    let mut body = vec![0_u8; content_length];
    if content_length > 0 {
        reader.read_exact(&mut body)?;
    }
    Ok(Incoming::Request(HttpRequest {
        method: method.to_string(),
        path: path.to_string(),
        body,
    }))
}

fn write_http_response(stream: &mut TcpStream, response: &HttpResponse) -> io::Result<()> {
    let reason = http_reason_phrase(response.status);
    let headers = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nAccess-Control-Allow-Origin: *\r\nAccess-Control-Allow-Methods: GET, POST, PUT, OPTIONS\r\nAccess-Control-Allow-Headers: Content-Type\r\nConnection: close\r\n\r\n",
        response.status,
        reason,
        response.content_type,
        response.body.len()
    );
    stream.write_all(headers.as_bytes())?;
    stream.write_all(&response.body)?;
    stream.flush()
}

fn http_reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "OK",
    }
}
