use std::collections::{BTreeMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, NaiveDate, Utc};
use infrawatch_core::{score, RiskCategory, RiskInputs, Scored};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A catalogued bridge. `fpi` is the stored score; the category is always
/// derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bridge {
    pub id: String,
    pub name: String,
    pub location: GeoPoint,
    pub area: String,
    pub last_maintenance_date: NaiveDate,
    /// Days between scheduled maintenance visits.
    pub maintenance_frequency: u32,
    #[serde(flatten)]
    pub inputs: RiskInputs,
    pub fpi: i64,
}

impl Bridge {
    pub fn risk_category(&self) -> RiskCategory {
        RiskCategory::from_fpi(self.fpi)
    }
}

impl Scored for Bridge {
    fn asset_id(&self) -> &str {
        &self.id
    }

    fn fpi(&self) -> i64 {
        self.fpi
    }
}

/// A stored FPI that the live formula does not reproduce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreDrift {
    pub id: String,
    pub stored_fpi: i64,
    pub computed_fpi: i64,
}

#[derive(Debug, Clone, Default)]
pub struct BridgeCatalog {
    bridges: Vec<Bridge>,
}

impl BridgeCatalog {
    pub fn new(bridges: Vec<Bridge>) -> Self {
        Self { bridges }
    }

    /// The sample bridges the dashboard ships with. Their stored scores are
    /// kept as recorded, see [`BridgeCatalog::score_drift`].
    pub fn seeded() -> Self {
        let bridges = vec![
            Bridge {
                id: "B-101".to_string(),
                name: "Downtown Artery Bridge".to_string(),
                location: GeoPoint {
                    lat: 40.7128,
                    lng: -74.0060,
                },
                area: "Central District".to_string(),
                last_maintenance_date: NaiveDate::from_ymd_opt(2015, 3, 15).unwrap_or_default(),
                maintenance_frequency: 84,
                inputs: RiskInputs {
                    age_years: 45.0,
                    traffic_load_index: 88.0,
                    heavy_vehicle_percentage: 32.0,
                    incident_reports_count: 17.0,
                    flood_exposure_index: 75.0,
                    heat_stress_index: 65.0,
                    earthquake_zone_index: 40.0,
                },
                fpi: 88,
            },
            Bridge {
                id: "B-102".to_string(),
                name: "Northside Overpass".to_string(),
                location: GeoPoint {
                    lat: 40.7589,
                    lng: -73.9851,
                },
                area: "North Industrial Area".to_string(),
                last_maintenance_date: NaiveDate::from_ymd_opt(2013, 8, 22).unwrap_or_default(),
                maintenance_frequency: 120,
                inputs: RiskInputs {
                    age_years: 38.0,
                    traffic_load_index: 95.0,
                    heavy_vehicle_percentage: 28.0,
                    incident_reports_count: 23.0,
                    flood_exposure_index: 30.0,
                    heat_stress_index: 85.0,
                    earthquake_zone_index: 25.0,
                },
                fpi: 92,
            },
        ];
        Self { bridges }
    }

    pub fn list(&self) -> &[Bridge] {
        &self.bridges
    }

    pub fn find(&self, id: &str) -> Option<&Bridge> {
        self.bridges.iter().find(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.bridges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bridges.is_empty()
    }

    pub fn score_drift(&self) -> Vec<ScoreDrift> {
        self.bridges
            .iter()
            .filter_map(|b| {
                let computed = score(&b.inputs).fpi;
                (computed != b.fpi).then(|| ScoreDrift {
                    id: b.id.clone(),
                    stored_fpi: b.fpi,
                    computed_fpi: computed,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportStatus {
    New,
    InProgress,
    Resolved,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in-progress",
            Self::Resolved => "resolved",
        }
    }
}

/// Field names owned by the store; submitted values under these keys are
/// dropped from a report's free-form details.
pub const RESERVED_REPORT_FIELDS: &[&str] =
    &["id", "status", "problemType", "createdAt", "updatedAt"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewReport {
    pub problem_type: Option<String>,
    pub details: Map<String, Value>,
}

impl NewReport {
    /// Splits a submitted JSON object into the typed problem type and the
    /// remaining free-form details. A non-string problem type is kept in its
    /// compact JSON form.
    pub fn from_submission(mut body: Map<String, Value>) -> Self {
        let problem_type = match body.get("problemType") {
            None | Some(Value::Null) => None,
            Some(Value::String(v)) => Some(v.trim().to_string()),
            Some(other) => Some(other.to_string()),
        }
        .filter(|v| !v.is_empty());
        body.retain(|key, _| !RESERVED_REPORT_FIELDS.contains(&key.as_str()));
        Self {
            problem_type,
            details: body,
        }
    }
}

pub const UNSPECIFIED_PROBLEM_TYPE: &str = "unspecified";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub total: usize,
    pub new: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub by_type: BTreeMap<String, usize>,
}

pub trait ReportRepository: Send {
    fn append(&mut self, new_report: NewReport) -> Report;
    /// Newest first.
    fn list(&self) -> Vec<Report>;
    fn find_by_id(&self, id: &str) -> Option<Report>;
    fn update_status(&mut self, id: &str, status: ReportStatus) -> Result<Report, StorageError>;
    fn stats(&self) -> ReportStats;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("report not found: {0}")]
    NotFound(String),
}

/// Process-local report log. Ids are `RPT-<unix millis>`, bumped by one
/// when two reports land in the same millisecond.
#[derive(Debug, Default)]
pub struct InMemoryReportStore {
    reports: VecDeque<Report>,
    last_id_ms: u64,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> String {
        let id_ms = now_ms().max(self.last_id_ms + 1);
        self.last_id_ms = id_ms;
        format!("RPT-{id_ms}")
    }
}

impl ReportRepository for InMemoryReportStore {
    fn append(&mut self, new_report: NewReport) -> Report {
        let now = Utc::now();
        let report = Report {
            id: self.next_id(),
            problem_type: new_report.problem_type,
            details: new_report.details,
            status: ReportStatus::New,
            created_at: now,
            updated_at: now,
        };
        self.reports.push_front(report.clone());
        report
    }

    fn list(&self) -> Vec<Report> {
        self.reports.iter().cloned().collect()
    }

    fn find_by_id(&self, id: &str) -> Option<Report> {
        self.reports.iter().find(|r| r.id == id).cloned()
    }

    fn update_status(&mut self, id: &str, status: ReportStatus) -> Result<Report, StorageError> {
        let report = self
            .reports
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        report.status = status;
        report.updated_at = Utc::now();
        Ok(report.clone())
    }

    fn stats(&self) -> ReportStats {
        let mut stats = ReportStats {
            total: self.reports.len(),
            ..ReportStats::default()
        };
        for report in &self.reports {
            match report.status {
                ReportStatus::New => stats.new += 1,
                ReportStatus::InProgress => stats.in_progress += 1,
                ReportStatus::Resolved => stats.resolved += 1,
            }
            let kind = report
                .problem_type
                .clone()
                .unwrap_or_else(|| UNSPECIFIED_PROBLEM_TYPE.to_string());
            *stats.by_type.entry(kind).or_insert(0) += 1;
        }
        stats
    }
}

#[allow(clippy::cast_possible_truncation)]
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
