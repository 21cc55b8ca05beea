use chrono::NaiveDate;
use infrawatch_core::{ComponentScores, RepairPlan, RiskCategory, RiskInputs, Scored};
use infrawatch_storage::{Bridge, ReportStatus};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct CalculateRiskRequest {
    #[serde(flatten)]
    pub inputs: RiskInputs,
    #[serde(default)]
    pub last_maintenance_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRiskResponse {
    pub fpi: i64,
    pub risk_category: RiskCategory,
    pub explanation: String,
    pub component_scores: ComponentScores,
}

/// An asset as posted by the dashboard. Anything besides `id` and `fpi` is
/// carried through so recommendations echo the caller's objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireAsset {
    pub id: String,
    pub fpi: i64,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Scored for WireAsset {
    fn asset_id(&self) -> &str {
        &self.id
    }

    fn fpi(&self) -> i64 {
        self.fpi
    }
}

#[derive(Debug, Deserialize)]
pub struct OptimizeRepairsRequest {
    #[serde(default, deserialize_with = "whole_number")]
    pub budget: Option<u64>,
    pub assets: Vec<WireAsset>,
}

/// Dashboard clients are loose with numbers; `3` and `3.0` mean the same
/// budget. Fractional or negative values are rejected.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn whole_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(n) = number.as_u64() {
        return Ok(Some(n));
    }
    match number.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(Some(f as u64)),
        _ => Err(serde::de::Error::custom(format!(
            "budget must be a non-negative whole number, got {number}"
        ))),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRepairsResponse {
    pub recommended_repairs: Vec<WireAsset>,
    pub current_total_risk: i64,
    pub new_total_risk: i64,
    /// One decimal, as a string; dashboard clients render it verbatim.
    pub risk_reduction: String,
    pub message: String,
}

impl From<RepairPlan<WireAsset>> for OptimizeRepairsResponse {
    fn from(plan: RepairPlan<WireAsset>) -> Self {
        Self {
            risk_reduction: format!("{:.1}", plan.risk_reduction),
            recommended_repairs: plan.to_repair,
            current_total_risk: plan.current_total_risk,
            new_total_risk: plan.new_total_risk,
            message: plan.message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BridgeView<'a> {
    #[serde(flatten)]
    pub bridge: &'a Bridge,
    pub risk_category: RiskCategory,
}

impl<'a> From<&'a Bridge> for BridgeView<'a> {
    fn from(bridge: &'a Bridge) -> Self {
        Self {
            bridge,
            risk_category: bridge.risk_category(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ReportStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCreated {
    pub success: bool,
    pub message: String,
    pub report_id: String,
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }

    pub fn with_message(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: Some(message.into()),
        }
    }
}
