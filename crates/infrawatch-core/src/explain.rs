use chrono::NaiveDate;

use crate::scoring::RiskInputs;

const DAYS_PER_YEAR: f64 = 365.25;

const AGE_YEARS_THRESHOLD: f64 = 40.0;
const MAINTENANCE_GAP_YEARS_THRESHOLD: f64 = 5.0;
const TRAFFIC_LOAD_THRESHOLD: f64 = 70.0;
const HEAVY_VEHICLE_THRESHOLD: f64 = 20.0;
const INCIDENT_THRESHOLD: f64 = 10.0;
const FLOOD_THRESHOLD: f64 = 60.0;
const HEAT_THRESHOLD: f64 = 70.0;
const EARTHQUAKE_THRESHOLD: f64 = 50.0;

pub const NO_CONCERNS_TEXT: &str = "Risk factors are within acceptable ranges";

#[derive(Debug, Clone, PartialEq)]
pub struct RiskExplanation {
    pub reasons: Vec<String>,
    pub text: String,
}

/// Years elapsed between the last maintenance and `as_of`.
#[allow(clippy::cast_precision_loss)]
pub fn maintenance_gap_years(last_maintenance: NaiveDate, as_of: NaiveDate) -> f64 {
    (as_of - last_maintenance).num_days() as f64 / DAYS_PER_YEAR
}

/// Lists the factors that push a bridge above its nominal risk, in a fixed
/// order. `as_of` is the reference date for the maintenance gap.
pub fn explain(
    inputs: &RiskInputs,
    last_maintenance: Option<NaiveDate>,
    as_of: NaiveDate,
) -> RiskExplanation {
    let mut reasons = Vec::new();

    if inputs.age_years > AGE_YEARS_THRESHOLD {
        reasons.push(format!("Age ({} years)", inputs.age_years));
    }
    if let Some(last) = last_maintenance {
        let gap = maintenance_gap_years(last, as_of);
        if gap > MAINTENANCE_GAP_YEARS_THRESHOLD {
            reasons.push(format!("{gap:.1}-year maintenance gap"));
        }
    }
    if inputs.traffic_load_index > TRAFFIC_LOAD_THRESHOLD {
        reasons.push("High traffic load".to_string());
    }
    if inputs.heavy_vehicle_percentage > HEAVY_VEHICLE_THRESHOLD {
        reasons.push("Heavy vehicle usage".to_string());
    }
    if inputs.incident_reports_count > INCIDENT_THRESHOLD {
        reasons.push("Multiple incident reports".to_string());
    }
    if inputs.flood_exposure_index > FLOOD_THRESHOLD {
        reasons.push("Flood-prone area".to_string());
    }
    if inputs.heat_stress_index > HEAT_THRESHOLD {
        reasons.push("Heat stress exposure".to_string());
    }
    if inputs.earthquake_zone_index > EARTHQUAKE_THRESHOLD {
        reasons.push("Seismic risk zone".to_string());
    }

    let text = if reasons.is_empty() {
        NO_CONCERNS_TEXT.to_string()
    } else {
        format!("High risk due to: {}", reasons.join(", "))
    };
    RiskExplanation { reasons, text }
}
