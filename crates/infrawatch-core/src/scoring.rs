use serde::{Deserialize, Serialize};

pub const FPI_MAX: i64 = 100;
pub const HIGH_RISK_THRESHOLD: i64 = 70;
pub const MEDIUM_RISK_THRESHOLD: i64 = 40;

const AGE_CAP_YEARS: f64 = 100.0;
const INCIDENT_MULTIPLIER: f64 = 5.0;
const INCIDENT_CAP: f64 = 100.0;

/// Weights applied to each normalized factor. They sum to 0.90, so in-range
/// inputs top out at 90; only out-of-range values reach the 100 cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorWeights {
    pub age: f64,
    pub traffic_load: f64,
    pub heavy_vehicles: f64,
    pub incidents: f64,
    pub flood: f64,
    pub heat: f64,
    pub earthquake: f64,
}

pub const FPI_WEIGHTS: FactorWeights = FactorWeights {
    age: 0.15,
    traffic_load: 0.20,
    heavy_vehicles: 0.15,
    incidents: 0.10,
    flood: 0.10,
    heat: 0.10,
    earthquake: 0.10,
};

/// Raw risk attributes of a single bridge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskInputs {
    pub age_years: f64,
    pub traffic_load_index: f64,
    pub heavy_vehicle_percentage: f64,
    pub incident_reports_count: f64,
    pub flood_exposure_index: f64,
    pub heat_stress_index: f64,
    pub earthquake_zone_index: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    pub fn from_fpi(fpi: i64) -> Self {
        if fpi >= HIGH_RISK_THRESHOLD {
            Self::High
        } else if fpi >= MEDIUM_RISK_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskScore {
    pub fpi: i64,
    pub category: RiskCategory,
}

impl RiskScore {
    pub fn from_fpi(fpi: i64) -> Self {
        Self {
            fpi,
            category: RiskCategory::from_fpi(fpi),
        }
    }
}

/// Weighted factor contributions grouped the way inspectors read them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentScores {
    pub structural: f64,
    pub usage: f64,
    pub environmental: f64,
}

#[derive(Debug, Clone, Copy)]
struct WeightedTerms {
    age: f64,
    traffic_load: f64,
    heavy_vehicles: f64,
    incidents: f64,
    flood: f64,
    heat: f64,
    earthquake: f64,
}

fn weighted_terms(inputs: &RiskInputs) -> WeightedTerms {
    let w = FPI_WEIGHTS;
    WeightedTerms {
        age: inputs.age_years.min(AGE_CAP_YEARS) * w.age,
        traffic_load: inputs.traffic_load_index * w.traffic_load,
        heavy_vehicles: inputs.heavy_vehicle_percentage * w.heavy_vehicles,
        incidents: (inputs.incident_reports_count * INCIDENT_MULTIPLIER).min(INCIDENT_CAP)
            * w.incidents,
        flood: inputs.flood_exposure_index * w.flood,
        heat: inputs.heat_stress_index * w.heat,
        earthquake: inputs.earthquake_zone_index * w.earthquake,
    }
}

/// Unrounded weighted sum. Terms are accumulated in a fixed order so the
/// floating point result is reproducible.
pub fn raw_fpi(inputs: &RiskInputs) -> f64 {
    let t = weighted_terms(inputs);
    let mut raw = 0.0;
    raw += t.age;
    raw += t.traffic_load;
    raw += t.heavy_vehicles;
    raw += t.incidents;
    raw += t.flood;
    raw += t.heat;
    raw += t.earthquake;
    raw
}

/// Scores a bridge. Only the upper bound is clamped; range checks belong to
/// the caller (see [`crate::validate_inputs`]).
#[allow(clippy::cast_possible_truncation)]
pub fn score(inputs: &RiskInputs) -> RiskScore {
    let rounded = raw_fpi(inputs).round();
    // NaN saturates to 0 here; validated inputs never produce one.
    let fpi = (rounded as i64).min(FPI_MAX);
    RiskScore::from_fpi(fpi)
}

pub fn component_scores(inputs: &RiskInputs) -> ComponentScores {
    let t = weighted_terms(inputs);
    ComponentScores {
        structural: round1(t.age + t.incidents),
        usage: round1(t.traffic_load + t.heavy_vehicles),
        environmental: round1(t.flood + t.heat + t.earthquake),
    }
}

pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
