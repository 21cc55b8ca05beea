use thiserror::Error;

use crate::optimizer::Scored;
use crate::scoring::{RiskInputs, FPI_MAX};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("asset at position {index} has an empty id")]
    EmptyId { index: usize },
}

fn check(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
            value,
        });
    }
    Ok(())
}

/// Rejects inputs the scorer would otherwise carry into an out-of-range FPI.
pub fn validate_inputs(inputs: &RiskInputs) -> Result<(), ValidationError> {
    check("age_years", inputs.age_years, 0.0, f64::MAX)?;
    check("traffic_load_index", inputs.traffic_load_index, 0.0, 100.0)?;
    check(
        "heavy_vehicle_percentage",
        inputs.heavy_vehicle_percentage,
        0.0,
        100.0,
    )?;
    check(
        "incident_reports_count",
        inputs.incident_reports_count,
        0.0,
        f64::MAX,
    )?;
    check("flood_exposure_index", inputs.flood_exposure_index, 0.0, 100.0)?;
    check("heat_stress_index", inputs.heat_stress_index, 0.0, 100.0)?;
    check("earthquake_zone_index", inputs.earthquake_zone_index, 0.0, 100.0)
}

#[allow(clippy::cast_precision_loss)]
pub fn validate_assets<A: Scored>(assets: &[A]) -> Result<(), ValidationError> {
    for (index, asset) in assets.iter().enumerate() {
        if asset.asset_id().trim().is_empty() {
            return Err(ValidationError::EmptyId { index });
        }
        let fpi = asset.fpi();
        if !(0..=FPI_MAX).contains(&fpi) {
            return Err(ValidationError::OutOfRange {
                field: format!("assets[{index}].fpi"),
                min: 0.0,
                max: FPI_MAX as f64,
                value: fpi as f64,
            });
        }
    }
    Ok(())
}
