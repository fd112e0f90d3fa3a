//! Deterministic sizing and savings math.
//!
//! All constants are fixed; nothing here depends on live data other than the
//! optional roof potential.

use crate::errors::AppError;
use crate::models::RoofQuality;
use crate::solar::BuildingInsights;
use serde::{Deserialize, Serialize};

/// Monthly generation per installed kWp (kWh/kWp/month).
pub const GENERATION_FACTOR: f64 = 120.0;

/// Oversizing applied to the bill-derived target when the roof allows it.
pub const SIZING_HEADROOM: f64 = 1.2;

/// Installed price per kWp (R$).
pub const PRICE_PER_KWP: f64 = 4500.0;

/// Grid emissions avoided per MWh generated (tCO2/MWh).
pub const EMISSIONS_FACTOR: f64 = 0.0817;

/// Monthly multipliers, January first. Southern-hemisphere summer peaks in
/// January; sums to 12.0.
pub const SEASONAL_CURVE: [f64; 12] = [
    1.15, 1.12, 1.08, 1.00, 0.92, 0.85, 0.85, 0.92, 1.00, 1.02, 1.05, 1.04,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateResult {
    pub system_size_kw: f64,
    pub monthly_production_kwh: f64,
    pub annual_savings: f64,
    pub monthly_savings: Vec<f64>,
    pub estimated_cost: f64,
    pub payback_years: Option<f64>,
    pub co2_offset_tons: f64,
    pub roof_quality: RoofQuality,
}

fn validate_positive(value: f64, message: &str) -> Result<(), AppError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::BadRequest(message.to_string()));
    }
    Ok(())
}

/// System size that offsets the whole bill, in kWp.
pub fn bill_target_capacity(tariff: f64, monthly_bill: f64) -> f64 {
    monthly_bill / tariff / GENERATION_FACTOR
}

/// Years until savings cover the cost; `None` when there are no savings.
pub fn payback_years(estimated_cost: f64, annual_savings: f64) -> Option<f64> {
    if annual_savings > 0.0 && annual_savings.is_finite() {
        Some(estimated_cost / annual_savings)
    } else {
        None
    }
}

/// Spreads annual savings over the seasonal curve.
pub fn seasonal_savings(annual_savings: f64) -> Vec<f64> {
    let base = annual_savings / 12.0;
    SEASONAL_CURVE.iter().map(|factor| base * factor).collect()
}

/// Guarantees a 12-entry sequence: anything short, long or non-finite is
/// replaced by a uniform `annual_savings / 12`.
pub fn ensure_twelve_months(values: Vec<f64>, annual_savings: f64) -> Vec<f64> {
    if values.len() == 12 && values.iter().all(|v| v.is_finite()) {
        values
    } else {
        tracing::warn!(
            "Malformed monthly savings ({} entries), using uniform distribution",
            values.len()
        );
        vec![annual_savings / 12.0; 12]
    }
}

/// Sizes the system and computes savings.
///
/// Fails fast with `BadRequest` when `tariff` or `monthly_bill` is not a
/// positive finite number.
pub fn estimate(
    tariff: f64,
    monthly_bill: f64,
    solar_potential: Option<&BuildingInsights>,
) -> Result<EstimateResult, AppError> {
    validate_positive(monthly_bill, "O valor da conta de luz deve ser maior que zero")?;
    validate_positive(tariff, "A tarifa de energia deve ser maior que zero")?;

    let target = bill_target_capacity(tariff, monthly_bill);

    let (system_size_kw, roof_quality) = match solar_potential {
        Some(insights) => {
            let roof_capacity = insights.roof_capacity_kw();
            let quality = if roof_capacity >= target {
                RoofQuality::Excellent
            } else {
                RoofQuality::Fair
            };
            (roof_capacity.min(target * SIZING_HEADROOM), quality)
        }
        None => (target, RoofQuality::Good),
    };

    let monthly_production_kwh = system_size_kw * GENERATION_FACTOR;
    let monthly_savings_base = monthly_production_kwh * tariff;
    let annual_savings = monthly_savings_base * 12.0;
    let estimated_cost = system_size_kw * PRICE_PER_KWP;
    let yearly_production_mwh = monthly_production_kwh * 12.0 / 1000.0;

    tracing::debug!(
        "Estimate: target {:.2} kWp, sized {:.2} kWp, roof {}",
        target,
        system_size_kw,
        roof_quality.as_str()
    );

    Ok(EstimateResult {
        system_size_kw,
        monthly_production_kwh,
        annual_savings,
        monthly_savings: seasonal_savings(annual_savings),
        estimated_cost,
        payback_years: payback_years(estimated_cost, annual_savings),
        co2_offset_tons: yearly_production_mwh * EMISSIONS_FACTOR,
        roof_quality,
    })
}
