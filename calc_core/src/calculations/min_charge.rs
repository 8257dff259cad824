//! # Minimum Charge Calculation
//!
//! Works out the smallest price a job can be quoted at without losing money:
//! billable labour, non-billable travel and admin time, fixed overhead and
//! materials, then a profit uplift and rounding up to a price step.
//!
//! ## Method
//!
//! ```text
//! labour    = rate × hours
//! time_cost = rate × (travel_min + admin_min) / 60
//! base      = labour + overhead + time_cost + materials
//! uplifted  = base × (1 + uplift% / 100)
//! net       = ceil(uplifted / step) × step        (step 0: no rounding)
//! gross     = net × 1.2 when VAT registered
//! ```
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::min_charge::{calculate, MinChargeInput};
//!
//! let input = MinChargeInput {
//!     hourly_rate_gbp: 45.0,
//!     minimum_hours: 1.0,
//!     overhead_gbp: 10.0,
//!     travel_minutes: 30.0,
//!     admin_minutes: 10.0,
//!     uplift_percent: 20.0,
//!     rounding_step_gbp: 5.0,
//!     ..MinChargeInput::new("Call-out")
//! };
//!
//! let result = calculate(&input).unwrap();
//! // 45 + 10 + 30 = 85; × 1.2 = 102; rounded up to 105
//! assert_eq!(result.net_gbp.value(), 105.0);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{require_non_negative, CalcError, CalcResult};
use crate::units::{Gbp, Hours, Minutes};

/// UK standard VAT rate (%)
pub const VAT_RATE_PERCENT: f64 = 20.0;

/// Largest accepted uplift (%)
pub const MAX_UPLIFT_PERCENT: f64 = 500.0;

/// Input parameters for a minimum charge.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Socket swap",
///   "hourly_rate_gbp": 50.0,
///   "minimum_hours": 1.0,
///   "overhead_gbp": 12.0,
///   "travel_minutes": 20.0,
///   "admin_minutes": 15.0,
///   "materials_gbp": 8.5,
///   "uplift_percent": 15.0,
///   "rounding_step_gbp": 5.0,
///   "vat_registered": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinChargeInput {
    pub label: String,

    pub hourly_rate_gbp: f64,

    /// Minimum billable on-site time (h)
    pub minimum_hours: f64,

    /// Fixed overhead per job (van, insurance, tools)
    #[serde(default)]
    pub overhead_gbp: f64,

    #[serde(default)]
    pub travel_minutes: f64,

    #[serde(default)]
    pub admin_minutes: f64,

    #[serde(default)]
    pub materials_gbp: f64,

    /// Profit uplift, clamped into [0, 500]
    #[serde(default)]
    pub uplift_percent: f64,

    /// Round the net price up to a multiple of this; 0 disables rounding
    #[serde(default)]
    pub rounding_step_gbp: f64,

    #[serde(default)]
    pub vat_registered: bool,
}

impl MinChargeInput {
    pub fn new(label: impl Into<String>) -> Self {
        MinChargeInput {
            label: label.into(),
            hourly_rate_gbp: 0.0,
            minimum_hours: 0.0,
            overhead_gbp: 0.0,
            travel_minutes: 0.0,
            admin_minutes: 0.0,
            materials_gbp: 0.0,
            uplift_percent: 0.0,
            rounding_step_gbp: 0.0,
            vat_registered: false,
        }
    }

    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        require_non_negative("hourly_rate_gbp", self.hourly_rate_gbp)?;
        require_non_negative("minimum_hours", self.minimum_hours)?;
        require_non_negative("overhead_gbp", self.overhead_gbp)?;
        require_non_negative("travel_minutes", self.travel_minutes)?;
        require_non_negative("admin_minutes", self.admin_minutes)?;
        require_non_negative("materials_gbp", self.materials_gbp)?;
        require_non_negative("rounding_step_gbp", self.rounding_step_gbp)?;
        if !self.uplift_percent.is_finite() {
            return Err(CalcError::invalid_input(
                "uplift_percent",
                self.uplift_percent.to_string(),
                "Uplift must be a percentage between 0 and 500",
            ));
        }
        Ok(())
    }

    /// Travel plus admin time
    pub fn non_billable_time(&self) -> Hours {
        Minutes(self.travel_minutes + self.admin_minutes).into()
    }
}

/// Breakdown of a minimum charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinChargeResult {
    pub labour_gbp: Gbp,
    pub time_cost_gbp: Gbp,
    pub overhead_gbp: Gbp,
    pub materials_gbp: Gbp,
    /// Cost before uplift
    pub base_gbp: Gbp,
    pub uplift_percent: f64,
    pub uplifted_gbp: Gbp,
    /// Price to quote, excluding VAT
    pub net_gbp: Gbp,
    pub vat_gbp: Gbp,
    /// Price including VAT
    pub gross_gbp: Gbp,
    /// Net price per hour of total time spent on the job
    pub effective_hourly_gbp: Gbp,
}

impl MinChargeResult {
    /// True when the quote at least covers base cost
    pub fn passes(&self) -> bool {
        self.net_gbp.value() >= self.base_gbp.value()
    }
}

/// Round `value` up to a multiple of `step`. A zero step rounds to pence.
pub fn round_up_to_step(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return Gbp(value).to_pence().value();
    }
    // guard against 102.00000000001 rounding to the next step
    let steps = (value / step - 1e-9).ceil();
    steps.max(0.0) * step
}

/// Calculate the minimum charge for a job.
pub fn calculate(input: &MinChargeInput) -> CalcResult<MinChargeResult> {
    input.validate()?;

    let uplift_percent = input.uplift_percent.clamp(0.0, MAX_UPLIFT_PERCENT);
    if uplift_percent != input.uplift_percent {
        warn!(label = %input.label, requested = input.uplift_percent, used = uplift_percent, "uplift clamped");
    }

    let rate = input.hourly_rate_gbp;
    let extra_hours = input.non_billable_time();
    let labour = rate * input.minimum_hours;
    let time_cost = rate * extra_hours.value();
    let base = labour + input.overhead_gbp + time_cost + input.materials_gbp;
    let uplifted = base * (1.0 + uplift_percent / 100.0);
    let net = round_up_to_step(uplifted, input.rounding_step_gbp);
    let vat = if input.vat_registered { net * VAT_RATE_PERCENT / 100.0 } else { 0.0 };

    let total_hours = input.minimum_hours + extra_hours.value();
    let effective_hourly = if total_hours > 0.0 { net / total_hours } else { 0.0 };

    debug!(label = %input.label, base, uplifted, net, vat, "minimum charge calculated");

    Ok(MinChargeResult {
        labour_gbp: Gbp(labour),
        time_cost_gbp: Gbp(time_cost),
        overhead_gbp: Gbp(input.overhead_gbp),
        materials_gbp: Gbp(input.materials_gbp),
        base_gbp: Gbp(base),
        uplift_percent,
        uplifted_gbp: Gbp(uplifted),
        net_gbp: Gbp(net),
        vat_gbp: Gbp(vat).to_pence(),
        gross_gbp: Gbp(net + vat).to_pence(),
        effective_hourly_gbp: Gbp(effective_hourly).to_pence(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call_out() -> MinChargeInput {
        MinChargeInput {
            hourly_rate_gbp: 45.0,
            minimum_hours: 1.0,
            overhead_gbp: 10.0,
            travel_minutes: 30.0,
            admin_minutes: 10.0,
            uplift_percent: 20.0,
            rounding_step_gbp: 5.0,
            ..MinChargeInput::new("Call-out")
        }
    }

    #[test]
    fn test_breakdown() {
        let result = calculate(&call_out()).unwrap();
        assert!((result.labour_gbp.value() - 45.0).abs() < 1e-9);
        assert!((result.time_cost_gbp.value() - 30.0).abs() < 1e-9);
        assert!((result.base_gbp.value() - 85.0).abs() < 1e-9);
        assert!((result.uplifted_gbp.value() - 102.0).abs() < 1e-9);
        assert_eq!(result.net_gbp.value(), 105.0);
        assert_eq!(result.vat_gbp.value(), 0.0);
        assert!(result.passes());
    }

    #[test]
    fn test_vat_added_when_registered() {
        let mut input = call_out();
        input.vat_registered = true;
        let result = calculate(&input).unwrap();
        assert_eq!(result.vat_gbp.value(), 21.0);
        assert_eq!(result.gross_gbp.value(), 126.0);
    }

    #[test]
    fn test_zero_step_rounds_to_pence() {
        let mut input = call_out();
        input.rounding_step_gbp = 0.0;
        input.uplift_percent = 0.0;
        input.materials_gbp = 0.333;
        let result = calculate(&input).unwrap();
        assert_eq!(result.net_gbp.value(), 85.33);
    }

    #[test]
    fn test_exact_multiple_not_bumped() {
        assert_eq!(round_up_to_step(100.0, 5.0), 100.0);
        assert_eq!(round_up_to_step(100.01, 5.0), 105.0);
        assert_eq!(round_up_to_step(0.0, 5.0), 0.0);
    }

    #[test]
    fn test_effective_hourly() {
        let result = calculate(&call_out()).unwrap();
        // 105 over 1 h 40 min
        assert_eq!(result.effective_hourly_gbp.value(), 63.0);
    }

    #[test]
    fn test_uplift_clamped() {
        let mut input = call_out();
        input.uplift_percent = 900.0;
        assert_eq!(calculate(&input).unwrap().uplift_percent, MAX_UPLIFT_PERCENT);
        input.uplift_percent = -10.0;
        let result = calculate(&input).unwrap();
        assert_eq!(result.uplift_percent, 0.0);
        assert_eq!(result.net_gbp.value(), 85.0);
    }

    #[test]
    fn test_negative_rate_rejected() {
        let mut input = call_out();
        input.hourly_rate_gbp = -45.0;
        assert_eq!(calculate(&input).unwrap_err().error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_gbp_display() {
        let result = calculate(&call_out()).unwrap();
        assert_eq!(result.net_gbp.to_string(), "£105.00");
    }
}
