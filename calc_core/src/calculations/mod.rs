//! # Electrical Calculations
//!
//! Each calculation follows the same pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable), with `validate()`
//! - `*Result` - Calculation results (JSON-serializable), with `passes()`
//! - `calculate(input) -> CalcResult<*Result>` - Pure calculation function
//!
//! ## Available Calculations
//!
//! - [`voltage_drop`] - Voltage drop against the 3 % / 5 % limits
//! - [`max_demand`] - Diversified maximum demand and supply service size
//! - [`min_charge`] - Minimum job price from rate, time and overhead
//! - [`cable_sizing`] - Smallest compliant conductor for a circuit
//! - [`earth_fault_loop`] - Predicted Zs against device maximum

pub mod cable_sizing;
pub mod earth_fault_loop;
pub mod max_demand;
pub mod min_charge;
pub mod supply;
pub mod voltage_drop;

use serde::{Deserialize, Serialize};

use crate::errors::CalcResult;

pub use cable_sizing::{CableSizingInput, CableSizingResult};
pub use earth_fault_loop::{EarthFaultLoopInput, EarthFaultLoopResult};
pub use max_demand::{MaxDemandInput, MaxDemandResult};
pub use min_charge::{MinChargeInput, MinChargeResult};
pub use supply::{EarthingSystem, SupplyPhase};
pub use voltage_drop::{VoltageDropInput, VoltageDropResult};

/// Enum wrapper for all calculation types.
///
/// Lets a job hold heterogeneous calculations in one collection.
///
/// ## JSON Example
///
/// ```json
/// { "type": "MinimumCharge", "label": "Call-out", "hourly_rate_gbp": 45.0, "minimum_hours": 1.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalculationItem {
    VoltageDrop(VoltageDropInput),
    MaxDemand(MaxDemandInput),
    MinimumCharge(MinChargeInput),
    CableSizing(CableSizingInput),
    EarthFaultLoop(EarthFaultLoopInput),
}

impl CalculationItem {
    /// Get the user-provided label for this calculation
    pub fn label(&self) -> &str {
        match self {
            CalculationItem::VoltageDrop(i) => &i.label,
            CalculationItem::MaxDemand(i) => &i.label,
            CalculationItem::MinimumCharge(i) => &i.label,
            CalculationItem::CableSizing(i) => &i.label,
            CalculationItem::EarthFaultLoop(i) => &i.label,
        }
    }

    /// Get the calculation type as a string
    pub fn calc_type(&self) -> &'static str {
        match self {
            CalculationItem::VoltageDrop(_) => "VoltageDrop",
            CalculationItem::MaxDemand(_) => "MaxDemand",
            CalculationItem::MinimumCharge(_) => "MinimumCharge",
            CalculationItem::CableSizing(_) => "CableSizing",
            CalculationItem::EarthFaultLoop(_) => "EarthFaultLoop",
        }
    }

    /// Run the wrapped calculation
    pub fn run(&self) -> CalcResult<CalculationOutcome> {
        Ok(match self {
            CalculationItem::VoltageDrop(i) => CalculationOutcome::VoltageDrop(voltage_drop::calculate(i)?),
            CalculationItem::MaxDemand(i) => CalculationOutcome::MaxDemand(max_demand::calculate(i)?),
            CalculationItem::MinimumCharge(i) => CalculationOutcome::MinimumCharge(min_charge::calculate(i)?),
            CalculationItem::CableSizing(i) => CalculationOutcome::CableSizing(cable_sizing::calculate(i)?),
            CalculationItem::EarthFaultLoop(i) => {
                CalculationOutcome::EarthFaultLoop(earth_fault_loop::calculate(i)?)
            }
        })
    }
}

/// Result of running a [`CalculationItem`], tagged the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalculationOutcome {
    VoltageDrop(VoltageDropResult),
    MaxDemand(MaxDemandResult),
    MinimumCharge(MinChargeResult),
    CableSizing(CableSizingResult),
    EarthFaultLoop(EarthFaultLoopResult),
}

impl CalculationOutcome {
    pub fn passes(&self) -> bool {
        match self {
            CalculationOutcome::VoltageDrop(r) => r.passes(),
            CalculationOutcome::MaxDemand(r) => r.passes(),
            CalculationOutcome::MinimumCharge(r) => r.passes(),
            CalculationOutcome::CableSizing(r) => r.passes(),
            CalculationOutcome::EarthFaultLoop(r) => r.passes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_json() {
        let json = r#"{
            "type": "MinimumCharge",
            "label": "Call-out",
            "hourly_rate_gbp": 45.0,
            "minimum_hours": 1.0
        }"#;
        let item: CalculationItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.calc_type(), "MinimumCharge");
        assert_eq!(item.label(), "Call-out");

        let outcome = item.run().unwrap();
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["type"], "MinimumCharge");
        assert_eq!(value["net_gbp"], 45.0);
    }

    #[test]
    fn test_run_propagates_errors() {
        let item = CalculationItem::VoltageDrop(VoltageDropInput::new("Blank"));
        assert!(item.run().is_err());
    }

    #[test]
    fn test_outcome_passes() {
        let item = CalculationItem::VoltageDrop(VoltageDropInput {
            mv_per_a_m: Some(18.0),
            length_m: 10.0,
            current_a: 10.0,
            ..VoltageDropInput::new("Short run")
        });
        assert!(item.run().unwrap().passes());
    }
}
