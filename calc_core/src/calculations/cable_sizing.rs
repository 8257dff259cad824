//! # Cable Sizing
//!
//! Selects the smallest conductor of a cable family that satisfies both the
//! current-carrying and voltage-drop requirements of BS 7671:
//!
//! ```text
//! Ib ≤ In ≤ It × Ca × Cg × Ci
//! voltage drop ≤ limit for the circuit use
//! ```
//!
//! Every size examined is reported with the reason it was rejected, so the
//! result explains itself when a larger cable than expected comes out.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::cable_sizing::{calculate, CableSizingInput};
//! use calc_core::cables::{CableType, InstallationMethod};
//!
//! let input = CableSizingInput {
//!     cable_type: CableType::PvcTwinEarth,
//!     method: InstallationMethod::C,
//!     design_current_a: 20.0,
//!     length_m: 20.0,
//!     ..CableSizingInput::new("Kitchen radial")
//! };
//!
//! let result = calculate(&input).unwrap();
//! // 1.5 mm² carries the current but drops 5.04 %
//! assert_eq!(result.selected_size_mm2, 2.5);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::supply::SupplyPhase;
use super::voltage_drop::{self, CircuitUse, VoltageDropInput};
use crate::cables::{get_cable_data, CableType, InstallationMethod};
use crate::errors::{require_positive, CalcError, CalcResult};

/// Standard protective device ratings (A), BS EN 60898 / BS 88
pub const STANDARD_DEVICE_RATINGS_A: [f64; 15] = [
    6.0, 10.0, 16.0, 20.0, 25.0, 32.0, 40.0, 50.0, 63.0, 80.0, 100.0, 125.0, 160.0, 200.0, 250.0,
];

/// Smallest standard device rating at or above `current_a`
pub fn next_device_rating(current_a: f64) -> Option<f64> {
    STANDARD_DEVICE_RATINGS_A.iter().copied().find(|r| *r >= current_a)
}

fn unity() -> f64 {
    1.0
}

/// Input parameters for cable selection.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Outbuilding sub-main",
///   "cable_type": "swa-xlpe",
///   "method": "D2",
///   "design_current_a": 32.0,
///   "device_rating_a": 40.0,
///   "length_m": 45.0,
///   "grouping_factor": 0.8
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableSizingInput {
    pub label: String,

    pub cable_type: CableType,

    pub method: InstallationMethod,

    /// Design current Ib (A)
    pub design_current_a: f64,

    /// Protective device rating In (A); defaults to the next standard rating above Ib
    #[serde(default)]
    pub device_rating_a: Option<f64>,

    pub length_m: f64,

    /// Ambient temperature factor Ca
    #[serde(default = "unity")]
    pub ambient_factor: f64,

    /// Grouping factor Cg
    #[serde(default = "unity")]
    pub grouping_factor: f64,

    /// Thermal insulation factor Ci
    #[serde(default = "unity")]
    pub insulation_factor: f64,

    #[serde(default = "unity")]
    pub power_factor: f64,

    #[serde(default)]
    pub phase: SupplyPhase,

    #[serde(default)]
    pub circuit_use: CircuitUse,

    /// Supply voltage for the drop check; nominal for the phase when unset
    #[serde(default)]
    pub supply_voltage_v: Option<f64>,

    /// Voltage drop limit (%) replacing the circuit-use default
    #[serde(default)]
    pub limit_percent: Option<f64>,
}

impl CableSizingInput {
    pub fn new(label: impl Into<String>) -> Self {
        CableSizingInput {
            label: label.into(),
            cable_type: CableType::PvcTwinEarth,
            method: InstallationMethod::C,
            design_current_a: 0.0,
            device_rating_a: None,
            length_m: 0.0,
            ambient_factor: 1.0,
            grouping_factor: 1.0,
            insulation_factor: 1.0,
            power_factor: 1.0,
            phase: SupplyPhase::Single,
            circuit_use: CircuitUse::Other,
            supply_voltage_v: None,
            limit_percent: None,
        }
    }

    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        require_positive("design_current_a", self.design_current_a)?;
        require_positive("length_m", self.length_m)?;
        for (field, factor) in [
            ("ambient_factor", self.ambient_factor),
            ("grouping_factor", self.grouping_factor),
            ("insulation_factor", self.insulation_factor),
        ] {
            require_positive(field, factor)?;
            if factor > 1.5 {
                return Err(CalcError::invalid_input(
                    field,
                    factor.to_string(),
                    "Correction factors above 1.5 are not tabulated",
                ));
            }
        }
        if let Some(device) = self.device_rating_a {
            require_positive("device_rating_a", device)?;
            if device < self.design_current_a {
                return Err(CalcError::invalid_input(
                    "device_rating_a",
                    device.to_string(),
                    format!("Device rating must be at least the design current ({} A)", self.design_current_a),
                ));
            }
        }
        Ok(())
    }

    /// Combined correction factor Ca × Cg × Ci
    pub fn correction_factor(&self) -> f64 {
        self.ambient_factor * self.grouping_factor * self.insulation_factor
    }

    /// Device rating In used for the check
    pub fn device_rating(&self) -> CalcResult<f64> {
        match self.device_rating_a {
            Some(device) => Ok(device),
            None => next_device_rating(self.design_current_a).ok_or_else(|| {
                CalcError::calculation_failed(
                    "cable_sizing",
                    format!("no standard device rating covers {} A", self.design_current_a),
                )
            }),
        }
    }
}

/// Why a size was not selected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason")]
pub enum Rejection {
    /// The cable has no rating for this installation method at this size
    NotRatedForMethod,
    /// Derated capacity Iz below the device rating
    InsufficientCapacity { derated_a: f64, required_a: f64 },
    /// Voltage drop over the circuit limit
    ExcessiveVoltageDrop { percent: f64, limit_percent: f64 },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::NotRatedForMethod => write!(f, "not rated for this installation method"),
            Rejection::InsufficientCapacity { derated_a, required_a } => {
                write!(f, "Iz {:.1} A < In {:.1} A", derated_a, required_a)
            }
            Rejection::ExcessiveVoltageDrop { percent, limit_percent } => {
                write!(f, "voltage drop {:.2} % > {:.1} %", percent, limit_percent)
            }
        }
    }
}

/// One examined size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeCheck {
    pub size_mm2: f64,
    /// Tabulated It, if rated for the method
    pub tabulated_a: Option<f64>,
    pub rejection: Option<Rejection>,
}

/// Results from cable selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableSizingResult {
    pub cable_type: CableType,
    pub selected_size_mm2: f64,
    pub device_rating_a: f64,
    pub tabulated_a: f64,
    /// Iz = It × Ca × Cg × Ci
    pub derated_a: f64,
    pub correction_factor: f64,
    pub voltage_drop_v: f64,
    pub voltage_drop_percent: f64,
    pub checks: Vec<SizeCheck>,
}

impl CableSizingResult {
    pub fn passes(&self) -> bool {
        self.derated_a >= self.device_rating_a
    }
}

/// Select the smallest compliant cable size.
///
/// # Returns
///
/// * `Ok(CableSizingResult)` - Selected size plus every size examined
/// * `Err(CalcError::CalculationFailed)` - No size of the family qualifies
pub fn calculate(input: &CableSizingInput) -> CalcResult<CableSizingResult> {
    input.validate()?;

    let cable = get_cable_data(input.cable_type)?;
    let device_rating_a = input.device_rating()?;
    let correction_factor = input.correction_factor();
    let mut checks = Vec::with_capacity(cable.standard_sizes_mm2.len());

    for &size_mm2 in &cable.standard_sizes_mm2 {
        let Some(tabulated_a) = cable.rating(size_mm2, input.method) else {
            checks.push(SizeCheck {
                size_mm2,
                tabulated_a: None,
                rejection: Some(Rejection::NotRatedForMethod),
            });
            continue;
        };

        let derated_a = tabulated_a * correction_factor;
        if derated_a < device_rating_a {
            checks.push(SizeCheck {
                size_mm2,
                tabulated_a: Some(tabulated_a),
                rejection: Some(Rejection::InsufficientCapacity {
                    derated_a,
                    required_a: device_rating_a,
                }),
            });
            continue;
        }

        let vd = voltage_drop::calculate(&VoltageDropInput {
            cable_type: Some(input.cable_type),
            size_mm2,
            length_m: input.length_m,
            current_a: input.design_current_a,
            power_factor: input.power_factor,
            phase: input.phase,
            circuit_use: input.circuit_use,
            supply_voltage_v: input.supply_voltage_v,
            limit_percent: input.limit_percent,
            ..VoltageDropInput::new(input.label.clone())
        })?;

        if !vd.compliant {
            checks.push(SizeCheck {
                size_mm2,
                tabulated_a: Some(tabulated_a),
                rejection: Some(Rejection::ExcessiveVoltageDrop {
                    percent: vd.voltage_drop_percent,
                    limit_percent: vd.limit_percent,
                }),
            });
            continue;
        }

        checks.push(SizeCheck {
            size_mm2,
            tabulated_a: Some(tabulated_a),
            rejection: None,
        });

        debug!(
            label = %input.label,
            cable = %input.cable_type,
            size_mm2,
            derated_a,
            examined = checks.len(),
            "cable size selected"
        );

        return Ok(CableSizingResult {
            cable_type: input.cable_type,
            selected_size_mm2: size_mm2,
            device_rating_a,
            tabulated_a,
            derated_a,
            correction_factor,
            voltage_drop_v: vd.voltage_drop_v,
            voltage_drop_percent: vd.voltage_drop_percent,
            checks,
        });
    }

    Err(CalcError::calculation_failed(
        "cable_sizing",
        format!(
            "no {} size installed by method {} meets In {} A over {} m",
            input.cable_type, input.method, device_rating_a, input.length_m
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn radial() -> CableSizingInput {
        CableSizingInput {
            cable_type: CableType::PvcTwinEarth,
            method: InstallationMethod::C,
            design_current_a: 20.0,
            length_m: 20.0,
            ..CableSizingInput::new("Radial")
        }
    }

    #[test]
    fn test_voltage_drop_drives_selection() {
        let result = calculate(&radial()).unwrap();
        assert_eq!(result.selected_size_mm2, 2.5);
        assert_eq!(result.device_rating_a, 20.0);
        assert_eq!(result.checks.len(), 3);
        assert!(matches!(
            result.checks[1].rejection,
            Some(Rejection::ExcessiveVoltageDrop { .. })
        ));
        assert!(result.checks[2].rejection.is_none());
        assert!(result.passes());
    }

    #[test]
    fn test_grouping_derates_capacity() {
        let input = CableSizingInput {
            grouping_factor: 0.7,
            length_m: 5.0,
            ..radial()
        };
        let result = calculate(&input).unwrap();
        // 1.5 mm²: 26 × 0.7 = 18.2 A < 20 A
        assert_eq!(result.selected_size_mm2, 2.5);
        assert!((result.derated_a - 25.2).abs() < 1e-9);
        assert!(matches!(
            result.checks[1].rejection,
            Some(Rejection::InsufficientCapacity { .. })
        ));
    }

    #[test]
    fn test_default_device_rating() {
        assert_eq!(next_device_rating(20.0), Some(20.0));
        assert_eq!(next_device_rating(21.0), Some(25.0));
        assert_eq!(next_device_rating(300.0), None);
    }

    #[test]
    fn test_no_size_qualifies() {
        let input = CableSizingInput {
            method: InstallationMethod::A1,
            design_current_a: 60.0,
            ..radial()
        };
        let err = calculate(&input).unwrap_err();
        assert_eq!(err.error_code(), "CALCULATION_FAILED");
    }

    #[test]
    fn test_device_below_design_current_rejected() {
        let input = CableSizingInput {
            device_rating_a: Some(16.0),
            ..radial()
        };
        assert_eq!(calculate(&input).unwrap_err().error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_method_not_rated() {
        let input = CableSizingInput {
            method: InstallationMethod::D2,
            ..radial()
        };
        let err = calculate(&input).unwrap_err();
        assert_eq!(err.error_code(), "CALCULATION_FAILED");
    }

    #[test]
    fn test_tighter_limit_upsizes() {
        // 2.5 mm² drops 3.13 % over 20 m at 20 A
        let input = CableSizingInput {
            limit_percent: Some(3.0),
            ..radial()
        };
        let result = calculate(&input).unwrap();
        assert_eq!(result.selected_size_mm2, 4.0);
        assert!(matches!(
            result.checks[2].rejection,
            Some(Rejection::ExcessiveVoltageDrop { limit_percent, .. }) if limit_percent == 3.0
        ));
    }

    #[test]
    fn test_supply_voltage_changes_percent() {
        let input = CableSizingInput {
            supply_voltage_v: Some(240.0),
            ..radial()
        };
        let result = calculate(&input).unwrap();
        assert!((result.voltage_drop_percent - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejection_display() {
        let r = Rejection::InsufficientCapacity {
            derated_a: 18.2,
            required_a: 20.0,
        };
        assert_eq!(r.to_string(), "Iz 18.2 A < In 20.0 A");
    }
}
