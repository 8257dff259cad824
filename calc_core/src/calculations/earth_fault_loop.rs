//! # Earth Fault Loop Impedance
//!
//! Predicts Zs for a final circuit and checks it against the maximum for the
//! protective device, so automatic disconnection happens within the required
//! time.
//!
//! ```text
//! R1+R2  = (r1 + r2) × L × 1.20 / 1000        (mΩ/m at 20 °C, Ω result)
//! Zs     = Ze + (R1+R2)
//! max Zs = U0 × Cmin / Ia                      (Ia = k × In)
//! ```
//!
//! The 1.20 multiplier corrects 20 °C resistances to 70 °C operating
//! temperature. Measured values at ambient are compared against 80 % of the
//! maximum.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::earth_fault_loop::{max_zs, DeviceType, ProtectiveDevice};
//!
//! let b32 = ProtectiveDevice { device_type: DeviceType::McbB, rating_a: 32.0 };
//! assert!((max_zs(&b32) - 1.3656).abs() < 1e-4);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::supply::{EarthingSystem, NOMINAL_SINGLE_PHASE_V};
use crate::errors::{require_non_negative, require_positive, CalcError, CalcResult};
use crate::units::{MilliOhms, Ohms};

/// Minimum voltage factor Cmin
pub const C_MIN: f64 = 0.95;

/// Multiplier from 20 °C to 70 °C conductor resistance
pub const OPERATING_TEMP_MULTIPLIER: f64 = 1.20;

/// Fraction of max Zs that a measured value should not exceed
pub const MEASURED_ZS_RATIO: f64 = 0.8;

/// Copper conductor resistance at 20 °C (size mm², mΩ/m)
const COPPER_RESISTANCE_20C: [(f64, f64); 17] = [
    (1.0, 18.10),
    (1.5, 12.10),
    (2.5, 7.41),
    (4.0, 4.61),
    (6.0, 3.08),
    (10.0, 1.83),
    (16.0, 1.15),
    (25.0, 0.727),
    (35.0, 0.524),
    (50.0, 0.387),
    (70.0, 0.268),
    (95.0, 0.193),
    (120.0, 0.153),
    (150.0, 0.124),
    (185.0, 0.0991),
    (240.0, 0.0754),
    (300.0, 0.0601),
];

/// Copper resistance at 20 °C for a conductor size.
pub fn copper_resistance_20c(size_mm2: f64) -> CalcResult<MilliOhms> {
    COPPER_RESISTANCE_20C
        .iter()
        .find(|(s, _)| (s - size_mm2).abs() < 1e-6)
        .map(|(_, r)| MilliOhms(*r))
        .ok_or_else(|| CalcError::cable_not_found(format!("copper conductor {} mm²", size_mm2)))
}

/// Expected R1+R2 at operating temperature for a copper circuit.
pub fn expected_r1_r2(line_size_mm2: f64, cpc_size_mm2: f64, length_m: f64) -> CalcResult<Ohms> {
    require_non_negative("length_m", length_m)?;
    let r1 = copper_resistance_20c(line_size_mm2)?;
    let r2 = copper_resistance_20c(cpc_size_mm2)?;
    let loop_mohm = (r1 + r2) * length_m * OPERATING_TEMP_MULTIPLIER;
    Ok(loop_mohm.into())
}

/// Protective device family.
///
/// RCBOs share the overcurrent curves of the equivalent MCB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    McbB,
    McbC,
    McbD,
    RcboB,
    RcboC,
    RcboD,
}

impl DeviceType {
    /// Multiple of In that guarantees instantaneous tripping
    pub fn instantaneous_multiple(&self) -> f64 {
        match self {
            DeviceType::McbB | DeviceType::RcboB => 5.0,
            DeviceType::McbC | DeviceType::RcboC => 10.0,
            DeviceType::McbD | DeviceType::RcboD => 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProtectiveDevice {
    pub device_type: DeviceType,
    pub rating_a: f64,
}

impl ProtectiveDevice {
    /// Current causing instantaneous disconnection Ia (A)
    pub fn disconnection_current_a(&self) -> f64 {
        self.device_type.instantaneous_multiple() * self.rating_a
    }
}

/// Maximum earth fault loop impedance for a device (Ω).
pub fn max_zs(device: &ProtectiveDevice) -> f64 {
    NOMINAL_SINGLE_PHASE_V * C_MIN / device.disconnection_current_a()
}

/// Input for a Zs prediction.
///
/// Supply either a measured `r1_r2_ohms` or the conductor sizes and length.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "C4 Sockets",
///   "earthing": "TN-C-S",
///   "line_size_mm2": 2.5,
///   "cpc_size_mm2": 1.5,
///   "length_m": 25.0,
///   "device": { "device_type": "McbB", "rating_a": 32.0 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarthFaultLoopInput {
    pub label: String,

    /// Supply earthing; TN-C-S when neither the item nor the job sets it
    #[serde(default)]
    pub earthing: Option<EarthingSystem>,

    /// Measured or declared Ze; defaults to the typical value for `earthing`
    #[serde(default)]
    pub ze_ohms: Option<f64>,

    /// Measured R1+R2, used instead of the conductor calculation
    #[serde(default)]
    pub r1_r2_ohms: Option<f64>,

    #[serde(default)]
    pub line_size_mm2: f64,

    #[serde(default)]
    pub cpc_size_mm2: f64,

    #[serde(default)]
    pub length_m: f64,

    pub device: ProtectiveDevice,
}

impl EarthFaultLoopInput {
    pub fn new(label: impl Into<String>, device: ProtectiveDevice) -> Self {
        EarthFaultLoopInput {
            label: label.into(),
            earthing: None,
            ze_ohms: None,
            r1_r2_ohms: None,
            line_size_mm2: 0.0,
            cpc_size_mm2: 0.0,
            length_m: 0.0,
            device,
        }
    }

    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        require_positive("device.rating_a", self.device.rating_a)?;
        if let Some(ze) = self.ze_ohms {
            require_non_negative("ze_ohms", ze)?;
        }
        match self.r1_r2_ohms {
            Some(r) => require_non_negative("r1_r2_ohms", r),
            None => {
                require_positive("line_size_mm2", self.line_size_mm2)?;
                require_positive("cpc_size_mm2", self.cpc_size_mm2)?;
                require_positive("length_m", self.length_m)
            }
        }
    }

    pub fn ze(&self) -> Ohms {
        Ohms(
            self.ze_ohms
                .unwrap_or_else(|| self.earthing.unwrap_or_default().typical_ze_ohms()),
        )
    }
}

/// Results of a Zs prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarthFaultLoopResult {
    pub ze_ohms: Ohms,
    pub r1_r2_ohms: Ohms,
    pub zs_ohms: Ohms,
    pub max_zs_ohms: Ohms,
    /// 80 % of max Zs, for comparison with measured values
    pub max_measured_zs_ohms: Ohms,
    pub compliant: bool,
    /// Whether Zs would also satisfy the 80 % limit
    pub within_measured_limit: bool,
    /// Prospective earth fault current U0 / Zs (A)
    pub prospective_fault_current_a: f64,
}

impl EarthFaultLoopResult {
    pub fn passes(&self) -> bool {
        self.compliant
    }
}

/// Predict Zs and compare against the device maximum.
pub fn calculate(input: &EarthFaultLoopInput) -> CalcResult<EarthFaultLoopResult> {
    input.validate()?;

    let ze = input.ze();
    let r1_r2 = match input.r1_r2_ohms {
        Some(r) => Ohms(r),
        None => expected_r1_r2(input.line_size_mm2, input.cpc_size_mm2, input.length_m)?,
    };
    let zs = ze + r1_r2;
    if zs.value() <= 0.0 {
        return Err(CalcError::invalid_input(
            "zs_ohms",
            zs.value().to_string(),
            "Ze + R1+R2 must be greater than zero",
        ));
    }
    let max = Ohms(max_zs(&input.device));
    let max_measured = max * MEASURED_ZS_RATIO;
    let prospective_fault_current_a = NOMINAL_SINGLE_PHASE_V / zs.value();

    debug!(
        label = %input.label,
        ze = ze.value(),
        r1_r2 = r1_r2.value(),
        zs = zs.value(),
        max_zs = max.value(),
        "earth fault loop calculated"
    );

    Ok(EarthFaultLoopResult {
        ze_ohms: ze,
        r1_r2_ohms: r1_r2,
        zs_ohms: zs,
        max_zs_ohms: max,
        max_measured_zs_ohms: max_measured,
        compliant: zs <= max,
        within_measured_limit: zs <= max_measured,
        prospective_fault_current_a,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b32() -> ProtectiveDevice {
        ProtectiveDevice {
            device_type: DeviceType::McbB,
            rating_a: 32.0,
        }
    }

    fn sockets() -> EarthFaultLoopInput {
        EarthFaultLoopInput {
            line_size_mm2: 2.5,
            cpc_size_mm2: 1.5,
            length_m: 20.0,
            ..EarthFaultLoopInput::new("Sockets", b32())
        }
    }

    #[test]
    fn test_expected_r1_r2() {
        let r = expected_r1_r2(2.5, 1.5, 20.0).unwrap();
        // (7.41 + 12.10) × 20 × 1.2 / 1000
        assert!((r.value() - 0.46824).abs() < 1e-9);
    }

    #[test]
    fn test_max_zs_table() {
        assert!((max_zs(&b32()) - 1.3656).abs() < 1e-4);
        let c16 = ProtectiveDevice {
            device_type: DeviceType::McbC,
            rating_a: 16.0,
        };
        assert!((max_zs(&c16) - 1.3656).abs() < 1e-4);
        let rcbo = ProtectiveDevice {
            device_type: DeviceType::RcboB,
            rating_a: 32.0,
        };
        assert_eq!(max_zs(&rcbo), max_zs(&b32()));
    }

    #[test]
    fn test_tn_c_s_circuit_complies() {
        let result = calculate(&sockets()).unwrap();
        assert!((result.zs_ohms.value() - 0.81824).abs() < 1e-9);
        assert!(result.compliant);
        assert!(result.within_measured_limit);
        assert!((result.prospective_fault_current_a - 281.09).abs() < 0.01);
    }

    #[test]
    fn test_tt_system_fails_mcb() {
        let input = EarthFaultLoopInput {
            earthing: Some(EarthingSystem::Tt),
            ..sockets()
        };
        let result = calculate(&input).unwrap();
        assert!(!result.passes());
    }

    #[test]
    fn test_measured_r1_r2() {
        let input = EarthFaultLoopInput {
            ze_ohms: Some(0.2),
            r1_r2_ohms: Some(1.0),
            ..EarthFaultLoopInput::new("Measured", b32())
        };
        let result = calculate(&input).unwrap();
        assert!((result.zs_ohms.value() - 1.2).abs() < 1e-9);
        assert!(result.compliant);
        assert!(!result.within_measured_limit);
    }

    #[test]
    fn test_unknown_conductor_size() {
        assert_eq!(expected_r1_r2(3.0, 1.5, 10.0).unwrap_err().error_code(), "CABLE_NOT_FOUND");
    }

    #[test]
    fn test_zero_loop_impedance_rejected() {
        let input = EarthFaultLoopInput {
            ze_ohms: Some(0.0),
            r1_r2_ohms: Some(0.0),
            ..EarthFaultLoopInput::new("Shorted", b32())
        };
        let err = calculate(&input).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_result_reads_back_from_json() {
        let result = calculate(&sockets()).unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let parsed: EarthFaultLoopResult = serde_json::from_str(&json).unwrap();
        assert!((parsed.prospective_fault_current_a - result.prospective_fault_current_a).abs() < 1e-9);
        assert_eq!(parsed.compliant, result.compliant);
    }

    #[test]
    fn test_missing_conductors() {
        let input = EarthFaultLoopInput::new("Empty", b32());
        assert_eq!(calculate(&input).unwrap_err().error_code(), "INVALID_INPUT");
    }
}
