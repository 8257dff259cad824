//! # Voltage Drop Calculation
//!
//! Checks the voltage drop along a circuit against the BS 7671 Appendix 4
//! limits (3 % lighting, 5 % other uses, for installations supplied from a
//! public LV network).
//!
//! ## Method
//!
//! ```text
//! mV_eff  = (mV/A/m × cos φ + x × sin φ) × phase factor
//! drop_V  = mV_eff × material multiplier × length × Ib / 1000
//! drop_%  = drop_V / U0 × 100
//! ```
//!
//! `x` is the loop reactance in mV/A/m. At unity power factor `mV_eff` is the
//! tabulated value.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::voltage_drop::{calculate, CircuitUse, VoltageDropInput};
//! use calc_core::cables::CableType;
//!
//! let input = VoltageDropInput {
//!     cable_type: Some(CableType::PvcTwinEarth),
//!     size_mm2: 2.5,
//!     length_m: 20.0,
//!     current_a: 20.0,
//!     circuit_use: CircuitUse::Other,
//!     ..VoltageDropInput::new("Kitchen radial")
//! };
//!
//! let result = calculate(&input).unwrap();
//! assert!((result.voltage_drop_v - 7.2).abs() < 0.01);
//! assert!(result.compliant);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::supply::SupplyPhase;
use crate::cables::{voltage_drop_data, CableType, ConductorMaterial};
use crate::errors::{require_positive, CalcError, CalcResult};

/// Lowest power factor accepted before clamping
pub const MIN_POWER_FACTOR: f64 = 0.1;

/// What the circuit supplies; selects the permitted drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CircuitUse {
    Lighting,
    #[default]
    Other,
}

impl CircuitUse {
    /// Maximum permitted voltage drop (% of nominal)
    pub fn limit_percent(&self) -> f64 {
        match self {
            CircuitUse::Lighting => 3.0,
            CircuitUse::Other => 5.0,
        }
    }
}

fn default_power_factor() -> f64 {
    1.0
}

/// Input parameters for a voltage drop check.
///
/// Either `cable_type` (for a database lookup of mV/A/m and reactance at
/// `size_mm2`) or an explicit `mv_per_a_m` must be given. An explicit value
/// wins over the database.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Garage sub-main",
///   "cable_type": "swa-xlpe",
///   "size_mm2": 10.0,
///   "length_m": 35.0,
///   "current_a": 40.0,
///   "power_factor": 0.9,
///   "phase": "Single",
///   "circuit_use": "Other"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageDropInput {
    /// User label (e.g., "C3 Kitchen sockets")
    pub label: String,

    #[serde(default)]
    pub cable_type: Option<CableType>,

    /// Line conductor size (mm²)
    pub size_mm2: f64,

    /// Explicit tabulated mV/A/m, overriding the database
    #[serde(default)]
    pub mv_per_a_m: Option<f64>,

    /// Route length (m)
    pub length_m: f64,

    /// Design current Ib (A)
    pub current_a: f64,

    #[serde(default = "default_power_factor")]
    pub power_factor: f64,

    #[serde(default)]
    pub material: ConductorMaterial,

    #[serde(default)]
    pub phase: SupplyPhase,

    /// Supply voltage; defaults to the nominal voltage for `phase`
    #[serde(default)]
    pub supply_voltage_v: Option<f64>,

    #[serde(default)]
    pub circuit_use: CircuitUse,

    /// Overrides the limit for `circuit_use` (e.g. 6 % / 8 % on a private supply)
    #[serde(default)]
    pub limit_percent: Option<f64>,
}

impl VoltageDropInput {
    /// Empty input with defaults, for struct-update syntax
    pub fn new(label: impl Into<String>) -> Self {
        VoltageDropInput {
            label: label.into(),
            cable_type: None,
            size_mm2: 0.0,
            mv_per_a_m: None,
            length_m: 0.0,
            current_a: 0.0,
            power_factor: default_power_factor(),
            material: ConductorMaterial::Copper,
            phase: SupplyPhase::Single,
            supply_voltage_v: None,
            circuit_use: CircuitUse::Other,
            limit_percent: None,
        }
    }

    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        require_positive("length_m", self.length_m)?;
        require_positive("current_a", self.current_a)?;
        if let Some(v) = self.supply_voltage_v {
            require_positive("supply_voltage_v", v)?;
        }
        if let Some(limit) = self.limit_percent {
            require_positive("limit_percent", limit)?;
        }
        if let Some(mv) = self.mv_per_a_m {
            require_positive("mv_per_a_m", mv)?;
        } else {
            if self.cable_type.is_none() {
                return Err(CalcError::missing_field("cable_type or mv_per_a_m"));
            }
            require_positive("size_mm2", self.size_mm2)?;
        }
        if !self.power_factor.is_finite() {
            return Err(CalcError::invalid_input(
                "power_factor",
                self.power_factor.to_string(),
                "Power factor must be a number between 0.1 and 1.0",
            ));
        }
        Ok(())
    }

    /// Voltage used for the percentage
    pub fn voltage_v(&self) -> f64 {
        self.supply_voltage_v.unwrap_or_else(|| self.phase.nominal_voltage_v())
    }

    /// Power factor clamped into [0.1, 1.0]
    pub fn clamped_power_factor(&self) -> f64 {
        self.power_factor.clamp(MIN_POWER_FACTOR, 1.0)
    }

    /// Tabulated (mV/A/m, loop reactance mV/A/m) for this input
    fn tabulated_mv(&self) -> CalcResult<(f64, f64)> {
        if let Some(mv) = self.mv_per_a_m {
            return Ok((mv, 0.0));
        }
        let cable_type = self
            .cable_type
            .ok_or_else(|| CalcError::missing_field("cable_type or mv_per_a_m"))?;
        let data = voltage_drop_data(cable_type, self.size_mm2)?;
        Ok((data.mv_per_a_m, data.loop_reactance_mv_per_a_m()))
    }
}

/// Results from a voltage drop check.
///
/// ## JSON Example
///
/// ```json
/// {
///   "mv_per_a_m_effective": 18.0,
///   "voltage_drop_v": 7.2,
///   "voltage_drop_percent": 3.13,
///   "limit_percent": 5.0,
///   "compliant": true,
///   "voltage_at_load_v": 222.8,
///   "headroom_percent": 1.87,
///   "max_length_m": 31.9
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageDropResult {
    /// mV/A/m after power-factor, phase and material adjustments
    pub mv_per_a_m_effective: f64,
    pub voltage_drop_v: f64,
    pub voltage_drop_percent: f64,
    pub limit_percent: f64,
    pub compliant: bool,
    pub voltage_at_load_v: f64,
    /// Limit minus actual drop (negative when non-compliant)
    pub headroom_percent: f64,
    /// Longest run at this current that stays within the limit (m)
    pub max_length_m: f64,
    /// Power factor actually used
    pub power_factor: f64,
}

impl VoltageDropResult {
    /// Check if the circuit is within the permitted drop
    pub fn passes(&self) -> bool {
        self.compliant
    }
}

/// Calculate the voltage drop for a circuit.
///
/// # Returns
///
/// * `Ok(VoltageDropResult)` - Calculation results
/// * `Err(CalcError)` - Invalid inputs or cable size not in the database
pub fn calculate(input: &VoltageDropInput) -> CalcResult<VoltageDropResult> {
    input.validate()?;

    let power_factor = input.clamped_power_factor();
    if power_factor != input.power_factor {
        warn!(
            label = %input.label,
            requested = input.power_factor,
            used = power_factor,
            "power factor clamped"
        );
    }

    let (mv, x_mv) = input.tabulated_mv()?;
    let sin_phi = (1.0 - power_factor * power_factor).max(0.0).sqrt();
    let mv_per_a_m_effective =
        (mv * power_factor + x_mv * sin_phi) * input.phase.mv_factor() * input.material.multiplier();

    let voltage_v = input.voltage_v();
    let voltage_drop_v = mv_per_a_m_effective * input.length_m * input.current_a / 1000.0;
    let voltage_drop_percent = voltage_drop_v / voltage_v * 100.0;
    let limit_percent = input.limit_percent.unwrap_or_else(|| input.circuit_use.limit_percent());
    let compliant = voltage_drop_percent <= limit_percent;
    let max_length_m = limit_percent / 100.0 * voltage_v * 1000.0 / (mv_per_a_m_effective * input.current_a);

    debug!(
        label = %input.label,
        mv_per_a_m_effective,
        voltage_drop_v,
        voltage_drop_percent,
        compliant,
        "voltage drop calculated"
    );

    Ok(VoltageDropResult {
        mv_per_a_m_effective,
        voltage_drop_v,
        voltage_drop_percent,
        limit_percent,
        compliant,
        voltage_at_load_v: voltage_v - voltage_drop_v,
        headroom_percent: limit_percent - voltage_drop_percent,
        max_length_m,
        power_factor,
    })
}
