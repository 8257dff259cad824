//! Supply characteristics shared by the circuit calculations.

use serde::{Deserialize, Serialize};

/// UK nominal single-phase voltage (V)
pub const NOMINAL_SINGLE_PHASE_V: f64 = 230.0;

/// UK nominal three-phase line voltage (V)
pub const NOMINAL_THREE_PHASE_V: f64 = 400.0;

/// Number of phases of the supply or circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SupplyPhase {
    #[default]
    Single,
    Three,
}

impl SupplyPhase {
    /// Nominal voltage for this phase arrangement
    pub fn nominal_voltage_v(&self) -> f64 {
        match self {
            SupplyPhase::Single => NOMINAL_SINGLE_PHASE_V,
            SupplyPhase::Three => NOMINAL_THREE_PHASE_V,
        }
    }

    /// Factor applied to tabulated single-phase mV/A/m values (√3/2 for three-phase)
    pub fn mv_factor(&self) -> f64 {
        match self {
            SupplyPhase::Single => 1.0,
            SupplyPhase::Three => 3f64.sqrt() / 2.0,
        }
    }
}

impl std::fmt::Display for SupplyPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupplyPhase::Single => write!(f, "single-phase"),
            SupplyPhase::Three => write!(f, "three-phase"),
        }
    }
}

/// Earthing arrangement of the supply (BS 7671 Part 3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EarthingSystem {
    #[serde(rename = "TN-C-S")]
    #[default]
    TnCS,
    #[serde(rename = "TN-S")]
    TnS,
    #[serde(rename = "TT")]
    Tt,
}

impl EarthingSystem {
    /// Typical maximum external earth fault loop impedance Ze quoted by DNOs (Ω)
    pub fn typical_ze_ohms(&self) -> f64 {
        match self {
            EarthingSystem::TnCS => 0.35,
            EarthingSystem::TnS => 0.8,
            EarthingSystem::Tt => 21.0,
        }
    }
}

impl std::fmt::Display for EarthingSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EarthingSystem::TnCS => write!(f, "TN-C-S"),
            EarthingSystem::TnS => write!(f, "TN-S"),
            EarthingSystem::Tt => write!(f, "TT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nominal_voltages() {
        assert_eq!(SupplyPhase::Single.nominal_voltage_v(), 230.0);
        assert_eq!(SupplyPhase::Three.nominal_voltage_v(), 400.0);
    }

    #[test]
    fn test_three_phase_mv_factor() {
        assert!((SupplyPhase::Three.mv_factor() - 0.866).abs() < 0.001);
    }

    #[test]
    fn test_earthing_serialization() {
        let json = serde_json::to_string(&EarthingSystem::TnCS).unwrap();
        assert_eq!(json, "\"TN-C-S\"");
        assert_eq!(EarthingSystem::default().typical_ze_ohms(), 0.35);
    }
}
