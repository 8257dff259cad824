//! # Maximum Demand Calculation
//!
//! Estimates the realistic peak demand of an installation by applying
//! diversity to the connected load, then picks a supply service size.
//!
//! ## Method
//!
//! ```text
//! connected_kW = Σ power × quantity
//! demand_kW    = Σ power × quantity × diversity
//! I (1ph)      = demand × 1000 / U0
//! I (3ph)      = demand × 1000 / (√3 × U_line)      (per phase)
//! ```
//!
//! Service sizes are 60 A, 80 A and 100 A single-phase. Anything above
//! 100 A needs a three-phase supply, and utilisation is then measured with
//! the per-phase current on a 400 V service.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::max_demand::{calculate, Load, LoadCategory, MaxDemandInput, ServiceSize};
//!
//! let input = MaxDemandInput {
//!     loads: vec![
//!         Load::new("Shower", LoadCategory::Shower, 9.5),
//!         Load::new("Cooker", LoadCategory::Cooking, 10.0),
//!     ],
//!     ..MaxDemandInput::new("Semi-detached")
//! };
//!
//! let result = calculate(&input).unwrap();
//! assert!((result.demand_kw - 14.5).abs() < 1e-9);
//! assert_eq!(result.recommended_service, ServiceSize::Single80);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::supply::{SupplyPhase, NOMINAL_THREE_PHASE_V};
use crate::errors::{require_non_negative, require_positive, CalcError, CalcResult};
use crate::units::{Kilowatts, Watts};

/// Category of load; selects the default diversity factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LoadCategory {
    Lighting,
    SocketOutlets,
    Cooking,
    WaterHeating,
    SpaceHeating,
    Shower,
    EvCharging,
    HeatPump,
    Motor,
    #[default]
    Other,
}

impl LoadCategory {
    pub const ALL: [LoadCategory; 10] = [
        LoadCategory::Lighting,
        LoadCategory::SocketOutlets,
        LoadCategory::Cooking,
        LoadCategory::WaterHeating,
        LoadCategory::SpaceHeating,
        LoadCategory::Shower,
        LoadCategory::EvCharging,
        LoadCategory::HeatPump,
        LoadCategory::Motor,
        LoadCategory::Other,
    ];

    /// Default diversity factor for a domestic installation
    pub fn default_diversity(&self) -> f64 {
        match self {
            LoadCategory::Lighting => 0.66,
            LoadCategory::SocketOutlets => 0.40,
            LoadCategory::Cooking => 0.50,
            LoadCategory::Motor => 0.80,
            LoadCategory::WaterHeating
            | LoadCategory::SpaceHeating
            | LoadCategory::Shower
            | LoadCategory::EvCharging
            | LoadCategory::HeatPump
            | LoadCategory::Other => 1.0,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            LoadCategory::Lighting => "Lighting",
            LoadCategory::SocketOutlets => "Socket outlets",
            LoadCategory::Cooking => "Cooking",
            LoadCategory::WaterHeating => "Water heating",
            LoadCategory::SpaceHeating => "Space heating",
            LoadCategory::Shower => "Shower",
            LoadCategory::EvCharging => "EV charging",
            LoadCategory::HeatPump => "Heat pump",
            LoadCategory::Motor => "Motor",
            LoadCategory::Other => "Other",
        }
    }
}

fn default_quantity() -> u32 {
    1
}

/// A single connected load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Load {
    pub description: String,

    #[serde(default)]
    pub category: LoadCategory,

    /// Rated power of one unit
    pub power_kw: Kilowatts,

    #[serde(default = "default_quantity")]
    pub quantity: u32,

    /// Overrides the category default; clamped into [0, 1]
    #[serde(default)]
    pub diversity: Option<f64>,
}

impl Load {
    pub fn new(description: impl Into<String>, category: LoadCategory, power_kw: f64) -> Self {
        Load {
            description: description.into(),
            category,
            power_kw: Kilowatts(power_kw),
            quantity: 1,
            diversity: None,
        }
    }

    /// Diversity factor actually applied
    pub fn effective_diversity(&self) -> f64 {
        match self.diversity {
            Some(df) => df.clamp(0.0, 1.0),
            None => self.category.default_diversity(),
        }
    }

    pub fn connected_kw(&self) -> f64 {
        self.power_kw.value() * self.quantity as f64
    }
}

/// Input parameters for a maximum demand assessment.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Flat 4",
///   "loads": [
///     { "description": "Lighting", "category": "Lighting", "power_kw": 0.1, "quantity": 12 },
///     { "description": "Ring finals", "category": "SocketOutlets", "power_kw": 7.36, "quantity": 2 },
///     { "description": "EV charger", "category": "EvCharging", "power_kw": 7.4 }
///   ],
///   "phase": "Single"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxDemandInput {
    pub label: String,

    pub loads: Vec<Load>,

    #[serde(default)]
    pub phase: SupplyPhase,

    /// Supply voltage (line voltage for three-phase); defaults to nominal
    #[serde(default)]
    pub supply_voltage_v: Option<f64>,
}

impl MaxDemandInput {
    pub fn new(label: impl Into<String>) -> Self {
        MaxDemandInput {
            label: label.into(),
            loads: Vec::new(),
            phase: SupplyPhase::Single,
            supply_voltage_v: None,
        }
    }

    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        if self.loads.is_empty() {
            return Err(CalcError::missing_field("loads"));
        }
        for (i, load) in self.loads.iter().enumerate() {
            require_non_negative(&format!("loads[{}].power_kw", i), load.power_kw.value())?;
            if let Some(df) = load.diversity {
                if !df.is_finite() {
                    return Err(CalcError::invalid_input(
                        format!("loads[{}].diversity", i),
                        df.to_string(),
                        "Diversity factor must be a number between 0 and 1",
                    ));
                }
            }
        }
        if let Some(v) = self.supply_voltage_v {
            require_positive("supply_voltage_v", v)?;
        }
        Ok(())
    }

    pub fn voltage_v(&self) -> f64 {
        self.supply_voltage_v.unwrap_or_else(|| self.phase.nominal_voltage_v())
    }
}

/// Supply service sizes offered by the network operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceSize {
    Single60,
    Single80,
    Single100,
    ThreePhase,
}

impl ServiceSize {
    /// Capacity per phase (A)
    pub fn capacity_a(&self) -> f64 {
        match self {
            ServiceSize::Single60 => 60.0,
            ServiceSize::Single80 => 80.0,
            ServiceSize::Single100 | ServiceSize::ThreePhase => 100.0,
        }
    }

    /// Smallest service able to carry `current_a` on the given supply
    pub fn for_current(current_a: f64, phase: SupplyPhase) -> Self {
        if phase == SupplyPhase::Three {
            return ServiceSize::ThreePhase;
        }
        if current_a <= 60.0 {
            ServiceSize::Single60
        } else if current_a <= 80.0 {
            ServiceSize::Single80
        } else if current_a <= 100.0 {
            ServiceSize::Single100
        } else {
            ServiceSize::ThreePhase
        }
    }
}

impl std::fmt::Display for ServiceSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceSize::Single60 => write!(f, "60 A single-phase"),
            ServiceSize::Single80 => write!(f, "80 A single-phase"),
            ServiceSize::Single100 => write!(f, "100 A single-phase"),
            ServiceSize::ThreePhase => write!(f, "100 A three-phase"),
        }
    }
}

/// Per-load line of the assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadBreakdown {
    pub description: String,
    pub category: LoadCategory,
    pub connected_kw: f64,
    pub diversity: f64,
    pub demand_kw: f64,
}

/// Results from a maximum demand assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxDemandResult {
    pub connected_kw: f64,
    pub demand_kw: f64,
    /// Demand as watts, for reports
    pub demand_w: Watts,
    /// Design current (per phase for three-phase)
    pub current_a: f64,
    /// demand / connected (1.0 when nothing is connected)
    pub overall_diversity: f64,
    pub recommended_service: ServiceSize,
    /// Per-phase current on the recommended service. Equals `current_a`
    /// unless a single-phase demand needs a three-phase service.
    pub service_current_a: f64,
    /// Service current as a percentage of the service capacity
    pub utilisation_percent: f64,
    pub breakdown: Vec<LoadBreakdown>,
}

impl MaxDemandResult {
    /// Check the demand fits the recommended service
    pub fn passes(&self) -> bool {
        self.utilisation_percent <= 100.0
    }
}

/// Calculate the maximum demand of an installation.
pub fn calculate(input: &MaxDemandInput) -> CalcResult<MaxDemandResult> {
    input.validate()?;

    let breakdown: Vec<LoadBreakdown> = input
        .loads
        .iter()
        .map(|load| {
            if let Some(df) = load.diversity {
                if !(0.0..=1.0).contains(&df) {
                    warn!(load = %load.description, requested = df, "diversity factor clamped");
                }
            }
            let diversity = load.effective_diversity();
            let connected_kw = load.connected_kw();
            LoadBreakdown {
                description: load.description.clone(),
                category: load.category,
                connected_kw,
                diversity,
                demand_kw: connected_kw * diversity,
            }
        })
        .collect();

    let connected_kw: f64 = breakdown.iter().map(|b| b.connected_kw).sum();
    let demand_kw: f64 = breakdown.iter().map(|b| b.demand_kw).sum();
    let demand_w: Watts = Kilowatts(demand_kw).into();

    let voltage_v = input.voltage_v();
    let current_a = match input.phase {
        SupplyPhase::Single => demand_w.value() / voltage_v,
        SupplyPhase::Three => demand_w.value() / (3f64.sqrt() * voltage_v),
    };

    let recommended_service = ServiceSize::for_current(current_a, input.phase);
    let overall_diversity = if connected_kw > 0.0 { demand_kw / connected_kw } else { 1.0 };
    let service_current_a = match (input.phase, recommended_service) {
        (SupplyPhase::Single, ServiceSize::ThreePhase) => demand_w.value() / (3f64.sqrt() * NOMINAL_THREE_PHASE_V),
        _ => current_a,
    };
    let utilisation_percent = service_current_a / recommended_service.capacity_a() * 100.0;

    debug!(
        label = %input.label,
        connected_kw,
        demand_kw,
        current_a,
        service = %recommended_service,
        "maximum demand calculated"
    );

    Ok(MaxDemandResult {
        connected_kw,
        demand_kw,
        demand_w,
        current_a,
        overall_diversity,
        recommended_service,
        service_current_a,
        utilisation_percent,
        breakdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn house() -> MaxDemandInput {
        MaxDemandInput {
            loads: vec![
                Load {
                    quantity: 10,
                    ..Load::new("Downlights", LoadCategory::Lighting, 0.1)
                },
                Load::new("Ring final", LoadCategory::SocketOutlets, 7.36),
                Load::new("Cooker", LoadCategory::Cooking, 10.0),
                Load::new("Shower", LoadCategory::Shower, 9.5),
            ],
            ..MaxDemandInput::new("House")
        }
    }

    #[test]
    fn test_diversified_demand() {
        let result = calculate(&house()).unwrap();
        assert!((result.connected_kw - 27.86).abs() < 1e-9);
        // 0.66 + 2.944 + 5.0 + 9.5
        assert!((result.demand_kw - 18.104).abs() < 1e-9);
        assert!((result.current_a - 18_104.0 / 230.0).abs() < 1e-9);
        assert_eq!(result.recommended_service, ServiceSize::Single80);
        assert_eq!(result.breakdown.len(), 4);
    }

    #[test]
    fn test_service_thresholds() {
        let one = SupplyPhase::Single;
        assert_eq!(ServiceSize::for_current(60.0, one), ServiceSize::Single60);
        assert_eq!(ServiceSize::for_current(60.1, one), ServiceSize::Single80);
        assert_eq!(ServiceSize::for_current(100.0, one), ServiceSize::Single100);
        assert_eq!(ServiceSize::for_current(100.1, one), ServiceSize::ThreePhase);
        assert_eq!(ServiceSize::for_current(10.0, SupplyPhase::Three), ServiceSize::ThreePhase);
    }

    #[test]
    fn test_heavy_load_needs_three_phase() {
        let input = MaxDemandInput {
            loads: vec![Load {
                quantity: 3,
                ..Load::new("Heat pump", LoadCategory::HeatPump, 9.0)
            }],
            ..MaxDemandInput::new("Workshop")
        };
        let result = calculate(&input).unwrap();
        // 27 kW at 230 V
        assert!((result.current_a - 27_000.0 / 230.0).abs() < 1e-9);
        assert_eq!(result.recommended_service, ServiceSize::ThreePhase);
        // 27 kW / (√3 × 400 V) per phase
        assert!((result.service_current_a - 38.97).abs() < 0.01);
        assert!((result.utilisation_percent - 38.97).abs() < 0.01);
        assert!(result.passes());
    }

    #[test]
    fn test_three_phase_current_per_phase() {
        let input = MaxDemandInput {
            loads: vec![Load::new("Motor", LoadCategory::Other, 27.7128)],
            phase: SupplyPhase::Three,
            ..MaxDemandInput::new("Plant room")
        };
        let result = calculate(&input).unwrap();
        // 27 712.8 / (√3 × 400) ≈ 40 A
        assert!((result.current_a - 40.0).abs() < 0.01);
        assert!((result.utilisation_percent - 40.0).abs() < 0.01);
    }

    #[test]
    fn test_diversity_override_clamped() {
        let mut load = Load::new("Sockets", LoadCategory::SocketOutlets, 5.0);
        load.diversity = Some(1.8);
        assert_eq!(load.effective_diversity(), 1.0);
        load.diversity = Some(-0.5);
        assert_eq!(load.effective_diversity(), 0.0);
    }

    #[test]
    fn test_overall_diversity() {
        let input = MaxDemandInput {
            loads: vec![Load::new("Sockets", LoadCategory::SocketOutlets, 10.0)],
            ..MaxDemandInput::new("Office")
        };
        let result = calculate(&input).unwrap();
        assert!((result.overall_diversity - 0.4).abs() < 1e-9);
        assert_eq!(result.demand_w, Watts(4000.0));
    }

    #[test]
    fn test_empty_loads_rejected() {
        let err = calculate(&MaxDemandInput::new("Empty")).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_FIELD");
    }

    #[test]
    fn test_negative_power_rejected() {
        let input = MaxDemandInput {
            loads: vec![Load::new("Bad", LoadCategory::Other, -1.0)],
            ..MaxDemandInput::new("Bad")
        };
        assert_eq!(calculate(&input).unwrap_err().error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_load_json_defaults() {
        let json = r#"{ "description": "Immersion", "power_kw": 3.0 }"#;
        let load: Load = serde_json::from_str(json).unwrap();
        assert_eq!(load.quantity, 1);
        assert_eq!(load.category, LoadCategory::Other);
        assert!(load.diversity.is_none());
    }
}
