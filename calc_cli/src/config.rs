//! TOML configuration for the `voltline` binary.
//!
//! Looked up from `--config <path>`, then `./voltline.toml`, then built-in
//! defaults. Every section and key is optional.
//!
//! ```toml
//! [supply]
//! nominal_voltage_v = 230.0
//! ze_ohms = 0.35
//!
//! [design]
//! lighting_vdrop_percent = 3.0
//! other_vdrop_percent = 5.0
//!
//! [business]
//! hourly_rate_gbp = 55.0
//! travel_minutes = 30.0
//! vat_registered = true
//!
//! [output]
//! json = false
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calc_core::calculations::min_charge::MAX_UPLIFT_PERCENT;
use calc_core::calculations::supply::{NOMINAL_SINGLE_PHASE_V, NOMINAL_THREE_PHASE_V};
use calc_core::calculations::voltage_drop::CircuitUse;
use calc_core::errors::{require_non_negative, require_positive};
use calc_core::CalcError;
use serde::{Deserialize, Serialize};

/// Config file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "voltline.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub supply: SupplyConfig,
    pub design: DesignConfig,
    pub business: BusinessConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplyConfig {
    pub nominal_voltage_v: f64,
    pub three_phase_voltage_v: f64,
    /// External earth fault loop impedance used when `zs` is not given one
    pub ze_ohms: f64,
}

impl Default for SupplyConfig {
    fn default() -> Self {
        SupplyConfig {
            nominal_voltage_v: NOMINAL_SINGLE_PHASE_V,
            three_phase_voltage_v: NOMINAL_THREE_PHASE_V,
            ze_ohms: 0.35,
        }
    }
}

/// Voltage drop limits for `voltage-drop`, `cable-size` and new jobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignConfig {
    pub lighting_vdrop_percent: f64,
    pub other_vdrop_percent: f64,
}

impl Default for DesignConfig {
    fn default() -> Self {
        DesignConfig {
            lighting_vdrop_percent: CircuitUse::Lighting.limit_percent(),
            other_vdrop_percent: CircuitUse::Other.limit_percent(),
        }
    }
}

impl DesignConfig {
    pub fn vdrop_limit_percent(&self, circuit_use: CircuitUse) -> f64 {
        match circuit_use {
            CircuitUse::Lighting => self.lighting_vdrop_percent,
            CircuitUse::Other => self.other_vdrop_percent,
        }
    }
}

/// Defaults for `min-charge`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessConfig {
    pub hourly_rate_gbp: f64,
    pub minimum_hours: f64,
    pub overhead_gbp: f64,
    pub travel_minutes: f64,
    pub admin_minutes: f64,
    pub uplift_percent: f64,
    pub rounding_step_gbp: f64,
    pub vat_registered: bool,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        BusinessConfig {
            hourly_rate_gbp: 45.0,
            minimum_hours: 1.0,
            overhead_gbp: 0.0,
            travel_minutes: 0.0,
            admin_minutes: 0.0,
            uplift_percent: 0.0,
            rounding_step_gbp: 0.0,
            vat_registered: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Print results as JSON instead of a text report
    pub json: bool,
}

impl CliConfig {
    /// Parse from a TOML string and validate
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CliConfig =
            toml::from_str(content).map_err(|e| CalcError::serialization(format!("TOML parsing error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CalcError::file_error("read config", path.display().to_string(), e.to_string()))?;
        Self::from_toml_str(&content).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// `explicit` if given, else `./voltline.toml` if it exists, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
        };
        match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Reject values no calculation could use
    pub fn validate(&self) -> Result<(), CalcError> {
        require_positive("supply.nominal_voltage_v", self.supply.nominal_voltage_v)?;
        require_positive("supply.three_phase_voltage_v", self.supply.three_phase_voltage_v)?;
        require_non_negative("supply.ze_ohms", self.supply.ze_ohms)?;

        require_positive("design.lighting_vdrop_percent", self.design.lighting_vdrop_percent)?;
        require_positive("design.other_vdrop_percent", self.design.other_vdrop_percent)?;

        let b = &self.business;
        require_non_negative("business.hourly_rate_gbp", b.hourly_rate_gbp)?;
        require_non_negative("business.minimum_hours", b.minimum_hours)?;
        require_non_negative("business.overhead_gbp", b.overhead_gbp)?;
        require_non_negative("business.travel_minutes", b.travel_minutes)?;
        require_non_negative("business.admin_minutes", b.admin_minutes)?;
        require_non_negative("business.rounding_step_gbp", b.rounding_step_gbp)?;
        if !(0.0..=MAX_UPLIFT_PERCENT).contains(&b.uplift_percent) {
            return Err(CalcError::invalid_input(
                "business.uplift_percent",
                b.uplift_percent.to_string(),
                format!("Must be between 0 and {}", MAX_UPLIFT_PERCENT),
            ));
        }
        Ok(())
    }
}
