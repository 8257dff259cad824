//! # Job Data Structures
//!
//! The `Project` struct is the root container for one job: who did the work,
//! where, the job-wide supply settings and every calculation made for it.
//! Jobs serialize to `.vlt` files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── meta: ProjectMetadata (version, electrician, job, client, site, timestamps)
//! ├── settings: GlobalSettings (regulation edition, supply, voltage drop limits)
//! ├── inspection: Option<InspectionSchedule>
//! └── items: HashMap<Uuid, CalculationItem> (all calculations)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use calc_core::project::Project;
//!
//! let project = Project::new("Sam Sparks", "J-1042", "Mrs Patel");
//!
//! // Serialize to JSON (see file_io for atomic saves)
//! let json = serde_json::to_string_pretty(&project).unwrap();
//! assert!(json.contains("BS 7671:2018+A2:2022"));
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::calculations::voltage_drop::CircuitUse;
use crate::calculations::{CalculationItem, CalculationOutcome, EarthingSystem, SupplyPhase};
use crate::errors::CalcError;
use crate::inspection::InspectionSchedule;

/// Current schema version for .vlt files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Regulation edition stamped on new jobs
pub const DEFAULT_REGULATION_EDITION: &str = "BS 7671:2018+A2:2022";

/// Root job container.
///
/// Items are stored in a flat UUID-keyed map for O(1) lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub meta: ProjectMetadata,

    pub settings: GlobalSettings,

    /// Inspection schedule for the certificate issued on this job
    #[serde(default)]
    pub inspection: Option<InspectionSchedule>,

    /// All calculation items, keyed by UUID
    pub items: HashMap<Uuid, CalculationItem>,
}

impl Project {
    /// Create a new empty job.
    ///
    /// # Example
    ///
    /// ```rust
    /// use calc_core::project::Project;
    ///
    /// let project = Project::new("Sam Sparks", "J-1042", "Mrs Patel");
    /// assert_eq!(project.meta.electrician, "Sam Sparks");
    /// ```
    pub fn new(electrician: impl Into<String>, job_ref: impl Into<String>, client: impl Into<String>) -> Self {
        let now = Utc::now();
        Project {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                electrician: electrician.into(),
                job_ref: job_ref.into(),
                client: client.into(),
                site_address: String::new(),
                created: now,
                modified: now,
            },
            settings: GlobalSettings::default(),
            inspection: None,
            items: HashMap::new(),
        }
    }

    /// Add a calculation item to the job.
    ///
    /// Returns the UUID assigned to the item.
    ///
    /// # Example
    ///
    /// ```rust
    /// use calc_core::project::Project;
    /// use calc_core::calculations::{CalculationItem, MinChargeInput};
    ///
    /// let mut project = Project::new("Sam Sparks", "J-1042", "Mrs Patel");
    /// let charge = MinChargeInput { hourly_rate_gbp: 45.0, minimum_hours: 1.0, ..MinChargeInput::new("Call-out") };
    ///
    /// let id = project.add_item(CalculationItem::MinimumCharge(charge));
    /// assert!(project.items.contains_key(&id));
    /// ```
    pub fn add_item(&mut self, item: CalculationItem) -> Uuid {
        let id = Uuid::new_v4();
        debug!(%id, calc_type = item.calc_type(), label = item.label(), "item added");
        self.items.insert(id, item);
        self.touch();
        id
    }

    /// Remove a calculation item by UUID.
    pub fn remove_item(&mut self, id: &Uuid) -> Option<CalculationItem> {
        let item = self.items.remove(id);
        if item.is_some() {
            self.touch();
        }
        item
    }

    pub fn get_item(&self, id: &Uuid) -> Option<&CalculationItem> {
        self.items.get(id)
    }

    /// Get a mutable reference to a calculation item by UUID.
    ///
    /// Marks the job as modified when the item exists.
    pub fn get_item_mut(&mut self, id: &Uuid) -> Option<&mut CalculationItem> {
        if self.items.contains_key(id) {
            self.meta.modified = Utc::now();
            self.items.get_mut(id)
        } else {
            None
        }
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Run every calculation with the job settings applied, ordered by label.
    ///
    /// A failing item does not stop the others; its error is reported in
    /// its [`ItemRun`].
    pub fn run_all(&self) -> Vec<ItemRun> {
        let mut runs: Vec<ItemRun> = self
            .items
            .iter()
            .map(|(id, item)| {
                let item = self.settings.apply(item);
                let (outcome, error) = match item.run() {
                    Ok(outcome) => (Some(outcome), None),
                    Err(e) => {
                        warn!(%id, label = item.label(), error = %e, "calculation failed");
                        (None, Some(e))
                    }
                };
                ItemRun {
                    id: *id,
                    label: item.label().to_string(),
                    calc_type: item.calc_type().to_string(),
                    outcome,
                    error,
                }
            })
            .collect();
        runs.sort_by(|a, b| a.label.cmp(&b.label).then(a.id.cmp(&b.id)));
        runs
    }
}

impl Default for Project {
    fn default() -> Self {
        Project::new("", "", "")
    }
}

/// Outcome of running one job item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRun {
    pub id: Uuid,
    pub label: String,
    pub calc_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<CalculationOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CalcError>,
}

impl ItemRun {
    pub fn passes(&self) -> bool {
        self.outcome.as_ref().is_some_and(|o| o.passes())
    }
}

/// Job metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Name of the responsible electrician
    pub electrician: String,

    /// Job reference number
    pub job_ref: String,

    pub client: String,

    #[serde(default)]
    pub site_address: String,

    pub created: DateTime<Utc>,

    pub modified: DateTime<Utc>,
}

/// Job-wide settings applied to items that leave them unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Regulation edition the work is designed to
    pub regulation_edition: String,

    pub earthing_system: EarthingSystem,

    /// Single-phase nominal voltage (V)
    pub nominal_voltage_v: f64,

    /// Permitted voltage drop for lighting circuits (%)
    pub lighting_vdrop_percent: f64,

    /// Permitted voltage drop for other circuits (%)
    pub other_vdrop_percent: f64,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        GlobalSettings {
            regulation_edition: DEFAULT_REGULATION_EDITION.to_string(),
            earthing_system: EarthingSystem::TnCS,
            nominal_voltage_v: 230.0,
            lighting_vdrop_percent: 3.0,
            other_vdrop_percent: 5.0,
        }
    }
}

impl GlobalSettings {
    /// Voltage drop limit configured for a circuit use
    pub fn vdrop_limit_percent(&self, circuit_use: CircuitUse) -> f64 {
        match circuit_use {
            CircuitUse::Lighting => self.lighting_vdrop_percent,
            CircuitUse::Other => self.other_vdrop_percent,
        }
    }

    /// Copy of `item` with job defaults filled in where the item is silent
    pub fn apply(&self, item: &CalculationItem) -> CalculationItem {
        let mut item = item.clone();
        match &mut item {
            CalculationItem::VoltageDrop(vd) => {
                if vd.phase == SupplyPhase::Single && vd.supply_voltage_v.is_none() {
                    vd.supply_voltage_v = Some(self.nominal_voltage_v);
                }
                if vd.limit_percent.is_none() {
                    vd.limit_percent = Some(self.vdrop_limit_percent(vd.circuit_use));
                }
            }
            CalculationItem::CableSizing(cs) => {
                if cs.phase == SupplyPhase::Single && cs.supply_voltage_v.is_none() {
                    cs.supply_voltage_v = Some(self.nominal_voltage_v);
                }
                if cs.limit_percent.is_none() {
                    cs.limit_percent = Some(self.vdrop_limit_percent(cs.circuit_use));
                }
            }
            CalculationItem::MaxDemand(md) => {
                if md.phase == SupplyPhase::Single && md.supply_voltage_v.is_none() {
                    md.supply_voltage_v = Some(self.nominal_voltage_v);
                }
            }
            CalculationItem::EarthFaultLoop(efl) => {
                if efl.earthing.is_none() {
                    efl.earthing = Some(self.earthing_system);
                }
            }
            CalculationItem::MinimumCharge(_) => {}
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::earth_fault_loop::{DeviceType, ProtectiveDevice};
    use crate::calculations::{EarthFaultLoopInput, MinChargeInput, VoltageDropInput};

    fn radial() -> VoltageDropInput {
        VoltageDropInput {
            mv_per_a_m: Some(18.0),
            length_m: 20.0,
            current_a: 20.0,
            ..VoltageDropInput::new("Radial")
        }
    }

    #[test]
    fn test_project_creation() {
        let project = Project::new("Sam Sparks", "J-1042", "Mrs Patel");
        assert_eq!(project.meta.electrician, "Sam Sparks");
        assert_eq!(project.meta.job_ref, "J-1042");
        assert_eq!(project.meta.client, "Mrs Patel");
        assert_eq!(project.meta.version, SCHEMA_VERSION);
        assert_eq!(project.settings.regulation_edition, DEFAULT_REGULATION_EDITION);
    }

    #[test]
    fn test_project_serialization() {
        let mut project = Project::new("Sam Sparks", "J-1042", "Mrs Patel");
        project.add_item(CalculationItem::VoltageDrop(radial()));
        let json = serde_json::to_string_pretty(&project).unwrap();
        assert!(json.contains("\"type\": \"VoltageDrop\""));
        assert!(json.contains("TN-C-S"));

        let roundtrip: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip.item_count(), 1);
        assert!(roundtrip.inspection.is_none());
    }

    #[test]
    fn test_add_remove_item() {
        let mut project = Project::new("Sam Sparks", "J-1042", "Mrs Patel");
        let id = project.add_item(CalculationItem::VoltageDrop(radial()));
        assert_eq!(project.item_count(), 1);
        assert!(project.get_item(&id).is_some());
        assert!(project.get_item_mut(&id).is_some());

        assert!(project.remove_item(&id).is_some());
        assert!(project.remove_item(&id).is_none());
        assert_eq!(project.item_count(), 0);
    }

    #[test]
    fn test_run_all_reports_failures_and_orders_by_label() {
        let mut project = Project::new("Sam Sparks", "J-1042", "Mrs Patel");
        project.add_item(CalculationItem::VoltageDrop(radial()));
        project.add_item(CalculationItem::MinimumCharge(MinChargeInput {
            hourly_rate_gbp: -1.0,
            ..MinChargeInput::new("A broken quote")
        }));

        let runs = project.run_all();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].label, "A broken quote");
        assert!(runs[0].error.is_some());
        assert!(!runs[0].passes());
        assert!(runs[1].passes());
    }

    #[test]
    fn test_settings_fill_defaults() {
        let mut project = Project::new("Sam Sparks", "J-1042", "Mrs Patel");
        project.settings.other_vdrop_percent = 3.0;
        project.settings.nominal_voltage_v = 240.0;
        project.add_item(CalculationItem::VoltageDrop(radial()));

        let runs = project.run_all();
        match &runs[0].outcome {
            Some(CalculationOutcome::VoltageDrop(r)) => {
                assert_eq!(r.limit_percent, 3.0);
                assert!((r.voltage_drop_percent - 3.0).abs() < 1e-9);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_settings_fill_unset_earthing() {
        let settings = GlobalSettings {
            earthing_system: EarthingSystem::Tt,
            ..Default::default()
        };
        let device = ProtectiveDevice {
            device_type: DeviceType::McbB,
            rating_a: 32.0,
        };
        let item = CalculationItem::EarthFaultLoop(EarthFaultLoopInput::new("C1", device));
        match settings.apply(&item) {
            CalculationItem::EarthFaultLoop(efl) => assert_eq!(efl.earthing, Some(EarthingSystem::Tt)),
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[test]
    fn test_item_earthing_survives_job_settings() {
        let mut project = Project::new("Sam Sparks", "J-1043", "Mr Jones");
        let item = EarthFaultLoopInput {
            earthing: Some(EarthingSystem::Tt),
            r1_r2_ohms: Some(0.3),
            ..EarthFaultLoopInput::new(
                "Garage",
                ProtectiveDevice {
                    device_type: DeviceType::McbB,
                    rating_a: 32.0,
                },
            )
        };
        let standalone = crate::calculations::earth_fault_loop::calculate(&item).unwrap();
        project.add_item(CalculationItem::EarthFaultLoop(item));

        let runs = project.run_all();
        match &runs[0].outcome {
            Some(CalculationOutcome::EarthFaultLoop(r)) => {
                // TT Ze 21 Ω + 0.3 Ω, far above 1.37 Ω
                assert!((r.zs_ohms.value() - 21.3).abs() < 1e-9);
                assert_eq!(r.compliant, standalone.compliant);
                assert!(!r.compliant);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_settings_reach_cable_sizing() {
        use crate::calculations::CableSizingInput;

        let mut project = Project::new("Sam Sparks", "J-1044", "Mrs Patel");
        project.settings.other_vdrop_percent = 3.0;
        project.add_item(CalculationItem::CableSizing(CableSizingInput {
            design_current_a: 20.0,
            length_m: 20.0,
            ..CableSizingInput::new("Radial")
        }));

        let runs = project.run_all();
        match &runs[0].outcome {
            // 2.5 mm² drops 3.13 %, so the 3 % job limit needs 4 mm²
            Some(CalculationOutcome::CableSizing(r)) => assert_eq!(r.selected_size_mm2, 4.0),
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}
