//! # Cable Database
//!
//! Cable families, BS 7671 reference installation methods and the tabulated
//! data needed for cable selection: current-carrying capacity, conductor
//! impedance / voltage drop, and trade pricing.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::cables::{find_optimal_cable_size, CableType, InstallationMethod};
//!
//! // 2.5 mm² T&E clipped direct carries 27 A
//! let sel = find_optimal_cable_size(CableType::PvcTwinEarth, 27.0, InstallationMethod::C)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(sel.size_mm2, 2.5);
//! ```

pub mod cable_types;
pub mod database;

pub use cable_types::{CableType, ConductorMaterial, FirePerformance, InstallationMethod, MechanicalProtection};
pub use database::{
    all_cable_types, bulk_price, cable_pricing, cables_by_current_rating, cables_by_installation_method,
    cost_effective_alternatives, database, find_optimal_cable_size, get_cable_data, voltage_drop_data,
    Alternative, Availability, BulkQuote, CableData, CableDatabase, CablePricing, CurrentRating, SizeSelection,
    VoltageDropData,
};
