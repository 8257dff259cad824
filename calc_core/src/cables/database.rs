//! UK Cable Database (BS 7671 Appendix 4)
//!
//! Current-carrying capacities, voltage-drop data and trade pricing for the
//! cable families in [`CableType`]. The data lives in `data/cables.toml`, is
//! embedded at compile time and parsed once on first use.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::cable_types::{CableType, FirePerformance, InstallationMethod, MechanicalProtection};
use crate::errors::{CalcError, CalcResult};

const CABLE_DATA: &str = include_str!("../../data/cables.toml");

/// Sizes closer than this are treated as the same conductor size.
const SIZE_EPSILON_MM2: f64 = 1e-6;

static DATABASE: Lazy<Result<CableDatabase, String>> =
    Lazy::new(|| toml::from_str::<CableDatabase>(CABLE_DATA).map_err(|e| e.to_string()));

/// Root of the embedded cable data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CableDatabase {
    #[serde(rename = "cable")]
    pub cables: Vec<CableData>,
}

/// Everything known about one cable family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CableData {
    #[serde(rename = "key")]
    pub cable_type: CableType,
    pub name: String,
    pub description: String,
    /// Largest size that is realistic to terminate on site (mm²)
    pub max_practical_size_mm2: f64,
    pub standard_sizes_mm2: Vec<f64>,
    /// Maximum conductor operating temperature (°C)
    pub temperature_rating_c: u32,
    pub voltage_rating_v: u32,
    /// Minimum bend radius as a multiple of overall diameter
    pub min_bend_radius: u32,
    pub fire_performance: FirePerformance,
    pub uv_resistant: bool,
    pub direct_burial: bool,
    pub mechanical_protection: MechanicalProtection,
    pub installation_methods: Vec<InstallationMethod>,
    pub applications: Vec<String>,
    pub limitations: Vec<String>,
    pub recommendations: Vec<String>,
    pub ratings: Vec<CurrentRating>,
    pub voltage_drop: Vec<VoltageDropData>,
    pub pricing: Vec<CablePricing>,
}

/// Tabulated current-carrying capacity It (A) per reference method.
///
/// A value of 0 means the method does not apply to this cable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentRating {
    pub size_mm2: f64,
    pub a1: u32,
    pub a2: u32,
    pub b1: u32,
    pub b2: u32,
    pub c: u32,
    pub d1: u32,
    pub d2: u32,
    pub e: u32,
    pub f: u32,
    pub g: u32,
}

impl CurrentRating {
    /// Rating for a reference method, `None` where the method does not apply
    pub fn for_method(&self, method: InstallationMethod) -> Option<f64> {
        let amps = match method {
            InstallationMethod::A1 => self.a1,
            InstallationMethod::A2 => self.a2,
            InstallationMethod::B1 => self.b1,
            InstallationMethod::B2 => self.b2,
            InstallationMethod::C => self.c,
            InstallationMethod::D1 => self.d1,
            InstallationMethod::D2 => self.d2,
            InstallationMethod::E | InstallationMethod::Portable | InstallationMethod::Temporary => self.e,
            InstallationMethod::F => self.f,
            InstallationMethod::G => self.g,
        };
        (amps > 0).then_some(amps as f64)
    }
}

/// Conductor impedance data for one size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoltageDropData {
    pub size_mm2: f64,
    /// Conductor resistance per metre (mΩ/m)
    pub resistance_mohm_per_m: f64,
    /// Conductor reactance per metre (mΩ/m)
    pub reactance_mohm_per_m: f64,
    /// Tabulated single-phase voltage drop (mV/A/m)
    pub mv_per_a_m: f64,
}

impl VoltageDropData {
    /// Reactive component of the single-phase loop (mV/A/m): line plus return
    pub fn loop_reactance_mv_per_a_m(&self) -> f64 {
        2.0 * self.reactance_mohm_per_m
    }
}

/// Stock status at the supplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Availability {
    InStock,
    LowStock,
    OutOfStock,
    SpecialOrder,
}

/// Trade pricing for one size (GBP per metre).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CablePricing {
    pub size_mm2: f64,
    pub wholesale_gbp_per_m: f64,
    pub retail_gbp_per_m: f64,
    pub availability: Availability,
    pub lead_time_days: u32,
    /// Discount percentages at 100 m, 500 m and 1000 m
    pub bulk_discount_percent: [u32; 3],
}

impl CablePricing {
    /// Discount percentage applicable to an order length
    pub fn discount_percent_for(&self, metres: f64) -> f64 {
        let [d100, d500, d1000] = self.bulk_discount_percent;
        let pct = if metres >= 1000.0 {
            d1000
        } else if metres >= 500.0 {
            d500
        } else if metres >= 100.0 {
            d100
        } else {
            0
        };
        pct as f64
    }
}

fn same_size(a: f64, b: f64) -> bool {
    (a - b).abs() < SIZE_EPSILON_MM2
}

impl CableData {
    /// Whether the cable may be installed by the given method
    pub fn supports_method(&self, method: InstallationMethod) -> bool {
        self.installation_methods.contains(&method)
    }

    /// Tabulated rating for a size and method
    pub fn rating(&self, size_mm2: f64, method: InstallationMethod) -> Option<f64> {
        self.ratings
            .iter()
            .find(|r| same_size(r.size_mm2, size_mm2))
            .and_then(|r| r.for_method(method))
    }

    /// Voltage drop data for a size
    pub fn voltage_drop_for(&self, size_mm2: f64) -> Option<&VoltageDropData> {
        self.voltage_drop.iter().find(|v| same_size(v.size_mm2, size_mm2))
    }

    /// Pricing for a size
    pub fn pricing_for(&self, size_mm2: f64) -> Option<&CablePricing> {
        self.pricing.iter().find(|p| same_size(p.size_mm2, size_mm2))
    }
}

/// Access the parsed database.
pub fn database() -> CalcResult<&'static CableDatabase> {
    DATABASE.as_ref().map_err(|reason| CalcError::Internal {
        message: format!("embedded cable data could not be parsed: {reason}"),
    })
}

/// Look up a cable family.
///
/// # Example
/// ```
/// use calc_core::cables::{get_cable_data, CableType};
///
/// let te = get_cable_data(CableType::PvcTwinEarth).unwrap();
/// assert_eq!(te.standard_sizes_mm2.len(), 6);
/// ```
pub fn get_cable_data(cable_type: CableType) -> CalcResult<&'static CableData> {
    database()?
        .cables
        .iter()
        .find(|c| c.cable_type == cable_type)
        .ok_or_else(|| CalcError::cable_not_found(cable_type.key()))
}

/// All cable families present in the database, in database order.
pub fn all_cable_types() -> CalcResult<Vec<CableType>> {
    Ok(database()?.cables.iter().map(|c| c.cable_type).collect())
}

/// Cable families that list the given installation method.
pub fn cables_by_installation_method(method: InstallationMethod) -> CalcResult<Vec<CableType>> {
    Ok(database()?
        .cables
        .iter()
        .filter(|c| c.supports_method(method))
        .map(|c| c.cable_type)
        .collect())
}

/// Cable families with at least one size rated for `min_current_a` by `method`.
pub fn cables_by_current_rating(min_current_a: f64, method: InstallationMethod) -> CalcResult<Vec<CableType>> {
    Ok(database()?
        .cables
        .iter()
        .filter(|c| {
            c.ratings
                .iter()
                .any(|r| r.for_method(method).is_some_and(|it| it >= min_current_a))
        })
        .map(|c| c.cable_type)
        .collect())
}

/// The smallest size and its rating that carries the required current
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeSelection {
    pub size_mm2: f64,
    pub rating_a: f64,
}

/// Smallest size of a cable whose tabulated rating is at least `required_a`.
///
/// Returns `Ok(None)` when no size is large enough.
pub fn find_optimal_cable_size(
    cable_type: CableType,
    required_a: f64,
    method: InstallationMethod,
) -> CalcResult<Option<SizeSelection>> {
    let cable = get_cable_data(cable_type)?;
    Ok(cable.ratings.iter().find_map(|r| {
        r.for_method(method)
            .filter(|it| *it >= required_a)
            .map(|rating_a| SizeSelection {
                size_mm2: r.size_mm2,
                rating_a,
            })
    }))
}

/// Pricing for a cable size, `None` if the size is not stocked.
pub fn cable_pricing(cable_type: CableType, size_mm2: f64) -> CalcResult<Option<&'static CablePricing>> {
    Ok(get_cable_data(cable_type)?.pricing_for(size_mm2))
}

/// Voltage drop data for a cable size.
pub fn voltage_drop_data(cable_type: CableType, size_mm2: f64) -> CalcResult<&'static VoltageDropData> {
    get_cable_data(cable_type)?
        .voltage_drop_for(size_mm2)
        .ok_or_else(|| CalcError::cable_not_found(format!("{} {} mm²", cable_type.key(), size_mm2)))
}

/// Price for an order length with bulk discount applied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BulkQuote {
    pub cable_type: CableType,
    pub size_mm2: f64,
    pub metres: f64,
    pub retail_gbp_per_m: f64,
    pub discount_percent: f64,
    pub total_gbp: f64,
}

/// Retail cost of `metres` of cable after the bulk discount tier.
pub fn bulk_price(cable_type: CableType, size_mm2: f64, metres: f64) -> CalcResult<BulkQuote> {
    crate::errors::require_positive("metres", metres)?;
    let pricing = cable_pricing(cable_type, size_mm2)?
        .ok_or_else(|| CalcError::cable_not_found(format!("{} {} mm² pricing", cable_type.key(), size_mm2)))?;
    let discount_percent = pricing.discount_percent_for(metres);
    let total_gbp = pricing.retail_gbp_per_m * metres * (1.0 - discount_percent / 100.0);
    Ok(BulkQuote {
        cable_type,
        size_mm2,
        metres,
        retail_gbp_per_m: pricing.retail_gbp_per_m,
        discount_percent,
        total_gbp,
    })
}

/// A cheaper cable of the same size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub cable_type: CableType,
    pub size_mm2: f64,
    pub retail_gbp_per_m: f64,
    pub savings_gbp_per_m: f64,
}

/// Cheaper cables of the same size within `max_budget_gbp_per_m`,
/// best saving first.
///
/// When the reference cable has no price for the size, nothing is cheaper.
pub fn cost_effective_alternatives(
    cable_type: CableType,
    size_mm2: f64,
    max_budget_gbp_per_m: f64,
) -> CalcResult<Vec<Alternative>> {
    let original = cable_pricing(cable_type, size_mm2)?
        .map(|p| p.retail_gbp_per_m)
        .unwrap_or(0.0);

    let mut alternatives: Vec<Alternative> = database()?
        .cables
        .iter()
        .filter_map(|c| {
            c.pricing_for(size_mm2)
                .filter(|p| p.retail_gbp_per_m <= max_budget_gbp_per_m && p.retail_gbp_per_m < original)
                .map(|p| Alternative {
                    cable_type: c.cable_type,
                    size_mm2,
                    retail_gbp_per_m: p.retail_gbp_per_m,
                    savings_gbp_per_m: original - p.retail_gbp_per_m,
                })
        })
        .collect();

    alternatives.sort_by(|a, b| b.savings_gbp_per_m.total_cmp(&a.savings_gbp_per_m));
    Ok(alternatives)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_parses_all_types() {
        let types = all_cable_types().unwrap();
        assert_eq!(types.len(), CableType::ALL.len());
        for t in CableType::ALL {
            assert!(types.contains(&t), "missing {t}");
        }
    }

    #[test]
    fn test_tables_are_consistent() {
        for cable in &database().unwrap().cables {
            assert_eq!(cable.ratings.len(), cable.voltage_drop.len(), "{}", cable.name);
            assert_eq!(cable.ratings.len(), cable.pricing.len(), "{}", cable.name);
            let sizes: Vec<f64> = cable.ratings.iter().map(|r| r.size_mm2).collect();
            assert!(sizes.windows(2).all(|w| w[0] < w[1]), "{} sizes not ascending", cable.name);
        }
    }

    #[test]
    fn test_twin_earth_rating_lookup() {
        let te = get_cable_data(CableType::PvcTwinEarth).unwrap();
        assert_eq!(te.rating(2.5, InstallationMethod::C), Some(36.0));
        assert_eq!(te.rating(2.5, InstallationMethod::A1), Some(18.0));
        // T&E has no buried rating
        assert_eq!(te.rating(2.5, InstallationMethod::D1), None);
    }

    #[test]
    fn test_find_optimal_size() {
        let sel = find_optimal_cable_size(CableType::PvcTwinEarth, 30.0, InstallationMethod::C)
            .unwrap()
            .unwrap();
        assert_eq!(sel.size_mm2, 2.5);
        assert_eq!(sel.rating_a, 36.0);

        let none = find_optimal_cable_size(CableType::PvcTwinEarth, 200.0, InstallationMethod::C).unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_cables_by_method() {
        let buried = cables_by_installation_method(InstallationMethod::D2).unwrap();
        assert!(buried.contains(&CableType::SwaXlpe));
        assert!(buried.contains(&CableType::NyyJ));
        assert!(!buried.contains(&CableType::PvcTwinEarth));
    }

    #[test]
    fn test_cables_by_current_rating() {
        let big = cables_by_current_rating(900.0, InstallationMethod::E).unwrap();
        assert!(big.contains(&CableType::SwaXlpe));
        assert!(!big.contains(&CableType::Micc));
    }

    #[test]
    fn test_flex_uses_free_air_rating() {
        let flex = get_cable_data(CableType::H07rnF).unwrap();
        assert_eq!(flex.rating(2.5, InstallationMethod::Portable), Some(36.0));
    }

    #[test]
    fn test_bulk_price_tiers() {
        let short = bulk_price(CableType::PvcTwinEarth, 2.5, 50.0).unwrap();
        assert_eq!(short.discount_percent, 0.0);
        assert!((short.total_gbp - 2.25 * 50.0).abs() < 1e-9);

        let reel = bulk_price(CableType::PvcTwinEarth, 2.5, 100.0).unwrap();
        assert_eq!(reel.discount_percent, 8.0);
        assert!((reel.total_gbp - 2.25 * 100.0 * 0.92).abs() < 1e-9);

        assert!(bulk_price(CableType::PvcTwinEarth, 25.0, 100.0).is_err());
    }

    #[test]
    fn test_cost_effective_alternatives() {
        let alts = cost_effective_alternatives(CableType::SwaXlpe, 2.5, 100.0).unwrap();
        assert!(!alts.is_empty());
        assert!(alts.iter().all(|a| a.retail_gbp_per_m < 4.45));
        assert!(alts.windows(2).all(|w| w[0].savings_gbp_per_m >= w[1].savings_gbp_per_m));
        assert!(alts.iter().all(|a| a.cable_type != CableType::SwaXlpe));
    }

    #[test]
    fn test_voltage_drop_data() {
        let vd = voltage_drop_data(CableType::PvcTwinEarth, 2.5).unwrap();
        assert_eq!(vd.mv_per_a_m, 18.0);
        assert!((vd.loop_reactance_mv_per_a_m() - 0.2).abs() < 1e-12);
        assert!(voltage_drop_data(CableType::PvcTwinEarth, 16.0).is_err());
    }
}
