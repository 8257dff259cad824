//! Cable families, reference installation methods and conductor materials.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Cable families held in the cable database.
///
/// Serialized with the database keys (`"pvc-twin-earth"`, `"swa-xlpe"`, ...).
///
/// # Example
/// ```
/// use calc_core::cables::CableType;
///
/// let t = CableType::from_str_flexible("T&E").unwrap();
/// assert_eq!(t, CableType::PvcTwinEarth);
/// assert_eq!(t.key(), "pvc-twin-earth");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CableType {
    /// 6242Y flat twin and earth
    #[serde(rename = "pvc-twin-earth")]
    PvcTwinEarth,
    /// 6944X steel wire armoured, XLPE insulated
    #[serde(rename = "swa-xlpe")]
    SwaXlpe,
    /// 6491X single core PVC
    #[serde(rename = "pvc-single")]
    PvcSingle,
    /// Low smoke zero halogen
    #[serde(rename = "lsoh-cable")]
    Lsoh,
    /// FP200-style fire resistant
    #[serde(rename = "fire-resistant")]
    FireResistant,
    /// Mineral insulated copper clad
    #[serde(rename = "micc")]
    Micc,
    /// Heavy duty rubber flexible
    #[serde(rename = "h07rn-f")]
    H07rnF,
    /// European harmonised NYY-J
    #[serde(rename = "nyy-j")]
    NyyJ,
}

impl CableType {
    /// All cable types in database order
    pub const ALL: [CableType; 8] = [
        CableType::PvcTwinEarth,
        CableType::SwaXlpe,
        CableType::PvcSingle,
        CableType::Lsoh,
        CableType::FireResistant,
        CableType::Micc,
        CableType::H07rnF,
        CableType::NyyJ,
    ];

    /// Database key
    pub fn key(&self) -> &'static str {
        match self {
            CableType::PvcTwinEarth => "pvc-twin-earth",
            CableType::SwaXlpe => "swa-xlpe",
            CableType::PvcSingle => "pvc-single",
            CableType::Lsoh => "lsoh-cable",
            CableType::FireResistant => "fire-resistant",
            CableType::Micc => "micc",
            CableType::H07rnF => "h07rn-f",
            CableType::NyyJ => "nyy-j",
        }
    }

    /// Parse from database keys, trade names or BS type numbers
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.to_lowercase().replace([' ', '_'], "-").as_str() {
            "pvc-twin-earth" | "twin-earth" | "t&e" | "t-and-e" | "6242y" => Ok(CableType::PvcTwinEarth),
            "swa-xlpe" | "swa" | "6944x" => Ok(CableType::SwaXlpe),
            "pvc-single" | "singles" | "6491x" => Ok(CableType::PvcSingle),
            "lsoh-cable" | "lsoh" | "lszh" => Ok(CableType::Lsoh),
            "fire-resistant" | "fp200" | "fire" => Ok(CableType::FireResistant),
            "micc" | "pyro" | "mineral" => Ok(CableType::Micc),
            "h07rn-f" | "h07rnf" | "rubber-flex" => Ok(CableType::H07rnF),
            "nyy-j" | "nyyj" | "nyy" => Ok(CableType::NyyJ),
            _ => Err(CalcError::cable_not_found(s)),
        }
    }
}

impl std::fmt::Display for CableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// BS 7671 Appendix 4 reference installation methods.
///
/// `Portable` and `Temporary` cover flexible cords, which have no fixed-wiring
/// reference method; their ratings are read from the free-air (E) column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstallationMethod {
    A1,
    A2,
    B1,
    B2,
    C,
    D1,
    D2,
    E,
    F,
    G,
    Portable,
    Temporary,
}

impl InstallationMethod {
    /// Fixed-wiring reference methods (the columns of the rating tables)
    pub const REFERENCE: [InstallationMethod; 10] = [
        InstallationMethod::A1,
        InstallationMethod::A2,
        InstallationMethod::B1,
        InstallationMethod::B2,
        InstallationMethod::C,
        InstallationMethod::D1,
        InstallationMethod::D2,
        InstallationMethod::E,
        InstallationMethod::F,
        InstallationMethod::G,
    ];

    /// Short code as printed in BS 7671 ("A1", "C", ...)
    pub fn code(&self) -> &'static str {
        match self {
            InstallationMethod::A1 => "A1",
            InstallationMethod::A2 => "A2",
            InstallationMethod::B1 => "B1",
            InstallationMethod::B2 => "B2",
            InstallationMethod::C => "C",
            InstallationMethod::D1 => "D1",
            InstallationMethod::D2 => "D2",
            InstallationMethod::E => "E",
            InstallationMethod::F => "F",
            InstallationMethod::G => "G",
            InstallationMethod::Portable => "Portable",
            InstallationMethod::Temporary => "Temporary",
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            InstallationMethod::A1 => "Enclosed in conduit in thermally insulating wall",
            InstallationMethod::A2 => "Enclosed in conduit on wall or ceiling",
            InstallationMethod::B1 => "Enclosed in conduit in masonry wall",
            InstallationMethod::B2 => "Enclosed in trunking on wall",
            InstallationMethod::C => "Clipped direct",
            InstallationMethod::D1 => "In ducts in ground",
            InstallationMethod::D2 => "Direct buried",
            InstallationMethod::E => "In free air",
            InstallationMethod::F => "In ventilated cable tray",
            InstallationMethod::G => "On perforated cable tray",
            InstallationMethod::Portable => "Portable equipment",
            InstallationMethod::Temporary => "Temporary installation",
        }
    }

    /// Parse from a code, case-insensitive
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_uppercase().as_str() {
            "A1" => Ok(InstallationMethod::A1),
            "A2" => Ok(InstallationMethod::A2),
            "B1" => Ok(InstallationMethod::B1),
            "B2" => Ok(InstallationMethod::B2),
            "C" => Ok(InstallationMethod::C),
            "D1" => Ok(InstallationMethod::D1),
            "D2" => Ok(InstallationMethod::D2),
            "E" => Ok(InstallationMethod::E),
            "F" => Ok(InstallationMethod::F),
            "G" => Ok(InstallationMethod::G),
            "PORTABLE" => Ok(InstallationMethod::Portable),
            "TEMPORARY" => Ok(InstallationMethod::Temporary),
            _ => Err(CalcError::invalid_input(
                "installation_method",
                s,
                "Expected a reference method A1-G, Portable or Temporary",
            )),
        }
    }
}

impl std::fmt::Display for InstallationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Fire performance class of the cable sheath
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FirePerformance {
    Standard,
    Lsoh,
    FireResistant,
    Mineral,
}

/// Degree of mechanical protection provided by the cable construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MechanicalProtection {
    None,
    Light,
    Medium,
    Heavy,
}

/// Conductor material.
///
/// Tabulated mV/A/m values are for copper; aluminium conductors are scaled by
/// a fixed resistivity multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConductorMaterial {
    #[default]
    Copper,
    Aluminium,
}

impl ConductorMaterial {
    /// Multiplier applied to copper mV/A/m values
    pub fn multiplier(&self) -> f64 {
        match self {
            ConductorMaterial::Copper => 1.0,
            ConductorMaterial::Aluminium => 1.6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cable_type_parsing() {
        assert_eq!(CableType::from_str_flexible("SWA").unwrap(), CableType::SwaXlpe);
        assert_eq!(CableType::from_str_flexible("pvc twin earth").unwrap(), CableType::PvcTwinEarth);
        assert_eq!(CableType::from_str_flexible("H07RN-F").unwrap(), CableType::H07rnF);
        assert!(CableType::from_str_flexible("bell wire").is_err());
    }

    #[test]
    fn test_cable_type_serializes_as_key() {
        for t in CableType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.key()));
        }
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!(InstallationMethod::from_str_flexible("c").unwrap(), InstallationMethod::C);
        assert_eq!(InstallationMethod::from_str_flexible(" d2 ").unwrap(), InstallationMethod::D2);
        assert!(InstallationMethod::from_str_flexible("Z").is_err());
    }

    #[test]
    fn test_material_multiplier() {
        assert_eq!(ConductorMaterial::default(), ConductorMaterial::Copper);
        assert_eq!(ConductorMaterial::Copper.multiplier(), 1.0);
        assert!(ConductorMaterial::Aluminium.multiplier() > 1.0);
    }
}
