//! # Unit Types
//!
//! Type-safe wrappers for quantities that come in more than one scale.
//! Each is a plain `f64` newtype that serializes as a bare number.
//!
//! - Power: watts (W), kilowatts (kW)
//! - Impedance: ohms, milliohms
//! - Time: hours, minutes
//! - Money: pounds sterling (GBP)
//!
//! Volts, amperes, metres and mm² stay as `f64` fields with the unit in the
//! field name (`length_m`, `size_mm2`).
//!
//! ## Example
//!
//! ```rust
//! use calc_core::units::{Kilowatts, Minutes, Hours, Watts};
//!
//! let shower: Watts = Kilowatts(9.5).into();
//! assert_eq!(shower.0, 9500.0);
//!
//! let travel: Hours = Minutes(30.0).into();
//! assert_eq!(travel.0, 0.5);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

// ============================================================================
// Electrical Units
// ============================================================================

/// Impedance in ohms
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ohms(pub f64);

/// Impedance in milliohms
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MilliOhms(pub f64);

impl From<MilliOhms> for Ohms {
    fn from(mohm: MilliOhms) -> Self {
        Ohms(mohm.0 / 1000.0)
    }
}

impl From<Ohms> for MilliOhms {
    fn from(ohm: Ohms) -> Self {
        MilliOhms(ohm.0 * 1000.0)
    }
}

/// Power in watts
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watts(pub f64);

/// Power in kilowatts
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilowatts(pub f64);

impl From<Watts> for Kilowatts {
    fn from(w: Watts) -> Self {
        Kilowatts(w.0 / 1000.0)
    }
}

impl From<Kilowatts> for Watts {
    fn from(kw: Kilowatts) -> Self {
        Watts(kw.0 * 1000.0)
    }
}

// ============================================================================
// Time and Money
// ============================================================================

/// Duration in hours
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hours(pub f64);

/// Duration in minutes
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Minutes(pub f64);

impl From<Minutes> for Hours {
    fn from(min: Minutes) -> Self {
        Hours(min.0 / 60.0)
    }
}

impl From<Hours> for Minutes {
    fn from(h: Hours) -> Self {
        Minutes(h.0 * 60.0)
    }
}

/// Amount in pounds sterling
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gbp(pub f64);

impl Gbp {
    /// Round to whole pence
    pub fn to_pence(self) -> Self {
        Gbp((self.0 * 100.0).round() / 100.0)
    }
}

impl std::fmt::Display for Gbp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "£{:.2}", self.0)
    }
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }
        }
    };
}

impl_arithmetic!(Ohms);
impl_arithmetic!(MilliOhms);
impl_arithmetic!(Watts);
impl_arithmetic!(Kilowatts);
impl_arithmetic!(Hours);
impl_arithmetic!(Minutes);
impl_arithmetic!(Gbp);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kilowatts_to_watts() {
        let w: Watts = Kilowatts(7.2).into();
        assert!((w.0 - 7200.0).abs() < 1e-9);
        let kw: Kilowatts = Watts(3000.0).into();
        assert_eq!(kw.0, 3.0);
    }

    #[test]
    fn test_milliohms_to_ohms() {
        let ohm: Ohms = MilliOhms(350.0).into();
        assert!((ohm.0 - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_arithmetic() {
        let ze = Ohms(0.25);
        let r1_r2 = Ohms(0.5);
        assert_eq!((ze + r1_r2).0, 0.75);
        assert_eq!((r1_r2 - ze).0, 0.25);
        assert_eq!((r1_r2 * 1.5).0, 0.75);
        assert_eq!((r1_r2 / 2.0).0, 0.25);
    }

    #[test]
    fn test_gbp_display_and_pence() {
        assert_eq!(Gbp(45.0).to_string(), "£45.00");
        assert_eq!(Gbp(12.346).to_pence().0, 12.35);
    }

    #[test]
    fn test_serialization_is_bare_number() {
        let json = serde_json::to_string(&Gbp(85.5)).unwrap();
        assert_eq!(json, "85.5");
        let parsed: Hours = serde_json::from_str("1.25").unwrap();
        assert_eq!(parsed, Hours(1.25));
    }
}
