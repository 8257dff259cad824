//! # Inspection Schedules
//!
//! Inspection items recorded on electrical certificates and reports, with the
//! BS 7671 classification codes and the overall assessment they imply.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::inspection::{Assessment, CertificateType, InspectionItem, InspectionSchedule, Outcome};
//!
//! let mut schedule = InspectionSchedule::new(CertificateType::Eicr);
//! schedule.add_item(InspectionItem::new("3.5", "Earthing conductor at MET", "543.3.2"));
//! schedule.set_outcome("3.5", Outcome::C1, "Disconnected at MET").unwrap();
//!
//! assert_eq!(schedule.overall_assessment(), Assessment::Unsatisfactory);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Certificate or report the schedule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertificateType {
    /// Electrical Installation Condition Report
    Eicr,
    /// Electrical Installation Certificate
    Eic,
    /// Minor Electrical Installation Works Certificate
    Meiwc,
}

impl CertificateType {
    pub fn title(&self) -> &'static str {
        match self {
            CertificateType::Eicr => "Electrical Installation Condition Report",
            CertificateType::Eic => "Electrical Installation Certificate",
            CertificateType::Meiwc => "Minor Electrical Installation Works Certificate",
        }
    }

    /// Whether the document classifies defects with C1/C2/C3/FI codes
    pub fn uses_classification_codes(&self) -> bool {
        matches!(self, CertificateType::Eicr)
    }
}

/// Outcome recorded against an inspection item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "satisfactory")]
    Satisfactory,
    /// Danger present
    C1,
    /// Potentially dangerous
    C2,
    /// Improvement recommended
    C3,
    /// Further investigation required
    FI,
    #[default]
    #[serde(rename = "not-verified")]
    NotVerified,
    #[serde(rename = "LIM")]
    Limitation,
    #[serde(rename = "not-applicable")]
    NotApplicable,
}

impl Outcome {
    /// Outcomes that make an installation unsatisfactory
    pub fn is_unsatisfactory(&self) -> bool {
        matches!(self, Outcome::C1 | Outcome::C2 | Outcome::FI)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Outcome::Satisfactory => "\u{2713}",
            Outcome::C1 => "C1",
            Outcome::C2 => "C2",
            Outcome::C3 => "C3",
            Outcome::FI => "FI",
            Outcome::NotVerified => "NV",
            Outcome::Limitation => "LIM",
            Outcome::NotApplicable => "N/A",
        }
    }
}

/// One line of an inspection schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionItem {
    pub id: String,
    /// Schedule numbering ("3.5")
    pub item_number: String,
    pub description: String,
    /// BS 7671 regulation reference
    pub clause: String,
    #[serde(default)]
    pub outcome: Outcome,
    #[serde(default)]
    pub notes: String,
}

impl InspectionItem {
    pub fn new(item_number: impl Into<String>, description: impl Into<String>, clause: impl Into<String>) -> Self {
        let item_number = item_number.into();
        InspectionItem {
            id: format!("item_{}", item_number.replace('.', "_")),
            item_number,
            description: description.into(),
            clause: clause.into(),
            outcome: Outcome::NotVerified,
            notes: String::new(),
        }
    }
}

/// Overall condition of the installation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assessment {
    Satisfactory,
    Unsatisfactory,
}

/// Count of items per outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub total: usize,
    pub satisfactory: usize,
    pub c1: usize,
    pub c2: usize,
    pub c3: usize,
    pub fi: usize,
    pub not_verified: usize,
    pub limitation: usize,
    pub not_applicable: usize,
}

/// All inspection items for one certificate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionSchedule {
    pub certificate_type: CertificateType,
    #[serde(default)]
    pub items: Vec<InspectionItem>,
}

impl InspectionSchedule {
    pub fn new(certificate_type: CertificateType) -> Self {
        InspectionSchedule {
            certificate_type,
            items: Vec::new(),
        }
    }

    pub fn add_item(&mut self, item: InspectionItem) {
        self.items.push(item);
    }

    /// Record an outcome against the item with the given number
    pub fn set_outcome(&mut self, item_number: &str, outcome: Outcome, notes: impl Into<String>) -> CalcResult<()> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.item_number == item_number)
            .ok_or_else(|| {
                CalcError::invalid_input("item_number", item_number, "No inspection item with this number")
            })?;
        item.outcome = outcome;
        item.notes = notes.into();
        Ok(())
    }

    pub fn summary(&self) -> ScheduleSummary {
        let mut s = ScheduleSummary {
            total: self.items.len(),
            ..Default::default()
        };
        for item in &self.items {
            match item.outcome {
                Outcome::Satisfactory => s.satisfactory += 1,
                Outcome::C1 => s.c1 += 1,
                Outcome::C2 => s.c2 += 1,
                Outcome::C3 => s.c3 += 1,
                Outcome::FI => s.fi += 1,
                Outcome::NotVerified => s.not_verified += 1,
                Outcome::Limitation => s.limitation += 1,
                Outcome::NotApplicable => s.not_applicable += 1,
            }
        }
        s
    }

    /// Unsatisfactory when any item is C1, C2 or FI
    pub fn overall_assessment(&self) -> Assessment {
        if self.items.iter().any(|i| i.outcome.is_unsatisfactory()) {
            Assessment::Unsatisfactory
        } else {
            Assessment::Satisfactory
        }
    }

    /// Items that need remedial work or investigation, most urgent first
    pub fn items_requiring_action(&self) -> Vec<&InspectionItem> {
        let mut items: Vec<&InspectionItem> = self
            .items
            .iter()
            .filter(|i| matches!(i.outcome, Outcome::C1 | Outcome::C2 | Outcome::FI | Outcome::C3))
            .collect();
        items.sort_by_key(|i| match i.outcome {
            Outcome::C1 => 0,
            Outcome::C2 => 1,
            Outcome::FI => 2,
            _ => 3,
        });
        items
    }
}
