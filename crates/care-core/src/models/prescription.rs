//! Prescription models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a prescription was for the stay or for discharge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PrescriptionType {
    Regular,
    Discharge,
}

impl PrescriptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrescriptionType::Regular => "REGULAR",
            PrescriptionType::Discharge => "DISCHARGE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "REGULAR" => Some(PrescriptionType::Regular),
            "DISCHARGE" => Some(PrescriptionType::Discharge),
            _ => None,
        }
    }
}

/// How a dose is administered over time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DosageType {
    /// Fixed schedule
    Regular,
    /// As needed
    Prn,
    /// Stepped from a base to a target dose
    Titrated,
}

impl DosageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DosageType::Regular => "REGULAR",
            DosageType::Prn => "PRN",
            DosageType::Titrated => "TITRATED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "REGULAR" => Some(DosageType::Regular),
            "PRN" => Some(DosageType::Prn),
            "TITRATED" => Some(DosageType::Titrated),
            _ => None,
        }
    }

    /// Sort priority on reports: scheduled doses first, PRN last.
    pub fn order_priority(&self) -> u8 {
        match self {
            DosageType::Regular => 0,
            DosageType::Titrated => 1,
            DosageType::Prn => 2,
        }
    }
}

/// A medicine prescribed during a consultation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    /// Row ID (0 until inserted); insertion order tiebreak
    pub id: i64,
    pub consultation_id: i64,
    pub medicine: String,
    pub prescription_type: PrescriptionType,
    pub dosage_type: DosageType,
    pub base_dosage: Option<String>,
    /// Titrated prescriptions only
    pub target_dosage: Option<String>,
    pub route: Option<String>,
    pub frequency: Option<String>,
    pub days: Option<i64>,
    /// PRN indication
    pub indicator: Option<String>,
    /// PRN maximum in 24 hours
    pub max_dosage: Option<String>,
    pub min_hours_between_doses: Option<f64>,
    pub notes: Option<String>,
    pub discontinued: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Prescription {
    pub fn new(
        consultation_id: i64,
        medicine: String,
        prescription_type: PrescriptionType,
        dosage_type: DosageType,
    ) -> Self {
        Self {
            id: 0,
            consultation_id,
            medicine,
            prescription_type,
            dosage_type,
            base_dosage: None,
            target_dosage: None,
            route: None,
            frequency: None,
            days: None,
            indicator: None,
            max_dosage: None,
            min_hours_between_doses: None,
            notes: None,
            discontinued: false,
            created_at: Utc::now(),
        }
    }

    /// Dosage column text for reports.
    pub fn dosage_summary(&self) -> String {
        let base = self.base_dosage.clone().unwrap_or_default();
        match (self.dosage_type, &self.target_dosage) {
            (DosageType::Titrated, Some(target)) => format!("{} → {}", base, target),
            (DosageType::Prn, _) => match &self.indicator {
                Some(indicator) => format!("{} (PRN: {})", base, indicator),
                None => format!("{} (PRN)", base),
            },
            _ => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_priority() {
        assert!(DosageType::Regular.order_priority() < DosageType::Titrated.order_priority());
        assert!(DosageType::Titrated.order_priority() < DosageType::Prn.order_priority());
    }

    #[test]
    fn test_dosage_summary() {
        let mut p = Prescription::new(1, "Insulin".into(), PrescriptionType::Regular, DosageType::Titrated);
        p.base_dosage = Some("2 U".into());
        p.target_dosage = Some("10 U".into());
        assert_eq!(p.dosage_summary(), "2 U → 10 U");

        let mut prn = Prescription::new(1, "Paracetamol".into(), PrescriptionType::Regular, DosageType::Prn);
        prn.base_dosage = Some("500 mg".into());
        prn.indicator = Some("fever".into());
        assert_eq!(prn.dosage_summary(), "500 mg (PRN: fever)");
    }
}
