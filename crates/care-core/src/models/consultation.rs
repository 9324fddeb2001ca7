//! Consultation (patient encounter) models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Why a patient was discharged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DischargeReason {
    Recovered,
    Referred,
    Expired,
    /// Left against medical advice
    Lama,
}

impl DischargeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DischargeReason::Recovered => "REC",
            DischargeReason::Referred => "REF",
            DischargeReason::Expired => "EXP",
            DischargeReason::Lama => "LAMA",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "REC" => Some(DischargeReason::Recovered),
            "REF" => Some(DischargeReason::Referred),
            "EXP" => Some(DischargeReason::Expired),
            "LAMA" => Some(DischargeReason::Lama),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DischargeReason::Recovered => "Recovered",
            DischargeReason::Referred => "Referred",
            DischargeReason::Expired => "Expired",
            DischargeReason::Lama => "LAMA",
        }
    }
}

/// A patient encounter at a facility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Consultation {
    /// Row ID (0 until inserted)
    pub id: i64,
    /// Public UUID
    pub external_id: String,
    pub patient_id: i64,
    pub facility_id: Option<i64>,
    /// Start of the encounter
    pub encounter_date: DateTime<Utc>,
    /// Set once the patient is discharged
    pub discharge_date: Option<DateTime<Utc>>,
    pub discharge_reason: Option<DischargeReason>,
    pub discharge_notes: Option<String>,
    /// In-patient number
    pub ip_no: Option<String>,
    /// Out-patient number
    pub op_no: Option<String>,
    pub treating_physician: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Consultation {
    /// Create a new consultation for a patient.
    pub fn new(patient_id: i64, encounter_date: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            external_id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            facility_id: None,
            encounter_date,
            discharge_date: None,
            discharge_reason: None,
            discharge_notes: None,
            ip_no: None,
            op_no: None,
            treating_physician: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_discharged(&self) -> bool {
        self.discharge_date.is_some()
    }

    /// Time between encounter and discharge, if discharged.
    pub fn admission_duration(&self) -> Option<Duration> {
        self.discharge_date
            .map(|discharged| discharged - self.encounter_date)
    }
}
