//! Diagnosis models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Verification status of a recorded condition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum VerificationStatus {
    Unconfirmed,
    Provisional,
    Differential,
    Confirmed,
    Refuted,
    EnteredInError,
}

/// Statuses that describe a condition the patient may actually have.
pub const ACTIVE_VERIFICATION_STATUSES: [VerificationStatus; 4] = [
    VerificationStatus::Unconfirmed,
    VerificationStatus::Provisional,
    VerificationStatus::Differential,
    VerificationStatus::Confirmed,
];

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Unconfirmed => "unconfirmed",
            VerificationStatus::Provisional => "provisional",
            VerificationStatus::Differential => "differential",
            VerificationStatus::Confirmed => "confirmed",
            VerificationStatus::Refuted => "refuted",
            VerificationStatus::EnteredInError => "entered-in-error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unconfirmed" => Some(VerificationStatus::Unconfirmed),
            "provisional" => Some(VerificationStatus::Provisional),
            "differential" => Some(VerificationStatus::Differential),
            "confirmed" => Some(VerificationStatus::Confirmed),
            "refuted" => Some(VerificationStatus::Refuted),
            "entered-in-error" => Some(VerificationStatus::EnteredInError),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        ACTIVE_VERIFICATION_STATUSES.contains(self)
    }
}

/// An ICD-11 diagnosis from the reference table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Icd11Diagnosis {
    /// ICD-11 entity ID
    pub id: i64,
    /// Display label (e.g., "CA40.0 Bacterial pneumonia")
    pub label: String,
    pub chapter: Option<String>,
}

/// A diagnosis recorded against a consultation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsultationDiagnosis {
    /// Row ID (0 until inserted)
    pub id: i64,
    pub consultation_id: i64,
    /// ICD-11 entity ID (may not resolve)
    pub diagnosis_id: i64,
    pub verification_status: VerificationStatus,
    pub is_principal: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl ConsultationDiagnosis {
    pub fn new(
        consultation_id: i64,
        diagnosis_id: i64,
        verification_status: VerificationStatus,
        is_principal: bool,
    ) -> Self {
        Self {
            id: 0,
            consultation_id,
            diagnosis_id,
            verification_status,
            is_principal,
            created_at: Utc::now(),
        }
    }
}

/// A resolved diagnosis carrying the status it was recorded with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedDiagnosis {
    #[serde(flatten)]
    pub diagnosis: Icd11Diagnosis,
    pub verification_status: VerificationStatus,
}

/// Outcome of looking up a diagnosis reference.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosisResolution {
    Found(Icd11Diagnosis),
    NotFound(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_statuses() {
        assert!(VerificationStatus::Confirmed.is_active());
        assert!(VerificationStatus::Differential.is_active());
        assert!(!VerificationStatus::EnteredInError.is_active());
        assert!(!VerificationStatus::Refuted.is_active());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            VerificationStatus::parse("entered-in-error"),
            Some(VerificationStatus::EnteredInError)
        );
        assert_eq!(VerificationStatus::parse("maybe"), None);
    }

    #[test]
    fn test_resolved_diagnosis_serializes_flat() {
        let resolved = ResolvedDiagnosis {
            diagnosis: Icd11Diagnosis {
                id: 42,
                label: "CA40.0 Bacterial pneumonia".into(),
                chapter: None,
            },
            verification_status: VerificationStatus::Confirmed,
        };
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["label"], "CA40.0 Bacterial pneumonia");
        assert_eq!(json["verification_status"], "Confirmed");
    }
}
