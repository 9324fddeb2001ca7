//! Encounter symptom models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Clinical impression status of a recorded symptom.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClinicalImpressionStatus {
    InProgress,
    Completed,
    EnteredInError,
}

impl ClinicalImpressionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClinicalImpressionStatus::InProgress => "in-progress",
            ClinicalImpressionStatus::Completed => "completed",
            ClinicalImpressionStatus::EnteredInError => "entered-in-error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in-progress" => Some(ClinicalImpressionStatus::InProgress),
            "completed" => Some(ClinicalImpressionStatus::Completed),
            "entered-in-error" => Some(ClinicalImpressionStatus::EnteredInError),
            _ => None,
        }
    }
}

/// A symptom recorded during a consultation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EncounterSymptom {
    /// Row ID (0 until inserted)
    pub id: i64,
    pub consultation_id: i64,
    /// Symptom name (e.g., "Fever")
    pub symptom: String,
    /// Free text when the symptom is "Other"
    pub other_symptom: Option<String>,
    pub onset_date: DateTime<Utc>,
    pub cure_date: Option<DateTime<Utc>>,
    pub clinical_impression_status: ClinicalImpressionStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl EncounterSymptom {
    pub fn new(consultation_id: i64, symptom: String, onset_date: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            consultation_id,
            symptom,
            other_symptom: None,
            onset_date,
            cure_date: None,
            clinical_impression_status: ClinicalImpressionStatus::InProgress,
            created_at: Utc::now(),
        }
    }

    /// Name to show in reports.
    pub fn display_name(&self) -> &str {
        match &self.other_symptom {
            Some(other) if !other.trim().is_empty() => other,
            _ => &self.symptom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_other() {
        let mut symptom = EncounterSymptom::new(1, "Other".into(), Utc::now());
        assert_eq!(symptom.display_name(), "Other");
        symptom.other_symptom = Some("Hiccups".into());
        assert_eq!(symptom.display_name(), "Hiccups");
        symptom.other_symptom = Some("  ".into());
        assert_eq!(symptom.display_name(), "Other");
    }
}
