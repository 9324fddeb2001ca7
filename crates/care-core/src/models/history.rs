//! Medical history models.

use serde::{Deserialize, Serialize};

/// A pre-existing condition recorded for a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalHistoryEntry {
    /// Row ID (0 until inserted)
    pub id: i64,
    pub patient_id: i64,
    /// Condition name (e.g., "Diabetes")
    pub disease: String,
    pub details: Option<String>,
}

impl MedicalHistoryEntry {
    pub fn new(patient_id: i64, disease: String) -> Self {
        Self {
            id: 0,
            patient_id,
            disease,
            details: None,
        }
    }
}
