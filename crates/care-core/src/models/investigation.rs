//! Investigation (lab/imaging result) models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded investigation value for a consultation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvestigationValue {
    /// Row ID (0 until inserted)
    pub id: i64,
    pub consultation_id: i64,
    /// Investigation name (e.g., "Haemoglobin")
    pub investigation: String,
    /// Investigation group (e.g., "Complete Blood Count")
    pub group: Option<String>,
    /// Numeric value, if measured
    pub value: Option<f64>,
    /// Free-text result, if any
    pub notes: Option<String>,
    pub unit: Option<String>,
    /// Reference range text
    pub ideal_value: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl InvestigationValue {
    pub fn new(consultation_id: i64, investigation: String) -> Self {
        Self {
            id: 0,
            consultation_id,
            investigation,
            group: None,
            value: None,
            notes: None,
            unit: None,
            ideal_value: None,
            created_at: Utc::now(),
        }
    }

    /// Whether the investigation produced any result.
    pub fn has_result(&self) -> bool {
        self.value.is_some() || self.notes.is_some()
    }

    /// Value column text for reports.
    pub fn display_value(&self) -> String {
        match (self.value, &self.notes) {
            (Some(value), _) => match &self.unit {
                Some(unit) => format!("{} {}", value, unit),
                None => value.to_string(),
            },
            (None, Some(notes)) => notes.clone(),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_value() {
        let mut inv = InvestigationValue::new(1, "Haemoglobin".into());
        assert!(!inv.has_result());
        inv.value = Some(13.5);
        inv.unit = Some("g/dL".into());
        assert_eq!(inv.display_value(), "13.5 g/dL");

        let mut note_only = InvestigationValue::new(1, "Chest X-ray".into());
        note_only.notes = Some("Clear lung fields".into());
        assert!(note_only.has_result());
        assert_eq!(note_only.display_value(), "Clear lung fields");
    }
}
