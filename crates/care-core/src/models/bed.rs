//! Bed and bed assignment models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of bed a patient can be admitted to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BedType {
    Isolation,
    Icu,
    IcuWithNonInvasiveVentilator,
    IcuWithOxygenSupport,
    IcuWithInvasiveVentilator,
    BedWithOxygenSupport,
    Regular,
}

impl BedType {
    /// Stored integer code.
    pub fn code(&self) -> i64 {
        match self {
            BedType::Isolation => 1,
            BedType::Icu => 2,
            BedType::IcuWithNonInvasiveVentilator => 3,
            BedType::IcuWithOxygenSupport => 4,
            BedType::IcuWithInvasiveVentilator => 5,
            BedType::BedWithOxygenSupport => 6,
            BedType::Regular => 7,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(BedType::Isolation),
            2 => Some(BedType::Icu),
            3 => Some(BedType::IcuWithNonInvasiveVentilator),
            4 => Some(BedType::IcuWithOxygenSupport),
            5 => Some(BedType::IcuWithInvasiveVentilator),
            6 => Some(BedType::BedWithOxygenSupport),
            7 => Some(BedType::Regular),
            _ => None,
        }
    }

    /// Name shown under "admitted to" on reports.
    pub fn name(&self) -> &'static str {
        match self {
            BedType::Isolation => "ISOLATION",
            BedType::Icu => "ICU",
            BedType::IcuWithNonInvasiveVentilator => "ICU_WITH_NON_INVASIVE_VENTILATOR",
            BedType::IcuWithOxygenSupport => "ICU_WITH_OXYGEN_SUPPORT",
            BedType::IcuWithInvasiveVentilator => "ICU_WITH_INVASIVE_VENTILATOR",
            BedType::BedWithOxygenSupport => "BED_WITH_OXYGEN_SUPPORT",
            BedType::Regular => "REGULAR",
        }
    }
}

/// A physical bed at a facility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bed {
    /// Row ID (0 until inserted)
    pub id: i64,
    pub external_id: String,
    pub facility_id: Option<i64>,
    pub name: String,
    pub bed_type: BedType,
}

impl Bed {
    pub fn new(name: String, bed_type: BedType) -> Self {
        Self {
            id: 0,
            external_id: uuid::Uuid::new_v4().to_string(),
            facility_id: None,
            name,
            bed_type,
        }
    }
}

/// Assignment of a bed to a consultation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsultationBed {
    /// Row ID (0 until inserted)
    pub id: i64,
    pub consultation_id: i64,
    pub bed_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    /// Creation timestamp (newest assignment first on reports)
    pub created_at: DateTime<Utc>,
}

impl ConsultationBed {
    pub fn new(consultation_id: i64, bed_id: i64, start_date: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            consultation_id,
            bed_id,
            start_date,
            end_date: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bed_type_codes() {
        for code in 1..=7 {
            let bed_type = BedType::from_code(code).unwrap();
            assert_eq!(bed_type.code(), code);
        }
        assert_eq!(BedType::from_code(0), None);
        assert_eq!(BedType::Icu.name(), "ICU");
    }
}
