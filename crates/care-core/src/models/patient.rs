//! Patient models.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Patient gender.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    NonBinary,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::NonBinary => "non_binary",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "non_binary" => Some(Gender::NonBinary),
            _ => None,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::NonBinary => "Non-binary",
        }
    }
}

/// Ration card category recorded at registration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RationCardCategory {
    /// Non-card holder
    NoCard,
    /// Below poverty line
    Bpl,
    /// Above poverty line
    Apl,
}

impl RationCardCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RationCardCategory::NoCard => "NO_CARD",
            RationCardCategory::Bpl => "BPL",
            RationCardCategory::Apl => "APL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NO_CARD" => Some(RationCardCategory::NoCard),
            "BPL" => Some(RationCardCategory::Bpl),
            "APL" => Some(RationCardCategory::Apl),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RationCardCategory::NoCard => "Non-card holder",
            RationCardCategory::Bpl => "BPL",
            RationCardCategory::Apl => "APL",
        }
    }
}

/// A registered patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Row ID (0 until inserted)
    pub id: i64,
    /// Public UUID
    pub external_id: String,
    /// Registering facility
    pub facility_id: Option<i64>,
    pub name: String,
    pub gender: Gender,
    pub date_of_birth: Option<NaiveDate>,
    /// Used when only the birth year is known
    pub year_of_birth: Option<i32>,
    pub phone_number: String,
    pub address: String,
    pub blood_group: Option<String>,
    pub ration_card_category: Option<RationCardCategory>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(name: String, gender: Gender) -> Self {
        Self {
            id: 0,
            external_id: uuid::Uuid::new_v4().to_string(),
            facility_id: None,
            name,
            gender,
            date_of_birth: None,
            year_of_birth: None,
            phone_number: String::new(),
            address: String::new(),
            blood_group: None,
            ration_card_category: None,
            created_at: Utc::now(),
        }
    }

    /// Age in whole years on the given date.
    ///
    /// Falls back to the birth year when no full date of birth is recorded.
    pub fn age_on(&self, date: NaiveDate) -> Option<u32> {
        if let Some(dob) = self.date_of_birth {
            let mut years = date.year() - dob.year();
            if (date.month(), date.day()) < (dob.month(), dob.day()) {
                years -= 1;
            }
            return u32::try_from(years).ok();
        }
        self.year_of_birth
            .and_then(|year| u32::try_from(date.year() - year).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_patient() {
        let patient = Patient::new("Asha".into(), Gender::Female);
        assert_eq!(patient.name, "Asha");
        assert_eq!(patient.external_id.len(), 36);
        assert_eq!(patient.id, 0);
    }

    #[test]
    fn test_age_from_date_of_birth() {
        let mut patient = Patient::new("Asha".into(), Gender::Female);
        patient.date_of_birth = NaiveDate::from_ymd_opt(1990, 6, 15);

        let before_birthday = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let on_birthday = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(patient.age_on(before_birthday), Some(33));
        assert_eq!(patient.age_on(on_birthday), Some(34));
    }

    #[test]
    fn test_age_from_year_of_birth() {
        let mut patient = Patient::new("Ravi".into(), Gender::Male);
        patient.year_of_birth = Some(1980);
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(patient.age_on(date), Some(44));
    }

    #[test]
    fn test_ration_card_roundtrip_codes() {
        for category in [RationCardCategory::NoCard, RationCardCategory::Bpl, RationCardCategory::Apl] {
            assert_eq!(RationCardCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(RationCardCategory::NoCard.label(), "Non-card holder");
    }
}
