//! Facility models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A hospital or care facility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Facility {
    /// Row ID (0 until inserted)
    pub id: i64,
    /// Public UUID
    pub external_id: String,
    /// Facility name
    pub name: String,
    /// District the facility belongs to
    pub district: String,
    /// Facility type label (e.g., "Private Hospital", "Primary Health Centre")
    pub facility_type: String,
    /// Postal address
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Oxygen capacity in litres
    pub oxygen_capacity: i64,
    pub phone_number: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Facility {
    /// Create a new facility with required fields.
    pub fn new(name: String, district: String, facility_type: String) -> Self {
        Self {
            id: 0,
            external_id: uuid::Uuid::new_v4().to_string(),
            name,
            district,
            facility_type,
            address: String::new(),
            latitude: None,
            longitude: None,
            oxygen_capacity: 0,
            phone_number: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Geographic location, present only when both coordinates are set.
    pub fn location(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}
