//! Insurance policy models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coverage status reported by the insurer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PolicyStatus {
    Active,
    Cancelled,
    Draft,
    EnteredInError,
}

impl PolicyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyStatus::Active => "active",
            PolicyStatus::Cancelled => "cancelled",
            PolicyStatus::Draft => "draft",
            PolicyStatus::EnteredInError => "entered-in-error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(PolicyStatus::Active),
            "cancelled" => Some(PolicyStatus::Cancelled),
            "draft" => Some(PolicyStatus::Draft),
            "entered-in-error" => Some(PolicyStatus::EnteredInError),
            _ => None,
        }
    }
}

/// An insurance policy held by a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Policy {
    /// Row ID (0 until inserted)
    pub id: i64,
    pub external_id: String,
    pub patient_id: i64,
    pub subscriber_id: String,
    pub policy_id: String,
    pub insurer_id: Option<String>,
    pub insurer_name: Option<String>,
    pub status: Option<PolicyStatus>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Policy {
    pub fn new(patient_id: i64, subscriber_id: String, policy_id: String) -> Self {
        Self {
            id: 0,
            external_id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            subscriber_id,
            policy_id,
            insurer_id: None,
            insurer_name: None,
            status: None,
            created_at: Utc::now(),
        }
    }
}
