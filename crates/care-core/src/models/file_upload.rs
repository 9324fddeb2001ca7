//! Managed file artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a file upload is attached to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileType {
    Patient,
    Consultation,
    SampleManagement,
    Claim,
    DischargeSummary,
    Communication,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Patient => "PATIENT",
            FileType::Consultation => "CONSULTATION",
            FileType::SampleManagement => "SAMPLE_MANAGEMENT",
            FileType::Claim => "CLAIM",
            FileType::DischargeSummary => "DISCHARGE_SUMMARY",
            FileType::Communication => "COMMUNICATION",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PATIENT" => Some(FileType::Patient),
            "CONSULTATION" => Some(FileType::Consultation),
            "SAMPLE_MANAGEMENT" => Some(FileType::SampleManagement),
            "CLAIM" => Some(FileType::Claim),
            "DISCHARGE_SUMMARY" => Some(FileType::DischargeSummary),
            "COMMUNICATION" => Some(FileType::Communication),
            _ => None,
        }
    }
}

/// A file stored in object storage and tracked in the database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileUpload {
    /// Row ID (0 until inserted)
    pub id: i64,
    /// Public UUID
    pub external_id: String,
    /// Display name
    pub name: String,
    /// Unique storage name (e.g., "<uuid>.pdf")
    pub internal_name: String,
    pub file_type: FileType,
    /// External id of the owning record
    pub associating_id: String,
    /// Set only after the bytes are in storage
    pub upload_completed: bool,
    pub is_archived: bool,
    pub archive_reason: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl FileUpload {
    pub fn new(
        name: String,
        internal_name: String,
        file_type: FileType,
        associating_id: String,
    ) -> Self {
        Self {
            id: 0,
            external_id: uuid::Uuid::new_v4().to_string(),
            name,
            internal_name,
            file_type,
            associating_id,
            upload_completed: false,
            is_archived: false,
            archive_reason: None,
            created_at: Utc::now(),
        }
    }

    /// A discharge summary artifact with a fresh storage name.
    pub fn discharge_summary(
        patient_name: &str,
        consultation_external_id: &str,
        date: DateTime<Utc>,
    ) -> Self {
        Self::new(
            format!("discharge_summary-{}-{}", patient_name, date),
            format!("{}.pdf", uuid::Uuid::new_v4()),
            FileType::DischargeSummary,
            consultation_external_id.to_string(),
        )
    }

    /// Object storage key.
    pub fn storage_key(&self) -> String {
        format!("{}/{}", self.file_type.as_str(), self.internal_name)
    }

    pub fn archive(&mut self, reason: String) {
        self.is_archived = true;
        self.archive_reason = Some(reason);
    }
}
