//! Lab sample models and their test flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stage of a sample in the testing workflow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SampleFlowStatus {
    RequestSubmitted,
    Approved,
    Denied,
    SentToCollectionCentre,
    ReceivedAndForwarded,
    ReceivedAtLab,
    Completed,
}

impl SampleFlowStatus {
    /// Stored integer code.
    pub fn code(&self) -> i64 {
        match self {
            SampleFlowStatus::RequestSubmitted => 1,
            SampleFlowStatus::Approved => 2,
            SampleFlowStatus::Denied => 3,
            SampleFlowStatus::SentToCollectionCentre => 4,
            SampleFlowStatus::ReceivedAndForwarded => 5,
            SampleFlowStatus::ReceivedAtLab => 6,
            SampleFlowStatus::Completed => 7,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(SampleFlowStatus::RequestSubmitted),
            2 => Some(SampleFlowStatus::Approved),
            3 => Some(SampleFlowStatus::Denied),
            4 => Some(SampleFlowStatus::SentToCollectionCentre),
            5 => Some(SampleFlowStatus::ReceivedAndForwarded),
            6 => Some(SampleFlowStatus::ReceivedAtLab),
            7 => Some(SampleFlowStatus::Completed),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SampleFlowStatus::RequestSubmitted => "Request Submitted",
            SampleFlowStatus::Approved => "Approved",
            SampleFlowStatus::Denied => "Denied",
            SampleFlowStatus::SentToCollectionCentre => "Sent To Collection Centre",
            SampleFlowStatus::ReceivedAndForwarded => "Received And Forwarded",
            SampleFlowStatus::ReceivedAtLab => "Received At Lab",
            SampleFlowStatus::Completed => "Completed",
        }
    }

    /// Statuses reachable in one step from this one.
    pub fn next_statuses(&self) -> &'static [SampleFlowStatus] {
        use SampleFlowStatus::*;
        match self {
            RequestSubmitted => &[Approved, Denied],
            Approved => &[SentToCollectionCentre],
            Denied => &[RequestSubmitted],
            SentToCollectionCentre => &[ReceivedAndForwarded],
            ReceivedAndForwarded => &[ReceivedAtLab],
            ReceivedAtLab => &[Completed],
            Completed => &[],
        }
    }

    pub fn can_transition_to(&self, next: SampleFlowStatus) -> bool {
        self.next_statuses().contains(&next)
    }
}

/// Test result of a sample.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SampleResult {
    Positive,
    Negative,
    Awaiting,
    Invalid,
}

impl SampleResult {
    pub fn code(&self) -> i64 {
        match self {
            SampleResult::Positive => 1,
            SampleResult::Negative => 2,
            SampleResult::Awaiting => 3,
            SampleResult::Invalid => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(SampleResult::Positive),
            2 => Some(SampleResult::Negative),
            3 => Some(SampleResult::Awaiting),
            4 => Some(SampleResult::Invalid),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SampleResult::Positive => "Positive",
            SampleResult::Negative => "Negative",
            SampleResult::Awaiting => "Awaiting",
            SampleResult::Invalid => "Invalid",
        }
    }
}

/// Error returned when a sample is moved outside its flow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid sample transition: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: SampleFlowStatus,
    pub to: SampleFlowStatus,
}

/// A lab sample taken during a consultation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientSample {
    /// Row ID (0 until inserted)
    pub id: i64,
    pub external_id: String,
    pub patient_id: i64,
    pub consultation_id: i64,
    pub sample_type: Option<String>,
    pub status: SampleFlowStatus,
    pub result: SampleResult,
    pub date_of_sample: Option<DateTime<Utc>>,
    pub date_of_result: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl PatientSample {
    /// New sample request awaiting approval.
    pub fn new(patient_id: i64, consultation_id: i64) -> Self {
        Self {
            id: 0,
            external_id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            consultation_id,
            sample_type: None,
            status: SampleFlowStatus::RequestSubmitted,
            result: SampleResult::Awaiting,
            date_of_sample: None,
            date_of_result: None,
            created_at: Utc::now(),
        }
    }

    /// Move the sample to `next`, enforcing the flow rules.
    pub fn advance(&mut self, next: SampleFlowStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_flow() {
        let mut sample = PatientSample::new(1, 1);
        for next in [
            SampleFlowStatus::Approved,
            SampleFlowStatus::SentToCollectionCentre,
            SampleFlowStatus::ReceivedAndForwarded,
            SampleFlowStatus::ReceivedAtLab,
            SampleFlowStatus::Completed,
        ] {
            sample.advance(next).unwrap();
        }
        assert_eq!(sample.status, SampleFlowStatus::Completed);
        assert!(SampleFlowStatus::Completed.next_statuses().is_empty());
    }

    #[test]
    fn test_denied_can_be_resubmitted() {
        let mut sample = PatientSample::new(1, 1);
        sample.advance(SampleFlowStatus::Denied).unwrap();
        sample.advance(SampleFlowStatus::RequestSubmitted).unwrap();
        assert_eq!(sample.status, SampleFlowStatus::RequestSubmitted);
    }

    #[test]
    fn test_skipping_a_stage_is_rejected() {
        let mut sample = PatientSample::new(1, 1);
        let err = sample.advance(SampleFlowStatus::ReceivedAtLab).unwrap_err();
        assert_eq!(err.from, SampleFlowStatus::RequestSubmitted);
        assert_eq!(sample.status, SampleFlowStatus::RequestSubmitted);
    }

    #[test]
    fn test_codes() {
        for code in 1..=7 {
            assert_eq!(SampleFlowStatus::from_code(code).unwrap().code(), code);
        }
        for code in 1..=4 {
            assert_eq!(SampleResult::from_code(code).unwrap().code(), code);
        }
        assert_eq!(SampleResult::from_code(9), None);
    }
}
