//! Discharge summary data aggregation.

use chrono::Duration;
use serde::Serialize;

use super::classifier::classify_diagnoses;
use super::{SummaryError, SummaryResult};
use crate::db::Database;
use crate::models::{
    Consultation, EncounterSymptom, Facility, FileType, FileUpload, InvestigationValue,
    MedicalHistoryEntry, Patient, PatientSample, Policy, Prescription, PrescriptionType,
    ResolvedDiagnosis,
};

/// Everything a discharge summary shows about one consultation.
#[derive(Debug, Clone, Serialize)]
pub struct DischargeSummaryData {
    pub consultation: Consultation,
    pub patient: Patient,
    pub facility: Option<Facility>,
    pub samples: Vec<PatientSample>,
    /// Insurance policies
    pub hcx: Vec<Policy>,
    pub symptoms: Vec<EncounterSymptom>,
    /// Distinct bed types, newest assignment first; `None` if never admitted
    pub admitted_to: Option<Vec<String>>,
    pub admission_duration: Option<String>,
    /// Confirmed, provisional, unconfirmed, then differential
    pub diagnoses: Vec<ResolvedDiagnosis>,
    pub primary_diagnoses: Vec<ResolvedDiagnosis>,
    pub prescriptions: Vec<Prescription>,
    pub discharge_prescriptions: Vec<Prescription>,
    pub medical_history: Vec<MedicalHistoryEntry>,
    pub investigations: Vec<InvestigationValue>,
    pub files: Vec<FileUpload>,
    /// Diagnosis references that could not be resolved
    pub dropped_diagnoses: usize,
}

/// Collects [`DischargeSummaryData`] from the database. Read-only.
pub struct SummaryAggregator<'a> {
    db: &'a Database,
}

impl<'a> SummaryAggregator<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn aggregate(&self, consultation: &Consultation) -> SummaryResult<DischargeSummaryData> {
        tracing::info!(
            consultation = %consultation.external_id,
            "fetching discharge summary data"
        );

        let patient = self.db.get_patient(consultation.patient_id)?.ok_or_else(|| {
            SummaryError::NotFound(format!("patient {}", consultation.patient_id))
        })?;
        let facility = match consultation.facility_id {
            Some(id) => self.db.get_facility(id)?,
            None => None,
        };

        let samples = self.db.samples_for_consultation(patient.id, consultation.id)?;
        let hcx = self.db.policies_for_patient(patient.id)?;
        let symptoms = self
            .db
            .symptoms_before_encounter(consultation.id, consultation.encounter_date)?;

        let entries = self.db.active_consultation_diagnoses(consultation.id)?;
        let buckets = classify_diagnoses(&entries, self.db)?;
        if buckets.dropped() > 0 {
            tracing::warn!(
                consultation = %consultation.external_id,
                dropped = buckets.dropped(),
                "unresolved diagnoses left out of summary"
            );
        }

        let investigations = self.db.investigations_with_results(consultation.id)?;
        let medical_history = self.db.medical_history_for_patient(patient.id)?;
        let prescriptions = self
            .db
            .prescriptions_by_priority(consultation.id, PrescriptionType::Regular)?;
        let discharge_prescriptions = self
            .db
            .prescriptions_by_priority(consultation.id, PrescriptionType::Discharge)?;
        let files = self
            .db
            .list_file_uploads(&consultation.external_id, FileType::Consultation)?;

        let admitted_to = admitted_to(
            self.db
                .assigned_bed_types(consultation.id)?
                .iter()
                .map(|bed_type| bed_type.name()),
        );
        let admission_duration = consultation.admission_duration().map(format_duration);

        Ok(DischargeSummaryData {
            consultation: consultation.clone(),
            patient,
            facility,
            samples,
            hcx,
            symptoms,
            admitted_to,
            admission_duration,
            diagnoses: buckets.flattened(),
            primary_diagnoses: buckets.principal.clone(),
            prescriptions,
            discharge_prescriptions,
            medical_history,
            investigations,
            files,
            dropped_diagnoses: buckets.dropped(),
        })
    }
}

/// Distinct names in first-seen order, or `None` when there are none.
pub fn admitted_to<'n, I>(names: I) -> Option<Vec<String>>
where
    I: IntoIterator<Item = &'n str>,
{
    let mut distinct: Vec<String> = Vec::new();
    for name in names {
        if !distinct.iter().any(|seen| seen == name) {
            distinct.push(name.to_string());
        }
    }
    (!distinct.is_empty()).then_some(distinct)
}

/// `"<days> days"` for a day or more, otherwise `"HH:MM"`.
///
/// Zero and negative durations format as an empty string.
pub fn format_duration(duration: Duration) -> String {
    if duration <= Duration::zero() {
        return String::new();
    }

    let days = duration.num_days();
    if days > 0 {
        return format!("{} days", days);
    }
    let minutes = duration.num_minutes();
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
