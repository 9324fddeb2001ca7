//! Discharge summary document template.

use std::path::{Path, PathBuf};

use care_typst::TypstDocument;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::aggregator::DischargeSummaryData;
use crate::models::ResolvedDiagnosis;

/// Rendering errors.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("asset path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),
}

/// Inputs to a template.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub data: &'a DischargeSummaryData,
    pub logo_path: &'a Path,
    /// Generation timestamp
    pub date: DateTime<Utc>,
}

/// Turns summary data into compiler source.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, context: &RenderContext<'_>) -> Result<String, RenderError>;
}

const DATE_FORMAT: &str = "%d/%m/%Y";
const DATE_TIME_FORMAT: &str = "%d/%m/%Y %H:%M";

/// A4 discharge summary in Typst.
#[derive(Debug, Clone, Default)]
pub struct TypstSummaryTemplate;

impl TypstSummaryTemplate {
    pub fn new() -> Self {
        Self
    }
}

fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

fn diagnosis_rows(diagnoses: &[ResolvedDiagnosis]) -> Vec<Vec<String>> {
    diagnoses
        .iter()
        .map(|d| {
            vec![
                d.diagnosis.label.clone(),
                d.verification_status.as_str().to_string(),
            ]
        })
        .collect()
}

impl DocumentRenderer for TypstSummaryTemplate {
    fn render(&self, context: &RenderContext<'_>) -> Result<String, RenderError> {
        let data = context.data;
        let logo = context
            .logo_path
            .to_str()
            .ok_or_else(|| RenderError::NonUtf8Path(context.logo_path.to_path_buf()))?;

        let mut doc = TypstDocument::new();
        doc.page("a4", 1.5).text_style(10.0).image(logo, 120);

        doc.heading(1, "Patient Discharge Summary");
        if let Some(facility) = &data.facility {
            doc.field("Facility", &facility.name)
                .field("District", &facility.district);
        }
        doc.field("Created on", &context.date.format(DATE_TIME_FORMAT).to_string());

        // Patient
        let patient = &data.patient;
        let age = patient
            .age_on(context.date.date_naive())
            .map(|years| years.to_string());
        doc.heading(2, "Patient Details")
            .field("Full name", &patient.name)
            .field("Gender", patient.gender.label())
            .field("Age", &or_dash(age.as_deref()))
            .field(
                "Date of birth",
                &or_dash(
                    patient
                        .date_of_birth
                        .map(|d| d.format(DATE_FORMAT).to_string())
                        .as_deref(),
                ),
            )
            .field("Blood group", &or_dash(patient.blood_group.as_deref()))
            .field("Phone number", &or_dash(Some(patient.phone_number.as_str())))
            .field("Address", &or_dash(Some(patient.address.as_str())))
            .field(
                "Ration card category",
                &or_dash(patient.ration_card_category.map(|c| c.label())),
            );

        // Admission
        let consultation = &data.consultation;
        doc.heading(2, "Admission Details")
            .field("IP number", &or_dash(consultation.ip_no.as_deref()))
            .field("OP number", &or_dash(consultation.op_no.as_deref()))
            .field(
                "Admitted on",
                &consultation.encounter_date.format(DATE_TIME_FORMAT).to_string(),
            )
            .field(
                "Discharged on",
                &or_dash(
                    consultation
                        .discharge_date
                        .map(|d| d.format(DATE_TIME_FORMAT).to_string())
                        .as_deref(),
                ),
            )
            .field(
                "Admitted to",
                &or_dash(data.admitted_to.as_ref().map(|names| names.join(", ")).as_deref()),
            )
            .field(
                "Duration of admission",
                &or_dash(data.admission_duration.as_deref()),
            )
            .field(
                "Treating physician",
                &or_dash(consultation.treating_physician.as_deref()),
            );

        if !data.hcx.is_empty() {
            let rows: Vec<Vec<String>> = data
                .hcx
                .iter()
                .map(|policy| {
                    vec![
                        or_dash(policy.insurer_name.as_deref()),
                        policy.policy_id.clone(),
                        policy.subscriber_id.clone(),
                        or_dash(policy.status.map(|s| s.as_str())),
                    ]
                })
                .collect();
            doc.heading(2, "Health Insurance Details").table(
                &["Insurer", "Policy ID", "Subscriber ID", "Status"],
                &rows,
            );
        }

        if !data.symptoms.is_empty() {
            let rows: Vec<Vec<String>> = data
                .symptoms
                .iter()
                .map(|s| {
                    vec![
                        s.display_name().to_string(),
                        s.onset_date.format(DATE_FORMAT).to_string(),
                        or_dash(
                            s.cure_date
                                .map(|d| d.format(DATE_FORMAT).to_string())
                                .as_deref(),
                        ),
                    ]
                })
                .collect();
            doc.heading(2, "Symptoms").table(&["Symptom", "Onset", "Cured"], &rows);
        }

        if !data.primary_diagnoses.is_empty() {
            doc.heading(2, "Principal Diagnosis")
                .table(&["Diagnosis", "Status"], &diagnosis_rows(&data.primary_diagnoses));
        }
        if !data.diagnoses.is_empty() {
            doc.heading(2, "Diagnoses")
                .table(&["Diagnosis", "Status"], &diagnosis_rows(&data.diagnoses));
        }

        if !data.medical_history.is_empty() {
            let items: Vec<String> = data
                .medical_history
                .iter()
                .map(|entry| match &entry.details {
                    Some(details) => format!("{}: {}", entry.disease, details),
                    None => entry.disease.clone(),
                })
                .collect();
            doc.heading(2, "Medical History").bullet_list(&items);
        }

        if !data.samples.is_empty() {
            let rows: Vec<Vec<String>> = data
                .samples
                .iter()
                .map(|s| {
                    vec![
                        or_dash(s.sample_type.as_deref()),
                        s.status.label().to_string(),
                        s.result.label().to_string(),
                        or_dash(
                            s.date_of_result
                                .map(|d| d.format(DATE_FORMAT).to_string())
                                .as_deref(),
                        ),
                    ]
                })
                .collect();
            doc.heading(2, "Lab Samples")
                .table(&["Sample", "Status", "Result", "Result date"], &rows);
        }

        if !data.investigations.is_empty() {
            let rows: Vec<Vec<String>> = data
                .investigations
                .iter()
                .map(|i| {
                    vec![
                        or_dash(i.group.as_deref()),
                        i.investigation.clone(),
                        i.display_value(),
                        or_dash(i.ideal_value.as_deref()),
                    ]
                })
                .collect();
            doc.heading(2, "Investigations")
                .table(&["Group", "Investigation", "Value", "Ideal value"], &rows);
        }

        for (title, prescriptions) in [
            ("Prescriptions", &data.prescriptions),
            ("Discharge Prescriptions", &data.discharge_prescriptions),
        ] {
            if prescriptions.is_empty() {
                continue;
            }
            let rows: Vec<Vec<String>> = prescriptions
                .iter()
                .map(|p| {
                    vec![
                        p.medicine.clone(),
                        p.dosage_summary(),
                        or_dash(p.route.as_deref()),
                        or_dash(p.frequency.as_deref()),
                        or_dash(p.days.map(|d| d.to_string()).as_deref()),
                    ]
                })
                .collect();
            doc.heading(2, title)
                .table(&["Medicine", "Dosage", "Route", "Frequency", "Days"], &rows);
        }

        if consultation.is_discharged() {
            doc.heading(2, "Discharge")
                .field(
                    "Reason",
                    &or_dash(consultation.discharge_reason.map(|r| r.label())),
                )
                .field("Notes", &or_dash(consultation.discharge_notes.as_deref()));
        }

        if !data.files.is_empty() {
            let names: Vec<&str> = data.files.iter().map(|f| f.name.as_str()).collect();
            doc.heading(2, "Attachments").bullet_list(&names);
        }

        doc.spacing(2.0).paragraph(&format!(
            "Generated on {}",
            context.date.format(DATE_TIME_FORMAT)
        ));

        Ok(doc.finish())
    }
}
