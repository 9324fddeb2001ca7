//! Discharge summary generation, upload and delivery.

use care_typst::CompileOutcome;
use chrono::Utc;

use super::aggregator::SummaryAggregator;
use super::compiler::{compile_summary, DocumentCompiler};
use super::template::{DocumentRenderer, RenderContext};
use super::{SummaryError, SummaryResult};
use crate::cache::ProgressCache;
use crate::config::SummaryConfig;
use crate::db::Database;
use crate::lock::ProgressLock;
use crate::mail::{EmailMessage, MailTransport};
use crate::models::{Consultation, FileUpload};
use crate::storage::ObjectStorage;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const EMAIL_SUBJECT: &str = "Patient Discharge Summary";
pub const EMAIL_BODY: &str = "Please find the attached file";

/// Progress reported at each stage.
pub mod progress {
    pub const LOCKED: u8 = 5;
    pub const DATA_FETCHED: u8 = 10;
    pub const RENDERING: u8 = 50;
}

/// Result of one generation run.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// Saved artifact
    pub file: FileUpload,
    /// What the compiler reported; the artifact is uploaded either way
    pub compile_outcome: CompileOutcome,
    /// Diagnosis references left out because they did not resolve
    pub dropped_diagnoses: usize,
}

/// Collaborators for generating and delivering discharge summaries.
pub struct DischargeSummaryGenerator<'a> {
    pub db: &'a Database,
    pub cache: &'a dyn ProgressCache,
    pub storage: &'a dyn ObjectStorage,
    pub renderer: &'a dyn DocumentRenderer,
    pub compiler: &'a dyn DocumentCompiler,
    pub mailer: &'a dyn MailTransport,
    pub config: &'a SummaryConfig,
}

impl<'a> DischargeSummaryGenerator<'a> {
    fn progress_lock(&self) -> ProgressLock<'a> {
        ProgressLock::new(self.cache).with_ttl(self.config.lock_ttl)
    }

    /// Current progress of a running generation.
    pub fn progress(&self, consultation_external_id: &str) -> SummaryResult<Option<u8>> {
        Ok(self.progress_lock().get(consultation_external_id)?)
    }

    /// Generate, upload and save a discharge summary.
    pub fn generate_and_upload(&self, consultation: &Consultation) -> SummaryResult<FileUpload> {
        self.generate_with_report(consultation).map(|report| report.file)
    }

    /// As [`Self::generate_and_upload`], also reporting the compile outcome.
    ///
    /// The progress lock is cleared on every exit path.
    pub fn generate_with_report(
        &self,
        consultation: &Consultation,
    ) -> SummaryResult<GenerationReport> {
        let external_id = consultation.external_id.as_str();
        tracing::info!(consultation = %external_id, "generating discharge summary");

        let guard = self.progress_lock().acquire(external_id, progress::LOCKED)?;

        let date = Utc::now();
        let patient = self.db.get_patient(consultation.patient_id)?.ok_or_else(|| {
            SummaryError::NotFound(format!("patient {}", consultation.patient_id))
        })?;
        let mut summary_file = FileUpload::discharge_summary(&patient.name, external_id, date);

        guard.set_progress(progress::DATA_FETCHED)?;
        let data = SummaryAggregator::new(self.db).aggregate(consultation)?;

        guard.set_progress(progress::RENDERING)?;
        let output = tempfile::Builder::new()
            .prefix("discharge_summary")
            .suffix(".pdf")
            .tempfile()?;
        let context = RenderContext {
            data: &data,
            logo_path: &self.config.logo_path,
            date,
        };
        let compile_outcome =
            compile_summary(self.renderer, self.compiler, &context, output.path())?;
        if !compile_outcome.is_success() {
            tracing::warn!(
                consultation = %external_id,
                "uploading discharge summary after failed compile"
            );
        }

        tracing::info!(consultation = %external_id, "uploading discharge summary");
        self.storage
            .put_file(&summary_file.storage_key(), output.path(), PDF_CONTENT_TYPE)?;
        summary_file.upload_completed = true;
        summary_file.id = self.db.insert_file_upload(&summary_file)?;
        tracing::info!(
            consultation = %external_id,
            file_id = summary_file.id,
            "uploaded discharge summary"
        );

        Ok(GenerationReport {
            file: summary_file,
            compile_outcome,
            dropped_diagnoses: data.dropped_diagnoses,
        })
    }

    /// Email a stored summary as a PDF attachment. Returns the transport's send count.
    pub fn email_discharge_summary(
        &self,
        summary_file: &FileUpload,
        emails: &[String],
    ) -> SummaryResult<usize> {
        let object = self.storage.get_object(&summary_file.storage_key())?;

        let mut message = EmailMessage::new(
            EMAIL_SUBJECT,
            EMAIL_BODY,
            &self.config.default_from_email,
            emails.to_vec(),
        )
        .html();
        message.attach(&summary_file.name, object.bytes, PDF_CONTENT_TYPE);

        let sent = self.mailer.send(&message)?;
        tracing::info!(
            file = %summary_file.external_id,
            recipients = emails.len(),
            sent,
            "emailed discharge summary"
        );
        Ok(sent)
    }

    /// Generate a summary for the patient's latest consultation and return a
    /// download link, or `None` if the patient has no consultation.
    pub fn generate_discharge_report_signed_url(
        &self,
        patient_external_id: &str,
    ) -> SummaryResult<Option<String>> {
        let consultation = match self.db.latest_consultation_for_patient(patient_external_id)? {
            Some(consultation) => consultation,
            None => {
                tracing::info!(patient = %patient_external_id, "no consultation for discharge report");
                return Ok(None);
            }
        };

        let summary_file = self.generate_and_upload(&consultation)?;
        let url = self
            .storage
            .signed_url(&summary_file.storage_key(), self.config.signed_url_ttl)?;
        Ok(Some(url))
    }
}
