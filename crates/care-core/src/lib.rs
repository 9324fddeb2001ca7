//! Care Core Library
//!
//! Facility, patient and consultation records with discharge summary
//! generation.
//!
//! # Architecture
//!
//! ```text
//! Consultation ──► Progress Lock (cache, 120 s TTL)
//!                        │
//!                        ▼
//!                 Data Aggregator ──► Diagnosis Classifier
//!                        │
//!                        ▼
//!              Typst template ──► `typst compile - <out.pdf>`
//!                        │
//!                        ▼
//!             Object storage upload ──► FileUpload saved
//!                        │
//!            ┌───────────┴───────────┐
//!            ▼                       ▼
//!      Email with PDF         48 h signed URL
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite persistence
//! - [`models`]: Domain types (Patient, Consultation, Prescription, FileUpload, etc.)
//! - [`summary`]: Aggregation, classification, rendering and generation
//! - [`lock`]: Progress lock and lease lock over a [`cache::ProgressCache`]
//! - [`storage`]: Object storage with signed URLs
//! - [`mail`]: Outgoing mail transports
//! - [`config`]: Service configuration

pub mod cache;
pub mod config;
pub mod db;
pub mod lock;
pub mod mail;
pub mod models;
pub mod storage;
pub mod summary;

// Re-export commonly used types
pub use cache::{MemoryCache, ProgressCache};
pub use config::SummaryConfig;
pub use db::Database;
pub use lock::{LeaseLock, ProgressLock};
pub use models::{Consultation, FileType, FileUpload, Patient};
pub use summary::{DischargeSummaryGenerator, GenerationReport, TypstSummaryTemplate};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};
use std::time::Duration;

use care_typst::{CompileOutcome, TypstCompiler};
use mail::FileOutbox;
use storage::LocalObjectStorage;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum CareError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Mail error: {0}")]
    MailError(String),

    #[error("Generation error: {0}")]
    GenerationError(String),
}

impl From<db::DbError> for CareError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => CareError::NotFound(what),
            other => CareError::DatabaseError(other.to_string()),
        }
    }
}

impl From<cache::CacheError> for CareError {
    fn from(e: cache::CacheError) -> Self {
        CareError::CacheError(e.to_string())
    }
}

impl From<storage::StorageError> for CareError {
    fn from(e: storage::StorageError) -> Self {
        match e {
            storage::StorageError::NotFound(key) => CareError::NotFound(key),
            other => CareError::StorageError(other.to_string()),
        }
    }
}

impl From<mail::MailError> for CareError {
    fn from(e: mail::MailError) -> Self {
        match e {
            mail::MailError::InvalidAddress(address) => {
                CareError::InvalidInput(format!("invalid email address: {}", address))
            }
            other => CareError::MailError(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for CareError {
    fn from(e: config::ConfigError) -> Self {
        CareError::InvalidInput(e.to_string())
    }
}

impl From<summary::SummaryError> for CareError {
    fn from(e: summary::SummaryError) -> Self {
        use summary::SummaryError;
        match e {
            SummaryError::Db(e) => e.into(),
            SummaryError::Cache(e) => e.into(),
            SummaryError::Storage(e) => e.into(),
            SummaryError::Mail(e) => e.into(),
            SummaryError::NotFound(what) => CareError::NotFound(what),
            other => CareError::GenerationError(other.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for CareError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        CareError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_care_core(db_path: String, config: FfiCareConfig) -> Result<Arc<CareCore>, CareError> {
    let db = Database::open(&db_path)?;
    CareCore::new(db, config.try_into()?).map(Arc::new)
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_care_core_in_memory(config: FfiCareConfig) -> Result<Arc<CareCore>, CareError> {
    let db = Database::open_in_memory()?;
    CareCore::new(db, config.try_into()?).map(Arc::new)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe service wrapper for FFI.
///
/// Progress can be polled while a generation holds the database.
#[derive(uniffi::Object)]
pub struct CareCore {
    db: Arc<Mutex<Database>>,
    cache: MemoryCache,
    storage: LocalObjectStorage,
    compiler: TypstCompiler,
    template: TypstSummaryTemplate,
    outbox: FileOutbox,
    config: SummaryConfig,
}

impl CareCore {
    /// Assemble the service from an open database and validated settings.
    pub fn new(db: Database, config: SummaryConfig) -> Result<Self, CareError> {
        config.validate()?;
        let storage = LocalObjectStorage::new(
            config.storage_root.clone(),
            &config.public_base_url,
            config.signing_secret.as_bytes(),
        );
        let compiler = TypstCompiler::new(config.typst_binary.clone())
            .with_working_dir(config.compiler_working_dir.clone());
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            cache: MemoryCache::new(),
            storage,
            compiler,
            template: TypstSummaryTemplate::new(),
            outbox: FileOutbox::new(config.outbox_dir.clone()),
            config,
        })
    }

    /// Replace the compiler, e.g. to run `typst` through a wrapper.
    pub fn with_compiler(mut self, compiler: TypstCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    /// Run `f` with a generator over this service's collaborators.
    pub fn with_generator<T>(
        &self,
        f: impl FnOnce(&DischargeSummaryGenerator<'_>) -> Result<T, CareError>,
    ) -> Result<T, CareError> {
        let db = self.db.lock()?;
        let generator = DischargeSummaryGenerator {
            db: &db,
            cache: &self.cache,
            storage: &self.storage,
            renderer: &self.template,
            compiler: &self.compiler,
            mailer: &self.outbox,
            config: &self.config,
        };
        f(&generator)
    }

    /// Shared database handle, for hosts that also write records.
    pub fn database(&self) -> Arc<Mutex<Database>> {
        Arc::clone(&self.db)
    }
}

#[uniffi::export]
impl CareCore {
    // =========================================================================
    // Discharge Summary Operations
    // =========================================================================

    /// Generate and upload a discharge summary for a consultation.
    pub fn generate_discharge_summary(
        &self,
        consultation_external_id: String,
    ) -> Result<FfiGenerationReport, CareError> {
        self.with_generator(|generator| {
            let consultation = generator
                .db
                .get_consultation_by_external_id(&consultation_external_id)?
                .ok_or_else(|| {
                    CareError::NotFound(format!("consultation {}", consultation_external_id))
                })?;
            Ok(generator.generate_with_report(&consultation)?.into())
        })
    }

    /// Progress (0-100) of a running generation, or `None`.
    pub fn get_discharge_summary_progress(
        &self,
        consultation_external_id: String,
    ) -> Result<Option<u8>, CareError> {
        let lock = ProgressLock::new(&self.cache).with_ttl(self.config.lock_ttl);
        Ok(lock.get(&consultation_external_id)?)
    }

    /// Email a stored discharge summary. Returns the number of messages sent.
    pub fn email_discharge_summary(
        &self,
        file_external_id: String,
        emails: Vec<String>,
    ) -> Result<u32, CareError> {
        self.with_generator(|generator| {
            let file = generator
                .db
                .get_file_upload_by_external_id(&file_external_id)?
                .ok_or_else(|| CareError::NotFound(format!("file {}", file_external_id)))?;
            if file.file_type != FileType::DischargeSummary || !file.upload_completed {
                return Err(CareError::InvalidInput(format!(
                    "file {} is not a completed discharge summary",
                    file_external_id
                )));
            }
            let sent = generator.email_discharge_summary(&file, &emails)?;
            Ok(u32::try_from(sent).unwrap_or(u32::MAX))
        })
    }

    /// Generate a summary for the patient's latest consultation and return a signed URL.
    pub fn generate_discharge_report_signed_url(
        &self,
        patient_external_id: String,
    ) -> Result<Option<String>, CareError> {
        self.with_generator(|generator| {
            Ok(generator.generate_discharge_report_signed_url(&patient_external_id)?)
        })
    }

    // =========================================================================
    // File Operations
    // =========================================================================

    /// Get file metadata by external ID.
    pub fn get_file_upload(
        &self,
        external_id: String,
    ) -> Result<Option<FfiFileUpload>, CareError> {
        let db = self.db.lock()?;
        let file = db.get_file_upload_by_external_id(&external_id)?;
        Ok(file.map(|f| f.into()))
    }

    /// Completed, non-archived files of a type attached to a record.
    pub fn list_file_uploads(
        &self,
        associating_id: String,
        file_type: String,
    ) -> Result<Vec<FfiFileUpload>, CareError> {
        let file_type = FileType::parse(&file_type)
            .ok_or_else(|| CareError::InvalidInput(format!("unknown file type: {}", file_type)))?;
        let db = self.db.lock()?;
        let files = db.list_file_uploads(&associating_id, file_type)?;
        Ok(files.into_iter().map(|f| f.into()).collect())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe service settings.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCareConfig {
    pub static_root: String,
    pub storage_root: String,
    pub signing_secret: String,
    pub public_base_url: Option<String>,
    pub default_from_email: Option<String>,
    pub typst_binary: Option<String>,
    pub outbox_dir: Option<String>,
    pub signed_url_ttl_secs: Option<u64>,
}

impl TryFrom<FfiCareConfig> for SummaryConfig {
    type Error = config::ConfigError;

    fn try_from(ffi: FfiCareConfig) -> Result<Self, Self::Error> {
        let mut config = SummaryConfig::new(&ffi.static_root, &ffi.storage_root)
            .with_signing_secret(&ffi.signing_secret);
        if let Some(url) = ffi.public_base_url {
            config = config.with_public_base_url(&url);
        }
        if let Some(email) = ffi.default_from_email {
            config = config.with_default_from_email(&email);
        }
        if let Some(binary) = ffi.typst_binary {
            config = config.with_typst_binary(binary);
        }
        if let Some(dir) = ffi.outbox_dir {
            config = config.with_outbox_dir(dir);
        }
        if let Some(secs) = ffi.signed_url_ttl_secs {
            config = config.with_signed_url_ttl(Duration::from_secs(secs));
        }
        config.validate()?;
        Ok(config)
    }
}

/// FFI-safe file upload.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFileUpload {
    pub external_id: String,
    pub name: String,
    pub internal_name: String,
    pub file_type: String,
    pub associating_id: String,
    pub upload_completed: bool,
    pub is_archived: bool,
    pub created_at: String,
}

impl From<FileUpload> for FfiFileUpload {
    fn from(file: FileUpload) -> Self {
        Self {
            external_id: file.external_id,
            name: file.name,
            internal_name: file.internal_name,
            file_type: file.file_type.as_str().to_string(),
            associating_id: file.associating_id,
            upload_completed: file.upload_completed,
            is_archived: file.is_archived,
            created_at: file.created_at.to_rfc3339(),
        }
    }
}

/// FFI-safe generation result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiGenerationReport {
    pub file: FfiFileUpload,
    pub compiled: bool,
    /// Compiler diagnostics when compilation failed
    pub compiler_stderr: Option<String>,
    pub dropped_diagnoses: u32,
}

impl From<GenerationReport> for FfiGenerationReport {
    fn from(report: GenerationReport) -> Self {
        let (compiled, compiler_stderr) = match report.compile_outcome {
            CompileOutcome::Compiled => (true, None),
            CompileOutcome::Failed { stderr, .. } => (false, Some(stderr)),
        };
        Self {
            file: report.file.into(),
            compiled,
            compiler_stderr,
            dropped_diagnoses: u32::try_from(report.dropped_diagnoses).unwrap_or(u32::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ffi_config(dir: &std::path::Path) -> FfiCareConfig {
        FfiCareConfig {
            static_root: dir.join("static").display().to_string(),
            storage_root: dir.join("objects").display().to_string(),
            signing_secret: "secret".into(),
            public_base_url: Some("https://care.example.org/files".into()),
            default_from_email: None,
            typst_binary: None,
            outbox_dir: None,
            signed_url_ttl_secs: None,
        }
    }

    #[test]
    fn test_config_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let mut ffi = ffi_config(dir.path());
        ffi.signed_url_ttl_secs = Some(60);
        let config: SummaryConfig = ffi.try_into().unwrap();
        assert_eq!(config.signed_url_ttl, Duration::from_secs(60));
        assert_eq!(config.public_base_url, "https://care.example.org/files");
    }

    #[test]
    fn test_empty_secret_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut ffi = ffi_config(dir.path());
        ffi.signing_secret = String::new();
        assert!(matches!(
            open_care_core_in_memory(ffi),
            Err(CareError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_oversized_signed_url_ttl_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut ffi = ffi_config(dir.path());
        ffi.signed_url_ttl_secs = Some(u64::MAX);
        assert!(matches!(
            open_care_core_in_memory(ffi),
            Err(CareError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_unknown_records() {
        let dir = tempfile::tempdir().unwrap();
        let core = open_care_core_in_memory(ffi_config(dir.path())).unwrap();

        assert_eq!(core.get_discharge_summary_progress("c-1".into()).unwrap(), None);
        assert!(core.get_file_upload("missing".into()).unwrap().is_none());
        assert!(matches!(
            core.generate_discharge_summary("missing".into()),
            Err(CareError::NotFound(_))
        ));
        assert!(matches!(
            core.email_discharge_summary("missing".into(), vec!["a@example.org".into()]),
            Err(CareError::NotFound(_))
        ));
        assert_eq!(
            core.generate_discharge_report_signed_url("nobody".into()).unwrap(),
            None
        );
        assert!(matches!(
            core.list_file_uploads("c-1".into(), "BOGUS".into()),
            Err(CareError::InvalidInput(_))
        ));
    }
}
