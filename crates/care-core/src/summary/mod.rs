//! Discharge summary pipeline.
//!
//! ```text
//! acquire progress lock (5)
//!        │
//!        ▼
//! aggregate consultation data (10) ── classify diagnoses
//!        │
//!        ▼
//! render + compile to PDF (50)
//!        │
//!        ▼
//! upload, mark complete, save ──► release lock
//! ```

mod aggregator;
mod classifier;
mod compiler;
mod generator;
mod template;

pub use aggregator::*;
pub use classifier::*;
pub use compiler::*;
pub use generator::*;
pub use template::*;

use thiserror::Error;

use crate::cache::CacheError;
use crate::db::DbError;
use crate::mail::MailError;
use crate::storage::StorageError;

/// Discharge summary pipeline errors.
#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("Progress cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Compiler error: {0}")]
    Compile(#[from] care_typst::CompileError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type SummaryResult<T> = Result<T, SummaryError>;
