//! Domain models for facilities, consultations and discharge summaries.

mod bed;
mod consultation;
mod diagnosis;
mod facility;
mod file_upload;
mod history;
mod investigation;
mod patient;
mod policy;
mod prescription;
mod sample;
mod symptom;

pub use bed::*;
pub use consultation::*;
pub use diagnosis::*;
pub use facility::*;
pub use file_upload::*;
pub use history::*;
pub use investigation::*;
pub use patient::*;
pub use policy::*;
pub use prescription::*;
pub use sample::*;
pub use symptom::*;
