//! PDF compilation step.

use std::path::Path;

use care_typst::{CompileOutcome, CompileResult, TypstCompiler};

use super::template::{DocumentRenderer, RenderContext};
use super::SummaryResult;

/// Compiles rendered source into a PDF at `output`.
///
/// A compiler that runs and reports failure returns `Ok(CompileOutcome::Failed)`;
/// `Err` means it could not be run at all.
pub trait DocumentCompiler: Send + Sync {
    fn compile(&self, source: &str, output: &Path) -> CompileResult<CompileOutcome>;
}

impl DocumentCompiler for TypstCompiler {
    fn compile(&self, source: &str, output: &Path) -> CompileResult<CompileOutcome> {
        TypstCompiler::compile(self, source, output)
    }
}

/// Render the summary and compile it to `output`.
///
/// Compiler failures are logged with the compiler's diagnostics and returned
/// as an outcome.
pub fn compile_summary(
    renderer: &dyn DocumentRenderer,
    compiler: &dyn DocumentCompiler,
    context: &RenderContext<'_>,
    output: &Path,
) -> SummaryResult<CompileOutcome> {
    let external_id = &context.data.consultation.external_id;
    tracing::info!(consultation = %external_id, "generating discharge summary pdf");

    let source = renderer.render(context)?;
    let outcome = compiler.compile(&source, output)?;

    match &outcome {
        CompileOutcome::Compiled => {
            tracing::info!(consultation = %external_id, "compiled discharge summary pdf");
        }
        CompileOutcome::Failed { exit_code, stderr } => {
            tracing::error!(
                consultation = %external_id,
                exit_code = ?exit_code,
                stderr = %stderr,
                "error compiling discharge summary pdf"
            );
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Consultation, Gender, Patient};
    use crate::summary::{DischargeSummaryData, RenderError, SummaryError};
    use chrono::Utc;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    /// Shared buffer the test subscriber formats events into.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    /// Run `f` with events formatted into the returned buffer.
    fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, LogBuffer) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let result = tracing::subscriber::with_default(subscriber, f);
        (result, buffer)
    }

    struct StaticRenderer;

    impl DocumentRenderer for StaticRenderer {
        fn render(&self, _context: &RenderContext<'_>) -> Result<String, RenderError> {
            Ok("= Summary".to_string())
        }
    }

    /// Records the source it receives and replies with a fixed outcome.
    struct RecordingCompiler {
        outcome: CompileOutcome,
        seen: Mutex<Vec<String>>,
    }

    impl DocumentCompiler for RecordingCompiler {
        fn compile(&self, source: &str, _output: &Path) -> CompileResult<CompileOutcome> {
            self.seen.lock().unwrap().push(source.to_string());
            Ok(self.outcome.clone())
        }
    }

    struct UnavailableCompiler;

    impl DocumentCompiler for UnavailableCompiler {
        fn compile(&self, _source: &str, _output: &Path) -> CompileResult<CompileOutcome> {
            Err(care_typst::CompileError::Spawn {
                binary: "typst".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            })
        }
    }

    fn data() -> DischargeSummaryData {
        DischargeSummaryData {
            consultation: Consultation::new(1, Utc::now()),
            patient: Patient::new("Asha".into(), Gender::Female),
            facility: None,
            samples: vec![],
            hcx: vec![],
            symptoms: vec![],
            admitted_to: None,
            admission_duration: None,
            diagnoses: vec![],
            primary_diagnoses: vec![],
            prescriptions: vec![],
            discharge_prescriptions: vec![],
            medical_history: vec![],
            investigations: vec![],
            files: vec![],
            dropped_diagnoses: 0,
        }
    }

    #[test]
    fn test_success_passes_rendered_source() {
        let data = data();
        let context = RenderContext {
            data: &data,
            logo_path: Path::new("/logo.svg"),
            date: Utc::now(),
        };
        let compiler = RecordingCompiler {
            outcome: CompileOutcome::Compiled,
            seen: Mutex::new(vec![]),
        };

        let outcome =
            compile_summary(&StaticRenderer, &compiler, &context, Path::new("/tmp/x.pdf")).unwrap();
        assert!(outcome.is_success());
        assert_eq!(*compiler.seen.lock().unwrap(), vec!["= Summary".to_string()]);
    }

    #[test]
    fn test_failure_is_an_outcome_not_an_error() {
        let data = data();
        let context = RenderContext {
            data: &data,
            logo_path: Path::new("/logo.svg"),
            date: Utc::now(),
        };
        let compiler = RecordingCompiler {
            outcome: CompileOutcome::Failed {
                exit_code: Some(1),
                stderr: "error: unexpected argument".into(),
            },
            seen: Mutex::new(vec![]),
        };

        let (outcome, logs) = with_captured_logs(|| {
            compile_summary(&StaticRenderer, &compiler, &context, Path::new("/tmp/x.pdf"))
        });

        assert!(!outcome.unwrap().is_success());
        let logs = logs.contents();
        let line = logs
            .lines()
            .find(|line| line.contains("error compiling discharge summary pdf"))
            .unwrap();
        assert!(line.contains("ERROR"));
        assert!(line.contains("error: unexpected argument"));
        assert!(line.contains("exit_code=Some(1)"));
    }

    #[test]
    fn test_spawn_failure_is_an_error() {
        let data = data();
        let context = RenderContext {
            data: &data,
            logo_path: Path::new("/logo.svg"),
            date: Utc::now(),
        };
        let result = compile_summary(
            &StaticRenderer,
            &UnavailableCompiler,
            &context,
            Path::new("/tmp/x.pdf"),
        );
        assert!(matches!(result, Err(SummaryError::Compile(_))));
    }
}
