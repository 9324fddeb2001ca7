//! External `typst` process invocation.
//!
//! The compiler runs as `<binary> compile - <output>`: the document source is
//! fed on stdin and the PDF is written to `output`. The process runs with the
//! filesystem root as its working directory so absolute asset paths (logos)
//! resolve inside the Typst project root.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

/// Default compiler binary, resolved through `PATH`.
pub const DEFAULT_TYPST_BINARY: &str = "typst";

/// Compiler invocation errors.
///
/// A non-zero exit is not an error; it is reported as [`CompileOutcome::Failed`].
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("failed to spawn {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write document source to compiler stdin: {0}")]
    Stdin(std::io::Error),

    #[error("failed to wait for compiler: {0}")]
    Wait(std::io::Error),

    #[error("compiler stdin writer panicked")]
    WriterPanicked,
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Result of a completed compiler run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// Exit status zero; the PDF is at the output path
    Compiled,
    /// Non-zero exit (or killed by a signal)
    Failed {
        /// Exit code, `None` when terminated by a signal
        exit_code: Option<i32>,
        /// Captured standard error, lossily decoded
        stderr: String,
    },
}

impl CompileOutcome {
    /// Whether the compiler reported success.
    pub fn is_success(&self) -> bool {
        matches!(self, CompileOutcome::Compiled)
    }
}

/// Wrapper around the `typst` command line compiler.
#[derive(Debug, Clone)]
pub struct TypstCompiler {
    binary: PathBuf,
    leading_args: Vec<String>,
    working_dir: PathBuf,
}

impl Default for TypstCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_TYPST_BINARY)
    }
}

impl TypstCompiler {
    /// Create a compiler for the given binary, working from `/`.
    pub fn new<P: Into<PathBuf>>(binary: P) -> Self {
        Self {
            binary: binary.into(),
            leading_args: Vec::new(),
            working_dir: PathBuf::from("/"),
        }
    }

    /// Override the process working directory.
    pub fn with_working_dir<P: Into<PathBuf>>(mut self, working_dir: P) -> Self {
        self.working_dir = working_dir.into();
        self
    }

    /// Arguments placed before `compile`, for wrappers such as a container
    /// runtime or an interpreter.
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Compile `source` into a PDF at `output`.
    ///
    /// Blocks until the process exits. No timeout is applied.
    pub fn compile(&self, source: &str, output: &Path) -> CompileResult<CompileOutcome> {
        let mut child = Command::new(&self.binary)
            .args(&self.leading_args)
            .arg("compile")
            .arg("-")
            .arg(output)
            .current_dir(&self.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CompileError::Spawn {
                binary: self.binary.display().to_string(),
                source,
            })?;

        let stdin = child.stdin.take();
        let bytes = source.as_bytes();

        // Feed stdin from a separate thread so a chatty compiler cannot fill
        // the stderr pipe while we are still writing.
        let finished = std::thread::scope(|scope| {
            let writer = scope.spawn(move || -> std::io::Result<()> {
                if let Some(mut stdin) = stdin {
                    match stdin.write_all(bytes) {
                        // The compiler may exit before consuming its input
                        Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                        other => other?,
                    }
                }
                Ok(())
            });

            let output = child.wait_with_output().map_err(CompileError::Wait)?;
            writer
                .join()
                .map_err(|_| CompileError::WriterPanicked)?
                .map_err(CompileError::Stdin)?;
            Ok::<_, CompileError>(output)
        })?;

        if finished.status.success() {
            tracing::debug!(output = %output.display(), "typst compile succeeded");
            return Ok(CompileOutcome::Compiled);
        }

        let stderr = String::from_utf8_lossy(&finished.stderr).into_owned();
        tracing::debug!(exit_code = ?finished.status.code(), "typst compile failed");
        Ok(CompileOutcome::Failed {
            exit_code: finished.status.code(),
            stderr,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;

    /// Compiler that runs `body` through `/bin/sh`, with the usual
    /// `compile - <output>` arguments as `$1..$3`.
    fn script_compiler(dir: &Path, name: &str, body: &str) -> TypstCompiler {
        let path = dir.join(name);
        fs::write(&path, format!("{}\n", body)).unwrap();
        TypstCompiler::new("/bin/sh").with_leading_args([path.display().to_string()])
    }

    #[test]
    fn test_compile_success_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        // $1 = compile, $2 = -, $3 = output path
        let compiler = script_compiler(
            dir.path(),
            "fake-typst.sh",
            "cat > /dev/null\nprintf '%%PDF-1.7 fake' > \"$3\"",
        );
        let output = dir.path().join("out.pdf");

        let outcome = compiler.compile("= Hello", &output).unwrap();

        assert_eq!(outcome, CompileOutcome::Compiled);
        assert!(fs::read(&output).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_compile_receives_source_on_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = script_compiler(dir.path(), "echo-typst.sh", "cat > \"$3\"");
        let output = dir.path().join("out.pdf");

        compiler.compile("#set page(paper: \"a4\")", &output).unwrap();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "#set page(paper: \"a4\")"
        );
    }

    #[test]
    fn test_compile_failure_captures_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = script_compiler(
            dir.path(),
            "broken-typst.sh",
            "echo 'error: unknown variable: foo' >&2\nexit 1",
        );
        let output = dir.path().join("out.pdf");

        let outcome = compiler.compile("#foo", &output).unwrap();

        match outcome {
            CompileOutcome::Failed { exit_code, stderr } => {
                assert_eq!(exit_code, Some(1));
                assert!(stderr.contains("unknown variable: foo"));
            }
            CompileOutcome::Compiled => panic!("expected failure"),
        }
    }

    #[test]
    fn test_missing_binary_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = TypstCompiler::new(dir.path().join("does-not-exist"));
        let result = compiler.compile("= Hi", &dir.path().join("out.pdf"));
        assert!(matches!(result, Err(CompileError::Spawn { .. })));
    }

    #[test]
    fn test_default_runs_from_root() {
        let compiler = TypstCompiler::default();
        assert_eq!(compiler.binary(), Path::new("typst"));
        assert_eq!(compiler.working_dir(), Path::new("/"));
    }
}
