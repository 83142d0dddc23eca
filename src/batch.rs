use std::fmt;
use std::path::{Path, PathBuf};

use crate::cancel;
use crate::error::{Error, ErrorKind, Result};

/// One path that failed inside a batch, with the reason.
#[derive(Debug)]
pub struct Failure {
    pub path: PathBuf,
    pub error: Error,
}

/// Every per-path failure of a batch, reported together once the batch ends.
#[derive(Debug)]
pub struct BatchError {
    label: &'static str,
    failures: Vec<Failure>,
}

impl BatchError {
    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }
}

impl std::error::Error for BatchError {}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} completed with errors:", self.label)?;
        for failure in &self.failures {
            write!(f, "\n{}: {}", failure.path.display(), failure.error)?;
        }
        Ok(())
    }
}

/// Runs `op` on every path in order. A failing path never stops the batch;
/// the failures come back as a single [`BatchError`] after the last path.
/// An interrupt stops it before the next path; finished paths stay done.
pub fn run<P, F>(label: &'static str, paths: impl IntoIterator<Item = P>, mut op: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnMut(&Path) -> Result<()>,
{
    let mut failures = Vec::new();
    let mut total = 0usize;
    for path in paths {
        let path = path.as_ref();
        if cancel::is_requested() {
            info!(
                "{label}: interrupted after {total} path(s), {} failed",
                failures.len()
            );
            return Err(ErrorKind::Interrupted.into());
        }
        total += 1;
        if let Err(error) = op(path) {
            debug!("{label}: {} failed: {error}", path.display());
            failures.push(Failure {
                path: path.to_path_buf(),
                error,
            });
        }
    }

    if failures.is_empty() {
        trace!("{label}: {total} path(s) done");
        return Ok(());
    }
    info!("{label}: {} of {total} path(s) failed", failures.len());
    Err(BatchError { label, failures }.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_going_after_a_failure() {
        let mut seen = Vec::new();
        let result = run("demo", ["a", "bad", "b"], |path| {
            seen.push(path.to_path_buf());
            if path == Path::new("bad") {
                return Err(ErrorKind::NotFound(path.into()).into());
            }
            Ok(())
        });

        assert_eq!(seen.len(), 3);
        let err = result.unwrap_err();
        let ErrorKind::Batch(batch) = &err.kind else {
            panic!("expected a batch error, got {err}");
        };
        assert_eq!(batch.label(), "demo");
        assert_eq!(batch.failures().len(), 1);
        assert_eq!(batch.failures()[0].path, Path::new("bad"));
        assert_eq!(
            err.to_string(),
            "demo completed with errors:\nbad: file does not exist: bad"
        );
    }

    #[test]
    fn empty_batch_succeeds() {
        let paths: [&str; 0] = [];
        assert!(run("demo", paths, |_| unreachable!()).is_ok());
    }
}
