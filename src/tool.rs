use std::env;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::thread;
use std::time::Duration;

use crate::cancel;
use crate::error::{ErrorKind, Result};

/// How often a running child is checked against the interrupt flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// An external executable, named either bare (looked up on `PATH`) or by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    program: OsString,
}

impl Tool {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Where the program would be run from, if it can be found at all.
    pub fn locate(&self) -> Option<PathBuf> {
        let program = Path::new(&self.program);
        if program.components().count() > 1 {
            return is_executable(program).then(|| program.to_path_buf());
        }
        env::split_paths(&env::var_os("PATH")?)
            .flat_map(|dir| candidates(&dir.join(program)))
            .find(|p| is_executable(p))
    }

    pub fn require(&self) -> Result<PathBuf> {
        match self.locate() {
            Some(path) => {
                trace!("{} found at {}", self.name(), path.display());
                Ok(path)
            }
            None => Err(ErrorKind::MissingTool(self.name()).into()),
        }
    }

    /// Runs the program with inherited stdio and waits for it.
    pub fn run<I, S>(&self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.run_in(None, args)
    }

    /// Like [`Tool::run`], with `dir` as the working directory when given.
    ///
    /// The child is killed if an interrupt is requested while it runs.
    pub fn run_in<I, S>(&self, dir: Option<&Path>, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = self.command(args);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        cancel::check()?;
        let mut child = cmd.spawn().map_err(|e| self.spawn_error(e))?;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if cancel::is_requested() {
                debug!("interrupted, killing {} (pid {})", self.name(), child.id());
                // Already exited is fine; wait() below reaps it either way.
                if let Err(e) = child.kill() {
                    debug!("kill {}: {e}", child.id());
                }
                child.wait()?;
                return Err(ErrorKind::Interrupted.into());
            }
            thread::sleep(POLL_INTERVAL);
        };
        if !status.success() {
            return Err(ErrorKind::Subprocess {
                program: self.name(),
                status,
            }
            .into());
        }
        Ok(())
    }

    /// Runs the program and returns what it printed on stdout.
    pub fn output<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        cancel::check()?;
        let Output {
            status,
            stdout,
            stderr,
        } = self.command(args).output().map_err(|e| self.spawn_error(e))?;
        if !status.success() {
            debug!(
                "{} failed: {}",
                self.name(),
                String::from_utf8_lossy(&stderr).trim()
            );
            return Err(ErrorKind::Subprocess {
                program: self.name(),
                status,
            }
            .into());
        }
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        debug!("running {cmd:?}");
        cmd
    }

    fn spawn_error(&self, e: io::Error) -> crate::Error {
        if e.kind() == io::ErrorKind::NotFound {
            return ErrorKind::MissingTool(self.name()).into();
        }
        e.into()
    }
}

/// The external programs the image commands depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tools {
    pub cwebp: Tool,
    pub fd: Tool,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            cwebp: Tool::new("cwebp"),
            fd: Tool::new("fd"),
        }
    }
}

#[cfg(windows)]
fn candidates(path: &Path) -> Vec<PathBuf> {
    vec![path.to_path_buf(), path.with_extension("exe")]
}

#[cfg(not(windows))]
fn candidates(path: &Path) -> Vec<PathBuf> {
    vec![path.to_path_buf()]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
