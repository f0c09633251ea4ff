//! Adapters running KMC, Primer3 and BWA behind the capability traits of
//! `camplicon_core::external`.

pub mod bwa;
pub mod kmc;
pub mod primer3;

use std::ffi::OsStr;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use camplicon_core::{Error, Result};

pub use bwa::Bwa;
pub use kmc::Kmc;
pub use primer3::Primer3;

/// One external executable.
#[derive(Debug, Clone)]
pub struct Tool {
    name: String,
    executable: PathBuf,
}

impl Tool {
    /// `name` from `dir` when given, otherwise from `PATH`.
    pub fn new(name: &str, dir: Option<&Path>) -> Self {
        let executable = match dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        };
        Self {
            name: name.to_string(),
            executable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Fail early when the executable cannot be found.
    pub fn check(&self) -> Result<PathBuf> {
        locate_executable(&self.executable).ok_or_else(|| {
            Error::tool(
                &self.name,
                self.executable.display().to_string(),
                "executable not found",
            )
        })
    }

    /// Run to completion and return stdout. A non-zero exit is a failure.
    pub fn run<I, S>(&self, args: I, input: &str, stdin: Option<&str>) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.executable);
        cmd.args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        log::debug!("running {:?}", cmd);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::tool(&self.name, input, "executable not found")
            } else {
                Error::tool(&self.name, input, format!("could not start: {}", e))
            }
        })?;

        if let (Some(text), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(text.as_bytes())
                .map_err(|e| Error::tool(&self.name, input, format!("writing stdin: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| Error::tool(&self.name, input, e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::tool(
                &self.name,
                input,
                format!("exited with {}: {}", output.status, stderr.trim()),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Resolve an executable the way a shell would.
pub fn locate_executable(executable: &Path) -> Option<PathBuf> {
    if executable.components().count() > 1 {
        return executable.is_file().then(|| executable.to_path_buf());
    }
    std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join(executable))
            .find(|candidate| candidate.is_file())
    })
}

/// Scratch directory for one tool invocation.
pub(crate) fn scratch_dir(tool: &str, input: &str) -> Result<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix("camplicon-")
        .tempdir()
        .map_err(|e| Error::tool(tool, input, format!("creating scratch directory: {}", e)))
}
