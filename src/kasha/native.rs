//! Native code generation
//!
//! A [`NativeBackend`] turns Grains into a relocatable object for a
//! [`Target`]; a [`Linker`] then turns that object into an executable. Both
//! steps drive external tools, configured through
//! [`NativeConfig`](crate::kasha::config::NativeConfig).

pub mod c_backend;

pub use c_backend::CBackend;

use crate::kasha::compiling::Grains;
use crate::kasha::config::NativeConfig;
use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("function '{0}' has no native implementation")]
    UnknownFunction(String),

    #[error("'{0}' is not a valid native symbol name")]
    InvalidName(String),

    #[error("grain {index} ({grain}) needs {needed} stack value(s) but only {height} are available")]
    StackUnderflow {
        index: usize,
        grain: String,
        needed: usize,
        height: usize,
    },

    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Code generation target; `None` means the host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub triple: Option<String>,
}

impl Target {
    pub fn host() -> Self {
        Self::default()
    }

    pub fn new(triple: impl Into<String>) -> Self {
        Self {
            triple: Some(triple.into()),
        }
    }

    pub fn from_config(config: &NativeConfig) -> Self {
        Self {
            triple: config.target.clone(),
        }
    }

    /// Flag understood by both gcc-style and clang-style drivers
    pub fn flag(&self) -> Option<String> {
        self.triple
            .as_ref()
            .map(|triple| format!("--target={}", triple))
    }
}

/// Lowers a Grain program to object code
pub trait NativeBackend {
    fn name(&self) -> &'static str;

    fn emit_object(&self, grains: &Grains, target: &Target) -> Result<Vec<u8>, BackendError>;
}

/// Links one object file into an executable with an external driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Linker {
    driver: String,
    target: Target,
}

impl Linker {
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            target: Target::host(),
        }
    }

    pub fn from_config(config: &NativeConfig) -> Self {
        Self::new(config.linker.clone()).with_target(Target::from_config(config))
    }

    /// Cross-link for `target` instead of the host
    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    /// Link `object` into `output`, appending `ldflags` to the command
    pub fn link(&self, object: &[u8], output: &Path, ldflags: &[String]) -> Result<(), BackendError> {
        let workdir = tempfile::tempdir()?;
        let object_path = workdir.path().join("program.o");
        fs::write(&object_path, object)?;

        let mut command = Command::new(&self.driver);
        command.arg(&object_path).arg("-o").arg(output);
        command.args(ldflags);
        if let Some(flag) = self.target.flag() {
            command.arg(flag);
        }
        run_tool(&self.driver, &mut command)?;

        debug!(output = %output.display(), driver = %self.driver, "linked executable");
        Ok(())
    }
}

/// Run an external tool to completion, turning failure into a [`BackendError`]
pub(crate) fn run_tool(tool: &str, command: &mut Command) -> Result<(), BackendError> {
    debug!(?command, "running tool");
    let output = command.output().map_err(|source| BackendError::Spawn {
        tool: tool.to_string(),
        source,
    })?;
    if !output.status.success() {
        return Err(BackendError::ToolFailed {
            tool: tool.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}
