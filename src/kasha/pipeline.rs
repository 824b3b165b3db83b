//! Source to artifact orchestration
//!
//! [`Pipeline`] is the entry point the binary uses. It owns a [`KashaConfig`]
//! and chains the stages:
//!
//! ```text
//! source --parsing::tokenize--> ParseTree --replay--> Node --compile--> Grains
//!                                                                        |
//!                                                     Vm::run <----------+----------> CBackend + Linker
//! ```
//!
//! # Architecture
//!
//! - String-based methods (`parse`, `compile`, `run`, `emit`, `build_native`)
//!   are the core operations
//! - [`Pipeline::load_source`] reads a file; callers then hand the text to a
//!   string method, so diagnostics can always quote the source

use crate::kasha::ast::{to_treeviz_str, Node};
use crate::kasha::compiling::{compile, CompileError, Grains};
use crate::kasha::config::{load_defaults, KashaConfig};
use crate::kasha::native::{BackendError, CBackend, Linker, NativeBackend, Target};
use crate::kasha::parsing::{replay, ParseError, ParseTree, Parser};
use crate::kasha::vm::{RuntimeError, Vm};
use config::ConfigError;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("native build failed: {0}")]
    Backend(#[from] BackendError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to serialize {format}: {message}")]
    Serialize {
        format: OutputFormat,
        message: String,
    },

    #[error("unknown output format '{0}' (expected one of: {})", OutputFormat::names().join(", "))]
    UnknownFormat(String),
}

/// Intermediate artifacts the pipeline can print instead of building
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// s-expression, e.g. `root(assign(var(a), lit(1)))`
    AstTag,
    AstTreeviz,
    AstJson,
    AstYaml,
    /// The raw token log, actions included
    Tokens,
    Grains,
    GrainsJson,
    /// Translation unit of the C backend
    C,
}

impl OutputFormat {
    pub fn all() -> &'static [OutputFormat] {
        &[
            OutputFormat::AstTag,
            OutputFormat::AstTreeviz,
            OutputFormat::AstJson,
            OutputFormat::AstYaml,
            OutputFormat::Tokens,
            OutputFormat::Grains,
            OutputFormat::GrainsJson,
            OutputFormat::C,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::AstTag => "ast-tag",
            OutputFormat::AstTreeviz => "ast-treeviz",
            OutputFormat::AstJson => "ast-json",
            OutputFormat::AstYaml => "ast-yaml",
            OutputFormat::Tokens => "tokens",
            OutputFormat::Grains => "grains",
            OutputFormat::GrainsJson => "grains-json",
            OutputFormat::C => "c",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::all().iter().map(OutputFormat::name).collect()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|format| format.name() == s)
            .ok_or_else(|| PipelineError::UnknownFormat(s.to_string()))
    }
}

pub struct Pipeline {
    config: KashaConfig,
}

impl Pipeline {
    pub fn new(config: KashaConfig) -> Self {
        Self { config }
    }

    /// A pipeline using only the embedded defaults
    pub fn with_defaults() -> Result<Self, PipelineError> {
        Ok(Self::new(load_defaults()?))
    }

    pub fn config(&self) -> &KashaConfig {
        &self.config
    }

    pub fn load_source(path: impl AsRef<Path>) -> Result<String, PipelineError> {
        let path = path.as_ref();
        fs::read_to_string(path).map_err(|source| PipelineError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn tokenize(&self, source: &str) -> Result<ParseTree, PipelineError> {
        Parser::new(source)
            .with_max_depth(self.config.parser.max_depth)
            .parse()
            .map_err(ParseError::from)
            .map_err(PipelineError::from)
    }

    pub fn parse(&self, source: &str) -> Result<Node, PipelineError> {
        let tree = self.tokenize(source)?;
        replay(tree.tokens(), tree.buffer())
            .map_err(ParseError::from)
            .map_err(PipelineError::from)
    }

    pub fn compile(&self, source: &str) -> Result<Grains, PipelineError> {
        let root = self.parse(source)?;
        Ok(compile(&root)?)
    }

    /// Interpret `source`, sending `print` output to `output`. The finished VM
    /// is returned so callers can inspect memory.
    pub fn run<W: Write>(&self, source: &str, output: W) -> Result<Vm<W>, PipelineError> {
        let grains = self.compile(source)?;
        let mut vm = Vm::with_output(output).with_capacity(self.config.vm.stack_capacity);
        vm.run(&grains)?;
        Ok(vm)
    }

    /// Render an intermediate artifact
    pub fn emit(&self, source: &str, format: OutputFormat) -> Result<String, PipelineError> {
        let serialize_error = |message: String| PipelineError::Serialize { format, message };

        let rendered = match format {
            OutputFormat::Tokens => self.tokenize(source)?.dump(),
            OutputFormat::AstTag => self.parse(source)?.to_string(),
            OutputFormat::AstTreeviz => to_treeviz_str(&self.parse(source)?),
            OutputFormat::AstJson => serde_json::to_string_pretty(&self.parse(source)?)
                .map_err(|e| serialize_error(e.to_string()))?,
            OutputFormat::AstYaml => serde_yaml::to_string(&self.parse(source)?)
                .map_err(|e| serialize_error(e.to_string()))?,
            OutputFormat::Grains => self.compile(source)?.to_string(),
            OutputFormat::GrainsJson => serde_json::to_string_pretty(&self.compile(source)?)
                .map_err(|e| serialize_error(e.to_string()))?,
            OutputFormat::C => CBackend::from_config(&self.config.native)
                .transpile(&self.compile(source)?)?,
        };
        Ok(rendered)
    }

    /// Compile `source` to an executable at `output`. `extra_ldflags` are
    /// appended after the configured ones.
    pub fn build_native(
        &self,
        source: &str,
        output: &Path,
        extra_ldflags: &[String],
    ) -> Result<(), PipelineError> {
        let grains = self.compile(source)?;
        let native = &self.config.native;
        let target = Target::from_config(native);
        let backend = CBackend::from_config(native);

        let object = backend.emit_object(&grains, &target)?;
        debug!(backend = backend.name(), bytes = object.len(), "object ready");

        let ldflags: Vec<String> = native
            .ldflags
            .iter()
            .chain(extra_ldflags)
            .cloned()
            .collect();
        Linker::from_config(native).link(&object, output, &ldflags)?;
        Ok(())
    }
}
