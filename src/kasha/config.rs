//! Settings for parsing, the VM and the native build.
//!
//! Resolution order, lowest first: the TOML compiled in from
//! `defaults/kasha.default.toml`, then each file added to the [`Loader`], then
//! `set_override` values such as `--stack-capacity`. Every key has a
//! compiled-in value, so an empty user file is a complete configuration.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../../defaults/kasha.default.toml");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KashaConfig {
    pub parser: ParserConfig,
    pub vm: VmConfig,
    pub native: NativeConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParserConfig {
    /// Deepest expression nesting accepted before the parse fails
    pub max_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VmConfig {
    pub stack_capacity: usize,
}

/// External tools used by the native build.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NativeConfig {
    pub compiler: String,
    #[serde(default)]
    pub cflags: Vec<String>,
    pub linker: String,
    #[serde(default)]
    pub ldflags: Vec<String>,
    #[serde(default)]
    pub target: Option<String>,
}

/// Stacks configuration sources; later sources win key by key.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Only the compiled-in defaults so far.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Add a TOML file that must exist; `build` fails if it does not.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Add a TOML file, skipped silently when absent.
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Pin one dotted key, e.g. `vm.stack_capacity`, above every file.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<KashaConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// The compiled-in configuration with nothing layered on top
pub fn load_defaults() -> Result<KashaConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.parser.max_depth, 256);
        assert_eq!(config.vm.stack_capacity, 256);
        assert_eq!(config.native.compiler, "cc");
        assert_eq!(config.native.cflags, vec!["-std=c99", "-O2"]);
        assert!(config.native.ldflags.is_empty());
        assert_eq!(config.native.target, None);
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("vm.stack_capacity", 8i64)
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.vm.stack_capacity, 8);
    }

    #[test]
    fn layers_user_file_over_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(file, "[native]\nlinker = \"clang\"\ntarget = \"aarch64-linux-gnu\"")
            .expect("write config");

        let config = Loader::new()
            .with_file(file.path())
            .build()
            .expect("config to build");
        assert_eq!(config.native.linker, "clang");
        assert_eq!(config.native.target.as_deref(), Some("aarch64-linux-gnu"));
        assert_eq!(config.native.compiler, "cc");
        assert_eq!(config.vm.stack_capacity, 256);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = Loader::new()
            .with_file("/nonexistent/kasha-config.toml")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn missing_optional_file_is_ignored() {
        let config = Loader::new()
            .with_optional_file("/nonexistent/kasha-config.toml")
            .build()
            .expect("config to build");
        assert_eq!(config, load_defaults().unwrap());
    }
}
