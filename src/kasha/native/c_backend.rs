//! C translation backend
//!
//! The Grain set has no control flow, so the stack height before every Grain
//! is known at lowering time. Each stack slot becomes an element of a local
//! `int64_t` array indexed by a constant, each variable becomes a
//! zero-initialised global, and the object is produced by the configured C
//! compiler.

use super::{run_tool, BackendError, NativeBackend, Target};
use crate::kasha::compiling::{Grain, Grains, Opcode};
use crate::kasha::config::NativeConfig;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::process::Command;
use tracing::debug;

const PRELUDE: &str = "#include <inttypes.h>\n#include <stdint.h>\n#include <stdio.h>\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CBackend {
    compiler: String,
    cflags: Vec<String>,
}

impl Default for CBackend {
    fn default() -> Self {
        Self::new("cc", vec!["-std=c99".to_string(), "-O2".to_string()])
    }
}

impl CBackend {
    pub fn new(compiler: impl Into<String>, cflags: Vec<String>) -> Self {
        Self {
            compiler: compiler.into(),
            cflags,
        }
    }

    pub fn from_config(config: &NativeConfig) -> Self {
        Self::new(config.compiler.clone(), config.cflags.clone())
    }

    /// Lower `grains` to a self-contained C translation unit with a `main`
    pub fn transpile(&self, grains: &Grains) -> Result<String, BackendError> {
        let mut lowering = Lowering::default();
        for (index, grain) in grains.iter().enumerate() {
            lowering.lower(index, grain)?;
        }
        Ok(lowering.finish(grains.max_stack_height()))
    }
}

impl NativeBackend for CBackend {
    fn name(&self) -> &'static str {
        "c"
    }

    fn emit_object(&self, grains: &Grains, target: &Target) -> Result<Vec<u8>, BackendError> {
        let unit = self.transpile(grains)?;

        let workdir = tempfile::tempdir()?;
        let source_path = workdir.path().join("program.c");
        let object_path = workdir.path().join("program.o");
        fs::write(&source_path, unit)?;

        let mut command = Command::new(&self.compiler);
        command.args(&self.cflags);
        if let Some(flag) = target.flag() {
            command.arg(flag);
        }
        command
            .arg("-c")
            .arg(&source_path)
            .arg("-o")
            .arg(&object_path);
        run_tool(&self.compiler, &mut command)?;

        let object = fs::read(&object_path)?;
        debug!(bytes = object.len(), compiler = %self.compiler, "emitted object");
        Ok(object)
    }
}

/// Lowering state: the statically known stack height plus what has been emitted
#[derive(Debug, Default)]
struct Lowering {
    height: usize,
    globals: BTreeSet<String>,
    body: String,
}

impl Lowering {
    fn lower(&mut self, index: usize, grain: &Grain) -> Result<(), BackendError> {
        let needed = match grain.opcode {
            Opcode::Store => 1,
            _ => grain.pop_count,
        };
        if needed > self.height {
            return Err(BackendError::StackUnderflow {
                index,
                grain: grain.to_string(),
                needed,
                height: self.height,
            });
        }

        let top = self.height.wrapping_sub(1);
        let line = match grain.opcode {
            Opcode::Const => format!("stack[{}] = {};", self.height, c_int(grain.value)),
            Opcode::Load => {
                let global = self.global(&grain.name)?;
                format!("stack[{}] = {};", self.height, global)
            }
            Opcode::Store => {
                let global = self.global(&grain.name)?;
                format!("{} = stack[{}];", global, top)
            }
            Opcode::Add => format!(
                "stack[{0}] = (int64_t)((uint64_t)stack[{1}] + (uint64_t)stack[{0}]);",
                top - 1,
                top
            ),
            Opcode::Call => self.call(grain)?,
            Opcode::Discard => String::new(),
        };

        if line.is_empty() {
            let _ = writeln!(self.body, "    // {}", grain);
        } else {
            let _ = writeln!(self.body, "    {} // {}", line, grain);
        }

        self.height = (self.height as isize + grain.stack_effect()) as usize;
        Ok(())
    }

    /// Arguments are on the stack last-to-first, so the first one is on top
    fn call(&self, grain: &Grain) -> Result<String, BackendError> {
        if grain.name != "print" {
            return Err(BackendError::UnknownFunction(grain.name.clone()));
        }

        let argc = grain.pop_count;
        let mut format = vec!["\"%\" PRId64"; argc].join(" \" \" ");
        if !format.is_empty() {
            format.push(' ');
        }
        format.push_str("\"\\n\"");

        let args: String = (0..argc)
            .map(|i| format!(", stack[{}]", self.height - 1 - i))
            .collect();
        let result_slot = self.height - argc;
        Ok(format!(
            "printf({}{}); stack[{}] = 0;",
            format, args, result_slot
        ))
    }

    fn global(&mut self, name: &str) -> Result<String, BackendError> {
        let mut chars = name.chars();
        let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(BackendError::InvalidName(name.to_string()));
        }
        let global = format!("v_{}", name);
        self.globals.insert(global.clone());
        Ok(global)
    }

    fn finish(self, max_height: usize) -> String {
        let mut unit = String::from(PRELUDE);
        unit.push('\n');
        for global in &self.globals {
            let _ = writeln!(unit, "static int64_t {} = 0;", global);
        }
        if !self.globals.is_empty() {
            unit.push('\n');
        }
        unit.push_str("int main(void) {\n");
        let _ = writeln!(unit, "    int64_t stack[{}];", max_height.max(1));
        unit.push_str("    (void)stack;\n");
        unit.push_str(&self.body);
        unit.push_str("    return 0;\n}\n");
        unit
    }
}

/// `i64::MIN` has no literal form in C
fn c_int(value: i64) -> String {
    if value == i64::MIN {
        "(-INT64_C(9223372036854775807) - 1)".to_string()
    } else {
        format!("INT64_C({})", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kasha::compiling::compile;
    use crate::kasha::parsing::parse;

    fn transpile(source: &str) -> Result<String, BackendError> {
        CBackend::default().transpile(&compile(&parse(source).unwrap()).unwrap())
    }

    #[test]
    fn test_translation_unit() {
        let unit = transpile("a = 1 + 2\nprint(a, 5)").unwrap();
        insta::assert_snapshot!(unit.trim_end(), @r###"
        #include <inttypes.h>
        #include <stdint.h>
        #include <stdio.h>

        static int64_t v_a = 0;

        int main(void) {
            int64_t stack[2];
            (void)stack;
            stack[0] = INT64_C(2); // const 2
            stack[1] = INT64_C(1); // const 1
            stack[0] = (int64_t)((uint64_t)stack[1] + (uint64_t)stack[0]); // add
            v_a = stack[0]; // store a
            // discard
            stack[0] = INT64_C(5); // const 5
            stack[1] = v_a; // load a
            printf("%" PRId64 " " "%" PRId64 "\n", stack[1], stack[0]); stack[0] = 0; // call print/2
            // discard
            return 0;
        }
        "###);
    }

    #[test]
    fn test_print_without_arguments() {
        let unit = transpile("print()").unwrap();
        assert!(unit.contains("printf(\"\\n\"); stack[0] = 0;"));
    }

    #[test]
    fn test_unknown_function_is_rejected() {
        let error = transpile("launch(1)").unwrap_err();
        assert!(matches!(error, BackendError::UnknownFunction(ref name) if name == "launch"));
    }

    #[test]
    fn test_underflow_is_rejected() {
        let grains = Grains::new(vec![Grain::constant(1), Grain::add()]);
        let error = CBackend::default().transpile(&grains).unwrap_err();
        assert!(matches!(
            error,
            BackendError::StackUnderflow {
                index: 1,
                needed: 2,
                height: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_symbol_is_rejected() {
        let grains = Grains::new(vec![Grain::constant(1), Grain::store("no-dash")]);
        let error = CBackend::default().transpile(&grains).unwrap_err();
        assert!(matches!(error, BackendError::InvalidName(_)));
    }

    #[test]
    fn test_min_literal() {
        let grains = Grains::new(vec![Grain::constant(i64::MIN), Grain::discard()]);
        let unit = CBackend::default().transpile(&grains).unwrap();
        assert!(unit.contains("(-INT64_C(9223372036854775807) - 1)"));
    }

    #[test]
    fn test_missing_compiler_is_reported() {
        let backend = CBackend::new("kasha-no-such-cc", vec![]);
        let grains = compile(&parse("print(1)").unwrap()).unwrap();
        let error = backend.emit_object(&grains, &Target::host()).unwrap_err();
        assert!(matches!(error, BackendError::Spawn { .. }));
    }
}
