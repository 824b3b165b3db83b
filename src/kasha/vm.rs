//! Stack VM
//!
//! Executes a Grain sequence against a fixed-capacity value stack and a
//! variable table. Execution is a straight loop: there are no jumps, so a run
//! ends after the last Grain or at the first error.

use crate::kasha::compiling::{Grain, Grains, Opcode};
use crate::kasha::config::VmConfig;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Stdout, Write};
use thiserror::Error;
use tracing::{debug, trace};

pub const DEFAULT_STACK_CAPACITY: usize = 256;

/// Value pushed by every call
pub const CALL_RESULT: i64 = 0;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("stack overflow (capacity {capacity})")]
    StackOverflow { capacity: usize },

    #[error("{opcode} needs {needed} value(s) but the stack holds {height}")]
    StackUnderflow {
        opcode: Opcode,
        needed: usize,
        height: usize,
    },

    #[error("failed to write program output: {0}")]
    Output(#[from] io::Error),
}

/// A built-in function: receives its arguments in source order
type Builtin = fn(&[i64], &mut dyn Write) -> io::Result<i64>;

static BUILTINS: Lazy<HashMap<&'static str, Builtin>> = Lazy::new(|| {
    let mut builtins: HashMap<&'static str, Builtin> = HashMap::new();
    builtins.insert("print", print);
    builtins
});

fn print(args: &[i64], out: &mut dyn Write) -> io::Result<i64> {
    let line = args
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(out, "{}", line)?;
    Ok(CALL_RESULT)
}

/// One VM instance owns its stack, memory and output sink
pub struct Vm<W: Write = Stdout> {
    memory: HashMap<String, i64>,
    stack: Vec<i64>,
    capacity: usize,
    output: W,
}

impl Vm<Stdout> {
    /// A VM printing to stdout
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }

    pub fn from_config(config: &VmConfig) -> Self {
        Self::new().with_capacity(config.stack_capacity)
    }
}

impl Default for Vm<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> fmt::Debug for Vm<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vm")
            .field("memory", &self.memory)
            .field("stack", &self.stack)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<W: Write> Vm<W> {
    pub fn with_output(output: W) -> Self {
        Self {
            memory: HashMap::new(),
            stack: Vec::with_capacity(DEFAULT_STACK_CAPACITY),
            capacity: DEFAULT_STACK_CAPACITY,
            output,
        }
    }

    /// Set the stack limit. Nothing is reserved up front; the stack grows as
    /// values are pushed, so any limit is accepted.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current value of a variable; `None` if it was never stored
    pub fn get(&self, name: &str) -> Option<i64> {
        self.memory.get(name).copied()
    }

    pub fn stack(&self) -> &[i64] {
        &self.stack
    }

    pub fn stack_height(&self) -> usize {
        self.stack.len()
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run every Grain in order, then flush the output sink
    pub fn run(&mut self, grains: &Grains) -> Result<(), RuntimeError> {
        for grain in grains {
            self.step(grain)?;
        }
        self.output.flush()?;
        debug!(
            grains = grains.len(),
            variables = self.memory.len(),
            "run finished"
        );
        Ok(())
    }

    /// Execute a single Grain
    pub fn step(&mut self, grain: &Grain) -> Result<(), RuntimeError> {
        trace!(grain = %grain, height = self.stack.len(), "step");
        match grain.opcode {
            Opcode::Discard => {
                self.pop_values(grain.opcode, 1)?;
            }
            Opcode::Store => {
                let value = *self.stack.last().ok_or(RuntimeError::StackUnderflow {
                    opcode: Opcode::Store,
                    needed: 1,
                    height: 0,
                })?;
                self.memory.insert(grain.name.clone(), value);
            }
            Opcode::Load => {
                let value = self.get(&grain.name).unwrap_or_default();
                self.push(value)?;
            }
            Opcode::Const => self.push(grain.value)?,
            Opcode::Add => {
                let operands = self.pop_values(grain.opcode, 2)?;
                let sum = operands.iter().fold(0i64, |acc, v| acc.wrapping_add(*v));
                self.push(sum)?;
            }
            Opcode::Call => {
                let builtin = *BUILTINS
                    .get(grain.name.as_str())
                    .ok_or_else(|| RuntimeError::UnknownFunction(grain.name.clone()))?;
                let args = self.pop_values(grain.opcode, grain.pop_count)?;
                let result = builtin(&args, &mut self.output)?;
                self.push(result)?;
            }
        }
        Ok(())
    }

    fn push(&mut self, value: i64) -> Result<(), RuntimeError> {
        if self.stack.len() >= self.capacity {
            return Err(RuntimeError::StackOverflow {
                capacity: self.capacity,
            });
        }
        self.stack.push(value);
        Ok(())
    }

    /// Pop `count` values; the result is in pop order (top of stack first)
    fn pop_values(&mut self, opcode: Opcode, count: usize) -> Result<Vec<i64>, RuntimeError> {
        let height = self.stack.len();
        if count > height {
            return Err(RuntimeError::StackUnderflow {
                opcode,
                needed: count,
                height,
            });
        }
        let mut values = self.stack.split_off(height - count);
        values.reverse();
        Ok(values)
    }
}
