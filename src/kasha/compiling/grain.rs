//! Grain instruction set
//!
//! A Grain sequence is the only thing the VM and the native backends see.
//! There is no control flow: execution starts at the first Grain and falls
//! through to the last.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Opcode {
    /// Write the top of the stack to a variable, leaving it in place
    Store,
    /// Push a variable (unset reads as 0)
    Load,
    /// Push the Grain's literal value
    Const,
    /// Pop two values, push their sum
    Add,
    /// Pop `pop_count` arguments, call `name`, push its result
    Call,
    /// Drop the top of the stack
    Discard,
}

impl Opcode {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Store => "store",
            Opcode::Load => "load",
            Opcode::Const => "const",
            Opcode::Add => "add",
            Opcode::Call => "call",
            Opcode::Discard => "discard",
        }
    }

    /// Values pushed after the pops; every opcode except the two stack
    /// adjusters produces exactly one value
    pub fn push_count(&self) -> usize {
        match self {
            Opcode::Store | Opcode::Discard => 0,
            Opcode::Load | Opcode::Const | Opcode::Add | Opcode::Call => 1,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// One instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grain {
    pub opcode: Opcode,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub value: i64,
    pub pop_count: usize,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

impl Grain {
    fn new(opcode: Opcode, name: impl Into<String>, value: i64, pop_count: usize) -> Self {
        Self {
            opcode,
            name: name.into(),
            value,
            pop_count,
        }
    }

    /// Store peeks: its pop count of 1 is the operand it requires, not
    /// one it removes
    pub fn store(name: impl Into<String>) -> Self {
        Self::new(Opcode::Store, name, 0, 1)
    }

    pub fn load(name: impl Into<String>) -> Self {
        Self::new(Opcode::Load, name, 0, 0)
    }

    pub fn constant(value: i64) -> Self {
        Self::new(Opcode::Const, "", value, 0)
    }

    pub fn add() -> Self {
        Self::new(Opcode::Add, "", 0, 2)
    }

    pub fn call(name: impl Into<String>, argc: usize) -> Self {
        Self::new(Opcode::Call, name, 0, argc)
    }

    pub fn discard() -> Self {
        Self::new(Opcode::Discard, "", 0, 1)
    }

    /// Net change in stack height after this Grain runs
    pub fn stack_effect(&self) -> isize {
        let popped = match self.opcode {
            Opcode::Store => 0,
            _ => self.pop_count as isize,
        };
        self.opcode.push_count() as isize - popped
    }
}

impl fmt::Display for Grain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode {
            Opcode::Store | Opcode::Load => write!(f, "{} {}", self.opcode, self.name),
            Opcode::Const => write!(f, "{} {}", self.opcode, self.value),
            Opcode::Call => write!(f, "{} {}/{}", self.opcode, self.name, self.pop_count),
            Opcode::Add | Opcode::Discard => write!(f, "{}", self.opcode),
        }
    }
}

/// An immutable, compiled program
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Grains(Vec<Grain>);

impl Grains {
    pub fn new(grains: Vec<Grain>) -> Self {
        Self(grains)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Grain> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Grain] {
        &self.0
    }

    /// Highest stack height reached when the sequence runs from an empty stack
    pub fn max_stack_height(&self) -> usize {
        let mut height: isize = 0;
        let mut max: isize = 0;
        for grain in &self.0 {
            height += grain.stack_effect();
            max = max.max(height);
        }
        max.max(0) as usize
    }
}

impl<'a> IntoIterator for &'a Grains {
    type Item = &'a Grain;
    type IntoIter = std::slice::Iter<'a, Grain>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Grains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for grain in &self.0 {
            writeln!(f, "{}", grain)?;
        }
        Ok(())
    }
}
