//! Main module for kasha library functionality

pub mod ast;
pub mod compiling;
pub mod config;
pub mod native;
pub mod parsing;
pub mod pipeline;
pub mod testing;
pub mod vm;
