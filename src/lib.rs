// Assembling
pub mod lexer;
pub mod parser;
pub mod isa;
pub mod air;
mod compiler;
mod linker;
pub mod assembler;
pub use assembler::{assemble, assemble_source, Assembly};

// Running
pub mod system;
pub use system::System;

mod error;
pub use error::{AsmError, LoadError};
mod span;
pub use span::{Idx, Span};

pub mod env;
pub mod output;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 4;
