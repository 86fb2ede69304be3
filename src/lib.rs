// Decoding
mod ops;
pub use ops::{Instruction, InvalidWord};
mod symbol;
pub use symbol::Register;

// Loading
mod parse;
pub use parse::parse_image;
pub mod config;
pub use config::{Layout, LevelParams};

// Running
pub mod cache;
pub use cache::Hierarchy;
mod runtime;
pub use runtime::{Simulator, Status, Step};
mod state;
pub use state::{MachineState, ADDR_MASK, MEM_SIZE};

pub mod output;
pub use output::{Diagnostic, Printer, Recorder, Trace};

pub mod error;

pub mod env;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 2;
