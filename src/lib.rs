// Crate-level modules
pub mod built_in;
pub mod bytecode;
pub mod chunk;
pub mod compiler;
pub mod errors;
pub mod lexer;
pub mod objects;
#[cfg(feature = "show_bytecode")]
pub mod plv;
pub mod values;
pub mod virtual_machine;

#[cfg(test)]
mod tests;

/// The current version of the interpreter.
pub const VERSION: &str = "0.1.0";
/// The max number of frames in the function call stack.
pub const FRAMES_MAX: usize = 64;
/// The max number of values in the value stack.
pub const STACK_MAX: usize = FRAMES_MAX * 256;
/// The max number of local variables per function.
pub const LOCALS_MAX: usize = 256;
/// The max number of closed-over variables per function.
pub const UP_VALUES_MAX: usize = 256;
