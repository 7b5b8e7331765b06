use crate::values::Value;
use crate::virtual_machine::{RuntimeResult, Vm};

// Submodules
pub mod natives;

/// Represents the body of a Rook native function object.
pub type NativeFn = fn(&mut Vm, Vec<Value>) -> RuntimeResult;
