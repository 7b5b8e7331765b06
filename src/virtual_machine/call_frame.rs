use crate::objects::gc::GcId;

/// Represents a single ongoing function call.
pub struct CallFrame {
  /// The closure being executed.
  pub closure: GcId,
  /// The closure's function, cached here so the dispatch loop does not
  /// chase the closure reference on every instruction.
  pub function: GcId,
  /// The instruction pointer, as a byte offset into the function's chunk.
  pub ip: usize,
  /// The stack slot holding the callee. Slot zero of this activation.
  pub base: usize,
}
