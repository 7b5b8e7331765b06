use num_derive::FromPrimitive;

/// The set of instructions supported by the virtual machine.
///
/// **NOTE:** Changing the order in which members are declared creates
/// incompatibilities between different versions of the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
#[derive(FromPrimitive)]
pub enum OpCode {
  // Instructions with zero chunk operands.
  // While these instructions do not have any
  // bytecode operands, some of them do have
  // object operands from the stack.
  Add,
  CloseUpVal,
  Divide,
  Equals,
  GreaterThan,
  Inherit,
  LessThan,
  LoadImmFalse,
  LoadImmNull,
  LoadImmTrue,
  LogicNot,
  Multiply,
  Negate,
  PopStack,
  Print,
  Return,
  Subtract,

  // Instructions with one chunk operand.
  // These instructions use the next byte
  // from the chunk as their operand.
  DefineGlobal,
  DefineMethod,
  FuncCall,
  GetGlobal,
  GetLocal,
  GetProp,
  GetSuper,
  GetUpVal,
  LoadConstant,
  MakeClass,
  SetGlobal,
  SetLocal,
  SetProp,
  SetUpVal,

  // Instructions with two chunk operands.
  // These instructions use the next two
  // bytes (a short) as their operands.
  JumpForward,
  JumpIfFalse,
  LoopJump,

  // Instructions with a variable number of operands.
  Invoke,
  // Byte #1 is the position of the method's name in the pool.
  // Byte #2 is the number of arguments passed to the method.
  SuperInvoke,
  // Byte #1 is the position of the method's name in the pool.
  // Byte #2 is the number of arguments passed to the method.
  MakeClosure,
  // Byte #1 is the position of the function object in the pool.
  // --- UpValue Encoding (2 bytes per up_value) ---
  // One byte if the up value is local.
  // One byte for the position of the up value.
}
