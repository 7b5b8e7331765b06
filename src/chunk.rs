use crate::bytecode::OpCode;
use crate::values::Value;
use num_traits::FromPrimitive;

/// Contains all the necessary information about
/// the instructions to be executed.
#[derive(Default)]
pub struct Chunk {
  /// The instructions to execute in this chunk.
  instructions: Vec<u8>,
  /// The source line associated with each instruction byte.
  lines: Vec<usize>,
  /// The literal values used in this chunk.
  constants: Vec<Value>,
}

impl Chunk {
  /// Creates a new chunk.
  pub fn new() -> Self {
    Self {
      instructions: Vec::with_capacity(8),
      lines: Vec::with_capacity(8),
      constants: Vec::new(),
    }
  }

  /// Gets the size of the instructions list.
  pub fn len(&self) -> usize {
    self.instructions.len()
  }

  /// Checks whether or not the instructions list is empty.
  pub fn is_empty(&self) -> bool {
    self.instructions.is_empty()
  }

  /// Adds a raw byte into the instructions list.
  ///
  /// # Parameters
  /// - `val`: The byte to be added to the chunk.
  /// - `line`: The source line the byte originated from.
  pub fn push_byte(&mut self, val: u8, line: usize) {
    self.instructions.push(val);
    self.lines.push(line);
  }

  /// Splits a 16-bit integer into two bytes, and pushes the byte
  /// sequence (big-endian) into the instructions list.
  ///
  /// # Parameters
  /// - `val`: The short to be added to the chunk.
  /// - `line`: The source line the short originated from.
  pub fn push_short(&mut self, val: u16, line: usize) {
    let short = val.to_be_bytes();
    self.push_byte(short[0], line);
    self.push_byte(short[1], line);
  }

  /// Retrieves the raw byte at the given instructions list index.
  pub fn get_byte(&self, idx: usize) -> u8 {
    self.instructions[idx]
  }

  /// Retrieves the current and next bytes at the given instructions list index,
  /// then converts and returns the byte sequence into a u16.
  pub fn get_short(&self, idx: usize) -> u16 {
    let b1 = self.instructions[idx];
    let b2 = self.instructions[idx + 1];
    u16::from_be_bytes([b1, b2])
  }

  /// Decodes the byte at the given instructions list index into an OpCode.
  pub fn get_op_code(&self, idx: usize) -> OpCode {
    match FromPrimitive::from_u8(self.instructions[idx]) {
      Some(op) => op,
      None => unreachable!("Invalid instruction byte '{}'.", self.instructions[idx]),
    }
  }

  /// Modifies the byte value at the specified chunk index.
  pub fn patch(&mut self, idx: usize, new_byte: u8) {
    self.instructions[idx] = new_byte;
  }

  /// Gets the source line associated with the byte at the given instruction index.
  pub fn get_line(&self, idx: usize) -> usize {
    self.lines[idx]
  }

  /// Adds a constant to this chunk's constants pool.
  /// Constants already present in the pool are reused instead of duplicated.
  ///
  /// # Parameters
  /// - `val`: The value to be added to the pool.
  ///
  /// # Returns
  /// `Option<u8>`: The position of the constant in the pool, or `None`
  /// when the pool is already at capacity.
  pub fn add_constant(&mut self, val: Value) -> Option<u8> {
    if let Some(pos) = self.constants.iter().position(|x| *x == val) {
      return Some(pos as u8);
    }

    if self.constants.len() >= 256 {
      return None;
    }

    self.constants.push(val);
    Some((self.constants.len() - 1) as u8)
  }

  /// Gets a constant from this chunk's constants pool.
  pub fn get_constant(&self, idx: usize) -> Value {
    self.constants[idx]
  }

  /// Gets the size of this chunk's constants pool.
  pub fn get_pool_size(&self) -> usize {
    self.constants.len()
  }

  /// Gets the list of constants in this chunk's pool.
  pub fn constants(&self) -> &[Value] {
    &self.constants
  }
}
