use crate::bytecode::OpCode;
use crate::chunk::Chunk;
use crate::lexer::tokens::{Token, TokenKind};
use crate::lexer::Lexer;
use crate::objects::gc::{GcId, Heap};
use crate::objects::{FuncObj, HeapObj};
use crate::values::Value;
use crate::virtual_machine::InterpretResult;

// Submodules
mod classes;
mod expressions;
mod functions;
mod precedence;
mod resolver;
mod statements;

/// The kinds of compilation units a Rook program is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncKind {
  Function,
  Init,
  Method,
  Script,
}

/// Represents a local variable known to the compiler, together with the
/// scope information needed to resolve references to it.
pub struct Local {
  pub name: String,
  pub depth: usize,
  /// Whether the variable's initializer has finished compiling. A local
  /// cannot be read before this flag is set.
  pub is_initialized: bool,
  /// Whether a closure captures this variable. Captured locals are
  /// hoisted to the heap when their scope ends.
  pub is_captured: bool,
}

/// Represents a variable captured from an enclosing function. When
/// `is_local` is true the index refers to a stack slot of the directly
/// enclosing function, otherwise it refers to one of the enclosing
/// function's own captures.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct UpValue {
  pub index: u8,
  pub is_local: bool,
}

/// The per-function state of the compiler. Function declarations nest,
/// so the compiler keeps a stack of these scopes.
pub struct FuncScope {
  pub function: FuncObj,
  pub kind: FuncKind,
  pub locals: Vec<Local>,
  pub scope_depth: usize,
  pub up_values: Vec<UpValue>,
}

impl FuncScope {
  /// Creates the compiler state for a new compilation unit. Slot zero of
  /// every call frame is reserved: methods and initializers bind the
  /// receiver there under the internal name "ego", other functions keep
  /// it unnamed.
  fn new(kind: FuncKind, name: Option<GcId>) -> Self {
    let receiver = match kind {
      FuncKind::Method | FuncKind::Init => "ego",
      _ => "",
    };

    Self {
      function: FuncObj {
        name,
        ..Default::default()
      },
      kind,
      locals: vec![Local {
        name: String::from(receiver),
        depth: 0,
        is_initialized: true,
        is_captured: false,
      }],
      scope_depth: 0,
      up_values: vec![],
    }
  }
}

/// The per-class state of the compiler. Class declarations can nest
/// inside method bodies, so these also form a stack.
pub struct ClassScope {
  pub has_superclass: bool,
}

/// Represents the compiler and its internal state.
pub struct Compiler<'a> {
  lexer: Lexer,
  previous: Token,
  current: Token,
  had_error: bool,
  is_in_panic: bool,
  functions: Vec<FuncScope>,
  classes: Vec<ClassScope>,
  heap: &'a mut Heap,
}

impl<'a> Compiler<'a> {
  /// Compiles a source string into the function object holding the
  /// program's top-level bytecode.
  ///
  /// # Parameters
  /// - `src`: The string to be compiled.
  /// - `heap`: The heap that compiled functions and strings are allocated in.
  ///
  /// # Returns
  /// `Result<GcId, InterpretResult>`: The id of the compiled script function
  /// if no compile errors were generated, an `InterpretResult::CompileError`
  /// otherwise.
  pub fn compile(src: &str, heap: &'a mut Heap) -> Result<GcId, InterpretResult> {
    let init_token = Token {
      line_num: 0,
      kind: TokenKind::__INIT_COMPILER__,
      lexeme: String::new(),
    };

    let mut s = Self {
      lexer: Lexer::new(src),
      previous: init_token.clone(),
      current: init_token,
      had_error: false,
      is_in_panic: false,
      functions: vec![FuncScope::new(FuncKind::Script, None)],
      classes: vec![],
      heap,
    };

    // Start compiling the token stream
    s.advance();
    while !s.matches(TokenKind::EOF) {
      s.declaration();
    }

    s.emit_implicit_return();

    if s.had_error {
      return Err(InterpretResult::CompileError);
    }

    let scope = match s.functions.pop() {
      Some(scope) => scope,
      None => unreachable!("The script scope should outlive the compiler."),
    };

    #[cfg(feature = "show_bytecode")]
    crate::plv::disassemble_function(s.heap, &scope.function);

    Ok(s.heap.allocate(HeapObj::Func(scope.function)))
  }

  /// Gets the scope of the function currently being compiled.
  pub(super) fn current_scope(&self) -> &FuncScope {
    match self.functions.last() {
      Some(scope) => scope,
      None => unreachable!("There should always be a current function scope."),
    }
  }

  /// Gets a mutable reference to the scope of the function currently
  /// being compiled.
  pub(super) fn current_scope_mut(&mut self) -> &mut FuncScope {
    let idx = self.functions.len() - 1;
    &mut self.functions[idx]
  }

  /// Gets the kind of compilation unit currently being compiled.
  pub(super) fn current_kind(&self) -> FuncKind {
    self.current_scope().kind
  }

  /// Gets the chunk of the function currently being compiled.
  pub(super) fn current_chunk(&self) -> &Chunk {
    &self.current_scope().function.chunk
  }

  /// Gets a mutable reference to the chunk of the function currently
  /// being compiled.
  pub(super) fn current_chunk_mut(&mut self) -> &mut Chunk {
    &mut self.current_scope_mut().function.chunk
  }

  /// Checks that the current token matches the token kind provided.
  ///
  /// # Parameters
  /// - `kind`: The token kind we expect to match with the current token.
  pub(super) fn check(&self, kind: TokenKind) -> bool {
    self.current.kind == kind
  }

  /// Checks that the current token matches the token kind provided.
  /// If the tokens match, the current token gets consumed and the
  /// function returns true. Otherwise, the token is not consumed,
  /// and the function returns false.
  ///
  /// # Parameters
  /// - `kind`: The token kind we expect to match with the current token.
  pub(super) fn matches(&mut self, kind: TokenKind) -> bool {
    if self.check(kind) {
      self.advance();
      true
    } else {
      false
    }
  }

  /// Advances the compiler to the next token. Error tokens produced by
  /// the lexer are reported here and skipped over.
  pub(super) fn advance(&mut self) {
    self.previous = self.current.clone();

    loop {
      self.current = self.lexer.next_token();

      match self.current.kind {
        TokenKind::ERROR => {
          let message = self.current.lexeme.clone();
          self.error_at_current(&message);
        }
        _ => break,
      }
    }
  }

  /// Consumes the current token only if it is of a given kind.
  /// If the token does not match the kind, emits a compiler error.
  ///
  /// # Parameters
  /// - `kind`: The expected kind of the token to consume.
  /// - `message`: The error message to be displayed if the current token
  ///   does not match the provided kind.
  pub(super) fn consume(&mut self, kind: TokenKind, message: &str) {
    if self.check(kind) {
      self.advance();
      return;
    }

    self.error_at_current(message);
  }

  /// Emits a byte instruction from an OpCode into the chunk's instruction list.
  ///
  /// # Parameters
  /// - `instr`: The OpCode instruction to be added to the chunk.
  pub(super) fn emit_op_code(&mut self, instr: OpCode) {
    let line = self.previous.line_num;
    self.current_chunk_mut().push_byte(instr as u8, line);
  }

  /// Emits a raw byte into the chunk's instruction list.
  ///
  /// # Parameters
  /// - `byte`: The raw byte to be added to the chunk.
  pub(super) fn emit_raw_byte(&mut self, byte: u8) {
    let line = self.previous.line_num;
    self.current_chunk_mut().push_byte(byte, line);
  }

  /// Emits a raw short from a 16-bit integer into the chunk's instruction list.
  ///
  /// # Parameters
  /// - `short`: The 16-bit short to be added to the chunk.
  pub(super) fn emit_raw_short(&mut self, short: u16) {
    let line = self.previous.line_num;
    self.current_chunk_mut().push_short(short, line);
  }

  /// Emits a byte instruction from an OpCode into the chunk's instruction
  /// list, followed by a raw byte operand.
  ///
  /// # Parameters
  /// - `instr`: The OpCode instruction to be added to the chunk.
  /// - `byte`: The raw byte to follow the emitted instruction.
  pub(super) fn emit_op_code_with_byte(&mut self, instr: OpCode, byte: u8) {
    self.emit_op_code(instr);
    self.emit_raw_byte(byte);
  }

  /// Emits a jump instruction with a placeholder offset operand.
  ///
  /// # Parameters
  /// - `instr`: The jump OpCode to be added to the chunk.
  ///
  /// # Returns
  /// `usize`: The chunk position of the placeholder operand, to be
  /// patched once the jump target is known.
  pub(super) fn emit_jump(&mut self, instr: OpCode) -> usize {
    self.emit_op_code(instr);
    self.emit_raw_short(0xffff);
    self.current_chunk().len() - 2
  }

  /// Patches a previously emitted jump so that it lands on the next
  /// instruction to be emitted.
  ///
  /// # Parameters
  /// - `offset`: The chunk position of the jump's placeholder operand.
  pub(super) fn patch_jump(&mut self, offset: usize) {
    // Subtract 2 to account for the operand bytes themselves.
    let jump = self.current_chunk().len() - offset - 2;

    if jump > u16::MAX as usize {
      self.error_at_previous("Too much code to jump over.");
      return;
    }

    let bytes = (jump as u16).to_be_bytes();
    self.current_chunk_mut().patch(offset, bytes[0]);
    self.current_chunk_mut().patch(offset + 1, bytes[1]);
  }

  /// Emits a backwards jump to the given chunk position.
  ///
  /// # Parameters
  /// - `loop_start`: The chunk position of the first instruction in the loop.
  pub(super) fn emit_loop(&mut self, loop_start: usize) {
    self.emit_op_code(OpCode::LoopJump);

    // Add 2 to account for the operand bytes themselves.
    let offset = self.current_chunk().len() - loop_start + 2;

    if offset > u16::MAX as usize {
      self.error_at_previous("The loop body is too large.");
    }

    self.emit_raw_short(offset as u16);
  }

  /// Emits the bytecode to return out of the current compilation unit
  /// when its body does not end in an explicit return. Initializers
  /// return their receiver, everything else returns nil.
  pub(super) fn emit_implicit_return(&mut self) {
    if self.current_kind() == FuncKind::Init {
      self.emit_op_code_with_byte(OpCode::GetLocal, 0);
    } else {
      self.emit_op_code(OpCode::LoadImmNull);
    }

    self.emit_op_code(OpCode::Return);
  }

  /// Adds a value to the current chunk's constant pool.
  ///
  /// # Parameters
  /// - `val`: The value to be added to the pool.
  ///
  /// # Returns
  /// `u8`: The position of the value in the pool.
  pub(super) fn make_constant(&mut self, val: Value) -> u8 {
    match self.current_chunk_mut().add_constant(val) {
      Some(idx) => idx,
      None => {
        self.error_at_previous("Too many constants in one chunk.");
        0
      }
    }
  }

  /// Emits the bytecode to load a constant value onto the stack at runtime.
  ///
  /// # Parameters
  /// - `val`: The value to be loaded.
  pub(super) fn emit_constant(&mut self, val: Value) {
    let idx = self.make_constant(val);
    self.emit_op_code_with_byte(OpCode::LoadConstant, idx);
  }

  /// Interns a token's lexeme and adds it to the current chunk's
  /// constant pool, for instructions that refer to names at runtime.
  ///
  /// # Parameters
  /// - `token`: The identifier token whose lexeme is to be added.
  ///
  /// # Returns
  /// `u8`: The position of the name string in the pool.
  pub(super) fn identifier_constant(&mut self, token: &Token) -> u8 {
    let id = self.heap.intern(token.lexeme.clone());
    self.make_constant(Value::Obj(id))
  }

  /// Emits a compiler error at the current token.
  ///
  /// # Parameters
  /// - `message`: The error message to display.
  pub(super) fn error_at_current(&mut self, message: &str) {
    let token = self.current.clone();
    self.error_at_token(&token, message);
  }

  /// Emits a compiler error at the previous token.
  ///
  /// # Parameters
  /// - `message`: The error message to display.
  pub(super) fn error_at_previous(&mut self, message: &str) {
    let token = self.previous.clone();
    self.error_at_token(&token, message);
  }

  /// Emits a compiler error at the given token. While the compiler is in
  /// panic mode, subsequent errors are suppressed until it synchronizes
  /// at the next statement boundary.
  ///
  /// # Parameters
  /// - `tok`: The token that caused the error.
  /// - `message`: The error message to display.
  pub(super) fn error_at_token(&mut self, tok: &Token, message: &str) {
    if self.is_in_panic {
      return;
    }
    self.is_in_panic = true;

    eprint!("[line {}] Error", tok.line_num);

    match tok.kind {
      TokenKind::EOF => eprint!(" at end"),
      // The lexeme of an error token is the error message itself.
      TokenKind::ERROR => {}
      _ => eprint!(" at '{}'", tok.lexeme),
    }

    eprintln!(": {}", message);
    self.had_error = true;
  }

  /// Synchronizes the compiler when it has found an error.
  /// This method helps minimize the number of cascading errors the compiler
  /// emits when it finds a parsing error. Once it reaches a synchronization
  /// point, like a keyword for a statement, it stops skipping tokens.
  pub(super) fn synchronize(&mut self) {
    self.is_in_panic = false;

    while self.current.kind != TokenKind::EOF {
      if self.previous.kind == TokenKind::SEMICOLON {
        return;
      }

      match self.current.kind {
        TokenKind::CLASS_KW
        | TokenKind::FUN_KW
        | TokenKind::VAR_KW
        | TokenKind::FOR_KW
        | TokenKind::IF_KW
        | TokenKind::WHILE_KW
        | TokenKind::PRINT_KW
        | TokenKind::RETURN_KW => {
          return;
        }

        _ => {}
      }

      self.advance();
    }
  }
}
