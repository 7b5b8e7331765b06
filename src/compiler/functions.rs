use crate::bytecode::OpCode;
use crate::compiler::{Compiler, FuncKind, FuncScope};
use crate::lexer::tokens::TokenKind;
use crate::objects::HeapObj;
use crate::values::Value;

impl<'a> Compiler<'a> {
  /// Compiles a function declaration statement. The function's name is
  /// marked initialized before the body compiles, so the body may refer
  /// to the function itself.
  pub(super) fn fun_declaration(&mut self) {
    let global = self.parse_variable("Expected a function name.");
    self.mark_initialized();

    self.compile_function(FuncKind::Function);
    self.define_variable(global);
  }

  /// Compiles a function body: its parameter list, its block, and the
  /// closure that wraps the compiled function at runtime. The previous
  /// token must be the function's name.
  ///
  /// # Parameters
  /// - `kind`: The kind of compilation unit this function is.
  pub(super) fn compile_function(&mut self, kind: FuncKind) {
    let name = self.heap.intern(self.previous.lexeme.clone());
    self.functions.push(FuncScope::new(kind, Some(name)));
    self.begin_scope();

    self.consume(TokenKind::L_PAREN, "Expected '(' after the function name.");

    // Compile the parameters so that the compiler knows about their stack slots.
    if !self.check(TokenKind::R_PAREN) {
      loop {
        if self.current_scope().function.arity == u8::MAX {
          self.error_at_current("Cannot have more than 255 parameters.");
        } else {
          self.current_scope_mut().function.arity += 1;
        }

        let param = self.parse_variable("Expected a parameter name.");
        self.define_variable(param);

        if !self.matches(TokenKind::COMMA) {
          break;
        }
      }
    }

    self.consume(TokenKind::R_PAREN, "Expected ')' after the parameter list.");
    self.consume(TokenKind::L_CURLY, "Expected '{' before the function body.");
    self.compile_block();

    self.emit_implicit_return();

    // Take the finished function out of the scope stack and go back to
    // compiling its parent.
    let scope = match self.functions.pop() {
      Some(scope) => scope,
      None => unreachable!("A function scope should be open while compiling a function."),
    };

    #[cfg(feature = "show_bytecode")]
    crate::plv::disassemble_function(self.heap, &scope.function);

    let up_values = scope.up_values;
    let func_id = self.heap.allocate(HeapObj::Func(scope.function));

    // Loads the function object onto the stack at runtime, wrapped in a
    // closure that captures the variables enumerated after the instruction.
    let idx = self.make_constant(Value::Obj(func_id));
    self.emit_op_code_with_byte(OpCode::MakeClosure, idx);

    for up in &up_values {
      self.emit_raw_byte(if up.is_local { 1u8 } else { 0u8 });
      self.emit_raw_byte(up.index);
    }
  }
}
