use crate::bytecode::OpCode;
use crate::compiler::{Compiler, FuncKind};
use crate::lexer::tokens::TokenKind;

impl<'a> Compiler<'a> {
  /// Compiles a single declaration: a class, function, or variable
  /// declaration, or any other statement. After a parsing error the
  /// compiler re-synchronizes here, at the next statement boundary.
  pub(super) fn declaration(&mut self) {
    if self.matches(TokenKind::CLASS_KW) {
      self.class_declaration();
    } else if self.matches(TokenKind::FUN_KW) {
      self.fun_declaration();
    } else if self.matches(TokenKind::VAR_KW) {
      self.var_declaration();
    } else {
      self.statement();
    }

    if self.is_in_panic {
      self.synchronize();
    }
  }

  /// Compiles a single statement.
  fn statement(&mut self) {
    if self.matches(TokenKind::PRINT_KW) {
      self.print_statement();
    } else if self.matches(TokenKind::IF_KW) {
      self.if_statement();
    } else if self.matches(TokenKind::WHILE_KW) {
      self.while_statement();
    } else if self.matches(TokenKind::FOR_KW) {
      self.for_statement();
    } else if self.matches(TokenKind::RETURN_KW) {
      self.return_statement();
    } else if self.matches(TokenKind::L_CURLY) {
      self.begin_scope();
      self.compile_block();
      self.end_scope();
    } else {
      self.expression_statement();
    }
  }

  /// Compiles a `var` declaration. A declaration without an initializer
  /// defaults the variable to nil.
  fn var_declaration(&mut self) {
    let global = self.parse_variable("Expected a variable name.");

    if self.matches(TokenKind::EQUALS) {
      self.expression();
    } else {
      self.emit_op_code(OpCode::LoadImmNull);
    }

    self.consume(TokenKind::SEMICOLON, "Expected ';' after the variable declaration.");
    self.define_variable(global);
  }

  /// Compiles a `print` statement.
  fn print_statement(&mut self) {
    self.expression();
    self.consume(TokenKind::SEMICOLON, "Expected ';' after the value.");
    self.emit_op_code(OpCode::Print);
  }

  /// Compiles an expression statement, which evaluates the expression
  /// and discards its value.
  fn expression_statement(&mut self) {
    self.expression();
    self.consume(TokenKind::SEMICOLON, "Expected ';' after the expression.");
    self.emit_op_code(OpCode::PopStack);
  }

  /// Compiles the body of a block, up to the closing brace.
  pub(super) fn compile_block(&mut self) {
    while !self.check(TokenKind::R_CURLY) && !self.check(TokenKind::EOF) {
      self.declaration();
    }

    self.consume(TokenKind::R_CURLY, "Expected '}' after the block.");
  }

  /// Compiles an `if` statement, with an optional `else` branch.
  fn if_statement(&mut self) {
    self.consume(TokenKind::L_PAREN, "Expected '(' after 'if'.");
    self.expression();
    self.consume(TokenKind::R_PAREN, "Expected ')' after the condition.");

    let then_jump = self.emit_jump(OpCode::JumpIfFalse);
    self.emit_op_code(OpCode::PopStack);
    self.statement();

    let else_jump = self.emit_jump(OpCode::JumpForward);

    self.patch_jump(then_jump);
    self.emit_op_code(OpCode::PopStack);

    if self.matches(TokenKind::ELSE_KW) {
      self.statement();
    }

    self.patch_jump(else_jump);
  }

  /// Compiles a `while` statement.
  fn while_statement(&mut self) {
    let loop_start = self.current_chunk().len();

    self.consume(TokenKind::L_PAREN, "Expected '(' after 'while'.");
    self.expression();
    self.consume(TokenKind::R_PAREN, "Expected ')' after the condition.");

    let exit_jump = self.emit_jump(OpCode::JumpIfFalse);
    self.emit_op_code(OpCode::PopStack);

    self.statement();
    self.emit_loop(loop_start);

    self.patch_jump(exit_jump);
    self.emit_op_code(OpCode::PopStack);
  }

  /// Compiles a `for` statement. The statement is lowered onto the same
  /// jump instructions as `while`: the initializer runs in its own
  /// scope, the increment clause (when present) executes after the body,
  /// and the loop jumps back through the increment to the condition.
  fn for_statement(&mut self) {
    self.begin_scope();

    self.consume(TokenKind::L_PAREN, "Expected '(' after 'for'.");

    // Initializer clause.
    if self.matches(TokenKind::SEMICOLON) {
      // No initializer.
    } else if self.matches(TokenKind::VAR_KW) {
      self.var_declaration();
    } else {
      self.expression_statement();
    }

    let mut loop_start = self.current_chunk().len();

    // Condition clause.
    let mut exit_jump = None;
    if !self.matches(TokenKind::SEMICOLON) {
      self.expression();
      self.consume(TokenKind::SEMICOLON, "Expected ';' after the loop condition.");

      exit_jump = Some(self.emit_jump(OpCode::JumpIfFalse));
      self.emit_op_code(OpCode::PopStack);
    }

    // Increment clause.
    if !self.matches(TokenKind::R_PAREN) {
      let body_jump = self.emit_jump(OpCode::JumpForward);
      let increment_start = self.current_chunk().len();

      self.expression();
      self.emit_op_code(OpCode::PopStack);
      self.consume(TokenKind::R_PAREN, "Expected ')' after the 'for' clauses.");

      self.emit_loop(loop_start);
      loop_start = increment_start;
      self.patch_jump(body_jump);
    }

    self.statement();
    self.emit_loop(loop_start);

    if let Some(exit_jump) = exit_jump {
      self.patch_jump(exit_jump);
      self.emit_op_code(OpCode::PopStack);
    }

    self.end_scope();
  }

  /// Compiles a `return` statement.
  fn return_statement(&mut self) {
    if self.current_kind() == FuncKind::Script {
      self.error_at_previous("Cannot return from top-level code.");
    }

    if self.matches(TokenKind::SEMICOLON) {
      self.emit_implicit_return();
    } else {
      if self.current_kind() == FuncKind::Init {
        self.error_at_previous("Cannot return a value from a class initializer.");
      }

      self.expression();
      self.consume(TokenKind::SEMICOLON, "Expected ';' after the return value.");
      self.emit_op_code(OpCode::Return);
    }
  }
}
