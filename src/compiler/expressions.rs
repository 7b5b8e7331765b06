use crate::bytecode::OpCode;
use crate::compiler::precedence::{get_rule, ParseFn, Precedence};
use crate::compiler::Compiler;
use crate::lexer::tokens::{Token, TokenKind};
use crate::values::Value;

impl<'a> Compiler<'a> {
  /// Compiles a single expression.
  pub(super) fn expression(&mut self) {
    self.parse_precedence(Precedence::PREC_ASSIGNMENT);
  }

  /// Compiles the next expression whose operators bind at least as
  /// tightly as the given precedence. This is the core of the Pratt
  /// parser: the prefix rule of the first token produces the left
  /// operand, then infix rules consume it for as long as their
  /// precedence allows.
  ///
  /// # Parameters
  /// - `precedence`: The lowest precedence level this call may consume.
  pub(super) fn parse_precedence(&mut self, precedence: Precedence) {
    self.advance();

    // An assignment can only appear where an expression of assignment
    // precedence (or lower) is expected.
    let can_assign = precedence as u8 <= Precedence::PREC_ASSIGNMENT as u8;

    match get_rule(self.previous.kind).prefix {
      ParseFn::NONE => {
        self.error_at_previous("Expected an expression.");
        return;
      }
      prefix => self.execute_parse_fn(prefix, can_assign),
    }

    while precedence as u8 <= get_rule(self.current.kind).precedence as u8 {
      self.advance();
      let infix = get_rule(self.previous.kind).infix;
      self.execute_parse_fn(infix, can_assign);
    }

    // If the `=` sign was not consumed by any of the rules above,
    // then the expression to its left is not assignable.
    if can_assign && self.matches(TokenKind::EQUALS) {
      self.error_at_previous("Invalid assignment target.");
    }
  }

  /// Dispatches a parsing rule to its compiling function.
  fn execute_parse_fn(&mut self, func: ParseFn, can_assign: bool) {
    match func {
      ParseFn::CompileBinaryExpr => self.compile_binary_expr(),
      ParseFn::CompileCall => self.compile_call_expr(),
      ParseFn::CompileDot => self.compile_dot_expr(can_assign),
      ParseFn::CompileGrouping => self.compile_grouping_expr(),
      ParseFn::CompileLiteral => self.compile_literal_expr(),
      ParseFn::CompileLogicAnd => self.compile_and_expr(),
      ParseFn::CompileLogicOr => self.compile_or_expr(),
      ParseFn::CompileNumber => self.compile_number_expr(),
      ParseFn::CompileString => self.compile_string_expr(),
      ParseFn::CompileSuper => self.compile_super_expr(),
      ParseFn::CompileThis => self.compile_this_expr(),
      ParseFn::CompileUnary => self.compile_unary_expr(),
      ParseFn::CompileVariable => self.compile_variable_expr(can_assign),
      ParseFn::NONE => {}
    }
  }

  /// Compiles a numeric literal.
  fn compile_number_expr(&mut self) {
    match self.previous.lexeme.parse::<f64>() {
      Ok(num) => self.emit_constant(Value::Num(num)),
      Err(_) => self.error_at_previous("Invalid numeric literal."),
    }
  }

  /// Compiles a string literal. The string's contents are interned, so
  /// equal string literals share a single heap object.
  fn compile_string_expr(&mut self) {
    let id = self.heap.intern(self.previous.lexeme.clone());
    self.emit_constant(Value::Obj(id));
  }

  /// Compiles the `true`, `false`, and `nil` literals.
  fn compile_literal_expr(&mut self) {
    match self.previous.kind {
      TokenKind::FALSE => self.emit_op_code(OpCode::LoadImmFalse),
      TokenKind::NIL => self.emit_op_code(OpCode::LoadImmNull),
      TokenKind::TRUE => self.emit_op_code(OpCode::LoadImmTrue),
      _ => unreachable!("Expected a literal token."),
    }
  }

  /// Compiles a parenthesized expression.
  fn compile_grouping_expr(&mut self) {
    self.expression();
    self.consume(TokenKind::R_PAREN, "Expected ')' after the expression.");
  }

  /// Compiles a unary `!` or `-` expression.
  fn compile_unary_expr(&mut self) {
    let operator = self.previous.kind;

    // Compile the operand first.
    self.parse_precedence(Precedence::PREC_UNARY);

    match operator {
      TokenKind::LOGIC_NOT => self.emit_op_code(OpCode::LogicNot),
      TokenKind::MINUS => self.emit_op_code(OpCode::Negate),
      _ => unreachable!("Expected a unary operator token."),
    }
  }

  /// Compiles a binary expression. The right operand is parsed one
  /// precedence level above the operator's own, making every binary
  /// operator left-associative.
  fn compile_binary_expr(&mut self) {
    let operator = self.previous.kind;
    let precedence = get_rule(operator).precedence;

    self.parse_precedence(Precedence::get_by_val(precedence as u8 + 1));

    match operator {
      TokenKind::GREATER_THAN => self.emit_op_code(OpCode::GreaterThan),
      TokenKind::GREATER_THAN_EQ => {
        self.emit_op_code(OpCode::LessThan);
        self.emit_op_code(OpCode::LogicNot);
      }
      TokenKind::LESS_THAN => self.emit_op_code(OpCode::LessThan),
      TokenKind::LESS_THAN_EQ => {
        self.emit_op_code(OpCode::GreaterThan);
        self.emit_op_code(OpCode::LogicNot);
      }
      TokenKind::LOGIC_EQ => self.emit_op_code(OpCode::Equals),
      TokenKind::LOGIC_NOT_EQ => {
        self.emit_op_code(OpCode::Equals);
        self.emit_op_code(OpCode::LogicNot);
      }
      TokenKind::MINUS => self.emit_op_code(OpCode::Subtract),
      TokenKind::PLUS => self.emit_op_code(OpCode::Add),
      TokenKind::SLASH => self.emit_op_code(OpCode::Divide),
      TokenKind::STAR => self.emit_op_code(OpCode::Multiply),
      _ => unreachable!("Expected a binary operator token."),
    }
  }

  /// Compiles an `and` expression. The right operand only executes when
  /// the left operand is truthy, and the expression's value is whichever
  /// operand executed last.
  fn compile_and_expr(&mut self) {
    let end_jump = self.emit_jump(OpCode::JumpIfFalse);

    self.emit_op_code(OpCode::PopStack);
    self.parse_precedence(Precedence::PREC_AND);

    self.patch_jump(end_jump);
  }

  /// Compiles an `or` expression. The right operand only executes when
  /// the left operand is falsy.
  fn compile_or_expr(&mut self) {
    let else_jump = self.emit_jump(OpCode::JumpIfFalse);
    let end_jump = self.emit_jump(OpCode::JumpForward);

    self.patch_jump(else_jump);
    self.emit_op_code(OpCode::PopStack);

    self.parse_precedence(Precedence::PREC_OR);
    self.patch_jump(end_jump);
  }

  /// Compiles an identifier expression, or an assignment to one.
  pub(super) fn compile_variable_expr(&mut self, can_assign: bool) {
    let token = self.previous.clone();
    self.compile_named_variable(token, can_assign);
  }

  /// Compiles a function call expression.
  fn compile_call_expr(&mut self) {
    let count = self.compile_argument_list();
    self.emit_op_code_with_byte(OpCode::FuncCall, count);
  }

  /// Compiles a property access, a property assignment, or a method
  /// invocation. Accesses immediately followed by an argument list are
  /// fused into a single `Invoke` instruction.
  fn compile_dot_expr(&mut self, can_assign: bool) {
    self.consume(TokenKind::IDENTIFIER, "Expected a property name after '.'.");
    let token = self.previous.clone();
    let name_const = self.identifier_constant(&token);

    if can_assign && self.matches(TokenKind::EQUALS) {
      self.expression();
      self.emit_op_code_with_byte(OpCode::SetProp, name_const);
    } else if self.matches(TokenKind::L_PAREN) {
      let count = self.compile_argument_list();
      self.emit_op_code_with_byte(OpCode::Invoke, name_const);
      self.emit_raw_byte(count);
    } else {
      self.emit_op_code_with_byte(OpCode::GetProp, name_const);
    }
  }

  /// Compiles the `this` keyword. The receiver is an ordinary local
  /// variable bound in slot zero under the internal name "ego".
  fn compile_this_expr(&mut self) {
    if self.classes.is_empty() {
      self.error_at_previous("Cannot use 'this' outside of a class.");
      return;
    }

    let mut token = Token::synthetic("ego");
    token.line_num = self.previous.line_num;
    self.compile_named_variable(token, false);
  }

  /// Compiles a `super.name` access or a fused `super.name(...)` invocation.
  fn compile_super_expr(&mut self) {
    let enclosing_class = self.classes.last().map(|class| class.has_superclass);

    match enclosing_class {
      None => self.error_at_previous("Cannot use 'super' outside of a class."),
      Some(false) => self.error_at_previous("Cannot use 'super' in a class with no superclass."),
      Some(true) => {}
    }

    let line = self.previous.line_num;

    self.consume(TokenKind::DOT, "Expected '.' after 'super'.");
    self.consume(TokenKind::IDENTIFIER, "Expected a superclass method name.");
    let token = self.previous.clone();
    let name_const = self.identifier_constant(&token);

    let mut receiver = Token::synthetic("ego");
    receiver.line_num = line;
    let mut superclass = Token::synthetic("super");
    superclass.line_num = line;

    self.compile_named_variable(receiver, false);

    if self.matches(TokenKind::L_PAREN) {
      let count = self.compile_argument_list();
      self.compile_named_variable(superclass, false);
      self.emit_op_code_with_byte(OpCode::SuperInvoke, name_const);
      self.emit_raw_byte(count);
    } else {
      self.compile_named_variable(superclass, false);
      self.emit_op_code_with_byte(OpCode::GetSuper, name_const);
    }
  }

  /// Compiles the comma-separated argument list of a call, up to the
  /// closing parenthesis.
  ///
  /// # Returns
  /// `u8`: The number of arguments compiled.
  pub(super) fn compile_argument_list(&mut self) -> u8 {
    let mut count: usize = 0;

    if !self.check(TokenKind::R_PAREN) {
      loop {
        self.expression();

        if count == 255 {
          self.error_at_previous("Cannot have more than 255 arguments.");
        }
        count += 1;

        if !self.matches(TokenKind::COMMA) {
          break;
        }
      }
    }

    self.consume(TokenKind::R_PAREN, "Expected ')' after the argument list.");
    count.min(255) as u8
  }
}
