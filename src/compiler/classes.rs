use crate::bytecode::OpCode;
use crate::compiler::{ClassScope, Compiler, FuncKind};
use crate::lexer::tokens::{Token, TokenKind};

impl<'a> Compiler<'a> {
  /// Compiles a class declaration: the class object itself, an optional
  /// superclass clause, and the class's method table.
  pub(super) fn class_declaration(&mut self) {
    self.consume(TokenKind::IDENTIFIER, "Expected a class name.");
    let class_name = self.previous.clone();

    let name_const = self.identifier_constant(&class_name);
    self.declare_variable();

    self.emit_op_code_with_byte(OpCode::MakeClass, name_const);
    self.define_variable(name_const);

    self.classes.push(ClassScope {
      has_superclass: false,
    });

    if self.matches(TokenKind::LESS_THAN) {
      self.compile_superclass_clause(&class_name);
    }

    // Load the class back onto the stack so the method declarations
    // below have something to attach themselves to.
    self.compile_named_variable(class_name, false);

    self.consume(TokenKind::L_CURLY, "Expected '{' before the class body.");
    while !self.check(TokenKind::R_CURLY) && !self.check(TokenKind::EOF) {
      self.compile_method();
    }
    self.consume(TokenKind::R_CURLY, "Expected '}' after the class body.");

    self.emit_op_code(OpCode::PopStack);

    let class = match self.classes.pop() {
      Some(class) => class,
      None => unreachable!("A class scope should be open while compiling a class."),
    };

    // The scope holding the "super" binding.
    if class.has_superclass {
      self.end_scope();
    }
  }

  /// Compiles the `< Superclass` clause of a class declaration. The
  /// superclass value is stashed in a scoped local named "super", which
  /// `super` expressions inside the method bodies resolve against.
  fn compile_superclass_clause(&mut self, class_name: &Token) {
    self.consume(TokenKind::IDENTIFIER, "Expected a superclass name.");
    self.compile_variable_expr(false);

    if class_name.lexeme == self.previous.lexeme {
      self.error_at_previous("A class cannot inherit from itself.");
    }

    self.begin_scope();
    self.add_synthetic_local("super");

    self.compile_named_variable(class_name.clone(), false);
    self.emit_op_code(OpCode::Inherit);

    if let Some(class) = self.classes.last_mut() {
      class.has_superclass = true;
    }
  }

  /// Compiles a single method declaration. A method named `init` becomes
  /// the class's initializer, with its own return restrictions.
  fn compile_method(&mut self) {
    self.consume(TokenKind::IDENTIFIER, "Expected a method name.");
    let token = self.previous.clone();
    let name_const = self.identifier_constant(&token);

    let kind = if token.lexeme == "init" {
      FuncKind::Init
    } else {
      FuncKind::Method
    };

    self.compile_function(kind);
    self.emit_op_code_with_byte(OpCode::DefineMethod, name_const);
  }
}
