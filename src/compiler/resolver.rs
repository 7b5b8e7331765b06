use crate::bytecode::OpCode;
use crate::compiler::{Compiler, Local, UpValue};
use crate::lexer::tokens::{Token, TokenKind};
use crate::{LOCALS_MAX, UP_VALUES_MAX};

impl<'a> Compiler<'a> {
  /// Compiles a reference to (or an assignment through) a named
  /// variable. The name is resolved, in order, against the locals of the
  /// current function, the variables captured from enclosing functions,
  /// and finally the globals table.
  ///
  /// # Parameters
  /// - `token`: The token naming the variable.
  /// - `can_assign`: Whether an `=` sign after the name may be consumed
  ///   as an assignment.
  pub(super) fn compile_named_variable(&mut self, token: Token, can_assign: bool) {
    let get_op: OpCode;
    let set_op: OpCode;
    let idx: u8;

    let func_idx = self.functions.len() - 1;

    if let Some(slot) = self.resolve_local(func_idx, &token) {
      get_op = OpCode::GetLocal;
      set_op = OpCode::SetLocal;
      idx = slot;
    } else if let Some(up_idx) = self.resolve_up_value(func_idx, &token) {
      get_op = OpCode::GetUpVal;
      set_op = OpCode::SetUpVal;
      idx = up_idx;
    } else {
      get_op = OpCode::GetGlobal;
      set_op = OpCode::SetGlobal;
      idx = self.identifier_constant(&token);
    }

    if can_assign && self.matches(TokenKind::EQUALS) {
      self.expression();
      self.emit_op_code_with_byte(set_op, idx);
    } else {
      self.emit_op_code_with_byte(get_op, idx);
    }
  }

  /// Looks for a local variable with the given token's name in the
  /// function scope at the provided index, searching from the innermost
  /// declaration outwards.
  ///
  /// # Parameters
  /// - `func_idx`: The index of the function scope to search in.
  /// - `token`: The token naming the variable.
  ///
  /// # Returns
  /// `Option<u8>`: The stack slot of the local, if one was found.
  fn resolve_local(&mut self, func_idx: usize, token: &Token) -> Option<u8> {
    let mut found: Option<(usize, bool)> = None;

    for (idx, local) in self.functions[func_idx].locals.iter().enumerate().rev() {
      if local.name == token.lexeme {
        found = Some((idx, local.is_initialized));
        break;
      }
    }

    match found {
      Some((idx, is_initialized)) => {
        if !is_initialized {
          self.error_at_token(token, "Can't read local variable in its own initializer.");
        }

        Some(idx as u8)
      }
      None => None,
    }
  }

  /// Looks for a variable with the given token's name in the local
  /// scopes of the functions enclosing the one at the provided index.
  /// A local found in the directly enclosing function is captured from
  /// its stack slot; anything further out is re-exported through the
  /// chain of enclosing functions, one capture per level.
  ///
  /// # Parameters
  /// - `func_idx`: The index of the function scope doing the capturing.
  /// - `token`: The token naming the variable.
  ///
  /// # Returns
  /// `Option<u8>`: The position of the capture in the capturing
  /// function's up-value list, if the variable was found.
  fn resolve_up_value(&mut self, func_idx: usize, token: &Token) -> Option<u8> {
    if func_idx == 0 {
      return None;
    }

    if let Some(local_idx) = self.resolve_local(func_idx - 1, token) {
      self.functions[func_idx - 1].locals[local_idx as usize].is_captured = true;
      return self.add_up_value(func_idx, local_idx, true, token);
    }

    if let Some(up_idx) = self.resolve_up_value(func_idx - 1, token) {
      return self.add_up_value(func_idx, up_idx, false, token);
    }

    None
  }

  /// Adds an up value to the capture list of the function scope at the
  /// given index. Captures of the same variable are deduplicated.
  ///
  /// # Parameters
  /// - `func_idx`: The index of the capturing function scope.
  /// - `index`: The captured stack slot (when `is_local`) or the position
  ///   in the enclosing function's capture list.
  /// - `is_local`: Whether the capture refers to a stack slot of the
  ///   directly enclosing function.
  /// - `token`: The token naming the variable, for error reporting.
  fn add_up_value(&mut self, func_idx: usize, index: u8, is_local: bool, token: &Token) -> Option<u8> {
    let up_value = UpValue { index, is_local };

    // Prevent creating repeated up values.
    let count = self.functions[func_idx].up_values.len();
    for pos in 0..count {
      if self.functions[func_idx].up_values[pos] == up_value {
        return Some(pos as u8);
      }
    }

    if count >= UP_VALUES_MAX {
      self.error_at_token(token, "Too many closure variables in function.");
      return Some(0);
    }

    self.functions[func_idx].up_values.push(up_value);
    self.functions[func_idx].function.up_val_count += 1;

    Some(count as u8)
  }

  /// Consumes a variable name and declares it in the current scope.
  ///
  /// # Parameters
  /// - `message`: The error message to be displayed if the current token
  ///   is not an identifier.
  ///
  /// # Returns
  /// `u8`: The constant-pool position of the variable's name at global
  /// scope, or 0 for locals, which are resolved by stack slot instead.
  pub(super) fn parse_variable(&mut self, message: &str) -> u8 {
    self.consume(TokenKind::IDENTIFIER, message);
    self.declare_variable();

    if self.current_scope().scope_depth > 0 {
      return 0;
    }

    let token = self.previous.clone();
    self.identifier_constant(&token)
  }

  /// Declares the variable named by the previous token in the current
  /// scope. Globals are late-bound and need no declaration; locals are
  /// recorded as uninitialized until their initializer has compiled.
  pub(super) fn declare_variable(&mut self) {
    if self.current_scope().scope_depth == 0 {
      return;
    }

    let name = self.previous.lexeme.clone();

    // Look for an existing declaration with this name in the current scope.
    let mut is_duplicate = false;
    let scope_depth = self.current_scope().scope_depth;

    for local in self.current_scope().locals.iter().rev() {
      if local.depth < scope_depth {
        break;
      }

      if local.name == name {
        is_duplicate = true;
        break;
      }
    }

    if is_duplicate {
      self.error_at_previous("Already a variable with this name in this scope.");
    }

    self.add_local(name);
  }

  /// Adds a local variable record to the current function scope.
  fn add_local(&mut self, name: String) {
    if self.current_scope().locals.len() >= LOCALS_MAX {
      self.error_at_previous("Too many local variables in function.");
      return;
    }

    let depth = self.current_scope().scope_depth;

    self.current_scope_mut().locals.push(Local {
      name,
      depth,
      is_initialized: false,
      is_captured: false,
    });
  }

  /// Adds an initialized local that did not originate in the source
  /// text, like the "super" binding of a subclass body.
  pub(super) fn add_synthetic_local(&mut self, name: &str) {
    self.add_local(String::from(name));
    self.mark_initialized();
  }

  /// Marks the most recent local declaration as initialized. Does
  /// nothing at global scope.
  pub(super) fn mark_initialized(&mut self) {
    if self.current_scope().scope_depth == 0 {
      return;
    }

    if let Some(local) = self.current_scope_mut().locals.last_mut() {
      local.is_initialized = true;
    }
  }

  /// Finishes a variable declaration. Globals are installed in the
  /// globals table at runtime; locals simply leave their initializer's
  /// value on the stack, in the slot the compiler resolved for them.
  ///
  /// # Parameters
  /// - `global`: The constant-pool position of the name at global scope.
  pub(super) fn define_variable(&mut self, global: u8) {
    if self.current_scope().scope_depth > 0 {
      self.mark_initialized();
      return;
    }

    self.emit_op_code_with_byte(OpCode::DefineGlobal, global);
  }

  /// Opens a new block scope.
  pub(super) fn begin_scope(&mut self) {
    self.current_scope_mut().scope_depth += 1;
  }

  /// Closes the current block scope, discarding the locals declared in
  /// it. Captured locals are hoisted to the heap instead of popped, so
  /// closures keep seeing them after the scope ends.
  pub(super) fn end_scope(&mut self) {
    self.current_scope_mut().scope_depth -= 1;

    loop {
      let is_captured = {
        let scope = self.current_scope();
        match scope.locals.last() {
          Some(local) if local.depth > scope.scope_depth => Some(local.is_captured),
          _ => None,
        }
      };

      match is_captured {
        Some(true) => self.emit_op_code(OpCode::CloseUpVal),
        Some(false) => self.emit_op_code(OpCode::PopStack),
        None => break,
      }

      self.current_scope_mut().locals.pop();
    }
  }
}
