use crate::bytecode::OpCode;
use crate::errors::RuntimeErrorType;
use crate::objects::class_obj::{BoundMethodObj, ClassObj};
use crate::objects::gc::GcId;
use crate::objects::{ClosureObj, HeapObj, UpVal};
use crate::values::Value;
use crate::virtual_machine::{RuntimeResult, Vm};

impl Vm {
  /// Executes the instructions of the current call frame's chunk until
  /// the program ends or a runtime error surfaces.
  pub(crate) fn run(&mut self) -> RuntimeResult {
    loop {
      let instruction = self.next_op_code();

      // Prints the execution of the program.
      #[cfg(feature = "trace_execution")]
      self.print_execution(instruction);

      let exec = match instruction {
        OpCode::PopStack => {
          self.pop_stack();
          RuntimeResult::Continue
        }

        // Value loaders
        OpCode::LoadConstant => self.op_load_constant(),
        OpCode::LoadImmFalse => self.push_stack(Value::Bool(false)),
        OpCode::LoadImmNull => self.push_stack(Value::Nil),
        OpCode::LoadImmTrue => self.push_stack(Value::Bool(true)),

        // Global declarations
        OpCode::DefineGlobal => self.op_define_global(),
        OpCode::GetGlobal => self.op_get_global(),
        OpCode::SetGlobal => self.op_set_global(),

        // Local declarations
        OpCode::GetLocal => self.op_get_local(),
        OpCode::SetLocal => self.op_set_local(),

        // Operators
        OpCode::Add => self.op_add(),
        OpCode::Divide => self.op_binary_num(OpCode::Divide),
        OpCode::Equals => self.op_equals(),
        OpCode::GreaterThan => self.op_binary_num(OpCode::GreaterThan),
        OpCode::LessThan => self.op_binary_num(OpCode::LessThan),
        OpCode::LogicNot => self.op_logic_not(),
        OpCode::Multiply => self.op_binary_num(OpCode::Multiply),
        OpCode::Negate => self.op_negate(),
        OpCode::Subtract => self.op_binary_num(OpCode::Subtract),

        OpCode::Print => self.op_print(),

        // Jumps
        OpCode::JumpForward => self.op_jump_forward(),
        OpCode::JumpIfFalse => self.op_jump_if_false(),
        OpCode::LoopJump => self.op_loop_jump(),

        // Functions and Closures
        OpCode::CloseUpVal => self.op_close_up_value(),
        OpCode::FuncCall => self.op_func_call(),
        OpCode::GetUpVal => self.op_get_up_value(),
        OpCode::MakeClosure => self.op_make_closure(),
        OpCode::Return => self.op_function_return(),
        OpCode::SetUpVal => self.op_set_up_value(),

        // Classes and Instances
        OpCode::DefineMethod => self.op_define_method(),
        OpCode::GetProp => self.op_get_property(),
        OpCode::GetSuper => self.op_get_super(),
        OpCode::Inherit => self.op_inherit(),
        OpCode::Invoke => self.op_invoke(),
        OpCode::MakeClass => self.op_make_class(),
        OpCode::SetProp => self.op_set_property(),
        OpCode::SuperInvoke => self.op_super_invoke(),
      };

      match exec {
        RuntimeResult::Continue => continue,
        _ => return exec,
      }
    }
  }

  /// Executes the instruction to load a constant from the current call
  /// frame's constant pool onto the stack.
  fn op_load_constant(&mut self) -> RuntimeResult {
    let pos = self.next_byte() as usize;
    let val = self.read_constant(pos);
    self.push_stack(val)
  }

  /// Executes the instruction to define a global variable with the value
  /// at the top of the stack.
  fn op_define_global(&mut self) -> RuntimeResult {
    let name = self.read_name_operand();
    let val = self.pop_stack();
    self.globals.insert(name, val);
    RuntimeResult::Continue
  }

  /// Executes the instruction to get the value of a global variable.
  fn op_get_global(&mut self) -> RuntimeResult {
    let name = self.read_name_operand();

    match self.globals.get(&name).copied() {
      Some(val) => self.push_stack(val),
      None => RuntimeResult::Error {
        error: RuntimeErrorType::ReferenceError,
        message: format!("Undefined variable '{}'.", self.heap.str_(name).text),
      },
    }
  }

  /// Executes the instruction to modify the value of a global variable.
  /// Assignment is an expression, so the value stays on the stack.
  fn op_set_global(&mut self) -> RuntimeResult {
    let name = self.read_name_operand();

    if !self.globals.contains_key(&name) {
      return RuntimeResult::Error {
        error: RuntimeErrorType::ReferenceError,
        message: format!("Undefined variable '{}'.", self.heap.str_(name).text),
      };
    }

    let val = self.peek_stack(0);
    self.globals.insert(name, val);
    RuntimeResult::Continue
  }

  /// Executes the instruction to get the value of a local variable.
  fn op_get_local(&mut self) -> RuntimeResult {
    let pos = self.next_byte() as usize;
    let idx = self.current_frame().base + pos;

    let value = self.stack[idx];
    self.push_stack(value)
  }

  /// Executes the instruction to modify the value of a local variable.
  /// Assignment is an expression, so the value stays on the stack.
  fn op_set_local(&mut self) -> RuntimeResult {
    let pos = self.next_byte() as usize;
    let idx = self.current_frame().base + pos;

    let value = self.peek_stack(0);
    self.stack[idx] = value;
    RuntimeResult::Continue
  }

  /// Executes the instruction to read through one of the current
  /// closure's up-value cells.
  fn op_get_up_value(&mut self) -> RuntimeResult {
    let pos = self.next_byte() as usize;

    let closure = self.current_frame().closure;
    let up_val = self.heap.closure(closure).up_values[pos];

    let value = match self.heap.up_val(up_val) {
      UpVal::Open(slot) => self.stack[*slot],
      UpVal::Closed(val) => *val,
    };

    self.push_stack(value)
  }

  /// Executes the instruction to write through one of the current
  /// closure's up-value cells.
  fn op_set_up_value(&mut self) -> RuntimeResult {
    let pos = self.next_byte() as usize;

    let closure = self.current_frame().closure;
    let up_val = self.heap.closure(closure).up_values[pos];
    let value = self.peek_stack(0);

    match self.heap.up_val(up_val) {
      UpVal::Open(slot) => {
        let slot = *slot;
        self.stack[slot] = value;
      }
      UpVal::Closed(_) => *self.heap.up_val_mut(up_val) = UpVal::Closed(value),
    }

    RuntimeResult::Continue
  }

  /// Executes the instruction to add the two values at the top of the
  /// stack. `+` adds two numbers or concatenates two strings; the
  /// concatenated result is interned like any other string.
  fn op_add(&mut self) -> RuntimeResult {
    let b = self.peek_stack(0);
    let a = self.peek_stack(1);

    if let (Some(x), Some(y)) = (a.as_num(), b.as_num()) {
      self.pop_stack();
      self.pop_stack();
      return self.push_stack(Value::Num(x + y));
    }

    if a.is_string(&self.heap) && b.is_string(&self.heap) {
      let (a_id, b_id) = match (a, b) {
        (Value::Obj(a_id), Value::Obj(b_id)) => (a_id, b_id),
        _ => unreachable!("Expected string objects on the stack."),
      };

      let mut text = self.heap.str_(a_id).text.clone();
      text.push_str(&self.heap.str_(b_id).text);

      // Both operands stay on the stack across the allocation.
      let result = self.intern(text);

      self.pop_stack();
      self.pop_stack();
      return self.push_stack(Value::Obj(result));
    }

    RuntimeResult::Error {
      error: RuntimeErrorType::TypeError,
      message: String::from("Operands must be two numbers or two strings."),
    }
  }

  /// Executes a binary instruction whose operands must both be numbers.
  fn op_binary_num(&mut self, operator: OpCode) -> RuntimeResult {
    let b = self.peek_stack(0);
    let a = self.peek_stack(1);

    match (a.as_num(), b.as_num()) {
      (Some(x), Some(y)) => {
        self.pop_stack();
        self.pop_stack();

        let result = match operator {
          OpCode::Divide => Value::Num(x / y),
          OpCode::GreaterThan => Value::Bool(x > y),
          OpCode::LessThan => Value::Bool(x < y),
          OpCode::Multiply => Value::Num(x * y),
          OpCode::Subtract => Value::Num(x - y),
          _ => unreachable!("Expected a numeric binary operator."),
        };

        self.push_stack(result)
      }
      _ => RuntimeResult::Error {
        error: RuntimeErrorType::TypeError,
        message: String::from("Operands must be numbers."),
      },
    }
  }

  /// Executes the instruction to compare the two values at the top of
  /// the stack for equality.
  fn op_equals(&mut self) -> RuntimeResult {
    let b = self.pop_stack();
    let a = self.pop_stack();
    self.push_stack(Value::Bool(a == b))
  }

  /// Executes the instruction to logically negate the value at the top
  /// of the stack.
  fn op_logic_not(&mut self) -> RuntimeResult {
    let val = self.pop_stack();
    self.push_stack(Value::Bool(val.is_falsy()))
  }

  /// Executes the instruction to arithmetically negate the value at the
  /// top of the stack.
  fn op_negate(&mut self) -> RuntimeResult {
    match self.peek_stack(0).as_num() {
      Some(num) => {
        self.pop_stack();
        self.push_stack(Value::Num(-num))
      }
      None => RuntimeResult::Error {
        error: RuntimeErrorType::TypeError,
        message: String::from("Operand must be a number."),
      },
    }
  }

  /// Executes the instruction to print the value at the top of the stack.
  fn op_print(&mut self) -> RuntimeResult {
    let val = self.pop_stack();
    println!("{}", val.display_plain(&self.heap));
    RuntimeResult::Continue
  }

  /// Executes the instruction to jump forward by the given offset.
  fn op_jump_forward(&mut self) -> RuntimeResult {
    let offset = self.next_short() as usize;
    self.current_frame_mut().ip += offset;
    RuntimeResult::Continue
  }

  /// Executes the instruction to jump forward by the given offset if the
  /// value at the top of the stack is falsy. The value is not popped.
  fn op_jump_if_false(&mut self) -> RuntimeResult {
    let offset = self.next_short() as usize;

    if self.peek_stack(0).is_falsy() {
      self.current_frame_mut().ip += offset;
    }

    RuntimeResult::Continue
  }

  /// Executes the instruction to jump backward by the given offset.
  fn op_loop_jump(&mut self) -> RuntimeResult {
    let offset = self.next_short() as usize;
    self.current_frame_mut().ip -= offset;
    RuntimeResult::Continue
  }

  /// Executes the instruction to call the value sitting below the
  /// arguments on the stack.
  fn op_func_call(&mut self) -> RuntimeResult {
    let arg_count = self.next_byte();
    let callee = self.peek_stack(arg_count as usize);
    self.call_value(callee, arg_count)
  }

  /// Executes the instruction to wrap a compiled function in a closure,
  /// capturing the up values enumerated after the instruction.
  fn op_make_closure(&mut self) -> RuntimeResult {
    let pos = self.next_byte() as usize;

    let function = match self.read_constant(pos) {
      Value::Obj(id) => id,
      _ => unreachable!("Expected a function in the constant pool."),
    };

    let up_val_count = self.heap.func(function).up_val_count;

    let closure = self.alloc(HeapObj::Closure(ClosureObj {
      function,
      up_values: Vec::with_capacity(up_val_count),
    }));

    // The closure goes on the stack before its up values are captured,
    // keeping it reachable across those allocations.
    self.push_stack(Value::Obj(closure));

    for _ in 0..up_val_count {
      let is_local = self.next_byte() == 1;
      let index = self.next_byte() as usize;

      let up_val = if is_local {
        let base = self.current_frame().base;
        self.capture_up_value(base + index)
      } else {
        let enclosing = self.current_frame().closure;
        self.heap.closure(enclosing).up_values[index]
      };

      self.heap.closure_mut(closure).up_values.push(up_val);
    }

    RuntimeResult::Continue
  }

  /// Executes the instruction to close the top stack slot's up-value
  /// cell and discard the slot.
  fn op_close_up_value(&mut self) -> RuntimeResult {
    let top = self.stack.len() - 1;
    self.close_up_values(top);
    self.pop_stack();
    RuntimeResult::Continue
  }

  /// Executes the instruction to return out of the current call frame.
  /// Every stack slot of the returning activation gets its up-value cell
  /// closed before the slots are discarded.
  fn op_function_return(&mut self) -> RuntimeResult {
    let result = self.pop_stack();

    let base = self.current_frame().base;
    self.close_up_values(base);

    self.frames.pop();

    if self.frames.is_empty() {
      // Pop the top-level script closure.
      self.pop_stack();
      return RuntimeResult::EndOK;
    }

    self.stack.truncate(base);
    self.push_stack(result)
  }

  /// Executes the instruction to create a new, empty class.
  fn op_make_class(&mut self) -> RuntimeResult {
    let name = self.read_name_operand();
    let class = self.alloc(HeapObj::Class(ClassObj::new(name)));
    self.push_stack(Value::Obj(class))
  }

  /// Executes the instruction to copy a superclass's method table into
  /// the class at the top of the stack. Methods declared by the subclass
  /// afterwards overwrite the inherited entries; later changes to the
  /// superclass do not propagate.
  fn op_inherit(&mut self) -> RuntimeResult {
    let superclass = match self.peek_stack(1) {
      Value::Obj(id) if matches!(self.heap.get(id), HeapObj::Class(_)) => id,
      _ => {
        return RuntimeResult::Error {
          error: RuntimeErrorType::TypeError,
          message: String::from("Superclass must be a class."),
        }
      }
    };

    let subclass = match self.peek_stack(0) {
      Value::Obj(id) if matches!(self.heap.get(id), HeapObj::Class(_)) => id,
      _ => unreachable!("Expected a class object on the stack."),
    };

    let methods: Vec<(GcId, Value)> = self
      .heap
      .class(superclass)
      .methods
      .iter()
      .map(|(name, method)| (*name, *method))
      .collect();

    for (name, method) in methods {
      self.heap.class_mut(subclass).methods.insert(name, method);
    }

    // Pop the subclass; the superclass stays behind as the scoped
    // "super" binding.
    self.pop_stack();
    RuntimeResult::Continue
  }

  /// Executes the instruction to install the closure at the top of the
  /// stack as a method of the class right below it.
  fn op_define_method(&mut self) -> RuntimeResult {
    let name = self.read_name_operand();

    let method = self.peek_stack(0);
    let class = match self.peek_stack(1) {
      Value::Obj(id) if matches!(self.heap.get(id), HeapObj::Class(_)) => id,
      _ => unreachable!("Expected a class object on the stack."),
    };

    self.heap.class_mut(class).methods.insert(name, method);
    self.pop_stack();
    RuntimeResult::Continue
  }

  /// Executes the instruction to read a property off the instance at the
  /// top of the stack. Fields shadow methods; a method access produces a
  /// new bound method pinning the instance as its receiver.
  fn op_get_property(&mut self) -> RuntimeResult {
    let name = self.read_name_operand();

    let receiver = self.peek_stack(0);
    let instance = match receiver {
      Value::Obj(id) if matches!(self.heap.get(id), HeapObj::Instance(_)) => id,
      _ => {
        return RuntimeResult::Error {
          error: RuntimeErrorType::InstanceError,
          message: String::from("Only instances have properties."),
        }
      }
    };

    if let Some(field) = self.heap.instance(instance).fields.get(&name).copied() {
      self.pop_stack();
      return self.push_stack(field);
    }

    let class = self.heap.instance(instance).class;
    self.bind_method(class, name)
  }

  /// Executes the instruction to write a field of the instance right
  /// below the value at the top of the stack.
  fn op_set_property(&mut self) -> RuntimeResult {
    let name = self.read_name_operand();

    let instance = match self.peek_stack(1) {
      Value::Obj(id) if matches!(self.heap.get(id), HeapObj::Instance(_)) => id,
      _ => {
        return RuntimeResult::Error {
          error: RuntimeErrorType::InstanceError,
          message: String::from("Only instances have fields."),
        }
      }
    };

    let value = self.peek_stack(0);
    self.heap.instance_mut(instance).fields.insert(name, value);

    // Pop the value and the instance, then leave the value as the
    // assignment expression's result.
    let value = self.pop_stack();
    self.pop_stack();
    self.push_stack(value)
  }

  /// Executes the instruction to bind a superclass method to the
  /// receiver at the top of the stack. The superclass itself was loaded
  /// above the receiver and gets popped here.
  fn op_get_super(&mut self) -> RuntimeResult {
    let name = self.read_name_operand();

    let superclass = match self.pop_stack() {
      Value::Obj(id) if matches!(self.heap.get(id), HeapObj::Class(_)) => id,
      _ => unreachable!("Expected a class object on the stack."),
    };

    self.bind_method(superclass, name)
  }

  /// Wraps the named method of a class in a bound method whose receiver
  /// is the instance at the top of the stack, then replaces the instance
  /// with the binding.
  fn bind_method(&mut self, class: GcId, name: GcId) -> RuntimeResult {
    let method = match self.heap.class(class).methods.get(&name).copied() {
      Some(Value::Obj(method)) => method,
      Some(_) => unreachable!("Expected a closure in the method table."),
      None => {
        return RuntimeResult::Error {
          error: RuntimeErrorType::ReferenceError,
          message: format!("Undefined property '{}'.", self.heap.str_(name).text),
        }
      }
    };

    // The receiver stays on the stack across the allocation.
    let receiver = self.peek_stack(0);
    let bound = self.alloc(HeapObj::BoundMethod(BoundMethodObj { receiver, method }));

    self.pop_stack();
    self.push_stack(Value::Obj(bound))
  }

  /// Executes the fused property-access-and-call instruction. Fields
  /// shadow methods here too: when the accessed name is a field, the
  /// field's value is called instead of a method.
  fn op_invoke(&mut self) -> RuntimeResult {
    let name = self.read_name_operand();
    let arg_count = self.next_byte();

    let receiver = self.peek_stack(arg_count as usize);
    let instance = match receiver {
      Value::Obj(id) if matches!(self.heap.get(id), HeapObj::Instance(_)) => id,
      _ => {
        return RuntimeResult::Error {
          error: RuntimeErrorType::InstanceError,
          message: String::from("Only instances have methods."),
        }
      }
    };

    if let Some(field) = self.heap.instance(instance).fields.get(&name).copied() {
      let slot = self.stack.len() - arg_count as usize - 1;
      self.stack[slot] = field;
      return self.call_value(field, arg_count);
    }

    let class = self.heap.instance(instance).class;
    self.invoke_from_class(class, name, arg_count)
  }

  /// Executes the fused superclass-method-call instruction. The
  /// superclass sits at the top of the stack, above the arguments.
  fn op_super_invoke(&mut self) -> RuntimeResult {
    let name = self.read_name_operand();
    let arg_count = self.next_byte();

    let superclass = match self.pop_stack() {
      Value::Obj(id) if matches!(self.heap.get(id), HeapObj::Class(_)) => id,
      _ => unreachable!("Expected a class object on the stack."),
    };

    self.invoke_from_class(superclass, name, arg_count)
  }
}
