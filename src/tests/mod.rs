use crate::values::Value;
use crate::virtual_machine::{InterpretResult, Vm};

mod classes;
mod closures;
mod compiler;
mod memory;
mod vm;

/// Interprets a source string in a fresh virtual machine.
fn run(src: &str) -> (Vm, InterpretResult) {
  let mut vm = Vm::new();
  let result = vm.interpret(src);
  (vm, result)
}

/// Interprets a source string and asserts that it ran to completion.
fn run_ok(src: &str) -> Vm {
  let (vm, result) = run(src);
  assert_eq!(result, InterpretResult::Ok);
  vm
}

/// Reads a global variable's value out of a virtual machine.
fn global(vm: &Vm, name: &str) -> Option<Value> {
  let id = vm.heap.find_string(name)?;
  vm.globals.get(&id).copied()
}

/// Reads a global variable expected to hold a number.
fn global_num(vm: &Vm, name: &str) -> f64 {
  match global(vm, name) {
    Some(Value::Num(num)) => num,
    other => panic!("Expected a numeric global '{}', got {:?}.", name, other),
  }
}

/// Reads a global variable expected to hold a string, resolving its contents.
fn global_str(vm: &Vm, name: &str) -> String {
  match global(vm, name) {
    Some(Value::Obj(id)) => vm.heap.str_(id).text.clone(),
    other => panic!("Expected a string global '{}', got {:?}.", name, other),
  }
}
