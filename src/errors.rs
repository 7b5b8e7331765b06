use crate::virtual_machine::Vm;

/// The types of errors a Rook program can produce at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorType {
  ArgumentError,
  InstanceError,
  RecursionError,
  ReferenceError,
  TypeError,
}

/// Throws a runtime error to the console, together with a stack trace
/// of the call frames that were active when the error was generated.
///
/// # Parameters
/// - `vm`: A reference to the virtual machine.
/// - `error`: The generated error.
/// - `message`: The error message to be displayed.
pub fn report_runtime_error(vm: &Vm, _error: RuntimeErrorType, message: &str) {
  eprintln!("{}", message);

  for frame in vm.frames_stack().iter().rev() {
    let function = vm.heap().func(frame.function);
    let line = function.chunk.get_line(frame.ip.saturating_sub(1));

    match function.name {
      Some(name) => eprintln!("[line {}] in {}()", line, vm.heap().str_(name).text),
      None => eprintln!("[line {}] in script", line),
    }
  }
}
