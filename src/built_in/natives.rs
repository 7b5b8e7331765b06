use crate::built_in::NativeFn;
use crate::errors::RuntimeErrorType;
use crate::objects::NativeObj;
use crate::values::Value;
use crate::virtual_machine::{RuntimeResult, Vm};
use hashbrown::{hash_map, HashMap};
use std::time::SystemTime;

/// Represents the list of native functions available through a Rook program.
pub struct Natives(pub(crate) HashMap<String, NativeObj>);

/// The default implementation of a native function list.
impl Default for Natives {
  fn default() -> Self {
    let mut natives = Natives(Default::default());

    // >>>>>>>>>>>>>>>> Native functions to be added after this line
    natives.add_native_function("clock", 0, native_clock as NativeFn);
    // <<<<<<<<<<<<<<<< Native functions to be added before this line

    natives
  }
}

impl Natives {
  /// Adds a native function definition to the native functions list.
  fn add_native_function(&mut self, name: &str, arity: u8, body: NativeFn) {
    let name = String::from(name);

    if let hash_map::Entry::Vacant(e) = self.0.entry(name.clone()) {
      let f = NativeObj { name, arity, body };

      e.insert(f);
    } else {
      panic!("Cannot duplicate native function '{}'.", name);
    }
  }
}

// >>>>>>>>>>>>>>>>> =============================================== <<<<<<<<<<<<<<<<<<<
// ================= Native Function Implementations After This Line ===================
// >>>>>>>>>>>>>>>>> =============================================== <<<<<<<<<<<<<<<<<<<

/// Implements the `clock()` native function for Rook, which retrieves the
/// number of seconds elapsed since the Unix epoch.
///
/// # Arguments
/// * `vm`: A mutable reference to the virtual machine.
/// * `args`: A vector of values that will serve as arguments to this function call.
///
/// # Returns:
/// RuntimeResult
fn native_clock(vm: &mut Vm, _: Vec<Value>) -> RuntimeResult {
  let now = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH);

  match now {
    Ok(t) => vm.push_stack(Value::Num(t.as_secs_f64())),
    Err(_) => RuntimeResult::Error {
      error: RuntimeErrorType::ReferenceError,
      message: String::from("System's time before UNIX EPOCH."),
    },
  }
}
