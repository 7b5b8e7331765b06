use crate::objects::gc::GcId;
use crate::values::Value;
use hashbrown::HashMap;

/// Represents a Rook class object. The method table maps interned
/// method-name strings to the closures that implement them.
pub struct ClassObj {
  pub name: GcId,
  pub methods: HashMap<GcId, Value>,
}

impl ClassObj {
  /// Creates an empty class object with the given (interned) name.
  pub fn new(name: GcId) -> Self {
    Self {
      name,
      methods: HashMap::new(),
    }
  }
}

/// Represents a Rook instance object. The field table maps interned
/// field-name strings to the fields' current values.
pub struct InstanceObj {
  pub class: GcId,
  pub fields: HashMap<GcId, Value>,
}

impl InstanceObj {
  /// Creates an instance of the given class with no fields set.
  pub fn new(class: GcId) -> Self {
    Self {
      class,
      fields: HashMap::new(),
    }
  }
}

/// Represents a Rook bound method: a method closure pinned to the
/// instance it was accessed through.
pub struct BoundMethodObj {
  pub receiver: Value,
  pub method: GcId,
}
