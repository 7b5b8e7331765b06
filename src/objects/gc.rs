use crate::objects::class_obj::{ClassObj, InstanceObj};
use crate::objects::{ClosureObj, FuncObj, HeapObj, NativeObj, StrObj, UpVal};
use crate::values::Value;
use hashbrown::HashMap;
use std::hash::{BuildHasherDefault, Hasher};
use std::mem;

/// The collection threshold of a freshly created heap, in bytes.
const INITIAL_GC_THRESHOLD: usize = 1024 * 1024;
/// The growth factor applied to the collection threshold after each cycle.
const HEAP_GROW_FACTOR: usize = 2;

/// The identifier of an object in the heap.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub struct GcId(pub usize);

/// An object stored in the heap, along with its collection header.
pub struct HeapVal {
  pub obj: HeapObj,
  /// Whether the object has been reached during the current mark phase.
  marked: bool,
  /// The object's size estimate, recorded when the object was allocated.
  size: usize,
}

/// A 32-bit FNV-1a hasher. Interned strings cache this hash of their
/// contents, and the intern table itself hashes its keys with it.
pub struct FnvHasher(u32);

impl Default for FnvHasher {
  fn default() -> Self {
    FnvHasher(2166136261)
  }
}

impl Hasher for FnvHasher {
  fn finish(&self) -> u64 {
    self.0 as u64
  }

  fn write(&mut self, bytes: &[u8]) {
    for byte in bytes {
      self.0 ^= *byte as u32;
      self.0 = self.0.wrapping_mul(16777619);
    }
  }
}

/// Computes the 32-bit FNV-1a hash of a string's contents.
pub fn hash_string(text: &str) -> u32 {
  let mut hasher = FnvHasher::default();
  hasher.write(text.as_bytes());
  hasher.0
}

/// The heap. Stores every runtime-allocated object, hands out `GcId`
/// handles, and reclaims unreachable objects with a tri-color
/// mark-sweep collector. Freed slots become tombstones that later
/// allocations reuse.
pub struct Heap {
  objects: Vec<Option<HeapVal>>,
  tombstones: Vec<usize>,
  /// The interned-string table. Entries are weak: the table never keeps
  /// a string alive on its own, and dead entries are purged between the
  /// mark and sweep phases of a collection.
  strings: HashMap<String, GcId, BuildHasherDefault<FnvHasher>>,
  /// The gray worklist of the current mark phase. Lives outside the
  /// managed arena.
  gray_stack: Vec<GcId>,
  bytes_allocated: usize,
  next_gc: usize,
}

impl Default for Heap {
  fn default() -> Self {
    Self::new()
  }
}

impl Heap {
  /// Creates a new, empty heap.
  pub fn new() -> Self {
    Self {
      objects: vec![],
      tombstones: vec![],
      strings: HashMap::default(),
      gray_stack: vec![],
      bytes_allocated: 0,
      next_gc: INITIAL_GC_THRESHOLD,
    }
  }

  /// Pushes a new object into the heap.
  ///
  /// # Parameters
  /// - `obj`: The new object to add to the heap.
  ///
  /// # Returns
  /// `GcId`: The id of the newly allocated object.
  pub fn allocate(&mut self, obj: HeapObj) -> GcId {
    let size = size_of_obj(&obj);
    self.bytes_allocated += size;

    let val = HeapVal {
      obj,
      marked: false,
      size,
    };

    if let Some(idx) = self.tombstones.pop() {
      self.objects[idx] = Some(val);
      GcId(idx)
    } else {
      self.objects.push(Some(val));
      GcId(self.objects.len() - 1)
    }
  }

  /// Gets the interned string object for the given contents, allocating
  /// it first if no string with these contents is currently alive.
  ///
  /// # Parameters
  /// - `text`: The contents of the string.
  ///
  /// # Returns
  /// `GcId`: The id of the single live string object with these contents.
  pub fn intern(&mut self, text: String) -> GcId {
    if let Some(&id) = self.strings.get(&text) {
      return id;
    }

    let hash = hash_string(&text);
    let id = self.allocate(HeapObj::Str(StrObj {
      text: text.clone(),
      hash,
    }));

    self.strings.insert(text, id);
    id
  }

  /// Looks up the id of the interned string with the given contents,
  /// without allocating.
  pub fn find_string(&self, text: &str) -> Option<GcId> {
    self.strings.get(text).copied()
  }

  /// Checks whether enough bytes have been allocated since the last
  /// collection cycle for a new cycle to be due.
  pub fn should_collect(&self) -> bool {
    if cfg!(feature = "stress_gc") {
      return true;
    }

    self.bytes_allocated > self.next_gc
  }

  /// Gets a reference to the object associated with the given `GcId`.
  pub fn get(&self, id: GcId) -> &HeapObj {
    match &self.objects[id.0] {
      Some(val) => &val.obj,
      None => unreachable!("Heap id '{}' points to a freed object.", id.0),
    }
  }

  /// Gets a mutable reference to the object associated with the given `GcId`.
  pub fn get_mut(&mut self, id: GcId) -> &mut HeapObj {
    match &mut self.objects[id.0] {
      Some(val) => &mut val.obj,
      None => unreachable!("Heap id '{}' points to a freed object.", id.0),
    }
  }

  /// Gets the `StrObj` stored under the given id.
  pub fn str_(&self, id: GcId) -> &StrObj {
    match self.get(id) {
      HeapObj::Str(obj) => obj,
      _ => unreachable!("Expected a string object."),
    }
  }

  /// Gets the `FuncObj` stored under the given id.
  pub fn func(&self, id: GcId) -> &FuncObj {
    match self.get(id) {
      HeapObj::Func(obj) => obj,
      _ => unreachable!("Expected a function object."),
    }
  }

  /// Gets the `NativeObj` stored under the given id.
  pub fn native(&self, id: GcId) -> &NativeObj {
    match self.get(id) {
      HeapObj::Native(obj) => obj,
      _ => unreachable!("Expected a native function object."),
    }
  }

  /// Gets the `ClosureObj` stored under the given id.
  pub fn closure(&self, id: GcId) -> &ClosureObj {
    match self.get(id) {
      HeapObj::Closure(obj) => obj,
      _ => unreachable!("Expected a closure object."),
    }
  }

  /// Gets a mutable reference to the `ClosureObj` stored under the given id.
  pub fn closure_mut(&mut self, id: GcId) -> &mut ClosureObj {
    match self.get_mut(id) {
      HeapObj::Closure(obj) => obj,
      _ => unreachable!("Expected a closure object."),
    }
  }

  /// Gets the `ClassObj` stored under the given id.
  pub fn class(&self, id: GcId) -> &ClassObj {
    match self.get(id) {
      HeapObj::Class(obj) => obj,
      _ => unreachable!("Expected a class object."),
    }
  }

  /// Gets a mutable reference to the `ClassObj` stored under the given id.
  pub fn class_mut(&mut self, id: GcId) -> &mut ClassObj {
    match self.get_mut(id) {
      HeapObj::Class(obj) => obj,
      _ => unreachable!("Expected a class object."),
    }
  }

  /// Gets the `InstanceObj` stored under the given id.
  pub fn instance(&self, id: GcId) -> &InstanceObj {
    match self.get(id) {
      HeapObj::Instance(obj) => obj,
      _ => unreachable!("Expected an instance object."),
    }
  }

  /// Gets a mutable reference to the `InstanceObj` stored under the given id.
  pub fn instance_mut(&mut self, id: GcId) -> &mut InstanceObj {
    match self.get_mut(id) {
      HeapObj::Instance(obj) => obj,
      _ => unreachable!("Expected an instance object."),
    }
  }

  /// Gets the `UpVal` cell stored under the given id.
  pub fn up_val(&self, id: GcId) -> &UpVal {
    match self.get(id) {
      HeapObj::UpVal(obj) => obj,
      _ => unreachable!("Expected an up value cell."),
    }
  }

  /// Gets a mutable reference to the `UpVal` cell stored under the given id.
  pub fn up_val_mut(&mut self, id: GcId) -> &mut UpVal {
    match self.get_mut(id) {
      HeapObj::UpVal(obj) => obj,
      _ => unreachable!("Expected an up value cell."),
    }
  }

  /// Marks the object behind a value, if the value holds one.
  pub fn mark_value(&mut self, val: Value) {
    if let Value::Obj(id) = val {
      self.mark_object(id);
    }
  }

  /// Marks an object as reachable and schedules it for tracing.
  /// Already-marked objects are left alone, so object cycles are
  /// traced exactly once.
  pub fn mark_object(&mut self, id: GcId) {
    let val = match &mut self.objects[id.0] {
      Some(val) => val,
      None => unreachable!("Cannot mark a freed object."),
    };

    if val.marked {
      return;
    }

    val.marked = true;
    self.gray_stack.push(id);
  }

  /// Traces the references of every gray object until the worklist
  /// drains, turning each processed object black.
  pub fn trace_references(&mut self) {
    while let Some(id) = self.gray_stack.pop() {
      self.blacken(id);
    }
  }

  /// Marks every object directly referenced by the given object.
  fn blacken(&mut self, id: GcId) {
    let mut children: Vec<Value> = vec![];

    match self.get(id) {
      HeapObj::Str(_) | HeapObj::Native(_) => {}
      HeapObj::Func(f) => {
        if let Some(name) = f.name {
          children.push(Value::Obj(name));
        }
        children.extend_from_slice(f.chunk.constants());
      }
      HeapObj::Closure(c) => {
        children.push(Value::Obj(c.function));
        children.extend(c.up_values.iter().map(|u| Value::Obj(*u)));
      }
      HeapObj::UpVal(UpVal::Open(_)) => {}
      HeapObj::UpVal(UpVal::Closed(val)) => children.push(*val),
      HeapObj::Class(c) => {
        children.push(Value::Obj(c.name));
        for (name, method) in &c.methods {
          children.push(Value::Obj(*name));
          children.push(*method);
        }
      }
      HeapObj::Instance(i) => {
        children.push(Value::Obj(i.class));
        for (name, field) in &i.fields {
          children.push(Value::Obj(*name));
          children.push(*field);
        }
      }
      HeapObj::BoundMethod(b) => {
        children.push(b.receiver);
        children.push(Value::Obj(b.method));
      }
    }

    for child in children {
      self.mark_value(child);
    }
  }

  /// Purges intern-table entries whose string object did not get marked
  /// during the current cycle. Must run after the mark phase and before
  /// the sweep, while the mark bits still distinguish live strings from
  /// garbage ones.
  pub fn remove_white_strings(&mut self) {
    let objects = &self.objects;
    self
      .strings
      .retain(|_, id| objects[id.0].as_ref().map_or(false, |val| val.marked));
  }

  /// Frees every unmarked object, turning its slot into a tombstone,
  /// and clears the mark bit of every survivor for the next cycle.
  pub fn sweep(&mut self) {
    for idx in 0..self.objects.len() {
      let freed_size = match &mut self.objects[idx] {
        Some(val) if val.marked => {
          val.marked = false;
          None
        }
        Some(val) => Some(val.size),
        None => None,
      };

      if let Some(size) = freed_size {
        self.bytes_allocated -= size;
        self.objects[idx] = None;
        self.tombstones.push(idx);
      }
    }

    self.next_gc = self.bytes_allocated * HEAP_GROW_FACTOR;
  }

  /// The number of live objects currently in the heap.
  pub fn live_count(&self) -> usize {
    self.objects.len() - self.tombstones.len()
  }

  /// The number of bytes the heap believes are currently allocated.
  pub fn bytes_allocated(&self) -> usize {
    self.bytes_allocated
  }

  /// The number of entries currently in the interned-string table.
  pub fn interned_count(&self) -> usize {
    self.strings.len()
  }

  /// Checks whether the given id refers to a live object.
  pub fn is_live(&self, id: GcId) -> bool {
    id.0 < self.objects.len() && self.objects[id.0].is_some()
  }
}

/// Estimates the size, in bytes, that an object occupies on the heap.
/// Sizes are recorded once, at allocation time.
fn size_of_obj(obj: &HeapObj) -> usize {
  let base = mem::size_of::<HeapVal>();

  base
    + match obj {
      HeapObj::Str(s) => s.text.capacity(),
      HeapObj::Func(f) => {
        f.chunk.len() * (mem::size_of::<u8>() + mem::size_of::<usize>())
          + f.chunk.get_pool_size() * mem::size_of::<Value>()
      }
      HeapObj::Native(_) => 0,
      HeapObj::Closure(c) => c.up_values.capacity() * mem::size_of::<GcId>(),
      HeapObj::UpVal(_) => 0,
      HeapObj::Class(_) => mem::size_of::<ClassObj>(),
      HeapObj::Instance(_) => mem::size_of::<InstanceObj>(),
      HeapObj::BoundMethod(_) => 0,
    }
}
