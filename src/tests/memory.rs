use crate::objects::gc::{hash_string, Heap};
use crate::objects::HeapObj;
use crate::tests::{global, global_str, run_ok};
use crate::values::Value;

#[test]
fn interning_reuses_live_strings() {
  let mut heap = Heap::new();

  let a = heap.intern(String::from("rook"));
  let b = heap.intern(String::from("rook"));
  let c = heap.intern(String::from("crow"));

  assert_eq!(a, b);
  assert_ne!(a, c);
  assert_eq!(heap.str_(a).text, "rook");
}

#[test]
fn string_hashes_are_fnv1a() {
  // The FNV-1a offset basis, for the empty string.
  assert_eq!(hash_string(""), 2166136261);
  assert_eq!(hash_string("a"), hash_string("a"));
  assert_ne!(hash_string("a"), hash_string("b"));

  let mut heap = Heap::new();
  let id = heap.intern(String::from("rook"));
  assert_eq!(heap.str_(id).hash, hash_string("rook"));
}

#[test]
fn allocation_pressure_triggers_collection() {
  // Every iteration allocates an instance that immediately becomes
  // garbage. The loop allocates well past the initial collection
  // threshold, so most of these must have been swept by the end.
  let src = "class A {}\
             var i = 0;\
             while (i < 100000) { var a = A(); i = i + 1; }";
  let vm = run_ok(src);

  assert!(vm.heap.live_count() < 1000);
}

#[test]
fn reachable_objects_survive_collection() {
  let src = "class P { init(x) { this.x = x; } }\
             fun make() { return P(42); }\
             var p = make();\
             var s = \"keep\" + \"er\";";
  let mut vm = run_ok(src);

  vm.collect_garbage();

  let p = match global(&vm, "p") {
    Some(Value::Obj(id)) => id,
    other => panic!("Expected an instance, got {:?}.", other),
  };

  assert!(vm.heap.is_live(p));
  assert!(matches!(vm.heap.get(p), HeapObj::Instance(_)));
  assert_eq!(global_str(&vm, "s"), "keeper");

  // The program state is still usable after the cycle.
  let result = vm.interpret("var r = p.x;");
  assert_eq!(result, crate::virtual_machine::InterpretResult::Ok);
  assert_eq!(crate::tests::global_num(&vm, "r"), 42.0);
}

#[test]
fn dead_intern_entries_are_purged() {
  // Each iteration interns a brand new, longer string; only the final
  // one stays reachable through the global.
  let src = "var s = \"\";\
             var i = 0;\
             while (i < 50) { s = s + \"x\"; i = i + 1; }";
  let mut vm = run_ok(src);

  vm.collect_garbage();

  assert!(vm.heap.find_string(&"x".repeat(50)).is_some());
  assert!(vm.heap.find_string(&"x".repeat(49)).is_none());
}

#[test]
fn collection_reclaims_accounted_bytes() {
  let src = "class A {}\
             var i = 0;\
             while (i < 100000) { var a = A(); i = i + 1; }";
  let mut vm = run_ok(src);

  vm.collect_garbage();

  // Only the program's skeleton survives: classes, functions, names.
  assert!(vm.heap.bytes_allocated() < 1024 * 1024);
}

#[test]
fn closed_cells_keep_captured_values_alive() {
  let src = "var f;\
             fun outer() {\
               var secret = \"hidden\" + \" value\";\
               fun inner() { return secret; }\
               f = inner;\
             }\
             outer();";
  let mut vm = run_ok(src);

  vm.collect_garbage();

  // The captured string is only reachable through the closure's cell.
  assert!(vm.heap.find_string("hidden value").is_some());

  let result = vm.interpret("var r = f();");
  assert_eq!(result, crate::virtual_machine::InterpretResult::Ok);
  assert_eq!(global_str(&vm, "r"), "hidden value");
}
