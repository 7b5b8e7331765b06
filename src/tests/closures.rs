use crate::tests::{global, global_num, run_ok};
use crate::values::Value;

#[test]
fn counters_keep_their_own_state() {
  let src = "fun makeCounter() {\
               var n = 0;\
               fun count() { n = n + 1; return n; }\
               return count;\
             }\
             var c = makeCounter();\
             var r1 = c();\
             var r2 = c();\
             var r3 = c();";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "r1"), 1.0);
  assert_eq!(global_num(&vm, "r2"), 2.0);
  assert_eq!(global_num(&vm, "r3"), 3.0);
}

#[test]
fn separate_closures_get_separate_cells() {
  let src = "fun makeCounter() {\
               var n = 0;\
               fun count() { n = n + 1; return n; }\
               return count;\
             }\
             var c1 = makeCounter();\
             var c2 = makeCounter();\
             c1(); c1();\
             var r = c2();";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "r"), 1.0);
}

#[test]
fn closures_over_the_same_variable_share_one_cell() {
  let src = "var get; var set;\
             fun outer() {\
               var x = 1;\
               fun g() { return x; }\
               fun s(v) { x = v; }\
               get = g;\
               set = s;\
             }\
             outer();\
             set(42);\
             var r = get();";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "r"), 42.0);
}

#[test]
fn captures_reach_through_intermediate_functions() {
  let src = "fun a() {\
               var x = 10;\
               fun b() {\
                 fun c() { return x; }\
                 return c;\
               }\
               return b;\
             }\
             var r = a()()();";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "r"), 10.0);
}

#[test]
fn locals_captured_in_a_block_survive_the_block() {
  let src = "var f;\
             {\
               var x = 5;\
               fun g() { return x; }\
               f = g;\
             }\
             var r = f();";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "r"), 5.0);
}

#[test]
fn captured_loop_variable_reflects_later_writes() {
  let src = "var f;\
             fun outer() {\
               var x = 1;\
               fun inner() { return x; }\
               f = inner;\
               x = 2;\
             }\
             outer();\
             var r = f();";
  let vm = run_ok(src);

  // The closure reads through the shared cell, not a copy taken at
  // capture time.
  assert_eq!(global_num(&vm, "r"), 2.0);
}

#[test]
fn open_up_value_list_drains_after_the_run() {
  let src = "fun outer() {\
               var x = 3;\
               fun inner() { return x; }\
               return inner();\
             }\
             var r = outer();";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "r"), 3.0);
  assert!(vm.open_up_vals.is_empty());
}

#[test]
fn closures_can_capture_parameters() {
  let src = "fun adder(n) {\
               fun add(m) { return n + m; }\
               return add;\
             }\
             var add5 = adder(5);\
             var r = add5(3);";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "r"), 8.0);
}

#[test]
fn closures_are_first_class_values() {
  let src = "fun id(f) { return f; }\
             fun three() { return 3; }\
             var g = id(three);\
             var r = g();";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "r"), 3.0);
  assert!(matches!(global(&vm, "g"), Some(Value::Obj(_))));
}
