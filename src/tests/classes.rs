use crate::objects::HeapObj;
use crate::tests::{global, global_num, global_str, run, run_ok};
use crate::values::Value;
use crate::virtual_machine::InterpretResult;

#[test]
fn classes_construct_instances() {
  let vm = run_ok("class A {} var a = A();");

  match global(&vm, "a") {
    Some(Value::Obj(id)) => assert!(matches!(vm.heap.get(id), HeapObj::Instance(_))),
    other => panic!("Expected an instance, got {:?}.", other),
  }
}

#[test]
fn fields_shadow_methods() {
  let src = "class A { greet() { return \"method\"; } }\
             var a = A();\
             var r1 = a.greet();\
             a.greet = \"field\";\
             var r2 = a.greet;";
  let vm = run_ok(src);

  assert_eq!(global_str(&vm, "r1"), "method");
  assert_eq!(global_str(&vm, "r2"), "field");
}

#[test]
fn super_dispatches_to_the_parent_method() {
  let src = "var log = \"\";\
             class A { say() { log = log + \"A\"; } }\
             class B < A { say() { super.say(); log = log + \"B\"; } }\
             B().say();";
  let vm = run_ok(src);

  assert_eq!(global_str(&vm, "log"), "AB");
}

#[test]
fn initializers_bind_and_return_the_receiver() {
  let src = "class P { init(x) { this.x = x; } }\
             var p = P(42);\
             var r = p.x;";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "r"), 42.0);
}

#[test]
fn bare_return_in_an_initializer_still_yields_the_instance() {
  let src = "class P { init(x) { this.x = x; return; } }\
             var p = P(7);\
             var r = p.x;";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "r"), 7.0);

  match global(&vm, "p") {
    Some(Value::Obj(id)) => assert!(matches!(vm.heap.get(id), HeapObj::Instance(_))),
    other => panic!("Expected an instance, got {:?}.", other),
  }
}

#[test]
fn subclasses_inherit_the_parent_initializer() {
  let src = "class A { init(x) { this.x = x; } }\
             class B < A {}\
             var b = B(9);\
             var r = b.x;";
  let vm = run_ok(src);

  // The method-table copy at inheritance time includes `init`, so the
  // parent's arity applies when constructing the subclass.
  assert_eq!(global_num(&vm, "r"), 9.0);
}

#[test]
fn subclass_methods_override_inherited_ones() {
  let src = "class A { m() { return 1; } }\
             class B < A { m() { return 2; } }\
             var r = B().m();\
             var s = A().m();";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "r"), 2.0);
  assert_eq!(global_num(&vm, "s"), 1.0);
}

#[test]
fn method_invocations_are_fused_calls() {
  let src = "class C { m(a, b) { return a + b; } }\
             var r = C().m(3, 4);";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "r"), 7.0);
}

#[test]
fn callable_fields_can_be_invoked() {
  let src = "fun nine() { return 9; }\
             class C {}\
             var c = C();\
             c.f = nine;\
             var r = c.f();";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "r"), 9.0);
}

#[test]
fn bound_methods_pin_their_receiver() {
  let src = "class C { init() { this.v = 5; } get() { return this.v; } }\
             var m = C().get;\
             var r = m();";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "r"), 5.0);
}

#[test]
fn methods_see_fields_written_by_other_methods() {
  let src = "class Counter {\
               init() { this.n = 0; }\
               bump() { this.n = this.n + 1; }\
               read() { return this.n; }\
             }\
             var c = Counter();\
             c.bump(); c.bump();\
             var r = c.read();";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "r"), 2.0);
}

#[test]
fn field_assignment_evaluates_to_the_value() {
  let src = "class C {}\
             var c = C();\
             var r = c.f = 3;";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "r"), 3.0);
}

#[test]
fn constructing_with_arguments_but_no_initializer_is_an_error() {
  let (_, result) = run("class C {} C(1);");
  assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn property_access_on_non_instances_is_an_error() {
  assert_eq!(run("var x = 1; x.y;").1, InterpretResult::RuntimeError);
  assert_eq!(run("var x = 1; x.y = 2;").1, InterpretResult::RuntimeError);
  assert_eq!(run("var x = 1; x.y();").1, InterpretResult::RuntimeError);
}

#[test]
fn undefined_properties_are_errors() {
  assert_eq!(run("class C {} C().missing;").1, InterpretResult::RuntimeError);
  assert_eq!(run("class C {} C().missing();").1, InterpretResult::RuntimeError);
}

#[test]
fn inheriting_from_a_non_class_is_an_error() {
  let (_, result) = run("var NotAClass = 1; class C < NotAClass {}");
  assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn instances_track_their_class() {
  let src = "class A { kind() { return \"a\"; } }\
             class B < A { kind() { return \"b\"; } }\
             var r = A().kind() + B().kind();";
  let vm = run_ok(src);

  assert_eq!(global_str(&vm, "r"), "ab");
}
