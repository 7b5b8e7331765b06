use crate::tests::{global, global_num, global_str, run, run_ok};
use crate::values::Value;
use crate::virtual_machine::InterpretResult;

#[test]
fn arithmetic_follows_precedence() {
  let vm = run_ok("var r = 1 + 2 * 3 - 8 / 2;");
  assert_eq!(global_num(&vm, "r"), 3.0);
}

#[test]
fn unary_negation_and_grouping() {
  let vm = run_ok("var r = -(1 + 2) * 3;");
  assert_eq!(global_num(&vm, "r"), -9.0);
}

#[test]
fn division_follows_ieee_semantics() {
  let vm = run_ok("var r = 1 / 0;");
  assert_eq!(global_num(&vm, "r"), f64::INFINITY);
}

#[test]
fn comparisons_produce_booleans() {
  let vm = run_ok("var r = (1 < 2) == (3 >= 3); var s = 2 <= 1;");
  assert_eq!(global(&vm, "r"), Some(Value::Bool(true)));
  assert_eq!(global(&vm, "s"), Some(Value::Bool(false)));
}

#[test]
fn equality_mixes_types_without_errors() {
  let vm = run_ok("var r = 1 == \"1\"; var s = nil == nil; var t = nil == false;");
  assert_eq!(global(&vm, "r"), Some(Value::Bool(false)));
  assert_eq!(global(&vm, "s"), Some(Value::Bool(true)));
  assert_eq!(global(&vm, "t"), Some(Value::Bool(false)));
}

#[test]
fn only_nil_and_false_are_falsy() {
  let src = "var r; if (nil) r = 1; else r = 2;\
             var s; if (0) s = 1; else s = 2;\
             var t; if (\"\") t = 1; else t = 2;";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "r"), 2.0);
  assert_eq!(global_num(&vm, "s"), 1.0);
  assert_eq!(global_num(&vm, "t"), 1.0);
}

#[test]
fn logic_operators_short_circuit() {
  // `missing()` would be a runtime error if either operand executed.
  let src = "var r = false and missing(); var s = true or missing();";
  let vm = run_ok(src);

  assert_eq!(global(&vm, "r"), Some(Value::Bool(false)));
  assert_eq!(global(&vm, "s"), Some(Value::Bool(true)));
}

#[test]
fn global_declaration_round_trips() {
  let vm = run_ok("var x = 42; var y = x;");
  assert_eq!(global_num(&vm, "y"), 42.0);
}

#[test]
fn global_reassignment_keeps_the_latest_value() {
  let vm = run_ok("var x = 1; x = 2; var y = x = 3;");
  assert_eq!(global_num(&vm, "x"), 3.0);
  assert_eq!(global_num(&vm, "y"), 3.0);
}

#[test]
fn uninitialized_globals_default_to_nil() {
  let vm = run_ok("var x;");
  assert_eq!(global(&vm, "x"), Some(Value::Nil));
}

#[test]
fn local_variables_resolve_by_stack_slot() {
  let src = "var r; { var a = 10; var b = 20; { var c = a + b; r = c; } }";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "r"), 30.0);
}

#[test]
fn string_concatenation_produces_interned_strings() {
  let vm = run_ok("var a = \"foo\" + \"bar\"; var b = \"foobar\"; var r = a == b;");

  assert_eq!(global(&vm, "r"), Some(Value::Bool(true)));
  assert_eq!(global_str(&vm, "a"), "foobar");

  // Interning makes equal contents share one heap object.
  assert_eq!(global(&vm, "a"), global(&vm, "b"));
}

#[test]
fn while_loops_run_to_completion() {
  let src = "var sum = 0; var i = 0; while (i < 10) { sum = sum + i; i = i + 1; }";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "sum"), 45.0);
}

#[test]
fn for_loops_run_their_clauses() {
  let src = "var sum = 0; for (var i = 0; i < 10; i = i + 1) { sum = sum + i; }";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "sum"), 45.0);
}

#[test]
fn for_loops_without_clauses_still_terminate() {
  let src = "var i = 0; for (;;) { i = i + 1; if (i == 3) { i = 100; } if (i > 10) { r(); } }";
  // The call to the undefined `r` breaks out of the infinite loop by
  // erroring, proving the body kept running.
  let (vm, result) = run(src);

  assert_eq!(result, InterpretResult::RuntimeError);
  assert_eq!(global_num(&vm, "i"), 100.0);
}

#[test]
fn functions_return_values() {
  let src = "fun add(a, b) { return a + b; } var r = add(3, 4);";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "r"), 7.0);
}

#[test]
fn functions_without_return_yield_nil() {
  let src = "fun noop() {} var r = noop();";
  let vm = run_ok(src);

  assert_eq!(global(&vm, "r"), Some(Value::Nil));
}

#[test]
fn recursion_works_through_globals() {
  let src = "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } var r = fib(10);";
  let vm = run_ok(src);

  assert_eq!(global_num(&vm, "r"), 55.0);
}

#[test]
fn clock_native_returns_a_number() {
  let vm = run_ok("var t = clock();");
  assert!(global_num(&vm, "t") > 0.0);
}

#[test]
fn successful_runs_leave_the_stacks_empty() {
  let vm = run_ok("fun f(n) { return n * 2; } var r = f(2) + f(3);");

  assert!(vm.stack.is_empty());
  assert!(vm.frames.is_empty());
  assert!(vm.open_up_vals.is_empty());
}

#[test]
fn undefined_variable_read_is_a_runtime_error() {
  let (_, result) = run("print missing;");
  assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn undefined_variable_assignment_is_a_runtime_error() {
  let (_, result) = run("missing = 1;");
  assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn adding_a_number_to_a_string_is_a_runtime_error() {
  let (vm, result) = run("var a = 1 + 2; var b = 1 + \"a\";");

  assert_eq!(result, InterpretResult::RuntimeError);
  assert_eq!(global_num(&vm, "a"), 3.0);
  // The error unwound the whole stack.
  assert!(vm.stack.is_empty());
  assert!(vm.frames.is_empty());
}

#[test]
fn arithmetic_on_non_numbers_is_a_runtime_error() {
  assert_eq!(run("var r = true - 1;").1, InterpretResult::RuntimeError);
  assert_eq!(run("var r = nil * 2;").1, InterpretResult::RuntimeError);
  assert_eq!(run("var r = -\"a\";").1, InterpretResult::RuntimeError);
  assert_eq!(run("var r = \"a\" < \"b\";").1, InterpretResult::RuntimeError);
}

#[test]
fn calling_a_non_callable_is_a_runtime_error() {
  let (_, result) = run("var x = 1; x();");
  assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn arity_mismatch_is_a_runtime_error() {
  let (_, result) = run("fun f(a, b) { return a; } f(1);");
  assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn native_arity_is_checked() {
  let (_, result) = run("clock(1);");
  assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn runaway_recursion_overflows_the_frame_stack() {
  let (_, result) = run("fun f() { f(); } f();");
  assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn print_consumes_its_value() {
  let vm = run_ok("print 1 + 2; print \"done\";");
  assert!(vm.stack.is_empty());
}
