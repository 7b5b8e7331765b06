use crate::bytecode::OpCode;
use crate::compiler::Compiler;
use crate::objects::gc::{GcId, Heap};
use crate::virtual_machine::InterpretResult;

/// Compiles a source string with a fresh heap, returning the heap and
/// the id of the compiled script function.
fn compile(src: &str) -> Result<(Heap, GcId), InterpretResult> {
  let mut heap = Heap::new();

  match Compiler::compile(src, &mut heap) {
    Ok(script) => Ok((heap, script)),
    Err(result) => Err(result),
  }
}

/// Collects the raw instruction bytes of a compiled script.
fn script_bytes(heap: &Heap, script: GcId) -> Vec<u8> {
  let chunk = &heap.func(script).chunk;
  (0..chunk.len()).map(|idx| chunk.get_byte(idx)).collect()
}

#[test]
fn script_function_has_no_arity() {
  let (heap, script) = compile("").expect("Compiler had errors.");
  let func = heap.func(script);

  assert_eq!(func.arity, 0);
  assert_eq!(func.up_val_count, 0);
  assert!(func.name.is_none());
}

#[test]
fn empty_script_returns_nil() {
  let (heap, script) = compile("").expect("Compiler had errors.");

  assert_eq!(
    script_bytes(&heap, script),
    vec![OpCode::LoadImmNull as u8, OpCode::Return as u8]
  );
}

#[test]
fn expression_statements_pop_their_value() {
  let (heap, script) = compile("1 + 2;").expect("Compiler had errors.");

  assert_eq!(
    script_bytes(&heap, script),
    vec![
      OpCode::LoadConstant as u8,
      0,
      OpCode::LoadConstant as u8,
      1,
      OpCode::Add as u8,
      OpCode::PopStack as u8,
      OpCode::LoadImmNull as u8,
      OpCode::Return as u8,
    ]
  );
}

#[test]
fn function_declarations_wrap_the_function_in_a_closure() {
  let (heap, script) = compile("fun f() {}").expect("Compiler had errors.");

  // Constant 0 is the function's name, constant 1 the function itself.
  assert_eq!(
    script_bytes(&heap, script),
    vec![
      OpCode::MakeClosure as u8,
      1,
      OpCode::DefineGlobal as u8,
      0,
      OpCode::LoadImmNull as u8,
      OpCode::Return as u8,
    ]
  );
}

#[test]
fn constant_pool_has_no_duplicate_items() {
  let src = "8.9;".repeat(500);
  let (heap, script) = compile(src.as_str()).expect("Compiler had errors.");

  assert_eq!(heap.func(script).chunk.get_pool_size(), 1);
}

#[test]
fn constant_pool_overflow_is_an_error() {
  let src: String = (0..300).map(|n| format!("{};", n)).collect();

  assert!(matches!(
    compile(src.as_str()),
    Err(InterpretResult::CompileError)
  ));
}

#[test]
fn duplicate_local_declaration_is_an_error() {
  let src = "{ var a = 1; var a = 2; }";

  assert!(compile(src).is_err());
}

#[test]
fn shadowing_in_an_inner_scope_is_allowed() {
  let src = "{ var a = 1; { var a = 2; } }";

  assert!(compile(src).is_ok());
}

#[test]
fn reading_a_local_in_its_own_initializer_is_an_error() {
  let src = "{ var a = a; }";

  assert!(compile(src).is_err());
}

#[test]
fn invalid_assignment_targets_are_errors() {
  assert!(compile("1 = 2;").is_err());
  assert!(compile("var a; var b; a + b = 1;").is_err());
  assert!(compile("var a; !a = true;").is_err());
}

#[test]
fn return_at_top_level_is_an_error() {
  assert!(compile("return 1;").is_err());
}

#[test]
fn returning_a_value_from_an_initializer_is_an_error() {
  let src = "class A { init() { return 1; } }";

  assert!(compile(src).is_err());
}

#[test]
fn bare_return_in_an_initializer_is_allowed() {
  let src = "class A { init() { return; } }";

  assert!(compile(src).is_ok());
}

#[test]
fn this_outside_of_a_class_is_an_error() {
  assert!(compile("print this;").is_err());
  assert!(compile("fun f() { return this; }").is_err());
}

#[test]
fn super_outside_of_a_class_is_an_error() {
  assert!(compile("super.m();").is_err());
}

#[test]
fn super_without_a_superclass_is_an_error() {
  let src = "class A { m() { super.m(); } }";

  assert!(compile(src).is_err());
}

#[test]
fn a_class_inheriting_from_itself_is_an_error() {
  assert!(compile("class A < A {}").is_err());
}

#[test]
fn missing_semicolon_is_an_error() {
  assert!(compile("var a = 1").is_err());
}

#[test]
fn unterminated_string_is_an_error() {
  assert!(compile("var a = \"oops;").is_err());
}

#[test]
fn compiler_synchronizes_after_an_error() {
  // Both statements are broken; synchronization at the statement
  // boundary lets the compiler reject the program without panicking.
  assert!(compile("var 1 = 2; var a = ;").is_err());
}

#[test]
fn line_table_parallels_the_bytecode() {
  let src = "var a = 1;\nvar b = 2;\n";
  let (heap, script) = compile(src).expect("Compiler had errors.");
  let chunk = &heap.func(script).chunk;

  for idx in 0..chunk.len() {
    let line = chunk.get_line(idx);
    assert!(line >= 1 && line <= 3);
  }
}
