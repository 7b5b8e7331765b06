use rook::virtual_machine::{InterpretResult, Vm};
use rustyline::Editor;
use std::{env, fs, process};

#[cfg(feature = "bench_time")]
use std::time::Instant;

/// The main function.
fn main() {
  let args: Vec<String> = env::args().collect();

  match args.len() {
    1 => run_repl(),
    2 => run_file(&args[1]),
    _ => {
      eprintln!("Usage: rook [script]");
      process::exit(exitcode::USAGE);
    }
  }
}

/// Runs a Rook source file, then exits the interpreter with the
/// appropriate code.
fn run_file(path: &str) {
  let contents = match fs::read_to_string(path) {
    Ok(contents) => contents,
    Err(error) => {
      eprintln!("Could not read file '{}': {}", path, error);
      process::exit(exitcode::IOERR);
    }
  };

  // Creates a virtual machine and interprets the file's contents in it.
  let mut vm = Vm::new();

  #[cfg(feature = "bench_time")]
  let start = Instant::now();

  let result = vm.interpret(&contents);

  #[cfg(feature = "bench_time")]
  println!("\nFinished in {:?}", start.elapsed());

  match result {
    InterpretResult::CompileError => process::exit(exitcode::DATAERR),
    InterpretResult::RuntimeError => process::exit(exitcode::SOFTWARE),
    InterpretResult::Ok => process::exit(exitcode::OK),
  }
}

/// Runs the interactive prompt. A single virtual machine lives for the
/// whole session, so globals declared on one line are visible on the next.
fn run_repl() {
  println!("Rook {}", rook::VERSION);

  let mut vm = Vm::new();
  let mut editor = Editor::<()>::new();

  loop {
    match editor.readline("> ") {
      Ok(line) => {
        editor.add_history_entry(&line);
        vm.interpret(&line);
      }
      Err(_) => break,
    }
  }
}
