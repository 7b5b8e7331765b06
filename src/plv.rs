use crate::bytecode::OpCode;
use crate::chunk::Chunk;
use crate::objects::gc::Heap;
use crate::objects::FuncObj;
use crate::values::Value;

/// Prints a human-readable listing of a compiled function's chunk:
/// one line per instruction with its offset, source line, mnemonic,
/// and operands.
///
/// # Parameters
/// - `heap`: The heap that the chunk's constants live in.
/// - `func`: The function to disassemble.
pub fn disassemble_function(heap: &Heap, func: &FuncObj) {
  let name = match func.name {
    Some(name) => format!("'{}'", heap.str_(name).text),
    None => String::from("<script>"),
  };

  println!("== Disassembly of {} ==", name);

  let mut offset = 0;
  while offset < func.chunk.len() {
    offset = disassemble_instruction(heap, &func.chunk, offset);
  }

  println!();
}

/// Prints a single instruction, returning the offset of the next one.
pub fn disassemble_instruction(heap: &Heap, chunk: &Chunk, offset: usize) -> usize {
  print!("{:04} ", offset);

  if offset > 0 && chunk.get_line(offset) == chunk.get_line(offset - 1) {
    print!("   | ");
  } else {
    print!("{:>4} ", chunk.get_line(offset));
  }

  let instr = chunk.get_op_code(offset);

  match instr {
    // Instructions with no operands.
    OpCode::Add
    | OpCode::CloseUpVal
    | OpCode::Divide
    | OpCode::Equals
    | OpCode::GreaterThan
    | OpCode::Inherit
    | OpCode::LessThan
    | OpCode::LoadImmFalse
    | OpCode::LoadImmNull
    | OpCode::LoadImmTrue
    | OpCode::LogicNot
    | OpCode::Multiply
    | OpCode::Negate
    | OpCode::PopStack
    | OpCode::Print
    | OpCode::Return
    | OpCode::Subtract => {
      println!("{:?}", instr);
      offset + 1
    }

    // Instructions with one raw-byte operand.
    OpCode::FuncCall | OpCode::GetLocal | OpCode::GetUpVal | OpCode::SetLocal | OpCode::SetUpVal => {
      println!("{:<16} {:4}", format!("{:?}", instr), chunk.get_byte(offset + 1));
      offset + 2
    }

    // Instructions whose operand indexes the constant pool.
    OpCode::DefineGlobal
    | OpCode::DefineMethod
    | OpCode::GetGlobal
    | OpCode::GetProp
    | OpCode::GetSuper
    | OpCode::LoadConstant
    | OpCode::MakeClass
    | OpCode::SetGlobal
    | OpCode::SetProp => {
      let idx = chunk.get_byte(offset + 1);
      let val = chunk.get_constant(idx as usize);
      println!(
        "{:<16} {:4} ({})",
        format!("{:?}", instr),
        idx,
        val.display_plain(heap)
      );
      offset + 2
    }

    // Jump instructions, with a two-byte offset operand.
    OpCode::JumpForward | OpCode::JumpIfFalse => {
      let jump = chunk.get_short(offset + 1) as usize;
      println!(
        "{:<16} {:4} -> {}",
        format!("{:?}", instr),
        offset,
        offset + 3 + jump
      );
      offset + 3
    }
    OpCode::LoopJump => {
      let jump = chunk.get_short(offset + 1) as usize;
      println!(
        "{:<16} {:4} -> {}",
        format!("{:?}", instr),
        offset,
        offset + 3 - jump
      );
      offset + 3
    }

    // Fused invocation instructions: a name operand plus an argument count.
    OpCode::Invoke | OpCode::SuperInvoke => {
      let idx = chunk.get_byte(offset + 1);
      let args = chunk.get_byte(offset + 2);
      let val = chunk.get_constant(idx as usize);
      println!(
        "{:<16} ({} args) {:4} ({})",
        format!("{:?}", instr),
        args,
        idx,
        val.display_plain(heap)
      );
      offset + 3
    }

    // The closure instruction enumerates its captures inline.
    OpCode::MakeClosure => {
      let idx = chunk.get_byte(offset + 1);
      let val = chunk.get_constant(idx as usize);
      println!(
        "{:<16} {:4} ({})",
        format!("{:?}", instr),
        idx,
        val.display_plain(heap)
      );

      let up_val_count = match val {
        Value::Obj(id) => heap.func(id).up_val_count,
        _ => 0,
      };

      let mut offset = offset + 2;
      for _ in 0..up_val_count {
        let is_local = chunk.get_byte(offset) == 1;
        let index = chunk.get_byte(offset + 1);
        println!(
          "{:04}    |   {:>10} {}",
          offset,
          if is_local { "local" } else { "up value" },
          index
        );
        offset += 2;
      }

      offset
    }
  }
}
