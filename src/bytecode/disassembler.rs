//! Bytecode disassembler for debugging.

use colored::Colorize;
use std::fmt::Write;

use crate::bytecode::chunk::ByteCode;
use crate::bytecode::instruction::OpCode;
use crate::value::Value;

/// Disassemble a compiled program into human-readable output.
pub fn disassemble(bc: &ByteCode) -> String {
    render(bc, false)
}

/// Like [`disassemble`], with mnemonics and pool operands highlighted.
pub fn disassemble_colored(bc: &ByteCode) -> String {
    render(bc, true)
}

fn render(bc: &ByteCode, color: bool) -> String {
    let mut output = String::new();
    writeln!(
        &mut output,
        "== bytecode ({} instructions, {} values, {} idents) ==",
        bc.len(),
        bc.values().len(),
        bc.idents().len()
    )
    .unwrap();

    for offset in 0..bc.len() {
        disassemble_instruction(bc, offset, color, &mut output);
    }
    output
}

/// Disassemble a single instruction.
pub fn disassemble_instruction(bc: &ByteCode, offset: usize, color: bool, output: &mut String) {
    let instruction = bc.code()[offset];
    let opcode = instruction.op();
    let arg = instruction.arg();

    let operand = match opcode {
        OpCode::Push => Some(match bc.value(arg) {
            Some(value) => value_str(value),
            None => format!("?{}", arg),
        }),
        OpCode::LoadName => Some(match bc.ident(arg) {
            Some(name) => name.to_string(),
            None => format!("?{}", arg),
        }),
        OpCode::Call => Some(format!("args={}", arg)),
        _ => None,
    };

    write!(output, "{:04} ", offset).unwrap();
    let mnemonic = match operand {
        Some(_) => format!("{:<14}", opcode.mnemonic()),
        None => opcode.mnemonic().to_string(),
    };
    if color {
        write!(output, "{}", mnemonic.cyan()).unwrap();
    } else {
        output.push_str(&mnemonic);
    }

    match operand {
        Some(operand) if opcode == OpCode::Call => {
            writeln!(output, " {}", operand).unwrap();
        }
        Some(operand) => {
            let operand = if color {
                operand.yellow().to_string()
            } else {
                operand
            };
            writeln!(output, " {:>4} ({})", arg, operand).unwrap();
        }
        None => output.push('\n'),
    }
}

fn value_str(value: &Value) -> String {
    match value {
        Value::Str(s) => {
            if s.chars().count() > 20 {
                let head: String = s.chars().take(20).collect();
                format!("\"{}...\"", head)
            } else {
                format!("\"{}\"", s)
            }
        }
        other => other.to_string(),
    }
}

/// Print disassembly to stdout.
pub fn print_disassembly(bc: &ByteCode) {
    print!("{}", disassemble_colored(bc));
}
