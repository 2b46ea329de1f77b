//! # Disassembler
//! Renders tokenized lines as a numbered listing, without running anything.

use alloc::{format, string::String};
use core::fmt::Write;

use crate::{decode::parse_integer, program::Line, Dialect, Opcode};

/// Formats each line as `[index] OPCODE   operands`, mnemonics padded to 8 columns.
/// Labels are listed as written. Integer `PUSH` operands are shown in hexadecimal.
/// # Example
/// ```rust
/// # use opasm::*;
/// let lines = tokenize("start:\nMOV EAX, 5\nJMP start", &Dialect::REGISTER);
/// assert_eq!(
///     disassemble(&lines, &Dialect::REGISTER),
///     "[0] start:\n[1] MOV      EAX, 5\n[2] JMP      start"
/// );
/// ```
pub fn disassemble(lines: &[Line], dialect: &Dialect) -> String {
    let mut listing = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i != 0 {
            listing.push('\n');
        }
        if line.is_label {
            let _ = write!(listing, "[{}] {}", line.index, line.text);
            continue;
        }

        let instruction = line.decode(dialect);
        let mut rendered = format!(
            "[{}] {:<8} ",
            line.index,
            instruction.mnemonic.to_uppercase()
        );
        for (position, operand) in instruction.operands.iter().enumerate() {
            if position != 0 {
                rendered.push_str(", ");
            }
            match parse_integer(operand).filter(|_| instruction.opcode == Opcode::Push) {
                Some(value) if value < 0 => {
                    let _ = write!(rendered, "-0x{:X}", value.unsigned_abs());
                }
                Some(value) => {
                    let _ = write!(rendered, "0x{value:X}");
                }
                None => rendered.push_str(operand),
            }
        }
        listing.push_str(rendered.trim_end());
    }
    listing
}
