//! Assembler for instruction scripts.
//!
//! Syntax:
//! ```text
//! ; Comment
//! FIVE EQU 5      ; Define a named constant
//!     LOAD FIVE   ; ACC := 5
//!     ADD 0x3     ; hex operand
//!     AND 0b1100  ; binary operand
//!     SHL         ; operand defaults to 0
//!     DB 0x0F     ; raw bus byte (operand << 4 | opcode)
//!     HALT
//! ```

use crate::cpu::decode::{decode, DecodeError, Instruction, Opcode};
use std::collections::HashMap;
use thiserror::Error;

/// Assemble source text into an instruction sequence.
pub fn assemble(source: &str) -> Result<Vec<Instruction>, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// Parse a single instruction such as `"ADD 3"`, without constants.
pub fn parse_instruction(text: &str) -> Result<Instruction, AssemblerError> {
    let mut asm = Assembler::new();
    let mut program = asm.assemble(text)?;
    match program.len() {
        1 => Ok(program.remove(0)),
        n => Err(AssemblerError::SyntaxError {
            line: 1,
            message: format!("expected one instruction, found {}", n),
        }),
    }
}

/// The assembler state.
struct Assembler {
    /// Constants (name -> value).
    symbols: HashMap<String, i64>,
    /// Output instructions.
    output: Vec<Instruction>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            output: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &str) -> Result<Vec<Instruction>, AssemblerError> {
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }
        Ok(std::mem::take(&mut self.output))
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        // Remove inline comments
        let line = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let parts: Vec<&str> = line.split_whitespace().collect();

        match parts.as_slice() {
            [] => Ok(()),

            [name, equ, value] if equ.eq_ignore_ascii_case("EQU") => {
                let value = self.parse_value(value, line_num)?;
                self.symbols.insert(name.to_uppercase(), value);
                Ok(())
            }

            [directive, value] if directive.eq_ignore_ascii_case("DB") => {
                let value = self.parse_value(value, line_num)?;
                let byte = u8::try_from(value).map_err(|_| AssemblerError::ValueOutOfRange {
                    line: line_num,
                    value,
                })?;
                self.output.push(decode(byte));
                Ok(())
            }

            [mnemonic] => self.emit(mnemonic, None, line_num),
            [mnemonic, operand] => self.emit(mnemonic, Some(*operand), line_num),

            _ => Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("unexpected tokens: {}", line.trim()),
            }),
        }
    }

    fn emit(
        &mut self,
        mnemonic: &str,
        operand: Option<&str>,
        line_num: usize,
    ) -> Result<(), AssemblerError> {
        let opcode: Opcode = mnemonic
            .parse()
            .map_err(|e| AssemblerError::from_decode(e, line_num))?;

        let instr = match operand {
            Some(text) => {
                let value = self.parse_value(text, line_num)?;
                Instruction::with_operand(opcode, value)
                    .map_err(|e| AssemblerError::from_decode(e, line_num))?
            }
            None => Instruction::bare(opcode),
        };

        self.output.push(instr);
        Ok(())
    }

    fn parse_value(&self, text: &str, line_num: usize) -> Result<i64, AssemblerError> {
        let text = text.trim();
        let invalid = |kind: &str| AssemblerError::SyntaxError {
            line: line_num,
            message: format!("invalid {} literal: {}", kind, text),
        };

        if let Some(digits) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            return i64::from_str_radix(digits, 16).map_err(|_| invalid("hex"));
        }
        if let Some(digits) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
            return i64::from_str_radix(&digits.replace('_', ""), 2).map_err(|_| invalid("binary"));
        }
        if text.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
            return text.parse::<i64>().map_err(|_| invalid("decimal"));
        }

        self.symbols
            .get(&text.to_uppercase())
            .copied()
            .ok_or_else(|| AssemblerError::UndefinedSymbol {
                line: line_num,
                symbol: text.to_string(),
            })
    }
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("undefined symbol on line {line}: {symbol}")]
    UndefinedSymbol { line: usize, symbol: String },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: i64 },
}

impl AssemblerError {
    fn from_decode(err: DecodeError, line: usize) -> Self {
        match err {
            DecodeError::UnknownMnemonic(mnemonic) => Self::UnknownMnemonic { line, mnemonic },
            DecodeError::OperandOutOfRange(value) => Self::ValueOutOfRange { line, value },
        }
    }
}
