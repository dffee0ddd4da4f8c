//! Assembler, disassembler and program image files.
//!
//! This module provides:
//! - A line assembler (text -> instruction sequence)
//! - A disassembler (instructions -> readable listing)
//! - The `.nbx` image format (one bus byte per line, hex)

pub mod assembler;
pub mod disasm;
pub mod image;

pub use assembler::{assemble, parse_instruction, AssemblerError};
pub use disasm::disassemble;
pub use image::{load_image, save_image, ImageError, ProgramImage};
