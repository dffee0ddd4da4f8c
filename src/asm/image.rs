//! `.nbx` program image format.
//!
//! A plain text file:
//! - One instruction per line as two hex digits (the input bus byte)
//! - Anything after `;` is a comment
//! - Blank lines are ignored

use crate::cpu::decode::{decode, encode, Instruction};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

/// A loaded program image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramImage {
    /// The program instructions.
    pub instructions: Vec<Instruction>,
}

impl ProgramImage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instr: Instruction) {
        self.instructions.push(instr);
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Parse image text.
    pub fn parse(text: &str) -> Result<Self, ImageError> {
        Self::read_from(text.as_bytes())
    }

    /// Render as image text.
    pub fn render(&self) -> String {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut out);
        String::from_utf8_lossy(&out).into_owned()
    }

    fn read_from<R: BufRead>(reader: R) -> Result<Self, ImageError> {
        let mut image = ProgramImage::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result.map_err(|e| ImageError::IoError(e.to_string()))?;
            let content = line.split(';').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }

            let digits = content.trim_start_matches("0x").trim_start_matches("0X");
            if digits.len() != 2 {
                return Err(ImageError::ParseError {
                    line: line_num + 1,
                    message: format!("expected two hex digits, found {:?}", content),
                });
            }
            let byte = u8::from_str_radix(digits, 16).map_err(|e| ImageError::ParseError {
                line: line_num + 1,
                message: e.to_string(),
            })?;

            image.push(decode(byte));
        }

        Ok(image)
    }

    fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "; Nibble CPU program image")?;
        writeln!(out, "; {} instructions", self.len())?;
        writeln!(out)?;

        for (i, instr) in self.instructions.iter().enumerate() {
            writeln!(out, "{:02X} ; {:03} {}", encode(instr), i, instr)?;
        }
        Ok(())
    }
}

impl From<Vec<Instruction>> for ProgramImage {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }
}

/// Load an image file from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<ProgramImage, ImageError> {
    let file = std::fs::File::open(path.as_ref()).map_err(|e| ImageError::IoError(e.to_string()))?;
    ProgramImage::read_from(BufReader::new(file))
}

/// Save an image file to disk.
pub fn save_image<P: AsRef<Path>>(path: P, image: &ProgramImage) -> Result<(), ImageError> {
    let mut file =
        std::fs::File::create(path.as_ref()).map_err(|e| ImageError::IoError(e.to_string()))?;
    image
        .write_to(&mut file)
        .map_err(|e| ImageError::IoError(e.to_string()))
}

/// Errors that can occur during image operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::Opcode;
    use crate::nibble::Nibble;

    #[test]
    fn test_parse_with_comments() {
        let text = "; header\n\n51 ; LOAD 5\n0x32\n  0f  \n";
        let image = ProgramImage::parse(text).unwrap();
        assert_eq!(
            image.instructions,
            [
                Instruction::new(Opcode::Load, Nibble::new(5)),
                Instruction::new(Opcode::Add, Nibble::new(3)),
                Instruction::bare(Opcode::Halt),
            ]
        );
    }

    #[test]
    fn test_render_is_parseable() {
        let image = ProgramImage::from(vec![
            Instruction::new(Opcode::Load, Nibble::new(10)),
            Instruction::bare(Opcode::Shr),
        ]);
        let text = image.render();
        assert!(text.contains("A1 ; 000 LOAD 10"));
        assert_eq!(ProgramImage::parse(&text).unwrap(), image);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            ProgramImage::parse("51\n123"),
            Err(ImageError::ParseError {
                line: 2,
                message: "expected two hex digits, found \"123\"".into(),
            })
        );
        assert!(matches!(
            ProgramImage::parse("zz"),
            Err(ImageError::ParseError { line: 1, .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_image("/nonexistent/program.nbx"),
            Err(ImageError::IoError(_))
        ));
    }
}
