//! WebAssembly bindings for the Nibble CPU.
//!
//! This module provides JavaScript-friendly wrappers around the core.

use wasm_bindgen::prelude::*;
use crate::bench::TestBench;
use crate::cpu::Instruction;
use crate::asm::assembler::assemble;
use crate::asm::disasm::disassemble_byte;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly core wrapper.
#[wasm_bindgen]
pub struct WasmCore {
    bench: TestBench,
    program: Vec<Instruction>,
    cursor: usize,
}

#[wasm_bindgen]
impl WasmCore {
    /// Create a core that has been through the reset sequence.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            bench: TestBench::new(),
            program: Vec::new(),
            cursor: 0,
        }
    }

    /// Load a program from assembly source code.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let instructions = assemble(source)
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        let len = instructions.len();
        self.program = instructions;
        self.reset();
        Ok(len)
    }

    /// Execute the next program instruction. Returns its disassembly.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        let instr = self.program.get(self.cursor).copied()
            .ok_or_else(|| JsError::new("end of program"))?;

        self.bench.execute(instr);
        self.cursor += 1;
        Ok(instr.to_string())
    }

    /// Execute one raw bus byte outside the loaded program.
    #[wasm_bindgen]
    pub fn execute_byte(&mut self, byte: u8) -> u8 {
        self.bench.execute(crate::cpu::decode::decode(byte));
        self.bench.output_bus()
    }

    /// Run to the end of the program. Returns the number of steps taken.
    #[wasm_bindgen]
    pub fn run(&mut self) -> usize {
        let start = self.cursor;
        while self.step().is_ok() {}
        self.cursor - start
    }

    /// Reset the core and rewind the program.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.bench.reset();
        self.cursor = 0;
    }

    /// Index of the next instruction.
    #[wasm_bindgen]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Accumulator value (0-15).
    #[wasm_bindgen]
    pub fn accumulator(&self) -> u8 {
        self.bench.core.accumulator().get()
    }

    /// Flags packed as zero/carry/halt/exec in bits 0-3.
    #[wasm_bindgen]
    pub fn flags(&self) -> u8 {
        self.bench.core.flags().bits()
    }

    /// The raw 8-bit output bus.
    #[wasm_bindgen]
    pub fn output_bus(&self) -> u8 {
        self.bench.output_bus()
    }

    /// Sequencer state name.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        self.bench.core.state().to_string()
    }

    /// Full core snapshot as JSON.
    #[wasm_bindgen]
    pub fn state_json(&self) -> Result<String, JsError> {
        self.snapshot_text()
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Full core snapshot as a plain JavaScript object.
    #[wasm_bindgen]
    pub fn snapshot(&self) -> Result<JsValue, JsError> {
        let text = self.state_json()?;
        js_sys::JSON::parse(&text)
            .map_err(|_| JsError::new("snapshot is not valid JSON"))
    }
}

impl WasmCore {
    fn snapshot_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.bench.core.snapshot())
    }
}

impl Default for WasmCore {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble source code and return instruction count.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<usize, JsError> {
    let instructions = assemble(source)
        .map_err(|e| JsError::new(&format!("{}", e)))?;
    Ok(instructions.len())
}

/// Disassemble a single bus byte.
#[wasm_bindgen]
pub fn wasm_disassemble(value: u8) -> String {
    disassemble_byte(value)
}
