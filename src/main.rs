//! Nibble CPU - CLI Entry Point
//!
//! Commands:
//! - `nibble-cpu run <program>` - Run an ASM or NBX file through the test bench
//! - `nibble-cpu exec <instr>...` - Run instructions given on the command line
//! - `nibble-cpu debug <program>` - Interactive stepper
//! - `nibble-cpu asm <source>` - Assemble to NBX
//! - `nibble-cpu disasm <image>` - Disassemble NBX

use clap::{Parser, Subcommand};
use nibble::{Instruction, TestBench};

#[derive(Parser)]
#[command(name = "nibble-cpu")]
#[command(version)]
#[command(about = "A 4-bit accumulator machine core with a load/step control protocol")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program, one load/step transaction per instruction
    Run {
        /// Path to the ASM or NBX file to execute
        program: String,
        /// Print every core event
        #[arg(short, long)]
        trace: bool,
        /// Print the final core state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run instructions given inline, e.g. `exec "LOAD 5" "ADD 3"`
    Exec {
        /// Instructions, one per argument
        #[arg(required = true)]
        instructions: Vec<String>,
        /// Print every core event
        #[arg(short, long)]
        trace: bool,
        /// Print the final core state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive stepper
    Debug {
        /// Path to the ASM or NBX file
        program: String,
    },
    /// Assemble source to an NBX image
    Asm {
        /// Path to the source file
        source: String,
        /// Output NBX file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble an NBX image to readable text
    Disasm {
        /// Path to the NBX file
        image: String,
    },
    /// Run the built-in self-test
    Test,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { program, trace, json }) => {
            let instructions = load_program(&program);
            run_instructions(&instructions, trace, json);
        }
        Some(Commands::Exec { instructions, trace, json }) => {
            let parsed = parse_inline(&instructions);
            run_instructions(&parsed, trace, json);
        }
        Some(Commands::Debug { program }) => {
            debug_program(&program);
        }
        Some(Commands::Asm { source, output }) => {
            assemble_file(&source, output);
        }
        Some(Commands::Disasm { image }) => {
            disassemble_file(&image);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("Nibble CPU v{}", env!("CARGO_PKG_VERSION"));
            println!("A 4-bit accumulator machine");
            println!();
            println!("Use --help for available commands");
        }
    }
}

/// Load a program, assembling it first if it is `.asm` source.
fn load_program(path: &str) -> Vec<Instruction> {
    use nibble::{assemble, load_image};

    if path.ends_with(".asm") {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => fail(format!("Failed to read file: {}", e)),
        };
        match assemble(&source) {
            Ok(instrs) => {
                eprintln!("Assembled {} instructions", instrs.len());
                instrs
            }
            Err(e) => fail(format!("Assembly error: {}", e)),
        }
    } else {
        match load_image(path) {
            Ok(image) => {
                eprintln!("Loaded {} instructions", image.len());
                image.instructions
            }
            Err(e) => fail(format!("Failed to load image: {}", e)),
        }
    }
}

fn parse_inline(args: &[String]) -> Vec<Instruction> {
    use nibble::asm::parse_instruction;

    args.iter()
        .map(|text| match parse_instruction(text) {
            Ok(instr) => instr,
            Err(e) => fail(format!("Bad instruction {:?}: {}", text, e)),
        })
        .collect()
}

fn run_instructions(instructions: &[Instruction], trace: bool, json: bool) {
    use nibble::cpu::TraceEvent;

    if instructions.is_empty() {
        fail("No instructions to execute".to_string());
    }

    let mut bench = TestBench::new();
    if trace {
        bench.core.set_trace_sink(|event: &TraceEvent| print_event(event));
    }

    if !json {
        println!("━━━ Execution ━━━");
    }
    for (i, instr) in instructions.iter().enumerate() {
        let status = bench.execute(*instr);
        if !json && !trace {
            println!(
                "{:03}: {:<8} ACC={:04b} ({:>2})  {}",
                i,
                instr.to_string(),
                status.accumulator.get(),
                status.accumulator.get(),
                status.flags
            );
        }
    }

    let snapshot = bench.core.snapshot();
    if json {
        match serde_json::to_string_pretty(&snapshot) {
            Ok(text) => println!("{}", text),
            Err(e) => fail(format!("Failed to serialize state: {}", e)),
        }
        return;
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Steps: {}", snapshot.steps);
    println!("State: {}", snapshot.state);
    println!("ACC:   {:04b} ({})", snapshot.status.accumulator.get(), snapshot.status.accumulator);
    println!("Flags: {}", snapshot.status.flags);
    println!("Bus:   {:#010b}", snapshot.output_bus);
}

fn print_event(event: &nibble::cpu::TraceEvent) {
    use nibble::cpu::TraceEvent;

    match event {
        TraceEvent::Reset => println!("[reset]"),
        TraceEvent::Latched { instruction } => println!("[latch]    {}", instruction),
        TraceEvent::Executed(report) => println!(
            "[execute]  {:<8} ACC {} -> {}  {} -> {}",
            report.instruction.to_string(),
            report.before.accumulator,
            report.after.accumulator,
            report.before.flags,
            report.after.flags
        ),
        TraceEvent::Settled { status } => {
            println!("[settled]  ACC={} {}", status.accumulator, status.flags)
        }
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &str) {
    use nibble::run_stepper;

    let instructions = load_program(path);
    if instructions.is_empty() {
        fail("No instructions to execute".to_string());
    }

    if let Err(e) = run_stepper(instructions) {
        fail(format!("Stepper error: {}", e));
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &str) {
    fail("This build has no TUI; rebuild with --features tui".to_string());
}

fn assemble_file(source_path: &str, output: Option<String>) {
    use nibble::{assemble, save_image, ProgramImage};

    let out_path = output.unwrap_or_else(|| source_path.replace(".asm", ".nbx"));

    println!("Assembling: {} → {}", source_path, out_path);

    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => fail(format!("Failed to read file: {}", e)),
    };

    let instructions = match assemble(&source) {
        Ok(instrs) => instrs,
        Err(e) => fail(format!("Assembly error: {}", e)),
    };

    println!("✓ Assembled {} instructions", instructions.len());

    if let Err(e) = save_image(&out_path, &ProgramImage::from(instructions)) {
        fail(format!("Failed to save image: {}", e));
    }

    println!("✓ Saved to {}", out_path);
}

fn disassemble_file(image_path: &str) {
    use nibble::{disassemble, load_image};

    let image = match load_image(image_path) {
        Ok(i) => i,
        Err(e) => fail(format!("Failed to load image: {}", e)),
    };

    println!("{}", disassemble(&image.instructions));
}

fn run_self_test() {
    use nibble::{assemble, Nibble, Opcode};

    println!("━━━ Nibble CPU Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;
    let mut check = |name: &str, ok: bool, detail: String| {
        if ok {
            println!("{}... ✓", name);
            passed += 1;
        } else {
            println!("{}... ✗ ({})", name, detail);
            failed += 1;
        }
    };

    let mut bench = TestBench::new();
    let after_reset = bench.output_bus();
    check("Reset clears output bus", after_reset == 0, format!("bus={:#04x}", after_reset));

    let s = bench.execute(Instruction::new(Opcode::Load, Nibble::new(5)));
    check("LOAD 5", s.accumulator.get() == 5, format!("acc={}", s.accumulator));

    let s = bench.execute(Instruction::new(Opcode::Add, Nibble::new(3)));
    check("ADD 3 (5+3=8)", s.accumulator.get() == 8, format!("acc={}", s.accumulator));

    bench.execute(Instruction::new(Opcode::Load, Nibble::new(15)));
    let s = bench.execute(Instruction::new(Opcode::Add, Nibble::new(1)));
    check(
        "ADD overflow sets carry and zero",
        s.accumulator.is_zero() && s.flags.carry && s.flags.zero,
        format!("acc={} flags={}", s.accumulator, s.flags),
    );

    let s = bench.execute(Instruction::new(Opcode::Load, Nibble::new(8)));
    check("LOAD 8", s.accumulator.get() == 8, format!("acc={}", s.accumulator));
    let s = bench.execute(Instruction::bare(Opcode::Shl));
    check(
        "SHL overflow sets carry",
        s.accumulator.is_zero() && s.flags.carry,
        format!("acc={} flags={}", s.accumulator, s.flags),
    );

    let s = bench.execute(Instruction::bare(Opcode::Halt));
    check("HALT sets halt flag", s.flags.halt, format!("flags={}", s.flags));
    let s = bench.execute(Instruction::new(Opcode::Load, Nibble::new(1)));
    check("Halt flag is sticky", s.flags.halt, format!("flags={}", s.flags));

    bench.reset();
    let program = assemble("LOAD 3\nADD 2\nADD 1").unwrap_or_default();
    let statuses = bench.run_program(&program);
    let last = statuses.last().map(|s| s.accumulator.get());
    check("Program LOAD 3, ADD 2, ADD 1", last == Some(6), format!("acc={:?}", last));

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}

fn fail(message: String) -> ! {
    eprintln!("❌ {}", message);
    std::process::exit(1);
}
