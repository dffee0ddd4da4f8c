//! Pin-level scenarios: reset, then load/step/wait per instruction,
//! sampling the output bus afterwards.

use nibble::bench::{TestBench, POST_STEP_WAIT_CYCLES};
use nibble::cpu::{ControlLines, Pins, SeqState, SETTLE_CYCLES};
use nibble::{Instruction, Nibble, Opcode, Status};

fn op(opcode: Opcode, operand: u8) -> Instruction {
    Instruction::new(opcode, Nibble::new(operand))
}

fn acc(bench: &TestBench) -> u8 {
    bench.output_bus() & 0x0F
}

#[test]
fn reset_clears_accumulator_and_flags() {
    let bench = TestBench::new();
    let status = bench.read();
    assert_eq!(acc(&bench), 0);
    assert!(!status.flags.zero);
    assert!(!status.flags.carry);
    assert!(!status.flags.halt);
}

#[test]
fn load_instruction() {
    let mut bench = TestBench::new();

    bench.execute(op(Opcode::Load, 5));
    assert_eq!(acc(&bench), 5);
    assert!(!bench.read().flags.zero);

    bench.execute(op(Opcode::Load, 0));
    assert_eq!(acc(&bench), 0);
    assert!(bench.read().flags.zero, "zero flag set when loading 0");
}

#[test]
fn arithmetic_operations() {
    let mut bench = TestBench::new();

    bench.execute(op(Opcode::Load, 5));
    bench.execute(op(Opcode::Add, 3));
    assert_eq!(acc(&bench), 8, "5 + 3");

    bench.execute(op(Opcode::Sub, 2));
    assert_eq!(acc(&bench), 6, "8 - 2");

    bench.execute(op(Opcode::Load, 15));
    let status = bench.execute(op(Opcode::Add, 1));
    assert_eq!(status.accumulator.get(), 0, "15 + 1 wraps");
    assert!(status.flags.carry);
    assert!(status.flags.zero);
}

#[test]
fn logic_operations() {
    let mut bench = TestBench::new();

    bench.execute(op(Opcode::Load, 0b1010));
    bench.execute(op(Opcode::And, 0b1100));
    assert_eq!(acc(&bench), 0b1000);

    bench.execute(op(Opcode::Load, 0b1010));
    bench.execute(op(Opcode::Or, 0b0101));
    assert_eq!(acc(&bench), 0b1111);

    let status = bench.execute(op(Opcode::Xor, 0b0011));
    assert_eq!(status.accumulator.get(), 0b1100);
    assert!(!status.flags.carry);
}

#[test]
fn shift_operations() {
    let mut bench = TestBench::new();

    bench.execute(op(Opcode::Load, 0b0101));
    bench.execute(Instruction::bare(Opcode::Shl));
    assert_eq!(acc(&bench), 0b1010);

    bench.execute(Instruction::bare(Opcode::Shr));
    assert_eq!(acc(&bench), 0b0101);

    bench.execute(op(Opcode::Load, 0b1000));
    let status = bench.execute(Instruction::bare(Opcode::Shl));
    assert_eq!(status.accumulator.get(), 0);
    assert!(status.flags.carry, "carry set on shift overflow");
}

#[test]
fn compare_instruction() {
    let mut bench = TestBench::new();

    bench.execute(op(Opcode::Load, 5));
    let status = bench.execute(op(Opcode::Cmp, 5));
    assert!(status.flags.zero);
    assert!(!status.flags.carry);
    assert_eq!(status.accumulator.get(), 5);

    let status = bench.execute(op(Opcode::Cmp, 7));
    assert!(!status.flags.zero);
    assert!(status.flags.carry);
    assert_eq!(status.accumulator.get(), 5);
}

#[test]
fn halt_instruction() {
    let mut bench = TestBench::new();
    let status = bench.execute(Instruction::bare(Opcode::Halt));
    assert!(status.flags.halt);

    for i in [op(Opcode::Load, 2), op(Opcode::Add, 2), Instruction::NOP] {
        assert!(bench.execute(i).flags.halt, "halt cleared by {i}");
    }

    bench.reset();
    assert!(!bench.read().flags.halt);
}

#[test]
fn simple_program() {
    let mut bench = TestBench::new();
    let program = [op(Opcode::Load, 3), op(Opcode::Add, 2), op(Opcode::Add, 1)];
    let accs: Vec<u8> = bench
        .run_program(&program)
        .iter()
        .map(|s| s.accumulator.get())
        .collect();
    assert_eq!(accs, [3, 5, 6]);
}

#[test]
fn nop_instruction() {
    let mut bench = TestBench::new();
    let before = bench.execute(op(Opcode::Load, 7));
    let after = bench.execute(op(Opcode::Nop, 0));
    assert_eq!(after, before);
}

#[test]
fn exec_flag_only_during_settle() {
    let mut bench = TestBench::new();
    let mut pins = Pins::IDLE.with_bus(nibble::cpu::decode::encode(&op(Opcode::Add, 1)));

    pins.control = ControlLines::LOAD;
    let bus = bench.core.clock(pins);
    assert!(!bus.flags().exec);
    assert_eq!(bench.core.state(), SeqState::Loading);

    pins.control = ControlLines::STEP;
    let bus = bench.core.clock(pins);
    assert!(bus.flags().exec);

    pins.control = ControlLines::IDLE;
    let mut exec_edges = 1;
    for _ in 0..POST_STEP_WAIT_CYCLES {
        if bench.core.clock(pins).flags().exec {
            exec_edges += 1;
        }
    }
    assert_eq!(exec_edges, SETTLE_CYCLES as usize);
    assert_eq!(bench.core.state(), SeqState::Idle);
    assert_eq!(bench.read().accumulator.get(), 1);
}

#[test]
fn reset_mid_execution_returns_to_zero_state() {
    let mut bench = TestBench::new();
    bench.execute(Instruction::bare(Opcode::Halt));
    bench.execute(op(Opcode::Load, 9));

    let pins = Pins::IDLE.with_bus(0x12);
    bench.core.clock(pins.with_control(ControlLines::LOAD));
    bench.core.clock(pins.with_control(ControlLines::STEP));
    assert_eq!(bench.core.state(), SeqState::Executing);

    bench.reset();
    assert_eq!(bench.read(), Status::default());
    assert_eq!(bench.core.state(), SeqState::Idle);
}

#[test]
fn repeated_reset_has_no_further_effect() {
    let mut bench = TestBench::new();
    bench.execute(op(Opcode::Load, 4));
    bench.reset();
    let first = bench.core.snapshot();
    bench.reset();
    assert_eq!(bench.core.snapshot(), first);
}

#[test]
fn load_pulse_during_execute_is_ignored() {
    let mut bench = TestBench::new();
    let first = Pins::IDLE.with_bus(nibble::cpu::decode::encode(&op(Opcode::Load, 3)));
    bench.core.clock(first.with_control(ControlLines::LOAD));
    bench.core.clock(first.with_control(ControlLines::STEP));

    let intruder = Pins::IDLE
        .with_bus(nibble::cpu::decode::encode(&op(Opcode::Load, 12)))
        .with_control(ControlLines::LOAD);
    bench.core.clock(intruder);
    assert_eq!(bench.core.latched(), op(Opcode::Load, 3));

    bench.core.clock_n(Pins::IDLE, 4);
    assert_eq!(bench.read().accumulator.get(), 3);
    assert_eq!(bench.core.state(), SeqState::Idle);
}

#[test]
fn bus_is_captured_on_edge_after_load() {
    let mut bench = TestBench::new();
    let early = Pins::IDLE.with_bus(nibble::cpu::decode::encode(&op(Opcode::Load, 2)));
    let late = Pins::IDLE.with_bus(nibble::cpu::decode::encode(&op(Opcode::Load, 11)));

    bench.core.clock(early.with_control(ControlLines::LOAD));
    assert_eq!(bench.core.state(), SeqState::Loading);
    assert_eq!(bench.core.latched(), Instruction::NOP);

    bench.core.clock(late);
    assert_eq!(bench.core.state(), SeqState::Loaded);
    assert_eq!(bench.core.latched(), op(Opcode::Load, 11));

    bench.core.clock(late.with_control(ControlLines::STEP));
    bench.core.clock_n(Pins::IDLE, POST_STEP_WAIT_CYCLES);
    assert_eq!(bench.read().accumulator.get(), 11);
}

#[test]
fn reset_while_loaded_clears_latch() {
    let mut bench = TestBench::new();
    let pins = Pins::IDLE.with_bus(nibble::cpu::decode::encode(&op(Opcode::Xor, 6)));
    bench.core.clock(pins.with_control(ControlLines::LOAD));
    bench.core.clock(pins);
    assert_eq!(bench.core.state(), SeqState::Loaded);
    assert_eq!(bench.core.latched(), op(Opcode::Xor, 6));

    bench.core.clock(Pins::RESET);
    assert_eq!(bench.core.state(), SeqState::Idle);
    assert_eq!(bench.core.latched(), Instruction::NOP);
    assert_eq!(bench.output_bus(), 0);
}

#[test]
fn reset_while_loading_clears_latch() {
    let mut bench = TestBench::new();
    let first = Pins::IDLE.with_bus(nibble::cpu::decode::encode(&op(Opcode::Load, 7)));
    bench.core.clock(first.with_control(ControlLines::LOAD));
    bench.core.clock(first);

    let second = Pins::IDLE.with_bus(nibble::cpu::decode::encode(&op(Opcode::Add, 4)));
    bench.core.clock(second.with_control(ControlLines::LOAD));
    assert_eq!(bench.core.state(), SeqState::Loading);
    assert_eq!(bench.core.latched(), op(Opcode::Load, 7));

    bench.core.clock(Pins::RESET);
    assert_eq!(bench.core.state(), SeqState::Idle);
    assert_eq!(bench.core.latched(), Instruction::NOP);

    // A step after reset finds nothing loaded.
    bench.core.clock(Pins::IDLE.with_control(ControlLines::STEP));
    assert_eq!(bench.core.state(), SeqState::Idle);
    assert_eq!(bench.read(), Status::default());
}
