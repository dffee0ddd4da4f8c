//! Stepper application state and logic.

use crate::bench::TestBench;
use crate::cpu::{Instruction, TraceEvent, TraceLog};

/// Number of trace events kept for display.
const EVENT_HISTORY: usize = 32;

/// Stepper application state.
pub struct StepperApp {
    /// The bench driving the core.
    pub bench: TestBench,
    /// Program being stepped through.
    pub program: Vec<Instruction>,
    /// Index of the next instruction to execute.
    pub cursor: usize,
    /// Events recorded by the core.
    pub trace: TraceLog,
    /// Is the stepper running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
}

impl StepperApp {
    /// Create a new stepper with a loaded program.
    pub fn new(program: Vec<Instruction>) -> Self {
        let trace = TraceLog::new();
        let mut bench = TestBench::new();
        bench.core.set_trace_sink(trace.clone());

        Self {
            bench,
            program,
            cursor: 0,
            trace,
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
        }
    }

    /// Whether every instruction has been executed.
    pub fn finished(&self) -> bool {
        self.cursor >= self.program.len()
    }

    /// Execute the instruction under the cursor.
    pub fn step(&mut self) {
        let Some(instr) = self.program.get(self.cursor).copied() else {
            self.status = format!("End of program after {} steps", self.bench.core.steps());
            self.running = false;
            return;
        };

        let status = self.bench.execute(instr);
        self.status = format!(
            "{:03}: {}  -> ACC={} {}",
            self.cursor, instr, status.accumulator, status.flags
        );
        self.cursor += 1;
    }

    /// Run until the end of the program.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        if self.finished() {
            self.running = false;
            self.status = format!("End of program after {} steps", self.bench.core.steps());
            return;
        }
        self.step();
    }

    /// Reset the core and rewind the program.
    pub fn reset(&mut self) {
        self.bench.reset();
        self.trace.clear();
        self.cursor = 0;
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    /// Most recent events, newest last.
    pub fn recent_events(&self) -> Vec<TraceEvent> {
        let events = self.trace.events();
        let skip = events.len().saturating_sub(EVENT_HISTORY);
        events.into_iter().skip(skip).collect()
    }
}

/// Run the stepper with a program.
pub fn run_stepper(program: Vec<Instruction>) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = StepperApp::new(program);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('x') => app.reset(),
                        _ => {}
                    }
                }
            }
        }

        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
