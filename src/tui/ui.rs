//! UI rendering for the stepper.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::cpu::{SeqState, TraceEvent};
use super::app::StepperApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &StepperApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Percentage(50),
        ])
        .split(frame.area());

    // Left side: program and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_program(frame, left_chunks[0], app);
    draw_status(frame, left_chunks[1], app);

    // Right side: machine state, events and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Min(6),
            Constraint::Length(4),
        ])
        .split(chunks[1]);

    draw_machine(frame, right_chunks[0], app);
    draw_events(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

/// Draw the program listing with the next instruction highlighted.
fn draw_program(frame: &mut Frame, area: Rect, app: &StepperApp) {
    let items: Vec<ListItem> = app
        .program
        .iter()
        .enumerate()
        .map(|(index, instr)| {
            let is_next = index == app.cursor;
            let prefix = if is_next { "▶ " } else { "  " };
            let text = format!("{}{:03}: {}", prefix, index, instr);

            let style = if is_next {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if index < app.cursor {
                Style::default().fg(Color::DarkGray)
            } else if !instr.opcode.is_defined() {
                Style::default().fg(Color::Magenta)
            } else {
                Style::default()
            };

            ListItem::new(text).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Program ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw accumulator, flags, sequencer state and raw output bus.
fn draw_machine(frame: &mut Frame, area: Rect, app: &StepperApp) {
    let core = &app.bench.core;
    let flags = core.flags();

    let content = vec![
        Line::from(vec![
            Span::raw("ACC: "),
            Span::styled(
                format!("{:04b}", core.accumulator().get()),
                Style::default().fg(Color::White),
            ),
            Span::raw(format!(" = {}", core.accumulator())),
        ]),
        Line::from(vec![
            Span::raw("Flags: "),
            flag_span("Z", flags.zero),
            flag_span("C", flags.carry),
            flag_span("H", flags.halt),
            flag_span("E", flags.exec),
        ]),
        Line::from(vec![
            Span::raw("Bus: "),
            Span::styled(
                format!("{:08b}", app.bench.output_bus()),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw("   Latch: "),
            Span::styled(core.latched().to_string(), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::raw("Steps: "),
            Span::styled(format!("{}", core.steps()), Style::default().fg(Color::Cyan)),
            Span::raw("   State: "),
            Span::styled(core.state().to_string(), state_style(core.state())),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Core ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw recent trace events.
fn draw_events(frame: &mut Frame, area: Rect, app: &StepperApp) {
    let visible = (area.height as usize).saturating_sub(2);
    let events = app.recent_events();
    let skip = events.len().saturating_sub(visible);

    let items: Vec<ListItem> = events
        .iter()
        .skip(skip)
        .map(|event| {
            let (text, color) = match event {
                TraceEvent::Reset => ("reset".to_string(), Color::Red),
                TraceEvent::Latched { instruction } => {
                    (format!("latch   {}", instruction), Color::White)
                }
                TraceEvent::Executed(r) => (
                    format!(
                        "execute {}  {} -> {}",
                        r.instruction, r.before.accumulator, r.after.accumulator
                    ),
                    Color::Yellow,
                ),
                TraceEvent::Settled { status } => (
                    format!("settled ACC={} {}", status.accumulator, status.flags),
                    Color::DarkGray,
                ),
            };
            ListItem::new(text).style(Style::default().fg(color))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Events ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &StepperApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  r: Run  p: Pause"),
        Line::from("x: Reset  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}

fn flag_span(name: &'static str, set: bool) -> Span<'static> {
    let style = if set {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(format!("{} ", name), style)
}

/// Color for a sequencer state.
fn state_style(state: SeqState) -> Style {
    match state {
        SeqState::Idle => Style::default().fg(Color::Gray),
        SeqState::Loading | SeqState::Loaded => Style::default().fg(Color::Yellow),
        SeqState::Executing => Style::default().fg(Color::Green),
    }
}
